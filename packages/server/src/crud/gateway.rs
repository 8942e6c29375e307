//! Persistence gateway: executes the statements the query builders produce.
//!
//! Writes stamp `created_at` / `updated_at` here, so individual resources never
//! set timestamps themselves. Zero affected rows is returned as `0`, not an error.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DbErr, DeleteMany, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryOrder, QuerySelect, Select, UpdateMany,
};

use super::Resource;
use crate::models::shared::Page;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

fn stamp<A: ActiveModelTrait>(model: &mut A, column: &str, now: DateTime<Utc>) {
    if let Ok(column) = <<A::Entity as EntityTrait>::Column as FromStr>::from_str(column) {
        model.set(column, now.into());
    }
}

/// Mark a change set as modified at `now`.
pub fn touch<A: ActiveModelTrait>(model: &mut A, now: DateTime<Utc>) {
    stamp(model, UPDATED_AT, now);
}

pub async fn find_page<R: Resource, C: ConnectionTrait>(
    conn: &C,
    select: Select<R::Entity>,
    page: &Page<R::Column>,
) -> Result<Vec<R::Model>, DbErr> {
    let Some(offset) = page.offset() else {
        return Ok(Vec::new());
    };

    select
        .order_by(page.order_by, page.order.clone())
        .order_by_asc(R::id_column())
        .offset(Some(offset))
        .limit(Some(page.per_page))
        .all(conn)
        .await
}

pub async fn find_one<R: Resource, C: ConnectionTrait>(
    conn: &C,
    select: Select<R::Entity>,
) -> Result<Option<R::Model>, DbErr> {
    select.one(conn).await
}

/// Number of rows `select` matches, ignoring pagination.
pub async fn count<R: Resource, C: ConnectionTrait>(
    conn: &C,
    select: Select<R::Entity>,
) -> Result<u64, DbErr> {
    select.count(conn).await
}

pub async fn create<A, C>(
    conn: &C,
    mut model: A,
    now: DateTime<Utc>,
) -> Result<<A::Entity as EntityTrait>::Model, DbErr>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    stamp(&mut model, CREATED_AT, now);
    stamp(&mut model, UPDATED_AT, now);
    model.insert(conn).await
}

pub async fn update<E: EntityTrait, C: ConnectionTrait>(
    conn: &C,
    query: UpdateMany<E>,
) -> Result<u64, DbErr> {
    Ok(query.exec(conn).await?.rows_affected)
}

pub async fn delete<E: EntityTrait, C: ConnectionTrait>(
    conn: &C,
    query: DeleteMany<E>,
) -> Result<u64, DbErr> {
    Ok(query.exec(conn).await?.rows_affected)
}
