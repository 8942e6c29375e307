//! The five CRUD operations, written once against [`Resource`].
//!
//! Writes run in a single transaction: validation, `before_*` hook, statement,
//! `after_*` hook. Returning early drops the transaction, which rolls it back.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, TransactionTrait, Value,
};
use tracing::{debug, instrument};
use validator::Validate;

use super::{Action, RequestContext, Resource, gateway};
use crate::error::AppError;
use crate::models::shared::{Empty, PageParams, Paginated};

#[instrument(skip_all, fields(resource = R::table(), user_id = ctx.user.id))]
pub async fn list<R: Resource>(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    params: &PageParams,
    filter: &R::Filter,
) -> Result<Paginated<R::Response>, AppError> {
    let page = params.resolve_except::<R::Column>(R::UNSORTABLE)?;
    let select = R::list_query(R::Entity::find(), filter, ctx)?;

    let total_count = gateway::count::<R, _>(db, select.clone()).await?;
    let models = gateway::find_page::<R, _>(db, select, &page).await?;
    let data = shape_all::<R>(db, models).await?;

    Ok(Paginated::new(data, total_count, page.page_no, page.per_page))
}

#[instrument(skip_all, fields(resource = R::table(), id = id))]
pub async fn get<R: Resource>(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i32,
) -> Result<R::Response, AppError> {
    let model = gateway::find_one::<R, _>(db, R::get_query(R::Entity::find(), id, ctx))
        .await?
        .ok_or(AppError::NotFound)?;

    shape_one::<R>(db, model).await
}

#[instrument(skip_all, fields(resource = R::table(), user_id = ctx.user.id))]
pub async fn create<R: Resource>(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    payload: R::Payload,
) -> Result<R::Response, AppError> {
    payload.validate()?;

    let txn = db.begin().await?;
    R::validate(&txn, ctx, &payload, Action::Create).await?;

    let mut model = R::to_active_model(&payload, ctx);
    R::before_create(&txn, ctx, &payload, &mut model).await?;
    let created = gateway::create(&txn, model, ctx.now)
        .await
        .map_err(R::write_error)?;
    R::after_create(&txn, ctx, &payload, &created).await?;
    txn.commit().await?;

    let id = record_id::<R>(&created)?;
    debug!(id, "Created record");
    reload::<R>(db, id).await
}

#[instrument(skip_all, fields(resource = R::table(), id = id, user_id = ctx.user.id))]
pub async fn update<R: Resource>(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i32,
    payload: R::Payload,
) -> Result<R::Response, AppError> {
    payload.validate()?;

    let txn = db.begin().await?;
    R::validate(&txn, ctx, &payload, Action::Update(id)).await?;

    let mut changes = R::to_active_model(&payload, ctx);
    R::before_update(&txn, ctx, id, &payload, &mut changes).await?;
    gateway::touch(&mut changes, ctx.now);

    let query = R::update_query(R::Entity::update_many(), changes, id, ctx);
    let affected = gateway::update(&txn, query)
        .await
        .map_err(R::write_error)?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    R::after_update(&txn, ctx, id, &payload).await?;
    txn.commit().await?;

    reload::<R>(db, id).await
}

#[instrument(skip_all, fields(resource = R::table(), id = id, user_id = ctx.user.id))]
pub async fn delete<R: Resource>(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    id: i32,
) -> Result<Empty, AppError> {
    let txn = db.begin().await?;
    R::before_delete(&txn, ctx, id).await?;

    let query = R::delete_query(R::Entity::delete_many(), id, ctx);
    let affected = gateway::delete(&txn, query)
        .await
        .map_err(R::write_error)?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    R::after_delete(&txn, ctx, id).await?;
    txn.commit().await?;

    Ok(Empty::default())
}

/// Re-read a freshly written record so server-side defaults are reflected.
async fn reload<R: Resource>(db: &DatabaseConnection, id: i32) -> Result<R::Response, AppError> {
    let select = R::Entity::find().filter(R::id_column().eq(id));
    let model = gateway::find_one::<R, _>(db, select)
        .await?
        .ok_or(AppError::NotFound)?;

    shape_one::<R>(db, model).await
}

fn record_id<R: Resource>(model: &R::Model) -> Result<i32, AppError> {
    match model.get(R::id_column()) {
        Value::Int(Some(id)) => Ok(id),
        other => Err(AppError::Internal(format!(
            "unexpected primary key value {other:?} in {}",
            R::table()
        ))),
    }
}

async fn shape_one<R: Resource>(
    db: &DatabaseConnection,
    model: R::Model,
) -> Result<R::Response, AppError> {
    shape_all::<R>(db, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

async fn shape_all<R: Resource>(
    db: &DatabaseConnection,
    models: Vec<R::Model>,
) -> Result<Vec<R::Response>, AppError> {
    Ok(R::load(db, models)
        .await?
        .into_iter()
        .map(R::shape)
        .collect())
}
