use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::ExprTrait;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Select, Set, SqlErr,
};

use crate::crud::{Action, RequestContext, Resource};
use crate::entity::role::{DEFAULT_ROLE, RoleName};
use crate::entity::{answer, role, user, user_role};
use crate::error::AppError;
use crate::models::shared::escape_like;
use crate::models::user::{UserFilter, UserPayload, UserResponse};
use crate::utils::hash;

const EMAIL_TAKEN: &str = "email is already in use";

pub struct Users;

/// Replace the roles of `user_id`. Unknown names are skipped.
pub async fn assign_roles<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    roles: &[RoleName],
) -> Result<(), DbErr> {
    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    if roles.is_empty() {
        return Ok(());
    }

    let role_ids: Vec<i32> = role::Entity::find()
        .filter(role::Column::Name.is_in(roles.iter().map(RoleName::as_str)))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if role_ids.is_empty() {
        return Ok(());
    }

    user_role::Entity::insert_many(role_ids.into_iter().map(|role_id| user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    }))
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

/// Role names of each user in `user_ids`.
pub async fn role_names<C: ConnectionTrait>(
    conn: &C,
    user_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    let links = user_role::Entity::find()
        .filter(user_role::Column::UserId.is_in(user_ids))
        .find_also_related(role::Entity)
        .all(conn)
        .await?;

    let mut names: HashMap<i32, Vec<String>> = HashMap::new();
    for (link, role) in links {
        if let Some(role) = role {
            names.entry(link.user_id).or_default().push(role.name);
        }
    }
    Ok(names)
}

fn hash_into(payload: &UserPayload, model: &mut user::ActiveModel) -> Result<(), AppError> {
    let hashed = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    model.password = Set(hashed);
    Ok(())
}

#[async_trait]
impl Resource for Users {
    type Entity = user::Entity;
    type Model = user::Model;
    type ActiveModel = user::ActiveModel;
    type Column = user::Column;
    type Payload = UserPayload;
    type Filter = UserFilter;
    type Record = (user::Model, Vec<String>);
    type Response = UserResponse;

    const UNSORTABLE: &'static [&'static str] = &["password"];

    fn id_column() -> user::Column {
        user::Column::Id
    }

    fn list_query(
        mut select: Select<user::Entity>,
        filter: &UserFilter,
        ctx: &RequestContext,
    ) -> Result<Select<user::Entity>, AppError> {
        if let Some(ids) = &filter.ids {
            select = select.filter(user::Column::Id.is_in(ids.clone()));
        }
        if let Some(search) = &filter.search {
            let term = escape_like(search.trim());
            if !term.is_empty() {
                select = select.filter(
                    Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                        .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
                );
            }
        }
        Ok(Self::scope(select, ctx))
    }

    fn to_active_model(payload: &UserPayload, _ctx: &RequestContext) -> user::ActiveModel {
        user::ActiveModel {
            email: Set(payload.email.trim().to_lowercase()),
            ..Default::default()
        }
    }

    async fn validate(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        payload: &UserPayload,
        action: Action,
    ) -> Result<(), AppError> {
        let mut same_email = user::Entity::find()
            .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()));
        if let Action::Update(id) = action {
            same_email = same_email.filter(user::Column::Id.ne(id));
        }
        if same_email.one(txn).await?.is_some() {
            return Err(AppError::field("email", "unique", EMAIL_TAKEN));
        }
        Ok(())
    }

    async fn before_create(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        payload: &UserPayload,
        model: &mut user::ActiveModel,
    ) -> Result<(), AppError> {
        hash_into(payload, model)
    }

    async fn after_create(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        payload: &UserPayload,
        created: &user::Model,
    ) -> Result<(), AppError> {
        let roles = payload.role_names().unwrap_or_else(|| vec![DEFAULT_ROLE]);
        assign_roles(txn, created.id, &roles).await?;
        Ok(())
    }

    async fn before_update(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _id: i32,
        payload: &UserPayload,
        changes: &mut user::ActiveModel,
    ) -> Result<(), AppError> {
        hash_into(payload, changes)
    }

    async fn after_update(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
        payload: &UserPayload,
    ) -> Result<(), AppError> {
        if let Some(roles) = payload.role_names() {
            assign_roles(txn, id, &roles).await?;
        }
        Ok(())
    }

    async fn before_delete(
        txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        id: i32,
    ) -> Result<(), AppError> {
        answer::Entity::delete_many()
            .filter(answer::Column::UserId.eq(id))
            .exec(txn)
            .await?;
        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }

    fn write_error(err: DbErr) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::field("email", "unique", EMAIL_TAKEN)
            }
            _ => err.into(),
        }
    }

    async fn load(
        db: &DatabaseConnection,
        models: Vec<user::Model>,
    ) -> Result<Vec<(user::Model, Vec<String>)>, DbErr> {
        let mut names = role_names(db, models.iter().map(|m| m.id).collect()).await?;
        Ok(models
            .into_iter()
            .map(|model| {
                let roles = names.remove(&model.id).unwrap_or_default();
                (model, roles)
            })
            .collect())
    }

    fn shape((user, roles): (user::Model, Vec<String>)) -> UserResponse {
        UserResponse::new(user, roles)
    }
}
