//! Generic CRUD layer.
//!
//! Every exposed entity implements [`Resource`]: how to build its scoped
//! queries, which lifecycle hooks run around writes, and how a loaded record
//! is shaped for output. [`dispatcher`] runs the five operations against any
//! `Resource`, [`gateway`] executes the statements, and [`routes`] mounts them
//! behind the role gate.

pub mod dispatcher;
pub mod gateway;
pub mod routes;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, DeleteMany, EntityTrait, EntityName, FromQueryResult, IntoActiveModel, ModelTrait,
    QueryFilter, Select, UpdateMany,
};
use serde::{Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::entity::{role::RoleName, user};
use crate::error::AppError;
use crate::extractors::auth::VerifiedToken;
use crate::jobs::JobClient;
use crate::state::AppState;

/// Explicit per-request context handed to every query builder and hook.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The caller, resolved from the token subject.
    pub user: user::Model,
    pub roles: Vec<String>,
    /// Set on `/users/me/...` routes: restrict every query to the caller's rows.
    pub own_records_only: bool,
    /// Request time, used for deadline checks and timestamps.
    pub now: DateTime<Utc>,
    pub jobs: JobClient,
}

impl RequestContext {
    /// Role gate: check the token's roles, then resolve its subject.
    pub async fn authorize(
        state: &AppState,
        token: VerifiedToken,
        required: RoleName,
        own_records_only: bool,
    ) -> Result<Self, AppError> {
        let VerifiedToken(claims) = token;
        let user_id = claims.user_id()?;

        if !claims.has_role(required.as_str()) {
            return Err(AppError::Forbidden);
        }

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok(Self {
            user,
            roles: claims.roles,
            own_records_only,
            now: Utc::now(),
            jobs: state.jobs.clone(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == RoleName::Admin.as_str())
    }
}

/// The write a validation hook is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update(i32),
}

/// An entity exposed through the generic CRUD endpoints.
///
/// Query builders are pure: they only refine the statement they are given.
/// Hooks run inside the write's transaction, so anything they write (including
/// enqueued jobs) is rolled back together with the write.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: EntityTrait<
            Model = Self::Model,
            ActiveModel = Self::ActiveModel,
            Column = Self::Column,
        >;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModel>
        + Clone
        + Send
        + Sync
        + 'static;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + Send
        + Sync
        + 'static;
    type Column: ColumnTrait;

    /// Decoded request body of create and update.
    type Payload: DeserializeOwned + Validate + Send + Sync + 'static;
    /// Decoded list query parameters.
    type Filter: DeserializeOwned + Send + Sync + 'static;
    /// Model plus whatever relations the response needs.
    type Record: Send;
    type Response: Serialize + Send + 'static;

    /// Columns that list endpoints refuse to order by.
    const UNSORTABLE: &'static [&'static str] = &[];

    fn id_column() -> Self::Column;

    fn table() -> &'static str {
        Self::Entity::default().table_name()
    }

    /// Ownership scoping, shared by every query builder.
    fn scope<Q: QueryFilter>(query: Q, _ctx: &RequestContext) -> Q {
        query
    }

    fn list_query(
        select: Select<Self::Entity>,
        _filter: &Self::Filter,
        ctx: &RequestContext,
    ) -> Result<Select<Self::Entity>, AppError> {
        Ok(Self::scope(select, ctx))
    }

    fn get_query(
        select: Select<Self::Entity>,
        id: i32,
        ctx: &RequestContext,
    ) -> Select<Self::Entity> {
        Self::scope(select.filter(Self::id_column().eq(id)), ctx)
    }

    /// Identifier and creation timestamp are never part of the update set.
    fn update_query(
        update: UpdateMany<Self::Entity>,
        mut changes: Self::ActiveModel,
        id: i32,
        ctx: &RequestContext,
    ) -> UpdateMany<Self::Entity> {
        changes.not_set(Self::id_column());
        if let Ok(created_at) = Self::Column::from_str("created_at") {
            changes.not_set(created_at);
        }
        Self::scope(update.set(changes).filter(Self::id_column().eq(id)), ctx)
    }

    fn delete_query(
        delete: DeleteMany<Self::Entity>,
        id: i32,
        ctx: &RequestContext,
    ) -> DeleteMany<Self::Entity> {
        Self::scope(delete.filter(Self::id_column().eq(id)), ctx)
    }

    /// Column values written by create and update.
    fn to_active_model(payload: &Self::Payload, ctx: &RequestContext) -> Self::ActiveModel;

    /// Business rules that need the database. Field rules live on `Payload`.
    async fn validate(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _payload: &Self::Payload,
        _action: Action,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_create(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _payload: &Self::Payload,
        _model: &mut Self::ActiveModel,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_create(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _payload: &Self::Payload,
        _created: &Self::Model,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_update(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _id: i32,
        _payload: &Self::Payload,
        _changes: &mut Self::ActiveModel,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_update(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _id: i32,
        _payload: &Self::Payload,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_delete(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _id: i32,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_delete(
        _txn: &DatabaseTransaction,
        _ctx: &RequestContext,
        _id: i32,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// Translate write failures, e.g. unique violations into field errors.
    fn write_error(err: DbErr) -> AppError {
        err.into()
    }

    /// Fetch the relations `shape` needs, preserving order.
    async fn load(
        db: &DatabaseConnection,
        models: Vec<Self::Model>,
    ) -> Result<Vec<Self::Record>, DbErr>;

    /// Public representation of a loaded record.
    fn shape(record: Self::Record) -> Self::Response;
}
