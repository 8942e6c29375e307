use axum::{
    Json,
    extract::State,
    http::StatusCode,
    routing::{MethodRouter, delete, get, post, put},
};
use utoipa_axum::router::OpenApiRouter;

use super::{RequestContext, Resource, dispatcher};
use crate::entity::role::RoleName;
use crate::error::AppError;
use crate::extractors::auth::VerifiedToken;
use crate::extractors::json::AppJson;
use crate::extractors::params::{AppQuery, RecordId};
use crate::models::shared::PageParams;
use crate::state::AppState;

/// Query, path and body extraction is deferred until the caller is authorized,
/// so a forbidden request is reported as such whatever it carries.
type Extracted<T> = Result<T, AppError>;

/// Role required per operation. `None` leaves the operation unmounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Access {
    pub list: Option<RoleName>,
    pub get: Option<RoleName>,
    pub create: Option<RoleName>,
    pub update: Option<RoleName>,
    pub delete: Option<RoleName>,
    pub own_records_only: bool,
}

impl Access {
    /// Every operation behind the same role.
    pub fn all(role: RoleName) -> Self {
        Self::read_write(role, role)
    }

    pub fn read_write(read: RoleName, write: RoleName) -> Self {
        Self {
            list: Some(read),
            get: Some(read),
            create: Some(write),
            update: Some(write),
            delete: Some(write),
            own_records_only: false,
        }
    }

    pub fn read_only(read: RoleName) -> Self {
        Self {
            list: Some(read),
            get: Some(read),
            ..Default::default()
        }
    }

    /// Scope every query to the caller's own rows.
    pub fn own_records(self) -> Self {
        Self {
            own_records_only: true,
            ..self
        }
    }
}

fn merge<S: Clone + Send + Sync + 'static>(
    acc: Option<MethodRouter<S>>,
    next: MethodRouter<S>,
) -> Option<MethodRouter<S>> {
    Some(match acc {
        Some(acc) => acc.merge(next),
        None => next,
    })
}

/// `GET|POST /` and `GET|PUT|DELETE /{id}` for a resource.
pub fn crud_routes<R: Resource>(access: Access) -> OpenApiRouter<AppState> {
    let own = access.own_records_only;
    let mut collection: Option<MethodRouter<AppState>> = None;
    let mut member: Option<MethodRouter<AppState>> = None;

    if let Some(role) = access.list {
        collection = merge(
            collection,
            get(
                move |State(state): State<AppState>,
                      token: VerifiedToken,
                      page: Extracted<AppQuery<PageParams>>,
                      filter: Extracted<AppQuery<R::Filter>>| async move {
                    let ctx = RequestContext::authorize(&state, token, role, own).await?;
                    let (AppQuery(page), AppQuery(filter)) = (page?, filter?);
                    dispatcher::list::<R>(&state.db, &ctx, &page, &filter)
                        .await
                        .map(Json)
                },
            ),
        );
    }

    if let Some(role) = access.create {
        collection = merge(
            collection,
            post(
                move |State(state): State<AppState>,
                      token: VerifiedToken,
                      payload: Extracted<AppJson<R::Payload>>| async move {
                    let ctx = RequestContext::authorize(&state, token, role, own).await?;
                    let AppJson(payload) = payload?;
                    dispatcher::create::<R>(&state.db, &ctx, payload)
                        .await
                        .map(|created| (StatusCode::CREATED, Json(created)))
                },
            ),
        );
    }

    if let Some(role) = access.get {
        member = merge(
            member,
            get(
                move |State(state): State<AppState>,
                      token: VerifiedToken,
                      id: Extracted<RecordId>| async move {
                    let ctx = RequestContext::authorize(&state, token, role, own).await?;
                    let RecordId(id) = id?;
                    dispatcher::get::<R>(&state.db, &ctx, id).await.map(Json)
                },
            ),
        );
    }

    if let Some(role) = access.update {
        member = merge(
            member,
            put(
                move |State(state): State<AppState>,
                      token: VerifiedToken,
                      id: Extracted<RecordId>,
                      payload: Extracted<AppJson<R::Payload>>| async move {
                    let ctx = RequestContext::authorize(&state, token, role, own).await?;
                    let (RecordId(id), AppJson(payload)) = (id?, payload?);
                    dispatcher::update::<R>(&state.db, &ctx, id, payload)
                        .await
                        .map(Json)
                },
            ),
        );
    }

    if let Some(role) = access.delete {
        member = merge(
            member,
            delete(
                move |State(state): State<AppState>,
                      token: VerifiedToken,
                      id: Extracted<RecordId>| async move {
                    let ctx = RequestContext::authorize(&state, token, role, own).await?;
                    let RecordId(id) = id?;
                    dispatcher::delete::<R>(&state.db, &ctx, id).await.map(Json)
                },
            ),
        );
    }

    let mut router = OpenApiRouter::new();
    if let Some(collection) = collection {
        router = router.route("/", collection);
    }
    if let Some(member) = member {
        router = router.route("/{id}", member);
    }
    router
}
