use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::crud::routes::{Access, crud_routes};
use crate::entity::role::RoleName;
use crate::handlers;
use crate::resources::{Answers, Athletes, Disciplines, Events, Questions, Users};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::ranking::ranking))
        .nest(
            "/users/me/answers",
            crud_routes::<Answers>(Access::all(RoleName::User).own_records()),
        )
        .nest("/users", crud_routes::<Users>(Access::all(RoleName::Admin)))
        .nest(
            "/events",
            crud_routes::<Events>(Access::read_write(RoleName::User, RoleName::Organizer)),
        )
        .nest(
            "/questions",
            crud_routes::<Questions>(Access::read_write(RoleName::User, RoleName::Organizer)),
        )
        .nest("/answers", crud_routes::<Answers>(Access::read_only(RoleName::User)))
        .nest(
            "/athletes",
            crud_routes::<Athletes>(Access::read_write(RoleName::User, RoleName::Admin)),
        )
        .nest(
            "/disciplines",
            crud_routes::<Disciplines>(Access::read_write(RoleName::User, RoleName::Admin)),
        )
}
