use axum::{Json, extract::State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::crud::RequestContext;
use crate::entity::role::RoleName;
use crate::entity::{answer, question, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::VerifiedToken;
use crate::extractors::params::AppQuery;
use crate::models::ranking::{RankingEntry, RankingParams};
use crate::models::shared::{PageParams, Paginated};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/ranking",
    tag = "Ranking",
    operation_id = "ranking",
    summary = "Leaderboard",
    description = "Users ordered by the points granted to their answers, highest first. \
                   Only users with at least one answer are listed. Requires the `user` role.",
    params(RankingParams),
    responses(
        (status = 200, description = "Ranking page", body = Paginated<RankingEntry>),
        (status = 400, description = "Invalid parameters (validation_error, invalid_query_params)", body = ErrorBody),
        (status = 401, description = "Unauthorized (auth_header_missing, action_forbidden)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, token, params), fields(event_id = params.event_id))]
pub async fn ranking(
    State(state): State<AppState>,
    token: VerifiedToken,
    AppQuery(params): AppQuery<RankingParams>,
) -> Result<Json<Paginated<RankingEntry>>, AppError> {
    RequestContext::authorize(&state, token, RoleName::User, false).await?;

    let page = PageParams {
        page_no: params.page_no,
        per_page: params.per_page,
        ..Default::default()
    }
    .resolve_with(|_| Some(()))?;

    let mut select = answer::Entity::find()
        .select_only()
        .column(answer::Column::UserId)
        .column_as(user::Column::Email, "email")
        .column_as(
            Expr::from(Func::sum(Expr::col((answer::Entity, answer::Column::Points)))),
            "total_points",
        )
        .inner_join(user::Entity)
        .group_by(answer::Column::UserId)
        .group_by(user::Column::Email);

    if let Some(event_id) = params.event_id {
        select = select.filter(
            answer::Column::QuestionId.in_subquery(
                SeaQuery::select()
                    .column(question::Column::Id)
                    .from(question::Entity)
                    .and_where(question::Column::EventId.eq(event_id))
                    .to_owned(),
            ),
        );
    }

    let total_count = select.clone().count(&state.db).await?;

    let data = match page.offset() {
        Some(offset) => {
            select
                .order_by(Expr::cust("total_points"), Order::Desc)
                .order_by_asc(answer::Column::UserId)
                .offset(offset)
                .limit(page.per_page)
                .into_model::<RankingEntry>()
                .all(&state.db)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(Paginated::new(
        data,
        total_count,
        page.page_no,
        page.per_page,
    )))
}
