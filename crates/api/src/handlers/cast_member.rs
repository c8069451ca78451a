//! Handlers for the `/cast_members` resource.

use axum::extract::{OriginalUri, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::filter::{ListQuery, RawListParams};
use catalog_core::types::DbId;
use catalog_db::models::cast_member::{
    CastMember, CastMemberFilter, CastMemberInput, CAST_MEMBER_LIST,
};
use catalog_db::repositories::CastMemberRepo;
use catalog_events::ModelEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::page_url;
use crate::query::{RecordId, ShowParams};
use crate::response::{DataResponse, ListResponse, PaginatedResponse};
use crate::rules::read_input;
use crate::state::AppState;
use crate::upload::JsonObject;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "CastMember",
        id,
    })
}

/// GET /api/cast_members
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(raw): Query<RawListParams>,
) -> AppResult<Json<ListResponse<CastMember>>> {
    let query = ListQuery::parse(&raw, &CAST_MEMBER_LIST);
    let filter = CastMemberFilter::from_params(&raw);

    let items = CastMemberRepo::list(&state.pool, &query, &filter).await?;
    if query.all {
        return Ok(Json(ListResponse::All(DataResponse { data: items })));
    }

    let total = CastMemberRepo::count(&state.pool, &query, &filter).await?;
    Ok(Json(ListResponse::Paginated(PaginatedResponse::new(
        items,
        &query,
        total,
        page_url(&state, &uri),
        &filter.query_pairs(),
    ))))
}

/// GET /api/cast_members/{id}
pub async fn show(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(params): Query<ShowParams>,
) -> AppResult<Json<DataResponse<CastMember>>> {
    let member = if params.with_trashed() {
        CastMemberRepo::find_by_id_with_trashed(&state.pool, id).await?
    } else {
        CastMemberRepo::find_by_id(&state.pool, id).await?
    }
    .ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse { data: member }))
}

/// POST /api/cast_members
pub async fn store(
    State(state): State<AppState>,
    JsonObject(fields): JsonObject,
) -> AppResult<(StatusCode, Json<DataResponse<CastMember>>)> {
    let (input, errors) = read_input(&fields, CastMemberInput::read);
    errors.into_result()?;

    let member = CastMemberRepo::create(&state.pool, &input).await?;
    state.event_bus.publish(ModelEvent::created(&member));

    tracing::info!(cast_member_id = %member.id, name = %member.name, "Cast member created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// PUT /api/cast_members/{id}
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonObject(fields): JsonObject,
) -> AppResult<Json<DataResponse<CastMember>>> {
    if CastMemberRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }

    let (input, errors) = read_input(&fields, CastMemberInput::read);
    errors.into_result()?;

    let member = CastMemberRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.event_bus.publish(ModelEvent::updated(&member));

    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/cast_members/{id}
pub async fn destroy(State(state): State<AppState>, RecordId(id): RecordId) -> AppResult<StatusCode> {
    if !CastMemberRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state.event_bus.publish(ModelEvent::deleted::<CastMember>(id));

    tracing::info!(cast_member_id = %id, "Cast member deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/cast_members/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<DataResponse<CastMember>>> {
    if let Some(member) = CastMemberRepo::restore(&state.pool, id).await? {
        state.event_bus.publish(ModelEvent::updated(&member));
        tracing::info!(cast_member_id = %id, "Cast member restored");
        return Ok(Json(DataResponse { data: member }));
    }

    let member = CastMemberRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/cast_members/{id}/force
pub async fn force_destroy(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<StatusCode> {
    let member = CastMemberRepo::hard_delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if member.deleted_at.is_none() {
        state.event_bus.publish(ModelEvent::deleted::<CastMember>(id));
    }

    tracing::info!(cast_member_id = %id, "Cast member permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
