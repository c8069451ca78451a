//! Handlers for the `/categories` resource.

use axum::extract::{OriginalUri, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::filter::{ListQuery, RawListParams};
use catalog_core::types::DbId;
use catalog_db::models::category::{Category, CategoryFilter, CategoryInput, CATEGORY_LIST};
use catalog_db::repositories::CategoryRepo;
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
        entity: "Category",
        id,
    })
}

/// GET /api/categories
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(raw): Query<RawListParams>,
) -> AppResult<Json<ListResponse<Category>>> {
    let query = ListQuery::parse(&raw, &CATEGORY_LIST);
    let filter = CategoryFilter::from_params(&raw);

    let items = CategoryRepo::list(&state.pool, &query, &filter).await?;
    if query.all {
        return Ok(Json(ListResponse::All(DataResponse { data: items })));
    }

    let total = CategoryRepo::count(&state.pool, &query, &filter).await?;
    Ok(Json(ListResponse::Paginated(PaginatedResponse::new(
        items,
        &query,
        total,
        page_url(&state, &uri),
        &filter.query_pairs(),
    ))))
}

/// GET /api/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(params): Query<ShowParams>,
) -> AppResult<Json<DataResponse<Category>>> {
    let category = if params.with_trashed() {
        CategoryRepo::find_by_id_with_trashed(&state.pool, id).await?
    } else {
        CategoryRepo::find_by_id(&state.pool, id).await?
    }
    .ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse { data: category }))
}

/// POST /api/categories
pub async fn store(
    State(state): State<AppState>,
    JsonObject(fields): JsonObject,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let (input, errors) = read_input(&fields, CategoryInput::read);
    errors.into_result()?;

    let category = CategoryRepo::create(&state.pool, &input).await?;
    state.event_bus.publish(ModelEvent::created(&category));

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonObject(fields): JsonObject,
) -> AppResult<Json<DataResponse<Category>>> {
    if CategoryRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }

    let (input, errors) = read_input(&fields, CategoryInput::read);
    errors.into_result()?;

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.event_bus.publish(ModelEvent::updated(&category));

    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/categories/{id}
pub async fn destroy(State(state): State<AppState>, RecordId(id): RecordId) -> AppResult<StatusCode> {
    if !CategoryRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state.event_bus.publish(ModelEvent::deleted::<Category>(id));

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/categories/{id}/restore
///
/// Restoring a live category returns it unchanged.
pub async fn restore(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<DataResponse<Category>>> {
    if let Some(category) = CategoryRepo::restore(&state.pool, id).await? {
        state.event_bus.publish(ModelEvent::updated(&category));
        tracing::info!(category_id = %id, "Category restored");
        return Ok(Json(DataResponse { data: category }));
    }

    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/categories/{id}/force
pub async fn force_destroy(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<StatusCode> {
    let category = CategoryRepo::hard_delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if category.deleted_at.is_none() {
        state.event_bus.publish(ModelEvent::deleted::<Category>(id));
    }

    tracing::info!(category_id = %id, "Category permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
