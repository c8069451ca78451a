//! Handlers for the `/genres` resource.
//!
//! Genres are always returned with their categories. Category ids in a
//! write must reference live categories; the genre row and its category
//! set are written in one transaction.

use axum::extract::{OriginalUri, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::filter::{ListQuery, RawListParams};
use catalog_core::types::DbId;
use catalog_core::validation::FieldErrors;
use catalog_db::models::genre::{Genre, GenreFilter, GenreInput, GenreWithCategories, GENRE_LIST};
use catalog_db::repositories::GenreRepo;
use catalog_events::ModelEvent;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::handlers::{page_url, publish_relation_changes};
use crate::query::{RecordId, ShowParams};
use crate::response::{DataResponse, ListResponse, PaginatedResponse};
use crate::rules::{check_exists, read_input, Relation};
use crate::state::AppState;
use crate::upload::JsonObject;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Genre", id })
}

async fn with_categories(state: &AppState, genre: Genre) -> AppResult<GenreWithCategories> {
    let categories = GenreRepo::categories_for_genre(&state.pool, genre.id).await?;
    Ok(GenreWithCategories { genre, categories })
}

async fn validate(state: &AppState, fields: &Map<String, Value>) -> AppResult<GenreInput> {
    let (input, mut errors): (GenreInput, FieldErrors) = read_input(fields, GenreInput::read);
    check_exists(&state.pool, &mut errors, Relation::Categories, input.category_ids()).await?;
    errors.into_result()?;
    Ok(input)
}

/// GET /api/genres
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(raw): Query<RawListParams>,
) -> AppResult<Json<ListResponse<GenreWithCategories>>> {
    let query = ListQuery::parse(&raw, &GENRE_LIST);
    let filter = GenreFilter::from_params(&raw);

    let genres = GenreRepo::list(&state.pool, &query, &filter).await?;
    let items = GenreRepo::with_categories(&state.pool, genres).await?;
    if query.all {
        return Ok(Json(ListResponse::All(DataResponse { data: items })));
    }

    let total = GenreRepo::count(&state.pool, &query, &filter).await?;
    Ok(Json(ListResponse::Paginated(PaginatedResponse::new(
        items,
        &query,
        total,
        page_url(&state, &uri),
        &filter.query_pairs(),
    ))))
}

/// GET /api/genres/{id}
pub async fn show(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(params): Query<ShowParams>,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    let genre = if params.with_trashed() {
        GenreRepo::find_by_id_with_trashed(&state.pool, id).await?
    } else {
        GenreRepo::find_by_id(&state.pool, id).await?
    }
    .ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse {
        data: with_categories(&state, genre).await?,
    }))
}

/// POST /api/genres
pub async fn store(
    State(state): State<AppState>,
    JsonObject(fields): JsonObject,
) -> AppResult<(StatusCode, Json<DataResponse<GenreWithCategories>>)> {
    let input = validate(&state, &fields).await?;

    let (genre, change) = GenreRepo::create(&state.pool, &input).await?;
    state.event_bus.publish(ModelEvent::created(&genre));
    publish_relation_changes(&state, &[change]);

    tracing::info!(
        genre_id = %genre.id,
        categories = input.category_ids().len(),
        "Genre created",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: with_categories(&state, genre).await?,
        }),
    ))
}

/// PUT /api/genres/{id}
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    JsonObject(fields): JsonObject,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    if GenreRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }

    let input = validate(&state, &fields).await?;

    let (genre, change) = GenreRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.event_bus.publish(ModelEvent::updated(&genre));
    publish_relation_changes(&state, change.as_slice());

    Ok(Json(DataResponse {
        data: with_categories(&state, genre).await?,
    }))
}

/// DELETE /api/genres/{id}
pub async fn destroy(State(state): State<AppState>, RecordId(id): RecordId) -> AppResult<StatusCode> {
    if !GenreRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state.event_bus.publish(ModelEvent::deleted::<Genre>(id));

    tracing::info!(genre_id = %id, "Genre deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/genres/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    let genre = match GenreRepo::restore(&state.pool, id).await? {
        Some(genre) => {
            state.event_bus.publish(ModelEvent::updated(&genre));
            tracing::info!(genre_id = %id, "Genre restored");
            genre
        }
        None => GenreRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| not_found(id))?,
    };

    Ok(Json(DataResponse {
        data: with_categories(&state, genre).await?,
    }))
}

/// DELETE /api/genres/{id}/force
pub async fn force_destroy(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<StatusCode> {
    let genre = GenreRepo::hard_delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if genre.deleted_at.is_none() {
        state.event_bus.publish(ModelEvent::deleted::<Genre>(id));
    }

    tracing::info!(genre_id = %id, "Genre permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
