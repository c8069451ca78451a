//! Handlers for the `/videos` resource.
//!
//! Writes accept JSON or `multipart/form-data`. The row, its relation sets
//! and its file columns are written in one transaction; uploaded files are
//! moved into place before the commit and removed again if the commit does
//! not happen. Files replaced by an update are removed after the commit.

use axum::extract::{OriginalUri, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::catalog::VideoFileField;
use catalog_core::error::CoreError;
use catalog_core::filter::{ListQuery, RawListParams};
use catalog_core::types::{DbId, Timestamp};
use catalog_core::validation::FieldErrors;
use catalog_db::models::cast_member::CastMember;
use catalog_db::models::category::Category;
use catalog_db::models::genre::Genre;
use catalog_db::models::video::{Video, VideoFilter, VideoInput, VideoWithRelations, VIDEO_LIST};
use catalog_db::repositories::{PgTransaction, VideoRepo};
use catalog_events::ModelEvent;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::handlers::{page_url, publish_relation_changes};
use crate::query::{RecordId, ShowParams};
use crate::response::{DataResponse, ListResponse, PaginatedResponse};
use crate::rules::{check_exists, check_genres_have_categories, read_input, Relation};
use crate::state::AppState;
use crate::storage::{StagedFile, VideoStorage};
use crate::upload::VideoPayload;

// ---------------------------------------------------------------------------
// Resource shape
// ---------------------------------------------------------------------------

/// A stored file as exposed to clients.
#[derive(Debug, Serialize)]
pub struct FileResource {
    pub name: String,
    pub url: String,
}

/// Serialized video: columns, relations and `{name, url}` file objects.
#[derive(Debug, Serialize)]
pub struct VideoResource {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub year_launched: i16,
    pub opened: bool,
    pub rating: String,
    pub duration: i32,
    pub categories: Vec<Category>,
    pub genres: Vec<Genre>,
    pub cast_members: Vec<CastMember>,
    pub video: Option<FileResource>,
    pub trailer: Option<FileResource>,
    pub thumb: Option<FileResource>,
    pub banner: Option<FileResource>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl VideoResource {
    fn new(storage: &VideoStorage, item: VideoWithRelations) -> Self {
        let VideoWithRelations { video, relations } = item;
        let file = |field: VideoFileField| {
            video.file(field).map(|name| FileResource {
                name: name.to_string(),
                url: storage.url_for(video.id, name),
            })
        };

        Self {
            video: file(VideoFileField::Video),
            trailer: file(VideoFileField::Trailer),
            thumb: file(VideoFileField::Thumb),
            banner: file(VideoFileField::Banner),
            id: video.id,
            title: video.title,
            description: video.description,
            year_launched: video.year_launched,
            opened: video.opened,
            rating: video.rating,
            duration: video.duration,
            categories: relations.categories,
            genres: relations.genres,
            cast_members: relations.cast_members,
            created_at: video.created_at,
            updated_at: video.updated_at,
            deleted_at: video.deleted_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Video", id })
}

async fn to_resource(state: &AppState, video: Video) -> AppResult<VideoResource> {
    let item = VideoRepo::with_relations(&state.pool, vec![video])
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalError("Video vanished while loading relations".into()))?;
    Ok(VideoResource::new(&state.storage, item))
}

async fn validate(
    state: &AppState,
    fields: &Map<String, Value>,
    file_errors: FieldErrors,
) -> AppResult<VideoInput> {
    let (input, mut errors) = read_input(fields, VideoInput::read);
    errors.merge(file_errors);

    let pool = &state.pool;
    check_exists(pool, &mut errors, Relation::Categories, input.category_ids()).await?;
    check_exists(pool, &mut errors, Relation::Genres, input.genre_ids()).await?;
    if let Some(ref cast) = input.cast_members {
        check_exists(pool, &mut errors, Relation::CastMembers, cast).await?;
    }
    check_genres_have_categories(pool, &mut errors, input.genre_ids(), input.category_ids())
        .await?;

    errors.into_result()?;
    Ok(input)
}

/// Move staged uploads into place, point the row at them and commit.
///
/// Names of files moved into place are pushed to `placed` as they land so
/// the caller can remove them if this fails.
async fn attach_files_and_commit(
    state: &AppState,
    mut tx: PgTransaction<'_>,
    video: Video,
    files: Vec<(VideoFileField, StagedFile)>,
    placed: &mut Vec<(VideoFileField, String)>,
) -> AppResult<Video> {
    for (field, staged) in files {
        let name = state.storage.place(video.id, staged).await?;
        placed.push((field, name));
    }

    let video = if placed.is_empty() {
        video
    } else {
        VideoRepo::set_files(&mut tx, video.id, placed).await?
    };

    tx.commit().await?;
    Ok(video)
}

fn names(placed: &[(VideoFileField, String)]) -> Vec<String> {
    placed.iter().map(|(_, name)| name.clone()).collect()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/videos
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(raw): Query<RawListParams>,
) -> AppResult<Json<ListResponse<VideoResource>>> {
    let query = ListQuery::parse(&raw, &VIDEO_LIST);
    let filter = VideoFilter::from_params(&raw);

    let videos = VideoRepo::list(&state.pool, &query, &filter).await?;
    let items: Vec<VideoResource> = VideoRepo::with_relations(&state.pool, videos)
        .await?
        .into_iter()
        .map(|item| VideoResource::new(&state.storage, item))
        .collect();
    if query.all {
        return Ok(Json(ListResponse::All(DataResponse { data: items })));
    }

    let total = VideoRepo::count(&state.pool, &query, &filter).await?;
    Ok(Json(ListResponse::Paginated(PaginatedResponse::new(
        items,
        &query,
        total,
        page_url(&state, &uri),
        &filter.query_pairs(),
    ))))
}

/// GET /api/videos/{id}
pub async fn show(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Query(params): Query<ShowParams>,
) -> AppResult<Json<DataResponse<VideoResource>>> {
    let video = if params.with_trashed() {
        VideoRepo::find_by_id_with_trashed(&state.pool, id).await?
    } else {
        VideoRepo::find_by_id(&state.pool, id).await?
    }
    .ok_or_else(|| not_found(id))?;

    Ok(Json(DataResponse {
        data: to_resource(&state, video).await?,
    }))
}

/// POST /api/videos
pub async fn store(
    State(state): State<AppState>,
    payload: VideoPayload,
) -> AppResult<(StatusCode, Json<DataResponse<VideoResource>>)> {
    let VideoPayload {
        fields,
        files,
        file_errors,
    } = payload;
    let input = validate(&state, &fields, file_errors).await?;

    let mut tx = state.pool.begin().await?;
    let video = VideoRepo::insert(&mut tx, &input).await?;
    let changes = VideoRepo::sync_relations_inner(&mut tx, video.id, &input).await?;

    let video_id = video.id;
    let mut placed = Vec::new();
    let video = match attach_files_and_commit(&state, tx, video, files, &mut placed).await {
        Ok(video) => video,
        Err(e) => {
            state.storage.remove_video_dir(video_id).await;
            return Err(e);
        }
    };
    state.event_bus.publish(ModelEvent::created(&video));
    publish_relation_changes(&state, &changes);

    tracing::info!(
        video_id = %video.id,
        title = %video.title,
        files = placed.len(),
        "Video created",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: to_resource(&state, video).await?,
        }),
    ))
}

/// PUT /api/videos/{id}
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    payload: VideoPayload,
) -> AppResult<Json<DataResponse<VideoResource>>> {
    let previous = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let VideoPayload {
        fields,
        files,
        file_errors,
    } = payload;
    let input = validate(&state, &fields, file_errors).await?;

    let mut tx = state.pool.begin().await?;
    let video = VideoRepo::update(&mut tx, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    let changes = VideoRepo::sync_relations_inner(&mut tx, id, &input).await?;

    let mut placed = Vec::new();
    let video = match attach_files_and_commit(&state, tx, video, files, &mut placed).await {
        Ok(video) => video,
        Err(e) => {
            state.storage.remove_files(id, &names(&placed)).await;
            return Err(e);
        }
    };

    let superseded: Vec<String> = placed
        .iter()
        .filter_map(|(field, _)| previous.file(*field))
        .filter(|old| VideoFileField::ALL.iter().all(|f| video.file(*f) != Some(*old)))
        .map(str::to_string)
        .collect();
    state.storage.remove_files(id, &superseded).await;

    state.event_bus.publish(ModelEvent::updated(&video));
    publish_relation_changes(&state, &changes);

    Ok(Json(DataResponse {
        data: to_resource(&state, video).await?,
    }))
}

/// DELETE /api/videos/{id}
///
/// Stored files are kept so the video can be restored.
pub async fn destroy(State(state): State<AppState>, RecordId(id): RecordId) -> AppResult<StatusCode> {
    if !VideoRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state.event_bus.publish(ModelEvent::deleted::<Video>(id));

    tracing::info!(video_id = %id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/videos/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<DataResponse<VideoResource>>> {
    let video = match VideoRepo::restore(&state.pool, id).await? {
        Some(video) => {
            state.event_bus.publish(ModelEvent::updated(&video));
            tracing::info!(video_id = %id, "Video restored");
            video
        }
        None => VideoRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| not_found(id))?,
    };

    Ok(Json(DataResponse {
        data: to_resource(&state, video).await?,
    }))
}

/// DELETE /api/videos/{id}/force
///
/// Removes the row, its relation rows and its stored files.
pub async fn force_destroy(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<StatusCode> {
    let video = VideoRepo::hard_delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.storage.remove_video_dir(id).await;
    if video.deleted_at.is_none() {
        state.event_bus.publish(ModelEvent::deleted::<Video>(id));
    }

    tracing::info!(video_id = %id, "Video permanently deleted");
    Ok(StatusCode::NO_CONTENT)
}
