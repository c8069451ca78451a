//! Request body extractors for write endpoints.
//!
//! [`JsonObject`] accepts any JSON object and leaves type checks to
//! [`catalog_core::validation::Payload`]. [`VideoPayload`] additionally
//! accepts `multipart/form-data`, streaming file fields into staging.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use catalog_core::catalog::VideoFileField;
use catalog_core::validation::{param, FieldErrors, Violation};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{extension_of, StagedFile};

/// A JSON object request body.
#[derive(Debug)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        match value {
            Value::Object(fields) => Ok(JsonObject(fields)),
            _ => Err(AppError::BadRequest(
                "Request body must be a JSON object".into(),
            )),
        }
    }
}

/// A video write body: scalar fields plus any uploaded files.
///
/// File checks (`file`, `mimetypes`, `max_file_size`) are recorded in
/// `file_errors` so they surface together with the field rules.
#[derive(Debug, Default)]
pub struct VideoPayload {
    pub fields: Map<String, Value>,
    pub files: Vec<(VideoFileField, StagedFile)>,
    pub file_errors: FieldErrors,
}

impl FromRequest<AppState> for VideoPayload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let JsonObject(fields) = JsonObject::from_request(req, state).await?;
            let mut payload = VideoPayload {
                fields,
                ..Default::default()
            };
            // Files can only arrive as multipart parts.
            for field in VideoFileField::ALL {
                if payload.fields.get(field.column()).is_some_and(|v| !v.is_null()) {
                    payload.file_errors.add_code(field.column(), "file");
                }
            }
            return Ok(payload);
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        read_multipart(multipart, state).await
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    state: &AppState,
) -> Result<VideoPayload, AppError> {
    let mut payload = VideoPayload::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if let Some(file_field) = VideoFileField::from_column(&name) {
            let Some(file_name) = field.file_name().map(str::to_string) else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.trim().is_empty() {
                    payload.file_errors.add_code(&name, "file");
                }
                continue;
            };

            let mime = field.content_type().unwrap_or("").to_string();
            if !file_field.accepts(&mime) {
                payload.file_errors.add(
                    &name,
                    Violation::with_params(
                        &name,
                        "mimetypes",
                        param("types", file_field.mime_types().join(",")),
                    ),
                );
                continue;
            }

            let max = file_field.max_bytes();
            let mut staged = state.storage.stage(extension_of(&file_name)).await?;
            let mut too_large = false;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?
            {
                if staged.size() + chunk.len() as u64 > max {
                    too_large = true;
                    break;
                }
                staged.write_chunk(&chunk).await?;
            }

            if too_large {
                payload.file_errors.add(
                    &name,
                    Violation::with_params(&name, "max_file_size", param("max", max)),
                );
                continue;
            }

            tracing::debug!(field = %name, bytes = staged.size(), "Staged upload");
            payload.files.retain(|(f, _)| *f != file_field);
            payload.files.push((file_field, staged));
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        insert_form_value(&mut payload.fields, &name, text);
    }

    Ok(payload)
}

/// Insert a form value; `key[]` entries accumulate into an array.
fn insert_form_value(fields: &mut Map<String, Value>, name: &str, text: String) {
    match name.strip_suffix("[]") {
        Some(key) => {
            let entry = fields
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match entry {
                Value::Array(items) => items.push(Value::String(text)),
                other => *other = Value::Array(vec![Value::String(text)]),
            }
        }
        None => {
            fields.insert(name.to_string(), Value::String(text));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
