use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use quire_gate::UnlockOutcome;
use quire_store::{
    ImageRejection, ImageUpload, PasswordChange, PublicationId, PublicationRecord, PublishOutcome,
    PublishRequest, RejectionReason,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::require_producer;
use crate::error::{ServerError, ServerResult};
use crate::session::session_cookie;
use crate::state::AppState;

/// Run blocking filesystem or hashing work off the async workers.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

/// Identifiers that do not parse cannot exist.
fn parse_id(raw: &str) -> ServerResult<PublicationId> {
    PublicationId::parse(raw).map_err(|_| ServerError::NotFound)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub filename: String,
    pub media_type: String,
    /// Standard base64 with padding.
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishBody {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub origin_path: Option<String>,
    pub content: String,
    /// Plain-text password to protect the publication with.
    #[serde(default)]
    pub password: Option<String>,
    /// Remove any existing password.
    #[serde(default)]
    pub clear_password: bool,
    #[serde(default)]
    pub images: Vec<ImageBody>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    #[serde(flatten)]
    pub outcome: PublishOutcome,
    /// Reader path of the publication.
    pub url: String,
}

/// Producer-facing view of a record; never exposes the password hash.
#[derive(Debug, Serialize)]
pub struct PublicationView {
    pub id: PublicationId,
    pub filename: String,
    pub title: Option<String>,
    pub origin_path: Option<String>,
    pub protected: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PublicationRecord> for PublicationView {
    fn from(r: PublicationRecord) -> Self {
        Self {
            id: r.id,
            protected: r.is_protected(),
            filename: r.filename,
            title: r.title,
            origin_path: r.origin_path,
            images: r.images,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: PublicationId,
    pub title: Option<String>,
    /// Raw markdown; rendering happens downstream.
    pub markdown: String,
    pub images: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockBody {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub outcome: UnlockOutcome,
}

// ---------------------------------------------------------------------------
// Producer API
// ---------------------------------------------------------------------------

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /v1/publications`: create, or replace by filename.
pub async fn publish_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PublishBody>,
) -> ServerResult<(StatusCode, Json<PublishResponse>)> {
    require_producer(state.auth.as_ref(), &headers).await?;

    let new_password = match (body.password, body.clear_password) {
        (Some(_), true) => {
            return Err(ServerError::BadRequest(
                "password and clear_password are mutually exclusive".into(),
            ))
        }
        (Some(pw), false) if pw.is_empty() => {
            return Err(ServerError::BadRequest("password must not be empty".into()))
        }
        (pw, _) => pw,
    };

    let mut request = PublishRequest::new(body.filename, body.content);
    request.title = body.title;
    request.origin_path = body.origin_path;
    if body.clear_password {
        request.password = PasswordChange::Clear;
    }

    let mut undecodable = Vec::new();
    for image in body.images {
        match STANDARD.decode(image.data.as_bytes()) {
            Ok(data) => {
                request = request.with_image(ImageUpload::new(image.filename, image.media_type, data))
            }
            Err(e) => {
                warn!(image = %image.filename, error = %e, "rejected image: undecodable");
                undecodable.push(ImageRejection {
                    filename: image.filename,
                    reason: RejectionReason::Undecodable,
                });
            }
        }
    }

    let store = state.store.clone();
    let gateway = state.gateway.clone();
    let mut outcome = blocking(move || {
        if let Some(password) = new_password {
            request.password = PasswordChange::Set(gateway.verifier().hash(&password)?);
        }
        Ok(store.publish(request)?)
    })
    .await?;
    outcome.save.rejections.extend(undecodable);

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let url = format!("/p/{}", outcome.id);
    Ok((status, Json(PublishResponse { outcome, url })))
}

/// `GET /v1/publications/by-filename/:filename`
pub async fn lookup_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> ServerResult<Json<PublicationView>> {
    require_producer(state.auth.as_ref(), &headers).await?;
    let store = state.store.clone();
    let record = blocking(move || Ok(store.lookup_by_filename(&filename)?))
        .await?
        .ok_or(ServerError::NotFound)?;
    Ok(Json(record.into()))
}

/// `DELETE /v1/publications/:id`
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ServerResult<StatusCode> {
    require_producer(state.auth.as_ref(), &headers).await?;
    let id = parse_id(&raw_id)?;

    let store = state.store.clone();
    if blocking(move || Ok(store.delete(&id)?)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Reader routes
// ---------------------------------------------------------------------------

/// `GET /p/:id`
pub async fn read_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ServerResult<Json<DocumentResponse>> {
    let id = parse_id(&raw_id)?;
    let session = state.sessions.resolve(&headers)?;

    let store = state.store.clone();
    let gateway = state.gateway.clone();
    blocking(move || {
        let record = store.lookup_by_id(&id)?.ok_or(ServerError::NotFound)?;
        if !gateway.access_state(&session.unlocks, &record).is_readable() {
            return Err(ServerError::Locked);
        }
        let markdown = store.read_content(&id)?.ok_or(ServerError::NotFound)?;
        Ok(Json(DocumentResponse {
            id,
            title: record.title,
            markdown,
            images: record.images,
            updated_at: record.updated_at,
        }))
    })
    .await
}

/// `POST /p/:id/unlock`
pub async fn unlock_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Json(body): Json<UnlockBody>,
) -> ServerResult<Response> {
    let id = parse_id(&raw_id)?;
    let mut session = state.sessions.resolve(&headers)?;

    let store = state.store.clone();
    let gateway = state.gateway.clone();
    let (outcome, session) = blocking(move || {
        let record = store.lookup_by_id(&id)?.ok_or(ServerError::NotFound)?;
        let outcome = gateway.verify_and_unlock(&mut session.unlocks, &record, &body.password)?;
        Ok((outcome, session))
    })
    .await?;

    match outcome {
        UnlockOutcome::Throttled => Err(ServerError::Throttled),
        UnlockOutcome::WrongPassword => Err(ServerError::WrongPassword),
        UnlockOutcome::Unlocked => {
            state.sessions.save(&session)?;
            info!(id = %id, new_session = session.is_new, "session unlocked publication");
            let mut response = Json(UnlockResponse { outcome }).into_response();
            let cookie = HeaderValue::from_str(&session_cookie(&session.token))
                .map_err(|e| ServerError::Internal(e.to_string()))?;
            response.headers_mut().insert(header::SET_COOKIE, cookie);
            Ok(response)
        }
        UnlockOutcome::Open | UnlockOutcome::AlreadyUnlocked => {
            Ok(Json(UnlockResponse { outcome }).into_response())
        }
    }
}

/// `GET /p/:id/images/:name`, gated like the document.
pub async fn image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((raw_id, name)): Path<(String, String)>,
) -> ServerResult<Response> {
    let id = parse_id(&raw_id)?;
    let session = state.sessions.resolve(&headers)?;

    let store = state.store.clone();
    let gateway = state.gateway.clone();
    let image = blocking(move || {
        let record = store.lookup_by_id(&id)?.ok_or(ServerError::NotFound)?;
        if !gateway.access_state(&session.unlocks, &record).is_readable() {
            return Err(ServerError::Locked);
        }
        store.read_image(&id, &name)?.ok_or(ServerError::NotFound)
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.media_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        image.data,
    )
        .into_response())
}
