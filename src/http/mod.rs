use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use percent_encoding::percent_decode_str;

use crate::{
    gists::{CreateGist, Gists, UpdateGist},
    revisions::DEFAULT_LIMIT,
    source::GistStore,
};

mod error;
pub use error::ApiError;

mod reply;

/// The largest request body we'll read
pub const BODY_LIMIT: usize = 100 * 1024;

type Shared<S> = State<Arc<Gists<S>>>;

pub async fn serve<S>(addr: SocketAddr, gists: Gists<S>) -> anyhow::Result<()>
where
    S: GistStore + 'static,
{
    let app = router(Arc::new(gists));

    let server = axum::Server::try_bind(&addr)?.serve(app.into_make_service());
    log::info!("listening on http://{}", server.local_addr());

    server
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("cannot listen for ctrl-c: {err}");
                std::future::pending::<()>().await
            }
            log::info!("shutting down");
        })
        .await
        .map_err(Into::into)
}

pub fn router<S>(gists: Arc<Gists<S>>) -> Router
where
    S: GistStore + 'static,
{
    Router::new()
        .route("/gists", post(create::<S>))
        .route(
            "/gists/:id",
            get(get_gist::<S>).delete(delete::<S>).patch(update::<S>),
        )
        .route("/gists/:id/commits", get(commits::<S>))
        .route("/gists/:id/:sha", get(revision::<S>))
        .route("/gists/:id/file-versions/:file", get(file_revisions::<S>))
        .route(
            "/gists/:id/file/:file/compare/:version_a/:version_b",
            get(compare::<S>),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(reject_dot_segments))
        .layer(middleware::from_fn(log_requests))
        .with_state(gists)
}

async fn log_requests<B>(req: Request<B>, next: Next<B>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;
    log::info!("{method} {path} -> {}", resp.status());
    resp
}

// `.` and `..` would be collapsed when joined onto the upstream url
async fn reject_dot_segments<B>(req: Request<B>, next: Next<B>) -> Response {
    if has_dot_segment(req.uri().path()) {
        return ApiError::NotFound("Not found").into_response();
    }
    next.run(req).await
}

fn has_dot_segment(path: &str) -> bool {
    path.split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
        .any(|segment| segment == "." || segment == "..")
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

async fn create<S: GistStore>(
    State(gists): Shared<S>,
    body: Result<Json<CreateGist>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    Ok(reply::data(gists.create(body).await?))
}

async fn get_gist<S: GistStore>(
    State(gists): Shared<S>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(reply::data(gists.get(&id).await?))
}

async fn delete<S: GistStore>(
    State(gists): Shared<S>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gists.delete(&id).await?;
    Ok(reply::message("Gist deleted"))
}

async fn update<S: GistStore>(
    State(gists): Shared<S>,
    Path(id): Path<String>,
    body: Result<Json<UpdateGist>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let updated = gists.update(&id, body).await?;
    Ok(reply::updated(updated.deleted))
}

#[derive(::serde::Deserialize)]
struct CommitsQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

async fn commits<S: GistStore>(
    State(gists): Shared<S>,
    Path(id): Path<String>,
    query: Result<Query<CommitsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(CommitsQuery { page, per_page }) = query?;
    Ok(reply::data(gists.commits(&id, per_page, page).await?))
}

async fn revision<S: GistStore>(
    State(gists): Shared<S>,
    Path((id, sha)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    Ok(reply::data(gists.revision(&id, &sha).await?))
}

#[derive(::serde::Deserialize)]
struct FileRevisionsQuery {
    cursor: Option<String>,
    limit: Option<usize>,
}

async fn file_revisions<S: GistStore>(
    State(gists): Shared<S>,
    Path((id, file)): Path<(String, String)>,
    query: Result<Query<FileRevisionsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(FileRevisionsQuery { cursor, limit }) = query?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    // an empty cursor starts from the newest revision
    let cursor = cursor.as_deref().filter(|c| !c.is_empty());
    let page = gists.file_revisions(&id, &file, cursor, limit).await?;
    Ok(reply::page(page, limit))
}

async fn compare<S: GistStore>(
    State(gists): Shared<S>,
    Path((id, file, version_a, version_b)): Path<(String, String, String, String)>,
) -> Result<Response, ApiError> {
    let version_b = (version_b != "null").then_some(version_b);
    let cmp = gists
        .compare(&id, &file, &version_a, version_b.as_deref())
        .await
        .map_err(|err| ApiError::from(err).not_found("Gist or file not found"))?;
    Ok(reply::data(cmp))
}
