use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{revisions::FilteredPage, view::CommitView};

#[derive(::serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

impl<'a, T> Default for Envelope<'a, T> {
    fn default() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            pagination: None,
            deleted: None,
        }
    }
}

#[derive(::serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    cursor: Option<String>,
    has_more: bool,
    limit: usize,
    count: usize,
}

pub fn data<T: ::serde::Serialize>(data: T) -> Response {
    json(StatusCode::OK, Envelope {
        data: Some(data),
        ..Envelope::default()
    })
}

pub fn message(message: &str) -> Response {
    json(StatusCode::OK, Envelope::<()> {
        message: Some(message),
        ..Envelope::default()
    })
}

pub fn updated(deleted: bool) -> Response {
    json(StatusCode::OK, Envelope::<()> {
        message: Some("Gist updated"),
        deleted: Some(deleted),
        ..Envelope::default()
    })
}

pub fn page(page: FilteredPage, limit: usize) -> Response {
    let has_more = page.has_more();
    let FilteredPage {
        revisions,
        next_cursor,
    } = page;

    let pagination = Pagination {
        cursor: next_cursor,
        has_more,
        limit,
        count: revisions.len(),
    };

    json(StatusCode::OK, Envelope {
        data: Some(
            revisions
                .into_iter()
                .map(CommitView::from)
                .collect::<Vec<_>>(),
        ),
        pagination: Some(pagination),
        ..Envelope::default()
    })
}

pub fn failure(status: StatusCode, message: &str) -> Response {
    json(status, Envelope::<()> {
        success: false,
        message: Some(message),
        ..Envelope::default()
    })
}

fn json<T: ::serde::Serialize>(status: StatusCode, envelope: Envelope<'_, T>) -> Response {
    (status, Json(envelope)).into_response()
}
