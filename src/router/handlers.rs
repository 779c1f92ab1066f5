use serde::Serialize;
use tracing::debug;

use crate::extract::{int_field, str_field};
use crate::http::response::APPLICATION_JSON;
use crate::http::{ParsedRequest, Response, StatusCode};
use crate::store::{Store, StoreError};

/// Number of entries `/all` reports.
pub const ALL_SLOTS: usize = 5;

/// Body of `/news`.
pub const NEWS: &str = "newssssssssssssssssssssssssssss!!";

#[derive(Serialize)]
struct Added {
    success: bool,
    added: i32,
    total: u32,
    count: usize,
}

#[derive(Serialize)]
struct Users {
    users: Vec<i32>,
    count: usize,
}

#[derive(Serialize)]
struct Count {
    count: usize,
}

#[derive(Serialize)]
struct Last {
    last: i32,
}

#[derive(Serialize)]
struct Reset {
    reset: bool,
    count: usize,
}

pub(super) fn add_user(request: &ParsedRequest, store: &mut Store) -> Result<Response, StoreError> {
    let body = request.body_text();
    // Without a body the value defaults to 0 and is still appended.
    let (value, name) = if request.content_length() > 0 && !body.is_empty() {
        (int_field(&body, "newuser"), str_field(&body, "name"))
    } else {
        (0, String::new())
    };

    let count = store.add(value)?;
    debug!(value, name = %name, count, "user added");

    Ok(Response::json(
        StatusCode::Ok,
        &Added {
            success: true,
            added: value,
            total: store.added(),
            count,
        },
    ))
}

pub(super) fn all_users(_: &ParsedRequest, store: &mut Store) -> Result<Response, StoreError> {
    let mut users = store.snapshot();
    users.truncate(ALL_SLOTS);
    Ok(Response::json(
        StatusCode::Ok,
        &Users {
            users,
            count: store.count(),
        },
    ))
}

pub(super) fn all_users_strict(
    _: &ParsedRequest,
    store: &mut Store,
) -> Result<Response, StoreError> {
    let users = store.leading(ALL_SLOTS)?;
    Ok(Response::json(
        StatusCode::Ok,
        &Users {
            users,
            count: store.count(),
        },
    ))
}

pub(super) fn count(_: &ParsedRequest, store: &mut Store) -> Result<Response, StoreError> {
    Ok(Response::json(
        StatusCode::Ok,
        &Count {
            count: store.count(),
        },
    ))
}

pub(super) fn news(_: &ParsedRequest, _: &mut Store) -> Result<Response, StoreError> {
    Ok(Response::text(StatusCode::Ok, APPLICATION_JSON, NEWS))
}

pub(super) fn last_user(_: &ParsedRequest, store: &mut Store) -> Result<Response, StoreError> {
    let last = store.last()?;
    Ok(Response::json(StatusCode::Ok, &Last { last }))
}

pub(super) fn reset(_: &ParsedRequest, store: &mut Store) -> Result<Response, StoreError> {
    let outcome = store.reset();
    if outcome.reset {
        debug!(count = outcome.count, "store reset to baseline");
    }
    Ok(Response::json(
        StatusCode::Ok,
        &Reset {
            reset: outcome.reset,
            count: outcome.count,
        },
    ))
}
