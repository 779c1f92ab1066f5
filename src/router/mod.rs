//! Request routing: map `(method, path)` to a handler running against the store.
//!
//! Paths match exactly (no trailing-slash normalization, no parameters, no
//! query strings) and routes are tried in registration order. Requests that
//! match nothing get the canonical `404` body.
//!
//! | Method | Path     | Handler                                 |
//! |--------|----------|-----------------------------------------|
//! | POST   | `/add`   | append `newuser` from the body          |
//! | GET    | `/all`   | list the leading entries                |
//! | GET    | `/count` | number of entries                       |
//! | GET    | `/news`  | fixed text                              |
//! | GET    | `/last`  | most recent entry                       |
//! | POST   | `/reset` | truncate back to the baseline           |

mod handlers;

pub use handlers::{ALL_SLOTS, NEWS};

use tracing::{debug, warn};

use crate::http::{Method, ParsedRequest, Response, StatusCode};
use crate::store::{SharedStore, Store, StoreError};

/// A route handler.
///
/// Handlers run with the store lock held, so a handler's read and write of
/// the store are atomic with respect to every other request.
pub type Handler = fn(&ParsedRequest, &mut Store) -> Result<Response, StoreError>;

/// Behaviour switches for the built-in route table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    /// Make `/all` fail with `409` unless [`ALL_SLOTS`] entries exist,
    /// instead of listing however many there are.
    pub strict_all: bool,
}

// A single registered route binding a method + exact path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        &self.method == method && self.path == path
    }
}

/// Dispatches parsed requests to handlers that operate on a [`SharedStore`].
///
/// # Examples
///
/// ```
/// use userbox::http::{ParsedRequest, StatusCode};
/// use userbox::router::{Router, RouterOptions};
/// use userbox::store::Store;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let router = Router::users(Store::default().into_shared(), RouterOptions::default());
///
/// let request = ParsedRequest::parse(b"GET /count HTTP/1.1\r\n\r\n").unwrap();
/// let response = router.dispatch(&request).await;
/// assert_eq!(response.status(), StatusCode::Ok);
/// assert_eq!(response.body(), br#"{"count":2}"#);
/// # }
/// ```
pub struct Router {
    routes: Vec<Route>,
    store: SharedStore,
}

impl Router {
    /// Creates a router with no routes.
    pub fn new(store: SharedStore) -> Self {
        Self {
            routes: Vec::new(),
            store,
        }
    }

    /// Creates a router with the full users table registered.
    pub fn users(store: SharedStore, options: RouterOptions) -> Self {
        let mut router = Self::new(store);
        router.post("/add", handlers::add_user);
        if options.strict_all {
            router.get("/all", handlers::all_users_strict);
        } else {
            router.get("/all", handlers::all_users);
        }
        router.get("/count", handlers::count);
        router.get("/news", handlers::news);
        router.get("/last", handlers::last_user);
        router.post("/reset", handlers::reset);
        router
    }

    /// Register a handler for `GET` requests to `path`.
    pub fn get(&mut self, path: &str, handler: Handler) {
        self.add_route(Method::Get, path, handler);
    }

    /// Register a handler for `POST` requests to `path`.
    pub fn post(&mut self, path: &str, handler: Handler) {
        self.add_route(Method::Post, path, handler);
    }

    fn add_route(&mut self, method: Method, path: &str, handler: Handler) {
        self.routes.push(Route {
            method,
            path: path.to_owned(),
            handler,
        });
    }

    /// Return the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The store this router mutates.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Dispatch `request` to the first matching route and return its response.
    ///
    /// Store errors become `409 Conflict` responses with an `{"error": ...}`
    /// body; unknown routes become `404 Not Found`. This never fails.
    pub async fn dispatch(&self, request: &ParsedRequest) -> Response {
        let Some(route) = self
            .routes
            .iter()
            .find(|route| route.matches(request.method(), request.path()))
        else {
            debug!(method = %request.method(), path = request.path(), "no route");
            return Response::not_found();
        };

        let mut store = self.store.lock().await;
        match (route.handler)(request, &mut store) {
            Ok(response) => response,
            Err(e) => {
                warn!(path = request.path(), error = %e, "store rejected request");
                Response::error(status_for(&e), &e.to_string())
            }
        }
    }
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Full { .. } | StoreError::Empty | StoreError::InsufficientEntries { .. } => {
            StatusCode::Conflict
        }
        StoreError::BaselineExceedsCapacity { .. } => StatusCode::InternalServerError,
    }
}
