//! # userbox
//!
//! A tiny in-memory list of integer "users" served over hand-parsed HTTP/1.1.
//!
//! A request flows through the crate as:
//!
//! ```text
//! bytes -> http::ParsedRequest -> router::Router -> store::Store -> http::Response -> bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use userbox::router::{Router, RouterOptions};
//! use userbox::server::Server;
//! use userbox::store::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::users(Store::default().into_shared(), RouterOptions::default());
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server.run(router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extract;
pub mod http;
pub mod router;
pub mod server;
pub mod store;

pub use config::{Config, ConfigError};
pub use http::{Method, ParseError, ParsedRequest, Response, StatusCode};
pub use router::{Router, RouterOptions};
pub use server::{ConnectionLimits, Server, ServerError};
pub use store::{SharedStore, Store, StoreError};
