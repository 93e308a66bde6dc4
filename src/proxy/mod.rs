//! Backend Passthrough Module
//!
//! Thin endpoints that forward catalogue requests to the backend API so the
//! browser only ever talks to this service. Each call is forwarded as-is. Any
//! upstream failure (transport, timeout, or non-2xx) is replaced by a generic
//! `500` with a `statusMessage` naming the operation.
//!
//! # Routes
//!
//! - `GET    /{resource}`       -> `GET    {backend}/api/{resource}`
//! - `POST   /{resource}`       -> `POST   {backend}/api/{resource}`
//! - `PATCH  /{resource}/{id}`  -> `PATCH  {backend}/api/{resource}/{id}`
//! - `DELETE /{resource}/{id}`  -> `DELETE {backend}/api/{resource}/{id}`
//!
//! Only resources listed in the proxy config are forwarded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use katalog::proxy;
//!
//! let app = Router::new()
//!     .nest("/api", proxy::routes())
//!     .with_state(ProxyState::new(client, resources, read, write));
//! ```

mod handler;
mod routes;

pub use handler::ProxyState;
pub use routes::routes;
