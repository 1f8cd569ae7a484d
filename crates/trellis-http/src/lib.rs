//! # Trellis HTTP
//!
//! The HTTP message abstraction consumed by the router and dispatcher.
//!
//! The transport layer is out of scope: a server adapter builds a [`Request`]
//! (with host, scheme, parsed body fields and uploaded files already available)
//! and turns the returned [`Response`] back into wire bytes.
//!
//! ## Handler
//!
//! ```rust
//! use trellis_http::{Handler, Request, Response};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _request: Request) -> trellis_exception::Result<Response> {
//!         Ok(Response::ok().with_body("Hello!"))
//!     }
//! }
//! ```

mod extensions;
mod middleware;
mod request;
mod response;
mod upload;

pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use upload::UploadedFile;

pub use trellis_exception::{Error, Result};
