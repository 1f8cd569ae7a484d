//! # Trellis Dependency Injection
//!
//! The container contract the dispatcher consumes when it resolves handler
//! arguments of a class type.
//!
//! The dispatcher only ever asks a [`Container`] to *resolve by type* (or, for
//! controller targets, by name). How instances are constructed is the
//! container's business; [`ServiceContainer`] is a small default that holds
//! singletons and factories.
//!
//! Two categories get special treatment during argument resolution:
//!
//! - **Input validators** ([`InputValidator`]) build a validated input object
//!   from the request or reject it with a list of messages.
//! - **Model binders** ([`ModelBinder`]) look up a persisted record by the
//!   value of the route parameter with the same name as the handler argument.
//!
//! ## Example
//!
//! ```
//! use trellis_di::{Container, ServiceContainer, TypeKey};
//!
//! struct Mailer {
//!     from: &'static str,
//! }
//!
//! let container = ServiceContainer::new();
//! container.register(Mailer { from: "noreply@example.com" });
//!
//! let service = container.resolve(&TypeKey::of::<Mailer>()).unwrap();
//! let mailer = service.downcast::<Mailer>().unwrap();
//! assert_eq!(mailer.from, "noreply@example.com");
//! ```

mod binding;
mod container;
mod key;

pub use binding::{InputValidator, ModelBinder};
pub use container::{Container, ServiceContainer};
pub use key::TypeKey;

use std::any::Any;
use std::sync::Arc;

/// A type-erased service instance
pub type Service = Arc<dyn Any + Send + Sync>;

pub use trellis_exception::{Error, Result};
