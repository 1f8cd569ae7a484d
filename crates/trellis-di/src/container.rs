//! Resolve-by-type container

use crate::{InputValidator, ModelBinder, Service, TypeKey};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// What the dispatcher needs from a dependency container.
///
/// Only [`resolve`](Container::resolve) is required. The remaining lookups
/// default to "not available".
pub trait Container: Send + Sync {
	/// Resolve an instance of the given type
	fn resolve(&self, key: &TypeKey) -> Option<Service>;

	/// Resolve a named entry, used for controller targets such as `"UserController"`
	fn resolve_named(&self, _name: &str) -> Option<Service> {
		None
	}

	fn model_binder(&self, _key: &TypeKey) -> Option<Arc<dyn ModelBinder>> {
		None
	}

	fn input_validator(&self, _key: &TypeKey) -> Option<Arc<dyn InputValidator>> {
		None
	}
}

type Factory = Arc<dyn Fn() -> Service + Send + Sync>;

/// Default container: singletons, factories, named entries and bindings.
///
/// Registration takes `&self` so a container can be shared behind an `Arc`
/// while it is being populated.
#[derive(Default)]
pub struct ServiceContainer {
	singletons: RwLock<HashMap<TypeKey, Service>>,
	factories: RwLock<HashMap<TypeKey, Factory>>,
	named: RwLock<HashMap<String, Service>>,
	models: RwLock<HashMap<TypeKey, Arc<dyn ModelBinder>>>,
	validators: RwLock<HashMap<TypeKey, Arc<dyn InputValidator>>>,
}

impl ServiceContainer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a shared instance of `T`
	pub fn register<T: Any + Send + Sync>(&self, value: T) {
		self.register_arc(Arc::new(value));
	}

	/// Register a pre-wrapped `Arc<T>`
	pub fn register_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
		let mut singletons = self.singletons.write().unwrap_or_else(PoisonError::into_inner);
		singletons.insert(TypeKey::of::<T>(), value);
	}

	/// Register a factory producing a fresh `T` on every resolution
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::{Container, ServiceContainer, TypeKey};
	/// use std::sync::Arc;
	///
	/// let container = ServiceContainer::new();
	/// container.register_factory(|| Vec::<u8>::with_capacity(16));
	///
	/// let a = container.get::<Vec<u8>>().unwrap();
	/// let b = container.get::<Vec<u8>>().unwrap();
	/// assert!(!Arc::ptr_eq(&a, &b));
	/// ```
	pub fn register_factory<T, F>(&self, factory: F)
	where
		T: Any + Send + Sync,
		F: Fn() -> T + Send + Sync + 'static,
	{
		let factory: Factory = Arc::new(move || Arc::new(factory()) as Service);
		let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
		factories.insert(TypeKey::of::<T>(), factory);
	}

	/// Register an entry looked up by name
	pub fn register_named(&self, name: impl Into<String>, service: Service) {
		let mut named = self.named.write().unwrap_or_else(PoisonError::into_inner);
		named.insert(name.into(), service);
	}

	/// Route-bound parameters of type `T` are looked up through `binder`
	pub fn bind_model<T: ?Sized + 'static>(&self, binder: impl ModelBinder + 'static) {
		let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
		models.insert(TypeKey::of::<T>(), Arc::new(binder));
	}

	/// Parameters of type `T` are built and validated by `validator`
	pub fn bind_validator<T: ?Sized + 'static>(&self, validator: impl InputValidator + 'static) {
		let mut validators = self.validators.write().unwrap_or_else(PoisonError::into_inner);
		validators.insert(TypeKey::of::<T>(), Arc::new(validator));
	}

	/// Typed convenience over [`Container::resolve`]
	pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.resolve(&TypeKey::of::<T>())
			.and_then(|service| service.downcast::<T>().ok())
	}

	pub fn contains<T: Any + Send + Sync>(&self) -> bool {
		let key = TypeKey::of::<T>();
		self.singletons
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(&key)
			|| self
				.factories
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.contains_key(&key)
	}
}

impl Container for ServiceContainer {
	fn resolve(&self, key: &TypeKey) -> Option<Service> {
		if let Some(service) = self
			.singletons
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
		{
			return Some(service.clone());
		}

		// Clone the factory out so it runs without holding the lock
		let factory = self
			.factories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned();
		match factory {
			Some(factory) => Some(factory()),
			None => {
				tracing::trace!(service = %key, "service not registered");
				None
			}
		}
	}

	fn resolve_named(&self, name: &str) -> Option<Service> {
		self.named
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(name)
			.cloned()
	}

	fn model_binder(&self, key: &TypeKey) -> Option<Arc<dyn ModelBinder>> {
		self.models
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned()
	}

	fn input_validator(&self, key: &TypeKey) -> Option<Arc<dyn InputValidator>> {
		self.validators
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned()
	}
}
