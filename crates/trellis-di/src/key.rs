use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a service type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried along
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Key for the type `T`
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::TypeKey;
	///
	/// struct Db;
	///
	/// assert_eq!(TypeKey::of::<Db>(), TypeKey::of::<Db>());
	/// assert_ne!(TypeKey::of::<Db>(), TypeKey::of::<String>());
	/// assert!(TypeKey::of::<Db>().name().ends_with("Db"));
	/// ```
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	/// Full type path, as reported by `std::any::type_name`
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Last path segment of the type name
	pub fn short_name(&self) -> &'static str {
		let base = self.name.split('<').next().unwrap_or(self.name);
		base.rsplit("::").next().unwrap_or(base)
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({})", self.name)
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}
