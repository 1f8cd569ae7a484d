//! Handler references and parameter descriptors.
//!
//! A route points at its handler through a [`HandlerRef`]. Only the
//! [`HandlerRef::Closure`] variant carries code; every other variant is data
//! that the dispatcher resolves through the dependency container at request
//! time, which is what keeps a route table serialisable.
//!
//! Handlers declare their parameters up front as a list of
//! [`ParamDescriptor`]s. The dispatcher resolves one [`Argument`] per
//! descriptor, in declaration order, and hands the handler an
//! [`Arguments`] bundle.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use trellis_di::{Service, ServiceContainer, TypeKey};
use trellis_exception::Result;
use trellis_http::{Handler, Request, Response, UploadedFile};

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
	/// The current request
	Request,
	/// A fresh response builder
	ResponseBuilder,
	/// A container-managed type (service, validated input or bound model)
	Class(TypeKey),
	Int,
	Float,
	Bool,
	Str,
	Array,
	/// Backed enumeration as `(case name, backing value)` pairs
	Enum(Vec<(String, String)>),
	File,
	/// Any value, passed through uncoerced
	Mixed,
}

impl TypeTag {
	/// Short name used in diagnostics
	pub fn name(&self) -> &str {
		match self {
			TypeTag::Request => "Request",
			TypeTag::ResponseBuilder => "Response",
			TypeTag::Class(key) => key.short_name(),
			TypeTag::Int => "int",
			TypeTag::Float => "float",
			TypeTag::Bool => "bool",
			TypeTag::Str => "string",
			TypeTag::Array => "array",
			TypeTag::Enum(_) => "enum",
			TypeTag::File => "file",
			TypeTag::Mixed => "mixed",
		}
	}

	pub fn is_scalar(&self) -> bool {
		matches!(
			self,
			TypeTag::Int
				| TypeTag::Float
				| TypeTag::Bool
				| TypeTag::Str
				| TypeTag::Array
				| TypeTag::Enum(_)
				| TypeTag::Mixed
		)
	}
}

/// A handler parameter, described once at registration.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::{ParamDescriptor, TypeTag};
///
/// let page = ParamDescriptor::int("page").default_value(1);
/// assert_eq!(page.type_tag, TypeTag::Int);
/// assert!(page.has_default());
///
/// let search = ParamDescriptor::string("q").nullable();
/// assert!(search.nullable);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
	pub name: String,
	pub type_tag: TypeTag,
	pub nullable: bool,
	pub default: Option<Value>,
	pub variadic: bool,
}

impl ParamDescriptor {
	pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
		Self {
			name: name.into(),
			type_tag,
			nullable: false,
			default: None,
			variadic: false,
		}
	}

	pub fn request(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Request)
	}

	pub fn response(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::ResponseBuilder)
	}

	/// A parameter resolved through the container as `T`
	pub fn class<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Class(TypeKey::of::<T>()))
	}

	pub fn int(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Int)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Float)
	}

	pub fn bool(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Bool)
	}

	pub fn string(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Str)
	}

	pub fn array(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Array)
	}

	/// A backed enumeration given as `(case, backing value)` pairs
	pub fn enumeration<I, C, B>(name: impl Into<String>, cases: I) -> Self
	where
		I: IntoIterator<Item = (C, B)>,
		C: Into<String>,
		B: Into<String>,
	{
		let cases = cases
			.into_iter()
			.map(|(case, backing)| (case.into(), backing.into()))
			.collect();
		Self::new(name, TypeTag::Enum(cases))
	}

	pub fn file(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::File)
	}

	pub fn mixed(name: impl Into<String>) -> Self {
		Self::new(name, TypeTag::Mixed)
	}

	pub fn nullable(mut self) -> Self {
		self.nullable = true;
		self
	}

	pub fn default_value(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}

	/// Collect every route parameter not bound to an earlier parameter
	pub fn variadic(mut self) -> Self {
		self.variadic = true;
		self
	}

	pub fn has_default(&self) -> bool {
		self.default.is_some()
	}
}

/// A resolved handler argument.
#[derive(Clone)]
pub enum Argument {
	Request(Request),
	Response(Response),
	Service(Service),
	Value(Value),
	File(UploadedFile),
	Null,
	Variadic(Vec<Value>),
}

impl fmt::Debug for Argument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Argument::Request(request) => f
				.debug_tuple("Request")
				.field(&request.method)
				.field(&request.path())
				.finish(),
			Argument::Response(response) => f.debug_tuple("Response").field(response).finish(),
			Argument::Service(_) => f.write_str("Service(..)"),
			Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Argument::File(file) => f.debug_tuple("File").field(&file.file_name).finish(),
			Argument::Null => f.write_str("Null"),
			Argument::Variadic(values) => f.debug_tuple("Variadic").field(values).finish(),
		}
	}
}

/// Arguments resolved for one handler invocation, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
	entries: Vec<(String, Argument)>,
}

impl Arguments {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, name: impl Into<String>, argument: Argument) {
		self.entries.push((name.into(), argument));
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&Argument> {
		self.entries
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, argument)| argument)
	}

	/// Argument at a declaration position
	pub fn at(&self, position: usize) -> Option<&Argument> {
		self.entries.get(position).map(|(_, argument)| argument)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
		self.entries.iter().map(|(n, a)| (n.as_str(), a))
	}

	pub fn value(&self, name: &str) -> Option<&Value> {
		match self.get(name)? {
			Argument::Value(value) => Some(value),
			_ => None,
		}
	}

	pub fn int(&self, name: &str) -> Option<i64> {
		self.value(name).and_then(Value::as_i64)
	}

	pub fn float(&self, name: &str) -> Option<f64> {
		self.value(name).and_then(Value::as_f64)
	}

	pub fn bool(&self, name: &str) -> Option<bool> {
		self.value(name).and_then(Value::as_bool)
	}

	pub fn str(&self, name: &str) -> Option<&str> {
		self.value(name).and_then(Value::as_str)
	}

	/// Container-resolved argument downcast to `T`
	pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		match self.get(name)? {
			Argument::Service(service) => service.clone().downcast::<T>().ok(),
			_ => None,
		}
	}

	/// The first request argument
	pub fn request(&self) -> Option<&Request> {
		self.entries.iter().find_map(|(_, argument)| match argument {
			Argument::Request(request) => Some(request),
			_ => None,
		})
	}

	/// The first response builder argument
	pub fn response(&self) -> Option<&Response> {
		self.entries.iter().find_map(|(_, argument)| match argument {
			Argument::Response(response) => Some(response),
			_ => None,
		})
	}

	pub fn file(&self, name: &str) -> Option<&UploadedFile> {
		match self.get(name)? {
			Argument::File(file) => Some(file),
			_ => None,
		}
	}

	pub fn variadic(&self, name: &str) -> Option<&[Value]> {
		match self.get(name)? {
			Argument::Variadic(values) => Some(values),
			_ => None,
		}
	}

	pub fn is_null(&self, name: &str) -> bool {
		matches!(self.get(name), Some(Argument::Null))
	}
}

/// What a handler produced, before response normalization.
#[derive(Debug, Clone)]
pub enum HandlerReturn {
	Response(Response),
	Value(Value),
	/// A value rendered through its string representation
	Display(String),
	/// A value with no response representation, carrying its type name
	Opaque(&'static str),
}

impl HandlerReturn {
	pub fn display(value: impl fmt::Display) -> Self {
		HandlerReturn::Display(value.to_string())
	}

	pub fn opaque<T: ?Sized>() -> Self {
		HandlerReturn::Opaque(std::any::type_name::<T>())
	}
}

impl From<Response> for HandlerReturn {
	fn from(response: Response) -> Self {
		HandlerReturn::Response(response)
	}
}

impl From<Value> for HandlerReturn {
	fn from(value: Value) -> Self {
		HandlerReturn::Value(value)
	}
}

impl From<String> for HandlerReturn {
	fn from(value: String) -> Self {
		HandlerReturn::Value(Value::String(value))
	}
}

impl From<&str> for HandlerReturn {
	fn from(value: &str) -> Self {
		HandlerReturn::Value(Value::String(value.to_string()))
	}
}

impl From<bool> for HandlerReturn {
	fn from(value: bool) -> Self {
		HandlerReturn::Value(Value::Bool(value))
	}
}

impl From<i64> for HandlerReturn {
	fn from(value: i64) -> Self {
		HandlerReturn::Value(Value::from(value))
	}
}

impl From<i32> for HandlerReturn {
	fn from(value: i32) -> Self {
		HandlerReturn::Value(Value::from(value))
	}
}

impl From<u64> for HandlerReturn {
	fn from(value: u64) -> Self {
		HandlerReturn::Value(Value::from(value))
	}
}

impl From<f64> for HandlerReturn {
	fn from(value: f64) -> Self {
		HandlerReturn::Value(Value::from(value))
	}
}

impl From<()> for HandlerReturn {
	fn from(_: ()) -> Self {
		HandlerReturn::Value(Value::Null)
	}
}

type ActionFn = dyn Fn(Arguments) -> BoxFuture<'static, Result<HandlerReturn>> + Send + Sync;

/// A callable handler together with its parameter list.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::{Action, ParamDescriptor};
///
/// let show = Action::new(vec![ParamDescriptor::int("id")], |args| async move {
///     Ok(format!("user {}", args.int("id").unwrap_or_default()))
/// });
/// assert_eq!(show.params().len(), 1);
/// ```
#[derive(Clone)]
pub struct Action {
	params: Arc<[ParamDescriptor]>,
	func: Arc<ActionFn>,
}

impl Action {
	pub fn new<F, Fut, R>(params: Vec<ParamDescriptor>, func: F) -> Self
	where
		F: Fn(Arguments) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<R>> + Send + 'static,
		R: Into<HandlerReturn>,
	{
		let func: Arc<ActionFn> =
			Arc::new(move |args| func(args).map(|result| result.map(Into::into)).boxed());
		Self {
			params: params.into(),
			func,
		}
	}

	pub fn params(&self) -> &[ParamDescriptor] {
		&self.params
	}

	pub fn call(&self, args: Arguments) -> BoxFuture<'static, Result<HandlerReturn>> {
		(self.func)(args)
	}
}

impl fmt::Debug for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Action")
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}

/// A named handler target, looked up in the container by name.
pub trait Controller: Send + Sync {
	/// The action registered under `method`
	fn action(&self, method: &str) -> Option<Action>;

	/// The action used when the controller itself is the handler
	fn invoke(&self) -> Option<Action> {
		None
	}
}

/// A controller assembled from actions at runtime.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::{Action, ActionSet, Controller};
///
/// let controller = ActionSet::new()
///     .with_action("index", Action::new(vec![], |_| async { Ok("all users") }));
///
/// assert!(controller.action("index").is_some());
/// assert!(controller.action("show").is_none());
/// assert!(controller.invoke().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
	actions: HashMap<String, Action>,
	invoke: Option<Action>,
}

impl ActionSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_action(mut self, method: impl Into<String>, action: Action) -> Self {
		self.actions.insert(method.into(), action);
		self
	}

	pub fn with_invoke(mut self, action: Action) -> Self {
		self.invoke = Some(action);
		self
	}
}

impl Controller for ActionSet {
	fn action(&self, method: &str) -> Option<Action> {
		self.actions.get(method).cloned()
	}

	fn invoke(&self) -> Option<Action> {
		self.invoke.clone()
	}
}

/// Wrap a controller so it can be stored as a container entry
pub fn controller_service(controller: impl Controller + 'static) -> Service {
	let controller: Arc<dyn Controller> = Arc::new(controller);
	Arc::new(controller)
}

/// Recover a controller stored with [`controller_service`]
pub fn as_controller(service: &Service) -> Option<Arc<dyn Controller>> {
	service.downcast_ref::<Arc<dyn Controller>>().cloned()
}

/// Registers controllers as named container entries.
///
/// # Examples
///
/// ```
/// use trellis_di::{Container, ServiceContainer};
/// use trellis_urls::routers::{ActionSet, ControllerRegistry, as_controller};
///
/// let container = ServiceContainer::new();
/// container.register_controller("UserController", ActionSet::new());
///
/// let service = container.resolve_named("UserController").unwrap();
/// assert!(as_controller(&service).is_some());
/// ```
pub trait ControllerRegistry {
	fn register_controller(&self, name: impl Into<String>, controller: impl Controller + 'static);
}

impl ControllerRegistry for ServiceContainer {
	fn register_controller(&self, name: impl Into<String>, controller: impl Controller + 'static) {
		self.register_named(name, controller_service(controller));
	}
}

/// Wraps a resolved handler at dispatch time.
///
/// Decorators run in the order they were added, so the last one added is
/// the outermost.
pub type HandlerDecorator = Arc<dyn Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync>;

/// Reference from a route to its handler.
#[derive(Clone)]
pub enum HandlerRef {
	/// An inline handler. Cannot be serialised.
	Closure(Action),
	/// `method` on the controller registered as `target`
	Action { target: String, method: String },
	/// A controller that is itself callable
	Invokable { target: String },
	/// Redirect to a fixed location
	Redirect { to: String, status: u16 },
}

impl HandlerRef {
	/// An inline handler
	pub fn closure<F, Fut, R>(params: Vec<ParamDescriptor>, func: F) -> Self
	where
		F: Fn(Arguments) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<R>> + Send + 'static,
		R: Into<HandlerReturn>,
	{
		HandlerRef::Closure(Action::new(params, func))
	}

	pub fn is_inline(&self) -> bool {
		matches!(self, HandlerRef::Closure(_))
	}

	/// Controller name, for controller handlers
	pub fn target(&self) -> Option<&str> {
		match self {
			HandlerRef::Action { target, .. } | HandlerRef::Invokable { target } => Some(target),
			_ => None,
		}
	}

	/// Serialisable form, `None` for inline handlers
	pub fn descriptor(&self) -> Option<HandlerDescriptor> {
		match self {
			HandlerRef::Closure(_) => None,
			HandlerRef::Action { target, method } => Some(HandlerDescriptor::Action {
				target: target.clone(),
				method: method.clone(),
			}),
			HandlerRef::Invokable { target } => Some(HandlerDescriptor::Invokable {
				target: target.clone(),
			}),
			HandlerRef::Redirect { to, status } => Some(HandlerDescriptor::Redirect {
				to: to.clone(),
				status: *status,
			}),
		}
	}

	/// Prefix the controller target with `namespace`.
	///
	/// A target starting with `::` is absolute: the marker is stripped and no
	/// namespace is applied. A target already under `namespace` is left alone.
	pub(crate) fn qualify(self, namespace: Option<&str>) -> Self {
		match self {
			HandlerRef::Action { target, method } => HandlerRef::Action {
				target: qualify_target(&target, namespace),
				method,
			},
			HandlerRef::Invokable { target } => HandlerRef::Invokable {
				target: qualify_target(&target, namespace),
			},
			other => other,
		}
	}
}

fn qualify_target(target: &str, namespace: Option<&str>) -> String {
	if let Some(absolute) = target.strip_prefix("::") {
		return absolute.to_string();
	}
	match namespace.map(|ns| ns.trim_end_matches("::")) {
		Some(ns) if !ns.is_empty() && !target.starts_with(&format!("{}::", ns)) => {
			format!("{}::{}", ns, target)
		}
		_ => target.to_string(),
	}
}

impl fmt::Display for HandlerRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HandlerRef::Closure(_) => f.write_str("Closure"),
			HandlerRef::Action { target, method } => write!(f, "{}@{}", target, method),
			HandlerRef::Invokable { target } => f.write_str(target),
			HandlerRef::Redirect { to, status } => write!(f, "redirect({}, {})", to, status),
		}
	}
}

impl fmt::Debug for HandlerRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "HandlerRef({})", self)
	}
}

/// `"Target@method"` is an action, anything else an invokable target
impl From<&str> for HandlerRef {
	fn from(value: &str) -> Self {
		match value.split_once('@') {
			Some((target, method)) => HandlerRef::Action {
				target: target.to_string(),
				method: method.to_string(),
			},
			None => HandlerRef::Invokable {
				target: value.to_string(),
			},
		}
	}
}

impl From<String> for HandlerRef {
	fn from(value: String) -> Self {
		HandlerRef::from(value.as_str())
	}
}

impl From<(&str, &str)> for HandlerRef {
	fn from((target, method): (&str, &str)) -> Self {
		HandlerRef::Action {
			target: target.to_string(),
			method: method.to_string(),
		}
	}
}

impl From<Action> for HandlerRef {
	fn from(action: Action) -> Self {
		HandlerRef::Closure(action)
	}
}

impl From<HandlerDescriptor> for HandlerRef {
	fn from(descriptor: HandlerDescriptor) -> Self {
		match descriptor {
			HandlerDescriptor::Action { target, method } => HandlerRef::Action { target, method },
			HandlerDescriptor::Invokable { target } => HandlerRef::Invokable { target },
			HandlerDescriptor::Redirect { to, status } => HandlerRef::Redirect { to, status },
		}
	}
}

/// Data-only handler reference stored in the route cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerDescriptor {
	Action { target: String, method: String },
	Invokable { target: String },
	Redirect { to: String, status: u16 },
}
