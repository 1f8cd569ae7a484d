use super::handler::{HandlerDecorator, HandlerRef};
use super::match_cache::{MatchCache, MatchKey};
use super::route::{Route, join_paths, normalize_path};
use super::route_group::{GroupAttributes, GroupFrame, IntoMiddlewareNames};
use hyper::Method;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use trellis_conf::RoutingSettings;
use trellis_exception::{Error, Result};
use trellis_http::{Handler, Middleware};

/// Registrable methods, in the order they are reported in `Allow` lists
pub static VERBS: [Method; 7] = [
	Method::GET,
	Method::HEAD,
	Method::POST,
	Method::PUT,
	Method::PATCH,
	Method::DELETE,
	Method::OPTIONS,
];

/// Parameter name of the fallback route template
const FALLBACK_PARAMETER: &str = "fallback";

/// A router extension registered by name.
///
/// Receives the router and the call arguments and returns a value.
pub type RouterMacro = Arc<dyn Fn(&mut Router, &[Value]) -> Result<Value> + Send + Sync>;

pub(crate) fn parse_method(method: &str) -> Result<Method> {
	let upper = method.trim().to_ascii_uppercase();
	VERBS
		.iter()
		.find(|verb| verb.as_str() == upper)
		.cloned()
		.ok_or_else(|| Error::InvalidMethod(method.to_string()))
}

/// Index of a route in its router, stable for the router's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl RouteId {
	pub(crate) fn new(index: usize) -> Self {
		Self(index)
	}

	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for RouteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Result of a successful [`Router::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
	pub route_id: RouteId,
	/// Bound parameters, percent-decoded and with defaults applied
	pub params: HashMap<String, String>,
	/// Whether the route came from the match cache
	pub from_cache: bool,
}

/// One row of [`Router::describe`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
	pub method: String,
	pub path: String,
	pub name: Option<String>,
	pub middleware: Vec<String>,
	pub handler: String,
	pub domain: Option<String>,
}

/// The route table.
///
/// Routes are registered with `&mut self` while the application boots and
/// the router is then shared read-only (typically as `Arc<Router>`). The
/// match cache is the only state touched during dispatch and sits behind a
/// mutex.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::{GroupAttributes, Router};
/// use hyper::Method;
///
/// let mut router = Router::new();
/// router
/// 	.group(GroupAttributes::new().prefix("/api").middleware("auth"), |r| {
/// 		r.get("/users", "UserController@index")?.name("users.index")?;
/// 		Ok(())
/// 	})
/// 	.unwrap();
///
/// let matched = router.resolve(&Method::GET, "/api/users", None, "http").unwrap();
/// let route = router.route(matched.route_id).unwrap();
/// assert_eq!(route.middleware(), ["auth"]);
/// assert_eq!(route.name(), Some("users.index"));
/// ```
pub struct Router {
	routes: Vec<Route>,
	by_method: HashMap<Method, Vec<RouteId>>,
	names: HashMap<String, RouteId>,
	fallback: Option<RouteId>,
	groups: Vec<GroupFrame>,
	cache: Mutex<MatchCache>,
	cache_enabled: AtomicBool,
	middleware_aliases: HashMap<String, Arc<dyn Middleware>>,
	macros: HashMap<String, RouterMacro>,
	default_resource_parameter: String,
}

impl Default for Router {
	fn default() -> Self {
		Self::with_settings(&RoutingSettings::default())
	}
}

impl Router {
	/// Create an empty router with default settings
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(settings: &RoutingSettings) -> Self {
		Self {
			routes: Vec::new(),
			by_method: HashMap::new(),
			names: HashMap::new(),
			fallback: None,
			groups: Vec::new(),
			cache: Mutex::new(MatchCache::new(settings.match_cache_capacity)),
			cache_enabled: AtomicBool::new(settings.match_cache_enabled),
			middleware_aliases: HashMap::new(),
			macros: HashMap::new(),
			default_resource_parameter: settings.default_resource_parameter.clone(),
		}
	}

	pub(crate) fn default_resource_parameter(&self) -> &str {
		&self.default_resource_parameter
	}

	fn current_frame(&self) -> GroupFrame {
		self.groups.last().cloned().unwrap_or_default()
	}

	/// Build a route under the active group scope
	fn build_route(&self, method: Method, path: &str, handler: HandlerRef) -> Result<Route> {
		let frame = self.current_frame();
		let path = join_paths(&frame.prefix, path);
		let handler = handler.qualify(frame.namespace.as_deref());

		let mut route = Route::new(method, &path, handler)?;
		route.add_middleware(frame.middleware);
		if !frame.wheres.is_empty() {
			route.set_wheres(frame.wheres)?;
		}
		if let Some(domain) = frame.domain.as_deref() {
			route.set_domain(Some(domain))?;
		}
		Ok(route)
	}

	fn insert_route(&mut self, route: Route) -> RouteId {
		let id = RouteId(self.routes.len());
		tracing::debug!(
			method = %route.method(),
			path = %route.path(),
			handler = %route.handler(),
			"registered route"
		);
		self.by_method
			.entry(route.method().clone())
			.or_default()
			.push(id);
		self.routes.push(route);
		self.clear_match_cache();
		id
	}

	pub(crate) fn add_route(
		&mut self,
		method: Method,
		path: &str,
		handler: HandlerRef,
	) -> Result<RouteId> {
		let route = self.build_route(method, path, handler)?;
		Ok(self.insert_route(route))
	}

	/// Name a route, applying the active group's name prefix
	pub(crate) fn name_route(&mut self, id: RouteId, name: &str) -> Result<()> {
		let prefix = self
			.groups
			.last()
			.map(|frame| frame.name_prefix.as_str())
			.unwrap_or_default();
		let full = format!("{}{}", prefix, name);

		if let Some(existing) = self.names.get(&full)
			&& *existing != id
		{
			return Err(Error::DuplicateRouteName(full));
		}

		let route = &mut self.routes[id.0];
		if let Some(old) = route.name() {
			self.names.remove(old);
		}
		route.set_name(Some(full.clone()));
		self.names.insert(full, id);
		Ok(())
	}

	fn handle(&mut self, id: RouteId) -> RouteHandle<'_> {
		RouteHandle::new(self, id)
	}

	/// Register a route for a method given as a string.
	///
	/// # Errors
	///
	/// [`Error::InvalidMethod`] if `method` is not one of [`VERBS`].
	pub fn add(
		&mut self,
		method: &str,
		path: &str,
		handler: impl Into<HandlerRef>,
	) -> Result<RouteHandle<'_>> {
		let method = parse_method(method)?;
		let id = self.add_route(method, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn get(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::GET, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn post(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::POST, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn put(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::PUT, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn patch(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::PATCH, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn delete(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::DELETE, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn options(
		&mut self,
		path: &str,
		handler: impl Into<HandlerRef>,
	) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::OPTIONS, path, handler.into())?;
		Ok(self.handle(id))
	}

	pub fn head(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let id = self.add_route(Method::HEAD, path, handler.into())?;
		Ok(self.handle(id))
	}

	/// Register one route per method and return the last one.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::Router;
	///
	/// let mut router = Router::new();
	/// router
	///     .match_methods(&["GET", "POST"], "/contact", "ContactController", ["web"])
	///     .unwrap();
	/// assert_eq!(router.routes().len(), 2);
	/// assert!(router.match_methods(&["FETCH"], "/x", "X", ["web"]).is_err());
	/// ```
	pub fn match_methods(
		&mut self,
		methods: &[&str],
		path: &str,
		handler: impl Into<HandlerRef>,
		middleware: impl IntoMiddlewareNames,
	) -> Result<RouteHandle<'_>> {
		let methods = methods
			.iter()
			.map(|m| parse_method(m))
			.collect::<Result<Vec<_>>>()?;
		let handler = handler.into();
		let middleware = middleware.into_middleware_names();

		let mut last = None;
		for method in methods {
			let mut route = self.build_route(method, path, handler.clone())?;
			route.add_middleware(middleware.iter().cloned());
			last = Some(self.insert_route(route));
		}
		let id = last.ok_or_else(|| Error::InvalidMethod(String::new()))?;
		Ok(self.handle(id))
	}

	/// Register the route under every verb and return the last one
	pub fn any(&mut self, path: &str, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let verbs: Vec<&str> = VERBS.iter().map(Method::as_str).collect();
		self.match_methods(&verbs, path, handler, Vec::<String>::new())
	}

	/// Redirect every verb on `from` to `to`
	pub fn redirect(
		&mut self,
		from: &str,
		to: &str,
		status: hyper::StatusCode,
	) -> Result<RouteHandle<'_>> {
		self.any(
			from,
			HandlerRef::Redirect {
				to: to.to_string(),
				status: status.as_u16(),
			},
		)
	}

	pub fn permanent_redirect(&mut self, from: &str, to: &str) -> Result<RouteHandle<'_>> {
		self.redirect(from, to, hyper::StatusCode::MOVED_PERMANENTLY)
	}

	/// Register the route used when nothing else matches.
	///
	/// The fallback answers any method and does not take part in the
	/// ordinary scan, so routes registered after it still win. Registering a
	/// second fallback replaces the first.
	pub fn fallback(&mut self, handler: impl Into<HandlerRef>) -> Result<RouteHandle<'_>> {
		let mut route = self.build_route(
			Method::GET,
			&format!("{{{}?}}", FALLBACK_PARAMETER),
			handler.into(),
		)?;
		route.set_where(FALLBACK_PARAMETER, ".*")?;
		let id = self.install_fallback(route);
		Ok(self.handle(id))
	}

	pub(crate) fn install_fallback(&mut self, route: Route) -> RouteId {
		let id = match self.fallback {
			Some(id) => {
				self.routes[id.0] = route;
				id
			}
			None => {
				let id = RouteId(self.routes.len());
				self.routes.push(route);
				id
			}
		};
		self.fallback = Some(id);
		id
	}

	pub fn fallback_id(&self) -> Option<RouteId> {
		self.fallback
	}

	/// Register routes inside a group scope.
	///
	/// The scope is popped when `routes` returns, whether it succeeded or not.
	pub fn group<F>(&mut self, attributes: GroupAttributes, routes: F) -> Result<()>
	where
		F: FnOnce(&mut Router) -> Result<()>,
	{
		let frame = self.current_frame().nest(attributes);
		let depth = self.groups.len();
		self.groups.push(frame);
		let result = routes(self);
		self.groups.truncate(depth);
		result
	}

	/// Depth of the active group stack
	pub fn group_depth(&self) -> usize {
		self.groups.len()
	}

	pub fn route(&self, id: RouteId) -> Option<&Route> {
		self.routes.get(id.0)
	}

	/// All routes in registration order, including the fallback
	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	/// Routes registered under `method`, in registration order
	pub fn routes_for<'a>(&'a self, method: &Method) -> impl Iterator<Item = &'a Route> + 'a {
		self.by_method
			.get(method)
			.into_iter()
			.flatten()
			.filter_map(|id| self.routes.get(id.0))
	}

	pub fn route_by_name(&self, name: &str) -> Option<&Route> {
		self.names.get(name).and_then(|id| self.routes.get(id.0))
	}

	pub fn has_route(&self, name: &str) -> bool {
		self.names.contains_key(name)
	}

	/// Operator-facing summary of every route
	pub fn describe(&self) -> Vec<RouteSummary> {
		self.routes
			.iter()
			.map(|route| RouteSummary {
				method: route.method().to_string(),
				path: route.path().to_string(),
				name: route.name().map(str::to_string),
				middleware: route.middleware().to_vec(),
				handler: route.handler().to_string(),
				domain: route.domain().map(str::to_string),
			})
			.collect()
	}

	pub fn alias_middleware(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
		self.middleware_aliases.insert(name.into(), middleware);
	}

	/// Look up the implementations behind a route's middleware aliases
	pub fn resolve_middleware(&self, names: &[String]) -> Result<Vec<Arc<dyn Middleware>>> {
		names
			.iter()
			.map(|name| {
				self.middleware_aliases
					.get(name)
					.cloned()
					.ok_or_else(|| Error::UnknownMiddleware(name.clone()))
			})
			.collect()
	}

	/// Register an extension callable through [`Router::call_macro`]
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::Router;
	/// use serde_json::{Value, json};
	/// use std::sync::Arc;
	///
	/// let mut router = Router::new();
	/// router.register_macro(
	///     "health",
	///     Arc::new(|router: &mut Router, _args: &[Value]| {
	///         router.get("/health", "HealthController")?;
	///         Ok(json!(router.routes().len()))
	///     }),
	/// );
	///
	/// assert_eq!(router.call_macro("health", &[]).unwrap(), json!(1));
	/// assert!(router.call_macro("missing", &[]).is_err());
	/// ```
	pub fn register_macro(&mut self, name: impl Into<String>, function: RouterMacro) {
		self.macros.insert(name.into(), function);
	}

	pub fn has_macro(&self, name: &str) -> bool {
		self.macros.contains_key(name)
	}

	pub fn call_macro(&mut self, name: &str, args: &[Value]) -> Result<Value> {
		let function = self
			.macros
			.get(name)
			.cloned()
			.ok_or_else(|| Error::UnknownMacro(name.to_string()))?;
		function(self, args)
	}

	pub fn cache_len(&self) -> usize {
		self.cache.lock().len()
	}

	pub fn clear_match_cache(&self) {
		self.cache.lock().clear();
	}

	pub fn is_match_cache_enabled(&self) -> bool {
		self.cache_enabled.load(Ordering::Relaxed)
	}

	/// Enable or disable the match cache. Disabling also empties it.
	pub fn set_match_cache_enabled(&self, enabled: bool) {
		self.cache_enabled.store(enabled, Ordering::Relaxed);
		if !enabled {
			self.clear_match_cache();
		}
	}

	fn bind(&self, id: RouteId, path: &str, host: Option<&str>, from_cache: bool) -> RouteMatch {
		let params = self
			.routes
			.get(id.0)
			.map(|route| route.extract_parameters(path, host))
			.unwrap_or_default();
		RouteMatch {
			route_id: id,
			params,
			from_cache,
		}
	}

	/// First route accepting the request, `HEAD` routes before `GET` routes for `HEAD`
	fn scan(
		&self,
		method: &Method,
		path: &str,
		host: Option<&str>,
		scheme: &str,
	) -> Option<RouteId> {
		let mut candidates: Vec<&RouteId> =
			self.by_method.get(method).into_iter().flatten().collect();
		if *method == Method::HEAD {
			candidates.extend(self.by_method.get(&Method::GET).into_iter().flatten());
		}
		candidates
			.into_iter()
			.find(|id| self.routes[id.0].matches(method, path, host, scheme))
			.copied()
	}

	/// Methods other than `method` with a route matching everything but the method
	fn allowed_methods(
		&self,
		method: &Method,
		path: &str,
		host: Option<&str>,
		scheme: &str,
	) -> Vec<String> {
		let routable = |verb: &Method| {
			verb != method
				&& self.by_method.get(verb).is_some_and(|ids| {
					ids.iter()
						.any(|id| self.routes[id.0].matches_ignoring_method(path, host, scheme))
				})
		};
		let get_allowed = routable(&Method::GET);

		VERBS
			.iter()
			.filter(|verb| routable(*verb) || (**verb == Method::HEAD && get_allowed))
			.map(Method::to_string)
			.collect()
	}

	/// Find the route for a request.
	///
	/// The match cache is consulted first, keyed by method, path, host and
	/// scheme. Otherwise routes registered under `method` are scanned in
	/// registration order and the first match wins. Any change to the route
	/// table empties the cache, so a cached entry is always the scan result.
	///
	/// # Errors
	///
	/// - [`Error::MethodNotAllowed`] when the path matches routes of other
	///   methods only
	/// - [`Error::NotFound`] when nothing matches and no fallback exists
	pub fn resolve(
		&self,
		method: &Method,
		path: &str,
		host: Option<&str>,
		scheme: &str,
	) -> Result<RouteMatch> {
		let path = normalize_path(path);
		let cache_enabled = self.is_match_cache_enabled();

		let key = MatchKey::new(method, &path, host, scheme);

		if cache_enabled {
			let cached = self.cache.lock().get(&key);
			if let Some(id) = cached {
				tracing::trace!(method = %method, path = %path, route = %id, "match cache hit");
				return Ok(self.bind(id, &path, host, true));
			}
		}

		if let Some(id) = self.scan(method, &path, host, scheme) {
			if cache_enabled {
				let evicted = self.cache.lock().insert(key, id);
				if let Some(evicted) = evicted {
					tracing::debug!(
						method = %evicted.method,
						path = %evicted.path,
						host = ?evicted.host,
						"evicted match cache entry"
					);
				}
			}
			tracing::debug!(method = %method, path = %path, route = %id, "matched route");
			return Ok(self.bind(id, &path, host, false));
		}

		let allowed = self.allowed_methods(method, &path, host, scheme);
		if !allowed.is_empty() {
			tracing::warn!(
				method = %method,
				path = %path,
				allowed = %allowed.join(", "),
				"method not allowed"
			);
			return Err(Error::MethodNotAllowed { allowed });
		}

		if let Some(id) = self.fallback {
			tracing::debug!(method = %method, path = %path, "dispatching to fallback route");
			return Ok(self.bind(id, &path, host, false));
		}

		Err(Error::NotFound {
			method: method.to_string(),
			path,
		})
	}
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes)
			.field("names", &self.names)
			.field("fallback", &self.fallback)
			.field("group_depth", &self.groups.len())
			.field("middleware_aliases", &self.middleware_aliases.keys().collect::<Vec<_>>())
			.field("macros", &self.macros.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

/// Fluent configuration of a just-registered route.
///
/// Methods that can fail return `Result<Self>` so calls chain with `?`.
pub struct RouteHandle<'r> {
	router: &'r mut Router,
	id: RouteId,
}

impl<'r> RouteHandle<'r> {
	pub(crate) fn new(router: &'r mut Router, id: RouteId) -> Self {
		Self { router, id }
	}

	pub fn id(&self) -> RouteId {
		self.id
	}

	pub fn route(&self) -> &Route {
		&self.router.routes[self.id.0]
	}

	fn route_mut(&mut self) -> &mut Route {
		self.router.clear_match_cache();
		&mut self.router.routes[self.id.0]
	}

	/// Name the route, applying the active group's name prefix.
	///
	/// # Errors
	///
	/// [`Error::DuplicateRouteName`] if another route already has the name.
	pub fn name(mut self, name: &str) -> Result<Self> {
		self.router.name_route(self.id, name)?;
		Ok(self)
	}

	pub fn where_(mut self, key: &str, pattern: &str) -> Result<Self> {
		self.route_mut().set_where(key, pattern)?;
		Ok(self)
	}

	pub fn where_all<I, K, V>(mut self, constraints: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.route_mut().set_wheres(constraints)?;
		Ok(self)
	}

	pub fn where_number(self, key: &str) -> Result<Self> {
		self.where_(key, "@id")
	}

	pub fn where_alpha(self, key: &str) -> Result<Self> {
		self.where_(key, "@alpha")
	}

	pub fn where_alphanumeric(self, key: &str) -> Result<Self> {
		self.where_(key, "@alphanumeric")
	}

	pub fn where_uuid(self, key: &str) -> Result<Self> {
		self.where_(key, "@uuid")
	}

	pub fn where_slug(self, key: &str) -> Result<Self> {
		self.where_(key, "@slug")
	}

	/// Restrict a parameter to one of `values`, matched literally
	pub fn where_in(self, key: &str, values: &[&str]) -> Result<Self> {
		let alternation = values
			.iter()
			.map(|value| regex::escape(value))
			.collect::<Vec<_>>()
			.join("|");
		self.where_(key, &alternation)
	}

	pub fn defaults(mut self, key: &str, value: &str) -> Self {
		self.route_mut().set_default(key, value);
		self
	}

	pub fn domain(mut self, domain: &str) -> Result<Self> {
		self.route_mut().set_domain(Some(domain))?;
		Ok(self)
	}

	pub fn scheme(mut self, scheme: &str) -> Result<Self> {
		self.route_mut().set_scheme(Some(scheme))?;
		Ok(self)
	}

	pub fn meta(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.route_mut().set_meta(key, value);
		self
	}

	/// Append middleware aliases
	pub fn middleware(mut self, names: impl IntoMiddlewareNames) -> Self {
		self.route_mut().add_middleware(names.into_middleware_names());
		self
	}

	/// Wrap the resolved handler. The last decorator added runs outermost.
	pub fn wrap<F>(mut self, decorator: F) -> Self
	where
		F: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
	{
		let decorator: HandlerDecorator = Arc::new(decorator);
		self.route_mut().push_decorator(decorator);
		self
	}
}
