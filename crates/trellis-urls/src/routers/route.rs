use super::handler::{HandlerDecorator, HandlerRef};
use super::pattern::{DomainPattern, PathPattern};
use hyper::Method;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use trellis_exception::{Error, Result};

/// Normalize a path to a single leading `/` and no trailing `/`.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::normalize_path;
///
/// assert_eq!(normalize_path("users/"), "/users");
/// assert_eq!(normalize_path("//"), "/");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
	let trimmed = path.trim().trim_matches('/');
	if trimmed.is_empty() {
		"/".to_string()
	} else {
		format!("/{}", trimmed)
	}
}

/// Join a group prefix and a path with exactly one separator.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::join_paths;
///
/// assert_eq!(join_paths("/api/", "/users"), "/api/users");
/// assert_eq!(join_paths("", "users"), "/users");
/// assert_eq!(join_paths("/api", "/"), "/api");
/// ```
pub fn join_paths(prefix: &str, path: &str) -> String {
	normalize_path(&format!(
		"{}/{}",
		prefix.trim_end_matches('/'),
		path.trim_start_matches('/')
	))
}

/// A single (method, path template, handler) registration.
///
/// The compiled matchers always reflect the current path template and
/// constraint map: every mutation that affects matching recompiles before
/// returning, and leaves the route untouched if compilation fails.
#[derive(Clone)]
pub struct Route {
	method: Method,
	path: String,
	handler: HandlerRef,
	middleware: Vec<String>,
	name: Option<String>,
	wheres: BTreeMap<String, String>,
	defaults: BTreeMap<String, String>,
	domain: Option<String>,
	scheme: Option<String>,
	meta: BTreeMap<String, Value>,
	decorators: Vec<HandlerDecorator>,
	pattern: PathPattern,
	domain_pattern: Option<DomainPattern>,
}

impl Route {
	/// Create a route. The path is normalized before compilation.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::Route;
	/// use hyper::Method;
	///
	/// let route = Route::new(Method::GET, "users/{id}/", "UserController@show").unwrap();
	/// assert_eq!(route.path(), "/users/{id}");
	/// assert!(route.matches(&Method::GET, "/users/1", None, "http"));
	/// assert!(route.matches(&Method::HEAD, "/users/1", None, "http"));
	/// assert!(!route.matches(&Method::POST, "/users/1", None, "http"));
	/// ```
	pub fn new(method: Method, path: &str, handler: impl Into<HandlerRef>) -> Result<Self> {
		let path = normalize_path(path);
		let pattern = PathPattern::new(&path)?;
		Ok(Self {
			method,
			path,
			handler: handler.into(),
			middleware: Vec::new(),
			name: None,
			wheres: BTreeMap::new(),
			defaults: BTreeMap::new(),
			domain: None,
			scheme: None,
			meta: BTreeMap::new(),
			decorators: Vec::new(),
			pattern,
			domain_pattern: None,
		})
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn handler(&self) -> &HandlerRef {
		&self.handler
	}

	/// Middleware aliases, in execution order
	pub fn middleware(&self) -> &[String] {
		&self.middleware
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn wheres(&self) -> &BTreeMap<String, String> {
		&self.wheres
	}

	pub fn defaults(&self) -> &BTreeMap<String, String> {
		&self.defaults
	}

	pub fn domain(&self) -> Option<&str> {
		self.domain.as_deref()
	}

	pub fn scheme(&self) -> Option<&str> {
		self.scheme.as_deref()
	}

	pub fn meta(&self, key: &str) -> Option<&Value> {
		self.meta.get(key)
	}

	pub fn metadata(&self) -> &BTreeMap<String, Value> {
		&self.meta
	}

	pub fn decorators(&self) -> &[HandlerDecorator] {
		&self.decorators
	}

	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	pub fn domain_pattern(&self) -> Option<&DomainPattern> {
		self.domain_pattern.as_ref()
	}

	/// Path and domain parameter names, path parameters first
	pub fn parameter_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.pattern.param_names().collect();
		if let Some(domain) = &self.domain_pattern {
			names.extend(domain.params().iter().map(|p| p.name.as_str()));
		}
		names
	}

	/// Model binding key declared in the template (`{post:slug}`)
	pub fn binding_key(&self, parameter: &str) -> Option<&str> {
		self.pattern
			.params()
			.iter()
			.find(|p| p.name == parameter)
			.and_then(|p| p.binding_key.as_deref())
	}

	/// Whether the route can be written to the route cache
	pub fn is_cacheable(&self) -> bool {
		!self.handler.is_inline() && self.decorators.is_empty()
	}

	pub fn add_middleware<I, S>(&mut self, names: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.middleware.extend(names.into_iter().map(Into::into));
	}

	pub(crate) fn set_name(&mut self, name: Option<String>) {
		self.name = name;
	}

	/// Constrain one parameter and recompile
	pub fn set_where(&mut self, key: impl Into<String>, pattern: impl Into<String>) -> Result<()> {
		let mut wheres = self.wheres.clone();
		wheres.insert(key.into(), pattern.into());
		self.recompile(wheres, self.domain.clone())
	}

	/// Merge several constraints and recompile once
	pub fn set_wheres<I, K, V>(&mut self, constraints: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut wheres = self.wheres.clone();
		wheres.extend(
			constraints
				.into_iter()
				.map(|(k, v)| (k.into(), v.into())),
		);
		self.recompile(wheres, self.domain.clone())
	}

	pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.defaults.insert(key.into(), value.into());
	}

	/// Restrict the route to hosts matching `domain`
	pub fn set_domain(&mut self, domain: Option<&str>) -> Result<()> {
		self.recompile(self.wheres.clone(), domain.map(str::to_string))
	}

	/// Restrict the route to `http` or `https`
	pub fn set_scheme(&mut self, scheme: Option<&str>) -> Result<()> {
		self.scheme = match scheme {
			Some(scheme) => {
				let lower = scheme.to_ascii_lowercase();
				if lower != "http" && lower != "https" {
					return Err(Error::InvalidScheme(scheme.to_string()));
				}
				Some(lower)
			}
			None => None,
		};
		Ok(())
	}

	pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.meta.insert(key.into(), value.into());
	}

	pub fn push_decorator(&mut self, decorator: HandlerDecorator) {
		self.decorators.push(decorator);
	}

	fn recompile(&mut self, wheres: BTreeMap<String, String>, domain: Option<String>) -> Result<()> {
		let pattern = PathPattern::compile(&self.path, &wheres)?;
		let domain_pattern = domain
			.as_deref()
			.map(|d| DomainPattern::compile(d, &wheres))
			.transpose()?;

		self.pattern = pattern;
		self.domain_pattern = domain_pattern;
		self.wheres = wheres;
		self.domain = domain;
		Ok(())
	}

	/// Whether the route accepts `method`. `HEAD` is accepted by `GET` routes.
	pub fn accepts_method(&self, method: &Method) -> bool {
		self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
	}

	/// Full match: method, then domain, then scheme, then path.
	pub fn matches(&self, method: &Method, path: &str, host: Option<&str>, scheme: &str) -> bool {
		self.accepts_method(method) && self.matches_ignoring_method(path, host, scheme)
	}

	/// Domain, scheme and path checks only
	pub fn matches_ignoring_method(&self, path: &str, host: Option<&str>, scheme: &str) -> bool {
		if let Some(domain) = &self.domain_pattern {
			match host {
				Some(host) if domain.captures(host).is_some() => {}
				_ => return false,
			}
		}
		if let Some(required) = &self.scheme
			&& !required.eq_ignore_ascii_case(scheme)
		{
			return false;
		}
		self.pattern.is_match(path)
	}

	/// Domain and path captures, percent-decoded, with defaults applied.
	///
	/// A registered default replaces a missing or empty parameter. Without a
	/// default, an empty capture is kept and a missing one is omitted.
	pub fn extract_parameters(&self, path: &str, host: Option<&str>) -> HashMap<String, String> {
		let mut params = HashMap::new();

		if let (Some(domain), Some(host)) = (&self.domain_pattern, host)
			&& let Some(captures) = domain.captures(host)
		{
			params.extend(captures);
		}
		if let Some(captures) = self.pattern.captures(path) {
			params.extend(captures.into_iter().map(|(name, value)| {
				let decoded = percent_decode_str(&value).decode_utf8_lossy().into_owned();
				(name, decoded)
			}));
		}

		for name in self.parameter_names() {
			let missing = params.get(name).is_none_or(String::is_empty);
			if missing && let Some(default) = self.defaults.get(name) {
				params.insert(name.to_string(), default.clone());
			}
		}
		params
	}

	/// Build a concrete path from `params`.
	///
	/// Defaults fill parameters not given. Parameters the template does not
	/// use are appended as a query string, sorted by key.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::Route;
	/// use hyper::Method;
	///
	/// let route = Route::new(Method::GET, "/posts/{slug?}", "PostController@show").unwrap();
	/// assert_eq!(route.generate_path(&[]).unwrap(), "/posts");
	/// assert_eq!(
	///     route.generate_path(&[("slug", "intro"), ("page", "2")]).unwrap(),
	///     "/posts/intro?page=2"
	/// );
	/// ```
	pub fn generate_path(&self, params: &[(&str, &str)]) -> Result<String> {
		let names = self.parameter_names();
		let mut values: HashMap<String, String> = self
			.defaults
			.iter()
			.filter(|(key, _)| names.contains(&key.as_str()))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();
		let mut query = BTreeMap::new();
		for (key, value) in params {
			if names.contains(key) {
				values.insert(key.to_string(), value.to_string());
			} else {
				query.insert(*key, *value);
			}
		}

		let mut path = self.pattern.generate(&values).map_err(|err| match err {
			Error::MissingUrlParameter { parameter, .. } => Error::MissingUrlParameter {
				route: self.name.clone().unwrap_or_else(|| self.path.clone()),
				parameter,
			},
			other => other,
		})?;

		if !query.is_empty() {
			let encoded = serde_urlencoded::to_string(&query)
				.map_err(|e| Error::Serialization(e.to_string()))?;
			path.push('?');
			path.push_str(&encoded);
		}
		Ok(path)
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("handler", &self.handler)
			.field("name", &self.name)
			.field("middleware", &self.middleware)
			.field("wheres", &self.wheres)
			.field("domain", &self.domain)
			.field("scheme", &self.scheme)
			.finish_non_exhaustive()
	}
}
