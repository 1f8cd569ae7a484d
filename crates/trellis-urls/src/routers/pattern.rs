//! Path and domain template compiler.
//!
//! Templates are literal text with `{name}` placeholders:
//!
//! - `{name}` - required parameter
//! - `{name?}` - optional parameter; a `/` right before it is optional too
//! - `{name:key}` - required parameter whose model binding uses `key`
//!
//! Literal text is regex-escaped and the compiled matcher is anchored at
//! both ends. Constraint strings are inserted into the generated regex
//! verbatim, so a route author can use any regex syntax the `regex` crate
//! accepts.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};
use trellis_exception::{Error, Result};

/// Maximum allowed length for a template string in bytes.
const MAX_TEMPLATE_LENGTH: usize = 2048;

/// Maximum allowed size for a compiled regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

pub const DEFAULT_SEGMENT: &str = "[^/]+";
pub const DEFAULT_OPTIONAL_SEGMENT: &str = "[^/]*";
pub const DEFAULT_HOST_SEGMENT: &str = "[a-zA-Z0-9_-]+";

/// Characters escaped when a parameter value is written into a path.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'`')
	.add(b'{')
	.add(b'}');

/// Look up a pattern from the named library.
///
/// Constraints reference these as `@name`, e.g. `where_("key", "@uuid")`.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::library_pattern;
///
/// assert_eq!(library_pattern("id"), Some("[0-9]+"));
/// assert!(library_pattern("zipcode").is_none());
/// ```
pub fn library_pattern(name: &str) -> Option<&'static str> {
	match name {
		"id" => Some("[0-9]+"),
		"uuid" => Some(
			"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
		),
		"slug" => Some("[a-z0-9]+(?:-[a-z0-9]+)*"),
		"alpha" => Some("[a-zA-Z]+"),
		"alphanumeric" => Some("[a-zA-Z0-9]+"),
		"email" => Some(r"[^@/\s]+@[^@/\s]+\.[^@/\s]+"),
		"any" => Some(".*"),
		_ => None,
	}
}

/// A `{...}` placeholder in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
	pub name: String,
	pub optional: bool,
	/// Alternate lookup key for model binding (`{post:slug}`)
	pub binding_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Literal(String),
	Param(ParamSpec),
}

fn invalid(template: &str, reason: impl Into<String>) -> Error {
	Error::InvalidPattern {
		template: template.to_string(),
		reason: reason.into(),
	}
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_template(template: &str) -> Result<Vec<Token>> {
	if template.len() > MAX_TEMPLATE_LENGTH {
		return Err(invalid(
			template,
			format!(
				"template length {} exceeds maximum allowed length of {} bytes",
				template.len(),
				MAX_TEMPLATE_LENGTH
			),
		));
	}

	let mut tokens = Vec::new();
	let mut literal = String::new();
	let mut seen: Vec<String> = Vec::new();
	let mut chars = template.chars();

	while let Some(c) = chars.next() {
		match c {
			'{' => {
				let mut inner = String::new();
				let mut closed = false;
				for next in chars.by_ref() {
					if next == '}' {
						closed = true;
						break;
					}
					if next == '{' {
						return Err(invalid(template, "nested '{' in placeholder"));
					}
					inner.push(next);
				}
				if !closed {
					return Err(invalid(template, "unclosed '{'"));
				}

				let (inner, optional) = match inner.strip_suffix('?') {
					Some(rest) => (rest, true),
					None => (inner.as_str(), false),
				};
				let (name, binding_key) = match inner.split_once(':') {
					Some((name, key)) => (name, Some(key)),
					None => (inner, None),
				};
				if !is_identifier(name) {
					return Err(invalid(
						template,
						format!("'{}' is not a valid parameter name", name),
					));
				}
				if let Some(key) = binding_key
					&& !is_identifier(key)
				{
					return Err(invalid(
						template,
						format!("'{}' is not a valid binding key", key),
					));
				}
				if seen.iter().any(|s| s == name) {
					return Err(invalid(
						template,
						format!("parameter '{}' appears more than once", name),
					));
				}
				seen.push(name.to_string());

				if !literal.is_empty() {
					tokens.push(Token::Literal(std::mem::take(&mut literal)));
				}
				tokens.push(Token::Param(ParamSpec {
					name: name.to_string(),
					optional,
					binding_key: binding_key.map(str::to_string),
				}));
			}
			'}' => return Err(invalid(template, "unbalanced '}'")),
			_ => literal.push(c),
		}
	}
	if !literal.is_empty() {
		tokens.push(Token::Literal(literal));
	}
	Ok(tokens)
}

/// Effective regex for a parameter: explicit constraint, `@library` reference, or the default.
fn constraint_for(
	template: &str,
	name: &str,
	constraints: &BTreeMap<String, String>,
	default: &str,
) -> Result<String> {
	match constraints.get(name) {
		Some(constraint) => match constraint.strip_prefix('@') {
			Some(library) => library_pattern(library)
				.map(str::to_string)
				.ok_or_else(|| invalid(template, format!("unknown named pattern '@{}'", library))),
			None => Ok(constraint.clone()),
		},
		None => Ok(default.to_string()),
	}
}

fn build_regex(template: &str, source: &str, case_insensitive: bool) -> Result<Regex> {
	RegexBuilder::new(source)
		.case_insensitive(case_insensitive)
		.size_limit(MAX_REGEX_SIZE)
		.build()
		.map_err(|e| invalid(template, format!("failed to compile pattern regex: {}", e)))
}

fn collect_captures(
	regex: &Regex,
	params: &[ParamSpec],
	candidate: &str,
) -> Option<HashMap<String, String>> {
	regex.captures(candidate).map(|caps| {
		params
			.iter()
			.filter_map(|p| {
				caps.name(&p.name)
					.map(|m| (p.name.clone(), m.as_str().to_string()))
			})
			.collect()
	})
}

/// A compiled path template.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::PathPattern;
/// use std::collections::BTreeMap;
///
/// let constraints = BTreeMap::from([("id".to_string(), "[0-9]+".to_string())]);
/// let pattern = PathPattern::compile("/users/{id}", &constraints).unwrap();
///
/// let params = pattern.captures("/users/42").unwrap();
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
/// assert!(pattern.captures("/users/abc").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
	template: String,
	tokens: Vec<Token>,
	params: Vec<ParamSpec>,
	regex: Regex,
	/// Anchored per-parameter matchers used to validate generated values
	value_checks: HashMap<String, Regex>,
}

impl PathPattern {
	/// Compile a template without constraints.
	pub fn new(template: &str) -> Result<Self> {
		Self::compile(template, &BTreeMap::new())
	}

	/// Compile a template, applying `constraints` per parameter name.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidPattern`] for malformed templates, unknown
	/// `@library` references and constraints that are not valid regex.
	pub fn compile(template: &str, constraints: &BTreeMap<String, String>) -> Result<Self> {
		let tokens = parse_template(template)?;
		let mut source = String::from("^");
		let mut params = Vec::new();
		let mut value_checks = HashMap::new();

		for (i, token) in tokens.iter().enumerate() {
			match token {
				Token::Literal(literal) => {
					let next_is_optional =
						matches!(tokens.get(i + 1), Some(Token::Param(p)) if p.optional);
					// The separator before an optional parameter moves into its group
					let literal = match literal.strip_suffix('/') {
						Some(rest) if next_is_optional => rest,
						_ => literal.as_str(),
					};
					source.push_str(&regex::escape(literal));
				}
				Token::Param(param) => {
					let default = if param.optional {
						DEFAULT_OPTIONAL_SEGMENT
					} else {
						DEFAULT_SEGMENT
					};
					let constraint = constraint_for(template, &param.name, constraints, default)?;
					let after_separator = i > 0
						&& matches!(&tokens[i - 1], Token::Literal(l) if l.ends_with('/'));

					match (param.optional, after_separator) {
						(true, true) => source.push_str(&format!(
							"(?:/(?P<{}>{}))?",
							param.name, constraint
						)),
						(true, false) => {
							source.push_str(&format!("(?P<{}>{})?", param.name, constraint))
						}
						(false, _) => {
							source.push_str(&format!("(?P<{}>{})", param.name, constraint))
						}
					}

					value_checks.insert(
						param.name.clone(),
						build_regex(template, &format!("^(?:{})$", constraint), false)?,
					);
					params.push(param.clone());
				}
			}
		}
		source.push('$');

		Ok(Self {
			template: template.to_string(),
			regex: build_regex(template, &source, false)?,
			tokens,
			params,
			value_checks,
		})
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	/// The generated regex source
	pub fn regex_source(&self) -> &str {
		self.regex.as_str()
	}

	pub fn params(&self) -> &[ParamSpec] {
		&self.params
	}

	pub fn param_names(&self) -> impl Iterator<Item = &str> {
		self.params.iter().map(|p| p.name.as_str())
	}

	pub fn is_match(&self, candidate: &str) -> bool {
		self.regex.is_match(candidate)
	}

	/// Raw (still percent-encoded) captures of a full match.
	///
	/// Optional parameters that did not participate are absent; one that
	/// participated with an empty capture is present as `""`.
	pub fn captures(&self, candidate: &str) -> Option<HashMap<String, String>> {
		collect_captures(&self.regex, &self.params, candidate)
	}

	/// Fill the template with `values`, percent-encoding each value.
	///
	/// A missing optional parameter is dropped along with the separator in
	/// front of it. Once one is dropped, no later parameter may be filled:
	/// the value would shift left and match the earlier slot instead. Values
	/// must satisfy their parameter's constraint.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_urls::routers::PathPattern;
	/// use std::collections::HashMap;
	///
	/// let pattern = PathPattern::new("/posts/{slug?}").unwrap();
	/// assert_eq!(pattern.generate(&HashMap::new()).unwrap(), "/posts");
	///
	/// let values = HashMap::from([("slug".to_string(), "hello world".to_string())]);
	/// assert_eq!(pattern.generate(&values).unwrap(), "/posts/hello%20world");
	/// ```
	pub fn generate(&self, values: &HashMap<String, String>) -> Result<String> {
		let mut out = String::new();
		let mut skipped: Option<&str> = None;

		for (i, token) in self.tokens.iter().enumerate() {
			match token {
				Token::Literal(literal) => out.push_str(literal),
				Token::Param(param) => {
					let value = values
						.get(&param.name)
						.filter(|v| !(param.optional && v.is_empty()));
					if let (Some(_), Some(skipped)) = (value, skipped) {
						return Err(Error::MissingUrlParameter {
							route: self.template.clone(),
							parameter: skipped.to_string(),
						});
					}
					match value {
						Some(value) => {
							if let Some(check) = self.value_checks.get(&param.name)
								&& !check.is_match(value)
							{
								return Err(invalid(
									&self.template,
									format!(
										"value '{}' for parameter '{}' does not satisfy its constraint",
										value, param.name
									),
								));
							}
							out.extend(utf8_percent_encode(value, SEGMENT_ENCODE_SET));
						}
						None if param.optional => {
							let after_separator = i > 0
								&& matches!(&self.tokens[i - 1], Token::Literal(l) if l.ends_with('/'));
							if after_separator {
								out.pop();
							}
							skipped.get_or_insert(param.name.as_str());
						}
						None => {
							return Err(Error::MissingUrlParameter {
								route: self.template.clone(),
								parameter: param.name.clone(),
							});
						}
					}
				}
			}
		}

		if out.is_empty() {
			out.push('/');
		}
		Ok(out)
	}
}

impl std::fmt::Display for PathPattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.template)
	}
}

/// A compiled host template, matched case-insensitively.
///
/// `*` in literal text is a wildcard label fragment.
///
/// # Examples
///
/// ```
/// use trellis_urls::routers::DomainPattern;
/// use std::collections::BTreeMap;
///
/// let pattern = DomainPattern::compile("{tenant}.example.com", &BTreeMap::new()).unwrap();
///
/// let params = pattern.captures("acme.example.com").unwrap();
/// assert_eq!(params.get("tenant").map(String::as_str), Some("acme"));
/// assert!(pattern.captures("example.com").is_none());
/// assert!(pattern.captures("ACME.Example.COM").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct DomainPattern {
	template: String,
	params: Vec<ParamSpec>,
	regex: Regex,
}

impl DomainPattern {
	pub fn compile(template: &str, constraints: &BTreeMap<String, String>) -> Result<Self> {
		let tokens = parse_template(template)?;
		let mut source = String::from("^");
		let mut params = Vec::new();

		for token in &tokens {
			match token {
				Token::Literal(literal) => {
					let escaped: Vec<String> = literal.split('*').map(regex::escape).collect();
					source.push_str(&escaped.join(DEFAULT_HOST_SEGMENT));
				}
				Token::Param(param) => {
					let constraint =
						constraint_for(template, &param.name, constraints, DEFAULT_HOST_SEGMENT)?;
					source.push_str(&format!("(?P<{}>{})", param.name, constraint));
					if param.optional {
						source.push('?');
					}
					params.push(param.clone());
				}
			}
		}
		source.push('$');

		Ok(Self {
			template: template.to_string(),
			regex: build_regex(template, &source, true)?,
			params,
		})
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	pub fn params(&self) -> &[ParamSpec] {
		&self.params
	}

	pub fn captures(&self, host: &str) -> Option<HashMap<String, String>> {
		collect_captures(&self.regex, &self.params, host)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn constraints(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	#[case("/users/{id}", "^/users/(?P<id>[^/]+)$")]
	#[case("/posts/{slug?}", "^/posts(?:/(?P<slug>[^/]*))?$")]
	#[case("/files/v1.0", r"^/files/v1\.0$")]
	#[case("/a/{b:key}", "^/a/(?P<b>[^/]+)$")]
	fn test_generated_regex(#[case] template: &str, #[case] expected: &str) {
		assert_eq!(PathPattern::new(template).unwrap().regex_source(), expected);
	}

	#[rstest]
	fn test_optional_parameter_consumes_separator() {
		let pattern = PathPattern::new("/posts/{slug?}").unwrap();

		assert_eq!(pattern.captures("/posts").unwrap(), HashMap::new());
		assert_eq!(
			pattern.captures("/posts/hello-world").unwrap(),
			HashMap::from([("slug".to_string(), "hello-world".to_string())])
		);
		assert!(pattern.captures("/posts/a/b").is_none());
	}

	#[rstest]
	fn test_empty_participating_optional_capture_is_kept() {
		let pattern = PathPattern::new("/posts/{slug?}").unwrap();
		assert_eq!(
			pattern.captures("/posts/").unwrap().get("slug").map(String::as_str),
			Some("")
		);
	}

	#[rstest]
	fn test_match_is_anchored_and_case_sensitive() {
		let pattern = PathPattern::new("/users").unwrap();
		assert!(pattern.is_match("/users"));
		assert!(!pattern.is_match("/users/extra"));
		assert!(!pattern.is_match("/api/users"));
		assert!(!pattern.is_match("/Users"));
	}

	#[rstest]
	#[case("@uuid", "0b7f3c7e-4a65-4b3d-9b1e-2f6f1c0e9a11", true)]
	#[case("@uuid", "not-a-uuid", false)]
	#[case("@id", "42", true)]
	#[case("@slug", "Hello", false)]
	#[case("[a-z]{3}", "abc", true)]
	#[case("[a-z]{3}", "abcd", false)]
	fn test_constraints(#[case] constraint: &str, #[case] value: &str, #[case] matches: bool) {
		let pattern =
			PathPattern::compile("/x/{key}", &constraints(&[("key", constraint)])).unwrap();
		assert_eq!(pattern.is_match(&format!("/x/{}", value)), matches);
	}

	#[rstest]
	fn test_parameter_name_does_not_select_library_pattern() {
		let pattern = PathPattern::new("/users/{id}").unwrap();
		assert!(pattern.is_match("/users/abc"));
	}

	#[rstest]
	fn test_constraint_alternation_stays_inside_group() {
		let pattern =
			PathPattern::compile("/{lang}/docs", &constraints(&[("lang", "en|fr")])).unwrap();
		assert!(pattern.is_match("/fr/docs"));
		assert!(!pattern.is_match("/fr"));
	}

	#[rstest]
	#[case("/users/{id")]
	#[case("/users/id}")]
	#[case("/users/{}")]
	#[case("/users/{1id}")]
	#[case("/a/{id}/b/{id}")]
	#[case("/a/{post:}")]
	fn test_malformed_templates(#[case] template: &str) {
		let err = PathPattern::new(template).unwrap_err();
		assert!(matches!(err, Error::InvalidPattern { .. }));
	}

	#[rstest]
	fn test_unknown_library_reference() {
		let err = PathPattern::compile("/{id}", &constraints(&[("id", "@zipcode")])).unwrap_err();
		assert!(err.to_string().contains("@zipcode"));
	}

	#[rstest]
	fn test_invalid_constraint_regex() {
		let err = PathPattern::compile("/{id}", &constraints(&[("id", "[0-9")])).unwrap_err();
		assert!(matches!(err, Error::InvalidPattern { .. }));
	}

	#[rstest]
	fn test_template_too_long() {
		let template = format!("/{}", "a".repeat(MAX_TEMPLATE_LENGTH));
		assert!(PathPattern::new(&template).is_err());
	}

	#[rstest]
	fn test_binding_key_recorded() {
		let pattern = PathPattern::new("/posts/{post:slug}/comments/{comment}").unwrap();
		let params = pattern.params();
		assert_eq!(params[0].binding_key.as_deref(), Some("slug"));
		assert_eq!(params[1].binding_key, None);
		assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["post", "comment"]);
	}

	#[rstest]
	fn test_generate_rejects_value_violating_constraint() {
		let pattern =
			PathPattern::compile("/users/{id}", &constraints(&[("id", "[0-9]+")])).unwrap();
		let values = HashMap::from([("id".to_string(), "abc".to_string())]);
		assert!(matches!(
			pattern.generate(&values),
			Err(Error::InvalidPattern { .. })
		));
	}

	#[rstest]
	fn test_generate_missing_required() {
		let pattern = PathPattern::new("/users/{id}").unwrap();
		let err = pattern.generate(&HashMap::new()).unwrap_err();
		assert!(matches!(
			err,
			Error::MissingUrlParameter { ref parameter, .. } if parameter == "id"
		));
	}

	#[rstest]
	fn test_generate_refuses_gap_between_optionals() {
		let pattern = PathPattern::new("/archive/{year?}/{month?}").unwrap();
		let values = HashMap::from([("month".to_string(), "05".to_string())]);
		let err = pattern.generate(&values).unwrap_err();
		assert!(matches!(
			err,
			Error::MissingUrlParameter { ref parameter, .. } if parameter == "year"
		));

		let values = HashMap::from([("year".to_string(), "2024".to_string())]);
		assert_eq!(pattern.generate(&values).unwrap(), "/archive/2024");
		assert_eq!(pattern.generate(&HashMap::new()).unwrap(), "/archive");
	}

	#[rstest]
	fn test_generate_root_only_optional() {
		let pattern = PathPattern::new("/{page?}").unwrap();
		assert_eq!(pattern.generate(&HashMap::new()).unwrap(), "/");
		assert!(pattern.is_match("/"));
		assert!(pattern.is_match(""));
	}

	#[rstest]
	#[case("{tenant}.example.com", "acme.example.com", Some("acme"))]
	#[case("{tenant}.example.com", "example.com", None)]
	#[case("{tenant}.example.com", "a.b.example.com", None)]
	#[case("*.example.com", "www.example.com", None)]
	fn test_domain_patterns(
		#[case] template: &str,
		#[case] host: &str,
		#[case] tenant: Option<&str>,
	) {
		let pattern = DomainPattern::compile(template, &BTreeMap::new()).unwrap();
		let captures = pattern.captures(host);
		assert_eq!(
			captures.as_ref().and_then(|c| c.get("tenant")).map(String::as_str),
			tenant
		);
	}

	#[rstest]
	fn test_domain_wildcard() {
		let pattern = DomainPattern::compile("*.example.com", &BTreeMap::new()).unwrap();
		assert!(pattern.captures("www.example.com").is_some());
		assert!(pattern.captures("example.com").is_none());
	}
}
