//! Scalar coercion of bound values to a parameter's declared type.
//!
//! Route, query and form values arrive as strings; JSON bodies and request
//! attributes may already be typed. Casts are lenient: integers and floats
//! take the longest leading numeric prefix and fall back to zero.

use serde_json::{Number, Value};
use trellis_urls::routers::{ParamDescriptor, TypeTag};

/// Strings that read as `false`; comparison is case-insensitive
const FALSE_STRINGS: [&str; 5] = ["false", "0", "no", "off", ""];
const TRUE_STRINGS: [&str; 4] = ["true", "1", "yes", "on"];

/// Coerce a raw string to the parameter's type
pub fn coerce_str(raw: &str, param: &ParamDescriptor) -> Value {
	coerce_value(Value::String(raw.to_string()), param)
}

/// Coerce a value to the parameter's type.
///
/// An empty string for a nullable `int` or `float` becomes `null`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use trellis_dispatch::coerce::coerce_value;
/// use trellis_urls::routers::ParamDescriptor;
///
/// assert_eq!(coerce_value(json!("42abc"), &ParamDescriptor::int("id")), json!(42));
/// assert_eq!(coerce_value(json!(""), &ParamDescriptor::int("id").nullable()), json!(null));
/// assert_eq!(coerce_value(json!("on"), &ParamDescriptor::bool("active")), json!(true));
/// assert_eq!(coerce_value(json!("a"), &ParamDescriptor::array("tags")), json!(["a"]));
/// ```
pub fn coerce_value(value: Value, param: &ParamDescriptor) -> Value {
	match &param.type_tag {
		TypeTag::Int => to_int(value, param.nullable),
		TypeTag::Float => to_float(value, param.nullable),
		TypeTag::Bool => Value::Bool(to_bool(&value)),
		TypeTag::Str => to_string(value),
		TypeTag::Array => match value {
			Value::Array(_) => value,
			other => Value::Array(vec![other]),
		},
		TypeTag::Enum(cases) => to_enum(value, cases),
		_ => value,
	}
}

fn to_int(value: Value, nullable: bool) -> Value {
	match value {
		Value::Number(n) => match n.as_i64() {
			Some(i) => Value::from(i),
			None => Value::from(n.as_f64().map(|f| f.trunc() as i64).unwrap_or_default()),
		},
		Value::Bool(b) => Value::from(i64::from(b)),
		Value::String(s) if s.is_empty() && nullable => Value::Null,
		Value::String(s) => Value::from(leading_int(&s)),
		Value::Null if nullable => Value::Null,
		_ => Value::from(0),
	}
}

fn to_float(value: Value, nullable: bool) -> Value {
	let float = match value {
		Value::Number(n) => n.as_f64().unwrap_or_default(),
		Value::Bool(b) => f64::from(u8::from(b)),
		Value::String(s) if s.is_empty() && nullable => return Value::Null,
		Value::String(s) => leading_float(&s),
		Value::Null if nullable => return Value::Null,
		_ => 0.0,
	};
	Number::from_f64(float)
		.map(Value::Number)
		.unwrap_or_else(|| Value::from(0.0))
}

/// Permissive string-to-boolean mapping
pub fn to_bool(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => {
			let lowered = s.trim().to_ascii_lowercase();
			if TRUE_STRINGS.contains(&lowered.as_str()) {
				true
			} else {
				!FALSE_STRINGS.contains(&lowered.as_str())
			}
		}
		Value::Null => false,
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

fn to_string(value: Value) -> Value {
	match value {
		Value::String(_) => value,
		Value::Null => Value::String(String::new()),
		Value::Number(n) => Value::String(n.to_string()),
		Value::Bool(b) => Value::String(b.to_string()),
		other => Value::String(other.to_string()),
	}
}

/// By-value lookup of a backed enumeration case, keeping the raw value on a miss
fn to_enum(value: Value, cases: &[(String, String)]) -> Value {
	let raw = match &value {
		Value::String(s) => s.clone(),
		Value::Number(n) => n.to_string(),
		_ => return value,
	};
	cases
		.iter()
		.find(|(_, backing)| *backing == raw)
		.map(|(case, _)| Value::String(case.clone()))
		.unwrap_or(value)
}

fn numeric_prefix(s: &str, allow_fraction: bool) -> &str {
	let bytes = s.as_bytes();
	let mut end = 0;
	if matches!(bytes.first(), Some(b'+' | b'-')) {
		end = 1;
	}
	let digits_start = end;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	let mut has_digits = end > digits_start;

	if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
		let mut frac_end = end + 1;
		while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
			frac_end += 1;
		}
		if frac_end > end + 1 || has_digits {
			has_digits |= frac_end > end + 1;
			end = frac_end;
		}
	}

	if allow_fraction && has_digits && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
		let mut exp_end = end + 1;
		if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
			exp_end += 1;
		}
		let exp_digits = exp_end;
		while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
			exp_end += 1;
		}
		if exp_end > exp_digits {
			end = exp_end;
		}
	}

	if has_digits { &s[..end] } else { "" }
}

fn leading_int(s: &str) -> i64 {
	let prefix = numeric_prefix(s.trim_start(), false);
	match prefix.parse::<i64>() {
		Ok(i) => i,
		// Out of range prefixes saturate
		Err(_) if prefix.starts_with('-') && prefix.len() > 1 => i64::MIN,
		Err(_) if !prefix.is_empty() => i64::MAX,
		Err(_) => 0,
	}
}

fn leading_float(s: &str) -> f64 {
	numeric_prefix(s.trim_start(), true)
		.parse::<f64>()
		.unwrap_or_default()
}
