//! Serialize JSON values into a query string, jQuery style.
//!
//! `{"a": {"b": [1, {"c": 2}]}}` becomes `a[b][]=1&a[b][1][c]=2`, percent-encoded.
use serde_json::Value;
use url::form_urlencoded;

/// Serialize `value` into `key=value` pairs joined with `&`.
///
/// Objects are expanded recursively. A top-level array is read as `{name, value}` pairs.
/// Anything else is returned as plain text.
pub fn param(value: &Value) -> String {
	let mut params = Vec::new();

	match value {
		Value::Object(object) => {
			for (key, value) in object {
				build(key, value, &mut params);
			}
		}
		Value::Array(items) => {
			for item in items {
				let name = item.get("name").map(scalar).unwrap_or_default();
				let value = item.get("value").map(scalar).unwrap_or_default();
				params.push(pair(&name, &value));
			}
		}
		other => return scalar(other),
	}

	params.join("&")
}

fn build(prefix: &str, value: &Value, params: &mut Vec<String>) {
	match value {
		Value::Array(items) => {
			for (i, item) in items.iter().enumerate() {
				let key = match item {
					Value::Array(_) | Value::Object(_) => format!("{prefix}[{i}]"),
					_ => format!("{prefix}[]"),
				};
				build(&key, item, params);
			}
		}
		Value::Object(object) => {
			for (key, value) in object {
				build(&format!("{prefix}[{key}]"), value, params);
			}
		}
		scalar_value => params.push(pair(prefix, &scalar(scalar_value))),
	}
}

fn scalar(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn pair(key: &str, value: &str) -> String {
	let key: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
	let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
	format!("{key}={value}")
}
