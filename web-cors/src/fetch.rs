use std::future::Future;

use serde_json::Value;

use crate::{param, RequestOptions, Result};

const METHODS: [&str; 6] = ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT"];

// encodeURIComponent("\x05")
const CACHE_KEY: &str = "%05";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// An HTTP request ready to hand to a [Fetch] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: String,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<String>,
}

impl HttpRequest {
	/// Apply `options` to `url`.
	///
	/// `stamp` is only used to defeat caches, so any value that changes between calls will do.
	pub fn prepare(url: &str, options: &RequestOptions, stamp: u64) -> Self {
		let method = options.method.as_deref().map(normalize_method).unwrap_or_else(|| "GET".to_string());
		let data = options.data.as_ref().map(param);

		let mut url = url.to_string();
		let mut body = None;

		let mut headers: Vec<(String, String)> = options
			.headers
			.iter()
			.map(|(key, value)| {
				let value = match value {
					Value::String(s) => s.clone(),
					other => other.to_string(),
				};
				(key.clone(), value)
			})
			.collect();

		headers.push(("X-Requested-With".to_string(), "XMLHttpRequest".to_string()));

		match method.as_str() {
			"GET" => {
				if let Some(data) = data {
					append_query(&mut url, &data);
				}

				if options.cache.unwrap_or(true) {
					append_query(&mut url, &format!("{CACHE_KEY}={stamp}"));
				}
			}
			"POST" => {
				headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
				body = data;
			}
			_ => {}
		}

		Self {
			method,
			url,
			headers,
			body,
		}
	}
}

/// A completed HTTP exchange. The status is informational; any response counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: String,
}

/// Performs HTTP requests on behalf of a [Worker](crate::Worker).
///
/// Failures should be [Error::Fetch](crate::Error::Fetch) with a human readable reason;
/// the reason is what the master's caller sees.
pub trait Fetch: 'static {
	fn fetch(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>>;
}

/// Upper-case the well known methods, leave anything else alone.
pub fn normalize_method(method: &str) -> String {
	let upper = method.to_ascii_uppercase();
	match METHODS.contains(&upper.as_str()) {
		true => upper,
		false => method.to_string(),
	}
}

fn append_query(url: &mut String, query: &str) {
	url.push(if url.contains('?') { '&' } else { '?' });
	url.push_str(query);
}

/// Milliseconds since the epoch, for cache busting.
pub(crate) fn now() -> u64 {
	#[cfg(target_arch = "wasm32")]
	return js_sys::Date::now() as u64;

	#[cfg(not(target_arch = "wasm32"))]
	return std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default();
}
