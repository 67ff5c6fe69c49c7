use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Broadcast by a worker once it is listening.
pub const HANDSHAKE: &str = "ready";

/// Sent from the master to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
	pub uid: String,
	pub url: String,

	#[serde(default)]
	pub options: RequestOptions,
}

/// Sent from the worker back to the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
	pub uid: String,
	pub valid: bool,

	/// The body on success, or a description of the failure.
	pub data: String,
}

/// How the worker should perform the HTTP call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
	/// Defaults to GET.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,

	/// Scalar values are stringified.
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub headers: Map<String, Value>,

	/// Query string data for GET, form body for POST.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,

	/// Set to false to append a cache-busting parameter to GET requests.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cache: Option<bool>,
}

impl RequestOptions {
	pub fn method<T: Into<String>>(mut self, method: T) -> Self {
		self.method = Some(method.into());
		self
	}

	pub fn header<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
		self.headers.insert(key.into(), value.into());
		self
	}

	pub fn data<T: Into<Value>>(mut self, data: T) -> Self {
		self.data = Some(data.into());
		self
	}

	pub fn cache(mut self, cache: bool) -> Self {
		self.cache = Some(cache);
		self
	}
}
