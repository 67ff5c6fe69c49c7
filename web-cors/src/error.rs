use wasm_bindgen::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid url: {0}")]
	InvalidUrl(#[from] url::ParseError),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid namespace: {0:?}")]
	InvalidNamespace(String),

	#[error("no window")]
	NoWindow,

	#[error("no document body")]
	NoBody,

	#[error("no parent window")]
	NoParent,

	#[error("iframe has no content window")]
	NoContentWindow,

	/// The remote side answered, but with a failure.
	#[error("{0}")]
	Rejected(String),

	/// The HTTP call performed on behalf of a request failed.
	#[error("{0}")]
	Fetch(String),

	#[error("dropped")]
	Dropped,

	#[error("unknown error: {0:?}")]
	Unknown(JsValue),
}

impl From<JsValue> for Error {
	fn from(e: JsValue) -> Self {
		Self::Unknown(e)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
