use wasm_bindgen::prelude::*;

use super::{WebFetch, WebHost};
use crate::{Error, Master, RequestOptions, Worker};

/// `new CORSMaster(url)`: embeds `url` and proxies requests through it.
#[wasm_bindgen(js_name = CORSMaster)]
pub struct CorsMaster {
	inner: Master<WebHost>,
}

#[wasm_bindgen(js_class = CORSMaster)]
impl CorsMaster {
	#[wasm_bindgen(constructor)]
	pub fn new(url: &str) -> Result<CorsMaster, JsValue> {
		let inner = Master::new(WebHost::new().map_err(to_js)?, url).map_err(to_js)?;
		Ok(Self { inner })
	}

	/// Resolves with the response text, or rejects with the failure reason.
	pub fn request(&self, url: String, options: JsValue) -> js_sys::Promise {
		let options = match parse_options(&options) {
			Ok(options) => options,
			Err(err) => return js_sys::Promise::reject(&to_js(err)),
		};

		let response = self.inner.request(url, options);
		wasm_bindgen_futures::future_to_promise(async move {
			let body = response.await.map_err(to_js)?;
			Ok(JsValue::from_str(&body))
		})
	}

	#[wasm_bindgen(getter)]
	pub fn ready(&self) -> bool {
		self.inner.is_ready()
	}
}

/// `new CORSWorker()`: serves requests from the embedding page.
#[wasm_bindgen(js_name = CORSWorker)]
pub struct CorsWorker {
	#[allow(dead_code)]
	inner: Worker<WebHost, WebFetch>,
}

#[wasm_bindgen(js_class = CORSWorker)]
impl CorsWorker {
	#[wasm_bindgen(constructor)]
	pub fn new() -> Result<CorsWorker, JsValue> {
		let host = WebHost::new().map_err(to_js)?;
		let fetch = WebFetch::new(host.window().clone());
		let inner = Worker::new(host, fetch).map_err(to_js)?;
		Ok(Self { inner })
	}
}

// Round trip through JSON, which is what ends up on the wire anyway.
fn parse_options(options: &JsValue) -> Result<RequestOptions, Error> {
	if options.is_undefined() || options.is_null() {
		return Ok(RequestOptions::default());
	}

	let json: String = js_sys::JSON::stringify(options)?.into();
	Ok(serde_json::from_str(&json)?)
}

fn to_js(err: Error) -> JsValue {
	match err {
		Error::Unknown(value) => value,
		err => JsValue::from_str(&err.to_string()),
	}
}
