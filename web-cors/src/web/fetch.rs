use std::future::Future;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Response, Window};

use crate::{Error, Fetch, HttpRequest, HttpResponse, Result};

/// Performs requests with the browser's Fetch API.
#[derive(Clone)]
pub struct WebFetch {
	window: Window,
}

impl WebFetch {
	pub fn new(window: Window) -> Self {
		Self { window }
	}
}

impl Fetch for WebFetch {
	fn fetch(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> {
		let window = self.window.clone();

		async move {
			let url = request.url.clone();
			send(&window, request).await.map_err(|err| {
				tracing::debug!(%url, ?err, "fetch failed");
				Error::Fetch(format!("Request {url} failed"))
			})
		}
	}
}

async fn send(window: &Window, request: HttpRequest) -> std::result::Result<HttpResponse, JsValue> {
	let headers = Headers::new()?;
	for (key, value) in &request.headers {
		headers.set(key, value)?;
	}

	let init = RequestInit::new();
	init.set_method(&request.method);
	init.set_headers(&headers);

	if let Some(body) = &request.body {
		init.set_body(&JsValue::from_str(body));
	}

	let request = web_sys::Request::new_with_str_and_init(&request.url, &init)?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request)).await?.unchecked_into();

	let body = JsFuture::from(response.text()?).await?;

	Ok(HttpResponse {
		status: response.status(),
		body: body.as_string().unwrap_or_default(),
	})
}
