use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, HtmlIFrameElement, Window};

use super::WindowTransport;
use crate::{Error, Host, Result};

/// The current browser document.
#[derive(Clone)]
pub struct WebHost {
	window: Window,
	document: Document,
}

impl WebHost {
	pub fn new() -> Result<Self> {
		let window = web_sys::window().ok_or(Error::NoWindow)?;
		let document = window.document().ok_or(Error::NoWindow)?;
		Ok(Self { window, document })
	}

	pub fn window(&self) -> &Window {
		&self.window
	}
}

// `Document.readyState` is one of "loading", "interactive" or "complete".
fn is_interactive(ready_state: &str) -> bool {
	ready_state != "loading"
}

impl Host for WebHost {
	type Transport = WindowTransport;

	fn transport(&self) -> WindowTransport {
		WindowTransport::new(self.window.clone())
	}

	fn location(&self) -> Result<Url> {
		Ok(Url::parse(&self.window.location().href()?)?)
	}

	fn on_interactive(&self, callback: Box<dyn FnOnce()>) {
		if is_interactive(&self.document.ready_state()) {
			return callback();
		}

		let listener = Closure::once_into_js(move || callback());
		let options = AddEventListenerOptions::new();
		options.set_once(true);

		if let Err(err) = self.document.add_event_listener_with_callback_and_add_event_listener_options(
			"DOMContentLoaded",
			listener.unchecked_ref(),
			&options,
		) {
			tracing::warn!(?err, "failed to wait for DOMContentLoaded");
		}
	}

	fn embed(&self, url: &Url) -> Result<Window> {
		let iframe: HtmlIFrameElement = self.document.create_element("iframe")?.unchecked_into();

		for attr in ["width", "height", "frameborder", "marginwidth", "marginheight"] {
			iframe.set_attribute(attr, "0")?;
		}

		iframe.style().set_property("display", "none")?;
		iframe.set_src(url.as_str());

		let body = self.document.body().ok_or(Error::NoBody)?;
		body.append_child(&iframe)?;

		iframe.content_window().ok_or(Error::NoContentWindow)
	}

	fn parent(&self) -> Option<Window> {
		let parent = self.window.parent().ok().flatten()?;

		// A top-level window is its own parent.
		match js_sys::Object::is(&parent, &self.window) {
			true => None,
			false => Some(parent),
		}
	}

	fn referrer(&self) -> Option<Url> {
		Url::parse(&self.document.referrer()).ok()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn ready_states() {
		assert!(!is_interactive("loading"));
		assert!(is_interactive("interactive"));
		assert!(is_interactive("complete"));
	}
}
