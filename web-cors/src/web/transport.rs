use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, Window};

use crate::{Incoming, Result, Transport};

/// `postMessage` and the `message` event of a window.
#[derive(Clone)]
pub struct WindowTransport {
	window: Window,
}

impl WindowTransport {
	pub fn new(window: Window) -> Self {
		Self { window }
	}
}

/// Removes the `message` listener when dropped.
pub struct WindowBinding {
	window: Window,
	closure: Closure<dyn FnMut(MessageEvent)>,
}

impl Drop for WindowBinding {
	fn drop(&mut self) {
		let _ = self
			.window
			.remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
	}
}

impl Transport for WindowTransport {
	type Handle = Window;
	type Binding = WindowBinding;

	fn bind<F>(&self, mut handler: F) -> Result<WindowBinding>
	where
		F: FnMut(Incoming<Window>) + 'static,
	{
		let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
			// Other libraries share this event; anything that isn't a string can't be ours.
			let Some(data) = event.data().as_string() else {
				return;
			};

			// Cross-origin windows fail an instanceof check, so don't use dyn_into.
			let source = event.source().map(|source| source.unchecked_into::<Window>());

			handler(Incoming {
				data,
				origin: event.origin(),
				source,
			});
		}) as Box<dyn FnMut(_)>);

		self.window
			.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())?;

		Ok(WindowBinding {
			window: self.window.clone(),
			closure,
		})
	}

	fn post(&self, target: &Window, frame: &str, target_origin: &str) -> Result<()> {
		target.post_message(&JsValue::from_str(frame), target_origin)?;
		Ok(())
	}

	fn same(a: &Window, b: &Window) -> bool {
		js_sys::Object::is(a, b)
	}
}
