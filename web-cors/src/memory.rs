//! An in-process stand-in for browser windows.
//!
//! Every [MemoryHost] is a window with a URL. Posting a frame schedules an asynchronous delivery
//! on the current thread, in order, and drops it when the target origin doesn't match, like
//! `postMessage` does. Natively this must run inside a [tokio::task::LocalSet].
use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use crate::{origin, Host, Incoming, Result, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

type Handler = Rc<RefCell<dyn FnMut(Incoming<WindowId>)>>;

struct Window {
	url: Url,
	origin: String,
	parent: Option<WindowId>,
	referrer: Option<Url>,

	interactive: bool,
	waiting: Vec<Box<dyn FnOnce()>>,

	handlers: Vec<(u64, Handler)>,
}

#[derive(Default)]
struct Bus {
	windows: Vec<Window>,
	next_handler: u64,
	in_flight: usize,
}

/// A set of windows that can message each other.
#[derive(Clone, Default)]
pub struct MemoryBus {
	inner: Rc<RefCell<Bus>>,
}

impl MemoryBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Open a top-level window that is already interactive.
	pub fn open(&self, url: &str) -> Result<MemoryHost> {
		Ok(self.create(Url::parse(url)?, None, true))
	}

	/// Open a top-level window that stays loading until [MemoryHost::finish_loading].
	pub fn open_loading(&self, url: &str) -> Result<MemoryHost> {
		Ok(self.create(Url::parse(url)?, None, false))
	}

	/// The number of posted frames not yet delivered.
	pub fn in_flight(&self) -> usize {
		self.inner.borrow().in_flight
	}

	/// The number of handlers bound to `host`'s window.
	pub fn handlers(&self, host: &MemoryHost) -> usize {
		self.inner.borrow().windows[host.window.0].handlers.len()
	}

	/// Yield until every posted frame has been delivered.
	///
	/// Must be awaited on the thread that posted the frames.
	pub async fn settle(&self) {
		while self.in_flight() > 0 {
			tokio::task::yield_now().await;
		}
	}

	fn create(&self, url: Url, parent: Option<WindowId>, interactive: bool) -> MemoryHost {
		let mut bus = self.inner.borrow_mut();
		let referrer = parent.map(|parent| bus.windows[parent.0].url.clone());

		let id = WindowId(bus.windows.len());
		bus.windows.push(Window {
			origin: origin::origin(&url),
			url,
			parent,
			referrer,
			interactive,
			waiting: Vec::new(),
			handlers: Vec::new(),
		});

		MemoryHost {
			bus: self.clone(),
			window: id,
		}
	}

	fn deliver(&self, target: WindowId, incoming: Incoming<WindowId>) {
		// Handlers may post, bind or unbind, so don't hold the bus while calling them.
		let handlers: Vec<Handler> = match self.inner.borrow().windows.get(target.0) {
			Some(window) => window.handlers.iter().map(|(_, handler)| handler.clone()).collect(),
			None => Vec::new(),
		};

		for handler in handlers {
			(&mut *handler.borrow_mut())(incoming.clone());
		}

		self.inner.borrow_mut().in_flight -= 1;
	}
}

/// One window on a [MemoryBus].
#[derive(Clone)]
pub struct MemoryHost {
	bus: MemoryBus,
	window: WindowId,
}

impl MemoryHost {
	pub fn window(&self) -> WindowId {
		self.window
	}

	pub fn url(&self) -> Url {
		self.bus.inner.borrow().windows[self.window.0].url.clone()
	}

	/// Become interactive, running anything waiting on [Host::on_interactive].
	pub fn finish_loading(&self) {
		let waiting = {
			let mut bus = self.bus.inner.borrow_mut();
			let window = &mut bus.windows[self.window.0];
			window.interactive = true;
			std::mem::take(&mut window.waiting)
		};

		for callback in waiting {
			callback();
		}
	}

	/// The windows this one has embedded, in creation order.
	pub fn frames(&self) -> Vec<MemoryHost> {
		let bus = self.bus.inner.borrow();
		(0..bus.windows.len())
			.filter(|&i| bus.windows[i].parent == Some(self.window))
			.map(|i| MemoryHost {
				bus: self.bus.clone(),
				window: WindowId(i),
			})
			.collect()
	}
}

impl Host for MemoryHost {
	type Transport = MemoryTransport;

	fn transport(&self) -> MemoryTransport {
		MemoryTransport {
			bus: self.bus.clone(),
			window: self.window,
		}
	}

	fn location(&self) -> Result<Url> {
		Ok(self.url())
	}

	fn on_interactive(&self, callback: Box<dyn FnOnce()>) {
		{
			let mut bus = self.bus.inner.borrow_mut();
			let window = &mut bus.windows[self.window.0];
			if !window.interactive {
				window.waiting.push(callback);
				return;
			}
		}

		callback();
	}

	fn embed(&self, url: &Url) -> Result<WindowId> {
		Ok(self.bus.create(url.clone(), Some(self.window), true).window)
	}

	fn parent(&self) -> Option<WindowId> {
		self.bus.inner.borrow().windows[self.window.0].parent
	}

	fn referrer(&self) -> Option<Url> {
		self.bus.inner.borrow().windows[self.window.0].referrer.clone()
	}
}

/// Posts from one window of a [MemoryBus].
#[derive(Clone)]
pub struct MemoryTransport {
	bus: MemoryBus,
	window: WindowId,
}

/// Unbinds its handler when dropped.
pub struct MemoryBinding {
	bus: MemoryBus,
	window: WindowId,
	id: u64,
}

impl Drop for MemoryBinding {
	fn drop(&mut self) {
		let mut bus = self.bus.inner.borrow_mut();
		bus.windows[self.window.0].handlers.retain(|(id, _)| *id != self.id);
	}
}

impl Transport for MemoryTransport {
	type Handle = WindowId;
	type Binding = MemoryBinding;

	fn bind<F>(&self, handler: F) -> Result<MemoryBinding>
	where
		F: FnMut(Incoming<WindowId>) + 'static,
	{
		let mut bus = self.bus.inner.borrow_mut();
		let id = bus.next_handler;
		bus.next_handler += 1;

		let handler: Handler = Rc::new(RefCell::new(handler));
		bus.windows[self.window.0].handlers.push((id, handler));

		Ok(MemoryBinding {
			bus: self.bus.clone(),
			window: self.window,
			id,
		})
	}

	fn post(&self, target: &WindowId, frame: &str, target_origin: &str) -> Result<()> {
		let mut bus = self.bus.inner.borrow_mut();

		let Some(receiver) = bus.windows.get(target.0) else {
			return Ok(());
		};

		if target_origin != "*" && receiver.origin != target_origin {
			tracing::trace!(origin = %receiver.origin, %target_origin, "target origin mismatch");
			return Ok(());
		}

		let incoming = Incoming {
			data: frame.to_string(),
			origin: bus.windows[self.window.0].origin.clone(),
			source: Some(self.window),
		};

		bus.in_flight += 1;
		drop(bus);

		let bus = self.bus.clone();
		let target = *target;
		web_async::spawn(async move { bus.deliver(target, incoming) });

		Ok(())
	}

	fn same(a: &WindowId, b: &WindowId) -> bool {
		a == b
	}
}
