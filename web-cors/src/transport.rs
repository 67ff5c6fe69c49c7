use url::Url;

use crate::Result;

/// A raw event delivered by the host's cross-document message bus.
#[derive(Debug, Clone)]
pub struct Incoming<H> {
	/// The string body of the event. Non-string events never get this far.
	pub data: String,

	/// The sender's origin, as reported by the host.
	pub origin: String,

	/// A handle to the sender, when the host exposes one.
	pub source: Option<H>,
}

/// The native cross-document messaging primitive.
pub trait Transport: 'static {
	/// Something that can be posted to, like a window.
	type Handle: Clone + 'static;

	/// Keeps a handler registered until dropped.
	type Binding;

	/// Register a handler for every inbound message event.
	fn bind<F>(&self, handler: F) -> Result<Self::Binding>
	where
		F: FnMut(Incoming<Self::Handle>) + 'static;

	/// Post a frame. Hosts drop it silently when the target's origin doesn't match `target_origin`.
	fn post(&self, target: &Self::Handle, frame: &str, target_origin: &str) -> Result<()>;

	/// Whether two handles point at the same context.
	fn same(a: &Self::Handle, b: &Self::Handle) -> bool;
}

pub type Handle<H> = <<H as Host>::Transport as Transport>::Handle;

/// The document a controller lives in.
pub trait Host: Clone + 'static {
	type Transport: Transport;

	fn transport(&self) -> Self::Transport;

	/// The URL of the current document, used to resolve relative URLs.
	fn location(&self) -> Result<Url>;

	/// Run `callback` once the document can have children attached.
	///
	/// Fires exactly once, immediately if the document is already interactive.
	fn on_interactive(&self, callback: Box<dyn FnOnce()>);

	/// Attach a hidden frame loading `url` and return a handle to its context.
	fn embed(&self, url: &Url) -> Result<Handle<Self>>;

	/// The embedding context, if this document is framed.
	fn parent(&self) -> Option<Handle<Self>>;

	/// The URL of the document that loaded this one.
	fn referrer(&self) -> Option<Url>;
}
