use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::{ControlFramer, Framing, Incoming, Payload, Result, Transport};

/// A named peer that frames can be posted to.
#[derive(Debug, Clone)]
pub struct Endpoint<H> {
	pub name: String,
	pub handle: H,

	/// Passed as postMessage's `targetOrigin`.
	pub origin: String,
}

/// A decoded inbound message.
#[derive(Debug, Clone)]
pub struct Message {
	pub payload: Payload,

	/// The sender's origin.
	pub origin: String,

	/// The registered peer that sent this.
	pub peer: String,
}

type Listener = Rc<dyn Fn(&Message)>;

struct Shared<T: Transport, F> {
	name: String,
	framer: F,
	transport: T,

	// Insertion ordered; re-adding a name replaces it in place.
	endpoints: RefCell<Vec<Endpoint<T::Handle>>>,
	listeners: RefCell<Vec<Listener>>,
}

/// A bound send/receive endpoint for one `(name, namespace)` pair.
///
/// Inbound frames addressed to another name or namespace, or sent by a window that is not a
/// registered endpoint, are dropped before any listener sees them.
pub struct Channel<T: Transport, F = ControlFramer> {
	shared: Rc<Shared<T, F>>,

	// Held to keep the host handler registered.
	_binding: T::Binding,
}

impl<T: Transport, F: Framing + 'static> Channel<T, F> {
	/// Create the channel and bind it to the transport's message events.
	pub fn new<N: Into<String>>(name: N, transport: T, framer: F) -> Result<Self> {
		let shared = Rc::new(Shared {
			name: name.into(),
			framer,
			transport,
			endpoints: RefCell::new(Vec::new()),
			listeners: RefCell::new(Vec::new()),
		});

		let weak = Rc::downgrade(&shared);
		let binding = shared.transport.bind(move |incoming| {
			if let Some(shared) = weak.upgrade() {
				shared.receive(incoming);
			}
		})?;

		Ok(Self {
			shared,
			_binding: binding,
		})
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Register `handle` as `name`, accepting any target origin.
	pub fn add<N: Into<String>>(&self, name: N, handle: T::Handle) {
		self.add_scoped(name, handle, "*")
	}

	/// Register `handle` as `name`; frames are only delivered while it shows `origin`.
	pub fn add_scoped<N: Into<String>, O: Into<String>>(&self, name: N, handle: T::Handle, origin: O) {
		let endpoint = Endpoint {
			name: name.into(),
			handle,
			origin: origin.into(),
		};

		let mut endpoints = self.shared.endpoints.borrow_mut();
		match endpoints.iter_mut().find(|e| e.name == endpoint.name) {
			Some(existing) => *existing = endpoint,
			None => endpoints.push(endpoint),
		}
	}

	pub fn endpoint(&self, name: &str) -> Option<Endpoint<T::Handle>> {
		self.shared.endpoints.borrow().iter().find(|e| e.name == name).cloned()
	}

	pub fn listen<L: Fn(&Message) + 'static>(&self, listener: L) {
		self.shared.listeners.borrow_mut().push(Rc::new(listener));
	}

	pub fn remove_all_listeners(&self) {
		self.shared.listeners.borrow_mut().clear();
	}

	/// Send a JSON-encoded message to `peer`, or to every endpoint when None.
	///
	/// Sending to an unknown peer does nothing.
	pub fn send<M: Serialize + ?Sized>(&self, message: &M, peer: Option<&str>) -> Result<()> {
		let text = serde_json::to_string(message)?;
		self.send_text(&text, peer)
	}

	/// Like [Self::send], but the payload is used verbatim.
	pub fn send_text(&self, text: &str, peer: Option<&str>) -> Result<()> {
		// Clone so a transport can call back into the channel.
		let targets: Vec<_> = self
			.shared
			.endpoints
			.borrow()
			.iter()
			.filter(|e| peer.map_or(true, |peer| e.name == peer))
			.cloned()
			.collect();

		if targets.is_empty() {
			tracing::trace!(channel = %self.shared.name, ?peer, "no endpoint to send to");
		}

		let mut result = Ok(());
		for target in targets {
			let frame = self.shared.framer.encode(&target.name, text);
			if let Err(err) = self.shared.transport.post(&target.handle, &frame, &target.origin) {
				tracing::warn!(channel = %self.shared.name, peer = %target.name, %err, "failed to post");
				if result.is_ok() {
					result = Err(err);
				}
			}
		}

		result
	}
}

impl<T: Transport, F: Framing> Shared<T, F> {
	fn receive(&self, incoming: Incoming<T::Handle>) {
		let Some(text) = self.framer.unwrap(&self.name, &incoming.data) else {
			tracing::trace!(channel = %self.name, origin = %incoming.origin, "dropping foreign message");
			return;
		};

		let peer = incoming.source.as_ref().and_then(|source| {
			self.endpoints
				.borrow()
				.iter()
				.find(|e| T::same(&e.handle, source))
				.map(|e| e.name.clone())
		});

		let Some(peer) = peer else {
			tracing::debug!(channel = %self.name, origin = %incoming.origin, "dropping message from unregistered source");
			return;
		};

		let message = Message {
			payload: Payload::parse(text),
			origin: incoming.origin,
			peer,
		};

		// Listeners may register more listeners or send.
		let listeners = self.listeners.borrow().clone();
		for listener in listeners {
			listener(&message);
		}
	}
}

#[cfg(test)]
mod test {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::memory::{MemoryBus, MemoryHost};
	use crate::test_util::run;
	use crate::Host;

	fn channel(host: &MemoryHost, name: &str, namespace: &str) -> Channel<crate::memory::MemoryTransport> {
		Channel::new(name, host.transport(), ControlFramer::new(namespace).unwrap()).unwrap()
	}

	fn record(channel: &Channel<crate::memory::MemoryTransport>) -> Rc<RefCell<Vec<Message>>> {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		channel.listen(move |msg| sink.borrow_mut().push(msg.clone()));
		seen
	}

	#[test]
	fn directed_send() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			let seen = record(&worker);

			master.add("Worker", b.window());
			worker.add("Master", a.window());
			master.send("hello", Some("Worker")).unwrap();
			bus.settle().await;

			let seen = seen.borrow();
			assert_eq!(seen.len(), 1);
			assert!(seen[0].payload.is_literal("hello"));
			assert_eq!(seen[0].origin, "http://a.com");
			assert_eq!(seen[0].peer, "Master");
		});
	}

	#[test]
	fn unknown_peer_is_noop() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			let seen = record(&worker);

			master.add("Worker", b.window());
			master.send("hello", Some("Nobody")).unwrap();
			bus.settle().await;

			assert!(seen.borrow().is_empty());
		});
	}

	#[test]
	fn broadcast() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();
			let c = bus.open("http://c.com/").unwrap();

			let hub = channel(&a, "Hub", "CORS");
			let left = channel(&b, "Left", "CORS");
			let right = channel(&c, "Right", "CORS");
			let left_seen = record(&left);
			let right_seen = record(&right);

			hub.add("Left", b.window());
			hub.add("Right", c.window());
			left.add("Hub", a.window());
			right.add("Hub", a.window());
			hub.send(&serde_json::json!({ "n": 1 }), None).unwrap();
			bus.settle().await;

			assert_eq!(left_seen.borrow().len(), 1);
			assert_eq!(right_seen.borrow().len(), 1);
			assert_eq!(right_seen.borrow()[0].payload.value(), Some(&serde_json::json!({ "n": 1 })));
			assert_eq!(left_seen.borrow()[0].peer, "Hub");
		});
	}

	#[test]
	fn unregistered_source_dropped() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();
			let evil = bus.open("http://evil.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			let seen = record(&worker);
			worker.add("Master", a.window());

			// Correctly framed and namespaced, but from a window the worker never registered.
			let rogue = channel(&evil, "Master", "CORS");
			rogue.add("Worker", b.window());
			rogue.send("hello", None).unwrap();
			bus.settle().await;
			assert!(seen.borrow().is_empty());

			master.add("Worker", b.window());
			master.send("hello", None).unwrap();
			bus.settle().await;
			assert_eq!(seen.borrow().len(), 1);
			assert_eq!(seen.borrow()[0].peer, "Master");
		});
	}

	#[test]
	fn foreign_namespace_ignored() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let other = channel(&a, "Master", "Other");
			let worker = channel(&b, "Worker", "CORS");
			let seen = record(&worker);

			other.add("Worker", b.window());
			other.send("ready", None).unwrap();
			a.transport().post(&b.window(), "not a frame", "*").unwrap();
			bus.settle().await;

			assert!(seen.borrow().is_empty());
		});
	}

	#[test]
	fn listener_order_and_clear() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			master.add("Worker", b.window());
			worker.add("Master", a.window());

			let order = Rc::new(RefCell::new(Vec::new()));
			for i in 0..3 {
				let order = order.clone();
				worker.listen(move |_| order.borrow_mut().push(i));
			}

			master.send("one", None).unwrap();
			bus.settle().await;
			assert_eq!(*order.borrow(), vec![0, 1, 2]);

			worker.remove_all_listeners();
			master.send("two", None).unwrap();
			bus.settle().await;
			assert_eq!(order.borrow().len(), 3);
		});
	}

	#[test]
	fn scoped_endpoint_origin() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			let seen = record(&worker);
			worker.add("Master", a.window());

			master.add_scoped("Worker", b.window(), "http://evil.com");
			master.send("hello", None).unwrap();
			bus.settle().await;
			assert!(seen.borrow().is_empty());

			// Re-adding replaces the endpoint.
			master.add_scoped("Worker", b.window(), "http://b.com");
			master.send("hello", None).unwrap();
			bus.settle().await;
			assert_eq!(seen.borrow().len(), 1);
			assert_eq!(master.endpoint("Worker").unwrap().origin, "http://b.com");
		});
	}

	#[test]
	fn dropped_channel_unbinds() {
		run(async {
			let bus = MemoryBus::new();
			let a = bus.open("http://a.com/").unwrap();
			let b = bus.open("http://b.com/").unwrap();

			let master = channel(&a, "Master", "CORS");
			let worker = channel(&b, "Worker", "CORS");
			master.add("Worker", b.window());
			assert_eq!(bus.handlers(&b), 1);

			drop(worker);
			assert_eq!(bus.handlers(&b), 0);

			master.send("hello", None).unwrap();
			bus.settle().await;
		});
	}
}
