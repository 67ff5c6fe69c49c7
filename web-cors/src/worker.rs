use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::{
	fetch, origin, Channel, Config, Error, Fetch, Host, HttpRequest, Message, RequestEnvelope, ResponseEnvelope,
	Result, HANDSHAKE,
};

struct State<T: crate::Transport, F> {
	channel: Channel<T>,
	fetch: Rc<F>,

	// Added to the timestamp so back-to-back requests never share a cache key.
	nonce: Cell<u64>,
}

/// The embedded side: performs requests for its parent and reports the result.
pub struct Worker<H: Host, F: Fetch> {
	// Held to keep the channel bound; the worker is driven entirely by inbound messages.
	#[allow(dead_code)]
	state: Rc<State<H::Transport, F>>,
}

impl<H: Host, F: Fetch> Worker<H, F> {
	pub fn new(host: H, fetch: F) -> Result<Self> {
		Self::with_config(host, fetch, Config::default())
	}

	/// Start listening for requests from the parent and announce readiness.
	pub fn with_config(host: H, fetch: F, config: Config) -> Result<Self> {
		let parent = host.parent().ok_or(Error::NoParent)?;
		let channel = Channel::new(config.worker.as_str(), host.transport(), config.framer()?)?;

		// Replies are only delivered while the parent still shows the origin that loaded us.
		let target = host.referrer().map(|url| origin::origin(&url)).unwrap_or_else(|| "*".to_string());
		channel.add_scoped(config.master.as_str(), parent, target.as_str());

		let state = Rc::new(State {
			channel,
			fetch: Rc::new(fetch),
			nonce: Cell::new(0),
		});

		let weak = Rc::downgrade(&state);
		state.channel.listen(move |message| {
			if let Some(state) = weak.upgrade() {
				respond(&state, message);
			}
		});

		tracing::debug!(parent = %target, "worker ready");
		state.channel.send(HANDSHAKE, None)?;

		Ok(Self { state })
	}
}

fn respond<T: crate::Transport, F: Fetch>(state: &Rc<State<T, F>>, message: &Message) {
	// Only the registered parent gets this far.
	let peer = message.peer.clone();

	let envelope = match message.payload.json::<RequestEnvelope>() {
		Some(envelope) => envelope,
		None => {
			// Answer anything that carries an id, so the caller isn't left waiting.
			let uid = message.payload.value().and_then(|v| v.get("uid")).and_then(|v| v.as_str());
			match uid {
				Some(uid) => reply(state, &peer, uid.to_string(), Err("malformed request".to_string())),
				None => tracing::trace!(payload = %message.payload.text(), "ignoring unexpected payload"),
			}
			return;
		}
	};

	let nonce = state.nonce.get();
	state.nonce.set(nonce + 1);

	let request = HttpRequest::prepare(&envelope.url, &envelope.options, fetch::now() + nonce);
	tracing::debug!(uid = %envelope.uid, method = %request.method, url = %request.url, "fetching");

	let fetch = state.fetch.clone();
	let weak = Rc::downgrade(state);
	let uid = envelope.uid;

	web_async::spawn(async move {
		let outcome = match fetch.fetch(request).await {
			Ok(response) => Ok(response.body),
			Err(err) => Err(err.to_string()),
		};

		if let Some(state) = Weak::upgrade(&weak) {
			reply(&state, &peer, uid, outcome);
		}
	});
}

fn reply<T: crate::Transport, F>(state: &State<T, F>, peer: &str, uid: String, outcome: crate::Outcome) {
	let (valid, data) = match outcome {
		Ok(body) => (true, body),
		Err(reason) => (false, reason),
	};

	let envelope = ResponseEnvelope { uid, valid, data };
	if let Err(err) = state.channel.send(&envelope, Some(peer)) {
		tracing::warn!(uid = %envelope.uid, %err, "failed to send response");
	}
}
