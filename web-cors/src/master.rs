use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use url::Url;

use crate::{
	origin, Channel, Config, Correlator, Error, Gate, Host, Message, RequestEnvelope, RequestOptions,
	ResponseEnvelope, Result, HANDSHAKE,
};

struct State<T: crate::Transport> {
	config: Config,

	// Only messages from this origin are accepted.
	origin: String,

	channel: Channel<T>,
	correlator: Correlator,
	gate: Gate,
}

/// The embedding side: owns a hidden frame on another origin and proxies requests through it.
pub struct Master<H: Host> {
	state: Rc<State<H::Transport>>,
	remote: Url,
}

impl<H: Host> Master<H> {
	pub fn new(host: H, url: &str) -> Result<Self> {
		Self::with_config(host, url, Config::default())
	}

	/// Embed `url` once the document is interactive.
	///
	/// Requests may be made right away; they are sent when the worker announces itself.
	pub fn with_config(host: H, url: &str, config: Config) -> Result<Self> {
		let remote = origin::resolve(&host.location()?, url)?;
		let channel = Channel::new(config.master.as_str(), host.transport(), config.framer()?)?;

		let state = Rc::new(State {
			origin: origin::origin(&remote),
			config,
			channel,
			correlator: Correlator::new(),
			gate: Gate::new(),
		});

		tracing::debug!(url = %remote, origin = %state.origin, "creating master");

		let weak = Rc::downgrade(&state);
		let embed = remote.clone();
		let attach_host = host.clone();
		host.on_interactive(Box::new(move || attach(attach_host, weak, embed)));

		Ok(Self { state, remote })
	}

	/// Ask the worker to fetch `url`, resolving with the response body.
	pub fn request<T: Into<String>>(&self, url: T, options: RequestOptions) -> Response {
		let (tx, rx) = oneshot::channel();
		let uid = self.state.correlator.allocate(move |outcome| {
			tx.send(outcome).ok();
		});

		let envelope = RequestEnvelope {
			uid,
			url: url.into(),
			options,
		};

		let weak = Rc::downgrade(&self.state);
		self.state.gate.when_ready(move || {
			if let Some(state) = weak.upgrade() {
				state.dispatch(envelope);
			}
		});

		Response { outcome: rx }
	}

	/// Whether the worker has announced itself.
	pub fn is_ready(&self) -> bool {
		self.state.gate.is_ready()
	}

	/// The number of requests still waiting for a response.
	pub fn pending(&self) -> usize {
		self.state.correlator.len()
	}

	pub fn origin(&self) -> &str {
		&self.state.origin
	}

	pub fn url(&self) -> &Url {
		&self.remote
	}
}

fn attach<H: Host>(host: H, state: Weak<State<H::Transport>>, url: Url) {
	let Some(state) = state.upgrade() else {
		return;
	};

	let frame = match host.embed(&url) {
		Ok(frame) => frame,
		Err(err) => {
			tracing::warn!(%url, %err, "failed to embed worker");
			return;
		}
	};

	state.channel.add_scoped(state.config.worker.as_str(), frame, state.origin.as_str());

	let weak = Rc::downgrade(&state);
	state.channel.listen(move |message| {
		if let Some(state) = weak.upgrade() {
			state.receive(message);
		}
	});
}

impl<T: crate::Transport> State<T> {
	fn receive(&self, message: &Message) {
		if message.origin != self.origin {
			tracing::trace!(origin = %message.origin, expected = %self.origin, "ignoring message from unexpected origin");
			return;
		}

		if message.payload.is_literal(HANDSHAKE) {
			if self.gate.signal_ready() {
				tracing::debug!(origin = %self.origin, "worker ready");
			}
			return;
		}

		match message.payload.json::<ResponseEnvelope>() {
			Some(response) => {
				self.correlator.resolve(&response.uid, response.valid, response.data);
			}
			None => tracing::trace!(payload = %message.payload.text(), "ignoring unexpected payload"),
		}
	}

	fn dispatch(&self, envelope: RequestEnvelope) {
		tracing::debug!(uid = %envelope.uid, url = %envelope.url, "sending request");

		if let Err(err) = self.channel.send(&envelope, Some(self.config.worker.as_str())) {
			self.correlator.resolve(&envelope.uid, false, err.to_string());
		}
	}
}

/// The eventual result of [Master::request].
///
/// Dropping it doesn't cancel the request; the response is simply discarded.
pub struct Response {
	outcome: oneshot::Receiver<crate::Outcome>,
}

impl Future for Response {
	type Output = Result<String>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.outcome).poll(cx).map(|outcome| match outcome {
			Ok(Ok(body)) => Ok(body),
			Ok(Err(reason)) => Err(Error::Rejected(reason)),
			Err(_) => Err(Error::Dropped),
		})
	}
}
