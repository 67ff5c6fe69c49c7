use crate::{ControlFramer, Result};

/// Names shared by both ends of the protocol.
///
/// A master and worker only talk to each other when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Keeps unrelated users of the same message bus apart.
	pub namespace: String,

	/// The channel name of the embedding side.
	pub master: String,

	/// The channel name of the embedded side.
	pub worker: String,
}

impl Config {
	pub fn new<T: Into<String>>(namespace: T) -> Self {
		Self {
			namespace: namespace.into(),
			..Default::default()
		}
	}

	pub(crate) fn framer(&self) -> Result<ControlFramer> {
		ControlFramer::new(self.namespace.as_str())
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			namespace: "CORS".to_string(),
			master: "Master".to_string(),
			worker: "Worker".to_string(),
		}
	}
}
