//! The control-character wire framing.
//!
//! A frame is `SOH namespace '-' name STX payload ETX`. The name is the
//! *receiving* channel's name, so a channel only accepts frames addressed to it.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

pub const SOH: char = '\u{1}';
pub const STX: char = '\u{2}';
pub const ETX: char = '\u{3}';

/// Used when no namespace is configured.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Wraps and unwraps payload text for a named channel.
///
/// [Channel](crate::Channel) only talks to this trait, so the wire format can be
/// swapped out without touching routing or correlation.
pub trait Framing {
	/// Wrap `payload` so that it is accepted by the channel called `name`.
	fn encode(&self, name: &str, payload: &str) -> String;

	/// Return the payload when `frame` is addressed to the channel called `name`.
	fn unwrap<'a>(&self, name: &str, frame: &'a str) -> Option<&'a str>;
}

/// The SOH/STX/ETX framing, scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFramer {
	namespace: String,
}

impl ControlFramer {
	pub fn new<T: Into<String>>(namespace: T) -> Result<Self> {
		let namespace = namespace.into();
		if namespace.contains(['-', SOH, STX, ETX]) {
			return Err(Error::InvalidNamespace(namespace));
		}

		Ok(Self { namespace })
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}
}

impl Default for ControlFramer {
	fn default() -> Self {
		Self {
			namespace: DEFAULT_NAMESPACE.to_string(),
		}
	}
}

impl Framing for ControlFramer {
	fn encode(&self, name: &str, payload: &str) -> String {
		encode(name, &self.namespace, payload)
	}

	fn unwrap<'a>(&self, name: &str, frame: &'a str) -> Option<&'a str> {
		match is_valid_frame(name, &self.namespace, frame) {
			true => Some(&frame[header(name, &self.namespace).len()..frame.len() - ETX.len_utf8()]),
			false => None,
		}
	}
}

fn header(name: &str, namespace: &str) -> String {
	format!("{SOH}{namespace}-{name}{STX}")
}

pub fn encode(name: &str, namespace: &str, payload: &str) -> String {
	format!("{}{payload}{ETX}", header(name, namespace))
}

/// Strip the header and trailer, then try to parse the remainder as JSON.
///
/// The frame must already have passed [is_valid_frame]; anything else decodes to garbage.
pub fn decode(name: &str, namespace: &str, frame: &str) -> Payload {
	let start = header(name, namespace).len().min(frame.len());
	let end = frame.len().saturating_sub(ETX.len_utf8()).max(start);

	// Slicing at a non-boundary would panic, so fall back to the whole frame.
	let text = frame.get(start..end).unwrap_or(frame);
	Payload::parse(text)
}

pub fn is_valid_frame(name: &str, namespace: &str, candidate: &str) -> bool {
	let header = header(name, namespace);
	candidate.len() > header.len() && candidate.starts_with(&header) && candidate.ends_with(ETX)
}

/// The decoded body of a frame.
///
/// The unparsed text is always kept; the structured form is present when it parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
	text: String,
	value: Option<Value>,
}

impl Payload {
	pub fn parse<T: Into<String>>(text: T) -> Self {
		let text = text.into();
		let value = serde_json::from_str(&text).ok();
		Self { text, value }
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn value(&self) -> Option<&Value> {
		self.value.as_ref()
	}

	/// Decode into a typed shape, or None if the payload doesn't have it.
	pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
		T::deserialize(self.value.as_ref()?).ok()
	}

	/// True when the payload is `literal`, either JSON-quoted or bare.
	pub fn is_literal(&self, literal: &str) -> bool {
		match &self.value {
			Some(Value::String(s)) => s == literal,
			_ => self.text == literal,
		}
	}
}
