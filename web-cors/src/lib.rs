//! Cross-origin HTTP requests through a hidden iframe.
//!
//! A [Master] embeds a page from another origin that runs a [Worker].
//! The two talk over `postMessage`: the master sends each request with a unique id,
//! the worker performs it with its own origin's privileges and sends back the result under the same id.
//!
//! ```text
//! Master::request ─▶ Correlator ─▶ Gate ─▶ Channel ══ postMessage ══▶ Channel ─▶ Worker ─▶ Fetch
//!        ▲                                                                              │
//!        └──────────── Correlator::resolve ◀── Channel ◀══ postMessage ══ Channel ◀─────┘
//! ```
//!
//! Frames are plain strings, wrapped in control characters and tagged with a namespace and channel name,
//! so the protocol coexists with anything else using the same message bus.
//! Each side only accepts frames from the window it registered: the master from its iframe, at the expected origin,
//! and the worker from its parent. There is no other security.
//! Delivery isn't guaranteed either, and a request that is never answered stays pending.
//!
//! The [web] module binds everything to the browser, and exports `CORSMaster` and `CORSWorker` to JavaScript.
mod channel;
mod config;
mod correlator;
mod envelope;
mod error;
mod fetch;
mod frame;
mod gate;
mod master;
mod origin;
mod param;
mod transport;
mod worker;

#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod web;

#[cfg(test)]
mod test_util;

pub use channel::*;
pub use config::*;
pub use correlator::*;
pub use envelope::*;
pub use error::*;
pub use fetch::{normalize_method, Fetch, HttpRequest, HttpResponse};
pub use frame::*;
pub use gate::*;
pub use master::*;
pub use origin::{origin, resolve};
pub use param::param;
pub use transport::*;
pub use worker::*;
