//! Browser implementations of the host seams, plus the JavaScript entry points.
mod bindings;
mod fetch;
mod host;
mod transport;

pub use bindings::*;
pub use fetch::*;
pub use host::*;
pub use transport::*;
