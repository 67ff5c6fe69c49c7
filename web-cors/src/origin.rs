use url::Url;

use crate::Result;

/// Resolve `url` against the current document, filling in a missing scheme, host or port.
pub fn resolve(base: &Url, url: &str) -> Result<Url> {
	Ok(base.join(url)?)
}

/// Serialize as `scheme://host[:port]`, without the scheme's default port.
pub fn origin(url: &Url) -> String {
	url.origin().ascii_serialization()
}
