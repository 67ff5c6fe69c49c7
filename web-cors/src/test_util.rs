use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use crate::{Error, Fetch, HttpRequest, HttpResponse, Result};

/// Run a future on a single-threaded runtime that allows `spawn_local`.
pub(crate) fn run<F: Future>(f: F) -> F::Output {
	let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
	let local = tokio::task::LocalSet::new();
	local.block_on(&rt, f)
}

/// Answers every request with the same outcome and remembers what was asked.
#[derive(Clone)]
pub(crate) struct FakeFetch {
	outcome: std::result::Result<String, String>,
	pub requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl FakeFetch {
	pub fn ok<T: Into<String>>(body: T) -> Self {
		Self {
			outcome: Ok(body.into()),
			requests: Default::default(),
		}
	}

	pub fn err<T: Into<String>>(reason: T) -> Self {
		Self {
			outcome: Err(reason.into()),
			requests: Default::default(),
		}
	}
}

impl Fetch for FakeFetch {
	fn fetch(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> {
		self.requests.borrow_mut().push(request);
		let outcome = self.outcome.clone();

		async move {
			outcome
				.map(|body| HttpResponse { status: 200, body })
				.map_err(Error::Fetch)
		}
	}
}
