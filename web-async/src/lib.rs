//! Async helpers that work the same in the browser and natively.
//!
//! Browser code is single-threaded, so nothing here requires `Send`.
use std::future::Future;

/// Run a future to completion on the current thread, without waiting for it.
///
/// On wasm this hands the future to the browser's microtask queue.
/// Natively it must be called from within a [tokio::task::LocalSet].
pub fn spawn<F: Future<Output = ()> + 'static>(f: F) {
	#[cfg(feature = "tracing")]
	let f = tracing::Instrument::in_current_span(f);

	#[cfg(target_arch = "wasm32")]
	wasm_bindgen_futures::spawn_local(f);

	#[cfg(not(target_arch = "wasm32"))]
	tokio::task::spawn_local(f);
}

#[cfg(test)]
mod test {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::spawn;

	#[test]
	fn runs_in_order() {
		let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
		let local = tokio::task::LocalSet::new();

		let seen = Rc::new(RefCell::new(Vec::new()));
		let (done_tx, done_rx) = tokio::sync::oneshot::channel();

		local.block_on(&rt, async {
			for i in 0..3 {
				let seen = seen.clone();
				spawn(async move { seen.borrow_mut().push(i) });
			}

			spawn(async move {
				done_tx.send(()).ok();
			});

			done_rx.await.unwrap();
		});

		assert_eq!(*seen.borrow(), vec![0, 1, 2]);
	}
}
