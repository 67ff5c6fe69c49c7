use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// What a pending request is eventually resolved with: the body, or a failure description.
pub type Outcome = std::result::Result<String, String>;

type Continuation = Box<dyn FnOnce(Outcome)>;

/// Matches responses to the requests that caused them.
///
/// Ids are `UID-<n>` from a per-instance counter; they only need to be unique, not unguessable.
/// There is no timeout: an unanswered request stays pending until the correlator is dropped.
#[derive(Default)]
pub struct Correlator {
	next: Cell<u64>,
	pending: RefCell<HashMap<String, Continuation>>,
}

impl Correlator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `continuation` under a fresh id and return the id.
	pub fn allocate<C: FnOnce(Outcome) + 'static>(&self, continuation: C) -> String {
		let id = self.next.get();
		self.next.set(id + 1);

		let uid = format!("UID-{id}");
		self.pending.borrow_mut().insert(uid.clone(), Box::new(continuation));
		uid
	}

	/// Remove and run the continuation for `uid`. Returns false if nothing was pending.
	pub fn resolve(&self, uid: &str, valid: bool, data: String) -> bool {
		// Release the borrow first; the continuation may allocate again.
		let Some(continuation) = self.pending.borrow_mut().remove(uid) else {
			tracing::trace!(%uid, "no pending request");
			return false;
		};

		continuation(match valid {
			true => Ok(data),
			false => Err(data),
		});

		true
	}

	pub fn is_pending(&self, uid: &str) -> bool {
		self.pending.borrow().contains_key(uid)
	}

	pub fn len(&self) -> usize {
		self.pending.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod test {
	use std::rc::Rc;

	use super::*;

	#[test]
	fn sequential_ids() {
		let correlator = Correlator::new();
		assert_eq!(correlator.allocate(|_| {}), "UID-0");
		assert_eq!(correlator.allocate(|_| {}), "UID-1");
		assert_eq!(correlator.len(), 2);
	}

	#[test]
	fn resolves_once() {
		let correlator = Correlator::new();
		let calls = Rc::new(RefCell::new(Vec::new()));

		let sink = calls.clone();
		let uid = correlator.allocate(move |outcome| sink.borrow_mut().push(outcome));

		assert!(correlator.resolve(&uid, true, "body".into()));
		assert!(!correlator.resolve(&uid, false, "again".into()));
		assert!(!correlator.is_pending(&uid));
		assert_eq!(*calls.borrow(), vec![Ok("body".to_string())]);
	}

	#[test]
	fn failure_outcome() {
		let correlator = Correlator::new();
		let calls = Rc::new(RefCell::new(Vec::new()));

		let sink = calls.clone();
		let uid = correlator.allocate(move |outcome| sink.borrow_mut().push(outcome));
		correlator.resolve(&uid, false, "network error".into());

		assert_eq!(*calls.borrow(), vec![Err("network error".to_string())]);
		assert!(correlator.is_empty());
	}

	#[test]
	fn unknown_id() {
		let correlator = Correlator::new();
		correlator.allocate(|_| panic!("resolved the wrong request"));
		assert!(!correlator.resolve("UID-7", true, String::new()));
		assert_eq!(correlator.len(), 1);
	}

	#[test]
	fn ids_not_reused() {
		let correlator = Correlator::new();
		let first = correlator.allocate(|_| {});
		correlator.resolve(&first, true, String::new());
		assert_ne!(correlator.allocate(|_| {}), first);
	}

	#[test]
	fn reentrant_allocate() {
		let correlator = Rc::new(Correlator::new());

		let inner = correlator.clone();
		let uid = correlator.allocate(move |_| {
			inner.allocate(|_| {});
		});

		assert!(correlator.resolve(&uid, true, String::new()));
		assert_eq!(correlator.len(), 1);
	}
}
