use std::cell::RefCell;
use std::collections::VecDeque;

type Callback = Box<dyn FnOnce()>;

enum State {
	Pending { queue: VecDeque<Callback>, flushing: bool },
	Ready,
}

/// A one-shot latch that holds callbacks until the remote side says it is alive.
pub struct Gate {
	state: RefCell<State>,
}

impl Gate {
	pub fn new() -> Self {
		Self {
			state: RefCell::new(State::Pending {
				queue: VecDeque::new(),
				flushing: false,
			}),
		}
	}

	pub fn is_ready(&self) -> bool {
		matches!(*self.state.borrow(), State::Ready)
	}

	/// Run `callback` now if ready, otherwise once [Self::signal_ready] is called.
	pub fn when_ready<C: FnOnce() + 'static>(&self, callback: C) {
		let mut state = self.state.borrow_mut();
		if let State::Pending { queue, .. } = &mut *state {
			queue.push_back(Box::new(callback));
			return;
		}

		drop(state);
		callback();
	}

	/// Flush the queue in registration order and stay ready forever.
	///
	/// Returns false if the gate was already ready (or is being flushed).
	pub fn signal_ready(&self) -> bool {
		match &mut *self.state.borrow_mut() {
			State::Pending { flushing, .. } if !*flushing => *flushing = true,
			_ => return false,
		}

		// Callbacks queued during the flush run after the ones already waiting.
		loop {
			let next = match &mut *self.state.borrow_mut() {
				State::Pending { queue, .. } => queue.pop_front(),
				State::Ready => None,
			};

			match next {
				Some(callback) => callback(),
				None => break,
			}
		}

		*self.state.borrow_mut() = State::Ready;
		true
	}
}

impl Default for Gate {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use std::rc::Rc;

	use super::*;

	#[test]
	fn queue_order() {
		let gate = Gate::new();
		let order = Rc::new(RefCell::new(Vec::new()));

		for i in 1..=3 {
			let order = order.clone();
			gate.when_ready(move || order.borrow_mut().push(i));
		}

		assert!(order.borrow().is_empty());
		assert!(!gate.is_ready());

		assert!(gate.signal_ready());
		assert_eq!(*order.borrow(), vec![1, 2, 3]);
		assert!(gate.is_ready());

		// Synchronous once ready.
		let sink = order.clone();
		gate.when_ready(move || sink.borrow_mut().push(4));
		assert_eq!(*order.borrow(), vec![1, 2, 3, 4]);
	}

	#[test]
	fn signal_is_idempotent() {
		let gate = Gate::new();
		let count = Rc::new(RefCell::new(0));

		let sink = count.clone();
		gate.when_ready(move || *sink.borrow_mut() += 1);

		assert!(gate.signal_ready());
		assert!(!gate.signal_ready());
		assert_eq!(*count.borrow(), 1);
	}

	#[test]
	fn queued_during_flush() {
		let gate = Rc::new(Gate::new());
		let order = Rc::new(RefCell::new(Vec::new()));

		let (inner, sink) = (gate.clone(), order.clone());
		gate.when_ready(move || {
			sink.borrow_mut().push("first");
			let sink = sink.clone();
			inner.when_ready(move || sink.borrow_mut().push("nested"));
		});

		let sink = order.clone();
		gate.when_ready(move || sink.borrow_mut().push("second"));

		gate.signal_ready();
		assert_eq!(*order.borrow(), vec!["first", "second", "nested"]);
	}
}
