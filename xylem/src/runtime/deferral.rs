use std::cell::RefCell;

use tracing::trace;
use unwind_safe::try_eval;

type Drain = Box<dyn FnOnce()>;

thread_local! {
	/// Drains held back on this thread, or [`None`] outside of [`defer_draining`].
	static HELD_DRAINS: RefCell<Option<Vec<Drain>>> = const { RefCell::new(None) };
}

/// Runs `f` such that jobs it submits on this thread are only queued, not run inline.
///
/// Once the outermost `defer_draining` on this thread returns, the runtimes that received jobs in
/// the meantime are drained (unless another thread is already doing so, or this is nested in a job).
///
/// Use this around code that holds a lock which jobs may need, like a shared read lock on a value
/// that queued writes will lock exclusively. Submitting from there would otherwise deadlock whenever
/// the calling thread ends up running the queue itself.
///
/// If `f` panics, the held-back jobs stay queued until the next submission to or blocking section of
/// their runtime.
pub fn defer_draining<R>(f: impl FnOnce() -> R) -> R {
	let outermost = HELD_DRAINS.with(|held| {
		let mut held = held.borrow_mut();
		if held.is_some() {
			return false;
		}
		*held = Some(Vec::new());
		true
	});
	if !outermost {
		return f();
	}

	// Cleared on unwind too, which drops the drains but leaves their jobs queued.
	let mut drains = Vec::new();
	let r = try_eval(f).finally(|()| {
		drains = HELD_DRAINS
			.with(|held| held.borrow_mut().take())
			.unwrap_or_default();
	});

	if !drains.is_empty() {
		trace!(count = drains.len(), "running held-back drains");
	}
	for drain in drains {
		drain();
	}
	r
}

/// Registers `drain` to run once the current [`defer_draining`] scope ends.
///
/// **Returns** `drain` back iff this thread isn't inside [`defer_draining`], in which case the
/// caller should drain right away.
pub(crate) fn hold_drain<D: 'static + FnOnce()>(drain: D) -> Option<D> {
	HELD_DRAINS.with(|held| match held.borrow_mut().as_mut() {
		Some(drains) => {
			drains.push(Box::new(drain));
			None
		}
		None => Some(drain),
	})
}
