use std::{
	cell::Cell,
	collections::VecDeque,
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::{const_mutex, const_reentrant_mutex, Mutex, ReentrantMutex};
use scopeguard::{guard, ScopeGuard};
use tracing::{debug, trace, warn};
use unwind_safe::try_eval;

use crate::SerialError;

pub(crate) type Run = Box<dyn 'static + Send + FnOnce()>;

struct Job {
	id: u64,
	run: Run,
}

pub(crate) struct ASerialRuntime {
	job_counter: AtomicU64,
	queue: Mutex<VecDeque<Job>>,
	/// Held by whichever thread currently drains `queue`.
	/// The flag is set while a job or blocking section runs on that thread.
	drain_mutex: ReentrantMutex<Cell<bool>>,
}

impl Debug for ASerialRuntime {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ASerialRuntime")
			.field("job_counter", &self.job_counter)
			.field("pending", &self.queue.try_lock().map(|queue| queue.len()))
			.finish_non_exhaustive()
	}
}

impl Default for ASerialRuntime {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for ASerialRuntime {
	fn drop(&mut self) {
		let pending = self.queue.get_mut().len();
		if pending > 0 {
			debug!(pending, "dropping serial runtime with queued jobs");
		}
	}
}

impl ASerialRuntime {
	pub(crate) const fn new() -> Self {
		Self {
			job_counter: AtomicU64::new(0),
			queue: const_mutex(VecDeque::new()),
			drain_mutex: const_reentrant_mutex(Cell::new(false)),
		}
	}

	pub(crate) fn pending(&self) -> usize {
		self.queue.lock().len()
	}

	/// Queues `run` without draining. Follow up with [`drain_or_defer`](`ASerialRuntime::drain_or_defer`).
	pub(crate) fn push(&self, run: Run) {
		let id = self.job_counter.fetch_add(1, Ordering::Relaxed);
		self.queue.lock().push_back(Job { id, run });
		trace!(job = id, "enqueued");
	}

	pub(crate) fn try_run_blocking<T>(&self, f: impl FnOnce() -> T) -> Result<T, SerialError> {
		let drain = self.drain_mutex.lock();
		if drain.get() {
			return Err(SerialError::Reentrant);
		}
		debug!("entering blocking section");

		// Earlier submissions go first.
		self.drain_with(&drain);

		drain.set(true);
		let t = try_eval(f).finally(|()| drain.set(false));

		self.drain_with(&drain);
		drop(drain);

		// Other threads may have deferred to this one while it held the drain mutex.
		self.drain_or_defer();
		Ok(t)
	}

	pub(crate) fn is_serializing(&self) -> bool {
		self.drain_mutex
			.try_lock()
			.is_some_and(|drain| drain.get())
	}

	fn pop(&self) -> Option<Job> {
		self.queue.lock().pop_front()
	}

	pub(crate) fn drain_or_defer(&self) {
		loop {
			let Some(drain) = self.drain_mutex.try_lock() else {
				// Another thread is draining and will pick the queue up.
				return;
			};
			if drain.get() {
				// Nested in a job. The outer drain loop continues with the queue.
				return;
			}
			self.drain_with(&drain);
			drop(drain);

			// Jobs pushed between the last pop and the unlock would be stranded otherwise.
			if self.queue.lock().is_empty() {
				return;
			}
		}
	}

	fn drain_with(&self, flag: &Cell<bool>) {
		debug_assert!(!flag.get());
		flag.set(true);
		try_eval(|| {
			let mut count = 0_usize;
			while let Some(Job { id, run }) = self.pop() {
				let panic_guard = guard(id, |id| {
					warn!(job = id, "job panicked, later jobs stay queued");
				});
				trace!(job = id, "running");
				run();
				let _ = ScopeGuard::into_inner(panic_guard);
				count += 1;
			}
			if count > 0 {
				trace!(count, "drained");
			}
		})
		.finally(|()| flag.set(false));
	}
}
