//! The [`SerialRuntimeRef`] trait, a reference-counted [`SerialRuntime`] and the static [`GlobalSerialRuntime`].

use std::{
	fmt::{self, Debug, Formatter},
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use futures_channel::oneshot::{self, Canceled};

use crate::SerialError;

mod a_serial_runtime;
use a_serial_runtime::ASerialRuntime;

mod deferral;
use deferral::hold_drain;
pub use deferral::defer_draining;

/// Trait for handles that let components refer to a specific ordered execution context (instance).
///
/// [`SerialRuntime`] and [`GlobalSerialRuntime`] provide usable defaults.
///
/// # Logic
///
/// Jobs submitted to the same runtime **must not** run in parallel or nested.
/// Jobs submitted to the same runtime **must** run in submission order, each to completion
/// before the next one starts.
///
/// A job that is submitted from inside another job of the same runtime runs after that job.
///
/// Inside [`defer_draining`], submitting **must not** run jobs on the calling thread.
/// They may run once the outermost [`defer_draining`] returns.
pub trait SerialRuntimeRef: Send + Sync + Clone {
	/// Submits `job` to run exclusively, after every job submitted before it.
	///
	/// This doesn't wait for other threads: If another thread is currently running jobs of
	/// this runtime, `job` is left for that thread and this method returns immediately.
	/// Otherwise the calling thread runs the queue, including `job` and any jobs other threads
	/// left behind, before returning. That makes this call as slow as those jobs.
	///
	/// Inside [`defer_draining`], `job` is only queued.
	fn enqueue(&self, job: impl 'static + Send + FnOnce());

	/// Like [`.enqueue(job)`](`SerialRuntimeRef::enqueue`), but returns a [`Future`] of the job's result.
	///
	/// Dropping the [`Eager`] does **not** cancel the job.
	fn enqueue_eager<T: 'static + Send>(
		&self,
		job: impl 'static + Send + FnOnce() -> T,
	) -> Eager<T> {
		let (sender, receiver) = oneshot::channel();
		self.enqueue(move || {
			// The receiver may be gone already. That's fine.
			let _ = sender.send(job());
		});
		Eager(receiver)
	}

	/// Runs `f` exclusively, after all jobs submitted so far.
	///
	/// Jobs that `f` submits run before this method returns.
	///
	/// # Errors
	///
	/// Iff called from inside a job (or blocking section) of the same runtime,
	/// [`SerialError::Reentrant`] is returned and `f` is dropped without running.
	fn try_run_blocking<T>(&self, f: impl FnOnce() -> T) -> Result<T, SerialError>;

	/// Runs `f` exclusively, after all jobs submitted so far.
	///
	/// # Panics
	///
	/// Iff called from inside a job (or blocking section) of the same runtime.
	#[track_caller]
	fn run_blocking<T>(&self, f: impl FnOnce() -> T) -> T {
		match self.try_run_blocking(f) {
			Ok(t) => t,
			Err(error) => panic!("{error}"),
		}
	}

	/// Whether the current thread is running a job (or blocking section) of this runtime.
	fn is_serializing(&self) -> bool;
}

/// A [`Future`] of a job's result. See [`SerialRuntimeRef::enqueue_eager`].
///
/// Resolves to [`SerialError::Dropped`] iff the job was dropped before returning,
/// which happens when the runtime is dropped with the job still queued or when the job panics.
#[must_use = "The job runs regardless, but its result is only available through this future."]
#[derive(Debug)]
pub struct Eager<T>(oneshot::Receiver<T>);

impl<T> Future for Eager<T> {
	type Output = Result<T, SerialError>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.0)
			.poll(cx)
			.map_err(|Canceled| SerialError::Dropped)
	}
}

/// A reference-counted serial runtime instance.
///
/// Clones refer to the same queue. Dropping the last clone drops queued jobs without running them.
#[derive(Clone, Default)]
pub struct SerialRuntime(Arc<ASerialRuntime>);

impl Debug for SerialRuntime {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SerialRuntime").field(&self.0).finish()
	}
}

impl PartialEq for SerialRuntime {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for SerialRuntime {}

impl SerialRuntime {
	/// Creates a new independent runtime with an empty queue.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The number of jobs currently waiting to run.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.0.pending()
	}
}

impl SerialRuntimeRef for SerialRuntime {
	fn enqueue(&self, job: impl 'static + Send + FnOnce()) {
		self.0.push(Box::new(job));
		let runtime = Arc::clone(&self.0);
		if let Some(drain) = hold_drain(move || runtime.drain_or_defer()) {
			drain();
		}
	}

	fn try_run_blocking<T>(&self, f: impl FnOnce() -> T) -> Result<T, SerialError> {
		self.0.try_run_blocking(f)
	}

	fn is_serializing(&self) -> bool {
		self.0.is_serializing()
	}
}

#[cfg(feature = "global_serial_runtime")]
static GLOBAL_SERIAL_RUNTIME: ASerialRuntime = ASerialRuntime::new();

/// A plain [`SerialRuntimeRef`] implementation that represents a static serial runtime.
///
/// # Logic
///
/// Everything using this runtime shares one queue, so writes to all components using it
/// are totally ordered. This also means unrelated components can delay each other.
#[cfg(feature = "global_serial_runtime")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalSerialRuntime;

#[cfg(feature = "global_serial_runtime")]
impl GlobalSerialRuntime {
	/// The number of jobs currently waiting to run.
	#[must_use]
	pub fn pending(self) -> usize {
		GLOBAL_SERIAL_RUNTIME.pending()
	}
}

#[cfg(feature = "global_serial_runtime")]
impl SerialRuntimeRef for GlobalSerialRuntime {
	fn enqueue(&self, job: impl 'static + Send + FnOnce()) {
		GLOBAL_SERIAL_RUNTIME.push(Box::new(job));
		if let Some(drain) = hold_drain(|| GLOBAL_SERIAL_RUNTIME.drain_or_defer()) {
			drain();
		}
	}

	fn try_run_blocking<T>(&self, f: impl FnOnce() -> T) -> Result<T, SerialError> {
		GLOBAL_SERIAL_RUNTIME.try_run_blocking(f)
	}

	fn is_serializing(&self) -> bool {
		GLOBAL_SERIAL_RUNTIME.is_serializing()
	}
}
