use std::{
	fmt::{self, Debug, Formatter},
	mem,
	sync::Arc,
};

use futures_channel::mpsc;
use tracing::trace;
use xylem::runtime::{defer_draining, Eager, SerialRuntimeRef};

use crate::{announcer::Announcer, Changes, Owner, ScopedRwLock, Subscription, WillChange};

#[cfg(feature = "global_serial_runtime")]
use xylem::runtime::GlobalSerialRuntime;

/// Type inference helper alias for [`GuardedCellSR`] (using [`GlobalSerialRuntime`]).
#[cfg(feature = "global_serial_runtime")]
pub type GuardedCell<T> = GuardedCellSR<T, GlobalSerialRuntime>;

/// A lock-guarded value with its own ordered change stream.
///
/// Reads take a shared lock and never wait for the runtime.
/// Writes are funnelled through the runtime `SR`, where each one runs as a single job:
///
/// 1. the owner's [`WillChange`] is signalled,
/// 2. the exclusive lock is acquired,
/// 3. the new value is stored,
/// 4. the lock is released,
/// 5. the new value is announced to this cell's subscribers.
///
/// Jobs never interleave, so these steps never interleave between writes either.
/// The lock is never held while any listener runs.
///
/// The cell doesn't know its owner. Writers pass it along with each write instead.
pub struct GuardedCellSR<T, SR: SerialRuntimeRef> {
	shared: Arc<Shared<T>>,
	runtime: SR,
}

struct Shared<T> {
	value: ScopedRwLock<T>,
	changes: Announcer<T>,
}

impl<T: Debug, SR: SerialRuntimeRef + Debug> Debug for GuardedCellSR<T, SR> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("GuardedCell")
			.field("value", &self.shared.value)
			.field("changes", &self.shared.changes)
			.field("runtime", &self.runtime)
			.finish()
	}
}

impl<T: Default, SR: SerialRuntimeRef + Default> Default for GuardedCellSR<T, SR> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: Clone> Shared<T> {
	/// Runs the five write steps. Must be called from inside the runtime's ordered context.
	fn apply<U>(&self, will_change: &WillChange, update: impl FnOnce(&mut T) -> U) -> U {
		will_change.signal();
		let (u, new_value) = self.value.with_write(|value| {
			let u = update(value);
			(u, value.clone())
		});
		self.changes.announce(&new_value);
		u
	}
}

impl<T, SR: SerialRuntimeRef> GuardedCellSR<T, SR> {
	/// Creates a new cell on `SR::default()`.
	pub fn new(initial_value: T) -> Self
	where
		SR: Default,
	{
		Self::with_runtime(initial_value, SR::default())
	}

	/// Creates a new cell whose writes go through `runtime`.
	pub fn with_runtime(initial_value: T, runtime: SR) -> Self {
		Self {
			shared: Arc::new(Shared {
				value: ScopedRwLock::new(initial_value),
				changes: Announcer::new(),
			}),
			runtime,
		}
	}

	/// The runtime writes to this cell are funnelled through.
	pub fn runtime(&self) -> &SR {
		&self.runtime
	}

	/// Clones the current value out of the cell.
	///
	/// Blocks only while a write is storing its value. Returns either the value before or after
	/// any concurrent write, never a mixture.
	///
	/// This doesn't wait for queued writes. Observe the change stream to see a write's effect.
	pub fn read(&self) -> T
	where
		T: Clone,
	{
		self.shared.value.with_read(T::clone)
	}

	/// Runs `body` with shared access to the current value.
	///
	/// Non-blocking writes (to any cell) issued from inside `body` are only queued while the lock is held.
	/// They run once the outermost `read_with` on this thread returns, see [`defer_draining`].
	///
	/// Blocking writes to this cell from inside `body` deadlock, as they wait for the exclusive lock.
	/// The same goes for blocking sections of the runtime while any of its queued writes target this cell.
	pub fn read_with<R>(&self, body: impl FnOnce(&T) -> R) -> R {
		defer_draining(|| self.shared.value.with_read(body))
	}

	/// Replaces the value, signalling `owner` first and announcing the new value afterwards.
	///
	/// Callable from any thread. Doesn't wait for other writers: If the runtime is busy on another thread,
	/// the write is left for that thread and this method returns before the value changes.
	///
	/// If the runtime is idle, the calling thread runs the queue before returning. This includes writes
	/// other threads left behind and all of their listeners, so this call is as slow as those.
	/// Inside [`.read_with(…)`](`GuardedCellSR::read_with`) the write is only queued.
	pub fn write(&self, owner: &(impl ?Sized + Owner), new_value: T)
	where
		T: 'static + Send + Sync + Clone,
	{
		self.update(owner, move |value| *value = new_value);
	}

	/// Like [`.write(…)`](`GuardedCellSR::write`), but modifies the value in place.
	///
	/// Every update is announced, whether or not it made a difference.
	pub fn update(&self, owner: &(impl ?Sized + Owner), update: impl 'static + Send + FnOnce(&mut T))
	where
		T: 'static + Send + Sync + Clone,
	{
		let will_change = owner.will_change().clone();
		let shared = Arc::clone(&self.shared);
		trace!("queueing write");
		self.runtime
			.enqueue(move || shared.apply(&will_change, update));
	}

	/// Like [`.write(…)`](`GuardedCellSR::write`), but returns a [`Future`](`core::future::Future`)
	/// of the previous value that resolves once the new value has been announced.
	///
	/// Dropping the future doesn't cancel the write.
	pub fn write_eager(&self, owner: &(impl ?Sized + Owner), new_value: T) -> Eager<T>
	where
		T: 'static + Send + Sync + Clone,
	{
		self.update_eager(owner, move |value| mem::replace(value, new_value))
	}

	/// Like [`.update(…)`](`GuardedCellSR::update`), but returns a [`Future`](`core::future::Future`)
	/// of `update`'s result that resolves once the new value has been announced.
	///
	/// Dropping the future doesn't cancel the update.
	pub fn update_eager<U: 'static + Send>(
		&self,
		owner: &(impl ?Sized + Owner),
		update: impl 'static + Send + FnOnce(&mut T) -> U,
	) -> Eager<U>
	where
		T: 'static + Send + Sync + Clone,
	{
		let will_change = owner.will_change().clone();
		let shared = Arc::clone(&self.shared);
		self.runtime
			.enqueue_eager(move || shared.apply(&will_change, update))
	}

	/// Like [`.write(…)`](`GuardedCellSR::write`), but waits until the new value has been announced.
	///
	/// **Returns** the previous value.
	///
	/// # Panics
	///
	/// Iff called from inside a job of the same runtime, including from listeners of this cell.
	#[track_caller]
	pub fn write_blocking(&self, owner: &(impl ?Sized + Owner), new_value: T) -> T
	where
		T: Clone,
	{
		self.update_blocking(owner, |value| mem::replace(value, new_value))
	}

	/// Like [`.update(…)`](`GuardedCellSR::update`), but waits until the new value has been announced.
	///
	/// # Panics
	///
	/// Iff called from inside a job of the same runtime, including from listeners of this cell.
	#[track_caller]
	pub fn update_blocking<U>(
		&self,
		owner: &(impl ?Sized + Owner),
		update: impl FnOnce(&mut T) -> U,
	) -> U
	where
		T: Clone,
	{
		self.runtime
			.run_blocking(|| self.shared.apply(owner.will_change(), update))
	}

	/// Registers `listener` for every value written after this call.
	///
	/// Listeners run in the runtime's ordered context, without the value lock held.
	pub fn subscribe(&self, listener: impl 'static + Send + Sync + Fn(&T)) -> Subscription
	where
		T: 'static,
	{
		self.shared.changes.subscribe(listener)
	}

	/// Like [`.subscribe(listener)`](`GuardedCellSR::subscribe`), but `listener` first receives the current value.
	///
	/// The seed is delivered from the ordered context, so it's the value after all writes queued so far,
	/// and no announcement is seen twice or out of order.
	pub fn subscribe_seeded(
		&self,
		listener: impl 'static + Send + Sync + Fn(&T),
	) -> Subscription
	where
		T: 'static + Send + Sync + Clone,
	{
		let (subscription, paused) = self.shared.changes.subscribe_paused(listener);
		let shared = Arc::clone(&self.shared);
		self.runtime.enqueue(move || {
			let seed = shared.value.with_read(T::clone);
			paused.resume_with(&seed);
		});
		subscription
	}

	/// A [`Stream`](`futures_lite::Stream`) of every value written after this call.
	pub fn stream(&self) -> Changes<T>
	where
		T: 'static + Send + Clone,
	{
		let (sender, receiver) = mpsc::unbounded();
		let subscription = self.subscribe(move |value| {
			// Only fails once the stream is gone, which cancels this listener anyway.
			let _ = sender.unbounded_send(value.clone());
		});
		Changes::new(receiver, subscription)
	}

	/// Like [`.stream()`](`GuardedCellSR::stream`), but starts with the current value.
	pub fn stream_seeded(&self) -> Changes<T>
	where
		T: 'static + Send + Sync + Clone,
	{
		let (sender, receiver) = mpsc::unbounded();
		let subscription = self.subscribe_seeded(move |value| {
			let _ = sender.unbounded_send(value.clone());
		});
		Changes::new(receiver, subscription)
	}

	/// The number of live subscriptions to this cell's change stream.
	pub fn subscriber_count(&self) -> usize {
		self.shared.changes.listener_count()
	}
}

#[cfg(feature = "serde")]
mod serde_impls {
	use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};
	use xylem::runtime::SerialRuntimeRef;

	use super::GuardedCellSR;

	/// Serialises as `{ "value": … }`, read under the shared lock.
	impl<T: Serialize, SR: SerialRuntimeRef> Serialize for GuardedCellSR<T, SR> {
		fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
			self.read_with(|value| {
				let mut state = serializer.serialize_struct("GuardedCell", 1)?;
				state.serialize_field("value", value)?;
				state.end()
			})
		}
	}

	impl<'de, T: Deserialize<'de>, SR: SerialRuntimeRef + Default> Deserialize<'de>
		for GuardedCellSR<T, SR>
	{
		fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
			#[derive(Deserialize)]
			#[serde(rename = "GuardedCell")]
			struct Repr<T> {
				value: T,
			}

			Repr::deserialize(deserializer).map(|Repr { value }| Self::new(value))
		}
	}
}
