use std::fmt::{self, Debug, Formatter};

use parking_lot::RwLock;

/// A reader/writer lock that is only ever held for the duration of a closure.
///
/// Guards never escape, so the lock is released on every exit path, including unwinding.
/// Backed by [`parking_lot::RwLock`], which is eventually fair: Queued writers aren't starved by a stream of readers.
#[derive(Default)]
pub struct ScopedRwLock<T: ?Sized>(RwLock<T>);

impl<T: ?Sized + Debug> Debug for ScopedRwLock<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let maybe_guard = self.0.try_read();
		f.debug_tuple("ScopedRwLock")
			.field(
				maybe_guard
					.as_ref()
					.map_or_else(|| &"(locked)" as &dyn Debug, |guard| guard as &dyn Debug),
			)
			.finish()
	}
}

impl<T> ScopedRwLock<T> {
	/// Creates a new unlocked instance.
	pub const fn new(value: T) -> Self {
		Self(parking_lot::const_rwlock(value))
	}

	/// Consumes the lock, returning the value.
	pub fn into_inner(self) -> T {
		self.0.into_inner()
	}
}

impl<T: ?Sized> ScopedRwLock<T> {
	/// Runs `body` with shared access. Blocks while a writer holds the lock.
	pub fn with_read<R>(&self, body: impl FnOnce(&T) -> R) -> R {
		body(&self.0.read())
	}

	/// Runs `body` with exclusive access. Blocks while any reader or writer holds the lock.
	pub fn with_write<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
		body(&mut self.0.write())
	}

	/// Statically exclusive access. Doesn't lock.
	pub fn get_mut(&mut self) -> &mut T {
		self.0.get_mut()
	}
}
