use std::fmt::{self, Debug, Formatter};

use crate::{
	announcer::{Announcer, WeakAnnouncer},
	Subscription,
};

/// An aggregate "something in this object is about to change" channel.
///
/// Clones refer to the same channel, so this can be moved into deferred jobs
/// without borrowing the object that exposes it.
#[derive(Clone, Default)]
pub struct WillChange(Announcer<()>);

/// A non-owning reference to a [`WillChange`] channel.
///
/// Holding this doesn't keep the owning object's channel alive,
/// which is what lets nested objects point back at their enclosing object without a cycle.
#[derive(Clone, Default)]
pub struct WeakWillChange(WeakAnnouncer<()>);

impl Debug for WillChange {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WillChange")
			.field("listener_count", &self.listener_count())
			.finish()
	}
}

impl Debug for WeakWillChange {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WeakWillChange").field(&self.0).finish()
	}
}

impl WillChange {
	/// Creates a new channel without listeners.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Notifies all listeners that the owning object is about to change.
	pub fn signal(&self) {
		self.0.announce(&());
	}

	/// Registers `listener` for all future signals.
	pub fn subscribe(&self, listener: impl 'static + Send + Sync + Fn()) -> Subscription {
		self.0.subscribe(move |()| listener())
	}

	/// The number of registered listeners, including forwarding links.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0.listener_count()
	}

	/// Creates a non-owning reference to this channel.
	#[must_use]
	pub fn downgrade(&self) -> WeakWillChange {
		WeakWillChange(self.0.downgrade())
	}
}

impl WeakWillChange {
	/// Recovers the channel, iff it still exists.
	#[must_use]
	pub fn upgrade(&self) -> Option<WillChange> {
		self.0.upgrade().map(WillChange)
	}

	/// Signals the channel iff it still exists.
	///
	/// **Returns** whether it did.
	#[allow(clippy::must_use_candidate)]
	pub fn signal(&self) -> bool {
		self.upgrade().map(|will_change| will_change.signal()).is_some()
	}
}
