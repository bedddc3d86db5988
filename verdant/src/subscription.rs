use std::fmt::{self, Debug, Formatter};

use tracing::trace;

/// The revocable end of a listener registration.
pub(crate) trait Revoke: Send + Sync {
	/// **Returns** whether this call revoked the link, as opposed to it having been revoked before.
	fn revoke(&self) -> bool;

	fn is_active(&self) -> bool;
}

/// An opaque handle to a listener registration.
///
/// Cancelling is idempotent and doesn't affect other listeners.
/// To tie the registration to another object's lifetime instead of this handle's,
/// use [`RetainTable`](`crate::RetainTable`).
#[must_use = "Subscriptions are cancelled when dropped."]
pub struct Subscription(Box<dyn Revoke>);

impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish_non_exhaustive()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl Subscription {
	pub(crate) fn new(link: impl 'static + Revoke) -> Self {
		Self(Box::new(link))
	}

	/// Removes the listener. Calling this again (or dropping the handle afterwards) has no effect.
	///
	/// A notification that is already being delivered on another thread may still reach the listener.
	pub fn cancel(&self) {
		if self.0.revoke() {
			trace!("subscription cancelled");
		}
	}

	/// Whether the listener is still registered.
	///
	/// This is also `false` once the notification source is gone.
	#[must_use]
	pub fn is_active(&self) -> bool {
		self.0.is_active()
	}
}
