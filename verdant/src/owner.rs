use std::{rc::Rc, sync::Arc};

use crate::WillChange;

/// An object that exposes an aggregate [`WillChange`] channel.
///
/// Guarded cells signal their owner's channel before each change,
/// and [`ChangeForwarder`](`crate::ChangeForwarder`) relays a nested owner's channel into its enclosing one.
///
/// # Logic
///
/// [`.will_change()`](`Owner::will_change`) **should** return the same channel each time.
///
/// # Example
///
/// ```
/// use verdant::{Owner, WillChange};
///
/// struct Document {
/// 	will_change: WillChange,
/// }
///
/// impl Owner for Document {
/// 	fn will_change(&self) -> &WillChange {
/// 		&self.will_change
/// 	}
/// }
/// ```
pub trait Owner {
	/// The channel signalled before anything in this object changes.
	fn will_change(&self) -> &WillChange;
}

/// A bare channel is its own owner.
impl Owner for WillChange {
	fn will_change(&self) -> &WillChange {
		self
	}
}

impl<O: ?Sized + Owner> Owner for &O {
	fn will_change(&self) -> &WillChange {
		(**self).will_change()
	}
}

impl<O: ?Sized + Owner> Owner for Box<O> {
	fn will_change(&self) -> &WillChange {
		(**self).will_change()
	}
}

impl<O: ?Sized + Owner> Owner for Rc<O> {
	fn will_change(&self) -> &WillChange {
		(**self).will_change()
	}
}

impl<O: ?Sized + Owner> Owner for Arc<O> {
	fn will_change(&self) -> &WillChange {
		(**self).will_change()
	}
}
