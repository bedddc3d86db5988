#![warn(clippy::pedantic)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Reads only ever take a shared lock. Writes, seeding and all change-stream listeners run inside the
//! guarded cell's [`SerialRuntimeRef`] ordered context, which may be on any thread that used it.

mod announcer;
pub use announcer::{Announcer, WeakAnnouncer};

mod changes;
pub use changes::Changes;

mod forwarder;
pub use forwarder::ChangeForwarder;

mod guarded_cell;
#[cfg(feature = "global_serial_runtime")]
pub use guarded_cell::GuardedCell;
pub use guarded_cell::GuardedCellSR;

mod lock;
pub use lock::ScopedRwLock;

mod owner;
pub use owner::Owner;

mod retain;
pub use retain::RetainTable;

mod subscription;
pub use subscription::Subscription;

mod will_change;
pub use will_change::{WeakWillChange, WillChange};

#[cfg(feature = "global_serial_runtime")]
pub use xylem::runtime::GlobalSerialRuntime;
pub use xylem::{
	runtime::{defer_draining, Eager, SerialRuntime, SerialRuntimeRef},
	SerialError,
};

/// Clones the listed bindings into same-named shadowing bindings.
///
/// Useful before `move` closures:
///
/// ```
/// use std::sync::Arc;
/// use verdant::shadow_clone;
///
/// let a = Arc::new(1);
/// let f = {
/// 	shadow_clone!(a);
/// 	move || *a + 1
/// };
/// assert_eq!(f(), *a + 1);
/// ```
#[macro_export]
macro_rules! shadow_clone {
	($($ident:ident),*$(,)?) => {
		$(let $ident = ::core::clone::Clone::clone(&$ident);)*
	};
}

#[doc = include_str!("../README.md")]
mod readme {}
