use std::{
	any::Any,
	fmt::{self, Debug, Formatter},
	sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::trace;

use crate::Subscription;

type Retainer = Weak<dyn Any + Send + Sync>;

/// Keeps [`Subscription`]s alive for as long as some other object lives.
///
/// Entries are keyed by the retaining object's allocation and hold only a [`Weak`] to it.
/// Call [`release`](`RetainTable::release`) when tearing a retainer down, or let
/// [`prune`](`RetainTable::prune`) (which also runs on each [`retain`](`RetainTable::retain`))
/// cancel the subscriptions of retainers that are gone.
#[derive(Default)]
pub struct RetainTable {
	entries: Mutex<Vec<(Retainer, Vec<Subscription>)>>,
}

impl Debug for RetainTable {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RetainTable")
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}

fn is_same<R: ?Sized>(entry: &Retainer, retainer: &Arc<R>) -> bool {
	Weak::as_ptr(entry).cast::<()>() == Arc::as_ptr(retainer).cast::<()>()
}

impl RetainTable {
	/// Creates an empty table.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Associates `subscription` with `retainer`.
	pub fn retain<R: 'static + Send + Sync>(&self, retainer: &Arc<R>, subscription: Subscription) {
		self.prune();
		let mut entries = self.entries.lock();
		if let Some((_, subscriptions)) = entries
			.iter_mut()
			.find(|(entry, _)| is_same(entry, retainer))
		{
			subscriptions.push(subscription);
		} else {
			let weak: Retainer = Arc::downgrade(retainer) as Weak<dyn Any + Send + Sync>;
			entries.push((weak, vec![subscription]));
		}
	}

	/// Cancels and forgets all subscriptions associated with `retainer`.
	///
	/// **Returns** how many there were.
	#[allow(clippy::must_use_candidate)]
	pub fn release<R: ?Sized>(&self, retainer: &Arc<R>) -> usize {
		let released = {
			let mut entries = self.entries.lock();
			entries
				.iter()
				.position(|(entry, _)| is_same(entry, retainer))
				.map(|index| entries.swap_remove(index).1)
		};
		// Cancelled outside the lock, by dropping.
		released.map_or(0, |subscriptions| {
			trace!(count = subscriptions.len(), "releasing retained subscriptions");
			subscriptions.len()
		})
	}

	/// Cancels and forgets all subscriptions whose retainer was dropped.
	///
	/// **Returns** how many there were.
	#[allow(clippy::must_use_candidate)]
	pub fn prune(&self) -> usize {
		let dead: Vec<_> = {
			let mut entries = self.entries.lock();
			let (live, dead) = entries
				.drain(..)
				.partition(|(retainer, _)| retainer.strong_count() > 0);
			*entries = live;
			dead
		};
		let count = dead.iter().map(|(_, subscriptions)| subscriptions.len()).sum();
		if count > 0 {
			trace!(count, "pruned subscriptions of dropped retainers");
		}
		count
	}

	/// The number of subscriptions currently held, including ones whose retainer is gone but wasn't pruned yet.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries
			.lock()
			.iter()
			.map(|(_, subscriptions)| subscriptions.len())
			.sum()
	}

	/// Whether no subscriptions are held.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Subscription {
	/// Hands this subscription to `table`, to be kept alive for as long as `retainer` lives.
	pub fn retain_in<R: 'static + Send + Sync>(self, table: &RetainTable, retainer: &Arc<R>) {
		table.retain(retainer, self);
	}
}
