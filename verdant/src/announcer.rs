use std::{
	collections::BTreeMap,
	fmt::{self, Debug, Formatter},
	sync::{
		atomic::{AtomicU64, AtomicU8, Ordering},
		Arc, Weak,
	},
};

use parking_lot::Mutex;

use crate::subscription::{Revoke, Subscription};

const PAUSED: u8 = 0;
const ACTIVE: u8 = 1;
const REVOKED: u8 = 2;

/// An ordered, multi-listener notification channel.
///
/// Listeners are called in subscription order, on the thread that announces,
/// with the listener table unlocked. Nothing is replayed to late subscribers.
///
/// Clones share the same listener table.
pub struct Announcer<T: ?Sized> {
	inner: Arc<AnnouncerInner<T>>,
}

/// A non-owning reference to an [`Announcer`]'s listener table.
pub struct WeakAnnouncer<T: ?Sized> {
	inner: Weak<AnnouncerInner<T>>,
}

struct AnnouncerInner<T: ?Sized> {
	next_id: AtomicU64,
	listeners: Mutex<BTreeMap<u64, Arc<Listener<T>>>>,
}

struct Listener<T: ?Sized> {
	state: AtomicU8,
	f: Box<dyn 'static + Send + Sync + Fn(&T)>,
}

/// Holds only a [`Weak`] to the listener, so that dropping the announcer releases listener resources.
struct ListenerLink<T: ?Sized> {
	announcer: Weak<AnnouncerInner<T>>,
	id: u64,
	listener: Weak<Listener<T>>,
}

/// A listener that was registered, but won't receive announcements until resumed.
pub(crate) struct Paused<T: ?Sized>(Arc<Listener<T>>);

impl<T: ?Sized> Clone for Announcer<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: ?Sized> Default for Announcer<T> {
	fn default() -> Self {
		Self {
			inner: Arc::new(AnnouncerInner {
				next_id: AtomicU64::new(0),
				listeners: Mutex::new(BTreeMap::new()),
			}),
		}
	}
}

impl<T: ?Sized> Debug for Announcer<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Announcer")
			.field("listener_count", &self.listener_count())
			.finish()
	}
}

impl<T: ?Sized> Clone for WeakAnnouncer<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl<T: ?Sized> Default for WeakAnnouncer<T> {
	fn default() -> Self {
		Self { inner: Weak::new() }
	}
}

impl<T: ?Sized> Debug for WeakAnnouncer<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakAnnouncer")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}

impl<T: ?Sized> Announcer<T> {
	/// Creates a new [`Announcer`] without listeners.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls each active listener with `value`.
	///
	/// Listeners that are cancelled while this runs are skipped, unless they were already called.
	pub fn announce(&self, value: &T) {
		let listeners: Vec<_> = self.inner.listeners.lock().values().cloned().collect();
		for listener in listeners {
			if listener.state.load(Ordering::Acquire) == ACTIVE {
				(listener.f)(value);
			}
		}
	}

	/// Registers `listener` for all future announcements.
	pub fn subscribe(&self, listener: impl 'static + Send + Sync + Fn(&T)) -> Subscription
	where
		T: 'static,
	{
		self.register(Box::new(listener), ACTIVE).0
	}

	/// Registers `listener` without activating it.
	///
	/// The [`Paused`] must be resumed from the same ordered context that announces,
	/// otherwise the seed may race announcements.
	pub(crate) fn subscribe_paused(
		&self,
		listener: impl 'static + Send + Sync + Fn(&T),
	) -> (Subscription, Paused<T>)
	where
		T: 'static,
	{
		let (subscription, listener) = self.register(Box::new(listener), PAUSED);
		(subscription, Paused(listener))
	}

	/// The number of registered listeners, including paused ones.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.inner.listeners.lock().len()
	}

	/// Creates a non-owning reference to this [`Announcer`].
	#[must_use]
	pub fn downgrade(&self) -> WeakAnnouncer<T> {
		WeakAnnouncer {
			inner: Arc::downgrade(&self.inner),
		}
	}

	fn register(
		&self,
		f: Box<dyn 'static + Send + Sync + Fn(&T)>,
		state: u8,
	) -> (Subscription, Arc<Listener<T>>)
	where
		T: 'static,
	{
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		let listener = Arc::new(Listener {
			state: AtomicU8::new(state),
			f,
		});
		self.inner
			.listeners
			.lock()
			.insert(id, Arc::clone(&listener));
		let link = ListenerLink {
			announcer: Arc::downgrade(&self.inner),
			id,
			listener: Arc::downgrade(&listener),
		};
		(Subscription::new(link), listener)
	}
}

impl<T: ?Sized> WeakAnnouncer<T> {
	/// Recovers the [`Announcer`], iff it still exists.
	#[must_use]
	pub fn upgrade(&self) -> Option<Announcer<T>> {
		self.inner.upgrade().map(|inner| Announcer { inner })
	}
}

impl<T: ?Sized> Paused<T> {
	/// Delivers `seed` to the listener and activates it.
	///
	/// Does nothing if the listener was cancelled in the meantime.
	pub(crate) fn resume_with(self, seed: &T) {
		if self
			.0
			.state
			.compare_exchange(PAUSED, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
		{
			(self.0.f)(seed);
		}
	}
}

impl<T: ?Sized> Revoke for ListenerLink<T> {
	fn revoke(&self) -> bool {
		let Some(listener) = self.listener.upgrade() else {
			return false;
		};
		if listener.state.swap(REVOKED, Ordering::AcqRel) == REVOKED {
			return false;
		}
		if let Some(announcer) = self.announcer.upgrade() {
			announcer.listeners.lock().remove(&self.id);
		}
		true
	}

	fn is_active(&self) -> bool {
		self.listener
			.upgrade()
			.is_some_and(|listener| listener.state.load(Ordering::Acquire) != REVOKED)
	}
}
