use std::{
	fmt::{self, Debug, Formatter},
	mem,
	sync::OnceLock,
};

use tracing::debug;

use crate::{Owner, Subscription, WeakWillChange, WillChange};

/// Relays a nested [`Owner`]'s [`WillChange`] signals into an enclosing object's channel.
///
/// The forwarder only holds a [`WeakWillChange`] to the enclosing channel, so the nested object
/// (which ends up holding the relay listener) doesn't keep its enclosing object alive.
///
/// The link to the nested object is made lazily on first access, and made again eagerly whenever the
/// nested object is replaced. Replacing the nested object does **not** signal the enclosing channel by itself;
/// only changes inside the (new) nested object do. Signal the enclosing owner explicitly around a replacement
/// if observers need to know about it.
///
/// Replacing requires `&mut self`, so the link slot is only ever swapped by whoever has exclusive access to the
/// enclosing object.
///
/// ```
/// use verdant::{ChangeForwarder, Owner, WillChange};
///
/// struct Settings {
/// 	will_change: WillChange,
/// }
///
/// impl Owner for Settings {
/// 	fn will_change(&self) -> &WillChange {
/// 		&self.will_change
/// 	}
/// }
///
/// let enclosing = WillChange::new();
/// let settings = ChangeForwarder::new(Settings { will_change: WillChange::new() }, &enclosing);
///
/// let _sub = enclosing.subscribe(|| println!("something changed"));
/// settings.get().will_change.signal(); // Prints "something changed".
/// ```
pub struct ChangeForwarder<N: Owner> {
	target: N,
	enclosing: WeakWillChange,
	link: OnceLock<Subscription>,
}

impl<N: Owner + Debug> Debug for ChangeForwarder<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChangeForwarder")
			.field("target", &self.target)
			.field("enclosing", &self.enclosing)
			.field("linked", &self.is_linked())
			.finish()
	}
}

impl<N: Owner> ChangeForwarder<N> {
	/// Creates a new unlinked forwarder from `target` into `enclosing`.
	pub fn new(target: N, enclosing: &WillChange) -> Self {
		Self::with_weak(target, enclosing.downgrade())
	}

	/// Like [`new`](`ChangeForwarder::new`), for use before the enclosing channel is reachable strongly.
	pub fn with_weak(target: N, enclosing: WeakWillChange) -> Self {
		Self {
			target,
			enclosing,
			link: OnceLock::new(),
		}
	}

	/// Borrows the nested object, linking it first if that hasn't happened yet.
	pub fn get(&self) -> &N {
		self.ensure_linked();
		&self.target
	}

	/// Mutably borrows the nested object, linking it first if that hasn't happened yet.
	pub fn get_mut(&mut self) -> &mut N {
		self.ensure_linked();
		&mut self.target
	}

	/// Replaces the nested object and links the new one.
	///
	/// Signals from the previous nested object aren't forwarded anymore once this returns.
	pub fn set(&mut self, new_target: N) {
		drop(self.replace(new_target));
	}

	/// Like [`set`](`ChangeForwarder::set`), but **returns** the previous nested object.
	pub fn replace(&mut self, new_target: N) -> N {
		if let Some(previous) = self.link.take() {
			previous.cancel();
		}
		let previous = mem::replace(&mut self.target, new_target);
		debug!("relinking change forwarder");
		self.ensure_linked();
		previous
	}

	/// Whether the nested object is currently linked.
	pub fn is_linked(&self) -> bool {
		self.link.get().is_some_and(Subscription::is_active)
	}

	/// Consumes the forwarder, unlinking and returning the nested object.
	pub fn into_inner(self) -> N {
		self.target
	}

	fn ensure_linked(&self) {
		self.link.get_or_init(|| {
			let enclosing = self.enclosing.clone();
			self.target.will_change().subscribe(move || {
				// Best-effort: The enclosing object may be gone already.
				enclosing.signal();
			})
		});
	}
}
