use std::{
	fmt::{self, Debug, Formatter},
	pin::Pin,
	task::{Context, Poll},
};

use futures_channel::mpsc::UnboundedReceiver;
use futures_lite::Stream;
use pin_project::pin_project;

use crate::Subscription;

/// A [`Stream`] of a guarded cell's new values, in write order.
///
/// Values are buffered without bound until polled.
/// The stream ends once the cell is dropped; dropping the stream unsubscribes.
#[pin_project]
#[must_use = "Streams do nothing unless polled. Dropping this unsubscribes."]
pub struct Changes<T> {
	#[pin]
	receiver: UnboundedReceiver<T>,
	subscription: Subscription,
}

impl<T> Debug for Changes<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Changes")
			.field("subscription", &self.subscription)
			.finish_non_exhaustive()
	}
}

impl<T> Changes<T> {
	pub(crate) fn new(receiver: UnboundedReceiver<T>, subscription: Subscription) -> Self {
		Self {
			receiver,
			subscription,
		}
	}

	/// Stops receiving new values. Values already buffered can still be read.
	pub fn cancel(&self) {
		self.subscription.cancel();
	}
}

impl<T> Stream for Changes<T> {
	type Item = T;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.project().receiver.poll_next(cx)
	}
}
