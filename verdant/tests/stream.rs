use futures_lite::{future::block_on, StreamExt};
use verdant::{SerialRuntime, SerialRuntimeRef, WillChange};

type GuardedCell<T> = verdant::GuardedCellSR<T, SerialRuntime>;

#[test]
fn stream_yields_later_writes_in_order() {
	let owner = WillChange::new();
	let cell = GuardedCell::new("a");
	let mut changes = cell.stream();

	cell.write(&owner, "b");
	cell.write(&owner, "c");

	block_on(async {
		assert_eq!(changes.next().await, Some("b"));
		assert_eq!(changes.next().await, Some("c"));
	});
}

#[test]
fn seeded_stream_starts_with_current_value() {
	let owner = WillChange::new();
	let cell = GuardedCell::new(1);
	cell.write(&owner, 2);

	let mut changes = cell.stream_seeded();
	cell.write(&owner, 3);

	block_on(async {
		assert_eq!(changes.next().await, Some(2));
		assert_eq!(changes.next().await, Some(3));
	});
}

#[test]
fn stream_ends_when_the_cell_is_dropped() {
	let owner = WillChange::new();
	let cell = GuardedCell::new(1);
	let changes = cell.stream();

	cell.write(&owner, 2);
	drop(cell);

	assert_eq!(block_on(changes.collect::<Vec<_>>()), [2]);
}

#[test]
fn queued_write_keeps_the_stream_open_until_it_ran() {
	let runtime = SerialRuntime::new();
	let owner = WillChange::new();
	let cell = GuardedCell::with_runtime(1, runtime.clone());
	let changes = cell.stream();

	runtime.run_blocking(|| {
		cell.write(&owner, 2);
		drop(cell);
	});

	assert_eq!(block_on(changes.collect::<Vec<_>>()), [2]);
}

#[test]
fn cancelled_stream_drains_its_buffer() {
	let owner = WillChange::new();
	let cell = GuardedCell::new(1);
	let changes = cell.stream();

	cell.write(&owner, 2);
	changes.cancel();
	cell.write(&owner, 3);

	assert_eq!(cell.subscriber_count(), 0);
	assert_eq!(block_on(changes.collect::<Vec<_>>()), [2]);
}
