use std::sync::{Arc, Mutex};

use verdant::{shadow_clone, Announcer, RetainTable, SerialRuntime, Subscription, WillChange};

type GuardedCell<T> = verdant::GuardedCellSR<T, SerialRuntime>;

#[path = "../../xylem/tests/_validator.rs"]
mod _validator;
use _validator::Validator;

#[test]
fn cancel_is_idempotent() {
	let v = Arc::new(Validator::new());
	let announcer = Announcer::<i32>::new();

	let first = announcer.subscribe({
		shadow_clone!(v);
		move |value| v.push((1, *value))
	});
	let _second = announcer.subscribe({
		shadow_clone!(v);
		move |value| v.push((2, *value))
	});

	announcer.announce(&1);
	v.expect([(1, 1), (2, 1)]);

	first.cancel();
	assert!(!first.is_active());
	first.cancel();
	announcer.announce(&2);
	v.expect([(2, 2)]);
	assert_eq!(announcer.listener_count(), 1);

	drop(first);
	announcer.announce(&3);
	v.expect([(2, 3)]);
}

#[test]
fn dropping_cancels() {
	let v = Arc::new(Validator::new());
	let owner = WillChange::new();
	let cell = GuardedCell::new(0);

	let subscription = cell.subscribe({
		shadow_clone!(v);
		move |value| v.push(*value)
	});
	cell.write(&owner, 1);
	v.expect([1]);

	drop(subscription);
	assert_eq!(cell.subscriber_count(), 0);
	cell.write(&owner, 2);
	v.expect([]);
}

#[test]
fn cancelling_during_announcement_skips_later_listeners() {
	let v = Arc::new(Validator::new());
	let announcer = Announcer::<()>::new();
	let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();

	let _first = announcer.subscribe({
		shadow_clone!(v, slot);
		move |()| {
			v.push("first");
			if let Some(subscription) = slot.lock().unwrap().take() {
				drop(subscription);
			}
		}
	});
	let second = announcer.subscribe({
		shadow_clone!(v);
		move |()| v.push("second")
	});
	*slot.lock().unwrap() = Some(second);

	announcer.announce(&());
	v.expect(["first"]);
}

#[test]
fn subscription_outlives_its_source() {
	let v = Arc::new(Validator::<i32>::new());
	let announcer = Announcer::<i32>::new();
	let subscription = announcer.subscribe({
		shadow_clone!(v);
		move |value| v.push(*value)
	});
	assert!(subscription.is_active());

	drop(announcer);
	assert!(!subscription.is_active());
	subscription.cancel();
}

#[test]
fn retain_table_releases_by_retainer() {
	let v = Arc::new(Validator::new());
	let announcer = Announcer::<i32>::new();
	let table = RetainTable::new();
	let a = Arc::new("a");
	let b = Arc::new("b");

	for retainer in [&a, &b] {
		announcer
			.subscribe({
				shadow_clone!(v);
				let name = **retainer;
				move |value| v.push((name, *value))
			})
			.retain_in(&table, retainer);
	}
	assert_eq!(table.len(), 2);

	announcer.announce(&1);
	v.expect([("a", 1), ("b", 1)]);

	assert_eq!(table.release(&a), 1);
	assert_eq!(table.release(&a), 0);
	announcer.announce(&2);
	v.expect([("b", 2)]);
	assert_eq!(table.len(), 1);
}

#[test]
fn retain_table_prunes_dropped_retainers() {
	let v = Arc::new(Validator::new());
	let announcer = Announcer::<i32>::new();
	let table = RetainTable::new();
	let retainer = Arc::new(());

	for i in 0..3 {
		table.retain(
			&retainer,
			announcer.subscribe({
				shadow_clone!(v);
				move |value| v.push(i * 10 + value)
			}),
		);
	}
	assert_eq!(table.len(), 3);

	announcer.announce(&1);
	v.expect([1, 11, 21]);

	drop(retainer);
	announcer.announce(&2);
	v.expect([2, 12, 22]);

	assert_eq!(table.prune(), 3);
	assert!(table.is_empty());
	announcer.announce(&3);
	v.expect([]);
}
