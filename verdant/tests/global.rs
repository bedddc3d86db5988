#![cfg(feature = "global_serial_runtime")]

use std::sync::Arc;

use verdant::{shadow_clone, GlobalSerialRuntime, GuardedCell, SerialRuntimeRef, WillChange};

#[path = "../../xylem/tests/_validator.rs"]
mod _validator;
use _validator::Validator;

#[test]
fn cells_share_the_global_order() {
	let v = Arc::new(Validator::new());
	let owner = WillChange::new();
	let a = GuardedCell::new("a0");
	let b = GuardedCell::new("b0");

	let _a = a.subscribe({
		shadow_clone!(v);
		move |value| v.push(*value)
	});
	let _b = b.subscribe({
		shadow_clone!(v);
		move |value| v.push(*value)
	});

	GlobalSerialRuntime.run_blocking(|| {
		a.write(&owner, "a1");
		b.write(&owner, "b1");
		a.write(&owner, "a2");
	});

	v.expect(["a1", "b1", "a2"]);
	assert_eq!(*a.runtime(), GlobalSerialRuntime);
}
