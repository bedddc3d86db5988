use std::{
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc, Mutex,
	},
	thread,
};

use verdant::{shadow_clone, SerialRuntime, SerialRuntimeRef, WillChange};

type GuardedCell<T> = verdant::GuardedCellSR<T, SerialRuntime>;

const THREADS: usize = 8;
const WRITES: usize = 250;

#[test]
fn readers_never_see_torn_values() {
	let runtime = SerialRuntime::new();
	let owner = WillChange::new();
	let cell = Arc::new(GuardedCell::with_runtime([0_usize; 64], runtime.clone()));
	let done = Arc::new(AtomicBool::new(false));

	let readers: Vec<_> = (0..THREADS / 2)
		.map(|_| {
			shadow_clone!(cell, done);
			thread::spawn(move || {
				let mut reads = 0_usize;
				while !done.load(Ordering::Acquire) {
					let value = cell.read();
					assert!(value.iter().all(|x| *x == value[0]), "torn read: {value:?}");
					reads += 1;
				}
				reads
			})
		})
		.collect();

	let writers: Vec<_> = (0..THREADS / 2)
		.map(|t| {
			shadow_clone!(cell, owner);
			thread::spawn(move || {
				for i in 0..WRITES {
					cell.write(&owner, [t * WRITES + i; 64]);
				}
			})
		})
		.collect();

	for writer in writers {
		writer.join().unwrap();
	}
	runtime.run_blocking(|| ());
	done.store(true, Ordering::Release);
	for reader in readers {
		reader.join().unwrap();
	}

	let value = cell.read();
	assert!(value.iter().all(|x| *x == value[0]));
}

#[test]
fn signals_and_announcements_alternate_across_threads() {
	let runtime = SerialRuntime::new();
	let owner = WillChange::new();
	let cell = Arc::new(GuardedCell::with_runtime(usize::MAX, runtime.clone()));

	let log = Arc::new(Mutex::new(Vec::new()));
	let _will_change = owner.subscribe({
		shadow_clone!(log);
		move || log.lock().unwrap().push(None)
	});
	let _changes = cell.subscribe({
		shadow_clone!(log);
		move |value| log.lock().unwrap().push(Some(*value))
	});

	let writers: Vec<_> = (0..THREADS)
		.map(|t| {
			shadow_clone!(cell, owner);
			thread::spawn(move || {
				for i in 0..WRITES {
					cell.write(&owner, t * WRITES + i);
				}
			})
		})
		.collect();
	for writer in writers {
		writer.join().unwrap();
	}
	runtime.run_blocking(|| ());

	let log = log.lock().unwrap();
	assert_eq!(log.len(), THREADS * WRITES * 2);

	let mut announced = Vec::new();
	for pair in log.chunks(2) {
		assert_eq!(pair[0], None, "expected a signal first: {pair:?}");
		announced.push(pair[1].expect("expected an announcement second"));
	}

	// Each thread's writes are announced in that thread's order.
	for t in 0..THREADS {
		let own: Vec<_> = announced
			.iter()
			.copied()
			.filter(|value| value / WRITES == t)
			.collect();
		assert_eq!(own, (t * WRITES..(t + 1) * WRITES).collect::<Vec<_>>());
	}

	assert_eq!(Some(cell.read()), announced.last().copied());
}

#[test]
fn listeners_never_run_in_parallel() {
	let runtime = SerialRuntime::new();
	let owner = WillChange::new();
	let cell = Arc::new(GuardedCell::with_runtime(0_usize, runtime.clone()));

	let running = Arc::new(AtomicBool::new(false));
	let calls = Arc::new(AtomicUsize::new(0));
	let _changes = cell.subscribe({
		shadow_clone!(running, calls);
		move |_| {
			assert!(!running.swap(true, Ordering::AcqRel), "overlapping listener calls");
			thread::yield_now();
			calls.fetch_add(1, Ordering::Relaxed);
			running.store(false, Ordering::Release);
		}
	});

	let writers: Vec<_> = (0..THREADS)
		.map(|t| {
			shadow_clone!(cell, owner);
			thread::spawn(move || {
				for i in 0..WRITES {
					cell.update(&owner, move |value| *value = value.wrapping_add(t + i));
				}
			})
		})
		.collect();
	for writer in writers {
		writer.join().unwrap();
	}
	runtime.run_blocking(|| ());

	assert_eq!(calls.load(Ordering::Relaxed), THREADS * WRITES);
}
