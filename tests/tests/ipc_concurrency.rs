//! Concurrency scenarios: unpublish racing in-flight calls, republish under
//! load, and re-entrant broker use from inside a capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use switchyard_abi::{Capability, Error, InterfaceDescriptor, MatchCriteria, NO_WAIT, Result};
use switchyard_ipc::Ipc;
use switchyard_tests::fixtures::{self, BinaryOp};
use switchyard_tests::hosted;

#[test]
fn test_unpublish_races_running_call() {
    hosted::install();
    fixtures::slow_reset();

    let ipc = Ipc::new();
    ipc.init().unwrap();
    ipc.publish(&fixtures::MATH_V1).unwrap();
    let handle = ipc.try_get("math", 1, MatchCriteria::EQUALS).unwrap();
    let slow_sum = ipc.try_get_capability(handle, "slow_sum").unwrap();

    thread::scope(|scope| {
        let caller = scope.spawn(|| {
            let mut out = 0i32;
            let result = ipc.call(handle, slow_sum, &BinaryOp { a: 10, b: 20 }, &mut out);
            (result, out)
        });

        // With the call parked inside the capability, an immediate
        // unpublish must refuse.
        fixtures::slow_wait_entered();
        assert_eq!(ipc.unpublish(&fixtures::MATH_V1, NO_WAIT), Err(Error::Busy));

        // A bounded wait succeeds once the call drains.
        fixtures::slow_release();
        ipc.unpublish(&fixtures::MATH_V1, 1000).unwrap();

        let (result, out) = caller.join().unwrap();
        assert_eq!(result, Ok(()));
        assert_eq!(out, 30);
    });

    ipc.release(handle).unwrap();
    ipc.deinit().unwrap();
}

#[test]
fn test_republish_under_load_never_mixes_descriptors() {
    hosted::install();

    let ipc = Ipc::new();
    ipc.init().unwrap();
    ipc.publish(&fixtures::MATH_V1).unwrap();

    let stop = AtomicBool::new(false);
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let input = BinaryOp { a: 7, b: 3 };
                while !stop.load(Ordering::Relaxed) {
                    let Ok(handle) = ipc.try_get("math", 1, MatchCriteria::EQUALS) else {
                        continue;
                    };
                    if let Ok(index) = ipc.try_get_capability(handle, "sum") {
                        let mut out = 0i32;
                        match ipc.call(handle, index, &input, &mut out) {
                            // Either producer's sum, never a torn mixture.
                            Ok(()) => assert!(out == 10 || out == 4, "sum produced {out}"),
                            Err(Error::NotFound) => {}
                            Err(other) => panic!("unexpected call error: {other:?}"),
                        }
                    }
                    ipc.release(handle).unwrap();
                }
            });
        }

        let publisher = scope.spawn(|| {
            let mut current: &'static InterfaceDescriptor = &fixtures::MATH_V1;
            for round in 0..200 {
                loop {
                    match ipc.unpublish(current, 1000) {
                        Ok(()) => break,
                        Err(Error::Busy) => continue,
                        Err(other) => panic!("unpublish failed: {other:?}"),
                    }
                }
                current = if round % 2 == 0 {
                    &fixtures::MATH_V1_REVISED
                } else {
                    &fixtures::MATH_V1
                };
                loop {
                    match ipc.publish(current) {
                        Ok(()) => break,
                        // Stale slots may still hold references until the
                        // callers release them.
                        Err(Error::NoSpace) => thread::yield_now(),
                        Err(other) => panic!("publish failed: {other:?}"),
                    }
                }
            }
        });

        publisher.join().unwrap();
        stop.store(true, Ordering::Relaxed);
    });
}

// Re-entrancy fixture: the capability below calls back into the broker it
// is executing inside of, so the broker must be reachable from a static.
static IPC: Ipc = Ipc::new();

fn probe(_model_in: &dyn std::any::Any, _model_out: &mut dyn std::any::Any) -> Result<()> {
    // Query while our own call holds the slot's running count.
    let mut buf = [0u8; 64];
    let (written, _) = IPC.query("", &mut buf)?;
    if written == 0 {
        return Err(Error::System);
    }

    // Acquire and release a second reference to ourselves.
    let own = IPC.try_get("probe", 1, MatchCriteria::EQUALS)?;
    IPC.release(own)?;

    // Unpublishing ourselves without wait must observe the running call.
    match IPC.unpublish(&PROBE_V1, NO_WAIT) {
        Err(Error::Busy) => Ok(()),
        Ok(()) => Err(Error::System),
        Err(other) => Err(other),
    }
}

static PROBE_CAPS: [Capability; 1] = [Capability::command("probe", probe)];
static PROBE_V1: InterfaceDescriptor = InterfaceDescriptor::new("probe", 1, &PROBE_CAPS);

#[test]
fn test_reentrant_broker_calls_do_not_deadlock() {
    hosted::install();

    IPC.init().unwrap();
    IPC.publish(&PROBE_V1).unwrap();
    let handle = IPC.try_get("probe", 1, MatchCriteria::EQUALS).unwrap();

    let mut out = ();
    IPC.call(handle, 0, &(), &mut out).unwrap();

    IPC.release(handle).unwrap();
    IPC.unpublish(&PROBE_V1, NO_WAIT).unwrap();
    IPC.deinit().unwrap();
}

#[test]
fn test_concurrent_acquire_release_balance() {
    hosted::install();

    let ipc = Ipc::new();
    ipc.init().unwrap();
    ipc.publish(&fixtures::MATH_V2).unwrap();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..500 {
                    match ipc.try_get("math", 2, MatchCriteria::EQUALS) {
                        Ok(handle) => ipc.release(handle).unwrap(),
                        // Transiently at the instance cap.
                        Err(Error::NoSpace) => thread::yield_now(),
                        Err(other) => panic!("try_get failed: {other:?}"),
                    }
                }
            });
        }
    });

    // Every reference was returned, so the broker can shut down.
    ipc.unpublish(&fixtures::MATH_V2, NO_WAIT).unwrap();
    ipc.deinit().unwrap();
}
