//! The platform service table itself, exercised through the hosted
//! implementation.

use switchyard_lib::services;
use switchyard_tests::hosted;

fn return_arg(arg: usize) -> i32 {
    arg as i32
}

#[test]
fn test_thread_spawn_join() {
    hosted::install();

    let handle = services::thread_spawn(return_arg, 7).unwrap();
    assert_eq!(services::thread_join(handle), Ok(7));

    // A handle can only be joined once.
    assert!(services::thread_join(handle).is_err());
}

#[test]
fn test_monotonic_clock_and_sleep() {
    hosted::install();

    let before = services::monotonic_ms();
    services::sleep_ms(15);
    let after = services::monotonic_ms();
    assert!(after >= before + 10, "clock did not advance: {before} -> {after}");
}
