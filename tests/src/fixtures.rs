//! Fixture producers published by the integration scenarios.
//!
//! A small calculator interface in three revisions, a sensor interface with
//! a property and a telemetry stream, and a gated slow command for the
//! unpublish-drain scenarios.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use switchyard_abi::{Capability, Error, InterfaceDescriptor, Result};
use switchyard_lib::services;

/// Input model of the binary math commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOp {
    pub a: i32,
    pub b: i32,
}

fn math_sum(model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()> {
    let input = model_in.downcast_ref::<BinaryOp>().ok_or(Error::InvalidArgument)?;
    let output = model_out.downcast_mut::<i32>().ok_or(Error::InvalidArgument)?;
    *output = input.a + input.b;
    Ok(())
}

fn math_multiply(model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()> {
    let input = model_in.downcast_ref::<BinaryOp>().ok_or(Error::InvalidArgument)?;
    let output = model_out.downcast_mut::<i32>().ok_or(Error::InvalidArgument)?;
    *output = input.a * input.b;
    Ok(())
}

/// Span entry of `sum`: "a,b" in ASCII decimal in, decimal sum out.
fn math_sum_span(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let text = core::str::from_utf8(input).map_err(|_| Error::InvalidArgument)?;
    let (a, b) = text.split_once(',').ok_or(Error::InvalidArgument)?;
    let a = switchyard_lib::string::parse_u32(a).ok_or(Error::InvalidArgument)?;
    let b = switchyard_lib::string::parse_u32(b).ok_or(Error::InvalidArgument)?;

    use core::fmt::Write;
    let mut writer = switchyard_lib::ByteWriter::new(output);
    write!(writer, "{}", a + b).map_err(|_| Error::NoSpace)?;
    Ok(writer.written())
}

/// Set once a slow call is inside the capability.
pub static SLOW_ENTERED: AtomicBool = AtomicBool::new(false);
/// The slow call spins until this releases it.
pub static SLOW_GATE: AtomicBool = AtomicBool::new(false);

/// Reset the slow-call handshake between scenarios.
pub fn slow_reset() {
    SLOW_ENTERED.store(false, Ordering::SeqCst);
    SLOW_GATE.store(false, Ordering::SeqCst);
}

/// Open the gate so a parked slow call can finish.
pub fn slow_release() {
    SLOW_GATE.store(true, Ordering::SeqCst);
}

/// Park inside the gate until released.
pub fn slow_wait_entered() {
    while !SLOW_ENTERED.load(Ordering::SeqCst) {
        services::sleep_ms(1);
    }
}

fn math_slow_sum(model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()> {
    SLOW_ENTERED.store(true, Ordering::SeqCst);
    while !SLOW_GATE.load(Ordering::SeqCst) {
        services::sleep_ms(1);
    }
    math_sum(model_in, model_out)
}

static MATH_V1_CAPS: [Capability; 3] = [
    Capability::command_with_span("sum", math_sum, math_sum_span),
    Capability::command("multiply", math_multiply),
    Capability::command("slow_sum", math_slow_sum),
];

/// `math.1`: sum (with span entry), multiply, and the gated slow sum.
pub static MATH_V1: InterfaceDescriptor = InterfaceDescriptor::new("math", 1, &MATH_V1_CAPS);

fn math_difference(model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()> {
    let input = model_in.downcast_ref::<BinaryOp>().ok_or(Error::InvalidArgument)?;
    let output = model_out.downcast_mut::<i32>().ok_or(Error::InvalidArgument)?;
    *output = input.a - input.b;
    Ok(())
}

static MATH_V1_REVISED_CAPS: [Capability; 1] = [Capability::command("sum", math_difference)];

/// A different producer's `math.1`: same identity, observably different
/// behavior (its `sum` subtracts). Used to prove stale handles never reach
/// a slot's new occupant.
pub static MATH_V1_REVISED: InterfaceDescriptor =
    InterfaceDescriptor::new("math", 1, &MATH_V1_REVISED_CAPS);

static MATH_V2_CAPS: [Capability; 2] = [
    Capability::command_with_span("sum", math_sum, math_sum_span),
    Capability::command("multiply", math_multiply),
];

/// `math.2`.
pub static MATH_V2: InterfaceDescriptor = InterfaceDescriptor::new("math", 2, &MATH_V2_CAPS);

static THRESHOLD: AtomicI32 = AtomicI32::new(50);

fn threshold_get(_model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()> {
    let output = model_out.downcast_mut::<i32>().ok_or(Error::InvalidArgument)?;
    *output = THRESHOLD.load(Ordering::Relaxed);
    Ok(())
}

fn threshold_set(model_in: &dyn Any, _model_out: &mut dyn Any) -> Result<()> {
    let input = model_in.downcast_ref::<i32>().ok_or(Error::InvalidArgument)?;
    THRESHOLD.store(*input, Ordering::Relaxed);
    Ok(())
}

static SENSOR_V1_CAPS: [Capability; 2] = [
    Capability::property("threshold", Some(threshold_get), Some(threshold_set)),
    Capability::telemetry("reading"),
];

/// `sensor.1`: a read/write threshold property and a telemetry stream.
pub static SENSOR_V1: InterfaceDescriptor = InterfaceDescriptor::new("sensor", 1, &SENSOR_V1_CAPS);
