//! Argument contract checks.
//!
//! Public entry points validate their documented preconditions through this
//! macro. With the `contract-validation` feature disabled the checks
//! evaluate to nothing and trusted builds skip the work; with
//! `contract-fault` enabled a violation panics instead of returning, for
//! debug builds that want the stack right at the offending call site.

macro_rules! contract_require {
    ($cond:expr, $err:expr) => {
        if cfg!(feature = "contract-validation") && !$cond {
            if cfg!(feature = "contract-fault") {
                panic!("contract violation: {}", stringify!($cond));
            }
            return Err($err);
        }
    };
}

pub(crate) use contract_require;
