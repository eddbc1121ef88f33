//! Argument contract checks, compiled out without `contract-validation`.
//! With `contract-fault` enabled a violation panics instead of returning.

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
