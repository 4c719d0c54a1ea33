// Stackless cooperative coroutines for tight event loops and small MCUs

#![no_std]

extern crate alloc;
#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod apps;
pub mod drivers;
pub mod kernel;
