//! NOTE: this crate is really just a shim for testing
//! the other no-std crate.

mod multi_thread;
mod single_thread;
