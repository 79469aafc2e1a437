//! # lffifo
//!
//! `lffifo` is a Single Producer Single Consumer, lockless, no_std, thread safe,
//! byte FIFO of fixed power-of-two capacity.
//!
//! It is designed (primarily) to carry bytes between an interrupt handler and
//! application code on embedded systems, e.g. as the receive or transmit staging
//! buffer of a UART driver. The interrupt side and the thread side each own
//! exactly one half of a split [`FifoBuffer`]: the [`Producer`] pushes single
//! bytes, the [`Consumer`] pops them in strict FIFO order. Neither side ever
//! blocks, retries internally, or allocates, and every failure is reported
//! synchronously through a [`Result`], so the producer half is safe to drive
//! from an interrupt handler with a hard latency budget.
//!
//! Lock freedom comes from a single-writer-per-index discipline: the producer
//! is the only writer of the `write` index, the consumer the only writer of the
//! `read` index, and each side only ever loads the index it does not own. Both
//! indices are atomics with acquire/release ordering, so the guarantee holds on
//! multi-core targets as well as on single-core interrupt-driven ones.

#![no_std]
#![deny(missing_docs)]
#![deny(warnings)]

mod fifo;

pub use fifo::{Consumer, FifoBuffer, Producer};

use core::result::Result as CoreResult;

/// Result type used by the `lffifo` interfaces
pub type Result<T> = CoreResult<T, Error>;

/// Error type used by the `lffifo` interfaces
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt_0_3", derive(defmt::Format))]
pub enum Error {
    /// No free slot remains, the byte was not stored. One slot of the
    /// backing storage is always kept unused, so this is reported after
    /// `N - 1` bytes are pending
    Full,

    /// No byte is pending, nothing was consumed
    Empty,

    /// Unable to split the buffer, as it has already been split
    AlreadySplit,
}
