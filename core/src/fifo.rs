use crate::{Error, Result};
use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    mem::MaybeUninit,
    ptr::NonNull,
    result::Result as CoreResult,
    sync::atomic::{
        AtomicBool, AtomicUsize,
        Ordering::{AcqRel, Acquire, Release},
    },
};

#[derive(Debug)]
/// A backing structure for a byte FIFO. Owns the storage and the two ring
/// indices; split it to obtain the `Producer`/`Consumer` pair that actually
/// moves bytes.
///
/// The capacity `N` must be a power of two, at least 2. One slot of the ring
/// is always kept unused to tell a full queue apart from an empty one, so up
/// to `N - 1` bytes may be pending at any time.
pub struct FifoBuffer<const N: usize> {
    buf: UnsafeCell<MaybeUninit<[u8; N]>>,

    /// First filled slot, where the next byte will be read from.
    /// Only ever stored to by the consumer
    read: AtomicUsize,

    /// First empty slot, where the next byte will be written.
    /// Only ever stored to by the producer
    write: AtomicUsize,

    /// Have we already split?
    already_split: AtomicBool,
}

unsafe impl<const A: usize> Sync for FifoBuffer<A> {}

impl<'a, const N: usize> FifoBuffer<N> {
    /// Attempt to split the `FifoBuffer` into `Producer` and `Consumer` halves
    /// to gain access to the storage. If the buffer has already been split, an
    /// error will be returned.
    ///
    /// NOTE: When splitting, the underlying buffer will be explicitly initialized
    /// to zero. This may take a measurable amount of time, depending on the size
    /// of the buffer. If the buffer is placed at `static` scope within the `.bss`
    /// region, the explicit initialization will be elided (as it is already
    /// performed as part of memory initialization)
    ///
    /// NOTE: If the `thumbv6` feature is selected, this function takes a short
    /// critical section while splitting.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::FifoBuffer;
    ///
    /// // Create and split a new fifo
    /// let fifo: FifoBuffer<16> = FifoBuffer::new();
    /// let (prod, cons) = fifo.try_split().unwrap();
    ///
    /// // Not possible to split twice
    /// assert!(fifo.try_split().is_err());
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub fn try_split(&'a self) -> Result<(Producer<'a, N>, Consumer<'a, N>)> {
        if atomic::swap(&self.already_split, true, AcqRel) {
            return Err(Error::AlreadySplit);
        }

        unsafe {
            // Explicitly zero the data to avoid undefined behavior.
            // No consumer-side slot read may ever observe uninitialized
            // memory, regardless of what the index discipline guarantees
            let mu_ptr = self.buf.get();
            (*mu_ptr).as_mut_ptr().write_bytes(0u8, 1);

            let nn1 = NonNull::new_unchecked(self as *const _ as *mut _);
            let nn2 = NonNull::new_unchecked(self as *const _ as *mut _);

            Ok((
                Producer {
                    fifo: nn1,
                    pd: PhantomData,
                },
                Consumer {
                    fifo: nn2,
                    pd: PhantomData,
                },
            ))
        }
    }

    /// Attempt to release the Producer and Consumer
    ///
    /// This re-initializes the buffer, discarding any pending bytes, so it may
    /// be split again at a later time. Every split has a matching, unambiguous
    /// destruction path through this method.
    ///
    /// The `Producer` and `Consumer` must be from THIS `FifoBuffer`, or an
    /// error will be returned. Taking both halves by value guarantees that no
    /// other context can touch the buffer while it is re-initialized.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::FifoBuffer;
    ///
    /// // Create and split a new fifo
    /// let fifo: FifoBuffer<16> = FifoBuffer::new();
    /// let (prod, cons) = fifo.try_split().unwrap();
    ///
    /// // Not possible to split twice
    /// assert!(fifo.try_split().is_err());
    ///
    /// // Release the producer and consumer
    /// assert!(fifo.try_release(prod, cons).is_ok());
    ///
    /// // Split the buffer again
    /// let (prod, cons) = fifo.try_split().unwrap();
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub fn try_release(
        &'a self,
        prod: Producer<'a, N>,
        cons: Consumer<'a, N>,
    ) -> CoreResult<(), (Producer<'a, N>, Consumer<'a, N>)> {
        // Note: Re-entrancy is not possible because we require ownership
        // of the producer and consumer, which are not cloneable.

        // Are these our producer and consumer?
        let our_prod = prod.fifo.as_ptr() as *const Self == self;
        let our_cons = cons.fifo.as_ptr() as *const Self == self;

        if !(our_prod && our_cons) {
            // Can't release, not our producer and consumer
            return Err((prod, cons));
        }

        // Drop the producer and consumer halves
        drop(prod);
        drop(cons);

        // Re-initialize the buffer, discarding pending bytes
        self.write.store(0, Release);
        self.read.store(0, Release);

        // Mark the buffer as ready to be split
        self.already_split.store(false, Release);

        Ok(())
    }
}

impl<const N: usize> FifoBuffer<N> {
    /// Create a new constant inner portion of a `FifoBuffer`.
    ///
    /// This is a `const fn`, so the buffer can be placed at `static` scope,
    /// which is the usual arrangement when the producer half lives inside an
    /// interrupt handler.
    ///
    /// ```rust,no_run
    /// use lffifo::FifoBuffer;
    ///
    /// static BUF: FifoBuffer<256> = FifoBuffer::new();
    ///
    /// fn main() {
    ///    let (prod, cons) = BUF.try_split().unwrap();
    /// }
    /// ```
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "capacity must be a power of two");
        assert!(N >= 2, "capacity must be at least 2");

        Self {
            // This will not be initialized until we split the buffer
            buf: UnsafeCell::new(MaybeUninit::uninit()),

            // Owned by the consumer
            read: AtomicUsize::new(0),

            // Owned by the producer
            write: AtomicUsize::new(0),

            // We haven't split at the start
            already_split: AtomicBool::new(false),
        }
    }

    /// Returns the size of the backing storage.
    ///
    /// One slot is reserved to disambiguate full from empty, so the maximum
    /// number of pending bytes is `capacity() - 1`.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::FifoBuffer;
    ///
    /// // Create a new fifo backed by 256 bytes
    /// let fifo: FifoBuffer<256> = FifoBuffer::new();
    /// assert_eq!(fifo.capacity(), 256);
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub const fn capacity(&self) -> usize {
        N
    }

    fn is_empty_inner(&self) -> bool {
        self.read.load(Acquire) == self.write.load(Acquire)
    }

    fn is_full_inner(&self) -> bool {
        let write = self.write.load(Acquire);
        let read = self.read.load(Acquire);
        ((write + 1) & (N - 1)) == read
    }

    fn len_inner(&self) -> usize {
        let write = self.write.load(Acquire);
        let read = self.read.load(Acquire);
        write.wrapping_sub(read) & (N - 1)
    }
}

/// `Producer` is the interface for pushing single bytes into a `FifoBuffer`.
///
/// Exactly one `Producer` exists per split, typically owned by the interrupt
/// side of a UART receive path (or the thread side of a transmit path). Every
/// operation completes in bounded, constant time and never blocks.
pub struct Producer<'a, const N: usize> {
    fifo: NonNull<FifoBuffer<N>>,
    pd: PhantomData<&'a ()>,
}

unsafe impl<'a, const N: usize> Send for Producer<'a, N> {}

impl<'a, const N: usize> Producer<'a, N> {
    /// Push one byte into the queue.
    ///
    /// If no free slot remains, `Error::Full` is returned and nothing is
    /// mutated. Whether to retry, drop the byte, or count an overrun is the
    /// caller's policy, not this component's.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::FifoBuffer;
    ///
    /// // Create and split a new fifo backed by 4 bytes
    /// let fifo: FifoBuffer<4> = FifoBuffer::new();
    /// let (mut prod, cons) = fifo.try_split().unwrap();
    ///
    /// // Three bytes fit, the fourth slot stays reserved
    /// prod.write(1).unwrap();
    /// prod.write(2).unwrap();
    /// prod.write(3).unwrap();
    /// assert!(prod.write(4).is_err());
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub fn write(&mut self, byte: u8) -> Result<()> {
        let inner = unsafe { self.fifo.as_ref() };

        // Producer component. Owns `write`, must never store to `read`
        let write = inner.write.load(Acquire);
        let read = inner.read.load(Acquire);

        if ((write + 1) & (N - 1)) == read {
            return Err(Error::Full);
        }

        // This is sound, as UnsafeCell and MaybeUninit are both
        // `#[repr(transparent)]`, and `write` is always within the storage
        let start_of_buf_ptr = inner.buf.get().cast::<u8>();
        unsafe { start_of_buf_ptr.add(write).write(byte) };

        // The byte store above must be visible before the new index; this
        // Release pairs with the consumer's Acquire load of `write`
        inner.write.store((write + 1) & (N - 1), Release);

        Ok(())
    }

    /// Returns true if no free slot remains.
    ///
    /// Pure query, callable from either context.
    pub fn is_full(&self) -> bool {
        unsafe { self.fifo.as_ref() }.is_full_inner()
    }

    /// Returns true if no byte is pending.
    ///
    /// Pure query, callable from either context.
    pub fn is_empty(&self) -> bool {
        unsafe { self.fifo.as_ref() }.is_empty_inner()
    }

    /// Number of pending bytes, in `0..=N - 1`.
    pub fn len(&self) -> usize {
        unsafe { self.fifo.as_ref() }.len_inner()
    }
}

/// `Consumer` is the interface for popping single bytes out of a `FifoBuffer`.
///
/// Exactly one `Consumer` exists per split. Bytes come out in the exact order
/// the producer pushed them, across index wraparound.
pub struct Consumer<'a, const N: usize> {
    fifo: NonNull<FifoBuffer<N>>,
    pd: PhantomData<&'a ()>,
}

unsafe impl<'a, const N: usize> Send for Consumer<'a, N> {}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Pop the oldest pending byte from the queue.
    ///
    /// If nothing is pending, `Error::Empty` is returned and nothing is
    /// mutated.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::{Error, FifoBuffer};
    ///
    /// // Create and split a new fifo
    /// let fifo: FifoBuffer<16> = FifoBuffer::new();
    /// let (mut prod, mut cons) = fifo.try_split().unwrap();
    ///
    /// prod.write(42).unwrap();
    /// assert_eq!(cons.read(), Ok(42));
    /// assert_eq!(cons.read(), Err(Error::Empty));
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub fn read(&mut self) -> Result<u8> {
        let inner = unsafe { self.fifo.as_ref() };

        // Consumer component. Owns `read`, must never store to `write`
        let read = inner.read.load(Acquire);
        let write = inner.write.load(Acquire);

        if read == write {
            return Err(Error::Empty);
        }

        // This is sound, as UnsafeCell and MaybeUninit are both
        // `#[repr(transparent)]`, and the slot at `read` was published by the
        // producer's Release store of `write`
        let start_of_buf_ptr = inner.buf.get().cast::<u8>();
        let byte = unsafe { start_of_buf_ptr.add(read).read() };

        // Publishing the new `read` hands the slot back to the producer
        inner.read.store((read + 1) & (N - 1), Release);

        Ok(byte)
    }

    /// Discard all pending bytes, making the queue empty.
    ///
    /// This only stores to the consumer-owned `read` index, so a producer
    /// `write` racing with the flush is well defined: the flush linearizes at
    /// its load of `write`, and any byte committed after that load stays in
    /// the queue.
    ///
    /// ```rust
    /// # // lffifo test shim!
    /// # fn fifotest() {
    /// use lffifo::{Error, FifoBuffer};
    ///
    /// // Create and split a new fifo
    /// let fifo: FifoBuffer<16> = FifoBuffer::new();
    /// let (mut prod, mut cons) = fifo.try_split().unwrap();
    ///
    /// prod.write(1).unwrap();
    /// prod.write(2).unwrap();
    /// cons.flush();
    ///
    /// assert!(cons.is_empty());
    /// assert_eq!(cons.read(), Err(Error::Empty));
    /// # // lffifo test shim!
    /// # }
    /// #
    /// # fn main() {
    /// # #[cfg(not(feature = "thumbv6"))]
    /// # fifotest();
    /// # }
    /// ```
    pub fn flush(&mut self) {
        let inner = unsafe { self.fifo.as_ref() };

        let write = inner.write.load(Acquire);
        inner.read.store(write, Release);
    }

    /// Returns true if no byte is pending.
    ///
    /// Pure query, callable from either context.
    pub fn is_empty(&self) -> bool {
        unsafe { self.fifo.as_ref() }.is_empty_inner()
    }

    /// Returns true if no free slot remains.
    ///
    /// Pure query, callable from either context.
    pub fn is_full(&self) -> bool {
        unsafe { self.fifo.as_ref() }.is_full_inner()
    }

    /// Number of pending bytes, in `0..=N - 1`.
    pub fn len(&self) -> usize {
        unsafe { self.fifo.as_ref() }.len_inner()
    }
}

#[cfg(feature = "thumbv6")]
mod atomic {
    use core::sync::atomic::{
        AtomicBool,
        Ordering::{self, Acquire, Release},
    };
    use cortex_m::interrupt::free;

    // The hot path only needs plain loads and stores, which thumbv6 has
    // natively; the split guard is the single place that needs a swap

    #[inline(always)]
    pub fn swap(atomic: &AtomicBool, val: bool, _order: Ordering) -> bool {
        free(|_| {
            let prev = atomic.load(Acquire);
            atomic.store(val, Release);
            prev
        })
    }
}

#[cfg(not(feature = "thumbv6"))]
mod atomic {
    use core::sync::atomic::{AtomicBool, Ordering};

    #[inline(always)]
    pub fn swap(atomic: &AtomicBool, val: bool, order: Ordering) -> bool {
        atomic.swap(val, order)
    }
}
