use core::alloc::Layout;
use core::fmt;

/// The error type for `try_reserve`, `try_rehash` and other fallible
/// capacity operations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TryReserveError {
    /// The requested bucket count exceeds what the growth policy can
    /// represent, or the bucket array layout would overflow `isize::MAX`
    /// bytes.
    CapacityOverflow,

    /// The allocator returned an error.
    AllocError {
        /// The layout of the allocation request that failed.
        layout: Layout,
    },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str("requested bucket count exceeds the growth policy's maximum")
            }
            TryReserveError::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl core::error::Error for TryReserveError {}

/// Returned by [`HashMap::at`](crate::HashMap::at) and
/// [`HashMap::at_mut`](crate::HashMap::at_mut) when the key is not present.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NotFoundError;

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl core::error::Error for NotFoundError {}

/// Whether a capacity failure is reported to the caller or turned into a
/// panic / allocation-error abort.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[cold]
    #[inline(never)]
    pub(crate) fn capacity_overflow(self) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::CapacityOverflow,
            Fallibility::Infallible => panic!("capacity overflow"),
        }
    }

    #[cold]
    #[inline(never)]
    pub(crate) fn alloc_err(self, layout: Layout) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::AllocError { layout },
            Fallibility::Infallible => alloc::alloc::handle_alloc_error(layout),
        }
    }

    /// Maps an error produced on a fallible path onto this fallibility.
    pub(crate) fn reraise(self, err: TryReserveError) -> TryReserveError {
        match err {
            TryReserveError::CapacityOverflow => self.capacity_overflow(),
            TryReserveError::AllocError { layout } => self.alloc_err(layout),
        }
    }
}

/// Unwraps the result of an infallible capacity operation.
///
/// Infallible operations never produce an `Err`: the error constructors
/// above panic or abort first.
#[inline]
pub(crate) fn infallible<T>(result: Result<T, TryReserveError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => unreachable!("infallible capacity operation returned an error"),
    }
}
