//! The allocator interface consumed by [`HashTable`](crate::HashTable).
//!
//! The table acquires its bucket array in one block and releases it in one
//! block, on growth and on drop. Any allocator able to hand out a block for a
//! [`Layout`] can back a table, including arena allocators whose
//! `deallocate` is a no-op and whose memory is reclaimed in bulk.

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;

/// The allocator failed to provide memory for a request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl core::error::Error for AllocError {}

/// A source of bucket arrays.
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and that stay valid
/// until they are passed to [`deallocate`](BucketAllocator::deallocate) or
/// the allocator itself is dropped. Blocks handed out must not overlap.
pub unsafe trait BucketAllocator {
    /// Allocates a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Releases a block. Must not fail. Arena-style allocators may do
    /// nothing here.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global heap, through [`alloc::alloc`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

// SAFETY: `alloc::alloc::alloc` upholds the block requirements for non-zero
// layouts, and blocks stay valid until `dealloc`.
unsafe impl BucketAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);
        // SAFETY: The table never requests zero-sized layouts.
        let raw = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(raw).ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller guarantees `ptr` came from `allocate` with `layout`.
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// SAFETY: Forwards to the referenced allocator, which upholds the contract
// for as long as the reference lives.
unsafe impl<A: BucketAllocator + ?Sized> BucketAllocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Forwarded contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}
