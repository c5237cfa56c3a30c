use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::allocator::BucketAllocator;
use crate::allocator::Global;
use crate::error::Fallibility;
use crate::error::TryReserveError;
use crate::error::infallible;
use crate::growth_policy::GrowthPolicy;
use crate::growth_policy::PowerOfTwoGrowthPolicy;

/// Probe distance stored in an empty bucket.
///
/// Every live element has a distance of at least zero, so a lookup carrying
/// distance `d >= 0` stops on an empty bucket through the same `d > dist`
/// comparison that stops it on a richer resident.
const EMPTY: i32 = -1;

/// Once an element is displaced this far from its ideal bucket, the next
/// insertion grows the table regardless of the load factor, as long as the
/// load factor is at least [`LONG_PROBE_GROWTH_MIN_LOAD_FACTOR`].
pub const DIST_FROM_IDEAL_BUCKET_LIMIT: i32 = 8192;

/// Below this load factor long probes no longer grow the table.
pub const LONG_PROBE_GROWTH_MIN_LOAD_FACTOR: f32 = 0.15;

/// Load factor used by tables that do not configure one.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.95;

const MAX_LOAD_FACTOR_RANGE: (f32, f32) = (0.2, 0.95);
const MIN_LOAD_FACTOR_MAX: f32 = 0.15;

mod sealed {
    pub trait Sealed {}
}

/// Selects whether buckets cache a fragment of each element's hash.
///
/// With [`StoreHash`], every bucket keeps the low 32 bits of the hash next to
/// the element: lookups compare the fragment before calling the equality
/// predicate, and rehashing a power-of-two table of up to 2^32 buckets needs
/// no hashing at all. This costs four bytes per bucket (often less, after
/// padding). With [`NoStoreHash`] the fragment is zero-sized.
pub trait HashCache: sealed::Sealed {
    /// What a bucket stores.
    type Fragment: Copy + PartialEq + Debug;

    /// Whether fragments carry information.
    const ENABLED: bool;

    /// The fragment stored for `hash`.
    fn fragment(hash: u64) -> Self::Fragment;

    /// Widens a fragment back into a hash usable by the growth policy.
    fn widen(fragment: Self::Fragment) -> u64;
}

/// Buckets cache the low 32 bits of each hash.
#[derive(Clone, Copy, Debug)]
pub enum StoreHash {}

/// Buckets do not cache hashes.
#[derive(Clone, Copy, Debug)]
pub enum NoStoreHash {}

impl sealed::Sealed for StoreHash {}
impl sealed::Sealed for NoStoreHash {}

impl HashCache for StoreHash {
    type Fragment = u32;

    const ENABLED: bool = true;

    #[inline(always)]
    fn fragment(hash: u64) -> u32 {
        hash as u32
    }

    #[inline(always)]
    fn widen(fragment: u32) -> u64 {
        fragment as u64
    }
}

impl HashCache for NoStoreHash {
    type Fragment = ();

    const ENABLED: bool = false;

    #[inline(always)]
    fn fragment(_hash: u64) {}

    #[inline(always)]
    fn widen(_fragment: ()) -> u64 {
        0
    }
}

/// One slot of the bucket array.
///
/// `value` is initialized if and only if `dist >= 0`.
struct Bucket<V, C: HashCache> {
    dist: i32,
    hash: C::Fragment,
    value: MaybeUninit<V>,
}

impl<V, C: HashCache> Bucket<V, C> {
    #[inline(always)]
    fn empty() -> Self {
        Bucket {
            dist: EMPTY,
            hash: C::fragment(0),
            value: MaybeUninit::uninit(),
        }
    }

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.dist < 0
    }

    /// # Safety
    ///
    /// The bucket must be occupied.
    #[inline(always)]
    unsafe fn value(&self) -> &V {
        debug_assert!(!self.is_empty());
        // SAFETY: Caller guarantees the bucket is occupied.
        unsafe { self.value.assume_init_ref() }
    }

    /// # Safety
    ///
    /// The bucket must be occupied.
    #[inline(always)]
    unsafe fn value_mut(&mut self) -> &mut V {
        debug_assert!(!self.is_empty());
        // SAFETY: Caller guarantees the bucket is occupied.
        unsafe { self.value.assume_init_mut() }
    }

    #[inline(always)]
    fn fill(&mut self, dist: i32, hash: C::Fragment, value: V) {
        debug_assert!(self.is_empty());
        debug_assert!(dist >= 0);
        self.value.write(value);
        self.hash = hash;
        self.dist = dist;
    }

    /// Moves the element out and marks the bucket empty.
    ///
    /// # Safety
    ///
    /// The bucket must be occupied.
    #[inline(always)]
    unsafe fn take(&mut self) -> (i32, C::Fragment, V) {
        debug_assert!(!self.is_empty());
        let dist = core::mem::replace(&mut self.dist, EMPTY);
        // SAFETY: Caller guarantees the bucket was occupied; it is now marked
        // empty so the value is never read again.
        (dist, self.hash, unsafe { self.value.assume_init_read() })
    }

    /// Swaps the carried element with the resident one.
    ///
    /// # Safety
    ///
    /// The bucket must be occupied.
    #[inline(always)]
    unsafe fn swap(&mut self, dist: &mut i32, hash: &mut C::Fragment, value: &mut V) {
        debug_assert!(!self.is_empty());
        core::mem::swap(&mut self.dist, dist);
        core::mem::swap(&mut self.hash, hash);
        // SAFETY: Caller guarantees the bucket is occupied.
        core::mem::swap(unsafe { self.value.assume_init_mut() }, value);
    }
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of elements the table holds before growing
    pub capacity: usize,
    /// Number of buckets allocated
    pub bucket_count: usize,
    /// Load factor (populated / bucket_count)
    pub load_factor: f64,
    /// Largest distance of any element from its ideal bucket
    pub max_probe_distance: usize,
    /// Mean distance of the elements from their ideal buckets
    pub mean_probe_distance: f64,
    /// Total memory in bytes used by the bucket array
    pub total_bytes: usize,
    /// Memory in bytes held by empty buckets
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} buckets ({:.2}% load factor, grows past {})",
            self.populated,
            self.bucket_count,
            self.load_factor * 100.0,
            self.capacity
        );
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_probe_distance, self.mean_probe_distance
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes in empty buckets ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Number of elements at each distance from their ideal bucket.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// `counts[d]` is the number of elements stored `d` buckets past their
    /// ideal bucket.
    pub counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = *self.counts.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.counts.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let full = units / 8;
            let rem = units % 8;
            let mut bar = "█".repeat(full);
            if rem > 0 {
                let ch = match rem {
                    1 => '▏',
                    2 => '▎',
                    3 => '▍',
                    4 => '▌',
                    5 => '▋',
                    6 => '▊',
                    7 => '▉',
                    _ => unreachable!(),
                };
                bar.push(ch);
            }
            bar
        };

        for (i, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", i, make_bar(count), count);
        }
    }
}

/// A hash table using robin-hood open addressing with backward-shift
/// deletion.
///
/// `HashTable<V>` stores values of type `V` in a single bucket array. Like
/// other raw tables, it does not know how to hash or compare its values:
/// every operation takes the hash of the value it is looking for and an
/// equality predicate, and operations that may grow the table take a
/// re-hasher used for the elements it moves.
///
/// Every element sits at or after its ideal bucket (chosen by the growth
/// policy `P`). An insertion walks forward from the ideal bucket and takes
/// the slot of the first resident that is closer to its own ideal bucket
/// than the newcomer is to its own; the displaced resident continues the
/// walk. Lookups stop as soon as they meet such a resident, because the key
/// they are looking for would have displaced it. Removal shifts the
/// following elements back by one instead of leaving a tombstone.
///
/// ## Type parameters
///
/// - `P`: the [`GrowthPolicy`] mapping hashes to buckets.
/// - `C`: [`StoreHash`] or [`NoStoreHash`], see [`HashCache`].
/// - `A`: the [`BucketAllocator`] providing the bucket array.
///
/// ## Panics and rehashing
///
/// If the re-hasher panics during a rehash, the table is left valid but the
/// elements that had not been moved yet are leaked. No rollback is
/// attempted.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use robin_hash::hash_table::Entry;
/// # use robin_hash::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table: HashTable<Person> = HashTable::new();
///
/// match table.entry(hash_id(123), |p| p.id == 123, |p| hash_id(p.id)) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.len(), 1);
/// ```
pub struct HashTable<V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    buckets: NonNull<Bucket<V, C>>,
    policy: P,
    alloc: A,

    populated: usize,
    load_threshold: usize,
    max_load_factor: f32,
    min_load_factor: f32,

    grow_on_next_insert: bool,
    try_shrink_on_next_insert: bool,

    _phantom: PhantomData<V>,
}

// SAFETY: The table owns its buckets and values exclusively, like a `Vec`.
unsafe impl<V, P, C, A> Send for HashTable<V, P, C, A>
where
    V: Send,
    P: GrowthPolicy + Send,
    C: HashCache,
    A: BucketAllocator + Send,
{
}

// SAFETY: Shared access only hands out shared references to values.
unsafe impl<V, P, C, A> Sync for HashTable<V, P, C, A>
where
    V: Sync,
    P: GrowthPolicy + Sync,
    C: HashCache,
    A: BucketAllocator + Sync,
{
}

impl<V, P, C, A> Debug for HashTable<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        if self.bucket_count() == 0 {
            return f
                .debug_struct("HashTable")
                .field("distances", &"unallocated")
                .field("populated", &self.populated)
                .field("capacity", &self.load_threshold)
                .finish();
        }

        f.debug_struct("HashTable")
            .field(
                "distances",
                &self
                    .buckets()
                    .chunks(16)
                    .map(|chunk| {
                        chunk
                            .iter()
                            .map(|b| {
                                if b.is_empty() {
                                    "..".to_string()
                                } else {
                                    format!("{:02}", b.dist)
                                }
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .collect::<Vec<String>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.load_threshold)
            .field("bucket_count", &self.bucket_count())
            .finish()
    }
}

impl<V, P, C, A> Clone for HashTable<V, P, C, A>
where
    V: Clone,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator + Clone,
{
    fn clone(&self) -> Self {
        let alloc = self.alloc.clone();
        let buckets = infallible(Self::allocate_buckets(
            &alloc,
            self.bucket_count(),
            Fallibility::Infallible,
        ));
        let mut new_table = Self {
            buckets,
            policy: self.policy.clone(),
            alloc,
            populated: 0,
            load_threshold: self.load_threshold,
            max_load_factor: self.max_load_factor,
            min_load_factor: self.min_load_factor,
            grow_on_next_insert: self.grow_on_next_insert,
            try_shrink_on_next_insert: self.try_shrink_on_next_insert,
            _phantom: PhantomData,
        };

        // Buckets are cloned in place so distances stay valid. If a clone
        // panics, `new_table` only drops what was already written.
        for (index, src) in self.buckets().iter().enumerate() {
            if src.is_empty() {
                continue;
            }
            // SAFETY: `src` is occupied.
            let value = unsafe { src.value() }.clone();
            new_table.buckets_mut()[index].fill(src.dist, src.hash, value);
            new_table.populated += 1;
        }

        new_table
    }
}

impl<V, P, C, A> Drop for HashTable<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn drop(&mut self) {
        self.drop_values();

        let bucket_count = self.bucket_count();
        if bucket_count != 0 {
            // SAFETY: The array was allocated from `self.alloc` with this
            // layout, which was valid then and depends only on the count.
            unsafe {
                let layout = Layout::array::<Bucket<V, C>>(bucket_count).unwrap_unchecked();
                self.alloc.deallocate(self.buckets.cast(), layout);
            }
        }
    }
}

impl<V, P, C> HashTable<V, P, C, Global>
where
    P: GrowthPolicy,
    C: HashCache,
{
    /// Creates an empty table. No memory is allocated until the first
    /// insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.bucket_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a table that can hold at least `capacity` elements without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Creates a table with at least `bucket_count` buckets, rounded up by
    /// the growth policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::with_bucket_count(10);
    /// assert_eq!(table.bucket_count(), 16);
    /// ```
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_bucket_count_in(bucket_count, Global)
    }
}

impl<V, P, C> Default for HashTable<V, P, C, Global>
where
    P: GrowthPolicy,
    C: HashCache,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, P, C, A> HashTable<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Creates an empty table backed by `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_bucket_count_in(0, alloc)
    }

    /// Creates a table backed by `alloc` that can hold at least `capacity`
    /// elements without growing.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        infallible(Self::with_capacity_fallible(
            capacity,
            alloc,
            Fallibility::Infallible,
        ))
    }

    /// Fallible version of [`with_capacity_in`](Self::with_capacity_in).
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, TryReserveError> {
        Self::with_capacity_fallible(capacity, alloc, Fallibility::Fallible)
    }

    /// Creates a table backed by `alloc` with at least `bucket_count`
    /// buckets.
    pub fn with_bucket_count_in(bucket_count: usize, alloc: A) -> Self {
        infallible(Self::with_bucket_count_fallible(
            bucket_count,
            alloc,
            Fallibility::Infallible,
        ))
    }

    /// Fallible version of
    /// [`with_bucket_count_in`](Self::with_bucket_count_in).
    pub fn try_with_bucket_count_in(bucket_count: usize, alloc: A) -> Result<Self, TryReserveError> {
        Self::with_bucket_count_fallible(bucket_count, alloc, Fallibility::Fallible)
    }

    fn with_capacity_fallible(
        capacity: usize,
        alloc: A,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        let bucket_count = buckets_for(capacity, DEFAULT_MAX_LOAD_FACTOR);
        Self::with_bucket_count_fallible(bucket_count, alloc, fallibility)
    }

    fn with_bucket_count_fallible(
        bucket_count: usize,
        alloc: A,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        let policy = P::new(bucket_count).map_err(|e| fallibility.reraise(e))?;
        let buckets = Self::allocate_buckets(&alloc, policy.bucket_count(), fallibility)?;
        Ok(Self {
            buckets,
            load_threshold: threshold_for(policy.bucket_count(), DEFAULT_MAX_LOAD_FACTOR),
            policy,
            alloc,
            populated: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            min_load_factor: 0.0,
            grow_on_next_insert: false,
            try_shrink_on_next_insert: false,
            _phantom: PhantomData,
        })
    }

    /// Allocates `bucket_count` empty buckets. A count of zero allocates
    /// nothing.
    fn allocate_buckets(
        alloc: &A,
        bucket_count: usize,
        fallibility: Fallibility,
    ) -> Result<NonNull<Bucket<V, C>>, TryReserveError> {
        if bucket_count == 0 {
            return Ok(NonNull::dangling());
        }

        let layout = Layout::array::<Bucket<V, C>>(bucket_count)
            .map_err(|_| fallibility.capacity_overflow())?;
        let raw = alloc
            .allocate(layout)
            .map_err(|_| fallibility.alloc_err(layout))?;
        let buckets: NonNull<Bucket<V, C>> = raw.cast();

        for index in 0..bucket_count {
            // SAFETY: `index` is within the freshly allocated array.
            unsafe { buckets.add(index).write(Bucket::empty()) };
        }

        Ok(buckets)
    }

    #[inline(always)]
    fn buckets(&self) -> &[Bucket<V, C>] {
        // SAFETY: `buckets` points at `bucket_count` initialized buckets, or
        // dangles with a count of zero.
        unsafe { core::slice::from_raw_parts(self.buckets.as_ptr(), self.policy.bucket_count()) }
    }

    #[inline(always)]
    fn buckets_mut(&mut self) -> &mut [Bucket<V, C>] {
        // SAFETY: As in `buckets`, and `&mut self` guarantees exclusivity.
        unsafe {
            core::slice::from_raw_parts_mut(self.buckets.as_ptr(), self.policy.bucket_count())
        }
    }

    #[inline(always)]
    fn next_bucket(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.policy.bucket_count() {
            0
        } else {
            next
        }
    }

    fn drop_values(&mut self) {
        if core::mem::needs_drop::<V>() && self.populated > 0 {
            for bucket in self.buckets_mut() {
                if !bucket.is_empty() {
                    bucket.dist = EMPTY;
                    // SAFETY: The bucket was occupied and is now marked empty.
                    unsafe { bucket.value.assume_init_drop() };
                }
            }
        } else {
            for bucket in self.buckets_mut() {
                bucket.dist = EMPTY;
            }
        }
        self.populated = 0;
    }

    /// Returns a reference to the table's allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns `true` if the table contains no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::with_capacity(10);
    /// assert!(table.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of buckets in the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.policy.bucket_count()
    }

    /// Returns the largest bucket count the growth policy supports.
    pub fn max_bucket_count(&self) -> usize {
        P::max_bucket_count()
    }

    /// Returns the number of elements the table can hold before it grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::with_bucket_count(64);
    /// // 64 buckets at the default maximum load factor of 0.95.
    /// assert_eq!(table.capacity(), 60);
    /// ```
    pub fn capacity(&self) -> usize {
        self.load_threshold
    }

    /// Returns `len / bucket_count`, or zero for an unallocated table.
    pub fn load_factor(&self) -> f32 {
        if self.bucket_count() == 0 {
            0.0
        } else {
            self.populated as f32 / self.bucket_count() as f32
        }
    }

    /// Returns the load factor past which insertions grow the table.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Sets the maximum load factor, clamped to `[0.2, 0.95]`.
    ///
    /// The table is not rehashed immediately; the new threshold applies to
    /// the next insertion.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.max_load_factor = max_load_factor.clamp(MAX_LOAD_FACTOR_RANGE.0, MAX_LOAD_FACTOR_RANGE.1);
        self.load_threshold = threshold_for(self.bucket_count(), self.max_load_factor);
    }

    /// Returns the load factor under which the first insertion following a
    /// removal shrinks the table. Zero disables shrinking.
    pub fn min_load_factor(&self) -> f32 {
        self.min_load_factor
    }

    /// Sets the minimum load factor, clamped to `[0.0, 0.15]`.
    pub fn set_min_load_factor(&mut self, min_load_factor: f32) {
        self.min_load_factor = min_load_factor.clamp(0.0, MIN_LOAD_FACTOR_MAX);
    }

    /// Returns an iterator over all values in the table.
    ///
    /// The iterator yields `&V` references in bucket order, which is
    /// unrelated to insertion order.
    pub fn iter(&self) -> Iter<'_, V, C> {
        Iter {
            inner: self.buckets().iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over mutable references to all values.
    ///
    /// Values must not be changed in a way that changes their hash.
    pub fn iter_mut(&mut self) -> IterMut<'_, V, C> {
        let remaining = self.populated;
        IterMut {
            inner: self.buckets_mut().iter_mut(),
            remaining,
        }
    }

    /// Returns an iterator that removes and yields all values from the table.
    ///
    /// The table keeps its bucket array. Values not consumed are dropped
    /// when the iterator is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(1, |&v| v == 1, |&v| v).or_insert(1);
    /// table.entry(2, |&v| v == 2, |&v| v).or_insert(2);
    ///
    /// let mut values: Vec<u64> = table.drain().collect();
    /// values.sort();
    /// assert_eq!(values, [1, 2]);
    /// assert!(table.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V, P, C, A> {
        Drain {
            table: self,
            bucket_index: 0,
        }
    }

    /// Removes all elements, keeping the bucket array.
    pub fn clear(&mut self) {
        self.drop_values();
        self.grow_on_next_insert = false;
        self.try_shrink_on_next_insert = false;
    }

    /// Finds the bucket index holding the value matching `hash` and `eq`.
    ///
    /// The walk starts at the ideal bucket of `hash` and stops on the first
    /// bucket whose resident is closer to its own ideal bucket than the walk
    /// is to the start, which proves the value absent.
    #[inline]
    pub fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        let fragment = C::fragment(hash);
        let buckets = self.buckets();
        let mut index = self.policy.bucket_for_hash(hash);
        let mut dist = 0;
        loop {
            // SAFETY: The policy maps into `0..bucket_count` and `next_bucket`
            // wraps within it.
            let bucket = unsafe { buckets.get_unchecked(index) };
            if dist > bucket.dist {
                return None;
            }
            // SAFETY: `dist <= bucket.dist` implies `bucket.dist >= 0`.
            if bucket.hash == fragment && eq(unsafe { bucket.value() }) {
                return Some(index);
            }

            index = self.next_bucket(index);
            dist += 1;
        }
    }

    /// Finds a value in the table by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(42, |&n| n == 42, |&n| n).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(99, |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns occupied buckets.
        Some(unsafe { self.buckets().get_unchecked(index).value() })
    }

    /// Finds a value in the table by hash and equality predicate, returning a
    /// mutable reference.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns occupied buckets.
        Some(unsafe { self.buckets_mut().get_unchecked_mut(index).value_mut() })
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If inserting one more element would exceed the load threshold, or a
    /// previous insertion displaced an element too far, the table grows
    /// before the lookup; `hasher` recomputes the hashes of the elements it
    /// moves.
    ///
    /// # Panics
    ///
    /// Panics if the growth policy cannot grow any further, and aborts
    /// through [`handle_alloc_error`](alloc::alloc::handle_alloc_error) if
    /// the allocator fails. Use [`try_entry`](Self::try_entry) to handle
    /// both.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::hash_table::Entry;
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<(u64, &str)> = HashTable::new();
    ///
    /// match table.entry(7, |&(k, _)| k == 7, |&(k, _)| k) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((7, "seven"));
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         entry.get_mut().1 = "updated";
    ///     }
    /// }
    /// assert_eq!(table.find(7, |&(k, _)| k == 7), Some(&(7, "seven")));
    /// ```
    #[inline]
    pub fn entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Entry<'_, V, P, C, A> {
        infallible(self.entry_impl(hash, eq, hasher, Fallibility::Infallible))
    }

    /// Fallible version of [`entry`](Self::entry): growth failures are
    /// returned instead of panicking, and leave the table unchanged.
    #[inline]
    pub fn try_entry(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<Entry<'_, V, P, C, A>, TryReserveError> {
        self.entry_impl(hash, eq, hasher, Fallibility::Fallible)
    }

    #[inline]
    fn entry_impl(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
        fallibility: Fallibility,
    ) -> Result<Entry<'_, V, P, C, A>, TryReserveError> {
        self.reserve_for_insert(&hasher, fallibility)?;

        let fragment = C::fragment(hash);
        let mut index = self.policy.bucket_for_hash(hash);
        let mut dist = 0;
        loop {
            let bucket = &self.buckets()[index];
            if dist > bucket.dist {
                break;
            }
            // SAFETY: `dist <= bucket.dist` implies the bucket is occupied.
            if bucket.hash == fragment && eq(unsafe { bucket.value() }) {
                return Ok(Entry::Occupied(OccupiedEntry { table: self, index }));
            }

            index = self.next_bucket(index);
            dist += 1;
        }

        Ok(Entry::Vacant(VacantEntry {
            table: self,
            hash,
            index,
            dist,
        }))
    }

    /// Makes room for one more element: grows when the load threshold is
    /// reached or an element was displaced past
    /// [`DIST_FROM_IDEAL_BUCKET_LIMIT`], and shrinks when a removal dropped
    /// the load factor below the minimum.
    fn reserve_for_insert(
        &mut self,
        hasher: &impl Fn(&V) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        if self.grow_on_next_insert || self.populated >= self.load_threshold {
            let next = self
                .policy
                .next_bucket_count()
                .map_err(|e| fallibility.reraise(e))?;
            let target = next.max(buckets_for(self.populated + 1, self.max_load_factor));
            let policy = P::new(target).map_err(|e| fallibility.reraise(e))?;
            self.resize(policy, hasher, fallibility)?;
            self.grow_on_next_insert = false;
            return Ok(());
        }

        if self.try_shrink_on_next_insert {
            self.try_shrink_on_next_insert = false;
            if self.min_load_factor != 0.0 && self.load_factor() < self.min_load_factor {
                let target = buckets_for(self.populated + 1, self.max_load_factor);
                self.rehash_impl(target, hasher, fallibility)?;
            }
        }

        Ok(())
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// Following elements displaced from their ideal buckets are shifted
    /// back by one bucket, so no tombstone is left behind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(42, |&n| n == 42, |&n| n).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(42, |&n| n == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_at(index))
    }

    /// Removes the element at the occupied bucket `index` with backward-shift
    /// deletion.
    fn remove_at(&mut self, index: usize) -> V {
        let buckets = self.buckets_mut();
        // SAFETY: Callers only pass occupied buckets.
        let (_, _, value) = unsafe { buckets[index].take() };

        let mut hole = index;
        let mut next = self.next_bucket(index);
        loop {
            let buckets = self.buckets_mut();
            if buckets[next].dist <= 0 {
                break;
            }
            // SAFETY: `dist > 0` implies the bucket is occupied.
            let (dist, hash, moved) = unsafe { buckets[next].take() };
            buckets[hole].fill(dist - 1, hash, moved);

            hole = next;
            next = self.next_bucket(next);
        }

        self.populated -= 1;
        self.try_shrink_on_next_insert = true;
        value
    }

    /// Retains only the elements for which `f` returns `true`.
    ///
    /// `f` is called exactly once per element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// for i in 0..10 {
    ///     table.entry(i, |&n| n == i, |&n| n).or_insert(i);
    /// }
    /// table.retain(|n| *n % 2 == 0);
    /// assert_eq!(table.len(), 5);
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&mut V) -> bool) {
        let total = self.populated;
        let mut visited = 0;
        let mut index = 0;

        // A removal shifts later elements back by one, so the current index
        // is revisited. A shift chain that wraps around can carry the element
        // from bucket 0 into the last bucket; by then every element has been
        // visited and the count stops the walk.
        while index < self.bucket_count() && visited < total {
            let bucket = &mut self.buckets_mut()[index];
            if bucket.is_empty() {
                index += 1;
                continue;
            }

            visited += 1;
            // SAFETY: The bucket is occupied.
            if f(unsafe { bucket.value_mut() }) {
                index += 1;
            } else {
                drop(self.remove_at(index));
            }
        }
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// Does nothing if the current capacity is already sufficient.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(50, |&n| n);
    /// assert!(table.capacity() >= 50);
    /// ```
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&V) -> u64) {
        infallible(self.reserve_impl(additional, &hasher, Fallibility::Infallible));
    }

    /// Fallible version of [`reserve`](Self::reserve). On error the table is
    /// unchanged.
    pub fn try_reserve(
        &mut self,
        additional: usize,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<(), TryReserveError> {
        self.reserve_impl(additional, &hasher, Fallibility::Fallible)
    }

    fn reserve_impl(
        &mut self,
        additional: usize,
        hasher: &impl Fn(&V) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        if required <= self.load_threshold {
            return Ok(());
        }
        self.rehash_impl(buckets_for(required, self.max_load_factor), hasher, fallibility)
    }

    /// Rehashes into at least `bucket_count` buckets, and at least enough
    /// buckets for the current elements under the maximum load factor.
    ///
    /// Does nothing if the resulting bucket count equals the current one.
    /// `rehash(0, ..)` shrinks the table as far as possible.
    pub fn rehash(&mut self, bucket_count: usize, hasher: impl Fn(&V) -> u64) {
        infallible(self.rehash_impl(bucket_count, &hasher, Fallibility::Infallible));
    }

    /// Fallible version of [`rehash`](Self::rehash). On error the table is
    /// unchanged.
    pub fn try_rehash(
        &mut self,
        bucket_count: usize,
        hasher: impl Fn(&V) -> u64,
    ) -> Result<(), TryReserveError> {
        self.rehash_impl(bucket_count, &hasher, Fallibility::Fallible)
    }

    /// Shrinks the bucket array as much as the current elements allow.
    ///
    /// An empty table releases its bucket array entirely.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(1000);
    /// table.entry(5, |&v| v == 5, |&v| v).or_insert(5);
    /// table.shrink_to_fit(|&v| v);
    /// assert!(table.capacity() < 1000);
    /// assert!(table.capacity() >= 1);
    /// ```
    pub fn shrink_to_fit(&mut self, hasher: impl Fn(&V) -> u64) {
        infallible(self.rehash_impl(0, &hasher, Fallibility::Infallible));
    }

    fn rehash_impl(
        &mut self,
        bucket_count: usize,
        hasher: &impl Fn(&V) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let target = bucket_count.max(buckets_for(self.populated, self.max_load_factor));
        let policy = P::new(target).map_err(|e| fallibility.reraise(e))?;
        if policy.bucket_count() == self.bucket_count() {
            return Ok(());
        }
        self.resize(policy, hasher, fallibility)
    }

    /// Moves every element into a new bucket array sized by `policy`.
    ///
    /// The new array is allocated before anything moves, so an allocation
    /// failure leaves the table untouched.
    #[cold]
    #[inline(never)]
    fn resize(
        &mut self,
        policy: P,
        hasher: &impl Fn(&V) -> u64,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let new_count = policy.bucket_count();
        debug_assert!(new_count > self.populated || (new_count == 0 && self.populated == 0));

        let new_buckets = Self::allocate_buckets(&self.alloc, new_count, fallibility)?;
        let old_buckets = core::mem::replace(&mut self.buckets, new_buckets);
        let old_count = self.policy.bucket_count();
        self.policy = policy;
        self.load_threshold = threshold_for(new_count, self.max_load_factor);

        let remaining = core::mem::replace(&mut self.populated, 0);
        let use_fragment = C::ENABLED && P::rehash_from_fragment(new_count);

        // Ownership note: each value is moved out of the old array right
        // after its hash is known. If `hasher` panics, the values still in the
        // old array are leaked together with the array itself; the table only
        // owns what was already moved.
        let mut moved = 0;
        for index in 0..old_count {
            if moved == remaining {
                break;
            }
            // SAFETY: `index` is within the old array, which stays allocated
            // until the end of this function.
            let bucket = unsafe { &mut *old_buckets.as_ptr().add(index) };
            if bucket.is_empty() {
                continue;
            }

            let hash = if use_fragment {
                C::widen(bucket.hash)
            } else {
                // SAFETY: The bucket is occupied.
                hasher(unsafe { bucket.value() })
            };
            // SAFETY: The bucket is occupied.
            let (_, _, value) = unsafe { bucket.take() };
            self.insert_on_rehash(hash, value);
            moved += 1;
        }

        if old_count != 0 {
            // SAFETY: The old array was allocated from `self.alloc` with this
            // layout and all of its values have been moved out.
            unsafe {
                let layout = Layout::array::<Bucket<V, C>>(old_count).unwrap_unchecked();
                self.alloc.deallocate(old_buckets.cast(), layout);
            }
        }

        Ok(())
    }

    /// Places a value known to be absent, displacing richer residents.
    fn insert_on_rehash(&mut self, hash: u64, value: V) {
        let mut fragment = C::fragment(hash);
        let mut value = value;
        let mut index = self.policy.bucket_for_hash(hash);
        let mut dist = 0;
        loop {
            let bucket = &mut self.buckets_mut()[index];
            if dist > bucket.dist {
                if bucket.is_empty() {
                    bucket.fill(dist, fragment, value);
                    self.populated += 1;
                    return;
                }
                // SAFETY: The bucket is occupied.
                unsafe { bucket.swap(&mut dist, &mut fragment, &mut value) };
            }

            dist += 1;
            index = self.next_bucket(index);
        }
    }

    /// Swaps the carried element into the occupied bucket `index` and
    /// carries the resident forward until an empty bucket takes it.
    ///
    /// A resident is only displaced by a carried element strictly farther
    /// from its ideal bucket; on equal distances the resident stays.
    ///
    /// Returns the distance of the element placed in the empty bucket.
    fn insert_displacing(&mut self, index: usize, dist: i32, hash: C::Fragment, value: V) -> i32 {
        let mut dist = dist;
        let mut fragment = hash;
        let mut value = value;

        // SAFETY: Callers only pass occupied buckets.
        unsafe { self.buckets_mut()[index].swap(&mut dist, &mut fragment, &mut value) };
        let mut index = self.next_bucket(index);
        dist += 1;

        loop {
            let bucket = &mut self.buckets_mut()[index];
            if bucket.is_empty() {
                bucket.fill(dist, fragment, value);
                break;
            }
            if dist > bucket.dist {
                // SAFETY: The bucket is occupied.
                unsafe { bucket.swap(&mut dist, &mut fragment, &mut value) };
            }

            index = self.next_bucket(index);
            dist += 1;
        }

        dist
    }

    /// Flags growth for the next insertion when an element landed past
    /// [`DIST_FROM_IDEAL_BUCKET_LIMIT`] in a table that is not mostly empty.
    fn note_probe_distance(&mut self, dist: i32) {
        if dist > DIST_FROM_IDEAL_BUCKET_LIMIT
            && self.load_factor() >= LONG_PROBE_GROWTH_MIN_LOAD_FACTOR
        {
            self.grow_on_next_insert = true;
        }
    }

    /// Computes a histogram of distances from the ideal bucket.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut counts = Vec::new();
        for bucket in self.buckets() {
            if bucket.is_empty() {
                continue;
            }
            let dist = bucket.dist as usize;
            if counts.len() <= dist {
                counts.resize(dist + 1, 0);
            }
            counts[dist] += 1;
        }
        ProbeHistogram { counts }
    }

    /// Returns detailed performance and utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mut max_probe_distance = 0;
        let mut total_distance = 0usize;
        for bucket in self.buckets() {
            if !bucket.is_empty() {
                max_probe_distance = max_probe_distance.max(bucket.dist as usize);
                total_distance += bucket.dist as usize;
            }
        }

        let bucket_count = self.bucket_count();
        DebugStats {
            populated: self.populated,
            capacity: self.load_threshold,
            bucket_count,
            load_factor: self.load_factor() as f64,
            max_probe_distance,
            mean_probe_distance: if self.populated == 0 {
                0.0
            } else {
                total_distance as f64 / self.populated as f64
            },
            total_bytes: bucket_count * core::mem::size_of::<Bucket<V, C>>(),
            wasted_bytes: (bucket_count - self.populated) * core::mem::size_of::<Bucket<V, C>>(),
        }
    }

    /// Returns the distance from its ideal bucket of the element in bucket
    /// `index`, or `None` for an empty bucket.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_distance_at(&self, index: usize) -> Option<usize> {
        let bucket = self.buckets().get(index)?;
        (!bucket.is_empty()).then_some(bucket.dist as usize)
    }

    /// Counts the buckets a lookup for `hash` and `eq` inspects, including
    /// the one that ends the walk.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_length(&self, hash: u64, eq: impl Fn(&V) -> bool) -> usize {
        if self.populated == 0 {
            return 0;
        }

        let fragment = C::fragment(hash);
        let mut index = self.policy.bucket_for_hash(hash);
        let mut dist = 0;
        let mut probes = 0;
        loop {
            let bucket = &self.buckets()[index];
            probes += 1;
            if dist > bucket.dist {
                return probes;
            }
            // SAFETY: `dist <= bucket.dist` implies the bucket is occupied.
            if bucket.hash == fragment && eq(unsafe { bucket.value() }) {
                return probes;
            }
            index = self.next_bucket(index);
            dist += 1;
        }
    }

    /// Checks the structural invariants of the table, panicking with a
    /// description of the first violation.
    ///
    /// - every occupied bucket's distance equals its displacement from the
    ///   ideal bucket of its hash;
    /// - no element is more than one bucket farther from its ideal bucket
    ///   than the element before it (otherwise the two would have been
    ///   swapped);
    /// - cached hash fragments match the hash;
    /// - the element count matches the occupied buckets, and at least one
    ///   bucket is empty.
    #[cfg(any(test, feature = "stats"))]
    pub fn check_invariants(&self, hasher: impl Fn(&V) -> u64) {
        let bucket_count = self.bucket_count();
        let buckets = self.buckets();
        let mut occupied = 0;

        for (index, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                assert_eq!(bucket.dist, EMPTY, "bucket {index} has a bad empty marker");
                continue;
            }
            occupied += 1;

            // SAFETY: The bucket is occupied.
            let hash = hasher(unsafe { bucket.value() });
            assert_eq!(
                bucket.hash,
                C::fragment(hash),
                "bucket {index} caches a stale hash"
            );

            let ideal = self.policy.bucket_for_hash(hash);
            let displacement = (index + bucket_count - ideal) % bucket_count;
            assert_eq!(
                bucket.dist as usize, displacement,
                "bucket {index} records distance {} but sits {displacement} past its ideal \
                 bucket {ideal}",
                bucket.dist
            );

            let previous = &buckets[(index + bucket_count - 1) % bucket_count];
            assert!(
                bucket.dist <= previous.dist + 1,
                "bucket {index} (distance {}) follows a bucket with distance {}",
                bucket.dist,
                previous.dist
            );
        }

        assert_eq!(occupied, self.populated, "element count mismatch");
        assert!(
            bucket_count == 0 || self.populated < bucket_count,
            "no empty bucket left to end probe walks"
        );
    }
}

/// Number of buckets needed to hold `len` elements under `max_load_factor`.
fn buckets_for(len: usize, max_load_factor: f32) -> usize {
    if len == 0 {
        return 0;
    }
    let mut count = (len as f64 / max_load_factor as f64).ceil() as usize;
    if threshold_for(count, max_load_factor) < len {
        count = count.saturating_add(1);
    }
    count
}

/// Number of elements `bucket_count` buckets hold before growing. Always
/// leaves at least one bucket empty so every probe walk terminates.
fn threshold_for(bucket_count: usize, max_load_factor: f32) -> usize {
    let threshold = (bucket_count as f64 * max_load_factor as f64) as usize;
    threshold.min(bucket_count.saturating_sub(1))
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// A vacant entry - no matching value is present in the table
    Vacant(VacantEntry<'a, V, P, C, A>),
    /// An occupied entry - a matching value is present in the table
    Occupied(OccupiedEntry<'a, V, P, C, A>),
}

impl<'a, V, P, C, A> Entry<'a, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry. `default` is not called
    /// for an occupied entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry and returns a reference to the
    /// value; returns `None` without inserting for a vacant entry.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// Holds the bucket where the lookup stopped: either empty, or occupied by a
/// resident closer to its ideal bucket than the new value would be.
pub struct VacantEntry<'a, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: &'a mut HashTable<V, P, C, A>,
    hash: u64,
    index: usize,
    dist: i32,
}

impl<'a, V, P, C, A> VacantEntry<'a, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Returns the hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts a value into the vacant entry and returns a mutable reference
    /// to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let fragment = C::fragment(self.hash);
        let table = self.table;

        let carried = if table.buckets()[self.index].is_empty() {
            table.buckets_mut()[self.index].fill(self.dist, fragment, value);
            self.dist
        } else {
            table.insert_displacing(self.index, self.dist, fragment, value)
        };
        table.populated += 1;
        table.note_probe_distance(self.dist.max(carried));

        // SAFETY: The bucket was just filled with the new value, which no
        // displacement moves.
        unsafe { table.buckets_mut()[self.index].value_mut() }
    }
}

/// A view into an occupied entry in the hash table.
pub struct OccupiedEntry<'a, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: &'a mut HashTable<V, P, C, A>,
    index: usize,
}

impl<'a, V, P, C, A> OccupiedEntry<'a, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        // SAFETY: The entry's bucket is occupied.
        unsafe { self.table.buckets()[self.index].value() }
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: The entry's bucket is occupied.
        unsafe { self.table.buckets_mut()[self.index].value_mut() }
    }

    /// Converts the entry into a mutable reference to the value with the
    /// lifetime of the entry.
    pub fn into_mut(self) -> &'a mut V {
        // SAFETY: The entry's bucket is occupied.
        unsafe { self.table.buckets_mut()[self.index].value_mut() }
    }

    /// Returns the index of the bucket holding the value.
    pub fn bucket_index(&self) -> usize {
        self.index
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V, C: HashCache = NoStoreHash> {
    inner: core::slice::Iter<'a, Bucket<V, C>>,
    remaining: usize,
}

impl<V, C: HashCache> Clone for Iter<'_, V, C> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V, C: HashCache> Iterator for Iter<'a, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let bucket = self.inner.next()?;
            if !bucket.is_empty() {
                self.remaining -= 1;
                // SAFETY: The bucket is occupied.
                return Some(unsafe { bucket.value() });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, C: HashCache> ExactSizeIterator for Iter<'_, V, C> {}

impl<V, C: HashCache> core::iter::FusedIterator for Iter<'_, V, C> {}

/// A mutable iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, V, C: HashCache = NoStoreHash> {
    inner: core::slice::IterMut<'a, Bucket<V, C>>,
    remaining: usize,
}

impl<'a, V, C: HashCache> Iterator for IterMut<'a, V, C> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let bucket = self.inner.next()?;
            if !bucket.is_empty() {
                self.remaining -= 1;
                // SAFETY: The bucket is occupied.
                return Some(unsafe { bucket.value_mut() });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, C: HashCache> ExactSizeIterator for IterMut<'_, V, C> {}

impl<V, C: HashCache> core::iter::FusedIterator for IterMut<'_, V, C> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: &'a mut HashTable<V, P, C, A>,
    bucket_index: usize,
}

impl<V, P, C, A> Drop for Drain<'_, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn drop(&mut self) {
        for _ in &mut *self {}

        self.table.grow_on_next_insert = false;
        self.table.try_shrink_on_next_insert = false;
    }
}

impl<V, P, C, A> Iterator for Drain<'_, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        take_next(self.table, &mut self.bucket_index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<V, P, C, A> ExactSizeIterator for Drain<'_, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: HashTable<V, P, C, A>,
    bucket_index: usize,
}

impl<V, P, C, A> Iterator for IntoIter<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        take_next(&mut self.table, &mut self.bucket_index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<V, P, C, A> ExactSizeIterator for IntoIter<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
}

impl<V, P, C, A> IntoIterator for HashTable<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = IntoIter<V, P, C, A>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            table: self,
            bucket_index: 0,
        }
    }
}

impl<'a, V, P, C, A> IntoIterator for &'a HashTable<V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = Iter<'a, V, C>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Moves the next element at or after `*bucket_index` out of the table.
///
/// Buckets are emptied without shifting: the walk only moves forward and
/// the table ends up empty.
fn take_next<V, P, C, A>(table: &mut HashTable<V, P, C, A>, bucket_index: &mut usize) -> Option<V>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    if table.populated == 0 {
        return None;
    }

    let bucket_count = table.bucket_count();
    while *bucket_index < bucket_count {
        let bucket = &mut table.buckets_mut()[*bucket_index];
        *bucket_index += 1;
        if !bucket.is_empty() {
            // SAFETY: The bucket is occupied.
            let (_, _, value) = unsafe { bucket.take() };
            table.populated -= 1;
            return Some(value);
        }
    }

    None
}
