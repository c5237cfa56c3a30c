use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::allocator::BucketAllocator;
use crate::allocator::Global;
use crate::error::TryReserveError;
use crate::growth_policy::GrowthPolicy;
use crate::growth_policy::PowerOfTwoGrowthPolicy;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashCache;
use crate::hash_table::HashTable;
use crate::hash_table::NoStoreHash;
use crate::select::SetSelect;
use crate::select::equivalent_key;
use crate::select::make_hasher;

/// A hash set backed by the robin-hood [`HashTable`].
///
/// `HashSet<T, S>` stores values of type `T` where `T` implements `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash values. The remaining
/// type parameters are forwarded to the table, as for
/// [`HashMap`](crate::HashMap).
///
/// # Performance Characteristics
///
/// - **Memory**: a 4-byte probe distance per bucket (8 with
///   [`StoreHash`](crate::StoreHash)), plus the size of `T`.
#[derive(Clone)]
pub struct HashSet<T, S = DefaultHashBuilder, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: HashTable<T, P, C, A>,
    hash_builder: S,
}

impl<T, S, P, C, A> PartialEq for HashSet<T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S, P, C, A> Eq for HashSet<T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
}

impl<T, S, P, C, A> Debug for HashSet<T, S, P, C, A>
where
    T: Debug,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, P, C> HashSet<T, S, P, C, Global>
where
    P: GrowthPolicy,
    C: HashCache,
{
    /// Creates a new hash set with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use robin_hash::hash_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_hasher(RandomState::new());
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_hasher_in(hash_builder, Global)
    }

    /// Creates a new hash set able to hold `capacity` values without
    /// growing, using the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use robin_hash::hash_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_capacity_and_hasher(100, RandomState::new());
    /// assert!(set.capacity() >= 100);
    /// # }
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_and_hasher_in(capacity, hash_builder, Global)
    }

    /// Creates a new hash set with at least `bucket_count` buckets.
    pub fn with_bucket_count_and_hasher(bucket_count: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_bucket_count(bucket_count),
            hash_builder,
        }
    }
}

impl<T, S, P, C> HashSet<T, S, P, C, Global>
where
    S: Default,
    P: GrowthPolicy,
    C: HashCache,
{
    /// Creates a new hash set using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash set able to hold `capacity` values without
    /// growing, using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::with_capacity(100);
    /// assert!(set.capacity() >= 100);
    /// # }
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S, P, C> Default for HashSet<T, S, P, C, Global>
where
    S: Default,
    P: GrowthPolicy,
    C: HashCache,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, P, C, A> HashSet<T, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Creates a new hash set with the given hasher builder whose bucket
    /// array comes from `alloc`.
    pub fn with_hasher_in(hash_builder: S, alloc: A) -> Self {
        Self {
            table: HashTable::new_in(alloc),
            hash_builder,
        }
    }

    /// Creates a new hash set backed by `alloc`, able to hold `capacity`
    /// values without growing.
    pub fn with_capacity_and_hasher_in(capacity: usize, hash_builder: S, alloc: A) -> Self {
        Self {
            table: HashTable::with_capacity_in(capacity, alloc),
            hash_builder,
        }
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a reference to the allocator backing the bucket array.
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the number of values in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of values the set can hold before it grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the largest bucket count the growth policy supports.
    pub fn max_bucket_count(&self) -> usize {
        self.table.max_bucket_count()
    }

    /// Returns `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the load factor past which insertions grow the set.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Sets the maximum load factor, clamped to `[0.2, 0.95]`.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.table.set_max_load_factor(max_load_factor);
    }

    /// Returns the minimum load factor.
    pub fn min_load_factor(&self) -> f32 {
        self.table.min_load_factor()
    }

    /// Sets the minimum load factor, clamped to `[0.0, 0.15]`.
    pub fn set_min_load_factor(&mut self, min_load_factor: f32) {
        self.table.set_min_load_factor(min_load_factor);
    }

    /// Removes all values from the set.
    ///
    /// This operation preserves the set's bucket array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.clear();
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the values of the set, in arbitrary order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Removes and yields all values, keeping the bucket array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let mut drained: Vec<_> = set.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, [1, 2]);
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T, P, C, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Retains only the values for which `f` returns `true`.
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    /// set.insert(3);
    /// set.insert(4);
    ///
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains(&2));
    /// assert!(set.contains(&4));
    /// # }
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.table.retain(|v| f(v));
    }
}

impl<T, S, P, C, A> HashSet<T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Reserves capacity for at least `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.table
            .reserve(additional, make_hasher::<SetSelect<T>, _>(&self.hash_builder));
    }

    /// Fallible version of [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table
            .try_reserve(additional, make_hasher::<SetSelect<T>, _>(&self.hash_builder))
    }

    /// Rehashes into at least `bucket_count` buckets.
    pub fn rehash(&mut self, bucket_count: usize) {
        self.table
            .rehash(bucket_count, make_hasher::<SetSelect<T>, _>(&self.hash_builder));
    }

    /// Fallible version of [`rehash`](Self::rehash).
    pub fn try_rehash(&mut self, bucket_count: usize) -> Result<(), TryReserveError> {
        self.table
            .try_rehash(bucket_count, make_hasher::<SetSelect<T>, _>(&self.hash_builder))
    }

    /// Shrinks the bucket array as much as the current values allow.
    pub fn shrink_to_fit(&mut self) {
        self.table
            .shrink_to_fit(make_hasher::<SetSelect<T>, _>(&self.hash_builder));
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. An equal value already
    /// present is kept and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert!(set.insert(1));
    /// assert!(!set.insert(1));
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(
            hash,
            equivalent_key::<SetSelect<T>, T>(&value),
            make_hasher::<SetSelect<T>, _>(&self.hash_builder),
        ) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Adds a value to the set, replacing the existing equal value, if any.
    /// Returns the replaced value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.replace(1), None);
    /// assert_eq!(set.replace(1), Some(1));
    /// # }
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(
            hash,
            equivalent_key::<SetSelect<T>, T>(&value),
            make_hasher::<SetSelect<T>, _>(&self.hash_builder),
        ) {
            TableEntry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns `true` if the set contains a value equal to `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<String> = HashSet::new();
    /// set.insert("one".to_string());
    /// assert!(set.contains("one"));
    /// assert!(!set.contains("two"));
    /// # }
    /// ```
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(value).is_some()
    }

    /// Like [`contains`](Self::contains), with a precomputed hash.
    pub fn contains_with_hash<Q>(&self, value: &Q, hash: u64) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table
            .find(hash, equivalent_key::<SetSelect<T>, Q>(value))
            .is_some()
    }

    /// Returns the number of values equal to `value`: zero or one.
    pub fn count<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains(value))
    }

    /// Returns a reference to the stored value equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(value);
        self.table
            .find(hash, equivalent_key::<SetSelect<T>, Q>(value))
    }

    /// Returns the range of elements equal to `value`: the stored element
    /// if present, otherwise nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let set: HashSet<u32> = [1, 2].into_iter().collect();
    /// assert_eq!(set.equal_range(&2).collect::<Vec<_>>(), [&2]);
    /// assert!(set.equal_range(&3).next().is_none());
    /// # }
    /// ```
    pub fn equal_range<Q>(&self, value: &Q) -> core::option::IntoIter<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(value).into_iter()
    }

    /// Removes a value from the set. Returns whether it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(set.remove(&1));
    /// assert!(!set.remove(&1));
    /// # }
    /// ```
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(value).is_some()
    }

    /// Like [`remove`](Self::remove), with a precomputed hash.
    pub fn remove_with_hash<Q>(&mut self, value: &Q, hash: u64) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table
            .remove(hash, equivalent_key::<SetSelect<T>, Q>(value))
            .is_some()
    }

    /// Removes and returns the stored value equal to `value`, if any.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(value);
        self.table
            .remove(hash, equivalent_key::<SetSelect<T>, Q>(value))
    }

    /// Returns `true` if `self` has no values in common with `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let b: HashSet<i32> = [4, 5].into_iter().collect();
    /// assert!(a.is_disjoint(&b));
    /// # }
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| !large.contains(v))
    }

    /// Returns `true` if every value of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every value of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Visits the values in `self` or `other`, without duplicates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2].into_iter().collect();
    /// let b: HashSet<i32> = [2, 3].into_iter().collect();
    /// let mut union: Vec<_> = a.union(&b).copied().collect();
    /// union.sort();
    /// assert_eq!(union, [1, 2, 3]);
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, T, S, P, C, A> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            other_set: self,
        }
    }

    /// Visits the values in both `self` and `other`.
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, T, S, P, C, A> {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        Intersection {
            iter: small.iter(),
            other: large,
        }
    }

    /// Visits the values in `self` but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, T, S, P, C, A> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Visits the values in exactly one of `self` and `other`.
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a Self,
    ) -> SymmetricDifference<'a, T, S, P, C, A> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }

    /// Checks the table's structural invariants, panicking on the first
    /// violation.
    #[cfg(any(test, feature = "stats"))]
    pub fn check_invariants(&self) {
        self.table
            .check_invariants(make_hasher::<SetSelect<T>, _>(&self.hash_builder));
    }

    /// Returns the underlying table, for statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn raw_table(&self) -> &HashTable<T, P, C, A> {
        &self.table
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::Iter<'a, T, C>,
}

impl<T, C: HashCache> Clone for Iter<'_, T, C> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T, C: HashCache> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, C: HashCache> ExactSizeIterator for Iter<'_, T, C> {}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    inner: crate::hash_table::Drain<'a, T, P, C, A>,
}

impl<T, P, C, A> Iterator for Drain<'_, T, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A consuming iterator over the values of a `HashSet`.
pub struct IntoIter<T, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    inner: crate::hash_table::IntoIter<T, P, C, A>,
}

impl<T, P, C, A> Iterator for IntoIter<T, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, S, P, C, A> IntoIterator for HashSet<T, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = IntoIter<T, P, C, A>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S, P, C, A> IntoIterator for &'a HashSet<T, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = Iter<'a, T, C>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S, P, C> FromIterator<T> for HashSet<T, S, P, C, Global>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    P: GrowthPolicy,
    C: HashCache,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.extend(iter);
        set
    }
}

impl<T, S, P, C, A> Extend<T> for HashSet<T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let additional = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(additional);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S, P, C, A> Extend<&'a T> for HashSet<T, S, P, C, A>
where
    T: Hash + Eq + Copy,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    iter: Iter<'a, T, C>,
    other_iter: Iter<'a, T, C>,
    other_set: &'a HashSet<T, S, P, C, A>,
}

impl<'a, T, S, P, C, A> Iterator for Union<'a, T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.other_set.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    iter: Iter<'a, T, C>,
    other: &'a HashSet<T, S, P, C, A>,
}

impl<'a, T, S, P, C, A> Iterator for Intersection<'a, T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    iter: Iter<'a, T, C>,
    other: &'a HashSet<T, S, P, C, A>,
}

impl<'a, T, S, P, C, A> Iterator for Difference<'a, T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<'a, T, S, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    iter: core::iter::Chain<Difference<'a, T, S, P, C, A>, Difference<'a, T, S, P, C, A>>,
}

impl<'a, T, S, P, C, A> Iterator for SymmetricDifference<'a, T, S, P, C, A>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::growth_policy::PrimeGrowthPolicy;
    use crate::hash_table::StoreHash;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type SipSet<T> = HashSet<T, SipHashBuilder>;

    fn sorted<T: Ord + Clone>(values: impl Iterator<Item = T>) -> Vec<T> {
        let mut values: Vec<T> = values.collect();
        values.sort();
        values
    }

    #[test]
    fn test_new_and_with_hasher() {
        let set: SipSet<i32> = HashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);

        let set2: SipSet<i32> = HashSet::with_hasher(SipHashBuilder::default());
        assert!(set2.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let set: SipSet<i32> = HashSet::with_capacity(100);
        assert!(set.capacity() >= 100);
        assert!(set.is_empty());

        let set2: SipSet<i32> = HashSet::with_bucket_count_and_hasher(5, SipHashBuilder::default());
        assert_eq!(set2.bucket_count(), 8);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set: SipSet<i32> = HashSet::new();

        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(1));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
        assert_eq!(set.count(&1), 1);
        assert_eq!(set.count(&3), 0);
    }

    #[test]
    fn test_remove() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(1);
        set.insert(2);

        assert!(set.remove(&1));
        assert!(!set.remove(&1));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&2));
    }

    #[test]
    fn test_take_and_get() {
        let mut set: SipSet<String> = HashSet::new();
        set.insert("hello".to_string());

        assert_eq!(set.get("hello"), Some(&"hello".to_string()));
        assert_eq!(set.get("world"), None);
        assert_eq!(set.take("hello"), Some("hello".to_string()));
        assert_eq!(set.take("hello"), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_equal_range() {
        let mut set: SipSet<String> = HashSet::new();
        set.insert("hello".to_string());

        let hit: Vec<_> = set.equal_range("hello").collect();
        assert_eq!(hit, [&"hello".to_string()]);
        assert_eq!(set.equal_range("world").len(), 0);
        assert!(set.equal_range("world").next().is_none());
    }

    #[test]
    fn test_replace() {
        #[derive(Debug)]
        struct Tagged(u32, &'static str);
        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Tagged {}
        impl core::hash::Hash for Tagged {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        let mut set: SipSet<Tagged> = HashSet::new();
        assert!(set.insert(Tagged(1, "first")));
        assert!(!set.insert(Tagged(1, "ignored")));
        assert_eq!(set.iter().next().map(|t| t.1), Some("first"));

        let old = set.replace(Tagged(1, "second"));
        assert_eq!(old.map(|t| t.1), Some("first"));
        assert_eq!(set.iter().next().map(|t| t.1), Some("second"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(1);
        set.insert(2);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(&1));
    }

    #[test]
    fn test_reserve_and_shrink() {
        let mut set: SipSet<i32> = HashSet::new();
        set.reserve(100);
        assert!(set.capacity() >= 100);
        for i in 0..10 {
            set.insert(i);
        }
        set.shrink_to_fit();
        assert_eq!(set.bucket_count(), 16);
        set.rehash(100);
        assert_eq!(set.bucket_count(), 128);
        assert_eq!(
            set.try_rehash(usize::MAX),
            Err(TryReserveError::CapacityOverflow)
        );
        assert_eq!(set.len(), 10);
        set.check_invariants();
    }

    #[test]
    fn test_iter_and_into_iter() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert_eq!(sorted(set.iter().copied()), [1, 2, 3]);
        assert_eq!(set.iter().len(), 3);
        assert_eq!(sorted((&set).into_iter().copied()), [1, 2, 3]);
        assert_eq!(sorted(set.into_iter()), [1, 2, 3]);
    }

    #[test]
    fn test_drain() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(1);
        set.insert(2);

        assert_eq!(sorted(set.drain()), [1, 2]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_retain() {
        let mut set: SipSet<i32> = (0..100).collect();
        set.retain(|&x| x % 4 == 0);
        assert_eq!(set.len(), 25);
        assert!(set.iter().all(|x| x % 4 == 0));
        set.check_invariants();
    }

    #[test]
    fn test_collision_handling() {
        let mut set: SipSet<i32> = HashSet::new();

        for i in 0..1000 {
            assert!(set.insert(i));
        }
        assert_eq!(set.len(), 1000);

        for i in (0..1000).step_by(2) {
            assert!(set.remove(&i));
        }
        assert_eq!(set.len(), 500);

        for i in (1..1000).step_by(2) {
            assert!(set.contains(&i));
        }
        for i in (0..1000).step_by(2) {
            assert!(!set.contains(&i));
        }
        set.check_invariants();
    }

    #[test]
    fn test_with_hash_variants() {
        let mut set: SipSet<u64> = HashSet::new();
        set.insert(9);
        let hash = set.hasher().hash_one(9u64);
        assert!(set.contains_with_hash(&9, hash));
        assert!(set.remove_with_hash(&9, hash));
        assert!(!set.contains(&9));
    }

    #[test]
    fn test_equality_ignores_layout() {
        let a: SipSet<i32> = (0..20).collect();
        let mut b: SipSet<i32> = HashSet::with_capacity(500);
        b.extend((0..20).rev());
        assert_eq!(a, b);
        b.remove(&0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_extend_by_reference() {
        let mut set: SipSet<i32> = HashSet::new();
        let values = vec![1, 2, 2, 3];
        set.extend(values.iter());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_default_trait() {
        let set: SipSet<i32> = Default::default();
        assert!(set.is_empty());
    }

    #[test]
    fn test_store_hash_with_prime_policy() {
        let mut set: HashSet<String, SipHashBuilder, PrimeGrowthPolicy, StoreHash> = HashSet::new();
        for i in 0..300 {
            set.insert(i.to_string());
        }
        for i in 0..300 {
            assert!(set.contains(i.to_string().as_str()));
        }
        assert!(!set.contains("300"));
        set.check_invariants();
    }

    #[test]
    fn test_is_disjoint() {
        let a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [4, 5, 6].into_iter().collect();
        let c: SipSet<i32> = [3, 4].into_iter().collect();

        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
        assert!(!c.is_disjoint(&b));
    }

    #[test]
    fn test_is_subset_and_superset() {
        let a: SipSet<i32> = [1, 2].into_iter().collect();
        let b: SipSet<i32> = [1, 2, 3].into_iter().collect();

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(b.is_superset(&a));
        assert!(!a.is_superset(&b));
        assert!(a.is_subset(&a));
    }

    #[test]
    fn test_union() {
        let a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [3, 4, 5].into_iter().collect();
        assert_eq!(sorted(a.union(&b).copied()), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_intersection() {
        let a: SipSet<i32> = [1, 2, 3, 4].into_iter().collect();
        let b: SipSet<i32> = [3, 4, 5].into_iter().collect();
        assert_eq!(sorted(a.intersection(&b).copied()), [3, 4]);
        assert_eq!(sorted(b.intersection(&a).copied()), [3, 4]);
    }

    #[test]
    fn test_difference() {
        let a: SipSet<i32> = [1, 2, 3, 4].into_iter().collect();
        let b: SipSet<i32> = [3, 4, 5].into_iter().collect();
        assert_eq!(sorted(a.difference(&b).copied()), [1, 2]);
        assert_eq!(sorted(b.difference(&a).copied()), [5]);
    }

    #[test]
    fn test_symmetric_difference() {
        let a: SipSet<i32> = [1, 2, 3].into_iter().collect();
        let b: SipSet<i32> = [3, 4].into_iter().collect();
        assert_eq!(sorted(a.symmetric_difference(&b).copied()), [1, 2, 4]);
    }

    #[test]
    fn test_debug_output() {
        let mut set: SipSet<i32> = HashSet::new();
        set.insert(7);
        assert_eq!(alloc::format!("{set:?}"), "{7}");
    }
}
