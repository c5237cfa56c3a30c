use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::allocator::BucketAllocator;
use crate::allocator::Global;
use crate::error::NotFoundError;
use crate::error::TryReserveError;
use crate::growth_policy::GrowthPolicy;
use crate::growth_policy::PowerOfTwoGrowthPolicy;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashCache;
use crate::hash_table::HashTable;
use crate::hash_table::NoStoreHash;
use crate::select::KeySelect;
use crate::select::MapSelect;
use crate::select::ValueSelect;
use crate::select::equivalent_key;
use crate::select::make_hasher;

/// A hash map backed by the robin-hood [`HashTable`].
///
/// `HashMap<K, V, S>` stores `(K, V)` pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. The remaining
/// type parameters are forwarded to the table: the [`GrowthPolicy`] `P`, the
/// hash caching mode `C` and the bucket allocator `A`.
///
/// # Performance Characteristics
///
/// - **Memory**: a 4-byte probe distance per bucket (8 with
///   [`StoreHash`](crate::StoreHash)), plus the size of `(K, V)`, at a load
///   factor of up to 0.95.
/// - **Lookups**: a miss stops as soon as it reaches a bucket whose element
///   is closer to its ideal bucket than the lookup is, so misses cost about
///   as much as hits.
#[derive(Clone)]
pub struct HashMap<
    K,
    V,
    S = DefaultHashBuilder,
    P = PowerOfTwoGrowthPolicy,
    C = NoStoreHash,
    A = Global,
> where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    table: HashTable<(K, V), P, C, A>,
    hash_builder: S,
}

impl<K, V, S, P, C, A> Debug for HashMap<K, V, S, P, C, A>
where
    K: Debug,
    V: Debug,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S, P, C, A> PartialEq for HashMap<K, V, S, P, C, A>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Two maps are equal when they hold the same keys mapped to equal
    /// values, regardless of bucket layout or iteration order.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(k, v)| other.get(k).is_some_and(|other_v| v == other_v))
    }
}

impl<K, V, S, P, C, A> Eq for HashMap<K, V, S, P, C, A>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
}

impl<K, V, S, P, C> HashMap<K, V, S, P, C, Global>
where
    P: GrowthPolicy,
    C: HashCache,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_hasher_in(hash_builder, Global)
    }

    /// Creates a new hash map able to hold `capacity` elements without
    /// growing, using the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_capacity_and_hasher_in(capacity, hash_builder, Global)
    }

    /// Creates a new hash map with at least `bucket_count` buckets, rounded
    /// up by the growth policy.
    pub fn with_bucket_count_and_hasher(bucket_count: usize, hash_builder: S) -> Self {
        Self::with_bucket_count_and_hasher_in(bucket_count, hash_builder, Global)
    }
}

impl<K, V, S, P, C> HashMap<K, V, S, P, C, Global>
where
    S: Default,
    P: GrowthPolicy,
    C: HashCache,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map able to hold `capacity` elements without
    /// growing, using the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates a new hash map with at least `bucket_count` buckets, using
    /// the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let map: HashMap<u32, u32> = HashMap::with_bucket_count(10);
    /// assert_eq!(map.bucket_count(), 16);
    /// # }
    /// ```
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_bucket_count_and_hasher(bucket_count, S::default())
    }
}

impl<K, V, S, P, C> Default for HashMap<K, V, S, P, C, Global>
where
    S: Default,
    P: GrowthPolicy,
    C: HashCache,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P, C, A> HashMap<K, V, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Creates a new hash map with the given hasher builder whose bucket
    /// array comes from `alloc`.
    pub fn with_hasher_in(hash_builder: S, alloc: A) -> Self {
        Self {
            table: HashTable::new_in(alloc),
            hash_builder,
        }
    }

    /// Creates a new hash map backed by `alloc`, able to hold `capacity`
    /// elements without growing.
    pub fn with_capacity_and_hasher_in(capacity: usize, hash_builder: S, alloc: A) -> Self {
        Self {
            table: HashTable::with_capacity_in(capacity, alloc),
            hash_builder,
        }
    }

    /// Fallible version of
    /// [`with_capacity_and_hasher_in`](Self::with_capacity_and_hasher_in).
    pub fn try_with_capacity_and_hasher_in(
        capacity: usize,
        hash_builder: S,
        alloc: A,
    ) -> Result<Self, TryReserveError> {
        Ok(Self {
            table: HashTable::try_with_capacity_in(capacity, alloc)?,
            hash_builder,
        })
    }

    /// Creates a new hash map backed by `alloc` with at least `bucket_count`
    /// buckets.
    pub fn with_bucket_count_and_hasher_in(bucket_count: usize, hash_builder: S, alloc: A) -> Self {
        Self {
            table: HashTable::with_bucket_count_in(bucket_count, alloc),
            hash_builder,
        }
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns a reference to the allocator backing the bucket array.
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of elements the map can hold before it grows.
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

    /// Returns the load factor past which insertions grow the map.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Sets the maximum load factor, clamped to `[0.2, 0.95]`.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        self.table.set_max_load_factor(max_load_factor);
    }

    /// Returns the minimum load factor; see
    /// [`set_min_load_factor`](Self::set_min_load_factor).
    pub fn min_load_factor(&self) -> f32 {
        self.table.min_load_factor()
    }

    /// Sets the minimum load factor, clamped to `[0.0, 0.15]`.
    ///
    /// When non-zero, the first insertion after a removal shrinks the map
    /// if its load factor has fallen below this value.
    pub fn set_min_load_factor(&mut self, min_load_factor: f32) {
        self.table.set_min_load_factor(min_load_factor);
    }

    /// Removes all elements from the map.
    ///
    /// This operation preserves the map's bucket array.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// The iterator yields `(&K, &V)` pairs in an arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the key-value pairs with mutable references
    /// to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, C> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V, C> {
        Keys {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V, C> {
        Values {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over mutable references to the values of the map.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, C> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Removes and yields all key-value pairs, keeping the bucket array.
    pub fn drain(&mut self) -> Drain<'_, K, V, P, C, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Retains only the pairs for which `f` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// # }
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(|(k, v)| f(k, v));
    }
}

impl<K, V, S, P, C, A> HashMap<K, V, S, P, C, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(
            additional,
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        );
    }

    /// Fallible version of [`reserve`](Self::reserve). On error the map is
    /// unchanged.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(
            additional,
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        )
    }

    /// Rehashes into at least `bucket_count` buckets (and no fewer than the
    /// current elements need).
    pub fn rehash(&mut self, bucket_count: usize) {
        self.table.rehash(
            bucket_count,
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        );
    }

    /// Fallible version of [`rehash`](Self::rehash).
    pub fn try_rehash(&mut self, bucket_count: usize) -> Result<(), TryReserveError> {
        self.table.try_rehash(
            bucket_count,
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        )
    }

    /// Shrinks the bucket array as much as the current elements allow.
    pub fn shrink_to_fit(&mut self) {
        self.table
            .shrink_to_fit(make_hasher::<MapSelect<K, V>, _>(&self.hash_builder));
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already had this key present, the value is updated and the
    /// old value is returned. The key itself is not updated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// # }
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Inserts `value` under `key`, overwriting any existing value.
    ///
    /// Returns a reference to the stored value and whether the key was newly
    /// inserted.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (&mut V, bool) {
        match self.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(value);
                (entry.into_mut(), false)
            }
            Entry::Vacant(entry) => (entry.insert(value), true),
        }
    }

    /// Inserts `value` under `key` unless the key is already present, in
    /// which case the map is unchanged and `value` is dropped.
    ///
    /// Returns a reference to the stored value and whether the key was newly
    /// inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<&str, i32> = HashMap::new();
    /// assert_eq!(map.try_insert("a", 1), (&mut 1, true));
    /// assert_eq!(map.try_insert("a", 2), (&mut 1, false));
    /// # }
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        self.try_emplace(key, || value)
    }

    /// Inserts the value produced by `make` if `key` is absent. An existing
    /// value is left untouched and `make` is not called.
    ///
    /// Returns a reference to the stored value and whether the key was newly
    /// inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<&str, i32> = HashMap::new();
    /// assert_eq!(map.try_emplace("a", || 1), (&mut 1, true));
    /// assert_eq!(map.try_emplace("a", || 2), (&mut 1, false));
    /// # }
    /// ```
    pub fn try_emplace(&mut self, key: K, make: impl FnOnce() -> V) -> (&mut V, bool) {
        match self.entry(key) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(make()), true),
        }
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash`
    /// and `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<String, i32> = HashMap::new();
    /// map.insert("one".to_string(), 1);
    /// assert_eq!(map.get("one"), Some(&1));
    /// assert_eq!(map.get("two"), None);
    /// # }
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_with_hash(key, self.hash_builder.hash_one(key))
    }

    /// Like [`get`](Self::get), with the hash of `key` computed by the
    /// caller. `hash` must be the map's hasher builder output for `key`.
    pub fn get_with_hash<Q>(&self, key: &Q, hash: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table
            .find(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
            .map(MapSelect::<K, V>::mapped)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.get_mut_with_hash(key, hash)
    }

    /// Like [`get_mut`](Self::get_mut), with a precomputed hash.
    pub fn get_mut_with_hash<Q>(&mut self, key: &Q, hash: u64) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table
            .find_mut(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
            .map(MapSelect::<K, V>::mapped_mut)
    }

    /// Returns the stored key and value corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
            .map(|(k, v)| (k, v))
    }

    /// Returns the range of entries matching `key`.
    ///
    /// Keys are unique, so the range holds at most one entry; a missing key
    /// yields an empty iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<&str, i32> = HashMap::new();
    /// map.insert("a", 1);
    ///
    /// assert_eq!(map.equal_range("a").collect::<Vec<_>>(), [(&"a", &1)]);
    /// assert_eq!(map.equal_range("b").len(), 0);
    /// # }
    /// ```
    pub fn equal_range<Q>(&self, key: &Q) -> core::option::IntoIter<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).into_iter()
    }

    /// Like [`equal_range`](Self::equal_range), yielding the value mutably.
    pub fn equal_range_mut<Q>(&mut self, key: &Q) -> core::option::IntoIter<(&K, &mut V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
            .map(|(k, v)| (&*k, v))
            .into_iter()
    }

    /// Returns the value corresponding to the key, or [`NotFoundError`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    /// use robin_hash::NotFoundError;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(NotFoundError));
    /// # }
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V, NotFoundError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).ok_or(NotFoundError)
    }

    /// Mutable version of [`at`](Self::at).
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, NotFoundError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(key).ok_or(NotFoundError)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Like [`contains_key`](Self::contains_key), with a precomputed hash.
    pub fn contains_key_with_hash<Q>(&self, key: &Q, hash: u64) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.get_with_hash(key, hash).is_some()
    }

    /// Returns the number of elements with the given key: zero or one.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains_key(key))
    }

    /// Removes a key from the map, returning the value if it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// # }
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(MapSelect::<K, V>::into_mapped)
    }

    /// Like [`remove`](Self::remove), with a precomputed hash.
    pub fn remove_with_hash<Q>(&mut self, key: &Q, hash: u64) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table
            .remove(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
            .map(MapSelect::<K, V>::into_mapped)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .remove(hash, equivalent_key::<MapSelect<K, V>, Q>(key))
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use robin_hash::HashMap;
    ///
    /// let mut letters: HashMap<char, u32> = HashMap::new();
    /// for ch in "a short treatise on fungi".chars() {
    ///     *letters.entry(ch).or_insert(0) += 1;
    /// }
    /// assert_eq!(letters[&'s'], 2);
    /// assert_eq!(letters[&'t'], 3);
    /// # }
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, P, C, A> {
        let hash = self.hash_builder.hash_one(&key);
        self.entry_with_hash(key, hash)
    }

    /// Like [`entry`](Self::entry), with a precomputed hash.
    pub fn entry_with_hash(&mut self, key: K, hash: u64) -> Entry<'_, K, V, P, C, A> {
        let entry = self.table.entry(
            hash,
            equivalent_key::<MapSelect<K, V>, K>(&key),
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        );
        Entry::from_table(entry, key)
    }

    /// Fallible version of [`entry`](Self::entry): growth failures are
    /// returned and leave the map unchanged.
    pub fn try_entry(&mut self, key: K) -> Result<Entry<'_, K, V, P, C, A>, TryReserveError> {
        let hash = self.hash_builder.hash_one(&key);
        let entry = self.table.try_entry(
            hash,
            equivalent_key::<MapSelect<K, V>, K>(&key),
            make_hasher::<MapSelect<K, V>, _>(&self.hash_builder),
        )?;
        Ok(Entry::from_table(entry, key))
    }

    /// Checks the table's structural invariants, panicking on the first
    /// violation.
    #[cfg(any(test, feature = "stats"))]
    pub fn check_invariants(&self) {
        self.table
            .check_invariants(make_hasher::<MapSelect<K, V>, _>(&self.hash_builder));
    }

    /// Returns the underlying table, for statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn raw_table(&self) -> &HashTable<(K, V), P, C, A> {
        &self.table
    }
}

impl<K, Q, V, S, P, C, A> Index<&Q> for HashMap<K, V, S, P, C, A>
where
    K: Borrow<Q> + Hash + Eq,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found"),
        }
    }
}

impl<K, V, S, P, C> FromIterator<(K, V)> for HashMap<K, V, S, P, C, Global>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: GrowthPolicy,
    C: HashCache,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S, P, C, A> Extend<(K, V)> for HashMap<K, V, S, P, C, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // Duplicate keys are likely when the map already holds elements.
        let additional = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(additional);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S, P, C, A> Extend<(&'a K, &'a V)> for HashMap<K, V, S, P, C, A>
where
    K: Hash + Eq + Copy,
    V: Copy,
    S: BuildHasher,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S, P, C, A> IntoIterator for HashMap<K, V, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = IntoIter<K, V, P, C, A>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S, P, C, A> IntoIterator for &'a HashMap<K, V, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = Iter<'a, K, V, C>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, P, C, A> IntoIterator for &'a mut HashMap<K, V, S, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type IntoIter = IterMut<'a, K, V, C>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, P, C, A>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, P, C, A>),
}

impl<'a, K, V, P, C, A> Entry<'a, K, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    fn from_table(entry: TableEntry<'a, (K, V), P, C, A>, key: K) -> Self {
        match entry {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`or_insert_with`](Self::or_insert_with), but the closure
    /// receives the key.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, P, C, A> Entry<'a, K, V, P, C, A>
where
    V: Default,
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    entry: crate::hash_table::VacantEntry<'a, (K, V), P, C, A>,
    key: K,
}

impl<'a, K, V, P, C, A> VacantEntry<'a, K, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        MapSelect::<K, V>::mapped_mut(self.entry.insert((self.key, value)))
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    entry: crate::hash_table::OccupiedEntry<'a, (K, V), P, C, A>,
}

impl<'a, K, V, P, C, A> OccupiedEntry<'a, K, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        MapSelect::<K, V>::key(self.entry.get())
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        MapSelect::<K, V>::mapped(self.entry.get())
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        MapSelect::<K, V>::mapped_mut(self.entry.get_mut())
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        MapSelect::<K, V>::mapped_mut(self.entry.into_mut())
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(MapSelect::<K, V>::mapped_mut(self.entry.get_mut()), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        MapSelect::<K, V>::into_mapped(self.entry.remove())
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::Iter<'a, (K, V), C>,
}

impl<K, V, C: HashCache> Clone for Iter<'_, K, V, C> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, C: HashCache> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCache> ExactSizeIterator for Iter<'_, K, V, C> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::IterMut<'a, (K, V), C>,
}

impl<'a, K, V, C: HashCache> Iterator for IterMut<'a, K, V, C> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C: HashCache> ExactSizeIterator for IterMut<'_, K, V, C> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::Iter<'a, (K, V), C>,
}

impl<'a, K, V, C: HashCache> Iterator for Keys<'a, K, V, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(MapSelect::<K, V>::key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::Iter<'a, (K, V), C>,
}

impl<'a, K, V, C: HashCache> Iterator for Values<'a, K, V, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(MapSelect::<K, V>::mapped)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V, C: HashCache = NoStoreHash> {
    inner: crate::hash_table::IterMut<'a, (K, V), C>,
}

impl<'a, K, V, C: HashCache> Iterator for ValuesMut<'a, K, V, C> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(MapSelect::<K, V>::mapped_mut)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    inner: crate::hash_table::Drain<'a, (K, V), P, C, A>,
}

impl<K, V, P, C, A> Iterator for Drain<'_, K, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A consuming iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V, P = PowerOfTwoGrowthPolicy, C = NoStoreHash, A = Global>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    inner: crate::hash_table::IntoIter<(K, V), P, C, A>,
}

impl<K, V, P, C, A> Iterator for IntoIter<K, V, P, C, A>
where
    P: GrowthPolicy,
    C: HashCache,
    A: BucketAllocator,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
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
    use crate::growth_policy::ModGrowthPolicy;
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
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type SipMap<K, V> = HashMap<K, V, SipHashBuilder>;

    #[test]
    fn test_new_and_with_hasher() {
        let map: SipMap<i32, String> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.bucket_count(), 0);

        let map2: SipMap<i32, String> = HashMap::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_with_capacity() {
        let map: SipMap<i32, String> = HashMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert!(map.is_empty());

        let map2: SipMap<i32, String> =
            HashMap::with_capacity_and_hasher(200, SipHashBuilder::default());
        assert!(map2.capacity() >= 200);
        assert!(map2.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map: SipMap<i32, String> = HashMap::new();

        assert_eq!(map.insert(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_grow_from_four_buckets() {
        let mut map: SipMap<u64, u64> =
            HashMap::with_bucket_count_and_hasher(4, SipHashBuilder::default());
        map.set_max_load_factor(0.9);
        for k in 1..=20u64 {
            map.insert(k, k * 100);
        }
        assert_eq!(map.len(), 20);
        for k in 1..=20u64 {
            assert_eq!(map.get(&k), Some(&(k * 100)));
        }
        assert!(map.bucket_count().is_power_of_two());
        assert!(map.bucket_count() as f32 >= 20.0 / 0.9);
        map.check_invariants();
    }

    #[test]
    fn test_erase_keeps_neighbor() {
        let mut map: SipMap<&str, i32> = HashMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.remove("a"), Some(1));
        assert_eq!(map.get("b"), Some(&2));
        assert_eq!(map.get("a"), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.insert(1, 10);

        if let Some(value) = map.get_mut(&1) {
            *value = 20;
        }
        assert_eq!(map.get(&1), Some(&20));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key_and_count() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");

        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
        assert_eq!(map.count(&1), 1);
        assert_eq!(map.count(&2), 0);
    }

    #[test]
    fn test_remove() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");
        map.insert(2, "b");

        assert_eq!(map.remove(&1), Some("a"));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");

        assert_eq!(map.remove_entry(&1), Some((1, "a")));
        assert!(map.is_empty());
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_clear() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");
        map.insert(2, "b");
        let bucket_count = map.bucket_count();

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.bucket_count(), bucket_count);
        assert!(!map.contains_key(&1));
    }

    #[test]
    fn test_reserve() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.reserve(100);
        assert!(map.capacity() >= 100);
        let bucket_count = map.bucket_count();
        for i in 0..100 {
            map.insert(i, i);
        }
        assert_eq!(map.bucket_count(), bucket_count);
    }

    #[test]
    fn test_try_reserve_overflow() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.insert(1, 1);
        assert_eq!(
            map.try_reserve(usize::MAX),
            Err(TryReserveError::CapacityOverflow)
        );
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_rehash_and_shrink() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        for i in 0..10 {
            map.insert(i, i);
        }
        map.rehash(1000);
        assert_eq!(map.bucket_count(), 1024);
        for i in 0..10 {
            assert_eq!(map.get(&i), Some(&i));
        }

        map.shrink_to_fit();
        assert_eq!(map.bucket_count(), 16);
        for i in 0..10 {
            assert_eq!(map.get(&i), Some(&i));
        }
        map.check_invariants();
    }

    #[test]
    fn test_entry_api() {
        let mut map: SipMap<i32, &str> = HashMap::new();

        let value = map.entry(1).or_insert("a");
        assert_eq!(*value, "a");
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("b");
        assert_eq!(*value, "a");
        assert_eq!(map.len(), 1);

        let value = map.entry(2).or_insert_with(|| "c");
        assert_eq!(*value, "c");
        assert_eq!(map.len(), 2);

        map.entry(1).and_modify(|v| *v = "modified");
        assert_eq!(map.get(&1), Some(&"modified"));

        let value = map.entry(3).or_insert_with_key(|k| if *k == 3 { "three" } else { "?" });
        assert_eq!(*value, "three");
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        *map.entry(1).or_default() += 10;
        *map.entry(1).or_default() += 5;
        assert_eq!(map.get(&1), Some(&15));

        *map.get_or_insert_default(2) += 1;
        assert_eq!(map[&2], 1);
    }

    #[test]
    fn test_occupied_entry() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"a");

                *entry.get_mut() = "b";
                assert_eq!(entry.get(), &"b");

                let old_value = entry.insert("c");
                assert_eq!(old_value, "b");
                assert_eq!(entry.get(), &"c");
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        match map.entry(1) {
            Entry::Occupied(entry) => {
                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "c");
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map: SipMap<i32, &str> = HashMap::new();

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);
                let value = entry.insert("a");
                assert_eq!(*value, "a");
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.get(&1), Some(&"a"));

        match map.entry(2) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), 2),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_or_assign_and_try_emplace() {
        let mut map: SipMap<String, i32> = HashMap::new();

        let (value, inserted) = map.insert_or_assign("k".to_string(), 1);
        assert_eq!((*value, inserted), (1, true));
        let (value, inserted) = map.insert_or_assign("k".to_string(), 2);
        assert_eq!((*value, inserted), (2, false));

        let (value, inserted) = map.try_emplace("k".to_string(), || 3);
        assert_eq!((*value, inserted), (2, false));
        let (value, inserted) = map.try_emplace("j".to_string(), || 4);
        assert_eq!((*value, inserted), (4, true));

        let mut calls = 0;
        map.try_emplace("k".to_string(), || {
            calls += 1;
            0
        });
        assert_eq!(calls, 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_try_insert_never_overwrites() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        assert_eq!(map.try_insert(1, "one"), (&mut "one", true));
        let (value, inserted) = map.try_insert(1, "uno");
        assert!(!inserted);
        assert_eq!(*value, "one");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_equal_range() {
        let mut map: SipMap<String, i32> = HashMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);

        let hit: Vec<_> = map.equal_range("a").collect();
        assert_eq!(hit, [(&"a".to_string(), &1)]);
        assert_eq!(map.equal_range("a").len(), 1);

        assert_eq!(map.equal_range("c").len(), 0);
        assert!(map.equal_range("c").next().is_none());

        for (_, v) in map.equal_range_mut("b") {
            *v += 10;
        }
        assert_eq!(map.get("b"), Some(&12));
        assert!(map.equal_range_mut("c").next().is_none());
    }

    #[test]
    fn test_value_access_through_entries_and_iterators() {
        let mut map: SipMap<u32, u32> = HashMap::new();
        for k in 0..20 {
            map.insert(k, k);
        }

        for v in map.values_mut() {
            *v *= 2;
        }
        let mut keys: Vec<_> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..20).collect::<Vec<_>>());
        assert_eq!(map.values().sum::<u32>(), 2 * (0..20).sum::<u32>());

        match map.entry(3) {
            Entry::Occupied(mut entry) => {
                assert_eq!(*entry.key(), 3);
                assert_eq!(*entry.get(), 6);
                *entry.get_mut() += 1;
                assert_eq!(entry.insert(100), 7);
                assert_eq!(entry.remove(), 100);
            }
            Entry::Vacant(_) => unreachable!(),
        }
        assert!(!map.contains_key(&3));

        match map.entry(3) {
            Entry::Vacant(entry) => assert_eq!(*entry.insert(33), 33),
            Entry::Occupied(_) => unreachable!(),
        }

        let hash = map.hasher().hash_one(5u32);
        assert_eq!(map.remove_with_hash(&5, hash), Some(10));
        assert_eq!(map.remove_with_hash(&5, hash), None);
        assert_eq!(map.len(), 19);
    }

    #[test]
    fn test_at_and_index() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.insert(7, 70);

        assert_eq!(map.at(&7), Ok(&70));
        assert_eq!(map.at(&8), Err(NotFoundError));
        *map.at_mut(&7).unwrap() += 1;
        assert_eq!(map[&7], 71);
        assert_eq!(map.at_mut(&8), Err(NotFoundError));
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_missing_panics() {
        let map: SipMap<i32, i32> = HashMap::new();
        let _ = map[&1];
    }

    #[test]
    fn test_borrowed_lookups() {
        let mut map: SipMap<String, usize> = HashMap::new();
        for word in ["alpha", "beta", "gamma"] {
            map.insert(word.to_string(), word.len());
        }

        assert_eq!(map.get("beta"), Some(&4));
        assert_eq!(map.get_key_value("gamma"), Some((&"gamma".to_string(), &5)));
        assert!(map.contains_key("alpha"));
        assert_eq!(map.remove("alpha"), Some(5));
        assert!(!map.contains_key("alpha"));
    }

    #[test]
    fn test_with_hash_variants() {
        let mut map: SipMap<u32, u32> = HashMap::new();
        let hash = map.hasher().hash_one(5u32);

        match map.entry_with_hash(5, hash) {
            Entry::Vacant(entry) => {
                entry.insert(50);
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.get_with_hash(&5, hash), Some(&50));
        assert!(map.contains_key_with_hash(&5, hash));
        *map.get_mut_with_hash(&5, hash).unwrap() += 1;
        assert_eq!(map.get(&5), Some(&51));
        assert_eq!(map.remove_with_hash(&5, hash), Some(51));
        assert!(map.is_empty());
    }

    #[test]
    fn test_iterators() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.insert(1, 10);
        map.insert(2, 20);
        map.insert(3, 30);

        let mut pairs: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        pairs.sort();
        assert_eq!(pairs, [(1, 10), (2, 20), (3, 30)]);
        assert_eq!(map.iter().len(), 3);

        let mut keys: Vec<_> = map.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, [1, 2, 3]);

        let mut values: Vec<_> = map.values().copied().collect();
        values.sort();
        assert_eq!(values, [10, 20, 30]);

        for v in map.values_mut() {
            *v += 1;
        }
        for (k, v) in map.iter_mut() {
            *v += *k;
        }
        for (k, v) in &mut map {
            *v += *k;
        }
        assert_eq!(map[&2], 25);

        let mut owned: Vec<_> = map.into_iter().collect();
        owned.sort();
        assert_eq!(owned, [(1, 13), (2, 25), (3, 37)]);
    }

    #[test]
    fn test_drain() {
        let mut map: SipMap<i32, &str> = HashMap::new();
        map.insert(1, "a");
        map.insert(2, "b");

        let mut drained: Vec<_> = map.drain().collect();
        drained.sort();

        assert_eq!(drained, [(1, "a"), (2, "b")]);
        assert!(map.is_empty());

        map.insert(3, "c");
        assert_eq!(map.get(&3), Some(&"c"));
    }

    #[test]
    fn test_retain() {
        let mut map: SipMap<i32, i32> = (0..100).map(|i| (i, i * 2)).collect();
        let mut calls = 0;
        map.retain(|&k, v| {
            calls += 1;
            *v += 1;
            k % 5 == 0
        });
        assert_eq!(calls, 100);
        assert_eq!(map.len(), 20);
        for k in (0..100).step_by(5) {
            assert_eq!(map.get(&k), Some(&(k * 2 + 1)));
        }
        map.check_invariants();
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map: SipMap<i32, i32> = HashMap::new();

        for i in 0..1000 {
            assert_eq!(map.insert(i, i * 2), None);
        }
        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
        map.check_invariants();
    }

    #[test]
    fn test_insert_remove_cycle() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        for round in 0..10 {
            for i in 0..200 {
                map.insert(i, round);
            }
            for i in (0..200).filter(|i| i % 3 != round % 3) {
                assert_eq!(map.remove(&i), Some(round));
            }
            map.check_invariants();
        }
    }

    #[test]
    fn test_equality() {
        let a: SipMap<i32, i32> = (0..50).map(|i| (i, i)).collect();
        let mut b: SipMap<i32, i32> = HashMap::with_capacity(1000);
        for i in (0..50).rev() {
            b.insert(i, i);
        }
        assert_ne!(a.bucket_count(), b.bucket_count());
        assert_eq!(a, b);

        b.insert(10, -1);
        assert_ne!(a, b);
        b.insert(10, 10);
        b.insert(50, 50);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map: SipMap<String, i32> = HashMap::new();
        map.insert("one".to_string(), 1);
        let mut copy = map.clone();
        copy.insert("two".to_string(), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get("one"), Some(&1));
    }

    #[test]
    fn test_extend() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.extend([(1, 1), (2, 2)]);
        let more = [(3, 3), (1, 10)];
        map.extend(more.iter().map(|(k, v)| (k, v)));
        assert_eq!(map.len(), 3);
        assert_eq!(map[&1], 10);
    }

    #[test]
    fn test_load_factor_controls() {
        let mut map: SipMap<i32, i32> = HashMap::with_bucket_count(64);
        assert_eq!(map.load_factor(), 0.0);
        assert_eq!(map.max_load_factor(), 0.95);
        map.set_max_load_factor(0.5);
        assert_eq!(map.capacity(), 32);
        for i in 0..33 {
            map.insert(i, i);
        }
        assert_eq!(map.bucket_count(), 128);
        assert!(map.load_factor() <= 0.5);

        map.set_min_load_factor(0.1);
        for i in 0..30 {
            map.remove(&i);
        }
        map.insert(100, 100);
        assert!(map.bucket_count() < 128);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_other_policies_and_store_hash() {
        let mut prime: HashMap<u64, u64, SipHashBuilder, PrimeGrowthPolicy, StoreHash> =
            HashMap::new();
        let mut modulo: HashMap<u64, u64, SipHashBuilder, ModGrowthPolicy> = HashMap::new();
        let mut stored: HashMap<u64, u64, SipHashBuilder, PowerOfTwoGrowthPolicy, StoreHash> =
            HashMap::new();
        for i in 0..500u64 {
            prime.insert(i, i);
            modulo.insert(i, i);
            stored.insert(i, i);
        }
        for i in (0..500u64).step_by(2) {
            prime.remove(&i);
            modulo.remove(&i);
            stored.remove(&i);
        }
        for i in 0..500u64 {
            let expected = (i % 2 == 1).then_some(&i);
            assert_eq!(prime.get(&i), expected);
            assert_eq!(modulo.get(&i), expected);
            assert_eq!(stored.get(&i), expected);
        }
        prime.check_invariants();
        modulo.check_invariants();
        stored.check_invariants();
    }

    #[test]
    fn test_default_trait() {
        let map: SipMap<i32, String> = Default::default();
        assert!(map.is_empty());
    }

    #[test]
    fn test_complex_values() {
        let mut map: SipMap<String, Vec<i32>> = HashMap::new();

        map.insert("numbers".to_string(), vec![1, 2, 3]);
        map.insert("more".to_string(), vec![4, 5, 6]);

        if let Some(numbers) = map.get_mut("numbers") {
            numbers.push(4);
        }

        assert_eq!(map.get("numbers"), Some(&vec![1, 2, 3, 4]));
        assert_eq!(map.get("more"), Some(&vec![4, 5, 6]));
    }

    #[test]
    fn test_debug_output() {
        let mut map: SipMap<i32, i32> = HashMap::new();
        map.insert(1, 2);
        assert_eq!(alloc::format!("{map:?}"), "{1: 2}");
    }
}
