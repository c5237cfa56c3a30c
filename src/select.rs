//! Strategies extracting the key, and for maps the mapped value, from the
//! element type stored in a [`HashTable`](crate::HashTable).
//!
//! [`HashMap`](crate::HashMap) stores `(K, V)` and [`HashSet`](crate::HashSet)
//! stores `K`; both share the same table and build their hashing and
//! equality closures through these traits.

use core::borrow::Borrow;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::marker::PhantomData;

/// Extracts the key from a stored element.
pub trait KeySelect {
    /// The element type stored in the table.
    type Value;
    /// The key type hashed and compared.
    type Key;

    /// Returns the key of `value`.
    fn key(value: &Self::Value) -> &Self::Key;
}

/// Extracts the mapped value from a stored element.
pub trait ValueSelect: KeySelect {
    /// The mapped value type.
    type Mapped;

    /// Returns the mapped value of `value`.
    fn mapped(value: &Self::Value) -> &Self::Mapped;

    /// Returns the mapped value of `value` mutably.
    fn mapped_mut(value: &mut Self::Value) -> &mut Self::Mapped;

    /// Moves the mapped value out of an element removed from the table.
    fn into_mapped(value: Self::Value) -> Self::Mapped;
}

/// Selector for map elements stored as `(K, V)`.
pub struct MapSelect<K, V>(PhantomData<fn() -> (K, V)>);

impl<K, V> KeySelect for MapSelect<K, V> {
    type Key = K;
    type Value = (K, V);

    #[inline(always)]
    fn key(value: &(K, V)) -> &K {
        &value.0
    }
}

impl<K, V> ValueSelect for MapSelect<K, V> {
    type Mapped = V;

    #[inline(always)]
    fn mapped(value: &(K, V)) -> &V {
        &value.1
    }

    #[inline(always)]
    fn mapped_mut(value: &mut (K, V)) -> &mut V {
        &mut value.1
    }

    #[inline(always)]
    fn into_mapped(value: (K, V)) -> V {
        value.1
    }
}

/// Selector for set elements, which are their own key.
pub struct SetSelect<K>(PhantomData<fn() -> K>);

impl<K> KeySelect for SetSelect<K> {
    type Key = K;
    type Value = K;

    #[inline(always)]
    fn key(value: &K) -> &K {
        value
    }
}

/// Builds the re-hasher a table calls for elements it moves during a rehash.
#[inline]
pub(crate) fn make_hasher<Sel, S>(hash_builder: &S) -> impl Fn(&Sel::Value) -> u64 + '_
where
    Sel: KeySelect,
    Sel::Key: Hash,
    S: BuildHasher,
{
    move |value| hash_builder.hash_one(Sel::key(value))
}

/// Builds the equality predicate matching elements whose key equals `key`.
#[inline]
pub(crate) fn equivalent_key<Sel, Q>(key: &Q) -> impl Fn(&Sel::Value) -> bool + '_
where
    Sel: KeySelect,
    Sel::Key: Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |value| Sel::key(value).borrow() == key
}
