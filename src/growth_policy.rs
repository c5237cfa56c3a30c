//! Strategies mapping hashes onto bucket indices and deciding how the bucket
//! array grows.
//!
//! A [`HashTable`](crate::HashTable) is generic over its policy. The policy
//! owns the current bucket count; the table asks it for the ideal bucket of a
//! hash and, when the load threshold is reached, for the next bucket count.

use crate::error::TryReserveError;

/// Maps hash values to buckets and drives bucket-array growth.
///
/// Implementations must guarantee that [`next_bucket_count`] is strictly
/// greater than [`bucket_count`] whenever it succeeds, and that
/// [`bucket_for_hash`] returns a value below [`bucket_count`] whenever the
/// bucket count is non-zero. The table relies on both to terminate growth
/// loops and to stay in bounds.
///
/// [`next_bucket_count`]: GrowthPolicy::next_bucket_count
/// [`bucket_count`]: GrowthPolicy::bucket_count
/// [`bucket_for_hash`]: GrowthPolicy::bucket_for_hash
pub trait GrowthPolicy: Clone {
    /// Creates a policy for the smallest valid bucket count that is at least
    /// `min_bucket_count`. A request of zero yields a policy with zero
    /// buckets.
    fn new(min_bucket_count: usize) -> Result<Self, TryReserveError>;

    /// The bucket count used when growing from an empty (zero-bucket) table.
    fn min_bucket_count() -> usize;

    /// The largest bucket count the policy can produce.
    fn max_bucket_count() -> usize;

    /// The current bucket count.
    fn bucket_count(&self) -> usize;

    /// Maps `hash` onto `0..self.bucket_count()`.
    ///
    /// Must not be called while the bucket count is zero.
    fn bucket_for_hash(&self, hash: u64) -> usize;

    /// The bucket count to grow to from the current one.
    fn next_bucket_count(&self) -> Result<usize, TryReserveError>;

    /// Whether the low 32 bits of a hash are enough to find its bucket in a
    /// table of `bucket_count` buckets. When true, tables caching hash
    /// fragments rehash without calling the hasher.
    #[inline]
    fn rehash_from_fragment(bucket_count: usize) -> bool {
        let _ = bucket_count;
        false
    }
}

/// Keeps the bucket count a power of two and maps hashes by masking.
///
/// This is the fastest policy, but it only looks at the low bits of the hash:
/// hash functions with poor low-bit entropy cluster badly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerOfTwoGrowthPolicy {
    mask: usize,
    bucket_count: usize,
}

impl PowerOfTwoGrowthPolicy {
    const MIN_BUCKETS: usize = 2;
}

impl GrowthPolicy for PowerOfTwoGrowthPolicy {
    fn new(min_bucket_count: usize) -> Result<Self, TryReserveError> {
        if min_bucket_count == 0 {
            return Ok(Self {
                mask: 0,
                bucket_count: 0,
            });
        }
        if min_bucket_count > Self::max_bucket_count() {
            return Err(TryReserveError::CapacityOverflow);
        }

        let bucket_count = min_bucket_count
            .max(Self::MIN_BUCKETS)
            .checked_next_power_of_two()
            .ok_or(TryReserveError::CapacityOverflow)?;
        Ok(Self {
            mask: bucket_count - 1,
            bucket_count,
        })
    }

    #[inline]
    fn min_bucket_count() -> usize {
        Self::MIN_BUCKETS
    }

    #[inline]
    fn max_bucket_count() -> usize {
        (usize::MAX / 2) + 1
    }

    #[inline(always)]
    fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline(always)]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    fn next_bucket_count(&self) -> Result<usize, TryReserveError> {
        if self.bucket_count == 0 {
            return Ok(Self::MIN_BUCKETS);
        }
        if self.bucket_count >= Self::max_bucket_count() {
            return Err(TryReserveError::CapacityOverflow);
        }
        Ok(self.bucket_count * 2)
    }

    #[inline]
    fn rehash_from_fragment(bucket_count: usize) -> bool {
        bucket_count.wrapping_sub(1) <= u32::MAX as usize
    }
}

/// Each entry is the smallest prime at least twice the previous one.
#[rustfmt::skip]
const PRIMES: [u64; 46] = [
    5, 11, 23, 47, 97, 197,
    397, 797, 1597, 3203, 6421, 12853,
    25717, 51437, 102877, 205759, 411527, 823117,
    1646237, 3292489, 6584983, 13169977, 26339969, 52679969,
    105359939, 210719881, 421439783, 842879579, 1685759167, 3371518343,
    6743036717, 13486073473, 26972146961, 53944293929, 107888587883, 215777175787,
    431554351609, 863108703229, 1726217406467, 3452434812973, 6904869625999, 13809739252051,
    27619478504183, 55238957008387, 110477914016779, 220955828033581,
];

/// Keeps the bucket count prime and maps hashes by modulo.
///
/// Slower than [`PowerOfTwoGrowthPolicy`] because of the division, but every
/// bit of the hash contributes to the bucket, which makes it resistant to
/// hash functions with weak low bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimeGrowthPolicy {
    prime_index: Option<usize>,
    bucket_count: usize,
}

impl PrimeGrowthPolicy {
    fn prime_at(index: usize) -> Option<usize> {
        PRIMES
            .get(index)
            .and_then(|&prime| usize::try_from(prime).ok())
    }
}

impl GrowthPolicy for PrimeGrowthPolicy {
    fn new(min_bucket_count: usize) -> Result<Self, TryReserveError> {
        if min_bucket_count == 0 {
            return Ok(Self {
                prime_index: None,
                bucket_count: 0,
            });
        }

        let index = PRIMES.partition_point(|&prime| prime < min_bucket_count as u64);
        let bucket_count = Self::prime_at(index).ok_or(TryReserveError::CapacityOverflow)?;
        Ok(Self {
            prime_index: Some(index),
            bucket_count,
        })
    }

    #[inline]
    fn min_bucket_count() -> usize {
        PRIMES[0] as usize
    }

    fn max_bucket_count() -> usize {
        PRIMES
            .iter()
            .rev()
            .find_map(|&prime| usize::try_from(prime).ok())
            .unwrap_or(0)
    }

    #[inline(always)]
    fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline(always)]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        (hash % self.bucket_count as u64) as usize
    }

    fn next_bucket_count(&self) -> Result<usize, TryReserveError> {
        let next = self.prime_index.map_or(0, |index| index + 1);
        Self::prime_at(next).ok_or(TryReserveError::CapacityOverflow)
    }
}

/// Maps hashes by modulo over an arbitrary bucket count that grows by half
/// of itself on each resize.
///
/// Useful when memory growth must be gentler than doubling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModGrowthPolicy {
    bucket_count: usize,
}

impl ModGrowthPolicy {
    const MIN_BUCKETS: usize = 2;
}

impl GrowthPolicy for ModGrowthPolicy {
    fn new(min_bucket_count: usize) -> Result<Self, TryReserveError> {
        let bucket_count = if min_bucket_count == 0 {
            0
        } else {
            min_bucket_count.max(Self::MIN_BUCKETS)
        };
        Ok(Self { bucket_count })
    }

    #[inline]
    fn min_bucket_count() -> usize {
        Self::MIN_BUCKETS
    }

    #[inline]
    fn max_bucket_count() -> usize {
        usize::MAX
    }

    #[inline(always)]
    fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline(always)]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        (hash % self.bucket_count as u64) as usize
    }

    fn next_bucket_count(&self) -> Result<usize, TryReserveError> {
        if self.bucket_count == 0 {
            return Ok(Self::MIN_BUCKETS);
        }
        self.bucket_count
            .checked_add(self.bucket_count.div_ceil(2))
            .ok_or(TryReserveError::CapacityOverflow)
    }
}
