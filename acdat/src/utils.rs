use core::hash::{BuildHasher, Hasher};

use hashbrown::HashMap;

/// Side table from `(parent << 32) | label` keys to child state IDs.
pub type OverflowTable = HashMap<u64, u32, SplitMix64Builder>;

#[inline(always)]
pub const fn overflow_key(parent: u32, label: u32) -> u64 {
    ((parent as u64) << 32) | label as u64
}

// Copied from https://prng.di.unimi.it/splitmix64.c
pub struct SplitMix64 {
    x: u64,
}

impl SplitMix64 {
    #[inline(always)]
    fn add(&mut self, i: u64) {
        self.x ^= i;
        self.x = self.x.wrapping_add(0x9e3779b97f4a7c15);
        self.x = (self.x ^ (self.x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        self.x = (self.x ^ (self.x >> 27)).wrapping_mul(0x94d049bb133111eb);
        self.x = self.x ^ (self.x >> 31);
    }
}

impl Hasher for SplitMix64 {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.x
    }

    #[inline(always)]
    fn write(&mut self, bytes: &[u8]) {
        for &i in bytes {
            self.add(u64::from(i));
        }
    }

    #[inline(always)]
    fn write_u32(&mut self, i: u32) {
        self.add(u64::from(i));
    }

    #[inline(always)]
    fn write_u64(&mut self, i: u64) {
        self.add(i);
    }
}

#[derive(Clone, Copy, Default)]
pub struct SplitMix64Builder;

impl BuildHasher for SplitMix64Builder {
    type Hasher = SplitMix64;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        SplitMix64 { x: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_key() {
        assert_eq!(0x0000_0005_0001_0000, overflow_key(5, 0x10000));
        assert_ne!(overflow_key(1, 2), overflow_key(2, 1));
    }

    #[test]
    fn test_splitmix64_distinct_keys() {
        let builder = SplitMix64Builder;
        let hash = |x: u64| {
            let mut h = builder.build_hasher();
            h.write_u64(x);
            h.finish()
        };
        assert_ne!(hash(overflow_key(1, 0x10000)), hash(overflow_key(1, 0x10001)));
        assert_eq!(hash(42), hash(42));
    }

    #[test]
    fn test_overflow_table() {
        let mut table = OverflowTable::default();
        assert!(table.insert(overflow_key(3, 0x1F600), 10).is_none());
        assert_eq!(Some(&10), table.get(&overflow_key(3, 0x1F600)));
        assert_eq!(None, table.get(&overflow_key(4, 0x1F600)));
    }
}
