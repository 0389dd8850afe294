// CompactSet: ordered integer set with a cached [min, max] window.

use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt::Debug;

/// Integer-like key usable in a [`CompactSet`].
pub trait CompactKey: Copy + Ord + Debug {
    /// Sentinel marking an unset bound. Never inserted as a real key.
    const NO_KEY: Self;

    fn succ(self) -> Self;

    fn pred(self) -> Self;

    fn widen(self) -> i128;
}

macro_rules! compact_key {
    ($($t:ty => $no_key:expr),* $(,)?) => {
        $(
            impl CompactKey for $t {
                const NO_KEY: Self = $no_key;

                #[inline]
                fn succ(self) -> Self {
                    self.wrapping_add(1)
                }

                #[inline]
                fn pred(self) -> Self {
                    self.wrapping_sub(1)
                }

                #[inline]
                fn widen(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

compact_key!(
    u32 => u32::MAX,
    u64 => u64::MAX,
    usize => usize::MAX,
    i32 => -1,
    i64 => -1,
);

/// Set of integer keys whose membership test is O(1) when the key lies
/// outside `[lower_bound, upper_bound]` or when that window is fully
/// populated, and O(log n) otherwise.
///
/// `erase` moves a bound inward by exactly one when the erased key sat on
/// it, without searching for the next real member. The bounds can therefore
/// name keys that are not in the set (they still enclose every member, so
/// `member` stays exact). A later `erase` of that same bound value moves it
/// one step further.
#[derive(Debug, Clone)]
pub struct CompactSet<K: CompactKey> {
    set: BTreeSet<K>,
    min_key: K,
    max_key: K,
}

impl<K: CompactKey> Default for CompactSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CompactKey> CompactSet<K> {
    pub fn new() -> Self {
        Self {
            set: BTreeSet::new(),
            min_key: K::NO_KEY,
            max_key: K::NO_KEY,
        }
    }

    pub fn insert(&mut self, key: K) {
        self.set.insert(key);
        if self.min_key == K::NO_KEY || key < self.min_key {
            self.min_key = key;
        }
        if self.max_key == K::NO_KEY || self.max_key < key {
            self.max_key = key;
        }
    }

    pub fn erase(&mut self, key: K) {
        self.set.remove(&key);
        if self.set.is_empty() {
            self.min_key = K::NO_KEY;
            self.max_key = K::NO_KEY;
        } else if key == self.min_key {
            self.min_key = self.min_key.succ();
        } else if key == self.max_key {
            self.max_key = self.max_key.pred();
        }
    }

    pub fn clear(&mut self) {
        self.set.clear();
        self.min_key = K::NO_KEY;
        self.max_key = K::NO_KEY;
    }

    #[inline]
    fn out_of_range(&self, key: K) -> bool {
        self.min_key == K::NO_KEY || key < self.min_key || self.max_key < key
    }

    /// The stored key equal to `key`, if any.
    pub fn find(&self, key: K) -> Option<&K> {
        if self.out_of_range(key) {
            None
        } else {
            self.set.get(&key)
        }
    }

    #[inline]
    pub fn member(&self, key: K) -> bool {
        if self.out_of_range(key) {
            false
        } else if self.max_key.widen() + 1 == self.min_key.widen() + self.set.len() as i128 {
            true
        } else {
            self.set.contains(&key)
        }
    }

    /// Every stored key is `>=` this value; `NO_KEY` when empty.
    pub fn lower_bound(&self) -> K {
        self.min_key
    }

    /// Every stored key is `<=` this value; `NO_KEY` when empty.
    pub fn upper_bound(&self) -> K {
        self.max_key
    }

    pub fn iter(&self) -> btree_set::Iter<'_, K> {
        self.set.iter()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl<K: CompactKey> FromIterator<K> for CompactSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl<'a, K: CompactKey> IntoIterator for &'a CompactSet<K> {
    type Item = &'a K;
    type IntoIter = btree_set::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn empty_set_has_no_bounds() {
        let s: CompactSet<u32> = CompactSet::new();
        assert!(s.is_empty());
        assert_eq!(s.lower_bound(), u32::MAX);
        assert_eq!(s.upper_bound(), u32::MAX);
        assert!(!s.member(0));
        assert!(s.find(0).is_none());
    }

    #[test]
    fn dense_range_membership() {
        let s: CompactSet<u32> = (10..20).collect();
        assert_eq!(s.lower_bound(), 10);
        assert_eq!(s.upper_bound(), 19);
        assert!(!s.member(9));
        assert!(s.member(10));
        assert!(s.member(19));
        assert!(!s.member(20));
    }

    #[test]
    fn sparse_range_membership() {
        let s: CompactSet<i64> = [3, 7, 11].into_iter().collect();
        assert!(s.member(3));
        assert!(!s.member(4));
        assert!(s.member(7));
        assert_eq!(s.find(11), Some(&11));
        assert_eq!(s.find(10), None);
    }

    #[test]
    fn erase_last_resets_bounds() {
        let mut s = CompactSet::new();
        s.insert(5u32);
        s.erase(5);
        assert!(s.is_empty());
        assert_eq!(s.lower_bound(), u32::NO_KEY);
        assert!(!s.member(5));
    }

    #[test]
    fn erase_at_bound_shifts_by_one_even_past_a_gap() {
        // {1, 5, 6}: erasing 1 moves the lower bound to 2, which is not a member.
        let mut s: CompactSet<u32> = [1, 5, 6].into_iter().collect();
        s.erase(1);
        assert_eq!(s.lower_bound(), 2);
        assert!(!s.member(2));
        assert!(s.member(5));
        assert!(s.member(6));

        // A second erase at the stale bound nudges it one further.
        s.erase(2);
        assert_eq!(s.lower_bound(), 3);
        assert_eq!(s.upper_bound(), 6);

        // Same on the upper side.
        let mut t: CompactSet<u32> = [1, 2, 9].into_iter().collect();
        t.erase(9);
        assert_eq!(t.upper_bound(), 8);
        assert!(!t.member(8));
        assert!(t.member(2));
    }

    #[test]
    fn erase_only_adjusts_one_bound() {
        // min == key takes precedence; max is untouched.
        let mut s: CompactSet<i32> = [4, 8].into_iter().collect();
        s.erase(4);
        assert_eq!(s.lower_bound(), 5);
        assert_eq!(s.upper_bound(), 8);
    }

    #[test]
    fn clear_resets() {
        let mut s: CompactSet<u64> = (0..4).collect();
        s.clear();
        assert!(s.is_empty());
        assert!(!s.member(1));
        assert_eq!(s.upper_bound(), u64::MAX);
    }

    #[test]
    fn iteration_is_ordered() {
        let s: CompactSet<u32> = [9, 2, 5].into_iter().collect();
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![2, 5, 9]);
    }

    #[test]
    fn agrees_with_btreeset_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let mut s: CompactSet<u32> = CompactSet::new();
            let mut model = BTreeSet::new();
            for _ in 0..200 {
                let key = rng.gen_range(0..40u32);
                if rng.gen_bool(0.6) {
                    s.insert(key);
                    model.insert(key);
                } else {
                    s.erase(key);
                    model.remove(&key);
                }
                let mut probes: Vec<u32> = (0..42).collect();
                if let (Some(&lo), Some(&hi)) = (model.first(), model.last()) {
                    probes.extend([lo.saturating_sub(1), lo, hi, hi + 1]);
                }
                for k in probes {
                    assert_eq!(s.member(k), model.contains(&k), "key {k}, model {model:?}");
                }
                assert_eq!(s.len(), model.len());
            }
        }
    }
}
