//! Stable item digests and the bounded set that remembers them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Digest of an item's natural id.
pub fn digest_of(id: &str) -> u64 {
    fnv1a64(id.trim().as_bytes())
}

/// Least-recently-seen bounded set of digests.
///
/// Observing a digest that is already present refreshes it; once the set
/// grows past `cap` the stalest digests are evicted first. Serialises as
/// the digest list, oldest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "DigestLog", into = "DigestLog")]
pub struct DigestSet {
    cap: usize,
    tick: u64,
    seen: HashMap<u64, u64>,
    order: BTreeMap<u64, u64>,
}

#[derive(Serialize, Deserialize)]
struct DigestLog {
    cap: usize,
    digests: Vec<u64>,
}

impl DigestSet {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            tick: 0,
            seen: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    /// Record `digest`, returning `true` if it was not already present.
    pub fn observe(&mut self, digest: u64) -> bool {
        self.tick += 1;
        let fresh = match self.seen.insert(digest, self.tick) {
            Some(previous) => {
                self.order.remove(&previous);
                false
            }
            None => true,
        };
        self.order.insert(self.tick, digest);
        self.prune();
        fresh
    }

    pub fn contains(&self, digest: u64) -> bool {
        self.seen.contains_key(&digest)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Digests from least to most recently seen.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.order.values().copied()
    }

    fn prune(&mut self) {
        while self.seen.len() > self.cap {
            match self.order.pop_first() {
                Some((_, stale)) => {
                    self.seen.remove(&stale);
                }
                None => break,
            }
        }
    }
}

impl PartialEq for DigestSet {
    fn eq(&self, other: &Self) -> bool {
        self.cap == other.cap && self.iter().eq(other.iter())
    }
}

impl From<DigestLog> for DigestSet {
    fn from(log: DigestLog) -> Self {
        let mut set = DigestSet::new(log.cap);
        for digest in log.digests {
            set.observe(digest);
        }
        set
    }
}

impl From<DigestSet> for DigestLog {
    fn from(set: DigestSet) -> Self {
        DigestLog {
            cap: set.cap,
            digests: set.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_reference_vectors() {
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a64(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn never_exceeds_cap() {
        let mut set = DigestSet::new(100);
        for id in 0..1_000 {
            set.observe(digest_of(&format!("item-{id}")));
            assert!(set.len() <= 100);
        }
        assert_eq!(set.len(), 100);
        assert!(set.contains(digest_of("item-999")));
        assert!(!set.contains(digest_of("item-0")));
    }

    #[test]
    fn reobserving_refreshes_recency() {
        let mut set = DigestSet::new(2);
        assert!(set.observe(1));
        assert!(set.observe(2));
        assert!(!set.observe(1));
        set.observe(3);
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn serialises_oldest_first_and_restores_order() {
        let mut set = DigestSet::new(3);
        for digest in [5, 6, 7, 5] {
            set.observe(digest);
        }
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["digests"], serde_json::json!([6, 7, 5]));

        let mut restored: DigestSet = serde_json::from_value(value).unwrap();
        assert_eq!(restored, set);
        restored.observe(8);
        assert!(!restored.contains(6));
    }
}
