use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Snapshot helpers for `DashMap`.
///
/// `DashMap::get()` and `DashMap::iter()` return guards that hold a shard
/// lock. Removing from the same map while such a guard is alive deadlocks,
/// so every scan over clients or channels clones what it needs first and
/// acts on the copy.
pub trait DashMapExt<K, V> {
    /// Clone the value for `key` (dropping the guard immediately).
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone;

    /// Clone every value (dropping guards immediately).
    fn values_cloned(&self) -> Vec<V>
    where
        V: Clone;
}

impl<K, V> DashMapExt<K, V> for DashMap<K, V>
where
    K: Eq + Hash,
{
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).map(|r| r.value().clone())
    }

    fn values_cloned(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|e| e.value().clone()).collect()
    }
}
