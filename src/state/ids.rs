//! Client identity allocation.

use parking_lot::Mutex;
use std::collections::BTreeSet;

/// Numeric client identity.
pub type ClientId = u64;

/// Hands out the smallest identity not held by a live client.
///
/// Identities are reused only after [`IdAllocator::release`].
#[derive(Debug, Default)]
pub struct IdAllocator {
    in_use: Mutex<BTreeSet<ClientId>>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity the next [`allocate`](Self::allocate) would return.
    pub fn peek(&self) -> ClientId {
        lowest_free(&self.in_use.lock())
    }

    /// Reserve the smallest free identity.
    pub fn allocate(&self) -> ClientId {
        let mut in_use = self.in_use.lock();
        let id = lowest_free(&in_use);
        in_use.insert(id);
        id
    }

    /// Return an identity to the pool. Returns false if it was not held.
    pub fn release(&self, id: ClientId) -> bool {
        self.in_use.lock().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.in_use.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_use.lock().is_empty()
    }
}

fn lowest_free(in_use: &BTreeSet<ClientId>) -> ClientId {
    let mut candidate = 0;
    for &id in in_use {
        if id != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn allocates_sequentially_from_zero() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(), 0);
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn reuses_the_lowest_released_identity() {
        let ids = IdAllocator::new();
        for _ in 0..5 {
            ids.allocate();
        }
        assert!(ids.release(3));
        assert!(ids.release(1));
        assert_eq!(ids.peek(), 1);
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 3);
        assert_eq!(ids.allocate(), 5);
    }

    #[test]
    fn release_is_idempotent() {
        let ids = IdAllocator::new();
        let id = ids.allocate();
        assert!(ids.release(id));
        assert!(!ids.release(id));
        assert!(ids.is_empty());
    }

    #[test]
    fn concurrent_allocations_never_collide() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("thread") {
                assert!(seen.insert(id), "identity {id} handed out twice");
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
