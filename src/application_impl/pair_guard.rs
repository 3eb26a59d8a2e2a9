use crate::domain_model::FollowPair;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per `(follower, followed)` pair that has a command in
/// flight. `tokio::sync::Mutex` queues waiters FIFO, so commands on the same
/// pair run in the order they were issued.
#[derive(Default)]
pub struct PairGuards {
    slots: DashMap<FollowPair, Arc<Mutex<()>>>,
}

impl PairGuards {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, pair: FollowPair) -> PairLease<'_> {
        let slot = {
            let entry = self.slots.entry(pair.clone()).or_default();
            Arc::clone(&*entry)
        };
        // the lease exists before the wait so a caller dropped while queued
        // still cleans up its slot
        let mut lease = PairLease {
            guards: self,
            pair,
            held: None,
        };
        lease.held = Some(slot.lock_owned().await);
        lease
    }

    /// Pairs with a command running or queued.
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }
}

/// Releases the pair on drop, including when the owning future is abandoned.
pub struct PairLease<'a> {
    guards: &'a PairGuards,
    pair: FollowPair,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for PairLease<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        // the map's own Arc is the last one when nobody is queued
        self.guards
            .slots
            .remove_if(&self.pair, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pair(a: &str, b: &str) -> FollowPair {
        FollowPair::new(a.into(), b.into())
    }

    #[tokio::test]
    async fn slot_is_removed_after_release() {
        let guards = PairGuards::new();
        {
            let _lease = guards.acquire(pair("a", "b")).await;
            assert_eq!(guards.in_flight(), 1);
        }
        assert_eq!(guards.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_pairs_do_not_block_each_other() {
        let guards = PairGuards::new();
        let _ab = guards.acquire(pair("a", "b")).await;
        let ba = tokio::time::timeout(Duration::from_millis(50), guards.acquire(pair("b", "a"))).await;
        assert!(ba.is_ok());
    }

    #[tokio::test]
    async fn same_pair_waits_for_release() {
        let guards = Arc::new(PairGuards::new());
        let first = guards.acquire(pair("a", "b")).await;

        let waiter = {
            let guards = guards.clone();
            tokio::spawn(async move {
                let _lease = guards.acquire(pair("a", "b")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(guards.in_flight(), 0);
    }

    #[tokio::test]
    async fn abandoned_holder_releases_the_pair() {
        let guards = PairGuards::new();
        let abandoned = async {
            let _lease = guards.acquire(pair("a", "b")).await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        };
        let _ = tokio::time::timeout(Duration::from_millis(10), abandoned).await;

        let next = tokio::time::timeout(Duration::from_millis(50), guards.acquire(pair("a", "b"))).await;
        assert!(next.is_ok());
    }
}
