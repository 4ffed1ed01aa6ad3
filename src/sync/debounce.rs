//! Keyed arena of cancelable delayed tasks.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;

struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Arena<K> {
    pending: HashMap<K, Slot>,
    generation: u64,
}

/// Runs at most one delayed task per key; scheduling again for a key cancels
/// the task waiting under it and restarts the delay
pub struct Debouncer<K> {
    arena: Arc<Mutex<Arena<K>>>,
}

impl<K> Clone for Debouncer<K> {
    fn clone(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
        }
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            arena: Arc::new(Mutex::new(Arena {
                pending: HashMap::new(),
                generation: 0,
            })),
        }
    }

    /// Schedules `task` to run once `delay` passes without another schedule
    /// for the same key
    pub fn schedule<F>(&self, key: K, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut arena = lock(&self.arena);
        arena.generation += 1;
        let generation = arena.generation;

        let shared = Arc::clone(&self.arena);
        let fire_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                // once started the task is no longer cancelable
                let mut arena = lock(&shared);
                let ours = arena
                    .pending
                    .get(&fire_key)
                    .is_some_and(|slot| slot.generation == generation);
                if !ours {
                    return;
                }
                arena.pending.remove(&fire_key);
            }
            task.await;
        });

        if let Some(previous) = arena.pending.insert(key, Slot { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Cancels the task waiting under `key`
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.arena).pending.remove(key) {
            Some(slot) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, slot) in lock(&self.arena).pending.drain() {
            slot.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.arena).pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.arena).pending.len()
    }
}

fn lock<K>(arena: &Mutex<Arena<K>>) -> MutexGuard<'_, Arena<K>> {
    arena.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
