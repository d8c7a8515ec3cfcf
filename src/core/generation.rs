use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Ticket handed out for one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    key: String,
    id: u64,
}

impl Generation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A search registered with [`RequestGenerations`]
///
/// Dropping the guard finishes the search, including when the future
/// holding it is cancelled.
#[must_use = "the search is finished as soon as the guard is dropped"]
#[derive(Debug)]
pub struct GenerationGuard<'a> {
    generations: &'a RequestGenerations,
    generation: Generation,
}

impl GenerationGuard<'_> {
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// True while no newer search was started for the same key
    pub fn is_current(&self) -> bool {
        self.generations.is_current(&self.generation)
    }
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.generations.finish(&self.generation);
    }
}

/// Tracks the latest search per client so that a slow, superseded search
/// cannot deliver results after a newer one was started.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    next: AtomicU64,
    latest: Mutex<HashMap<String, u64>>,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    fn latest(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        // The map stays consistent even if a holder panicked
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a search for `key`, superseding any search still running for it
    pub fn begin(&self, key: &str) -> GenerationGuard<'_> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest().insert(key.to_string(), id);

        GenerationGuard {
            generations: self,
            generation: Generation {
                key: key.to_string(),
                id,
            },
        }
    }

    /// True while no newer search was started for the same key
    pub fn is_current(&self, generation: &Generation) -> bool {
        self.latest().get(&generation.key) == Some(&generation.id)
    }

    /// Forget the key once its latest search is done
    fn finish(&self, generation: &Generation) {
        let mut latest = self.latest();
        if latest.get(&generation.key) == Some(&generation.id) {
            latest.remove(&generation.key);
        }
    }

    /// Number of keys with a search in flight
    pub fn in_flight(&self) -> usize {
        self.latest().len()
    }
}
