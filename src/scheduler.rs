use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::clock::Clock;
use crate::models::{CategoryFilter, VocabularyItem};
use crate::persist::{self, WORD_PROGRESS_KEY};
use crate::shuffle::interleave_by_category;
use crate::srs::{Stage, WordProgress, WordState};
use crate::store::KvStore;

/// Share of a batch reserved for due items.
const DUE_SHARE: f64 = 0.6;

/// A study batch plus how many of its items were actually due.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub items: Vec<VocabularyItem>,
    pub due_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCounts {
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub mastered: usize,
    pub due: usize,
    pub total: usize,
}

/// Spaced-repetition scheduler for vocabulary items.
///
/// Owns the progress map for the active vocabulary set. Every mutation goes
/// through [`WordScheduler::record_answer`], [`WordScheduler::initialize`] or
/// [`WordScheduler::reset`] and is followed by a best-effort write.
pub struct WordScheduler<S, C> {
    store: S,
    clock: C,
    rng: ChaCha8Rng,
    items: Vec<VocabularyItem>,
    progress: HashMap<String, WordProgress>,
    loaded: bool,
}

impl<S: KvStore, C: Clock> WordScheduler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_rng(store, clock, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(store: S, clock: C, seed: u64) -> Self {
        Self::with_rng(store, clock, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(store: S, clock: C, rng: ChaCha8Rng) -> Self {
        Self {
            store,
            clock,
            rng,
            items: Vec::new(),
            progress: HashMap::new(),
            loaded: false,
        }
    }

    /// Make `items` the active set: create records for unseen items and
    /// prune records of items no longer present. Safe to call repeatedly.
    ///
    /// Persisted state is read on the first call only; afterwards memory is
    /// authoritative, so a failed write earlier in the session is not undone.
    pub async fn initialize(&mut self, items: Vec<VocabularyItem>) {
        if !self.loaded {
            self.progress = persist::load(&self.store, WORD_PROGRESS_KEY)
                .await
                .unwrap_or_default();
            self.loaded = true;
        }

        let now = self.clock.now();
        let before = self.progress.len();
        {
            let active: HashSet<&str> = items.iter().map(|item| item.key()).collect();
            self.progress.retain(|key, _| active.contains(key.as_str()));
        }
        let pruned = before - self.progress.len();

        let mut created = 0;
        for item in &items {
            if !self.progress.contains_key(item.key()) {
                self.progress
                    .insert(item.key().to_string(), WordProgress::new(now));
                created += 1;
            }
        }

        log::info!(
            "word scheduler initialized: {} items, {} created, {} pruned",
            items.len(),
            created,
            pruned
        );

        self.items = items;
        self.persist().await;
    }

    /// Record one answer. Returns the updated record, or `None` when the key
    /// has no progress record (nothing is changed in that case).
    pub async fn record_answer(&mut self, key: &str, correct: bool) -> Option<WordProgress> {
        let now = self.clock.now();
        let (from, updated) = match self.progress.get_mut(key) {
            Some(progress) => {
                let from = progress.state;
                progress.apply_answer(correct, now);
                (from, progress.clone())
            }
            None => {
                log::warn!("record_answer: no progress record for '{}'", key);
                return None;
            }
        };
        log::debug!(
            "'{}' answered {}: {:?} -> {:?}, next review {}",
            key,
            if correct { "correctly" } else { "incorrectly" },
            from,
            updated.state,
            updated.next_review_at
        );

        self.persist().await;
        Some(updated)
    }

    /// Compose a batch of at most `size` distinct items: up to 60% due items,
    /// then new items, then not-yet-due items, interleaved by category.
    pub fn select_batch(&mut self, size: usize, filter: &CategoryFilter) -> Batch {
        let now = self.clock.now();
        let pool = self.filtered(filter);

        let mut due = Vec::new();
        let mut fresh = Vec::new();
        let mut future = Vec::new();
        for item in pool {
            let Some(progress) = self.progress.get(item.key()) else {
                log::warn!("select_batch: no progress record for '{}'", item.key());
                continue;
            };
            if progress.is_due(now) {
                due.push(item.clone());
            } else if progress.total_attempts == 0 && progress.state == WordState::New {
                fresh.push(item.clone());
            } else {
                future.push(item.clone());
            }
        }

        let due = interleave_by_category(due, |item| item.category, &mut self.rng);
        let fresh = interleave_by_category(fresh, |item| item.category, &mut self.rng);
        let future = interleave_by_category(future, |item| item.category, &mut self.rng);

        let due_quota = (size as f64 * DUE_SHARE).ceil() as usize;
        let mut composed: Vec<VocabularyItem> = due.into_iter().take(due_quota.min(size)).collect();
        let due_count = composed.len();

        let remaining = size - composed.len();
        composed.extend(fresh.into_iter().chain(future).take(remaining));

        let items = interleave_by_category(composed, |item| item.category, &mut self.rng);
        log::debug!(
            "selected batch of {} ({} due) from {} candidates",
            items.len(),
            due_count,
            self.items.len()
        );

        Batch { items, due_count }
    }

    /// Count items of the filtered set per coarse stage. Read only.
    pub fn due_counts(&self, filter: &CategoryFilter) -> DueCounts {
        let now = self.clock.now();
        let mut counts = DueCounts::default();
        for item in self.filtered(filter) {
            let Some(progress) = self.progress.get(item.key()) else {
                continue;
            };
            match progress.state.stage() {
                Stage::New => counts.new += 1,
                Stage::Learning => counts.learning += 1,
                Stage::Review => counts.review += 1,
                Stage::Mastered => counts.mastered += 1,
            }
            if progress.is_due(now) {
                counts.due += 1;
            }
            counts.total += 1;
        }
        counts
    }

    pub fn progress(&self, key: &str) -> Option<&WordProgress> {
        self.progress.get(key)
    }

    pub fn items(&self) -> &[VocabularyItem] {
        &self.items
    }

    /// Forget all history and start every active item from `new`.
    pub async fn reset(&mut self) {
        let now = self.clock.now();
        self.progress = self
            .items
            .iter()
            .map(|item| (item.key().to_string(), WordProgress::new(now)))
            .collect();
        log::info!("word progress reset for {} items", self.items.len());
        self.persist().await;
    }

    /// The active items matching `filter`, or every active item when the
    /// filter matches none of them.
    fn filtered(&self, filter: &CategoryFilter) -> Vec<&VocabularyItem> {
        let matching: Vec<&VocabularyItem> = self
            .items
            .iter()
            .filter(|item| filter.matches(item.category))
            .collect();
        if matching.is_empty() && !self.items.is_empty() {
            log::debug!("category filter {:?} matched nothing; using all items", filter);
            return self.items.iter().collect();
        }
        matching
    }

    async fn persist(&self) {
        persist::save(&self.store, WORD_PROGRESS_KEY, &self.progress).await;
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
