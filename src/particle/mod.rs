//! Particle quiz engine.
//!
//! Progress is tracked at two levels: a coarse state per particle and
//! attempt counters plus a cooldown per example sentence. Questions are drawn
//! by weighted random selection that favours weak particles, weak examples
//! and examples not seen for a while. Recently shown examples and examples
//! still cooling down are excluded.

pub mod difficulty;
pub mod progress;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{example_key, DifficultyTier, Example, JlptLevel, ParticleDefinition};
use crate::persist::{self, PARTICLE_PROGRESS_KEY};
use crate::store::KvStore;

pub use difficulty::{DifficultyTracker, TierChange};
pub use progress::{
    ExampleProgress, ParticleProgress, ParticleState, RecencyWindow, PRIOR_SUCCESS_RATE,
    RECENCY_CAPACITY,
};

/// Particles per level offered at the beginner tier.
pub const BEGINNER_PARTICLES: usize = 5;
pub const OPTION_COUNT: usize = 4;

const PARTICLE_WEIGHT: f64 = 0.4;
const EXAMPLE_WEIGHT: f64 = 0.4;
const TIME_WEIGHT: f64 = 0.2;
const MIN_WEAKNESS: f64 = 0.1;
const MAX_TIME_WEIGHT: f64 = 2.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Correct answers are held back longer than misses so mistakes resurface sooner.
fn cooldown(correct: bool) -> Duration {
    if correct {
        Duration::minutes(30)
    } else {
        Duration::minutes(10)
    }
}

pub type ParticleSet = BTreeMap<JlptLevel, Vec<ParticleDefinition>>;

/// Everything the selector persists, in one blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleBook {
    #[serde(default)]
    pub particle_progress: HashMap<String, ParticleProgress>,
    #[serde(default)]
    pub example_progress: HashMap<String, ExampleProgress>,
    #[serde(default)]
    pub recently_shown: RecencyWindow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    /// `particle#index` of the example being asked.
    pub key: String,
    pub particle: String,
    pub reading: String,
    pub function: String,
    pub description: String,
    pub example: Example,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: Uuid,
    pub key: String,
    pub correct: bool,
    pub selected: String,
    pub correct_particle: String,
    pub explanation: String,
    pub particle_state: Option<ParticleState>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleStats {
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub mastered: usize,
    pub attempts: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone)]
struct ActiveQuestion {
    id: Uuid,
    key: String,
    particle: String,
    example: Example,
}

pub struct ParticleSelector<S, C> {
    store: S,
    clock: C,
    rng: ChaCha8Rng,
    levels: ParticleSet,
    book: ParticleBook,
    current: Option<ActiveQuestion>,
    loaded: bool,
}

impl<S: KvStore, C: Clock> ParticleSelector<S, C> {
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
            levels: ParticleSet::new(),
            book: ParticleBook::default(),
            current: None,
            loaded: false,
        }
    }

    /// Load persisted progress (first call only) and add records for any
    /// particle or example that has none. Existing history is never
    /// overwritten and unknown records are kept.
    pub async fn initialize(&mut self, levels: ParticleSet) {
        if !self.loaded {
            self.book = persist::load(&self.store, PARTICLE_PROGRESS_KEY)
                .await
                .unwrap_or_default();
            self.loaded = true;
        }

        let created = fill_gaps(&mut self.book, &levels);
        log::info!(
            "particle selector initialized: {} levels, {} records created",
            levels.len(),
            created
        );

        self.levels = levels;
        self.persist().await;
    }

    /// Pick the next question for `level`. Returns `None` only when the level
    /// has no examples at all.
    pub async fn select_question(
        &mut self,
        level: JlptLevel,
        tier: DifficultyTier,
    ) -> Option<Question> {
        let now = self.clock.now();
        let Some(all) = self.levels.get(&level) else {
            log::warn!("no particles defined for {}", level);
            return None;
        };
        let candidates = if tier == DifficultyTier::Beginner {
            &all[..all.len().min(BEGINNER_PARTICLES)]
        } else {
            &all[..]
        };

        let mut pool = eligible(candidates, &self.book, now);
        if pool.is_empty() {
            log::debug!("candidate pool for {} empty; clearing cooldowns and recency", level);
            for example in self.book.example_progress.values_mut() {
                example.cooldown_until = DateTime::default();
            }
            self.book.recently_shown.clear();
            pool = eligible(candidates, &self.book, now);
        }
        if pool.is_empty() {
            log::warn!("no question available for {} ({:?})", level, tier);
            return None;
        }

        let weights: Vec<f64> = pool
            .iter()
            .map(|&(p, e)| selection_weight(&candidates[p], e, &self.book, now))
            .collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        let (p, e) = pool[dist.sample(&mut self.rng)];

        let definition = &candidates[p];
        let example = definition.examples[e].clone();
        let key = definition.example_key(e);
        let options = build_options(&example, candidates, &self.levels, &mut self.rng);

        let question = Question {
            id: Uuid::new_v4(),
            key: key.clone(),
            particle: definition.particle.clone(),
            reading: definition.reading.clone(),
            function: definition.function.clone(),
            description: definition.description.clone(),
            example: example.clone(),
            options,
        };

        self.book.recently_shown.push(key.clone());
        self.book
            .example_progress
            .entry(key.clone())
            .or_default()
            .last_seen_at = Some(now);
        self.book
            .particle_progress
            .entry(question.particle.clone())
            .or_default()
            .last_seen_at = Some(now);

        self.current = Some(ActiveQuestion {
            id: question.id,
            key,
            particle: question.particle.clone(),
            example,
        });

        log::debug!("selected {} from {} candidates", question.key, pool.len());
        self.persist().await;
        Some(question)
    }

    /// Check `selected` against the last returned question and record the
    /// outcome. Returns `None` when there is no question awaiting an answer.
    pub async fn validate_answer(&mut self, selected: &str) -> Option<AnswerResult> {
        let Some(active) = self.current.take() else {
            log::warn!("validate_answer called with no active question");
            return None;
        };

        let now = self.clock.now();
        let correct = selected == active.example.correct;

        let particle_state = match self.book.particle_progress.get_mut(&active.particle) {
            Some(progress) => {
                let before = progress.state;
                progress.record(correct);
                if progress.state != before {
                    log::info!("particle {} {:?} -> {:?}", active.particle, before, progress.state);
                }
                Some(progress.state)
            }
            None => {
                log::warn!("no progress record for particle '{}'", active.particle);
                None
            }
        };

        match self.book.example_progress.get_mut(&active.key) {
            Some(progress) => {
                progress.attempts += 1;
                if correct {
                    progress.correct += 1;
                }
                progress.cooldown_until = now + cooldown(correct);
            }
            None => log::warn!("no progress record for example '{}'", active.key),
        }

        self.persist().await;

        Some(AnswerResult {
            question_id: active.id,
            key: active.key,
            correct,
            selected: selected.to_string(),
            correct_particle: active.example.correct.clone(),
            explanation: active.example.explanation.clone(),
            particle_state,
        })
    }

    pub fn current_question_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|q| q.id)
    }

    pub fn particle_progress(&self, particle: &str) -> Option<&ParticleProgress> {
        self.book.particle_progress.get(particle)
    }

    pub fn example_progress(&self, key: &str) -> Option<&ExampleProgress> {
        self.book.example_progress.get(key)
    }

    pub fn recently_shown(&self) -> &RecencyWindow {
        &self.book.recently_shown
    }

    pub fn stats(&self, level: JlptLevel) -> ParticleStats {
        let mut stats = ParticleStats::default();
        for definition in self.levels.get(&level).into_iter().flatten() {
            let Some(progress) = self.book.particle_progress.get(&definition.particle) else {
                continue;
            };
            match progress.state {
                ParticleState::New => stats.new += 1,
                ParticleState::Learning => stats.learning += 1,
                ParticleState::Review => stats.review += 1,
                ParticleState::Mastered => stats.mastered += 1,
            }
            stats.attempts += progress.attempts;
            stats.correct += progress.correct;
        }
        if stats.attempts > 0 {
            stats.accuracy = stats.correct as f64 / stats.attempts as f64;
        }
        stats
    }

    /// Forget all particle history, cooldowns and the recency window.
    pub async fn reset(&mut self) {
        self.book = ParticleBook::default();
        self.current = None;
        fill_gaps(&mut self.book, &self.levels);
        log::info!("particle progress reset");
        self.persist().await;
    }

    async fn persist(&self) {
        persist::save(&self.store, PARTICLE_PROGRESS_KEY, &self.book).await;
    }
}

fn fill_gaps(book: &mut ParticleBook, levels: &ParticleSet) -> usize {
    let mut created = 0;
    for definition in levels.values().flatten() {
        if !book.particle_progress.contains_key(&definition.particle) {
            book.particle_progress
                .insert(definition.particle.clone(), ParticleProgress::default());
            created += 1;
        }
        for index in 0..definition.examples.len() {
            let key = definition.example_key(index);
            if !book.example_progress.contains_key(&key) {
                book.example_progress.insert(key, ExampleProgress::default());
                created += 1;
            }
        }
    }
    created
}

/// `(particle index, example index)` pairs neither recently shown nor cooling down.
fn eligible(
    candidates: &[ParticleDefinition],
    book: &ParticleBook,
    now: DateTime<Utc>,
) -> Vec<(usize, usize)> {
    let mut pool = Vec::new();
    for (p, definition) in candidates.iter().enumerate() {
        for e in 0..definition.examples.len() {
            let key = example_key(&definition.particle, e);
            if book.recently_shown.contains(&key) {
                continue;
            }
            let cooling = book
                .example_progress
                .get(&key)
                .is_some_and(|progress| progress.is_cooling_down(now));
            if !cooling {
                pool.push((p, e));
            }
        }
    }
    pool
}

fn weakness(success_rate: f64) -> f64 {
    (1.0 - success_rate).max(MIN_WEAKNESS)
}

fn selection_weight(
    definition: &ParticleDefinition,
    index: usize,
    book: &ParticleBook,
    now: DateTime<Utc>,
) -> f64 {
    let particle_rate = book
        .particle_progress
        .get(&definition.particle)
        .map_or(PRIOR_SUCCESS_RATE, ParticleProgress::success_rate);
    let example = book.example_progress.get(&definition.example_key(index));
    let example_rate = example.map_or(PRIOR_SUCCESS_RATE, ExampleProgress::success_rate);

    let time_weight = match example.and_then(|progress| progress.last_seen_at) {
        Some(seen) => {
            let hours = (now - seen).num_milliseconds().max(0) as f64 / MS_PER_HOUR;
            hours.min(MAX_TIME_WEIGHT)
        }
        None => MAX_TIME_WEIGHT,
    };

    PARTICLE_WEIGHT * weakness(particle_rate)
        + EXAMPLE_WEIGHT * weakness(example_rate)
        + TIME_WEIGHT * time_weight
}

/// The correct particle plus three distractors, shuffled. Distractors come
/// from the other candidate particles first, then the example's own
/// distractor pool, then every known particle.
fn build_options<R: Rng>(
    example: &Example,
    candidates: &[ParticleDefinition],
    levels: &ParticleSet,
    rng: &mut R,
) -> Vec<String> {
    let mut options = vec![example.correct.clone()];

    let mut same_level: Vec<&str> = Vec::new();
    for definition in candidates {
        let particle = definition.particle.as_str();
        if particle != example.correct && !same_level.contains(&particle) {
            same_level.push(particle);
        }
    }
    for particle in same_level.choose_multiple(rng, OPTION_COUNT - 1) {
        options.push(particle.to_string());
    }

    let backfill_sources: [Vec<&str>; 2] = [
        example.distractors.iter().map(String::as_str).collect(),
        levels
            .values()
            .flatten()
            .map(|definition| definition.particle.as_str())
            .collect(),
    ];
    for source in backfill_sources {
        if options.len() >= OPTION_COUNT {
            break;
        }
        let mut spare: Vec<&str> = Vec::new();
        for particle in source {
            if !options.iter().any(|o| o == particle) && !spare.contains(&particle) {
                spare.push(particle);
            }
        }
        let needed = OPTION_COUNT - options.len();
        for particle in spare.choose_multiple(rng, needed) {
            options.push(particle.to_string());
        }
    }

    options.shuffle(rng);
    options
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
