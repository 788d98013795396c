use serde::Serialize;

use crate::clock::Clock;
use crate::data::Catalog;
use crate::feedback::FeedbackGenerator;
use crate::models::{CategoryFilter, DifficultyTier, JlptLevel, VocabularyItem};
use crate::particle::{
    AnswerResult, DifficultyTracker, ParticleSelector, ParticleStats, Question, TierChange,
};
use crate::scheduler::{Batch, DueCounts, WordScheduler};
use crate::srs::WordProgress;
use crate::store::KvStore;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub level: JlptLevel,
    pub batch_size: usize,
    /// Fixed RNG seed for reproducible sessions; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            level: JlptLevel::N5,
            batch_size: 20,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAnswer {
    pub key: String,
    pub progress: WordProgress,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleAnswer {
    #[serde(flatten)]
    pub result: AnswerResult,
    pub feedback: String,
    pub tier: DifficultyTier,
    pub tier_change: Option<TierChange>,
}

/// One learner's study session: glue between user actions and the two
/// scheduling engines.
pub struct StudySession<S, C> {
    words: WordScheduler<S, C>,
    particles: ParticleSelector<S, C>,
    catalog: Catalog,
    clock: C,
    level: JlptLevel,
    filter: CategoryFilter,
    batch_size: usize,
    batch: Batch,
    cursor: usize,
    difficulty: DifficultyTracker,
    last_question: Option<Question>,
}

impl<S: KvStore, C: Clock> StudySession<S, C> {
    pub async fn new(store: S, clock: C, catalog: Catalog, settings: SessionSettings) -> Self {
        let (words, particles) = match settings.seed {
            Some(seed) => (
                WordScheduler::with_seed(store.clone(), clock.clone(), seed),
                ParticleSelector::with_seed(store, clock.clone(), seed.wrapping_add(1)),
            ),
            None => (
                WordScheduler::new(store.clone(), clock.clone()),
                ParticleSelector::new(store, clock.clone()),
            ),
        };

        let mut session = Self {
            words,
            particles,
            catalog,
            clock,
            level: settings.level,
            filter: CategoryFilter::All,
            batch_size: settings.batch_size.max(1),
            batch: Batch::default(),
            cursor: 0,
            difficulty: DifficultyTracker::default(),
            last_question: None,
        };

        session
            .words
            .initialize(session.catalog.vocabulary(session.level))
            .await;
        session
            .particles
            .initialize(session.catalog.particles().clone())
            .await;
        session
    }

    pub fn level(&self) -> JlptLevel {
        self.level
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn difficulty(&self) -> DifficultyTier {
        self.difficulty.tier()
    }

    pub fn words(&self) -> &WordScheduler<S, C> {
        &self.words
    }

    pub fn particles(&self) -> &ParticleSelector<S, C> {
        &self.particles
    }

    /// Switch the active vocabulary to `level`. Progress of words outside
    /// the new level is pruned.
    pub async fn switch_level(&mut self, level: JlptLevel) {
        log::info!("switching level {} -> {}", self.level, level);
        self.level = level;
        self.words.initialize(self.catalog.vocabulary(level)).await;
        self.clear_batch();
        self.last_question = None;
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.clear_batch();
    }

    pub fn start_quiz(&mut self) -> &Batch {
        self.batch = self.words.select_batch(self.batch_size, &self.filter);
        self.cursor = 0;
        &self.batch
    }

    /// Cards of the current batch not yet answered.
    pub fn remaining(&self) -> &[VocabularyItem] {
        self.batch.items.get(self.cursor..).unwrap_or_default()
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn current_card(&self) -> Option<&VocabularyItem> {
        self.batch.items.get(self.cursor)
    }

    /// Answer the current card and move on, fetching a fresh batch once the
    /// current one is exhausted.
    pub async fn answer_card(&mut self, correct: bool) -> Option<WordAnswer> {
        let key = self.current_card()?.japanese.clone();
        let answer = self.record_word(&key, correct).await;
        self.cursor += 1;
        if self.cursor >= self.batch.items.len() {
            self.start_quiz();
        }
        answer
    }

    /// Answer any card by key, e.g. from a client holding its own batch.
    pub async fn answer_word(&mut self, key: &str, correct: bool) -> Option<WordAnswer> {
        let answer = self.record_word(key, correct).await;
        if let Some(pos) = self.batch.items.iter().position(|item| item.japanese == key) {
            self.batch.items.remove(pos);
            if pos < self.cursor {
                self.cursor -= 1;
            }
        }
        answer
    }

    pub fn word_stats(&self) -> DueCounts {
        self.words.due_counts(&self.filter)
    }

    pub async fn next_particle_question(&mut self) -> Option<Question> {
        let question = self
            .particles
            .select_question(self.level, self.difficulty.tier())
            .await;
        self.last_question = question.clone();
        question
    }

    pub async fn answer_particle(&mut self, selected: &str) -> Option<ParticleAnswer> {
        let result = self.particles.validate_answer(selected).await?;
        let tier_change = self.difficulty.record(result.correct);

        let feedback = match self.last_question.take() {
            Some(question) if question.id == result.question_id => {
                FeedbackGenerator::particle_feedback(&question.example, &result)
            }
            _ => result.explanation.clone(),
        };

        Some(ParticleAnswer {
            result,
            feedback,
            tier: self.difficulty.tier(),
            tier_change,
        })
    }

    pub fn current_question_id(&self) -> Option<uuid::Uuid> {
        self.particles.current_question_id()
    }

    pub fn particle_stats(&self) -> ParticleStats {
        self.particles.stats(self.level)
    }

    /// Wipe both engines' history and restart the difficulty band.
    pub async fn reset(&mut self) {
        self.words.reset().await;
        self.particles.reset().await;
        self.difficulty = DifficultyTracker::default();
        self.last_question = None;
        self.clear_batch();
    }

    async fn record_word(&mut self, key: &str, correct: bool) -> Option<WordAnswer> {
        let progress = self.words.record_answer(key, correct).await?;
        let feedback = match self.words.items().iter().find(|item| item.japanese == key) {
            Some(item) => FeedbackGenerator::word_feedback(item, &progress, correct, self.clock.now()),
            None => String::new(),
        };
        Some(WordAnswer {
            key: key.to_string(),
            progress,
            feedback,
        })
    }

    fn clear_batch(&mut self) {
        self.batch = Batch::default();
        self.cursor = 0;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
