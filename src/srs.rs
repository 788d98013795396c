use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Leitner-style learning state of a vocabulary item.
///
/// | state      | correct    | incorrect  | interval after entering |
/// |------------|------------|------------|-------------------------|
/// | new        | learning_1 | new        | 0                       |
/// | learning_1 | learning_2 | new        | 30 minutes              |
/// | learning_2 | review_1   | learning_1 | 1 day                   |
/// | review_1   | review_2   | learning_1 | 3 days                  |
/// | review_2   | mastered   | learning_1 | 7 days                  |
/// | mastered   | mastered   | review_1   | 14 days                 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordState {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "learning_1")]
    Learning1,
    #[serde(rename = "learning_2")]
    Learning2,
    #[serde(rename = "review_1")]
    Review1,
    #[serde(rename = "review_2")]
    Review2,
    #[serde(rename = "mastered")]
    Mastered,
}

/// The four coarse buckets reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    New,
    Learning,
    Review,
    Mastered,
}

impl WordState {
    pub const ALL: [WordState; 6] = [
        WordState::New,
        WordState::Learning1,
        WordState::Learning2,
        WordState::Review1,
        WordState::Review2,
        WordState::Mastered,
    ];

    pub fn next(self, correct: bool) -> WordState {
        use WordState::*;
        match (self, correct) {
            (New, true) => Learning1,
            (New, false) => New,
            (Learning1, true) => Learning2,
            (Learning1, false) => New,
            (Learning2, true) => Review1,
            (Learning2, false) => Learning1,
            (Review1, true) => Review2,
            (Review1, false) => Learning1,
            (Review2, true) => Mastered,
            (Review2, false) => Learning1,
            (Mastered, true) => Mastered,
            (Mastered, false) => Review1,
        }
    }

    /// How long after entering this state the item becomes due again.
    pub fn interval(self) -> Duration {
        match self {
            WordState::New => Duration::zero(),
            WordState::Learning1 => Duration::minutes(30),
            WordState::Learning2 => Duration::days(1),
            WordState::Review1 => Duration::days(3),
            WordState::Review2 => Duration::days(7),
            WordState::Mastered => Duration::days(14),
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            WordState::New => Stage::New,
            WordState::Learning1 | WordState::Learning2 => Stage::Learning,
            WordState::Review1 | WordState::Review2 => Stage::Review,
            WordState::Mastered => Stage::Mastered,
        }
    }
}

/// Scheduling record of one vocabulary item, keyed by its Japanese text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub state: WordState,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub correct_streak: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl WordProgress {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: WordState::New,
            next_review_at: now,
            last_reviewed_at: None,
            total_attempts: 0,
            correct_attempts: 0,
            correct_streak: 0,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_at
    }

    /// Apply one answer: move along the transition table and reschedule.
    pub fn apply_answer(&mut self, correct: bool, now: DateTime<Utc>) {
        self.state = self.state.next(correct);
        self.next_review_at = now + self.state.interval();
        self.last_reviewed_at = Some(now);
        self.total_attempts += 1;
        if correct {
            self.correct_attempts += 1;
            self.correct_streak += 1;
        } else {
            self.correct_streak = 0;
        }
    }
}
