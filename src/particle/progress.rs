use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Success rate assumed before the first attempt.
pub const PRIOR_SUCCESS_RATE: f64 = 0.5;

pub const RECENCY_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleState {
    #[default]
    New,
    Learning,
    Review,
    Mastered,
}

impl ParticleState {
    /// Re-evaluate the state after one answer, using the lifetime success
    /// rate *including* that answer.
    ///
    /// Promotion needs a higher rate (and more attempts) than demotion, so a
    /// particle hovering around one threshold does not flip back and forth.
    pub fn after_answer(self, correct: bool, attempts: u32, correct_count: u32) -> ParticleState {
        let rate = success_rate(attempts, correct_count);
        match (self, correct) {
            (ParticleState::New, true) if rate >= 0.6 => ParticleState::Learning,
            (ParticleState::Learning, true) if rate >= 0.8 && attempts >= 3 => ParticleState::Review,
            (ParticleState::Review, true) if rate >= 0.9 && attempts >= 5 => ParticleState::Mastered,
            (ParticleState::Mastered, false) if rate < 0.8 => ParticleState::Review,
            (ParticleState::Review, false) if rate < 0.6 => ParticleState::Learning,
            (state, _) => state,
        }
    }
}

/// `correct / attempts`, or the 0.5 prior when nothing has been attempted.
pub fn success_rate(attempts: u32, correct: u32) -> f64 {
    if attempts == 0 {
        PRIOR_SUCCESS_RATE
    } else {
        correct as f64 / attempts as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleProgress {
    pub state: ParticleState,
    pub attempts: u32,
    pub correct: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl ParticleProgress {
    pub fn success_rate(&self) -> f64 {
        success_rate(self.attempts, self.correct)
    }

    pub fn record(&mut self, correct: bool) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
        self.state = self.state.after_answer(correct, self.attempts, self.correct);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleProgress {
    pub attempts: u32,
    pub correct: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Not selectable before this instant. Epoch means "no cooldown".
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub cooldown_until: DateTime<Utc>,
}

impl ExampleProgress {
    pub fn success_rate(&self) -> f64 {
        success_rate(self.attempts, self.correct)
    }

    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        now < self.cooldown_until
    }
}

/// Fixed-capacity FIFO of recently shown example keys with O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RecencyWindow {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl RecencyWindow {
    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    /// Append `key`, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, key: String) {
        if self.members.contains(&key) {
            self.order.retain(|existing| existing != &key);
        } else {
            self.members.insert(key.clone());
        }
        self.order.push_back(key);

        while self.order.len() > RECENCY_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for RecencyWindow {
    fn from(keys: Vec<String>) -> Self {
        let mut window = RecencyWindow::default();
        for key in keys {
            window.push(key);
        }
        window
    }
}

impl From<RecencyWindow> for Vec<String> {
    fn from(window: RecencyWindow) -> Self {
        window.order.into_iter().collect()
    }
}
