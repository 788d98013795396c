use serde::Serialize;

use crate::models::DifficultyTier;

const STEP_UP_STREAK: u32 = 5;
const STEP_UP_RATE: f64 = 0.8;
const STEP_DOWN_STREAK: u32 = 3;
const STEP_DOWN_RATE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierChange {
    pub from: DifficultyTier,
    pub to: DifficultyTier,
}

/// Session-wide difficulty band for the particle quiz.
///
/// Steps up after 5 correct in a row with a session rate of at least 0.8;
/// steps down after 3 misses in a row or whenever the session rate drops
/// below 0.4. A tier change resets the counter that triggered it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTracker {
    tier: DifficultyTier,
    consecutive_correct: u32,
    consecutive_incorrect: u32,
    attempts: u32,
    correct: u32,
}

impl DifficultyTracker {
    pub fn new(tier: DifficultyTier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    pub fn tier(&self) -> DifficultyTier {
        self.tier
    }

    pub fn session_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }

    pub fn record(&mut self, correct: bool) -> Option<TierChange> {
        self.attempts += 1;
        if correct {
            self.correct += 1;
            self.consecutive_correct += 1;
            self.consecutive_incorrect = 0;
        } else {
            self.consecutive_incorrect += 1;
            self.consecutive_correct = 0;
        }

        let rate = self.session_rate();
        let from = self.tier;

        if self.consecutive_correct >= STEP_UP_STREAK && rate >= STEP_UP_RATE {
            let to = self.tier.harder()?;
            self.tier = to;
            self.consecutive_correct = 0;
        } else if self.consecutive_incorrect >= STEP_DOWN_STREAK || rate < STEP_DOWN_RATE {
            let to = self.tier.easier()?;
            self.tier = to;
            self.consecutive_incorrect = 0;
        } else {
            return None;
        }

        log::info!("particle difficulty {:?} -> {:?} (session rate {:.2})", from, self.tier, rate);
        Some(TierChange { from, to: self.tier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_correct_steps_up_then_three_misses_step_down() {
        let mut tracker = DifficultyTracker::default();
        for _ in 0..4 {
            assert_eq!(tracker.record(true), None);
        }
        assert_eq!(
            tracker.record(true),
            Some(TierChange {
                from: DifficultyTier::Beginner,
                to: DifficultyTier::Intermediate
            })
        );

        assert_eq!(tracker.record(false), None);
        assert_eq!(tracker.record(false), None);
        assert_eq!(
            tracker.record(false),
            Some(TierChange {
                from: DifficultyTier::Intermediate,
                to: DifficultyTier::Beginner
            })
        );
    }

    #[test]
    fn streak_alone_is_not_enough_with_poor_session_rate() {
        let mut tracker = DifficultyTracker::new(DifficultyTier::Beginner);
        for _ in 0..3 {
            tracker.record(false);
        }
        for _ in 0..5 {
            tracker.record(true);
        }
        // 5/8 = 0.625
        assert_eq!(tracker.tier(), DifficultyTier::Beginner);
    }

    #[test]
    fn low_session_rate_steps_down_without_streak() {
        let mut tracker = DifficultyTracker::new(DifficultyTier::Advanced);
        tracker.record(true);
        tracker.record(false);
        tracker.record(false);
        // 1/3 < 0.4 after only two misses in a row
        assert_eq!(tracker.tier(), DifficultyTier::Intermediate);
    }

    #[test]
    fn tiers_are_clamped() {
        let mut tracker = DifficultyTracker::new(DifficultyTier::Advanced);
        for _ in 0..10 {
            tracker.record(true);
        }
        assert_eq!(tracker.tier(), DifficultyTier::Advanced);

        let mut tracker = DifficultyTracker::new(DifficultyTier::Beginner);
        for _ in 0..10 {
            assert_eq!(tracker.record(false), None);
        }
        assert_eq!(tracker.tier(), DifficultyTier::Beginner);
    }
}
