use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::models::{Example, VocabularyItem};
use crate::particle::AnswerResult;
use crate::srs::WordProgress;

const WRAP_WIDTH: usize = 40;

pub struct FeedbackGenerator;

impl FeedbackGenerator {
    /// Completed sentence, an underline as wide as the sentence renders, and
    /// the explanation wrapped for a narrow panel.
    pub fn particle_feedback(example: &Example, result: &AnswerResult) -> String {
        let filled = example.filled();
        let underline = "‾".repeat(filled.width());

        let mut msg = if result.correct {
            format!("正解！ 「{}」", result.correct_particle)
        } else {
            format!(
                "不正解。 正しい答えは 「{}」 (you chose 「{}」)",
                result.correct_particle, result.selected
            )
        };

        msg.push('\n');
        msg.push_str(&filled);
        msg.push('\n');
        msg.push_str(&underline);
        msg.push('\n');
        msg.push_str(&example.translation);
        for line in textwrap::wrap(&result.explanation, WRAP_WIDTH) {
            msg.push('\n');
            msg.push_str(&line);
        }
        msg
    }

    pub fn word_feedback(item: &VocabularyItem, progress: &WordProgress, correct: bool, now: DateTime<Utc>) -> String {
        let head = if correct {
            format!("正解！ {} ({}) = {}", item.japanese, item.reading, item.meaning)
        } else {
            format!(
                "不正解。 {} ({}) means \"{}\"",
                item.japanese, item.reading, item.meaning
            )
        };
        format!("{}\n次の復習: {}", head, humanize_until(progress.next_review_at, now))
    }
}

/// Rough "time until" for display, e.g. `30分後` or `3日後`.
pub fn humanize_until(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (at - now).num_minutes();
    if minutes <= 0 {
        "今すぐ".to_string()
    } else if minutes < 60 {
        format!("{}分後", minutes)
    } else if minutes < 24 * 60 {
        format!("{}時間後", minutes / 60)
    } else {
        format!("{}日後", minutes / (24 * 60))
    }
}
