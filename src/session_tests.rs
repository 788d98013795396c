use std::collections::BTreeMap;

use chrono::{DateTime, Duration};

use super::*;
use crate::clock::ManualClock;
use crate::models::Category;
use crate::particle::ParticleSet;
use crate::srs::WordState;
use crate::store::MemoryStore;

fn word(japanese: &str, category: Category) -> VocabularyItem {
    VocabularyItem {
        japanese: japanese.to_string(),
        reading: japanese.to_string(),
        meaning: japanese.to_string(),
        category,
    }
}

fn abc_catalog() -> Catalog {
    let vocabulary = BTreeMap::from([(
        JlptLevel::N5,
        vec![
            word("A", Category::Noun),
            word("B", Category::Verb),
            word("C", Category::IAdjective),
        ],
    )]);
    Catalog::new(vocabulary, ParticleSet::new())
}

async fn session(catalog: Catalog) -> (StudySession<MemoryStore, ManualClock>, ManualClock) {
    let clock = ManualClock::new(DateTime::from_timestamp_millis(1_704_067_200_000).unwrap());
    let settings = SessionSettings {
        level: JlptLevel::N5,
        batch_size: 10,
        seed: Some(42),
    };
    let session = StudySession::new(MemoryStore::new(), clock.clone(), catalog, settings).await;
    (session, clock)
}

#[tokio::test]
async fn test_answered_word_leaves_due_bucket() {
    let (mut session, clock) = session(abc_catalog()).await;

    let batch = session.start_quiz().clone();
    assert_eq!(batch.items.len(), 3);
    assert_eq!(batch.due_count, 3);

    let answer = session.answer_word("A", true).await.unwrap();
    assert_eq!(answer.progress.state, WordState::Learning1);
    assert_eq!(answer.progress.next_review_at, clock.now() + Duration::minutes(30));

    let batch = session.start_quiz().clone();
    assert_eq!(batch.due_count, 2);
    assert_eq!(session.word_stats().due, 2);
    let a = session.words().progress("A").unwrap();
    assert!(!a.is_due(clock.now()));
    for key in ["B", "C"] {
        assert!(session.words().progress(key).unwrap().is_due(clock.now()));
    }
}

#[tokio::test]
async fn test_answer_card_walks_the_batch_and_refills() {
    let (mut session, _) = session(abc_catalog()).await;
    session.start_quiz();

    let mut answered = Vec::new();
    for _ in 0..3 {
        let key = session.current_card().unwrap().japanese.clone();
        session.answer_card(true).await.unwrap();
        answered.push(key);
    }
    answered.sort();
    assert_eq!(answered, vec!["A", "B", "C"]);

    // Exhausted deck was refilled with the not-yet-due items.
    assert_eq!(session.batch().items.len(), 3);
    assert_eq!(session.batch().due_count, 0);
}

#[tokio::test]
async fn test_answer_word_removes_card_from_batch() {
    let (mut session, _) = session(abc_catalog()).await;
    session.start_quiz();
    session.answer_word("B", false).await.unwrap();
    assert!(session.remaining().iter().all(|item| item.japanese != "B"));
    assert_eq!(session.remaining().len(), 2);
}

#[tokio::test]
async fn test_unknown_word_answer_is_ignored() {
    let (mut session, _) = session(abc_catalog()).await;
    assert!(session.answer_word("Z", true).await.is_none());
}

#[tokio::test]
async fn test_filter_change_clears_batch() {
    let (mut session, _) = session(abc_catalog()).await;
    session.start_quiz();
    session.set_filter(CategoryFilter::from_categories([Category::Verb]));
    assert!(session.batch().items.is_empty());

    let batch = session.start_quiz();
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].japanese, "B");
}

#[tokio::test]
async fn test_switch_level_prunes_progress() {
    let (mut session, _) = session(Catalog::builtin()).await;
    session.answer_word("猫", true).await.unwrap();

    session.switch_level(JlptLevel::N4).await;
    assert_eq!(session.level(), JlptLevel::N4);
    assert!(session.words().progress("猫").is_none());
    assert!(session.words().progress("会議").is_some());
}

#[tokio::test]
async fn test_particle_round_trip_with_feedback() {
    let (mut session, _) = session(Catalog::builtin()).await;
    let question = session.next_particle_question().await.unwrap();
    assert_eq!(session.current_question_id(), Some(question.id));

    let answer = session
        .answer_particle(&question.example.correct)
        .await
        .unwrap();
    assert!(answer.result.correct);
    assert_eq!(answer.result.question_id, question.id);
    assert!(answer.feedback.contains(&question.example.filled()));
    assert_eq!(session.current_question_id(), None);
}

#[tokio::test]
async fn test_particle_streak_raises_difficulty() {
    let (mut session, _) = session(Catalog::builtin()).await;
    assert_eq!(session.difficulty(), DifficultyTier::Beginner);

    let mut change = None;
    for _ in 0..5 {
        let question = session.next_particle_question().await.unwrap();
        let answer = session
            .answer_particle(&question.example.correct)
            .await
            .unwrap();
        change = answer.tier_change.or(change);
    }

    assert_eq!(session.difficulty(), DifficultyTier::Intermediate);
    assert_eq!(
        change,
        Some(TierChange {
            from: DifficultyTier::Beginner,
            to: DifficultyTier::Intermediate
        })
    );
}

#[tokio::test]
async fn test_reset_restores_fresh_state() {
    let (mut session, _) = session(Catalog::builtin()).await;
    session.answer_word("猫", true).await.unwrap();
    let question = session.next_particle_question().await.unwrap();
    session.answer_particle(&question.example.correct).await;

    session.reset().await;
    assert_eq!(session.words().progress("猫").unwrap().state, WordState::New);
    assert_eq!(session.particle_stats().attempts, 0);
    assert_eq!(session.difficulty(), DifficultyTier::Beginner);
}
