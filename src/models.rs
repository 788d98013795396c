use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Part-of-speech tag used to interleave and filter vocabulary.
/// It never influences scheduling itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "noun")]
    Noun,
    #[serde(rename = "verb")]
    Verb,
    #[serde(rename = "adjective-i")]
    IAdjective,
    #[serde(rename = "adjective-na")]
    NaAdjective,
    #[serde(rename = "adverb")]
    Adverb,
    #[serde(rename = "expression")]
    Expression,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Noun => "noun",
            Category::Verb => "verb",
            Category::IAdjective => "adjective-i",
            Category::NaAdjective => "adjective-na",
            Category::Adverb => "adverb",
            Category::Expression => "expression",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noun" => Ok(Category::Noun),
            "verb" => Ok(Category::Verb),
            "adjective-i" => Ok(Category::IAdjective),
            "adjective-na" => Ok(Category::NaAdjective),
            "adverb" => Ok(Category::Adverb),
            "expression" => Ok(Category::Expression),
            other => Err(anyhow::anyhow!("unknown category: {other}")),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl FromStr for JlptLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N5" => Ok(JlptLevel::N5),
            "N4" => Ok(JlptLevel::N4),
            "N3" => Ok(JlptLevel::N3),
            "N2" => Ok(JlptLevel::N2),
            "N1" => Ok(JlptLevel::N1),
            other => Err(anyhow::anyhow!("unknown JLPT level: {other}")),
        }
    }
}

impl fmt::Display for JlptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Difficulty tier of the particle quiz. Ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyTier {
    pub fn harder(self) -> Option<Self> {
        match self {
            DifficultyTier::Beginner => Some(DifficultyTier::Intermediate),
            DifficultyTier::Intermediate => Some(DifficultyTier::Advanced),
            DifficultyTier::Advanced => None,
        }
    }

    pub fn easier(self) -> Option<Self> {
        match self {
            DifficultyTier::Beginner => None,
            DifficultyTier::Intermediate => Some(DifficultyTier::Beginner),
            DifficultyTier::Advanced => Some(DifficultyTier::Intermediate),
        }
    }
}

/// A vocabulary entry. `japanese` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub japanese: String,
    pub reading: String,
    pub meaning: String,
    pub category: Category,
}

impl VocabularyItem {
    pub fn key(&self) -> &str {
        &self.japanese
    }
}

/// Which vocabulary categories a batch may draw from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(BTreeSet<Category>),
}

impl CategoryFilter {
    /// An empty set means "all", matching how clients clear every checkbox.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let set: BTreeSet<Category> = categories.into_iter().collect();
        if set.is_empty() {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(set)
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(set) => set.contains(&category),
        }
    }
}

/// One fill-in-the-blank sentence for a particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Sentence with a single `＿` blank where the particle goes.
    pub sentence: String,
    pub translation: String,
    pub correct: String,
    #[serde(default)]
    pub distractors: Vec<String>,
    pub explanation: String,
    pub jlpt: JlptLevel,
    #[serde(default)]
    pub difficulty: DifficultyTier,
    pub category: String,
}

impl Example {
    pub const BLANK: &'static str = "＿";

    pub fn filled(&self) -> String {
        self.sentence.replacen(Self::BLANK, &self.correct, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleDefinition {
    pub particle: String,
    pub reading: String,
    pub function: String,
    pub description: String,
    pub examples: Vec<Example>,
}

impl ParticleDefinition {
    pub fn example_key(&self, index: usize) -> String {
        example_key(&self.particle, index)
    }
}

/// Key of an (particle, example index) pair, e.g. `は#2`.
pub fn example_key(particle: &str, index: usize) -> String {
    format!("{particle}#{index}")
}
