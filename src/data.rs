use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::models::{Category, DifficultyTier, Example, JlptLevel, ParticleDefinition, VocabularyItem};
use crate::particle::ParticleSet;

pub struct VocabEntry {
    pub japanese: &'static str,
    pub reading: &'static str,
    pub meaning: &'static str,
    pub category: Category,
}

pub struct ExampleEntry {
    pub sentence: &'static str,
    pub translation: &'static str,
    pub correct: &'static str,
    pub distractors: &'static [&'static str],
    pub explanation: &'static str,
    pub difficulty: DifficultyTier,
    pub category: &'static str,
}

pub struct ParticleEntry {
    pub particle: &'static str,
    pub reading: &'static str,
    pub function: &'static str,
    pub description: &'static str,
    pub examples: &'static [ExampleEntry],
}

use Category::*;
use DifficultyTier::*;

pub const N5_VOCAB: &[VocabEntry] = &[
    VocabEntry { japanese: "私", reading: "わたし", meaning: "I / me", category: Noun },
    VocabEntry { japanese: "猫", reading: "ねこ", meaning: "cat", category: Noun },
    VocabEntry { japanese: "犬", reading: "いぬ", meaning: "dog", category: Noun },
    VocabEntry { japanese: "本", reading: "ほん", meaning: "book", category: Noun },
    VocabEntry { japanese: "水", reading: "みず", meaning: "water", category: Noun },
    VocabEntry { japanese: "山", reading: "やま", meaning: "mountain", category: Noun },
    VocabEntry { japanese: "川", reading: "かわ", meaning: "river", category: Noun },
    VocabEntry { japanese: "食べる", reading: "たべる", meaning: "to eat", category: Verb },
    VocabEntry { japanese: "見る", reading: "みる", meaning: "to see", category: Verb },
    VocabEntry { japanese: "行く", reading: "いく", meaning: "to go", category: Verb },
    VocabEntry { japanese: "飲む", reading: "のむ", meaning: "to drink", category: Verb },
    VocabEntry { japanese: "書く", reading: "かく", meaning: "to write", category: Verb },
    VocabEntry { japanese: "大きい", reading: "おおきい", meaning: "big", category: IAdjective },
    VocabEntry { japanese: "新しい", reading: "あたらしい", meaning: "new", category: IAdjective },
    VocabEntry { japanese: "高い", reading: "たかい", meaning: "tall / expensive", category: IAdjective },
    VocabEntry { japanese: "静か", reading: "しずか", meaning: "quiet", category: NaAdjective },
    VocabEntry { japanese: "元気", reading: "げんき", meaning: "healthy / energetic", category: NaAdjective },
    VocabEntry { japanese: "好き", reading: "すき", meaning: "liked", category: NaAdjective },
    VocabEntry { japanese: "よく", reading: "よく", meaning: "often / well", category: Adverb },
    VocabEntry { japanese: "ありがとう", reading: "ありがとう", meaning: "thank you", category: Expression },
];

pub const N4_VOCAB: &[VocabEntry] = &[
    VocabEntry { japanese: "会議", reading: "かいぎ", meaning: "meeting", category: Noun },
    VocabEntry { japanese: "経験", reading: "けいけん", meaning: "experience", category: Noun },
    VocabEntry { japanese: "趣味", reading: "しゅみ", meaning: "hobby", category: Noun },
    VocabEntry { japanese: "集める", reading: "あつめる", meaning: "to collect", category: Verb },
    VocabEntry { japanese: "届ける", reading: "とどける", meaning: "to deliver", category: Verb },
    VocabEntry { japanese: "比べる", reading: "くらべる", meaning: "to compare", category: Verb },
    VocabEntry { japanese: "厳しい", reading: "きびしい", meaning: "strict", category: IAdjective },
    VocabEntry { japanese: "珍しい", reading: "めずらしい", meaning: "rare", category: IAdjective },
    VocabEntry { japanese: "丁寧", reading: "ていねい", meaning: "polite", category: NaAdjective },
    VocabEntry { japanese: "大切", reading: "たいせつ", meaning: "important", category: NaAdjective },
    VocabEntry { japanese: "必ず", reading: "かならず", meaning: "certainly", category: Adverb },
    VocabEntry { japanese: "お大事に", reading: "おだいじに", meaning: "take care", category: Expression },
];

pub const N5_PARTICLES: &[ParticleEntry] = &[
    ParticleEntry {
        particle: "は",
        reading: "wa",
        function: "topic marker",
        description: "Marks what the sentence is about.",
        examples: &[
            ExampleEntry {
                sentence: "私＿学生です。",
                translation: "I am a student.",
                correct: "は",
                distractors: &["が", "を"],
                explanation: "「は」 sets 私 as the topic; the rest of the sentence comments on it.",
                difficulty: Beginner,
                category: "topic",
            },
            ExampleEntry {
                sentence: "今日＿暑いですね。",
                translation: "It's hot today, isn't it?",
                correct: "は",
                distractors: &["が", "に"],
                explanation: "Time words become the topic with 「は」 when the statement is about that time.",
                difficulty: Intermediate,
                category: "topic",
            },
        ],
    },
    ParticleEntry {
        particle: "が",
        reading: "ga",
        function: "subject marker",
        description: "Marks the grammatical subject, often new or emphasised information.",
        examples: &[
            ExampleEntry {
                sentence: "猫＿好きです。",
                translation: "I like cats.",
                correct: "が",
                distractors: &["を", "は"],
                explanation: "好き takes its object with 「が」, not 「を」.",
                difficulty: Beginner,
                category: "subject",
            },
            ExampleEntry {
                sentence: "誰＿来ましたか。",
                translation: "Who came?",
                correct: "が",
                distractors: &["は", "も"],
                explanation: "Question words as subjects take 「が」; 「は」 cannot follow 誰 here.",
                difficulty: Intermediate,
                category: "subject",
            },
        ],
    },
    ParticleEntry {
        particle: "を",
        reading: "o",
        function: "direct object marker",
        description: "Marks the direct object of an action verb.",
        examples: &[
            ExampleEntry {
                sentence: "水＿飲みます。",
                translation: "I drink water.",
                correct: "を",
                distractors: &["が", "に"],
                explanation: "水 is what is drunk, the direct object of 飲む, so it takes 「を」.",
                difficulty: Beginner,
                category: "object",
            },
            ExampleEntry {
                sentence: "公園＿散歩します。",
                translation: "I take a walk through the park.",
                correct: "を",
                distractors: &["で", "に"],
                explanation: "With motion verbs 「を」 marks the space moved through.",
                difficulty: Advanced,
                category: "path",
            },
        ],
    },
    ParticleEntry {
        particle: "に",
        reading: "ni",
        function: "target / time / location of existence",
        description: "Marks a destination, a point in time, or where something exists.",
        examples: &[
            ExampleEntry {
                sentence: "七時＿起きます。",
                translation: "I get up at seven.",
                correct: "に",
                distractors: &["で", "へ"],
                explanation: "Specific clock times take 「に」.",
                difficulty: Beginner,
                category: "time",
            },
            ExampleEntry {
                sentence: "机の上＿本があります。",
                translation: "There is a book on the desk.",
                correct: "に",
                distractors: &["で", "を"],
                explanation: "ある/いる mark the place of existence with 「に」.",
                difficulty: Intermediate,
                category: "location",
            },
        ],
    },
    ParticleEntry {
        particle: "で",
        reading: "de",
        function: "place of action / means",
        description: "Marks where an action happens or the means used.",
        examples: &[
            ExampleEntry {
                sentence: "図書館＿勉強します。",
                translation: "I study at the library.",
                correct: "で",
                distractors: &["に", "を"],
                explanation: "勉強する is an action, so its location takes 「で」.",
                difficulty: Beginner,
                category: "location",
            },
            ExampleEntry {
                sentence: "バス＿行きます。",
                translation: "I go by bus.",
                correct: "で",
                distractors: &["に", "と"],
                explanation: "Means of transport take 「で」.",
                difficulty: Beginner,
                category: "means",
            },
        ],
    },
    ParticleEntry {
        particle: "へ",
        reading: "e",
        function: "direction",
        description: "Marks the direction of movement.",
        examples: &[ExampleEntry {
            sentence: "日本＿行きたいです。",
            translation: "I want to go to Japan.",
            correct: "へ",
            distractors: &["で", "を"],
            explanation: "「へ」 points toward a destination; 「に」 would also be natural.",
            difficulty: Beginner,
            category: "direction",
        }],
    },
    ParticleEntry {
        particle: "と",
        reading: "to",
        function: "and / with",
        description: "Joins nouns exhaustively or marks a companion.",
        examples: &[
            ExampleEntry {
                sentence: "友達＿映画を見ました。",
                translation: "I watched a movie with a friend.",
                correct: "と",
                distractors: &["に", "で"],
                explanation: "The person you do something together with takes 「と」.",
                difficulty: Beginner,
                category: "companion",
            },
            ExampleEntry {
                sentence: "パン＿牛乳を買いました。",
                translation: "I bought bread and milk.",
                correct: "と",
                distractors: &["も", "の"],
                explanation: "「と」 lists every item; 「や」 would imply there were others.",
                difficulty: Intermediate,
                category: "listing",
            },
        ],
    },
    ParticleEntry {
        particle: "も",
        reading: "mo",
        function: "also / too",
        description: "Replaces は, が or を to mean 'also'.",
        examples: &[ExampleEntry {
            sentence: "私＿行きます。",
            translation: "I'm going too.",
            correct: "も",
            distractors: &["は", "と"],
            explanation: "「も」 adds 私 to others who are going.",
            difficulty: Beginner,
            category: "inclusion",
        }],
    },
    ParticleEntry {
        particle: "の",
        reading: "no",
        function: "possessive / noun linker",
        description: "Links two nouns, most often to show possession.",
        examples: &[ExampleEntry {
            sentence: "これは私＿本です。",
            translation: "This is my book.",
            correct: "の",
            distractors: &["が", "は"],
            explanation: "「の」 joins 私 and 本: the book belongs to me.",
            difficulty: Beginner,
            category: "possession",
        }],
    },
    ParticleEntry {
        particle: "から",
        reading: "kara",
        function: "from / because",
        description: "Marks a starting point in space or time, or a reason.",
        examples: &[
            ExampleEntry {
                sentence: "九時＿働きます。",
                translation: "I work from nine.",
                correct: "から",
                distractors: &["まで", "に"],
                explanation: "The starting time takes 「から」.",
                difficulty: Intermediate,
                category: "origin",
            },
            ExampleEntry {
                sentence: "雨です＿、出かけません。",
                translation: "Because it's raining, I won't go out.",
                correct: "から",
                distractors: &["ので", "が"],
                explanation: "After a clause, 「から」 gives the reason for what follows.",
                difficulty: Advanced,
                category: "reason",
            },
        ],
    },
];

pub const N4_PARTICLES: &[ParticleEntry] = &[
    ParticleEntry {
        particle: "より",
        reading: "yori",
        function: "comparison",
        description: "Marks the standard something is compared against.",
        examples: &[ExampleEntry {
            sentence: "電車はバス＿速いです。",
            translation: "Trains are faster than buses.",
            correct: "より",
            distractors: &["から", "まで"],
            explanation: "The thing being surpassed takes 「より」.",
            difficulty: Beginner,
            category: "comparison",
        }],
    },
    ParticleEntry {
        particle: "まで",
        reading: "made",
        function: "until / up to",
        description: "Marks an end point in space or time.",
        examples: &[ExampleEntry {
            sentence: "駅＿歩きます。",
            translation: "I walk as far as the station.",
            correct: "まで",
            distractors: &["から", "より"],
            explanation: "「まで」 marks how far the walking goes.",
            difficulty: Beginner,
            category: "limit",
        }],
    },
    ParticleEntry {
        particle: "しか",
        reading: "shika",
        function: "only (with negative)",
        description: "Means 'nothing but', always followed by a negative verb.",
        examples: &[ExampleEntry {
            sentence: "百円＿ありません。",
            translation: "I only have 100 yen.",
            correct: "しか",
            distractors: &["だけ", "も"],
            explanation: "「しか」 pairs with ありません to mean 'only'; 「だけ」 would need あります.",
            difficulty: Intermediate,
            category: "limitation",
        }],
    },
    ParticleEntry {
        particle: "ので",
        reading: "node",
        function: "reason (objective)",
        description: "Gives a reason in a softer, more objective tone than から.",
        examples: &[ExampleEntry {
            sentence: "熱がある＿、休みます。",
            translation: "Since I have a fever, I'll rest.",
            correct: "ので",
            distractors: &["のに", "より"],
            explanation: "「ので」 presents the fever as the natural cause of resting.",
            difficulty: Intermediate,
            category: "reason",
        }],
    },
    ParticleEntry {
        particle: "のに",
        reading: "noni",
        function: "even though",
        description: "Expresses a result contrary to expectation.",
        examples: &[ExampleEntry {
            sentence: "勉強した＿、不合格でした。",
            translation: "Even though I studied, I failed.",
            correct: "のに",
            distractors: &["ので", "から"],
            explanation: "The outcome contradicts the effort, so 「のに」.",
            difficulty: Advanced,
            category: "contrast",
        }],
    },
];

fn vocabulary_from(entries: &[VocabEntry]) -> Vec<VocabularyItem> {
    entries
        .iter()
        .map(|entry| VocabularyItem {
            japanese: entry.japanese.to_string(),
            reading: entry.reading.to_string(),
            meaning: entry.meaning.to_string(),
            category: entry.category,
        })
        .collect()
}

fn particles_from(entries: &[ParticleEntry], level: JlptLevel) -> Vec<ParticleDefinition> {
    entries
        .iter()
        .map(|entry| ParticleDefinition {
            particle: entry.particle.to_string(),
            reading: entry.reading.to_string(),
            function: entry.function.to_string(),
            description: entry.description.to_string(),
            examples: entry
                .examples
                .iter()
                .map(|example| Example {
                    sentence: example.sentence.to_string(),
                    translation: example.translation.to_string(),
                    correct: example.correct.to_string(),
                    distractors: example.distractors.iter().map(|d| d.to_string()).collect(),
                    explanation: example.explanation.to_string(),
                    jlpt: level,
                    difficulty: example.difficulty,
                    category: example.category.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Vocabulary per level and particle definitions per level.
#[derive(Debug, Clone)]
pub struct Catalog {
    vocabulary: BTreeMap<JlptLevel, Vec<VocabularyItem>>,
    particles: ParticleSet,
}

impl Catalog {
    pub fn builtin() -> Self {
        let vocabulary = BTreeMap::from([
            (JlptLevel::N5, vocabulary_from(N5_VOCAB)),
            (JlptLevel::N4, vocabulary_from(N4_VOCAB)),
        ]);
        let particles = BTreeMap::from([
            (JlptLevel::N5, particles_from(N5_PARTICLES, JlptLevel::N5)),
            (JlptLevel::N4, particles_from(N4_PARTICLES, JlptLevel::N4)),
        ]);
        Self::new(vocabulary, particles)
    }

    /// Built-in catalogue with either half replaced by a JSON file, if given.
    /// An unreadable file is logged and the built-in half is kept.
    pub fn load(vocabulary_file: Option<&Path>, particle_file: Option<&Path>) -> Self {
        let builtin = Self::builtin();

        let vocabulary = vocabulary_file
            .and_then(|path| read_json(path))
            .unwrap_or(builtin.vocabulary);
        let particles = particle_file
            .and_then(|path| read_json(path))
            .unwrap_or(builtin.particles);

        Self::new(vocabulary, particles)
    }

    pub fn new(vocabulary: BTreeMap<JlptLevel, Vec<VocabularyItem>>, particles: ParticleSet) -> Self {
        let vocabulary = vocabulary
            .into_iter()
            .map(|(level, items)| (level, dedupe(level, items)))
            .collect();
        Self {
            vocabulary,
            particles,
        }
    }

    /// The active vocabulary list for `level`, in catalogue order.
    pub fn vocabulary(&self, level: JlptLevel) -> Vec<VocabularyItem> {
        self.vocabulary.get(&level).cloned().unwrap_or_default()
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn levels(&self) -> Vec<JlptLevel> {
        let mut levels: Vec<JlptLevel> = self
            .vocabulary
            .keys()
            .chain(self.particles.keys())
            .copied()
            .collect();
        levels.sort();
        levels.dedup();
        levels
    }
}

/// Natural keys must be unique within a level; later duplicates are dropped.
fn dedupe(level: JlptLevel, items: Vec<VocabularyItem>) -> Vec<VocabularyItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(item.japanese.clone());
            if !fresh {
                log::warn!("duplicate vocabulary key '{}' in {}; keeping first", item.japanese, level);
            }
            fresh
        })
        .collect()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("failed to read {}: {}; using built-in data", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(data) => {
            log::info!("loaded catalogue data from {}", path.display());
            Some(data)
        }
        Err(e) => {
            log::warn!("failed to parse {}: {}; using built-in data", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_examples_have_one_blank_and_matching_answer() {
        let catalog = Catalog::builtin();
        for definition in catalog.particles().values().flatten() {
            for example in &definition.examples {
                assert_eq!(
                    example.sentence.matches(Example::BLANK).count(),
                    1,
                    "{}",
                    example.sentence
                );
                assert_eq!(example.correct, definition.particle);
            }
        }
    }

    #[test]
    fn builtin_vocabulary_keys_are_unique() {
        let catalog = Catalog::builtin();
        for level in catalog.levels() {
            let items = catalog.vocabulary(level);
            let keys: HashSet<&str> = items.iter().map(|i| i.key()).collect();
            assert_eq!(keys.len(), items.len());
        }
    }

    #[test]
    fn duplicate_keys_are_dropped() {
        let item = VocabularyItem {
            japanese: "猫".into(),
            reading: "ねこ".into(),
            meaning: "cat".into(),
            category: Category::Noun,
        };
        let catalog = Catalog::new(
            BTreeMap::from([(JlptLevel::N5, vec![item.clone(), item])]),
            ParticleSet::new(),
        );
        assert_eq!(catalog.vocabulary(JlptLevel::N5).len(), 1);
    }

    #[test]
    fn missing_override_file_falls_back_to_builtin() {
        let catalog = Catalog::load(Some(Path::new("/nonexistent/vocab.json")), None);
        assert_eq!(
            catalog.vocabulary(JlptLevel::N5).len(),
            N5_VOCAB.len()
        );
    }

    #[test]
    fn vocabulary_file_format_parses() {
        let json = r#"{"N3":[{"japanese":"政治","reading":"せいじ","meaning":"politics","category":"noun"}]}"#;
        let parsed: BTreeMap<JlptLevel, Vec<VocabularyItem>> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[&JlptLevel::N3][0].category, Category::Noun);
    }
}
