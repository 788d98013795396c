//! Japanese study engines: a Leitner-style vocabulary scheduler and an
//! adaptive particle quiz, with a small JSON API on top.

pub mod api;
pub mod clock;
pub mod config;
pub mod data;
pub mod feedback;
pub mod models;
pub mod particle;
pub mod persist;
pub mod scheduler;
pub mod session;
pub mod shuffle;
pub mod srs;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use data::Catalog;
pub use models::{Category, CategoryFilter, DifficultyTier, JlptLevel, VocabularyItem};
pub use particle::ParticleSelector;
pub use scheduler::WordScheduler;
pub use session::{SessionSettings, StudySession};
pub use store::{KvStore, MemoryStore, SqliteStore};
