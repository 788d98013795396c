use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{Category, CategoryFilter, DifficultyTier, JlptLevel};
use crate::particle::ParticleStats;
use crate::scheduler::DueCounts;
use crate::session::StudySession;
use crate::store::KvStore;

pub struct ApiState<S, C> {
    pub session: Arc<Mutex<StudySession<S, C>>>,
}

impl<S, C> ApiState<S, C> {
    pub fn new(session: StudySession<S, C>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

impl<S, C> Clone for ApiState<S, C> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

pub fn app_router<S: KvStore, C: Clock>(state: ApiState<S, C>, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/words/batch", get(get_batch::<S, C>))
        .route("/api/words/answer", post(answer_word::<S, C>))
        .route("/api/words/stats", get(word_stats::<S, C>))
        .route("/api/words/filter", put(set_filter::<S, C>))
        .route("/api/level", put(set_level::<S, C>))
        .route("/api/particles/question", get(particle_question::<S, C>))
        .route("/api/particles/answer", post(answer_particle::<S, C>))
        .route("/api/particles/stats", get(particle_stats::<S, C>))
        .route("/api/reset", post(reset::<S, C>))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    match static_dir {
        Some(dir) => {
            log::info!("serving static files from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

async fn health() -> &'static str {
    "ok"
}

async fn get_batch<S: KvStore, C: Clock>(State(state): State<ApiState<S, C>>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    // Answered cards leave the batch, so an empty remainder means the client
    // has worked through it.
    if session.remaining().is_empty() {
        session.start_quiz();
    }
    Json(session.batch().clone())
}

#[derive(Deserialize)]
struct WordAnswerRequest {
    key: String,
    correct: bool,
}

async fn answer_word<S: KvStore, C: Clock>(
    State(state): State<ApiState<S, C>>,
    Json(payload): Json<WordAnswerRequest>,
) -> Response {
    let mut session = state.session.lock().await;
    match session.answer_word(&payload.key, payload.correct).await {
        Some(answer) => Json(answer).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("unknown vocabulary key '{}'", payload.key),
        ),
    }
}

async fn word_stats<S: KvStore, C: Clock>(State(state): State<ApiState<S, C>>) -> Json<DueCounts> {
    let session = state.session.lock().await;
    Json(session.word_stats())
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(default)]
    categories: Vec<Category>,
}

async fn set_filter<S: KvStore, C: Clock>(
    State(state): State<ApiState<S, C>>,
    Json(payload): Json<FilterRequest>,
) -> Json<DueCounts> {
    let mut session = state.session.lock().await;
    session.set_filter(CategoryFilter::from_categories(payload.categories));
    Json(session.word_stats())
}

#[derive(Deserialize)]
struct LevelRequest {
    level: JlptLevel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelResponse {
    level: JlptLevel,
    words: DueCounts,
}

async fn set_level<S: KvStore, C: Clock>(
    State(state): State<ApiState<S, C>>,
    Json(payload): Json<LevelRequest>,
) -> Json<LevelResponse> {
    let mut session = state.session.lock().await;
    if session.level() != payload.level {
        session.switch_level(payload.level).await;
    }
    Json(LevelResponse {
        level: session.level(),
        words: session.word_stats(),
    })
}

async fn particle_question<S: KvStore, C: Clock>(State(state): State<ApiState<S, C>>) -> Response {
    let mut session = state.session.lock().await;
    match session.next_particle_question().await {
        Some(question) => Json(question).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("no particle questions for {}", session.level()),
        ),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticleAnswerRequest {
    question_id: Option<Uuid>,
    particle: String,
}

async fn answer_particle<S: KvStore, C: Clock>(
    State(state): State<ApiState<S, C>>,
    Json(payload): Json<ParticleAnswerRequest>,
) -> Response {
    let mut session = state.session.lock().await;
    if let Some(id) = payload.question_id {
        if session.current_question_id() != Some(id) {
            log::warn!("answer for stale question {}", id);
            return error(StatusCode::CONFLICT, "question is no longer active");
        }
    }
    match session.answer_particle(&payload.particle).await {
        Some(answer) => Json(answer).into_response(),
        None => error(StatusCode::CONFLICT, "no question awaiting an answer"),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParticleStatsResponse {
    #[serde(flatten)]
    stats: ParticleStats,
    tier: DifficultyTier,
}

async fn particle_stats<S: KvStore, C: Clock>(
    State(state): State<ApiState<S, C>>,
) -> Json<ParticleStatsResponse> {
    let session = state.session.lock().await;
    Json(ParticleStatsResponse {
        stats: session.particle_stats(),
        tier: session.difficulty(),
    })
}

async fn reset<S: KvStore, C: Clock>(State(state): State<ApiState<S, C>>) -> StatusCode {
    let mut session = state.session.lock().await;
    session.reset().await;
    StatusCode::NO_CONTENT
}
