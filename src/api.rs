//! HTTP routes.

use crate::error::{AppError, Result};
use crate::service::{DecorationItem, PurchaseRequest, SolmateService};
use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use solmate_core::chain::{PaymentCheck, PaymentVerifier};
use solmate_data::{AssetKind, LeaderboardMetric};
use std::sync::Arc;

/// Shared handler state.
pub struct AppState {
    pub service: Arc<SolmateService>,
    pub verifier: Arc<dyn PaymentVerifier>,
}

/// JSON body extractor whose rejections use the `{"error": ...}` shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize)]
pub struct PubkeyQuery {
    pub pubkey: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PubkeyBody {
    #[serde(default)]
    pub pubkey: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub animal: String,
}

#[derive(Debug, Deserialize)]
pub struct RunBody {
    #[serde(default)]
    pub pubkey: String,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct DecorationsBody {
    #[serde(default)]
    pub pubkey: String,
    pub decorations: Vec<Vec<Option<DecorationItem>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundBody {
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub background_url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/solmate", get(get_solmate).post(create_solmate))
        .route("/solmate/feed", post(feed))
        .route("/solmate/pet", post(pet))
        .route("/solmate/clean", post(clean))
        .route("/solmate/run", post(run))
        .route("/solmate/decorations", post(save_decorations))
        .route("/solmate/background", post(select_background))
        .route("/leaderboard", get(high_score_leaderboard))
        .route("/leaderboard/survival", get(survival_leaderboard))
        .route("/purchase/verify", post(verify_purchase))
        .route("/decor", get(list_decor))
        .route("/backgrounds", get(list_backgrounds))
        .with_state(state)
}

/// Runs a store-backed service call on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&SolmateService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service)).await?
}

async fn get_solmate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PubkeyQuery>,
) -> Result<impl IntoResponse> {
    let pubkey = query
        .pubkey
        .ok_or_else(|| AppError::validation("pubkey query parameter is required"))?;
    let view = blocking(&state, move |s| s.get(&pubkey)).await?;
    Ok(Json(view))
}

async fn create_solmate(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse> {
    let view = blocking(&state, move |s| s.create(&body.pubkey, &body.name, &body.animal)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn feed(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<PubkeyBody>,
) -> Result<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| s.feed(&body.pubkey)).await?))
}

async fn pet(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<PubkeyBody>,
) -> Result<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| s.pet(&body.pubkey)).await?))
}

async fn clean(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<PubkeyBody>,
) -> Result<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| s.clean(&body.pubkey)).await?))
}

async fn run(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RunBody>,
) -> Result<impl IntoResponse> {
    Ok(Json(blocking(&state, move |s| s.run(&body.pubkey, body.score)).await?))
}

async fn save_decorations(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<DecorationsBody>,
) -> Result<impl IntoResponse> {
    let view = blocking(&state, move |s| s.save_decorations(&body.pubkey, &body.decorations)).await?;
    Ok(Json(view))
}

async fn select_background(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<BackgroundBody>,
) -> Result<impl IntoResponse> {
    let view = blocking(&state, move |s| {
        s.select_background(&body.pubkey, &body.background_url)
    })
    .await?;
    Ok(Json(view))
}

async fn leaderboard(
    state: &AppState,
    metric: LeaderboardMetric,
    query: PubkeyQuery,
) -> Result<impl IntoResponse> {
    let view = blocking(state, move |s| s.leaderboard(metric, query.pubkey.as_deref())).await?;
    Ok(Json(view))
}

async fn high_score_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PubkeyQuery>,
) -> Result<impl IntoResponse> {
    leaderboard(&state, LeaderboardMetric::HighScore, query).await
}

async fn survival_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PubkeyQuery>,
) -> Result<impl IntoResponse> {
    leaderboard(&state, LeaderboardMetric::Survival, query).await
}

async fn list_decor(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PubkeyQuery>,
) -> Result<impl IntoResponse> {
    let items = blocking(&state, move |s| {
        s.catalog(AssetKind::Decoration, query.pubkey.as_deref())
    })
    .await?;
    Ok(Json(items))
}

async fn list_backgrounds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PubkeyQuery>,
) -> Result<impl IntoResponse> {
    let items = blocking(&state, move |s| {
        s.catalog(AssetKind::Background, query.pubkey.as_deref())
    })
    .await?;
    Ok(Json(items))
}

async fn verify_purchase(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<PurchaseRequest>,
) -> Result<impl IntoResponse> {
    let claim = blocking(&state, move |s| s.prepare_purchase(&request)).await?;

    match state.verifier.verify(&claim).await? {
        PaymentCheck::Confirmed => {}
        PaymentCheck::Rejected(reason) => {
            tracing::warn!(signature = %claim.signature, reason = %reason, "Payment rejected");
            return Err(AppError::validation(reason));
        }
    }

    let outcome = blocking(&state, move |s| s.complete_purchase(&claim)).await?;
    Ok(Json(outcome))
}
