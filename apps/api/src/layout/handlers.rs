//! Axum route handlers for the Layout API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::compressor::{compress_bullets_to_fit, compression_target, CompressionReport};
use crate::layout::condense::{suggest_condensation, CondensationSuggestion};
use crate::layout::config::LayoutConfig;
use crate::layout::estimator::LineEstimator;
use crate::layout::page_split::simulate_layout;
use crate::layout::pipeline::{plan_layout, LayoutPlan, LayoutRequest};
use crate::layout::types::{saturating_sum, Bullet, ResumeLayout, Role};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Roles newest-first, already reduced to their selected bullets.
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct CondenseRequest {
    pub roles: Vec<Role>,
    pub target_lines: u32,
}

#[derive(Debug, Serialize)]
pub struct CondenseResponse {
    pub suggestions: Vec<CondensationSuggestion>,
    pub lines_saved: u32,
}

#[derive(Debug, Deserialize)]
pub struct CompressBulletInput {
    pub text: String,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompressRequest {
    pub bullets: Vec<CompressBulletInput>,
    /// Lines to reclaim. Defaults to `compression_target_reduction` of the bullets' lines.
    #[serde(default)]
    pub target_lines: Option<u32>,
    #[serde(default)]
    pub preserve_first_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CompressResponse {
    pub bullets: Vec<Bullet>,
    pub report: CompressionReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/layout/config
///
/// Returns the active, validated layout parameters.
pub async fn handle_get_config(State(state): State<AppState>) -> Json<LayoutConfig> {
    Json(state.layout.as_ref().clone())
}

/// POST /api/v1/layout/plan
///
/// Full pipeline: allocate → simulate → condense → compress. Always returns a layout;
/// callers check `layout.fits_in_budget` and `layout.violations`.
pub async fn handle_plan(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutPlan>, AppError> {
    let config = state.layout.clone();

    // CPU-bound pass: spawn_blocking to avoid blocking the async executor.
    let plan = tokio::task::spawn_blocking(move || plan_layout(&request, &config))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout plan: {e}"))
        })??;

    Ok(Json(plan))
}

/// POST /api/v1/layout/simulate
///
/// Runs the page split on roles whose bullets are already chosen.
pub async fn handle_simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<ResumeLayout>, AppError> {
    if request.roles.iter().any(|r| r.role_id.trim().is_empty()) {
        return Err(AppError::Validation("role_id cannot be empty".to_string()));
    }

    let config = state.layout.as_ref();
    let estimator = LineEstimator::new(config);
    let layout = simulate_layout(
        estimator.summary_lines(&request.summary),
        estimator.skills_lines(&request.skills),
        &request.roles,
        config,
    );

    Ok(Json(layout))
}

/// POST /api/v1/layout/condense
///
/// Advisory only: returns which roles to trim, without applying anything.
pub async fn handle_condense(
    State(state): State<AppState>,
    Json(request): Json<CondenseRequest>,
) -> Result<Json<CondenseResponse>, AppError> {
    let suggestions = suggest_condensation(&request.roles, request.target_lines, &state.layout);
    let lines_saved = saturating_sum(suggestions.iter().map(|s| s.lines_saved));
    Ok(Json(CondenseResponse {
        suggestions,
        lines_saved,
    }))
}

/// POST /api/v1/layout/compress
///
/// Compresses a single role's bullets longest-first until the target is reclaimed.
pub async fn handle_compress(
    State(state): State<AppState>,
    Json(request): Json<CompressRequest>,
) -> Result<Json<CompressResponse>, AppError> {
    if request.bullets.is_empty() {
        return Err(AppError::Validation("bullets cannot be empty".to_string()));
    }

    let config = state.layout.as_ref();
    let mut bullets: Vec<Bullet> = request
        .bullets
        .into_iter()
        .map(|b| Bullet::new(b.text, b.score, config))
        .collect();

    let total_lines = saturating_sum(bullets.iter().map(|b| b.line_cost));
    let target = request
        .target_lines
        .unwrap_or_else(|| compression_target(total_lines, config));
    let preserve = request
        .preserve_first_n
        .unwrap_or(config.compression_preserve_first);

    let report = compress_bullets_to_fit(&mut bullets, target, preserve, config);

    Ok(Json(CompressResponse { bullets, report }))
}
