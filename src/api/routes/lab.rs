use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_window, ApiError};
use crate::archive::load_window;
use crate::calculate::{
    best_and_worst, compute_deck_trend_by_month, compute_deck_vs_field, filter_rows, VersusSort,
};
use crate::models::{BestWorst, DeckVsRow, DeckVsSummary, TrendPoint};

#[derive(Debug, Deserialize)]
pub struct LabParams {
    /// Restrict the trend to contests against this deck.
    pub opponent: Option<String>,
    pub min_sample: Option<u32>,
    /// `matches` (default) or `wr`.
    pub sort: Option<String>,
    pub mode: Option<String>,
    pub id: Option<String>,
    pub last: Option<usize>,
    pub month: Option<String>,
}

/// Opponent row with its display name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledRow {
    pub opponent_name: String,
    #[serde(flatten)]
    pub row: DeckVsRow,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckLabResponse {
    pub did: String,
    pub deck_name: String,
    pub summary: DeckVsSummary,
    pub min_sample: u32,
    pub sort: VersusSort,
    pub rows: Vec<LabeledRow>,
    pub best_worst: BestWorst,
    pub trend: Vec<TrendPoint>,
}

pub async fn deck_lab(
    State(state): State<AppState>,
    Path(did): Path<String>,
    Query(params): Query<LabParams>,
) -> Result<Json<DeckLabResponse>, ApiError> {
    let window = parse_window(
        params.mode.as_deref(),
        params.id.as_deref(),
        params.last,
        params.month.as_deref(),
    )?;
    let sort: VersusSort = match params.sort.as_deref() {
        Some(s) => s.parse().map_err(ApiError::BadRequest)?,
        None => VersusSort::default(),
    };
    let min_sample = params
        .min_sample
        .unwrap_or(state.config.analysis.lab_min_sample);

    let catalog = &state.catalog;
    let did = catalog.resolve_key(&did).map_or(did.clone(), str::to_string);
    let opponent = params
        .opponent
        .as_deref()
        .filter(|o| !o.is_empty())
        .map(|o| catalog.resolve_key(o).unwrap_or(o).to_string());

    let tournaments = load_window(Arc::clone(&state.archive), &window).await?;
    let field = compute_deck_vs_field(&tournaments, &did);
    let best_worst = best_and_worst(&field.rows, min_sample);
    let trend = compute_deck_trend_by_month(&tournaments, &did, opponent.as_deref());

    let rows = filter_rows(&field.rows, min_sample, sort)
        .into_iter()
        .map(|row| LabeledRow {
            opponent_name: catalog.label(row.opponent_did.as_str(), None),
            row,
        })
        .collect();

    Ok(Json(DeckLabResponse {
        deck_name: catalog.label(&did, None),
        did,
        summary: field.summary,
        min_sample,
        sort,
        rows,
        best_worst,
        trend,
    }))
}
