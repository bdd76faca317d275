use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_window, ApiError};
use crate::archive::{self, available_months, load_window, TournamentIndexItem};
use crate::calculate::aggregate_players_and_decks;
use crate::catalog::{meta_slices, MetaSlice};
use crate::models::{DeckAgg, PlayerAgg};

/// Slices in the meta-share pie before the rest is folded into "Others".
const META_PIE_TOP: usize = 8;

pub async fn index(
    State(state): State<AppState>,
) -> Result<Json<Vec<TournamentIndexItem>>, ApiError> {
    Ok(Json(archive::load_index(state.archive.as_ref()).await?))
}

pub async fn months(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let index = archive::load_index(state.archive.as_ref()).await?;
    Ok(Json(available_months(&index)))
}

#[derive(Debug, Deserialize)]
pub struct AggregateParams {
    /// `all` (default), `single`, `last` or `month`.
    pub mode: Option<String>,
    pub id: Option<String>,
    pub last: Option<usize>,
    pub month: Option<String>,
    /// Sample gate for the ranked deck lists.
    pub min_matches: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub tournaments: Vec<String>,
    pub players: Vec<PlayerAgg>,
    pub decks: Vec<DeckAgg>,
    pub total_entries: u32,
    pub min_matches: u32,
    pub by_win_rate: Vec<DeckAgg>,
    pub by_dominance: Vec<DeckAgg>,
    pub meta_pie: Vec<MetaSlice>,
}

pub async fn aggregate(
    State(state): State<AppState>,
    Query(params): Query<AggregateParams>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let window = parse_window(
        params.mode.as_deref(),
        params.id.as_deref(),
        params.last,
        params.month.as_deref(),
    )?;
    let min_matches = params
        .min_matches
        .unwrap_or(state.config.analysis.dashboard_min_matches);

    let tournaments = load_window(Arc::clone(&state.archive), &window).await?;
    let agg = aggregate_players_and_decks(&tournaments);

    let by_win_rate = agg.decks_by_win_rate(min_matches).into_iter().cloned().collect();
    let by_dominance = agg.decks_by_dominance(min_matches).into_iter().cloned().collect();
    let meta_pie = meta_slices(&agg.decks, &state.catalog, META_PIE_TOP);

    Ok(Json(AggregateResponse {
        tournaments: tournaments.iter().map(|t| t.id.to_string()).collect(),
        players: agg.players,
        decks: agg.decks,
        total_entries: agg.total_entries,
        min_matches,
        by_win_rate,
        by_dominance,
        meta_pie,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, setup_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_archive_index_and_months() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), None);

        let (status, json) = get_json(build_router(state.clone()), "/api/archive/index").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["t2", "t1"]);

        let (_, json) = get_json(build_router(state), "/api/archive/months").await;
        assert_eq!(json, serde_json::json!(["2026-03", "2026-02"]));
    }

    #[tokio::test]
    async fn test_aggregate_all() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), None);

        let (status, json) = get_json(build_router(state), "/api/archive/aggregate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tournaments"], serde_json::json!(["t1", "t2"]));
        assert_eq!(json["totalEntries"], 7);
        assert_eq!(json["decks"][0]["did"], "suisei");
        assert_eq!(json["decks"][0]["entries"], 3);
        // default gate of 6 matches leaves nothing ranked
        assert_eq!(json["minMatches"], 6);
        assert!(json["byWinRate"].as_array().unwrap().is_empty());
        assert_eq!(json["metaPie"][0]["name"], "Hoshimachi Suisei");
        assert_eq!(json["metaPie"][0]["value"], 42.9);
    }

    #[tokio::test]
    async fn test_aggregate_gate_and_window() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), None);

        let (_, json) = get_json(
            build_router(state.clone()),
            "/api/archive/aggregate?min_matches=1",
        )
        .await;
        let ranked: Vec<_> = json["byWinRate"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["did"].as_str().unwrap())
            .collect();
        assert_eq!(ranked, vec!["pekora", "suisei", "azki"]);

        let (_, json) = get_json(
            build_router(state.clone()),
            "/api/archive/aggregate?mode=month&month=2026-03",
        )
        .await;
        assert_eq!(json["tournaments"], serde_json::json!(["t2"]));
        assert_eq!(json["totalEntries"], 3);

        let (status, _) = get_json(
            build_router(state.clone()),
            "/api/archive/aggregate?mode=single&id=nope",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            get_json(build_router(state), "/api/archive/aggregate?mode=month&month=03").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
