use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{compute_deck_matchups, compute_deck_stats, compute_standings};
use crate::models::{DeckTournamentStats, DeckVsDeckCell, MatchResult, PlayerStanding, Tournament};

// ── Reads ───────────────────────────────────────────────────────

pub async fn show(State(state): State<AppState>) -> Json<Tournament> {
    Json(state.live.read().await.tournament().clone())
}

pub async fn standings(State(state): State<AppState>) -> Json<Vec<PlayerStanding>> {
    Json(compute_standings(state.live.read().await.tournament()))
}

pub async fn deck_stats(State(state): State<AppState>) -> Json<Vec<DeckTournamentStats>> {
    Json(compute_deck_stats(state.live.read().await.tournament()))
}

pub async fn matchups(State(state): State<AppState>) -> Json<Vec<DeckVsDeckCell>> {
    Json(compute_deck_matchups(state.live.read().await.tournament()))
}

// ── Edits ───────────────────────────────────────────────────────

/// Response of an edit that creates something.
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: String,
    pub tournament: Tournament,
}

#[derive(Debug, Serialize)]
pub struct RoundResponse {
    pub round: u32,
    pub tournament: Tournament,
}

#[derive(Debug, Deserialize)]
pub struct AddPlayerBody {
    pub name: String,
}

pub async fn add_player(
    State(state): State<AppState>,
    Json(body): Json<AddPlayerBody>,
) -> Result<Json<Created>, ApiError> {
    let mut live = state.live.write().await;
    let pid = live.add_player(&body.name)?;
    Ok(Json(Created {
        id: pid.to_string(),
        tournament: live.tournament().clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetEntryBody {
    pub pid: String,
    /// Empty or absent clears the entry.
    #[serde(default)]
    pub did: String,
}

pub async fn set_entry(
    State(state): State<AppState>,
    Json(body): Json<SetEntryBody>,
) -> Result<Json<Tournament>, ApiError> {
    let mut live = state.live.write().await;
    live.set_entry(&body.pid, &body.did)?;
    Ok(Json(live.tournament().clone()))
}

pub async fn start_round(State(state): State<AppState>) -> Result<Json<RoundResponse>, ApiError> {
    let mut live = state.live.write().await;
    let round = live.start_round()?;
    Ok(Json(RoundResponse {
        round,
        tournament: live.tournament().clone(),
    }))
}

pub async fn close_round(State(state): State<AppState>) -> Result<Json<RoundResponse>, ApiError> {
    let mut live = state.live.write().await;
    let round = live.close_round()?;
    Ok(Json(RoundResponse {
        round,
        tournament: live.tournament().clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddMatchBody {
    pub a: String,
    /// Absent for a bye.
    pub b: Option<String>,
}

pub async fn add_match(
    State(state): State<AppState>,
    Json(body): Json<AddMatchBody>,
) -> Result<Json<Created>, ApiError> {
    let mut live = state.live.write().await;
    let mid = live.add_match(&body.a, body.b.as_deref())?;
    Ok(Json(Created {
        id: mid.to_string(),
        tournament: live.tournament().clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetResultBody {
    /// `A`, `B` or `D`.
    pub result: String,
}

pub async fn set_result(
    State(state): State<AppState>,
    Path(mid): Path<String>,
    Json(body): Json<SetResultBody>,
) -> Result<Json<Tournament>, ApiError> {
    let result = MatchResult::from_code(&body.result)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown result '{}'", body.result)))?;

    let mut live = state.live.write().await;
    live.set_result(&mid, result)?;
    Ok(Json(live.tournament().clone()))
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<Tournament>, ApiError> {
    let mut live = state.live.write().await;
    live.reset(chrono::Local::now().date_naive())?;
    Ok(Json(live.tournament().clone()))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{february, get_json, post_json, setup_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_live_reads() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), Some(february()));

        let (status, json) = get_json(build_router(state.clone()), "/api/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], "t1");
        assert_eq!(json["rounds"].as_array().unwrap().len(), 2);

        let (status, json) = get_json(build_router(state.clone()), "/api/live/standings").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3]["pid"], "p2");
        assert_eq!(rows[3]["points"], 0);

        let (_, json) = get_json(build_router(state.clone()), "/api/live/deck-stats").await;
        assert_eq!(json[0]["did"], "suisei");
        assert_eq!(json[0]["players"], 2);
        assert_eq!(json[0]["metaShare"], 0.5);

        let (_, json) = get_json(build_router(state), "/api/live/matchups").await;
        let cells = json.as_array().unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0]["matches"], 2);
    }

    #[tokio::test]
    async fn test_live_editing_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), None);
        let app = || build_router(state.clone());

        let (status, json) = post_json(app(), "/api/live/players", json!({"name": "Alice"})).await;
        assert_eq!(status, StatusCode::OK);
        let alice = json["id"].as_str().unwrap().to_string();
        let (_, json) = post_json(app(), "/api/live/players", json!({"name": "Bob"})).await;
        let bob = json["id"].as_str().unwrap().to_string();

        let (status, _) = post_json(
            app(),
            "/api/live/entries",
            json!({"pid": alice, "did": "suisei"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = post_json(app(), "/api/live/rounds", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["round"], 1);

        let (_, json) = post_json(app(), "/api/live/matches", json!({"a": alice, "b": bob})).await;
        let mid = json["id"].as_str().unwrap().to_string();

        let (status, json) = post_json(app(), "/api/live/rounds/close", json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");

        let uri = format!("/api/live/matches/{}/result", mid);
        let (status, _) = post_json(app(), &uri, json!({"result": "X"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = post_json(app(), &uri, json!({"result": "a"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = post_json(app(), "/api/live/rounds/close", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tournament"]["rounds"][0]["locked"], true);

        let (_, json) = get_json(app(), "/api/live/standings").await;
        assert_eq!(json[0]["name"], "Alice");
        assert_eq!(json[0]["points"], 3);
    }

    #[tokio::test]
    async fn test_live_edit_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), None);

        let (status, json) =
            post_json(build_router(state.clone()), "/api/live/players", json!({"name": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, _) =
            post_json(build_router(state.clone()), "/api/live/matches", json!({"a": "p_x"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            post_json(build_router(state), "/api/live/rounds/close", json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_live_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(tmp.path(), Some(february()));

        let app = build_router(state.clone());
        let (status, json) = post_json(app, "/api/live/reset", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["players"].as_array().unwrap().is_empty());
        assert_eq!(json["name"], state.config.live.default_name);
    }
}
