pub mod archive;
pub mod lab;
pub mod live;

#[cfg(test)]
pub(crate) mod test_support {
    //! Router harness shared by the route tests.

    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use tokio::sync::RwLock;
    use tower::util::ServiceExt;

    use crate::api::state::AppState;
    use crate::archive::{ArchiveSource, LocalArchive};
    use crate::calculate::fixtures::{bye, game, player, tournament};
    use crate::catalog::{DeckCatalog, DeckCatalogItem};
    use crate::config::AppConfig;
    use crate::live::LiveSession;
    use crate::models::Tournament;
    use crate::storage::{export_tournament, LiveStore, MemoryLiveStore};

    /// Four players, two rounds, three decks.
    pub fn february() -> Tournament {
        let mut t = tournament("t1", "2026-02-03");
        player(&mut t, "p1", "Alice", Some("suisei"));
        player(&mut t, "p2", "Bob", Some("azki"));
        player(&mut t, "p3", "Carol", Some("suisei"));
        player(&mut t, "p4", "Dan", Some("pekora"));
        game(&mut t, 1, "p1", "p2", Some("A"));
        game(&mut t, 1, "p3", "p4", Some("B"));
        game(&mut t, 2, "p1", "p4", Some("D"));
        game(&mut t, 2, "p2", "p3", Some("B"));
        t
    }

    pub fn march() -> Tournament {
        let mut t = tournament("t2", "2026-03-03");
        player(&mut t, "p1", "Alice", Some("suisei"));
        player(&mut t, "p2", "Bob", Some("azki"));
        player(&mut t, "p3", "Carol", Some("pekora"));
        game(&mut t, 1, "p1", "p2", Some("B"));
        bye(&mut t, 1, "p3");
        t
    }

    fn catalog() -> DeckCatalog {
        let item = |key: &str, name: &str, color: &str| DeckCatalogItem {
            key: key.to_string(),
            name: name.to_string(),
            oshi: None,
            color: Some(color.to_string()),
            icon: None,
            aliases: None,
        };
        DeckCatalog::new(vec![
            item("suisei", "Hoshimachi Suisei", "#3b82f6"),
            item("azki", "AZKi", "#ec4899"),
            item("pekora", "Usada Pekora", "#f97316"),
        ])
    }

    /// State over an archive holding [`february`] and [`march`] and a live
    /// store seeded with `live`.
    pub fn setup_state(dir: &Path, live: Option<Tournament>) -> AppState {
        for t in [february(), march()] {
            export_tournament(&t, dir).unwrap();
        }
        let archive: Arc<dyn ArchiveSource> =
            Arc::new(LocalArchive::new(dir.to_path_buf(), "index.json"));

        let config = AppConfig::default();
        let store: Box<dyn LiveStore> = match live {
            Some(t) => Box::new(MemoryLiveStore::with(t)),
            None => Box::new(MemoryLiveStore::new()),
        };
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let session = LiveSession::open(store, config.live.clone(), today).unwrap();

        AppState {
            config: Arc::new(config),
            live: Arc::new(RwLock::new(session)),
            archive,
            catalog: Arc::new(catalog()),
        }
    }

    async fn into_json(resp: axum::response::Response) -> (StatusCode, Value) {
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        into_json(resp).await
    }

    pub async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        into_json(resp).await
    }
}
