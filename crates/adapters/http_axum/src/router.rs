//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use zonehub_app::ports::ControlService;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the API under `/api` and a liveness check at `/health`. Includes
/// a [`TraceLayer`] that logs each HTTP request/response at the `DEBUG`
/// level using the `tracing` ecosystem.
pub fn build<CS>(state: AppState<CS>) -> Router
where
    CS: ControlService + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use zonehub_domain::error::{NotFoundError, ZoneHubError};
    use zonehub_domain::id::EntryId;

    use zonehub_app::status::{EntryStatus, PauseStatus};
    use zonehub_domain::contact::PausePhase;

    struct StubControl {
        calls: Mutex<Vec<String>>,
    }

    impl StubControl {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn known(&self, entry: &EntryId) -> Result<(), ZoneHubError> {
            if entry.as_str() == "entry-1" {
                Ok(())
            } else {
                Err(NotFoundError {
                    kind: "Entry",
                    id: entry.to_string(),
                }
                .into())
            }
        }

        fn status_for(entry: &EntryId) -> EntryStatus {
            EntryStatus {
                entry_id: entry.clone(),
                name: "Main".to_string(),
                generated_at: zonehub_domain::time::now(),
                pause: PauseStatus {
                    phase: PausePhase::Running,
                    paused: false,
                    previous_hvac_mode: None,
                    triggered_by: None,
                    open_count: 0,
                    open_doors: 0,
                    open_windows: 0,
                },
                hvac_mode: None,
                inferred_hvac_mode: None,
                control_status: "idle, no rooms calling".to_string(),
                rooms: Vec::new(),
                vents: Vec::new(),
                open_vents: 0,
                min_vents_open: 0,
            }
        }
    }

    impl ControlService for StubControl {
        fn pause(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
            let result = self.known(entry);
            self.calls.lock().unwrap().push(format!("pause:{entry}"));
            async move { result }
        }

        fn resume(&self, entry: &EntryId) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
            let result = self.known(entry);
            self.calls.lock().unwrap().push(format!("resume:{entry}"));
            async move { result }
        }

        fn recalculate(
            &self,
            entry: &EntryId,
        ) -> impl Future<Output = Result<(), ZoneHubError>> + Send {
            let result = self.known(entry);
            self.calls
                .lock()
                .unwrap()
                .push(format!("recalculate:{entry}"));
            async move { result }
        }

        fn status(
            &self,
            entry: &EntryId,
        ) -> impl Future<Output = Result<EntryStatus, ZoneHubError>> + Send {
            let result = self.known(entry).map(|()| Self::status_for(entry));
            async move { result }
        }

        fn entries(&self) -> impl Future<Output = Vec<EntryId>> + Send {
            async { vec![EntryId::from("entry-1")] }
        }
    }

    fn app() -> Router {
        build(AppState::new(StubControl::new()))
    }

    async fn send(app: Router, method: &str, uri: &str) -> StatusCode {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        assert_eq!(send(app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_entries() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let ids: Vec<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ids, vec!["entry-1".to_string()]);
    }

    #[tokio::test]
    async fn should_serve_entry_status() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/entries/entry-1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["entry_id"], "entry-1");
        assert_eq!(json["pause"]["paused"], false);
    }

    #[tokio::test]
    async fn should_accept_pause_resume_recalculate() {
        for op in ["pause", "resume", "recalculate"] {
            let status = send(app(), "POST", &format!("/api/entries/entry-1/{op}")).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_entry() {
        assert_eq!(
            send(app(), "POST", "/api/entries/missing/pause").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(app(), "GET", "/api/entries/missing/status").await,
            StatusCode::NOT_FOUND
        );
    }
}
