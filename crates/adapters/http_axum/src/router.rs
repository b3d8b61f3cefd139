//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use lumo_app::ports::{FlagStore, LightDriver, MotionStore, WeatherProvider};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the API under `/api` and includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<L, F, M, W>(state: AppState<L, F, M, W>) -> Router
where
    L: LightDriver + 'static,
    F: FlagStore + 'static,
    M: MotionStore + 'static,
    W: WeatherProvider + 'static,
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
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use lumo_app::circadian::CircadianService;
    use lumo_app::engine::{Engine, EngineSettings};
    use lumo_app::event_bus::InProcessEventBus;
    use lumo_app::memory_driver::MemoryLightDriver;
    use lumo_app::ports::{EventPublisher, Flag};
    use lumo_app::routines::RoutineSettings;
    use lumo_domain::circadian::{CircadianEvent, Location, Schedule, TriggerTime, Validity};
    use lumo_domain::color;
    use lumo_domain::error::LumoError;
    use lumo_domain::event::ZoneEvent;
    use lumo_domain::graph::ZoneGraph;
    use lumo_domain::time::Timestamp;
    use lumo_domain::zone::Zone;

    #[derive(Default)]
    struct MemoryFlags {
        store: Mutex<HashMap<&'static str, bool>>,
    }

    impl FlagStore for MemoryFlags {
        fn flag(&self, flag: Flag) -> impl Future<Output = Result<bool, LumoError>> + Send {
            let value = self
                .store
                .lock()
                .unwrap()
                .get(flag.key())
                .copied()
                .unwrap_or(false);
            async move { Ok(value) }
        }

        fn set_flag(
            &self,
            flag: Flag,
            value: bool,
        ) -> impl Future<Output = Result<(), LumoError>> + Send {
            self.store.lock().unwrap().insert(flag.key(), value);
            async { Ok(()) }
        }
    }

    struct NoopMotionStore;

    impl MotionStore for NoopMotionStore {
        fn last_motion(
            &self,
            _zone: &str,
        ) -> impl Future<Output = Result<Option<Timestamp>, LumoError>> + Send {
            async { Ok(None) }
        }

        fn set_last_motion(
            &self,
            _zone: &str,
            _at: Timestamp,
        ) -> impl Future<Output = Result<(), LumoError>> + Send {
            async { Ok(()) }
        }
    }

    struct ClearSky;

    impl WeatherProvider for ClearSky {
        fn cloud_cover(&self) -> impl Future<Output = Result<f64, LumoError>> + Send {
            async { Ok(0.0) }
        }
    }

    fn test_state() -> (
        AppState<Arc<MemoryLightDriver>, MemoryFlags, NoopMotionStore, ClearSky>,
        Arc<InProcessEventBus>,
    ) {
        let zones = vec![
            Zone::builder("Hallway")
                .lights([14])
                .sensor(27)
                .motion_timeout(chrono::Duration::minutes(5))
                .build()
                .unwrap(),
            Zone::builder("Stairway").lights([13]).build().unwrap(),
        ];
        let schedule = Schedule::new(
            vec![CircadianEvent {
                name: "night".to_string(),
                color: color::DUSK,
                brightness: 254,
                trigger: TriggerTime::Clock("00:00:00".parse().unwrap()),
                validity: Validity::Always,
            }],
            Location::new(0.0, 0.0, chrono_tz::UTC).unwrap(),
        )
        .unwrap();

        let event_bus = Arc::new(InProcessEventBus::new(16));
        let engine = Arc::new(Engine::new(
            ZoneGraph::new(zones).unwrap(),
            EngineSettings::default(),
            Arc::new(MemoryLightDriver::new()),
            MemoryFlags::default(),
            NoopMotionStore,
            CircadianService::new(schedule, ClearSky),
            Arc::clone(&event_bus),
        ));

        (
            AppState::new(engine, Arc::clone(&event_bus), RoutineSettings::default()),
            event_bus,
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_zone_snapshot() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/zones")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|z| z["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Hallway", "Stairway"]);
        assert_eq!(json[0]["occupied"], false);
        assert_eq!(json[0]["lit"], false);
    }

    #[tokio::test]
    async fn should_answer_current_circadian_event() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/circadian/current")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "night");
        assert_eq!(json["brightness"], 254);
    }

    #[tokio::test]
    async fn should_answer_next_circadian_event_with_trigger() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/circadian/next")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["event"]["name"], "night");
        assert!(json["at"].is_string());
    }

    #[tokio::test]
    async fn should_roundtrip_flag_through_api() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/flags/guest_mode")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"value": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/flags/guest_mode")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["value"], true);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_flag() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/flags/disco_mode")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_accept_routine_triggers() {
        let (state, _) = test_state();
        let app = build(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/routines/wakeup")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn should_subscribe_sse_stream_to_event_bus() {
        let (state, event_bus) = test_state();

        // A direct subscription proves events flow through the shared bus
        // the SSE stream subscribes to.
        let mut rx = event_bus.subscribe();
        let _sse = crate::api::sse::stream(axum::extract::State(state)).await;

        let event = ZoneEvent::CircadianChanged {
            event: "sunset".to_string(),
        };
        event_bus.publish(event.clone()).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }
}
