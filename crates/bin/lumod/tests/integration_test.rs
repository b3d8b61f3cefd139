//! End-to-end smoke tests for the full lumod stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! state store, real engine, in-memory light driver, real axum router) and
//! exercises it via `tower::ServiceExt::oneshot` — no TCP port is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use lumo_adapter_http_axum::router;
use lumo_adapter_http_axum::state::AppState;
use lumo_adapter_storage_sqlite_sqlx::{Config as DbConfig, SqliteStateStore};
use lumo_app::circadian::CircadianService;
use lumo_app::engine::{Engine, EngineSettings};
use lumo_app::event_bus::InProcessEventBus;
use lumo_app::memory_driver::MemoryLightDriver;
use lumo_app::routines::RoutineSettings;
use lumo_domain::circadian::{CircadianEvent, Location, Schedule, TriggerTime, Validity};
use lumo_domain::color;
use lumo_domain::graph::ZoneGraph;
use lumo_domain::time::now;
use lumo_domain::zone::Zone;

type TestEngine = Engine<
    Arc<MemoryLightDriver>,
    Arc<SqliteStateStore>,
    Arc<SqliteStateStore>,
    Arc<SqliteStateStore>,
    Arc<InProcessEventBus>,
>;

struct Stack {
    app: axum::Router,
    engine: Arc<TestEngine>,
    driver: Arc<MemoryLightDriver>,
}

/// Build a fully-wired stack backed by an in-memory `SQLite` database.
async fn stack() -> Stack {
    let zones = vec![
        Zone::builder("Living Room")
            .lights([1, 2])
            .sensor(17)
            .motion_timeout(chrono::Duration::minutes(20))
            .exits_to(["Hallway"])
            .build()
            .unwrap(),
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
            name: "always".to_string(),
            color: color::DUSK,
            brightness: 254,
            trigger: TriggerTime::Clock("00:00:00".parse().unwrap()),
            validity: Validity::Always,
        }],
        Location::new(0.0, 0.0, chrono_tz::UTC).unwrap(),
    )
    .unwrap();

    let db = DbConfig {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let store = Arc::new(SqliteStateStore::new(db.pool().clone()));

    let driver = Arc::new(MemoryLightDriver::new());
    let event_bus = Arc::new(InProcessEventBus::new(64));
    let engine = Arc::new(Engine::new(
        ZoneGraph::new(zones).unwrap(),
        EngineSettings::default(),
        Arc::clone(&driver),
        Arc::clone(&store),
        Arc::clone(&store),
        CircadianService::new(schedule, Arc::clone(&store)),
        Arc::clone(&event_bus),
    ));
    engine.enable_motion().await;
    engine.restore_persisted_motion().await;

    let app = router::build(AppState::new(
        Arc::clone(&engine),
        event_bus,
        RoutineSettings {
            wakeup_zone: "Stairway".to_string(),
            vacation_reference_zone: "Hallway".to_string(),
            ..RoutineSettings::default()
        },
    ));

    Stack {
        app,
        engine,
        driver,
    }
}

async fn get_json(app: &axum::Router, uri: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;
    let response = stack
        .app
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
async fn should_reflect_motion_in_zone_snapshot() {
    let stack = stack().await;

    let json = get_json(&stack.app, "/api/zones").await;
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert!(json.as_array().unwrap().iter().all(|z| z["occupied"] == false));

    stack.engine.on_motion(17, true, now()).await.unwrap();

    let json = get_json(&stack.app, "/api/zones").await;
    let living_room = json
        .as_array()
        .unwrap()
        .iter()
        .find(|z| z["name"] == "Living Room")
        .unwrap();
    assert_eq!(living_room["occupied"], true);
    assert_eq!(living_room["lit"], true);
}

#[tokio::test]
async fn should_corroborate_exit_and_power_off_through_full_stack() {
    let stack = stack().await;
    let start = now() - chrono::Duration::minutes(25);

    // A person crosses from the living room into the hallway, 25 minutes ago.
    stack.engine.on_motion(17, true, start).await.unwrap();
    stack
        .engine
        .on_motion(17, false, start + chrono::Duration::seconds(5))
        .await
        .unwrap();
    stack
        .engine
        .on_motion(27, true, start + chrono::Duration::seconds(8))
        .await
        .unwrap();
    stack
        .engine
        .on_motion(27, false, start + chrono::Duration::seconds(40))
        .await
        .unwrap();

    // Both zones are long past their timeouts; the corroborated exit lets
    // the sweep power off the living room, and the hallway follows as a
    // plain timeout.
    stack.engine.disable_inactive_zones().await;

    let json = get_json(&stack.app, "/api/zones").await;
    for zone in json.as_array().unwrap() {
        assert_eq!(zone["occupied"], false, "{}", zone["name"]);
        assert_eq!(zone["lit"], false, "{}", zone["name"]);
    }

    let offs: Vec<_> = stack
        .driver
        .sent_commands()
        .into_iter()
        .filter(|(_, cmd)| cmd.is_off())
        .collect();
    assert_eq!(offs.len(), 2);
}

#[tokio::test]
async fn should_persist_flags_through_the_state_store() {
    let stack = stack().await;

    let response = stack
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/flags/party_mode")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"value": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_json(&stack.app, "/api/flags/party_mode").await;
    assert_eq!(json["value"], true);

    // Party mode swallows motion events entirely.
    stack.engine.on_motion(17, true, now()).await.unwrap();
    let zones = get_json(&stack.app, "/api/zones").await;
    let living_room = zones
        .as_array()
        .unwrap()
        .iter()
        .find(|z| z["name"] == "Living Room")
        .unwrap();
    assert_eq!(living_room["occupied"], false);
}

#[tokio::test]
async fn should_answer_circadian_queries() {
    let stack = stack().await;

    let current = get_json(&stack.app, "/api/circadian/current").await;
    assert_eq!(current["name"], "always");

    let next = get_json(&stack.app, "/api/circadian/next").await;
    assert_eq!(next["event"]["name"], "always");
    assert!(next["at"].is_string());
}

#[tokio::test]
async fn should_remember_motion_across_engine_restarts() {
    let zones = || {
        vec![
            Zone::builder("Hallway")
                .lights([14])
                .sensor(27)
                .motion_timeout(chrono::Duration::minutes(5))
                .build()
                .unwrap(),
        ]
    };
    let schedule = || {
        Schedule::new(
            vec![CircadianEvent {
                name: "always".to_string(),
                color: color::DUSK,
                brightness: 254,
                trigger: TriggerTime::Clock("00:00:00".parse().unwrap()),
                validity: Validity::Always,
            }],
            Location::new(0.0, 0.0, chrono_tz::UTC).unwrap(),
        )
        .unwrap()
    };

    let db = DbConfig {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .unwrap();
    let store = Arc::new(SqliteStateStore::new(db.pool().clone()));

    let build_engine = |store: Arc<SqliteStateStore>, driver: Arc<MemoryLightDriver>| {
        Engine::new(
            ZoneGraph::new(zones()).unwrap(),
            EngineSettings::default(),
            driver,
            Arc::clone(&store),
            Arc::clone(&store),
            CircadianService::new(schedule(), Arc::clone(&store)),
            Arc::new(InProcessEventBus::new(16)),
        )
    };

    // Motion 6 minutes ago, persisted through the store by the first engine.
    let at = now() - chrono::Duration::minutes(6);
    let first = build_engine(Arc::clone(&store), Arc::new(MemoryLightDriver::new()));
    first.enable_motion().await;
    first.on_motion(27, true, at).await.unwrap();
    first.on_motion(27, false, at).await.unwrap();

    // A fresh engine over the same store picks the timestamp back up: the
    // sweep knows the zone timed out even though this process never saw
    // the motion. Without restoration it would treat the zone as unknown
    // and leave the light on.
    let driver = Arc::new(MemoryLightDriver::new());
    driver.set_power(lumo_domain::zone::LightId::new(14), true);
    let second = build_engine(store, Arc::clone(&driver));
    second.restore_persisted_motion().await;
    second.disable_inactive_zones().await;

    assert!(driver.sent_commands().iter().any(|(_, cmd)| cmd.is_off()));
}
