//! Integration tests for the player host commands

use lesson_core::{LessonId, ProgressStore, ProgressValue};
use lesson_playback::{PlayerSignal, RawPlayerEvent};
use lesson_player::commands::{self, ReplayOptions};
use lesson_player::replay::read_events;
use lesson_player::{AppConfig, AppError};
use lesson_server_client::ServerConfig;
use lesson_storage::FileProgressStore;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.embed.pullzone = Some("vz-test".to_string());
    config.embed.library_id = Some("1001".to_string());
    config.storage.progress_dir = dir.join("progress");
    config
}

fn recording() -> Vec<RawPlayerEvent> {
    vec![
        RawPlayerEvent::new(json!({"event": "ready"})),
        RawPlayerEvent::new(json!({"event": "play"})),
        RawPlayerEvent::new(json!({"event": "timeupdate", "currentTime": 30, "duration": 120})),
        RawPlayerEvent::new(json!({"event": "timeupdate", "currentTime": 60, "duration": 120})),
        RawPlayerEvent::new(json!({"event": "ended"})),
    ]
}

fn options(lesson: &str, send: bool) -> ReplayOptions {
    ReplayOptions {
        lesson: LessonId::new(lesson),
        course: None,
        video_id: "abc-123".to_string(),
        send,
    }
}

fn percentages(signals: &[PlayerSignal]) -> Vec<f64> {
    signals
        .iter()
        .filter_map(|signal| match signal {
            PlayerSignal::Progress(progress) => Some(progress.percentage()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_file_values_are_loaded() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("player.toml");
        fs::write(
            &file,
            r#"
[embed]
pullzone = "vz-file"
library_id = "42"

[manager]
init_timeout_secs = 4

[heartbeat]
interval_secs = 30
"#,
        )
        .unwrap();

        let config = AppConfig::load_with_prefix(Some(&file), "LESSONTESTFILE").unwrap();

        assert_eq!(config.embed.pullzone.as_deref(), Some("vz-file"));
        assert_eq!(config.manager.init_timeout_secs, 4);
        assert_eq!(config.heartbeat.interval_secs, 30);
        // Untouched sections keep their defaults
        assert_eq!(config.resume.countdown_secs, 5);
        assert_eq!(config.heartbeat.max_attempts, 2);
        assert!(config.server.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("player.toml");
        fs::write(&file, "[embed]\npullzone = \"vz-file\"\n").unwrap();

        std::env::set_var("LESSONTESTENV_EMBED__PULLZONE", "vz-env");
        std::env::set_var("LESSONTESTENV_RESUME__COUNTDOWN_SECS", "8");
        let config = AppConfig::load_with_prefix(Some(&file), "LESSONTESTENV");
        std::env::remove_var("LESSONTESTENV_EMBED__PULLZONE");
        std::env::remove_var("LESSONTESTENV_RESUME__COUNTDOWN_SECS");

        let config = config.unwrap();
        assert_eq!(config.embed.pullzone.as_deref(), Some("vz-env"));
        assert_eq!(config.resume.countdown_secs, 8);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");

        let result = AppConfig::load_with_prefix(Some(&missing), "LESSONTESTMISSING");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_empty_resume_window_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("player.toml");
        fs::write(&file, "[resume]\nmin_percentage = 50\nmax_percentage = 50\n").unwrap();

        let result = AppConfig::load_with_prefix(Some(&file), "LESSONTESTWINDOW");
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("resume window")),
            other => panic!("Expected config error, got {:?}", other.map(|_| ())),
        }
    }
}

// =============================================================================
// Embed URL Tests
// =============================================================================

mod embed_url {
    use super::*;

    #[test]
    fn test_overrides_are_applied() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let url = commands::embed_url(&config, "abc-123", Some(90.0), true, false).unwrap();

        assert!(url.is_resolvable());
        assert!(url.as_str().starts_with("https://player-vz-test.mediadelivery.net/embed/"));
        assert!(url.as_str().contains("autoplay=true"));
        assert!(url.as_str().contains("t=90"));
    }

    #[test]
    fn test_missing_pullzone_is_not_resolvable() {
        let url = commands::embed_url(&AppConfig::default(), "abc-123", None, false, false)
            .unwrap();
        assert!(!url.is_resolvable());
    }

    #[test]
    fn test_empty_video_id_rejected() {
        let dir = TempDir::new().unwrap();
        let result = commands::embed_url(&config_in(dir.path()), "  ", None, false, false);
        assert!(matches!(result, Err(AppError::Playback(_))));
    }
}

// =============================================================================
// Replay Tests
// =============================================================================

mod replay {
    use super::*;

    #[tokio::test]
    async fn test_recording_produces_ordered_signals() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let outcome = commands::replay(&config, recording(), options("lesson-1", false))
            .await
            .unwrap();

        assert_eq!(outcome.events, 5);
        assert_eq!(outcome.signals.first(), Some(&PlayerSignal::Ready));
        assert_eq!(outcome.signals.last(), Some(&PlayerSignal::Completed));
        assert_eq!(percentages(&outcome.signals), vec![25.0, 50.0, 100.0]);
        assert!(outcome.final_progress.unwrap().is_complete());
        assert!(outcome.dispatch.is_none());
    }

    #[tokio::test]
    async fn test_progress_is_saved_locally() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        commands::replay(&config, recording(), options("lesson-1", false))
            .await
            .unwrap();

        let record = commands::show_progress(&config, &LessonId::new("lesson-1"))
            .unwrap()
            .expect("record saved");
        assert_eq!(record.progress().unwrap().percentage(), 100.0);
    }

    #[tokio::test]
    async fn test_recording_without_duration_emits_no_progress() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let events = vec![
            RawPlayerEvent::new(json!({"event": "ready"})),
            RawPlayerEvent::new(json!({"event": "timeupdate", "currentTime": 30, "duration": 0})),
            RawPlayerEvent::new(json!({"event": "timeupdate", "currentTime": 31})),
        ];

        let outcome = commands::replay(&config, events, options("lesson-2", false))
            .await
            .unwrap();

        assert!(percentages(&outcome.signals).is_empty());
        assert!(commands::show_progress(&config, &LessonId::new("lesson-2"))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_send_without_backend_fails() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let result = commands::replay(&config, recording(), options("lesson-1", true)).await;
        assert!(matches!(result, Err(AppError::NoBackend)));
    }

    #[tokio::test]
    async fn test_send_flushes_one_coalesced_heartbeat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/progress/heartbeat"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path());
        config.server = Some(ServerConfig::new(server.uri()));

        let outcome = commands::replay(&config, recording(), options("lesson-9", true))
            .await
            .unwrap();

        let report = outcome.dispatch.expect("session drained");
        assert_eq!(report.delivered, 1);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["lessonId"], "lesson-9");
        assert_eq!(body["progress"]["percentage"], 100.0);
    }

    #[test]
    fn test_read_events_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("session.jsonl");
        fs::write(
            &file,
            "{\"event\":\"ready\"}\n{\"type\":\"timeupdate\",\"data\":{\"seconds\":12,\"duration\":240}}\n",
        )
        .unwrap();

        let events = read_events(std::io::BufReader::new(fs::File::open(&file).unwrap())).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name(), Some("timeupdate"));
    }
}

// =============================================================================
// Saved Progress Tests
// =============================================================================

mod saved_progress {
    use super::*;

    fn seed(config: &AppConfig, lesson: &str, current_time: f64) {
        let store = FileProgressStore::open(&config.storage.progress_dir).unwrap();
        let progress = ProgressValue::from_playback(current_time, 600.0).unwrap();
        store.save(&LessonId::new(lesson), &progress).unwrap();
    }

    #[test]
    fn test_show_missing_lesson() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        assert!(commands::show_progress(&config, &LessonId::new("nope"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        seed(&config, "lesson-1", 300.0);

        commands::clear_progress(&config, &LessonId::new("lesson-1")).unwrap();

        assert!(commands::show_progress(&config, &LessonId::new("lesson-1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_resume_check_inside_window() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        seed(&config, "lesson-1", 300.0);

        let check = commands::resume_check(&config, &LessonId::new("lesson-1")).unwrap();

        assert!(check.visible);
        assert_eq!(check.countdown_secs, 5);
        assert_eq!(check.prior.unwrap().current_time(), 300.0);
    }

    #[test]
    fn test_resume_check_outside_window() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        // 2% and 98%
        seed(&config, "early", 12.0);
        seed(&config, "late", 588.0);

        assert!(!commands::resume_check(&config, &LessonId::new("early")).unwrap().visible);
        assert!(!commands::resume_check(&config, &LessonId::new("late")).unwrap().visible);
        assert!(!commands::resume_check(&config, &LessonId::new("never")).unwrap().visible);
    }
}
