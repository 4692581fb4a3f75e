//! Property-based tests for the event normalizer
//!
//! Uses proptest to check the progress invariants across arbitrary telemetry.

use lesson_core::PLAUSIBLE_DURATION_SECS;
use lesson_playback::{EventNormalizer, PlayerEvent, PlayerSignal};
use proptest::prelude::*;

// ===== Helpers =====

fn arbitrary_duration() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        (0.0f64..=10.0).prop_map(Some),
        (10.0f64..10_000.0).prop_map(Some),
        Just(Some(f64::NAN)),
        Just(Some(f64::INFINITY)),
    ]
}

fn arbitrary_event() -> impl Strategy<Value = PlayerEvent> {
    prop_oneof![
        4 => (0.0f64..20_000.0, arbitrary_duration()).prop_map(|(current_time, duration)| {
            PlayerEvent::TimeUpdate { current_time, duration }
        }),
        1 => arbitrary_duration().prop_map(|duration| PlayerEvent::Loaded { duration }),
        1 => arbitrary_duration().prop_map(|duration| PlayerEvent::Metadata { duration }),
        1 => Just(PlayerEvent::Play),
        1 => Just(PlayerEvent::Pause),
        1 => Just(PlayerEvent::Ended),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: every emitted percentage is within 0..=100 and comes from a
    /// plausible duration
    #[test]
    fn emitted_progress_is_bounded(
        events in prop::collection::vec(arbitrary_event(), 1..200),
        live in arbitrary_duration(),
    ) {
        let mut normalizer = EventNormalizer::new();

        for event in events {
            for signal in normalizer.normalize(event, || live) {
                if let PlayerSignal::Progress(p) = signal {
                    prop_assert!((0.0..=100.0).contains(&p.percentage()));
                    prop_assert!(p.duration() > PLAUSIBLE_DURATION_SECS);
                    prop_assert!(p.current_time() >= 0.0);
                }
            }
        }
    }

    /// Property: with only implausible durations, nothing is ever emitted
    #[test]
    fn implausible_durations_never_emit(
        samples in prop::collection::vec((0.0f64..5_000.0, 0.0f64..=10.0), 1..100),
    ) {
        let mut normalizer = EventNormalizer::new();

        for (current_time, duration) in samples {
            let signals = normalizer.normalize(
                PlayerEvent::TimeUpdate { current_time, duration: Some(duration) },
                || Some(duration),
            );
            prop_assert!(signals.is_empty());
        }
    }

    /// Property: a correction re-emits the most recent position
    #[test]
    fn correction_uses_latest_position(
        positions in prop::collection::vec(0.0f64..1_000.0, 1..20),
        duration in 10.5f64..5_000.0,
    ) {
        let mut normalizer = EventNormalizer::new();

        for &current_time in &positions {
            normalizer.normalize(
                PlayerEvent::TimeUpdate { current_time, duration: Some(1.0) },
                || None,
            );
        }

        let signals = normalizer.normalize(PlayerEvent::Metadata { duration: Some(duration) }, || None);
        let last = *positions.last().unwrap();

        prop_assert_eq!(signals.len(), 1);
        match &signals[0] {
            PlayerSignal::Progress(p) => {
                prop_assert_eq!(p.current_time(), last);
                prop_assert_eq!(p.duration(), duration);
            }
            other => prop_assert!(false, "unexpected signal {:?}", other),
        }
    }
}
