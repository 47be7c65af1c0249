//! Geofence transition handler

use crate::{Notice, NoticeDuration, NoticeKind, Notifier};
use location_model::{CoreEvent, EventBus, RawGeofenceEvent, TransitionEvent, TransitionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Handler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Human-readable name of the monitored place, used in notices
    pub place_name: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            place_name: "Nathan Phillips Square".to_string(),
        }
    }
}

/// Converts geofence events into notices.
///
/// Stateless across events: no debouncing and no check that transitions
/// alternate.
pub struct GeofenceHandler {
    config: HandlerConfig,
    notifier: Arc<dyn Notifier>,
    bus: Option<EventBus>,
}

impl GeofenceHandler {
    /// Create a new handler
    pub fn new(config: HandlerConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            notifier,
            bus: None,
        }
    }

    /// Also publish ENTER/EXIT transitions on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Handle one raw event; returns the notice shown, if any
    pub fn on_event(&self, raw: &RawGeofenceEvent) -> Option<Notice> {
        let event = TransitionEvent::decode(raw);

        if event.errored {
            warn!(
                "Geofence error event (code {:?}, transition {:?})",
                raw.error_code, raw.transition
            );
            let notice = Notice {
                kind: NoticeKind::GeofenceError,
                region_id: None,
                message: "Geofence error occurred".to_string(),
                duration: NoticeDuration::Short,
            };
            self.notifier.notify(&notice);
            return Some(notice);
        }

        let notice = match event.kind {
            TransitionKind::Enter => {
                info!("Entered geofence {}", event.region_id);
                Notice {
                    kind: NoticeKind::RegionEntered,
                    region_id: Some(event.region_id.clone()),
                    message: format!("Congrats! You are at {}", self.config.place_name),
                    duration: NoticeDuration::Long,
                }
            }
            TransitionKind::Exit => {
                info!("Exited geofence {}", event.region_id);
                Notice {
                    kind: NoticeKind::RegionExited,
                    region_id: Some(event.region_id.clone()),
                    message: format!("Ooops, you have exited {}", self.config.place_name),
                    duration: NoticeDuration::Long,
                }
            }
            TransitionKind::Dwell | TransitionKind::Unrecognized(_) => {
                trace!("Ignoring geofence transition {:?}", event.kind);
                return None;
            }
        };

        self.notifier.notify(&notice);
        if let Some(bus) = &self.bus {
            bus.publish(CoreEvent::TransitionOccurred {
                region_id: event.region_id,
                kind: event.kind,
            });
        }

        Some(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingNotifier;
    use proptest::prelude::*;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory sink for formatted log lines
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Log lines emitted while handling `raw`
    fn logged_lines(raw: &RawGeofenceEvent) -> Vec<String> {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let (handler, _notifier) = handler();

        tracing::subscriber::with_default(subscriber, || {
            handler.on_event(raw);
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        output.lines().map(str::to_string).collect()
    }

    fn count_containing(lines: &[String], needle: &str) -> usize {
        lines.iter().filter(|line| line.contains(needle)).count()
    }

    fn handler() -> (GeofenceHandler, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let handler = GeofenceHandler::new(HandlerConfig::default(), notifier.clone());
        (handler, notifier)
    }

    #[test]
    fn test_enter_notice() {
        let (handler, notifier) = handler();
        let raw = RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Enter);

        let notice = handler.on_event(&raw).unwrap();

        assert_eq!(notice.kind, NoticeKind::RegionEntered);
        assert_eq!(notice.region_id.as_deref(), Some("ExampleGeofence"));
        assert_eq!(notice.message, "Congrats! You are at Nathan Phillips Square");
        assert_eq!(notice.duration, NoticeDuration::Long);
        assert_eq!(notifier.kinds(), vec![NoticeKind::RegionEntered]);
    }

    #[test]
    fn test_exit_notice() {
        let (handler, notifier) = handler();
        let raw = RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Exit);

        handler.on_event(&raw);

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::RegionExited);
        assert_eq!(notices[0].message, "Ooops, you have exited Nathan Phillips Square");
    }

    #[test]
    fn test_error_notice_is_short() {
        let (handler, notifier) = handler();

        let notice = handler.on_event(&RawGeofenceEvent::error(1000)).unwrap();

        assert_eq!(notice.kind, NoticeKind::GeofenceError);
        assert_eq!(notice.message, "Geofence error occurred");
        assert_eq!(notice.duration, NoticeDuration::Short);
        assert_eq!(notifier.kinds(), vec![NoticeKind::GeofenceError]);
    }

    #[test]
    fn test_dwell_and_unknown_ignored() {
        let (handler, notifier) = handler();

        assert!(handler
            .on_event(&RawGeofenceEvent::transition("r", TransitionKind::Dwell))
            .is_none());
        assert!(handler
            .on_event(&RawGeofenceEvent::transition("r", TransitionKind::Unrecognized(8)))
            .is_none());
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_missing_transition_is_ignored() {
        let (handler, notifier) = handler();
        let raw = RawGeofenceEvent {
            triggering_region_ids: vec!["ExampleGeofence".to_string()],
            ..Default::default()
        };

        assert!(handler.on_event(&raw).is_none());
        assert!(notifier.kinds().is_empty());
    }

    #[test]
    fn test_transitions_log_one_line_each() {
        let enter = logged_lines(&RawGeofenceEvent::transition(
            "ExampleGeofence",
            TransitionKind::Enter,
        ));
        assert_eq!(count_containing(&enter, "Entered geofence ExampleGeofence"), 1);
        assert_eq!(count_containing(&enter, "Exited geofence"), 0);

        let exit = logged_lines(&RawGeofenceEvent::transition(
            "ExampleGeofence",
            TransitionKind::Exit,
        ));
        assert_eq!(count_containing(&exit, "Exited geofence ExampleGeofence"), 1);
        assert_eq!(count_containing(&exit, "Entered geofence"), 0);
    }

    #[test]
    fn test_errored_and_ignored_events_log_no_transition() {
        let mut errored = RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Enter);
        errored.error_code = Some(1000);

        for raw in [
            errored,
            RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Dwell),
            RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Unrecognized(8)),
        ] {
            let lines = logged_lines(&raw);
            assert_eq!(count_containing(&lines, "Entered geofence"), 0, "{:?}", raw);
            assert_eq!(count_containing(&lines, "Exited geofence"), 0, "{:?}", raw);
        }
    }

    #[test]
    fn test_repeated_enter_not_debounced() {
        let (handler, notifier) = handler();
        let raw = RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Enter);

        handler.on_event(&raw);
        handler.on_event(&raw);

        assert_eq!(
            notifier.kinds(),
            vec![NoticeKind::RegionEntered, NoticeKind::RegionEntered]
        );
    }

    #[tokio::test]
    async fn test_publishes_transition_on_bus() {
        let notifier = Arc::new(RecordingNotifier::new());
        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let handler =
            GeofenceHandler::new(HandlerConfig::default(), notifier).with_event_bus(bus);

        handler.on_event(&RawGeofenceEvent::error(1));
        handler.on_event(&RawGeofenceEvent::transition("ExampleGeofence", TransitionKind::Exit));

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::TransitionOccurred {
                region_id: "ExampleGeofence".to_string(),
                kind: TransitionKind::Exit,
            }
        );
        assert!(events.try_recv().is_err());
    }

    proptest! {
        #[test]
        fn prop_errored_events_only_show_error(
            code in any::<i32>(),
            transition in proptest::option::of(any::<i32>()),
        ) {
            let (handler, notifier) = handler();
            let raw = RawGeofenceEvent {
                error_code: Some(code),
                transition,
                triggering_region_ids: vec!["ExampleGeofence".to_string()],
            };

            handler.on_event(&raw);

            prop_assert_eq!(notifier.kinds(), vec![NoticeKind::GeofenceError]);
        }

        #[test]
        fn prop_non_transition_codes_are_silent(code in any::<i32>()) {
            prop_assume!(code != 1 && code != 2);
            let (handler, notifier) = handler();

            let raw = RawGeofenceEvent {
                error_code: None,
                transition: Some(code),
                triggering_region_ids: vec!["ExampleGeofence".to_string()],
            };
            handler.on_event(&raw);

            prop_assert!(notifier.notices().is_empty());
        }
    }
}
