// ── Event handler registry ──
//
// Maps each `EventKind` to an ordered list of handlers. Registration and
// dispatch may happen from different tasks; handlers run on the dispatching
// task, one after another. A panicking handler is logged and skipped.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{trace, warn};

use super::catalog::{EventCategory, EventKind, GalileoEvent, TypedEvent};
use crate::error::EventError;

type Handler = Arc<dyn Fn(&GalileoEvent) + Send + Sync>;

/// Publish/subscribe table keyed by event kind.
///
/// Cheaply cloneable; clones share the same handler table.
#[derive(Clone, Default)]
pub struct EventRegistry {
    handlers: Arc<RwLock<HashMap<EventKind, Vec<Handler>>>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().expect("handler lock poisoned");
        f.debug_struct("EventRegistry")
            .field("kinds", &handlers.len())
            .finish_non_exhaustive()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Register a handler that receives the typed payload of `E`.
    pub fn on<E, F>(&self, handler: F)
    where
        E: TypedEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.push(
            E::KIND,
            Arc::new(move |event| {
                if let Some(payload) = E::from_event(event) {
                    handler(payload);
                }
            }),
        );
    }

    pub fn on_kind<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&GalileoEvent) + Send + Sync + 'static,
    {
        self.push(kind, Arc::new(handler));
    }

    /// Register by wire name, e.g. `"station_admin_invite_sent"`.
    pub fn on_name<F>(&self, name: &str, handler: F) -> Result<(), EventError>
    where
        F: Fn(&GalileoEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::from_name(name).ok_or_else(|| EventError::UnknownEvent {
            name: name.to_owned(),
        })?;
        self.on_kind(kind, handler);
        Ok(())
    }

    /// Register one handler for every event of a category.
    pub fn on_category<F>(&self, category: EventCategory, handler: F)
    where
        F: Fn(&GalileoEvent) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        for kind in category.kinds() {
            self.push(kind, Arc::clone(&handler));
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .expect("handler lock poisoned")
            .get(&kind)
            .map_or(0, Vec::len)
    }

    fn push(&self, kind: EventKind, handler: Handler) {
        self.handlers
            .write()
            .expect("handler lock poisoned")
            .entry(kind)
            .or_default()
            .push(handler);
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Decode a raw server event and hand it to every handler of its kind.
    ///
    /// Unknown names return `Ok(None)`. A payload missing a required key
    /// returns `EventError::Payload` and no handler runs.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> Result<Option<GalileoEvent>, EventError> {
        let Some(kind) = EventKind::from_name(name) else {
            trace!(event = name, "ignoring unknown event");
            return Ok(None);
        };
        let event = GalileoEvent::decode(kind, args)?;
        self.emit(&event);
        Ok(Some(event))
    }

    /// Run the handlers for an already decoded event, in registration order.
    pub fn emit(&self, event: &GalileoEvent) {
        // Snapshot so handlers may register more handlers without deadlock.
        let handlers = self
            .handlers
            .read()
            .expect("handler lock poisoned")
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        trace!(event = %event.kind(), handlers = handlers.len(), "dispatching");
        for handler in &handlers {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                warn!(
                    event = %event.kind(),
                    reason = panic_message(panic.as_ref()),
                    "event handler panicked"
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::catalog::{StationAdminInviteSent, StationUserExpelled};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&GalileoEvent) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&GalileoEvent) + Send + Sync> {
            let sink = Arc::clone(&sink);
            let tag = tag.to_owned();
            Box::new(move |event: &GalileoEvent| {
                sink.lock().unwrap().push(format!("{tag}:{}", event.kind()));
            })
        };
        (log, make)
    }

    #[test]
    fn handlers_run_once_each_in_registration_order() {
        let registry = EventRegistry::new();
        let (log, make) = recorder();
        registry.on_kind(EventKind::StationUserExpelled, make("first"));
        registry.on_kind(EventKind::StationUserExpelled, make("second"));
        registry.on_kind(EventKind::StationAdminDestroyed, make("other"));

        let event = registry
            .dispatch("station_user_expelled", &[json!({ "stationid": "st-1" })])
            .unwrap();

        assert!(event.is_some());
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:station_user_expelled".to_owned(),
                "second:station_user_expelled".to_owned(),
            ]
        );
    }

    #[test]
    fn typed_handler_gets_mapped_fields() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        registry.on::<StationAdminInviteSent, _>(move |payload| {
            *sink.lock().unwrap() = Some(payload.clone());
        });

        registry
            .dispatch(
                "station_admin_invite_sent",
                &[json!({ "stationid": "st-1", "userids": ["u-1"] })],
            )
            .unwrap();

        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(StationAdminInviteSent {
                station_id: "st-1".into(),
                user_ids: vec!["u-1".into()],
            })
        );
    }

    #[test]
    fn unknown_names_are_ignored() {
        let registry = EventRegistry::new();
        assert_eq!(registry.dispatch("connect_confirmed", &[]).unwrap(), None);
    }

    #[test]
    fn malformed_payload_skips_handlers() {
        let registry = EventRegistry::new();
        let (log, make) = recorder();
        registry.on_kind(EventKind::StationAdminMachineAdded, make("h"));

        let err = registry
            .dispatch("station_admin_machine_added", &[json!({ "stationid": "st-1" })])
            .unwrap_err();

        assert!(matches!(err, EventError::Payload { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn on_name_rejects_unknown_events() {
        let registry = EventRegistry::new();
        let err = registry.on_name("station_exploded", |_| {}).unwrap_err();
        assert_eq!(
            err,
            EventError::UnknownEvent {
                name: "station_exploded".into()
            }
        );
        registry.on_name("station_user_expelled", |_| {}).unwrap();
        assert_eq!(registry.handler_count(EventKind::StationUserExpelled), 1);
    }

    #[test]
    fn category_handler_covers_every_kind() {
        let registry = EventRegistry::new();
        registry.on_category(EventCategory::Machines, |_| {});
        for kind in EventCategory::Machines.kinds() {
            assert_eq!(registry.handler_count(kind), 1);
        }
        assert_eq!(registry.handler_count(EventKind::JobLogUpdated), 0);
    }

    #[test]
    fn panicking_handler_does_not_stop_the_others() {
        let registry = EventRegistry::new();
        let (log, make) = recorder();
        registry.on_kind(EventKind::StationUserExpelled, |_| panic!("handler bug"));
        registry.on_kind(EventKind::StationUserExpelled, make("after"));

        registry
            .dispatch("station_user_expelled", &[json!({ "stationid": "st-1" })])
            .unwrap();
        registry
            .dispatch("station_user_expelled", &[json!({ "stationid": "st-2" })])
            .unwrap();

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn clones_share_handlers() {
        let registry = EventRegistry::new();
        let clone = registry.clone();
        clone.on::<StationUserExpelled, _>(|_| {});
        assert_eq!(registry.handler_count(EventKind::StationUserExpelled), 1);
    }
}
