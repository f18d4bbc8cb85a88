// ── Push-event catalog ──
//
// One table lists every server event: its wire name, category, payload
// shape, and the keys each payload must carry. The macro turns the table
// into `EventKind`, one payload struct per event, the `GalileoEvent` enum,
// and the decoder.

use galileo_api::models::{Job, JobTop, Machine, MachineStatus, Station, Volume};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::EventError;

/// The resource an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventCategory {
    Machines,
    Jobs,
    Stations,
}

impl EventCategory {
    pub fn parse(name: &str) -> Result<Self, EventError> {
        name.parse().map_err(|_| EventError::UnknownCategory {
            name: name.to_owned(),
        })
    }

    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .iter()
            .copied()
            .filter(move |kind| kind.category() == self)
    }
}

/// Implemented by every payload struct, for typed handler registration.
pub trait TypedEvent: Sized + 'static {
    const KIND: EventKind;

    fn from_event(event: &GalileoEvent) -> Option<&Self>;
}

/// Payload decoders. `object` reads the first argument as a JSON object;
/// `positional` reads the whole argument list in field order.
mod shape {
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::EventKind;
    use crate::error::EventError;

    pub(super) fn object<T: DeserializeOwned>(
        kind: EventKind,
        args: &[Value],
    ) -> Result<T, EventError> {
        let payload = args
            .first()
            .cloned()
            .ok_or_else(|| malformed(kind, "no payload argument"))?;
        serde_json::from_value(payload).map_err(|e| malformed(kind, e))
    }

    pub(super) fn positional<T: DeserializeOwned>(
        kind: EventKind,
        args: &[Value],
    ) -> Result<T, EventError> {
        serde_json::from_value(Value::Array(args.to_vec())).map_err(|e| malformed(kind, e))
    }

    fn malformed(kind: EventKind, message: impl ToString) -> EventError {
        EventError::Payload {
            event: kind.name().to_owned(),
            message: message.to_string(),
        }
    }
}

macro_rules! event_catalog {
    (
        $(
            $category:ident {
                $(
                    $(#[$doc:meta])*
                    $variant:ident = $wire:literal, $shape:ident {
                        $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $key:literal ),* $(,)?
                    }
                ),* $(,)?
            }
        )*
    ) => {
        /// One variant per server event name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $( $( $variant, )* )*
        }

        impl EventKind {
            pub const ALL: &'static [EventKind] = &[ $( $( EventKind::$variant, )* )* ];

            /// Event name as sent by the server.
            pub fn name(self) -> &'static str {
                match self {
                    $( $( EventKind::$variant => $wire, )* )*
                }
            }

            pub fn category(self) -> EventCategory {
                match self {
                    $( $( EventKind::$variant => EventCategory::$category, )* )*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $( $wire => Some(EventKind::$variant), )* )*
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for EventKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        $( $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $variant {
                $(
                    $(#[$fmeta])*
                    #[serde(rename = $key)]
                    pub $field: $ty,
                )*
            }

            impl TypedEvent for $variant {
                const KIND: EventKind = EventKind::$variant;

                #[allow(unreachable_patterns)]
                fn from_event(event: &GalileoEvent) -> Option<&Self> {
                    match event {
                        GalileoEvent::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )* )*

        /// A decoded server event.
        #[derive(Debug, Clone, PartialEq)]
        #[allow(clippy::large_enum_variant)]
        pub enum GalileoEvent {
            $( $( $variant($variant), )* )*
        }

        impl GalileoEvent {
            pub fn kind(&self) -> EventKind {
                match self {
                    $( $( GalileoEvent::$variant(_) => EventKind::$variant, )* )*
                }
            }

            /// Decode the raw Socket.IO arguments of `kind`.
            pub fn decode(kind: EventKind, args: &[Value]) -> Result<Self, EventError> {
                match kind {
                    $( $( EventKind::$variant => shape::$shape(kind, args).map(GalileoEvent::$variant), )* )*
                }
            }

            /// The payload as JSON, keyed the way the server sends it.
            pub fn payload_json(&self) -> Value {
                let encoded = match self {
                    $( $( GalileoEvent::$variant(payload) => serde_json::to_value(payload), )* )*
                };
                encoded.unwrap_or(Value::Null)
            }
        }
    };
}

event_catalog! {
    Machines {
        /// A machine went online or offline.
        MachineStatusUpdated = "machine/status_updated", object {
            mid: String = "mid",
            status: MachineStatus = "status",
        },
        MachineRegistered = "machine/registered", object {
            machine: Machine = "machine",
        },
        MachineHardwareUpdated = "machine/hardware_updated", object {
            machine: Machine = "machine",
        },
    }

    Jobs {
        JobLauncherUpdated = "job_launcher_updated", object {
            job: Job = "job",
        },
        JobLauncherSubmitted = "job_launcher_submitted", object {
            job: Job = "job",
        },
        /// Sent as two positional arguments rather than an object.
        JobLauncherResultsDownloaded = "job_launcher_results_downloaded", positional {
            results_id: String = "resultsid",
            status: String = "status",
        },
        StationJobUpdated = "station_job_updated", object {
            job: Job = "job",
        },
        JobTopUpdated = "top", object {
            job: Job = "job",
            top: JobTop = "top",
        },
        JobLogUpdated = "log", object {
            job: Job = "job",
            log: String = "log",
        },
    }

    Stations {
        NewStation = "new_station", object {
            station: Station = "station",
        },

        // Invitations
        StationAdminInviteSent = "station_admin_invite_sent", object {
            station_id: String = "stationid",
            user_ids: Vec<String> = "userids",
        },
        StationUserInviteReceived = "station_user_invite_received", object {
            station: Station = "station",
        },
        StationAdminInviteAccepted = "station_admin_invite_accepted", object {
            station_id: String = "stationid",
            user_ids: Vec<String> = "userids",
        },
        StationUserInviteAccepted = "station_user_invite_accepted", object {
            station_id: String = "stationid",
        },
        StationAdminInviteRejected = "station_admin_invite_rejected", object {
            station_id: String = "stationid",
            /// Older backends send only the station id.
            #[serde(default)]
            user_ids: Vec<String> = "userids",
        },
        StationUserInviteRejected = "station_user_invite_rejected", object {
            station_id: String = "stationid",
        },
        StationUserInviteDestroyed = "station_user_invite_destroyed", object {
            station_id: String = "stationid",
        },

        // Join requests
        StationAdminRequestReceived = "station_admin_request_received", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationUserRequestSent = "station_user_request_sent", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationAdminRequestAccepted = "station_admin_request_accepted", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationUserRequestAccepted = "station_user_request_accepted", object {
            station_id: String = "stationid",
        },
        StationAdminRequestRejected = "station_admin_request_rejected", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationUserRequestRejected = "station_user_request_rejected", object {
            station_id: String = "stationid",
        },
        StationUserRequestDestroyed = "station_user_request_destroyed", object {
            station_id: String = "stationid",
        },

        // Members
        StationMemberMemberAdded = "station_member_member_added", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationAdminMemberRemoved = "station_admin_member_removed", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        StationMemberMemberRemoved = "station_member_member_removed", object {
            station_id: String = "stationid",
            user_id: String = "userid",
        },
        /// The caller withdrew their machines and left.
        StationUserWithdrawn = "station_user_withdrawn", object {
            station_id: String = "stationid",
            mids: Vec<String> = "mids",
        },
        StationUserExpelled = "station_user_expelled", object {
            station_id: String = "stationid",
        },

        // Machines
        StationAdminMachineAdded = "station_admin_machine_added", object {
            station_id: String = "stationid",
            mids: Vec<String> = "mids",
        },
        StationMemberMachineAdded = "station_member_machine_added", object {
            station_id: String = "stationid",
            mids: Vec<String> = "mids",
        },
        StationAdminMachineRemoved = "station_admin_machine_removed", object {
            station_id: String = "stationid",
            mids: Vec<String> = "mids",
        },
        StationMemberMachineRemoved = "station_member_machine_removed", object {
            station_id: String = "stationid",
            mids: Vec<String> = "mids",
        },

        // Volumes
        StationAdminVolumeAdded = "station_admin_volume_added", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationMemberVolumeAdded = "station_member_volume_added", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationAdminVolumeHostPathAdded = "station_admin_volume_host_path_added", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationMemberVolumeHostPathAdded = "station_member_volume_host_path_added", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationAdminVolumeHostPathRemoved = "station_admin_volume_host_path_removed", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationMemberVolumeHostPathRemoved = "station_member_volume_host_path_removed", object {
            station_id: String = "stationid",
            volumes: Vec<Volume> = "volumes",
        },
        StationAdminVolumeRemoved = "station_admin_volume_removed", object {
            station_id: String = "stationid",
            volume_names: Vec<String> = "volume_names",
        },
        StationMemberVolumeRemoved = "station_member_volume_removed", object {
            station_id: String = "stationid",
            volume_names: Vec<String> = "volume_names",
        },

        // Lifecycle
        StationAdminDestroyed = "station_admin_destroyed", object {
            station_id: String = "stationid",
        },
        StationMemberDestroyed = "station_member_destroyed", object {
            station_id: String = "stationid",
        },
        StationAdminStationUpdated = "station_admin_station_updated", object {
            station: Station = "station",
        },
        StationMemberStationUpdated = "station_member_station_updated", object {
            station: Station = "station",
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn catalog_sizes() {
        assert_eq!(EventKind::ALL.len(), 45);
        assert_eq!(EventCategory::Machines.kinds().count(), 3);
        assert_eq!(EventCategory::Jobs.kinds().count(), 6);
        assert_eq!(EventCategory::Stations.kinds().count(), 36);
    }

    #[test]
    fn wire_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(EventKind::from_name("station_exploded"), None);
    }

    #[test]
    fn category_names_parse() {
        assert_eq!(EventCategory::parse("Jobs").unwrap(), EventCategory::Jobs);
        assert_eq!(
            EventCategory::parse("volumes").unwrap_err(),
            EventError::UnknownCategory {
                name: "volumes".into()
            }
        );
    }

    #[test]
    fn decodes_object_payload() {
        let args = [json!({ "stationid": "st-1", "userids": ["u-1", "u-2"] })];
        let event = GalileoEvent::decode(EventKind::StationAdminInviteSent, &args).unwrap();
        assert_eq!(
            event,
            GalileoEvent::StationAdminInviteSent(StationAdminInviteSent {
                station_id: "st-1".into(),
                user_ids: vec!["u-1".into(), "u-2".into()],
            })
        );
        assert_eq!(event.payload_json(), args[0]);
    }

    #[test]
    fn decodes_positional_payload() {
        let args = [json!("res-7"), json!("complete")];
        let event = GalileoEvent::decode(EventKind::JobLauncherResultsDownloaded, &args).unwrap();
        let payload = JobLauncherResultsDownloaded::from_event(&event).unwrap();
        assert_eq!(payload.results_id, "res-7");
        assert_eq!(payload.status, "complete");
    }

    #[test]
    fn machine_status_is_typed() {
        let args = [json!({ "mid": "m-1", "status": "online" })];
        let event = GalileoEvent::decode(EventKind::MachineStatusUpdated, &args).unwrap();
        let GalileoEvent::MachineStatusUpdated(payload) = event else {
            panic!("wrong variant");
        };
        assert_eq!(payload.status, MachineStatus::Online);
    }

    #[test]
    fn missing_key_is_a_payload_error() {
        let args = [json!({ "stationid": "st-1" })];
        let err = GalileoEvent::decode(EventKind::StationAdminMachineAdded, &args).unwrap_err();
        let EventError::Payload { event, message } = err else {
            panic!("expected payload error");
        };
        assert_eq!(event, "station_admin_machine_added");
        assert!(message.contains("mids"), "{message}");
    }

    #[test]
    fn invite_rejection_without_user_ids_still_decodes() {
        let args = [json!({ "stationid": "st-1" })];
        let event = GalileoEvent::decode(EventKind::StationAdminInviteRejected, &args).unwrap();
        let payload = StationAdminInviteRejected::from_event(&event).unwrap();
        assert_eq!(payload.station_id, "st-1");
        assert!(payload.user_ids.is_empty());
    }

    #[test]
    fn missing_argument_is_a_payload_error() {
        let err = GalileoEvent::decode(EventKind::StationUserExpelled, &[]).unwrap_err();
        assert!(matches!(err, EventError::Payload { .. }));
    }

    #[test]
    fn typed_lookup_rejects_other_variants() {
        let event = GalileoEvent::StationUserExpelled(StationUserExpelled {
            station_id: "st-1".into(),
        });
        assert!(StationAdminDestroyed::from_event(&event).is_none());
        assert!(StationUserExpelled::from_event(&event).is_some());
        assert_eq!(event.kind(), StationUserExpelled::KIND);
    }
}
