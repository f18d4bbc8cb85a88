// ── Resource services ──
//
// One service per resource. Each forwards to the matching `GalileoClient`
// endpoint, maps transport errors into `CoreError`, and adds the few
// operations that combine several calls (mission upload, result download).

mod cargo_bays;
mod jobs;
mod machines;
mod missions;
mod profiles;
mod stations;
mod universes;

pub use cargo_bays::CargoBaysService;
pub use jobs::JobsService;
pub use machines::MachinesService;
pub use missions::{MissionsService, UploadedFile};
pub use profiles::ProfilesService;
pub use stations::StationsService;
pub use universes::UniversesService;
