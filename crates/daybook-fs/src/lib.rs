mod config;
mod doctor;
mod workspace;

pub use config::{
    CONFIG_VERSION, DEFAULT_PROFILE, DEFAULT_QUEUE_SLOT, ProfileConfig, ProfileView,
    ResolvedProfile, WorkspaceConfig, list_profiles, load_config, resolve_profile, save_config,
    set_active_profile,
};
pub use doctor::{DoctorCheck, DoctorReport, run_doctor};
pub use workspace::{WorkspaceInitResult, WorkspacePaths, init_workspace, resolve_workspace};
