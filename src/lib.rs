//! Puts a host into a Zabbix maintenance window and prunes expired windows
//! created by earlier runs.

pub mod config;
pub mod error;
pub mod maintenance;
pub mod models;
pub mod request;
pub mod session;
pub mod state;

pub use config::Settings;
pub use error::{Error, Result};
pub use maintenance::{MaintenanceManager, SENTINEL_PREFIX};
pub use models::{HostId, MaintenanceId};
pub use session::{ActiveSession, Credentials, Session};

#[derive(Debug, Clone)]
pub struct Job {
    pub host_name: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub created: MaintenanceId,
    pub deleted: Vec<MaintenanceId>,
}

/// Runs the whole sequence: log in if needed, create the window, delete
/// expired ones, log out if we logged in.
///
/// The first error aborts the remaining steps. The session is released on
/// every path.
pub fn run(settings: &Settings, job: &Job) -> Result<RunSummary> {
    let session = Session::new(
        settings.endpoint.clone(),
        settings.credentials.clone(),
        &settings.transport,
    )?;
    let active = session.acquire()?;

    let summary = {
        let manager = MaintenanceManager::new(&active).with_timezone(settings.timezone);
        let created = manager.create_window(&job.host_name, job.duration_minutes)?;
        let deleted = manager.delete_expired()?;
        RunSummary { created, deleted }
    };

    active.release()?;
    Ok(summary)
}
