//! Creating and pruning the maintenance windows this tool owns.
//!
//! Ownership is recognised by name alone: every window created here starts
//! with [`SENTINEL_PREFIX`], and pruning never touches anything else.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{HostId, Maintenance, MaintenanceId, NewMaintenance, TimePeriod};
use crate::session::ActiveSession;

pub const SENTINEL_PREFIX: &str = "Automatic ";

const NAME_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct MaintenanceManager<'a> {
    session: &'a ActiveSession,
    timezone: Option<Tz>,
}

impl<'a> MaintenanceManager<'a> {
    pub fn new(session: &'a ActiveSession) -> Self {
        Self {
            session,
            timezone: None,
        }
    }

    /// Render creation times in window names in `tz` instead of local time.
    pub fn with_timezone(mut self, tz: Option<Tz>) -> Self {
        self.timezone = tz;
        self
    }

    /// Looks up a host by its exact technical name.
    ///
    /// An empty or unexpected result is reported as `Ok(None)`, not as an error.
    pub fn resolve_host_id(&self, host_name: &str) -> Result<Option<HostId>> {
        let params = json!({
            "output": ["hostid"],
            "filter": { "host": [host_name] }
        });
        let result = self.session.call("host.get", &params)?;

        let host_id = result
            .get(0)
            .and_then(|host| host.get("hostid"))
            .and_then(HostId::from_value);

        debug!(host = host_name, found = host_id.is_some(), "resolved host");
        Ok(host_id)
    }

    pub fn create_window(&self, host_name: &str, duration_minutes: u32) -> Result<MaintenanceId> {
        if duration_minutes == 0 {
            return Err(Error::InvalidArgument(
                "maintenance duration must be at least one minute".to_string(),
            ));
        }

        let host_id = self
            .resolve_host_id(host_name)?
            .ok_or_else(|| Error::UnknownHost(host_name.to_string()))?;

        let window = new_window(host_id, host_name, duration_minutes, Utc::now(), self.timezone);
        let params = serde_json::to_value(&window)
            .map_err(|e| Error::invalid_response("maintenance.create", e.to_string()))?;
        let result = self.session.call("maintenance.create", &params)?;

        let id = first_maintenance_id(&result)
            .ok_or_else(|| Error::invalid_response("maintenance.create", "no maintenance id returned"))?;

        info!(
            id = %id,
            host = host_name,
            name = %window.name,
            active_till = window.active_till,
            "created maintenance window"
        );
        Ok(id)
    }

    /// Deletes every sentinel-named window that has already ended, on any host.
    pub fn delete_expired(&self) -> Result<Vec<MaintenanceId>> {
        let params = json!({
            "output": "extend",
            "selectTimeperiods": "extend",
            "selectTags": "extend"
        });
        let result = self.session.call("maintenance.get", &params)?;
        let windows: Vec<Maintenance> = serde_json::from_value(result)
            .map_err(|e| Error::invalid_response("maintenance.get", e.to_string()))?;

        let expired = select_expired(&windows, Utc::now().timestamp());
        if expired.is_empty() {
            debug!(checked = windows.len(), "no expired maintenance windows");
            return Ok(expired);
        }

        let ids = serde_json::to_value(&expired)
            .map_err(|e| Error::invalid_response("maintenance.delete", e.to_string()))?;
        self.session.call("maintenance.delete", &ids)?;

        info!(count = expired.len(), "deleted expired maintenance windows");
        Ok(expired)
    }
}

/// Builds the `maintenance.create` payload for a window starting at `now`.
pub fn new_window(
    host_id: HostId,
    host_name: &str,
    duration_minutes: u32,
    now: DateTime<Utc>,
    timezone: Option<Tz>,
) -> NewMaintenance {
    let duration_seconds = i64::from(duration_minutes) * 60;
    let active_since = now.timestamp();

    NewMaintenance {
        name: window_name(duration_minutes, now, timezone),
        description: format!("Host: {host_name}"),
        active_since,
        active_till: active_since + duration_seconds,
        hostids: vec![host_id],
        groupids: Vec::new(),
        timeperiods: vec![TimePeriod {
            period: duration_seconds,
        }],
        tags: Vec::new(),
    }
}

pub fn window_name(duration_minutes: u32, created: DateTime<Utc>, timezone: Option<Tz>) -> String {
    let since = match timezone {
        Some(tz) => created.with_timezone(&tz).format(NAME_TIME_FORMAT).to_string(),
        None => created.with_timezone(&Local).format(NAME_TIME_FORMAT).to_string(),
    };
    format!("{SENTINEL_PREFIX}{duration_minutes} min (since {since})")
}

/// Ids of sentinel-named windows whose end lies strictly before `now`.
pub fn select_expired(windows: &[Maintenance], now: i64) -> Vec<MaintenanceId> {
    windows
        .iter()
        .filter(|w| w.name.starts_with(SENTINEL_PREFIX) && w.active_till < now)
        .map(|w| w.id.clone())
        .collect()
}

fn first_maintenance_id(result: &Value) -> Option<MaintenanceId> {
    result
        .get("maintenanceids")
        .and_then(|ids| ids.get(0))
        .and_then(MaintenanceId::from_value)
}
