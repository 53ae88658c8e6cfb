//! Host inventory types served by the REST API.
//!
//! The API speaks snake_case for inventory resources while the dashboard's
//! own payloads use camelCase. [`SystemInfo`] accepts either; [`Process`]
//! uses the dashboard shape and is mapped from the API's process rows by
//! the client.

/// Static description of the monitored host.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SystemInfo {
    pub hostname: String,
    pub platform: String,
    pub architecture: String,
    #[cfg_attr(feature = "serde", serde(alias = "cpu_model"))]
    pub cpu_model: String,
    #[cfg_attr(feature = "serde", serde(alias = "total_memory"))]
    pub total_memory: f64,
    #[cfg_attr(feature = "serde", serde(alias = "os_version"))]
    pub os_version: String,
    /// Seconds since boot.
    pub uptime: f64,
}

/// Scheduler state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Stopped,
    #[default]
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

/// Scheduling priority class of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProcessPriority {
    Low,
    #[default]
    Normal,
    High,
    Realtime,
}

/// A running process as reported by the API.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Process {
    #[cfg_attr(feature = "serde", serde(rename = "id"))]
    pub pid: u32,
    pub name: String,
    /// CPU share in percent.
    pub cpu_usage: f64,
    /// Memory share in percent.
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub status: ProcessStatus,
    pub priority: ProcessPriority,
    pub owner: String,
    pub start_time: String,
}

/// A system service (systemd unit, Windows service, ...).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Service {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub start_type: String,
}

impl Service {
    /// Whether the service reports itself as running.
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

/// A network interface.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkInterface {
    pub name: String,
    pub display_name: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub status: String,
    /// Link speed in Mbit/s.
    pub speed: Option<u64>,
}

/// A security event recorded by the host.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SecurityEvent {
    pub id: u64,
    pub event_type: String,
    pub severity: String,
    pub source: Option<String>,
    pub description: String,
    pub ip_address: Option<String>,
    pub resolved: bool,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_process_dashboard_shape() {
        let json = r#"{"id": 4242, "name": "postgres", "cpuUsage": 3.5, "memoryUsage": 1.25, "status": "sleeping"}"#;
        let process: Process = serde_json::from_str(json).unwrap();
        assert_eq!(process.pid, 4242);
        assert_eq!(process.cpu_usage, 3.5);
        assert_eq!(process.memory_usage, 1.25);
        assert_eq!(process.status, ProcessStatus::Sleeping);
        assert_eq!(process.priority, ProcessPriority::Normal);

        let value = serde_json::to_value(&process).unwrap();
        assert_eq!(value["id"], 4242);
        assert_eq!(value["startTime"], "");
    }

    #[test]
    fn test_process_unknown_status() {
        let process: Process = serde_json::from_str(r#"{"id": 1, "status": "zombie"}"#).unwrap();
        assert_eq!(process.status, ProcessStatus::Unknown);
    }

    #[test]
    fn test_system_info_snake_case() {
        let json = r#"{"hostname": "indra", "cpu_model": "Ryzen 7", "os_version": "6.8", "uptime": 3600}"#;
        let info: SystemInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.cpu_model, "Ryzen 7");
        assert_eq!(info.os_version, "6.8");
        assert_eq!(info.uptime, 3600.0);
    }
}
