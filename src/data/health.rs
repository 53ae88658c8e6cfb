//! Health classification of metrics readings.
//!
//! Each resource (CPU, memory, disk) is classified against a pair of
//! warning/critical thresholds. [`HealthTracker`] remembers the last
//! classification per resource and turns changes into operator alerts.

use std::fmt;

use indra_types::{Alert, AlertKind, MetricsSnapshot};
use serde::Deserialize;

/// Percentage thresholds for health status computation.
///
/// A reading strictly above `*_warning` is a warning; strictly above
/// `*_critical` is critical.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpu_warning: f64,
    pub cpu_critical: f64,
    pub memory_warning: f64,
    pub memory_critical: f64,
    pub disk_warning: f64,
    pub disk_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_warning: 60.0,
            cpu_critical: 80.0,
            memory_warning: 70.0,
            memory_critical: 85.0,
            disk_warning: 80.0,
            disk_critical: 90.0,
        }
    }
}

impl Thresholds {
    /// Classify a single resource reading.
    pub fn classify(&self, resource: Resource, percentage: f64) -> HealthStatus {
        let (warning, critical) = match resource {
            Resource::Cpu => (self.cpu_warning, self.cpu_critical),
            Resource::Memory => (self.memory_warning, self.memory_critical),
            Resource::Disk => (self.disk_warning, self.disk_critical),
        };
        if percentage > critical {
            HealthStatus::Critical
        } else if percentage > warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    /// Worst status across all resources of a snapshot.
    pub fn overall(&self, snapshot: &MetricsSnapshot) -> HealthStatus {
        Resource::ALL
            .iter()
            .map(|r| self.classify(*r, r.reading(snapshot)))
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }
}

/// Health status for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

/// A resource whose utilization is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cpu,
    Memory,
    Disk,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Cpu, Resource::Memory, Resource::Disk];

    /// Utilization percentage of this resource in a snapshot.
    pub fn reading(&self, snapshot: &MetricsSnapshot) -> f64 {
        match self {
            Resource::Cpu => snapshot.cpu.usage,
            Resource::Memory => snapshot.memory.percentage,
            Resource::Disk => snapshot.disk.percentage,
        }
    }

    fn index(&self) -> usize {
        match self {
            Resource::Cpu => 0,
            Resource::Memory => 1,
            Resource::Disk => 2,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "Memory",
            Resource::Disk => "Disk",
        };
        f.pad(name)
    }
}

/// Edge-triggered health alerting.
///
/// Alerts are raised when a resource escalates (Healthy to Warning,
/// anything to Critical) and when it recovers to Healthy. Staying at the
/// same level, or dropping from Critical to Warning, raises nothing.
#[derive(Debug, Default)]
pub struct HealthTracker {
    thresholds: Thresholds,
    last: [HealthStatus; 3],
    sequence: u64,
}

impl HealthTracker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            last: [HealthStatus::Healthy; 3],
            sequence: 0,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify a snapshot and return the alerts its changes warrant.
    pub fn observe(&mut self, snapshot: &MetricsSnapshot) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for resource in Resource::ALL {
            let reading = resource.reading(snapshot);
            let status = self.thresholds.classify(resource, reading);
            let previous = std::mem::replace(&mut self.last[resource.index()], status);

            let kind = match (previous, status) {
                (p, s) if s > p => match s {
                    HealthStatus::Critical => AlertKind::Error,
                    _ => AlertKind::Warning,
                },
                (p, HealthStatus::Healthy) if p != HealthStatus::Healthy => AlertKind::Success,
                _ => continue,
            };

            self.sequence += 1;
            let id = format!("health-{}-{}", resource.index(), self.sequence);
            let (title, message) = match kind {
                AlertKind::Success => (
                    format!("{} back to normal", resource),
                    format!("{} usage is {:.1}%", resource, reading),
                ),
                _ => (
                    format!("High {} usage", resource),
                    format!("{} usage is {:.1}% ({})", resource, reading, status.symbol()),
                ),
            };
            let mut alert = Alert::new(id, kind, title, message);
            if resource == Resource::Cpu && kind != AlertKind::Success {
                alert = alert.with_action("View processes", "view:processes");
            }
            alerts.push(alert);
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(usage: f64) -> MetricsSnapshot {
        MetricsSnapshot::builder().cpu_usage(usage).build()
    }

    #[test]
    fn test_classify_is_strictly_above() {
        let t = Thresholds::default();
        assert_eq!(t.classify(Resource::Cpu, 60.0), HealthStatus::Healthy);
        assert_eq!(t.classify(Resource::Cpu, 60.5), HealthStatus::Warning);
        assert_eq!(t.classify(Resource::Cpu, 80.5), HealthStatus::Critical);
        assert_eq!(t.classify(Resource::Disk, 85.0), HealthStatus::Warning);
    }

    #[test]
    fn test_overall_is_worst() {
        let t = Thresholds::default();
        let snapshot = MetricsSnapshot::builder()
            .cpu_usage(10.0)
            .memory_percentage(90.0)
            .build();
        assert_eq!(t.overall(&snapshot), HealthStatus::Critical);
    }

    #[test]
    fn test_tracker_is_edge_triggered() {
        let mut tracker = HealthTracker::new(Thresholds::default());

        assert!(tracker.observe(&cpu(10.0)).is_empty());

        let alerts = tracker.observe(&cpu(70.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Warning);
        assert_eq!(alerts[0].actions.len(), 1);

        // Same level again: nothing new
        assert!(tracker.observe(&cpu(72.0)).is_empty());

        let alerts = tracker.observe(&cpu(95.0));
        assert_eq!(alerts[0].kind, AlertKind::Error);

        // Critical -> Warning is not an escalation
        assert!(tracker.observe(&cpu(65.0)).is_empty());

        let alerts = tracker.observe(&cpu(5.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Success);
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let mut tracker = HealthTracker::default();
        let a = tracker.observe(&cpu(90.0));
        tracker.observe(&cpu(0.0));
        let b = tracker.observe(&cpu(90.0));
        assert_ne!(a[0].id, b[0].id);
    }
}
