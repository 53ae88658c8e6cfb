//! Point-in-time system readings.

/// A single point-in-time set of system metric readings.
///
/// One snapshot arrives per message on the live metrics stream. Sections
/// missing from the payload take their defaults; numeric fields must be
/// numbers.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct MetricsSnapshot {
    /// Unix timestamp in milliseconds. Zero when the producer did not stamp it.
    pub timestamp_ms: u64,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub network: NetworkMetrics,
}

/// Processor readings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct CpuMetrics {
    /// Utilization in percent (0-100).
    pub usage: f64,
    pub cores: u32,
    /// Current clock in MHz.
    pub frequency: f64,
    /// Package temperature in °C, when the host exposes it.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub temperature: Option<f64>,
}

/// Memory readings. Sizes are in whatever unit the producer reports.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct MemoryMetrics {
    pub used: f64,
    pub total: f64,
    pub available: f64,
    /// Utilization in percent (0-100).
    pub percentage: f64,
}

/// Disk readings for the primary volume.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct DiskMetrics {
    pub used: f64,
    pub total: f64,
    /// Utilization in percent (0-100).
    pub percentage: f64,
    pub read_speed: f64,
    pub write_speed: f64,
}

/// Network throughput readings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct NetworkMetrics {
    pub download_speed: f64,
    pub upload_speed: f64,
    pub packets_received: u64,
    pub packets_sent: u64,
}

impl MetricsSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> MetricsSnapshotBuilder {
        MetricsSnapshotBuilder::default()
    }

    /// Check that every reading is a finite number and every percentage
    /// lies within 0-100.
    pub fn is_plausible(&self) -> bool {
        let readings = [
            self.cpu.usage,
            self.cpu.frequency,
            self.cpu.temperature.unwrap_or(0.0),
            self.memory.used,
            self.memory.total,
            self.memory.available,
            self.memory.percentage,
            self.disk.used,
            self.disk.total,
            self.disk.percentage,
            self.disk.read_speed,
            self.disk.write_speed,
            self.network.download_speed,
            self.network.upload_speed,
        ];
        let percentages = [self.cpu.usage, self.memory.percentage, self.disk.percentage];

        readings.iter().all(|v| v.is_finite())
            && percentages.iter().all(|p| (0.0..=100.0).contains(p))
    }
}

/// Builder for [`MetricsSnapshot`].
#[derive(Debug, Default)]
pub struct MetricsSnapshotBuilder {
    snapshot: MetricsSnapshot,
}

impl MetricsSnapshotBuilder {
    /// Set the snapshot timestamp.
    pub fn timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.snapshot.timestamp_ms = timestamp_ms;
        self
    }

    /// Set CPU utilization in percent.
    pub fn cpu_usage(mut self, usage: f64) -> Self {
        self.snapshot.cpu.usage = usage;
        self
    }

    /// Set the core count.
    pub fn cores(mut self, cores: u32) -> Self {
        self.snapshot.cpu.cores = cores;
        self
    }

    /// Set memory used and total; available and percentage are derived.
    pub fn memory(mut self, used: f64, total: f64) -> Self {
        self.snapshot.memory.used = used;
        self.snapshot.memory.total = total;
        self.snapshot.memory.available = (total - used).max(0.0);
        self.snapshot.memory.percentage = if total > 0.0 { used / total * 100.0 } else { 0.0 };
        self
    }

    /// Set memory utilization in percent directly.
    pub fn memory_percentage(mut self, percentage: f64) -> Self {
        self.snapshot.memory.percentage = percentage;
        self
    }

    /// Set disk utilization in percent.
    pub fn disk_percentage(mut self, percentage: f64) -> Self {
        self.snapshot.disk.percentage = percentage;
        self
    }

    /// Set network throughput.
    pub fn network(mut self, download_speed: f64, upload_speed: f64) -> Self {
        self.snapshot.network.download_speed = download_speed;
        self.snapshot.network.upload_speed = upload_speed;
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> MetricsSnapshot {
        self.snapshot
    }
}
