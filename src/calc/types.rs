use serde::{Deserialize, Serialize};

use super::licenses::LicenseBreakdown;
use super::servers::{FailoverCapacitySummary, LimitingFactor, TierRecommendation};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
    Best,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Best => "best",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    Continuous,
    Motion,
    Object,
    Scheduled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailoverMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "n_plus_1")]
    NPlus1,
    #[serde(rename = "n_plus_2")]
    NPlus2,
}

/// One group of identical cameras. Either a catalog resolution id or an
/// explicit pixel area must be given unless a manual bitrate overrides the
/// formula entirely.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CameraGroupSpec {
    pub count: u32,
    #[serde(default)]
    pub resolution_id: Option<String>,
    #[serde(default)]
    pub resolution_area_px: Option<u64>,
    pub fps: u32,
    pub codec_id: String,
    #[serde(default = "default_quality")]
    pub quality: QualityLevel,
    #[serde(default)]
    pub manual_bitrate_kbps: Option<f64>,
    #[serde(default = "default_recording_mode")]
    pub recording_mode: RecordingMode,
    /// Recording hours per day, only meaningful for scheduled mode.
    #[serde(default)]
    pub scheduled_hours: Option<f64>,
    #[serde(default)]
    pub audio_enabled: bool,
    /// Live-only groups (recorded = false) consume live licenses instead of
    /// professional ones.
    #[serde(default = "default_true")]
    pub recorded: bool,
}

fn default_quality() -> QualityLevel {
    QualityLevel::Medium
}

fn default_recording_mode() -> RecordingMode {
    RecordingMode::Continuous
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConstraints {
    #[serde(default = "default_raid_type")]
    pub raid_type_id: String,
    #[serde(default)]
    pub failover_mode: FailoverMode,
    #[serde(default = "default_nic_capacity")]
    pub nic_capacity_mbps: f64,
    #[serde(default = "default_nic_count")]
    pub nic_count: u32,
    #[serde(default = "default_cpu_variant")]
    pub cpu_variant_id: String,
}

fn default_raid_type() -> String {
    "raid5".into()
}

fn default_nic_capacity() -> f64 {
    1000.0
}

fn default_nic_count() -> u32 {
    1
}

fn default_cpu_variant() -> String {
    "core_i5".into()
}

impl Default for ServerConstraints {
    fn default() -> Self {
        Self {
            raid_type_id: default_raid_type(),
            failover_mode: FailoverMode::default(),
            nic_capacity_mbps: default_nic_capacity(),
            nic_count: default_nic_count(),
            cpu_variant_id: default_cpu_variant(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CalculationRequest {
    pub camera_groups: Vec<CameraGroupSpec>,
    pub retention_days: u32,
    #[serde(default)]
    pub server_constraints: ServerConstraints,
}

// -- result types

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Summary {
    pub total_devices: u32,
    pub total_bitrate_mbps: f64,
    pub total_storage_tb: f64,
    pub servers_needed: u32,
    pub servers_with_failover: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BitrateBreakdown {
    pub total_kbps: f64,
    pub total_mbps: f64,
    /// Peak aggregate during high-motion scenes.
    pub peak_kbps: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StorageBreakdown {
    pub total_gb: f64,
    pub total_tb: f64,
    pub daily_gb: f64,
    pub raw_gb: f64,
    pub usable_gb: f64,
    pub raid_overhead_gb: f64,
    pub filesystem_overhead_gb: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerBreakdown {
    pub servers_needed: u32,
    pub servers_with_failover: u32,
    pub devices_per_server: u32,
    pub bitrate_per_server_mbps: f64,
    pub limiting_factor: LimitingFactor,
    pub recommended_tier: TierRecommendation,
    /// Informational per-node takeover capacity; absent when failover is off.
    pub failover_capacity: Option<FailoverCapacitySummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BandwidthBreakdown {
    pub total_mbps: f64,
    pub total_gbps: f64,
    pub per_server_mbps: f64,
    pub nic_utilization_pct: f64,
}

/// Aggregate of one sizing pass. Recomputed on every request, never
/// persisted. Constraint violations land in `warnings`/`errors` rather than
/// aborting the calculation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CalculationResult {
    pub summary: Summary,
    pub bitrate: BitrateBreakdown,
    pub storage: StorageBreakdown,
    pub servers: ServerBreakdown,
    pub bandwidth: BandwidthBreakdown,
    pub licenses: LicenseBreakdown,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}
