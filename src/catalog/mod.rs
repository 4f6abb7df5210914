use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

mod defaults;

/// A codec entry. Quality multipliers are keyed by quality level id
/// (`low`/`medium`/`high`/`best`) and may use the legacy 0.6-2.0 scale;
/// they are normalized at the bitrate estimator boundary, not here.
#[derive(Deserialize, Debug, Clone)]
pub struct CodecProfile {
    pub name: String,
    pub compression_factor: f64,
    /// H.264/H.265-family codecs follow the power-function bitrate formula,
    /// MJPEG-family codecs the linear one.
    pub power_function: bool,
    pub quality_multipliers: IndexMap<String, f64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResolutionProfile {
    pub name: String,
    pub area_px: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RaidProfile {
    pub name: String,
    /// Usable percentage of raw capacity after redundancy (0, 100].
    pub usable_pct: f64,
    pub min_drives: u32,
    pub fault_tolerance: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CpuVariantProfile {
    pub name: String,
    pub os_ram_mb: u32,
    pub max_cameras: u32,
    /// Per-node network ceiling used by the failover capacity search.
    pub nic_bitrate_mbps: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerTierProfile {
    pub id: String,
    pub name: String,
    pub max_devices: u32,
    pub max_bitrate_mbps: f64,
    pub cpu_model: String,
    pub ram_gb: u32,
    pub storage_type: String,
    pub recommended_raid: String,
    pub nic_count: u32,
    pub nic_speed_mbps: f64,
    pub use_case: String,
}

/// Read-only lookup tables consumed by the calculation pipeline. Loaded once
/// and validated eagerly so static misconfigurations surface at startup
/// rather than mid-calculation.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub codecs: IndexMap<String, CodecProfile>,
    pub resolutions: IndexMap<String, ResolutionProfile>,
    pub raid_types: IndexMap<String, RaidProfile>,
    pub cpu_variants: IndexMap<String, CpuVariantProfile>,
    /// Ordered ascending; tier recommendation scans front to back.
    pub server_tiers: Vec<ServerTierProfile>,
}

/// Partial catalog parsed from external sources. Entries extend or replace
/// the built-in tables; a non-empty tier list replaces the whole list since
/// its ordering is semantic.
#[derive(Deserialize, Debug, Default)]
pub struct CatalogOverlay {
    #[serde(default)]
    pub codecs: IndexMap<String, CodecProfile>,
    #[serde(default)]
    pub resolutions: IndexMap<String, ResolutionProfile>,
    #[serde(default)]
    pub raid_types: IndexMap<String, RaidProfile>,
    #[serde(default)]
    pub cpu_variants: IndexMap<String, CpuVariantProfile>,
    #[serde(default)]
    pub server_tiers: Vec<ServerTierProfile>,
}

impl Catalog {
    pub fn builtin() -> Self {
        defaults::builtin()
    }

    /// Layered catalog loading: built-in tables, overlaid by `sizer.toml` if
    /// present in the working directory, then an explicit file, then
    /// `SIZER`-prefixed environment variables.
    pub fn load(explicit: &Option<PathBuf>) -> Result<Catalog> {
        let mut s = config::Config::builder();

        s = s.add_source(config::File::with_name("sizer.toml").required(false));

        if let Some(path) = explicit {
            s = s.add_source(config::File::from(path.clone()).required(true));
        }

        s = s.add_source(config::Environment::with_prefix("SIZER").separator("_"));

        let overlay: CatalogOverlay = s.build()?.try_deserialize()?;

        let mut catalog = Catalog::builtin();
        catalog.apply(overlay);
        catalog.validate()?;

        Ok(catalog)
    }

    pub fn apply(&mut self, overlay: CatalogOverlay) {
        self.codecs.extend(overlay.codecs);
        self.resolutions.extend(overlay.resolutions);
        self.raid_types.extend(overlay.raid_types);
        self.cpu_variants.extend(overlay.cpu_variants);

        if !overlay.server_tiers.is_empty() {
            self.server_tiers = overlay.server_tiers;
        }
    }

    pub fn codec(&self, id: &str) -> Result<&CodecProfile> {
        self.codecs.get(id).ok_or(Error::not_found("codec", id))
    }

    pub fn resolution(&self, id: &str) -> Result<&ResolutionProfile> {
        self.resolutions
            .get(id)
            .ok_or(Error::not_found("resolution", id))
    }

    pub fn raid_type(&self, id: &str) -> Result<&RaidProfile> {
        self.raid_types
            .get(id)
            .ok_or(Error::not_found("raid type", id))
    }

    pub fn cpu_variant(&self, id: &str) -> Result<&CpuVariantProfile> {
        self.cpu_variants
            .get(id)
            .ok_or(Error::not_found("cpu variant", id))
    }

    pub fn validate(&self) -> Result<()> {
        for (id, codec) in &self.codecs {
            if codec.compression_factor <= 0.0 {
                return Err(Error::invalid(format!(
                    "codec {id}: compression factor must be positive"
                )));
            }

            for (level, multiplier) in &codec.quality_multipliers {
                if *multiplier <= 0.0 {
                    return Err(Error::invalid(format!(
                        "codec {id}: quality multiplier for {level} must be positive"
                    )));
                }
            }
        }

        for (id, resolution) in &self.resolutions {
            if resolution.area_px == 0 {
                return Err(Error::invalid(format!(
                    "resolution {id}: pixel area must be positive"
                )));
            }
        }

        for (id, raid) in &self.raid_types {
            if raid.usable_pct <= 0.0 || raid.usable_pct > 100.0 {
                return Err(Error::invalid(format!(
                    "raid type {id}: usable percentage must be within (0, 100]"
                )));
            }

            if raid.min_drives == 0 {
                return Err(Error::invalid(format!(
                    "raid type {id}: min drives must be at least 1"
                )));
            }
        }

        for (id, cpu) in &self.cpu_variants {
            if cpu.max_cameras == 0 {
                return Err(Error::invalid(format!(
                    "cpu variant {id}: max cameras must be at least 1"
                )));
            }

            if cpu.nic_bitrate_mbps <= 0.0 {
                return Err(Error::invalid(format!(
                    "cpu variant {id}: nic bitrate must be positive"
                )));
            }
        }

        if self.server_tiers.is_empty() {
            return Err(Error::invalid("server tier list must not be empty"));
        }

        for tier in &self.server_tiers {
            if tier.max_devices == 0 || tier.max_bitrate_mbps <= 0.0 {
                return Err(Error::invalid(format!(
                    "server tier {}: device and bitrate limits must be positive",
                    tier.id
                )));
            }
        }

        Ok(())
    }
}
