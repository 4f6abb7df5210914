//! Server count sizing and per-node failover capacity.
//!
//! Sizing takes the worst of three independent ceilings (device count,
//! network bandwidth, storage throughput). Failover capacity is a greedy
//! admission search: cameras are added one at a time until the first
//! RAM/CPU/NIC/storage check fails, so the result is the last camera count
//! before saturation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{CpuVariantProfile, ServerTierProfile};
use crate::error::{Error, Result};

use super::round2;
use super::types::FailoverMode;

/// Sustained throughput of one recording drive, Mbps.
pub const DEFAULT_STORAGE_THROUGHPUT_MBPS: f64 = 204.0;
pub const DEFAULT_MAX_STORAGE_DEVICES: u32 = 12;
pub const DEFAULT_MAX_DEVICES_PER_SERVER: u32 = 256;
pub const DEFAULT_BANDWIDTH_HEADROOM_PCT: f64 = 20.0;
pub const CAMERA_RAM_MB: u32 = 40;
pub const CLIENT_RAM_MB: u32 = 3072;
pub const DEFAULT_FAILOVER_RAM_GB: u32 = 8;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    DeviceCount,
    Bandwidth,
    StorageThroughput,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RamRequirement {
    pub required_mb: u32,
    pub required_gb: f64,
    /// Next power of two in GB, capped at 64.
    pub rounded_gb: u32,
    pub os_ram_mb: u32,
    pub client_ram_mb: u32,
    pub camera_ram_mb: u32,
}

/// RAM needed by a recording node hosting `cameras` devices, optionally
/// alongside a desktop client.
pub fn required_ram(cameras: u32, cpu: &CpuVariantProfile, host_client: bool) -> RamRequirement {
    let client_ram_mb = if host_client { CLIENT_RAM_MB } else { 0 };
    let camera_ram_mb = cameras * CAMERA_RAM_MB;
    let required_mb = cpu.os_ram_mb + client_ram_mb + camera_ram_mb;

    let required_gb = required_mb as f64 / 1024.0;
    let rounded_gb = [1u32, 2, 4, 8, 16, 32, 64]
        .into_iter()
        .find(|p| *p as f64 >= required_gb)
        .unwrap_or(64);

    RamRequirement {
        required_mb,
        required_gb: round2(required_gb),
        rounded_gb,
        os_ram_mb: cpu.os_ram_mb,
        client_ram_mb,
        camera_ram_mb,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StorageThroughput {
    pub device_count: u32,
    pub throughput_per_device_mbps: f64,
    pub utilization_pct: f64,
}

/// Recording drives needed to sustain the aggregate bitrate.
pub fn storage_device_count(
    total_bitrate_mbps: f64,
    throughput_per_device_mbps: f64,
) -> Result<StorageThroughput> {
    if total_bitrate_mbps < 0.0 {
        return Err(Error::invalid("total bitrate cannot be negative"));
    }
    if throughput_per_device_mbps <= 0.0 {
        return Err(Error::invalid("storage throughput must be positive"));
    }

    let device_count = ((total_bitrate_mbps / throughput_per_device_mbps).ceil() as u32).max(1);

    Ok(StorageThroughput {
        device_count,
        throughput_per_device_mbps,
        utilization_pct: round2(
            total_bitrate_mbps / (device_count as f64 * throughput_per_device_mbps) * 100.0,
        ),
    })
}

/// Derate the per-server device ceiling for heavy cameras: high resolution,
/// high bitrate or high frame rate all reduce how many a server can decode.
pub fn effective_max_devices(
    resolution_area_px: u64,
    bitrate_kbps: f64,
    fps: u32,
    base_max_devices: u32,
) -> u32 {
    let mut max_devices = base_max_devices;

    if resolution_area_px >= 8_000_000 {
        max_devices = max_devices.min(128);
    }
    if resolution_area_px >= 12_000_000 {
        max_devices = max_devices.min(96);
    }

    if bitrate_kbps > 8000.0 {
        max_devices = max_devices.min(128);
    }
    if bitrate_kbps > 12000.0 {
        max_devices = max_devices.min(96);
    }

    if fps > 30 {
        max_devices = (max_devices as f64 * 0.8) as u32;
    }

    max_devices
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerSizing {
    pub servers_needed: u32,
    pub limiting_factor: LimitingFactor,
    pub servers_by_devices: u32,
    pub servers_by_bandwidth: u32,
    pub servers_by_storage: u32,
    pub devices_per_server: u32,
    pub bitrate_per_server_mbps: f64,
    pub nic_utilization_pct: f64,
}

/// Minimum server count across the three independent ceilings.
pub fn server_count(
    total_devices: u32,
    total_bitrate_mbps: f64,
    nic_capacity_mbps: f64,
    nic_count: u32,
    cpu: &CpuVariantProfile,
    max_devices_per_server: u32,
    bandwidth_headroom_pct: f64,
    storage_throughput_mbps: f64,
) -> Result<ServerSizing> {
    if total_devices < 1 {
        return Err(Error::invalid("total devices must be at least 1"));
    }
    if total_bitrate_mbps < 0.0 {
        return Err(Error::invalid("total bitrate cannot be negative"));
    }
    if nic_capacity_mbps <= 0.0 {
        return Err(Error::invalid("nic capacity must be positive"));
    }
    if nic_count < 1 {
        return Err(Error::invalid("nic count must be at least 1"));
    }
    if !(0.0..100.0).contains(&bandwidth_headroom_pct) {
        return Err(Error::invalid("bandwidth headroom must be within [0, 100)"));
    }

    let effective_max = max_devices_per_server.min(cpu.max_cameras).max(1);
    let servers_by_devices = total_devices.div_ceil(effective_max);

    let effective_nic_capacity =
        nic_capacity_mbps * nic_count as f64 * (1.0 - bandwidth_headroom_pct / 100.0);
    let servers_by_bandwidth = (total_bitrate_mbps / effective_nic_capacity).ceil() as u32;

    let servers_by_storage =
        storage_device_count(total_bitrate_mbps, storage_throughput_mbps)?.device_count;

    let servers_needed = servers_by_devices
        .max(servers_by_bandwidth)
        .max(servers_by_storage);

    // ties resolve device count first, then bandwidth
    let limiting_factor = if servers_by_devices >= servers_by_bandwidth.max(servers_by_storage) {
        LimitingFactor::DeviceCount
    } else if servers_by_bandwidth >= servers_by_devices.max(servers_by_storage) {
        LimitingFactor::Bandwidth
    } else {
        LimitingFactor::StorageThroughput
    };

    let devices_per_server = total_devices.div_ceil(servers_needed);
    let bitrate_per_server = total_bitrate_mbps / servers_needed as f64;

    Ok(ServerSizing {
        servers_needed,
        limiting_factor,
        servers_by_devices,
        servers_by_bandwidth,
        servers_by_storage,
        devices_per_server,
        bitrate_per_server_mbps: round2(bitrate_per_server),
        nic_utilization_pct: round2(
            bitrate_per_server / (nic_capacity_mbps * nic_count as f64) * 100.0,
        ),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailoverLimit {
    CpuCameraLimit,
    NetworkBandwidth,
    Ram,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FailoverCapacity {
    pub max_cameras: u32,
    pub max_bitrate_mbps: f64,
    pub ram_used_mb: u32,
    pub ram_utilization_pct: f64,
    pub cpu_utilization_pct: f64,
    pub nic_utilization_pct: f64,
    pub limiting_factor: FailoverLimit,
}

/// How many cameras a single node can absorb before exhausting RAM, the CPU
/// camera ceiling, NIC bandwidth or storage-device throughput.
///
/// Cameras are admitted one at a time and state never decreases; the first
/// failing check halts the search. The RAM check couples the per-camera cost
/// with a fixed client-hosting cost, which is why this is a search rather
/// than a closed-form division. Bounded by `cpu.max_cameras` iterations.
pub fn failover_capacity(
    max_camera_bitrate_mbps: f64,
    cpu: &CpuVariantProfile,
    ram_gb: u32,
    nic_bitrate_mbps: f64,
    nic_count: u32,
    host_client: bool,
    storage_throughput_mbps: f64,
    max_storage_devices: u32,
) -> Result<FailoverCapacity> {
    if max_camera_bitrate_mbps < 0.0 {
        return Err(Error::invalid("camera bitrate cannot be negative"));
    }
    if ram_gb < 1 {
        return Err(Error::invalid("ram must be at least 1 GB"));
    }
    if nic_bitrate_mbps <= 0.0 {
        return Err(Error::invalid("nic bitrate must be positive"));
    }
    if nic_count < 1 {
        return Err(Error::invalid("nic count must be at least 1"));
    }
    if storage_throughput_mbps <= 0.0 {
        return Err(Error::invalid("storage throughput must be positive"));
    }

    let client_ram_mb = if host_client { CLIENT_RAM_MB } else { 0 };
    let available_ram_mb = ram_gb * 1024;

    let mut cameras = 0u32;
    let mut bitrate_mbps = 0.0f64;

    loop {
        let next_cameras = cameras + 1;
        let next_bitrate = bitrate_mbps + max_camera_bitrate_mbps;

        let required_ram_mb = cpu.os_ram_mb + client_ram_mb + next_cameras * CAMERA_RAM_MB;

        let ram_ok = required_ram_mb <= available_ram_mb;
        let cpu_ok = next_cameras <= cpu.max_cameras;
        let nic_ok = (next_bitrate / nic_bitrate_mbps).ceil() as u32 <= nic_count;
        let storage_ok = (next_bitrate / storage_throughput_mbps).ceil() as u32
            <= max_storage_devices;

        if ram_ok && cpu_ok && nic_ok && storage_ok {
            cameras = next_cameras;
            bitrate_mbps = next_bitrate;
        } else {
            break;
        }
    }

    let ram_used_mb = cpu.os_ram_mb + client_ram_mb + cameras * CAMERA_RAM_MB;
    let total_nic_capacity = nic_bitrate_mbps * nic_count as f64;

    let cpu_usage = cameras as f64 / cpu.max_cameras as f64;
    let nic_usage = bitrate_mbps / total_nic_capacity;
    let ram_usage = ram_used_mb as f64 / available_ram_mb as f64;

    // the dimension closest to its budget is the binding one
    let max_usage = cpu_usage.max(nic_usage).max(ram_usage);
    let limiting_factor = if max_usage == cpu_usage {
        FailoverLimit::CpuCameraLimit
    } else if max_usage == nic_usage {
        FailoverLimit::NetworkBandwidth
    } else {
        FailoverLimit::Ram
    };

    Ok(FailoverCapacity {
        max_cameras: cameras,
        max_bitrate_mbps: round2(bitrate_mbps),
        ram_used_mb,
        ram_utilization_pct: round2(ram_usage * 100.0),
        cpu_utilization_pct: round2(cpu_usage * 100.0),
        nic_utilization_pct: round2(nic_usage * 100.0),
        limiting_factor,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FailoverCapacitySummary {
    pub max_cameras_per_server: u32,
    /// `max(max_cameras - 1, cameras_count)`: one camera of safety margin
    /// below absolute saturation.
    pub failover_estimate: u32,
    pub limiting_factor: FailoverLimit,
    pub ram_utilization_pct: f64,
    pub cpu_utilization_pct: f64,
    pub nic_utilization_pct: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FailoverPlan {
    pub primary_servers: u32,
    pub backup_servers: u32,
    pub total_servers: u32,
    pub capacity: Option<FailoverCapacitySummary>,
}

/// Apply the failover multiplier to the server count. N+1 doubles, N+2
/// triples. The per-node capacity search runs alongside when camera data is
/// available but stays informational; it never refines the multiplier.
pub fn apply_failover(
    servers_needed: u32,
    mode: FailoverMode,
    cameras_count: u32,
    max_camera_bitrate_mbps: f64,
    cpu: &CpuVariantProfile,
    ram_gb: u32,
    nic_count: u32,
) -> Result<FailoverPlan> {
    let multiplier = match mode {
        FailoverMode::None => {
            return Ok(FailoverPlan {
                primary_servers: servers_needed,
                backup_servers: 0,
                total_servers: servers_needed,
                capacity: None,
            });
        }
        FailoverMode::NPlus1 => 2,
        FailoverMode::NPlus2 => 3,
    };

    let capacity = if cameras_count > 0 && max_camera_bitrate_mbps > 0.0 {
        let info = failover_capacity(
            max_camera_bitrate_mbps,
            cpu,
            ram_gb,
            cpu.nic_bitrate_mbps,
            nic_count,
            false,
            DEFAULT_STORAGE_THROUGHPUT_MBPS,
            DEFAULT_MAX_STORAGE_DEVICES,
        )?;

        Some(FailoverCapacitySummary {
            max_cameras_per_server: info.max_cameras,
            failover_estimate: info.max_cameras.saturating_sub(1).max(cameras_count),
            limiting_factor: info.limiting_factor,
            ram_utilization_pct: info.ram_utilization_pct,
            cpu_utilization_pct: info.cpu_utilization_pct,
            nic_utilization_pct: info.nic_utilization_pct,
        })
    } else {
        None
    };

    let total_servers = servers_needed * multiplier;

    Ok(FailoverPlan {
        primary_servers: servers_needed,
        backup_servers: total_servers - servers_needed,
        total_servers,
        capacity,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TierRecommendation {
    pub tier_id: String,
    pub tier_name: String,
    pub cpu_model: String,
    pub ram_gb: u32,
    pub storage_type: String,
    pub recommended_raid: String,
    pub network: String,
    pub use_case: String,
    /// True when no tier accommodates the load and the highest one was used.
    pub fallback: bool,
}

/// First tier (scanning the ascending list) whose limits accommodate the
/// per-server load; the highest tier with a warning otherwise.
pub fn recommend_tier(
    tiers: &[ServerTierProfile],
    devices_per_server: u32,
    bitrate_per_server_mbps: f64,
) -> Result<TierRecommendation> {
    let matching = tiers.iter().find(|tier| {
        devices_per_server <= tier.max_devices && bitrate_per_server_mbps <= tier.max_bitrate_mbps
    });

    let fallback = matching.is_none();

    let tier = match matching.or(tiers.last()) {
        Some(tier) => tier,
        None => return Err(Error::invalid("server tier list must not be empty")),
    };

    if fallback {
        warn!(
            devices_per_server,
            bitrate_per_server_mbps, "no server tier accommodates the load, using {}", tier.id
        );
    }

    Ok(TierRecommendation {
        tier_id: tier.id.clone(),
        tier_name: tier.name.clone(),
        cpu_model: tier.cpu_model.clone(),
        ram_gb: tier.ram_gb,
        storage_type: tier.storage_type.clone(),
        recommended_raid: tier.recommended_raid.clone(),
        network: format!("{}x {:.1}Gbps", tier.nic_count, tier.nic_speed_mbps / 1000.0),
        use_case: tier.use_case.clone(),
        fallback,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerLoad {
    pub server_index: u32,
    pub devices: u32,
    pub utilization_pct: f64,
}

/// Even ceil-fill of devices across servers; the last server takes whatever
/// remains.
pub fn distribute_devices(total_devices: u32, servers: u32) -> Result<Vec<ServerLoad>> {
    if servers < 1 {
        return Err(Error::invalid("server count must be at least 1"));
    }

    let devices_per_server = total_devices.div_ceil(servers);
    let mut remaining = total_devices;
    let mut loads = Vec::with_capacity(servers as usize);

    for i in 0..servers {
        let devices = devices_per_server.min(remaining);
        loads.push(ServerLoad {
            server_index: i + 1,
            devices,
            utilization_pct: round2(
                devices as f64 / DEFAULT_MAX_DEVICES_PER_SERVER as f64 * 100.0,
            ),
        });
        remaining -= devices;
    }

    Ok(loads)
}
