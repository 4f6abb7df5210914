//! The sizing pipeline: camera groups + retention in, resource requirements
//! out. Every step is a pure function over its inputs; constraint violations
//! accumulate in the result lists while invalid inputs and unknown catalog
//! ids abort the whole calculation.

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{Error, Result};

pub mod bandwidth;
pub mod bitrate;
pub mod licenses;
pub mod multi_site;
pub mod raid;
pub mod servers;
pub mod storage;
pub mod types;

use types::{
    BandwidthBreakdown, BitrateBreakdown, CalculationRequest, CalculationResult, CameraGroupSpec,
    ServerBreakdown, StorageBreakdown, Summary,
};

/// Round to two decimal places. Applied at every function boundary, not only
/// on the final result, so intermediate figures compose the same way they
/// read.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Per-camera bitrate for one group: manual override first, then catalog
/// preset, then explicit pixel area.
fn group_bitrate(group: &CameraGroupSpec, catalog: &Catalog) -> Result<f64> {
    if group.count < 1 {
        return Err(Error::invalid("camera group count must be at least 1"));
    }

    if let Some(manual) = group.manual_bitrate_kbps {
        return bitrate::manual_bitrate(manual, group.audio_enabled);
    }

    if let Some(id) = &group.resolution_id {
        return bitrate::estimate_from_catalog(
            catalog,
            id,
            group.fps,
            &group.codec_id,
            group.quality,
            group.audio_enabled,
        );
    }

    if let Some(area) = group.resolution_area_px {
        let codec = catalog.codec(&group.codec_id)?;
        return bitrate::estimate_bitrate(area, group.fps, codec, group.quality, group.audio_enabled);
    }

    Err(Error::invalid(
        "either resolution_id or resolution_area_px must be provided",
    ))
}

/// Run the full single-site pipeline for one request.
pub fn calculate(request: &CalculationRequest, catalog: &Catalog) -> Result<CalculationResult> {
    if request.camera_groups.is_empty() {
        return Err(Error::invalid("at least one camera group is required"));
    }
    if request.retention_days < 1 {
        return Err(Error::invalid("retention days must be at least 1"));
    }

    let constraints = &request.server_constraints;
    let raid_profile = catalog.raid_type(&constraints.raid_type_id)?;
    let cpu = catalog.cpu_variant(&constraints.cpu_variant_id)?;

    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    // per-group bitrates; a single malformed group fails the whole request
    let mut group_bitrates = Vec::with_capacity(request.camera_groups.len());
    for group in &request.camera_groups {
        let kbps = group_bitrate(group, catalog)?;
        debug!(
            cameras = group.count,
            codec = %group.codec_id,
            kbps,
            "estimated group bitrate"
        );
        group_bitrates.push((group.clone(), kbps));
    }

    let total_devices: u32 = request.camera_groups.iter().map(|g| g.count).sum();

    let per_camera_kbps: Vec<f64> = group_bitrates
        .iter()
        .flat_map(|(group, kbps)| itertools::repeat_n(*kbps, group.count as usize))
        .collect();

    let aggregate = bandwidth::total_bandwidth(
        &per_camera_kbps,
        servers::DEFAULT_BANDWIDTH_HEADROOM_PCT,
    )?;
    let total_bitrate_mbps = aggregate.total_mbps;

    let (total_storage_gb, _groups) =
        storage::group_storage_breakdown(&group_bitrates, request.retention_days)?;

    let storage_calc = raid::required_raw_storage(
        total_storage_gb,
        raid_profile.usable_pct,
        raid::DEFAULT_FS_OVERHEAD_PCT,
    )?;

    let sizing = servers::server_count(
        total_devices,
        total_bitrate_mbps,
        constraints.nic_capacity_mbps,
        constraints.nic_count,
        cpu,
        servers::DEFAULT_MAX_DEVICES_PER_SERVER,
        servers::DEFAULT_BANDWIDTH_HEADROOM_PCT,
        servers::DEFAULT_STORAGE_THROUGHPUT_MBPS,
    )?;

    // heaviest single camera at peak, for the informational capacity search
    let heaviest_camera_kbps = group_bitrates
        .iter()
        .map(|(_, kbps)| *kbps)
        .fold(0.0, f64::max);
    let max_camera_bitrate_mbps =
        bitrate::max_bitrate(heaviest_camera_kbps, bitrate::DEFAULT_LOW_MOTION_QUALITY_PCT)?
            / 1000.0;

    let failover = servers::apply_failover(
        sizing.servers_needed,
        constraints.failover_mode,
        total_devices,
        max_camera_bitrate_mbps,
        cpu,
        servers::DEFAULT_FAILOVER_RAM_GB,
        constraints.nic_count,
    )?;

    let tier = servers::recommend_tier(
        &catalog.server_tiers,
        sizing.devices_per_server,
        sizing.bitrate_per_server_mbps,
    )?;
    if tier.fallback {
        warnings.push(format!(
            "No server tier accommodates {} devices at {} Mbps per server; quoting the {} tier",
            sizing.devices_per_server, sizing.bitrate_per_server_mbps, tier.tier_name
        ));
    }

    let per_server_mbps =
        bandwidth::per_server_bandwidth(aggregate.total_mbps, sizing.servers_needed)?;
    let nic = bandwidth::validate_nic_capacity(
        per_server_mbps,
        constraints.nic_capacity_mbps,
        constraints.nic_count,
        bandwidth::DEFAULT_MAX_NIC_UTILIZATION_PCT,
    )?;
    errors.extend(nic.errors);
    warnings.extend(nic.warnings);

    let licenses = licenses::license_summary(&request.camera_groups);

    info!(
        total_devices,
        total_bitrate_mbps,
        total_storage_gb,
        servers = sizing.servers_needed,
        "sizing complete"
    );

    Ok(CalculationResult {
        summary: Summary {
            total_devices,
            total_bitrate_mbps,
            total_storage_tb: round2(total_storage_gb / 1024.0),
            servers_needed: sizing.servers_needed,
            servers_with_failover: failover.total_servers,
        },
        bitrate: BitrateBreakdown {
            total_kbps: aggregate.total_kbps,
            total_mbps: aggregate.total_mbps,
            peak_kbps: bitrate::max_bitrate(
                aggregate.total_kbps,
                bitrate::DEFAULT_LOW_MOTION_QUALITY_PCT,
            )?,
        },
        storage: StorageBreakdown {
            total_gb: total_storage_gb,
            total_tb: round2(total_storage_gb / 1024.0),
            daily_gb: round2(total_storage_gb / request.retention_days as f64),
            raw_gb: storage_calc.raw_gb,
            usable_gb: storage_calc.usable_gb,
            raid_overhead_gb: storage_calc.raid_overhead_gb,
            filesystem_overhead_gb: storage_calc.filesystem_overhead_gb,
        },
        servers: ServerBreakdown {
            servers_needed: sizing.servers_needed,
            servers_with_failover: failover.total_servers,
            devices_per_server: sizing.devices_per_server,
            bitrate_per_server_mbps: sizing.bitrate_per_server_mbps,
            limiting_factor: sizing.limiting_factor,
            recommended_tier: tier,
            failover_capacity: failover.capacity,
        },
        bandwidth: BandwidthBreakdown {
            total_mbps: aggregate.total_mbps,
            total_gbps: aggregate.total_gbps,
            per_server_mbps,
            nic_utilization_pct: nic.utilization_pct,
        },
        licenses,
        warnings,
        errors,
    })
}
