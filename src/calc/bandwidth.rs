//! Network bandwidth aggregation and NIC capacity validation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::round2;

pub const DEFAULT_MAX_NIC_UTILIZATION_PCT: f64 = 80.0;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TotalBandwidth {
    pub total_kbps: f64,
    pub total_mbps: f64,
    pub total_gbps: f64,
    pub with_headroom_mbps: f64,
    pub camera_count: u32,
}

/// Aggregate ingress bandwidth across cameras, with a burst headroom figure.
pub fn total_bandwidth(camera_bitrates_kbps: &[f64], headroom_pct: f64) -> Result<TotalBandwidth> {
    if camera_bitrates_kbps.is_empty() {
        return Err(Error::invalid("camera bitrate list cannot be empty"));
    }
    if headroom_pct < 0.0 {
        return Err(Error::invalid("headroom cannot be negative"));
    }

    let total_kbps: f64 = camera_bitrates_kbps.iter().sum();
    let with_headroom = total_kbps * (1.0 + headroom_pct / 100.0);

    Ok(TotalBandwidth {
        total_kbps: round2(total_kbps),
        total_mbps: round2(total_kbps / 1000.0),
        total_gbps: round2(total_kbps / 1_000_000.0),
        with_headroom_mbps: round2(with_headroom / 1000.0),
        camera_count: camera_bitrates_kbps.len() as u32,
    })
}

pub fn per_server_bandwidth(total_bitrate_mbps: f64, servers: u32) -> Result<f64> {
    if servers < 1 {
        return Err(Error::invalid("server count must be at least 1"));
    }

    Ok(round2(total_bitrate_mbps / servers as f64))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NicValidation {
    pub valid: bool,
    pub utilization_pct: f64,
    pub total_capacity_mbps: f64,
    pub available_capacity_mbps: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Check a per-server bitrate against NIC capacity. Utilization above 100%
/// of raw capacity or above the recommended maximum is an error; within 10%
/// of the recommended maximum is a warning.
pub fn validate_nic_capacity(
    per_server_mbps: f64,
    nic_capacity_mbps: f64,
    nic_count: u32,
    max_utilization_pct: f64,
) -> Result<NicValidation> {
    if nic_capacity_mbps <= 0.0 {
        return Err(Error::invalid("nic capacity must be positive"));
    }
    if nic_count < 1 {
        return Err(Error::invalid("nic count must be at least 1"));
    }

    let total_capacity = nic_capacity_mbps * nic_count as f64;
    let utilization = per_server_mbps / total_capacity * 100.0;

    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    if utilization > 100.0 {
        errors.push(format!(
            "Bandwidth ({per_server_mbps:.1} Mbps) exceeds NIC capacity ({total_capacity:.1} \
             Mbps). Add more NICs or reduce camera count."
        ));
    } else if utilization > max_utilization_pct {
        errors.push(format!(
            "NIC utilization ({utilization:.1}%) exceeds recommended maximum \
             ({max_utilization_pct}%). Consider adding NICs."
        ));
    } else if utilization > max_utilization_pct * 0.9 {
        warnings.push(format!(
            "Approaching maximum NIC utilization ({utilization:.1}% of {max_utilization_pct}%)"
        ));
    }

    Ok(NicValidation {
        valid: errors.is_empty(),
        utilization_pct: round2(utilization),
        total_capacity_mbps: total_capacity,
        available_capacity_mbps: round2(total_capacity - per_server_mbps),
        warnings,
        errors,
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NicRequirement {
    pub required_nics: u32,
    pub total_bitrate_mbps: f64,
    pub utilization_pct: f64,
}

/// NICs needed for a peak bitrate plus client viewing traffic.
pub fn required_nics(
    max_bitrate_mbps: f64,
    nic_bitrate_mbps: f64,
    client_bitrate_mbps: f64,
) -> Result<NicRequirement> {
    if nic_bitrate_mbps <= 0.0 {
        return Err(Error::invalid("nic bitrate must be positive"));
    }
    if max_bitrate_mbps < 0.0 || client_bitrate_mbps < 0.0 {
        return Err(Error::invalid("bitrate cannot be negative"));
    }

    let total = max_bitrate_mbps + client_bitrate_mbps;
    let required = ((total / nic_bitrate_mbps).ceil() as u32).max(1);

    Ok(NicRequirement {
        required_nics: required,
        total_bitrate_mbps: round2(total),
        utilization_pct: round2(total / (required as f64 * nic_bitrate_mbps) * 100.0),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EgressBandwidth {
    pub total_streams: u32,
    pub total_egress_kbps: f64,
    pub total_egress_mbps: f64,
}

/// Egress towards viewing clients: streams re-served from the recorders.
pub fn egress_bandwidth(
    concurrent_clients: u32,
    cameras_per_client: u32,
    avg_camera_bitrate_kbps: f64,
) -> Result<EgressBandwidth> {
    if avg_camera_bitrate_kbps < 0.0 {
        return Err(Error::invalid("bitrate cannot be negative"));
    }

    let total_streams = concurrent_clients * cameras_per_client;
    let total_kbps = total_streams as f64 * avg_camera_bitrate_kbps;

    Ok(EgressBandwidth {
        total_streams,
        total_egress_kbps: round2(total_kbps),
        total_egress_mbps: round2(total_kbps / 1000.0),
    })
}
