//! RAID and filesystem overhead transforms between raw drive capacity and
//! application-usable storage, plus drive-count planning helpers.

use serde::{Deserialize, Serialize};

use crate::catalog::RaidProfile;
use crate::error::{Error, Result};

use super::round2;
use super::types::FailoverMode;

pub const DEFAULT_FS_OVERHEAD_PCT: f64 = 5.0;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RaidOverhead {
    pub raw_gb: f64,
    pub usable_gb: f64,
    pub raid_overhead_gb: f64,
    pub filesystem_overhead_gb: f64,
    pub total_overhead_pct: f64,
}

fn validate_percentages(raid_usable_pct: f64, fs_overhead_pct: f64) -> Result<()> {
    if !(raid_usable_pct > 0.0 && raid_usable_pct <= 100.0) {
        return Err(Error::invalid(
            "raid usable percentage must be within (0, 100]",
        ));
    }
    if !(0.0..100.0).contains(&fs_overhead_pct) {
        return Err(Error::invalid(
            "filesystem overhead must be within [0, 100)",
        ));
    }

    Ok(())
}

/// Forward transform: usable capacity left after RAID redundancy and
/// filesystem overhead are taken out of raw drive capacity.
pub fn raid_overhead(
    raw_storage_gb: f64,
    raid_usable_pct: f64,
    fs_overhead_pct: f64,
) -> Result<RaidOverhead> {
    if raw_storage_gb <= 0.0 {
        return Err(Error::invalid("raw storage must be positive"));
    }
    validate_percentages(raid_usable_pct, fs_overhead_pct)?;

    let after_raid = raw_storage_gb * (raid_usable_pct / 100.0);
    let usable = after_raid * (1.0 - fs_overhead_pct / 100.0);

    Ok(RaidOverhead {
        raw_gb: round2(raw_storage_gb),
        usable_gb: round2(usable),
        raid_overhead_gb: round2(raw_storage_gb - after_raid),
        filesystem_overhead_gb: round2(after_raid - usable),
        total_overhead_pct: round2((raw_storage_gb - usable) / raw_storage_gb * 100.0),
    })
}

/// Inverse transform: raw capacity needed to end up with the required
/// usable storage. Round-trips with [`raid_overhead`] within 0.01 GB.
pub fn required_raw_storage(
    required_usable_gb: f64,
    raid_usable_pct: f64,
    fs_overhead_pct: f64,
) -> Result<RaidOverhead> {
    if required_usable_gb <= 0.0 {
        return Err(Error::invalid("required storage must be positive"));
    }
    validate_percentages(raid_usable_pct, fs_overhead_pct)?;

    let multiplier = (raid_usable_pct / 100.0) * (1.0 - fs_overhead_pct / 100.0);
    let raw = required_usable_gb / multiplier;

    raid_overhead(raw, raid_usable_pct, fs_overhead_pct)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DriveConfiguration {
    pub raid_name: String,
    pub drive_count: u32,
    pub drive_capacity_gb: f64,
    pub fault_tolerance: u32,
    pub overhead: RaidOverhead,
}

/// Capacity yielded by a concrete drive population under a RAID profile.
pub fn raid_for_drive_count(
    drive_count: u32,
    drive_capacity_gb: f64,
    raid: &RaidProfile,
) -> Result<DriveConfiguration> {
    if drive_capacity_gb <= 0.0 {
        return Err(Error::invalid("drive capacity must be positive"));
    }
    if drive_count < raid.min_drives {
        return Err(Error::invalid(format!(
            "{} requires at least {} drives",
            raid.name, raid.min_drives
        )));
    }

    let raw = drive_count as f64 * drive_capacity_gb;
    let overhead = raid_overhead(raw, raid.usable_pct, DEFAULT_FS_OVERHEAD_PCT)?;

    Ok(DriveConfiguration {
        raid_name: raid.name.clone(),
        drive_count,
        drive_capacity_gb,
        fault_tolerance: raid.fault_tolerance,
        overhead,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidPriority {
    Capacity,
    Performance,
    Balanced,
}

/// Pick a RAID type id for a fault-tolerance requirement.
pub fn recommend_raid_type(fault_tolerance: u32, priority: RaidPriority) -> &'static str {
    match fault_tolerance {
        0 => match priority {
            RaidPriority::Performance => "raid0",
            _ => "none",
        },
        1 => match priority {
            RaidPriority::Performance => "raid10",
            _ => "raid5",
        },
        _ => "raid6",
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FailoverStorage {
    pub primary_gb: f64,
    pub backup_gb: f64,
    pub total_gb: f64,
    pub multiplier: f64,
}

/// Storage multiplier for failover pools: backups mirror the primary pool
/// wholesale.
pub fn failover_storage(primary_storage_gb: f64, mode: FailoverMode) -> Result<FailoverStorage> {
    if primary_storage_gb <= 0.0 {
        return Err(Error::invalid("primary storage must be positive"));
    }

    let multiplier = match mode {
        FailoverMode::None => 1.0,
        FailoverMode::NPlus1 => 2.0,
        FailoverMode::NPlus2 => 3.0,
    };

    let total = primary_storage_gb * multiplier;

    Ok(FailoverStorage {
        primary_gb: round2(primary_storage_gb),
        backup_gb: round2(total - primary_storage_gb),
        total_gb: round2(total),
        multiplier,
    })
}
