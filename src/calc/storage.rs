//! Storage volume estimation from bitrate, retention and recording duty
//! cycle. All figures are GB with 1024-based semantics.

use crate::error::{Error, Result};

use super::round2;
use super::types::{CameraGroupSpec, RecordingMode};

const SECONDS_PER_DAY: f64 = 86400.0;
const BITS_TO_GB: f64 = 8.0 * 1024.0 * 1024.0;

impl RecordingMode {
    /// Fraction of the day the camera is actually recording. Scheduled mode
    /// defaults to half a day unless explicit hours are given.
    pub fn recording_factor(&self, custom_hours: Option<f64>) -> Result<f64> {
        let factor = match self {
            Self::Continuous => 1.0,
            Self::Motion => 0.3,
            Self::Object => 0.2,
            Self::Scheduled => match custom_hours {
                Some(hours) => {
                    if !(hours > 0.0 && hours <= 24.0) {
                        return Err(Error::invalid("scheduled hours must be within (0, 24]"));
                    }
                    hours / 24.0
                }
                None => 0.5,
            },
        };

        Ok(factor)
    }
}

/// Daily storage for a single camera in GB.
///
/// The two-decimal rounding happens here, and the totals below multiply the
/// rounded daily figure; 1000 Kbps continuous is exactly 10.3 GB/day and 30
/// days of it exactly 309.0 GB.
pub fn daily_storage_gb(bitrate_kbps: f64, recording_factor: f64) -> Result<f64> {
    if bitrate_kbps <= 0.0 {
        return Err(Error::invalid("bitrate must be positive"));
    }
    if !(recording_factor > 0.0 && recording_factor <= 1.0) {
        return Err(Error::invalid("recording factor must be within (0, 1]"));
    }

    Ok(round2(
        bitrate_kbps * recording_factor * SECONDS_PER_DAY / BITS_TO_GB,
    ))
}

pub fn total_storage_gb(
    bitrate_kbps: f64,
    retention_days: u32,
    recording_factor: f64,
    camera_count: u32,
) -> Result<f64> {
    if retention_days < 1 {
        return Err(Error::invalid("retention days must be at least 1"));
    }
    if camera_count < 1 {
        return Err(Error::invalid("camera count must be at least 1"));
    }

    let daily = daily_storage_gb(bitrate_kbps, recording_factor)?;

    Ok(round2(daily * retention_days as f64 * camera_count as f64))
}

/// Scheduled-recording convenience: exact hours per day instead of a factor.
pub fn storage_with_hours(
    bitrate_kbps: f64,
    retention_days: u32,
    hours_per_day: f64,
    camera_count: u32,
) -> Result<f64> {
    if !(hours_per_day > 0.0 && hours_per_day <= 24.0) {
        return Err(Error::invalid("hours per day must be within (0, 24]"));
    }

    total_storage_gb(
        bitrate_kbps,
        retention_days,
        hours_per_day / 24.0,
        camera_count,
    )
}

#[derive(Debug, Clone)]
pub struct GroupStorage {
    pub camera_count: u32,
    pub bitrate_kbps: f64,
    pub storage_gb: f64,
    pub storage_per_camera_gb: f64,
}

/// Per-group storage breakdown for a set of groups whose bitrates have
/// already been estimated.
pub fn group_storage_breakdown(
    groups: &[(CameraGroupSpec, f64)],
    retention_days: u32,
) -> Result<(f64, Vec<GroupStorage>)> {
    let mut total = 0.0;
    let mut breakdown = Vec::with_capacity(groups.len());

    for (group, bitrate_kbps) in groups {
        let factor = group
            .recording_mode
            .recording_factor(group.scheduled_hours)?;
        let storage = total_storage_gb(*bitrate_kbps, retention_days, factor, group.count)?;

        total += storage;
        breakdown.push(GroupStorage {
            camera_count: group.count,
            bitrate_kbps: *bitrate_kbps,
            storage_gb: storage,
            storage_per_camera_gb: round2(storage / group.count as f64),
        });
    }

    Ok((round2(total), breakdown))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn daily_storage_known_values() {
        assert_eq!(daily_storage_gb(1000.0, 1.0).unwrap(), 10.3);
        assert_eq!(daily_storage_gb(1000.0, 0.3).unwrap(), 3.09);
        assert_eq!(daily_storage_gb(20000.0, 1.0).unwrap(), 205.99);
    }

    #[test]
    fn total_storage_known_values() {
        assert_eq!(total_storage_gb(1000.0, 30, 1.0, 1).unwrap(), 309.0);
        assert_eq!(total_storage_gb(1000.0, 30, 1.0, 10).unwrap(), 3090.0);
        assert_eq!(total_storage_gb(1000.0, 30, 0.3, 1).unwrap(), 92.7);
    }

    #[test]
    fn recording_factors() {
        assert_eq!(RecordingMode::Continuous.recording_factor(None).unwrap(), 1.0);
        assert_eq!(RecordingMode::Motion.recording_factor(None).unwrap(), 0.3);
        assert_eq!(RecordingMode::Object.recording_factor(None).unwrap(), 0.2);
        assert_eq!(RecordingMode::Scheduled.recording_factor(None).unwrap(), 0.5);
        assert_eq!(
            RecordingMode::Scheduled.recording_factor(Some(8.0)).unwrap(),
            8.0 / 24.0
        );
        assert!(RecordingMode::Scheduled.recording_factor(Some(0.0)).is_err());
        assert!(
            RecordingMode::Scheduled
                .recording_factor(Some(25.0))
                .is_err()
        );
    }

    #[test]
    fn scheduled_hours_shortcut_matches_factor() {
        let by_hours = storage_with_hours(4000.0, 14, 12.0, 3).unwrap();
        let by_factor = total_storage_gb(4000.0, 14, 0.5, 3).unwrap();

        assert_eq!(by_hours, by_factor);
    }

    #[test]
    fn breakdown_covers_every_group() {
        let continuous = CameraGroupSpec {
            count: 10,
            resolution_id: None,
            resolution_area_px: None,
            fps: 30,
            codec_id: "h264".into(),
            quality: super::super::types::QualityLevel::Medium,
            manual_bitrate_kbps: Some(1000.0),
            recording_mode: RecordingMode::Continuous,
            scheduled_hours: None,
            audio_enabled: false,
            recorded: true,
        };
        let motion = CameraGroupSpec {
            count: 4,
            recording_mode: RecordingMode::Motion,
            ..continuous.clone()
        };

        let groups = vec![(continuous, 1000.0), (motion, 1000.0)];
        let (total, breakdown) = group_storage_breakdown(&groups, 30).unwrap();

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].storage_gb, 3090.0);
        assert_eq!(breakdown[0].storage_per_camera_gb, 309.0);
        assert_eq!(breakdown[1].storage_gb, 370.8);
        assert_eq!(total, 3460.8);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(daily_storage_gb(0.0, 1.0).is_err());
        assert!(daily_storage_gb(1000.0, 0.0).is_err());
        assert!(daily_storage_gb(1000.0, 1.5).is_err());
        assert!(total_storage_gb(1000.0, 0, 1.0, 1).is_err());
        assert!(total_storage_gb(1000.0, 30, 1.0, 0).is_err());
    }

    proptest! {
        #[test]
        fn storage_scales_linearly_in_retention(
            bitrate in 100.0f64..=20_000.0,
            days in 1u32..=180,
        ) {
            let single = total_storage_gb(bitrate, days, 1.0, 1).unwrap();
            let double = total_storage_gb(bitrate, days * 2, 1.0, 1).unwrap();
            prop_assert!((double - 2.0 * single).abs() <= 0.011);
        }

        #[test]
        fn storage_scales_linearly_in_cameras(
            bitrate in 100.0f64..=20_000.0,
            cameras in 1u32..=500,
        ) {
            let single = total_storage_gb(bitrate, 30, 1.0, cameras).unwrap();
            let double = total_storage_gb(bitrate, 30, 1.0, cameras * 2).unwrap();
            prop_assert!((double - 2.0 * single).abs() <= 0.011);
        }

        #[test]
        fn longer_retention_never_needs_less(
            bitrate in 100.0f64..=20_000.0,
            days in 1u32..=364,
        ) {
            let shorter = total_storage_gb(bitrate, days, 1.0, 1).unwrap();
            let longer = total_storage_gb(bitrate, days + 1, 1.0, 1).unwrap();
            prop_assert!(longer >= shorter);
        }
    }
}
