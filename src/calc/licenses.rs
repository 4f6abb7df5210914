//! License counting: one professional license per recorded device, live-only
//! viewing and I/O modules counted separately.

use serde::{Deserialize, Serialize};

use super::types::CameraGroupSpec;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LicenseBreakdown {
    pub professional: u32,
    pub live_only: u32,
    pub io_modules: u32,
    pub total: u32,
}

pub fn calculate_licenses(
    recorded_devices: u32,
    live_only_devices: u32,
    io_modules: u32,
) -> LicenseBreakdown {
    LicenseBreakdown {
        professional: recorded_devices,
        live_only: live_only_devices,
        io_modules,
        total: recorded_devices + live_only_devices + io_modules,
    }
}

/// License counts for a set of camera groups, split by the per-group
/// `recorded` flag.
pub fn license_summary(groups: &[CameraGroupSpec]) -> LicenseBreakdown {
    let recorded = groups
        .iter()
        .filter(|g| g.recorded)
        .map(|g| g.count)
        .sum::<u32>();
    let live_only = groups
        .iter()
        .filter(|g| !g.recorded)
        .map(|g| g.count)
        .sum::<u32>();

    calculate_licenses(recorded, live_only, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::types::{QualityLevel, RecordingMode};

    fn group(count: u32, recorded: bool) -> CameraGroupSpec {
        CameraGroupSpec {
            count,
            resolution_id: Some("2mp_1080p".into()),
            resolution_area_px: None,
            fps: 30,
            codec_id: "h264".into(),
            quality: QualityLevel::Medium,
            manual_bitrate_kbps: None,
            recording_mode: RecordingMode::Continuous,
            scheduled_hours: None,
            audio_enabled: false,
            recorded,
        }
    }

    #[test]
    fn one_license_per_recorded_device() {
        let licenses = calculate_licenses(100, 20, 5);

        assert_eq!(licenses.professional, 100);
        assert_eq!(licenses.live_only, 20);
        assert_eq!(licenses.io_modules, 5);
        assert_eq!(licenses.total, 125);
    }

    #[test]
    fn summary_splits_on_recorded_flag() {
        let groups = vec![group(100, true), group(50, false), group(25, true)];
        let licenses = license_summary(&groups);

        assert_eq!(licenses.professional, 125);
        assert_eq!(licenses.live_only, 50);
        assert_eq!(licenses.total, 175);
    }
}
