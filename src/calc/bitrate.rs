//! Per-camera bitrate estimation.
//!
//! Two formula families exist: H.264/H.265-class codecs follow a power
//! function of the pixel area (`0.009 * area^0.7`), MJPEG-class codecs a
//! linear one. Results are Kbps, rounded to two decimals at the boundary.

use crate::catalog::{Catalog, CodecProfile};
use crate::error::{Error, Result};

use super::round2;
use super::types::QualityLevel;

pub const AUDIO_BITRATE_KBPS: f64 = 64.0;

/// Peak-over-average adjustment for variable-bitrate scenes, in percent.
pub const DEFAULT_LOW_MOTION_QUALITY_PCT: f64 = 20.0;

/// Remap a legacy-scale quality multiplier (0.6-2.0) onto the canonical
/// 0.1-1.0 range. Values of exactly 1.0 pass through unchanged; the shim
/// exists for catalogs still carrying the old scale and must not leak into
/// the formulas below.
pub fn normalize_quality_multiplier(multiplier: f64) -> f64 {
    if multiplier > 1.0 {
        0.55 + (multiplier - 1.0) * 0.225
    } else if multiplier < 1.0 {
        0.1 + (multiplier - 0.6) * 1.125
    } else {
        multiplier
    }
}

/// Core bitrate formula over explicit numeric inputs, in Kbps.
///
/// The quality multiplier is expected on the canonical 0.1-1.0 scale (see
/// [`normalize_quality_multiplier`]).
pub fn calculate_bitrate(
    resolution_area_px: u64,
    fps: u32,
    compression_factor: f64,
    quality_multiplier: f64,
    power_function: bool,
    audio_enabled: bool,
    brand_factor: f64,
) -> Result<f64> {
    if resolution_area_px == 0 {
        return Err(Error::invalid("resolution area must be positive"));
    }
    if !(1..=100).contains(&fps) {
        return Err(Error::invalid("fps must be between 1 and 100"));
    }
    if compression_factor <= 0.0 {
        return Err(Error::invalid("compression factor must be positive"));
    }
    if quality_multiplier <= 0.0 {
        return Err(Error::invalid("quality multiplier must be positive"));
    }
    if brand_factor <= 0.0 {
        return Err(Error::invalid("brand factor must be positive"));
    }

    let area = resolution_area_px as f64;
    let fps = fps as f64;

    let raw = if power_function {
        let resolution_factor = 0.009 * area.powf(0.7);
        brand_factor * quality_multiplier * fps * resolution_factor * compression_factor
    } else {
        (area / 6666.0) * fps * quality_multiplier * (compression_factor + 1.0 / 3.0) * 12.0
    };

    let video_kbps = raw / 1024.0;

    let total = if audio_enabled {
        video_kbps + AUDIO_BITRATE_KBPS
    } else {
        video_kbps
    };

    Ok(round2(total))
}

/// Estimate using a codec profile: quality level resolved against the
/// profile's multiplier table, then normalized.
pub fn estimate_bitrate(
    resolution_area_px: u64,
    fps: u32,
    codec: &CodecProfile,
    quality: QualityLevel,
    audio_enabled: bool,
) -> Result<f64> {
    let multiplier = codec
        .quality_multipliers
        .get(quality.as_str())
        .copied()
        .unwrap_or(1.0);

    calculate_bitrate(
        resolution_area_px,
        fps,
        codec.compression_factor,
        normalize_quality_multiplier(multiplier),
        codec.power_function,
        audio_enabled,
        1.0,
    )
}

/// Estimate using catalog presets for both resolution and codec.
pub fn estimate_from_catalog(
    catalog: &Catalog,
    resolution_id: &str,
    fps: u32,
    codec_id: &str,
    quality: QualityLevel,
    audio_enabled: bool,
) -> Result<f64> {
    let resolution = catalog.resolution(resolution_id)?;
    let codec = catalog.codec(codec_id)?;

    estimate_bitrate(resolution.area_px, fps, codec, quality, audio_enabled)
}

/// Manual override: the formula is skipped entirely, only the audio
/// constant is added. Manual and formula values are never blended.
pub fn manual_bitrate(bitrate_kbps: f64, audio_enabled: bool) -> Result<f64> {
    if bitrate_kbps <= 0.0 {
        return Err(Error::invalid("bitrate must be positive"));
    }

    let total = if audio_enabled {
        bitrate_kbps + AUDIO_BITRATE_KBPS
    } else {
        bitrate_kbps
    };

    Ok(round2(total))
}

/// Peak bitrate during high-motion scenes. Used for NIC planning and the
/// failover capacity search, not for steady-state sizing.
pub fn max_bitrate(average_bitrate_kbps: f64, low_motion_quality_pct: f64) -> Result<f64> {
    if average_bitrate_kbps <= 0.0 {
        return Err(Error::invalid("average bitrate must be positive"));
    }
    if low_motion_quality_pct < 0.0 {
        return Err(Error::invalid("low motion quality must be non-negative"));
    }

    Ok(round2(
        average_bitrate_kbps * (1.0 + low_motion_quality_pct / 100.0),
    ))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const FULL_HD: u64 = 1920 * 1080;

    #[test]
    fn power_function_formula() {
        // 1080p @ 30fps, H.264 (0.10), canonical medium quality 0.55
        let expected = round2(0.55 * 30.0 * 0.009 * (FULL_HD as f64).powf(0.7) * 0.10 / 1024.0);

        let actual = calculate_bitrate(FULL_HD, 30, 0.10, 0.55, true, false, 1.0).unwrap();

        assert!(actual > 0.0);
        assert_eq!(actual, expected);
    }

    #[test]
    fn linear_formula() {
        let expected =
            round2((FULL_HD as f64 / 6666.0) * 30.0 * 0.55 * (0.35 + 1.0 / 3.0) * 12.0 / 1024.0);

        let actual = calculate_bitrate(FULL_HD, 30, 0.35, 0.55, false, false, 1.0).unwrap();

        assert_eq!(actual, expected);
    }

    #[test]
    fn audio_adds_flat_64_kbps() {
        let without = calculate_bitrate(FULL_HD, 30, 0.10, 0.55, true, false, 1.0).unwrap();
        let with = calculate_bitrate(FULL_HD, 30, 0.10, 0.55, true, true, 1.0).unwrap();

        assert_eq!(with, round2(without + AUDIO_BITRATE_KBPS));
    }

    #[test]
    fn h265_beats_h264() {
        let h264 = calculate_bitrate(3840 * 2160, 15, 0.10, 0.82, true, false, 1.0).unwrap();
        let h265 = calculate_bitrate(3840 * 2160, 15, 0.07, 0.82, true, false, 1.0).unwrap();

        assert!(h265 < h264);
    }

    #[test]
    fn legacy_quality_remap() {
        // legacy low end: 0.6 -> 0.1, legacy 1.0 passes through
        assert!((normalize_quality_multiplier(0.6) - 0.1).abs() < 1e-9);
        assert_eq!(normalize_quality_multiplier(1.0), 1.0);
        // legacy high/best end maps into the upper canonical range
        assert!((normalize_quality_multiplier(1.4) - 0.64).abs() < 1e-9);
        assert!((normalize_quality_multiplier(2.0) - 0.775).abs() < 1e-9);
    }

    #[test]
    fn manual_override_skips_formula() {
        assert_eq!(manual_bitrate(2500.0, false).unwrap(), 2500.0);
        assert_eq!(manual_bitrate(2500.0, true).unwrap(), 2564.0);
        assert!(manual_bitrate(0.0, false).is_err());
    }

    #[test]
    fn peak_bitrate_default_margin() {
        assert_eq!(max_bitrate(2000.0, 20.0).unwrap(), 2400.0);
        assert!(max_bitrate(-1.0, 20.0).is_err());
        assert!(max_bitrate(100.0, -5.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(calculate_bitrate(0, 30, 0.10, 0.55, true, false, 1.0).is_err());
        assert!(calculate_bitrate(FULL_HD, 0, 0.10, 0.55, true, false, 1.0).is_err());
        assert!(calculate_bitrate(FULL_HD, 101, 0.10, 0.55, true, false, 1.0).is_err());
        assert!(calculate_bitrate(FULL_HD, 30, 0.0, 0.55, true, false, 1.0).is_err());
        assert!(calculate_bitrate(FULL_HD, 30, 0.10, 0.0, true, false, 1.0).is_err());
    }

    proptest! {
        #[test]
        fn bitrate_always_positive(
            area in 100_000u64..=16_000_000,
            fps in 1u32..=100,
            compression in 0.01f64..=0.5,
        ) {
            let result = calculate_bitrate(area, fps, compression, 1.0, true, false, 1.0).unwrap();
            prop_assert!(result > 0.0);
        }

        // Areas below ~2MP can produce per-fps deltas under the 2-decimal
        // rounding step, so the strictness range starts at full HD scale.
        #[test]
        fn higher_fps_increases_bitrate(
            area in 2_000_000u64..=16_000_000,
            fps in 1u32..100,
        ) {
            let lower = calculate_bitrate(area, fps, 0.10, 1.0, true, false, 1.0).unwrap();
            let higher = calculate_bitrate(area, fps + 1, 0.10, 1.0, true, false, 1.0).unwrap();
            prop_assert!(higher > lower);
        }

        #[test]
        fn larger_area_increases_bitrate(
            area in 2_000_000u64..=8_000_000,
            fps in 1u32..=100,
        ) {
            let smaller = calculate_bitrate(area, fps, 0.10, 1.0, true, false, 1.0).unwrap();
            let larger = calculate_bitrate(area * 2, fps, 0.10, 1.0, true, false, 1.0).unwrap();
            prop_assert!(larger > smaller);
        }
    }
}
