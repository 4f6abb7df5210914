//! Built-in catalog entries, usable without any external configuration file.
//! Compression factors and quality multipliers follow the vendor sizing
//! tables; quality multipliers are on the legacy 0.6-2.0 scale and get
//! normalized by the bitrate estimator.

use indexmap::IndexMap;

use super::{
    Catalog, CodecProfile, CpuVariantProfile, RaidProfile, ResolutionProfile, ServerTierProfile,
};

fn quality_multipliers(low: f64, medium: f64, high: f64, best: f64) -> IndexMap<String, f64> {
    IndexMap::from([
        ("low".into(), low),
        ("medium".into(), medium),
        ("high".into(), high),
        ("best".into(), best),
    ])
}

fn codec(
    name: &str,
    compression_factor: f64,
    power_function: bool,
    multipliers: IndexMap<String, f64>,
) -> CodecProfile {
    CodecProfile {
        name: name.into(),
        compression_factor,
        power_function,
        quality_multipliers: multipliers,
    }
}

fn resolution(name: &str, area_px: u64) -> ResolutionProfile {
    ResolutionProfile {
        name: name.into(),
        area_px,
    }
}

fn raid(name: &str, usable_pct: f64, min_drives: u32, fault_tolerance: u32) -> RaidProfile {
    RaidProfile {
        name: name.into(),
        usable_pct,
        min_drives,
        fault_tolerance,
    }
}

fn cpu(name: &str, os_ram_mb: u32, max_cameras: u32, nic_bitrate_mbps: f64) -> CpuVariantProfile {
    CpuVariantProfile {
        name: name.into(),
        os_ram_mb,
        max_cameras,
        nic_bitrate_mbps,
    }
}

pub(super) fn builtin() -> Catalog {
    let codecs = IndexMap::from([
        (
            "h264".into(),
            codec("H.264", 0.10, true, quality_multipliers(0.6, 1.0, 1.4, 2.0)),
        ),
        (
            "h264_plus".into(),
            codec(
                "H.264+",
                0.08,
                true,
                quality_multipliers(0.6, 1.0, 1.4, 2.0),
            ),
        ),
        (
            "h265".into(),
            codec("H.265", 0.07, true, quality_multipliers(0.6, 1.0, 1.4, 2.0)),
        ),
        (
            "mjpeg".into(),
            codec("MJPEG", 0.35, false, quality_multipliers(0.6, 1.0, 1.4, 2.0)),
        ),
    ]);

    let resolutions = IndexMap::from([
        ("vga".into(), resolution("VGA (640x480)", 640 * 480)),
        ("1mp_720p".into(), resolution("1MP (HD 720p)", 1280 * 720)),
        (
            "2mp_1080p".into(),
            resolution("2MP (Full HD 1080p)", 1920 * 1080),
        ),
        ("3mp".into(), resolution("3MP (2048x1536)", 2048 * 1536)),
        ("4mp_1440p".into(), resolution("4MP (QHD 1440p)", 2560 * 1440)),
        ("5mp".into(), resolution("5MP (2592x1944)", 2592 * 1944)),
        ("8mp_4k".into(), resolution("8MP (4K UHD)", 3840 * 2160)),
        ("12mp".into(), resolution("12MP (4000x3000)", 4000 * 3000)),
    ]);

    let raid_types = IndexMap::from([
        ("none".into(), raid("No RAID", 100.0, 1, 0)),
        ("raid0".into(), raid("RAID 0", 100.0, 2, 0)),
        ("raid1".into(), raid("RAID 1", 50.0, 2, 1)),
        ("raid5".into(), raid("RAID 5", 75.0, 3, 1)),
        ("raid6".into(), raid("RAID 6", 66.7, 4, 2)),
        ("raid10".into(), raid("RAID 10", 50.0, 4, 1)),
    ]);

    let cpu_variants = IndexMap::from([
        ("arm".into(), cpu("ARM", 128, 12, 64.0)),
        ("atom".into(), cpu("Intel Atom", 1024, 32, 600.0)),
        ("core_i3".into(), cpu("Intel Core i3", 1024, 128, 600.0)),
        ("core_i5".into(), cpu("Intel Core i5", 1024, 256, 600.0)),
    ]);

    let server_tiers = vec![
        ServerTierProfile {
            id: "nvr_compact".into(),
            name: "Compact NVR".into(),
            max_devices: 32,
            max_bitrate_mbps: 80.0,
            cpu_model: "Intel Atom C3538".into(),
            ram_gb: 8,
            storage_type: "2x HDD".into(),
            recommended_raid: "raid1".into(),
            nic_count: 1,
            nic_speed_mbps: 1000.0,
            use_case: "Small retail and office sites".into(),
        },
        ServerTierProfile {
            id: "workstation".into(),
            name: "Workstation".into(),
            max_devices: 128,
            max_bitrate_mbps: 300.0,
            cpu_model: "Intel Core i3-12100".into(),
            ram_gb: 16,
            storage_type: "4x HDD".into(),
            recommended_raid: "raid5".into(),
            nic_count: 1,
            nic_speed_mbps: 1000.0,
            use_case: "Mid-size single-server deployments".into(),
        },
        ServerTierProfile {
            id: "rack_1u".into(),
            name: "1U Rack Server".into(),
            max_devices: 256,
            max_bitrate_mbps: 600.0,
            cpu_model: "Intel Core i5-13500".into(),
            ram_gb: 32,
            storage_type: "8x HDD".into(),
            recommended_raid: "raid5".into(),
            nic_count: 2,
            nic_speed_mbps: 1000.0,
            use_case: "Large single-site deployments".into(),
        },
        ServerTierProfile {
            id: "rack_2u".into(),
            name: "2U Rack Server".into(),
            max_devices: 512,
            max_bitrate_mbps: 2000.0,
            cpu_model: "Intel Xeon Silver 4410Y".into(),
            ram_gb: 64,
            storage_type: "12x HDD".into(),
            recommended_raid: "raid6".into(),
            nic_count: 2,
            nic_speed_mbps: 10000.0,
            use_case: "High-density recording clusters".into(),
        },
    ];

    Catalog {
        codecs,
        resolutions,
        raid_types,
        cpu_variants,
        server_tiers,
    }
}
