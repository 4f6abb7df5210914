//! Multi-site distribution: partition an aggregate deployment across
//! physical sites bounded by per-site device and server caps, running the
//! full sizing pipeline per site.
//!
//! The device partition is a greedy left-to-right fill. Sites are filled to
//! capacity in order and the last site takes the remainder, which can leave
//! it far under capacity. Camera groups are consumed in their original order
//! and split across site boundaries as reduced-count clones.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Error, Result};

use super::types::{CalculationRequest, CalculationResult, CameraGroupSpec, ServerConstraints};
use super::{calculate, round2, servers};

pub const DEFAULT_MAX_DEVICES_PER_SITE: u32 = 2560;
pub const DEFAULT_MAX_SERVERS_PER_SITE: u32 = 10;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MultiSiteRequest {
    pub camera_groups: Vec<CameraGroupSpec>,
    pub retention_days: u32,
    #[serde(default)]
    pub server_constraints: ServerConstraints,
    #[serde(default = "default_max_devices_per_site")]
    pub max_devices_per_site: u32,
    #[serde(default = "default_max_servers_per_site")]
    pub max_servers_per_site: u32,
}

fn default_max_devices_per_site() -> u32 {
    DEFAULT_MAX_DEVICES_PER_SITE
}

fn default_max_servers_per_site() -> u32 {
    DEFAULT_MAX_SERVERS_PER_SITE
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SitePlan {
    pub sites_needed: u32,
    pub devices_per_site: Vec<u32>,
    pub total_devices: u32,
    pub average_devices_per_site: f64,
}

/// How many sites a device count needs, and the greedy per-site fill.
pub fn sites_needed(total_devices: u32, max_devices_per_site: u32) -> Result<SitePlan> {
    if total_devices < 1 {
        return Err(Error::invalid("total devices must be at least 1"));
    }
    if max_devices_per_site < 1 {
        return Err(Error::invalid("max devices per site must be at least 1"));
    }

    let count = total_devices.div_ceil(max_devices_per_site);

    let mut devices_per_site = Vec::with_capacity(count as usize);
    let mut remaining = total_devices;

    for i in 0..count {
        if i == count - 1 {
            devices_per_site.push(remaining);
        } else {
            devices_per_site.push(max_devices_per_site);
            remaining -= max_devices_per_site;
        }
    }

    Ok(SitePlan {
        sites_needed: count,
        devices_per_site,
        total_devices,
        average_devices_per_site: round2(total_devices as f64 / count as f64),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SiteValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub utilization_pct: f64,
}

/// Validate one site against its caps. Exceeding a cap is an error; sitting
/// above 90% of the device cap or 80% of the server cap is a warning.
pub fn validate_site(
    devices: u32,
    servers: u32,
    max_devices_per_site: u32,
    max_servers_per_site: u32,
    max_devices_per_server: u32,
) -> SiteValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if devices > max_devices_per_site {
        errors.push(format!(
            "Site has {devices} devices, exceeds maximum of {max_devices_per_site}"
        ));
    }

    if servers > max_servers_per_site {
        errors.push(format!(
            "Site has {servers} servers, exceeds maximum of {max_servers_per_site}"
        ));
    }

    let server_capacity = servers * max_devices_per_server;
    if devices > server_capacity {
        errors.push(format!(
            "Site has {devices} devices but only {servers} servers (max capacity: \
             {server_capacity} devices)"
        ));
    }

    if devices as f64 > max_devices_per_site as f64 * 0.9 {
        warnings.push(format!(
            "Site is at {:.0}% capacity",
            devices as f64 / max_devices_per_site as f64 * 100.0
        ));
    }

    if servers as f64 > max_servers_per_site as f64 * 0.8 {
        warnings.push(format!(
            "Site is using {servers}/{max_servers_per_site} servers (80%+ utilization)"
        ));
    }

    SiteValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        utilization_pct: round2(devices as f64 / max_devices_per_site as f64 * 100.0),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SiteAllocation {
    pub site_index: u32,
    pub site_name: String,
    pub device_count: u32,
    pub assigned_groups: Vec<CameraGroupSpec>,
    pub result: CalculationResult,
    pub validation: SiteValidation,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MultiSiteSummary {
    pub total_sites: u32,
    pub total_devices: u32,
    pub total_bitrate_mbps: f64,
    pub total_storage_tb: f64,
    pub total_servers: u32,
    pub average_devices_per_site: f64,
    pub max_devices_per_site: u32,
    pub max_servers_per_site: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MultiSiteResult {
    pub sites: Vec<SiteAllocation>,
    pub summary: MultiSiteSummary,
    pub all_sites_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Distribute the deployment across sites and size each one.
///
/// Hard failures (unknown catalog ids, malformed groups) abort the whole
/// request; a site merely violating its caps is reported in its validation
/// and the remaining sites are still computed.
pub fn distribute(request: &MultiSiteRequest, catalog: &Catalog) -> Result<MultiSiteResult> {
    let total_devices: u32 = request.camera_groups.iter().map(|g| g.count).sum();
    let plan = sites_needed(total_devices, request.max_devices_per_site)?;

    info!(
        total_devices,
        sites = plan.sites_needed,
        "distributing deployment across sites"
    );

    let mut remaining: Vec<u32> = request.camera_groups.iter().map(|g| g.count).collect();
    let mut cursor = 0usize;
    let mut sites = Vec::with_capacity(plan.devices_per_site.len());

    for (index, site_capacity) in plan.devices_per_site.iter().enumerate() {
        let mut assigned: Vec<CameraGroupSpec> = Vec::new();
        let mut site_devices = 0u32;

        // consume groups in order, splitting the one straddling the boundary
        while site_devices < *site_capacity && cursor < remaining.len() {
            let take = remaining[cursor].min(site_capacity - site_devices);

            if take > 0 {
                let mut split = request.camera_groups[cursor].clone();
                split.count = take;
                assigned.push(split);

                site_devices += take;
                remaining[cursor] -= take;
            }

            if remaining[cursor] == 0 {
                cursor += 1;
            }
        }

        let site_request = CalculationRequest {
            camera_groups: assigned.clone(),
            retention_days: request.retention_days,
            server_constraints: request.server_constraints.clone(),
        };
        let result = calculate(&site_request, catalog)?;

        let validation = validate_site(
            site_devices,
            result.summary.servers_with_failover,
            request.max_devices_per_site,
            request.max_servers_per_site,
            servers::DEFAULT_MAX_DEVICES_PER_SERVER,
        );

        sites.push(SiteAllocation {
            site_index: index as u32 + 1,
            site_name: format!("Site {}", index + 1),
            device_count: site_devices,
            assigned_groups: assigned,
            result,
            validation,
        });
    }

    let warnings = sites
        .iter()
        .flat_map(|site| {
            site.validation
                .warnings
                .iter()
                .map(move |w| format!("Site {}: {w}", site.site_index))
        })
        .collect_vec();
    let errors = sites
        .iter()
        .flat_map(|site| {
            site.validation
                .errors
                .iter()
                .map(move |e| format!("Site {}: {e}", site.site_index))
        })
        .collect_vec();

    let summary = MultiSiteSummary {
        total_sites: plan.sites_needed,
        total_devices,
        total_bitrate_mbps: round2(
            sites
                .iter()
                .map(|s| s.result.summary.total_bitrate_mbps)
                .sum(),
        ),
        total_storage_tb: round2(
            sites
                .iter()
                .map(|s| s.result.summary.total_storage_tb)
                .sum(),
        ),
        total_servers: sites
            .iter()
            .map(|s| s.result.summary.servers_with_failover)
            .sum(),
        average_devices_per_site: plan.average_devices_per_site,
        max_devices_per_site: request.max_devices_per_site,
        max_servers_per_site: request.max_servers_per_site,
    };

    let all_sites_valid = sites.iter().all(|s| s.validation.is_valid);

    Ok(MultiSiteResult {
        sites,
        summary,
        all_sites_valid,
        warnings,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::super::types::{QualityLevel, RecordingMode};
    use super::*;

    fn manual_group(count: u32, kbps: f64) -> CameraGroupSpec {
        CameraGroupSpec {
            count,
            resolution_id: None,
            resolution_area_px: None,
            fps: 30,
            codec_id: "h264".into(),
            quality: QualityLevel::Medium,
            manual_bitrate_kbps: Some(kbps),
            recording_mode: RecordingMode::Continuous,
            scheduled_hours: None,
            audio_enabled: false,
            recorded: true,
        }
    }

    fn request(groups: Vec<CameraGroupSpec>, max_devices: u32, max_servers: u32) -> MultiSiteRequest {
        MultiSiteRequest {
            camera_groups: groups,
            retention_days: 14,
            server_constraints: ServerConstraints::default(),
            max_devices_per_site: max_devices,
            max_servers_per_site: max_servers,
        }
    }

    #[test]
    fn site_plan_fill_examples() {
        let plan = sites_needed(1000, 2560).unwrap();
        assert_eq!(plan.sites_needed, 1);
        assert_eq!(plan.devices_per_site, vec![1000]);

        let plan = sites_needed(2560, 2560).unwrap();
        assert_eq!(plan.devices_per_site, vec![2560]);

        let plan = sites_needed(3000, 2560).unwrap();
        assert_eq!(plan.sites_needed, 2);
        assert_eq!(plan.devices_per_site, vec![2560, 440]);

        let plan = sites_needed(10000, 2560).unwrap();
        assert_eq!(plan.devices_per_site, vec![2560, 2560, 2560, 2320]);

        assert!(sites_needed(0, 2560).is_err());
        assert!(sites_needed(100, 0).is_err());
    }

    #[test]
    fn groups_split_across_site_boundaries() {
        let groups = vec![manual_group(1500, 2000.0), manual_group(1500, 4000.0)];
        let result = distribute(&request(groups, 2000, 100), &Catalog::builtin()).unwrap();

        assert_eq!(result.sites.len(), 2);

        // site 1: all of group 1 plus 500 cameras split off group 2
        let first = &result.sites[0];
        assert_eq!(first.device_count, 2000);
        assert_eq!(
            first.assigned_groups.iter().map(|g| g.count).collect_vec(),
            vec![1500, 500]
        );
        assert_eq!(first.assigned_groups[1].manual_bitrate_kbps, Some(4000.0));

        // site 2: the remainder of group 2
        let second = &result.sites[1];
        assert_eq!(second.device_count, 1000);
        assert_eq!(
            second.assigned_groups.iter().map(|g| g.count).collect_vec(),
            vec![1000]
        );
    }

    #[test]
    fn devices_are_conserved() {
        let groups = vec![manual_group(700, 2000.0), manual_group(1301, 3000.0)];
        let result = distribute(&request(groups, 300, 100), &Catalog::builtin()).unwrap();

        let allocated: u32 = result.sites.iter().map(|s| s.device_count).sum();
        assert_eq!(allocated, 2001);
        assert_eq!(result.summary.total_devices, 2001);
    }

    #[test]
    fn invalid_site_does_not_block_the_others() {
        // 600 devices across two 300-device sites, each needing more servers
        // than the cap of 1 allows
        let groups = vec![manual_group(600, 4000.0)];
        let result = distribute(&request(groups, 300, 1), &Catalog::builtin()).unwrap();

        assert_eq!(result.sites.len(), 2);
        assert!(!result.all_sites_valid);
        assert!(result.sites.iter().all(|s| !s.validation.is_valid));
        assert!(!result.errors.is_empty());
        assert!(result.errors[0].starts_with("Site 1:"));
    }

    #[test]
    fn summary_aggregates_sites() {
        let groups = vec![manual_group(100, 2000.0)];
        let result = distribute(&request(groups, 50, 100), &Catalog::builtin()).unwrap();

        assert_eq!(result.summary.total_sites, 2);
        assert_eq!(
            result.summary.total_bitrate_mbps,
            round2(
                result
                    .sites
                    .iter()
                    .map(|s| s.result.summary.total_bitrate_mbps)
                    .sum()
            )
        );
        assert!(result.summary.total_servers >= 2);
        assert!(result.all_sites_valid);
    }

    #[test]
    fn site_validation_thresholds() {
        let ok = validate_site(100, 1, 2560, 10, 256);
        assert!(ok.is_valid);
        assert!(ok.warnings.is_empty());

        let near_cap = validate_site(2400, 10, 2560, 10, 256);
        assert!(near_cap.is_valid);
        assert_eq!(near_cap.warnings.len(), 2);

        let over_devices = validate_site(3000, 12, 2560, 10, 256);
        assert!(!over_devices.is_valid);
        assert_eq!(over_devices.errors.len(), 2);

        let under_provisioned = validate_site(600, 2, 2560, 10, 256);
        assert!(!under_provisioned.is_valid);
        assert!(under_provisioned.errors[0].contains("max capacity"));
    }

    #[test]
    fn unknown_codec_aborts_every_site() {
        let mut group = manual_group(100, 2000.0);
        group.manual_bitrate_kbps = None;
        group.resolution_id = Some("2mp_1080p".into());
        group.codec_id = "av1".into();

        let result = distribute(&request(vec![group], 50, 100), &Catalog::builtin());
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    proptest! {
        #[test]
        fn conservation_holds_for_any_partition(
            counts in prop::collection::vec(1u32..=200, 1..4),
            max_devices_per_site in 1u32..=100,
        ) {
            let groups = counts.iter().map(|c| manual_group(*c, 2000.0)).collect();
            let result = distribute(
                &request(groups, max_devices_per_site, 10_000),
                &Catalog::builtin(),
            ).unwrap();

            let total: u32 = counts.iter().sum();
            let allocated: u32 = result.sites.iter().map(|s| s.device_count).sum();
            prop_assert_eq!(allocated, total);

            let group_total: u32 = result
                .sites
                .iter()
                .flat_map(|s| s.assigned_groups.iter().map(|g| g.count))
                .sum();
            prop_assert_eq!(group_total, total);
        }

        #[test]
        fn plan_fill_is_greedy_left_to_right(
            total in 1u32..=50_000,
            max in 1u32..=5000,
        ) {
            let plan = sites_needed(total, max).unwrap();

            prop_assert_eq!(plan.devices_per_site.iter().sum::<u32>(), total);
            // every site except the last is filled to capacity
            for site in &plan.devices_per_site[..plan.devices_per_site.len() - 1] {
                prop_assert_eq!(*site, max);
            }
            prop_assert!(*plan.devices_per_site.last().unwrap() <= max);
            prop_assert!(*plan.devices_per_site.last().unwrap() >= 1);
        }
    }
}
