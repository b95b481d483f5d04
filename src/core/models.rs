// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Serialization of DataDog API responses and of assessment inputs/outputs.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// One page of the DataDog host search.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HostList {
    pub host_list: Vec<Host>,
    /// Total hosts matching the search, across all pages.
    #[serde(default)]
    pub total_matching: Option<u64>,
}

/// A host reporting to DataDog. Only the fields used for reporting are kept.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub host_name: Option<String>,
    /// Missing means DataDog didn't report a status; treated as up.
    #[serde(default)]
    pub up: Option<bool>,
}

/// Timeseries query response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MetricQuery {
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Series {
    /// `[timestamp_ms, value]` pairs. DataDog sends `null` for gaps.
    pub pointlist: Vec<(f64, Option<f64>)>,
}

impl Series {
    /// Points with a value, gaps skipped.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.pointlist.iter().filter_map(|(_, value)| *value)
    }

    /// Mean of the non-null points, or `None` if there are none.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .values()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DashboardList {
    #[serde(default)]
    pub dashboards: Vec<serde_json::Value>,
}

/// Snapshot of the current estate that the ROI model is computed from.
///
/// Every field has a default so partial metrics files are accepted. Counts are
/// integers, money is USD and durations are hours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureMetrics {
    pub total_instances: u64,
    /// Annual spend on monitoring tool licenses.
    pub monitoring_tool_licenses: f64,
    /// Annual infrastructure spend.
    pub server_costs: f64,
    /// Annual cost of operations staff.
    pub ops_staff_cost: f64,
    pub engineer_hourly_cost: f64,
    pub ops_team_size: u64,

    pub monthly_incidents: u64,
    pub annual_downtime_hours: f64,
    pub mean_time_to_resolution_hours: f64,
    /// Revenue lost per hour of downtime.
    pub hourly_revenue_impact: f64,

    pub total_metrics: u64,
    /// Percent
    pub avg_cpu_utilization: f64,
    /// Percent
    pub avg_memory_utilization: f64,
    pub dashboards: u64,

    pub log_volume_gb_monthly: f64,
    pub log_retention_days: u64,
    pub log_ingestion_rate_gb_day: f64,

    pub monthly_automations: u64,
    pub configuration_items: u64,
    pub compliance_checks_monthly: u64,
    pub annual_compliance_violations: u64,
    pub compliance_violation_cost: f64,
    pub annual_security_incidents: u64,
    pub security_incident_cost: f64,
}

impl Default for InfrastructureMetrics {
    fn default() -> Self {
        Self {
            total_instances: 100,
            monitoring_tool_licenses: 0.0,
            server_costs: 0.0,
            ops_staff_cost: 0.0,
            engineer_hourly_cost: 100.0,
            ops_team_size: 5,
            monthly_incidents: 20,
            annual_downtime_hours: 0.0,
            mean_time_to_resolution_hours: 4.0,
            hourly_revenue_impact: 0.0,
            total_metrics: 100,
            avg_cpu_utilization: 65.0,
            avg_memory_utilization: 70.0,
            dashboards: 10,
            log_volume_gb_monthly: 50.0,
            log_retention_days: 30,
            log_ingestion_rate_gb_day: 0.0,
            monthly_automations: 50,
            configuration_items: 500,
            compliance_checks_monthly: 1000,
            annual_compliance_violations: 2,
            compliance_violation_cost: 50_000.0,
            annual_security_incidents: 1,
            security_incident_cost: 100_000.0,
        }
    }
}

/// Strength of the migration business case, judged on three-year ROI.
#[derive(Clone, Copy, Debug, PartialEq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BusinessCase {
    Strong,
    Moderate,
    Weak,
}

impl BusinessCase {
    pub fn from_roi(three_year_roi: f64) -> Self {
        if three_year_roi > 1.0 {
            BusinessCase::Strong
        } else if three_year_roi > 0.3 {
            BusinessCase::Moderate
        } else {
            BusinessCase::Weak
        }
    }
}

/// Where the annual savings come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub infrastructure_savings: f64,
    pub productivity_gains: f64,
    pub risk_reduction: f64,
}

/// Result of an ROI calculation. All amounts are USD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    pub current_annual_cost: f64,
    pub aws_annual_cost: f64,
    pub annual_savings: f64,
    pub three_year_savings: f64,
    /// One-time cost of migrating and training.
    pub migration_cost: f64,
    /// Ratio, e.g. `1.5` is 150%.
    pub three_year_roi: f64,
    /// `None` if savings never pay back the migration.
    pub break_even_months: Option<f64>,
    pub timeline_months: u32,
    pub timeline_savings: f64,
    pub timeline_roi: f64,
    pub operational_savings: f64,
    pub risk_mitigation_value: f64,
    pub cost_breakdown: CostBreakdown,
    pub business_case: BusinessCase,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_series_mean_skips_nulls() {
        let series: Series = serde_json::from_value(json!({
            "pointlist": [[1000.0, 1.0], [2000.0, null], [3000.0, 3.0]]
        }))
        .unwrap();
        assert_eq!(series.values().count(), 2);
        assert_eq!(series.mean(), Some(2.0));
    }

    #[test]
    fn test_series_mean_empty() {
        let series = Series {
            pointlist: vec![(1000.0, None)],
        };
        assert_eq!(series.mean(), None);
    }

    #[test]
    fn test_partial_metrics_use_defaults() {
        let metrics: InfrastructureMetrics = serde_json::from_value(json!({
            "total_instances": 640,
            "server_costs": 250000.0
        }))
        .unwrap();
        assert_eq!(metrics.total_instances, 640);
        assert_eq!(metrics.server_costs, 250_000.0);
        assert_eq!(metrics.ops_team_size, 5);
        assert_eq!(metrics.configuration_items, 500);
        assert_eq!(metrics.security_incident_cost, 100_000.0);
    }

    #[test]
    fn test_business_case_thresholds() {
        assert_eq!(BusinessCase::from_roi(1.01), BusinessCase::Strong);
        assert_eq!(BusinessCase::from_roi(1.0), BusinessCase::Moderate);
        assert_eq!(BusinessCase::from_roi(0.31), BusinessCase::Moderate);
        assert_eq!(BusinessCase::from_roi(0.3), BusinessCase::Weak);
        assert_eq!(BusinessCase::from_roi(-2.0), BusinessCase::Weak);
        assert_eq!(BusinessCase::Strong.to_string(), "STRONG");
    }
}
