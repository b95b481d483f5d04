// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! ROI model for migrating operations tooling to AWS CloudOps services.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use log::debug;

use super::models::{BusinessCase, CostBreakdown, InfrastructureMetrics, RoiAnalysis};
use crate::app_config::{Assumptions, AwsPricing, AwsService};

#[derive(Debug, Default)]
pub struct RoiCalculator {
    pricing: AwsPricing,
    assumptions: Assumptions,
}

impl RoiCalculator {
    pub fn new(pricing: AwsPricing, assumptions: Assumptions) -> Self {
        Self {
            pricing,
            assumptions,
        }
    }

    /// Calculate the ROI of migrating to `services` over `timeline_months`.
    ///
    /// Duplicate services are counted once.
    ///
    /// # Errors
    ///
    /// Returns an error if the migration cost works out non-positive (only
    /// possible with overridden assumptions) or if `timeline_months` is 0.
    pub fn calculate_migration_roi(
        &self,
        metrics: &InfrastructureMetrics,
        services: &[AwsService],
        timeline_months: u32,
    ) -> Result<RoiAnalysis> {
        if timeline_months == 0 {
            bail!("Timeline must be at least one month");
        }
        let services: BTreeSet<AwsService> = services.iter().copied().collect();

        let current_annual_cost = self.current_costs(metrics);
        let aws_annual_cost = self.aws_costs(metrics, &services);
        let operational_savings = self.operational_savings(metrics);
        let risk_mitigation_value = self.risk_mitigation(metrics);
        let migration_cost = self.migration_costs(metrics, &services);
        debug!(
            "current={} aws={} operational={} risk={} migration={}",
            current_annual_cost,
            aws_annual_cost,
            operational_savings,
            risk_mitigation_value,
            migration_cost
        );
        if migration_cost <= 0.0 {
            bail!(
                "Migration cost must be positive to compute ROI, got {}",
                migration_cost
            );
        }

        let infrastructure_savings = current_annual_cost - aws_annual_cost;
        let annual_savings = infrastructure_savings + operational_savings + risk_mitigation_value;
        let three_year_savings = annual_savings * 3.0;
        let three_year_roi = (three_year_savings - migration_cost) / migration_cost;
        let break_even_months = if annual_savings > 0.0 {
            Some(migration_cost / (annual_savings / 12.0))
        } else {
            None
        };
        let timeline_savings = annual_savings * f64::from(timeline_months) / 12.0;
        let timeline_roi = (timeline_savings - migration_cost) / migration_cost;

        Ok(RoiAnalysis {
            current_annual_cost,
            aws_annual_cost,
            annual_savings,
            three_year_savings,
            migration_cost,
            three_year_roi,
            break_even_months,
            timeline_months,
            timeline_savings,
            timeline_roi,
            operational_savings,
            risk_mitigation_value,
            cost_breakdown: CostBreakdown {
                infrastructure_savings,
                productivity_gains: operational_savings,
                risk_reduction: risk_mitigation_value,
            },
            business_case: BusinessCase::from_roi(three_year_roi),
        })
    }

    /// Annual cost of operating the current stack.
    fn current_costs(&self, m: &InfrastructureMetrics) -> f64 {
        m.monitoring_tool_licenses
            + m.server_costs
            + m.ops_staff_cost * self.assumptions.staff_monitoring_share
            + m.annual_downtime_hours * m.hourly_revenue_impact
    }

    /// Projected annual AWS bill for the selected services.
    fn aws_costs(&self, m: &InfrastructureMetrics, services: &BTreeSet<AwsService>) -> f64 {
        services
            .iter()
            .map(|service| self.aws_monthly_cost(m, *service) * 12.0)
            .sum()
    }

    fn aws_monthly_cost(&self, m: &InfrastructureMetrics, service: AwsService) -> f64 {
        match service {
            AwsService::CloudWatch => {
                let p = &self.pricing.cloudwatch;
                m.total_metrics as f64 * p.metrics
                    + m.log_volume_gb_monthly * p.logs_ingestion
                    + m.dashboards as f64 * p.dashboard
            }
            AwsService::SystemsManager => {
                let p = &self.pricing.systems_manager;
                let instances = m.total_instances as f64;
                instances * p.patch_management
                    + instances * p.inventory
                    + m.monthly_automations as f64 * p.automation
            }
            AwsService::Config => {
                let p = &self.pricing.config;
                m.configuration_items as f64 * p.configuration_items
                    + m.compliance_checks_monthly as f64 * p.rules
            }
        }
    }

    /// Annual engineer time saved by faster incident resolution.
    fn operational_savings(&self, m: &InfrastructureMetrics) -> f64 {
        let current_mttr = m.mean_time_to_resolution_hours;
        let projected_mttr = current_mttr * (1.0 - self.assumptions.mttr_improvement);
        let monthly_savings =
            m.monthly_incidents as f64 * (current_mttr - projected_mttr) * m.engineer_hourly_cost;
        monthly_savings * 12.0
    }

    /// Annual value of fewer compliance violations and security incidents.
    fn risk_mitigation(&self, m: &InfrastructureMetrics) -> f64 {
        m.annual_compliance_violations as f64
            * m.compliance_violation_cost
            * self.assumptions.compliance_improvement
            + m.annual_security_incidents as f64
                * m.security_incident_cost
                * self.assumptions.security_improvement
    }

    /// One-time implementation and training cost.
    fn migration_costs(&self, m: &InfrastructureMetrics, services: &BTreeSet<AwsService>) -> f64 {
        let a = &self.assumptions;
        let mut complexity_multiplier = 1.0;
        if m.total_instances > a.large_estate_threshold {
            complexity_multiplier *= a.large_estate_multiplier;
        }
        if services.len() > a.multi_service_threshold {
            complexity_multiplier *= a.multi_service_multiplier;
        }
        let training_cost = m.ops_team_size as f64 * a.training_cost_per_engineer;

        a.base_migration_cost * complexity_multiplier + training_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    /// What the DataDog collector reports for a 100-host estate.
    fn datadog_metrics() -> InfrastructureMetrics {
        InfrastructureMetrics {
            total_instances: 100,
            monitoring_tool_licenses: 27_600.0,
            ops_staff_cost: 120_000.0,
            engineer_hourly_cost: 100.0,
            ops_team_size: 1,
            monthly_incidents: 2,
            annual_downtime_hours: 48.0,
            mean_time_to_resolution_hours: 4.0,
            hourly_revenue_impact: 10_000.0,
            total_metrics: 150,
            dashboards: 15,
            log_volume_gb_monthly: 120.0,
            log_ingestion_rate_gb_day: 4.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_migration() {
        let analysis = RoiCalculator::default()
            .calculate_migration_roi(&datadog_metrics(), &AwsService::all(), 36)
            .unwrap();

        assert_close(analysis.current_annual_cost, 543_600.0);
        assert_close(analysis.aws_annual_cost, 1_953.96);
        assert_close(analysis.operational_savings, 5_760.0);
        assert_close(analysis.risk_mitigation_value, 150_000.0);
        // Three services triggers the multi-service multiplier
        assert_close(analysis.migration_cost, 62_000.0);
        assert_close(analysis.annual_savings, 697_406.04);
        assert_close(analysis.three_year_savings, 2_092_218.12);
        assert_close(analysis.three_year_roi, 2_030_218.12 / 62_000.0);
        assert_close(
            analysis.break_even_months.unwrap(),
            62_000.0 / (697_406.04 / 12.0),
        );
        assert_close(
            analysis.cost_breakdown.infrastructure_savings,
            543_600.0 - 1_953.96,
        );
        assert_eq!(analysis.business_case, BusinessCase::Strong);
        // 36 months is the same as the three-year figures
        assert_close(analysis.timeline_savings, analysis.three_year_savings);
        assert_close(analysis.timeline_roi, analysis.three_year_roi);
    }

    #[test]
    fn test_cloudwatch_only() {
        let analysis = RoiCalculator::default()
            .calculate_migration_roi(&datadog_metrics(), &[AwsService::CloudWatch], 12)
            .unwrap();

        assert_close(analysis.aws_annual_cost, 1_800.0);
        assert_close(analysis.migration_cost, 52_000.0);
        assert_close(analysis.timeline_savings, analysis.annual_savings);
    }

    #[test]
    fn test_duplicate_services_counted_once() {
        let calculator = RoiCalculator::default();
        let once = calculator
            .calculate_migration_roi(
                &datadog_metrics(),
                &[AwsService::CloudWatch, AwsService::Config],
                36,
            )
            .unwrap();
        let twice = calculator
            .calculate_migration_roi(
                &datadog_metrics(),
                &[
                    AwsService::CloudWatch,
                    AwsService::Config,
                    AwsService::CloudWatch,
                ],
                36,
            )
            .unwrap();
        assert_eq!(once, twice);
        assert_close(twice.migration_cost, 52_000.0);
    }

    #[test]
    fn test_large_estate_multiplier() {
        let metrics = InfrastructureMetrics {
            total_instances: 501,
            ops_team_size: 5,
            ..Default::default()
        };
        let analysis = RoiCalculator::default()
            .calculate_migration_roi(&metrics, &AwsService::all(), 36)
            .unwrap();
        assert_close(analysis.migration_cost, 50_000.0 * 1.5 * 1.2 + 10_000.0);
    }

    #[test]
    fn test_no_savings_never_breaks_even() {
        let metrics = InfrastructureMetrics {
            monthly_incidents: 0,
            annual_compliance_violations: 0,
            annual_security_incidents: 0,
            ..Default::default()
        };
        let analysis = RoiCalculator::default()
            .calculate_migration_roi(&metrics, &[AwsService::CloudWatch], 36)
            .unwrap();

        // Nothing to save, only the AWS bill
        assert!(analysis.annual_savings < 0.0);
        assert_eq!(analysis.break_even_months, None);
        assert!(analysis.three_year_roi < -1.0);
        assert_eq!(analysis.business_case, BusinessCase::Weak);
    }

    #[test]
    fn test_custom_pricing_and_assumptions() {
        let mut pricing = AwsPricing::default();
        pricing.cloudwatch.metrics = 0.0;
        pricing.cloudwatch.logs_ingestion = 0.0;
        pricing.cloudwatch.dashboard = 1.0;
        let assumptions = Assumptions {
            mttr_improvement: 0.5,
            ..Default::default()
        };
        let analysis = RoiCalculator::new(pricing, assumptions)
            .calculate_migration_roi(&datadog_metrics(), &[AwsService::CloudWatch], 36)
            .unwrap();

        assert_close(analysis.aws_annual_cost, 15.0 * 12.0);
        assert_close(analysis.operational_savings, 2.0 * 2.0 * 100.0 * 12.0);
    }

    #[test]
    fn test_zero_migration_cost_rejected() {
        let assumptions = Assumptions {
            base_migration_cost: 0.0,
            training_cost_per_engineer: 0.0,
            ..Default::default()
        };
        let e = RoiCalculator::new(AwsPricing::default(), assumptions)
            .calculate_migration_roi(&datadog_metrics(), &[], 36)
            .unwrap_err();
        assert!(e.to_string().contains("Migration cost must be positive"));
    }

    #[test]
    fn test_zero_timeline_rejected() {
        assert!(RoiCalculator::default()
            .calculate_migration_roi(&datadog_metrics(), &AwsService::all(), 0)
            .is_err());
    }
}
