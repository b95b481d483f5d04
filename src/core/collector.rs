// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Collection of current-estate metrics from a data source.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};

use super::api::datadog::{self, DatadogApiConfig};
use super::models::{InfrastructureMetrics, MetricQuery};
use crate::app_config::{DataSource, DataSourceChoices};

/// Monthly per-host list price of DataDog Pro.
const DATADOG_PRO_HOST_MONTHLY: f64 = 23.0;
/// Error rate above which a datapoint counts as an incident.
const INCIDENT_ERROR_RATE_THRESHOLD: f64 = 0.05;
/// Incidents assumed when the error-rate query returns no series.
const DEFAULT_INCIDENTS: u64 = 24;
const AVG_INCIDENT_DURATION_HOURS: f64 = 2.0;
const MTTR_HOURS: f64 = 4.0;
const HOURLY_REVENUE_IMPACT: f64 = 10_000.0;
const METRICS_PER_HOST_ESTIMATE: u64 = 150;
const DEFAULT_CPU_UTILIZATION: f64 = 65.0;
const DEFAULT_MEMORY_UTILIZATION: f64 = 70.0;
const DEFAULT_DASHBOARDS: u64 = 15;
/// Monthly log volume per host, including a 20% buffer over ~1GB.
const LOG_GB_PER_HOST_MONTHLY: f64 = 1.2;
const LOG_RETENTION_DAYS: u64 = 30;
const OPS_STAFF_COST: f64 = 120_000.0;
const ENGINEER_HOURLY_COST: f64 = 100.0;
const HOSTS_PER_ENGINEER: u64 = 100;

const ERROR_RATE_QUERY: &str = "avg:trace.flask.request.errors{*}.as_rate()";
const CPU_QUERY: &str = "avg:system.cpu.user{*}";
const MEMORY_QUERY: &str = "avg:system.mem.pct_usable{*}";

/// A source of current-estate metrics.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    async fn collect_infrastructure_metrics(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<InfrastructureMetrics>;
}

/// Build the collector for the configured data source.
pub fn collector_from_config(source: &DataSource) -> Result<Box<dyn MetricsCollector>> {
    match source.source_type {
        DataSourceChoices::Datadog => {
            let keys = source.datadog_keys()?;
            let api = match source.timeout {
                Some(timeout) => DatadogApiConfig::new_with_params(
                    keys.site,
                    &keys.api_key,
                    &keys.app_key,
                    timeout,
                )?,
                None => DatadogApiConfig::new(keys.site, &keys.api_key, &keys.app_key)?,
            };
            Ok(Box::new(DatadogCollector::new(api)))
        }
        DataSourceChoices::File => Ok(Box::new(FileCollector::new(source.metrics_path()?))),
    }
}

/// Unix timestamp of midnight UTC on the given date.
fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Incident, downtime and resolution figures.
#[derive(Debug, PartialEq)]
struct IncidentData {
    monthly_incidents: u64,
    annual_downtime_hours: f64,
    mean_time_to_resolution_hours: f64,
    hourly_revenue_impact: f64,
}

impl Default for IncidentData {
    fn default() -> Self {
        Self {
            monthly_incidents: 20,
            annual_downtime_hours: 48.0,
            mean_time_to_resolution_hours: MTTR_HOURS,
            hourly_revenue_impact: HOURLY_REVENUE_IMPACT,
        }
    }
}

impl IncidentData {
    fn from_error_rate(errors: &MetricQuery) -> Self {
        let incidents = match errors.series.first() {
            Some(series) => series
                .values()
                .filter(|rate| *rate > INCIDENT_ERROR_RATE_THRESHOLD)
                .count() as u64,
            None => DEFAULT_INCIDENTS,
        };
        Self {
            monthly_incidents: incidents / 12,
            annual_downtime_hours: incidents as f64 * AVG_INCIDENT_DURATION_HOURS,
            mean_time_to_resolution_hours: MTTR_HOURS,
            hourly_revenue_impact: HOURLY_REVENUE_IMPACT,
        }
    }
}

#[derive(Debug, PartialEq)]
struct PerformanceData {
    total_metrics: u64,
    avg_cpu_utilization: f64,
    avg_memory_utilization: f64,
    dashboards: u64,
}

impl Default for PerformanceData {
    fn default() -> Self {
        Self {
            total_metrics: METRICS_PER_HOST_ESTIMATE,
            avg_cpu_utilization: DEFAULT_CPU_UTILIZATION,
            avg_memory_utilization: DEFAULT_MEMORY_UTILIZATION,
            dashboards: DEFAULT_DASHBOARDS,
        }
    }
}

/// Collects metrics from DataDog, falling back to industry estimates where a
/// query fails or has no data.
pub struct DatadogCollector {
    api: DatadogApiConfig,
}

impl DatadogCollector {
    pub fn new(api: DatadogApiConfig) -> Self {
        Self { api }
    }

    async fn incident_data(&self, from: i64, to: i64) -> IncidentData {
        match datadog::metric_query(&self.api, from, to, ERROR_RATE_QUERY).await {
            Ok(errors) => IncidentData::from_error_rate(&errors),
            Err(e) => {
                warn!("Error rate query failed, using incident estimates: {:#}", e);
                IncidentData::default()
            }
        }
    }

    async fn performance_data(&self, from: i64, to: i64) -> PerformanceData {
        let cpu = datadog::metric_query(&self.api, from, to, CPU_QUERY);
        let memory = datadog::metric_query(&self.api, from, to, MEMORY_QUERY);
        let (cpu, memory) = match futures::try_join!(cpu, memory) {
            Ok(results) => results,
            Err(e) => {
                warn!("Performance queries failed, using estimates: {:#}", e);
                return PerformanceData::default();
            }
        };

        let dashboards = match datadog::dashboards_list(&self.api).await {
            Ok(list) if !list.dashboards.is_empty() => list.dashboards.len() as u64,
            Ok(_) => DEFAULT_DASHBOARDS,
            Err(e) => {
                warn!("Dashboard listing failed, using estimate: {:#}", e);
                DEFAULT_DASHBOARDS
            }
        };

        PerformanceData {
            total_metrics: METRICS_PER_HOST_ESTIMATE,
            avg_cpu_utilization: cpu
                .series
                .first()
                .and_then(|s| s.mean())
                .unwrap_or(DEFAULT_CPU_UTILIZATION),
            // pct_usable is the usable fraction, so utilization is its complement
            avg_memory_utilization: memory
                .series
                .first()
                .and_then(|s| s.mean())
                .map(|usable| (1.0 - usable) * 100.0)
                .unwrap_or(DEFAULT_MEMORY_UTILIZATION),
            dashboards,
        }
    }
}

#[async_trait]
impl MetricsCollector for DatadogCollector {
    async fn collect_infrastructure_metrics(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<InfrastructureMetrics> {
        let from = day_start_timestamp(start_date);
        let to = day_start_timestamp(end_date);
        debug!("collecting DataDog metrics for [{}, {}]", from, to);

        let hosts = datadog::hosts_all(&self.api)
            .await
            .context("Failed to list DataDog hosts")?;
        let host_count = hosts.len() as u64;
        info!("DataDog reports {} hosts", host_count);

        let (incidents, performance) = futures::join!(
            self.incident_data(from, to),
            self.performance_data(from, to)
        );

        let log_volume_gb_monthly = host_count as f64 * LOG_GB_PER_HOST_MONTHLY;

        Ok(InfrastructureMetrics {
            total_instances: host_count,
            monitoring_tool_licenses: host_count as f64 * DATADOG_PRO_HOST_MONTHLY * 12.0,
            ops_staff_cost: OPS_STAFF_COST,
            engineer_hourly_cost: ENGINEER_HOURLY_COST,
            ops_team_size: std::cmp::max(1, host_count / HOSTS_PER_ENGINEER),
            monthly_incidents: incidents.monthly_incidents,
            annual_downtime_hours: incidents.annual_downtime_hours,
            mean_time_to_resolution_hours: incidents.mean_time_to_resolution_hours,
            hourly_revenue_impact: incidents.hourly_revenue_impact,
            total_metrics: performance.total_metrics,
            avg_cpu_utilization: performance.avg_cpu_utilization,
            avg_memory_utilization: performance.avg_memory_utilization,
            dashboards: performance.dashboards,
            log_volume_gb_monthly,
            log_retention_days: LOG_RETENTION_DAYS,
            log_ingestion_rate_gb_day: log_volume_gb_monthly / LOG_RETENTION_DAYS as f64,
            ..Default::default()
        })
    }
}

/// Reads metrics from a JSON, TOML or YAML file.
pub struct FileCollector {
    path: PathBuf,
}

impl FileCollector {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Load metrics from a file, with format chosen by extension.
///
/// # Errors
///
/// Returns an error if the file is missing or its contents don't match
/// [InfrastructureMetrics].
pub fn read_metrics_file(path: &Path) -> Result<InfrastructureMetrics> {
    let metrics = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .and_then(|c| c.try_deserialize::<InfrastructureMetrics>())
        .with_context(|| format!("Failed to read metrics file {}", path.display()))?;
    Ok(metrics)
}

#[async_trait]
impl MetricsCollector for FileCollector {
    async fn collect_infrastructure_metrics(
        &self,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<InfrastructureMetrics> {
        debug!("reading metrics from {}", self.path.display());
        read_metrics_file(&self.path)
    }
}
