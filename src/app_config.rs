// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use config::{Config, ConfigError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{Display, EnumString, EnumVariantNames};
use url::Url;

/// Default DataDog API endpoint (US1 site).
pub const DEFAULT_DATADOG_SITE: &str = "https://api.datadoghq.com";

/// Where infrastructure metrics are collected from.
#[derive(EnumVariantNames, EnumString, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DataSourceChoices {
    #[strum(serialize = "datadog")]
    #[serde(rename = "datadog")]
    Datadog,
    /// A metrics file previously written by `collect` (or by hand).
    #[strum(serialize = "file")]
    #[serde(rename = "file")]
    File,
}

/// AWS CloudOps services that can be priced as migration targets.
#[derive(
    Display,
    EnumVariantNames,
    EnumString,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum AwsService {
    #[strum(serialize = "cloudwatch")]
    #[serde(rename = "cloudwatch")]
    CloudWatch,
    #[strum(serialize = "systems_manager")]
    #[serde(rename = "systems_manager")]
    SystemsManager,
    #[strum(serialize = "config")]
    #[serde(rename = "config")]
    Config,
}

impl AwsService {
    pub fn all() -> Vec<AwsService> {
        vec![
            AwsService::CloudWatch,
            AwsService::SystemsManager,
            AwsService::Config,
        ]
    }
}

/// Used only for `config` subcommand to show all config.
///
/// Every section is optional here so a partial or broken config can still be
/// displayed. Commands deserialize the narrower structs below instead.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteAppConfig {
    // Must precede the tables or TOML serialization fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_services: Option<Vec<AwsService>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,
    #[serde(default)]
    pub pricing: AwsPricing,
    #[serde(default)]
    pub assumptions: Assumptions,
}

impl CompleteAppConfig {
    /// Copy of the config that is safe to print.
    pub fn masked(self) -> Self {
        Self {
            data_source: self.data_source.map(DataSource::masked),
            ..self
        }
    }
}

/// Deserialize the value at `key`, or `None` if it isn't set.
fn optional_property<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>> {
    match config.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Invalid configuration property \"{}\"", key)),
    }
}

fn required_property<T: DeserializeOwned>(config: &Config, key: &str) -> Result<T> {
    optional_property(config, key)?
        .ok_or_else(|| anyhow!("configuration property \"{}\" not found", key))
}

fn date_property(config: &Config, key: &str) -> Result<NaiveDate> {
    let value: String = required_property(config, key)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").with_context(|| {
        format!(
            "configuration property \"{}\" must be a YYYY-MM-DD date, got \"{}\"",
            key, value
        )
    })
}

/// Read `aws_services`, defaulting to every priced service.
fn services_property(config: &Config) -> Result<Vec<AwsService>> {
    let names: Option<Vec<String>> = optional_property(config, "aws_services")?;
    match names {
        Some(names) => names
            .iter()
            .map(|name| {
                AwsService::from_str(name).map_err(|_| {
                    anyhow!(
                        "configuration property \"aws_services\" has unknown service \"{}\" \
                         (expected one of {})",
                        name,
                        AwsService::VARIANTS.join(", ")
                    )
                })
            })
            .collect(),
        None => Ok(AwsService::all()),
    }
}

/// Config needed by the commands that talk to a data source.
#[derive(Debug)]
pub struct AssessmentConfig {
    pub data_source: DataSource,
    pub analysis: AnalysisConfig,
    pub aws_services: Vec<AwsService>,
    pub pricing: AwsPricing,
    pub assumptions: Assumptions,
}

impl AssessmentConfig {
    /// Read and check each section, naming the offending property on error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cost_model = CostModelConfig::from_config(config)?;
        Ok(Self {
            data_source: DataSource::from_config(config)?,
            analysis: AnalysisConfig::from_config(config)?,
            aws_services: cost_model.aws_services,
            pricing: cost_model.pricing,
            assumptions: cost_model.assumptions,
        })
    }
}

/// Config needed for offline calculation: only the cost model.
#[derive(Debug)]
pub struct CostModelConfig {
    pub aws_services: Vec<AwsService>,
    pub pricing: AwsPricing,
    pub assumptions: Assumptions,
}

impl CostModelConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            aws_services: services_property(config)?,
            pricing: optional_property(config, "pricing")?.unwrap_or_default(),
            assumptions: optional_property(config, "assumptions")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: DataSourceChoices,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// HTTP timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DataSource {
    fn from_config(config: &Config) -> Result<Self> {
        let source_type: String = required_property(config, "data_source.type")?;
        DataSourceChoices::from_str(&source_type).map_err(|_| {
            anyhow!(
                "configuration property \"data_source.type\" has unknown source \"{}\" \
                 (expected one of {})",
                source_type,
                DataSourceChoices::VARIANTS.join(", ")
            )
        })?;
        required_property(config, "data_source")
    }

    fn masked(self) -> Self {
        let mask = |key: Option<String>| key.map(|_| "********".to_owned());
        Self {
            api_key: mask(self.api_key),
            app_key: mask(self.app_key),
            ..self
        }
    }

    /// Credentials and endpoint for a DataDog data source.
    pub fn datadog_keys(&self) -> Result<DatadogKeys> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("configuration property \"data_source.api_key\" not found"))?;
        let app_key = self
            .app_key
            .clone()
            .ok_or_else(|| anyhow!("configuration property \"data_source.app_key\" not found"))?;
        let site = self.site.as_deref().unwrap_or(DEFAULT_DATADOG_SITE);
        let site = Url::parse(site)
            .with_context(|| format!("data_source.site is not a valid URL: {}", site))?;
        Ok(DatadogKeys {
            api_key,
            app_key,
            site,
        })
    }

    pub fn metrics_path(&self) -> Result<PathBuf> {
        self.path
            .clone()
            .ok_or_else(|| anyhow!("configuration property \"data_source.path\" not found"))
    }
}

#[derive(Debug)]
pub struct DatadogKeys {
    pub api_key: String,
    pub app_key: String,
    pub site: Url,
}

fn default_timeline_months() -> u32 {
    36
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_timeline_months")]
    pub timeline_months: u32,
}

impl AnalysisConfig {
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            start_date: date_property(config, "analysis.start_date")?,
            end_date: date_property(config, "analysis.end_date")?,
            timeline_months: optional_property(config, "analysis.timeline_months")?
                .unwrap_or_else(default_timeline_months),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            bail!(
                "analysis.end_date ({}) is before analysis.start_date ({})",
                self.end_date,
                self.start_date
            );
        }
        if self.timeline_months == 0 {
            bail!("analysis.timeline_months must be at least 1");
        }
        Ok(())
    }
}

/// Monthly AWS list prices in USD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsPricing {
    pub cloudwatch: CloudWatchPricing,
    pub systems_manager: SystemsManagerPricing,
    pub config: ConfigPricing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudWatchPricing {
    /// Per custom metric
    pub metrics: f64,
    /// Per GB ingested
    pub logs_ingestion: f64,
    /// Per dashboard
    pub dashboard: f64,
}

impl Default for CloudWatchPricing {
    fn default() -> Self {
        Self {
            metrics: 0.30,
            logs_ingestion: 0.50,
            dashboard: 3.00,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemsManagerPricing {
    /// Per instance
    pub patch_management: f64,
    /// Per instance
    pub inventory: f64,
    /// Per automation execution
    pub automation: f64,
}

impl Default for SystemsManagerPricing {
    fn default() -> Self {
        Self {
            patch_management: 0.09,
            inventory: 0.0033,
            automation: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPricing {
    /// Per configuration item recorded
    pub configuration_items: f64,
    /// Per rule evaluation
    pub rules: f64,
}

impl Default for ConfigPricing {
    fn default() -> Self {
        Self {
            configuration_items: 0.003,
            rules: 0.001,
        }
    }
}

/// Ratios and one-off costs the ROI model relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    /// Share of ops staff time spent on monitoring.
    pub staff_monitoring_share: f64,
    /// Fractional MTTR reduction after migration.
    pub mttr_improvement: f64,
    pub compliance_improvement: f64,
    pub security_improvement: f64,
    pub base_migration_cost: f64,
    pub large_estate_threshold: u64,
    pub large_estate_multiplier: f64,
    pub multi_service_threshold: usize,
    pub multi_service_multiplier: f64,
    pub training_cost_per_engineer: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            staff_monitoring_share: 0.3,
            mttr_improvement: 0.6,
            compliance_improvement: 0.8,
            security_improvement: 0.7,
            base_migration_cost: 50_000.0,
            large_estate_threshold: 500,
            large_estate_multiplier: 1.5,
            multi_service_threshold: 2,
            multi_service_multiplier: 1.2,
            training_cost_per_engineer: 2_000.0,
        }
    }
}
