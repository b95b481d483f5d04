// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::ProgressBar;
use log::info;

use super::calculator::RoiCalculator;
use super::collector::{collector_from_config, read_metrics_file, MetricsCollector};
use super::models::InfrastructureMetrics;
use super::report;
use crate::app_config::{
    AnalysisConfig, AssessmentConfig, AwsService, CompleteAppConfig, CostModelConfig,
};

pub const HTML_REPORT_NAME: &str = "cloudops_roi_assessment.html";
pub const JSON_REPORT_NAME: &str = "cloudops_roi_assessment.json";

/// Command-line overrides for values in the assessment config.
#[derive(Debug, Default)]
pub struct AnalysisOverrides {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub services: Option<Vec<AwsService>>,
}

impl AnalysisOverrides {
    fn apply(self, config: &mut AssessmentConfig) {
        if let Some(start_date) = self.start_date {
            config.analysis.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            config.analysis.end_date = end_date;
        }
        if let Some(services) = self.services {
            config.aws_services = services;
        }
    }
}

fn load_assessment_config(
    config: config::Config,
    overrides: AnalysisOverrides,
) -> Result<AssessmentConfig> {
    let mut assessment =
        AssessmentConfig::from_config(&config).context("Invalid assessment configuration")?;
    overrides.apply(&mut assessment);
    assessment.analysis.validate()?;
    Ok(assessment)
}

async fn collect_with_progress(
    collector: &dyn MetricsCollector,
    analysis: &AnalysisConfig,
) -> Result<InfrastructureMetrics> {
    info!(
        "Collecting infrastructure metrics for {} to {}",
        analysis.start_date, analysis.end_date
    );
    // Hidden automatically when stderr isn't a terminal
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Collecting infrastructure metrics...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let metrics = collector
        .collect_infrastructure_metrics(analysis.start_date, analysis.end_date)
        .await;
    spinner.finish_and_clear();
    metrics
}

/// Collect metrics, calculate ROI, print the summary and write reports to
/// `output_dir`.
pub async fn assess(
    config: config::Config,
    overrides: AnalysisOverrides,
    output_dir: &Path,
) -> Result<()> {
    let assessment = load_assessment_config(config, overrides)?;
    info!("Starting CloudOps ROI assessment");

    let collector = collector_from_config(&assessment.data_source)?;
    let metrics = collect_with_progress(collector.as_ref(), &assessment.analysis).await?;

    info!("Calculating ROI for {:?}", assessment.aws_services);
    let calculator = RoiCalculator::new(assessment.pricing, assessment.assumptions);
    let analysis = calculator.calculate_migration_roi(
        &metrics,
        &assessment.aws_services,
        assessment.analysis.timeline_months,
    )?;

    info!("Generating reports");
    println!("{}", report::generate_executive_summary(&analysis));

    let html_path = output_dir.join(HTML_REPORT_NAME);
    report::generate_html_report(&analysis, &metrics, &html_path)?;
    report::write_json_report(&analysis, &metrics, &output_dir.join(JSON_REPORT_NAME))?;

    println!(
        "Assessment complete! Report saved to {}",
        html_path.display()
    );
    println!();
    println!("{}", report::key_findings(&analysis));
    Ok(())
}

/// Collect metrics only, writing them as JSON to `output` or stdout.
pub async fn collect(
    config: config::Config,
    overrides: AnalysisOverrides,
    output: Option<PathBuf>,
) -> Result<()> {
    let assessment = load_assessment_config(config, overrides)?;
    let collector = collector_from_config(&assessment.data_source)?;
    let metrics = collect_with_progress(collector.as_ref(), &assessment.analysis).await?;

    let contents = serde_json::to_string_pretty(&metrics)?;
    match output {
        Some(path) => {
            fs::write(&path, contents)
                .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            println!("Metrics saved to {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

/// Calculate ROI from a metrics file without contacting any data source.
pub fn calculate(
    config: config::Config,
    metrics_path: &Path,
    services: Option<Vec<AwsService>>,
    timeline_months: u32,
    as_json: bool,
) -> Result<()> {
    let cost_model =
        CostModelConfig::from_config(&config).context("Invalid cost model configuration")?;
    let metrics = read_metrics_file(metrics_path)?;
    let services = services.unwrap_or(cost_model.aws_services);

    let calculator = RoiCalculator::new(cost_model.pricing, cost_model.assumptions);
    let analysis = calculator.calculate_migration_roi(&metrics, &services, timeline_months)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", report::generate_executive_summary(&analysis));
        println!("{}", report::key_findings(&analysis));
    }
    Ok(())
}

/// Show the effective AWS price table
pub fn print_pricing(config: config::Config) -> Result<()> {
    let cost_model = CostModelConfig::from_config(&config)?;
    println!("{}", toml::to_string(&cost_model.pricing)?);
    Ok(())
}

/// Show the configuration file
pub fn print_config(config: config::Config) -> Result<()> {
    let app_config: CompleteAppConfig = config.try_deserialize()?;
    println!("{}", toml::to_string(&app_config.masked())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    use super::*;

    fn datadog_config(site: &str, extra: &str) -> Config {
        let contents = format!(
            r#"
            [data_source]
            type = "datadog"
            api_key = "abc"
            app_key = "def"
            site = "{}"

            [analysis]
            start_date = "2024-01-01"
            end_date = "2024-12-31"
            {}
            "#,
            site, extra
        );
        Config::builder()
            .add_source(File::from_str(&contents, FileFormat::Toml))
            .build()
            .unwrap()
    }

    fn mock_datadog(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/hosts");
            then.status(200).json_body(json!({
                "host_list": [{"host_name": "web-1"}, {"host_name": "web-2"}],
                "total_matching": 2,
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/query");
            then.status(200).json_body(json!({"series": []}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/dashboard");
            then.status(200).json_body(json!({"dashboards": []}));
        });
    }

    #[test]
    fn test_overrides_apply() {
        let mut assessment =
            AssessmentConfig::from_config(&datadog_config("http://localhost", "")).unwrap();
        let overrides = AnalysisOverrides {
            start_date: Some(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()),
            end_date: None,
            services: Some(vec![AwsService::Config]),
        };
        overrides.apply(&mut assessment);
        assert_eq!(
            assessment.analysis.start_date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(
            assessment.analysis.end_date,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(assessment.aws_services, vec![AwsService::Config]);
    }

    #[test]
    fn test_override_dates_are_validated() {
        let overrides = AnalysisOverrides {
            end_date: Some(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()),
            ..Default::default()
        };
        let e = load_assessment_config(datadog_config("http://localhost", ""), overrides)
            .unwrap_err()
            .to_string();
        assert!(e.contains("is before analysis.start_date"));
    }

    #[tokio::test]
    async fn test_assess_writes_reports() {
        let server = MockServer::start();
        mock_datadog(&server);
        let output_dir =
            std::env::temp_dir().join(format!("cloudops-roi-assess-{}", std::process::id()));

        assess(
            datadog_config(&server.base_url(), "timeline_months = 12"),
            AnalysisOverrides::default(),
            &output_dir,
        )
        .await
        .unwrap();

        let html = fs::read_to_string(output_dir.join(HTML_REPORT_NAME)).unwrap();
        assert!(html.contains("12-month savings"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output_dir.join(JSON_REPORT_NAME)).unwrap())
                .unwrap();
        assert_eq!(json["metrics"]["total_instances"], 2);
        // No error series means the default incident estimate
        assert_eq!(json["metrics"]["annual_downtime_hours"], 48.0);
        assert_eq!(json["analysis"]["timeline_months"], 12);

        fs::remove_dir_all(&output_dir).unwrap();
    }

    #[tokio::test]
    async fn test_collect_writes_metrics_file() {
        let server = MockServer::start();
        mock_datadog(&server);
        let output = std::env::temp_dir().join(format!(
            "cloudops-roi-collect-{}.json",
            std::process::id()
        ));

        collect(
            datadog_config(&server.base_url(), ""),
            AnalysisOverrides::default(),
            Some(output.clone()),
        )
        .await
        .unwrap();

        // Collected metrics can be fed back into `calculate`
        let metrics = read_metrics_file(&output).unwrap();
        assert_eq!(metrics.total_instances, 2);
        assert_eq!(metrics.dashboards, 15);

        fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_invalid_config_names_property() {
        let config = datadog_config("http://localhost", "timeline_months = \"soon\"");
        let e = load_assessment_config(config, AnalysisOverrides::default()).unwrap_err();
        assert_eq!(e.to_string(), "Invalid assessment configuration");
        assert!(format!("{:#}", e).contains("\"analysis.timeline_months\""));
    }

    #[test]
    fn test_calculate_missing_metrics_file() {
        let e = calculate(
            Config::default(),
            Path::new("thisfiledoesnotexist.json"),
            None,
            36,
            false,
        )
        .unwrap_err();
        assert!(e.to_string().contains("Failed to read metrics file"));
    }
}
