// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Human-readable output of an ROI analysis: terminal summary, HTML and JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use super::models::{InfrastructureMetrics, RoiAnalysis};

/// Format a dollar amount with thousands separators and no cents, e.g.
/// `-$1,234`.
pub fn format_currency(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    // Avoid "-$0" for tiny negative amounts
    if amount < 0.0 && grouped != "0" {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Format a ratio as a percentage with one decimal, e.g. `0.123` as `12.3%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn format_break_even(months: Option<f64>) -> String {
    match months {
        Some(months) => format!("{:.1} months", months),
        None => "never".to_owned(),
    }
}

/// Executive summary suitable for printing to a terminal.
pub fn generate_executive_summary(analysis: &RoiAnalysis) -> String {
    let breakdown = &analysis.cost_breakdown;
    format!(
        "CloudOps Migration ROI Executive Summary
========================================

Financial Impact:
  - Annual Cost Savings: {}
  - 3-Year ROI: {}
  - Break-even Point: {}
  - Migration Investment: {}

Key Benefits:
  - Infrastructure Cost Reduction: {}/year
  - Operational Efficiency Gains: {}/year
  - Risk Mitigation Value: {}/year

Business Case: {}
",
        format_currency(analysis.annual_savings),
        format_percent(analysis.three_year_roi),
        format_break_even(analysis.break_even_months),
        format_currency(analysis.migration_cost),
        format_currency(breakdown.infrastructure_savings),
        format_currency(breakdown.productivity_gains),
        format_currency(breakdown.risk_reduction),
        analysis.business_case,
    )
}

/// Short list of the headline numbers.
pub fn key_findings(analysis: &RoiAnalysis) -> String {
    format!(
        "Key Findings:
  - 3-Year ROI: {}
  - Annual Savings: {}
  - Break-even: {}",
        format_percent(analysis.three_year_roi),
        format_currency(analysis.annual_savings),
        format_break_even(analysis.break_even_months),
    )
}

fn html_row(label: &str, value: &str) -> String {
    format!("<tr><th>{}</th><td>{}</td></tr>\n", label, value)
}

/// Render the standalone HTML report.
pub fn render_html_report(analysis: &RoiAnalysis, metrics: &InfrastructureMetrics) -> String {
    let breakdown = &analysis.cost_breakdown;
    let timeline_savings_label = format!("{}-month savings", analysis.timeline_months);
    let timeline_roi_label = format!("{}-month ROI", analysis.timeline_months);
    let mut financial = String::new();
    for (label, value) in [
        ("Current annual cost", format_currency(analysis.current_annual_cost)),
        ("Projected AWS annual cost", format_currency(analysis.aws_annual_cost)),
        ("Annual savings", format_currency(analysis.annual_savings)),
        ("3-year savings", format_currency(analysis.three_year_savings)),
        ("Migration investment", format_currency(analysis.migration_cost)),
        ("3-year ROI", format_percent(analysis.three_year_roi)),
        ("Break-even", format_break_even(analysis.break_even_months)),
        (
            timeline_savings_label.as_str(),
            format_currency(analysis.timeline_savings),
        ),
        (
            timeline_roi_label.as_str(),
            format_percent(analysis.timeline_roi),
        ),
    ] {
        financial.push_str(&html_row(label, &value));
    }

    let mut benefits = String::new();
    for (label, value) in [
        ("Infrastructure cost reduction", breakdown.infrastructure_savings),
        ("Operational efficiency gains", breakdown.productivity_gains),
        ("Risk mitigation value", breakdown.risk_reduction),
    ] {
        benefits.push_str(&html_row(label, &format!("{}/year", format_currency(value))));
    }

    // Metrics are listed generically so new fields show up without edits here
    let mut inputs = String::new();
    if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(metrics) {
        for (name, value) in fields {
            inputs.push_str(&html_row(&name, &value.to_string()));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>CloudOps Migration ROI Assessment</title>
<style>
body {{ font-family: sans-serif; margin: 2em auto; max-width: 50em; color: #222; }}
table {{ border-collapse: collapse; width: 100%; margin-bottom: 2em; }}
th, td {{ border-bottom: 1px solid #ddd; padding: 0.4em; text-align: left; }}
td {{ text-align: right; font-variant-numeric: tabular-nums; }}
.case {{ font-size: 1.4em; font-weight: bold; }}
</style>
</head>
<body>
<h1>CloudOps Migration ROI Assessment</h1>
<p class="case">Business Case: {case}</p>
<h2>Financial Impact</h2>
<table>
{financial}</table>
<h2>Key Benefits</h2>
<table>
{benefits}</table>
<h2>Current Infrastructure Metrics</h2>
<table>
{inputs}</table>
</body>
</html>
"#,
        case = analysis.business_case,
        financial = financial,
        benefits = benefits,
        inputs = inputs,
    )
}

/// Write the HTML report, creating parent directories as needed.
pub fn generate_html_report(
    analysis: &RoiAnalysis,
    metrics: &InfrastructureMetrics,
    path: &Path,
) -> Result<()> {
    create_parent(path)?;
    fs::write(path, render_html_report(analysis, metrics))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    debug!("wrote html report to {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metrics: &'a InfrastructureMetrics,
    analysis: &'a RoiAnalysis,
}

/// Write metrics and analysis as pretty JSON.
pub fn write_json_report(
    analysis: &RoiAnalysis,
    metrics: &InfrastructureMetrics,
    path: &Path,
) -> Result<()> {
    create_parent(path)?;
    let contents = serde_json::to_string_pretty(&JsonReport { metrics, analysis })?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    debug!("wrote json report to {}", path.display());
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
