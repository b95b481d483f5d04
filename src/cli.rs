// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{crate_authors, crate_description, crate_version};
use clap::{Arg, ArgMatches, Command};
use strum::VariantNames;

use crate::app_config::AwsService;
use crate::core::commands;

/// Parse repeated `--service` flags. `None` if none were given.
fn services_arg(matches: &ArgMatches) -> Result<Option<Vec<AwsService>>> {
    match matches.values_of("service") {
        Some(values) => Ok(Some(
            values
                .map(AwsService::from_str)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        None => Ok(None),
    }
}

fn date_arg(matches: &ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    match matches.value_of(name) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .with_context(|| {
                format!(
                    "--{} must be a YYYY-MM-DD date, got \"{}\"",
                    name.replace('_', "-"),
                    value
                )
            }),
        None => Ok(None),
    }
}

fn overrides_arg(matches: &ArgMatches) -> Result<commands::AnalysisOverrides> {
    Ok(commands::AnalysisOverrides {
        start_date: date_arg(matches, "start_date")?,
        end_date: date_arg(matches, "end_date")?,
        services: services_arg(matches)?,
    })
}

/// Match commands
#[tokio::main]
pub async fn cli_match(config: config::Config, cli_matches: ArgMatches) -> Result<()> {
    match cli_matches.subcommand() {
        // Handled first-class because it doesn't need valid configuration, and
        // is helpful for debugging bad config!
        Some(("config", _config_matches)) => commands::print_config(config)?,
        Some(("pricing", _pricing_matches)) => commands::print_pricing(config)?,
        Some(("calculate", calculate_matches)) => {
            // Safe to unwrap because arguments are required or have defaults
            let metrics = calculate_matches.value_of("metrics").unwrap();
            let timeline_months: u32 = calculate_matches
                .value_of_t("timeline_months")
                .unwrap_or_else(|e| e.exit());
            commands::calculate(
                config,
                Path::new(metrics),
                services_arg(calculate_matches)?,
                timeline_months,
                calculate_matches.is_present("json"),
            )?;
        }
        Some(("collect", collect_matches)) => {
            let output = collect_matches.value_of("output").map(PathBuf::from);
            commands::collect(config, overrides_arg(collect_matches)?, output).await?;
        }
        Some(("assess", assess_matches)) => {
            let output_dir = assess_matches.value_of("output").unwrap();
            commands::assess(
                config,
                overrides_arg(assess_matches)?,
                Path::new(output_dir),
            )
            .await?;
        }
        _ => {
            // Arguments are required by default (in Clap).
            // This section should never execute.
            unreachable!("No matching subcommand!");
        }
    }
    Ok(())
}

fn service_arg() -> Arg<'static> {
    Arg::new("service")
        .short('s')
        .long("service")
        .value_name("SERVICE")
        .help("AWS service to migrate to (repeatable, overrides config)")
        .takes_value(true)
        .multiple_occurrences(true)
        .possible_values(AwsService::VARIANTS.iter().copied())
}

fn date_range_args() -> [Arg<'static>; 2] {
    [
        Arg::new("start_date")
            .long("start-date")
            .value_name("YYYY-MM-DD")
            .help("Start of the analysis period (overrides config)")
            .takes_value(true),
        Arg::new("end_date")
            .long("end-date")
            .value_name("YYYY-MM-DD")
            .help("End of the analysis period (overrides config)")
            .takes_value(true),
    ]
}

/// Configure Clap
pub fn build_cli() -> Command<'static> {
    Command::new("cloudops-roi")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .version(crate_version!())
        .about(crate_description!())
        .author(crate_authors!("\n"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Set a custom config file")
                .takes_value(true)
                .global(true),
        )
        .subcommand(
            Command::new("assess")
                .about("Collect metrics, calculate ROI and write reports")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Directory to write reports to")
                        .default_value("reports")
                        .takes_value(true),
                )
                .args(date_range_args())
                .arg(service_arg()),
        )
        .subcommand(
            Command::new("calculate")
                .about("Calculate ROI from a metrics file, without a data source")
                .arg(
                    Arg::new("metrics")
                        .short('m')
                        .long("metrics")
                        .value_name("FILE")
                        .help("Metrics file (JSON, TOML or YAML)")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::new("timeline_months")
                        .short('t')
                        .long("timeline-months")
                        .value_name("MONTHS")
                        .help("Analysis timeline")
                        .default_value("36")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the full analysis as JSON"),
                )
                .arg(service_arg()),
        )
        .subcommand(
            Command::new("collect")
                .about("Collect current infrastructure metrics as JSON")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write metrics to a file instead of stdout")
                        .takes_value(true),
                )
                .args(date_range_args()),
        )
        .subcommand(Command::new("pricing").about("Show AWS unit prices used"))
        .subcommand(Command::new("config").about("Show Configuration"))
}

/// Parse command-line arguments.
pub fn cli_config() -> Result<ArgMatches> {
    let cli_matches = build_cli().get_matches();
    Ok(cli_matches)
}
