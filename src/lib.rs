//! cloudops-roi is a Command Line Interface (CLI) for estimating the return on
//! investment of moving operations tooling (monitoring, patching and
//! configuration compliance) from DataDog to AWS CloudOps services:
//! CloudWatch, Systems Manager and Config.
//!
//! cloudops-roi collects the size and behaviour of your current estate from
//! DataDog, prices the current stack and the projected AWS stack, adds the
//! value of faster incident resolution and reduced compliance/security risk,
//! and weighs the result against a one-time migration cost.
//!
//! # Usage
//!
//! View CLI help with `cloudops-roi help` or `cloudops-roi help <subcommand>`.
//!
//! ## Configuration
//!
//! cloudops-roi reads an assessment configuration file. Either:
//!
//! - Place the configuration file at `~/.config/cloudops_roi/assessment.toml`
//! - Use the `--config path/to/assessment.toml` flag
//!
//! TOML, YAML and JSON files are accepted (chosen by file extension). A
//! minimal configuration:
//!
//! ```toml
//! aws_services = ["cloudwatch", "systems_manager", "config"]
//!
//! [data_source]
//! type = "datadog"
//! api_key = "<DataDog API key>"
//! app_key = "<DataDog application key>"
//! # site = "https://api.datadoghq.eu"
//!
//! [analysis]
//! start_date = "2024-01-01"
//! end_date = "2024-12-31"
//! timeline_months = 36
//! ```
//!
//! AWS unit prices can be overridden under `[pricing.cloudwatch]`,
//! `[pricing.systems_manager]` and `[pricing.config]`, and model assumptions
//! (e.g. `mttr_improvement`, `base_migration_cost`) under `[assumptions]`. Run
//! `cloudops-roi pricing` to see the prices in effect.
//!
//! Any value can be overridden with an environment variable prefixed with
//! `CLOUDOPS_ROI`, using double underscores to reach into sections, e.g.
//! `CLOUDOPS_ROI__DATA_SOURCE__API_KEY=abc`.
//!
//! ## Commands
//!
//! ```cloudops-roi assess [--output DIR]```
//!
//! Collects metrics, calculates ROI, prints an executive summary and writes
//! `cloudops_roi_assessment.html` and `cloudops_roi_assessment.json` to DIR
//! (default `reports/`).
//!
//! ```cloudops-roi collect [--output FILE]```
//!
//! Collects metrics only and prints them as JSON. The output can be edited
//! (e.g. to add `server_costs`, which DataDog can't see) and fed to
//! `calculate`.
//!
//! ```cloudops-roi calculate --metrics FILE```
//!
//! Calculates ROI from a metrics file. No data source access is needed.
//!
//! ```cloudops-roi config```
//!
//! Echoes current config (with any overrides applied, and keys masked) and
//! exits.
//!
//! ## Examples
//!
//! ```shell
//! # Full assessment for a custom period, CloudWatch and Config only
//! cloudops-roi assess --start-date 2024-01-01 --end-date 2024-06-30 -s cloudwatch -s config
//!
//! # Snapshot metrics, then re-run the model offline
//! cloudops-roi collect -o metrics.json
//! cloudops-roi calculate -m metrics.json --timeline-months 24
//! ```
//!
//! # Troubleshooting
//!
//! | Error                                          | Resolution                                                                                           |
//! |-                                               |-                                                                                                     |
//! | Configuration file not found                   | Provide a config file via `--config`, or place one at `~/.config/cloudops_roi/assessment.toml`.     |
//! | HTTP status client error (403 Forbidden)       | Check `data_source.api_key` and `data_source.app_key`, and that `data_source.site` matches your org. |
//! | Migration cost must be positive to compute ROI | Overridden `[assumptions]` set the migration cost to zero; restore `base_migration_cost`.            |
//!
//! Set `RUST_LOG=cloudops_roi=debug` to see every DataDog request and response.

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

mod app_config;
mod cli;
mod core;

use anyhow::Result;

const DEFAULT_CONFIG_PATH: &str = "~/.config/cloudops_roi/assessment.toml";

#[doc(hidden)]
/// Main entrypoint
pub fn run() -> Result<()> {
    // Human Panic. Only enabled when *not* debugging.
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    env_logger::init();

    // Get CLI arguments and flags (one may have provided the config file to use)
    let cli_matches = cli::cli_config()?;

    // An explicit config file must exist. The default one may be absent, since
    // `calculate` and `pricing` work without one.
    let file_source = match cli_matches.value_of("config") {
        Some(config_file) => config::File::with_name(config_file),
        None => config::File::with_name(&shellexpand::tilde(DEFAULT_CONFIG_PATH)).required(false),
    };

    // Override with environment variables, if present
    // Example of overriding: CLOUDOPS_ROI__DATA_SOURCE__API_KEY=abc
    // (Note double underscore to reach into lower struct levels!)
    let settings = config::Config::builder()
        .add_source(file_source)
        .add_source(config::Environment::with_prefix("CLOUDOPS_ROI").separator("__"))
        .build()?;

    // Match against CLI subcommands, which delegate to functions
    cli::cli_match(settings, cli_matches)
}
