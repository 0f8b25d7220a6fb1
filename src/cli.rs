use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::report::{ComparisonLayout, ReportOptions};
use crate::commands::sync::SyncOptions;
use crate::commands::{self, CommandReport};
use crate::fah::config::{FahdbConfig, load_config};
use crate::fah::managed::ManagedLoadOptions;
use crate::logging;

#[derive(Parser)]
#[command(name = "fahdb")]
#[command(about = "Reconcile source run directories with a managed FAH run database")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Print the command report as JSON")]
    json: bool,

    #[arg(short, long, global = true, help = "Log debug events to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Debug, Clone, Copy)]
struct LoadFlags {
    #[arg(long, help = "Tolerate indexed runs that are missing on disk")]
    ignore_missing: bool,

    #[arg(long, help = "Tolerate runs on disk that are missing from the index")]
    ignore_extra: bool,
}

impl LoadFlags {
    fn managed_options(self, cfg: &FahdbConfig) -> ManagedLoadOptions {
        let mut opts = cfg.managed_load_options();
        opts.ignore_missing |= self.ignore_missing;
        opts.ignore_extra |= self.ignore_extra;
        opts
    }
}

#[derive(Subcommand)]
enum Cmd {
    #[command(about = "Summarize a managed database, optionally comparing it to another")]
    Report {
        #[arg(long, env = "FAHDB_DATABASE", help = "Managed database root")]
        database: PathBuf,

        #[arg(long, help = "Collection to compare the database against")]
        comparison: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ComparisonLayout::Managed)]
        comparison_layout: ComparisonLayout,

        #[arg(long, help = "Write the full report as JSON to this file")]
        output: Option<PathBuf>,

        #[command(flatten)]
        load: LoadFlags,
    },

    #[command(about = "Copy source runs missing from the managed database")]
    Sync {
        #[arg(long, env = "FAHDB_SOURCE", help = "Source collection root")]
        source: PathBuf,

        #[arg(long, env = "FAHDB_DESTINATION", help = "Managed database root")]
        destination: PathBuf,

        #[arg(long, alias = "sync", help = "Copy runs and rewrite the index")]
        apply: bool,

        #[command(flatten)]
        load: LoadFlags,
    },
}

fn render(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let cfg = load_config()?;

    let (mut report, outcome) = match cli.command {
        Cmd::Report {
            database,
            comparison,
            comparison_layout,
            output,
            load,
        } => {
            let opts = ReportOptions {
                database,
                comparison,
                comparison_layout,
                output,
                load: load.managed_options(&cfg),
            };
            let mut report = CommandReport::new("report");
            let outcome = commands::report::run(&opts, &cfg, &mut report);
            (report, outcome)
        }
        Cmd::Sync {
            source,
            destination,
            apply,
            load,
        } => {
            let opts = SyncOptions {
                source,
                destination,
                apply,
                source_load: cfg.source_load_options(),
                managed_load: load.managed_options(&cfg),
            };
            let mut report = CommandReport::new("sync");
            let outcome = commands::sync::run(&opts, &mut report);
            (report, outcome)
        }
    };

    if let Err(err) = &outcome {
        report.issue(err.to_string());
    }
    render(&report, cli.json)?;
    outcome
}
