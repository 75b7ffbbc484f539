use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sheet2pb::Settings;
use sheet2pb::pipeline::{ArtifactOutcome, CacheMode, RunReport, run_configured};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    version,
    about = "Compile annotated spreadsheet tables into Protocol Buffers schemas and binary data."
)]
struct Args {
    /// Settings file; relative paths inside it are resolved against its directory.
    #[arg(long, default_value = "conf/config.toml")]
    config: PathBuf,

    /// Rebuild every artifact and do not persist fingerprints.
    #[arg(long, conflicts_with = "clear_cache")]
    no_cache: bool,

    /// Delete the persisted fingerprints before running.
    #[arg(long)]
    clear_cache: bool,

    /// Process artifacts one at a time.
    #[arg(long)]
    sequential: bool,

    /// Worker threads (default: one per core).
    #[arg(long)]
    jobs: Option<usize>,

    /// Stop at the first failed artifact and leave the cache untouched.
    #[arg(long)]
    fail_fast: bool,

    /// Emit proto3 schemas.
    #[arg(long)]
    proto3: bool,

    /// More log output (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn cache_mode(&self) -> CacheMode {
        if self.no_cache {
            CacheMode::Disabled
        } else if self.clear_cache {
            CacheMode::Cleared
        } else {
            CacheMode::Enabled
        }
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn,sheet2pb=info",
            1 => "info,sheet2pb=debug",
            _ => "debug,sheet2pb=trace",
        }
    }

    fn settings(&self) -> sheet2pb::Result<Settings> {
        let mut settings = Settings::load(&self.config)?;
        if self.sequential {
            settings = settings.with_parallel(false);
        }
        if let Some(jobs) = self.jobs {
            settings = settings.with_jobs(jobs);
        }
        if self.fail_fast {
            settings = settings.with_fail_fast(true);
        }
        if self.proto3 {
            settings = settings.with_proto3(true);
        }
        Ok(settings)
    }
}

fn print_report(report: &RunReport) {
    for artifact in &report.artifacts {
        match &artifact.outcome {
            ArtifactOutcome::Skipped => println!("  skipped  {}", artifact.name),
            ArtifactOutcome::Built(summary) => println!(
                "  built    {} ({} records, schema {:?}, data {:?})",
                artifact.name, summary.records, summary.schema, summary.data
            ),
        }
    }
    for failure in &report.failures {
        eprintln!("  failed   {}", failure);
    }
    println!(
        "{} built, {} skipped, {} failed",
        report.built(),
        report.skipped(),
        report.failures.len()
    );
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .init();

    let result = args
        .settings()
        .and_then(|settings| run_configured(&settings, args.cache_mode()));
    match result {
        Ok(report) => {
            print_report(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
