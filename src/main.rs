use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pyfreeze::cli::Args;
use pyfreeze::environment::InstalledSnapshot;
use pyfreeze::output::ReportRenderer;
use pyfreeze::pipeline::{self, RunOptions};
use pyfreeze::pypi::PyPiClient;
use pyfreeze::resolver::{ResolveMode, Resolver};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mode = if args.latest {
        ResolveMode::Latest
    } else {
        ResolveMode::Installed
    };

    // The snapshot only matters in installed mode; skip the pip subprocess
    // otherwise.
    let snapshot = match mode {
        ResolveMode::Installed => InstalledSnapshot::discover(),
        ResolveMode::Latest => InstalledSnapshot::default(),
    };

    let client = PyPiClient::new().with_index_url(&args.index_url);
    let mut resolver = Resolver::new(mode, snapshot, client)
        .with_prerelease(args.pre_release)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_concurrency(args.concurrency);
    for pattern in &args.exclude {
        resolver = resolver.with_exclusion(pattern);
    }
    for (name, version) in &args.pins {
        resolver = resolver.with_override(name, version.clone());
    }

    let options = RunOptions {
        operator: args.operator,
        strict: args.strict,
        best_effort: args.best_effort,
        dry_run: args.dry_run,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("resolving versions...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = pipeline::run(&args.paths, &resolver, &options).await;
    spinner.finish_and_clear();

    ReportRenderer::new(true).render(&report);

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
