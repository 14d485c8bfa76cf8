mod cli;
mod collector;
mod config;
mod discovery;
mod doctor;
mod fetch;
mod fmt;
mod models;
mod parser;
mod report;

use anyhow::{bail, Context, Result};
use collector::Collector;
use fmt::{ceprintln, cprintln, HostColors, RED, RESET};
use models::TimeRange;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        ceprintln!("{RED}[mhist] {e:#}{RESET}");
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let opts = cli::parse_args(args)?;

    if opts.help {
        cli::print_help();
        return Ok(());
    }
    if opts.version {
        println!("mhist {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if opts.no_color {
        fmt::disable_color();
    }

    let home = home_dir()?;
    let settings = config::Settings::load(&home);

    if opts.doctor {
        doctor::run(&home, &settings);
        return Ok(());
    }

    let range = match opts.date.as_deref() {
        Some(expr) => TimeRange::day(cli::parse_date(expr)?),
        None => TimeRange::today(),
    };

    let fetcher = Arc::new(fetch::Shell::new(settings.ssh.clone(), home));
    let collector = Collector::new(fetcher, Arc::new(report::Terminal), opts.verbose);

    let hosts = if opts.hosts.is_empty() {
        let window = TimeRange::last_days(settings.discover_days);
        discovery::discover(&collector, &window)
            .await
            .context("discovering hosts from local history")?
    } else {
        opts.hosts
    };
    if hosts.is_empty() {
        bail!("no hosts given and none found in local ssh history");
    }

    if opts.discover {
        for host in &hosts {
            println!("{host}");
        }
        return Ok(());
    }

    let mut entries = collector.collect(&hosts, &range).await?;
    entries.sort();

    if opts.json {
        for entry in &entries {
            println!("{}", serde_json::to_string(entry)?);
        }
        return Ok(());
    }

    let template = opts
        .format
        .or(settings.format)
        .unwrap_or_else(|| fmt::DEFAULT_FORMAT.to_string());
    let colors = HostColors::assign(&hosts);
    for entry in &entries {
        cprintln!("{}", fmt::render(&template, entry, &colors));
    }
    Ok(())
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("cannot determine home directory")
}
