//! Generate GRAVITY OBs from a YAML file and send them to the P2
//! proposal service.
//!
//! # Usage
//!
//! ```bash
//! # upload to the demo server with the shared tutorial account
//! create-obs path/to/obs.yml --demo
//!
//! # generate only, print the templates, talk to no service
//! create-obs path/to/obs.yml --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `P2_USERNAME` / `P2_PASSWORD`: production credentials (unless `--demo`)
//! - `RUST_LOG`: log level (default: info)

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gravity_obs::config::ObsConfig;
use gravity_obs::ob::ObservingBlock;
use gravity_obs::remote::p2::{P2Client, PRODUCTION_URL};
use gravity_obs::remote::simbad::SimbadResolver;
use gravity_obs::remote::NoEphemeris;
use gravity_obs::sync::upload_ob;

#[derive(Parser)]
#[command(name = "create-obs", about = "Generate GRAVITY OBs and send them to P2")]
struct Cli {
    /// Path to the YAML file describing the OBs
    file: PathBuf,

    /// Send the OBs to the P2 demo server instead of production
    #[arg(long)]
    demo: bool,

    /// Upload without asking for confirmation per OB
    #[arg(long, short = 'y')]
    yes: bool,

    /// Generate and print the templates, without resolving targets or
    /// talking to any service
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(false)
        .init();

    let cfg = ObsConfig::load(&cli.file)
        .with_context(|| format!("loading {}", cli.file.display()))?;
    info!(
        obs = cfg.observing_blocks.len(),
        run = %cfg.setup.run_id,
        "configuration loaded"
    );

    // No ephemeris predictor is wired into the CLI; declaring an
    // 'ephemeris' coordinate system then fails with a clear error.
    let ephemeris = NoEphemeris;

    if cli.dry_run {
        for (name, ob_cfg) in &cfg.observing_blocks {
            let mut ob = ObservingBlock::new(name, ob_cfg.clone(), cfg.setup.clone())?;
            ob.generate_templates(&ephemeris)?;
            report(&ob);
        }
        return Ok(());
    }

    let service = if cli.demo {
        P2Client::demo()?
    } else {
        let username =
            env::var("P2_USERNAME").context("P2_USERNAME environment variable not set")?;
        let password =
            env::var("P2_PASSWORD").context("P2_PASSWORD environment variable not set")?;
        P2Client::login(PRODUCTION_URL, &username, &password)?
    };
    let resolver = SimbadResolver::new();

    for (name, ob_cfg) in &cfg.observing_blocks {
        let mut ob = ObservingBlock::new(name, ob_cfg.clone(), cfg.setup.clone())?;
        ob.generate_templates(&ephemeris)?;
        ob.resolve_targets(&resolver, &ephemeris)?;
        if !cli.yes && !confirm(name)? {
            warn!(ob = %name, "OB not sent to P2");
            continue;
        }
        upload_ob(&service, &mut ob)?;
    }

    info!("done");
    Ok(())
}

// Blocking per-OB confirmation; cancelling skips only the upload, the
// templates were already generated.
fn confirm(name: &str) -> Result<bool> {
    print!("send OB '{}' to P2? [y/N] ", name);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn report(ob: &ObservingBlock) {
    println!("OB '{}' ({})", ob.label(), ob.mode().as_str());
    if let Some(acq) = ob.acquisition() {
        println!("  {}", acq.name());
        for (key, value) in acq.params() {
            println!("    {} = {}", key, value);
        }
    }
    for template in ob.templates() {
        println!("  {}", template.name());
        for (key, value) in template.params() {
            println!("    {} = {}", key, value);
        }
    }
}
