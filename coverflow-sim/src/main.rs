//! Headless carousel session: builds a synthetic poster library, flings
//! across it, optionally drags one poster onto another and reports image
//! residency and render statistics.

mod library;
mod session;
mod surface;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use coverflow_config::{CarouselSettings, CarouselSettingsSource};
use coverflow_core::prelude::*;
use env_logger::{Builder, Target};
use log::LevelFilter;

use library::PosterLibrary;
use session::Session;

const SETTLE_LIMIT: Duration = Duration::from_secs(30);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "coverflow-sim")]
#[command(about = "Drive a headless 3D carousel through a scripted session")]
struct Cli {
    /// Number of posters in the library
    #[arg(long, default_value_t = 500)]
    items: usize,

    /// Decoded image capacity (overrides config)
    #[arg(long)]
    capacity: Option<usize>,

    /// Index to fling to after the initial window loads
    #[arg(long)]
    fling_to: Option<usize>,

    /// Drag the poster at FROM onto TO after the fling, e.g. `--reorder 480:482`
    #[arg(long, value_parser = parse_move)]
    reorder: Option<(usize, usize)>,

    /// Carousel config file (TOML or JSON). Without it the environment and
    /// the default file locations are consulted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Seed for poster colours
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn parse_move(raw: &str) -> Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got {raw:?}"))?;
    let from = from.trim().parse().map_err(|err| format!("bad FROM: {err}"))?;
    let to = to.trim().parse().map_err(|err| format!("bad TO: {err}"))?;
    Ok((from, to))
}

fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("coverflow_sim", LevelFilter::Info)
        .filter_module("coverflow_core", LevelFilter::Info)
        .init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<CarouselSettings> {
    let (settings, source) = match &cli.config {
        Some(path) => (
            CarouselSettings::load_from_file(path)?,
            CarouselSettingsSource::File(path.clone()),
        ),
        None => CarouselSettings::load_from_env()?,
    };
    log::info!("carousel settings from {:?}", source);

    let warnings = settings
        .validate()
        .context("carousel settings rejected")?;
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => log::warn!("{} ({})", warning.message, hint),
            None => log::warn!("{}", warning.message),
        }
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let mut config = settings.to_runtime_config();
    if let Some(capacity) = cli.capacity {
        config.cache_capacity = Some(capacity);
    }
    let options = ControllerOptions {
        config,
        layout: settings.layout_params(),
        viewport: Size::new(cli.width, cli.height),
    };

    let library = PosterLibrary::generate(cli.items, cli.seed);
    let mut session = Session::new(library, options);
    session.settle(SETTLE_LIMIT).await?;
    log::info!(
        "initial window {:?} with {} images resident",
        session.controller().visible_range(),
        session.controller().cache().len()
    );

    if let Some(target) = cli.fling_to {
        session.fling_to(target);
        session.settle(SETTLE_LIMIT).await?;
    }

    if let Some((from, to)) = cli.reorder {
        session.reorder(from, to).await?;
        session.settle(SETTLE_LIMIT).await?;
        let order: Vec<u64> = session
            .controller()
            .source()
            .ids()
            .skip(from.min(to))
            .take(from.abs_diff(to) + 1)
            .collect();
        log::info!("order around the drop: {:?}", order);
    }

    print_report(&session);
    session.detach();
    log::info!(
        "detached: {} images handed back to the surface",
        session.surface().released
    );
    Ok(())
}

fn print_report(session: &Session) {
    let controller = session.controller();
    let stats = controller.cache().stats();
    let report = session.report();
    let surface = session.surface();

    println!("focus            {:.2}", controller.current_index());
    println!("visible range    {:?}", controller.visible_range());
    println!(
        "resident         {} now, {} peak",
        controller.cache().len(),
        report.peak_resident
    );
    println!("peak in flight   {}", report.peak_loading);
    println!(
        "cache            {} hits, {} misses, {} loads, {} evictions, {} stale, {} failed",
        stats.hits,
        stats.misses,
        stats.loads_started,
        stats.evictions,
        stats.stale_discards,
        stats.failures
    );
    println!(
        "render           {} frames, {} quads, {} placeholders, {} redraw requests",
        surface.frames, surface.quads, surface.placeholders, surface.frame_requests
    );
    println!(
        "released         {} images ({} bytes)",
        surface.released, surface.released_bytes
    );
    println!("reorders         {}", report.reorders);
}
