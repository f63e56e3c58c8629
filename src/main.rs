//! raster-tiler - cut a large raster into a slippy-map pyramid and view it.
//!
//! This binary wires the converter, the tile generator and the HTTP server
//! to the command line.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raster_tiler::{
    config::{Cli, Command, ConvertConfig, GenerateConfig, ServeConfig},
    convert::convert,
    pyramid::{LevelOutcome, TileGenerator},
    server::{create_router, AppState, FsTileStore, RouterConfig, ViewerOptions, TILE_URL_TEMPLATE},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert(config) => run_convert(config).await,
        Command::Generate(config) => run_generate(config).await,
        Command::Serve(config) => run_serve(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "raster_tiler=debug,tower_http=debug"
    } else {
        "raster_tiler=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Convert Command
// =============================================================================

async fn run_convert(config: ConvertConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let ConvertConfig { source, target } = config;
    let result = tokio::task::spawn_blocking(move || convert(&source, &target)).await;

    match result {
        Ok(Ok(conversion)) => {
            info!(
                "Converted to {} ({}x{}, {:?})",
                conversion.target.display(),
                conversion.width,
                conversion.height,
                conversion.format
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("Conversion failed: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Conversion task panicked: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Generate Command
// =============================================================================

async fn run_generate(config: GenerateConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let generator = TileGenerator::new(config.generator_options());
    let GenerateConfig { source, output, .. } = config;
    let result = tokio::task::spawn_blocking(move || generator.generate(&source, &output)).await;

    let report = match result {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            error!("Tile generation failed: {}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Tile generation task panicked: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    for level in &report.levels {
        match &level.outcome {
            LevelOutcome::Complete { tiles } => {
                info!("  z={}: {} tiles", level.layout.zoom, tiles)
            }
            LevelOutcome::Empty => info!("  z={}: empty", level.layout.zoom),
            LevelOutcome::Failed {
                error,
                tiles_written,
            } => warn!(
                "  z={}: FAILED after {} tiles ({})",
                level.layout.zoom, tiles_written, error
            ),
        }
    }
    info!(
        "  Total: {} of {} tiles",
        report.tiles_written(),
        report.layout.total_tiles()
    );
    info!("");
    info!("  Leaflet layer:");
    info!(
        "    L.tileLayer('{}', {{ minZoom: 0, maxZoom: {} }})",
        TILE_URL_TEMPLATE, report.layout.max_zoom
    );
    info!("────────────────────────────────────────────────────────────────");

    if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        error!(
            "{} level(s) failed; the pyramid is incomplete",
            report.failed_levels().count()
        );
        ExitCode::FAILURE
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let layout = config.resolve_layout();
    let store = FsTileStore::new(&config.tiles_dir);

    info!("Configuration:");
    info!("  Tiles: {}", store.root().display());
    info!(
        "  Source: {}x{} px, zoom 0-{}, {} px tiles",
        layout.width, layout.height, layout.max_zoom, layout.tile_size
    );
    info!("  Cache max-age: {}s", config.cache_max_age);

    if !store.root().is_dir() {
        warn!(
            "  Tile directory {} does not exist; the viewer will show the fallback map",
            store.root().display()
        );
    }

    let state = AppState::new(store, layout)
        .with_viewer(ViewerOptions::default().with_title(&config.title));
    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the map in your browser:");
    info!("    open http://{}/", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/pyramid", addr);
    info!("    curl http://{}/tiles/0/0/0.png", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
