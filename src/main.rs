use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;

use geomatch_sim::config::{Cli, Config};
use geomatch_sim::datacenter::Datacenter;
use geomatch_sim::io::{datacenters, latency_grid, output, players};
use geomatch_sim::reporter::DensityHandle;
use geomatch_sim::server;
use geomatch_sim::simulator::Simulator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let config = match Config::try_from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    };

    match run(config).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<(), geomatch_sim::error::ConfigError> {
    tracing::info!(
        datacenters = %config.datacenters_csv.display(),
        players = %config.players_csv.display(),
        http_bind = %config.http_bind,
        "starting geomatch_sim"
    );

    let dc_records = datacenters::load(&config.datacenters_csv)?;
    tracing::info!(count = dc_records.len(), "loaded datacenters");

    let mut loaded_datacenters = Vec::with_capacity(dc_records.len());
    for record in dc_records {
        let mut dc = Datacenter::new(record.id, record.city.clone(), record.lat, record.long);
        dc.latency_grid = latency_grid::load(&config.latency_dir, &record.city)?;
        loaded_datacenters.push(dc);
    }

    let arrival_source = players::load(&config.players_csv)?;
    tracing::info!(arrivals = arrival_source.len(), "loaded players trace");

    let matches_writer = match &config.matches_csv {
        Some(path) => Some(open_matches_writer(path)?),
        None => None,
    };
    let stats_writer = match &config.stats_csv {
        Some(path) => Some(open_stats_writer(path)?),
        None => None,
    };

    let density_handle = DensityHandle::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_bind = config.http_bind.clone();
    let static_dir = config.static_dir.clone();
    let http_density = density_handle.clone();
    let http_shutdown = shutdown_rx.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::serve(&http_bind, static_dir, http_density, http_shutdown).await {
            tracing::warn!(error = %e, "http server task ended with error");
        }
    });

    let mut simulator = Simulator::new(
        config.matching.clone(),
        loaded_datacenters,
        arrival_source,
        config.rng_seed,
        density_handle,
        matches_writer,
        stats_writer,
    );

    let ticks = config.ticks;
    let sim_shutdown = shutdown_rx.clone();
    let sim_task = tokio::task::spawn_blocking(move || run_tick_loop(&mut simulator, ticks, sim_shutdown));
    tokio::pin!(sim_task);

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
            let _ = sim_task.await;
        }
        _ = &mut sim_task => {
            tracing::info!("simulation reached configured tick count");
            let _ = shutdown_tx.send(true);
        }
    }
    let _ = server_task.await;

    Ok(())
}

fn run_tick_loop(simulator: &mut Simulator, ticks: u64, shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        if ticks > 0 && simulator.now() >= ticks {
            break;
        }
        simulator.tick();
    }
    tracing::info!(ticks_run = simulator.now(), "simulation loop exiting");
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn open_matches_writer(path: &PathBuf) -> Result<output::MatchesWriter, geomatch_sim::error::ConfigError> {
    output::MatchesWriter::create(path)
        .map_err(|source| geomatch_sim::error::ConfigError::PathUnreadable { path: path.clone(), source })
}

fn open_stats_writer(path: &PathBuf) -> Result<output::StatsWriter, geomatch_sim::error::ConfigError> {
    output::StatsWriter::create(path)
        .map_err(|source| geomatch_sim::error::ConfigError::PathUnreadable { path: path.clone(), source })
}
