use anyhow::{Context, Result};
use autoraffle_node::{
    api::{self, AppState},
    clock::SystemClock,
    engine::Engine,
    Config, ValidatedConfig,
};
use clap::{Arg, ArgAction, Command};
use commonware_utils::hex;
use prometheus_client::registry::Registry;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tracing::{error, info};

fn print_dry_run_report(config: &ValidatedConfig) {
    let randomness = &config.raffle.randomness;
    println!("dry-run report");
    println!(
        "  network: {} (development={})",
        config.network, config.development
    );
    println!(
        "  raffle: entrance_fee={} interval={}ms",
        config.raffle.entrance_fee, config.raffle.interval_ms
    );
    println!(
        "  randomness: key_hash=0x{} subscription_id={} confirmations={} callback_gas_limit={}",
        hex(&randomness.key_hash),
        randomness.subscription_id,
        randomness.request_confirmations,
        randomness.callback_gas_limit
    );
    println!(
        "  ports: http={} metrics={}",
        config.port, config.metrics_port
    );
    println!(
        "  keeper: poll={:?} fulfillment_delay={:?}",
        config.keeper_poll, config.fulfillment_delay
    );
    println!(
        "  actor: mailbox_size={} event_buffer_size={}",
        config.mailbox_size, config.event_buffer_size
    );
}

fn init_logging(config: &ValidatedConfig) {
    let builder = tracing_subscriber::fmt().with_max_level(config.log_level);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_metrics_server(registry: Arc<Registry>, addr: SocketAddr) {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("metrics server bind failed on {addr}: {err}");
                return;
            }
        };
        if let Err(err) = axum::serve(listener, api::metrics_router(registry)).await {
            error!("metrics server failed on {addr}: {err}");
        }
    });
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    // Parse arguments
    let matches = Command::new("autoraffle-node")
        .about("Runs a self-drawing raffle.")
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate config and exit without starting the raffle")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("config").long("config").required(true))
        .get_matches();
    let dry_run = matches.get_flag("dry-run");

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let config_file = std::fs::read_to_string(config_file)
        .with_context(|| format!("Could not read config file {config_file}"))?;
    let config: Config =
        serde_yaml::from_str(&config_file).context("Could not parse config file")?;
    let config = config.validate().context("Invalid config")?;

    if dry_run {
        print_dry_run_report(&config);
        println!("config ok");
        return Ok(());
    }
    if !config.development {
        anyhow::bail!(
            "network {} needs an external randomness coordinator; only development networks can be served",
            config.network
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: ValidatedConfig) -> Result<()> {
    init_logging(&config);
    info!(?config, "loaded config file");

    let mut registry = Registry::default();
    let engine = Engine::new(&config, SystemClock, &mut registry).context("Invalid raffle")?;
    spawn_metrics_server(
        Arc::new(registry),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.metrics_port),
    );

    let state = AppState {
        mailbox: engine.mailbox(),
        bank: engine.bank(),
    };
    let actor = engine.start();

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;
    info!(%addr, "raffle api listening");
    tokio::select! {
        result = axum::serve(listener, api::router(state)) => {
            result.context("api server failed")?;
        }
        result = actor => {
            result.context("raffle actor panicked")?;
            anyhow::bail!("raffle actor stopped");
        }
    }
    Ok(())
}
