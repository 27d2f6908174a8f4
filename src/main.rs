//! # Touch Telemetry
//!
//! Node and collector daemon for touch/battery telemetry.
//!
//! Depending on configuration the process samples its local sensors and
//! pushes readings (radio link or HTTP), receives radio frames from other
//! nodes, and serves the aggregated table over HTTP.
//!
//! # Usage
//!
//! ```bash
//! touch-telemetry [config/default.toml]
//! ```
//!
//! Expected output:
//! ```text
//! INFO touch_telemetry: Touch Telemetry v0.1.0 starting...
//! INFO touch_telemetry: Client ID: 3
//! INFO touch_telemetry::transport::radio: Radio peer registered peer=24:6F:28:12:34:56 channel=0
//! INFO touch_telemetry::server: HTTP server listening address=Some(0.0.0.0:8080)
//! INFO touch_telemetry::transport::sender: Sent - ID: 3, Touch: 1, Battery: 87.3%
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use touch_telemetry::aggregation::AggregationStore;
use touch_telemetry::config::{Config, LoggingConfig, TransportConfig, TransportKind};
use touch_telemetry::hal::sysfs::{SysfsAdc, SysfsGpio};
use touch_telemetry::identity::debounce::IdentityButtons;
use touch_telemetry::identity::store::FileIdentityStore;
use touch_telemetry::identity::IdentityAssigner;
use touch_telemetry::runtime::display::LogDisplay;
use touch_telemetry::runtime::NodeRuntime;
use touch_telemetry::sampler::TelemetrySampler;
use touch_telemetry::server::{self, AppContext};
use touch_telemetry::transport::{
    HttpPushTransport, LoggingObserver, RadioReceiver, RadioTransport, TelemetryTransport,
    TransportSender, UdpRadioLink,
};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling log files
const LOG_FILE_PREFIX: &str = "touch-telemetry.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging)?;

    info!("Touch Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let identity_store = FileIdentityStore::new(&config.identity.state_file);
    info!("Identity state file: {}", identity_store.path().display());
    let identity = Arc::new(IdentityAssigner::load(Box::new(identity_store)));
    info!("Client ID: {}", identity.get());

    let sampler = Arc::new(TelemetrySampler::from_config(
        &config.sampler,
        Box::new(SysfsGpio::new(&config.hal.contact_path)),
        Box::new(SysfsAdc::new(&config.hal.battery_adc_path)),
    ));
    let store = Arc::new(AggregationStore::new());

    // Collector side
    if config.receiver.enabled {
        let receiver = RadioReceiver::bind(&config.receiver.bind_address, store.clone())
            .await
            .with_context(|| {
                format!("Failed to bind radio receiver on {}", config.receiver.bind_address)
            })?;
        tokio::spawn(async move {
            if let Err(e) = receiver.run().await {
                error!("Radio receiver stopped: {}", e);
            }
        });
    }

    if config.server.enabled {
        let listener = TcpListener::bind(&config.server.bind_address)
            .await
            .with_context(|| {
                format!("Failed to bind HTTP server on {}", config.server.bind_address)
            })?;
        let local_ip = server::local_ip(
            listener.local_addr()?,
            config.server.advertise_ip.as_deref(),
            &config.server.route_address,
        );
        info!("Reporting local address {}", local_ip);
        let ctx = Arc::new(AppContext {
            store: store.clone(),
            identity: identity.clone(),
            sampler: sampler.clone(),
            local_ip,
            min_slots: config.server.min_slots,
        });
        tokio::spawn(async move {
            if let Err(e) = server::serve(listener, ctx).await {
                error!("HTTP server stopped: {}", e);
            }
        });
    }

    // Node side
    let mut runtime = NodeRuntime::new(
        identity.clone(),
        sampler.clone(),
        Duration::from_millis(config.runtime.tick_ms),
    )
    .with_buttons(
        Box::new(SysfsGpio::new(&config.hal.increment_button_path)),
        Box::new(SysfsGpio::new(&config.hal.decrement_button_path)),
        IdentityButtons::new(config.identity.debounce_ms, config.identity.active_high),
        config.identity.poll_interval_ms,
    );

    if config.display.enabled {
        runtime = runtime.with_display(Box::new(LogDisplay), config.display.refresh_interval_ms);
    }

    let observer = Arc::new(LoggingObserver::new());
    if config.transport.enabled {
        let transport = build_transport(&config.transport, observer.clone()).await?;
        info!("Using {} transport", transport.name());
        let sender = TransportSender::new(sampler.clone(), identity.clone(), transport);
        runtime = runtime.with_sender(sender, config.transport.send_interval_ms);
    }

    info!("Press Ctrl+C to exit");

    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await;

    info!("Received Ctrl+C, shutting down...");
    if config.transport.enabled && config.transport.kind == TransportKind::Radio {
        let (delivered, failed) = observer.counts();
        info!(delivered, failed, "Radio send totals");
    }
    if config.server.enabled || config.receiver.enabled {
        info!("Nodes in aggregation table: {}", store.len());
    }
    Ok(())
}

/// Stdout logging, plus daily rolling files when a directory is configured.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes
/// the file writer and must live until exit.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

/// Transport selected by `[transport] kind`. Setup failures are fatal.
async fn build_transport(
    config: &TransportConfig,
    observer: Arc<LoggingObserver>,
) -> Result<Box<dyn TelemetryTransport>> {
    match config.kind {
        TransportKind::Radio => {
            let link = UdpRadioLink::bind(&config.radio.bind_address, &config.radio.link_address)
                .await
                .context("Failed to open radio link")?;
            let transport = RadioTransport::new(
                Box::new(link),
                config.radio.peer()?,
                config.radio.channel,
                observer,
            );
            Ok(Box::new(transport))
        }
        TransportKind::Http => {
            let transport = HttpPushTransport::new(
                &config.http.endpoint,
                Duration::from_millis(config.http.timeout_ms),
            )
            .context("Failed to create HTTP client")?;
            Ok(Box::new(transport))
        }
    }
}
