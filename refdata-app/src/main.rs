//! # Reference Data Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter and the ECB client
//! - Create the sync and rate services
//! - Start the HTTP server, or run a single command and exit

mod config;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecb_client::{EcbClient, EcbConfig};
use refdata_hex::{RateService, ReconcileOptions, SyncService, inbound::HttpServer};
use refdata_repo::{Repo, build_repo};
use refdata_types::{ExchangeRateFilter, Frequency, LatestRateResponse, RateRangeResponse};

use config::Config;

#[derive(Parser)]
#[command(name = "refdata")]
#[command(author, version, about = "ECB reference data sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Reconcile stored currencies with the ECB
    SyncCurrencies {
        /// Base currency code (defaults to BASE_CURRENCY)
        #[arg(long)]
        base: Option<String>,
    },
    /// Reconcile stored exchange rates with the ECB over a date range
    SyncRates {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the range (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Observation frequency (D or M)
        #[arg(long, default_value = "D")]
        frequency: Frequency,
        /// Base currency code (defaults to BASE_CURRENCY)
        #[arg(long)]
        base: Option<String>,
    },
    /// Print the daily rate in force on one day
    LatestRate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        day: NaiveDate,
    },
    /// Print one daily rate per day over an inclusive range
    RateRange {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

fn init_tracer(endpoint: &str) -> Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;

    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    Ok((provider.tracer("refdata"), provider))
}

/// Installs the global subscriber. Returns the tracer provider to flush on exit
/// when OTLP export is enabled.
fn init_tracing(config: &Config) -> Result<Option<sdktrace::SdkTracerProvider>> {
    let otel = config.otlp_endpoint.as_deref().map(init_tracer).transpose()?;
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,refdata=debug,refdata_hex=debug,ecb_client=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .with(telemetry)
        .init();

    Ok(otel.map(|(_, provider)| provider))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, config: Config) -> Result<()> {
    // Build repository (handles connection and migration)
    let repo: Arc<Repo> = Arc::new(build_repo(&config.database_url).await?);

    let source = EcbClient::new(EcbConfig {
        base_url: config.ecb_base_url.clone(),
        timeout: config.ecb_timeout,
    })?;

    let sync = SyncService::new(repo.clone(), source).with_options(ReconcileOptions {
        guard_full_wipe: config.guard_full_wipe,
    });
    let rates = RateService::new(repo);

    match command {
        Commands::Serve => {
            tracing::info!("Starting refdata server on port {}", config.port);
            let server = HttpServer::new(sync, rates);
            let addr = format!("0.0.0.0:{}", config.port);
            server.run(&addr).await?;
        }
        Commands::SyncCurrencies { base } => {
            let base = base.unwrap_or(config.base_currency);
            let summary = sync.sync_currencies(&base).await?;
            print_json(&summary)?;
        }
        Commands::SyncRates {
            start,
            end,
            frequency,
            base,
        } => {
            let filter = ExchangeRateFilter {
                base: base.unwrap_or(config.base_currency),
                frequency,
                start,
                end,
            };
            let summary = sync.sync_exchange_rates(&filter).await?;
            print_json(&summary)?;
        }
        Commands::LatestRate { from, to, day } => {
            let rate = rates.latest_daily(&from, &to, day).await?;
            print_json(&LatestRateResponse { from, to, day, rate })?;
        }
        Commands::RateRange {
            from,
            to,
            start,
            end,
        } => {
            let rates = rates.daily_range(&from, &to, start, end).await?;
            print_json(&RateRangeResponse {
                from,
                to,
                start,
                end,
                rates,
            })?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let otel_provider = init_tracing(&config)?;

    tracing::debug!(database = %redact(&config.database_url), "configuration loaded");

    let result = run(cli.command.unwrap_or(Commands::Serve), config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    result
}

/// Strips credentials from a database URL for logging.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
