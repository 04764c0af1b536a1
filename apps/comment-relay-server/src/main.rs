mod config;
mod logging;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comment_relay::Gateway;
use comment_relay::domain::{FetchService, PublishPipeline};
use comment_relay_sdk::{CommentConsumer, CommentRecord, ConsumedRecord, record_stream};
use futures::StreamExt;
use kafka_broker_plugin::{KafkaCommentConsumer, KafkaDeliveryProducer};
use mimalloc::MiMalloc;
use reddit_source_plugin::RedditClient;
use tokio::net::TcpListener;
use tokio::task::JoinError;

use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Comment relay - gRPC, gRPC-Web and JSON gateway in front of Reddit and Kafka
#[derive(Parser)]
#[command(name = "comment-relay-server")]
#[command(about = "Comment relay - gRPC, gRPC-Web and JSON gateway in front of Reddit and Kafka")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for the gateway listener (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Run,
    /// Validate configuration and exit
    Check,
    /// Tail the comment topic and log each record
    Consume,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    config.validate()?;
    logging::init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config).await,
        Commands::Check => check_config(&config),
        Commands::Consume => consume(&config).await,
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_server(config: &AppConfig) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "comment relay starting");

    let source = Arc::new(RedditClient::new(&config.reddit).context("failed to create reddit client")?);
    let producer = Arc::new(
        KafkaDeliveryProducer::new(&config.kafka).context("failed to create kafka producer")?,
    );
    // librdkafka connects lazily; ask for metadata so a dead cluster stops startup here.
    let brokers = producer
        .check_connectivity(config.kafka.connect_timeout)
        .await
        .context("kafka brokers unreachable at startup")?;
    tracing::info!(brokers, "kafka reachable");

    let fetch = Arc::new(FetchService::new(source, config.gateway.request_timeout));
    let publisher = Arc::new(PublishPipeline::new(
        producer.clone(),
        config.kafka.topic.clone(),
        config.kafka.delivery_timeout,
    ));
    let gateway =
        Gateway::new(&config.gateway, fetch, publisher).context("invalid gateway configuration")?;

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

    let cancel = signals::shutdown_token().context("failed to install signal handlers")?;

    let mut server = tokio::spawn(gateway.serve(listener, cancel.clone()));
    let early_exit = tokio::select! {
        joined = &mut server => Some(joined),
        () = cancel.cancelled() => None,
    };

    let served = match early_exit {
        Some(joined) => flatten(joined),
        None => match tokio::time::timeout(config.server.shutdown_timeout, server).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                tracing::warn!(
                    timeout = ?config.server.shutdown_timeout,
                    "connections did not drain in time; abandoning them"
                );
                Ok(())
            }
        },
    };

    let closing = producer.clone();
    match tokio::task::spawn_blocking(move || closing.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "kafka producer did not flush cleanly"),
        Err(e) => tracing::warn!(error = %e, "kafka producer close task failed"),
    }

    tracing::info!("comment relay stopped");
    served
}

fn flatten(joined: Result<Result<()>, JoinError>) -> Result<()> {
    joined.context("gateway task failed")?
}

async fn consume(config: &AppConfig) -> Result<()> {
    let consumer =
        KafkaCommentConsumer::new(&config.kafka).context("failed to create kafka consumer")?;
    consumer
        .subscribe(&[config.kafka.topic.as_str()])
        .context("failed to subscribe")?;
    tracing::info!(topic = %config.kafka.topic, group_id = %config.kafka.group_id, "consuming");

    let cancel = signals::shutdown_token().context("failed to install signal handlers")?;

    let mut records = std::pin::pin!(record_stream(&consumer));
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            next = records.next() => match next {
                Some(Ok(record)) => log_record(&record),
                Some(Err(e)) => tracing::warn!(error = %e, "consumer error"),
                None => break,
            },
        }
    }

    tracing::info!("consumer stopped");
    Ok(())
}

fn log_record(record: &ConsumedRecord) {
    match serde_json::from_slice::<CommentRecord>(&record.payload) {
        Ok(comment) => tracing::info!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            id = %comment.id,
            subreddit = %comment.subreddit,
            author = %comment.author,
            body = %comment.body,
            "comment record"
        ),
        Err(_) => tracing::info!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            payload = %String::from_utf8_lossy(&record.payload),
            "raw record"
        ),
    }
}
