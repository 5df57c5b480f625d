use anyhow::Result;
use arrstats::classify::CalendarMode;
use arrstats::collector::Collector;
use arrstats::config::Configuration;
use arrstats::http::HttpClient;
use arrstats::influx::InfluxClient;
use arrstats::radarr::RadarrClient;
use arrstats::sonarr::SonarrClient;
use clap::Parser;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run every enabled feed once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    info!("Starting arrstats v{}", env!("CARGO_PKG_VERSION"));

    let config = Configuration::from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    let influx = InfluxClient::new(config.influxdb.clone())?;
    if let Err(e) = influx.ensure_database().await {
        warn!("Could not create InfluxDB database: {}", e);
    }

    let collector = Collector::new(Arc::new(HttpClient::new()?), Arc::new(influx));

    let sonarr: Vec<_> = config
        .sonarr
        .iter()
        .map(|c| (Arc::new(SonarrClient::new(collector.clone(), c.clone())), c.clone()))
        .collect();
    let radarr: Vec<_> = config
        .radarr
        .iter()
        .map(|c| (Arc::new(RadarrClient::new(collector.clone(), c.clone())), c.clone()))
        .collect();

    if cli.once {
        for (client, settings) in &sonarr {
            if settings.missing_days > 0 {
                client.get_calendar(CalendarMode::Missing).await;
            }
            if settings.future_days > 0 {
                client.get_calendar(CalendarMode::Upcoming).await;
            }
            if settings.queue {
                client.get_queue().await;
            }
        }
        for (client, settings) in &radarr {
            if settings.get_missing {
                client.get_missing().await;
            }
            if settings.queue {
                client.get_queue().await;
            }
        }
        info!("Single run completed");
        return Ok(());
    }

    let mut tasks = Vec::new();

    for (client, settings) in sonarr {
        info!("Scheduling sonarr server {}", client.id());

        if settings.missing_days > 0 {
            let c = Arc::clone(&client);
            tasks.push(every(settings.missing_interval(), move || {
                let c = Arc::clone(&c);
                async move { c.get_calendar(CalendarMode::Missing).await }
            }));
        }

        if settings.future_days > 0 {
            let c = Arc::clone(&client);
            tasks.push(every(settings.future_interval(), move || {
                let c = Arc::clone(&c);
                async move { c.get_calendar(CalendarMode::Upcoming).await }
            }));
        }

        if settings.queue {
            let c = Arc::clone(&client);
            tasks.push(every(settings.queue_interval(), move || {
                let c = Arc::clone(&c);
                async move { c.get_queue().await }
            }));
        }
    }

    for (client, settings) in radarr {
        info!("Scheduling radarr server {}", client.id());

        if settings.get_missing {
            let c = Arc::clone(&client);
            tasks.push(every(settings.missing_interval(), move || {
                let c = Arc::clone(&c);
                async move { c.get_missing().await }
            }));
        }

        if settings.queue {
            let c = Arc::clone(&client);
            tasks.push(every(settings.queue_interval(), move || {
                let c = Arc::clone(&c);
                async move { c.get_queue().await }
            }));
        }
    }

    if tasks.is_empty() {
        warn!("No feeds enabled, nothing to do");
        return Ok(());
    }

    // Wait for all tasks (they run forever)
    for task in tasks {
        if let Err(e) = task.await {
            error!("Poll task failed: {}", e);
        }
    }

    Ok(())
}

fn every<F, Fut>(period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = usize> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = interval(period);
        loop {
            interval.tick().await;
            job().await;
        }
    })
}
