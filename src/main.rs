use clap::Parser;
use every_moment_relay::core::Trigger;
use every_moment_relay::utils::{logger, validation::Validate};
use every_moment_relay::{
    relay_dispatcher, schedule_refresh, CachedLocation, CliConfig, JsonLinesBridge,
    JsonLinesInbox, PoemPipeline, RelayEngine,
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting every-moment-relay");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let location = CachedLocation::new(config.location_source()?);
    let refresh = config.refresh_interval();
    let pipeline = PoemPipeline::new(location, JsonLinesBridge::stdout(), config);
    let engine = Arc::new(RelayEngine::new(pipeline));
    let dispatcher = relay_dispatcher(engine);

    let (tx, rx) = mpsc::channel(16);
    tx.send(Trigger::Ready).await?;

    tokio::spawn({
        let tx = tx.clone();
        async move {
            match JsonLinesInbox::stdin().forward(tx).await {
                Ok(count) => tracing::debug!("Device inbox closed after {} messages", count),
                Err(e) => tracing::warn!("Device inbox failed: {}", e),
            }
        }
    });

    if let Some(period) = refresh {
        tokio::spawn(schedule_refresh(period, tx.clone()));
    }
    drop(tx);

    tokio::select! {
        cycles = dispatcher.run(rx) => {
            tracing::info!("Input closed after {} relay cycles", cycles);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
