//! tokenscout: ingests a remote chain and registers the token contracts deployed on it.

mod args;
mod context;
mod errors;

use anyhow::{anyhow, Result};
use argh::from_env;
use tokenscout_common::logging::{self, FileLoggingConfig, LoggerConfig};
use tokenscout_config::Config;
use tokenscout_fetch::Fetcher;
use tokenscout_register::spawn_registration_task;
use tokio::{runtime, signal};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{
    args::Args,
    context::{fetcher_config, init_node_context, load_config},
    errors::InitError,
};

const SERVICE_NAME: &str = "tokenscout";

fn main() -> Result<()> {
    let args: Args = from_env();

    let config = load_config(&args).map_err(|e| anyhow!("failed to load configuration: {e}"))?;
    init_logging(&config);

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tokenscout")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    let res = rt.block_on(run(config));
    if let Err(e) = &res {
        error!(err = %e, "exiting on fatal error");
    }

    logging::finalize();
    res
}

async fn run(config: Config) -> Result<()> {
    let ctx = init_node_context(&config)?;
    let cancel = CancellationToken::new();

    let registration = spawn_registration_task(&ctx.events, ctx.registrar.clone(), cancel.clone());

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("received interrupt, shutting down"),
            Err(e) => error!(err = %e, "failed to listen for interrupt, shutting down"),
        }
        signal_cancel.cancel();
    });

    let fetcher = Fetcher::new(
        ctx.storage.clone(),
        ctx.client.clone(),
        ctx.events.clone(),
        fetcher_config(&config),
    );
    let res = fetcher.run(cancel.clone()).await;

    // Stop the consumers too, whatever ended the fetcher.
    cancel.cancel();
    ctx.events.close();
    match registration.await {
        Ok(stats) => info!(
            registered = stats.registered,
            failed = stats.failed,
            "registration task finished"
        ),
        Err(e) => warn!(err = %e, "registration task panicked"),
    }

    if let Err(e) = ctx.storage.flush() {
        warn!(err = %e, "failed to flush storage");
    }

    res.map_err(|e| anyhow!("fetcher: {e}"))
}

fn init_logging(config: &Config) {
    let service_name =
        logging::format_service_name(SERVICE_NAME, config.logging.service_label.as_deref());

    let mut logger_config = LoggerConfig::new(service_name)
        .with_service_version(env!("CARGO_PKG_VERSION").to_string())
        .with_json_logging(config.logging.json_format);

    if let Some(log_dir) = &config.logging.log_dir {
        let prefix = config
            .logging
            .log_file_prefix
            .clone()
            .unwrap_or_else(|| SERVICE_NAME.to_string());
        logger_config = logger_config.with_file_logging(
            FileLoggingConfig::new(log_dir.clone(), prefix)
                .with_json_format(config.logging.json_format),
        );
    }

    logging::init(logger_config);
}
