//! Config loading and construction of the long-lived components.

use std::sync::Arc;

use tokenscout_client::HttpChainClient;
use tokenscout_config::Config;
use tokenscout_db::SledStorage;
use tokenscout_events::EventManager;
use tokenscout_fetch::FetcherConfig;
use tokenscout_register::{DryRunRegistrar, RpcTokenRegistrar, TokenRegistrar};
use tracing::*;

use crate::{args::*, errors::*};

/// Builds the config: file, then env, then `-o` overrides, then explicit flags.
pub(crate) fn load_config(args: &Args) -> Result<Config, InitError> {
    let mut overrides = EnvArgs::from_env().get_overrides();
    overrides.extend(args.get_all_overrides()?);
    Ok(Config::load(args.config.as_deref(), &overrides)?)
}

pub(crate) fn fetcher_config(config: &Config) -> FetcherConfig {
    FetcherConfig {
        max_slots: config.fetcher.max_slots,
        max_chunk_size: config.fetcher.max_chunk_size,
        poll_interval: config.fetcher.poll_interval(),
        max_fetch_attempts: config.fetcher.max_fetch_attempts,
        retry_delay: config.fetcher.retry_delay(),
        require_banker_metadata: config.detection.require_banker_metadata,
    }
}

pub(crate) struct NodeContext {
    pub storage: Arc<SledStorage>,
    pub client: Arc<HttpChainClient>,
    pub events: Arc<EventManager>,
    pub registrar: Arc<dyn TokenRegistrar>,
}

pub(crate) fn init_node_context(config: &Config) -> Result<NodeContext, InitError> {
    let storage = Arc::new(SledStorage::open(&config.db.datadir)?);
    info!(datadir = %config.db.datadir.display(), "opened storage");

    let client = Arc::new(HttpChainClient::try_new(
        &config.client.remote_url,
        config.client.request_timeout(),
    )?);
    info!(remote_url = %config.client.remote_url, "connecting to remote chain");

    let events = Arc::new(EventManager::new(config.events.subscriber_buffer));
    let registrar = init_registrar(config)?;

    Ok(NodeContext {
        storage,
        client,
        events,
        registrar,
    })
}

fn init_registrar(config: &Config) -> Result<Arc<dyn TokenRegistrar>, InitError> {
    let reg = &config.registrar;
    let Some(endpoint) = &reg.endpoint else {
        warn!("no registrar endpoint configured, detected tokens will only be logged");
        return Ok(Arc::new(DryRunRegistrar::new(reg.register_suffix.clone())));
    };

    info!(%endpoint, method = %reg.method, "using rpc registrar");
    let registrar = RpcTokenRegistrar::try_new(
        endpoint,
        reg.method.clone(),
        reg.register_suffix.clone(),
        config.client.chain_id.clone(),
        config.client.request_timeout(),
    )?;
    Ok(Arc::new(registrar))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use argh::FromArgs;

    use super::*;

    #[test]
    fn test_load_config_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [client]
            remote_url = "http://127.0.0.1:26657"

            [fetcher]
            max_slots = 2
            max_chunk_size = 10
            "#,
        )
        .unwrap();

        let path = path.to_str().unwrap();
        let args = Args::from_args(
            &["tokenscout"],
            &["-c", path, "-o", "fetcher.max_slots=6", "--max-chunk-size", "40"],
        )
        .unwrap();

        let config = load_config(&args).unwrap();
        assert_eq!(config.fetcher.max_slots, 6);
        assert_eq!(config.fetcher.max_chunk_size, 40);

        let fetcher = fetcher_config(&config);
        assert_eq!(fetcher.max_slots, 6);
        assert_eq!(fetcher.max_chunk_size, 40);
        assert!(!fetcher.require_banker_metadata);
    }

    #[tokio::test]
    async fn test_init_node_context_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::from_args(
            &["tokenscout"],
            &[
                "--remote-url",
                "http://127.0.0.1:26657",
                "-d",
                dir.path().to_str().unwrap(),
            ],
        )
        .unwrap();

        let config = load_config(&args).unwrap();
        let ctx = init_node_context(&config).unwrap();
        assert!(dir.path().join("sled").exists());
        assert_eq!(ctx.events.subscriber_count(), 0);
    }
}
