use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, params::ObjectParams},
    http_client::{HttpClient, HttpClientBuilder},
};
use serde_json::{json, Value};
use tracing::*;

use crate::RegisterError;

/// File name of the generated registration package.
pub const REGISTER_FILE_NAME: &str = "register.gno";

const REGISTER_PKG_NAME: &str = "token_register";
const PKG_PATH_PLACEHOLDER: &str = "{{PKG_PATH}}";

/// Source of the package that registers a token with the pool, router and staker realms.
const REGISTER_TEMPLATE: &str = r#"package token_register

import (
	token "{{PKG_PATH}}"

	pusers "gno.land/p/demo/users"

	pl "gno.land/r/demo/pool"
	rr "gno.land/r/demo/router"
	sr "gno.land/r/demo/staker"
)

type NewToken struct{}

func (NewToken) Transfer() func(to pusers.AddressOrName, amount uint64) {
	return token.Transfer
}

func (NewToken) TransferFrom() func(from, to pusers.AddressOrName, amount uint64) {
	return token.TransferFrom
}

func (NewToken) BalanceOf() func(owner pusers.AddressOrName) uint64 {
	return token.BalanceOf
}

func (NewToken) Approve() func(spender pusers.AddressOrName, amount uint64) {
	return token.Approve
}

func init() {
	pl.RegisterGRC20Interface("{{PKG_PATH}}", NewToken{})
	rr.RegisterGRC20Interface("{{PKG_PATH}}", NewToken{})
	sr.RegisterGRC20Interface("{{PKG_PATH}}", NewToken{})
}
"#;

/// Path the registration package of `package_path` is deployed at.
pub fn register_path(package_path: &str, suffix: &str) -> String {
    format!("{package_path}{suffix}")
}

/// Renders the registration package source for `package_path`.
pub fn render_register_package(package_path: &str) -> String {
    REGISTER_TEMPLATE.replace(PKG_PATH_PLACEHOLDER, package_path)
}

/// Performs the registration of one token package.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait TokenRegistrar: Send + Sync + 'static {
    async fn register_token(&self, package_path: &str) -> Result<(), RegisterError>;
}

/// Hands registration packages to an external signing and broadcasting service.
#[derive(Debug, Clone)]
pub struct RpcTokenRegistrar {
    client: HttpClient,
    method: String,
    suffix: String,
    chain_id: String,
}

impl RpcTokenRegistrar {
    pub fn try_new(
        endpoint: &str,
        method: String,
        suffix: String,
        chain_id: String,
        request_timeout: Duration,
    ) -> Result<Self, RegisterError> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(RegisterError::InvalidEndpoint(endpoint.to_owned()));
        }

        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(endpoint)
            .map_err(|e| RegisterError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        Ok(Self {
            client,
            method,
            suffix,
            chain_id,
        })
    }

    fn params(&self, package_path: &str) -> Result<ObjectParams, RegisterError> {
        let mut params = ObjectParams::new();
        let fields = [
            ("package_path", json!(package_path)),
            (
                "register_path",
                json!(register_path(package_path, &self.suffix)),
            ),
            ("package_name", json!(REGISTER_PKG_NAME)),
            ("chain_id", json!(self.chain_id)),
            (
                "files",
                json!([{
                    "name": REGISTER_FILE_NAME,
                    "body": render_register_package(package_path),
                }]),
            ),
        ];

        for (name, value) in fields {
            params
                .insert(name, value)
                .map_err(|e| RegisterError::Params(e.to_string()))?;
        }
        Ok(params)
    }
}

#[async_trait]
impl TokenRegistrar for RpcTokenRegistrar {
    async fn register_token(&self, package_path: &str) -> Result<(), RegisterError> {
        let params = self.params(package_path)?;
        let resp: Value = self.client.request(&self.method, params).await?;
        debug!(%package_path, %resp, "registrar accepted token");
        Ok(())
    }
}

/// Registrar used when no endpoint is configured; it only logs.
#[derive(Debug, Clone)]
pub struct DryRunRegistrar {
    suffix: String,
}

impl DryRunRegistrar {
    pub fn new(suffix: String) -> Self {
        Self { suffix }
    }
}

#[async_trait]
impl TokenRegistrar for DryRunRegistrar {
    async fn register_token(&self, package_path: &str) -> Result<(), RegisterError> {
        info!(
            %package_path,
            register_path = %register_path(package_path, &self.suffix),
            "dry run, skipping token registration"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jsonrpsee::core::traits::ToRpcParams;

    use super::*;

    #[test]
    fn test_register_path() {
        assert_eq!(
            register_path("gno.land/r/demo/foo", "_gnoswap_register"),
            "gno.land/r/demo/foo_gnoswap_register"
        );
    }

    #[test]
    fn test_render_register_package() {
        let body = render_register_package("gno.land/r/demo/foo");
        assert!(body.starts_with("package token_register"));
        assert!(body.contains("token \"gno.land/r/demo/foo\""));
        assert_eq!(
            body.matches("RegisterGRC20Interface(\"gno.land/r/demo/foo\"")
                .count(),
            3
        );
        assert!(!body.contains(PKG_PATH_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_rejects_non_http_endpoint() {
        let res = RpcTokenRegistrar::try_new(
            "ws://127.0.0.1:8645",
            "register".to_string(),
            "_reg".to_string(),
            "dev".to_string(),
            Duration::from_secs(1),
        );
        assert!(matches!(res, Err(RegisterError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_rpc_params() {
        let registrar = RpcTokenRegistrar::try_new(
            "http://127.0.0.1:8645",
            "tokenscout_registerToken".to_string(),
            "_gnoswap_register".to_string(),
            "dev".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        let params = registrar.params("gno.land/r/demo/foo").unwrap();
        let raw = params.to_rpc_params().unwrap().unwrap();
        let value: Value = serde_json::from_str(raw.get()).unwrap();

        assert_eq!(value["package_path"], "gno.land/r/demo/foo");
        assert_eq!(value["register_path"], "gno.land/r/demo/foo_gnoswap_register");
        assert_eq!(value["chain_id"], "dev");
        assert_eq!(value["files"][0]["name"], REGISTER_FILE_NAME);
    }

    #[tokio::test]
    async fn test_dry_run_succeeds() {
        DryRunRegistrar::new("_reg".to_string())
            .register_token("gno.land/r/demo/foo")
            .await
            .unwrap();
    }
}
