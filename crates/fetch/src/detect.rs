//! Detection of deployed token contracts.

use std::sync::LazyLock;

use regex::Regex;
use tokenscout_client::{query_exported_functions, RemoteChainClient, TxDecoder};
use tokenscout_events::TokenCandidate;
use tokenscout_primitives::prelude::*;
use tracing::*;

/// Functions every token contract exports.
pub const TOKEN_INTERFACE: [&str; 6] = [
    "TotalSupply",
    "BalanceOf",
    "Transfer",
    "Allowance",
    "Approve",
    "TransferFrom",
];

static BANKER_CTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"grc20\.NewBanker\("([^"]+)",\s*"([^"]+)",\s*(\d+)\)"#)
        .expect("banker pattern is valid")
});

/// Returns whether `exported` contains the whole [`TOKEN_INTERFACE`].
pub fn is_token_interface<S: AsRef<str>>(exported: &[S]) -> bool {
    TOKEN_INTERFACE
        .iter()
        .all(|required| exported.iter().any(|name| name.as_ref() == *required))
}

/// Token metadata passed to the banker constructor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BankerMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u64,
}

/// Finds the first `grc20.NewBanker("<name>", "<symbol>", <decimals>)` call in `files`.
pub fn find_banker_metadata(files: &[MemFile]) -> Option<BankerMetadata> {
    files.iter().find_map(|file| {
        BANKER_CTOR.captures_iter(&file.body).find_map(|caps| {
            Some(BankerMetadata {
                name: caps[1].to_owned(),
                symbol: caps[2].to_owned(),
                decimals: caps[3].parse().ok()?,
            })
        })
    })
}

/// Looks for token deployments among the successful transactions of `block`.
///
/// Nothing here is fatal: undecodable transactions and failed queries are logged and the
/// affected package is skipped.
pub(crate) async fn detect_tokens<C: RemoteChainClient>(
    client: &C,
    decoder: &dyn TxDecoder,
    block: &Block,
    results: &[TxResult],
    require_banker_metadata: bool,
) -> Vec<TokenCandidate> {
    let height = block.height();
    let mut candidates = Vec::new();

    for result in results.iter().filter(|r| r.is_success()) {
        let msgs = match decoder.decode(result.tx()) {
            Ok(msgs) => msgs,
            Err(e) => {
                debug!(%height, index = result.index(), err = %e, "skipping undecodable tx");
                continue;
            }
        };

        for msg in msgs {
            let (creator, package) = match msg {
                Message::AddPackage {
                    creator, package, ..
                } => (creator, package),
                Message::Call { .. }
                | Message::Send { .. }
                | Message::Run { .. }
                | Message::Unknown { .. } => continue,
            };

            let pkg_path = package.path.as_str();
            if require_banker_metadata {
                match find_banker_metadata(&package.files) {
                    Some(meta) => {
                        debug!(%pkg_path, name = %meta.name, symbol = %meta.symbol, "found banker metadata")
                    }
                    None => {
                        trace!(%pkg_path, "package has no banker metadata");
                        continue;
                    }
                }
            }

            let functions = match query_exported_functions(client, pkg_path).await {
                Ok(functions) => functions,
                Err(e) => {
                    warn!(%height, %pkg_path, err = %e, "failed to query exported functions");
                    continue;
                }
            };

            if is_token_interface(functions.as_slice()) {
                info!(%height, %pkg_path, %creator, "detected token contract");
                candidates.push(TokenCandidate {
                    package_path: package.path,
                    height,
                    creator,
                    functions,
                });
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(body: &str) -> MemFile {
        MemFile {
            name: "token.gno".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_token_interface_superset() {
        let names = [
            "TotalSupply",
            "BalanceOf",
            "Transfer",
            "Allowance",
            "Approve",
            "TransferFrom",
            "Extra",
        ];
        assert!(is_token_interface(&names));
    }

    #[test]
    fn test_token_interface_partial() {
        assert!(!is_token_interface(&["TotalSupply", "BalanceOf"]));
    }

    #[test]
    fn test_token_interface_empty() {
        let names: [&str; 0] = [];
        assert!(!is_token_interface(&names));
    }

    #[test]
    fn test_token_interface_owned_names() {
        let names: Vec<String> = TOKEN_INTERFACE.iter().map(|s| s.to_string()).collect();
        assert!(is_token_interface(names.as_slice()));
    }

    #[test]
    fn test_banker_metadata() {
        let body = r#"package foo

var banker = grc20.NewBanker("Foo Token", "FOO",   6)
"#;
        assert_eq!(
            find_banker_metadata(&[file("package foo"), file(body)]),
            Some(BankerMetadata {
                name: "Foo Token".to_string(),
                symbol: "FOO".to_string(),
                decimals: 6,
            })
        );
    }

    #[test]
    fn test_banker_metadata_rejects_non_literals() {
        assert_eq!(
            find_banker_metadata(&[file(r#"grc20.NewBanker(name, "FOO", 6)"#)]),
            None
        );
        assert_eq!(
            find_banker_metadata(&[file(r#"grc20.NewBanker("Foo", "FOO", decimals)"#)]),
            None
        );
        assert_eq!(
            find_banker_metadata(&[file(r#"grc20.NewBanker("", "FOO", 6)"#)]),
            None
        );
        assert_eq!(
            find_banker_metadata(&[file(r#"grc20.NewBanker("Foo" , "FOO", 6)"#)]),
            None
        );
        assert_eq!(find_banker_metadata(&[]), None);
    }

    #[test]
    fn test_banker_metadata_decimals_overflow() {
        let body = r#"
a := grc20.NewBanker("Big", "BIG", 99999999999999999999999)
b := grc20.NewBanker("Small", "SML", 4)
"#;
        let meta = find_banker_metadata(&[file(body)]).unwrap();
        assert_eq!(meta.name, "Small");
        assert_eq!(meta.decimals, 4);
    }

    #[test]
    fn test_banker_metadata_skips_bad_first_call() {
        let body = r#"
// grc20.NewBanker(name, symbol, decimals)
banker := grc20.NewBanker("Bar", "BAR", 18)
"#;
        let meta = find_banker_metadata(&[file(body)]).unwrap();
        assert_eq!(meta.symbol, "BAR");
        assert_eq!(meta.decimals, 18);
    }
}
