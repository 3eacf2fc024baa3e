//! Access to the remote chain node.

mod amino;
mod decode;
mod errors;
mod http;
mod traits;
mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub use amino::binary_add_package_tx;
pub use decode::{AminoDecoder, AminoJsonDecoder, TxDecoder};
pub use errors::ClientError;
pub use http::HttpChainClient;
#[cfg(feature = "test-utils")]
pub use traits::MockRemoteChainClient;
pub use traits::{
    block_checked, query_exported_functions, AbciResponse, BlockResults, RemoteChainClient,
    QFUNCS_PATH,
};
