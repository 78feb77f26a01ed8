use std::{path::PathBuf, time::Duration};

use envconfig::Envconfig;
use ethers::signers::LocalWallet;
use url::Url;

/// Deployer configuration, read from the environment.
#[derive(Envconfig, Debug)]
pub struct Config {
    /// JSON-RPC endpoint of the node.
    #[envconfig(from = "DEPLOYER_RPC_URL", default = "http://127.0.0.1:8545")]
    pub rpc_url: Url,

    /// Key to sign the deployment with.
    ///
    /// When not set the first account unlocked on the node is used.
    #[envconfig(from = "DEPLOYER_PRIVATE_KEY")]
    pub private_key: Option<LocalWallet>,

    /// Root of the Hardhat artifacts directory.
    #[envconfig(from = "DEPLOYER_ARTIFACTS_DIR", default = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Blocks to wait for after the deployment is mined.
    #[envconfig(from = "DEPLOYER_CONFIRMATIONS", default = "1")]
    pub confirmations: usize,

    #[envconfig(from = "DEPLOYER_POLLING_INTERVAL_MS", default = "1000")]
    pub polling_interval_ms: u64,
}

impl Config {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}
