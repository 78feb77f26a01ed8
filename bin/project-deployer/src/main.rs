#![deny(unused_crate_dependencies)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Deploys the `Project` contract and prints its address.

use std::sync::Arc;

use envconfig::Envconfig;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::Signer,
};
use eyre::Result;

use cli::Args;
use config::Config;
use deployer::{run_deployment_with, ArtifactStore, DeploymentProvider, EthersDeployer};

mod cli;
mod config;

fn deployer_for<M>(client: M, config: &Config) -> Box<dyn DeploymentProvider>
where
    M: Middleware + 'static,
{
    let deployer = EthersDeployer::new(
        Arc::new(client),
        ArtifactStore::new(&config.artifacts_dir),
    )
    .confirmations(config.confirmations)
    .polling_interval(config.polling_interval());

    Box::new(deployer)
}

async fn connect(config: &Config) -> deployer::Result<Box<dyn DeploymentProvider>> {
    let provider = Provider::new(Http::new(config.rpc_url.clone()))
        .interval(config.polling_interval());

    match config.private_key.clone() {
        Some(wallet) => {
            let chain_id = provider.get_chainid().await?.as_u64();
            let wallet = wallet.with_chain_id(chain_id);

            vlog::info!("deploying from {:?} on chain {chain_id}", wallet.address());

            Ok(deployer_for(SignerMiddleware::new(provider, wallet), config))
        }
        None => {
            let from = provider
                .get_accounts()
                .await?
                .first()
                .copied()
                .ok_or(deployer::Error::NoAccounts)?;

            vlog::info!("deploying from unlocked account {from:?}");

            Ok(deployer_for(provider.with_sender(from), config))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let _args = Args::parse_args(std::env::args_os())?;

    dotenvy::dotenv().ok();

    let _sentry_guard = vlog::init()?;

    let config = Config::init_from_env()?;

    vlog::debug!("starting with {config:?}");

    let deployment = run_deployment_with(connect(&config), &mut std::io::stdout())
        .await
        .map_err(|e| {
            let e = eyre::Report::new(e);
            vlog::error!("deployment failed: {e:#}");
            e
        })?;

    vlog::info!(
        "deployed {} in transaction {:?}",
        deployer::BLUEPRINT_NAME,
        deployment.tx_hash
    );

    Ok(())
}
