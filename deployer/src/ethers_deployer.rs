//! [`DeploymentProvider`] backed by an ethers [`Middleware`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    contract::ContractFactory,
    providers::{Middleware, PendingTransaction},
    types::{U256, U64},
};

use crate::{ArtifactStore, Blueprint, Deployment, DeploymentProvider, Error, Result, Submission};

const DEFAULT_CONFIRMATIONS: usize = 1;
const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(1);

/// Deploys blueprints from an [`ArtifactStore`] through a [`Middleware`].
///
/// The middleware is responsible for filling in the sender, nonce and gas of the
/// creation transaction, so it is usually a signer or a provider with a sender set.
#[derive(Debug)]
pub struct EthersDeployer<M> {
    client: Arc<M>,
    artifacts: ArtifactStore,
    confirmations: usize,
    polling_interval: Duration,
}

impl<M: Middleware> EthersDeployer<M> {
    /// Create a new deployer.
    ///
    /// # Arguments
    ///
    /// * `client`: middleware to send the transactions with
    /// * `artifacts`: where to look up blueprints
    pub fn new(client: Arc<M>, artifacts: ArtifactStore) -> Self {
        Self {
            client,
            artifacts,
            confirmations: DEFAULT_CONFIRMATIONS,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }

    /// Number of blocks to wait for after the creation transaction is mined.
    pub fn confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// How often to poll for the transaction receipt.
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }
}

#[async_trait]
impl<M> DeploymentProvider for EthersDeployer<M>
where
    M: Middleware + 'static,
{
    async fn resolve_blueprint(&self, name: &str) -> Result<Blueprint> {
        self.artifacts.resolve(name)
    }

    async fn submit(&self, blueprint: &Blueprint, platform_fee_percentage: u8) -> Result<Submission> {
        let factory = ContractFactory::new(
            blueprint.abi.clone(),
            blueprint.bytecode.clone(),
            self.client.clone(),
        );

        let deployer = factory.deploy(U256::from(platform_fee_percentage))?;

        let pending_tx = self
            .client
            .send_transaction(deployer.tx, None)
            .await
            .map_err(|e| Error::Middleware(e.to_string()))?;

        Ok(Submission {
            blueprint: blueprint.name.clone(),
            tx_hash: pending_tx.tx_hash(),
        })
    }

    async fn confirm(&self, submission: Submission) -> Result<Deployment> {
        let tx_hash = submission.tx_hash;

        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .interval(self.polling_interval)
            .confirmations(self.confirmations)
            .await?
            .ok_or(Error::Dropped(tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            return Err(Error::Reverted(tx_hash));
        }

        let address = receipt
            .contract_address
            .ok_or(Error::NoContractAddress(tx_hash))?;

        let code = self
            .client
            .get_code(address, None)
            .await
            .map_err(|e| Error::Middleware(e.to_string()))?;

        if code.is_empty() {
            return Err(Error::NoCode(address));
        }

        Ok(Deployment {
            address,
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
