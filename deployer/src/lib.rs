#![deny(unused_crate_dependencies)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Deployment of the `Project` contract.
//!
//! The procedure is a straight line: resolve the compiled contract, submit the
//! creation transaction, wait until it is mined and report the address. The chain
//! side lives behind [`DeploymentProvider`].

use std::{future::Future, io::Write};

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers::{
    abi::Abi,
    types::{Address, Bytes, H256, U64},
    utils::to_checksum,
};

mod artifacts;
mod error;
mod ethers_deployer;

pub use artifacts::ArtifactStore;
pub use error::{DeploymentFailed, Error, Result, Stage};
pub use ethers_deployer::EthersDeployer;

/// Name of the contract being deployed.
pub const BLUEPRINT_NAME: &str = "Project";

/// Platform fee in percent, the sole constructor argument of the contract.
pub const PLATFORM_FEE_PERCENTAGE: u8 = 5;

/// A compiled contract ready to be instantiated.
#[derive(Debug, Clone)]
pub struct Blueprint {
    /// Name of the contract.
    pub name: String,

    /// Contract ABI, used to encode the constructor arguments.
    pub abi: Abi,

    /// Creation bytecode.
    pub bytecode: Bytes,
}

/// A creation transaction accepted by the node but not yet mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Name of the contract being deployed.
    pub blueprint: String,

    /// Hash of the creation transaction.
    pub tx_hash: H256,
}

/// A confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Address of the new contract instance.
    pub address: Address,

    /// Hash of the creation transaction.
    pub tx_hash: H256,

    /// Block the creation transaction was mined in.
    pub block_number: Option<U64>,
}

/// The chain side of a deployment.
#[async_trait]
#[auto_impl(&, Arc, Box)]
pub trait DeploymentProvider: Send + Sync {
    /// Look up a compiled contract by name.
    ///
    /// # Arguments
    ///
    /// * `name`: contract name, either bare (`Project`) or fully qualified
    ///   (`contracts/Project.sol:Project`)
    async fn resolve_blueprint(&self, name: &str) -> Result<Blueprint>;

    /// Send the creation transaction of `blueprint`.
    ///
    /// Returns once the node acknowledged the transaction.
    ///
    /// # Arguments
    ///
    /// * `blueprint`: contract to instantiate
    /// * `platform_fee_percentage`: the constructor argument
    async fn submit(&self, blueprint: &Blueprint, platform_fee_percentage: u8)
        -> Result<Submission>;

    /// Wait until the creation transaction is mined.
    async fn confirm(&self, submission: Submission) -> Result<Deployment>;
}

/// Deploy the `Project` contract with the platform fee of
/// [`PLATFORM_FEE_PERCENTAGE`] and write the outcome to `out`.
///
/// Nothing past the announcement line is written to `out` if any step fails.
pub async fn run_deployment<D, W>(
    provider: D,
    out: &mut W,
) -> std::result::Result<Deployment, DeploymentFailed>
where
    D: DeploymentProvider,
    W: Write,
{
    run_deployment_with(async { Ok::<_, Error>(provider) }, out).await
}

/// Same as [`run_deployment`], but the provider is only set up after the
/// announcement line is written.
///
/// A failure of `connect` is reported at [`Stage::Connect`].
pub async fn run_deployment_with<F, D, W>(
    connect: F,
    out: &mut W,
) -> std::result::Result<Deployment, DeploymentFailed>
where
    F: Future<Output = Result<D>>,
    D: DeploymentProvider,
    W: Write,
{
    writeln!(out, "Deploying {BLUEPRINT_NAME} contract...")
        .and_then(|_| out.flush())
        .map_err(|e| DeploymentFailed::at(Stage::Announce)(e.into()))?;

    let provider = connect.await.map_err(DeploymentFailed::at(Stage::Connect))?;

    let blueprint = provider
        .resolve_blueprint(BLUEPRINT_NAME)
        .await
        .map_err(DeploymentFailed::at(Stage::ResolveBlueprint))?;

    vlog::debug!(
        "resolved blueprint {} with {} bytes of creation code",
        blueprint.name,
        blueprint.bytecode.len()
    );

    let submission = provider
        .submit(&blueprint, PLATFORM_FEE_PERCENTAGE)
        .await
        .map_err(DeploymentFailed::at(Stage::Submit))?;

    vlog::info!(
        "submitted deployment of {} in transaction {:?}",
        submission.blueprint,
        submission.tx_hash
    );

    let deployment = provider
        .confirm(submission)
        .await
        .map_err(DeploymentFailed::at(Stage::Confirm))?;

    vlog::info!(
        "deployment transaction {:?} confirmed in block {:?}",
        deployment.tx_hash,
        deployment.block_number
    );

    writeln!(
        out,
        "{BLUEPRINT_NAME} contract deployed to: {} with platform fee: {PLATFORM_FEE_PERCENTAGE}%",
        to_checksum(&deployment.address, None)
    )
    .and_then(|_| out.flush())
    .map_err(|e| DeploymentFailed::at(Stage::Report)(e.into()))?;

    Ok(deployment)
}
