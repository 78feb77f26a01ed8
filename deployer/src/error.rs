use std::{fmt, path::PathBuf};

use ethers::{
    contract::ContractError,
    providers::{Middleware, ProviderError},
    types::{Address, H256},
};

#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("artifacts directory {0} does not exist, compile the contracts first")]
    NoArtifactsDir(PathBuf),

    #[error("artifact for contract {0} not found")]
    ArtifactNotFound(String),

    #[error(
        "there are multiple artifacts for contract {name}, use one of: {}",
        .candidates.join(", ")
    )]
    AmbiguousArtifact {
        name: String,
        candidates: Vec<String>,
    },

    #[error("contract {0} is abstract and can't be deployed")]
    AbstractContract(String),

    #[error("contract {name} must be linked against libraries {}", .libraries.join(", "))]
    UnlinkedLibraries { name: String, libraries: Vec<String> },

    #[error("malformed bytecode in artifact of {name}: {reason}")]
    Bytecode { name: String, reason: String },

    #[error("malformed artifact {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ProviderError(#[from] ProviderError),

    #[error("Contract error {0}")]
    ContractError(String),

    #[error("Middleware error {0}")]
    Middleware(String),

    #[error("deployment transaction {0:?} was dropped from the mempool")]
    Dropped(H256),

    #[error("deployment transaction {0:?} reverted")]
    Reverted(H256),

    #[error("receipt of transaction {0:?} carries no contract address")]
    NoContractAddress(H256),

    #[error("no code at {0:?} after deployment")]
    NoCode(Address),

    #[error("node exposes no unlocked accounts to deploy from")]
    NoAccounts,

    #[error("contract name {0} points outside of the artifacts directory")]
    InvalidContractName(String),
}

impl<M: Middleware> From<ContractError<M>> for Error {
    fn from(value: ContractError<M>) -> Self {
        Self::ContractError(value.to_string())
    }
}

/// Step of the deployment procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Writing the deployment announcement.
    Announce,
    /// Setting up the connection to the node.
    Connect,
    /// Looking up the compiled contract.
    ResolveBlueprint,
    /// Sending the creation transaction.
    Submit,
    /// Waiting for the transaction to be mined.
    Confirm,
    /// Writing the deployment report.
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Announce => "announcing the deployment",
            Stage::Connect => "connecting to the node",
            Stage::ResolveBlueprint => "resolving the blueprint",
            Stage::Submit => "submitting the deployment",
            Stage::Confirm => "waiting for confirmation",
            Stage::Report => "reporting the deployment",
        };
        f.write_str(s)
    }
}

/// A failed deployment along with the step it failed at.
#[derive(Debug, thiserror::Error)]
#[error("deployment failed while {stage}")]
pub struct DeploymentFailed {
    /// Step that failed.
    pub stage: Stage,

    /// Underlying error.
    #[source]
    pub source: Error,
}

impl DeploymentFailed {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(Error) -> Self {
        move |source| Self { stage, source }
    }
}

/// The crate result type.
pub type Result<T> = std::result::Result<T, Error>;
