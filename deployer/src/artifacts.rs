//! Blueprint resolution from a Hardhat artifacts directory.

use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use crate::{Blueprint, Error, Result};

const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract as laid out by Hardhat (`hh-sol-artifact-1`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    // Kept as a string: unlinked bytecode carries `__$...$__` placeholders.
    bytecode: String,
    #[serde(default)]
    link_references: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl HardhatArtifact {
    fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    fn into_blueprint(self) -> Result<Blueprint> {
        if !self.link_references.is_empty() {
            let libraries = self
                .link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect();

            return Err(Error::UnlinkedLibraries {
                name: self.contract_name,
                libraries,
            });
        }

        let bytecode: Bytes = self.bytecode.parse().map_err(|e| Error::Bytecode {
            name: self.contract_name.clone(),
            reason: format!("{e}"),
        })?;

        if bytecode.is_empty() {
            return Err(Error::AbstractContract(self.contract_name));
        }

        Ok(Blueprint {
            name: self.contract_name,
            abi: self.abi,
            bytecode,
        })
    }
}

/// Compiled contracts found under a Hardhat `artifacts` directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store over the artifacts directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the artifact of contract `name` and turn it into a [`Blueprint`].
    ///
    /// `name` is either a bare contract name, which has to be unique across all
    /// sources, or a fully qualified `path/to/Source.sol:Name`.
    pub fn resolve(&self, name: &str) -> Result<Blueprint> {
        if !self.root.is_dir() {
            return Err(Error::NoArtifactsDir(self.root.clone()));
        }

        let artifact = match name.split_once(':') {
            Some((source, contract)) => self.resolve_qualified(name, source, contract)?,
            None => self.resolve_bare(name)?,
        };

        vlog::debug!(
            "using artifact {} for contract {name}",
            artifact.fully_qualified_name()
        );

        artifact.into_blueprint()
    }

    fn resolve_qualified(
        &self,
        name: &str,
        source: &str,
        contract: &str,
    ) -> Result<HardhatArtifact> {
        if !is_relative_to_root(source) || !is_relative_to_root(contract) || contract.contains('/') {
            return Err(Error::InvalidContractName(name.to_string()));
        }

        let path = self.root.join(source).join(format!("{contract}.json"));

        if !path.is_file() {
            return Err(Error::ArtifactNotFound(name.to_string()));
        }

        let artifact = read_artifact(&path)?;

        if artifact.contract_name != contract {
            return Err(Error::ArtifactNotFound(name.to_string()));
        }

        Ok(artifact)
    }

    fn resolve_bare(&self, name: &str) -> Result<HardhatArtifact> {
        let mut paths = vec![];
        collect_artifact_paths(&self.root, &format!("{name}.json"), &mut paths)?;
        paths.sort();

        let mut matches = vec![];
        for path in paths {
            let artifact = read_artifact(&path)?;
            if artifact.contract_name == name {
                matches.push(artifact);
            }
        }

        match matches.len() {
            0 => Err(Error::ArtifactNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousArtifact {
                name: name.to_string(),
                candidates: matches
                    .iter()
                    .map(HardhatArtifact::fully_qualified_name)
                    .collect(),
            }),
        }
    }
}

// Only plain components, so the joined path stays under the root.
fn is_relative_to_root(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn read_artifact(path: &Path) -> Result<HardhatArtifact> {
    let contents = fs::read_to_string(path)?;

    serde_json::from_str(&contents).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

// Debug files are named `<Name>.dbg.json` and never match `file_name`.
fn collect_artifact_paths(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;

        if entry.file_type()?.is_dir() {
            if entry.file_name() != BUILD_INFO_DIR {
                collect_artifact_paths(&entry.path(), file_name, found)?;
            }
        } else if entry.file_name() == file_name {
            found.push(entry.path());
        }
    }

    Ok(())
}
