mod build_info;
mod bytecode;
mod constructor;

pub use build_info::{BuildInfo, CodeRange, CompiledContract, DeployedBytecode};
pub use bytecode::{runtime_code_matches, solc_version, strip_cbor_auxdata};
pub use constructor::{encode_constructor_arguments, ConstructorError};

use anyhow::Context;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("contract {0} not found in build artifacts")]
    NotFound(String),
    #[error("no contract in build artifacts matches the deployed bytecode")]
    NoMatchingBytecode,
    #[error("more than one contract matches {target}: {candidates:?}")]
    Ambiguous {
        target: String,
        candidates: Vec<String>,
    },
    #[error("contract {target} is compiled differently by {compilers:?}")]
    ConflictingCompilations {
        target: String,
        compilers: Vec<String>,
    },
    #[error("invalid compiler version {version}: {error}")]
    InvalidCompilerVersion { version: String, error: String },
}

/// Compilation results read from a hardhat `build-info` directory.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    build_infos: Vec<BuildInfo>,
}

/// A single compiled contract together with the compilation it comes from.
#[derive(Debug, Clone, Copy)]
pub struct ContractArtifact<'a> {
    pub source_name: &'a str,
    pub contract_name: &'a str,
    pub contract: &'a CompiledContract,
    pub build_info: &'a BuildInfo,
}

impl Artifacts {
    pub fn new(build_infos: Vec<BuildInfo>) -> Self {
        Self { build_infos }
    }

    /// Reads all `*.json` files of the directory in the file name order.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let mut paths = std::fs::read_dir(dir)
            .with_context(|| format!("reading build info directory {}", dir.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<PathBuf>, _>>()
            .with_context(|| format!("listing build info directory {}", dir.display()))?;
        paths.retain(|path| path.extension().map_or(false, |ext| ext == "json"));
        paths.sort();

        let build_infos = paths
            .iter()
            .map(|path| {
                let content = std::fs::read(path)
                    .with_context(|| format!("reading build info {}", path.display()))?;
                serde_json::from_slice::<BuildInfo>(&content)
                    .with_context(|| format!("parsing build info {}", path.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        log::info!(
            "loaded {} build info files from {}",
            build_infos.len(),
            dir.display()
        );
        Ok(Self::new(build_infos))
    }

    pub fn contracts(&self) -> impl Iterator<Item = ContractArtifact<'_>> {
        self.build_infos.iter().flat_map(|build_info| {
            build_info
                .output
                .contracts
                .iter()
                .flat_map(move |(source_name, contracts)| {
                    contracts
                        .iter()
                        .map(move |(contract_name, contract)| ContractArtifact {
                            source_name,
                            contract_name,
                            contract,
                            build_info,
                        })
                })
        })
    }

    /// Looks up a contract either by the fully qualified name
    /// (`contracts/Token.sol:Token`) or by the contract name only.
    ///
    /// A contract may be present in several build infos. Identical
    /// compilations are treated as one; differing compilations of the
    /// same contract are told apart by the deployed `runtime_code`.
    /// Without it they are reported as
    /// [`ArtifactError::ConflictingCompilations`].
    pub fn find_by_name(
        &self,
        name: &str,
        runtime_code: Option<&[u8]>,
    ) -> Result<ContractArtifact<'_>, ArtifactError> {
        let matches = |artifact: &ContractArtifact| match name.rsplit_once(':') {
            Some((source_name, contract_name)) => {
                artifact.source_name == source_name && artifact.contract_name == contract_name
            }
            None => artifact.contract_name == name,
        };

        let mut compilations: Vec<ContractArtifact> = Vec::new();
        for artifact in self.contracts().filter(matches) {
            if !compilations
                .iter()
                .any(|known| known.is_same_compilation(&artifact))
            {
                compilations.push(artifact);
            }
        }

        let names: BTreeSet<_> = compilations
            .iter()
            .map(ContractArtifact::fully_qualified_name)
            .collect();
        if names.len() > 1 {
            return Err(ArtifactError::Ambiguous {
                target: name.to_string(),
                candidates: names.into_iter().collect(),
            });
        }

        match (compilations.len(), runtime_code) {
            (0, _) => Err(ArtifactError::NotFound(name.to_string())),
            (1, _) => Ok(compilations.remove(0)),
            (_, None) => Err(ArtifactError::ConflictingCompilations {
                target: name.to_string(),
                compilers: compilations
                    .iter()
                    .map(|artifact| artifact.build_info.solc_long_version.clone())
                    .collect(),
            }),
            (_, Some(code)) => {
                let candidates = compilations
                    .iter()
                    .map(ContractArtifact::compilation_name)
                    .collect();
                compilations.retain(|artifact| artifact.matches_runtime_code(code));
                match compilations.len() {
                    1 => Ok(compilations.remove(0)),
                    _ => Err(ArtifactError::Ambiguous {
                        target: name.to_string(),
                        candidates,
                    }),
                }
            }
        }
    }

    /// Looks up the contract whose compiled runtime code corresponds to `code`.
    pub fn find_by_runtime_code(&self, code: &[u8]) -> Result<ContractArtifact<'_>, ArtifactError> {
        // The same contract may be present in several compilations.
        let mut found: Option<ContractArtifact> = None;
        let mut candidates = BTreeSet::new();
        let matching = self
            .contracts()
            .filter(|artifact| artifact.matches_runtime_code(code));
        for artifact in matching {
            candidates.insert(artifact.fully_qualified_name());
            found.get_or_insert(artifact);
        }

        match found {
            None => Err(ArtifactError::NoMatchingBytecode),
            Some(_) if candidates.len() > 1 => Err(ArtifactError::Ambiguous {
                target: "deployed bytecode".to_string(),
                candidates: candidates.into_iter().collect(),
            }),
            Some(artifact) => Ok(artifact),
        }
    }
}

impl<'a> ContractArtifact<'a> {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    fn compilation_name(&self) -> String {
        format!(
            "{} ({})",
            self.fully_qualified_name(),
            self.build_info.solc_long_version
        )
    }

    fn is_same_compilation(&self, other: &ContractArtifact) -> bool {
        self.source_name == other.source_name
            && self.contract_name == other.contract_name
            && self.build_info.solc_long_version == other.build_info.solc_long_version
            && self.build_info.input == other.build_info.input
    }

    /// Checks whether `code` could be deployed from this artifact. Code
    /// carrying a compiler version in its metadata only matches
    /// compilations made by that version.
    pub fn matches_runtime_code(&self, code: &[u8]) -> bool {
        let deployed_bytecode = match self.contract.evm.deployed_bytecode.as_ref() {
            Some(deployed_bytecode) => deployed_bytecode,
            None => return false,
        };
        if deployed_bytecode.has_unlinked_libraries() {
            log::debug!(
                "skipping {} with unlinked libraries",
                self.fully_qualified_name()
            );
            return false;
        }
        if let Some(version) = solc_version(code) {
            let compiled_by = semver::Version::parse(&self.build_info.solc_long_version);
            let same_release = compiled_by.map_or(false, |compiled_by| {
                (compiled_by.major, compiled_by.minor, compiled_by.patch)
                    == (version.major, version.minor, version.patch)
            });
            if !same_release {
                return false;
            }
        }
        match hex::decode(deployed_bytecode.object.trim_start_matches("0x")) {
            Ok(compiled) => {
                runtime_code_matches(code, &compiled, deployed_bytecode.immutable_ranges())
            }
            Err(_) => false,
        }
    }

    /// Compiler version in the format explorers expect (`v0.8.17+commit.8df45f5f`).
    pub fn compiler_version(&self) -> Result<String, ArtifactError> {
        let version = &self.build_info.solc_long_version;
        semver::Version::parse(version)
            .map(|version| format!("v{version}"))
            .map_err(|err| ArtifactError::InvalidCompilerVersion {
                version: version.clone(),
                error: err.to_string(),
            })
    }

    pub fn standard_json_input(&self) -> &'a serde_json::Value {
        &self.build_info.input
    }

    pub fn encode_constructor_arguments(
        &self,
        arguments: &[serde_json::Value],
    ) -> Result<Vec<u8>, ConstructorError> {
        encode_constructor_arguments(&self.contract.abi, arguments)
    }
}
