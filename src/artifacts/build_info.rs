use serde::Deserialize;
use std::collections::BTreeMap;

/// Hardhat `artifacts/build-info/<id>.json` file. Only the fields
/// needed to submit a standard json verification are deserialized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    pub input: serde_json::Value,
    pub output: BuildInfoOutput,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildInfoOutput {
    /// source name -> contract name -> compiled contract
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, CompiledContract>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompiledContract {
    #[serde(default)]
    pub abi: serde_json::Value,
    #[serde(default)]
    pub evm: Evm,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evm {
    #[serde(default)]
    pub deployed_bytecode: Option<DeployedBytecode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedBytecode {
    pub object: String,
    #[serde(default)]
    pub immutable_references: BTreeMap<String, Vec<CodeRange>>,
    #[serde(default)]
    pub link_references: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CodeRange {
    pub start: usize,
    pub length: usize,
}

impl DeployedBytecode {
    pub fn has_unlinked_libraries(&self) -> bool {
        !self.link_references.is_empty()
    }

    pub fn immutable_ranges(&self) -> impl Iterator<Item = &CodeRange> {
        self.immutable_references.values().flatten()
    }
}
