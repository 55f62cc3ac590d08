use ethabi::Address;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};

/// A deployed contract to be submitted for source code verification.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationTarget {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Address,
    /// Either fully qualified (`contracts/Token.sol:Token`) or a bare contract name.
    /// If missing, the contract is looked up by its deployed bytecode.
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub constructor_arguments: Option<Vec<serde_json::Value>>,
}

impl VerificationTarget {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            contract: None,
            constructor_arguments: None,
        }
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn with_constructor_arguments(mut self, arguments: Vec<serde_json::Value>) -> Self {
        self.constructor_arguments = Some(arguments);
        self
    }

    pub fn display_address(&self) -> String {
        format!("{:#x}", self.address)
    }
}
