//! Loading compiled contract artifacts and encoding creation calldata

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    constants::{ARTIFACT_EXTENSION, DEBUG_ARTIFACT_SUFFIX},
    errors::DeployError,
    types::ResolvedArg,
};

/// Directories in a build output that hold compiler metadata rather than artifacts
const SKIPPED_DIRS: [&str; 2] = ["build-info", "cache"];

/// The creation bytecode as written by the compiler toolchain
///
/// Hardhat writes a bare hex string, Foundry nests it under `object`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat format
    Hex(String),
    /// Foundry format
    Object {
        /// The hex-encoded bytecode
        object: String,
    },
}

impl RawBytecode {
    /// The hex string, regardless of format
    fn hex(&self) -> &str {
        match self {
            RawBytecode::Hex(s) => s,
            RawBytecode::Object { object } => object,
        }
    }
}

/// An artifact file as written by Hardhat or Foundry
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    /// The contract name, present in Hardhat artifacts only
    contract_name: Option<String>,
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: RawBytecode,
}

/// A compiled contract: everything needed to build its creation transaction
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The contract ABI, used to encode constructor arguments
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parse an artifact from its JSON form, naming it `fallback_name` if the
    /// artifact does not carry its own name
    pub fn from_json(json: &str, fallback_name: &str) -> Result<Self, DeployError> {
        let raw: RawArtifact =
            serde_json::from_str(json).map_err(|e| DeployError::ArtifactParsing(e.to_string()))?;

        let bytecode = Bytes::from_str(raw.bytecode.hex())
            .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?;

        Ok(Self {
            name: raw.contract_name.unwrap_or_else(|| fallback_name.to_string()),
            abi: raw.abi,
            bytecode,
        })
    }

    /// Whether the artifact has creation bytecode, interfaces and abstract
    /// contracts do not
    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    /// Build the creation calldata: the bytecode followed by the ABI-encoded
    /// constructor arguments
    pub fn deploy_code(&self, args: &[ResolvedArg]) -> Result<Bytes, DeployError> {
        let mismatch = |detail: String| DeployError::ArgumentMismatch {
            contract: self.name.clone(),
            detail,
        };

        let Some(constructor) = self.abi.constructor() else {
            if !args.is_empty() {
                return Err(mismatch(format!(
                    "no constructor, but {} argument(s) given",
                    args.len()
                )));
            }
            return Ok(self.bytecode.clone());
        };

        if constructor.inputs.len() != args.len() {
            return Err(mismatch(format!(
                "expected {} argument(s), got {}",
                constructor.inputs.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (input, arg) in constructor.inputs.iter().zip(args) {
            let ty = input
                .resolve()
                .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?;
            let value =
                coerce_arg(&ty, arg).map_err(|e| mismatch(format!("`{}`: {}", input.name, e)))?;
            values.push(value);
        }

        let encoded = constructor
            .abi_encode_input(&values)
            .map_err(|e| mismatch(e.to_string()))?;

        Ok(self.bytecode.iter().copied().chain(encoded).collect())
    }
}

/// Convert a resolved argument into a value of the constructor input's type
fn coerce_arg(ty: &DynSolType, arg: &ResolvedArg) -> Result<DynSolValue, String> {
    match (ty, arg) {
        (DynSolType::Address, ResolvedArg::Address(addr)) => Ok(DynSolValue::Address(*addr)),
        (_, ResolvedArg::Address(_)) => Err(format!(
            "an address was given for a `{}` input",
            ty.sol_type_name()
        )),
        (_, ResolvedArg::Literal(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
    }
}

/// The set of contracts that can be deployed, by name
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    /// The artifacts, keyed by contract name
    artifacts: HashMap<String, ContractArtifact>,
}

impl ArtifactRegistry {
    /// Load every deployable artifact found under `dir`, recursively
    ///
    /// Files that do not parse as artifacts are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Self, DeployError> {
        let mut files = Vec::new();
        collect_artifact_files(dir, &mut files)?;
        files.sort();

        let mut registry = Self::default();
        for path in files {
            let json = fs::read_to_string(&path).map_err(|e| {
                DeployError::ArtifactParsing(format!("{}: {}", path.display(), e))
            })?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            // Unlinked library placeholders and foreign JSON only matter if a
            // plan names the contract, which then fails as unknown
            let artifact = match ContractArtifact::from_json(&json, stem) {
                Ok(artifact) => artifact,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if !artifact.is_deployable() {
                debug!("skipping {}, it has no creation bytecode", artifact.name);
                continue;
            }
            if registry.contains(&artifact.name) {
                warn!(
                    "duplicate artifact for {} at {}, keeping the first",
                    artifact.name,
                    path.display()
                );
                continue;
            }
            registry.insert(artifact);
        }

        debug!("loaded {} artifact(s) from {}", registry.len(), dir.display());
        Ok(registry)
    }

    /// Register an artifact under its own name
    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.artifacts.insert(artifact.name.clone(), artifact);
    }

    /// Look up a contract by name
    pub fn get(&self, name: &str) -> Option<&ContractArtifact> {
        self.artifacts.get(name)
    }

    /// Whether a contract of the given name is known
    pub fn contains(&self, name: &str) -> bool {
        self.artifacts.contains_key(name)
    }

    /// The number of known contracts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether no contracts are known
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Walk `dir`, collecting the paths of candidate artifact files
fn collect_artifact_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), DeployError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = entry
            .map_err(|e| DeployError::ArtifactParsing(e.to_string()))?
            .path();

        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.iter().any(|d| *d == n));
            if !skipped {
                collect_artifact_files(&path, files)?;
            }
            continue;
        }

        let is_artifact = path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION)
            && !path.to_string_lossy().ends_with(DEBUG_ARTIFACT_SUFFIX);
        if is_artifact {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;

    /// A Hardhat-style artifact whose constructor takes the base address
    pub(crate) const FACTORY_ARTIFACT: &str = r#"{
        "contractName": "ElectronicPlantFactory",
        "abi": [
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [ { "name": "base", "type": "address", "internalType": "address" } ]
            }
        ],
        "bytecode": "0x6080604052"
    }"#;

    /// A Foundry-style artifact with no constructor
    pub(crate) const BASE_ARTIFACT: &str = r#"{
        "abi": [],
        "bytecode": { "object": "0x60806040" }
    }"#;

    /// An artifact whose constructor takes a number and a flag
    const LOCK_ARTIFACT: &str = r#"{
        "contractName": "Lock",
        "abi": [
            {
                "type": "constructor",
                "stateMutability": "payable",
                "inputs": [
                    { "name": "unlockTime", "type": "uint256" },
                    { "name": "open", "type": "bool" }
                ]
            }
        ],
        "bytecode": "0x00"
    }"#;

    #[test]
    fn test_parse_hardhat_artifact() {
        let artifact = ContractArtifact::from_json(FACTORY_ARTIFACT, "ignored").unwrap();
        assert_eq!(artifact.name, "ElectronicPlantFactory");
        assert_eq!(&artifact.bytecode[..], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.abi.constructor().is_some());
    }

    #[test]
    fn test_parse_foundry_artifact() {
        let artifact = ContractArtifact::from_json(BASE_ARTIFACT, "ElectronicPlantBase").unwrap();
        assert_eq!(artifact.name, "ElectronicPlantBase");
        assert!(artifact.is_deployable());
    }

    #[test]
    fn test_bad_bytecode() {
        let json = r#"{ "abi": [], "bytecode": "0xnothex" }"#;
        assert!(matches!(
            ContractArtifact::from_json(json, "Bad"),
            Err(DeployError::ArtifactParsing(_))
        ));
    }

    #[test]
    fn test_deploy_code_appends_address() {
        let artifact = ContractArtifact::from_json(FACTORY_ARTIFACT, "").unwrap();
        let base = Address::repeat_byte(0xab);

        let code = artifact.deploy_code(&[ResolvedArg::Address(base)]).unwrap();

        let (prefix, encoded) = code.split_at(artifact.bytecode.len());
        assert_eq!(prefix, &artifact.bytecode[..]);
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[12..], base.as_slice());
    }

    #[test]
    fn test_deploy_code_literals() {
        let artifact = ContractArtifact::from_json(LOCK_ARTIFACT, "").unwrap();
        let args = [
            ResolvedArg::Literal("1700000060".to_string()),
            ResolvedArg::Literal("true".to_string()),
        ];

        let code = artifact.deploy_code(&args).unwrap();

        let encoded = &code[artifact.bytecode.len()..];
        assert_eq!(encoded.len(), 64);
        assert_eq!(
            U256::from_be_slice(&encoded[..32]),
            U256::from(1_700_000_060u64)
        );
        assert_eq!(encoded[63], 1);
    }

    #[test]
    fn test_arity_mismatch() {
        let artifact = ContractArtifact::from_json(FACTORY_ARTIFACT, "").unwrap();
        assert!(matches!(
            artifact.deploy_code(&[]),
            Err(DeployError::ArgumentMismatch { .. })
        ));

        let base = ContractArtifact::from_json(BASE_ARTIFACT, "Base").unwrap();
        assert!(matches!(
            base.deploy_code(&[ResolvedArg::Literal("1".to_string())]),
            Err(DeployError::ArgumentMismatch { .. })
        ));
        assert_eq!(base.deploy_code(&[]).unwrap(), base.bytecode);
    }

    #[test]
    fn test_type_mismatch() {
        let artifact = ContractArtifact::from_json(LOCK_ARTIFACT, "").unwrap();

        let address_for_uint = [
            ResolvedArg::Address(Address::ZERO),
            ResolvedArg::Literal("true".to_string()),
        ];
        assert!(matches!(
            artifact.deploy_code(&address_for_uint),
            Err(DeployError::ArgumentMismatch { .. })
        ));

        let word_for_bool = [
            ResolvedArg::Literal("1".to_string()),
            ResolvedArg::Literal("maybe".to_string()),
        ];
        assert!(matches!(
            artifact.deploy_code(&word_for_bool),
            Err(DeployError::ArgumentMismatch { .. })
        ));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("contracts").join("Factory.sol");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(dir.path().join("build-info")).unwrap();

        fs::write(nested.join("ElectronicPlantFactory.json"), FACTORY_ARTIFACT).unwrap();
        fs::write(nested.join("ElectronicPlantFactory.dbg.json"), "{}").unwrap();
        fs::write(dir.path().join("ElectronicPlantBase.json"), BASE_ARTIFACT).unwrap();
        fs::write(
            dir.path().join("IPlant.json"),
            r#"{ "abi": [], "bytecode": "0x" }"#,
        )
        .unwrap();
        fs::write(dir.path().join("build-info").join("abc.json"), "{}").unwrap();

        let registry = ArtifactRegistry::load_dir(dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("ElectronicPlantFactory"));
        assert!(registry.contains("ElectronicPlantBase"));
        assert!(!registry.contains("IPlant"));
    }

    #[test]
    fn test_load_dir_skips_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ElectronicPlantBase.json"), BASE_ARTIFACT).unwrap();
        fs::write(
            dir.path().join("UsesLib.json"),
            r#"{ "abi": [], "bytecode": "0x6080__$1234567890abcdef1234567890abcdef12$__6040" }"#,
        )
        .unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "plant" }"#).unwrap();

        let registry = ArtifactRegistry::load_dir(dir.path()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("ElectronicPlantBase"));
        assert!(!registry.contains("UsesLib"));
    }
}
