//! Compiled contract artifacts as written by the project's build system.

use crate::{errors::ProjectError, fs};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{B256, Bytes, hex};
use memchr::memmem;
use regex::Regex;
use serde::Deserialize;
use std::{path::Path, sync::LazyLock};

/// Matches the link placeholders of unlinked library references, e.g. `__SafeMath______________`.
static LINK_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__.{38}").expect("invalid regex"));

/// CBOR prefixes of the metadata hashes the compiler appends to the runtime code, each followed by
/// the 32 hash bytes.
const METADATA_HASH_MARKERS: [&[u8]; 3] = [
    // "bzzr0": bytes(32)
    b"\x65bzzr0\x58\x20",
    // "bzzr1": bytes(32)
    b"\x65bzzr1\x58\x20",
    // "ipfs": bytes(34), a sha2-256 multihash
    b"\x64ipfs\x58\x22\x12\x20",
];

/// A compiled contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Name of the contract, taken from the artifact file name.
    pub name: String,
    pub abi: JsonAbi,
    /// Runtime bytecode with link placeholders zeroed.
    pub deployed_bytecode: Bytes,
    /// The metadata hash embedded in the runtime bytecode, used to identify deployed instances.
    pub metadata_hash: Option<B256>,
    /// Whether the contract is declared as a `library`.
    pub is_library: bool,
}

impl ContractArtifact {
    /// Creates a new artifact, extracting the metadata hash from the runtime bytecode.
    pub fn new(name: impl Into<String>, abi: JsonAbi, deployed_bytecode: Bytes) -> Self {
        let metadata_hash = find_metadata_hash(&deployed_bytecode);
        Self { name: name.into(), abi, deployed_bytecode, metadata_hash, is_library: false }
    }

    /// Reads the artifact at `path`.
    pub fn read(path: &Path) -> Result<Self, ProjectError> {
        let name = path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
        let json: ArtifactJson = fs::read_json_file(path)?;
        let deployed_bytecode = decode_unlinked(&json.deployed_bytecode)
            .map_err(|source| ProjectError::Bytecode { contract: name.clone(), source })?;

        let is_library = json.ast.nodes.iter().any(|node| {
            node.contract_kind.as_deref() == Some("library")
                && node.name.as_deref() == Some(name.as_str())
        });

        let mut artifact = Self::new(name, json.abi, deployed_bytecode);
        artifact.is_library = is_library;
        Ok(artifact)
    }

    /// Returns the runtime bytecode without the trailing CBOR metadata.
    pub fn runtime_code(&self) -> &[u8] {
        ignore_metadata_hash(&self.deployed_bytecode)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactJson {
    #[serde(default)]
    abi: JsonAbi,
    #[serde(default)]
    deployed_bytecode: String,
    #[serde(default)]
    ast: Ast,
}

#[derive(Default, Deserialize)]
struct Ast {
    #[serde(default)]
    nodes: Vec<AstNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AstNode {
    #[serde(default)]
    contract_kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Decodes hex bytecode whose library references may still be unlinked.
///
/// Placeholders are replaced with the zero address.
pub fn decode_unlinked(code: &str) -> Result<Bytes, hex::FromHexError> {
    let code = LINK_PLACEHOLDER_RE.replace_all(code, "0".repeat(40));
    hex::decode(code.as_bytes()).map(Into::into)
}

/// Returns the last metadata hash found in `code`.
///
/// `code` is either runtime bytecode or the memory returned by a constructor, so the hash is
/// searched for instead of being read from the CBOR trailer.
pub fn find_metadata_hash(code: &[u8]) -> Option<B256> {
    METADATA_HASH_MARKERS.iter().find_map(|marker| {
        let start = memmem::rfind(code, marker)? + marker.len();
        code.get(start..start + 32).map(B256::from_slice)
    })
}

/// Utility function to ignore metadata hash of the given bytecode.
/// This assumes that the metadata is at the end of the bytecode.
pub fn ignore_metadata_hash(bytecode: &[u8]) -> &[u8] {
    // Get the last two bytes of the bytecode to find the length of CBOR metadata.
    let Some((rest, metadata_len_bytes)) = bytecode.split_last_chunk() else { return bytecode };
    let metadata_len = u16::from_be_bytes(*metadata_len_bytes) as usize;
    if metadata_len > rest.len() {
        return bytecode;
    }
    let (rest, metadata) = rest.split_at(rest.len() - metadata_len);
    if ciborium::from_reader::<ciborium::Value, _>(metadata).is_ok() { rest } else { bytecode }
}
