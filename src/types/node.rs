use derive_more::Display;
use std::{fmt, str::FromStr};
use web3::{signing::keccak256, types::H256};

/// Identifier of a named entity inside the registry and resolver.
///
/// Nodes are opaque 32-byte keys. They are usually the ENS namehash of a
/// dotted name, but any 32-byte value is accepted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Node([u8; 32]);

/// Node could not be parsed from hex.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum NodeError {
    /// not valid hex
    #[display(fmt = "Invalid hex: {}", _0)]
    InvalidHex(hex::FromHexError),
    /// wrong number of bytes
    #[display(fmt = "Expected 32 bytes, got {}", _0)]
    InvalidLength(usize),
}

impl std::error::Error for NodeError {}

impl Node {
    /// Wraps raw node bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Node(bytes)
    }

    /// Computes the ENS namehash of a dotted name.
    ///
    /// The empty name maps to the zero node. Labels are hashed as given, so
    /// callers are expected to pass normalized names.
    pub fn from_name(name: &str) -> Self {
        let mut node = [0u8; 32];
        if name.is_empty() {
            return Node(node);
        }
        for label in name.rsplit('.') {
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(&node);
            buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
            node = keccak256(&buf);
        }
        Node(node)
    }

    /// Raw node bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy of the raw node bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl FromStr for Node {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(s).map_err(NodeError::InvalidHex)?;
        if bytes.len() != 32 {
            return Err(NodeError::InvalidLength(bytes.len()));
        }
        let mut node = [0u8; 32];
        node.copy_from_slice(&bytes);
        Ok(Node(node))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node({})", self)
    }
}

impl From<[u8; 32]> for Node {
    fn from(bytes: [u8; 32]) -> Self {
        Node(bytes)
    }
}

impl From<H256> for Node {
    fn from(hash: H256) -> Self {
        Node(hash.to_fixed_bytes())
    }
}

impl From<Node> for H256 {
    fn from(node: Node) -> Self {
        H256::from(node.0)
    }
}
