//! Directory types

mod credential;
mod node;

pub use self::credential::{Credential, CredentialError};
pub use self::node::{Node, NodeError};
pub use web3::types::{Address, H256, U256};
