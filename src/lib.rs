//! Text records over an ENS-style registry/resolver pair.
//!
//! A [`Directory`] connects to a node, binds a registry and a resolver
//! deployment, and reads or writes single text records of a [`Node`].
//! Everything on the wire (ABI encoding, signing, RPC) is done by `web3`.
//!
//! The HTTP and WebSocket transports run on Tokio. Drive the futures of a
//! handle from [`Directory::open`] inside a Tokio 1.x runtime; they panic
//! when polled outside one.
//!
//! # Example
//! ```no_run
//! use entity_directory::{Credential, Directory, DirectoryConfig, Node};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::new(
//!     "http://localhost:8545",
//!     "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e",
//!     "0x4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41",
//! );
//! let directory = Directory::open(&config).await?;
//!
//! let node = Node::from_name("vocdoni.eth");
//! let credential: Credential = std::env::var("SIGNER_KEY")?.parse()?;
//! directory.set_text(&credential, node, "url", "https://example.org").await?;
//! assert_eq!(directory.text(node, "url").await?, "https://example.org");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod contract;
pub mod directory;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock;

pub use crate::config::{Confirmation, DirectoryConfig, TxPolicy};
pub use crate::directory::Directory;
pub use crate::error::{Error, Result};
pub use crate::transport::{connect, NodeTransport};
pub use crate::types::{Credential, Node};
