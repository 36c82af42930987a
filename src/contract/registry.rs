//! Registry contract proxy.

use web3::{
    api::Eth,
    contract::{Contract, Options},
    types::Address,
    Transport,
};

type ContractError = web3::contract::Error;

/// Read-only view over an ENS registry (with fallback) deployment.
///
/// The registry records the owner, resolver and TTL of every node.
///
/// [Source](https://github.com/ensdomains/ens/blob/master/contracts/ENSRegistryWithFallback.sol)
#[derive(Debug, Clone)]
pub struct Registry<T: Transport> {
    contract: Contract<T>,
}

impl<T: Transport> Registry<T> {
    /// Attaches to the registry deployed at `address`.
    pub fn new(eth: Eth<T>, address: Address) -> Result<Self, ethabi::Error> {
        let json = include_bytes!("Registry.json");

        let contract = Contract::from_json(eth, address, json)?;

        Ok(Self { contract })
    }

    /// Address this proxy is bound to.
    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

impl<T: Transport> Registry<T> {
    /// Returns the owner of the node.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/ens#get-owner)
    pub async fn owner(&self, node: [u8; 32]) -> Result<Address, ContractError> {
        let options = Options::default();

        self.contract.query("owner", node, None, options, None).await
    }

    /// Returns the resolver responsible for the node.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/ens#get-resolver)
    pub async fn resolver(&self, node: [u8; 32]) -> Result<Address, ContractError> {
        let options = Options::default();

        self.contract.query("resolver", node, None, options, None).await
    }

    /// Returns the caching time-to-live of the node.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/ens#get-ttl)
    pub async fn ttl(&self, node: [u8; 32]) -> Result<u64, ContractError> {
        let options = Options::default();

        self.contract.query("ttl", node, None, options, None).await
    }

    /// Returns true if the node exists in this registry.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/ens#check-record-existence)
    pub async fn record_exists(&self, node: [u8; 32]) -> Result<bool, ContractError> {
        let options = Options::default();

        self.contract.query("recordExists", node, None, options, None).await
    }
}
