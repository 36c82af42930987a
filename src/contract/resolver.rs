//! Resolver contract proxy.

use web3::{
    api::Eth,
    contract::{Contract, Options},
    types::{Address, Bytes},
    Transport,
};

type ContractError = web3::contract::Error;

/// ERC-165 id of the text record interface (`text(bytes32,string)`).
pub const TEXT_INTERFACE_ID: [u8; 4] = [0x59, 0xd1, 0xd4, 0x3c];

/// Text record view over an entity resolver deployment.
///
/// See https://github.com/ensdomains/resolvers/blob/master/contracts/profiles/TextResolver.sol
#[derive(Debug, Clone)]
pub struct Resolver<T: Transport> {
    contract: Contract<T>,
    set_text: ethabi::Function,
}

impl<T: Transport> Resolver<T> {
    /// Attaches to the resolver deployed at `address`.
    pub fn new(eth: Eth<T>, address: Address) -> Result<Self, ethabi::Error> {
        let json = include_bytes!("Resolver.json");

        let abi = ethabi::Contract::load(&json[..])?;
        let set_text = abi.function("setText")?.clone();
        let contract = Contract::new(eth, address, abi);

        Ok(Self { contract, set_text })
    }

    /// Address this proxy is bound to.
    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

impl<T: Transport> Resolver<T> {
    /// Returns the text record `key` of the node, empty if unset.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/publicresolver#get-text-data)
    pub async fn text(&self, node: [u8; 32], key: &str) -> Result<String, ContractError> {
        let options = Options::default();

        self.contract
            .query("text", (node, key.to_owned()), None, options, None)
            .await
    }

    /// Returns true if the resolver implements the given ERC-165 interface.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/publicresolver#check-interface-support)
    pub async fn supports_interface(&self, interface_id: [u8; 4]) -> Result<bool, ContractError> {
        let options = Options::default();

        self.contract
            .query("supportsInterface", interface_id, None, options, None)
            .await
    }

    /// Encodes a `setText` call for signing.
    ///
    /// [Specification](https://docs.ens.domains/contract-api-reference/publicresolver#set-text-data)
    pub fn set_text_data(&self, node: [u8; 32], key: &str, value: &str) -> Result<Bytes, ethabi::Error> {
        use ethabi::Token;

        let tokens = [
            Token::FixedBytes(node.to_vec()),
            Token::String(key.to_owned()),
            Token::String(value.to_owned()),
        ];

        self.set_text.encode_input(&tokens).map(Bytes)
    }
}
