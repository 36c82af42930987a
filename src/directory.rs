//! Registry/resolver handle.

use crate::{
    config::{Confirmation, DirectoryConfig, TxPolicy},
    contract::{Registry, Resolver, TEXT_INTERFACE_ID},
    error::{BindError, NetworkError, ReadError, Result, WriteError},
    transport::{self, NodeTransport},
    types::{Credential, Node},
};
use futures::lock::Mutex;
use futures_timer::Delay;
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use web3::{
    contract::Error as ContractError,
    types::{Address, BlockNumber, TransactionParameters, H256, U256, U64},
    Transport, Web3,
};

/// Connection to a node plus the registry and resolver proxies bound on it.
///
/// Reads borrow the handle immutably and may run concurrently. Writes are
/// serialized per handle so that a fetched nonce is always used before the
/// next write fetches its own; writes from other handles or processes sharing
/// a key still need external coordination.
#[derive(Debug)]
pub struct Directory<T: Transport> {
    web3: Web3<T>,
    network_id: U256,
    registry: Registry<T>,
    resolver: Resolver<T>,
    policy: TxPolicy,
    confirmation: Confirmation,
    verify_bindings: bool,
    write_lock: Mutex<()>,
}

impl Directory<NodeTransport> {
    /// Connects to `config.endpoint` and initializes the handle.
    pub async fn open(config: &DirectoryConfig) -> Result<Self> {
        let transport = transport::connect(&config.endpoint).await?;
        Self::init(transport, config).await
    }
}

impl<T: Transport> Directory<T> {
    /// Fetches the network id and binds both proxies over `transport`.
    pub async fn init(transport: T, config: &DirectoryConfig) -> Result<Self> {
        let web3 = Web3::new(transport);

        let network_id = chain_id(&web3).await?;
        info!("found network {}", network_id);

        let registry = registry_at(&web3, &config.registry, config.verify_bindings).await?;
        info!("found registry at address {:?}", registry.address());

        let resolver = resolver_at(&web3, &config.resolver, config.verify_bindings).await?;
        info!("found resolver at address {:?}", resolver.address());

        Ok(Directory {
            web3,
            network_id,
            registry,
            resolver,
            policy: config.policy.clone(),
            confirmation: config.confirmation,
            verify_bindings: config.verify_bindings,
            write_lock: Mutex::new(()),
        })
    }

    /// Queries the chain id from the node.
    pub async fn fetch_network_id(&self) -> std::result::Result<U256, NetworkError> {
        chain_id(&self.web3).await
    }

    /// Chain id fetched at initialization.
    pub fn network_id(&self) -> U256 {
        self.network_id
    }

    /// Rebinds the registry proxy. On failure the current proxy is kept.
    pub async fn bind_registry(&mut self, address: &str) -> std::result::Result<(), BindError> {
        self.registry = registry_at(&self.web3, address, self.verify_bindings).await?;
        info!("found registry at address {:?}", self.registry.address());
        Ok(())
    }

    /// Rebinds the resolver proxy. On failure the current proxy is kept.
    pub async fn bind_resolver(&mut self, address: &str) -> std::result::Result<(), BindError> {
        self.resolver = resolver_at(&self.web3, address, self.verify_bindings).await?;
        info!("found resolver at address {:?}", self.resolver.address());
        Ok(())
    }

    /// The bound registry proxy.
    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    /// The bound resolver proxy.
    pub fn resolver(&self) -> &Resolver<T> {
        &self.resolver
    }

    /// Transaction policy applied to writes.
    pub fn policy(&self) -> &TxPolicy {
        &self.policy
    }

    /// Reads the text record `key` of `node`.
    ///
    /// An unset record reads as the empty string.
    pub async fn text(&self, node: Node, key: &str) -> std::result::Result<String, ReadError> {
        self.resolver.text(node.to_bytes(), key).await.map_err(|err| {
            warn!("error getting resolver text: {}", err);
            ReadError(err)
        })
    }

    /// Signs and submits a `setText` transaction, then confirms it.
    ///
    /// With [`Confirmation::ReadBack`] the record is read right after
    /// submission and an empty result is reported as [`WriteError::NotSet`],
    /// which also happens when `value` itself is empty. Use
    /// [`Confirmation::Receipt`] to wait for inclusion instead.
    pub async fn set_text(
        &self,
        credential: &Credential,
        node: Node,
        key: &str,
        value: &str,
    ) -> std::result::Result<H256, WriteError> {
        let _guard = self.write_lock.lock().await;

        let nonce = self
            .web3
            .eth()
            .transaction_count(credential.address(), Some(BlockNumber::Pending))
            .await
            .map_err(|err| {
                warn!("error getting signer nonce: {}", err);
                WriteError::Nonce(err)
            })?;

        let data = self
            .resolver
            .set_text_data(node.to_bytes(), key, value)
            .map_err(|err| {
                warn!("error encoding resolver text: {}", err);
                WriteError::Encode(err)
            })?;

        let tx = TransactionParameters {
            nonce: Some(nonce),
            to: Some(self.resolver.address()),
            gas: self.policy.gas_limit,
            gas_price: Some(self.policy.gas_price),
            value: self.policy.value,
            data,
            chain_id: Some(self.network_id.low_u64()),
            ..Default::default()
        };
        let signed = self
            .web3
            .accounts()
            .sign_transaction(tx, credential.signer())
            .await
            .map_err(|err| {
                warn!("error signing resolver text: {}", err);
                WriteError::Sign(err)
            })?;

        let hash = self
            .web3
            .eth()
            .send_raw_transaction(signed.raw_transaction)
            .await
            .map_err(|err| {
                warn!("error setting resolver text: {}", err);
                WriteError::Submit(err)
            })?;
        info!("tx sent: {:?}", hash);

        match self.confirmation {
            Confirmation::ReadBack => self.read_back(node, key).await?,
            Confirmation::Receipt { poll_interval, timeout } => {
                self.wait_for_receipt(hash, poll_interval, timeout).await?
            }
        }

        Ok(hash)
    }

    async fn read_back(&self, node: Node, key: &str) -> std::result::Result<(), WriteError> {
        let text = self.text(node, key).await.map_err(WriteError::Verify)?;
        if text.is_empty() {
            warn!("text {} of {} is empty after write", key, node);
            return Err(WriteError::NotSet);
        }
        debug!("added text: {}", text);
        Ok(())
    }

    async fn wait_for_receipt(
        &self,
        hash: H256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> std::result::Result<(), WriteError> {
        let started = Instant::now();
        loop {
            let receipt = self
                .web3
                .eth()
                .transaction_receipt(hash)
                .await
                .map_err(|err| {
                    warn!("error getting receipt of tx {:?}: {}", hash, err);
                    WriteError::Receipt(err)
                })?;

            match receipt {
                Some(receipt) if receipt.status == Some(U64::zero()) => {
                    warn!("tx {:?} reverted in block {:?}", hash, receipt.block_number);
                    return Err(WriteError::Reverted(hash));
                }
                Some(receipt) => {
                    debug!("tx {:?} included in block {:?}", hash, receipt.block_number);
                    return Ok(());
                }
                None if started.elapsed() >= timeout => {
                    warn!("no receipt for tx {:?} after {:?}", hash, timeout);
                    return Err(WriteError::ReceiptTimeout(hash));
                }
                None => Delay::new(poll_interval).await,
            }
        }
    }
}

async fn chain_id<T: Transport>(web3: &Web3<T>) -> std::result::Result<U256, NetworkError> {
    let id = web3.eth().chain_id().await.map_err(|err| {
        warn!("error getting network id: {}", err);
        NetworkError(err)
    })?;
    // signing takes a u64 chain id
    if id.bits() > 64 {
        warn!("network id {} does not fit in 64 bits", id);
        return Err(NetworkError(web3::Error::InvalidResponse(format!(
            "chain id {} does not fit in 64 bits",
            id
        ))));
    }
    Ok(id)
}

async fn registry_at<T: Transport>(
    web3: &Web3<T>,
    address: &str,
    verify: bool,
) -> std::result::Result<Registry<T>, BindError> {
    let result = async {
        let address = parse_address(address)?;
        let registry = Registry::new(web3.eth(), address).map_err(BindError::Abi)?;
        if verify {
            ensure_code(web3, address).await?;
            // a registry answers recordExists, anything else reverts or returns undecodable output
            match registry.record_exists([0u8; 32]).await {
                Ok(_) => {}
                Err(ContractError::Api(web3::Error::Rpc(_))) => return Err(BindError::Incompatible(address)),
                Err(ContractError::Api(err)) => return Err(BindError::Transport(err)),
                Err(_) => return Err(BindError::Incompatible(address)),
            }
        }
        Ok::<_, BindError>(registry)
    };
    result.await.map_err(|err| {
        warn!("error constructing registry contract handle: {}", err);
        err
    })
}

async fn resolver_at<T: Transport>(
    web3: &Web3<T>,
    address: &str,
    verify: bool,
) -> std::result::Result<Resolver<T>, BindError> {
    let result = async {
        let address = parse_address(address)?;
        let resolver = Resolver::new(web3.eth(), address).map_err(BindError::Abi)?;
        if verify {
            ensure_code(web3, address).await?;
            let supported = resolver
                .supports_interface(TEXT_INTERFACE_ID)
                .await
                .map_err(BindError::Api)?;
            if !supported {
                return Err(BindError::Incompatible(address));
            }
        }
        Ok::<_, BindError>(resolver)
    };
    result.await.map_err(|err| {
        warn!("error constructing resolver contract handle: {}", err);
        err
    })
}

async fn ensure_code<T: Transport>(web3: &Web3<T>, address: Address) -> std::result::Result<(), BindError> {
    let code = web3.eth().code(address, None).await.map_err(BindError::Transport)?;
    if code.0.is_empty() {
        return Err(BindError::NoContract(address));
    }
    Ok(())
}

fn parse_address(address: &str) -> std::result::Result<Address, BindError> {
    let trimmed = address.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    match hex::decode(digits) {
        Ok(ref bytes) if bytes.len() == 20 => Ok(Address::from_slice(bytes)),
        _ => Err(BindError::MalformedAddress(address.into())),
    }
}
