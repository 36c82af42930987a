//! In-memory node for tests.
//!
//! Answers the handful of `eth_*` methods the directory uses and keeps just
//! enough chain state (text records, nonces, receipts) for writes to be
//! observable through later reads.

use ethabi::Token;
use futures::future::{self, BoxFuture, FutureExt};
use jsonrpc_core as rpc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use web3::{
    error::{Error, TransportError},
    helpers,
    signing::keccak256,
    types::{Address, Bytes, H160, H256, U256},
    RequestId, Transport,
};

use crate::contract::TEXT_INTERFACE_ID;

const ERC165_INTERFACE_ID: [u8; 4] = [0x01, 0xff, 0xc9, 0xa7];

/// What is deployed at a mock address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deployed {
    Registry,
    Resolver,
    /// ERC-165 contract without text records.
    Other,
}

/// How submitted transactions are handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mining {
    /// applied and receipted on submission
    Instant,
    /// accepted but never included
    Never,
    /// included with a failed status
    Revert,
}

/// A decoded legacy transaction as seen by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct SentTx {
    pub hash: H256,
    pub nonce: U256,
    pub gas_price: U256,
    pub gas: U256,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct State {
    chain_id: U256,
    contracts: HashMap<Address, Deployed>,
    nonces: HashMap<Address, U256>,
    texts: HashMap<([u8; 32], String), String>,
    owners: HashMap<[u8; 32], Address>,
    mining: Mining,
    receipt_delay: usize,
    receipts: HashMap<H256, bool>,
    failing: HashSet<String>,
    requests: Vec<(String, Vec<Value>)>,
    transactions: Vec<SentTx>,
}

/// Stateful test transport.
#[derive(Debug, Clone)]
pub struct MockNode {
    state: Arc<Mutex<State>>,
    registry_abi: Arc<ethabi::Contract>,
    resolver_abi: Arc<ethabi::Contract>,
}

impl MockNode {
    pub const CHAIN_ID: u64 = 5;
    pub const REGISTRY: Address = H160([0x11; 20]);
    pub const RESOLVER: Address = H160([0x22; 20]);

    /// Node with a registry and a resolver deployed at the well-known addresses.
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut contracts = HashMap::new();
        contracts.insert(Self::REGISTRY, Deployed::Registry);
        contracts.insert(Self::RESOLVER, Deployed::Resolver);

        MockNode {
            state: Arc::new(Mutex::new(State {
                chain_id: Self::CHAIN_ID.into(),
                contracts,
                nonces: HashMap::new(),
                texts: HashMap::new(),
                owners: HashMap::new(),
                mining: Mining::Instant,
                receipt_delay: 0,
                receipts: HashMap::new(),
                failing: HashSet::new(),
                requests: Vec::new(),
                transactions: Vec::new(),
            })),
            registry_abi: Arc::new(load_abi(include_bytes!("contract/Registry.json"))),
            resolver_abi: Arc::new(load_abi(include_bytes!("contract/Resolver.json"))),
        }
    }

    pub fn set_chain_id(&self, chain_id: U256) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn deploy(&self, address: Address, kind: Deployed) {
        self.state.lock().contracts.insert(address, kind);
    }

    pub fn put_text(&self, node: [u8; 32], key: &str, value: &str) {
        self.state.lock().texts.insert((node, key.into()), value.into());
    }

    pub fn text(&self, node: [u8; 32], key: &str) -> Option<String> {
        self.state.lock().texts.get(&(node, key.to_owned())).cloned()
    }

    pub fn set_owner(&self, node: [u8; 32], owner: Address) {
        self.state.lock().owners.insert(node, owner);
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().nonces.insert(address, nonce.into());
    }

    pub fn set_mining(&self, mining: Mining) {
        self.state.lock().mining = mining;
    }

    /// Answer `null` to the next `polls` receipt queries.
    pub fn delay_receipts(&self, polls: usize) {
        self.state.lock().receipt_delay = polls;
    }

    /// Make every call to `method` fail at the transport level.
    pub fn fail(&self, method: &str) {
        self.state.lock().failing.insert(method.into());
    }

    pub fn methods(&self) -> Vec<String> {
        self.state.lock().requests.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn params(&self, idx: usize) -> Vec<Value> {
        self.state.lock().requests[idx].1.clone()
    }

    pub fn transactions(&self) -> Vec<SentTx> {
        self.state.lock().transactions.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    pub fn assert_no_requests(&self) {
        let state = self.state.lock();
        assert!(state.requests.is_empty(), "Expected no requests, got: {:?}", state.requests);
    }

    fn handle(&self, method: &str, params: Vec<Value>) -> web3::Result<Value> {
        let mut state = self.state.lock();
        if state.failing.contains(method) {
            return Err(Error::Transport(TransportError::Message(format!("{} failed", method))));
        }

        match method {
            "eth_chainId" => Ok(json!(state.chain_id)),
            "eth_getCode" => {
                let address: Address = param(&params, 0)?;
                let code = if state.contracts.contains_key(&address) {
                    Bytes(vec![0x60, 0x80, 0x60, 0x40, 0x52])
                } else {
                    Bytes(vec![])
                };
                Ok(json!(code))
            }
            "eth_getTransactionCount" => {
                let address: Address = param(&params, 0)?;
                Ok(json!(state.nonces.get(&address).cloned().unwrap_or_default()))
            }
            "eth_call" => {
                let request = params.get(0).cloned().unwrap_or(Value::Null);
                let to: Address = decode(request["to"].clone())?;
                let data: Bytes = match request.get("data") {
                    Some(data) => decode(data.clone())?,
                    None => decode(request["input"].clone())?,
                };
                let output = match state.contracts.get(&to) {
                    Some(Deployed::Registry) => self.registry_call(&state, &data.0)?,
                    Some(Deployed::Resolver) => self.resolver_call(&state, &data.0)?,
                    Some(Deployed::Other) => ethabi::encode(&[Token::Bool(false)]),
                    None => vec![],
                };
                Ok(json!(Bytes(output)))
            }
            "eth_sendRawTransaction" => {
                let raw: Bytes = param(&params, 0)?;
                let tx = decode_legacy(&raw.0)?;
                let hash = tx.hash;
                match state.mining {
                    Mining::Instant => {
                        let is_resolver = state.contracts.get(&tx.to) == Some(&Deployed::Resolver);
                        if is_resolver {
                            self.apply_set_text(&mut state, &tx.data)?;
                        }
                        state.receipts.insert(hash, true);
                    }
                    Mining::Revert => {
                        state.receipts.insert(hash, false);
                    }
                    Mining::Never => {}
                }
                state.transactions.push(tx);
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let hash: H256 = param(&params, 0)?;
                if state.receipt_delay > 0 {
                    state.receipt_delay -= 1;
                    return Ok(Value::Null);
                }
                Ok(match state.receipts.get(&hash) {
                    Some(&success) => receipt(hash, success),
                    None => Value::Null,
                })
            }
            _ => Err(Error::Unreachable),
        }
    }

    fn registry_call(&self, state: &State, data: &[u8]) -> web3::Result<Vec<u8>> {
        let (name, tokens) = match decode_call(&self.registry_abi, data) {
            Ok(call) => call,
            // unknown functions fall through to an empty fallback
            Err(_) => return Ok(vec![]),
        };
        let node = fixed_bytes(&tokens, 0)?;
        let owner = state.owners.get(&node).cloned();
        let output = match name.as_str() {
            "owner" => Token::Address(owner.unwrap_or_default()),
            "resolver" => Token::Address(owner.map(|_| Self::RESOLVER).unwrap_or_default()),
            "ttl" => Token::Uint(U256::zero()),
            "recordExists" => Token::Bool(owner.is_some()),
            other => return Err(Error::Decoder(format!("unexpected registry call {}", other))),
        };
        Ok(ethabi::encode(&[output]))
    }

    fn resolver_call(&self, state: &State, data: &[u8]) -> web3::Result<Vec<u8>> {
        let (name, tokens) = match decode_call(&self.resolver_abi, data) {
            Ok(call) => call,
            Err(_) => return Ok(vec![]),
        };
        let output = match name.as_str() {
            "text" => {
                let node = fixed_bytes(&tokens, 0)?;
                let key = string(&tokens, 1)?;
                Token::String(state.texts.get(&(node, key)).cloned().unwrap_or_default())
            }
            "supportsInterface" => {
                let id = tokens.get(0).cloned().and_then(Token::into_fixed_bytes).unwrap_or_default();
                Token::Bool(id[..] == TEXT_INTERFACE_ID[..] || id[..] == ERC165_INTERFACE_ID[..])
            }
            other => return Err(Error::Decoder(format!("unexpected resolver call {}", other))),
        };
        Ok(ethabi::encode(&[output]))
    }

    fn apply_set_text(&self, state: &mut State, data: &[u8]) -> web3::Result<()> {
        let (name, tokens) = decode_call(&self.resolver_abi, data)?;
        if name != "setText" {
            return Err(Error::Decoder(format!("unexpected resolver transaction {}", name)));
        }
        let node = fixed_bytes(&tokens, 0)?;
        let key = string(&tokens, 1)?;
        let value = string(&tokens, 2)?;
        state.texts.insert((node, key), value);
        Ok(())
    }
}

impl Transport for MockNode {
    type Out = BoxFuture<'static, web3::Result<rpc::Value>>;

    fn prepare(&self, method: &str, params: Vec<rpc::Value>) -> (RequestId, rpc::Call) {
        let mut state = self.state.lock();
        state.requests.push((method.into(), params.clone()));
        let id = state.requests.len();
        (id, helpers::build_request(id, method, params))
    }

    fn send(&self, _id: RequestId, request: rpc::Call) -> Self::Out {
        let result = match request {
            rpc::Call::MethodCall(call) => {
                let params = match call.params {
                    rpc::Params::Array(params) => params,
                    _ => vec![],
                };
                self.handle(&call.method, params)
            }
            _ => Err(Error::Unreachable),
        };
        future::ready(result).boxed()
    }
}

fn load_abi(json: &[u8]) -> ethabi::Contract {
    ethabi::Contract::load(json).expect("embedded ABI is valid")
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> web3::Result<T> {
    serde_json::from_value(value).map_err(Into::into)
}

fn param<T: serde::de::DeserializeOwned>(params: &[Value], idx: usize) -> web3::Result<T> {
    decode(params.get(idx).cloned().unwrap_or(Value::Null))
}

fn decode_call(abi: &ethabi::Contract, data: &[u8]) -> web3::Result<(String, Vec<Token>)> {
    if data.len() < 4 {
        return Err(Error::Decoder("call data too short".into()));
    }
    let function = abi
        .functions()
        .find(|f| f.short_signature()[..] == data[..4])
        .ok_or_else(|| Error::Decoder(format!("unknown selector {}", hex::encode(&data[..4]))))?;
    let tokens = function
        .decode_input(&data[4..])
        .map_err(|e| Error::Decoder(format!("{:?}", e)))?;
    Ok((function.name.clone(), tokens))
}

fn fixed_bytes(tokens: &[Token], idx: usize) -> web3::Result<[u8; 32]> {
    match tokens.get(idx) {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(bytes);
            Ok(out)
        }
        other => Err(Error::Decoder(format!("expected bytes32, got {:?}", other))),
    }
}

fn string(tokens: &[Token], idx: usize) -> web3::Result<String> {
    match tokens.get(idx) {
        Some(Token::String(s)) => Ok(s.clone()),
        other => Err(Error::Decoder(format!("expected string, got {:?}", other))),
    }
}

/// Decodes `[nonce, gasPrice, gas, to, value, data, v, r, s]`.
fn decode_legacy(raw: &[u8]) -> web3::Result<SentTx> {
    let rlp = rlp::Rlp::new(raw);
    let field = |idx: usize| -> web3::Result<Vec<u8>> {
        rlp.at(idx)
            .and_then(|item| item.data().map(|d| d.to_vec()))
            .map_err(|e| Error::Decoder(format!("{:?}", e)))
    };
    let to = field(3)?;
    if to.len() != 20 {
        return Err(Error::Decoder("expected call transaction".into()));
    }

    Ok(SentTx {
        hash: H256::from(keccak256(raw)),
        nonce: U256::from_big_endian(&field(0)?),
        gas_price: U256::from_big_endian(&field(1)?),
        gas: U256::from_big_endian(&field(2)?),
        to: Address::from_slice(&to),
        value: U256::from_big_endian(&field(4)?),
        data: field(5)?,
    })
}

fn receipt(hash: H256, success: bool) -> Value {
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": H256::from_low_u64_be(1),
        "blockNumber": "0x1",
        "from": Address::zero(),
        "to": MockNode::RESOLVER,
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "contractAddress": null,
        "logs": [],
        "status": if success { "0x1" } else { "0x0" },
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
    })
}
