//! Directory errors.
use derive_more::{Display, From};
use web3::{contract::Error as ContractError, types::H256, Error as Web3Error};

/// Directory `Result` type.
pub type Result<T = ()> = std::result::Result<T, Error>;

/// Any failure surfaced by the directory handle.
#[derive(Debug, Display, From)]
pub enum Error {
    /// dial failure
    #[display(fmt = "Connection error: {}", _0)]
    Connection(ConnectionError),
    /// chain id query failure
    #[display(fmt = "Network error: {}", _0)]
    Network(NetworkError),
    /// proxy binding failure
    #[display(fmt = "Bind error: {}", _0)]
    Bind(BindError),
    /// resolver read failure
    #[display(fmt = "Read error: {}", _0)]
    Read(ReadError),
    /// write or verification failure
    #[display(fmt = "Write error: {}", _0)]
    Write(WriteError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::Error::*;
        match *self {
            Connection(ref e) => Some(e),
            Network(ref e) => Some(e),
            Bind(ref e) => Some(e),
            Read(ref e) => Some(e),
            Write(ref e) => Some(e),
        }
    }
}

/// Errors raised while dialing a node.
#[derive(Debug, Display)]
pub enum ConnectionError {
    /// the endpoint is not a URL
    #[display(fmt = "Invalid endpoint {}: {}", _0, _1)]
    InvalidEndpoint(String, url::ParseError),
    /// the endpoint scheme has no transport
    #[display(fmt = "Unsupported endpoint scheme: {}", _0)]
    UnsupportedScheme(String),
    /// the transport could not be created
    #[display(fmt = "Transport error: {}", _0)]
    Transport(Web3Error),
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ConnectionError::InvalidEndpoint(_, ref e) => Some(e),
            ConnectionError::UnsupportedScheme(_) => None,
            ConnectionError::Transport(ref e) => Some(e),
        }
    }
}

/// Chain id query failed.
#[derive(Debug, Display, From)]
#[display(fmt = "{}", _0)]
pub struct NetworkError(pub Web3Error);

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Errors raised while attaching a contract proxy.
#[derive(Debug, Display)]
pub enum BindError {
    /// not a 20-byte hex address
    #[display(fmt = "Malformed address: {}", _0)]
    MalformedAddress(String),
    /// the embedded ABI did not load
    #[display(fmt = "Abi error: {}", _0)]
    Abi(ethabi::Error),
    /// nothing is deployed at the address
    #[display(fmt = "No contract code at {:?}", _0)]
    NoContract(web3::types::Address),
    /// the contract does not expose the expected interface
    #[display(fmt = "Contract at {:?} does not expose the expected interface", _0)]
    Incompatible(web3::types::Address),
    /// interface query failed
    #[display(fmt = "Api error: {}", _0)]
    Api(ContractError),
    /// code lookup failed
    #[display(fmt = "Transport error: {}", _0)]
    Transport(Web3Error),
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::BindError::*;
        match *self {
            MalformedAddress(_) | NoContract(_) | Incompatible(_) => None,
            Abi(ref e) => Some(e),
            Api(ref e) => Some(e),
            Transport(ref e) => Some(e),
        }
    }
}

/// Resolver read failed.
#[derive(Debug, Display, From)]
#[display(fmt = "{}", _0)]
pub struct ReadError(pub ContractError);

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Errors raised on the write path.
#[derive(Debug, Display)]
pub enum WriteError {
    /// pending nonce could not be fetched
    #[display(fmt = "Nonce error: {}", _0)]
    Nonce(Web3Error),
    /// call data could not be encoded
    #[display(fmt = "Encode error: {}", _0)]
    Encode(ethabi::Error),
    /// transaction could not be signed
    #[display(fmt = "Sign error: {}", _0)]
    Sign(Web3Error),
    /// node rejected the transaction
    #[display(fmt = "Submit error: {}", _0)]
    Submit(Web3Error),
    /// read-back after submission failed
    #[display(fmt = "Verify error: {}", _0)]
    Verify(ReadError),
    /// read-back returned an empty value
    #[display(fmt = "text was not set, tx failed")]
    NotSet,
    /// receipt reported failure
    #[display(fmt = "Transaction {:?} reverted", _0)]
    Reverted(H256),
    /// receipt query failed
    #[display(fmt = "Receipt error: {}", _0)]
    Receipt(Web3Error),
    /// no receipt within the configured timeout
    #[display(fmt = "No receipt for {:?} before timeout", _0)]
    ReceiptTimeout(H256),
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::WriteError::*;
        match *self {
            Nonce(ref e) | Sign(ref e) | Submit(ref e) | Receipt(ref e) => Some(e),
            Encode(ref e) => Some(e),
            Verify(ref e) => Some(e),
            NotSet | Reverted(_) | ReceiptTimeout(_) => None,
        }
    }
}
