//! Registry and resolver contract proxies.
//!
//! Both proxies wrap a `web3` [`Contract`](web3::contract::Contract) built from
//! the ABI fragments embedded next to this module.

mod registry;
mod resolver;

pub use self::registry::Registry;
pub use self::resolver::{Resolver, TEXT_INTERFACE_ID};
