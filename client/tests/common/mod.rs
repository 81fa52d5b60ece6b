use std::sync::Arc;

use erc721_client::{Erc721Contract, OwnershipResolver};
use erc721_mock::MockErc721;
use erc721_types::{EvmAddress, TokenId};
use ethers_core::types::U256;

pub fn alice() -> EvmAddress {
    "0x00000000000000000000000000000000000000a1"
        .parse()
        .unwrap()
}

pub fn bob() -> EvmAddress {
    "0x00000000000000000000000000000000000000b2"
        .parse()
        .unwrap()
}

pub fn collection() -> EvmAddress {
    "0x00000000000000000000000000000000000000f1"
        .parse()
        .unwrap()
}

pub fn token(n: u64) -> TokenId {
    U256::from(n)
}

pub fn contract(mock: &Arc<MockErc721>) -> Erc721Contract {
    Erc721Contract::new(mock.clone(), collection())
}

/// Resolver over the mock with batch size 1, so per-function call counts
/// are exact.
pub fn resolver(mock: &Arc<MockErc721>) -> OwnershipResolver {
    OwnershipResolver::new(contract(mock)).with_concurrency(1)
}
