//! In-memory stand-ins for the chain side and the metadata side of the
//! client, used by the workspace test suites.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::U256;
use futures::future;

use erc721_types::{
    calls, CallError, ContractCaller, Erc721Token, EvmAddress, FetchError, ReadCall,
    TokenDetailFetcher, TokenId,
};

enum FailMode {
    Always,
    /// Fails the n-th invocation (1-based) and no other.
    Nth(u64),
}

struct TokenEntry {
    owner: EvmAddress,
    uri: String,
}

struct MockState {
    name: String,
    symbol: String,
    tokens: BTreeMap<TokenId, TokenEntry>,
    minted: u64,
    enumerable: bool,
    queryable: bool,
    supply: bool,
    counters: BTreeMap<String, u64>,
    failures: BTreeMap<String, FailMode>,
    hangs: BTreeSet<String>,
}

/// In-memory ERC721 contract. All capabilities answer by default; tests
/// switch individual ones off to steer the resolver down the tiers.
///
/// `totalSupply` reports the minted count and does not shrink on burn,
/// so burned ids stay inside the scan range. Linear-scan seedings should
/// mint sequential ids from zero to keep that range aligned.
pub struct MockErc721 {
    state: Mutex<MockState>,
}

impl Default for MockErc721 {
    fn default() -> Self {
        Self::new()
    }
}

impl MockErc721 {
    pub fn new() -> Self {
        MockErc721 {
            state: Mutex::new(MockState {
                name: "Mock Collection".to_string(),
                symbol: "MOCK".to_string(),
                tokens: BTreeMap::new(),
                minted: 0,
                enumerable: true,
                queryable: true,
                supply: true,
                counters: BTreeMap::new(),
                failures: BTreeMap::new(),
                hangs: BTreeSet::new(),
            }),
        }
    }

    pub fn with_collection(self, name: &str, symbol: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.name = name.to_string();
            state.symbol = symbol.to_string();
        }
        self
    }

    /// `tokenOfOwnerByIndex` answers `Reason::Unsupported`.
    pub fn without_enumerable(self) -> Self {
        self.state.lock().unwrap().enumerable = false;
        self
    }

    /// `tokensOfOwner` answers `Reason::Unsupported`.
    pub fn without_queryable(self) -> Self {
        self.state.lock().unwrap().queryable = false;
        self
    }

    /// `totalSupply` answers `Reason::Unsupported`.
    pub fn without_supply(self) -> Self {
        self.state.lock().unwrap().supply = false;
        self
    }

    pub fn mint(&self, owner: EvmAddress, id: TokenId, uri: &str) {
        let mut state = self.state.lock().unwrap();
        state.tokens.insert(
            id,
            TokenEntry {
                owner,
                uri: uri.to_string(),
            },
        );
        state.minted += 1;
    }

    /// Removes the token; the minted count keeps covering its id.
    pub fn burn(&self, id: TokenId) {
        self.state.lock().unwrap().tokens.remove(&id);
    }

    /// Every following invocation of `function` fails with a transport
    /// error.
    pub fn fail_function(&self, function: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(function.to_string(), FailMode::Always);
    }

    /// The `nth` invocation of `function` (1-based, counted from now on)
    /// fails with a transport error.
    pub fn fail_nth(&self, function: &str, nth: u64) {
        let mut state = self.state.lock().unwrap();
        let seen = state.counters.get(function).copied().unwrap_or(0);
        state
            .failures
            .insert(function.to_string(), FailMode::Nth(seen + nth));
    }

    /// Invocations of `function` never complete. For cancellation tests.
    pub fn hang_function(&self, function: &str) {
        self.state
            .lock()
            .unwrap()
            .hangs
            .insert(function.to_string());
    }

    /// How often `function` has been invoked, faults included.
    pub fn calls(&self, function: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .counters
            .get(function)
            .copied()
            .unwrap_or(0)
    }
}

impl MockState {
    fn owned_ids(&self, owner: &EvmAddress) -> Vec<TokenId> {
        self.tokens
            .iter()
            .filter(|(_, entry)| entry.owner == *owner)
            .map(|(id, _)| *id)
            .collect()
    }

    fn should_fail(&self, function: &str, seen: u64) -> bool {
        match self.failures.get(function) {
            Some(FailMode::Always) => true,
            Some(FailMode::Nth(n)) => seen == *n,
            None => false,
        }
    }

    fn answer(&self, call: &ReadCall) -> Result<Vec<Token>, CallError> {
        match call.function.as_str() {
            calls::BALANCE_OF => {
                let owner = address_arg(call, 0);
                let balance = self.owned_ids(&owner).len() as u64;
                Ok(vec![Token::Uint(U256::from(balance))])
            }
            calls::OWNER_OF => {
                let id = uint_arg(call, 0);
                match self.tokens.get(&id) {
                    Some(entry) => Ok(vec![Token::Address(entry.owner.into())]),
                    None => Err(CallError::reverted(
                        calls::OWNER_OF,
                        "ERC721: invalid token ID",
                    )),
                }
            }
            calls::TOKEN_OF_OWNER_BY_INDEX => {
                if !self.enumerable {
                    return Err(CallError::unsupported(calls::TOKEN_OF_OWNER_BY_INDEX));
                }
                let owner = address_arg(call, 0);
                let index = uint_arg(call, 1);
                let ids = self.owned_ids(&owner);
                if index >= U256::from(ids.len()) {
                    return Err(CallError::reverted(
                        calls::TOKEN_OF_OWNER_BY_INDEX,
                        "ERC721Enumerable: owner index out of bounds",
                    ));
                }
                Ok(vec![Token::Uint(ids[index.as_usize()])])
            }
            calls::TOKENS_OF_OWNER => {
                if !self.queryable {
                    return Err(CallError::unsupported(calls::TOKENS_OF_OWNER));
                }
                let owner = address_arg(call, 0);
                let ids = self.owned_ids(&owner).into_iter().map(Token::Uint).collect();
                Ok(vec![Token::Array(ids)])
            }
            calls::TOTAL_SUPPLY => {
                if !self.supply {
                    return Err(CallError::unsupported(calls::TOTAL_SUPPLY));
                }
                Ok(vec![Token::Uint(U256::from(self.minted))])
            }
            calls::TOKEN_URI => {
                let id = uint_arg(call, 0);
                match self.tokens.get(&id) {
                    Some(entry) => Ok(vec![Token::String(entry.uri.clone())]),
                    None => Err(CallError::reverted(
                        calls::TOKEN_URI,
                        "ERC721: invalid token ID",
                    )),
                }
            }
            calls::NAME => Ok(vec![Token::String(self.name.clone())]),
            calls::SYMBOL => Ok(vec![Token::String(self.symbol.clone())]),
            other => Err(CallError::unsupported(other)),
        }
    }
}

fn address_arg(call: &ReadCall, at: usize) -> EvmAddress {
    call.args
        .get(at)
        .cloned()
        .and_then(Token::into_address)
        .expect("mock called without an address argument")
        .into()
}

fn uint_arg(call: &ReadCall, at: usize) -> U256 {
    call.args
        .get(at)
        .cloned()
        .and_then(Token::into_uint)
        .expect("mock called without a uint argument")
}

#[async_trait]
impl ContractCaller for MockErc721 {
    async fn call(&self, call: ReadCall) -> Result<Vec<Token>, CallError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            let seen = {
                let counter = state.counters.entry(call.function.clone()).or_insert(0);
                *counter += 1;
                *counter
            };
            if state.hangs.contains(&call.function) {
                None
            } else if state.should_fail(&call.function, seen) {
                Some(Err(CallError::transport(
                    &call.function,
                    "injected transport failure",
                )))
            } else {
                Some(state.answer(&call))
            }
        };
        match outcome {
            Some(result) => result,
            // Parked forever; only cancellation tears the caller away.
            None => future::pending().await,
        }
    }
}

#[derive(Default)]
struct FetcherState {
    records: BTreeMap<TokenId, Erc721Token>,
    network_down: bool,
    calls: u64,
}

/// In-memory [`TokenDetailFetcher`] keyed by token id.
#[derive(Default)]
pub struct MockDetailFetcher {
    state: Mutex<FetcherState>,
}

impl MockDetailFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: Erc721Token) {
        let mut state = self.state.lock().unwrap();
        state.records.insert(record.id, record);
    }

    /// Every following fetch fails with `FetchError::Network`.
    pub fn set_network_down(&self, down: bool) {
        self.state.lock().unwrap().network_down = down;
    }

    pub fn calls(&self) -> u64 {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl TokenDetailFetcher for MockDetailFetcher {
    async fn fetch_detail(&self, token_id: TokenId) -> Result<Erc721Token, FetchError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.network_down {
            return Err(FetchError::Network("injected network outage".to_string()));
        }
        state
            .records
            .get(&token_id)
            .cloned()
            .ok_or(FetchError::NotFound(token_id))
    }
}
