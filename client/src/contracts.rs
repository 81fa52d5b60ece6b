use std::sync::Arc;

use ethers_core::abi::Token;
use ethers_core::types::U256;

use erc721_types::{calls, CallError, ContractCaller, EvmAddress, ReadCall, TokenId};

/// Typed read handle over one ERC721 contract. Wraps the transport-
/// agnostic [`ContractCaller`] seam and decodes the returned ABI tokens;
/// it is passed around explicitly instead of living in process-wide
/// state.
#[derive(Clone)]
pub struct Erc721Contract {
    caller: Arc<dyn ContractCaller>,
    address: EvmAddress,
}

impl Erc721Contract {
    pub fn new(caller: Arc<dyn ContractCaller>, address: EvmAddress) -> Self {
        Erc721Contract { caller, address }
    }

    pub fn address(&self) -> EvmAddress {
        self.address
    }

    pub async fn balance_of(&self, owner: EvmAddress) -> Result<U256, CallError> {
        let ret = self
            .read(calls::BALANCE_OF, vec![Token::Address(owner.into())])
            .await?;
        single_uint(calls::BALANCE_OF, ret)
    }

    pub async fn owner_of(&self, token_id: TokenId) -> Result<EvmAddress, CallError> {
        let ret = self.read(calls::OWNER_OF, vec![Token::Uint(token_id)]).await?;
        single_address(calls::OWNER_OF, ret)
    }

    pub async fn token_of_owner_by_index(
        &self,
        owner: EvmAddress,
        index: u64,
    ) -> Result<TokenId, CallError> {
        let ret = self
            .read(
                calls::TOKEN_OF_OWNER_BY_INDEX,
                vec![Token::Address(owner.into()), Token::Uint(U256::from(index))],
            )
            .await?;
        single_uint(calls::TOKEN_OF_OWNER_BY_INDEX, ret)
    }

    pub async fn tokens_of_owner(&self, owner: EvmAddress) -> Result<Vec<TokenId>, CallError> {
        let ret = self
            .read(calls::TOKENS_OF_OWNER, vec![Token::Address(owner.into())])
            .await?;
        uint_array(calls::TOKENS_OF_OWNER, ret)
    }

    pub async fn total_supply(&self) -> Result<U256, CallError> {
        let ret = self.read(calls::TOTAL_SUPPLY, vec![]).await?;
        single_uint(calls::TOTAL_SUPPLY, ret)
    }

    pub async fn token_uri(&self, token_id: TokenId) -> Result<String, CallError> {
        let ret = self
            .read(calls::TOKEN_URI, vec![Token::Uint(token_id)])
            .await?;
        single_string(calls::TOKEN_URI, ret)
    }

    pub async fn name(&self) -> Result<String, CallError> {
        let ret = self.read(calls::NAME, vec![]).await?;
        single_string(calls::NAME, ret)
    }

    pub async fn symbol(&self) -> Result<String, CallError> {
        let ret = self.read(calls::SYMBOL, vec![]).await?;
        single_string(calls::SYMBOL, ret)
    }

    async fn read(&self, function: &str, args: Vec<Token>) -> Result<Vec<Token>, CallError> {
        self.caller
            .call(ReadCall::new(self.address, function, args))
            .await
    }
}

/// Checked narrowing for values that become loop bounds. Token ids stay
/// full U256; only iteration counts are capped.
pub(crate) fn u256_to_u64(method: &str, value: U256) -> Result<u64, CallError> {
    if value > U256::from(u64::MAX) {
        return Err(CallError::bad_response(
            method,
            format!("value {} does not fit into 64 bits", value),
        ));
    }
    Ok(value.as_u64())
}

fn single_token(method: &str, mut ret: Vec<Token>) -> Result<Token, CallError> {
    if ret.len() != 1 {
        return Err(CallError::bad_response(
            method,
            format!("expected one return value, got {}", ret.len()),
        ));
    }
    Ok(ret.remove(0))
}

fn single_uint(method: &str, ret: Vec<Token>) -> Result<U256, CallError> {
    single_token(method, ret)?
        .into_uint()
        .ok_or_else(|| CallError::bad_response(method, "expected a uint return value"))
}

fn single_address(method: &str, ret: Vec<Token>) -> Result<EvmAddress, CallError> {
    single_token(method, ret)?
        .into_address()
        .map(EvmAddress::from)
        .ok_or_else(|| CallError::bad_response(method, "expected an address return value"))
}

fn single_string(method: &str, ret: Vec<Token>) -> Result<String, CallError> {
    single_token(method, ret)?
        .into_string()
        .ok_or_else(|| CallError::bad_response(method, "expected a string return value"))
}

fn uint_array(method: &str, ret: Vec<Token>) -> Result<Vec<U256>, CallError> {
    let items = single_token(method, ret)?
        .into_array()
        .ok_or_else(|| CallError::bad_response(method, "expected an array return value"))?;
    items
        .into_iter()
        .map(|t| {
            t.into_uint()
                .ok_or_else(|| CallError::bad_response(method, "expected a uint array element"))
        })
        .collect()
}
