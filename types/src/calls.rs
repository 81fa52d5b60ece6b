use async_trait::async_trait;
use ethers_core::abi::Token;

use crate::address::EvmAddress;
use crate::call_error::CallError;

// ERC721 read functions the client issues. The mock matches on the same
// names, so they live here rather than in the client crate.
pub const BALANCE_OF: &str = "balanceOf";
pub const OWNER_OF: &str = "ownerOf";
pub const TOKEN_OF_OWNER_BY_INDEX: &str = "tokenOfOwnerByIndex";
pub const TOKENS_OF_OWNER: &str = "tokensOfOwner";
pub const TOTAL_SUPPLY: &str = "totalSupply";
pub const TOKEN_URI: &str = "tokenURI";
pub const NAME: &str = "name";
pub const SYMBOL: &str = "symbol";

/// One read call against a contract, in decoded form. Arguments and
/// return values are `ethers` ABI tokens; turning them into calldata and
/// back is the transport's business, not this crate's.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadCall {
    pub contract: EvmAddress,
    pub function: String,
    pub args: Vec<Token>,
}

impl ReadCall {
    pub fn new(contract: EvmAddress, function: impl Into<String>, args: Vec<Token>) -> Self {
        ReadCall {
            contract,
            function: function.into(),
            args,
        }
    }
}

/// Read-call seam between the enumeration logic and whatever actually
/// talks to the chain. Native RPC clients and bridge invokers both hide
/// behind this; the resolver is agnostic to which it got.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    async fn call(&self, call: ReadCall) -> Result<Vec<Token>, CallError>;
}
