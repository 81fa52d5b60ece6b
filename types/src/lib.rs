use derive_more::Display;

pub mod address;
pub mod call_error;
pub mod calls;
pub mod fetch;
pub mod token;

pub use address::{EvmAddress, EvmAddressError};
pub use call_error::{CallError, Reason};
pub use calls::{ContractCaller, ReadCall};
pub use fetch::{FetchError, TokenDetailFetcher};
pub use token::{Erc721Token, NftAttribute, NftMetadata};

/// Token identifier inside one ERC721 contract. Identifiers are drawn from
/// a 256-bit space, so the full range must round-trip unclipped.
pub type TokenId = ethers_core::types::U256;

/// One capability-specific strategy for enumerating the tokens a wallet
/// owns.
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityTier {
    /// `ERC721Enumerable`: `balanceOf` plus a `tokenOfOwnerByIndex` loop.
    #[display(fmt = "ERC721Enumerable")]
    EnumerableIndex,
    /// `ERC721AQueryable`: one bulk `tokensOfOwner` round trip.
    #[display(fmt = "ERC721AQueryable")]
    QueryableBulk,
    /// Walk `[0, totalSupply)` with `ownerOf` and keep the matches.
    #[display(fmt = "ownerOf scan")]
    LinearScan,
}

impl CapabilityTier {
    /// Probe order. A later tier must not be attempted until the earlier
    /// one has fully failed.
    pub const ALL: [CapabilityTier; 3] = [
        CapabilityTier::EnumerableIndex,
        CapabilityTier::QueryableBulk,
        CapabilityTier::LinearScan,
    ];
}

/// Parameters of one ownership enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipQuery {
    pub wallet: EvmAddress,
    /// Authoritative upper bound on the owned-token count, fetched once
    /// via `balanceOf` before any tier is probed.
    pub expected_balance: u64,
}
