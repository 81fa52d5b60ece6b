use std::sync::Arc;

use ethers_core::types::U256;
use futures::future;
use log::debug;

use erc721_types::{
    calls, Erc721Token, EvmAddress, FetchError, TokenDetailFetcher, TokenId,
};

use crate::const_args::DEFAULT_FETCH_CONCURRENCY;
use crate::contracts::{u256_to_u64, Erc721Contract};
use crate::resolver::OwnershipResolver;
use crate::Error;

/// Read-only view over one collection: contract calls for chain state,
/// the resolver for ownership discovery and a [`TokenDetailFetcher`] for
/// off-chain token detail.
pub struct Erc721Reader {
    contract: Erc721Contract,
    resolver: OwnershipResolver,
    fetcher: Arc<dyn TokenDetailFetcher>,
    concurrency: usize,
}

impl Erc721Reader {
    pub fn new(resolver: OwnershipResolver, fetcher: Arc<dyn TokenDetailFetcher>) -> Self {
        Erc721Reader {
            contract: resolver.contract().clone(),
            resolver,
            fetcher,
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Caps in-flight detail fetches. A zero cap is bumped to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One token record by id. Missing detail surfaces as
    /// [`FetchError::NotFound`]; only set enumeration degrades.
    pub async fn get(&self, token_id: TokenId) -> Result<Erc721Token, Error> {
        Ok(self.fetcher.fetch_detail(token_id).await?)
    }

    /// Records for ids in `[start, min(start + count, totalSupply))`,
    /// assuming the sequential layout the scan tier assumes.
    pub async fn get_all(&self, start: u64, count: u64) -> Result<Vec<Erc721Token>, Error> {
        let supply = self.contract.total_supply().await?;
        let supply = u256_to_u64(calls::TOTAL_SUPPLY, supply)?;
        let end = start.saturating_add(count).min(supply);
        if start >= end {
            return Ok(Vec::new());
        }
        let ids: Vec<TokenId> = (start..end).map(U256::from).collect();
        self.fetch_records(ids, None).await
    }

    /// The token ids `wallet` owns, in the order the winning tier
    /// produced them.
    pub async fn owned_token_ids(&self, wallet: EvmAddress) -> Result<Vec<TokenId>, Error> {
        Ok(self.resolver.resolve(wallet).await?)
    }

    /// Full records for every token `wallet` owns.
    pub async fn owned(&self, wallet: EvmAddress) -> Result<Vec<Erc721Token>, Error> {
        let ids = self.resolver.resolve(wallet).await?;
        self.fetch_records(ids, Some(wallet)).await
    }

    pub async fn total_supply(&self) -> Result<U256, Error> {
        Ok(self.contract.total_supply().await?)
    }

    pub async fn balance_of(&self, owner: EvmAddress) -> Result<U256, Error> {
        Ok(self.contract.balance_of(owner).await?)
    }

    pub async fn owner_of(&self, token_id: TokenId) -> Result<EvmAddress, Error> {
        Ok(self.contract.owner_of(token_id).await?)
    }

    /// Fetches detail records with bounded fan-out, keeping id order.
    /// Missing detail degrades to a bare record so one absent metadata
    /// document cannot sink a whole enumeration; transport failures
    /// abort.
    async fn fetch_records(
        &self,
        ids: Vec<TokenId>,
        owner: Option<EvmAddress>,
    ) -> Result<Vec<Erc721Token>, Error> {
        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.concurrency) {
            let batch: Vec<_> = chunk.iter().map(|id| self.fetcher.fetch_detail(*id)).collect();
            for (id, result) in chunk.iter().zip(future::join_all(batch).await) {
                match result {
                    Ok(mut record) => {
                        if record.owner.is_none() {
                            record.owner = owner;
                        }
                        records.push(record);
                    }
                    Err(FetchError::NotFound(_)) => {
                        debug!("[reader] no detail for token {}, keeping a bare record", id);
                        let mut record = Erc721Token::bare(*id);
                        record.owner = owner;
                        records.push(record);
                    }
                    Err(err @ FetchError::Network(_)) => return Err(err.into()),
                }
            }
        }
        Ok(records)
    }
}
