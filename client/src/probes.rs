use std::future::Future;

use async_trait::async_trait;
use ethers_core::types::U256;
use futures::future::{self, Either};
use futures::pin_mut;
use log::debug;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use erc721_types::{calls, CallError, CapabilityTier, OwnershipQuery, Reason, TokenId};

use crate::contracts::{u256_to_u64, Erc721Contract};

/// Why a capability probe produced no result.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The tier is unusable on this contract; the resolver falls through
    /// to the next one.
    #[error(transparent)]
    Call(#[from] CallError),
    /// The caller cancelled the resolution; nothing falls through.
    #[error("probe cancelled")]
    Cancelled,
}

/// Fan-out settings shared by every probe of one resolution.
#[derive(Clone)]
pub struct ProbeLimits {
    pub concurrency: usize,
    pub cancel: CancellationToken,
}

/// One enumeration strategy. Probes are tried in [`CapabilityTier::ALL`]
/// order; a probe either returns the complete owned set or fails as a
/// whole, so partial results never leak across tiers.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    fn tier(&self) -> CapabilityTier;

    async fn try_resolve(
        &self,
        contract: &Erc721Contract,
        query: &OwnershipQuery,
        limits: &ProbeLimits,
    ) -> Result<Vec<TokenId>, ProbeError>;
}

/// The built-in probes in tier order.
pub fn default_probes() -> Vec<Box<dyn CapabilityProbe>> {
    vec![
        Box::new(EnumerableIndexProbe),
        Box::new(QueryableBulkProbe),
        Box::new(LinearScanProbe),
    ]
}

/// Races `fut` against cancellation, dropping it mid-flight if the token
/// fires first.
pub(crate) async fn cancellable<T, F>(fut: F, cancel: &CancellationToken) -> Result<T, ProbeError>
where
    F: Future<Output = T>,
{
    let cancelled = cancel.cancelled();
    pin_mut!(fut);
    pin_mut!(cancelled);
    match future::select(cancelled, fut).await {
        Either::Left(((), _)) => Err(ProbeError::Cancelled),
        Either::Right((value, _)) => Ok(value),
    }
}

/// Runs one batch of calls concurrently. `join_all` hands the outputs
/// back in input order, which keeps results written by index rather than
/// by completion order.
async fn join_batch<T, F>(
    batch: Vec<F>,
    cancel: &CancellationToken,
) -> Result<Vec<Result<T, CallError>>, ProbeError>
where
    F: Future<Output = Result<T, CallError>>,
{
    cancellable(future::join_all(batch), cancel).await
}

/// `ERC721Enumerable`: walk `tokenOfOwnerByIndex` for every index below
/// the expected balance.
pub struct EnumerableIndexProbe;

#[async_trait]
impl CapabilityProbe for EnumerableIndexProbe {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::EnumerableIndex
    }

    async fn try_resolve(
        &self,
        contract: &Erc721Contract,
        query: &OwnershipQuery,
        limits: &ProbeLimits,
    ) -> Result<Vec<TokenId>, ProbeError> {
        let mut out = Vec::with_capacity(query.expected_balance as usize);
        let mut next = 0u64;
        while next < query.expected_balance {
            let end = next
                .saturating_add(limits.concurrency as u64)
                .min(query.expected_balance);
            let batch: Vec<_> = (next..end)
                .map(|i| contract.token_of_owner_by_index(query.wallet, i))
                .collect();
            // Any failing index abandons the whole tier.
            for result in join_batch(batch, &limits.cancel).await? {
                out.push(result?);
            }
            next = end;
        }
        Ok(out)
    }
}

/// `ERC721AQueryable`: the full owned set in one `tokensOfOwner` round
/// trip.
pub struct QueryableBulkProbe;

#[async_trait]
impl CapabilityProbe for QueryableBulkProbe {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::QueryableBulk
    }

    async fn try_resolve(
        &self,
        contract: &Erc721Contract,
        query: &OwnershipQuery,
        limits: &ProbeLimits,
    ) -> Result<Vec<TokenId>, ProbeError> {
        let ids = cancellable(contract.tokens_of_owner(query.wallet), &limits.cancel).await??;
        Ok(ids)
    }
}

/// Last resort: walk `[0, totalSupply)` with `ownerOf` and keep the ids
/// owned by the wallet. Assumes sequential ids, like the contracts this
/// tier exists for.
pub struct LinearScanProbe;

#[async_trait]
impl CapabilityProbe for LinearScanProbe {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::LinearScan
    }

    async fn try_resolve(
        &self,
        contract: &Erc721Contract,
        query: &OwnershipQuery,
        limits: &ProbeLimits,
    ) -> Result<Vec<TokenId>, ProbeError> {
        let supply = cancellable(contract.total_supply(), &limits.cancel).await??;
        let total = u256_to_u64(calls::TOTAL_SUPPLY, supply)?;
        let mut found = Vec::with_capacity(query.expected_balance as usize);
        let mut next = 0u64;
        // Stop issuing batches once the expected balance is complete; the
        // check sits between batches, so with concurrency 1 the scan ends
        // exactly at the index that completed the balance.
        while next < total && (found.len() as u64) < query.expected_balance {
            let end = next.saturating_add(limits.concurrency as u64).min(total);
            let batch: Vec<_> = (next..end)
                .map(|i| contract.owner_of(U256::from(i)))
                .collect();
            let results = join_batch(batch, &limits.cancel).await?;
            for (offset, result) in results.into_iter().enumerate() {
                if (found.len() as u64) == query.expected_balance {
                    break;
                }
                match result {
                    Ok(owner) if owner == query.wallet => {
                        found.push(U256::from(next + offset as u64));
                    }
                    Ok(_) => {}
                    Err(err) if matches!(err.reason, Reason::Reverted(_)) => {
                        // Burned or never-minted ids revert ownerOf; that
                        // is non-ownership, not a broken tier.
                        debug!(
                            "[probe] ownerOf({}) reverted during scan: {}",
                            next + offset as u64,
                            err
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            next = end;
        }
        Ok(found)
    }
}
