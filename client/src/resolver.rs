use log::{debug, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use erc721_types::{calls, EvmAddress, OwnershipQuery, TokenId};

use crate::const_args::DEFAULT_PROBE_CONCURRENCY;
use crate::contracts::{u256_to_u64, Erc721Contract};
use crate::probes::{cancellable, default_probes, CapabilityProbe, ProbeError, ProbeLimits};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Every capability tier failed, so the contract exposes no way to
    /// enumerate ownership.
    #[error("contract {contract} supports no ownership enumeration capability")]
    Unsupported { contract: EvmAddress },
    #[error("ownership resolution cancelled")]
    Cancelled,
}

/// Discovers the token ids a wallet owns by trying capability tiers in
/// order. Each tier either yields the complete owned set or fails as a
/// whole and the resolver falls through to the next one.
pub struct OwnershipResolver {
    contract: Erc721Contract,
    probes: Vec<Box<dyn CapabilityProbe>>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl OwnershipResolver {
    pub fn new(contract: Erc721Contract) -> Self {
        OwnershipResolver {
            contract,
            probes: default_probes(),
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }

    /// Caps in-flight calls per batch. A zero cap is bumped to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the built-in tier list. Probes run in the order given.
    pub fn with_probes(mut self, probes: Vec<Box<dyn CapabilityProbe>>) -> Self {
        self.probes = probes;
        self
    }

    pub fn contract(&self) -> &Erc721Contract {
        &self.contract
    }

    /// Resolves every token id `wallet` owns on the contract.
    ///
    /// `balanceOf` is consulted once up front. A zero balance resolves to
    /// an empty set without touching any tier, and no tier may return
    /// more ids than the balance reported here.
    pub async fn resolve(&self, wallet: EvmAddress) -> Result<Vec<TokenId>, ResolutionError> {
        if self.cancel.is_cancelled() {
            return Err(ResolutionError::Cancelled);
        }
        let ret = match cancellable(self.contract.balance_of(wallet), &self.cancel).await {
            Ok(ret) => ret,
            Err(_) => return Err(ResolutionError::Cancelled),
        };
        let balance = match ret.and_then(|value| u256_to_u64(calls::BALANCE_OF, value)) {
            Ok(balance) => balance,
            Err(err) => {
                warn!(
                    "[resolver] balanceOf({}) failed on {}: {}",
                    wallet,
                    self.contract.address(),
                    err
                );
                return Err(ResolutionError::Unsupported {
                    contract: self.contract.address(),
                });
            }
        };
        if balance == 0 {
            debug!(
                "[resolver] {} holds no tokens on {}",
                wallet,
                self.contract.address()
            );
            return Ok(Vec::new());
        }

        let query = OwnershipQuery {
            wallet,
            expected_balance: balance,
        };
        let limits = ProbeLimits {
            concurrency: self.concurrency,
            cancel: self.cancel.clone(),
        };
        for probe in &self.probes {
            debug!(
                "[resolver] trying {} on {}",
                probe.tier(),
                self.contract.address()
            );
            match probe.try_resolve(&self.contract, &query, &limits).await {
                Ok(mut ids) => {
                    if ids.len() as u64 > balance {
                        debug!(
                            "[resolver] {} returned {} ids, keeping the first {}",
                            probe.tier(),
                            ids.len(),
                            balance
                        );
                        ids.truncate(balance as usize);
                    }
                    info!(
                        "[resolver] resolved {} token ids for {} via {}",
                        ids.len(),
                        wallet,
                        probe.tier()
                    );
                    return Ok(ids);
                }
                Err(ProbeError::Cancelled) => return Err(ResolutionError::Cancelled),
                Err(ProbeError::Call(err)) if err.reason.is_capability_absence() => {
                    debug!(
                        "[resolver] {} not available on {}: {}",
                        probe.tier(),
                        self.contract.address(),
                        err
                    );
                }
                Err(ProbeError::Call(err)) => {
                    warn!(
                        "[resolver] {} failed on {}: {}",
                        probe.tier(),
                        self.contract.address(),
                        err
                    );
                }
            }
        }
        warn!(
            "[resolver] no capability tier succeeded for {} on {}",
            wallet,
            self.contract.address()
        );
        Err(ResolutionError::Unsupported {
            contract: self.contract.address(),
        })
    }
}
