use async_trait::async_trait;
use thiserror::Error;

use crate::token::Erc721Token;
use crate::TokenId;

/// Resolves the record behind a discovered token id. Implementations
/// typically read `tokenURI` and download the document it points at; both
/// of those live below this seam.
#[async_trait]
pub trait TokenDetailFetcher: Send + Sync {
    async fn fetch_detail(&self, token_id: TokenId) -> Result<Erc721Token, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("token {0} has no resolvable metadata")]
    NotFound(TokenId),
    #[error("network error: {0}")]
    Network(String),
}
