use thiserror::Error;

pub mod contracts;
pub mod probes;
pub mod resolver;
pub mod service;

pub use contracts::Erc721Contract;
pub use resolver::{OwnershipResolver, ResolutionError};
pub use service::Erc721Reader;

/// Errors surfaced by the read service. The resolver and the typed call
/// wrappers keep their own narrower types; this is the union callers of
/// [`Erc721Reader`] see.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Call(#[from] erc721_types::CallError),
    #[error(transparent)]
    Fetch(#[from] erc721_types::FetchError),
}

pub mod const_args {
    /// In-flight calls per probe batch unless the caller picks a limit.
    pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;
    /// Fan-out for metadata fetches in the read service.
    pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;
}
