use thiserror::Error;

/// Errors raised while constructing a permutation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The collaborator's length does not fit the `u32` index space.
    #[error("domain of {len} elements exceeds the u32 index space")]
    DomainTooLarge { len: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
