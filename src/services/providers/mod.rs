/// Credits data provider abstraction
///
/// The graph needs two lookups from the outside world: who is billed on a collection
/// item, and what else a performer has appeared in. Providers return validated records;
/// a payload that does not match the expected schema is an error for that one lookup.
use crate::{
    error::AppResult,
    models::{CastMember, CollectionItem, CreditEntry, PersonId},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for cast and credits data providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CreditsProvider: Send + Sync {
    /// Fetch the billed cast of a collection item, in billing order
    async fn fetch_cast(&self, item: &CollectionItem) -> AppResult<Vec<CastMember>>;

    /// Fetch the acting credits of a performer
    async fn fetch_credits(&self, person_id: PersonId) -> AppResult<Vec<CreditEntry>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
