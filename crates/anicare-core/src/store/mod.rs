//! Profile store: profiles with a "latest" index, recommendation sets, chat
//! transcripts and the seeded catalog.
//!
//! | Backend       | Ids                               | Survives restart |
//! |---------------|-----------------------------------|------------------|
//! | [`MemoryStore`] | process-local atomic counter    | no               |
//! | [`SledStore`]   | sled's monotonic id generator   | yes              |
//!
//! Profile creation appends to the history and moves the latest index in one
//! step; concurrent creations resolve last-completed-wins. When a recommendation
//! set is supplied it is written in the same step, before the index moves.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::catalog::{Product, TrainingProgram};
use crate::chat::{ChatExchange, NewChatExchange};
use crate::profile::{CareRecommendationSet, NewPetProfile, PetProfile};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("transaction aborted: {0}")]
    Transaction(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract shared by both backends. Implementations are safe to share across request tasks.
pub trait PetCareStore: Send + Sync {
    /// Short backend name for status output.
    fn backend_name(&self) -> &'static str;

    /// Assigns an id and timestamp, stores the profile and makes it the latest.
    fn create_profile(&self, profile: NewPetProfile) -> StoreResult<PetProfile>;

    /// Like [`create_profile`](Self::create_profile), but the profile only becomes
    /// visible together with its recommendation set.
    fn create_profile_with_recommendations(
        &self,
        profile: NewPetProfile,
        recommendations: &CareRecommendationSet,
    ) -> StoreResult<PetProfile>;

    fn get_profile(&self, id: u64) -> StoreResult<Option<PetProfile>>;

    /// Most recently created profile, if any.
    fn latest_profile(&self) -> StoreResult<Option<PetProfile>>;

    /// Every stored profile in id order.
    fn list_profiles(&self) -> StoreResult<Vec<PetProfile>>;

    fn save_recommendations(&self, profile_id: u64, set: &CareRecommendationSet) -> StoreResult<()>;

    fn get_recommendations(&self, profile_id: u64) -> StoreResult<Option<CareRecommendationSet>>;

    fn append_chat_exchange(&self, exchange: NewChatExchange) -> StoreResult<ChatExchange>;

    /// Exchanges of one session in submission order (empty for unknown sessions).
    fn chat_history(&self, session_id: &str) -> StoreResult<Vec<ChatExchange>>;

    /// Stores the catalog unless one is already present. Returns true if it seeded.
    fn seed_catalog(&self, products: Vec<Product>, programs: Vec<TrainingProgram>) -> StoreResult<bool>;

    /// Products in the given category (`None` or `"all"` for every product).
    fn products(&self, category: Option<&str>) -> StoreResult<Vec<Product>>;

    fn recommended_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self
            .products(None)?
            .into_iter()
            .filter(|p| p.is_recommended)
            .collect())
    }

    /// Programs for the given age group plus the "All Ages" ones (`None` for all programs).
    fn training_programs(&self, age_group: Option<&str>) -> StoreResult<Vec<TrainingProgram>>;

    /// Persists buffered writes. A no-op for backends without durable state.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
