use super::{PetCareStore, StoreResult};
use crate::catalog::{Product, TrainingProgram};
use crate::chat::{ChatExchange, NewChatExchange};
use crate::profile::{CareRecommendationSet, NewPetProfile, PetProfile};
use crate::shared::now_ms;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// In-process store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    profiles: DashMap<u64, PetProfile>,
    recommendations: DashMap<u64, CareRecommendationSet>,
    chat: DashMap<String, Vec<ChatExchange>>,
    next_id: AtomicU64,
    /// Held across the insert so the latest index always names a stored profile.
    latest: RwLock<Option<u64>>,
    products: RwLock<Vec<Product>>,
    programs: RwLock<Vec<TrainingProgram>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn insert_profile(
        &self,
        profile: NewPetProfile,
        recommendations: Option<&CareRecommendationSet>,
    ) -> StoreResult<PetProfile> {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        let stored = PetProfile::from_new(self.allocate_id(), profile, now_ms());
        // The set goes in first: a profile is never readable by id without it.
        if let Some(set) = recommendations {
            self.recommendations.insert(stored.id, set.clone());
        }
        self.profiles.insert(stored.id, stored.clone());
        *latest = Some(stored.id);
        tracing::info!(
            target: "anicare::store",
            backend = "memory",
            profile_id = stored.id,
            with_recommendations = recommendations.is_some(),
            "Stored pet profile '{}'",
            stored.name
        );
        Ok(stored)
    }
}

impl PetCareStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create_profile(&self, profile: NewPetProfile) -> StoreResult<PetProfile> {
        self.insert_profile(profile, None)
    }

    fn create_profile_with_recommendations(
        &self,
        profile: NewPetProfile,
        recommendations: &CareRecommendationSet,
    ) -> StoreResult<PetProfile> {
        self.insert_profile(profile, Some(recommendations))
    }

    fn get_profile(&self, id: u64) -> StoreResult<Option<PetProfile>> {
        Ok(self.profiles.get(&id).map(|p| p.value().clone()))
    }

    fn latest_profile(&self) -> StoreResult<Option<PetProfile>> {
        let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
        Ok(latest.and_then(|id| self.profiles.get(&id).map(|p| p.value().clone())))
    }

    fn list_profiles(&self) -> StoreResult<Vec<PetProfile>> {
        let mut all: Vec<PetProfile> = self.profiles.iter().map(|p| p.value().clone()).collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    fn save_recommendations(&self, profile_id: u64, set: &CareRecommendationSet) -> StoreResult<()> {
        self.recommendations.insert(profile_id, set.clone());
        tracing::debug!(target: "anicare::store", backend = "memory", profile_id, "Stored care recommendations");
        Ok(())
    }

    fn get_recommendations(&self, profile_id: u64) -> StoreResult<Option<CareRecommendationSet>> {
        Ok(self.recommendations.get(&profile_id).map(|r| r.value().clone()))
    }

    fn append_chat_exchange(&self, exchange: NewChatExchange) -> StoreResult<ChatExchange> {
        // The entry guard serializes appends within a session, keeping id order equal to list order.
        let mut session = self.chat.entry(exchange.session_id.clone()).or_default();
        let stored = ChatExchange::from_new(self.allocate_id(), exchange, now_ms());
        session.push(stored.clone());
        Ok(stored)
    }

    fn chat_history(&self, session_id: &str) -> StoreResult<Vec<ChatExchange>> {
        Ok(self.chat.get(session_id).map(|s| s.value().clone()).unwrap_or_default())
    }

    fn seed_catalog(&self, products: Vec<Product>, programs: Vec<TrainingProgram>) -> StoreResult<bool> {
        let mut current = self.products.write().unwrap_or_else(PoisonError::into_inner);
        if !current.is_empty() {
            return Ok(false);
        }
        let count = products.len();
        *current = products;
        *self.programs.write().unwrap_or_else(PoisonError::into_inner) = programs;
        tracing::info!(target: "anicare::store", backend = "memory", products = count, "Seeded catalog");
        Ok(true)
    }

    fn products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        Ok(products
            .iter()
            .filter(|p| p.matches_category(category))
            .cloned()
            .collect())
    }

    fn training_programs(&self, age_group: Option<&str>) -> StoreResult<Vec<TrainingProgram>> {
        let programs = self.programs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(programs
            .iter()
            .filter(|p| p.matches_age(age_group))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;
    use std::sync::Arc;

    #[test]
    fn profiles_accumulate_and_latest_moves() {
        contract::profiles_accumulate_and_latest_moves(&MemoryStore::new());
    }

    #[test]
    fn recommendations_round_trip() {
        contract::recommendations_round_trip(&MemoryStore::new());
    }

    #[test]
    fn profile_with_recommendations_commits_together() {
        contract::profile_with_recommendations_commits_together(&MemoryStore::new());
    }

    #[test]
    fn chat_history_keeps_submission_order_per_session() {
        contract::chat_history_keeps_submission_order_per_session(&MemoryStore::new());
    }

    #[test]
    fn catalog_seeds_once_and_filters() {
        contract::catalog_seeds_once_and_filters(&MemoryStore::new());
    }

    #[test]
    fn concurrent_creates_get_distinct_ids_and_a_consistent_latest() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .create_profile(contract::new_profile(&format!("Pet {i}")))
                        .unwrap()
                        .id
                })
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);

        let latest = store.latest_profile().unwrap().unwrap();
        assert!(ids.contains(&latest.id));
        assert_eq!(store.list_profiles().unwrap().len(), 8);
    }
}
