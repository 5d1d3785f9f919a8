//! Sled-backed store. One tree per record kind:
//!
//! | Tree              | Key                        | Value                      |
//! |-------------------|----------------------------|----------------------------|
//! | `profiles`        | profile id (u64 BE)        | [`PetProfile`] JSON        |
//! | `recommendations` | profile id (u64 BE)        | [`CareRecommendationSet`]  |
//! | `chat_messages`   | `{session}/{id:020}`       | [`ChatExchange`] JSON      |
//! | `catalog`         | `product/` or `training/` + id (u64 BE) | catalog JSON |
//! | `meta`            | `latest_profile`           | profile id (u64 BE)        |

use super::{PetCareStore, StoreError, StoreResult};
use crate::catalog::{Product, TrainingProgram};
use crate::chat::{ChatExchange, NewChatExchange};
use crate::profile::{CareRecommendationSet, NewPetProfile, PetProfile};
use crate::shared::now_ms;
use serde::de::DeserializeOwned;
use sled::transaction::{TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use std::path::Path;

const LATEST_KEY: &str = "latest_profile";
const PRODUCT_PREFIX: &str = "product/";
const TRAINING_PREFIX: &str = "training/";

pub struct SledStore {
    db: Db,
    profiles: Tree,
    recommendations: Tree,
    chat: Tree,
    catalog: Tree,
    meta: Tree,
}

impl SledStore {
    /// Opens or creates the database at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path.as_ref())?;
        let store = Self {
            profiles: db.open_tree("profiles")?,
            recommendations: db.open_tree("recommendations")?,
            chat: db.open_tree("chat_messages")?,
            catalog: db.open_tree("catalog")?,
            meta: db.open_tree("meta")?,
            db,
        };
        tracing::info!(
            target: "anicare::store",
            backend = "sled",
            path = %path.as_ref().display(),
            profiles = store.profiles.len(),
            "Opened sled store"
        );
        Ok(store)
    }

    fn next_id(&self) -> StoreResult<u64> {
        Ok(self.db.generate_id()? + 1)
    }

    /// Profile, optional recommendation set and latest index commit together,
    /// so readers never see the profile without its set.
    fn insert_profile(
        &self,
        profile: NewPetProfile,
        recommendations: Option<&CareRecommendationSet>,
    ) -> StoreResult<PetProfile> {
        let stored = PetProfile::from_new(self.next_id()?, profile, now_ms());
        let key = stored.id.to_be_bytes();
        let bytes = stored.to_bytes()?;
        let set_bytes = recommendations.map(CareRecommendationSet::to_bytes).transpose()?;

        let result: TransactionResult<(), ()> = (&self.profiles, &self.recommendations, &self.meta).transaction(
            |(profiles, recommendations, meta)| {
                profiles.insert(&key[..], bytes.as_slice())?;
                if let Some(set) = &set_bytes {
                    recommendations.insert(&key[..], set.as_slice())?;
                }
                meta.insert(LATEST_KEY.as_bytes(), &key[..])?;
                Ok(())
            },
        );
        result.map_err(map_transaction_error)?;

        tracing::info!(
            target: "anicare::store",
            backend = "sled",
            profile_id = stored.id,
            bytes = bytes.len(),
            with_recommendations = set_bytes.is_some(),
            "Stored pet profile '{}'",
            stored.name
        );
        Ok(stored)
    }

    fn decode_prefix<T: DeserializeOwned>(&self, prefix: &str) -> StoreResult<Vec<T>> {
        let mut out = Vec::new();
        for item in self.catalog.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item?;
            match serde_json::from_slice(&value) {
                Ok(record) => out.push(record),
                Err(e) => tracing::warn!(
                    target: "anicare::store",
                    key = %String::from_utf8_lossy(&key),
                    error = %e,
                    "Skipping unreadable catalog record"
                ),
            }
        }
        Ok(out)
    }
}

fn chat_key(session_id: &str, id: u64) -> String {
    format!("{}/{:020}", session_id, id)
}

fn catalog_key(prefix: &str, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + 8);
    key.extend_from_slice(prefix.as_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn map_transaction_error(err: TransactionError<()>) -> StoreError {
    match err {
        TransactionError::Abort(()) => StoreError::Transaction("profile insert aborted".to_string()),
        TransactionError::Storage(e) => StoreError::Sled(e),
    }
}

impl PetCareStore for SledStore {
    fn backend_name(&self) -> &'static str {
        "sled"
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
        let bytes = self.profiles.get(id.to_be_bytes())?;
        Ok(bytes.and_then(|b| PetProfile::from_bytes(&b)))
    }

    fn latest_profile(&self) -> StoreResult<Option<PetProfile>> {
        let Some(raw) = self.meta.get(LATEST_KEY.as_bytes())? else {
            return Ok(None);
        };
        let Ok(id_bytes) = <[u8; 8]>::try_from(raw.as_ref()) else {
            tracing::warn!(target: "anicare::store", "Latest-profile index is corrupt; ignoring it");
            return Ok(None);
        };
        self.get_profile(u64::from_be_bytes(id_bytes))
    }

    fn list_profiles(&self) -> StoreResult<Vec<PetProfile>> {
        let mut out = Vec::new();
        for item in self.profiles.iter() {
            let (_, value) = item?;
            if let Some(profile) = PetProfile::from_bytes(&value) {
                out.push(profile);
            }
        }
        Ok(out)
    }

    fn save_recommendations(&self, profile_id: u64, set: &CareRecommendationSet) -> StoreResult<()> {
        let bytes = set.to_bytes()?;
        self.recommendations.insert(&profile_id.to_be_bytes()[..], bytes)?;
        tracing::debug!(target: "anicare::store", backend = "sled", profile_id, "Stored care recommendations");
        Ok(())
    }

    fn get_recommendations(&self, profile_id: u64) -> StoreResult<Option<CareRecommendationSet>> {
        let bytes = self.recommendations.get(profile_id.to_be_bytes())?;
        Ok(bytes.and_then(|b| CareRecommendationSet::from_bytes(&b)))
    }

    fn append_chat_exchange(&self, exchange: NewChatExchange) -> StoreResult<ChatExchange> {
        let stored = ChatExchange::from_new(self.next_id()?, exchange, now_ms());
        let key = chat_key(&stored.session_id, stored.id);
        self.chat.insert(key.as_bytes(), stored.to_bytes()?)?;
        Ok(stored)
    }

    fn chat_history(&self, session_id: &str) -> StoreResult<Vec<ChatExchange>> {
        let prefix = format!("{}/", session_id);
        let mut out = Vec::new();
        for item in self.chat.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            // Sessions containing '/' can share a prefix with another session.
            match ChatExchange::from_bytes(&value) {
                Some(exchange) if exchange.session_id == session_id => out.push(exchange),
                _ => {}
            }
        }
        Ok(out)
    }

    fn seed_catalog(&self, products: Vec<Product>, programs: Vec<TrainingProgram>) -> StoreResult<bool> {
        if !self.catalog.is_empty() {
            return Ok(false);
        }
        let mut batch = sled::Batch::default();
        for product in &products {
            batch.insert(catalog_key(PRODUCT_PREFIX, product.id), serde_json::to_vec(product)?);
        }
        for program in &programs {
            batch.insert(catalog_key(TRAINING_PREFIX, program.id), serde_json::to_vec(program)?);
        }
        self.catalog.apply_batch(batch)?;
        tracing::info!(
            target: "anicare::store",
            backend = "sled",
            products = products.len(),
            training_programs = programs.len(),
            "Seeded catalog"
        );
        Ok(true)
    }

    fn flush(&self) -> StoreResult<()> {
        let bytes = self.db.flush()?;
        tracing::debug!(target: "anicare::store", backend = "sled", bytes, "Flushed sled store");
        Ok(())
    }

    fn products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let all: Vec<Product> = self.decode_prefix(PRODUCT_PREFIX)?;
        Ok(all.into_iter().filter(|p| p.matches_category(category)).collect())
    }

    fn training_programs(&self, age_group: Option<&str>) -> StoreResult<Vec<TrainingProgram>> {
        let all: Vec<TrainingProgram> = self.decode_prefix(TRAINING_PREFIX)?;
        Ok(all.into_iter().filter(|p| p.matches_age(age_group)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;
    use std::sync::Arc;

    fn temp_store() -> (tempfile::TempDir, SledStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open_path(dir.path().join("store")).unwrap();
        (dir, store)
    }

    #[test]
    fn profiles_accumulate_and_latest_moves() {
        let (_dir, store) = temp_store();
        contract::profiles_accumulate_and_latest_moves(&store);
    }

    #[test]
    fn recommendations_round_trip() {
        let (_dir, store) = temp_store();
        contract::recommendations_round_trip(&store);
    }

    #[test]
    fn chat_history_keeps_submission_order_per_session() {
        let (_dir, store) = temp_store();
        contract::chat_history_keeps_submission_order_per_session(&store);
    }

    #[test]
    fn catalog_seeds_once_and_filters() {
        let (_dir, store) = temp_store();
        contract::catalog_seeds_once_and_filters(&store);
    }

    #[test]
    fn session_prefixes_do_not_leak_between_sessions() {
        let (_dir, store) = temp_store();
        for session in ["a", "a/b"] {
            store
                .append_chat_exchange(NewChatExchange {
                    session_id: session.to_string(),
                    message: format!("from {session}"),
                    response: "ok".to_string(),
                })
                .unwrap();
        }
        let a = store.chat_history("a").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].message, "from a");
    }

    #[test]
    fn profile_with_recommendations_commits_together() {
        let (_dir, store) = temp_store();
        contract::profile_with_recommendations_commits_together(&store);
    }

    #[test]
    fn catalog_keys_keep_numeric_order_past_four_digits() {
        let (_dir, store) = temp_store();
        let mut products = crate::catalog::default_products();
        products.truncate(2);
        products[0].id = 10_000;
        products[1].id = 9;
        store.seed_catalog(products, Vec::new()).unwrap();

        let ids: Vec<u64> = store.products(None).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, [9, 10_000]);
        assert!(catalog_key(PRODUCT_PREFIX, 9) < catalog_key(PRODUCT_PREFIX, 10_000));
    }

    #[test]
    fn data_survives_reopen_and_ids_keep_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");

        let first = {
            let store = SledStore::open_path(&path).unwrap();
            let profile = store.create_profile(contract::new_profile("Buddy")).unwrap();
            store.save_recommendations(profile.id, &contract::sample_set("buddy")).unwrap();
            store.flush().unwrap();
            profile
        };

        let store = SledStore::open_path(&path).unwrap();
        assert_eq!(store.latest_profile().unwrap(), Some(first.clone()));
        assert_eq!(
            store.get_recommendations(first.id).unwrap(),
            Some(contract::sample_set("buddy"))
        );

        let second = store.create_profile(contract::new_profile("Luna")).unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.latest_profile().unwrap().map(|p| p.id), Some(second.id));
    }

    #[test]
    fn concurrent_creates_keep_latest_pointing_at_a_stored_profile() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
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
        let ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let latest = store.latest_profile().unwrap().unwrap();
        assert!(ids.contains(&latest.id));
        assert_eq!(store.list_profiles().unwrap().len(), 8);
    }
}
