//! anicare-core: shared types, configuration, request validation, catalog data
//! and the profile store used by the skills crate and the gateway.

mod catalog;
mod chat;
mod profile;
mod shared;
mod store;
mod validate;

// Shared
pub use shared::{now_ms, CoreConfig, StorageBackend, SLED_DB_DIR};

// Domain records
pub use chat::{ChatExchange, ChatRequest, NewChatExchange};
pub use profile::{CareCategory, CareRecommendationSet, CareSection, NewPetProfile, PetProfile};

// Catalog
pub use catalog::{
    default_products, default_training_programs, Product, TrainingProgram, ALL_AGES, ALL_CATEGORIES,
};

// Validation
pub use validate::{validate_chat_request, validate_profile, FieldError, ValidationError};

// Store
pub use store::{MemoryStore, PetCareStore, SledStore, StoreError, StoreResult};
