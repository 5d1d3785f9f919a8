//! Pet profile submission and lookup.

use crate::error::ApiError;
use crate::AppState;
use anicare_core::{validate_profile, CareRecommendationSet, PetProfile};
use anicare_skills::fallback_recommendations;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ProfileEnvelope {
    pub(crate) profile: PetProfile,
    pub(crate) recommendations: CareRecommendationSet,
}

/// POST /api/pet-profiles – validate, generate, then store the profile and its
/// recommendations in one write. Nothing is visible until both are stored.
pub(crate) async fn create_profile(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProfileEnvelope>, ApiError> {
    let Json(body) = body.map_err(|r| ApiError::malformed("pet profile", r))?;
    let submission = validate_profile(&body)?;

    let recommendations = state
        .recommendations
        .generate(&submission.name, &submission.age, &submission.breed, submission.size.as_deref())
        .await;

    let profile = state
        .store
        .create_profile_with_recommendations(submission, &recommendations)
        .map_err(ApiError::store("Failed to store pet profile"))?;

    Ok(Json(ProfileEnvelope {
        profile,
        recommendations,
    }))
}

/// GET /api/pet-profiles – the most recently created profile.
pub(crate) async fn latest_profile(State(state): State<AppState>) -> Result<Json<ProfileEnvelope>, ApiError> {
    let profile = state
        .store
        .latest_profile()
        .map_err(ApiError::store("Failed to read pet profile"))?
        .ok_or(ApiError::NotFound("No profile found"))?;
    Ok(Json(envelope(&state, profile)?))
}

/// GET /api/pet-profiles/:id
pub(crate) async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProfileEnvelope>, ApiError> {
    let profile = state
        .store
        .get_profile(id)
        .map_err(ApiError::store("Failed to read pet profile"))?
        .ok_or(ApiError::NotFound("Pet profile not found"))?;
    Ok(Json(envelope(&state, profile)?))
}

/// GET /api/care-recommendations/:profile_id
pub(crate) async fn care_recommendations(
    State(state): State<AppState>,
    Path(profile_id): Path<u64>,
) -> Result<Json<CareRecommendationSet>, ApiError> {
    let profile = state
        .store
        .get_profile(profile_id)
        .map_err(ApiError::store("Failed to read pet profile"))?
        .ok_or(ApiError::NotFound("Pet profile not found"))?;
    Ok(Json(stored_or_fallback(&state, &profile)?))
}

fn envelope(state: &AppState, profile: PetProfile) -> Result<ProfileEnvelope, ApiError> {
    let recommendations = stored_or_fallback(state, &profile)?;
    Ok(ProfileEnvelope {
        profile,
        recommendations,
    })
}

/// A profile whose recommendations were never saved gets the rule-based set.
fn stored_or_fallback(state: &AppState, profile: &PetProfile) -> Result<CareRecommendationSet, ApiError> {
    let stored = state
        .store
        .get_recommendations(profile.id)
        .map_err(ApiError::store("Failed to read care recommendations"))?;
    Ok(stored.unwrap_or_else(|| {
        tracing::debug!(target: "anicare::gateway", profile_id = profile.id, "No saved recommendations; using fallback");
        fallback_recommendations(&profile.name, &profile.age, &profile.breed, profile.size.as_deref())
    }))
}
