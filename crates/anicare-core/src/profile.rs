//! Pet profiles and the care recommendation set attached to each one.

use serde::{Deserialize, Serialize};

/// Validated profile submission, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPetProfile {
    pub name: String,
    /// Age bracket label, e.g. "Puppy (0-1 years)".
    pub age: String,
    pub breed: String,
    /// Size bracket label, e.g. "Large (60-100 lbs)".
    #[serde(default)]
    pub size: Option<String>,
}

/// A stored pet profile. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetProfile {
    pub id: u64,
    pub name: String,
    pub age: String,
    pub breed: String,
    pub size: Option<String>,
    /// Unix timestamp (milliseconds).
    pub created_at: i64,
}

impl PetProfile {
    pub fn from_new(id: u64, new: NewPetProfile, created_at: i64) -> Self {
        Self {
            id,
            name: new.name,
            age: new.age,
            breed: new.breed,
            size: new.size,
            created_at,
        }
    }

    /// One-line summary injected into the chat assistant's system instruction.
    pub fn context_line(&self) -> String {
        format!(
            "Pet Name: {}, Age: {}, Breed: {}, Size: {}",
            self.name,
            self.age,
            self.breed,
            self.size.as_deref().unwrap_or("N/A")
        )
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// The three recommendation categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareCategory {
    Nutrition,
    Grooming,
    Health,
}

impl CareCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Grooming => "grooming",
            Self::Health => "health",
        }
    }
}

/// One section of a recommendation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareSection {
    pub title: String,
    pub description: String,
    /// Display order matters.
    pub tips: Vec<String>,
}

impl CareSection {
    pub fn new(title: impl Into<String>, description: impl Into<String>, tips: Vec<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tips,
        }
    }
}

/// Exactly three sections tied to one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareRecommendationSet {
    pub nutrition: CareSection,
    pub grooming: CareSection,
    pub health: CareSection,
}

impl CareRecommendationSet {
    pub fn sections(&self) -> [(CareCategory, &CareSection); 3] {
        [
            (CareCategory::Nutrition, &self.nutrition),
            (CareCategory::Grooming, &self.grooming),
            (CareCategory::Health, &self.health),
        ]
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buddy() -> PetProfile {
        PetProfile::from_new(
            7,
            NewPetProfile {
                name: "Buddy".into(),
                age: "Puppy (0-1 years)".into(),
                breed: "Golden Retriever".into(),
                size: None,
            },
            1_700_000_000_000,
        )
    }

    #[test]
    fn profile_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(buddy()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert!(json["size"].is_null());
    }

    #[test]
    fn context_line_marks_missing_size() {
        assert_eq!(
            buddy().context_line(),
            "Pet Name: Buddy, Age: Puppy (0-1 years), Breed: Golden Retriever, Size: N/A"
        );
    }

    #[test]
    fn sections_follow_category_order() {
        let section = |t: &str| CareSection::new(t, "d", vec!["a".into()]);
        let set = CareRecommendationSet {
            nutrition: section("N"),
            grooming: section("G"),
            health: section("H"),
        };
        let titles: Vec<_> = set.sections().iter().map(|(_, s)| s.title.clone()).collect();
        assert_eq!(titles, ["N", "G", "H"]);
        assert_eq!(CareCategory::Health.as_str(), "health");
    }
}
