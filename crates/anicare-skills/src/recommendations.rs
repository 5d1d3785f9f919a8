//! Care recommendation generation with a deterministic rule-based fallback.

use crate::model_router::{CompletionRequest, GenerationError, TextGenerator};
use anicare_core::{CareCategory, CareRecommendationSet, CareSection};
use serde_json::Value;
use std::sync::Arc;

const SYSTEM_ROLE: &str = "You are a professional veterinarian with expertise in pet care, nutrition, and training. Provide accurate, helpful advice for pet owners.";
const TEMPERATURE: f32 = 0.7;
const MIN_TIPS: usize = 3;

const LARGE_BREED_MARKERS: [&str; 4] = ["retriever", "labrador", "german", "rottweiler"];
const LARGE_SIZE_PREFIXES: [&str; 2] = ["large", "extra large"];
const DOUBLE_COAT_MARKERS: [&str; 2] = ["retriever", "collie"];

/// Produces a [`CareRecommendationSet`] for a pet. Never fails: any problem
/// with the external call or its reply yields [`fallback_recommendations`].
pub struct CareRecommendationGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl CareRecommendationGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, name: &str, age: &str, breed: &str, size: Option<&str>) -> CareRecommendationSet {
        match self.request(name, age, breed, size).await {
            Ok(set) => {
                tracing::info!(
                    target: "anicare::recommendations",
                    pet = name,
                    source = "llm",
                    tips = set.sections().iter().map(|(_, s)| s.tips.len()).sum::<usize>(),
                    "Generated care recommendations"
                );
                set
            }
            Err(e) => {
                tracing::warn!(
                    target: "anicare::recommendations",
                    pet = name,
                    error = %e,
                    "Generation failed; using rule-based recommendations"
                );
                fallback_recommendations(name, age, breed, size)
            }
        }
    }

    async fn request(
        &self,
        name: &str,
        age: &str,
        breed: &str,
        size: Option<&str>,
    ) -> Result<CareRecommendationSet, GenerationError> {
        let reply = self
            .llm
            .complete(CompletionRequest {
                system: SYSTEM_ROLE.to_string(),
                user: build_prompt(name, age, breed, size),
                temperature: TEMPERATURE,
                max_tokens: None,
                json_response: true,
            })
            .await?;
        parse_recommendations(&reply)
    }
}

fn build_prompt(name: &str, age: &str, breed: &str, size: Option<&str>) -> String {
    format!(
        "As a professional veterinarian and pet care expert, give care recommendations for this pet:\n\n\
         Name: {name}\n\
         Age: {age}\n\
         Breed: {breed}\n\
         Size: {size}\n\n\
         Cover three categories with specific, actionable advice:\n\
         1. Nutrition - diet, feeding schedule, foods to avoid\n\
         2. Grooming - brushing, bathing, nail care, professional grooming\n\
         3. Health - exercise needs, common health concerns, preventive care\n\n\
         Reply with a JSON object of exactly this shape:\n\
         {{\n  \"nutrition\": {{ \"title\": \"...\", \"description\": \"...\", \"tips\": [\"...\", \"...\", \"...\", \"...\"] }},\n  \
         \"grooming\": {{ \"title\": \"...\", \"description\": \"...\", \"tips\": [\"...\", \"...\", \"...\", \"...\"] }},\n  \
         \"health\": {{ \"title\": \"...\", \"description\": \"...\", \"tips\": [\"...\", \"...\", \"...\", \"...\"] }}\n}}",
        size = size.unwrap_or("Not specified"),
    )
}

/// Parses and checks a generated reply. A set is only accepted when every
/// section has a title, a description and at least three non-empty tips.
pub fn parse_recommendations(reply: &str) -> Result<CareRecommendationSet, GenerationError> {
    let root: Value = serde_json::from_str(reply.trim()).map_err(|e| GenerationError::MalformedReply(e.to_string()))?;
    if !root.is_object() {
        return Err(GenerationError::InvalidShape("reply is not a JSON object".to_string()));
    }
    Ok(CareRecommendationSet {
        nutrition: parse_section(&root, CareCategory::Nutrition)?,
        grooming: parse_section(&root, CareCategory::Grooming)?,
        health: parse_section(&root, CareCategory::Health)?,
    })
}

fn parse_section(root: &Value, category: CareCategory) -> Result<CareSection, GenerationError> {
    let key = category.as_str();
    let section = root
        .get(key)
        .filter(|v| v.is_object())
        .ok_or_else(|| GenerationError::InvalidShape(format!("missing {key} section")))?;

    let text = |field: &str| -> Result<String, GenerationError> {
        section
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::InvalidShape(format!("{key}.{field} is missing or empty")))
    };
    let title = text("title")?;
    let description = text("description")?;

    let tips: Vec<String> = section
        .get("tips")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if tips.len() < MIN_TIPS {
        return Err(GenerationError::InvalidShape(format!(
            "{key}.tips has {} usable tips, need {MIN_TIPS}",
            tips.len()
        )));
    }

    Ok(CareSection::new(title, description, tips))
}

/// Pet traits the fallback rules branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PetTraits {
    large: bool,
    puppy: bool,
    senior: bool,
    double_coat: bool,
}

impl PetTraits {
    fn classify(age: &str, breed: &str, size: Option<&str>) -> Self {
        let breed_lower = breed.to_lowercase();
        let size_lower = size.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Self {
            large: LARGE_BREED_MARKERS.iter().any(|m| breed_lower.contains(m))
                || LARGE_SIZE_PREFIXES.iter().any(|p| size_lower.starts_with(p)),
            puppy: age.contains("Puppy") || age.contains("0-1"),
            senior: age.contains("Senior") || age.contains("7+"),
            double_coat: DOUBLE_COAT_MARKERS.iter().any(|m| breed_lower.contains(m)),
        }
    }
}

fn pick(condition: bool, yes: &str, no: &str) -> String {
    (if condition { yes } else { no }).to_string()
}

/// Rule-based recommendations. Pure: identical inputs give identical output.
pub fn fallback_recommendations(name: &str, age: &str, breed: &str, size: Option<&str>) -> CareRecommendationSet {
    let t = PetTraits::classify(age, breed, size);
    let age_lower = age.to_lowercase();

    let nutrition = CareSection::new(
        format!("Nutrition Guide for {name}"),
        format!("Customized feeding recommendations for your {age_lower} {breed}"),
        vec![
            pick(
                t.puppy,
                "Feed high-quality puppy food 3-4 times daily",
                "Feed adult dog food twice daily at regular times",
            ),
            pick(
                t.large,
                "Choose large breed formula to support joint health",
                "Select size-appropriate kibble for easy chewing",
            ),
            "Provide fresh water available at all times".to_string(),
            pick(
                t.senior,
                "Consider senior formula with joint support supplements",
                "Monitor weight and adjust portions as needed",
            ),
        ],
    );

    let grooming = CareSection::new(
        format!("Grooming Schedule for {name}"),
        format!("Breed-specific grooming routine for your {breed}"),
        vec![
            pick(
                t.double_coat,
                "Brush daily to prevent matting of double coat",
                "Brush 2-3 times weekly to reduce shedding",
            ),
            "Bathe every 4-6 weeks or when dirty".to_string(),
            "Trim nails every 2-3 weeks to prevent overgrowth".to_string(),
            pick(t.large, "Clean ears weekly to prevent infections", "Check and clean ears bi-weekly"),
        ],
    );

    let health = CareSection::new(
        format!("Health Monitoring for {name}"),
        format!("Age and breed-specific health care for your {age_lower} {breed}"),
        vec![
            pick(
                t.puppy,
                "Schedule puppy vaccination series and spay/neuter consultation",
                "Maintain annual vet checkups and vaccinations",
            ),
            pick(
                t.large,
                "Monitor for hip dysplasia and joint issues",
                "Watch for dental problems common in smaller breeds",
            ),
            pick(
                t.senior,
                "Increase vet visits to twice yearly for senior wellness exams",
                "Provide daily exercise appropriate for age and breed",
            ),
            "Watch for breed-specific health concerns and discuss with your vet".to_string(),
        ],
    );

    CareRecommendationSet {
        nutrition,
        grooming,
        health,
    }
}
