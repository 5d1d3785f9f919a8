//! Read-only product catalog and training programs, seeded into the store at startup.

use serde::{Deserialize, Serialize};

/// Age group that matches every training-program filter.
pub const ALL_AGES: &str = "All Ages";

/// Category filter value that disables product filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub is_vet_approved: bool,
    #[serde(default = "default_rating")]
    pub rating: f64,
}

fn default_rating() -> f64 {
    5.0
}

impl Product {
    /// `None`, empty and `"all"` match every product.
    pub fn matches_category(&self, category: Option<&str>) -> bool {
        match category.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => true,
            Some(c) => self.category == c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgram {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub age_group: String,
    #[serde(default)]
    pub breed_suitability: Vec<String>,
    pub tips: Vec<String>,
    pub icon: String,
    /// "obedience", "exercise" or "behavioral".
    pub category: String,
}

impl TrainingProgram {
    /// Programs for the requested age group plus the ones marked [`ALL_AGES`].
    pub fn matches_age(&self, age_group: Option<&str>) -> bool {
        match age_group.map(str::trim) {
            None | Some("") => true,
            Some(age) => self.age_group == age || self.age_group == ALL_AGES,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: u64,
    name: &str,
    description: &str,
    price: f64,
    category: &str,
    image_url: &str,
    flags: (bool, bool, bool),
    rating: f64,
) -> Product {
    let (is_recommended, is_bestseller, is_vet_approved) = flags;
    Product {
        id,
        name: name.to_string(),
        description: description.to_string(),
        price,
        category: category.to_string(),
        image_url: image_url.to_string(),
        is_recommended,
        is_bestseller,
        is_vet_approved,
        rating,
    }
}

/// Seed products. Flags are (recommended, bestseller, vet approved).
pub fn default_products() -> Vec<Product> {
    const IMG: &str = "https://images.unsplash.com/photo-";
    const Q: &str = "?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=300";
    vec![
        product(
            1,
            "Premium Golden Retriever Food",
            "High-protein formula for adult dogs",
            49.99,
            "Food & Treats",
            &format!("{IMG}1589924691995-400dc9ecc119{Q}"),
            (true, false, false),
            5.0,
        ),
        product(
            2,
            "Interactive Rope Toy",
            "Durable toy for medium to large dogs",
            19.99,
            "Toys & Accessories",
            &format!("{IMG}1605460375648-278bcbd579a6{Q}"),
            (false, true, false),
            4.5,
        ),
        product(
            3,
            "Professional Grooming Kit",
            "Complete set for double-coat breeds",
            34.99,
            "Grooming",
            &format!("{IMG}1576013551627-0cc20b96c2a7{Q}"),
            (true, false, false),
            5.0,
        ),
        product(
            4,
            "Joint Health Supplements",
            "Natural support for active dogs",
            29.99,
            "Health & Medicine",
            &format!("{IMG}1614027164847-1b28cfe1df60{Q}"),
            (false, false, true),
            4.5,
        ),
        product(
            5,
            "Organic Dog Treats",
            "All-natural training rewards",
            15.99,
            "Food & Treats",
            &format!("{IMG}1601758228041-f3b2795255f1{Q}"),
            (true, false, false),
            4.8,
        ),
        product(
            6,
            "Smart Water Bowl",
            "Automatic refilling with app control",
            89.99,
            "Toys & Accessories",
            &format!("{IMG}1589924691995-400dc9ecc119{Q}"),
            (false, true, false),
            4.7,
        ),
    ]
}

pub fn default_training_programs() -> Vec<TrainingProgram> {
    vec![
        TrainingProgram {
            id: 1,
            title: "Basic Obedience".into(),
            description: "Perfect for Golden Retrievers aged 1-3 years".into(),
            age_group: "Young (1-3 years)".into(),
            breed_suitability: strings(&["Golden Retriever", "Labrador", "All Breeds"]),
            tips: strings(&[
                "Sit, Stay, Come commands",
                "15-minute daily sessions",
                "Positive reinforcement techniques",
            ]),
            icon: "fas fa-graduation-cap".into(),
            category: "obedience".into(),
        },
        TrainingProgram {
            id: 2,
            title: "Exercise Routine".into(),
            description: "High-energy breed specific activities".into(),
            age_group: "Adult (3-7 years)".into(),
            breed_suitability: strings(&["Golden Retriever", "Labrador", "High-energy breeds"]),
            tips: strings(&[
                "60+ minutes daily exercise",
                "Swimming, fetching, hiking",
                "Mental stimulation games",
            ]),
            icon: "fas fa-running".into(),
            category: "exercise".into(),
        },
        TrainingProgram {
            id: 3,
            title: "Behavioral Tips".into(),
            description: "AI-analyzed breed-specific guidance".into(),
            age_group: ALL_AGES.into(),
            breed_suitability: strings(&["All Breeds"]),
            tips: strings(&[
                "Reduce excessive barking",
                "Prevent destructive chewing",
                "Socialization strategies",
            ]),
            icon: "fas fa-brain".into(),
            category: "behavioral".into(),
        },
        TrainingProgram {
            id: 4,
            title: "Puppy Foundation".into(),
            description: "Essential training for young puppies".into(),
            age_group: "Puppy (0-1 years)".into(),
            breed_suitability: strings(&["All Breeds"]),
            tips: strings(&[
                "House training basics",
                "Crate training",
                "Basic socialization",
                "Bite inhibition",
            ]),
            icon: "fas fa-baby".into(),
            category: "obedience".into(),
        },
    ]
}
