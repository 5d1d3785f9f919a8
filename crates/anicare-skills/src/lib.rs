//! Text-generation skills: the model router and the two features built on it.

mod chat_responder;
mod model_router;
mod recommendations;

pub use chat_responder::{fallback_reply, ChatResponder, ChatTopic};
pub use model_router::{CompletionRequest, GenerationError, LlmMode, ModelRouter, TextGenerator};
pub use recommendations::{fallback_recommendations, parse_recommendations, CareRecommendationGenerator};
