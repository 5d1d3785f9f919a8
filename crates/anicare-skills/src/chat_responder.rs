//! Chat assistant replies with a keyword-routed fallback.

use crate::model_router::{CompletionRequest, GenerationError, TextGenerator};
use std::sync::Arc;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

/// Topic picked by the fallback router. Earlier variants win when several match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTopic {
    Nutrition,
    Training,
    Health,
    Grooming,
    Exercise,
    General,
}

const TOPIC_KEYWORDS: [(ChatTopic, &[&str]); 5] = [
    (ChatTopic::Nutrition, &["food", "nutrition", "feed"]),
    (ChatTopic::Training, &["training", "behavior", "obedience"]),
    (ChatTopic::Health, &["health", "sick", "vet"]),
    (ChatTopic::Grooming, &["grooming", "brush", "bath"]),
    (ChatTopic::Exercise, &["exercise", "walk", "play"]),
];

impl ChatTopic {
    /// First topic whose keywords appear in the message (case-insensitive).
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(topic, _)| *topic)
            .unwrap_or(ChatTopic::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatTopic::Nutrition => "nutrition",
            ChatTopic::Training => "training",
            ChatTopic::Health => "health",
            ChatTopic::Grooming => "grooming",
            ChatTopic::Exercise => "exercise",
            ChatTopic::General => "general",
        }
    }
}

/// Answers chat messages. Never fails: errors and empty replies use [`fallback_reply`].
pub struct ChatResponder {
    llm: Arc<dyn TextGenerator>,
}

impl ChatResponder {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn respond(&self, message: &str, pet_context: Option<&str>) -> String {
        let context = pet_context.map(str::trim).filter(|c| !c.is_empty());
        let request = CompletionRequest {
            system: system_instruction(context),
            user: message.to_string(),
            temperature: TEMPERATURE,
            max_tokens: Some(MAX_TOKENS),
            json_response: false,
        };
        match self.llm.complete(request).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => self.fall_back(message, context, &GenerationError::EmptyReply),
            Err(e) => self.fall_back(message, context, &e),
        }
    }

    fn fall_back(&self, message: &str, context: Option<&str>, error: &GenerationError) -> String {
        let topic = ChatTopic::classify(message);
        tracing::warn!(
            target: "anicare::chat",
            topic = topic.as_str(),
            error = %error,
            "Chat generation failed; using keyword reply"
        );
        fallback_reply(message, context)
    }
}

fn system_instruction(context: Option<&str>) -> String {
    let context_line = context
        .map(|c| format!("Context about user's pet: {c}"))
        .unwrap_or_default();
    format!(
        "You are AniCare AI Assistant, a professional pet care expert. You provide helpful, accurate advice about pet nutrition, training, health, grooming, and behavior.\n\n\
         {context_line}\n\n\
         Keep responses helpful, friendly, and concise. If the question is about serious health concerns, always recommend consulting a veterinarian."
    )
}

/// Canned reply for the message's topic. The general reply mentions the pet context when given.
pub fn fallback_reply(message: &str, pet_context: Option<&str>) -> String {
    match ChatTopic::classify(message) {
        ChatTopic::Nutrition => "For proper nutrition, feed your pet high-quality food appropriate for their age and size. Puppies need 3-4 meals daily, while adults do well with 2 meals. Always provide fresh water and avoid feeding table scraps or foods toxic to pets like chocolate, grapes, or onions.".to_string(),
        ChatTopic::Training => "Start with basic commands like 'sit', 'stay', and 'come' using positive reinforcement. Keep training sessions short (10-15 minutes) and consistent. Reward good behavior immediately with treats and praise. For behavioral issues, consider consulting a professional dog trainer.".to_string(),
        ChatTopic::Health => "Regular veterinary checkups are essential for your pet's health. Watch for changes in appetite, energy levels, or bathroom habits. If you notice any concerning symptoms, contact your veterinarian promptly. Annual vaccinations and preventive care help keep your pet healthy.".to_string(),
        ChatTopic::Grooming => "Regular grooming keeps your pet healthy and comfortable. Brush your pet regularly to prevent matting and reduce shedding. Bathe when necessary with pet-specific shampoo. Don't forget to trim nails, clean ears, and brush teeth regularly for optimal health.".to_string(),
        ChatTopic::Exercise => "Exercise needs vary by breed, age, and size. Most dogs need at least 30 minutes to 2 hours of activity daily. This can include walks, playtime, and mental stimulation. Puppies and senior pets may need modified exercise routines. Always adjust activity based on your pet's individual needs.".to_string(),
        ChatTopic::General => {
            let profile_note = pet_context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| format!("Based on your pet's profile ({c}), "))
                .unwrap_or_default();
            format!(
                "Thank you for your question about pet care. {profile_note}I recommend consulting with a veterinarian for personalized advice. In the meantime, ensure your pet has proper nutrition, regular exercise, and lots of love. Feel free to ask about specific topics like feeding, training, or health concerns."
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn first_matching_topic_wins() {
        assert_eq!(ChatTopic::classify("What FOOD is best?"), ChatTopic::Nutrition);
        assert_eq!(ChatTopic::classify("Feeding and training tips"), ChatTopic::Nutrition);
        assert_eq!(ChatTopic::classify("obedience class or a walk?"), ChatTopic::Training);
        assert_eq!(ChatTopic::classify("Is my dog sick?"), ChatTopic::Health);
        assert_eq!(ChatTopic::classify("How often should I bathe my dog?"), ChatTopic::Grooming);
        assert_eq!(ChatTopic::classify("Let's play fetch"), ChatTopic::Exercise);
        assert_eq!(ChatTopic::classify("Hello there"), ChatTopic::General);
    }

    #[tokio::test]
    async fn returns_the_generated_reply_and_sends_context() {
        let llm = ScriptedGenerator::replying(vec![Ok("Twice a month is plenty.".into())]);
        let responder = ChatResponder::new(llm.clone());
        let reply = responder.respond("How often should I bathe my dog?", Some("Pet Name: Buddy")).await;
        assert_eq!(reply, "Twice a month is plenty.");

        let sent = llm.requests();
        assert_eq!(sent[0].max_tokens, Some(300));
        assert!(!sent[0].json_response);
        assert!(sent[0].system.starts_with("You are AniCare AI Assistant"));
        assert!(sent[0].system.contains("Context about user's pet: Pet Name: Buddy"));
        assert_eq!(sent[0].user, "How often should I bathe my dog?");
    }

    #[tokio::test]
    async fn failure_routes_bathing_question_to_grooming() {
        let llm = ScriptedGenerator::replying(vec![Err(GenerationError::MissingApiKey)]);
        let reply = ChatResponder::new(llm).respond("How often should I bathe my dog?", None).await;
        assert!(reply.starts_with("Regular grooming keeps your pet healthy"));
    }

    #[tokio::test]
    async fn blank_reply_falls_back() {
        let llm = ScriptedGenerator::replying(vec![Ok("   ".into())]);
        let reply = ChatResponder::new(llm).respond("what should I feed her", None).await;
        assert!(reply.starts_with("For proper nutrition"));
    }

    #[test]
    fn general_reply_restates_context_only_when_present() {
        let with = fallback_reply("hi", Some("Pet Name: Luna, Age: Adult, Breed: Husky, Size: N/A"));
        assert!(with.contains("Based on your pet's profile (Pet Name: Luna"));
        assert!(with.contains("consulting with a veterinarian"));

        let without = fallback_reply("hi", Some("  "));
        assert!(!without.contains("Based on your pet's profile"));
        assert!(without.starts_with("Thank you for your question about pet care. I recommend"));
    }

    #[test]
    fn system_instruction_omits_context_line_without_context() {
        let instruction = system_instruction(None);
        assert!(!instruction.contains("Context about user's pet"));
        assert!(instruction.ends_with("always recommend consulting a veterinarian."));
    }
}
