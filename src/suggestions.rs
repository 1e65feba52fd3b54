//! Quest suggestion generation for goals.
//!
//! The session only consumes the `{text, xp, stats}` shape; where the
//! suggestions come from (a language-model API or the static fallback
//! templates) is behind the `QuestSuggester` trait.

use std::collections::BTreeMap;
use std::error::Error;

use serde::Deserialize;
use tracing::warn;

use crate::constants::{SUGGESTION_XP_MAX, SUGGESTION_XP_MIN};
use crate::goals::GoalType;

/// A generated quest candidate, not yet assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedQuest {
    pub text: String,
    pub xp: u32,
    pub stats: BTreeMap<String, u32>,
}

impl SuggestedQuest {
    /// Generated content is untrusted: text must be non-empty and XP must
    /// sit inside the accepted suggestion band.
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty()
            && self.xp >= SUGGESTION_XP_MIN
            && self.xp <= SUGGESTION_XP_MAX
    }
}

pub trait QuestSuggester {
    /// Returns an ordered list of quest candidates for a goal. Empty on
    /// failure; callers pick their own fallback.
    fn suggest(&self, goal_text: &str, goal_type: GoalType) -> Vec<SuggestedQuest>;
}

/// Static template suggestions used when no generator is configured or the
/// remote one fails.
pub struct FallbackSuggester;

impl QuestSuggester for FallbackSuggester {
    fn suggest(&self, goal_text: &str, goal_type: GoalType) -> Vec<SuggestedQuest> {
        let stats = |name: &str, points: u32| -> BTreeMap<String, u32> {
            [(name.to_string(), points)].into_iter().collect()
        };
        match goal_type {
            GoalType::Habit => vec![
                SuggestedQuest {
                    text: format!("Set aside 30 minutes for {}", goal_text),
                    xp: 20,
                    stats: stats("education", 2),
                },
                SuggestedQuest {
                    text: format!("Create a checklist for {}", goal_text),
                    xp: 15,
                    stats: stats("mindset", 1),
                },
                SuggestedQuest {
                    text: format!("Track progress on {}", goal_text),
                    xp: 25,
                    stats: stats("education", 3),
                },
            ],
            GoalType::Material => vec![
                SuggestedQuest {
                    text: format!("Research best practices for {}", goal_text),
                    xp: 30,
                    stats: stats("education", 2),
                },
                SuggestedQuest {
                    text: format!("Create a plan to achieve {}", goal_text),
                    xp: 25,
                    stats: stats("mindset", 2),
                },
                SuggestedQuest {
                    text: format!("Set milestones for {}", goal_text),
                    xp: 20,
                    stats: stats("healthWellness", 1),
                },
            ],
        }
    }
}

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Suggestion generator backed by the OpenAI chat-completions API.
pub struct OpenAiSuggester {
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawSuggestion {
    text: String,
    xp: u32,
    #[serde(default)]
    stats: BTreeMap<String, u32>,
}

impl OpenAiSuggester {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: OPENAI_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self { api_key, endpoint }
    }

    fn build_prompt(goal_text: &str, goal_type: GoalType) -> String {
        format!(
            "The user has a {} goal: \"{}\".\n\n\
             Suggest 3 specific daily quests that help with this goal. Each quest \
             should be actionable, measurable, and realistic for daily completion.\n\n\
             Requirements:\n\
             - Each quest should include an XP value (10-100, higher for more challenging tasks)\n\
             - Each quest should target one relevant attribute: mindset, healthWellness, \
             charisma, education, or spirituality\n\
             - Quests should be specific and actionable (not vague like \"study more\")\n\n\
             Return only a JSON array in this exact format, no other text:\n\
             [{{ \"text\": \"Review notes for 1 hour\", \"xp\": 25, \"stats\": {{ \"education\": 3 }} }}]",
            goal_type.as_str(),
            goal_text
        )
    }

    fn fetch(&self, goal_text: &str, goal_type: GoalType) -> Result<Vec<SuggestedQuest>, Box<dyn Error>> {
        let response: ChatResponse = ureq::post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(ureq::json!({
                "model": OPENAI_MODEL,
                "messages": [{"role": "user", "content": Self::build_prompt(goal_text, goal_type)}],
                "temperature": 0.7,
                "max_tokens": 500,
            }))?
            .into_json()?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or("empty completion response")?;

        parse_suggestions(content)
    }
}

/// Parses the model's reply into suggestions. The reply is expected to be a
/// bare JSON array, possibly wrapped in whitespace.
fn parse_suggestions(content: &str) -> Result<Vec<SuggestedQuest>, Box<dyn Error>> {
    let raw: Vec<RawSuggestion> = serde_json::from_str(content.trim())?;
    Ok(raw
        .into_iter()
        .map(|r| SuggestedQuest {
            text: r.text,
            xp: r.xp,
            stats: r.stats,
        })
        .collect())
}

impl QuestSuggester for OpenAiSuggester {
    fn suggest(&self, goal_text: &str, goal_type: GoalType) -> Vec<SuggestedQuest> {
        match self.fetch(goal_text, goal_type) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "quest suggestion request failed");
                Vec::new()
            }
        }
    }
}
