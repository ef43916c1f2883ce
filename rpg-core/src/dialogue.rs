//! Character dialogue through a remote chat-completion service.
//!
//! The [`DialogueAdapter`] turns a character's persona and recent context
//! into one chat request and always comes back with something the
//! character can say. Failures never escape: they become one of a handful
//! of fallback lines.

use async_trait::async_trait;
use chat::{ChatClient, Message, Request, Response};
use tracing::{debug, warn};

/// Sampling temperature for character replies.
pub const TEMPERATURE: f32 = 0.8;

/// Generation ceiling in model tokens. Independent of the character cap
/// applied to the returned text.
pub const MAX_OUTPUT_TOKENS: usize = 150;

/// Appended when a reply is cut short.
pub const ELLIPSIS: &str = "...";

const EMPTY_REPLY: &str = "Sorry, I can't come up with a reply right now.";
const DEFAULT_SITUATION: &str = "You are at your usual spot.";

/// Anything that can answer a chat request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: Request) -> Result<Response, chat::Error>;
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn complete(&self, request: Request) -> Result<Response, chat::Error> {
        ChatClient::complete(self, request).await
    }
}

// ============================================================================
// Failure classification
// ============================================================================

/// Broad reason a remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ModelUnavailable,
    InvalidCredentials,
    QuotaExhausted,
    Network,
    Unavailable,
}

/// Substring rules, checked in order against the lowercased error text.
///
/// This is a heuristic: providers word their errors differently, and a
/// message that happens to contain an earlier rule's substring wins.
const FAILURE_RULES: &[(&str, FailureKind)] = &[
    ("404", FailureKind::ModelUnavailable),
    ("not found", FailureKind::ModelUnavailable),
    ("401", FailureKind::InvalidCredentials),
    ("403", FailureKind::InvalidCredentials),
    ("permission", FailureKind::InvalidCredentials),
    ("quota", FailureKind::QuotaExhausted),
    ("limit", FailureKind::QuotaExhausted),
    ("connection", FailureKind::Network),
    ("timeout", FailureKind::Network),
];

impl FailureKind {
    /// Classify an error description.
    pub fn classify(description: &str) -> Self {
        let description = description.to_lowercase();
        FAILURE_RULES
            .iter()
            .find(|(needle, _)| description.contains(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(FailureKind::Unavailable)
    }

    /// Line shown to the player instead of a reply.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            FailureKind::ModelUnavailable => {
                "The model is unavailable. Please check that the model name is correct."
            }
            FailureKind::InvalidCredentials => {
                "The API key is invalid. Please check that it is correct."
            }
            FailureKind::QuotaExhausted => "The API quota is used up. Please try again later.",
            FailureKind::Network => "There is a network problem. Please try again later.",
            FailureKind::Unavailable => {
                "The AI service is temporarily unavailable. Please try again later."
            }
        }
    }
}

// ============================================================================
// Requests and replies
// ============================================================================

/// Everything needed to ask a character for one reply.
#[derive(Debug, Clone, Copy)]
pub struct DialogueRequest<'a> {
    pub character_name: &'a str,
    pub personality: &'a str,
    pub player_message: &'a str,
    pub context: &'a str,
}

/// How a reply came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The model answered.
    Generated,
    /// The call succeeded but came back without text.
    Empty,
    /// The call failed.
    Failed(FailureKind),
}

/// What the character says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl Reply {
    pub fn is_generated(&self) -> bool {
        self.outcome == ReplyOutcome::Generated
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{ELLIPSIS}", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// The system instruction for a character.
pub fn build_character_prompt(
    name: &str,
    personality: &str,
    context: &str,
    max_response_length: usize,
) -> String {
    let situation = if context.trim().is_empty() {
        DEFAULT_SITUATION
    } else {
        context
    };

    format!(
        "You are {name}, a character in a text RPG.\n\
         \n\
         Personality: {personality}\n\
         \n\
         You should:\n\
         - Always stay in character\n\
         - Respond the way {name} would\n\
         - Keep the conversation fun and engaging\n\
         - Help the player when it makes sense\n\
         - Give your replies personality and style\n\
         - Keep replies under {max_response_length} characters\n\
         - Reply in the same language the player uses\n\
         \n\
         Current situation: {situation}\n\
         \n\
         Speak naturally as {name}."
    )
}

// ============================================================================
// Adapter
// ============================================================================

/// Sends dialogue requests and sanitizes what comes back.
pub struct DialogueAdapter<B> {
    backend: B,
    max_response_length: usize,
}

impl<B: ChatBackend> DialogueAdapter<B> {
    pub fn new(backend: B, max_response_length: usize) -> Self {
        Self {
            backend,
            max_response_length,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn max_response_length(&self) -> usize {
        self.max_response_length
    }

    /// Ask the character for a reply. Never fails.
    pub async fn respond(&self, request: DialogueRequest<'_>) -> Reply {
        let system = build_character_prompt(
            request.character_name,
            request.personality,
            request.context,
            self.max_response_length,
        );
        debug!(
            character = request.character_name,
            prompt_chars = system.chars().count(),
            message_chars = request.player_message.chars().count(),
            "sending dialogue request"
        );

        let chat_request = Request::new(vec![Message::user(request.player_message)])
            .with_system(system)
            .with_max_tokens(MAX_OUTPUT_TOKENS)
            .with_temperature(TEMPERATURE);

        match self.backend.complete(chat_request).await {
            Ok(response) => match response.text() {
                Some(text) => Reply {
                    text: truncate_reply(text, self.max_response_length),
                    outcome: ReplyOutcome::Generated,
                },
                None => {
                    debug!(character = request.character_name, "empty reply from model");
                    Reply {
                        text: EMPTY_REPLY.to_string(),
                        outcome: ReplyOutcome::Empty,
                    }
                }
            },
            Err(e) => {
                let kind = FailureKind::classify(&e.to_string());
                warn!(
                    character = request.character_name,
                    error = %e,
                    ?kind,
                    "dialogue request failed"
                );
                Reply {
                    text: kind.fallback_message().to_string(),
                    outcome: ReplyOutcome::Failed(kind),
                }
            }
        }
    }
}
