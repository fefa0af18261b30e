//! Routing of incoming Telegram messages

use crate::telegram::Message;
use jangaloga::pipeline::Inbound;

/// What to do with one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/start` or `/help`
    Help,
    /// Run the translation pipeline
    Process(Inbound),
    /// Other commands, stickers, photos and the like
    Ignore,
}

/// Command name without the leading slash and `@botname` suffix
fn command_name(text: &str) -> Option<&str> {
    let first = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(first.split('@').next().unwrap_or(first))
}

pub fn route(message: &Message) -> Route {
    let chat = message.chat.id;
    if let Some(voice) = &message.voice {
        return Route::Process(Inbound::voice(chat, &voice.file_id, voice.duration));
    }
    let Some(text) = message.text.as_deref() else {
        return Route::Ignore;
    };
    if text.starts_with('/') {
        return match command_name(text) {
            Some("start") | Some("help") => Route::Help,
            _ => Route::Ignore,
        };
    }
    if text.trim().is_empty() {
        return Route::Ignore;
    }
    Route::Process(Inbound::text(chat, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::{Chat, Voice};

    fn message(text: Option<&str>, voice: Option<Voice>) -> Message {
        Message {
            message_id: 1,
            chat: Chat { id: 42 },
            text: text.map(str::to_string),
            voice,
        }
    }

    #[test]
    fn test_help_commands() {
        assert_eq!(route(&message(Some("/start"), None)), Route::Help);
        assert_eq!(route(&message(Some("/help"), None)), Route::Help);
        assert_eq!(route(&message(Some("/start@jangaloga_bot"), None)), Route::Help);
    }

    #[test]
    fn test_other_commands_ignored() {
        assert_eq!(route(&message(Some("/settings"), None)), Route::Ignore);
        assert_eq!(route(&message(Some("/"), None)), Route::Ignore);
    }

    #[test]
    fn test_text_and_voice_processed() {
        assert_eq!(
            route(&message(Some("Привет!"), None)),
            Route::Process(Inbound::text(42, "Привет!"))
        );
        let voice = Voice {
            file_id: "f1".to_string(),
            duration: Some(5),
        };
        assert_eq!(
            route(&message(None, Some(voice))),
            Route::Process(Inbound::voice(42, "f1", Some(5)))
        );
    }

    #[test]
    fn test_empty_message_ignored() {
        assert_eq!(route(&message(None, None)), Route::Ignore);
        assert_eq!(route(&message(Some("   "), None)), Route::Ignore);
    }
}
