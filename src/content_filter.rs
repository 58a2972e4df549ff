//! Slur check for the names and message that end up in a share link.
//!
//! Only `Type::OFFENSIVE & Type::SEVERE` is refused; ordinary profanity in a
//! birthday message between friends goes through.

use crate::session::SessionConfig;
use rustrict::{CensorStr, Type};
use thiserror::Error;

/// Content check errors. The message names the field, never the match.
#[derive(Error, Debug, PartialEq)]
pub enum ContentError {
    #[error("{0} contains language that is not allowed")]
    Disallowed(&'static str),
}

pub fn contains_slur(text: &str) -> bool {
    let visible: String = text.chars().filter(|c| !is_invisible(*c)).collect();
    visible.is(Type::OFFENSIVE & Type::SEVERE)
}

/// Check every user-entered field of a session before it is published
pub fn check_session_text(session: &SessionConfig) -> Result<(), ContentError> {
    let fields = [
        ("Name", session.user_name.as_str()),
        ("From", session.giver_name.as_str()),
        ("Message", session.custom_message.as_str()),
    ];
    for (field, text) in fields {
        if contains_slur(text) {
            log::warn!("Share link refused: disallowed text in {}", field);
            return Err(ContentError::Disallowed(field));
        }
    }
    Ok(())
}

// Zero-width and other invisible code points used to split words past the filter
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200b}'..='\u{200f}' | '\u{2060}' | '\u{feff}' | '\u{00ad}' | '\u{034f}' | '\u{061c}'
            | '\u{115f}' | '\u{1160}' | '\u{17b4}' | '\u{17b5}' | '\u{180e}'
    )
}
