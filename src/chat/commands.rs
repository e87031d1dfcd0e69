//! Classification of chat prompt input.
//!
//! Anything that is not blank and not an exit word is sent to the proxy
//! verbatim (after trimming).

/// Words that end the chat.  Matching is exact and case-sensitive.
pub const EXIT_WORDS: [&str; 3] = ["خروج", "exit", "quit"];

/// What to do with one line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Leave the chat.
    Exit,
    /// Blank line; prompt again without touching the network.
    Skip,
    /// Send this text.
    Send(String),
}

/// Classifies a raw input line.
///
/// # Examples
///
/// ```
/// # use seekproxy::chat::{InputAction, classify_input};
/// assert_eq!(classify_input(" quit "), InputAction::Exit);
/// assert_eq!(classify_input("   "), InputAction::Skip);
/// assert_eq!(classify_input("Quit"), InputAction::Send("Quit".to_string()));
/// ```
pub fn classify_input(line: &str) -> InputAction {
    let line = line.trim();
    if EXIT_WORDS.contains(&line) {
        InputAction::Exit
    } else if line.is_empty() {
        InputAction::Skip
    } else {
        InputAction::Send(line.to_string())
    }
}

/// The hint shown once the session is ready.
pub fn help_text() -> &'static str {
    "Type your message (or 'exit' / 'خروج' to quit)"
}
