// src/services/prompt.rs

pub const USER_SEPARATOR: &str = "\n\nUser: ";
pub const ASSISTANT_CUE: &str = "\n\nAssistant:";

/// Build the single text prompt sent upstream.
///
/// The user message is bounded to its last `max_user_chars` characters;
/// `0` disables the bound.
pub fn format_prompt(
    system_instruction: &str,
    user_message: &str,
    max_user_chars: usize,
) -> String {
    let user = truncate_to_last_chars(user_message, max_user_chars);
    if user.len() < user_message.len() {
        tracing::warn!(
            original_chars = user_message.chars().count(),
            kept_chars = max_user_chars,
            "user message truncated"
        );
    }

    let mut prompt = String::with_capacity(
        system_instruction.len() + USER_SEPARATOR.len() + user.len() + ASSISTANT_CUE.len(),
    );
    prompt.push_str(system_instruction);
    prompt.push_str(USER_SEPARATOR);
    prompt.push_str(user);
    prompt.push_str(ASSISTANT_CUE);
    prompt
}

pub fn truncate_to_last_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return text;
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}
