//! Directive and memory texts used by the turn policy.

use crate::context::WelcomeSettings;

/// Addressee choice meaning "someone else".
pub const SOMEONE_ELSE: &str = "someone else";
/// Addressee choice meaning "unclear".
pub const NOT_SURE: &str = "not sure";

/// The three addressee choices; the first is the soul itself.
pub fn addressee_choices(soul: &str) -> Vec<String> {
    vec![soul.to_lowercase(), SOMEONE_ELSE.into(), NOT_SURE.into()]
}

pub fn addressee_description(soul: &str, user: &str) -> String {
    format!(
        "{soul} is the moderator of this channel. Participants sometimes talk amongst themselves \
         without {soul}. In this last message sent by {user}, guess which person they are probably \
         speaking with."
    )
}

pub fn needs_context_query(user: &str, topics: &str) -> String {
    format!("{user} has asked a question about {topics}")
}

pub fn context_reply_instruction(soul: &str, user: &str) -> String {
    format!(
        "{soul} thinks of an answer to {user}'s question based on what was just remembered as a \
         relevant memory."
    )
}

pub fn simple_reply_instruction(soul: &str, user: &str, emotion: &str) -> String {
    format!("Feeling {emotion}, {soul} thinks of a response to {user}.")
}

pub fn welcome_instruction(soul: &str, user: &str) -> String {
    format!("{soul} thinks of a short and cool welcome message for {user}.")
}

/// The welcome thought, augmented with everything the soul must mention.
pub fn welcome_memory(soul: &str, user: &str, thought: &str, welcome: &WelcomeSettings) -> String {
    format!(
        "{soul} thought: \"{thought} oh and I CANNOT FORGET to mention these SUPER IMPORTANT things:\n\
         - there are {count} levels in the server: {areas}\n\
         - {user} needs to know that the name of the place we are now is \"the {current}\"\n\
         - {user} should check out {recommended}\n\
         - if {user} is a holder, they should go to channel {channel} so they can join the {holder}\n\
         - no other channel or area should be mentioned now!!!\"",
        count = welcome.areas.len(),
        areas = list_areas(&welcome.areas),
        current = welcome.current_area,
        recommended = welcome.recommended_area,
        channel = welcome.holder_verify_channel,
        holder = welcome.holder_area,
    )
}

/// "a", "a and b", "a, b, and c".
fn list_areas(areas: &[String]) -> String {
    match areas {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

pub fn speak_part_instruction(soul: &str, part: usize, total: usize, max_words: usize) -> String {
    format!(
        "{soul} speaks part {part} of {total} of what he just thought, using no more than \
         {max_words} words."
    )
}

pub fn finished_query(soul: &str) -> String {
    format!("{soul} said everything he just thought.")
}

/// What is remembered about a user, or `None` when nothing is.
pub fn recollection(soul: &str, user: &str, profile: &str, last_message: &str) -> Option<String> {
    let mut remembered = profile.to_string();
    if !last_message.is_empty() {
        remembered.push_str(&format!(
            "\nThe last message {soul} sent to {user} was: {last_message}"
        ));
    }
    let remembered = remembered.trim();
    if remembered.is_empty() {
        return None;
    }
    Some(format!("{soul} remembers this about {user}:\n{remembered}"))
}
