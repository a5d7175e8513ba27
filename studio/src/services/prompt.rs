//! Prompt synthesis for one generation request.
//!
//! The model endpoint takes a single user message, so the request, project
//! context, recent conversation, and design instructions are flattened into
//! one string.

use frames::{Message, Role};

const INSTRUCTIONS: &str = "\
You are a senior UI designer and front-end engineer. Produce a modern, polished, fully responsive result.

Scope:
- If the request names a single component (a form, a card, a navigation bar), build only that component, centered in a clean container.
- If the request asks for a website or landing page, build a complete multi-section page (navigation, hero, features, social proof, pricing, FAQ, call to action, footer).
- If the request is a question rather than something to build, answer it in plain prose without any code block.

Design:
- Pick a palette that fits the subject; avoid generic defaults and keep contrast accessible.
- Use Tailwind CSS utility classes and the Inter font. Interactive elements get smooth hover and active transitions.
- Use real, persuasive copy and relevant Unsplash photos (https://images.unsplash.com/photo-{ID}?auto=format&fit=crop&q=80&w=1200).

Output:
- Return the markup for the inside of <body> only, inside a single ```html fenced block.
- Put nothing after the closing fence.";

/// Assemble the prompt sent to the model.
///
/// `history` is the conversation before this request; only the last
/// `context_turns` non-empty messages are included.
#[must_use]
pub fn build_prompt(
    user_input: &str,
    description: Option<&str>,
    default_description: &str,
    history: &[Message],
    context_turns: usize,
) -> String {
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(default_description);

    let mut prompt = format!("User Request: {}\nProject Context: {description}\n", user_input.trim());

    let recent: Vec<&Message> = history.iter().filter(|m| !m.content.trim().is_empty()).collect();
    let recent = &recent[recent.len().saturating_sub(context_turns)..];
    if !recent.is_empty() {
        prompt.push_str("\nRecent Conversation:\n");
        for message in recent {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{speaker}: {}\n", message.content.trim()));
        }
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}
