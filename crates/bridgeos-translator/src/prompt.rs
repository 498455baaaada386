// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for translation and daily action-item extraction.
//!
//! The wording is provider-tuned: translation must render the message, not
//! answer it, and extraction must list action items, not summarize.

use std::collections::BTreeMap;

use bridgeos_core::{ContextMessage, ExtractionMessage, IndustryProfile};

/// Builds the translation prompt with industry, gender, and conversation
/// context.
pub fn build_translation_prompt(
    text: &str,
    from_language: &str,
    to_language: &str,
    gender: Option<&str>,
    industry: Option<&IndustryProfile>,
    context: &[ContextMessage],
) -> String {
    let profile = industry.cloned().unwrap_or_else(IndustryProfile::generic);
    let industry_name = &profile.name;
    let description = &profile.description;

    let gender_instruction = match gender {
        Some(g) if g.eq_ignore_ascii_case("male") || g.eq_ignore_ascii_case("female") => {
            format!("\nThe recipient is {g}. Use appropriate gendered grammar for {to_language}.")
        }
        _ => String::new(),
    };

    let mut history_context = String::new();
    if !context.is_empty() {
        history_context.push_str("\n\nRecent conversation for context:\n");
        for msg in context {
            history_context.push_str(&format!("- {}\n", msg.text));
        }
        history_context.push_str(
            "\nUse this context to understand pronouns, references, and topic continuity.\n",
        );
    }

    format!(
        r#"You are a specialized translator for {industry_name} communications.

Context: {description}

Translate from {from_language} to {to_language}.{gender_instruction}{history_context}

Rules:
- Translate the message naturally and conversationally
- For greetings and casual messages (like "What's up?", "How are you?", "Hello"), translate them as natural conversational greetings in {to_language}
- For questions - translate the QUESTION itself - do NOT answer it
- Use industry-specific terminology appropriate for {industry_name}
- Use conversation history to understand pronouns (he/she/it) and references and the overall context.
- Maintain natural workplace communication tone
- Return ONLY the translated message, nothing else

Text to translate:
{text}"#
    )
}

/// Builds the daily action-item extraction prompt over a 24-hour window.
///
/// Messages are grouped by worker; the output must be a flat bullet list of
/// action items, safety issues, and equipment notes, entirely in
/// `output_language`.
pub fn build_extraction_prompt(
    messages: &[ExtractionMessage],
    industry: Option<&IndustryProfile>,
    output_language: &str,
) -> String {
    let profile = industry.cloned().unwrap_or_else(IndustryProfile::generic);
    let industry_name = &profile.name;
    let description = &profile.description;

    // Group by worker, preserving per-worker chronological order.
    let mut by_worker: BTreeMap<&str, Vec<&ExtractionMessage>> = BTreeMap::new();
    for msg in messages {
        by_worker.entry(msg.worker_name.as_str()).or_default().push(msg);
    }

    let mut conversation_text = String::new();
    for (worker_name, worker_messages) in &by_worker {
        conversation_text.push_str(&format!("\n=== {} ===\n", worker_name.to_uppercase()));
        for msg in worker_messages {
            let time_str = msg.sent_at.format("%H:%M");
            conversation_text.push_str(&format!("[{time_str}] {}\n", msg.text));
        }
    }

    format!(
        r#"You are extracting ACTION ITEMS from a {industry_name} workplace conversation.

CRITICAL INSTRUCTIONS:
1. Do NOT summarize the conversation. Do NOT explain what happened. ONLY extract specific action items.
2. Output your response ONLY in {output_language}. This is mandatory.

Context: {description}

Conversation (last 24 hours):
{conversation_text}

EXTRACTION RULES:
1. Extract ONLY items that require action or follow-up
2. Format as bullet points (use • symbol)
3. Be specific - include details like names, numbers, locations
4. Group under these categories ONLY if items exist:
   - Action Items
   - Safety Issues
   - Equipment

INCLUDE:
- Specific tasks mentioned ("check cow 115", "fix gate in section 3")
- Safety concerns that need addressing
- Equipment problems requiring attention
- Explicit instructions or requests

EXCLUDE:
- Greetings, confirmations, acknowledgments
- Questions that were already answered
- General conversation or updates
- Completed tasks (if marked as done)

OUTPUT FORMAT (in {output_language}):
If action items exist, group them by worker name:

[WORKER NAME]:
Action Items:
- [specific task with details]

Safety Issues:
- [specific safety concern]

Equipment:
- [specific equipment problem]

If NO action items exist:
"No action items found."

REMEMBER:
- Each bullet point must be a SPECIFIC, ACTIONABLE task - not a summary
- Your ENTIRE response must be in {output_language}"#
    )
}
