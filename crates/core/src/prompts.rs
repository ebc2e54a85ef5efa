//! Prompt text used for answer generation, kept in one place so the exact
//! wording is inspectable and testable.

/// System prompt for the completion request. `{context}` is replaced with
/// the assembled retrieval context before sending.
pub const RAG_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that answers questions about a course syllabus.
Use the following pieces of retrieved context to answer the question.
If the answer is not in the context, say "I don't know the answer to that based on the syllabus."
Keep the answer concise and strictly based on the provided context.

Context:
{context}

Answer:
"#;

/// The sentence the prompt instructs the model to reply with when the
/// context does not contain the answer. With an empty context (nothing
/// ingested yet) this is the expected assistant output.
pub const REFUSAL_ANSWER: &str = "I don't know the answer to that based on the syllabus.";

pub fn render_system_prompt(context: &str) -> String {
    RAG_SYSTEM_PROMPT.replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_substitutes_the_context() {
        let rendered = render_system_prompt("Office hours: Mon 3-5pm.");
        assert!(rendered.contains("Office hours: Mon 3-5pm."));
        assert!(!rendered.contains("{context}"));
    }

    #[test]
    fn prompt_instructs_the_exact_refusal_sentence() {
        assert!(RAG_SYSTEM_PROMPT.contains(REFUSAL_ANSWER));
        let rendered = render_system_prompt("");
        assert!(rendered.contains(REFUSAL_ANSWER));
    }

    #[test]
    fn empty_context_still_renders_the_full_template() {
        let rendered = render_system_prompt("");
        assert!(rendered.starts_with("You are a helpful assistant"));
        assert!(rendered.contains("Context:\n\n"));
        assert!(rendered.trim_end().ends_with("Answer:"));
    }
}
