//! Fixed instruction templates wrapped around the selected text.

use crate::api::Message;
use crate::query::{QueryKind, QueryRequest};

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that explains text a reader has \
selected on a web page. Answer clearly and concisely. Use short paragraphs, and use bullet \
points or **bold** only where they help.";

const EXPLAIN_TEMPLATE: &str = "Explain the following text in simple terms. If it contains \
jargon, acronyms or references, clarify them.\n\nText:\n\"\"\"\n{text}\n\"\"\"";

const QUESTION_TEMPLATE: &str = "Answer the question below about the following text.\n\n\
Text:\n\"\"\"\n{text}\n\"\"\"\n\nQuestion: {question}";

/// System instruction plus one user message for the request kind.
pub fn build_messages(request: &QueryRequest) -> Vec<Message> {
    let text = request.text.trim();
    let user = match (request.kind, request.question()) {
        (QueryKind::CustomQuestion, Some(question)) => QUESTION_TEMPLATE
            .replace("{question}", question)
            .replace("{text}", text),
        _ => EXPLAIN_TEMPLATE.replace("{text}", text),
    };
    vec![Message::system(SYSTEM_INSTRUCTION), Message::user(user)]
}
