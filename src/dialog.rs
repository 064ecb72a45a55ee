use crate::bridge::BridgeRequest;
use crate::format::render_markdown;
use crate::geometry::Placement;
use crate::query::QueryResult;

/// Identifies one mounted panel. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogVariant {
    /// Dispatches as soon as the panel opens.
    Explain,
    /// Shows a question input first.
    Ask,
}

/// What the panel body shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogContent {
    QuestionPrompt,
    Loading,
    Response { html: String },
    Error { message: String },
}

impl DialogContent {
    /// Every result becomes visible text; an empty "success" is shown as an error.
    pub fn from_result(result: &QueryResult) -> Self {
        match (&result.response, &result.error) {
            (Some(text), _) if result.success && !text.trim().is_empty() => Self::Response {
                html: render_markdown(text),
            },
            (_, Some(error)) if !error.trim().is_empty() => Self::Error {
                message: error.clone(),
            },
            _ => Self::Error {
                message: "no response received".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogPhase {
    AwaitingQuestion,
    Loading,
    Done,
}

/// State of the mounted panel.
#[derive(Debug, Clone)]
pub struct DialogState {
    pub id: DialogId,
    pub variant: DialogVariant,
    pub text: String,
    pub question: Option<String>,
    pub phase: DialogPhase,
    pub placement: Placement,
}

impl DialogState {
    pub fn open(id: DialogId, variant: DialogVariant, text: String, placement: Placement) -> Self {
        let phase = match variant {
            DialogVariant::Explain => DialogPhase::Loading,
            DialogVariant::Ask => DialogPhase::AwaitingQuestion,
        };
        Self {
            id,
            variant,
            text,
            question: None,
            phase,
            placement,
        }
    }

    pub fn content(&self) -> DialogContent {
        match self.phase {
            DialogPhase::AwaitingQuestion => DialogContent::QuestionPrompt,
            _ => DialogContent::Loading,
        }
    }

    /// Request to send right after opening, if the variant dispatches immediately.
    pub fn initial_request(&self) -> Option<BridgeRequest> {
        match self.variant {
            DialogVariant::Explain => Some(BridgeRequest::Query {
                text: self.text.clone(),
            }),
            DialogVariant::Ask => None,
        }
    }

    /// Locks in the question and moves to loading. Blank questions and
    /// repeated submits are ignored.
    pub fn submit(&mut self, question: &str) -> Option<BridgeRequest> {
        let question = question.trim();
        if self.phase != DialogPhase::AwaitingQuestion || question.is_empty() {
            return None;
        }
        self.question = Some(question.to_string());
        self.phase = DialogPhase::Loading;
        Some(BridgeRequest::CustomQuery {
            text: self.text.clone(),
            question: question.to_string(),
        })
    }

    /// Applies a result if this panel is still waiting for one.
    pub fn complete(&mut self, result: &QueryResult) -> Option<DialogContent> {
        if self.phase != DialogPhase::Loading {
            return None;
        }
        self.phase = DialogPhase::Done;
        Some(DialogContent::from_result(result))
    }
}
