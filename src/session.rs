use crate::dialog::{DialogId, DialogState};
use crate::geometry::Placement;
use crate::selection::SelectionSnapshot;

/// Per-page UI state, owned by exactly one controller.
#[derive(Debug, Default)]
pub struct UiSession {
    /// Where the trigger affordance is shown, if it is.
    pub affordance: Option<Placement>,
    /// Latest usable selection. Superseded by the next one, dropped when a
    /// dialog opens or the selection goes away.
    pub snapshot: Option<SelectionSnapshot>,
    pub dialog: Option<DialogState>,
    /// Incremented on every selection check scheduled; a firing whose
    /// generation is stale is ignored.
    pub selection_generation: u64,
    next_dialog_id: u64,
}

impl UiSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_dialog_id(&mut self) -> DialogId {
        self.next_dialog_id += 1;
        DialogId(self.next_dialog_id)
    }

    pub fn bump_generation(&mut self) -> u64 {
        self.selection_generation += 1;
        self.selection_generation
    }

    pub fn has_dialog(&self) -> bool {
        self.dialog.is_some()
    }

    /// The open dialog, only if it is the one with `id`.
    pub fn dialog_mut(&mut self, id: DialogId) -> Option<&mut DialogState> {
        self.dialog.as_mut().filter(|d| d.id == id)
    }
}
