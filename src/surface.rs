use crate::dialog::{DialogContent, DialogId, DialogVariant};
use crate::geometry::{Placement, Viewport};
use crate::selection::RawSelection;

/// The host page as seen by the controller.
///
/// Implementations own the actual elements. The controller never calls
/// `render_dialog` or `unmount_dialog` for an id it has already unmounted.
pub trait PageSurface: Send {
    fn viewport(&self) -> Viewport;
    fn read_selection(&self) -> Option<RawSelection>;

    fn show_affordance(&mut self, placement: Placement);
    fn remove_affordance(&mut self);

    fn mount_dialog(&mut self, id: DialogId, variant: DialogVariant, placement: Placement);
    fn render_dialog(&mut self, id: DialogId, content: DialogContent);
    fn unmount_dialog(&mut self, id: DialogId);
}
