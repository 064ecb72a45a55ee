//! The page-side actor: selection monitoring and dialog presentation.
//!
//! All UI state lives in one [`UiSession`] mutated only from [`Controller::handle`].
//! Timers and in-flight queries run as separate tasks and report back by sending
//! an [`Event`] into the same loop.

use crate::bridge::{BridgeClient, BridgeRequest};
use crate::constants::SELECTION_DEBOUNCE;
use crate::dialog::{DialogContent, DialogId, DialogState, DialogVariant};
use crate::geometry::{place_affordance, place_dialog};
use crate::query::QueryResult;
use crate::scheduler::ScheduledTask;
use crate::selection::{key_changes_selection, Key, SelectionSnapshot};
use crate::session::UiSession;
use crate::surface::PageSurface;
use tokio::sync::mpsc;

/// Which part of the page an input event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Page,
    Affordance,
    Dialog,
}

/// Input forwarded from the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    PointerUp { target: Target },
    PointerDown { target: Target },
    KeyUp { key: Key, shift: bool },
    Scroll,
    VisibilityHidden,
    /// One of the affordance's actions was clicked.
    TriggerActivated(DialogVariant),
    /// Enter or the submit button in the question input.
    QuestionSubmitted(String),
    /// The panel's close control.
    CloseRequested,
}

#[derive(Debug)]
pub enum Event {
    Page(PageEvent),
    SelectionSettled { generation: u64 },
    QueryCompleted { dialog: DialogId, result: QueryResult },
    Shutdown,
}

/// Cloneable sender for feeding a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::UnboundedSender<Event>,
}

impl ControllerHandle {
    /// Returns false once the controller has stopped.
    pub fn send(&self, event: PageEvent) -> bool {
        self.sender.send(Event::Page(event)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(Event::Shutdown);
    }
}

pub struct Controller<S: PageSurface> {
    surface: S,
    session: UiSession,
    bridge: BridgeClient,
    events: mpsc::UnboundedSender<Event>,
    pending_check: Option<ScheduledTask>,
}

impl<S: PageSurface> Controller<S> {
    pub fn new(surface: S, bridge: BridgeClient) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            surface,
            session: UiSession::new(),
            bridge,
            events,
            pending_check: None,
        };
        (controller, receiver)
    }

    pub fn controller_handle(&self) -> ControllerHandle {
        ControllerHandle {
            sender: self.events.clone(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn session(&self) -> &UiSession {
        &self.session
    }

    /// Processes events until `Shutdown`, then hands the surface back.
    pub async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Event>) -> S {
        while let Some(event) = receiver.recv().await {
            if matches!(event, Event::Shutdown) {
                break;
            }
            self.handle(event);
        }
        tracing::debug!("Controller shutting down");
        self.close_dialog();
        self.clear_affordance();
        self.surface
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Page(page) => self.handle_page(page),
            Event::SelectionSettled { generation } => self.on_selection_settled(generation),
            Event::QueryCompleted { dialog, result } => self.on_query_completed(dialog, result),
            Event::Shutdown => {}
        }
    }

    fn handle_page(&mut self, event: PageEvent) {
        match event {
            PageEvent::PointerUp { target } => {
                if target == Target::Page {
                    self.schedule_selection_check();
                }
            }
            PageEvent::PointerDown { target } => {
                if target == Target::Page && self.session.has_dialog() {
                    self.close_dialog();
                }
            }
            PageEvent::KeyUp { key, shift } => {
                if key == Key::Escape {
                    self.close_dialog();
                    self.clear_affordance();
                } else if key_changes_selection(&key, shift) {
                    self.schedule_selection_check();
                }
            }
            PageEvent::Scroll => self.clear_affordance(),
            PageEvent::VisibilityHidden => {
                if let Some(check) = self.pending_check.take() {
                    check.cancel();
                }
                self.clear_affordance();
            }
            PageEvent::TriggerActivated(variant) => self.open_dialog(variant),
            PageEvent::QuestionSubmitted(question) => self.submit_question(&question),
            PageEvent::CloseRequested => self.close_dialog(),
        }
    }

    /// Restarts the debounce; the previous timer is aborted when replaced.
    fn schedule_selection_check(&mut self) {
        let generation = self.session.bump_generation();
        let events = self.events.clone();
        self.pending_check = Some(ScheduledTask::after(SELECTION_DEBOUNCE, async move {
            let _ = events.send(Event::SelectionSettled { generation });
        }));
    }

    fn on_selection_settled(&mut self, generation: u64) {
        if generation != self.session.selection_generation {
            return;
        }
        self.pending_check = None;
        if self.session.has_dialog() {
            return;
        }

        let viewport = self.surface.viewport();
        let snapshot = self
            .surface
            .read_selection()
            .and_then(|raw| SelectionSnapshot::capture(&raw, &viewport));

        self.clear_affordance();
        match snapshot {
            Some(snapshot) => {
                let placement = place_affordance(&snapshot.rect, &viewport);
                tracing::debug!(
                    "Selection of {} chars, affordance {:?}",
                    snapshot.text.len(),
                    placement.side
                );
                self.surface.show_affordance(placement);
                self.session.affordance = Some(placement);
                self.session.snapshot = Some(snapshot);
            }
            None => self.session.snapshot = None,
        }
    }

    fn open_dialog(&mut self, variant: DialogVariant) {
        let Some(snapshot) = self.session.snapshot.take() else {
            tracing::debug!("Trigger activated without a selection");
            return;
        };
        self.clear_affordance();
        self.close_dialog();

        let id = self.session.next_dialog_id();
        let placement = place_dialog(&snapshot.rect, &self.surface.viewport());
        let dialog = DialogState::open(id, variant, snapshot.text, placement);

        self.surface.mount_dialog(id, variant, placement);
        self.surface.render_dialog(id, dialog.content());
        tracing::info!("Opened {:?} dialog {:?}", variant, id);

        let request = dialog.initial_request();
        self.session.dialog = Some(dialog);
        if let Some(request) = request {
            self.send_query(id, request);
        }
    }

    fn submit_question(&mut self, question: &str) {
        let Some(dialog) = self.session.dialog.as_mut() else {
            return;
        };
        let id = dialog.id;
        match dialog.submit(question) {
            Some(request) => {
                self.surface.render_dialog(id, DialogContent::Loading);
                self.send_query(id, request);
            }
            None => tracing::debug!("Ignoring question submit for dialog {:?}", id),
        }
    }

    /// The HTTP call is not aborted when the dialog closes; its result is
    /// dropped in `on_query_completed` instead.
    fn send_query(&self, dialog: DialogId, request: BridgeRequest) {
        let bridge = self.bridge.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = bridge.request(request).await;
            if events.send(Event::QueryCompleted { dialog, result }).is_err() {
                tracing::debug!("Controller gone before query for {:?} finished", dialog);
            }
        });
    }

    fn on_query_completed(&mut self, id: DialogId, result: QueryResult) {
        let Some(dialog) = self.session.dialog_mut(id) else {
            tracing::debug!("Discarding late result for closed dialog {:?}", id);
            return;
        };
        if let Some(content) = dialog.complete(&result) {
            if let DialogContent::Error { message } = &content {
                tracing::warn!("Dialog {:?} shows error: {}", id, message);
            }
            self.surface.render_dialog(id, content);
        }
    }

    fn close_dialog(&mut self) {
        if let Some(dialog) = self.session.dialog.take() {
            self.surface.unmount_dialog(dialog.id);
            tracing::info!("Closed dialog {:?}", dialog.id);
        }
    }

    fn clear_affordance(&mut self) {
        if self.session.affordance.take().is_some() {
            self.surface.remove_affordance();
        }
    }
}
