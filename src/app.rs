use crate::api::{create_provider, ChatProvider};
use crate::bridge::Bridge;
use crate::config::{AppConfig, ProviderProfile, SettingsStore};
use crate::controller::{Controller, ControllerHandle};
use crate::dispatcher::Dispatcher;
use crate::surface::PageSurface;
use anyhow::anyhow;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running worker/page pair: the bridge worker plus one controller.
pub struct App<S: PageSurface + 'static> {
    handle: ControllerHandle,
    controller_task: JoinHandle<S>,
    bridge: Bridge,
}

impl<S: PageSurface + 'static> App<S> {
    /// Builds the provider for the active profile and starts both sides.
    pub fn launch(
        config: &AppConfig,
        store: Arc<dyn SettingsStore>,
        surface: S,
    ) -> anyhow::Result<Self> {
        let profile = config
            .get_active_provider()
            .ok_or_else(|| anyhow!("Active provider '{}' is not configured", config.active_provider))?
            .clone();
        let provider = create_provider(&profile);
        Ok(Self::launch_with(profile, provider, store, surface))
    }

    pub fn launch_with(
        profile: ProviderProfile,
        provider: Arc<dyn ChatProvider>,
        store: Arc<dyn SettingsStore>,
        surface: S,
    ) -> Self {
        tracing::info!(
            "Starting with provider {} ({} candidate models)",
            profile.name,
            profile.candidates(None).len()
        );
        let bridge = Bridge::spawn(Dispatcher::new(store, provider, profile));
        let (controller, receiver) = Controller::new(surface, bridge.client());
        let handle = controller.controller_handle();
        let controller_task = tokio::spawn(controller.run(receiver));

        Self {
            handle,
            controller_task,
            bridge,
        }
    }

    /// Sender for page events.
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Stops the controller and the bridge worker and returns the surface.
    pub async fn shutdown(self) -> anyhow::Result<S> {
        self.handle.shutdown();
        let surface = self
            .controller_task
            .await
            .map_err(|e| anyhow!("Controller task failed: {}", e))?;
        self.bridge.shutdown().await;
        Ok(surface)
    }
}
