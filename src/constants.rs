//! Application-wide constants for explain-selection.
//!
//! Centralizes timing, layout and request parameters so the controller,
//! geometry and dispatcher agree on the same numbers.

use std::time::Duration;

// ============================================================================
// Application Identity
// ============================================================================

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "explain-selection";

/// App configuration file (provider profiles, log level).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Persisted user settings (`apiKey`, `model`).
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

// ============================================================================
// Selection Monitor
// ============================================================================

/// Delay between the last pointer/key release and reading the selection.
/// Rapid successive selections restart the timer.
pub const SELECTION_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trigger affordance size in pixels.
pub const AFFORDANCE_WIDTH: f64 = 120.0;
pub const AFFORDANCE_HEIGHT: f64 = 32.0;

/// Space between the selection and the affordance.
pub const AFFORDANCE_GAP: f64 = 8.0;

// ============================================================================
// Dialog Presenter
// ============================================================================

/// Floating response panel size in pixels.
pub const DIALOG_WIDTH: f64 = 400.0;
pub const DIALOG_HEIGHT: f64 = 300.0;

/// Space between the selection and the panel.
pub const DIALOG_GAP: f64 = 10.0;

/// Minimum distance kept between floating UI and the viewport edges.
pub const VIEWPORT_MARGIN: f64 = 20.0;

// ============================================================================
// AI Client
// ============================================================================

/// HTTP request timeout for provider calls.
pub const AI_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature sent with every request.
pub const AI_TEMPERATURE: f32 = 0.7;

/// Upper bound on generated tokens.
pub const AI_MAX_TOKENS: u32 = 1000;

/// Status code that triggers the fallback candidate walk.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Free OpenRouter models tried in order when the primary is rate limited.
pub const OPENROUTER_MODEL_PRIORITY: &[&str] = &[
    "meta-llama/llama-3.3-70b-instruct:free",
    "google/gemma-3-27b-it:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "qwen/qwen-2.5-72b-instruct:free",
];

// ============================================================================
// Message Bridge
// ============================================================================

/// Buffer size for the bridge request channel.
pub const BRIDGE_QUEUE_BUFFER: usize = 16;
