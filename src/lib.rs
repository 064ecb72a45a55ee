//! Select text on a page, ask an AI model about it, and show the answer in a
//! floating panel.
//!
//! The page side ([`controller::Controller`]) talks to the worker side
//! ([`dispatcher::Dispatcher`]) only through the [`bridge`]. Hosts plug in by
//! implementing [`surface::PageSurface`] and feeding [`controller::PageEvent`]s.

pub mod api;
pub mod app;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dialog;
pub mod dispatcher;
pub mod format;
pub mod geometry;
pub mod logging;
pub mod prompt;
pub mod query;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod surface;

pub use app::App;
pub use bridge::{BridgeClient, BridgeRequest};
pub use config::{AppConfig, Settings, SettingsStore};
pub use query::{QueryError, QueryKind, QueryRequest, QueryResult};
