//! # Trellis Core
//!
//! Board state, drag-and-drop reordering and remote synchronization for a
//! kanban client.
//!
//! The crate is UI-agnostic: a front end feeds pointer events into a
//! [`DragTracker`], hands finished gestures to the [`Reconciler`] and renders
//! whatever the [`Navigator`] currently shows. All persistence goes through a
//! [`BoardGateway`], either the HTTP client or the in-memory service.

pub mod config;
pub mod domain;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod navigator;
pub mod notify;
pub mod reconciler;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use domain::{Board, BoardId, BoardSummary, Card, CardId, CardKind, List, ListId};
pub use drag::{DragProxy, DragTracker};
pub use error::{Result, TrellisError};
#[cfg(feature = "http-gateway")]
pub use gateway::http::HttpGateway;
pub use gateway::{memory::MemoryGateway, BoardGateway};
pub use navigator::{Navigator, ViewState};
pub use notify::{Notification, Notifier};
pub use reconciler::{DropOutcome, Reconciler};
