//! Placement and lifecycle engine for the animated message board.
//!
//! Approved posts arrive from the realtime channel and are shown as a small,
//! continuously replaced set of cards. This crate decides where each card
//! goes and when it enters, fades, and leaves. Nothing here touches the
//! network or a renderer: the host feeds posts in and reads entity snapshots
//! back out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`placement`] | Collision-aware position search with grid fallback |
//! | [`geometry`] | Viewport-percentage positions and card bounds |
//! | [`entity`] | Displayed entity model and rendering keys |
//! | [`lifecycle`] | Deterministic queue / display / exit state machine |
//! | [`scheduler`] | Tokio task that drives a [`lifecycle::Lifecycle`] on real timers |
//! | [`consts`] | Shared numeric constants (inset, footprint, timings) |

pub mod consts;
pub mod entity;
pub mod geometry;
pub mod lifecycle;
pub mod placement;
pub mod scheduler;

pub use entity::{AnimationType, Entity, EntityKey};
pub use geometry::{Bounds, Position};
pub use lifecycle::{Lifecycle, LifecycleConfig, LifecycleEvent};
pub use placement::{Placement, PlacementOptions, PlacementSource, find_position, place};
pub use scheduler::{BoardScheduler, Snapshot};
