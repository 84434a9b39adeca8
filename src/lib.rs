//! Route-driven navigation for a stack-and-modal UI toolkit.
//!
//! A [`RouteTree`] says where the app should be; a [`Router`] diffs it
//! against where the app is and drives a chain of [`Routable`] adapters,
//! each bound to one live surface, through push/pop/change transitions.

pub mod config;
pub mod error;
pub mod platform;
pub mod route;
pub mod router;
pub mod state;
pub mod task;

pub use error::{Error, Result};

// Re-export common types for convenience
pub use config::{OverlapPolicy, RouterConfig, ViolationPolicy};
pub use platform::{Animation, MemoryToolkit, NavigationHost, Screen, SurfaceFactory, SurfaceId, Toolkit};
pub use route::{RouteSegment, RouteTree, RoutingAction};
pub use router::{AdapterKind, RouteRequest, Routable, Routed, Router, TransitionReport};
pub use state::{AuthenticationState, RoutingState};
pub use task::{CancelSource, CancelToken, PendingTransition, RouterHandle, TaskHandle};
