use crate::platform::SurfaceId;
use crate::route::{RouteSegment, RoutingAction};
use crate::router::{AdapterKind, Transition};
use snafu::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{adapter} adapter does not support {transition}"))]
    UnsupportedTransition {
        adapter: AdapterKind,
        transition: Transition,
    },

    #[snafu(display("Cannot push {segment}: no pending authentication URL"))]
    MissingAuthenticationUrl { segment: RouteSegment },

    #[snafu(display("Unknown surface {surface}"))]
    UnknownSurface { surface: SurfaceId },

    #[snafu(display("Surface {surface} has no navigation stack"))]
    NotAContainer { surface: SurfaceId },

    #[snafu(display("Navigation stack of {container} is empty"))]
    EmptyStack { container: SurfaceId },

    #[snafu(display("Surface {presenter} is not presenting anything"))]
    NoModal { presenter: SurfaceId },

    #[snafu(display("Surface {presenter} is already presenting {modal}"))]
    ModalAlreadyPresented {
        presenter: SurfaceId,
        modal: SurfaceId,
    },

    #[snafu(display("Failed to lock mutex: poisoned"))]
    LockPoisoned,

    /// The step was applied; its animation did not finish in time.
    #[snafu(display("Transition `{action}` did not finish animating within {timeout:?}"))]
    TransitionTimedOut {
        action: RoutingAction,
        timeout: Duration,
    },

    /// Raised before a step starts, or while an applied step animates.
    #[snafu(display("Transition `{action}` was cancelled"))]
    TransitionCancelled { action: RoutingAction },

    #[snafu(display("Another transition is already in flight"))]
    TransitionInFlight,

    #[snafu(display("Router task has stopped"))]
    RouterStopped,

    #[snafu(display("Failed to read config {}: {source}", path.display()))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse config {}: {source}", path.display()))]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Error {
    /// The route tree producer and the adapter chain disagree.
    ///
    /// These are programming errors: retrying cannot fix them.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedTransition { .. } | Error::MissingAuthenticationUrl { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
