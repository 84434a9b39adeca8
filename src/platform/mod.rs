//! The UI toolkit seen from the router.
//!
//! Adapters never touch concrete views. They ask a [`SurfaceFactory`] for
//! new surfaces and drive them through a [`NavigationHost`]. A primitive
//! resolves once the toolkit has applied the change and hands back an
//! [`Animation`], which resolves exactly once, when the transition has
//! visually finished.

pub mod memory;

pub use memory::{MemoryToolkit, ToolkitEvent, WindowSnapshot};

use crate::Result;
use async_trait::async_trait;
use log::warn;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use url::Url;

/// Opaque handle to a live UI surface (a window root, a screen, a modal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a surface shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    /// A navigation container whose stack holds the main screens.
    Main,
    Bookmark,
    RepositoryDetail,
    /// Modal web view pointed at an authentication URL.
    WebAuthentication(Url),
}

impl Screen {
    /// Whether the surface can hold a navigation stack.
    pub fn is_container(&self) -> bool {
        matches!(self, Screen::Main)
    }

    /// Identifier the factory uses to look the screen up.
    pub fn identifier(&self) -> &'static str {
        match self {
            Screen::Login => "LoginViewController",
            Screen::Main => "MainViewController",
            Screen::Bookmark => "BookmarkViewController",
            Screen::RepositoryDetail => "RepositoryDetailViewController",
            Screen::WebAuthentication(_) => "WebAuthenticationViewController",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::WebAuthentication(url) => write!(f, "{} ({url})", self.identifier()),
            other => f.write_str(other.identifier()),
        }
    }
}

/// The visual part of a transition whose effect is already applied.
///
/// Resolves once the toolkit has finished animating. Dropping it abandons
/// the wait, never the change.
#[must_use = "an animation only tells you when it is done if awaited"]
pub struct Animation(Option<Pin<Box<dyn Future<Output = ()> + Send>>>);

impl Animation {
    /// An animation that has already finished.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(finished: impl Future<Output = ()> + Send + 'static) -> Self {
        Self(Some(Box::pin(finished)))
    }

    pub fn is_instant(&self) -> bool {
        self.0.is_none()
    }

    /// Run `next` after this animation.
    pub fn then(self, next: Animation) -> Animation {
        match (self.is_instant(), next.is_instant()) {
            (true, _) => next,
            (_, true) => self,
            _ => Animation::new(async move {
                self.await;
                next.await;
            }),
        }
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::none()
    }
}

impl Future for Animation {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.0.as_mut() {
            Some(finished) => finished.as_mut().poll(cx),
            None => Poll::Ready(()),
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Animation")
            .field(&if self.is_instant() { "instant" } else { "running" })
            .finish()
    }
}

/// Builds the visual representation of a screen.
pub trait SurfaceFactory: Send + Sync {
    fn instantiate(&self, screen: &Screen) -> Result<SurfaceId>;

    /// Drop a surface that was instantiated but never attached.
    fn discard(&self, surface: SurfaceId) -> Result<()>;
}

/// Stack and modal primitives of the toolkit.
///
/// Each async primitive resolves as soon as the change is applied and
/// returns the [`Animation`] that shows it.
#[async_trait]
pub trait NavigationHost: Send + Sync {
    /// Replace whatever the window shows. Never animated.
    fn set_window_root(&self, surface: SurfaceId) -> Result<()>;

    /// Push `child` onto the navigation stack of `container`.
    async fn push(&self, container: SurfaceId, child: SurfaceId, animated: bool) -> Result<Animation>;

    /// Pop the top of the navigation stack of `container`.
    async fn pop(&self, container: SurfaceId, animated: bool) -> Result<Animation>;

    /// Present `modal` over `presenter`.
    async fn present(&self, presenter: SurfaceId, modal: SurfaceId, animated: bool) -> Result<Animation>;

    /// Dismiss the modal presented by `presenter`.
    async fn dismiss(&self, presenter: SurfaceId, animated: bool) -> Result<Animation>;
}

/// The pair of toolkit capabilities every adapter carries.
#[derive(Clone)]
pub struct Toolkit {
    pub factory: Arc<dyn SurfaceFactory>,
    pub host: Arc<dyn NavigationHost>,
}

impl Toolkit {
    pub fn new(factory: Arc<dyn SurfaceFactory>, host: Arc<dyn NavigationHost>) -> Self {
        Self { factory, host }
    }

    /// Pass `res` through, discarding `surface` first if attaching it failed.
    pub(crate) fn discard_on_err<T>(&self, surface: SurfaceId, res: Result<T>) -> Result<T> {
        if res.is_err() {
            if let Err(err) = self.factory.discard(surface) {
                warn!("could not discard {surface}: {err}");
            }
        }
        res
    }
}

impl From<Arc<MemoryToolkit>> for Toolkit {
    fn from(toolkit: Arc<MemoryToolkit>) -> Self {
        Self {
            factory: toolkit.clone(),
            host: toolkit,
        }
    }
}

impl fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolkit").finish_non_exhaustive()
    }
}
