//! Headless in-memory toolkit.
//!
//! Keeps a window root, a navigation stack per container and at most one
//! modal per presenter. Every primitive is recorded as a [`ToolkitEvent`]
//! and every mutation notifies subscribers. A primitive mutates at once;
//! its [`Animation`] sleeps for the configured animation time.

use super::{Animation, NavigationHost, Screen, SurfaceFactory, SurfaceId};
use crate::error::{
    EmptyStackSnafu, ModalAlreadyPresentedSnafu, NoModalSnafu, NotAContainerSnafu,
    UnknownSurfaceSnafu,
};
use crate::{Error, Result};
use async_trait::async_trait;
use log::trace;
use snafu::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// A primitive the toolkit performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolkitEvent {
    Instantiated { surface: SurfaceId, screen: Screen },
    SetWindowRoot { surface: SurfaceId },
    Pushed { container: SurfaceId, child: SurfaceId, animated: bool },
    Popped { container: SurfaceId, animated: bool },
    Presented { presenter: SurfaceId, modal: SurfaceId, animated: bool },
    Dismissed { presenter: SurfaceId, animated: bool },
    /// A back gesture removed the top screen without the router's involvement.
    NativeBack { container: SurfaceId },
}

/// What the window currently shows, root to front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub root: Option<Screen>,
    pub stack: Vec<Screen>,
    pub modal: Option<Screen>,
}

impl WindowSnapshot {
    /// The screen the user is looking at.
    pub fn front(&self) -> Option<&Screen> {
        self.modal
            .as_ref()
            .or_else(|| self.stack.last())
            .or(self.root.as_ref())
    }
}

#[derive(Debug)]
struct Node {
    screen: Screen,
    stack: Vec<SurfaceId>,
    presented: Option<SurfaceId>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    surfaces: HashMap<SurfaceId, Node>,
    window_root: Option<SurfaceId>,
    events: Vec<ToolkitEvent>,
}

impl Inner {
    fn node(&self, surface: SurfaceId) -> Result<&Node> {
        self.surfaces
            .get(&surface)
            .context(UnknownSurfaceSnafu { surface })
    }

    fn node_mut(&mut self, surface: SurfaceId) -> Result<&mut Node> {
        self.surfaces
            .get_mut(&surface)
            .context(UnknownSurfaceSnafu { surface })
    }

    fn container_mut(&mut self, surface: SurfaceId) -> Result<&mut Node> {
        let node = self.node_mut(surface)?;
        ensure!(node.screen.is_container(), NotAContainerSnafu { surface });
        Ok(node)
    }

    /// Drop a surface and everything it holds.
    fn remove_tree(&mut self, surface: SurfaceId) {
        if let Some(node) = self.surfaces.remove(&surface) {
            for child in node.stack {
                self.remove_tree(child);
            }
            if let Some(modal) = node.presented {
                self.remove_tree(modal);
            }
        }
    }

    fn screen_of(&self, surface: SurfaceId) -> Option<Screen> {
        self.surfaces.get(&surface).map(|n| n.screen.clone())
    }
}

/// In-memory implementation of [`SurfaceFactory`] and [`NavigationHost`].
#[derive(Debug)]
pub struct MemoryToolkit {
    inner: Mutex<Inner>,
    animation: Duration,
    tx: watch::Sender<()>,
}

impl Default for MemoryToolkit {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl MemoryToolkit {
    /// Create a toolkit whose animated primitives take `animation` to finish.
    pub fn new(animation: Duration) -> Self {
        let (tx, _) = watch::channel(());
        Self {
            inner: Mutex::new(Inner::default()),
            animation,
            tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.tx.subscribe()
    }

    /// Every primitive performed so far.
    pub fn events(&self) -> Result<Vec<ToolkitEvent>> {
        Ok(self.lock()?.events.clone())
    }

    /// Forget the recorded events.
    pub fn clear_events(&self) -> Result<()> {
        self.lock()?.events.clear();
        Ok(())
    }

    pub fn window_root(&self) -> Result<Option<SurfaceId>> {
        Ok(self.lock()?.window_root)
    }

    /// Screen shown by a live surface.
    pub fn screen(&self, surface: SurfaceId) -> Result<Screen> {
        Ok(self.lock()?.node(surface)?.screen.clone())
    }

    /// Number of live surfaces.
    pub fn surface_count(&self) -> Result<usize> {
        Ok(self.lock()?.surfaces.len())
    }

    pub fn snapshot(&self) -> Result<WindowSnapshot> {
        let inner = self.lock()?;
        let Some(root) = inner.window_root else {
            return Ok(WindowSnapshot::default());
        };
        let node = inner.node(root)?;
        let stack: Vec<Screen> = node
            .stack
            .iter()
            .filter_map(|id| inner.screen_of(*id))
            .collect();
        let modal = std::iter::once(root)
            .chain(node.stack.iter().copied())
            .filter_map(|id| inner.surfaces.get(&id).and_then(|n| n.presented))
            .last()
            .and_then(|id| inner.screen_of(id));
        Ok(WindowSnapshot {
            root: Some(node.screen.clone()),
            stack,
            modal,
        })
    }

    /// Simulate the user's back gesture on `container`: the top screen is
    /// removed at once, without going through any adapter.
    ///
    /// Returns the removed surface, or `None` if the stack was already empty.
    pub fn native_back(&self, container: SurfaceId) -> Result<Option<SurfaceId>> {
        self.mutate(|inner| {
            let popped = inner.container_mut(container)?.stack.pop();
            if let Some(surface) = popped {
                inner.remove_tree(surface);
                inner.events.push(ToolkitEvent::NativeBack { container });
            }
            Ok(popped)
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Apply a mutation under the lock and notify subscribers if it succeeded.
    fn mutate<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Inner) -> Result<R>,
    {
        let res = {
            let mut guard = self.lock()?;
            f(&mut *guard)?
        };
        let _ = self.tx.send(());
        Ok(res)
    }

    fn animate(&self, animated: bool) -> Animation {
        let duration = self.animation;
        if animated && !duration.is_zero() {
            // Starts when first polled, so chained animations run back to back.
            Animation::new(async move { tokio::time::sleep(duration).await })
        } else {
            Animation::none()
        }
    }
}

impl SurfaceFactory for MemoryToolkit {
    fn instantiate(&self, screen: &Screen) -> Result<SurfaceId> {
        self.mutate(|inner| {
            inner.next_id += 1;
            let surface = SurfaceId::new(inner.next_id);
            inner.surfaces.insert(
                surface,
                Node {
                    screen: screen.clone(),
                    stack: Vec::new(),
                    presented: None,
                },
            );
            inner.events.push(ToolkitEvent::Instantiated {
                surface,
                screen: screen.clone(),
            });
            trace!("instantiated {screen} as {surface}");
            Ok(surface)
        })
    }

    fn discard(&self, surface: SurfaceId) -> Result<()> {
        let mut inner = self.lock()?;
        inner.node(surface)?;
        inner.remove_tree(surface);
        trace!("discarded {surface}");
        Ok(())
    }
}

#[async_trait]
impl NavigationHost for MemoryToolkit {
    fn set_window_root(&self, surface: SurfaceId) -> Result<()> {
        self.mutate(|inner| {
            inner.node(surface)?;
            if let Some(old) = inner.window_root.replace(surface) {
                if old != surface {
                    inner.remove_tree(old);
                }
            }
            inner.events.push(ToolkitEvent::SetWindowRoot { surface });
            Ok(())
        })
    }

    async fn push(&self, container: SurfaceId, child: SurfaceId, animated: bool) -> Result<Animation> {
        self.mutate(|inner| {
            inner.node(child)?;
            inner.container_mut(container)?.stack.push(child);
            inner.events.push(ToolkitEvent::Pushed {
                container,
                child,
                animated,
            });
            Ok(())
        })?;
        Ok(self.animate(animated))
    }

    async fn pop(&self, container: SurfaceId, animated: bool) -> Result<Animation> {
        self.mutate(|inner| {
            let popped = inner
                .container_mut(container)?
                .stack
                .pop()
                .context(EmptyStackSnafu { container })?;
            inner.remove_tree(popped);
            inner.events.push(ToolkitEvent::Popped {
                container,
                animated,
            });
            Ok(())
        })?;
        Ok(self.animate(animated))
    }

    async fn present(&self, presenter: SurfaceId, modal: SurfaceId, animated: bool) -> Result<Animation> {
        self.mutate(|inner| {
            inner.node(modal)?;
            let node = inner.node_mut(presenter)?;
            if let Some(existing) = node.presented {
                return ModalAlreadyPresentedSnafu {
                    presenter,
                    modal: existing,
                }
                .fail();
            }
            node.presented = Some(modal);
            inner.events.push(ToolkitEvent::Presented {
                presenter,
                modal,
                animated,
            });
            Ok(())
        })?;
        Ok(self.animate(animated))
    }

    async fn dismiss(&self, presenter: SurfaceId, animated: bool) -> Result<Animation> {
        self.mutate(|inner| {
            let modal = inner
                .node_mut(presenter)?
                .presented
                .take()
                .context(NoModalSnafu { presenter })?;
            inner.remove_tree(modal);
            inner.events.push(ToolkitEvent::Dismissed {
                presenter,
                animated,
            });
            Ok(())
        })?;
        Ok(self.animate(animated))
    }
}
