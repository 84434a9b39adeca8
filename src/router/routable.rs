//! The routing dispatch contract every adapter implements.

use crate::error::UnsupportedTransitionSnafu;
use crate::platform::Animation;
use crate::route::RouteSegment;
use crate::state::RoutingState;
use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// Which adapter variant an adapter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Root,
    Login,
    Main,
    OAuth,
    Bookmark,
    RepositoryDetail,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::Root => "Root",
            AdapterKind::Login => "Login",
            AdapterKind::Main => "Main",
            AdapterKind::OAuth => "OAuth",
            AdapterKind::Bookmark => "Bookmark",
            AdapterKind::RepositoryDetail => "RepositoryDetail",
        };
        f.write_str(name)
    }
}

/// A transition as requested from one adapter, used in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Push(RouteSegment),
    Pop(RouteSegment),
    Change { from: RouteSegment, to: RouteSegment },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Push(segment) => write!(f, "push({segment})"),
            Transition::Pop(segment) => write!(f, "pop({segment})"),
            Transition::Change { from, to } => write!(f, "change({from} -> {to})"),
        }
    }
}

/// A step that has been applied: the adapter for the new surface and the
/// animation still showing it.
#[derive(Debug)]
pub struct Routed {
    pub next: Box<dyn Routable>,
    pub animation: Animation,
}

impl Routed {
    pub fn new(next: Box<dyn Routable>, animation: Animation) -> Self {
        Self { next, animation }
    }
}

/// An adapter bound to one live UI surface.
///
/// Each operation resolves once its toolkit changes are applied, and hands
/// back the [`Animation`] that finishes the transition. A composite
/// operation applies all of its changes before it resolves.
///
/// The default implementations reject everything, which is exactly what
/// leaf adapters need; an adapter overrides the operations it supports and
/// must reject unsupported segments before touching the toolkit.
#[async_trait]
pub trait Routable: Send + fmt::Debug {
    fn kind(&self) -> AdapterKind;

    /// Show `segment` as a child of this adapter's surface and return the
    /// adapter bound to the new surface.
    async fn push(
        &mut self,
        segment: &RouteSegment,
        animated: bool,
        state: &RoutingState,
    ) -> Result<Routed> {
        let _ = (animated, state);
        UnsupportedTransitionSnafu {
            adapter: self.kind(),
            transition: Transition::Push(segment.clone()),
        }
        .fail()
    }

    /// Remove the UI for `segment`. Must tolerate UI that is already gone
    /// when the adapter treats pops as no-ops.
    async fn pop(&mut self, segment: &RouteSegment, animated: bool, state: &RoutingState) -> Result<Animation> {
        let _ = (animated, state);
        UnsupportedTransitionSnafu {
            adapter: self.kind(),
            transition: Transition::Pop(segment.clone()),
        }
        .fail()
    }

    /// Swap the active child `from` for `to` in one transition.
    async fn change(
        &mut self,
        from: &RouteSegment,
        to: &RouteSegment,
        animated: bool,
        state: &RoutingState,
    ) -> Result<Routed> {
        let _ = (animated, state);
        UnsupportedTransitionSnafu {
            adapter: self.kind(),
            transition: Transition::Change {
                from: from.clone(),
                to: to.clone(),
            },
        }
        .fail()
    }
}
