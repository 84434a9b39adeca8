//! Router module.
//!
//! [`Router`] owns the adapter chain, one adapter per active route segment
//! plus the root adapter, and reconciles it against requested route trees.

pub mod adapters;
pub mod routable;

pub use adapters::{LeafAdapter, LoginAdapter, MainAdapter, RootAdapter, RootState};
pub use routable::{AdapterKind, Routable, Routed, Transition};

use crate::config::{RouterConfig, ViolationPolicy};
use crate::error::{TransitionCancelledSnafu, TransitionTimedOutSnafu};
use crate::platform::{Animation, Toolkit};
use crate::route::{RouteTree, RoutingAction};
use crate::state::RoutingState;
use crate::task::CancelToken;
use crate::{Error, Result};
use log::{debug, error, info, warn};
use snafu::prelude::*;
use std::time::Duration;

/// A route tree to move to, with the state the adapters may need on the way.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    pub tree: RouteTree,
    pub state: RoutingState,
    /// Overrides the router's default animation flag.
    pub animated: Option<bool>,
}

impl RouteRequest {
    pub fn new(tree: impl Into<RouteTree>) -> Self {
        Self {
            tree: tree.into(),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: RoutingState) -> Self {
        self.state = state;
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = Some(animated);
        self
    }
}

/// What a completed transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    pub from: RouteTree,
    pub to: RouteTree,
    pub actions: Vec<RoutingAction>,
}

/// Reconciles route trees against a chain of adapters.
///
/// The chain always holds `current().len() + 1` adapters: the root adapter at
/// depth 0, then one adapter per active segment.
///
/// # Example
/// ```ignore
/// let toolkit = Arc::new(MemoryToolkit::default());
/// let mut router = Router::for_toolkit(toolkit.into(), RouterConfig::default());
///
/// router.set_route(RouteRequest::new([RouteSegment::MAIN])).await?;
/// router.set_route(RouteRequest::new([RouteSegment::MAIN, RouteSegment::BOOKMARK])).await?;
/// assert_eq!(router.adapter_kinds(), vec![AdapterKind::Root, AdapterKind::Main, AdapterKind::Bookmark]);
/// ```
#[derive(Debug)]
pub struct Router {
    chain: Vec<Box<dyn Routable>>,
    current: RouteTree,
    config: RouterConfig,
}

impl Router {
    /// Create a router whose chain starts at `root` with nothing shown.
    pub fn new(root: Box<dyn Routable>, config: RouterConfig) -> Self {
        Self {
            chain: vec![root],
            current: RouteTree::new(),
            config,
        }
    }

    /// Create a router rooted at a [`RootAdapter`] over `toolkit`.
    pub fn for_toolkit(toolkit: Toolkit, config: RouterConfig) -> Self {
        Self::new(Box::new(RootAdapter::new(toolkit)), config)
    }

    /// The route tree the adapter chain currently reflects.
    pub fn current(&self) -> &RouteTree {
        &self.current
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Kinds of the adapters in the chain, root first.
    pub fn adapter_kinds(&self) -> Vec<AdapterKind> {
        self.chain.iter().map(|a| a.kind()).collect()
    }

    /// Move to `request.tree`.
    pub async fn set_route(&mut self, request: RouteRequest) -> Result<TransitionReport> {
        self.set_route_cancellable(request, CancelToken::never()).await
    }

    /// Move to `request.tree`, stopping early if `cancel` fires.
    ///
    /// Steps are applied one at a time. A step counts as applied as soon as
    /// its adapter has changed the toolkit; the timeout and `cancel` only cut
    /// short the wait for its animation. On any error the remaining steps are
    /// skipped and [`Router::current`] reflects exactly the applied ones.
    pub async fn set_route_cancellable(
        &mut self,
        request: RouteRequest,
        cancel: CancelToken,
    ) -> Result<TransitionReport> {
        let from = self.current.clone();
        let actions = from.diff(&request.tree);
        let animated = request.animated.unwrap_or(self.config.animated);

        for action in &actions {
            debug!("routing: {action}");
            if let Err(err) = self.apply(action, animated, &request.state, &cancel).await {
                return Err(self.fail(err));
            }
        }

        if !actions.is_empty() {
            info!("routed {from} -> {}", self.current);
        }
        Ok(TransitionReport {
            from,
            to: self.current.clone(),
            actions,
        })
    }

    async fn apply(
        &mut self,
        action: &RoutingAction,
        animated: bool,
        state: &RoutingState,
        cancel: &CancelToken,
    ) -> Result<()> {
        ensure!(!cancel.is_cancelled(), TransitionCancelledSnafu { action: action.clone() });

        let depth = action.depth();
        let adapter = &mut self.chain[depth];
        let animation = match action {
            RoutingAction::Push { segment, .. } => {
                let routed = adapter.push(segment, animated, state).await?;
                self.chain.truncate(depth + 1);
                self.chain.push(routed.next);
                routed.animation
            }
            RoutingAction::Pop { segment, .. } => {
                let animation = adapter.pop(segment, animated, state).await?;
                self.chain.truncate(depth + 1);
                animation
            }
            RoutingAction::Change { from, to, .. } => {
                let routed = adapter.change(from, to, animated, state).await?;
                self.chain.truncate(depth + 1);
                self.chain.push(routed.next);
                routed.animation
            }
        };
        self.current.apply(action);

        settle(action, self.config.transition_timeout, cancel, animation).await
    }

    fn fail(&self, err: Error) -> Error {
        if err.is_invariant_violation() {
            error!("routing invariant violated at {}: {err}", self.current);
            if self.config.on_violation == ViolationPolicy::Abort {
                panic!("routing invariant violated: {err}");
            }
        } else {
            warn!("routing stopped at {}: {err}", self.current);
        }
        err
    }
}

/// Wait for an applied step's animation under the timeout and cancellation token.
async fn settle(
    action: &RoutingAction,
    timeout: Option<Duration>,
    cancel: &CancelToken,
    animation: Animation,
) -> Result<()> {
    if animation.is_instant() {
        return Ok(());
    }
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, animation).await.map_err(|_| {
                TransitionTimedOutSnafu {
                    action: action.clone(),
                    timeout: limit,
                }
                .build()
            }),
            None => {
                animation.await;
                Ok(())
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => TransitionCancelledSnafu { action: action.clone() }.fail(),
        res = bounded => res,
    }
}
