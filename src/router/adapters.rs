//! Built-in adapters for the app's screens.

use super::routable::{AdapterKind, Routable, Routed, Transition};
use crate::error::{MissingAuthenticationUrlSnafu, UnsupportedTransitionSnafu};
use crate::platform::{Animation, Screen, SurfaceId, Toolkit};
use crate::route::RouteSegment;
use crate::state::RoutingState;
use crate::Result;
use async_trait::async_trait;
use log::{debug, warn};
use snafu::prelude::*;

/// What the window shows at the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootState {
    #[default]
    Empty,
    ShowingLogin,
    ShowingMain,
}

/// Owns the window for the app's lifetime and swaps its root surface
/// between the login and main screens.
#[derive(Debug)]
pub struct RootAdapter {
    toolkit: Toolkit,
    state: RootState,
}

impl RootAdapter {
    pub fn new(toolkit: Toolkit) -> Self {
        Self {
            toolkit,
            state: RootState::Empty,
        }
    }

    pub fn state(&self) -> RootState {
        self.state
    }

    fn show(&mut self, segment: &RouteSegment, transition: impl FnOnce() -> Transition) -> Result<Routed> {
        let (screen, next) = if *segment == RouteSegment::LOGIN {
            (Screen::Login, RootState::ShowingLogin)
        } else if *segment == RouteSegment::MAIN {
            (Screen::Main, RootState::ShowingMain)
        } else {
            return UnsupportedTransitionSnafu {
                adapter: AdapterKind::Root,
                transition: transition(),
            }
            .fail();
        };

        let surface = self.toolkit.factory.instantiate(&screen)?;
        let res = self.toolkit.host.set_window_root(surface);
        self.toolkit.discard_on_err(surface, res)?;
        debug!("root: {:?} -> {:?}", self.state, next);
        self.state = next;

        let adapter: Box<dyn Routable> = match next {
            RootState::ShowingMain => Box::new(MainAdapter::new(self.toolkit.clone(), surface)),
            _ => Box::new(LoginAdapter::new(self.toolkit.clone(), surface)),
        };
        Ok(Routed::new(adapter, Animation::none()))
    }
}

#[async_trait]
impl Routable for RootAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Root
    }

    async fn push(&mut self, segment: &RouteSegment, _animated: bool, _state: &RoutingState) -> Result<Routed> {
        self.show(segment, || Transition::Push(segment.clone()))
    }

    async fn pop(&mut self, segment: &RouteSegment, _animated: bool, _state: &RoutingState) -> Result<Animation> {
        // The window is never left empty; a well-formed route tree does not get here.
        warn!("root: ignoring pop of {segment}");
        Ok(Animation::none())
    }

    async fn change(
        &mut self,
        from: &RouteSegment,
        to: &RouteSegment,
        _animated: bool,
        _state: &RoutingState,
    ) -> Result<Routed> {
        self.show(to, || Transition::Change {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

/// Login screen; presents the web authentication modal.
#[derive(Debug)]
pub struct LoginAdapter {
    toolkit: Toolkit,
    surface: SurfaceId,
}

impl LoginAdapter {
    pub fn new(toolkit: Toolkit, surface: SurfaceId) -> Self {
        Self { toolkit, surface }
    }
}

#[async_trait]
impl Routable for LoginAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Login
    }

    async fn push(&mut self, segment: &RouteSegment, animated: bool, state: &RoutingState) -> Result<Routed> {
        ensure!(
            *segment == RouteSegment::OAUTH,
            UnsupportedTransitionSnafu {
                adapter: AdapterKind::Login,
                transition: Transition::Push(segment.clone()),
            }
        );
        let url = state
            .authentication
            .oauth_url
            .clone()
            .context(MissingAuthenticationUrlSnafu {
                segment: segment.clone(),
            })?;

        let modal = self.toolkit.factory.instantiate(&Screen::WebAuthentication(url))?;
        let res = self.toolkit.host.present(self.surface, modal, animated).await;
        let animation = self.toolkit.discard_on_err(modal, res)?;
        Ok(Routed::new(Box::new(LeafAdapter::new(AdapterKind::OAuth)), animation))
    }

    async fn pop(&mut self, segment: &RouteSegment, animated: bool, _state: &RoutingState) -> Result<Animation> {
        ensure!(
            *segment == RouteSegment::OAUTH,
            UnsupportedTransitionSnafu {
                adapter: AdapterKind::Login,
                transition: Transition::Pop(segment.clone()),
            }
        );
        self.toolkit.host.dismiss(self.surface, animated).await
    }
}

/// Main screen; owns the navigation stack.
#[derive(Debug)]
pub struct MainAdapter {
    toolkit: Toolkit,
    surface: SurfaceId,
}

impl MainAdapter {
    pub fn new(toolkit: Toolkit, surface: SurfaceId) -> Self {
        Self { toolkit, surface }
    }

    fn screen_for(segment: &RouteSegment) -> Option<(Screen, AdapterKind)> {
        if *segment == RouteSegment::REPOSITORY_DETAIL {
            Some((Screen::RepositoryDetail, AdapterKind::RepositoryDetail))
        } else if *segment == RouteSegment::BOOKMARK {
            Some((Screen::Bookmark, AdapterKind::Bookmark))
        } else {
            None
        }
    }

    async fn push_screen(&self, screen: Screen, kind: AdapterKind, animated: bool) -> Result<Routed> {
        let child = self.toolkit.factory.instantiate(&screen)?;
        let res = self.toolkit.host.push(self.surface, child, animated).await;
        let animation = self.toolkit.discard_on_err(child, res)?;
        Ok(Routed::new(Box::new(LeafAdapter::new(kind)), animation))
    }
}

#[async_trait]
impl Routable for MainAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Main
    }

    async fn push(&mut self, segment: &RouteSegment, animated: bool, _state: &RoutingState) -> Result<Routed> {
        let (screen, kind) = Self::screen_for(segment).context(UnsupportedTransitionSnafu {
            adapter: AdapterKind::Main,
            transition: Transition::Push(segment.clone()),
        })?;
        self.push_screen(screen, kind, animated).await
    }

    async fn pop(&mut self, _segment: &RouteSegment, _animated: bool, _state: &RoutingState) -> Result<Animation> {
        // Back navigation already removed the screen from the stack.
        Ok(Animation::none())
    }

    async fn change(
        &mut self,
        from: &RouteSegment,
        to: &RouteSegment,
        animated: bool,
        _state: &RoutingState,
    ) -> Result<Routed> {
        ensure!(
            *from == RouteSegment::BOOKMARK && *to == RouteSegment::REPOSITORY_DETAIL,
            UnsupportedTransitionSnafu {
                adapter: AdapterKind::Main,
                transition: Transition::Change {
                    from: from.clone(),
                    to: to.clone(),
                },
            }
        );
        // Both halves are applied before the step resolves; only their
        // animations are left to run.
        let popped = self.toolkit.host.pop(self.surface, animated).await?;
        let pushed = self
            .push_screen(Screen::RepositoryDetail, AdapterKind::RepositoryDetail, animated)
            .await?;
        Ok(Routed::new(pushed.next, popped.then(pushed.animation)))
    }
}

/// Adapter for a screen with no children of its own.
#[derive(Debug)]
pub struct LeafAdapter {
    kind: AdapterKind,
}

impl LeafAdapter {
    pub fn new(kind: AdapterKind) -> Self {
        Self { kind }
    }
}

impl Routable for LeafAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryToolkit, ToolkitEvent};
    use crate::state::AuthenticationState;
    use crate::Error;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_ok;
    use url::Url;

    fn toolkit() -> (Arc<MemoryToolkit>, Toolkit) {
        let memory = Arc::new(MemoryToolkit::default());
        (memory.clone(), Toolkit::from(memory))
    }

    fn signed_out() -> RoutingState {
        RoutingState::default()
    }

    fn pending_oauth() -> RoutingState {
        let url = Url::parse("https://github.com/login/oauth/authorize?client_id=abc").unwrap();
        RoutingState::with_authentication(AuthenticationState::pending(url))
    }

    async fn main_adapter(toolkit: &Toolkit) -> Box<dyn Routable> {
        let mut root = RootAdapter::new(toolkit.clone());
        root.push(&RouteSegment::MAIN, false, &signed_out()).await.unwrap().next
    }

    async fn login_adapter(toolkit: &Toolkit) -> Box<dyn Routable> {
        let mut root = RootAdapter::new(toolkit.clone());
        root.push(&RouteSegment::LOGIN, false, &signed_out()).await.unwrap().next
    }

    #[tokio::test]
    async fn test_root_pushes_login_and_main() {
        let (memory, toolkit) = toolkit();
        let mut root = RootAdapter::new(toolkit);

        let login = assert_ok!(root.push(&RouteSegment::LOGIN, true, &signed_out()).await);
        assert_eq!(login.next.kind(), AdapterKind::Login);
        assert!(login.animation.is_instant());
        assert_eq!(root.state(), RootState::ShowingLogin);

        let main = assert_ok!(
            root.change(&RouteSegment::LOGIN, &RouteSegment::MAIN, true, &signed_out())
                .await
        );
        assert_eq!(main.next.kind(), AdapterKind::Main);
        assert_eq!(root.state(), RootState::ShowingMain);
        assert_eq!(memory.snapshot().unwrap().root, Some(Screen::Main));
        assert_eq!(memory.surface_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_root_rejects_unknown_segment_without_touching_ui() {
        let (memory, toolkit) = toolkit();
        let mut root = RootAdapter::new(toolkit);

        let err = root
            .push(&RouteSegment::new("Signup"), true, &signed_out())
            .await
            .unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(memory.events().unwrap().is_empty());
        assert_eq!(root.state(), RootState::Empty);

        let err = root
            .change(&RouteSegment::MAIN, &RouteSegment::BOOKMARK, true, &signed_out())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransition { adapter: AdapterKind::Root, .. }));
        assert!(memory.events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_root_pop_is_a_no_op() {
        let (memory, toolkit) = toolkit();
        let mut root = RootAdapter::new(toolkit);
        assert_ok!(root.pop(&RouteSegment::MAIN, true, &signed_out()).await).await;
        assert_ok!(root.pop(&RouteSegment::MAIN, true, &signed_out()).await).await;
        assert!(memory.events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_presents_and_dismisses_oauth() {
        let (memory, toolkit) = toolkit();
        let mut login = login_adapter(&toolkit).await;

        let oauth = assert_ok!(login.push(&RouteSegment::OAUTH, true, &pending_oauth()).await);
        assert_eq!(oauth.next.kind(), AdapterKind::OAuth);
        oauth.animation.await;
        assert!(matches!(
            memory.snapshot().unwrap().modal,
            Some(Screen::WebAuthentication(_))
        ));

        assert_ok!(login.pop(&RouteSegment::OAUTH, true, &pending_oauth()).await).await;
        assert_eq!(memory.snapshot().unwrap().modal, None);
    }

    #[tokio::test]
    async fn test_login_requires_pending_oauth_url() {
        let (memory, toolkit) = toolkit();
        let mut login = login_adapter(&toolkit).await;
        memory.clear_events().unwrap();

        let err = login
            .push(&RouteSegment::OAUTH, true, &signed_out())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingAuthenticationUrl { .. }));
        assert!(err.is_invariant_violation());
        assert!(memory.events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_discards_modal_it_could_not_present() {
        let (memory, toolkit) = toolkit();
        let mut login = login_adapter(&toolkit).await;
        login.push(&RouteSegment::OAUTH, false, &pending_oauth()).await.unwrap();
        let live = memory.surface_count().unwrap();

        let err = login
            .push(&RouteSegment::OAUTH, false, &pending_oauth())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModalAlreadyPresented { .. }));
        assert_eq!(memory.surface_count().unwrap(), live);
    }

    #[tokio::test]
    async fn test_login_rejects_other_segments() {
        let (_memory, toolkit) = toolkit();
        let mut login = login_adapter(&toolkit).await;

        let err = login
            .push(&RouteSegment::BOOKMARK, true, &pending_oauth())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransition { adapter: AdapterKind::Login, .. }));
        assert!(login.pop(&RouteSegment::MAIN, true, &signed_out()).await.is_err());
    }

    #[tokio::test]
    async fn test_main_pushes_stack_screens() {
        let (memory, toolkit) = toolkit();
        let mut main = main_adapter(&toolkit).await;

        let bookmark = assert_ok!(main.push(&RouteSegment::BOOKMARK, true, &signed_out()).await);
        assert_eq!(bookmark.next.kind(), AdapterKind::Bookmark);
        let detail = assert_ok!(
            main.push(&RouteSegment::REPOSITORY_DETAIL, true, &signed_out())
                .await
        );
        assert_eq!(detail.next.kind(), AdapterKind::RepositoryDetail);
        assert_eq!(
            memory.snapshot().unwrap().stack,
            vec![Screen::Bookmark, Screen::RepositoryDetail]
        );
    }

    #[tokio::test]
    async fn test_main_change_pops_then_pushes_once() {
        let (memory, toolkit) = toolkit();
        let mut main = main_adapter(&toolkit).await;
        main.push(&RouteSegment::BOOKMARK, true, &signed_out()).await.unwrap();
        memory.clear_events().unwrap();

        let detail = assert_ok!(
            main.change(&RouteSegment::BOOKMARK, &RouteSegment::REPOSITORY_DETAIL, true, &signed_out())
                .await
        );
        assert_eq!(detail.next.kind(), AdapterKind::RepositoryDetail);

        let events = memory.events().unwrap();
        let pops = events.iter().filter(|e| matches!(e, ToolkitEvent::Popped { .. })).count();
        let pushes = events.iter().filter(|e| matches!(e, ToolkitEvent::Pushed { .. })).count();
        assert_eq!((pops, pushes), (1, 1));
        let pop_at = events.iter().position(|e| matches!(e, ToolkitEvent::Popped { .. }));
        let push_at = events.iter().position(|e| matches!(e, ToolkitEvent::Pushed { .. }));
        assert!(pop_at < push_at);
        assert_eq!(memory.snapshot().unwrap().stack, vec![Screen::RepositoryDetail]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_change_is_applied_before_it_animates() {
        let memory = Arc::new(MemoryToolkit::new(Duration::from_millis(300)));
        let toolkit = Toolkit::from(memory.clone());
        let mut main = main_adapter(&toolkit).await;
        main.push(&RouteSegment::BOOKMARK, false, &signed_out()).await.unwrap();

        let start = tokio::time::Instant::now();
        let detail = main
            .change(&RouteSegment::BOOKMARK, &RouteSegment::REPOSITORY_DETAIL, true, &signed_out())
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(memory.snapshot().unwrap().stack, vec![Screen::RepositoryDetail]);

        detail.animation.await;
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_main_rejects_unlisted_change() {
        let (memory, toolkit) = toolkit();
        let mut main = main_adapter(&toolkit).await;
        memory.clear_events().unwrap();

        let err = main
            .change(&RouteSegment::REPOSITORY_DETAIL, &RouteSegment::BOOKMARK, true, &signed_out())
            .await
            .unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(main.push(&RouteSegment::LOGIN, true, &signed_out()).await.is_err());
        assert!(memory.events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_main_pop_tolerates_already_removed_screen() {
        let (memory, toolkit) = toolkit();
        let mut main = main_adapter(&toolkit).await;
        main.push(&RouteSegment::BOOKMARK, true, &signed_out()).await.unwrap();
        let container = memory.window_root().unwrap().unwrap();

        memory.native_back(container).unwrap();
        assert_ok!(main.pop(&RouteSegment::BOOKMARK, true, &signed_out()).await).await;
        assert_ok!(main.pop(&RouteSegment::BOOKMARK, true, &signed_out()).await).await;
        assert!(memory.snapshot().unwrap().stack.is_empty());
    }

    #[tokio::test]
    async fn test_leaves_reject_everything() {
        let leaf_kinds = [AdapterKind::OAuth, AdapterKind::Bookmark, AdapterKind::RepositoryDetail];
        for kind in leaf_kinds {
            let mut leaf = LeafAdapter::new(kind);
            let push = leaf.push(&RouteSegment::MAIN, true, &signed_out()).await;
            assert!(matches!(push, Err(Error::UnsupportedTransition { adapter, .. }) if adapter == kind));
            assert!(leaf.pop(&RouteSegment::MAIN, true, &signed_out()).await.is_err());
            assert!(
                leaf.change(&RouteSegment::MAIN, &RouteSegment::LOGIN, true, &signed_out())
                    .await
                    .is_err()
            );
        }
    }
}
