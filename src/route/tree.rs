//! Route trees and the diff that turns one into another.

use super::RouteSegment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step the router must apply to move between two route trees.
///
/// `depth` is the index, in the adapter chain, of the adapter responsible for
/// the step. The root adapter sits at depth 0 and handles the first segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingAction {
    Push { depth: usize, segment: RouteSegment },
    Pop { depth: usize, segment: RouteSegment },
    Change { depth: usize, from: RouteSegment, to: RouteSegment },
}

impl RoutingAction {
    /// Index of the adapter that performs this action.
    pub fn depth(&self) -> usize {
        match self {
            Self::Push { depth, .. } | Self::Pop { depth, .. } | Self::Change { depth, .. } => *depth,
        }
    }
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push { depth, segment } => write!(f, "push {segment} @{depth}"),
            Self::Pop { depth, segment } => write!(f, "pop {segment} @{depth}"),
            Self::Change { depth, from, to } => write!(f, "change {from} -> {to} @{depth}"),
        }
    }
}

/// An ordered, root-to-leaf path of route segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTree(Vec<RouteSegment>);

impl RouteTree {
    /// The empty tree: nothing is shown yet.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The deepest segment.
    pub fn leaf(&self) -> Option<&RouteSegment> {
        self.0.last()
    }

    /// A new tree with `segment` appended.
    pub fn child(&self, segment: RouteSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// A new tree without the leaf. The empty tree stays empty.
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    /// Number of leading segments shared with `other`.
    pub fn common_prefix_len(&self, other: &RouteTree) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Compute the ordered actions that turn `self` into `target`.
    ///
    /// Segments below the first divergent one are popped deepest first. When
    /// both trees have a segment at the divergence point it is changed in
    /// place rather than popped and pushed. Remaining target segments are
    /// pushed root to leaf.
    pub fn diff(&self, target: &RouteTree) -> Vec<RoutingAction> {
        let common = self.common_prefix_len(target);
        let mut actions = Vec::new();

        let change = self.len() > common && target.len() > common;
        let keep = if change { common + 1 } else { common };

        for depth in (keep..self.len()).rev() {
            actions.push(RoutingAction::Pop {
                depth,
                segment: self.0[depth].clone(),
            });
        }

        if change {
            actions.push(RoutingAction::Change {
                depth: common,
                from: self.0[common].clone(),
                to: target.0[common].clone(),
            });
        }

        for depth in keep..target.len() {
            actions.push(RoutingAction::Push {
                depth,
                segment: target.0[depth].clone(),
            });
        }

        actions
    }

    /// Apply a single action to this tree, as the router does once the
    /// responsible adapter has finished it.
    pub(crate) fn apply(&mut self, action: &RoutingAction) {
        match action {
            RoutingAction::Push { depth, segment } => {
                self.0.truncate(*depth);
                self.0.push(segment.clone());
            }
            RoutingAction::Pop { depth, .. } => self.0.truncate(*depth),
            RoutingAction::Change { depth, to, .. } => {
                self.0.truncate(*depth);
                self.0.push(to.clone());
            }
        }
    }
}

impl fmt::Display for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(RouteSegment::as_str).collect();
        write!(f, "/{}", names.join("/"))
    }
}

impl FromStr for RouteTree {
    type Err = std::convert::Infallible;

    /// Parse `"Main/RepositoryDetail"`; a leading `/` and empty parts are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| RouteSegment::from(part.to_string()))
            .collect())
    }
}

impl FromIterator<RouteSegment> for RouteTree {
    fn from_iter<I: IntoIterator<Item = RouteSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[RouteSegment; N]> for RouteTree {
    fn from(segments: [RouteSegment; N]) -> Self {
        Self(segments.into())
    }
}

impl From<Vec<RouteSegment>> for RouteTree {
    fn from(segments: Vec<RouteSegment>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(path: &str) -> RouteTree {
        path.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let t = tree("/Main/RepositoryDetail");
        assert_eq!(t.segments(), &[RouteSegment::MAIN, RouteSegment::REPOSITORY_DETAIL]);
        assert_eq!(t.to_string(), "/Main/RepositoryDetail");
        assert!(tree("").is_empty());
        assert_eq!(RouteTree::new().to_string(), "/");
    }

    #[test]
    fn test_identical_trees_need_nothing() {
        assert!(tree("Main/Bookmark").diff(&tree("Main/Bookmark")).is_empty());
    }

    #[test]
    fn test_initial_push() {
        assert_eq!(
            RouteTree::new().diff(&tree("Main")),
            vec![RoutingAction::Push { depth: 0, segment: RouteSegment::MAIN }]
        );
    }

    #[test]
    fn test_push_bookmark_onto_main() {
        assert_eq!(
            tree("Main").diff(&tree("Main/Bookmark")),
            vec![RoutingAction::Push { depth: 1, segment: RouteSegment::BOOKMARK }]
        );
    }

    #[test]
    fn test_swap_bookmark_for_detail_is_a_single_change() {
        assert_eq!(
            tree("Main/Bookmark").diff(&tree("Main/RepositoryDetail")),
            vec![RoutingAction::Change {
                depth: 1,
                from: RouteSegment::BOOKMARK,
                to: RouteSegment::REPOSITORY_DETAIL,
            }]
        );
    }

    #[test]
    fn test_login_with_oauth_to_main() {
        assert_eq!(
            tree("Login/OAuth").diff(&tree("Main")),
            vec![
                RoutingAction::Pop { depth: 1, segment: RouteSegment::OAUTH },
                RoutingAction::Change {
                    depth: 0,
                    from: RouteSegment::LOGIN,
                    to: RouteSegment::MAIN,
                },
            ]
        );
    }

    #[test]
    fn test_pop_back_to_prefix() {
        assert_eq!(
            tree("Main/Bookmark").diff(&tree("Main")),
            vec![RoutingAction::Pop { depth: 1, segment: RouteSegment::BOOKMARK }]
        );
        assert_eq!(
            tree("Main/Bookmark").diff(&RouteTree::new()),
            vec![
                RoutingAction::Pop { depth: 1, segment: RouteSegment::BOOKMARK },
                RoutingAction::Pop { depth: 0, segment: RouteSegment::MAIN },
            ]
        );
    }

    #[test]
    fn test_change_then_push_deeper() {
        assert_eq!(
            tree("Login").diff(&tree("Main/Bookmark")),
            vec![
                RoutingAction::Change {
                    depth: 0,
                    from: RouteSegment::LOGIN,
                    to: RouteSegment::MAIN,
                },
                RoutingAction::Push { depth: 1, segment: RouteSegment::BOOKMARK },
            ]
        );
    }

    #[test]
    fn test_applying_diff_reaches_target() {
        let pairs = [
            ("", "Login/OAuth"),
            ("Login/OAuth", "Main/RepositoryDetail"),
            ("Main/Bookmark", "Main"),
            ("Main/Bookmark", "Login"),
        ];
        for (from, to) in pairs {
            let mut current = tree(from);
            for action in current.diff(&tree(to)) {
                current.apply(&action);
            }
            assert_eq!(current, tree(to), "{from} -> {to}");
        }
    }
}
