//! Route segments and route trees.
//!
//! A [`RouteSegment`] names one navigational node; a [`RouteTree`] is the
//! root-to-leaf path of segments that describes where the app currently is.

pub mod tree;

pub use tree::{RouteTree, RoutingAction};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// An opaque, comparable name identifying a navigational node.
///
/// Known segments are available as associated constants; any other name can
/// be built with [`RouteSegment::new`] and will be rejected by the adapters
/// that do not recognize it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteSegment(Cow<'static, str>);

impl RouteSegment {
    /// Create a segment from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Create a segment from a static string in const context.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The segment's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the segments the built-in adapters understand.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }
}

impl fmt::Display for RouteSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RouteSegment {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for RouteSegment {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Declare the well-known route segments as associated constants.
///
/// ```ignore
/// define_segments! {
///     LOGIN => "Login",
///     MAIN => "Main",
/// }
///
/// assert_eq!(RouteSegment::MAIN.as_str(), "Main");
/// assert_eq!(RouteSegment::KNOWN.len(), 2);
/// ```
macro_rules! define_segments {
    ($($name:ident => $value:literal),* $(,)?) => {
        impl RouteSegment {
            $(
                #[doc = concat!("The `", $value, "` segment.")]
                pub const $name: RouteSegment = RouteSegment::from_static($value);
            )*

            /// Every segment declared with `define_segments!`.
            pub const KNOWN: &'static [RouteSegment] = &[$(RouteSegment::$name),*];
        }
    };
}

define_segments! {
    LOGIN => "Login",
    OAUTH => "OAuth",
    MAIN => "Main",
    BOOKMARK => "Bookmark",
    REPOSITORY_DETAIL => "RepositoryDetail",
}
