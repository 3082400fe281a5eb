//! Navigation through the simulated folder hierarchy.

use crate::error::CoreResult;
use crate::path::{ensure_depth, NsPath};

/// The folder the user is currently looking at.
///
/// Immutable: every transition returns a new `NavigationState`, so a failed
/// transition leaves the caller's value untouched. Starts at the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    current: NsPath,
}

impl NavigationState {
    /// Creates a state positioned at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state positioned at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DepthExceeded`](crate::CoreError::DepthExceeded) if `path` is nested too deep.
    pub fn at(path: NsPath) -> CoreResult<Self> {
        ensure_depth(&path)?;
        Ok(Self { current: path })
    }

    /// Returns the current path.
    pub fn current_path(&self) -> &NsPath {
        &self.current
    }

    /// Moves into the child folder `name`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`](crate::CoreError::InvalidSegment) if `name` is not a valid segment.
    /// - [`CoreError::DepthExceeded`](crate::CoreError::DepthExceeded) if the child is nested too deep.
    pub fn enter(&self, name: &str) -> CoreResult<Self> {
        let next = self.current.join(name)?;
        ensure_depth(&next)?;
        Ok(Self { current: next })
    }

    /// Moves to the parent folder. No-op at the root.
    #[must_use]
    pub fn back(&self) -> Self {
        match self.current.parent() {
            Ok(parent) => Self { current: parent },
            Err(_) => self.clone(),
        }
    }

    /// Returns `true` unless the current path is the root.
    pub fn can_go_back(&self) -> bool {
        !self.current.is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::path::MAX_DEPTH;

    fn at(s: &str) -> NavigationState {
        NavigationState::at(NsPath::parse(s).unwrap()).unwrap()
    }

    #[test]
    fn starts_at_root() {
        let nav = NavigationState::new();
        assert!(nav.current_path().is_root());
        assert!(!nav.can_go_back());
    }

    #[test]
    fn enter_appends_segment() {
        let nav = NavigationState::new().enter("a").unwrap().enter("b").unwrap();
        assert_eq!(nav.current_path().to_string(), "a/b");
        assert!(nav.can_go_back());
    }

    #[test]
    fn enter_then_back_restores_path_at_every_depth() {
        let mut nav = NavigationState::new();
        for depth in 0..MAX_DEPTH {
            assert_eq!(nav.current_path().depth(), depth);
            let inside = nav.enter("child").unwrap();
            assert_eq!(inside.back(), nav);
            nav = inside;
        }
    }

    #[test]
    fn enter_at_max_depth_fails_and_keeps_state() {
        let nav = at("a/b/c/d/e/f");
        let err = nav.enter("g").unwrap_err();
        assert!(matches!(err, CoreError::DepthExceeded { max: 6, .. }));
        assert_eq!(nav.current_path().to_string(), "a/b/c/d/e/f");
    }

    #[test]
    fn enter_rejects_invalid_name() {
        let nav = at("a");
        assert!(matches!(
            nav.enter(".keep"),
            Err(CoreError::InvalidSegment(_))
        ));
        assert!(matches!(nav.enter(""), Err(CoreError::InvalidSegment(_))));
    }

    #[test]
    fn back_at_root_is_noop() {
        let nav = NavigationState::new();
        assert_eq!(nav.back(), nav);
    }

    #[test]
    fn back_walks_to_root() {
        let nav = at("a/b");
        let nav = nav.back();
        assert_eq!(nav.current_path().to_string(), "a");
        let nav = nav.back();
        assert!(nav.current_path().is_root());
        assert!(!nav.can_go_back());
    }

    #[test]
    fn at_rejects_too_deep_path() {
        let deep = NsPath::parse("a/b/c/d/e/f/g").unwrap();
        assert!(matches!(
            NavigationState::at(deep),
            Err(CoreError::DepthExceeded { .. })
        ));
    }
}
