//! Match context handed to filters and type converters.
//!
//! A [`MatchContext`] carries arbitrary host-supplied state — the message
//! author, the channel, a database handle — through one call to
//! [`find_matching_command`](crate::registry::CommandRegistry::find_matching_command).
//! The engine itself never reads it; it only threads the reference through
//! every filter and converter invocation so hosts can make contextual
//! decisions (permissions, per-guild settings, member lookups).
//!
//! State is keyed by type, one value per type:
//!
//! ```rust
//! use herald::MatchContext;
//!
//! struct Author(u64);
//!
//! let mut ctx = MatchContext::new();
//! ctx.insert(Author(42));
//! assert_eq!(ctx.get::<Author>().map(|a| a.0), Some(42));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Typed, heterogeneous state storage for a single match attempt.
///
/// Constructed by the host, passed by shared reference to every filter and
/// converter. An empty context ([`MatchContext::new`]) is valid everywhere a
/// context is expected.
#[derive(Default)]
pub struct MatchContext {
    state: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MatchContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.state.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    /// Retrieves a value by type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.state.contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a value by type.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.state
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("entries", &self.state.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Channel(String);

    #[test]
    fn test_insert_and_get() {
        let mut ctx = MatchContext::new();
        ctx.insert(Channel("general".into()));
        assert_eq!(ctx.get::<Channel>(), Some(&Channel("general".into())));
        assert!(ctx.contains::<Channel>());
    }

    #[test]
    fn test_get_missing() {
        let ctx = MatchContext::new();
        assert!(ctx.get::<Channel>().is_none());
        assert!(!ctx.contains::<Channel>());
    }

    #[test]
    fn test_insert_replaces() {
        let mut ctx = MatchContext::new();
        ctx.insert(Channel("a".into()));
        ctx.insert(Channel("b".into()));
        assert_eq!(ctx.get::<Channel>(), Some(&Channel("b".into())));
    }

    #[test]
    fn test_remove() {
        let mut ctx = MatchContext::new();
        ctx.insert(Channel("gone".into()));
        assert_eq!(ctx.remove::<Channel>(), Some(Channel("gone".into())));
        assert!(!ctx.contains::<Channel>());
    }
}
