//! Contextual pass/fail filters for command definitions.
//!
//! Filters are the engine's delegation point for everything it deliberately
//! does not decide itself: permissions, cooldowns, channel restrictions.
//! A command definition carries two ordered lists:
//!
//! - **pre filters** run before any prefix/trigger work; the first one that
//!   returns `false` makes the matcher skip the definition entirely, without
//!   recording an error.
//! - **post filters** run after a signature overload has bound successfully;
//!   the first `false` discards the bind as if the definition had never
//!   matched, and the search continues.
//!
//! Filters receive the full raw input line and the [`MatchContext`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::MatchContext;

/// An async predicate admitting or rejecting a candidate command match.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Returns `true` to let the match proceed.
    async fn check(&self, input: &str, ctx: &MatchContext) -> bool;
}

/// A [`Filter`] wrapping a synchronous predicate. Produced by [`filter_fn`].
struct FnFilter<F> {
    func: F,
}

#[async_trait]
impl<F> Filter for FnFilter<F>
where
    F: Fn(&str, &MatchContext) -> bool + Send + Sync,
{
    async fn check(&self, input: &str, ctx: &MatchContext) -> bool {
        (self.func)(input, ctx)
    }
}

/// Wraps a synchronous predicate as an `Arc<dyn Filter>`.
///
/// ```rust
/// use herald::filter_fn;
///
/// struct IsAdmin(bool);
///
/// let admin_only = filter_fn(|_input, ctx| {
///     ctx.get::<IsAdmin>().is_some_and(|a| a.0)
/// });
/// ```
pub fn filter_fn<F>(func: F) -> Arc<dyn Filter>
where
    F: Fn(&str, &MatchContext) -> bool + Send + Sync + 'static,
{
    Arc::new(FnFilter { func })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filter_fn_reads_context() {
        struct Allowed(bool);

        let filter = filter_fn(|_input, ctx| ctx.get::<Allowed>().is_some_and(|a| a.0));

        let mut ctx = MatchContext::new();
        ctx.insert(Allowed(true));
        assert!(filter.check("!cmd", &ctx).await);

        ctx.insert(Allowed(false));
        assert!(!filter.check("!cmd", &ctx).await);
    }

    #[tokio::test]
    async fn test_filter_fn_reads_input() {
        let filter = filter_fn(|input, _ctx| input.len() < 10);
        let ctx = MatchContext::new();
        assert!(filter.check("!short", &ctx).await);
        assert!(!filter.check("!very long input line", &ctx).await);
    }
}
