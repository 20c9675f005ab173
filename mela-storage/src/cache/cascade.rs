//! Ordered fallback across broadening search scopes.
//!
//! Some lookups legitimately return nothing because the requested scope
//! was too narrow (a small city with no listed events). The cascade tries
//! each scope in order and stops at the first non-empty answer.

use mela_core::{CascadePlan, MelaResult};
use serde_json::Value;

use super::temporal::ScopeFetcher;

/// Resolve a cascade plan against a fetcher.
///
/// Scopes are tried narrowest first; each is consulted only if every
/// previous scope produced zero results. An exhausted cascade returns the
/// empty set - an upstream with truly no data is a valid outcome, not an
/// error. A failed fetch at any scope propagates immediately: folding a
/// failure into "empty" would cache an outage as a true negative.
pub async fn resolve_with_cascade<F>(plan: &CascadePlan, fetcher: &F) -> MelaResult<Vec<Value>>
where
    F: ScopeFetcher + ?Sized,
{
    for scope in plan.scopes() {
        let results = fetcher.fetch(scope).await?;
        if !results.is_empty() {
            return Ok(results);
        }
    }
    Ok(Vec::new())
}
