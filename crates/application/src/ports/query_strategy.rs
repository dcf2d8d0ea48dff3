use async_trait::async_trait;
use hostwatch_domain::ResolveResult;

/// Pluggable recursive-resolution backend.
///
/// One call to `query` performs one dispatch (which may include the
/// implementation's own internal tries) and resolves exactly once with a
/// fully-populated [`ResolveResult`]; the returned future is the
/// single-shot completion slot.
#[async_trait]
pub trait QueryStrategy: Send + Sync {
    async fn query(&self, hostname: &str) -> ResolveResult;

    /// Drive any internal I/O state machine. Implementations backed by an
    /// async runtime have nothing to pump and may leave the default no-op.
    fn process_events(&self) {}

    /// Cancel all in-flight attempts; their pending futures resolve with
    /// `Cancelled`. Idempotent.
    async fn shutdown(&self);

    fn is_initialized(&self) -> bool;
}
