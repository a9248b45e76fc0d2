//! Runs a hook's handlers sequentially and collects their results.
//!
//! - Handlers are called in priority order, one at a time.
//! - Each handler gets one result slot. A handler that errors, panics or
//!   times out is logged and leaves `None` in its slot; the rest still run.
//! - A `ContextUpdate` returned by a handler is applied to the context before
//!   the next handler runs.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::definitions::HookOutput;
use super::registry::{HookRegistry, RegisteredHook};
use crate::api::context::{ContextUpdate, PluginContext};

/// Default per-handler timeout.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Aggregated result of dispatching a hook to all handlers.
#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    /// One slot per handler, in invocation order.
    pub results: Vec<Option<Value>>,
    /// Number of handlers that failed.
    pub failures: usize,
    /// Context updates returned by handlers, in order.
    pub updates: Vec<ContextUpdate>,
    /// The context after all updates were applied.
    pub context: PluginContext,
}

impl DispatchResult {
    /// Whether any handler returned a context update.
    pub fn changed_context(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// Dispatches hooks to all registered handlers.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Arc<HookRegistry>,
    /// Per-handler timeout; `None` waits forever.
    handler_timeout: Option<Duration>,
}

impl HookDispatcher {
    /// Creates a dispatcher with the default handler timeout.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self::with_timeout(registry, Some(DEFAULT_HANDLER_TIMEOUT))
    }

    /// Creates a dispatcher with an explicit handler timeout.
    pub fn with_timeout(registry: Arc<HookRegistry>, handler_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            handler_timeout,
        }
    }

    /// Runs every handler of `hook_name` against `context`.
    ///
    /// Never fails. An unknown hook yields an empty result list.
    pub async fn dispatch(
        &self,
        hook_name: &str,
        context: PluginContext,
        args: &[Value],
    ) -> DispatchResult {
        let handlers = self.registry.get_handlers(hook_name).await;

        let mut outcome = DispatchResult {
            context,
            ..DispatchResult::default()
        };

        if handlers.is_empty() {
            return outcome;
        }

        debug!(
            hook = %hook_name,
            handler_count = handlers.len(),
            "Dispatching hook"
        );

        for entry in &handlers {
            match self.run_one(hook_name, entry, &outcome.context, args).await {
                Some(output) => {
                    if let Some(update) = output.context_update {
                        update.apply(&mut outcome.context);
                        outcome.updates.push(update);
                    }
                    outcome.results.push(Some(output.value));
                }
                None => {
                    outcome.failures += 1;
                    outcome.results.push(None);
                }
            }
        }

        if outcome.failures > 0 {
            warn!(
                hook = %hook_name,
                failures = outcome.failures,
                handler_count = handlers.len(),
                "Hook dispatched with failing handlers"
            );
        }

        outcome
    }

    async fn run_one(
        &self,
        hook_name: &str,
        entry: &RegisteredHook,
        context: &PluginContext,
        args: &[Value],
    ) -> Option<HookOutput> {
        let handler_name = entry.handler.name();
        let guarded = AssertUnwindSafe(entry.handler.execute(context, args)).catch_unwind();

        let finished = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        hook = %hook_name,
                        handler = %handler_name,
                        plugin_id = %entry.plugin_id,
                        timeout_ms = timeout_millis(limit),
                        "Hook handler timed out"
                    );
                    return None;
                }
            },
            None => guarded.await,
        };

        match finished {
            Ok(Ok(output)) => Some(output),
            Ok(Err(reason)) => {
                error!(
                    hook = %hook_name,
                    handler = %handler_name,
                    plugin_id = %entry.plugin_id,
                    error = %reason,
                    "Hook handler failed"
                );
                None
            }
            Err(_) => {
                error!(
                    hook = %hook_name,
                    handler = %handler_name,
                    plugin_id = %entry.plugin_id,
                    "Hook handler panicked"
                );
                None
            }
        }
    }

    /// Returns the handler timeout.
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}

/// Milliseconds for log fields, saturating at `u64::MAX`.
fn timeout_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::registry::HookHandler;
    use crate::traits::ClosureHandler;
    use serde_json::json;

    fn arc(handler: ClosureHandler) -> Arc<dyn HookHandler> {
        Arc::new(handler)
    }

    fn explode() -> Result<HookOutput, String> {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn test_unknown_hook_is_empty() {
        let dispatcher = HookDispatcher::new(Arc::new(HookRegistry::new()));
        let result = dispatcher
            .dispatch("nobody:listens", PluginContext::default(), &[])
            .await;
        assert!(result.results.is_empty());
        assert_eq!(result.failures, 0);
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let registry = Arc::new(HookRegistry::new());
        registry
            .register_hooks(
                "dashboard:widgets",
                "p",
                vec![
                    arc(ClosureHandler::new("first", 3, |_ctx, _args| async {
                        Ok(HookOutput::value(json!(1)))
                    })),
                    arc(ClosureHandler::new("broken", 2, |_ctx, _args| async {
                        Err("boom".to_string())
                    })),
                    arc(ClosureHandler::new("panics", 1, |_ctx, _args| async { explode() })),
                    arc(ClosureHandler::new("last", 0, |_ctx, args: Vec<Value>| async move {
                        Ok(HookOutput::value(json!(args.len())))
                    })),
                ],
            )
            .await;

        let dispatcher = HookDispatcher::new(registry);
        let result = dispatcher
            .dispatch("dashboard:widgets", PluginContext::default(), &[json!("x")])
            .await;

        assert_eq!(result.results, vec![Some(json!(1)), None, None, Some(json!(1))]);
        assert_eq!(result.failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_none() {
        let registry = Arc::new(HookRegistry::new());
        registry
            .register_hooks(
                "app:start",
                "p",
                vec![
                    arc(ClosureHandler::new("slow", 1, |_ctx, _args| async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(HookOutput::empty())
                    })),
                    arc(ClosureHandler::new("fast", 0, |_ctx, _args| async {
                        Ok(HookOutput::value(json!("ok")))
                    })),
                ],
            )
            .await;

        let dispatcher = HookDispatcher::with_timeout(registry, Some(Duration::from_secs(1)));
        let result = dispatcher
            .dispatch("app:start", PluginContext::default(), &[])
            .await;

        assert_eq!(result.results, vec![None, Some(json!("ok"))]);
    }

    #[tokio::test]
    async fn test_context_update_visible_to_next_handler() {
        let registry = Arc::new(HookRegistry::new());
        registry
            .register_hooks(
                "app:start",
                "p",
                vec![
                    arc(ClosureHandler::new("enable", 10, |_ctx, _args| async {
                        Ok(HookOutput::empty()
                            .with_update(ContextUpdate::new().enable_feature("beta")))
                    })),
                    arc(ClosureHandler::new(
                        "observe",
                        5,
                        |ctx: PluginContext, _args| async move {
                            Ok(HookOutput::value(json!(ctx.has_feature("beta"))))
                        },
                    )),
                ],
            )
            .await;

        let dispatcher = HookDispatcher::new(registry);
        let result = dispatcher
            .dispatch("app:start", PluginContext::default(), &[])
            .await;

        assert_eq!(result.results[1], Some(json!(true)));
        assert!(result.context.has_feature("beta"));
        assert!(result.changed_context());
    }

    #[test]
    fn test_timeout_millis_saturates() {
        assert_eq!(timeout_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(timeout_millis(Duration::MAX), u64::MAX);
    }
}
