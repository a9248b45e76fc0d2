//! Simplified handler construction for plugin development.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::context::PluginContext;
use crate::hooks::definitions::HookOutput;
use crate::hooks::registry::HookHandler;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<HookOutput, String>> + Send>>;

/// A closure-based hook handler for quick handler creation.
///
/// The closure receives owned copies of the context snapshot and the
/// arguments, so it can move them into the returned future.
pub struct ClosureHandler {
    /// Handler name.
    name: String,
    /// Priority.
    priority_val: i32,
    /// Handler function.
    handler: Arc<dyn Fn(PluginContext, Vec<Value>) -> HandlerFuture + Send + Sync>,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("name", &self.name)
            .field("priority_val", &self.priority_val)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates a new closure-based handler.
    pub fn new<F, Fut>(name: &str, priority: i32, handler: F) -> Self
    where
        F: Fn(PluginContext, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HookOutput, String>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            priority_val: priority,
            handler: Arc::new(move |context, args| Box::pin(handler(context, args))),
        }
    }

    /// Wraps the handler into an `Arc<dyn HookHandler>`.
    pub fn shared(self) -> Arc<dyn HookHandler> {
        Arc::new(self)
    }
}

#[async_trait]
impl HookHandler for ClosureHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority_val
    }

    async fn execute(&self, context: &PluginContext, args: &[Value]) -> Result<HookOutput, String> {
        (self.handler)(context.clone(), args.to_vec()).await
    }
}
