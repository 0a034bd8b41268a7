use crate::core::{Pipeline, Trigger, TriggerKind};
use crate::core::engine::RelayEngine;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Handler = Arc<dyn Fn(Trigger) -> BoxFuture + Send + Sync>;

/// Binds trigger kinds to handlers and runs each dispatch as its own task.
///
/// Dispatches never wait on each other: two triggers in quick succession
/// produce two concurrent handler runs, and nothing in flight is cancelled.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<TriggerKind, Vec<Handler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F, Fut>(&mut self, kind: TriggerKind, handler: F)
    where
        F: Fn(Trigger) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |trigger| -> BoxFuture { Box::pin(handler(trigger)) });
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn handler_count(&self, kind: TriggerKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Spawns every handler registered for the trigger's kind.
    pub fn dispatch(&self, trigger: Trigger) -> Vec<JoinHandle<()>> {
        let Some(handlers) = self.handlers.get(&trigger.kind()) else {
            tracing::debug!("No handler registered for '{}'", trigger.kind().name());
            return Vec::new();
        };

        handlers
            .iter()
            .map(|handler| tokio::spawn(handler(trigger.clone())))
            .collect()
    }

    /// Dispatches triggers until the channel closes, then waits for the
    /// cycles still in flight. Returns the number of handler runs started.
    pub async fn run(&self, mut rx: mpsc::Receiver<Trigger>) -> usize {
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        let mut started = 0;

        while let Some(trigger) = rx.recv().await {
            in_flight.retain(|handle| !handle.is_finished());
            let handles = self.dispatch(trigger);
            started += handles.len();
            in_flight.extend(handles);
        }

        for handle in in_flight {
            if let Err(e) = handle.await {
                tracing::error!("Relay cycle task failed: {}", e);
            }
        }
        started
    }
}

/// Registers the relay for both the ready and the app-message triggers.
pub fn relay_dispatcher<P: Pipeline + 'static>(engine: Arc<RelayEngine<P>>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();

    let ready_engine = Arc::clone(&engine);
    dispatcher.on(TriggerKind::Ready, move |_| {
        let engine = Arc::clone(&ready_engine);
        async move {
            tracing::info!("Relay ready!");
            engine.run().await;
        }
    });

    dispatcher.on(TriggerKind::AppMessage, move |_| {
        let engine = Arc::clone(&engine);
        async move {
            tracing::info!("AppMessage received!");
            engine.run().await;
        }
    });

    dispatcher
}
