//! In-process alert dispatch
//!
//! Handlers are registered per alert kind and called synchronously, in
//! registration order, for every published alert of that kind.

use super::types::{Alert, AlertKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Receiver of alerts.
///
/// Handlers run on the publishing station's sampling thread and must return
/// promptly; a handler that blocks stalls that station's loop.
pub trait AlertHandler: Send + Sync {
    /// Handle one alert
    fn handle(&self, alert: &Alert);

    /// Handler name for identification in logs
    fn name(&self) -> &str {
        "handler"
    }
}

impl<F> AlertHandler for F
where
    F: Fn(&Alert) + Send + Sync,
{
    fn handle(&self, alert: &Alert) {
        self(alert)
    }
}

type HandlerTable = HashMap<AlertKind, Vec<Arc<dyn AlertHandler>>>;

/// Alert event bus
///
/// Owned explicitly and shared by `Arc` between the stations that publish
/// to it; there is no process-wide handler registry.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HandlerTable>,
}

impl EventBus {
    /// Create an empty event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for an alert kind, after any already registered
    pub fn register<H>(&self, kind: AlertKind, handler: H)
    where
        H: AlertHandler + 'static,
    {
        self.register_shared(kind, Arc::new(handler));
    }

    /// Add an already shared handler for an alert kind
    pub fn register_shared(&self, kind: AlertKind, handler: Arc<dyn AlertHandler>) {
        log::debug!("Registering handler '{}' for {}", handler.name(), kind.as_str());
        self.table_mut().entry(kind).or_default().push(handler);
    }

    /// Make this handler the only one for an alert kind
    pub fn replace<H>(&self, kind: AlertKind, handler: H)
    where
        H: AlertHandler + 'static,
    {
        let handler: Arc<dyn AlertHandler> = Arc::new(handler);
        self.table_mut().insert(kind, vec![handler]);
    }

    /// Remove every handler for an alert kind
    pub fn clear(&self, kind: AlertKind) {
        self.table_mut().remove(&kind);
    }

    /// Number of handlers registered for an alert kind
    pub fn handler_count(&self, kind: AlertKind) -> usize {
        self.table().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver an alert to every handler of its kind.
    ///
    /// Returns how many handlers ran. An alert with no handler is dropped.
    pub fn publish(&self, alert: &Alert) -> usize {
        // Handlers run outside the lock so they may register or publish.
        let handlers = match self.table().get(&alert.kind) {
            Some(handlers) => handlers.clone(),
            None => {
                log::trace!("No handler for {}, dropping alert", alert.kind.as_str());
                return 0;
            }
        };

        for handler in &handlers {
            handler.handle(alert);
        }
        handlers.len()
    }

    fn table(&self) -> std::sync::RwLockReadGuard<'_, HandlerTable> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn table_mut(&self) -> std::sync::RwLockWriteGuard<'_, HandlerTable> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table();
        let mut map = f.debug_map();
        for (kind, handlers) in table.iter() {
            map.entry(kind, &handlers.iter().map(|h| h.name()).collect::<Vec<_>>());
        }
        map.finish()
    }
}
