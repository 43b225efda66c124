//! Ordered handler lists.
//!
//! Host-specific handlers run first in registration order; convention
//! fallbacks run after every handler. The first handler that answers wins.

use std::fmt;
use std::sync::Arc;

pub struct HandlerChain<H: ?Sized> {
    handlers: Vec<Arc<H>>,
    fallbacks: Vec<Arc<H>>,
}

impl<H: ?Sized> HandlerChain<H> {
    pub fn new() -> Self {
        HandlerChain {
            handlers: Vec::new(),
            fallbacks: Vec::new(),
        }
    }

    /// Append a host-specific handler
    pub fn push(&mut self, handler: Arc<H>) {
        self.handlers.push(handler);
    }

    /// Append a convention fallback, consulted after all handlers
    pub fn push_fallback(&mut self, handler: Arc<H>) {
        self.fallbacks.push(handler);
    }

    pub fn with(mut self, handler: Arc<H>) -> Self {
        self.push(handler);
        self
    }

    pub fn with_fallback(mut self, handler: Arc<H>) -> Self {
        self.push_fallback(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len() + self.fallbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handlers in consultation order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<H>> {
        self.handlers.iter().chain(self.fallbacks.iter())
    }

    /// First non-declining answer
    pub fn first_answer<T>(&self, mut ask: impl FnMut(&H) -> Option<T>) -> Option<T> {
        self.iter().find_map(|handler| ask(handler.as_ref()))
    }
}

impl<H: ?Sized> Default for HandlerChain<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> Clone for HandlerChain<H> {
    fn clone(&self) -> Self {
        HandlerChain {
            handlers: self.handlers.clone(),
            fallbacks: self.fallbacks.clone(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for HandlerChain<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.handlers.len())
            .field("fallbacks", &self.fallbacks.len())
            .finish()
    }
}
