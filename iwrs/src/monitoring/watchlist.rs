//! Subscriber registry for event fan-out.
//!
//! Subscribers register a callback and get back an opaque id. Every event
//! is delivered to every registered callback in registration order. A
//! subscriber may attach a cleanup closure that runs when it is removed or
//! when the list itself goes away.

use log::debug;

type WatchFn<E> = Box<dyn FnMut(&E) + Send>;
type DestroyFn = Box<dyn FnOnce() + Send>;

struct Watch<E> {
    id: u32,
    func: WatchFn<E>,
    destroy: Option<DestroyFn>,
}

pub struct Watchlist<E> {
    next_id: u32,
    items: Vec<Watch<E>>,
}

impl<E> Default for Watchlist<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            items: Vec::new(),
        }
    }
}

impl<E> Watchlist<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback. Returned ids are never zero.
    pub fn add<F>(&mut self, func: F) -> u32
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.push(Box::new(func), None)
    }

    /// Registers a callback with a cleanup closure.
    pub fn add_with_destroy<F, D>(&mut self, func: F, destroy: D) -> u32
    where
        F: FnMut(&E) + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        self.push(Box::new(func), Some(Box::new(destroy)))
    }

    fn push(&mut self, func: WatchFn<E>, destroy: Option<DestroyFn>) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        self.items.push(Watch { id, func, destroy });
        id
    }

    /// Unregisters a callback, running its cleanup. Returns `false` for an
    /// unknown id.
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(pos) = self.items.iter().position(|w| w.id == id) else {
            debug!("No watch with id {id}");
            return false;
        };

        let watch = self.items.remove(pos);
        if let Some(destroy) = watch.destroy {
            destroy();
        }
        true
    }

    pub fn notify(&mut self, event: &E) {
        for watch in &mut self.items {
            (watch.func)(event);
        }
    }

    /// Unregisters every callback, running their cleanups.
    pub fn clear(&mut self) {
        for watch in self.items.drain(..) {
            if let Some(destroy) = watch.destroy {
                destroy();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<E> Drop for Watchlist<E> {
    fn drop(&mut self) {
        self.clear();
    }
}
