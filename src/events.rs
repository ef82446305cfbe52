// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Event Bus
//!
//! Publish/subscribe registry that lets independent parts of the application
//! learn that an account fact changed (created, updated, selected) without a
//! shared owner.
//!
//! - Callbacks run synchronously on the publishing thread, in subscription
//!   order.
//! - A panicking callback is logged and skipped; the remaining callbacks
//!   still run and the publisher never sees the panic.
//! - Event names are plain strings. Publishing to a name nobody listens on
//!   is a no-op.
//!
//! The bus is an explicit value: clone it to share one registry between
//! components.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Subscriber callback. Identity (for [`EventBus::unsubscribe`]) is the
/// allocation behind the `Arc`.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// The fixed account event vocabulary used by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountEvent {
    Created,
    Updated,
    Selected,
}

impl AccountEvent {
    pub const ALL: [AccountEvent; 3] = [
        AccountEvent::Created,
        AccountEvent::Updated,
        AccountEvent::Selected,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccountEvent::Created => "account:created",
            AccountEvent::Updated => "account:updated",
            AccountEvent::Selected => "account:selected",
        }
    }
}

struct Listener {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl Registry {
    fn remove_where(&self, event: &str, mut matches: impl FnMut(&Listener) -> bool) -> usize {
        let Ok(mut listeners) = self.listeners.lock() else {
            return 0;
        };
        let Some(list) = listeners.get_mut(event) else {
            return 0;
        };
        let before = list.len();
        list.retain(|l| !matches(l));
        let removed = before - list.len();
        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`.
    ///
    /// Each call creates a separate subscription; the returned handle removes
    /// exactly that one.
    pub fn subscribe(&self, event: &str, callback: Callback) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.registry.listeners.lock() {
            listeners
                .entry(event.to_string())
                .or_default()
                .push(Listener { id, callback });
        }
        tracing::trace!(event, id, "event subscriber added");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            event: event.to_string(),
            id,
        }
    }

    /// Remove every subscription of `callback` on `event`. Unknown events and
    /// callbacks are ignored.
    pub fn unsubscribe(&self, event: &str, callback: &Callback) {
        let target = Arc::as_ptr(callback) as *const ();
        let removed = self
            .registry
            .remove_where(event, |l| Arc::as_ptr(&l.callback) as *const () == target);
        tracing::trace!(event, removed, "event subscriber removed");
    }

    /// Invoke every callback currently registered for `event`.
    pub fn publish(&self, event: &str) {
        // Snapshot so callbacks may subscribe/unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = match self.registry.listeners.lock() {
            Ok(listeners) => listeners
                .get(event)
                .map(|list| list.iter().map(|l| Arc::clone(&l.callback)).collect())
                .unwrap_or_default(),
            Err(_) => return,
        };

        tracing::debug!(event, subscribers = callbacks.len(), "publishing event");

        for callback in callbacks {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                tracing::error!(
                    event,
                    error = %panic_message(payload.as_ref()),
                    "event subscriber panicked"
                );
            }
        }
    }

    pub fn publish_account(&self, event: AccountEvent) {
        self.publish(event.name());
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.registry
            .listeners
            .lock()
            .map(|listeners| listeners.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

/// Handle for a single subscription.
///
/// Dropping the handle keeps the subscription alive; use
/// [`into_guard`](Self::into_guard) to tie it to an owner's lifetime.
pub struct Subscription {
    registry: Weak<Registry>,
    event: String,
    id: u64,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Remove this subscription. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_where(&self.event, |l| l.id == self.id);
        }
    }

    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

/// Unsubscribes when dropped.
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn event(&self) -> &str {
        self.0.event()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let callback: Callback = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn publish_invokes_subscribers_in_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(
                AccountEvent::Created.name(),
                Arc::new(move || order.lock().unwrap().push(i)),
            );
        }

        bus.publish_account(AccountEvent::Created);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish("account:unknown");
        assert_eq!(bus.subscriber_count("account:unknown"), 0);
    }

    #[test]
    fn panicking_subscriber_does_not_starve_others() {
        let bus = EventBus::new();
        let (before, cb_before) = counter();
        let (after, cb_after) = counter();

        bus.subscribe("account:updated", cb_before);
        bus.subscribe("account:updated", Arc::new(|| panic!("subscriber failure")));
        bus.subscribe("account:updated", cb_after);

        bus.publish("account:updated");
        bus.publish("account:updated");

        assert_eq!(before.load(Ordering::SeqCst), 2);
        assert_eq!(after.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invocations_match_publishes_while_subscribed() {
        let bus = EventBus::new();
        let (count, cb) = counter();

        bus.publish("account:selected");
        let sub = bus.subscribe("account:selected", cb);
        bus.publish("account:selected");
        bus.publish("account:selected");
        sub.unsubscribe();
        bus.publish("account:selected");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handle_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (count, cb) = counter();
        let (other_count, other) = counter();

        let sub = bus.subscribe("account:created", Arc::clone(&cb));
        bus.subscribe("account:created", other);

        sub.unsubscribe();
        sub.unsubscribe();
        bus.publish("account:created");

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(other_count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count("account:created"), 1);
    }

    #[test]
    fn handle_removes_only_its_own_subscription() {
        let bus = EventBus::new();
        let (count, cb) = counter();

        let first = bus.subscribe("account:created", Arc::clone(&cb));
        let _second = bus.subscribe("account:created", cb);

        first.unsubscribe();
        bus.publish("account:created");

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_by_callback_ignores_unknowns() {
        let bus = EventBus::new();
        let (count, cb) = counter();
        let (_, stranger) = counter();

        bus.unsubscribe("never-used", &cb);
        bus.subscribe("account:updated", Arc::clone(&cb));
        bus.unsubscribe("account:updated", &stranger);
        bus.publish("account:updated");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.unsubscribe("account:updated", &cb);
        bus.unsubscribe("account:updated", &cb);
        bus.publish("account:updated");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count("account:updated"), 0);
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let bus = EventBus::new();
        let (count, cb) = counter();

        {
            let _guard = bus.subscribe("account:selected", cb).into_guard();
            bus.publish("account:selected");
        }
        bus.publish("account:selected");

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_subscribe_during_publish() {
        let bus = EventBus::new();
        let (count, cb) = counter();
        let inner_bus = bus.clone();

        bus.subscribe(
            "account:created",
            Arc::new(move || {
                inner_bus.subscribe("account:created", Arc::clone(&cb));
            }),
        );

        bus.publish("account:created");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.publish("account:created");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
