//! Main dispatcher API
//!
//! The [`Dispatcher`] owns the callback records of one signal and is the
//! only type that can fire it. Subscribers get a [`Subscriptions`] view
//! instead, which carries every management operation but not `invoke`.
//!
//! Records live in a sparse table: removal only tombstones a slot, and
//! dead slots are reclaimed lazily. When an add finds the table full, the
//! dispatcher compacts in place if at least half of the slots are dead and
//! doubles the capacity otherwise.

use crate::config::DispatcherConfig;
use crate::record::{CallbackKey, CallbackRecord, Invoker};
use crate::subscriptions::Subscriptions;
use crate::types::{
    DispatchError, DispatcherStats, ExecRule, FunctionId, Listener, RemoveMode, Result,
    SubscriptionId, TargetId,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Owner side of a typed multicast signal.
///
/// `A` is the argument type handed to every callback by reference; signals
/// with several arguments use a tuple.
///
/// # Example
/// ```
/// use event_dispatch::{Dispatcher, ExecRule};
///
/// fn on_resize(size: &(u32, u32)) {
///     println!("resized to {}x{}", size.0, size.1);
/// }
///
/// let mut resized = Dispatcher::new();
/// resized.add_fn(on_resize, ExecRule::Persistent);
/// resized.invoke(&(800, 600));
/// ```
pub struct Dispatcher<A> {
    records: Vec<CallbackRecord<A>>,
    capacity: usize,
    live: usize,
    compact_before_grow: bool,
    grow_count: u64,
    compact_count: u64,
}

impl<A> Dispatcher<A> {
    /// Create an empty dispatcher; storage is allocated on the first add
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher from a configuration
    pub fn with_config(config: DispatcherConfig) -> Self {
        let mut dispatcher = Self {
            records: Vec::new(),
            capacity: 0,
            live: 0,
            compact_before_grow: config.compact_before_grow,
            grow_count: 0,
            compact_count: 0,
        };
        dispatcher.reserve(config.initial_capacity);
        dispatcher
    }

    /// Subscriber view of this dispatcher
    pub fn subscriptions(&mut self) -> Subscriptions<'_, A> {
        Subscriptions::new(self)
    }

    /// Fire the signal.
    ///
    /// Calls every live record in registration order. Trigger-once records
    /// are retired right after their call returns. Only slots populated
    /// when the call starts are visited.
    pub fn invoke(&mut self, args: &A) {
        if self.live == 0 {
            log::debug!("Invoke skipped: no live callbacks ({} slots)", self.records.len());
            return;
        }

        let end = self.records.len();
        log::trace!("Invoking {} callbacks across {} slots", self.live, end);

        for record in &mut self.records[..end] {
            if !record.is_callable() {
                continue;
            }
            record.call(args);
            if record.rule() == ExecRule::TriggerOnce {
                record.invalidate();
                self.live -= 1;
            }
        }
    }

    /// Allocated slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Populated slots, including tombstones
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Live (callable) records
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// True when no live record remains
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            capacity: self.capacity,
            len: self.records.len(),
            live: self.live,
            grow_count: self.grow_count,
            compact_count: self.compact_count,
        }
    }

    /// Records in slot order, tombstones included
    pub fn records(&self) -> impl Iterator<Item = &CallbackRecord<A>> {
        self.records.iter()
    }

    /// Remove a member registration of `function` on `target`
    ///
    /// Returns how many records were retired; zero is not an error.
    ///
    /// # Errors
    /// `InvalidArgument` if `target` or `function` is `NONE`.
    pub fn remove_member(
        &mut self,
        target: TargetId,
        function: FunctionId,
        mode: RemoveMode,
    ) -> Result<usize> {
        if target.is_none() {
            return Err(reject("attempted to unregister a null listener"));
        }
        if function.is_none() {
            return Err(reject("attempted to unregister a null function"));
        }
        Ok(self.remove_matching(CallbackKey::new(target, function), mode))
    }

    /// Remove a free function or standalone callable registration
    ///
    /// # Errors
    /// `InvalidArgument` if `function` is `NONE`.
    pub fn remove_free(&mut self, function: FunctionId, mode: RemoveMode) -> Result<usize> {
        if function.is_none() {
            return Err(reject("attempted to unregister a null function"));
        }
        Ok(self.remove_matching(CallbackKey::free(function), mode))
    }

    /// Remove a free function registered with [`Dispatcher::add_fn`]
    pub fn remove_fn<F>(&mut self, function: F, mode: RemoveMode) -> usize
    where
        F: Fn(&A) + 'static,
    {
        self.remove_matching(CallbackKey::free(FunctionId::of_fn(&function)), mode)
    }

    /// Remove a method registered with [`Dispatcher::add_method`]
    pub fn remove_method<T, M>(&mut self, listener: &T, method: M, mode: RemoveMode) -> Result<usize>
    where
        T: Listener,
        M: Fn(&T, &A) + 'static,
    {
        self.remove_member(listener.listener_id(), FunctionId::of_method(&method), mode)
    }

    /// Remove a method registered with [`Dispatcher::add_method_mut`]
    pub fn remove_method_mut<T, M>(&mut self, listener: &T, method: M, mode: RemoveMode) -> Result<usize>
    where
        T: Listener,
        M: Fn(&mut T, &A) + 'static,
    {
        self.remove_member(listener.listener_id(), FunctionId::of_method_mut(&method), mode)
    }

    /// Remove every registration belonging to `target`.
    ///
    /// This is deliberately broad: it also retires callbacks the object
    /// registered on its own behalf, which the caller may not know about.
    ///
    /// # Errors
    /// `InvalidArgument` if `target` is `NONE`.
    pub fn remove_object(&mut self, target: TargetId) -> Result<usize> {
        if target.is_none() {
            return Err(reject("attempted to unregister a null listener"));
        }
        Ok(self.remove_matching(CallbackKey::object(target), RemoveMode::RemoveAll))
    }

    /// Remove the single record created by the registration that returned `id`
    ///
    /// Returns false if that record is already gone.
    pub fn remove_subscription(&mut self, id: SubscriptionId) -> bool {
        let found = self
            .records
            .iter_mut()
            .find(|r| r.is_callable() && r.subscription() == id);
        match found {
            Some(record) => {
                record.invalidate();
                self.live -= 1;
                true
            }
            None => false,
        }
    }

    /// Whether a live record of `function` on `target` exists
    ///
    /// A `NONE` function asks whether `target` has any live record.
    pub fn contains(&self, target: TargetId, function: FunctionId) -> bool {
        let query = CallbackKey::new(target, function);
        self.records
            .iter()
            .any(|r| r.is_callable() && r.matches(&query))
    }

    /// Whether a live free registration of `function` exists
    pub fn contains_free(&self, function: FunctionId) -> bool {
        function.is_some() && self.contains(TargetId::NONE, function)
    }

    /// Retire every live record; slots and capacity are kept
    pub fn clear(&mut self) {
        for record in self.records.iter_mut().filter(|r| r.is_callable()) {
            record.invalidate();
        }
        self.live = 0;
    }

    /// Ensure room for at least `new_capacity` records.
    ///
    /// Growing reallocates and moves only the live records, in order.
    pub fn reserve(&mut self, new_capacity: usize) {
        if self.capacity >= new_capacity {
            return;
        }
        log::debug!(
            "Growing dispatcher storage {} -> {} ({} live of {} slots)",
            self.capacity,
            new_capacity,
            self.live,
            self.records.len()
        );
        self.reallocate(new_capacity);
        self.capacity = new_capacity;
        self.grow_count += 1;
    }

    /// Reclaim tombstones in place without touching capacity
    pub fn optimize(&mut self) {
        if self.live < self.records.len() {
            log::debug!(
                "Compacting dispatcher: {} live of {} slots",
                self.live,
                self.records.len()
            );
            self.records.retain(CallbackRecord::is_callable);
            self.compact_count += 1;
        }
    }

    /// Release storage the live records don't need
    pub fn shrink_to_fit(&mut self) {
        if self.live == 0 {
            log::debug!("Releasing dispatcher storage ({} slots)", self.capacity);
            self.records = Vec::new();
            self.capacity = 0;
            return;
        }
        if self.capacity == self.live && self.records.len() == self.live {
            return;
        }
        log::debug!("Shrinking dispatcher storage {} -> {}", self.capacity, self.live);
        self.reallocate(self.live);
        self.capacity = self.live;
    }

    /// Move live records into a fresh buffer of `slots` slots
    fn reallocate(&mut self, slots: usize) {
        let populated = self.records.len();
        let mut fresh = Vec::with_capacity(slots);
        fresh.extend(self.records.drain(..).filter(CallbackRecord::is_callable));
        if fresh.len() < populated {
            self.compact_count += 1;
        }
        self.records = fresh;
    }

    fn remove_matching(&mut self, query: CallbackKey, mode: RemoveMode) -> usize {
        let mut removed = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.is_callable() && r.matches(&query))
        {
            record.invalidate();
            removed += 1;
            if mode == RemoveMode::RemoveOne {
                break;
            }
        }
        self.live -= removed;
        removed
    }

    fn push(&mut self, key: CallbackKey, invoker: Invoker<A>, rule: ExecRule) -> SubscriptionId {
        if self.capacity == 0 {
            self.reserve(1);
        }
        if self.records.len() >= self.capacity {
            if self.compact_before_grow && self.live <= self.capacity / 2 {
                self.optimize();
            } else {
                self.reserve(self.capacity * 2);
            }
        }

        let record = CallbackRecord::new(key, invoker, rule);
        let id = record.subscription();
        self.records.push(record);
        self.live += 1;
        id
    }
}

impl<A: 'static> Dispatcher<A> {
    /// Register a member callback: `invoker` acts on behalf of `target`
    ///
    /// Registering the same pair twice is allowed and yields two records
    /// that both fire.
    ///
    /// # Errors
    /// `InvalidArgument` if `target` or `function` is `NONE`.
    pub fn add_member<F>(
        &mut self,
        target: TargetId,
        function: FunctionId,
        invoker: F,
        rule: ExecRule,
    ) -> Result<SubscriptionId>
    where
        F: FnMut(&A) + 'static,
    {
        if target.is_none() {
            return Err(reject("attempted to register a null listener"));
        }
        if function.is_none() {
            return Err(reject("attempted to register a null function"));
        }
        Ok(self.push(CallbackKey::new(target, function), Box::new(invoker), rule))
    }

    /// Register a standalone callable under the identity `function`
    ///
    /// # Errors
    /// `InvalidArgument` if `function` is `NONE`.
    pub fn add_free<F>(&mut self, function: FunctionId, invoker: F, rule: ExecRule) -> Result<SubscriptionId>
    where
        F: FnMut(&A) + 'static,
    {
        if function.is_none() {
            return Err(reject("attempted to register a null function"));
        }
        Ok(self.push(CallbackKey::free(function), Box::new(invoker), rule))
    }

    /// Register a free function.
    ///
    /// The function is identified by its item type, so pass the `fn` item
    /// itself rather than a coerced `fn(&A)` pointer.
    pub fn add_fn<F>(&mut self, function: F, rule: ExecRule) -> SubscriptionId
    where
        F: Fn(&A) + 'static,
    {
        self.push(
            CallbackKey::free(FunctionId::of_fn(&function)),
            Box::new(function),
            rule,
        )
    }

    /// Register a `&self` method of a shared listener.
    ///
    /// The record keeps the listener alive until it is removed.
    pub fn add_method<T, M>(&mut self, listener: &Rc<T>, method: M, rule: ExecRule) -> Result<SubscriptionId>
    where
        T: Listener + 'static,
        M: Fn(&T, &A) + 'static,
    {
        let target = listener.listener_id();
        let function = FunctionId::of_method(&method);
        let listener = Rc::clone(listener);
        self.add_member(
            target,
            function,
            move |args: &A| method(&*listener, args),
            rule,
        )
    }

    /// Register a `&mut self` method of a shared listener.
    ///
    /// The listener is borrowed mutably for the duration of each call.
    pub fn add_method_mut<T, M>(
        &mut self,
        listener: &Rc<RefCell<T>>,
        method: M,
        rule: ExecRule,
    ) -> Result<SubscriptionId>
    where
        T: Listener + 'static,
        M: Fn(&mut T, &A) + 'static,
    {
        let target = listener.borrow().listener_id();
        let function = FunctionId::of_method_mut(&method);
        let listener = Rc::clone(listener);
        self.add_member(
            target,
            function,
            move |args: &A| method(&mut *listener.borrow_mut(), args),
            rule,
        )
    }
}

impl<A> Default for Dispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("capacity", &self.capacity)
            .field("len", &self.records.len())
            .field("live", &self.live)
            .field("records", &self.records)
            .finish()
    }
}

fn reject(reason: &'static str) -> DispatchError {
    log::warn!("Rejected subscription call: {}", reason);
    DispatchError::InvalidArgument(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn noop(v: &i32) {
        std::hint::black_box(*v);
    }

    fn also_noop(v: &i32) {
        std::hint::black_box(v.wrapping_mul(3));
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&i32) + 'static) {
        let count = Rc::new(Cell::new(0));
        let captured = Rc::clone(&count);
        (count, move |_: &i32| captured.set(captured.get() + 1))
    }

    #[test]
    fn test_dispatcher_creation() {
        let dispatcher: Dispatcher<i32> = Dispatcher::new();
        assert_eq!(dispatcher.capacity(), 0);
        assert_eq!(dispatcher.len(), 0);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_initial_capacity_from_config() {
        let dispatcher: Dispatcher<i32> =
            Dispatcher::with_config(DispatcherConfig::new().with_initial_capacity(4));
        assert_eq!(dispatcher.capacity(), 4);
        assert_eq!(dispatcher.stats().grow_count, 1);
    }

    #[test]
    fn test_first_add_allocates_one_slot() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_fn(noop, ExecRule::Persistent);
        assert_eq!(dispatcher.capacity(), 1);
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.live_count(), 1);
    }

    #[test]
    fn test_add_rejects_null_identities() {
        let mut dispatcher: Dispatcher<i32> = Dispatcher::new();
        let err = dispatcher
            .add_member(TargetId::NONE, FunctionId::next(), |_: &i32| {}, ExecRule::Persistent)
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument(_)));
        assert!(dispatcher
            .add_member(TargetId::next(), FunctionId::NONE, |_: &i32| {}, ExecRule::Persistent)
            .is_err());
        assert!(dispatcher
            .add_free(FunctionId::NONE, |_: &i32| {}, ExecRule::Persistent)
            .is_err());

        // Failed calls leave no trace
        assert_eq!(dispatcher.capacity(), 0);
        assert_eq!(dispatcher.len(), 0);
    }

    #[test]
    fn test_remove_rejects_null_identities() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_fn(noop, ExecRule::Persistent);

        assert!(dispatcher.remove_object(TargetId::NONE).is_err());
        assert!(dispatcher
            .remove_member(TargetId::NONE, FunctionId::of_fn(&noop), RemoveMode::RemoveAll)
            .is_err());
        assert!(dispatcher
            .remove_free(FunctionId::NONE, RemoveMode::RemoveAll)
            .is_err());
        assert_eq!(dispatcher.live_count(), 1);
    }

    #[test]
    fn test_removing_missing_callback_is_noop() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_fn(noop, ExecRule::Persistent);
        assert_eq!(dispatcher.remove_fn(also_noop, RemoveMode::RemoveAll), 0);
        assert_eq!(dispatcher.remove_object(TargetId::next()), Ok(0));
        assert_eq!(dispatcher.live_count(), 1);
    }

    #[test]
    fn test_trigger_once_retires_after_call() {
        let (count, callback) = counter();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .add_free(FunctionId::next(), callback, ExecRule::TriggerOnce)
            .unwrap();

        dispatcher.invoke(&1);
        dispatcher.invoke(&2);
        assert_eq!(count.get(), 1);
        assert_eq!(dispatcher.live_count(), 0);
        assert_eq!(dispatcher.len(), 1);
        // The invoker and its capture were dropped on retirement
        assert_eq!(Rc::strong_count(&count), 1);
    }

    #[test]
    fn test_clear_keeps_slots() {
        let mut dispatcher = Dispatcher::new();
        for _ in 0..3 {
            dispatcher.add_fn(noop, ExecRule::Persistent);
        }
        let capacity = dispatcher.capacity();
        dispatcher.clear();

        assert_eq!(dispatcher.live_count(), 0);
        assert_eq!(dispatcher.len(), 3);
        assert_eq!(dispatcher.capacity(), capacity);
    }

    #[test]
    fn test_optimize_keeps_capacity() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.reserve(8);
        let ids: Vec<_> = (0..6)
            .map(|_| dispatcher.add_fn(noop, ExecRule::Persistent))
            .collect();
        dispatcher.remove_subscription(ids[1]);
        dispatcher.remove_subscription(ids[4]);

        dispatcher.optimize();
        assert_eq!(dispatcher.capacity(), 8);
        assert_eq!(dispatcher.len(), 4);
        assert_eq!(dispatcher.live_count(), 4);

        let remaining: Vec<_> = dispatcher.records().map(|r| r.subscription()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3], ids[5]]);
    }

    #[test]
    fn test_optimize_on_compact_table_is_noop() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_fn(noop, ExecRule::Persistent);
        dispatcher.optimize();
        assert_eq!(dispatcher.stats().compact_count, 0);
    }

    #[test]
    fn test_shrink_to_fit_releases_empty_storage() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.reserve(16);
        dispatcher.add_fn(noop, ExecRule::TriggerOnce);
        dispatcher.invoke(&0);

        dispatcher.shrink_to_fit();
        assert_eq!(dispatcher.capacity(), 0);
        assert_eq!(dispatcher.len(), 0);
    }

    #[test]
    fn test_reserve_compacts_when_growing() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.reserve(4);
        let first = dispatcher.add_fn(noop, ExecRule::Persistent);
        dispatcher.add_fn(noop, ExecRule::Persistent);
        dispatcher.remove_subscription(first);

        dispatcher.reserve(2);
        assert_eq!(dispatcher.len(), 2, "no growth, no compaction");

        dispatcher.reserve(10);
        assert_eq!(dispatcher.capacity(), 10);
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.live_count(), 1);
    }

    #[test]
    fn test_growth_without_compaction_when_disabled() {
        let mut dispatcher =
            Dispatcher::with_config(DispatcherConfig::new().with_compact_before_grow(false));
        let ids: Vec<_> = (0..4)
            .map(|_| dispatcher.add_fn(noop, ExecRule::Persistent))
            .collect();
        for id in &ids[..3] {
            dispatcher.remove_subscription(*id);
        }

        dispatcher.add_fn(noop, ExecRule::Persistent);
        assert_eq!(dispatcher.capacity(), 8);
        assert_eq!(dispatcher.len(), 2);
    }

    #[test]
    fn test_remove_subscription() {
        let mut dispatcher = Dispatcher::new();
        let id = dispatcher.add_fn(noop, ExecRule::Persistent);
        assert!(dispatcher.remove_subscription(id));
        assert!(!dispatcher.remove_subscription(id));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_contains() {
        let mut dispatcher: Dispatcher<i32> = Dispatcher::new();
        let target = TargetId::next();
        let function = FunctionId::next();
        dispatcher
            .add_member(target, function, |_: &i32| {}, ExecRule::Persistent)
            .unwrap();
        dispatcher.add_fn(noop, ExecRule::Persistent);

        assert!(dispatcher.contains(target, function));
        assert!(dispatcher.contains(target, FunctionId::NONE));
        assert!(!dispatcher.contains(target, FunctionId::next()));
        assert!(dispatcher.contains_free(FunctionId::of_fn(&noop)));
        assert!(!dispatcher.contains_free(FunctionId::of_fn(&also_noop)));
        assert!(!dispatcher.contains_free(FunctionId::NONE));
    }

    #[test]
    fn test_debug_output_hides_invokers() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_fn(noop, ExecRule::TriggerOnce);
        let text = format!("{:?}", dispatcher);
        assert!(text.contains("TriggerOnce"));
        assert!(text.contains("live: 1"));
    }
}
