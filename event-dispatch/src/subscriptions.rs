//! Subscriber-side view of a dispatcher
//!
//! [`Subscriptions`] borrows a [`Dispatcher`] and forwards every add,
//! remove and maintenance operation to it. It has no way to fire the
//! signal. An owner keeps its dispatcher private and hands out this view
//! through an accessor:
//!
//! ```
//! use event_dispatch::{Dispatcher, ExecRule, Subscriptions};
//!
//! #[derive(Default)]
//! struct Button {
//!     clicked: Dispatcher<(i32, i32)>,
//! }
//!
//! impl Button {
//!     pub fn on_clicked(&mut self) -> Subscriptions<'_, (i32, i32)> {
//!         self.clicked.subscriptions()
//!     }
//!
//!     pub fn click(&mut self, x: i32, y: i32) {
//!         self.clicked.invoke(&(x, y));
//!     }
//! }
//!
//! fn log_click(pos: &(i32, i32)) {
//!     println!("clicked at {:?}", pos);
//! }
//!
//! let mut button = Button::default();
//! button.on_clicked().add_fn(log_click, ExecRule::Persistent);
//! button.click(3, 4);
//! ```

use crate::dispatcher::Dispatcher;
use crate::record::CallbackRecord;
use crate::types::{
    DispatcherStats, ExecRule, FunctionId, Listener, RemoveMode, Result, SubscriptionId,
    TargetId,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Subscribe/unsubscribe access to a [`Dispatcher`], without `invoke`.
///
/// Not `Clone`: a view is tied to the one dispatcher it was created from
/// for as long as it lives.
///
/// Views come only from [`Dispatcher::subscriptions`]:
///
/// ```compile_fail
/// use event_dispatch::{Dispatcher, Subscriptions};
///
/// let mut dispatcher: Dispatcher<i32> = Dispatcher::new();
/// let _view = Subscriptions::new(&mut dispatcher);
/// ```
pub struct Subscriptions<'a, A> {
    dispatcher: &'a mut Dispatcher<A>,
}

impl<'a, A> Subscriptions<'a, A> {
    pub(crate) fn new(dispatcher: &'a mut Dispatcher<A>) -> Self {
        Self { dispatcher }
    }

    pub fn remove_member(
        &mut self,
        target: TargetId,
        function: FunctionId,
        mode: RemoveMode,
    ) -> Result<usize> {
        self.dispatcher.remove_member(target, function, mode)
    }

    pub fn remove_free(&mut self, function: FunctionId, mode: RemoveMode) -> Result<usize> {
        self.dispatcher.remove_free(function, mode)
    }

    pub fn remove_fn<F>(&mut self, function: F, mode: RemoveMode) -> usize
    where
        F: Fn(&A) + 'static,
    {
        self.dispatcher.remove_fn(function, mode)
    }

    pub fn remove_method<T, M>(&mut self, listener: &T, method: M, mode: RemoveMode) -> Result<usize>
    where
        T: Listener,
        M: Fn(&T, &A) + 'static,
    {
        self.dispatcher.remove_method(listener, method, mode)
    }

    pub fn remove_method_mut<T, M>(&mut self, listener: &T, method: M, mode: RemoveMode) -> Result<usize>
    where
        T: Listener,
        M: Fn(&mut T, &A) + 'static,
    {
        self.dispatcher.remove_method_mut(listener, method, mode)
    }

    pub fn remove_object(&mut self, target: TargetId) -> Result<usize> {
        self.dispatcher.remove_object(target)
    }

    pub fn remove_subscription(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.remove_subscription(id)
    }

    pub fn contains(&self, target: TargetId, function: FunctionId) -> bool {
        self.dispatcher.contains(target, function)
    }

    pub fn contains_free(&self, function: FunctionId) -> bool {
        self.dispatcher.contains_free(function)
    }

    pub fn clear(&mut self) {
        self.dispatcher.clear()
    }

    pub fn reserve(&mut self, new_capacity: usize) {
        self.dispatcher.reserve(new_capacity)
    }

    pub fn optimize(&mut self) {
        self.dispatcher.optimize()
    }

    pub fn shrink_to_fit(&mut self) {
        self.dispatcher.shrink_to_fit()
    }

    pub fn capacity(&self) -> usize {
        self.dispatcher.capacity()
    }

    pub fn len(&self) -> usize {
        self.dispatcher.len()
    }

    pub fn live_count(&self) -> usize {
        self.dispatcher.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatcher.is_empty()
    }

    pub fn stats(&self) -> DispatcherStats {
        self.dispatcher.stats()
    }

    pub fn records(&self) -> impl Iterator<Item = &CallbackRecord<A>> {
        self.dispatcher.records()
    }
}

impl<'a, A: 'static> Subscriptions<'a, A> {
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
        self.dispatcher.add_member(target, function, invoker, rule)
    }

    pub fn add_free<F>(&mut self, function: FunctionId, invoker: F, rule: ExecRule) -> Result<SubscriptionId>
    where
        F: FnMut(&A) + 'static,
    {
        self.dispatcher.add_free(function, invoker, rule)
    }

    pub fn add_fn<F>(&mut self, function: F, rule: ExecRule) -> SubscriptionId
    where
        F: Fn(&A) + 'static,
    {
        self.dispatcher.add_fn(function, rule)
    }

    pub fn add_method<T, M>(&mut self, listener: &Rc<T>, method: M, rule: ExecRule) -> Result<SubscriptionId>
    where
        T: Listener + 'static,
        M: Fn(&T, &A) + 'static,
    {
        self.dispatcher.add_method(listener, method, rule)
    }

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
        self.dispatcher.add_method_mut(listener, method, rule)
    }
}
