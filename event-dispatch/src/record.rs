//! Callback records
//!
//! A record is one subscription slot: who subscribed, which function, the
//! boxed invoker and its execution rule. Dead records (tombstones) keep
//! their slot until the dispatcher compacts.

use crate::types::{ExecRule, FunctionId, SubscriptionId, TargetId};
use std::fmt;

/// Type-erased callable stored per subscription
pub(crate) type Invoker<A> = Box<dyn FnMut(&A)>;

/// The (target, function) pair a record is identified by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CallbackKey {
    pub target: TargetId,
    pub function: FunctionId,
}

impl CallbackKey {
    pub fn new(target: TargetId, function: FunctionId) -> Self {
        Self { target, function }
    }

    /// Key of a free function or standalone callable
    pub fn free(function: FunctionId) -> Self {
        Self::new(TargetId::NONE, function)
    }

    /// Wildcard key matching every record of `target`
    pub fn object(target: TargetId) -> Self {
        Self::new(target, FunctionId::NONE)
    }

    /// Whether a stored key satisfies `query`.
    ///
    /// Targets must be equal. A `NONE` function in the query matches any
    /// function of that target.
    pub fn matches(&self, query: &CallbackKey) -> bool {
        self.target == query.target
            && (query.function.is_none() || self.function == query.function)
    }
}

/// A single subscription entry
pub struct CallbackRecord<A> {
    key: CallbackKey,
    subscription: SubscriptionId,
    invoker: Option<Invoker<A>>,
    rule: ExecRule,
}

impl<A> CallbackRecord<A> {
    pub(crate) fn new(key: CallbackKey, invoker: Invoker<A>, rule: ExecRule) -> Self {
        Self {
            key,
            subscription: SubscriptionId::next(),
            invoker: Some(invoker),
            rule,
        }
    }

    pub fn key(&self) -> CallbackKey {
        self.key
    }

    pub fn target(&self) -> TargetId {
        self.key.target
    }

    pub fn function(&self) -> FunctionId {
        self.key.function
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn rule(&self) -> ExecRule {
        self.rule
    }

    pub fn is_callable(&self) -> bool {
        self.key.function.is_some()
    }

    pub fn matches(&self, query: &CallbackKey) -> bool {
        self.key.matches(query)
    }

    /// Turn the record into a tombstone, dropping the invoker and whatever
    /// it captured
    pub(crate) fn invalidate(&mut self) {
        self.key = CallbackKey::default();
        self.invoker = None;
    }

    pub(crate) fn call(&mut self, args: &A) {
        if let Some(invoker) = self.invoker.as_mut() {
            invoker(args);
        }
    }
}

impl<A> fmt::Debug for CallbackRecord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRecord")
            .field("target", &self.key.target)
            .field("function", &self.key.function)
            .field("subscription", &self.subscription)
            .field("rule", &self.rule)
            .field("callable", &self.is_callable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_exact_match() {
        let target = TargetId::next();
        let function = FunctionId::next();
        let stored = CallbackKey::new(target, function);

        assert!(stored.matches(&CallbackKey::new(target, function)));
        assert!(!stored.matches(&CallbackKey::new(target, FunctionId::next())));
        assert!(!stored.matches(&CallbackKey::new(TargetId::next(), function)));
    }

    #[test]
    fn test_null_function_is_wildcard() {
        let target = TargetId::next();
        let stored = CallbackKey::new(target, FunctionId::next());

        assert!(stored.matches(&CallbackKey::object(target)));
        assert!(!stored.matches(&CallbackKey::object(TargetId::next())));
    }

    #[test]
    fn test_free_key_does_not_match_member_key() {
        let function = FunctionId::next();
        let member = CallbackKey::new(TargetId::next(), function);
        assert!(!member.matches(&CallbackKey::free(function)));
    }

    #[test]
    fn test_invalidate_releases_captures() {
        let shared = Rc::new(Cell::new(0));
        let captured = Rc::clone(&shared);
        let mut record: CallbackRecord<i32> = CallbackRecord::new(
            CallbackKey::free(FunctionId::next()),
            Box::new(move |v: &i32| captured.set(captured.get() + *v)),
            ExecRule::Persistent,
        );

        record.call(&5);
        assert_eq!(shared.get(), 5);
        assert_eq!(Rc::strong_count(&shared), 2);

        record.invalidate();
        assert!(!record.is_callable());
        assert_eq!(record.target(), TargetId::NONE);
        assert_eq!(Rc::strong_count(&shared), 1);

        // Calling a tombstone is a no-op
        record.call(&5);
        assert_eq!(shared.get(), 5);
    }
}
