//! Core types for the event dispatch library
//!
//! Identity tokens, execution rules, removal modes, statistics and the error
//! type shared by the dispatcher and its subscription facade.

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors that can occur while managing subscriptions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
}

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);
static NEXT_FUNCTION: AtomicU64 = AtomicU64::new(1);
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Identity of a subscribing object.
///
/// `TargetId::NONE` stands for "no object": free functions and standalone
/// callables are registered under it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(u64);

impl TargetId {
    /// The null target
    pub const NONE: TargetId = TargetId(0);

    /// Mint a fresh, process-unique target identity
    pub fn next() -> Self {
        TargetId(NEXT_TARGET.fetch_add(1, Ordering::Relaxed))
    }

    /// True for the null target
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// True for any minted target
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "target:none")
        } else {
            write!(f, "target:{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
enum FunctionKey {
    #[default]
    None,
    /// Type of a function item or closure
    Type(TypeId),
    /// Minted token for closures without a natural identity
    Token(u64),
}

/// Identity of a registered function or callable.
///
/// A `FunctionId::NONE` marks a record as dead. Functions and methods get
/// their identity from their type: every `fn` item has a type of its own, so
/// two registrations of the same item compare equal while two items with
/// identical bodies never do. Callables without a natural identity carry a
/// token minted with [`FunctionId::next`].
///
/// Coercing an item to a `fn(&A)` pointer erases its identity: every pointer
/// of that signature shares one type. Pass the item itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FunctionId(FunctionKey);

impl FunctionId {
    /// The null function
    pub const NONE: FunctionId = FunctionId(FunctionKey::None);

    /// Mint a fresh token for a closure or other callable
    pub fn next() -> Self {
        FunctionId(FunctionKey::Token(NEXT_FUNCTION.fetch_add(1, Ordering::Relaxed)))
    }

    /// Identity of a free function
    pub fn of_fn<A, F>(_function: &F) -> Self
    where
        F: Fn(&A) + 'static,
    {
        Self::of_type::<F>()
    }

    /// Identity of a method taking `&self`
    pub fn of_method<T, A, M>(_method: &M) -> Self
    where
        M: Fn(&T, &A) + 'static,
    {
        Self::of_type::<M>()
    }

    /// Identity of a method taking `&mut self`
    pub fn of_method_mut<T, A, M>(_method: &M) -> Self
    where
        M: Fn(&mut T, &A) + 'static,
    {
        Self::of_type::<M>()
    }

    fn of_type<F: 'static>() -> Self {
        FunctionId(FunctionKey::Type(TypeId::of::<F>()))
    }

    /// True for the null function
    pub fn is_none(&self) -> bool {
        self.0 == FunctionKey::None
    }

    /// True for any registrable identity
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            FunctionKey::None => write!(f, "fn:none"),
            FunctionKey::Type(id) => write!(f, "fn:{:?}", id),
            FunctionKey::Token(token) => write!(f, "fn:#{}", token),
        }
    }
}

/// Handle returned by every successful registration
///
/// Unique for the lifetime of the process; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// What happens to a record after it fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecRule {
    /// Stays subscribed until removed
    #[default]
    Persistent,
    /// Removed right after its first call
    TriggerOnce,
}

/// How many matching records a removal retires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveMode {
    /// Only the oldest live match
    #[default]
    RemoveOne,
    /// Every live match
    RemoveAll,
}

/// An object that can subscribe its methods to a dispatcher.
///
/// Implementors mint a [`TargetId`] once (usually in their constructor) and
/// return it here for as long as they live. The id is what
/// `remove_object` matches on.
pub trait Listener {
    fn listener_id(&self) -> TargetId;
}

/// Storage statistics for a dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    /// Allocated slots
    pub capacity: usize,
    /// Populated slots, live or dead
    pub len: usize,
    /// Live records
    pub live: usize,
    /// Number of reallocations that increased capacity
    pub grow_count: u64,
    /// Number of passes that reclaimed tombstones
    pub compact_count: u64,
}

impl DispatcherStats {
    /// Populated slots holding tombstones
    pub fn tombstones(&self) -> usize {
        self.len - self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(args: &(i32, i32)) {
        std::hint::black_box(args.0);
    }

    fn same_body_handler(args: &(i32, i32)) {
        std::hint::black_box(args.0);
    }

    struct Meter;

    impl Meter {
        fn read(&self, v: &u8) {
            std::hint::black_box(*v);
        }

        fn peek(&self, v: &u8) {
            std::hint::black_box(*v);
        }
    }

    #[test]
    fn test_target_ids_are_unique() {
        let a = TargetId::next();
        let b = TargetId::next();
        assert_ne!(a, b);
        assert!(a.is_some());
        assert!(TargetId::NONE.is_none());
        assert_eq!(TargetId::default(), TargetId::NONE);
    }

    #[test]
    fn test_function_identity_of_fn_items() {
        assert_eq!(FunctionId::of_fn(&handler), FunctionId::of_fn(&handler));
        assert!(FunctionId::of_fn(&handler).is_some());
    }

    #[test]
    fn test_identical_bodies_keep_distinct_identities() {
        assert_ne!(FunctionId::of_fn(&handler), FunctionId::of_fn(&same_body_handler));
        assert_ne!(
            FunctionId::of_method(&Meter::read),
            FunctionId::of_method(&Meter::peek)
        );
        assert_eq!(
            FunctionId::of_method(&Meter::read),
            FunctionId::of_method(&Meter::read)
        );
    }

    #[test]
    fn test_minted_function_ids_never_collide() {
        let a = FunctionId::next();
        let b = FunctionId::next();
        assert_ne!(a, b);
        assert_ne!(a, FunctionId::NONE);
        assert!(FunctionId::default().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::InvalidArgument("attempted to register a null function");
        assert_eq!(
            err.to_string(),
            "Invalid argument: attempted to register a null function"
        );
    }

    #[test]
    fn test_stats_tombstones() {
        let stats = DispatcherStats {
            capacity: 8,
            len: 6,
            live: 2,
            ..Default::default()
        };
        assert_eq!(stats.tombstones(), 4);
    }
}
