//! Event Dispatch Library
//!
//! A typed multicast signal: independent parties subscribe free functions,
//! closures or methods of listener objects, and the owner of the signal
//! fires it, calling every live subscriber once in registration order.
//!
//! # Architecture
//!
//! - [`Dispatcher`] owns the callback table and is the only type with
//!   `invoke`. It is meant to be stored by value inside its owner.
//! - [`Subscriptions`] is a borrowed view of a dispatcher carrying every
//!   add/remove/maintenance operation but not `invoke`. Owners hand it out
//!   from an accessor so subscribers can listen but never fire.
//! - [`CallbackRecord`] is one table slot: a (target, function) identity,
//!   a boxed invoker and an [`ExecRule`].
//!
//! Removal tombstones a slot; dead slots are reclaimed by compaction, which
//! happens before the table would otherwise grow.
//!
//! The library does NOT:
//! - Synchronize across threads (a `Dispatcher` is neither `Send` nor `Sync`)
//! - Order deliveries across separate dispatchers
//! - Persist subscriptions
//!
//! # Example Usage
//!
//! ```
//! use event_dispatch::{Dispatcher, ExecRule, Listener, TargetId};
//! use std::rc::Rc;
//!
//! struct Gauge {
//!     id: TargetId,
//! }
//!
//! impl Listener for Gauge {
//!     fn listener_id(&self) -> TargetId {
//!         self.id
//!     }
//! }
//!
//! impl Gauge {
//!     fn on_sample(&self, sample: &(u32, f64)) {
//!         println!("sensor {} reads {}", sample.0, sample.1);
//!     }
//! }
//!
//! let gauge = Rc::new(Gauge { id: TargetId::next() });
//! let mut sampled: Dispatcher<(u32, f64)> = Dispatcher::new();
//!
//! sampled
//!     .subscriptions()
//!     .add_method(&gauge, Gauge::on_sample, ExecRule::Persistent)
//!     .unwrap();
//! sampled.invoke(&(1, 20.5));
//!
//! sampled.remove_object(gauge.listener_id()).unwrap();
//! assert!(sampled.is_empty());
//! ```

// Public modules
pub mod config;
pub mod dispatcher;
pub mod record;
pub mod subscriptions;
pub mod types;

// Re-export main types for convenience
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use record::{CallbackKey, CallbackRecord};
pub use subscriptions::Subscriptions;
pub use types::{
    DispatchError, DispatcherStats, ExecRule, FunctionId, Listener, RemoveMode, Result,
    SubscriptionId, TargetId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
