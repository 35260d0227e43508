//! Topic Binding - pub/sub endpoint lifecycle without self-feedback
//!
//! A binding ties one named topic to an optional publisher and an optional
//! subscriber. Endpoints are not created until the binding is enabled,
//! and they are handed back when it is disabled or closed.
//!
//! # Core Types
//!
//! - **Binding**: topic + endpoint factories + per-cycle update closures
//! - **BindingGroup**: a set of bindings driven through one lifecycle
//! - **MemoryMedium**: an in-process medium for tests and local wiring
//!
//! # Lifecycle
//!
//! ```text
//!  new ──enable()──► Enabled ──disable()──► Disabled ──enable()──► ...
//!                       │                      │
//!                       └──────close()─────────┴──► Closed
//! ```
//!
//! `update()` runs the subscriber closure and then the publisher closure,
//! skipping any direction whose endpoint is absent. An external driver
//! decides how often to call it.
//!
//! # No self-feedback
//!
//! When a binding has both endpoints, its subscriber is created with
//! [`PubSubOption::ExcludePublisher`] naming its own publisher. A value the
//! binding writes is never read back by the same binding.
//!
//! # Example: a dashboard setpoint
//!
//! ```rust
//! use topic_binding::{
//!     Binding, MemoryMedium, MemoryPublisher, MemorySubscriber, MemoryTopic, PubSubOption,
//!     UpdateResult,
//! };
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let medium = MemoryMedium::new();
//! let setpoint = Rc::new(Cell::new(0.0_f64));
//!
//! let read = Rc::clone(&setpoint);
//! let write = Rc::clone(&setpoint);
//! let mut binding: Binding<MemoryTopic<f64>, MemoryPublisher<f64>, MemorySubscriber<f64>> =
//!     Binding::publish_subscribe(
//!         medium.topic("arm/setpoint"),
//!         |t: &MemoryTopic<f64>| Some(t.publish()),
//!         move |p: &mut MemoryPublisher<f64>| -> UpdateResult {
//!             p.set(read.get());
//!             Ok(())
//!         },
//!         |t: &MemoryTopic<f64>, options: &[PubSubOption]| Some(t.subscribe(options)),
//!         move |s: &mut MemorySubscriber<f64>| -> UpdateResult {
//!             if let Some(v) = s.read_queue().pop() {
//!                 write.set(v);
//!             }
//!             Ok(())
//!         },
//!     );
//!
//! binding.enable().unwrap();
//!
//! // Someone on the dashboard moves the slider
//! medium.topic("arm/setpoint").publish().set(0.75);
//!
//! binding.update().unwrap();
//! assert_eq!(setpoint.get(), 0.75);
//!
//! binding.close().unwrap();
//! ```

mod binding;
mod config;
mod error;
mod group;
mod medium;
mod memory;

pub use binding::{Binding, BindingBuilder, BindingState, UpdateResult};
pub use config::GroupConfig;
pub use error::{
    BindingError, ConfigError, GroupUpdateError, MediumError, ReleaseError, UpdateFailure,
};
pub use group::{Bindable, BindingGroup};
pub use medium::{
    Endpoint, PubSubOption, PublishEndpoint, PublisherId, SubscribeEndpoint, Topic, Unbound,
};
pub use memory::{
    MemoryMedium, MemoryPublisher, MemorySubscriber, MemoryTopic, DEFAULT_POLL_STORAGE,
};
