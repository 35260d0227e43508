//! Channel medium capabilities - what a binding needs from a pub/sub system
//!
//! A binding never talks to a medium directly. It only calls the factory
//! closures it was built with, and those hand back endpoints implementing
//! the traits here.
//!
//! ## Feedback prevention
//!
//! Every publish endpoint carries a [`PublisherId`]. When a binding owns both
//! directions it builds its subscriber with
//! [`PubSubOption::ExcludePublisher`] naming its own publisher, and the
//! medium must then withhold that publisher's writes from the subscriber.

use crate::error::MediumError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of one publish endpoint within its medium.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublisherId(pub u64);

/// Medium-specific directive applied when a subscriber is created.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PubSubOption {
    /// Do not deliver values written by this publisher.
    ExcludePublisher(PublisherId),
    /// Number of values the subscriber may queue between reads.
    PollStorage(usize),
}

impl PubSubOption {
    /// Convenience constructor for the exclusion directive.
    pub fn exclude_publisher<P: PublishEndpoint + ?Sized>(publisher: &P) -> Self {
        Self::ExcludePublisher(publisher.id())
    }
}

/// A named channel in the medium.
pub trait Topic {
    fn name(&self) -> &str;
}

/// Anything a binding acquires and must hand back.
pub trait Endpoint {
    /// Release the endpoint back to its medium. Consumes the handle so it
    /// can be released at most once.
    fn close(self) -> Result<(), MediumError>;
}

/// Handle used to push local values to a topic.
pub trait PublishEndpoint: Endpoint {
    fn id(&self) -> PublisherId;
}

/// Handle used to pull values published on a topic.
pub trait SubscribeEndpoint: Endpoint {}

/// Endpoint type for a direction a binding never uses.
///
/// Uninhabited: a factory for it can only ever return `None`.
#[derive(Debug)]
pub enum Unbound {}

impl Endpoint for Unbound {
    fn close(self) -> Result<(), MediumError> {
        match self {}
    }
}

impl PublishEndpoint for Unbound {
    fn id(&self) -> PublisherId {
        match *self {}
    }
}

impl SubscribeEndpoint for Unbound {}

impl Topic for str {
    fn name(&self) -> &str {
        self
    }
}

impl Topic for String {
    fn name(&self) -> &str {
        self
    }
}

impl<T: Topic + ?Sized> Topic for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}
