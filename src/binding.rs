//! Binding - one topic, up to one publisher and one subscriber

use crate::error::{BindingError, ReleaseError};
use crate::medium::{PubSubOption, PublishEndpoint, SubscribeEndpoint, Topic, Unbound};
use std::convert::Infallible;
use std::fmt;
use tracing::{debug, trace, warn};

/// Result returned by update closures.
pub type UpdateResult<E = Infallible> = Result<(), E>;

type PublisherFactory<T, P> = Box<dyn Fn(&T) -> Option<P>>;
type SubscriberFactory<T, S> = Box<dyn Fn(&T, &[PubSubOption]) -> Option<S>>;
type UpdateFn<X, E> = Box<dyn FnMut(&mut X) -> UpdateResult<E>>;

/// Where a binding is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    /// Constructed or disabled; holds no endpoints.
    Disabled,
    /// Endpoints acquired (each may still be absent).
    Enabled,
    /// Retired; holds no endpoints and cannot be enabled again.
    Closed,
}

/// Binds a topic to an optional publish endpoint and an optional subscribe
/// endpoint.
///
/// Construction only stores the topic and closures. Endpoints are created by
/// [`enable`](Self::enable), driven by [`update`](Self::update) and handed
/// back by [`disable`](Self::disable) or [`close`](Self::close).
///
/// When both endpoints exist, the subscriber is always created with
/// [`PubSubOption::ExcludePublisher`] naming this binding's publisher, so
/// the binding never reads back its own writes.
///
/// A missing endpoint is never an error: that direction is simply skipped.
pub struct Binding<T, P, S, E = Infallible>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    topic: T,
    to_publisher: PublisherFactory<T, P>,
    on_publish: Option<UpdateFn<P, E>>,
    to_subscriber: SubscriberFactory<T, S>,
    on_subscribe: Option<UpdateFn<S, E>>,

    publisher: Option<P>,
    subscriber: Option<S>,
    state: BindingState,
}

impl<T, P, S, E> Binding<T, P, S, E>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    /// Start a general binding over `topic`. Unset factories yield nothing.
    pub fn builder(topic: T) -> BindingBuilder<T, P, S, E> {
        BindingBuilder::new(topic)
    }

    /// Binding that both publishes and subscribes.
    pub fn publish_subscribe<PF, PU, SF, SU>(
        topic: T,
        to_publisher: PF,
        on_publish: PU,
        to_subscriber: SF,
        on_subscribe: SU,
    ) -> Self
    where
        PF: Fn(&T) -> Option<P> + 'static,
        PU: FnMut(&mut P) -> UpdateResult<E> + 'static,
        SF: Fn(&T, &[PubSubOption]) -> Option<S> + 'static,
        SU: FnMut(&mut S) -> UpdateResult<E> + 'static,
    {
        Self::builder(topic)
            .publisher(to_publisher)
            .on_publish(on_publish)
            .subscriber(to_subscriber)
            .on_subscribe(on_subscribe)
            .build()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Acquire endpoints.
    ///
    /// The publisher is created first; if there is one, the subscriber is
    /// created with an option excluding it. Factories returning `None` are
    /// accepted silently. Enabling an enabled binding does nothing.
    pub fn enable(&mut self) -> Result<(), BindingError> {
        match self.state {
            BindingState::Enabled => return Ok(()),
            BindingState::Closed => {
                warn!(topic = %self.topic.name(), "enable called on closed binding");
                return Err(BindingError::Closed {
                    topic: self.topic.name().to_string(),
                });
            }
            BindingState::Disabled => {}
        }

        self.publisher = (self.to_publisher)(&self.topic);

        let options: Vec<PubSubOption> = self
            .publisher
            .as_ref()
            .map(|p| vec![PubSubOption::exclude_publisher(p)])
            .unwrap_or_default();

        self.subscriber = (self.to_subscriber)(&self.topic, &options);
        self.state = BindingState::Enabled;

        debug!(
            topic = %self.topic.name(),
            publisher = self.publisher.is_some(),
            subscriber = self.subscriber.is_some(),
            "binding enabled"
        );
        Ok(())
    }

    /// Run one update cycle: subscriber side first, then publisher side.
    ///
    /// Errors from the closures are returned as-is. A subscriber-side error
    /// skips the publisher side for this cycle.
    pub fn update(&mut self) -> UpdateResult<E> {
        trace!(topic = %self.topic.name(), "binding update");

        if let (Some(subscriber), Some(on_subscribe)) =
            (self.subscriber.as_mut(), self.on_subscribe.as_mut())
        {
            on_subscribe(subscriber)?;
        }

        if let (Some(publisher), Some(on_publish)) =
            (self.publisher.as_mut(), self.on_publish.as_mut())
        {
            on_publish(publisher)?;
        }

        Ok(())
    }

    /// Release endpoints and return to the pre-enable state.
    ///
    /// Safe to call repeatedly. After [`close`](Self::close) this is a no-op.
    pub fn disable(&mut self) -> Result<(), BindingError> {
        let released = self.release();
        if self.state == BindingState::Enabled {
            self.state = BindingState::Disabled;
            debug!(topic = %self.topic.name(), "binding disabled");
        }
        released
    }

    /// Release endpoints and retire the binding for good.
    ///
    /// Idempotent. A later [`enable`](Self::enable) fails with
    /// [`BindingError::Closed`].
    pub fn close(&mut self) -> Result<(), BindingError> {
        let released = self.release();
        if self.state != BindingState::Closed {
            self.state = BindingState::Closed;
            debug!(topic = %self.topic.name(), "binding closed");
        }
        released
    }

    /// Hand both endpoints back. Each release is attempted regardless of
    /// the other's outcome and both slots end up empty.
    fn release(&mut self) -> Result<(), BindingError> {
        let publisher = self.publisher.take().and_then(|p| p.close().err());
        let subscriber = self.subscriber.take().and_then(|s| s.close().err());

        if publisher.is_none() && subscriber.is_none() {
            return Ok(());
        }

        warn!(
            topic = %self.topic.name(),
            publisher_failed = publisher.is_some(),
            subscriber_failed = subscriber.is_some(),
            "endpoint release failed"
        );
        Err(ReleaseError {
            topic: self.topic.name().to_string(),
            publisher,
            subscriber,
        }
        .into())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The bound topic.
    pub fn topic(&self) -> &T {
        &self.topic
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// True between a successful `enable()` and the next release.
    pub fn is_enabled(&self) -> bool {
        self.state == BindingState::Enabled
    }

    /// Current publisher, if enabled and one was produced.
    pub fn publisher(&self) -> Option<&P> {
        self.publisher.as_ref()
    }

    /// Current subscriber, if enabled and one was produced.
    pub fn subscriber(&self) -> Option<&S> {
        self.subscriber.as_ref()
    }
}

impl<T, P, E> Binding<T, P, Unbound, E>
where
    T: Topic,
    P: PublishEndpoint,
{
    /// Binding that only publishes.
    pub fn publish_only<PF, PU>(topic: T, to_publisher: PF, on_publish: PU) -> Self
    where
        PF: Fn(&T) -> Option<P> + 'static,
        PU: FnMut(&mut P) -> UpdateResult<E> + 'static,
    {
        Self::builder(topic)
            .publisher(to_publisher)
            .on_publish(on_publish)
            .build()
    }
}

impl<T, S, E> Binding<T, Unbound, S, E>
where
    T: Topic,
    S: SubscribeEndpoint,
{
    /// Binding that only subscribes. The subscriber never receives
    /// exclusion options.
    pub fn subscribe_only<SF, SU>(topic: T, to_subscriber: SF, on_subscribe: SU) -> Self
    where
        SF: Fn(&T, &[PubSubOption]) -> Option<S> + 'static,
        SU: FnMut(&mut S) -> UpdateResult<E> + 'static,
    {
        Self::builder(topic)
            .subscriber(to_subscriber)
            .on_subscribe(on_subscribe)
            .build()
    }
}

impl<T, P, S, E> Drop for Binding<T, P, S, E>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    fn drop(&mut self) {
        // release() already logs failures
        let _ = self.release();
    }
}

impl<T, P, S, E> fmt::Debug for Binding<T, P, S, E>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("topic", &self.topic.name())
            .field("state", &self.state)
            .field("publisher", &self.publisher.is_some())
            .field("subscriber", &self.subscriber.is_some())
            .field("on_publish", &self.on_publish.is_some())
            .field("on_subscribe", &self.on_subscribe.is_some())
            .finish()
    }
}

/// General-form constructor for [`Binding`].
pub struct BindingBuilder<T, P, S, E = Infallible> {
    topic: T,
    to_publisher: PublisherFactory<T, P>,
    on_publish: Option<UpdateFn<P, E>>,
    to_subscriber: SubscriberFactory<T, S>,
    on_subscribe: Option<UpdateFn<S, E>>,
}

impl<T, P, S, E> BindingBuilder<T, P, S, E>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    fn new(topic: T) -> Self {
        Self {
            topic,
            to_publisher: Box::new(|_| None),
            on_publish: None,
            to_subscriber: Box::new(|_, _| None),
            on_subscribe: None,
        }
    }

    pub fn publisher<F>(mut self, to_publisher: F) -> Self
    where
        F: Fn(&T) -> Option<P> + 'static,
    {
        self.to_publisher = Box::new(to_publisher);
        self
    }

    pub fn on_publish<F>(mut self, on_publish: F) -> Self
    where
        F: FnMut(&mut P) -> UpdateResult<E> + 'static,
    {
        self.on_publish = Some(Box::new(on_publish));
        self
    }

    pub fn subscriber<F>(mut self, to_subscriber: F) -> Self
    where
        F: Fn(&T, &[PubSubOption]) -> Option<S> + 'static,
    {
        self.to_subscriber = Box::new(to_subscriber);
        self
    }

    pub fn on_subscribe<F>(mut self, on_subscribe: F) -> Self
    where
        F: FnMut(&mut S) -> UpdateResult<E> + 'static,
    {
        self.on_subscribe = Some(Box::new(on_subscribe));
        self
    }

    pub fn build(self) -> Binding<T, P, S, E> {
        Binding {
            topic: self.topic,
            to_publisher: self.to_publisher,
            on_publish: self.on_publish,
            to_subscriber: self.to_subscriber,
            on_subscribe: self.on_subscribe,
            publisher: None,
            subscriber: None,
            state: BindingState::Disabled,
        }
    }
}
