//! Groups of bindings driven together
//!
//! A [`BindingGroup`] owns a set of type-erased bindings and fans each
//! lifecycle call out to all of them. It does not decide *when* to update;
//! an external driver calls [`BindingGroup::update`] once per cycle.
//!
//! Members hold no reference back to the group.

use crate::binding::{Binding, BindingState};
use crate::config::GroupConfig;
use crate::error::{BindingError, ConfigError, GroupUpdateError, UpdateFailure};
use crate::medium::{PublishEndpoint, SubscribeEndpoint, Topic};
use tracing::{debug, warn};

/// Object-safe lifecycle shared by everything a group can drive.
pub trait Bindable {
    /// Error produced by the member's update logic.
    type Error;

    fn topic_name(&self) -> &str;
    fn state(&self) -> BindingState;
    fn enable(&mut self) -> Result<(), BindingError>;
    fn update(&mut self) -> Result<(), Self::Error>;
    fn disable(&mut self) -> Result<(), BindingError>;
    fn close(&mut self) -> Result<(), BindingError>;
}

impl<T, P, S, E> Bindable for Binding<T, P, S, E>
where
    T: Topic,
    P: PublishEndpoint,
    S: SubscribeEndpoint,
{
    type Error = E;

    fn topic_name(&self) -> &str {
        self.topic().name()
    }

    fn state(&self) -> BindingState {
        Binding::state(self)
    }

    fn enable(&mut self) -> Result<(), BindingError> {
        Binding::enable(self)
    }

    fn update(&mut self) -> Result<(), E> {
        Binding::update(self)
    }

    fn disable(&mut self) -> Result<(), BindingError> {
        Binding::disable(self)
    }

    fn close(&mut self) -> Result<(), BindingError> {
        Binding::close(self)
    }
}

/// A named set of bindings sharing one update error type.
pub struct BindingGroup<E> {
    config: GroupConfig,
    members: Vec<Box<dyn Bindable<Error = E>>>,
    enabled: bool,
}

impl<E: std::error::Error + 'static> BindingGroup<E> {
    pub fn new(config: GroupConfig) -> Self {
        Self {
            config,
            members: Vec::new(),
            enabled: false,
        }
    }

    /// Like [`new`](Self::new), but rejects an invalid configuration.
    pub fn try_new(config: GroupConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Add a member. If the group is already enabled the member is enabled
    /// now so it joins the next update pass.
    pub fn add<B>(&mut self, binding: B) -> Result<(), BindingError>
    where
        B: Bindable<Error = E> + 'static,
    {
        let mut binding: Box<dyn Bindable<Error = E>> = Box::new(binding);
        let enabled = if self.enabled {
            binding.enable()
        } else {
            Ok(())
        };
        self.members.push(binding);
        enabled
    }

    /// Enable every member. All members are attempted; failures are
    /// returned together.
    pub fn enable(&mut self) -> Result<(), BindingError> {
        self.enabled = true;
        debug!(group = %self.config.name, members = self.members.len(), "enabling group");
        collect(self.members.iter_mut().map(|m| m.enable()))
    }

    /// Run one update pass over all members.
    ///
    /// With `stop_on_error` the pass ends at the first failing member;
    /// otherwise every member is updated and all failures are reported.
    pub fn update(&mut self) -> Result<(), GroupUpdateError<E>> {
        let mut failures = Vec::new();

        for member in &mut self.members {
            if let Err(source) = member.update() {
                warn!(group = %self.config.name, topic = %member.topic_name(), "binding update failed");
                failures.push(UpdateFailure {
                    topic: member.topic_name().to_string(),
                    source,
                });
                if self.config.stop_on_error {
                    break;
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GroupUpdateError { failures })
        }
    }

    /// Disable every member, releasing all endpoints.
    pub fn disable(&mut self) -> Result<(), BindingError> {
        self.enabled = false;
        debug!(group = %self.config.name, "disabling group");
        collect(self.members.iter_mut().map(|m| m.disable()))
    }

    /// Close every member.
    pub fn close(&mut self) -> Result<(), BindingError> {
        self.enabled = false;
        debug!(group = %self.config.name, "closing group");
        collect(self.members.iter_mut().map(|m| m.close()))
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Topic names in member order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.topic_name())
    }
}

/// Drive the iterator to completion, folding failures into one error.
fn collect(results: impl Iterator<Item = Result<(), BindingError>>) -> Result<(), BindingError> {
    let mut errors: Vec<BindingError> = results.filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(BindingError::Group(errors)),
    }
}
