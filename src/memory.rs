//! In-process channel medium
//!
//! A small single-threaded pub/sub medium that honors [`PubSubOption`]s.
//! Useful for tests and for wiring bindings together inside one process.
//! Dropping an endpoint unregisters it just like `close()` does.
//!
//! ```rust
//! use topic_binding::{MemoryMedium, PubSubOption, Topic};
//!
//! let medium = MemoryMedium::new();
//! let topic = medium.topic("speed");
//!
//! let mut publisher = topic.publish();
//! let echo = topic.subscribe(&[PubSubOption::exclude_publisher(&publisher)]);
//! let other = topic.subscribe(&[]);
//!
//! publisher.set(3.5);
//! assert_eq!(other.get(), Some(3.5));
//! assert_eq!(echo.get(), None);
//! assert_eq!(topic.name(), "speed");
//! ```

use crate::error::MediumError;
use crate::medium::{Endpoint, PubSubOption, PublishEndpoint, PublisherId, SubscribeEndpoint, Topic};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Queue depth used when no `PollStorage` option is given.
pub const DEFAULT_POLL_STORAGE: usize = 1;

/// One subscriber's delivery state.
struct Slot<V> {
    id: u64,
    excluded: Vec<PublisherId>,
    capacity: usize,
    queue: VecDeque<V>,
    latest: Option<V>,
}

impl<V: Clone> Slot<V> {
    fn accepts(&self, from: PublisherId) -> bool {
        !self.excluded.contains(&from)
    }

    fn deliver(&mut self, value: &V) {
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        if self.capacity > 0 {
            self.queue.push_back(value.clone());
        }
        self.latest = Some(value.clone());
    }
}

/// Shared state of one named channel.
struct Channel<V> {
    publishers: Vec<PublisherId>,
    subscribers: Vec<Slot<V>>,
    next_slot: u64,
    last: Option<(PublisherId, V)>,
}

impl<V> Default for Channel<V> {
    fn default() -> Self {
        Self {
            publishers: Vec::new(),
            subscribers: Vec::new(),
            next_slot: 0,
            last: None,
        }
    }
}

/// A set of named in-memory topics.
///
/// Cloning yields another handle to the same topics.
pub struct MemoryMedium<V> {
    topics: Rc<RefCell<HashMap<String, Rc<RefCell<Channel<V>>>>>>,
    next_publisher: Rc<Cell<u64>>,
}

impl<V> Clone for MemoryMedium<V> {
    fn clone(&self) -> Self {
        Self {
            topics: Rc::clone(&self.topics),
            next_publisher: Rc::clone(&self.next_publisher),
        }
    }
}

impl<V: Clone> MemoryMedium<V> {
    pub fn new() -> Self {
        Self {
            topics: Rc::default(),
            next_publisher: Rc::new(Cell::new(1)),
        }
    }

    /// Look up a topic by name, creating it on first use.
    pub fn topic(&self, name: &str) -> MemoryTopic<V> {
        let channel = self
            .topics
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .clone();

        MemoryTopic {
            name: name.to_string(),
            channel,
            next_publisher: Rc::clone(&self.next_publisher),
        }
    }

    /// Names of all topics created so far.
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl<V: Clone> Default for MemoryMedium<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one in-memory topic.
pub struct MemoryTopic<V> {
    name: String,
    channel: Rc<RefCell<Channel<V>>>,
    next_publisher: Rc<Cell<u64>>,
}

impl<V> Clone for MemoryTopic<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            channel: Rc::clone(&self.channel),
            next_publisher: Rc::clone(&self.next_publisher),
        }
    }
}

impl<V: Clone> MemoryTopic<V> {
    /// Create a publisher with a medium-unique id.
    pub fn publish(&self) -> MemoryPublisher<V> {
        let id = PublisherId(self.next_publisher.get());
        self.next_publisher.set(id.0 + 1);
        self.channel.borrow_mut().publishers.push(id);

        MemoryPublisher {
            id,
            topic: self.clone(),
        }
    }

    /// Create a subscriber honoring `ExcludePublisher` and `PollStorage`.
    ///
    /// The subscriber starts with the topic's current value unless that
    /// value came from an excluded publisher. Its queue starts empty.
    pub fn subscribe(&self, options: &[PubSubOption]) -> MemorySubscriber<V> {
        let mut excluded = Vec::new();
        let mut capacity = DEFAULT_POLL_STORAGE;
        for option in options {
            match option {
                PubSubOption::ExcludePublisher(id) => excluded.push(*id),
                PubSubOption::PollStorage(n) => capacity = *n,
            }
        }

        let mut channel = self.channel.borrow_mut();
        let id = channel.next_slot;
        channel.next_slot += 1;

        let latest = match &channel.last {
            Some((from, value)) if !excluded.contains(from) => Some(value.clone()),
            _ => None,
        };

        channel.subscribers.push(Slot {
            id,
            excluded,
            capacity,
            queue: VecDeque::new(),
            latest,
        });

        MemorySubscriber {
            id,
            topic: self.clone(),
        }
    }

    /// Most recently published value, from any publisher.
    pub fn last_value(&self) -> Option<V> {
        self.channel.borrow().last.as_ref().map(|(_, v)| v.clone())
    }

    pub fn publisher_count(&self) -> usize {
        self.channel.borrow().publishers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.borrow().subscribers.len()
    }
}

impl<V> Topic for MemoryTopic<V> {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Publish endpoint on a [`MemoryTopic`].
pub struct MemoryPublisher<V> {
    id: PublisherId,
    topic: MemoryTopic<V>,
}

impl<V: Clone> MemoryPublisher<V> {
    /// Publish a value to every subscriber that does not exclude us.
    pub fn set(&mut self, value: V) {
        let mut channel = self.topic.channel.borrow_mut();
        for slot in channel.subscribers.iter_mut().filter(|s| s.accepts(self.id)) {
            slot.deliver(&value);
        }
        channel.last = Some((self.id, value));
    }

    pub fn topic(&self) -> &MemoryTopic<V> {
        &self.topic
    }
}

impl<V> MemoryPublisher<V> {
    /// Remove this publisher from its topic. Returns false if it was
    /// already gone.
    fn unregister(&self) -> bool {
        let mut channel = self.topic.channel.borrow_mut();
        let before = channel.publishers.len();
        channel.publishers.retain(|id| *id != self.id);
        channel.publishers.len() != before
    }
}

impl<V> Endpoint for MemoryPublisher<V> {
    fn close(self) -> Result<(), MediumError> {
        if !self.unregister() {
            return Err(MediumError::Closed {
                topic: self.topic.name.clone(),
            });
        }
        Ok(())
    }
}

impl<V> Drop for MemoryPublisher<V> {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl<V> PublishEndpoint for MemoryPublisher<V> {
    fn id(&self) -> PublisherId {
        self.id
    }
}

/// Subscribe endpoint on a [`MemoryTopic`].
pub struct MemorySubscriber<V> {
    id: u64,
    topic: MemoryTopic<V>,
}

impl<V: Clone> MemorySubscriber<V> {
    /// Latest delivered value.
    pub fn get(&self) -> Option<V> {
        let channel = self.topic.channel.borrow();
        channel
            .subscribers
            .iter()
            .find(|s| s.id == self.id)
            .and_then(|s| s.latest.clone())
    }

    /// Drain queued values, oldest first.
    pub fn read_queue(&mut self) -> Vec<V> {
        let mut channel = self.topic.channel.borrow_mut();
        channel
            .subscribers
            .iter_mut()
            .find(|s| s.id == self.id)
            .map(|s| s.queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn topic(&self) -> &MemoryTopic<V> {
        &self.topic
    }
}

impl<V> MemorySubscriber<V> {
    /// Remove this subscriber's slot. Returns false if it was already gone.
    fn unregister(&self) -> bool {
        let mut channel = self.topic.channel.borrow_mut();
        let before = channel.subscribers.len();
        channel.subscribers.retain(|s| s.id != self.id);
        channel.subscribers.len() != before
    }
}

impl<V> Endpoint for MemorySubscriber<V> {
    fn close(self) -> Result<(), MediumError> {
        if !self.unregister() {
            return Err(MediumError::Closed {
                topic: self.topic.name.clone(),
            });
        }
        Ok(())
    }
}

impl<V> Drop for MemorySubscriber<V> {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl<V> SubscribeEndpoint for MemorySubscriber<V> {}
