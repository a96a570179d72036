use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use oso::PolarClass;
use tokio::sync::{broadcast, Mutex};

use crate::entities::Booking;
use crate::error::{invalid_input_error, Error};

/// A notification channel, addressed by role and user id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Driver(String),
    Passenger(String),
}

impl Topic {
    pub fn parse(role: &str, id: &str) -> Result<Self, Error> {
        if id.trim().is_empty() {
            return Err(invalid_input_error());
        }

        match role {
            "driver" => Ok(Self::Driver(id.into())),
            "passenger" => Ok(Self::Passenger(id.into())),
            _ => Err(invalid_input_error()),
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Driver(id) | Self::Passenger(id) => id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::Driver(_) => "driver",
            Self::Passenger(_) => "passenger",
        }
    }
}

impl PolarClass for Topic {
    fn get_polar_class_builder() -> oso::ClassBuilder<Topic> {
        oso::Class::builder()
            .name("Topic")
            .add_attribute_getter("role", |recv: &Topic| recv.role().to_string())
            .add_attribute_getter("user_id", |recv: &Topic| recv.user_id().to_string())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Topic::get_polar_class_builder();
        builder.build()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(id) => write!(f, "driver/{}", id),
            Self::Passenger(id) => write!(f, "passenger/{}", id),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget delivery of a booking snapshot to whoever is listening
    /// on the topic right now.
    async fn publish(&self, topic: &Topic, booking: &Booking) -> Result<(), Error>;
    async fn subscribe(&self, topic: &Topic) -> Result<broadcast::Receiver<Booking>, Error>;
}

/// In-process fan-out with one bounded broadcast channel per live topic.
#[derive(Debug)]
pub struct Hub {
    capacity: usize,
    channels: Mutex<HashMap<Topic, broadcast::Sender<Booking>>>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub async fn topic_count(&self) -> usize {
        self.channels.lock().await.len()
    }
}

#[async_trait]
impl Notifier for Hub {
    #[tracing::instrument(skip(self, booking), fields(topic = %topic, booking_id = %booking.id))]
    async fn publish(&self, topic: &Topic, booking: &Booking) -> Result<(), Error> {
        let mut channels = self.channels.lock().await;

        let sender = match channels.get(topic) {
            Some(sender) => sender,
            None => {
                tracing::debug!("no subscribers, dropping update");
                return Ok(());
            }
        };

        if sender.send(booking.clone()).is_err() {
            // every receiver is gone
            tracing::debug!("subscribers left, closing topic");
            channels.remove(topic);
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(topic = %topic))]
    async fn subscribe(&self, topic: &Topic) -> Result<broadcast::Receiver<Booking>, Error> {
        let mut channels = self.channels.lock().await;

        // forget topics whose subscribers are all gone
        channels.retain(|_, sender| sender.receiver_count() > 0);

        if let Some(sender) = channels.get(topic) {
            return Ok(sender.subscribe());
        }

        let (sender, receiver) = broadcast::channel(self.capacity);
        channels.insert(topic.clone(), sender);

        Ok(receiver)
    }
}

#[test]
fn topic_names() {
    assert_eq!(Topic::Driver("d1".into()).to_string(), "driver/d1");
    assert_eq!(Topic::Passenger("p1".into()).to_string(), "passenger/p1");

    assert_eq!(
        Topic::parse("driver", "d1").unwrap(),
        Topic::Driver("d1".into())
    );
    assert!(Topic::parse("admin", "a1").unwrap_err().is_invalid_input_error());
    assert!(Topic::parse("passenger", "").is_err());
}

#[test]
fn publish_reaches_matching_subscribers_only() {
    use tokio_test::block_on;

    let hub = Hub::new(8);
    let driver_topic = Topic::Driver("d1".into());
    let passenger_topic = Topic::Passenger("d1".into());

    let mut driver_rx = block_on(hub.subscribe(&driver_topic)).unwrap();
    let mut passenger_rx = block_on(hub.subscribe(&passenger_topic)).unwrap();

    let booking = Booking::new("p1".into(), "a".into(), "b".into(), Some("d1".into()));
    block_on(hub.publish(&driver_topic, &booking)).unwrap();

    assert_eq!(driver_rx.try_recv().unwrap(), booking);
    assert!(passenger_rx.try_recv().is_err());
}

#[test]
fn publish_without_subscribers_is_silent() {
    use tokio_test::block_on;

    let hub = Hub::new(8);
    let topic = Topic::Passenger("p1".into());
    let booking = Booking::new("p1".into(), "a".into(), "b".into(), None);

    block_on(hub.publish(&topic, &booking)).unwrap();
    assert_eq!(block_on(hub.topic_count()), 0);

    // the topic is dropped on the first publish after its last subscriber left
    let receiver = block_on(hub.subscribe(&topic)).unwrap();
    assert_eq!(block_on(hub.topic_count()), 1);
    drop(receiver);

    block_on(hub.publish(&topic, &booking)).unwrap();
    assert_eq!(block_on(hub.topic_count()), 0);
}

#[test]
fn abandoned_topics_are_pruned_on_subscribe() {
    use tokio_test::block_on;

    let hub = Hub::new(8);

    let first = block_on(hub.subscribe(&Topic::Passenger("p1".into()))).unwrap();
    let second = block_on(hub.subscribe(&Topic::Driver("d1".into()))).unwrap();
    assert_eq!(block_on(hub.topic_count()), 2);

    drop(first);
    drop(second);

    let _third = block_on(hub.subscribe(&Topic::Passenger("p2".into()))).unwrap();
    assert_eq!(block_on(hub.topic_count()), 1);

    // a live topic survives another subscription
    let _fourth = block_on(hub.subscribe(&Topic::Passenger("p3".into()))).unwrap();
    assert_eq!(block_on(hub.topic_count()), 2);
}
