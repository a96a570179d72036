mod booking_api;
mod dispatch;
mod driver_api;
mod station_api;
mod subscription_api;

pub use dispatch::select_driver;

use std::sync::Arc;

use oso::Oso;

use crate::{
    api::API,
    auth::authorizor,
    entities::{Booking, TransitionPolicy},
    error::{unauthorized_error, Error},
    notify::{Notifier, Topic},
    store::Store,
};

pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    authorizor: Oso,
    transition_policy: TransitionPolicy,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip(store, notifier))]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        transition_policy: TransitionPolicy,
    ) -> Result<Self, Error> {
        Ok(Self {
            store,
            notifier,
            authorizor: authorizor::new()?,
            transition_policy,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }

    /// Publishes a snapshot; a failed delivery is logged and otherwise ignored.
    async fn notify(&self, topic: Topic, booking: &Booking) {
        if let Err(err) = self.notifier.publish(&topic, booking).await {
            tracing::warn!(%topic, booking_id = %booking.id, "failed to publish booking update: {}", err);
        }
    }
}

impl API for Engine {}
