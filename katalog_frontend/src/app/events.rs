use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use super::feed_item::ItemKey;

/// Cross-component signals. Components never hold references to each
/// other; they subscribe while mounted and react to these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    NotificationsChanged,
    ActivityDeleted { activity_id: String },
    /// Posted through `item`; other mounts of the same activity catch up.
    CommentPosted { item: ItemKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<AppEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn drain(&self) -> Vec<AppEvent> {
        self.rx.try_iter().collect()
    }
}

/// Publish/subscribe channel that lives as long as the app.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Sender<AppEvent>)>,
    next_id: u64,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::channel();
        self.subscribers.push((id, tx));
        Subscription { id, rx }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    pub fn publish(&mut self, event: AppEvent) {
        debug!("publishing {event:?} to {} subscribers", self.subscribers.len());
        // A dropped receiver means its owner went away without unsubscribing.
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn subscribers_receive_until_unsubscribed() {
        let mut bus = EventBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(AppEvent::NotificationsChanged);
        assert_eq!(first.drain(), vec![AppEvent::NotificationsChanged]);

        assert!(bus.unsubscribe(second.id()));
        assert!(!bus.unsubscribe(second.id()));
        bus.publish(AppEvent::ActivityDeleted {
            activity_id: "a-1".into(),
        });

        assert_eq!(second.drain(), vec![AppEvent::NotificationsChanged]);
        assert_eq!(
            first.drain(),
            vec![AppEvent::ActivityDeleted {
                activity_id: "a-1".into()
            }]
        );
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        bus.publish(AppEvent::NotificationsChanged);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.drain().len(), 1);
    }
}
