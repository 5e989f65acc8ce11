use crate::model::{DiagramId, ElementId, RelationshipId};

/// One notification per kind of mutation, delivered after the mutation is
/// complete so subscribers always observe a consistent engine.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagramEvent {
    ElementAdded(ElementId),
    ElementUpdated(ElementId),
    ElementRemoved(ElementId),
    RelationshipAdded(RelationshipId),
    RelationshipUpdated(RelationshipId),
    RelationshipRemoved(RelationshipId),
    SelectionChanged,
    DiagramChanged(DiagramId),
    ViewportChanged { scale: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&DiagramEvent)>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&DiagramEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &DiagramEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_reaches_every_subscriber_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |event| log.borrow_mut().push((tag, event.clone())));
        }
        bus.publish(&DiagramEvent::ElementAdded(ElementId(1)));
        assert_eq!(
            *log.borrow(),
            vec![
                ("a", DiagramEvent::ElementAdded(ElementId(1))),
                ("b", DiagramEvent::ElementAdded(ElementId(1))),
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let id = {
            let count = Rc::clone(&count);
            bus.subscribe(move |_| *count.borrow_mut() += 1)
        };
        bus.publish(&DiagramEvent::SelectionChanged);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&DiagramEvent::SelectionChanged);
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }
}
