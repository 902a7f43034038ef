//! Drag session tracking for card and list gestures.
//!
//! A [`DragTracker`] holds at most one active gesture. Card and list drags
//! are variants of the same slot, so both can never be active together.
//! Starting a second gesture while one is active is rejected with
//! [`TrellisError::InvariantViolation`]; UI wiring is expected to ignore it.
//!
//! A visual drag proxy (ghost element) can be attached to the active
//! gesture. It is released when the gesture ends, is cancelled, or the
//! tracker itself is dropped.

use crate::{
    domain::{CardId, List, ListId},
    error::{Result, TrellisError},
};
use tracing::debug;

/// An in-progress card drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDragSession {
    pub card_id: CardId,
    pub origin_list_id: ListId,
    pub origin_index: usize,
}

/// An in-progress list drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDragSession {
    pub list_id: ListId,
    pub origin_index: usize,
}

/// Where a dragged card would be inserted: before `index` in `list_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHoverTarget {
    pub list_id: ListId,
    pub index: usize,
}

/// Where a dragged list would be inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHoverTarget {
    pub index: usize,
}

/// Environment-specific visual stand-in for the dragged element
pub trait DragProxy: Send {
    /// Removes the proxy from the display. Called exactly once.
    fn release(&mut self);
}

struct ProxyGuard(Box<dyn DragProxy>);

impl Drop for ProxyGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// The gesture that was active when a drag ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishedDrag {
    Card {
        session: CardDragSession,
        hover: Option<CardHoverTarget>,
    },
    List {
        session: ListDragSession,
        hover: Option<ListHoverTarget>,
    },
}

#[derive(Debug, Clone)]
enum ActiveDrag {
    Card {
        session: CardDragSession,
        hover: Option<CardHoverTarget>,
    },
    List {
        session: ListDragSession,
        hover: Option<ListHoverTarget>,
    },
}

#[derive(Default)]
pub struct DragTracker {
    active: Option<ActiveDrag>,
    proxy: Option<ProxyGuard>,
}

impl std::fmt::Debug for DragTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragTracker")
            .field("active", &self.active)
            .field("has_proxy", &self.proxy.is_some())
            .finish()
    }
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.active.is_some() {
            return Err(TrellisError::InvariantViolation(
                "a drag gesture is already in progress".to_string(),
            ));
        }
        Ok(())
    }

    pub fn begin_card_drag(
        &mut self,
        card_id: CardId,
        list_id: ListId,
        index: usize,
    ) -> Result<()> {
        self.ensure_idle()?;
        debug!(card = %card_id, list = %list_id, index, "card drag started");
        self.active = Some(ActiveDrag::Card {
            session: CardDragSession {
                card_id,
                origin_list_id: list_id,
                origin_index: index,
            },
            hover: None,
        });
        Ok(())
    }

    /// Records the slot under the pointer. Last write wins.
    pub fn update_card_hover(&mut self, list_id: ListId, index: usize) -> Result<()> {
        match &mut self.active {
            Some(ActiveDrag::Card { hover, .. }) => {
                *hover = Some(CardHoverTarget { list_id, index });
                Ok(())
            }
            _ => Err(TrellisError::InvariantViolation(
                "card hover without an active card drag".to_string(),
            )),
        }
    }

    /// Hovering a list container rather than a card targets the end of that list
    pub fn hover_list_container(&mut self, list: &List) -> Result<()> {
        self.update_card_hover(list.id.clone(), list.card_count())
    }

    pub fn begin_list_drag(&mut self, list_id: ListId, index: usize) -> Result<()> {
        self.ensure_idle()?;
        debug!(list = %list_id, index, "list drag started");
        self.active = Some(ActiveDrag::List {
            session: ListDragSession {
                list_id,
                origin_index: index,
            },
            hover: None,
        });
        Ok(())
    }

    pub fn update_list_hover(&mut self, index: usize) -> Result<()> {
        match &mut self.active {
            Some(ActiveDrag::List { hover, .. }) => {
                *hover = Some(ListHoverTarget { index });
                Ok(())
            }
            _ => Err(TrellisError::InvariantViolation(
                "list hover without an active list drag".to_string(),
            )),
        }
    }

    /// Attaches the visual proxy for the active gesture.
    ///
    /// With no gesture active the proxy is released immediately.
    pub fn attach_proxy(&mut self, proxy: Box<dyn DragProxy>) {
        let guard = ProxyGuard(proxy);
        if self.active.is_some() {
            self.proxy = Some(guard);
        }
    }

    /// Clears the session, hover target and proxy, returning what was active.
    ///
    /// Safe to call repeatedly; later calls return `None`.
    pub fn end_drag(&mut self) -> Option<FinishedDrag> {
        self.proxy = None;
        self.active.take().map(|active| match active {
            ActiveDrag::Card { session, hover } => FinishedDrag::Card { session, hover },
            ActiveDrag::List { session, hover } => FinishedDrag::List { session, hover },
        })
    }

    /// Abandons the gesture, e.g. after losing pointer capture
    pub fn cancel(&mut self) {
        if let Some(finished) = self.end_drag() {
            debug!(?finished, "drag cancelled");
        }
    }

    pub fn card_session(&self) -> Option<&CardDragSession> {
        match &self.active {
            Some(ActiveDrag::Card { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn card_hover(&self) -> Option<&CardHoverTarget> {
        match &self.active {
            Some(ActiveDrag::Card { hover, .. }) => hover.as_ref(),
            _ => None,
        }
    }

    pub fn list_session(&self) -> Option<&ListDragSession> {
        match &self.active {
            Some(ActiveDrag::List { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn list_hover(&self) -> Option<ListHoverTarget> {
        match &self.active {
            Some(ActiveDrag::List { hover, .. }) => *hover,
            _ => None,
        }
    }

    /// Whether a dragged card currently targets this slot (for drop indicators)
    pub fn is_hovering_card_slot(&self, list_id: &ListId, index: usize) -> bool {
        self.card_hover()
            .map_or(false, |h| &h.list_id == list_id && h.index == index)
    }

    pub fn is_hovering_list_slot(&self, index: usize) -> bool {
        self.list_hover().map_or(false, |h| h.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingProxy(Arc<AtomicUsize>);

    impl DragProxy for CountingProxy {
        fn release(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn proxy() -> (Box<dyn DragProxy>, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        (Box::new(CountingProxy(released.clone())), released)
    }

    #[test]
    fn test_card_drag_lifecycle() {
        let mut tracker = DragTracker::new();
        tracker
            .begin_card_drag(CardId::new("c"), ListId::new("a"), 1)
            .unwrap();
        tracker.update_card_hover(ListId::new("b"), 0).unwrap();
        tracker.update_card_hover(ListId::new("b"), 2).unwrap();

        assert!(tracker.is_hovering_card_slot(&ListId::new("b"), 2));
        assert!(!tracker.is_hovering_card_slot(&ListId::new("b"), 0));

        let finished = tracker.end_drag().unwrap();
        assert_eq!(
            finished,
            FinishedDrag::Card {
                session: CardDragSession {
                    card_id: CardId::new("c"),
                    origin_list_id: ListId::new("a"),
                    origin_index: 1,
                },
                hover: Some(CardHoverTarget {
                    list_id: ListId::new("b"),
                    index: 2,
                }),
            }
        );
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut tracker = DragTracker::new();
        tracker
            .begin_card_drag(CardId::new("c"), ListId::new("a"), 0)
            .unwrap();

        let err = tracker.begin_list_drag(ListId::new("a"), 0).unwrap_err();
        assert!(err.is_invariant_violation());
        let err = tracker
            .begin_card_drag(CardId::new("d"), ListId::new("a"), 1)
            .unwrap_err();
        assert!(err.is_invariant_violation());

        assert_eq!(tracker.card_session().unwrap().card_id.as_str(), "c");
        assert!(tracker.list_session().is_none());
    }

    #[test]
    fn test_hover_requires_matching_session() {
        let mut tracker = DragTracker::new();
        assert!(tracker.update_card_hover(ListId::new("a"), 0).is_err());
        assert!(tracker.update_list_hover(0).is_err());

        tracker.begin_list_drag(ListId::new("a"), 0).unwrap();
        assert!(tracker.update_card_hover(ListId::new("a"), 0).is_err());
        tracker.update_list_hover(2).unwrap();
        assert!(tracker.is_hovering_list_slot(2));
    }

    #[test]
    fn test_list_container_hover_targets_end() {
        use crate::domain::Card;

        let list = List::new(ListId::new("b"), "B".to_string()).with_cards(vec![
            Card::new(CardId::new("x"), "X".to_string()),
            Card::new(CardId::new("y"), "Y".to_string()),
        ]);

        let mut tracker = DragTracker::new();
        tracker
            .begin_card_drag(CardId::new("c"), ListId::new("a"), 0)
            .unwrap();
        tracker.hover_list_container(&list).unwrap();

        assert_eq!(tracker.card_hover().unwrap().index, 2);
    }

    #[test]
    fn test_end_drag_is_idempotent() {
        let mut tracker = DragTracker::new();
        tracker.begin_list_drag(ListId::new("a"), 1).unwrap();

        assert!(tracker.end_drag().is_some());
        assert!(tracker.end_drag().is_none());
        assert!(tracker.end_drag().is_none());
        tracker.begin_list_drag(ListId::new("a"), 1).unwrap();
    }

    #[test]
    fn test_proxy_released_on_every_exit_path() {
        let mut tracker = DragTracker::new();

        tracker.begin_list_drag(ListId::new("a"), 0).unwrap();
        let (p, released) = proxy();
        tracker.attach_proxy(p);
        tracker.end_drag();
        tracker.end_drag();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        tracker
            .begin_card_drag(CardId::new("c"), ListId::new("a"), 0)
            .unwrap();
        let (p, released) = proxy();
        tracker.attach_proxy(p);
        tracker.cancel();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        tracker
            .begin_card_drag(CardId::new("c"), ListId::new("a"), 0)
            .unwrap();
        let (p, released) = proxy();
        tracker.attach_proxy(p);
        drop(tracker);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_proxy_without_gesture_released_immediately() {
        let mut tracker = DragTracker::new();
        let (p, released) = proxy();
        tracker.attach_proxy(p);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
