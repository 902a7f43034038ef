//! Optimistic reordering of cards and lists.
//!
//! A drop runs in three explicit phases:
//!
//! 1. [`Reconciler::drop_gesture`] ends the drag, computes the new
//!    arrangement and applies it to the navigator immediately. The drag
//!    session is cleared before anything goes over the network, so a new
//!    gesture can start while the request is in flight.
//! 2. [`Reconciler::commit`] sends the reorder request.
//! 3. [`Reconciler::settle`] confirms or rolls back to the pre-drop snapshot,
//!    then re-fetches the active board (and its parent when a sub-board is
//!    open) either way. The server recomputes fields such as project
//!    progress, so the fetched board is the final word.
//!
//! Failed reorders are reported once and never retried.

use crate::{
    domain::{
        position::{insert_before, move_within, renumber},
        Board, BoardId, CardId, List,
    },
    drag::{
        CardDragSession, CardHoverTarget, DragTracker, FinishedDrag, ListDragSession,
        ListHoverTarget,
    },
    error::{Result, TrellisError},
    gateway::{BoardGateway, CardReorder, ListOrder},
    navigator::Navigator,
    notify::{Notification, Notifier},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A card move applied locally and awaiting the server
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCardMove {
    pub board_id: BoardId,
    pub card_id: CardId,
    pub request: CardReorder,
    snapshot: Board,
}

impl PendingCardMove {
    /// The board as it was before the drop
    pub fn snapshot(&self) -> &Board {
        &self.snapshot
    }
}

/// A list move applied locally and awaiting the server
#[derive(Debug, Clone, PartialEq)]
pub struct PendingListMove {
    pub board_id: BoardId,
    pub order: ListOrder,
    snapshot: Vec<List>,
}

impl PendingListMove {
    /// The list sequence as it was before the drop
    pub fn snapshot(&self) -> &[List] {
        &self.snapshot
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PendingReorder {
    Card(PendingCardMove),
    List(PendingListMove),
}

/// A pending reorder together with the server's answer
#[derive(Debug)]
pub struct ReorderOutcome {
    pub pending: PendingReorder,
    pub result: Result<()>,
}

/// How a finished gesture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped outside any target, or back onto its origin slot
    NoOp,
    /// A guard rejected the drop; nothing was changed
    Aborted,
    Committed,
    RolledBack,
}

/// Moves a card within or across lists of `board`.
///
/// The hover index means "insert before", applied after the card has been
/// taken out of its origin list. The destination list is renumbered, and
/// the origin list too when it differs.
pub fn move_card(
    board: &mut Board,
    session: &CardDragSession,
    target: &CardHoverTarget,
) -> Result<()> {
    let mut moved = board.clone();

    let origin = moved
        .list_mut(&session.origin_list_id)
        .ok_or_else(|| TrellisError::ListNotFound(session.origin_list_id.to_string()))?;
    let index = origin
        .card_index(&session.card_id)
        .ok_or_else(|| TrellisError::CardNotFound(session.card_id.to_string()))?;
    let card = origin.cards.remove(index);

    let destination = moved
        .list_mut(&target.list_id)
        .ok_or_else(|| TrellisError::ListNotFound(target.list_id.to_string()))?;
    insert_before(&mut destination.cards, target.index, card);
    renumber(&mut destination.cards);

    if session.origin_list_id != target.list_id {
        if let Some(origin) = moved.list_mut(&session.origin_list_id) {
            renumber(&mut origin.cards);
        }
    }

    *board = moved;
    Ok(())
}

/// Moves a list to the hover slot. Positions are left for the server to assign.
pub fn move_list(
    board: &mut Board,
    session: &ListDragSession,
    target: ListHoverTarget,
) -> Result<()> {
    let from = board
        .list_index(&session.list_id)
        .ok_or_else(|| TrellisError::ListNotFound(session.list_id.to_string()))?;
    move_within(&mut board.lists, from, target.index);
    Ok(())
}

pub struct Reconciler {
    gateway: Arc<dyn BoardGateway>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn BoardGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self { gateway, notifier }
    }

    /// Ends the active gesture and applies its result locally.
    ///
    /// Returns `Ok(None)` for a drop outside any target or onto the origin
    /// slot. Ending with no active gesture is an invariant violation.
    pub fn drop_gesture(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> Result<Option<PendingReorder>> {
        match tracker.end_drag() {
            Some(FinishedDrag::Card { session, hover }) => {
                Ok(self.apply_card_drop(navigator, session, hover)?.map(PendingReorder::Card))
            }
            Some(FinishedDrag::List { session, hover }) => {
                Ok(self.apply_list_drop(navigator, session, hover)?.map(PendingReorder::List))
            }
            None => Err(TrellisError::InvariantViolation(
                "drop without an active drag".to_string(),
            )),
        }
    }

    /// Card-only variant of [`Reconciler::drop_gesture`]
    pub fn drop_card(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> Result<Option<PendingCardMove>> {
        match tracker.end_drag() {
            Some(FinishedDrag::Card { session, hover }) => {
                self.apply_card_drop(navigator, session, hover)
            }
            Some(FinishedDrag::List { .. }) => Err(TrellisError::InvariantViolation(
                "card drop while a list drag was active".to_string(),
            )),
            None => Err(TrellisError::InvariantViolation(
                "card drop without an active card drag".to_string(),
            )),
        }
    }

    /// List-only variant of [`Reconciler::drop_gesture`]
    pub fn drop_list(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> Result<Option<PendingListMove>> {
        match tracker.end_drag() {
            Some(FinishedDrag::List { session, hover }) => {
                self.apply_list_drop(navigator, session, hover)
            }
            Some(FinishedDrag::Card { .. }) => Err(TrellisError::InvariantViolation(
                "list drop while a card drag was active".to_string(),
            )),
            None => Err(TrellisError::InvariantViolation(
                "list drop without an active list drag".to_string(),
            )),
        }
    }

    fn apply_card_drop(
        &self,
        navigator: &mut Navigator,
        session: CardDragSession,
        hover: Option<CardHoverTarget>,
    ) -> Result<Option<PendingCardMove>> {
        let Some(target) = hover else {
            return Ok(None);
        };
        if session.origin_list_id == target.list_id && session.origin_index == target.index {
            debug!(card = %session.card_id, "card dropped onto its origin slot");
            return Ok(None);
        }

        let snapshot = navigator
            .active_board()
            .ok_or(TrellisError::NoActiveBoard)?
            .clone();
        let mut moved = snapshot.clone();
        move_card(&mut moved, &session, &target)?;
        navigator.replace_active(moved);

        Ok(Some(PendingCardMove {
            board_id: snapshot.id.clone(),
            card_id: session.card_id,
            request: CardReorder {
                new_position: target.index,
                new_list_id: target.list_id,
            },
            snapshot,
        }))
    }

    fn apply_list_drop(
        &self,
        navigator: &mut Navigator,
        session: ListDragSession,
        hover: Option<ListHoverTarget>,
    ) -> Result<Option<PendingListMove>> {
        let Some(target) = hover else {
            return Ok(None);
        };
        if session.origin_index == target.index {
            debug!(list = %session.list_id, "list dropped onto its origin slot");
            return Ok(None);
        }

        let board = navigator.active_board().ok_or(TrellisError::NoActiveBoard)?;
        let snapshot = board.lists.clone();
        let mut moved = board.clone();
        move_list(&mut moved, &session, target)?;

        let pending = PendingListMove {
            board_id: moved.id.clone(),
            order: ListOrder {
                reordered_list_ids: moved.list_ids(),
            },
            snapshot,
        };
        navigator.replace_active(moved);
        Ok(Some(pending))
    }

    /// Sends the reorder request for a locally applied move
    #[instrument(skip_all)]
    pub async fn commit(&self, pending: PendingReorder) -> ReorderOutcome {
        let result = match &pending {
            PendingReorder::Card(card) => {
                debug!(
                    card = %card.card_id,
                    list = %card.request.new_list_id,
                    index = card.request.new_position,
                    "committing card reorder"
                );
                self.gateway.reorder_card(&card.card_id, &card.request).await
            }
            PendingReorder::List(list) => {
                debug!(board = %list.board_id, "committing list order");
                self.gateway.reorder_lists(&list.order).await
            }
        };
        ReorderOutcome { pending, result }
    }

    /// Confirms or rolls back a committed reorder, then re-synchronizes.
    ///
    /// The snapshot is restored only while the same board is still active.
    #[instrument(skip_all)]
    pub async fn settle(&self, navigator: &mut Navigator, outcome: ReorderOutcome) -> DropOutcome {
        let ReorderOutcome { pending, result } = outcome;
        let settled = match (result, pending) {
            (Ok(()), PendingReorder::Card(_)) => {
                info!("card reorder confirmed");
                self.notifier
                    .notify(Notification::success("Card reordered successfully!"));
                DropOutcome::Committed
            }
            (Ok(()), PendingReorder::List(_)) => {
                info!("list reorder confirmed");
                self.notifier
                    .notify(Notification::success("Lists reordered successfully!"));
                DropOutcome::Committed
            }
            (Err(err), PendingReorder::Card(card)) => {
                warn!(error = %err, card = %card.card_id, "card reorder failed, reverting");
                self.notifier
                    .notify(Notification::error("Failed to reorder card. Reverting."));
                navigator.replace_active(card.snapshot);
                DropOutcome::RolledBack
            }
            (Err(err), PendingReorder::List(list)) => {
                warn!(error = %err, board = %list.board_id, "list reorder failed, reverting");
                self.notifier
                    .notify(Notification::error("Failed to reorder lists. Reverting."));
                navigator.replace_active_lists(&list.board_id, list.snapshot);
                DropOutcome::RolledBack
            }
        };

        // Fetch failures are reported by the navigator; the outcome stands.
        let _ = navigator.refresh_active().await;
        settled
    }

    /// Runs the whole drop cycle for whichever gesture is active
    pub async fn finish_drag(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> DropOutcome {
        let pending = self.drop_gesture(tracker, navigator);
        self.complete(navigator, pending).await
    }

    /// Runs the whole drop cycle for a card gesture
    pub async fn finish_card_drag(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> DropOutcome {
        let pending = self
            .drop_card(tracker, navigator)
            .map(|p| p.map(PendingReorder::Card));
        self.complete(navigator, pending).await
    }

    /// Runs the whole drop cycle for a list gesture
    pub async fn finish_list_drag(
        &self,
        tracker: &mut DragTracker,
        navigator: &mut Navigator,
    ) -> DropOutcome {
        let pending = self
            .drop_list(tracker, navigator)
            .map(|p| p.map(PendingReorder::List));
        self.complete(navigator, pending).await
    }

    async fn complete(
        &self,
        navigator: &mut Navigator,
        pending: Result<Option<PendingReorder>>,
    ) -> DropOutcome {
        match pending {
            Ok(Some(pending)) => {
                let outcome = self.commit(pending).await;
                self.settle(navigator, outcome).await
            }
            Ok(None) => DropOutcome::NoOp,
            Err(err) => {
                debug!(error = %err, "drop aborted");
                DropOutcome::Aborted
            }
        }
    }
}
