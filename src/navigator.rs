//! Which board is on screen, and keeping it in sync with the remote copy.
//!
//! The navigator is in exactly one [`ViewState`]. A sub-board is entered
//! only by opening a project card and always returns to its top-level
//! board. Every fetch replaces the whole in-memory board; nothing is
//! patched in place. Mutations made while a sub-board is open also refresh
//! the parent board, whose project card progress the server derives from
//! sub-board content.

use crate::{
    domain::{Board, BoardId, BoardSummary, Card, CardId, CardKind, List, ListId},
    error::{Result, TrellisError},
    gateway::{BoardGateway, CardUpdate, NewCard},
    notify::{Notification, Notifier},
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Lists with this title hold project cards
const PROJECTS_LIST_TITLE: &str = "Projects";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    BoardList,
    TopLevelBoard(Board),
    SubBoard { board: Board, parent: Board },
}

pub struct Navigator {
    gateway: Arc<dyn BoardGateway>,
    notifier: Arc<dyn Notifier>,
    boards: Vec<BoardSummary>,
    view: ViewState,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("boards", &self.boards)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl Navigator {
    pub fn new(gateway: Arc<dyn BoardGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            boards: Vec::new(),
            view: ViewState::BoardList,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn boards(&self) -> &[BoardSummary] {
        &self.boards
    }

    /// The board currently on screen
    pub fn active_board(&self) -> Option<&Board> {
        match &self.view {
            ViewState::BoardList => None,
            ViewState::TopLevelBoard(board) => Some(board),
            ViewState::SubBoard { board, .. } => Some(board),
        }
    }

    fn active_board_mut(&mut self) -> Option<&mut Board> {
        match &mut self.view {
            ViewState::BoardList => None,
            ViewState::TopLevelBoard(board) => Some(board),
            ViewState::SubBoard { board, .. } => Some(board),
        }
    }

    /// The top-level board behind an open sub-board
    pub fn parent_board(&self) -> Option<&Board> {
        match &self.view {
            ViewState::SubBoard { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn parent_board_id(&self) -> Option<&BoardId> {
        self.parent_board().map(|b| &b.id)
    }

    pub fn is_sub_board_active(&self) -> bool {
        matches!(self.view, ViewState::SubBoard { .. })
    }

    fn active_id(&self) -> Result<BoardId> {
        self.active_board()
            .map(|b| b.id.clone())
            .ok_or(TrellisError::NoActiveBoard)
    }

    /// Replaces the active board if `board` is still the one on screen.
    ///
    /// Returns false, leaving state untouched, when the view has moved on.
    pub(crate) fn replace_active(&mut self, board: Board) -> bool {
        match self.active_board_mut() {
            Some(active) if active.id == board.id => {
                *active = board;
                true
            }
            _ => false,
        }
    }

    /// Replaces the list sequence of the active board if it is `board_id`
    pub(crate) fn replace_active_lists(&mut self, board_id: &BoardId, lists: Vec<List>) -> bool {
        match self.active_board_mut() {
            Some(active) if &active.id == board_id => {
                active.lists = lists;
                true
            }
            _ => false,
        }
    }

    /// Installs a freshly fetched board into whichever slot shows it
    fn install(&mut self, board: Board) -> bool {
        match &mut self.view {
            ViewState::TopLevelBoard(active) if active.id == board.id => *active = board,
            ViewState::SubBoard { board: active, .. } if active.id == board.id => *active = board,
            ViewState::SubBoard { parent, .. } if parent.id == board.id => *parent = board,
            _ => {
                debug!(board = %board.id, "discarding fetch for a board no longer shown");
                return false;
            }
        }
        true
    }

    async fn fetch_sorted(&self, id: &BoardId) -> Result<Board> {
        Ok(self.gateway.fetch_board(id).await?.sorted())
    }

    fn report(&self, failure: &str, err: &TrellisError) {
        warn!(error = %err, "{}", failure);
        self.notifier.notify(Notification::error(failure));
    }

    #[instrument(skip(self))]
    pub async fn load_boards(&mut self) -> Result<&[BoardSummary]> {
        match self.gateway.list_boards().await {
            Ok(boards) => {
                self.boards = boards;
                Ok(&self.boards)
            }
            Err(err) => {
                self.report("Failed to fetch boards. Please try again.", &err);
                Err(err)
            }
        }
    }

    /// Shows a top-level board
    #[instrument(skip(self), fields(board = %id))]
    pub async fn open_board(&mut self, id: &BoardId) -> Result<()> {
        match self.fetch_sorted(id).await {
            Ok(board) => {
                self.view = ViewState::TopLevelBoard(board);
                Ok(())
            }
            Err(err) => {
                self.report("Failed to load board. Please try again.", &err);
                Err(err)
            }
        }
    }

    /// Activates a card; a project card with a sub-board opens that sub-board.
    ///
    /// Returns whether the view changed. Opening a project card inside a
    /// sub-board replaces the sub-board and keeps the same top-level parent.
    #[instrument(skip(self), fields(card = %card_id))]
    pub async fn open_card(&mut self, card_id: &CardId) -> Result<bool> {
        let sub_board_id = self
            .active_board()
            .ok_or(TrellisError::NoActiveBoard)?
            .find_card(card_id)
            .ok_or_else(|| TrellisError::CardNotFound(card_id.to_string()))?
            .1
            .sub_board()
            .cloned();
        let Some(sub_board_id) = sub_board_id else {
            return Ok(false);
        };

        let sub_board = match self.fetch_sorted(&sub_board_id).await {
            Ok(board) => board,
            Err(err) => {
                self.report("Failed to fetch project board. Please try again.", &err);
                return Err(err);
            }
        };

        let view = std::mem::replace(&mut self.view, ViewState::BoardList);
        self.view = match view {
            ViewState::TopLevelBoard(parent) | ViewState::SubBoard { parent, .. } => {
                ViewState::SubBoard {
                    board: sub_board,
                    parent,
                }
            }
            ViewState::BoardList => ViewState::BoardList,
        };
        Ok(true)
    }

    /// Leaves a sub-board for its top-level board
    pub fn back_to_board(&mut self) -> bool {
        let view = std::mem::replace(&mut self.view, ViewState::BoardList);
        match view {
            ViewState::SubBoard { parent, .. } => {
                self.view = ViewState::TopLevelBoard(parent);
                true
            }
            other => {
                self.view = other;
                false
            }
        }
    }

    pub fn back_to_boards(&mut self) {
        self.view = ViewState::BoardList;
    }

    /// Re-fetches the active board, and its parent when a sub-board is open.
    ///
    /// Every board is attempted; the first failure is returned.
    #[instrument(skip(self))]
    pub async fn refresh_active(&mut self) -> Result<()> {
        let mut targets = Vec::with_capacity(2);
        if let Some(active) = self.active_board() {
            targets.push(active.id.clone());
        }
        if let Some(parent) = self.parent_board_id() {
            targets.push(parent.clone());
        }

        let mut first_error = None;
        for id in targets {
            match self.fetch_sorted(&id).await {
                Ok(board) => {
                    self.install(board);
                }
                Err(err) => {
                    self.report("Failed to load board. Please try again.", &err);
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn finish_mutation<T>(
        &mut self,
        result: Result<T>,
        success: &str,
        failure: &str,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.notifier.notify(Notification::success(success));
                // Refresh failures are reported on their own; the write stands.
                let _ = self.refresh_active().await;
                Ok(value)
            }
            Err(err) => {
                self.report(failure, &err);
                Err(err)
            }
        }
    }

    pub async fn add_board(&mut self, name: &str) -> Result<BoardSummary> {
        let result = self.gateway.create_board(name.trim()).await;
        match result {
            Ok(summary) => {
                self.notifier.notify(Notification::success("Board added successfully!"));
                let _ = self.load_boards().await;
                Ok(summary)
            }
            Err(err) => {
                self.report("Failed to add board. Please try again.", &err);
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn add_list(&mut self, title: &str) -> Result<List> {
        let board = self.active_id()?;
        let result = self.gateway.create_list(&board, title.trim()).await;
        self.finish_mutation(
            result,
            "List added successfully!",
            "Failed to add list. Please try again.",
        )
        .await
    }

    #[instrument(skip(self), fields(list = %list_id))]
    pub async fn rename_list(&mut self, list_id: &ListId, title: &str) -> Result<()> {
        self.active_id()?;
        let result = self.gateway.rename_list(list_id, title.trim()).await;
        self.finish_mutation(
            result,
            "List renamed successfully!",
            "Failed to rename list. Please try again.",
        )
        .await
    }

    #[instrument(skip(self), fields(list = %list_id))]
    pub async fn delete_list(&mut self, list_id: &ListId) -> Result<()> {
        self.active_id()?;
        let result = self.gateway.delete_list(list_id).await;
        self.finish_mutation(
            result,
            "List deleted successfully!",
            "Failed to delete list. Please try again.",
        )
        .await
    }

    /// Adds a card to a list of the active board.
    ///
    /// Cards added to the "Projects" list become project cards and keep the
    /// GitHub URL; elsewhere the URL is dropped.
    #[instrument(skip(self), fields(list = %list_id))]
    pub async fn add_card(
        &mut self,
        list_id: &ListId,
        title: &str,
        github_url: Option<&str>,
    ) -> Result<Card> {
        let list_title = self
            .active_board()
            .ok_or(TrellisError::NoActiveBoard)?
            .list(list_id)
            .ok_or_else(|| TrellisError::ListNotFound(list_id.to_string()))?
            .title
            .clone();

        let card = if list_title == PROJECTS_LIST_TITLE {
            NewCard {
                title: title.trim().to_string(),
                github_url: github_url.unwrap_or_default().trim().to_string(),
                kind: CardKind::ProjectCard,
            }
        } else {
            NewCard {
                title: title.trim().to_string(),
                github_url: String::new(),
                kind: CardKind::Card,
            }
        };

        let result = self.gateway.create_card(list_id, &card).await;
        self.finish_mutation(
            result,
            "Card added successfully!",
            "Failed to add card. Please try again.",
        )
        .await
    }

    #[instrument(skip(self, update), fields(card = %card_id))]
    pub async fn update_card(&mut self, card_id: &CardId, update: CardUpdate) -> Result<()> {
        if let Some(progress) = update.progress {
            if progress > 100 {
                return Err(TrellisError::InvalidProgress(progress));
            }
        }
        self.active_id()?;
        let result = self.gateway.update_card(card_id, &update).await;
        self.finish_mutation(
            result,
            "Card updated successfully!",
            "Failed to update card. Please try again.",
        )
        .await
    }

    #[instrument(skip(self), fields(card = %card_id))]
    pub async fn delete_card(&mut self, card_id: &CardId) -> Result<()> {
        self.active_id()?;
        let result = self.gateway.delete_card(card_id).await;
        self.finish_mutation(
            result,
            "Card deleted successfully!",
            "Failed to delete card. Please try again.",
        )
        .await
    }
}
