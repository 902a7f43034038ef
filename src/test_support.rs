//! Shared fixtures for navigator and reconciler tests.

use crate::{
    domain::{Board, BoardId, BoardSummary, Card, CardId, List, ListId},
    drag::DragTracker,
    error::{Result, TrellisError},
    gateway::{memory::MemoryGateway, BoardGateway, CardReorder, CardUpdate, ListOrder, NewCard},
    navigator::Navigator,
    notify::{ChannelNotifier, Notification},
    reconciler::Reconciler,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Memory gateway that counts calls and can be told to fail
#[derive(Debug)]
pub struct RecordingGateway {
    inner: MemoryGateway,
    fetches: Mutex<HashMap<BoardId, usize>>,
    card_reorders: Mutex<Vec<(CardId, CardReorder)>>,
    list_reorders: Mutex<Vec<ListOrder>>,
    fail_reorders: AtomicBool,
    fail_fetches: AtomicBool,
}

impl RecordingGateway {
    pub fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            fetches: Mutex::new(HashMap::new()),
            card_reorders: Mutex::new(Vec::new()),
            list_reorders: Mutex::new(Vec::new()),
            fail_reorders: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
        }
    }

    pub fn fail_reorders(&self, fail: bool) {
        self.fail_reorders.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self, id: &BoardId) -> usize {
        self.fetches.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn card_reorders(&self) -> Vec<(CardId, CardReorder)> {
        self.card_reorders.lock().unwrap().clone()
    }

    pub fn list_reorders(&self) -> Vec<ListOrder> {
        self.list_reorders.lock().unwrap().clone()
    }

    pub fn reset_counts(&self) {
        self.fetches.lock().unwrap().clear();
        self.card_reorders.lock().unwrap().clear();
        self.list_reorders.lock().unwrap().clear();
    }

    fn reorder_failure(&self) -> Result<()> {
        if self.fail_reorders.load(Ordering::SeqCst) {
            return Err(TrellisError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardGateway for RecordingGateway {
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        self.inner.login(username, password).await
    }

    async fn signup(&self, username: &str, password: &str) -> Result<String> {
        self.inner.signup(username, password).await
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        self.inner.list_boards().await
    }

    async fn fetch_board(&self, id: &BoardId) -> Result<Board> {
        *self.fetches.lock().unwrap().entry(id.clone()).or_default() += 1;
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(TrellisError::RemoteRejection {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        self.inner.fetch_board(id).await
    }

    async fn create_board(&self, name: &str) -> Result<BoardSummary> {
        self.inner.create_board(name).await
    }

    async fn reorder_card(&self, id: &CardId, reorder: &CardReorder) -> Result<()> {
        self.card_reorders
            .lock()
            .unwrap()
            .push((id.clone(), reorder.clone()));
        self.reorder_failure()?;
        self.inner.reorder_card(id, reorder).await
    }

    async fn reorder_lists(&self, order: &ListOrder) -> Result<()> {
        self.list_reorders.lock().unwrap().push(order.clone());
        self.reorder_failure()?;
        self.inner.reorder_lists(order).await
    }

    async fn create_list(&self, board: &BoardId, title: &str) -> Result<List> {
        self.inner.create_list(board, title).await
    }

    async fn rename_list(&self, id: &ListId, title: &str) -> Result<()> {
        self.inner.rename_list(id, title).await
    }

    async fn delete_list(&self, id: &ListId) -> Result<()> {
        self.inner.delete_list(id).await
    }

    async fn create_card(&self, list: &ListId, card: &NewCard) -> Result<Card> {
        self.inner.create_card(list, card).await
    }

    async fn update_card(&self, id: &CardId, update: &CardUpdate) -> Result<()> {
        self.inner.update_card(id, update).await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.inner.delete_card(id).await
    }
}

pub struct Harness {
    pub gateway: Arc<RecordingGateway>,
    pub navigator: Navigator,
    pub tracker: DragTracker,
    pub reconciler: Reconciler,
    notifications: UnboundedReceiver<Notification>,
}

impl Harness {
    /// Drains queued notifications
    pub fn notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            drained.push(n);
        }
        drained
    }

    /// Drains queued notifications, keeping only error messages
    pub fn errors(&mut self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(Notification::is_error)
            .map(|n| n.message)
            .collect()
    }

    /// Opens the board with the given title
    pub async fn open(&mut self, title: &str) -> Board {
        self.navigator.load_boards().await.unwrap();
        let id = self
            .navigator
            .boards()
            .iter()
            .find(|b| b.title == title)
            .unwrap()
            .id
            .clone();
        self.navigator.open_board(&id).await.unwrap();
        self.navigator.active_board().unwrap().clone()
    }
}

/// Navigator, tracker and reconciler over a seeded memory gateway
pub async fn harness() -> Harness {
    let gateway = Arc::new(RecordingGateway::new(
        MemoryGateway::with_default_boards().await,
    ));
    let (notifier, notifications) = ChannelNotifier::new();
    let notifier = Arc::new(notifier);
    Harness {
        navigator: Navigator::new(gateway.clone(), notifier.clone()),
        reconciler: Reconciler::new(gateway.clone(), notifier),
        tracker: DragTracker::new(),
        gateway,
        notifications,
    }
}
