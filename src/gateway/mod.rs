use crate::{
    domain::{Board, BoardId, BoardSummary, Card, CardId, CardKind, List, ListId},
    error::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "http-gateway")]
pub mod http;
pub mod memory;

/// Body of a card reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardReorder {
    pub new_position: usize,
    pub new_list_id: ListId,
}

/// Body of a list reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOrder {
    #[serde(rename = "reorderedListIds")]
    pub reordered_list_ids: Vec<ListId>,
}

/// Fields for a card being created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub title: String,
    #[serde(rename = "githubUrl")]
    pub github_url: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
}

/// Partial card update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "githubUrl", default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

/// Remote authority for boards, lists and cards
#[async_trait]
pub trait BoardGateway: Send + Sync {
    /// Exchanges credentials for a bearer token
    async fn login(&self, username: &str, password: &str) -> Result<String>;

    /// Registers a new user and returns its bearer token
    async fn signup(&self, username: &str, password: &str) -> Result<String>;

    /// Lists the boards of the authenticated user
    async fn list_boards(&self) -> Result<Vec<BoardSummary>>;

    /// Loads a board with its lists and cards, in no particular order
    async fn fetch_board(&self, id: &BoardId) -> Result<Board>;

    async fn create_board(&self, name: &str) -> Result<BoardSummary>;

    /// Persists a card's new list membership and position
    async fn reorder_card(&self, id: &CardId, reorder: &CardReorder) -> Result<()>;

    /// Persists the complete list order of a board
    async fn reorder_lists(&self, order: &ListOrder) -> Result<()>;

    async fn create_list(&self, board: &BoardId, title: &str) -> Result<List>;

    async fn rename_list(&self, id: &ListId, title: &str) -> Result<()>;

    /// Deletes a list and every card in it
    async fn delete_list(&self, id: &ListId) -> Result<()>;

    async fn create_card(&self, list: &ListId, card: &NewCard) -> Result<Card>;

    async fn update_card(&self, id: &CardId, update: &CardUpdate) -> Result<()>;

    async fn delete_card(&self, id: &CardId) -> Result<()>;
}
