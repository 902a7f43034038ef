use crate::domain::{
    card::Card,
    ids::{BoardId, CardId, ListId},
    position::{position_or_zero, sort_by_position, Positioned},
};
use serde::{Deserialize, Serialize};

/// Title of the list whose cards count as finished work
const DONE_LIST_TITLE: &str = "done";

/// Board entry as returned by the board listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    #[serde(rename = "_id")]
    pub id: BoardId,
    #[serde(alias = "name", default)]
    pub title: String,
}

/// An ordered collection of cards within a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(rename = "_id")]
    pub id: ListId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "position_or_zero")]
    pub position: i64,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl List {
    pub fn new(id: ListId, title: String) -> Self {
        Self {
            id,
            title,
            position: 0,
            cards: Vec::new(),
        }
    }

    pub fn at_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    /// Index of a card in presentation order
    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Whether this list holds finished work for progress tracking
    pub fn is_done_list(&self) -> bool {
        self.title.trim().eq_ignore_ascii_case(DONE_LIST_TITLE)
    }
}

impl Positioned for List {
    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

/// A top-level board or sub-board with its lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: BoardId,
    #[serde(alias = "name", default)]
    pub title: String,
    #[serde(default)]
    pub lists: Vec<List>,
}

impl Board {
    pub fn new(id: BoardId, title: String) -> Self {
        Self {
            id,
            title,
            lists: Vec::new(),
        }
    }

    pub fn with_lists(mut self, lists: Vec<List>) -> Self {
        self.lists = lists;
        self
    }

    /// Puts lists, and cards within each list, into ascending position order
    pub fn sort_by_position(&mut self) {
        sort_by_position(&mut self.lists);
        for list in &mut self.lists {
            sort_by_position(&mut list.cards);
        }
    }

    /// Consumes the board and returns it in display order
    pub fn sorted(mut self) -> Self {
        self.sort_by_position();
        self
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    pub fn list(&self, id: &ListId) -> Option<&List> {
        self.lists.iter().find(|l| &l.id == id)
    }

    pub fn list_mut(&mut self, id: &ListId) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| &l.id == id)
    }

    pub fn list_index(&self, id: &ListId) -> Option<usize> {
        self.lists.iter().position(|l| &l.id == id)
    }

    /// List ids in presentation order
    pub fn list_ids(&self) -> Vec<ListId> {
        self.lists.iter().map(|l| l.id.clone()).collect()
    }

    /// Finds a card and the list that holds it
    pub fn find_card(&self, id: &CardId) -> Option<(&List, &Card)> {
        self.lists
            .iter()
            .find_map(|l| l.cards.iter().find(|c| &c.id == id).map(|c| (l, c)))
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(List::card_count).sum()
    }

    /// Percentage of cards sitting in a "Done" list, rounded down.
    ///
    /// A board with no cards is 0% complete.
    pub fn completion_percent(&self) -> u8 {
        let total = self.card_count();
        if total == 0 {
            return 0;
        }
        let done: usize = self
            .lists
            .iter()
            .filter(|l| l.is_done_list())
            .map(List::card_count)
            .sum();
        (done * 100 / total) as u8
    }
}
