use crate::domain::{
    ids::{BoardId, CardId},
    position::{position_or_zero, Positioned},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of card shown in a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardKind {
    #[default]
    Card,
    /// A card that links to a nested sub-board
    ProjectCard,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::ProjectCard => "project-card",
        }
    }
}

// Tags this client does not model (e.g. `github-repo`) are shown as plain cards.
impl From<String> for CardKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "project-card" => Self::ProjectCard,
            _ => Self::Card,
        }
    }
}

impl From<CardKind> for String {
    fn from(kind: CardKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card within a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: CardId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "position_or_zero")]
    pub position: i64,
    #[serde(rename = "type", default)]
    pub kind: CardKind,
    #[serde(
        rename = "githubUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(
        rename = "subBoardId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_board_id: Option<BoardId>,
}

impl Card {
    /// Creates a plain card at position 0
    pub fn new(id: CardId, title: String) -> Self {
        Self {
            id,
            title,
            position: 0,
            kind: CardKind::Card,
            github_url: None,
            progress: None,
            sub_board_id: None,
        }
    }

    /// Creates a project card linked to `sub_board`
    pub fn project(id: CardId, title: String, sub_board: BoardId) -> Self {
        Self {
            kind: CardKind::ProjectCard,
            progress: Some(0),
            sub_board_id: Some(sub_board),
            ..Self::new(id, title)
        }
    }

    pub fn at_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn with_github_url(mut self, url: String) -> Self {
        self.github_url = Some(url);
        self
    }

    pub fn is_project(&self) -> bool {
        self.kind == CardKind::ProjectCard
    }

    /// The sub-board this card opens, if it is a project card that has one
    pub fn sub_board(&self) -> Option<&BoardId> {
        if self.is_project() {
            self.sub_board_id.as_ref()
        } else {
            None
        }
    }
}

impl Positioned for Card {
    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}
