pub mod board;
pub mod card;
pub mod ids;
pub mod position;

pub use board::{Board, BoardSummary, List};
pub use card::{Card, CardKind};
pub use ids::{BoardId, CardId, ListId};
pub use position::{renumber, sort_by_position, Positioned};
