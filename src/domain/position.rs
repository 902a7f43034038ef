use serde::{Deserialize, Deserializer};

/// Siblings that carry an ordering position within their parent
pub trait Positioned {
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

/// Assigns `position = index` to every element, preserving sequence order.
///
/// Renumbering is total: after this call stored positions have no gaps and
/// no duplicates, and match presentation order exactly.
///
/// # Examples
/// ```
/// use trellis_core::domain::position::{renumber, Positioned};
/// use trellis_core::domain::{Card, CardId};
///
/// let mut cards = vec![
///     Card::new(CardId::new("a"), "A".to_string()).at_position(7),
///     Card::new(CardId::new("b"), "B".to_string()).at_position(3),
/// ];
///
/// renumber(&mut cards);
/// assert_eq!(cards[0].position(), 0);
/// assert_eq!(cards[1].position(), 1);
/// ```
pub fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index as i64);
    }
}

/// Sorts siblings for display by ascending position.
///
/// The sort is stable, so equal positions keep their arrival order.
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.position());
}

/// Inserts `item` before the element currently at `index`.
///
/// An index at or past the end appends. Returns the index the item landed at.
pub fn insert_before<T>(items: &mut Vec<T>, index: usize, item: T) -> usize {
    let at = index.min(items.len());
    items.insert(at, item);
    at
}

/// Moves the element at `from` so it is inserted before `to` in the
/// sequence that remains after its removal.
///
/// Returns `None` when `from` is out of range.
pub fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> Option<usize> {
    if from >= items.len() {
        return None;
    }
    let item = items.remove(from);
    Some(insert_before(items, to, item))
}

/// Reads a position that may be missing or `null` in legacy data as `0`
pub(crate) fn position_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
