use crate::{
    domain::{
        position::{renumber, sort_by_position},
        Board, BoardId, BoardSummary, Card, CardId, CardKind, List, ListId,
    },
    error::{Result, TrellisError},
    gateway::{BoardGateway, CardReorder, CardUpdate, ListOrder, NewCard},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

const SUB_BOARD_LISTS: [&str; 3] = ["To Do", "In Progress", "Done"];

#[derive(Debug)]
struct StoredBoard {
    id: BoardId,
    title: String,
    /// Created for a project card; never part of the board listing
    sub_board: bool,
}

#[derive(Debug)]
struct StoredList {
    board_id: BoardId,
    list: List,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, String>,
    boards: Vec<StoredBoard>,
    lists: Vec<StoredList>,
}

fn rejection(status: u16, message: impl Into<String>) -> TrellisError {
    TrellisError::RemoteRejection {
        status,
        message: message.into(),
    }
}

impl State {
    fn board_exists(&self, id: &BoardId) -> bool {
        self.boards.iter().any(|b| &b.id == id)
    }

    fn list_mut(&mut self, id: &ListId) -> Result<&mut StoredList> {
        self.lists
            .iter_mut()
            .find(|s| &s.list.id == id)
            .ok_or_else(|| rejection(404, "List not found"))
    }

    fn locate_card(&self, id: &CardId) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(li, s)| {
            s.list.card_index(id).map(|ci| (li, ci))
        })
    }

    fn next_list_position(&self, board: &BoardId) -> i64 {
        self.lists
            .iter()
            .filter(|s| &s.board_id == board)
            .map(|s| s.list.position + 1)
            .max()
            .unwrap_or(0)
    }

    fn insert_board(&mut self, title: String, sub_board: bool) -> BoardId {
        let id = BoardId::generate();
        self.boards.push(StoredBoard {
            id: id.clone(),
            title,
            sub_board,
        });
        id
    }

    fn insert_list(&mut self, board: &BoardId, title: &str) -> List {
        let list = List::new(ListId::generate(), title.to_string())
            .at_position(self.next_list_position(board));
        self.lists.push(StoredList {
            board_id: board.clone(),
            list: list.clone(),
        });
        list
    }

    fn insert_card(&mut self, list: &ListId, mut card: Card) -> Result<Card> {
        let stored = self.list_mut(list)?;
        card.position = stored
            .list
            .cards
            .iter()
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);
        stored.list.cards.push(card.clone());
        Ok(card)
    }

    fn create_sub_board(&mut self, project_title: &str) -> BoardId {
        let id = self.insert_board(format!("{} - Tasks", project_title), true);
        for title in SUB_BOARD_LISTS {
            self.insert_list(&id, title);
        }
        id
    }

    /// Assembles a board as the server returns it, lists in storage order
    fn assemble(&self, id: &BoardId) -> Option<Board> {
        let stored = self.boards.iter().find(|b| &b.id == id)?;
        let lists = self
            .lists
            .iter()
            .filter(|s| &s.board_id == id)
            .map(|s| s.list.clone())
            .collect();
        Some(Board::new(stored.id.clone(), stored.title.clone()).with_lists(lists))
    }
}

/// In-process board service with the same semantics as the remote API.
///
/// Holds a single workspace: every authenticated user sees the same boards.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway seeded with the default "Work" and "Personal" boards
    pub async fn with_default_boards() -> Self {
        let gateway = Self::new();
        {
            let mut state = gateway.state.lock().await;
            let work = state.insert_board("Work".to_string(), false);
            populate_work_board(&mut state, &work);
            let personal = state.insert_board("Personal".to_string(), false);
            populate_personal_board(&mut state, &personal);
        }
        gateway
    }

    /// Returns the stored board in display order, for inspection
    pub async fn snapshot(&self, id: &BoardId) -> Option<Board> {
        self.state.lock().await.assemble(id).map(Board::sorted)
    }
}

fn populate_work_board(state: &mut State, board: &BoardId) {
    let projects = state.insert_list(board, "Projects").id;
    for (title, url) in [
        ("Trello Clone", "https://github.com/example/trello-clone"),
        ("DevOps Pipeline", "https://github.com/example/devops-pipeline"),
    ] {
        let sub_board = state.create_sub_board(title);
        let card = Card::project(CardId::generate(), title.to_string(), sub_board)
            .with_github_url(url.to_string());
        let _ = state.insert_card(&projects, card);
    }
    for (title, cards) in [
        ("To Do", &["Write documentation"][..]),
        ("In Progress", &["Set up CI/CD"][..]),
        ("Done", &["Initial commit"][..]),
        ("Questions", &["Clarify backend API schema"][..]),
    ] {
        seed_list(state, board, title, cards);
    }
}

fn populate_personal_board(state: &mut State, board: &BoardId) {
    for (title, cards) in [
        ("To Do", &["Buy groceries", "Call mom"][..]),
        ("Grocery", &["Milk", "Bread", "Eggs"][..]),
        ("Calendar", &["Doctor appointment"][..]),
        ("Done", &[][..]),
    ] {
        seed_list(state, board, title, cards);
    }
}

fn seed_list(state: &mut State, board: &BoardId, title: &str, cards: &[&str]) {
    let list = state.insert_list(board, title).id;
    for card in cards {
        let _ = state.insert_card(&list, Card::new(CardId::generate(), card.to_string()));
    }
}

#[async_trait]
impl BoardGateway for MemoryGateway {
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let state = self.state.lock().await;
        let valid = state
            .users
            .get(username)
            .map_or(false, |stored| stored == password);
        if !valid {
            return Err(rejection(401, "Invalid username or password"));
        }
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn signup(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(rejection(400, "Username and password are required"));
        }
        let mut state = self.state.lock().await;
        if state.users.contains_key(username) {
            return Err(rejection(409, "User already exists"));
        }
        state.users.insert(username.to_string(), password.to_string());
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let state = self.state.lock().await;
        Ok(state
            .boards
            .iter()
            .filter(|b| !b.sub_board)
            .map(|b| BoardSummary {
                id: b.id.clone(),
                title: b.title.clone(),
            })
            .collect())
    }

    async fn fetch_board(&self, id: &BoardId) -> Result<Board> {
        let state = self.state.lock().await;
        let mut board = state
            .assemble(id)
            .ok_or_else(|| rejection(404, "Board not found"))?;
        for card in board.lists.iter_mut().flat_map(|l| l.cards.iter_mut()) {
            if let Some(sub_id) = card.sub_board() {
                let progress = state
                    .assemble(sub_id)
                    .map_or(0, |sub| sub.completion_percent());
                card.progress = Some(progress);
            }
        }
        Ok(board)
    }

    async fn create_board(&self, name: &str) -> Result<BoardSummary> {
        let name = name.trim();
        if name.is_empty() {
            return Err(rejection(400, "Board name is required"));
        }
        let mut state = self.state.lock().await;
        let id = state.insert_board(name.to_string(), false);
        if name.eq_ignore_ascii_case("work") || name.eq_ignore_ascii_case("work board") {
            populate_work_board(&mut state, &id);
        }
        Ok(BoardSummary {
            id,
            title: name.to_string(),
        })
    }

    async fn reorder_card(&self, id: &CardId, reorder: &CardReorder) -> Result<()> {
        let mut state = self.state.lock().await;
        let (origin, index) = state
            .locate_card(id)
            .ok_or_else(|| rejection(404, "Card not found"))?;
        let target = state
            .lists
            .iter()
            .position(|s| s.list.id == reorder.new_list_id)
            .ok_or_else(|| rejection(404, "List not found"))?;

        let card = state.lists[origin].list.cards.remove(index);
        renumber(&mut state.lists[origin].list.cards);

        let cards = &mut state.lists[target].list.cards;
        sort_by_position(cards);
        let at = reorder.new_position.min(cards.len());
        cards.insert(at, card);
        renumber(cards);

        debug!(card = %id, list = %reorder.new_list_id, at, "card reordered");
        Ok(())
    }

    async fn reorder_lists(&self, order: &ListOrder) -> Result<()> {
        let mut state = self.state.lock().await;
        if order.reordered_list_ids.is_empty() {
            return Err(rejection(400, "reorderedListIds (list) required"));
        }
        for id in &order.reordered_list_ids {
            if !state.lists.iter().any(|s| &s.list.id == id) {
                return Err(rejection(403, format!("Unauthorized or missing list: {}", id)));
            }
        }
        for (index, id) in order.reordered_list_ids.iter().enumerate() {
            state.list_mut(id)?.list.position = index as i64;
        }
        Ok(())
    }

    async fn create_list(&self, board: &BoardId, title: &str) -> Result<List> {
        let title = title.trim();
        if title.is_empty() {
            return Err(rejection(400, "List title is required"));
        }
        let mut state = self.state.lock().await;
        if !state.board_exists(board) {
            return Err(rejection(404, "Board not found"));
        }
        Ok(state.insert_list(board, title))
    }

    async fn rename_list(&self, id: &ListId, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(rejection(400, "New title is required"));
        }
        let mut state = self.state.lock().await;
        state.list_mut(id)?.list.title = title.trim().to_string();
        Ok(())
    }

    async fn delete_list(&self, id: &ListId) -> Result<()> {
        let mut state = self.state.lock().await;
        let before = state.lists.len();
        state.lists.retain(|s| &s.list.id != id);
        if state.lists.len() == before {
            return Err(rejection(404, "List not found"));
        }
        Ok(())
    }

    async fn create_card(&self, list: &ListId, card: &NewCard) -> Result<Card> {
        let title = card.title.trim();
        if title.is_empty() && card.kind != CardKind::ProjectCard {
            return Err(rejection(400, "Card title is required for this type"));
        }
        let mut state = self.state.lock().await;
        state.list_mut(list)?;

        let new_card = match card.kind {
            CardKind::ProjectCard => {
                let sub_board = state.create_sub_board(title);
                let mut created = Card::project(CardId::generate(), title.to_string(), sub_board);
                if !card.github_url.is_empty() {
                    created.github_url = Some(card.github_url.clone());
                }
                created
            }
            CardKind::Card => Card::new(CardId::generate(), title.to_string()),
        };
        state.insert_card(list, new_card)
    }

    async fn update_card(&self, id: &CardId, update: &CardUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let (li, ci) = state
            .locate_card(id)
            .ok_or_else(|| rejection(404, "Card not found"))?;
        let card = &mut state.lists[li].list.cards[ci];
        if let Some(title) = &update.title {
            card.title = title.clone();
        }
        if let Some(url) = &update.github_url {
            card.github_url = Some(url.clone());
        }
        if let Some(progress) = update.progress {
            card.progress = Some(progress);
        }
        Ok(())
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        let mut state = self.state.lock().await;
        let (li, ci) = state
            .locate_card(id)
            .ok_or_else(|| rejection(404, "Card not found"))?;
        state.lists[li].list.cards.remove(ci);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn board_named(gateway: &MemoryGateway, title: &str) -> Board {
        let summary = gateway
            .list_boards()
            .await
            .unwrap()
            .into_iter()
            .find(|b| b.title == title)
            .unwrap();
        gateway.fetch_board(&summary.id).await.unwrap().sorted()
    }

    fn titles(list: &List) -> Vec<&str> {
        list.cards.iter().map(|c| c.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_default_boards_hide_sub_boards() {
        let gateway = MemoryGateway::with_default_boards().await;

        let boards = gateway.list_boards().await.unwrap();
        let names: Vec<_> = boards.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(names, vec!["Work", "Personal"]);

        let work = board_named(&gateway, "Work").await;
        let list_titles: Vec<_> = work.lists.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(
            list_titles,
            vec!["Projects", "To Do", "In Progress", "Done", "Questions"]
        );
        assert!(work.lists[0].cards.iter().all(Card::is_project));
    }

    #[tokio::test]
    async fn test_sub_boards_stay_hidden_after_project_removal() {
        let gateway = MemoryGateway::with_default_boards().await;
        let work = board_named(&gateway, "Work").await;
        let projects = &work.lists[0];

        gateway.delete_card(&projects.cards[0].id).await.unwrap();
        gateway.delete_list(&projects.id).await.unwrap();

        let boards = gateway.list_boards().await.unwrap();
        let names: Vec<_> = boards.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(names, vec!["Work", "Personal"]);
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let gateway = MemoryGateway::new();
        let token = gateway.signup("ada", "secret").await.unwrap();
        assert!(!token.is_empty());

        let session = gateway.login("ada", "secret").await.unwrap();
        assert_ne!(session, token);
        let err = gateway.login("ada", "wrong").await.unwrap_err();
        assert!(matches!(err, TrellisError::RemoteRejection { status: 401, .. }));
        assert!(gateway.signup("ada", "again").await.is_err());
    }

    #[tokio::test]
    async fn test_reorder_card_across_lists_renumbers_both() {
        let gateway = MemoryGateway::with_default_boards().await;
        let personal = board_named(&gateway, "Personal").await;
        let todo = &personal.lists[0];
        let grocery = &personal.lists[1];
        let call_mom = todo.cards[1].id.clone();

        gateway
            .reorder_card(
                &call_mom,
                &CardReorder {
                    new_position: 1,
                    new_list_id: grocery.id.clone(),
                },
            )
            .await
            .unwrap();

        let after = gateway.snapshot(&personal.id).await.unwrap();
        assert_eq!(titles(&after.lists[0]), vec!["Buy groceries"]);
        assert_eq!(titles(&after.lists[1]), vec!["Milk", "Call mom", "Bread", "Eggs"]);
        let positions: Vec<_> = after.lists[1].cards.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reorder_card_clamps_position() {
        let gateway = MemoryGateway::with_default_boards().await;
        let personal = board_named(&gateway, "Personal").await;
        let milk = personal.lists[1].cards[0].id.clone();

        gateway
            .reorder_card(
                &milk,
                &CardReorder {
                    new_position: 99,
                    new_list_id: personal.lists[1].id.clone(),
                },
            )
            .await
            .unwrap();

        let after = gateway.snapshot(&personal.id).await.unwrap();
        assert_eq!(titles(&after.lists[1]), vec!["Bread", "Eggs", "Milk"]);
    }

    #[tokio::test]
    async fn test_reorder_lists_rejects_unknown_ids() {
        let gateway = MemoryGateway::with_default_boards().await;
        let personal = board_named(&gateway, "Personal").await;
        let mut ids = personal.list_ids();
        ids.push(ListId::new("ghost"));

        let err = gateway
            .reorder_lists(&ListOrder {
                reordered_list_ids: ids,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TrellisError::RemoteRejection { status: 403, .. }));

        let unchanged = gateway.snapshot(&personal.id).await.unwrap();
        assert_eq!(unchanged.list_ids(), personal.list_ids());
    }

    #[tokio::test]
    async fn test_project_progress_follows_sub_board() {
        let gateway = MemoryGateway::with_default_boards().await;
        let work = board_named(&gateway, "Work").await;
        let project = &work.lists[0].cards[0];
        let sub_id = project.sub_board().unwrap().clone();
        assert_eq!(project.progress, Some(0));

        let sub = gateway.fetch_board(&sub_id).await.unwrap().sorted();
        assert_eq!(sub.title, "Trello Clone - Tasks");
        let todo = sub.lists[0].id.clone();
        let done = sub.lists[2].id.clone();
        let kind = CardKind::Card;
        for title in ["a", "b", "c", "d"] {
            gateway
                .create_card(
                    &todo,
                    &NewCard {
                        title: title.to_string(),
                        github_url: String::new(),
                        kind,
                    },
                )
                .await
                .unwrap();
        }
        let first = gateway.snapshot(&sub_id).await.unwrap().lists[0].cards[0].id.clone();
        gateway
            .reorder_card(
                &first,
                &CardReorder {
                    new_position: 0,
                    new_list_id: done,
                },
            )
            .await
            .unwrap();

        let work = board_named(&gateway, "Work").await;
        assert_eq!(work.lists[0].cards[0].progress, Some(25));
    }

    #[tokio::test]
    async fn test_list_and_card_crud() {
        let gateway = MemoryGateway::new();
        let board = gateway.create_board("Side").await.unwrap();

        let first = gateway.create_list(&board.id, "One").await.unwrap();
        let second = gateway.create_list(&board.id, " Two ").await.unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert_eq!(second.title, "Two");

        let card = gateway
            .create_card(
                &first.id,
                &NewCard {
                    title: "Task".to_string(),
                    github_url: String::new(),
                    kind: CardKind::Card,
                },
            )
            .await
            .unwrap();
        gateway
            .update_card(
                &card.id,
                &CardUpdate {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        gateway.rename_list(&second.id, "Later").await.unwrap();

        let snapshot = gateway.snapshot(&board.id).await.unwrap();
        assert_eq!(snapshot.lists[0].cards[0].title, "Renamed");
        assert_eq!(snapshot.lists[1].title, "Later");

        gateway.delete_list(&first.id).await.unwrap();
        assert!(gateway.delete_card(&card.id).await.is_err());
        assert!(gateway.rename_list(&second.id, "  ").await.is_err());
    }
}
