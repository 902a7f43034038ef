//! HTTP implementation of [`BoardGateway`] against the board service REST API.

use crate::{
    config::GatewayConfig,
    domain::{Board, BoardId, BoardSummary, Card, CardId, List, ListId},
    error::{Result, TrellisError},
    gateway::{BoardGateway, CardReorder, CardUpdate, ListOrder, NewCard},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
    token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Builds the client. The configured token becomes the live bearer
    /// credential and is no longer kept in [`HttpGateway::config`].
    pub fn new(mut config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TrellisError::ConfigError(format!("failed to build HTTP client: {}", e))
            })?;
        let token = RwLock::new(config.token.take());
        Ok(Self {
            client,
            config,
            token,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The bearer credential sent with the next request
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replaces the bearer credential used for subsequent requests
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| TrellisError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<MessageBody>(&body)
                .map(|m| m.message)
                .unwrap_or(body),
            Err(_) => String::new(),
        };
        let message = if message.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            message
        };
        warn!(status = status.as_u16(), %message, "request rejected");
        Err(TrellisError::RemoteRejection {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<String> {
        let response = self
            .send(
                self.client
                    .post(self.url(path))
                    .json(&Credentials { username, password }),
            )
            .await?;
        let body: TokenBody = Self::decode(response).await?;
        self.set_token(Some(body.token.clone())).await;
        Ok(body.token)
    }
}

#[async_trait]
impl BoardGateway for HttpGateway {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        self.authenticate("/login", username, password).await
    }

    #[instrument(skip(self, password))]
    async fn signup(&self, username: &str, password: &str) -> Result<String> {
        self.authenticate("/signup", username, password).await
    }

    #[instrument(skip(self))]
    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let response = self.send(self.client.get(self.url("/boards"))).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(board = %id))]
    async fn fetch_board(&self, id: &BoardId) -> Result<Board> {
        // Cache bust: intermediaries must not serve a pre-reorder board.
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        let response = self
            .send(
                self.client
                    .get(self.url(&format!("/boards/{}", id)))
                    .query(&[("t", stamp.as_str())]),
            )
            .await?;
        let board: Board = Self::decode(response).await?;
        debug!(lists = board.lists.len(), "board fetched");
        Ok(board)
    }

    #[instrument(skip(self))]
    async fn create_board(&self, name: &str) -> Result<BoardSummary> {
        let response = self
            .send(self.client.post(self.url("/boards")).json(&NameBody { name }))
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(card = %id))]
    async fn reorder_card(&self, id: &CardId, reorder: &CardReorder) -> Result<()> {
        self.send(
            self.client
                .patch(self.url(&format!("/cards/{}/reorder", id)))
                .json(reorder),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(lists = order.reordered_list_ids.len()))]
    async fn reorder_lists(&self, order: &ListOrder) -> Result<()> {
        self.send(self.client.patch(self.url("/lists/reorder")).json(order))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_list(&self, board: &BoardId, title: &str) -> Result<List> {
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/boards/{}/lists", board)))
                    .json(&TitleBody { title }),
            )
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(list = %id))]
    async fn rename_list(&self, id: &ListId, title: &str) -> Result<()> {
        self.send(
            self.client
                .patch(self.url(&format!("/lists/{}", id)))
                .json(&TitleBody { title }),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(list = %id))]
    async fn delete_list(&self, id: &ListId) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/lists/{}", id))))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, card))]
    async fn create_card(&self, list: &ListId, card: &NewCard) -> Result<Card> {
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/lists/{}/cards", list)))
                    .json(card),
            )
            .await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, update), fields(card = %id))]
    async fn update_card(&self, id: &CardId, update: &CardUpdate) -> Result<()> {
        self.send(
            self.client
                .patch(self.url(&format!("/cards/{}", id)))
                .json(update),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(card = %id))]
    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("/cards/{}", id))))
            .await?;
        Ok(())
    }
}
