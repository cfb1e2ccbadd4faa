//! JSON-over-WebSocket client for the shared `rankings` table
//!
//! Each call opens a connection authenticated with the API key, sends one
//! request frame and waits for one response frame, bounded by the configured
//! timeout.

use super::entry::{NewScore, ScoreEntry};
use super::remote::{RemoteTableProvider, TableOrder, TableQuery};
use crate::category::Category;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

const TABLE: &str = "rankings";

/// Row as stored remotely
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteRow {
    #[serde(default)]
    id: serde_json::Value,
    player_name: String,
    score: u32,
    game_type: String,
    created_at: DateTime<Utc>,
}

impl RemoteRow {
    fn into_entry(self) -> Result<ScoreEntry, RemoteError> {
        let category = Category::from_game_type(&self.game_type)
            .ok_or_else(|| RemoteError::Protocol(format!("unknown game_type {}", self.game_type)))?;
        let id = match self.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(ScoreEntry {
            id,
            player_name: self.player_name,
            score: self.score,
            category,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    player_name: &'a str,
    score: u32,
    game_type: &'static str,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Filter<'a> {
    game_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    player_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at_gte: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct OrderTerm {
    column: &'static str,
    ascending: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Insert {
        table: &'static str,
        row: InsertRow<'a>,
    },
    Select {
        table: &'static str,
        filter: Filter<'a>,
        order: Vec<OrderTerm>,
        limit: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response {
    Ok {
        #[serde(default)]
        rows: Vec<RemoteRow>,
    },
    Error {
        code: u16,
        message: String,
    },
}

fn order_terms(order: TableOrder) -> Vec<OrderTerm> {
    match order {
        TableOrder::ScoreDesc => vec![
            OrderTerm {
                column: "score",
                ascending: false,
            },
            OrderTerm {
                column: "created_at",
                ascending: true,
            },
        ],
        TableOrder::NewestFirst => vec![OrderTerm {
            column: "created_at",
            ascending: false,
        }],
    }
}

fn status_error(code: u16, message: String) -> RemoteError {
    match code {
        401 | 403 => RemoteError::Auth(message),
        _ => RemoteError::Protocol(format!("{}: {}", code, message)),
    }
}

fn ws_error(err: WsError) -> RemoteError {
    match err {
        WsError::Http(response) => {
            let code = response.status().as_u16();
            status_error(code, response.status().to_string())
        }
        other => RemoteError::Network(other.to_string()),
    }
}

pub struct WsTable {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl WsTable {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn call(&self, request: &Request<'_>) -> Result<Vec<RemoteRow>, RemoteError> {
        let secs = self.timeout.as_secs();
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| RemoteError::Timeout(secs))?
    }

    async fn exchange(&self, request: &Request<'_>) -> Result<Vec<RemoteRow>, RemoteError> {
        let mut ws_request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(ws_error)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| RemoteError::Auth(e.to_string()))?;
        ws_request.headers_mut().insert(AUTHORIZATION, bearer);

        let (mut stream, _) = connect_async(ws_request).await.map_err(ws_error)?;

        let json = serde_json::to_string(request).map_err(|e| RemoteError::Protocol(e.to_string()))?;
        debug!(endpoint = %self.endpoint, bytes = json.len(), "remote request");
        stream.send(Message::Text(json)).await.map_err(ws_error)?;

        let reply = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(Message::Binary(bytes))) => {
                    break String::from_utf8(bytes).map_err(|e| RemoteError::Protocol(e.to_string()))?
                }
                Some(Ok(Message::Ping(data))) => stream.send(Message::Pong(data)).await.map_err(ws_error)?,
                Some(Ok(Message::Close(_))) | None => {
                    return Err(RemoteError::Network("connection closed before reply".into()))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ws_error(e)),
            }
        };
        // Best effort; the reply is already in hand
        let _ = stream.close(None).await;

        match serde_json::from_str::<Response>(&reply) {
            Ok(Response::Ok { rows }) => Ok(rows),
            Ok(Response::Error { code, message }) => Err(status_error(code, message)),
            Err(e) => Err(RemoteError::Protocol(e.to_string())),
        }
    }
}

#[async_trait]
impl RemoteTableProvider for WsTable {
    async fn insert(&self, score: NewScore) -> Result<ScoreEntry, RemoteError> {
        let request = Request::Insert {
            table: TABLE,
            row: InsertRow {
                player_name: score.player_name.as_str(),
                score: score.score,
                game_type: score.category.game_type(),
                created_at: score.created_at,
            },
        };
        let rows = self.call(&request).await?;
        match rows.into_iter().next() {
            Some(row) => row.into_entry(),
            // Servers that do not echo the row still stored it
            None => Ok(ScoreEntry::from_new(&score)),
        }
    }

    async fn select(&self, query: TableQuery) -> Result<Vec<ScoreEntry>, RemoteError> {
        let request = Request::Select {
            table: TABLE,
            filter: Filter {
                game_type: query.category.game_type(),
                player_name: query.player_name.as_deref(),
                created_at_gte: query.since,
            },
            order: order_terms(query.order),
            limit: query.limit,
        };
        let rows = self.call(&request).await?;
        rows.into_iter()
            .map(RemoteRow::into_entry)
            .take(query.limit)
            .collect()
    }

    fn name(&self) -> &'static str {
        "Remote"
    }
}
