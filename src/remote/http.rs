use crate::{
    config::SyncConfig,
    domain::{Board, CardId, ChatMessage, ChatResponse, ColumnId},
    error::{Result, SyncError},
    remote::{BoardApi, CardUpdate, ChatBody, CreateCardBody, MoveCardBody, RenameColumnBody},
    session::{CredentialVerifier, Session},
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// `BoardApi` over HTTP with a bearer credential taken from the session
#[derive(Clone)]
pub struct HttpBoardApi {
    api_url: String,
    client: Client,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    username: String,
}

impl HttpBoardApi {
    pub fn new(config: &SyncConfig, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| SyncError::Config(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            client,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        self.call_with(method, path, None::<&()>).await
    }

    async fn call_with<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let Some(token) = self.session.credential() else {
            return Err(SyncError::Unauthorized);
        };

        let mut request = self.request(method.clone(), path, Some(&token));
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, "sending request");
        let result = send_json(request).await;
        // a rejected credential only ends the session that still holds it
        if matches!(result, Err(SyncError::Unauthorized))
            && self.session.credential().as_deref() == Some(token.as_str())
        {
            self.session.invalidate();
        }
        result
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|error| SyncError::Transport(error.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| SyncError::Transport(format!("response read failed: {error}")))?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(SyncError::Unauthorized);
    }
    if !status.is_success() {
        return Err(SyncError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self) -> Result<Board> {
        self.call(Method::GET, "board").await
    }

    async fn rename_column(&self, column_id: ColumnId, title: &str) -> Result<Board> {
        let body = RenameColumnBody { title };
        self.call_with(Method::PUT, &format!("board/columns/{column_id}"), Some(&body))
            .await
    }

    async fn create_card(&self, column_id: ColumnId, title: &str, details: &str) -> Result<Board> {
        let body = CreateCardBody {
            column_id,
            title,
            details,
        };
        self.call_with(Method::POST, "board/cards", Some(&body)).await
    }

    async fn update_card(&self, card_id: CardId, update: &CardUpdate) -> Result<Board> {
        self.call_with(Method::PUT, &format!("board/cards/{card_id}"), Some(update))
            .await
    }

    async fn delete_card(&self, card_id: CardId) -> Result<Board> {
        self.call(Method::DELETE, &format!("board/cards/{card_id}"))
            .await
    }

    async fn move_card(&self, card_id: CardId, column_id: ColumnId, position: usize) -> Result<Board> {
        let body = MoveCardBody {
            column_id,
            position,
        };
        self.call_with(Method::PUT, &format!("board/cards/{card_id}/move"), Some(&body))
            .await
    }

    async fn send_chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatResponse> {
        let body = ChatBody { message, history };
        self.call_with(Method::POST, "chat", Some(&body)).await
    }
}

#[async_trait]
impl CredentialVerifier for HttpBoardApi {
    async fn whoami(&self, token: &str) -> Result<String> {
        let request = self.request(Method::GET, "auth/me", Some(token));
        let me: MeResponse = send_json(request).await?;
        Ok(me.username)
    }
}
