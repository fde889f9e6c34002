//! One call per endpoint: build, execute, parse.
//!
//! `BoardApi` pairs a `BoardClient` with a `Transport`. It adds nothing to
//! either: no retries, no caching, no state between calls. Failures from the
//! transport or the server reach the caller unchanged.

use tracing::debug;

use crate::client::BoardClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{
    Board, Comment, Listing, NewComment, NewPost, NewsPost, PostDetail, PostQuery, PostSummary,
    PostUpdate, VoteOutcome, VoteType,
};

#[derive(Debug, Clone)]
pub struct BoardApi<T> {
    client: BoardClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl BoardApi<crate::transport::UreqTransport> {
    /// API bound to `BOARD_API_BASE` (or the localhost default) over `ureq`.
    pub fn from_env() -> Self {
        Self::new(
            BoardClient::from_config(&ClientConfig::from_env()),
            crate::transport::UreqTransport::new(),
        )
    }
}

impl<T: Transport> BoardApi<T> {
    pub fn new(client: BoardClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn with_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(BoardClient::from_config(config), transport)
    }

    pub fn client(&self) -> &BoardClient {
        &self.client
    }

    pub fn list_boards(&self) -> Result<Listing<Board>, ApiError> {
        let resp = self.send(self.client.build_list_boards())?;
        self.client.parse_list_boards(resp)
    }

    pub fn list_posts(&self, query: &PostQuery) -> Result<Listing<PostSummary>, ApiError> {
        let resp = self.send(self.client.build_list_posts(query)?)?;
        self.client.parse_list_posts(resp)
    }

    pub fn get_post(&self, id: u64) -> Result<PostDetail, ApiError> {
        let resp = self.send(self.client.build_get_post(id))?;
        self.client.parse_get_post(resp)
    }

    pub fn create_post(&self, input: &NewPost) -> Result<PostDetail, ApiError> {
        let resp = self.send(self.client.build_create_post(input)?)?;
        self.client.parse_create_post(resp)
    }

    pub fn update_post(&self, id: u64, input: &PostUpdate) -> Result<PostDetail, ApiError> {
        let resp = self.send(self.client.build_update_post(id, input)?)?;
        self.client.parse_update_post(resp)
    }

    pub fn delete_post(&self, id: u64, password: &str) -> Result<(), ApiError> {
        let resp = self.send(self.client.build_delete_post(id, password)?)?;
        self.client.parse_delete_post(resp)
    }

    pub fn vote_post(&self, id: u64, vote: VoteType) -> Result<VoteOutcome, ApiError> {
        let resp = self.send(self.client.build_vote_post(id, vote)?)?;
        self.client.parse_vote_post(resp)
    }

    pub fn create_comment(&self, post_id: u64, input: &NewComment) -> Result<Comment, ApiError> {
        let resp = self.send(self.client.build_create_comment(post_id, input)?)?;
        self.client.parse_create_comment(resp)
    }

    pub fn delete_comment(&self, id: u64, password: &str) -> Result<(), ApiError> {
        let resp = self.send(self.client.build_delete_comment(id, password)?)?;
        self.client.parse_delete_comment(resp)
    }

    pub fn create_news(&self, input: &NewsPost, admin_token: &str) -> Result<PostDetail, ApiError> {
        let resp = self.send(self.client.build_create_news(input, admin_token)?)?;
        self.client.parse_create_news(resp)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        match self.transport.execute(request) {
            Ok(resp) => {
                debug!(%method, %url, status = resp.status, "board api call");
                Ok(resp)
            }
            Err(e) => {
                debug!(%method, %url, error = %e, "board api call failed");
                Err(e)
            }
        }
    }
}
