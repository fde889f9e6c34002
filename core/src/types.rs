//! Wire DTOs for the board API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! of the mock-server crate; the integration tests catch schema drift between
//! the two. Field names are the server's (`board_type`, `vote_type`, ...) and
//! must not be renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A board as returned by `GET /boards/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub id: u64,
    pub name: String,
    pub board_type: String,
    #[serde(default)]
    pub description: String,
    pub post_count: u64,
}

/// A post row in the list endpoint. Carries no body text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostSummary {
    pub id: u64,
    pub board: u64,
    pub board_name: String,
    pub title: String,
    pub author_name: String,
    pub author_fingerprint: String,
    pub view_count: i64,
    pub comment_count: i64,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A full post with its comments, returned by get/create/update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDetail {
    pub id: u64,
    pub board: u64,
    pub board_name: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_fingerprint: String,
    pub view_count: i64,
    pub comment_count: i64,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub content: String,
    pub author_name: String,
    pub author_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Page-number pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

pub type PostPage = Page<PostSummary>;

/// Body of a list endpoint. The server answers with a bare JSON array, or
/// with a `Page` envelope when pagination is enabled; both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Page(Page<T>),
}

impl<T> Listing<T> {
    /// Items carried by this response (one page when paginated).
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Plain(items) => items,
            Listing::Page(page) => &page.results,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Plain(items) => items,
            Listing::Page(page) => page.results,
        }
    }

    /// Total across all pages; for a bare array, its length.
    pub fn total(&self) -> u64 {
        match self {
            Listing::Plain(items) => items.len() as u64,
            Listing::Page(page) => page.count,
        }
    }

    pub fn next(&self) -> Option<&str> {
        match self {
            Listing::Plain(_) => None,
            Listing::Page(page) => page.next.as_deref(),
        }
    }

    pub fn previous(&self) -> Option<&str> {
        match self {
            Listing::Plain(_) => None,
            Listing::Page(page) => page.previous.as_deref(),
        }
    }
}

/// Sort order accepted by the list endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    /// Newest first.
    #[default]
    Recent,
    /// Most upvoted first, newest breaking ties.
    Popular,
}

impl PostSort {
    pub fn as_str(self) -> &'static str {
        match self {
            PostSort::Recent => "recent",
            PostSort::Popular => "popular",
        }
    }
}

/// Query parameters of `GET /posts/`.
///
/// Serializes in wire order `board_type`, `page`, `sort`; `board_type` is
/// omitted entirely when unset or empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostQuery {
    #[serde(skip_serializing_if = "board_type_unset")]
    pub board_type: Option<String>,
    pub page: u32,
    pub sort: PostSort,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            board_type: None,
            page: 1,
            sort: PostSort::Recent,
        }
    }
}

fn board_type_unset(board_type: &Option<String>) -> bool {
    board_type.as_deref().map_or(true, str::is_empty)
}

impl PostQuery {
    pub fn board_type(mut self, board_type: impl Into<String>) -> Self {
        self.board_type = Some(board_type.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn sort(mut self, sort: PostSort) -> Self {
        self.sort = sort;
        self
    }
}

/// Request payload for creating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub board: u64,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub password: String,
}

/// Request payload for replacing a post's title and content. The password
/// must match the one the post was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub password: String,
}

/// Request payload for commenting on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
    pub author_name: String,
    pub password: String,
}

/// Request payload for an admin news post. Lands on the news board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPost {
    pub title: String,
    pub content: String,
    pub author_name: String,
}

/// Body of the password-authorized delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub password: String,
}

/// Up or down vote. Encoded on the wire as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn code(self) -> i8 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl TryFrom<i8> for VoteType {
    type Error = i8;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(VoteType::Up),
            -1 => Ok(VoteType::Down),
            other => Err(other),
        }
    }
}

/// Body of `POST /posts/{id}/vote/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub vote_type: i8,
}

impl From<VoteType> for VoteRequest {
    fn from(vote: VoteType) -> Self {
        Self {
            vote_type: vote.code(),
        }
    }
}

/// What a vote did to the caller's existing vote on the post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// First vote on this post.
    Voted,
    /// Switched from up to down or the reverse.
    Changed,
    /// Same vote sent twice; the earlier vote was withdrawn.
    Cancelled,
}

/// Response of the vote endpoint with the post's updated tallies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub upvote_count: i64,
    pub downvote_count: i64,
}
