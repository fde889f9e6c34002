//! In-memory stand-in for the board service's REST API.
//!
//! Serves the routes the board client talks to under `/api`, with the same
//! JSON shapes and status codes, over a store seeded with the `free` and
//! `news` boards. Test fixture only: no persistence, no rate limiting.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

/// Posts per page of `GET /api/posts/`.
pub const PAGE_SIZE: usize = 20;

/// Admin token accepted by `app()`.
pub const DEFAULT_ADMIN_TOKEN: &str = "admin-token";

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const NEWS_BOARD: &str = "news";
const ADMIN_FINGERPRINT: &str = "admin";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    pub id: u64,
    pub name: String,
    pub board_type: String,
    pub description: String,
    pub post_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Serialize, Deserialize)]
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
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub content: String,
    pub author_name: String,
    pub author_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<PostSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub action: String,
    pub upvote_count: i64,
    pub downvote_count: i64,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub board: u64,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdatePost {
    pub title: String,
    pub content: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateComment {
    pub content: String,
    pub author_name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateNews {
    pub title: String,
    pub content: String,
    pub author_name: String,
}

#[derive(Deserialize)]
pub struct DeleteBody {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct VoteBody {
    pub vote_type: i8,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub board_type: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
}

struct StoredBoard {
    id: u64,
    name: String,
    board_type: String,
    description: String,
}

struct StoredPost {
    id: u64,
    board_id: u64,
    title: String,
    content: String,
    author_name: String,
    password: String,
    author_fingerprint: String,
    view_count: i64,
    comment_count: i64,
    upvote_count: i64,
    downvote_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredComment {
    id: u64,
    post_id: u64,
    content: String,
    author_name: String,
    password: String,
    author_fingerprint: String,
    created_at: DateTime<Utc>,
}

/// All board data, guarded by one lock.
pub struct BoardDb {
    boards: Vec<StoredBoard>,
    posts: BTreeMap<u64, StoredPost>,
    comments: BTreeMap<u64, StoredComment>,
    votes: HashMap<(u64, String), i8>,
    next_post_id: u64,
    next_comment_id: u64,
}

impl BoardDb {
    /// Store holding the two stock boards and nothing else.
    pub fn seeded() -> Self {
        let boards = vec![
            StoredBoard {
                id: 1,
                name: "Free".to_string(),
                board_type: "free".to_string(),
                description: "Open discussion.".to_string(),
            },
            StoredBoard {
                id: 2,
                name: "News".to_string(),
                board_type: NEWS_BOARD.to_string(),
                description: "Announcements posted by administrators.".to_string(),
            },
        ];
        Self {
            boards,
            posts: BTreeMap::new(),
            comments: BTreeMap::new(),
            votes: HashMap::new(),
            next_post_id: 1,
            next_comment_id: 1,
        }
    }

    fn board(&self, id: u64) -> Option<&StoredBoard> {
        self.boards.iter().find(|b| b.id == id)
    }

    fn board_name(&self, id: u64) -> String {
        self.board(id).map(|b| b.name.clone()).unwrap_or_default()
    }

    fn insert_post(
        &mut self,
        board_id: u64,
        title: String,
        content: String,
        author_name: String,
        password: String,
        author_fingerprint: String,
    ) -> u64 {
        let id = self.next_post_id;
        self.next_post_id += 1;
        let now = Utc::now();
        self.posts.insert(
            id,
            StoredPost {
                id,
                board_id,
                title,
                content,
                author_name,
                password,
                author_fingerprint,
                view_count: 0,
                comment_count: 0,
                upvote_count: 0,
                downvote_count: 0,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn summary(&self, post: &StoredPost) -> PostSummary {
        PostSummary {
            id: post.id,
            board: post.board_id,
            board_name: self.board_name(post.board_id),
            title: post.title.clone(),
            author_name: post.author_name.clone(),
            author_fingerprint: post.author_fingerprint.clone(),
            view_count: post.view_count,
            comment_count: post.comment_count,
            upvote_count: post.upvote_count,
            downvote_count: post.downvote_count,
            created_at: post.created_at,
        }
    }

    fn detail(&self, id: u64) -> Option<PostDetail> {
        let post = self.posts.get(&id)?;
        let comments = self
            .comments
            .values()
            .filter(|c| c.post_id == id)
            .map(comment_view)
            .collect();
        Some(PostDetail {
            id: post.id,
            board: post.board_id,
            board_name: self.board_name(post.board_id),
            title: post.title.clone(),
            content: post.content.clone(),
            author_name: post.author_name.clone(),
            author_fingerprint: post.author_fingerprint.clone(),
            view_count: post.view_count,
            comment_count: post.comment_count,
            upvote_count: post.upvote_count,
            downvote_count: post.downvote_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            comments,
        })
    }
}

fn comment_view(c: &StoredComment) -> Comment {
    Comment {
        id: c.id,
        content: c.content.clone(),
        author_name: c.author_name.clone(),
        author_fingerprint: c.author_fingerprint.clone(),
        created_at: c.created_at,
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<BoardDb>>,
    admin_token: Arc<str>,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, "not found")
}

fn check_password_shape(password: &str) -> ApiResult<()> {
    if (4..=20).contains(&password.chars().count()) {
        Ok(())
    } else {
        Err(error(
            StatusCode::BAD_REQUEST,
            "password must be 4 to 20 characters",
        ))
    }
}

/// Voter identity: first `x-forwarded-for` hop, or `local`.
fn fingerprint(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

pub fn app() -> Router {
    app_with_token(DEFAULT_ADMIN_TOKEN)
}

pub fn app_with_token(admin_token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(BoardDb::seeded())),
        admin_token: Arc::from(admin_token),
    };
    Router::new()
        .route("/api/boards/", get(list_boards))
        .route("/api/posts/", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/vote/", post(vote_post))
        .route("/api/posts/{id}/comment/", post(create_comment))
        .route("/api/comments/{id}/", delete(delete_comment))
        .route("/api/admin/news/", post(create_news))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_token(
    listener: TcpListener,
    admin_token: &str,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(admin_token)).await
}

async fn list_boards(State(state): State<AppState>) -> Json<Vec<Board>> {
    let db = state.db.read().await;
    let boards = db
        .boards
        .iter()
        .map(|b| Board {
            id: b.id,
            name: b.name.clone(),
            board_type: b.board_type.clone(),
            description: b.description.clone(),
            post_count: db.posts.values().filter(|p| p.board_id == b.id).count() as u64,
        })
        .collect();
    Json(boards)
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PostPage>> {
    let page = match params.page.as_deref() {
        None => 1,
        Some(raw) => raw.parse::<usize>().map_err(|_| not_found())?,
    };
    let sort = params.sort.as_deref().unwrap_or("recent");

    let db = state.db.read().await;
    let mut posts: Vec<&StoredPost> = db
        .posts
        .values()
        .filter(|p| match params.board_type.as_deref() {
            Some(board_type) => db
                .board(p.board_id)
                .is_some_and(|b| b.board_type == board_type),
            None => true,
        })
        .collect();
    if sort == "popular" {
        posts.sort_by_key(|p| (Reverse(p.upvote_count), Reverse(p.created_at), Reverse(p.id)));
    } else {
        posts.sort_by_key(|p| (Reverse(p.created_at), Reverse(p.id)));
    }

    let count = posts.len();
    let pages = count.div_ceil(PAGE_SIZE).max(1);
    if page == 0 || page > pages {
        return Err(not_found());
    }
    let results = posts
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .map(|p| db.summary(p))
        .collect();

    let link = |n: usize| {
        let mut query = String::new();
        if let Some(board_type) = &params.board_type {
            query.push_str(&format!("board_type={board_type}&"));
        }
        format!("/api/posts/?{query}page={n}&sort={sort}")
    };
    Ok(Json(PostPage {
        count: count as u64,
        next: (page < pages).then(|| link(page + 1)),
        previous: (page > 1).then(|| link(page - 1)),
        results,
    }))
}

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreatePost>,
) -> ApiResult<(StatusCode, Json<PostDetail>)> {
    check_password_shape(&input.password)?;
    let mut db = state.db.write().await;
    let board = db
        .board(input.board)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "unknown board"))?;
    if board.board_type == NEWS_BOARD {
        return Err(error(
            StatusCode::FORBIDDEN,
            "only administrators may post on the news board",
        ));
    }
    let id = db.insert_post(
        input.board,
        input.title,
        input.content,
        input.author_name,
        input.password,
        fingerprint(&headers),
    );
    info!(post_id = id, board = input.board, "post created");
    let detail = db.detail(id).ok_or_else(not_found)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<PostDetail>> {
    let mut db = state.db.write().await;
    let post = db.posts.get_mut(&id).ok_or_else(not_found)?;
    post.view_count += 1;
    db.detail(id).map(Json).ok_or_else(not_found)
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<UpdatePost>,
) -> ApiResult<Json<PostDetail>> {
    let mut db = state.db.write().await;
    let post = db.posts.get_mut(&id).ok_or_else(not_found)?;
    if post.password != input.password {
        return Err(error(StatusCode::BAD_REQUEST, "password does not match"));
    }
    post.title = input.title;
    post.content = input.content;
    post.updated_at = Utc::now();
    db.detail(id).map(Json).ok_or_else(not_found)
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<DeleteBody>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    let post = db.posts.get(&id).ok_or_else(not_found)?;
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "password is required"))?;
    if post.password != password {
        return Err(error(StatusCode::FORBIDDEN, "password does not match"));
    }
    db.posts.remove(&id);
    db.comments.retain(|_, c| c.post_id != id);
    db.votes.retain(|(post_id, _), _| *post_id != id);
    info!(post_id = id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn vote_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(input): Json<VoteBody>,
) -> ApiResult<Json<VoteOutcome>> {
    let vote_type = input.vote_type;
    if vote_type != 1 && vote_type != -1 {
        return Err(error(StatusCode::BAD_REQUEST, "vote_type must be 1 or -1"));
    }
    let mut db = state.db.write().await;
    if !db.posts.contains_key(&id) {
        return Err(not_found());
    }

    let key = (id, fingerprint(&headers));
    let previous = db.votes.get(&key).copied();
    let (action, up_delta, down_delta) = match previous {
        Some(prev) if prev == vote_type => {
            db.votes.remove(&key);
            ("cancelled", -i64::from(vote_type == 1), -i64::from(vote_type == -1))
        }
        Some(_) => {
            db.votes.insert(key, vote_type);
            let up = if vote_type == 1 { 1 } else { -1 };
            ("changed", up, -up)
        }
        None => {
            db.votes.insert(key, vote_type);
            ("voted", i64::from(vote_type == 1), i64::from(vote_type == -1))
        }
    };

    let post = db.posts.get_mut(&id).ok_or_else(not_found)?;
    post.upvote_count += up_delta;
    post.downvote_count += down_delta;
    Ok(Json(VoteOutcome {
        action: action.to_string(),
        upvote_count: post.upvote_count,
        downvote_count: post.downvote_count,
    }))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<u64>,
    headers: HeaderMap,
    Json(input): Json<CreateComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let mut db = state.db.write().await;
    if !db.posts.contains_key(&post_id) {
        return Err(not_found());
    }
    check_password_shape(&input.password)?;

    let id = db.next_comment_id;
    db.next_comment_id += 1;
    let comment = StoredComment {
        id,
        post_id,
        content: input.content,
        author_name: input.author_name,
        password: input.password,
        author_fingerprint: fingerprint(&headers),
        created_at: Utc::now(),
    };
    let view = comment_view(&comment);
    db.comments.insert(id, comment);
    if let Some(post) = db.posts.get_mut(&post_id) {
        post.comment_count += 1;
    }
    Ok((StatusCode::CREATED, Json(view)))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<DeleteBody>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.write().await;
    let comment = db.comments.get(&id).ok_or_else(not_found)?;
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "password is required"))?;
    if comment.password != password {
        return Err(error(StatusCode::FORBIDDEN, "password does not match"));
    }
    let post_id = comment.post_id;
    db.comments.remove(&id);
    if let Some(post) = db.posts.get_mut(&post_id) {
        post.comment_count -= 1;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn create_news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateNews>,
) -> ApiResult<(StatusCode, Json<PostDetail>)> {
    let token = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if token != Some(&*state.admin_token) {
        return Err(error(StatusCode::FORBIDDEN, "administrator token required"));
    }
    let mut db = state.db.write().await;
    let board_id = db
        .boards
        .iter()
        .find(|b| b.board_type == NEWS_BOARD)
        .map(|b| b.id)
        .ok_or_else(not_found)?;
    let id = db.insert_post(
        board_id,
        input.title,
        input.content,
        input.author_name,
        String::new(),
        ADMIN_FINGERPRINT.to_string(),
    );
    info!(post_id = id, "news posted");
    let detail = db.detail(id).ok_or_else(not_found)?;
    Ok((StatusCode::CREATED, Json(detail)))
}
