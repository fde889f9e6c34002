//! Stateless HTTP request builder and response parser for the board API.
//!
//! # Design
//! `BoardClient` holds only the API root (`<api_base>/api`) and carries no
//! state between calls. Each endpoint is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Whoever executes the round-trip in between (a `Transport`
//! or the embedding host) decides how calls are scheduled.
//!
//! Every request carries `content-type: application/json`. The admin token
//! header is added by `build_create_news` only; passwords only ever travel
//! in JSON bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Board, Comment, DeleteRequest, Listing, NewComment, NewPost, NewsPost, PostDetail, PostQuery,
    PostSummary, PostUpdate, VoteOutcome, VoteRequest, VoteType,
};

/// Header carrying the per-call admin credential of `create_news`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

const API_PREFIX: &str = "/api";

/// Synchronous, stateless client for the board API.
#[derive(Debug, Clone)]
pub struct BoardClient {
    api_root: String,
}

impl BoardClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_root: format!("{}{API_PREFIX}", api_base.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_base)
    }

    /// `<api_base>/api`, without a trailing slash.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn build_list_boards(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/boards/", None)
    }

    pub fn build_list_posts(&self, query: &PostQuery) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string(query)?;
        Ok(self.request(HttpMethod::Get, &format!("/posts/?{query}"), None))
    }

    pub fn build_get_post(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/posts/{id}/"), None)
    }

    pub fn build_create_post(&self, input: &NewPost) -> Result<HttpRequest, ApiError> {
        let body = json_body(input)?;
        Ok(self.request(HttpMethod::Post, "/posts/", Some(body)))
    }

    pub fn build_update_post(&self, id: u64, input: &PostUpdate) -> Result<HttpRequest, ApiError> {
        let body = json_body(input)?;
        Ok(self.request(HttpMethod::Put, &format!("/posts/{id}/"), Some(body)))
    }

    pub fn build_delete_post(&self, id: u64, password: &str) -> Result<HttpRequest, ApiError> {
        let body = json_body(&DeleteRequest {
            password: password.to_string(),
        })?;
        Ok(self.request(HttpMethod::Delete, &format!("/posts/{id}/"), Some(body)))
    }

    pub fn build_vote_post(&self, id: u64, vote: VoteType) -> Result<HttpRequest, ApiError> {
        let body = json_body(&VoteRequest::from(vote))?;
        Ok(self.request(HttpMethod::Post, &format!("/posts/{id}/vote/"), Some(body)))
    }

    pub fn build_create_comment(
        &self,
        post_id: u64,
        input: &NewComment,
    ) -> Result<HttpRequest, ApiError> {
        let body = json_body(input)?;
        Ok(self.request(
            HttpMethod::Post,
            &format!("/posts/{post_id}/comment/"),
            Some(body),
        ))
    }

    pub fn build_delete_comment(&self, id: u64, password: &str) -> Result<HttpRequest, ApiError> {
        let body = json_body(&DeleteRequest {
            password: password.to_string(),
        })?;
        Ok(self.request(HttpMethod::Delete, &format!("/comments/{id}/"), Some(body)))
    }

    /// The token is sent as given and never retained by the client.
    pub fn build_create_news(
        &self,
        input: &NewsPost,
        admin_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = json_body(input)?;
        let mut req = self.request(HttpMethod::Post, "/admin/news/", Some(body));
        req.headers
            .push((ADMIN_TOKEN_HEADER.to_string(), admin_token.to_string()));
        Ok(req)
    }

    pub fn parse_list_boards(&self, response: HttpResponse) -> Result<Listing<Board>, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_posts(
        &self,
        response: HttpResponse,
    ) -> Result<Listing<PostSummary>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<PostDetail, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<PostDetail, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<PostDetail, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_vote_post(&self, response: HttpResponse) -> Result<VoteOutcome, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_comment(&self, response: HttpResponse) -> Result<Comment, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_comment(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_create_news(&self, response: HttpResponse) -> Result<PostDetail, ApiError> {
        parse_json(response)
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.api_root),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        }
    }
}

fn json_body<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PostSort, VoteAction};

    fn client() -> BoardClient {
        BoardClient::new("http://localhost:8000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    const POST_JSON: &str = r#"{"id":7,"board":1,"board_name":"Free","title":"Hello",
        "content":"First post","author_name":"Alice","author_fingerprint":"orbit",
        "view_count":1,"comment_count":0,"upvote_count":0,"downvote_count":0,
        "created_at":"2024-11-11T12:00:00Z","updated_at":"2024-11-11T12:00:00Z",
        "comments":[]}"#;

    #[test]
    fn build_list_boards_produces_correct_request() {
        let req = client().build_list_boards();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/boards/");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_posts_encodes_all_parameters_in_order() {
        let query = PostQuery::default()
            .board_type("notice")
            .page(2)
            .sort(PostSort::Popular);
        let req = client().build_list_posts(&query).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:8000/api/posts/?board_type=notice&page=2&sort=popular"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_posts_defaults_omit_board_type() {
        let req = client().build_list_posts(&PostQuery::default()).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/posts/?page=1&sort=recent");
    }

    #[test]
    fn build_list_posts_omits_empty_board_type() {
        let query = PostQuery::default().board_type("").page(3);
        let req = client().build_list_posts(&query).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/posts/?page=3&sort=recent");
    }

    #[test]
    fn build_get_post_produces_correct_request() {
        let req = client().build_get_post(42);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/posts/42/");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_post_sends_payload_verbatim() {
        let input = NewPost {
            board: 1,
            title: "Hello".to_string(),
            content: "First post".to_string(),
            author_name: String::new(),
            password: "pw".to_string(),
        };
        let req = client().build_create_post(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/posts/");
        let body = body_json(&req);
        assert_eq!(body["board"], 1);
        assert_eq!(body["title"], "Hello");
        assert_eq!(body["author_name"], "");
        assert_eq!(body["password"], "pw");
    }

    #[test]
    fn build_update_post_uses_put() {
        let input = PostUpdate {
            title: "Edited".to_string(),
            content: "Changed".to_string(),
            password: "pw12".to_string(),
        };
        let req = client().build_update_post(7, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8000/api/posts/7/");
        assert_eq!(body_json(&req)["title"], "Edited");
    }

    #[test]
    fn build_delete_post_sends_password_only_in_body() {
        let req = client().build_delete_post(7, "s3cret").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:8000/api/posts/7/");
        assert_eq!(body_json(&req), serde_json::json!({ "password": "s3cret" }));
        assert!(!req.url.contains("s3cret"));
        assert!(req.headers.iter().all(|(_, v)| !v.contains("s3cret")));
    }

    #[test]
    fn build_vote_post_sends_integer_code() {
        let req = client().build_vote_post(7, VoteType::Up).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/posts/7/vote/");
        assert_eq!(body_json(&req), serde_json::json!({ "vote_type": 1 }));
    }

    #[test]
    fn build_create_comment_nests_under_post() {
        let input = NewComment {
            content: "Nice".to_string(),
            author_name: "Bob".to_string(),
            password: "pw34".to_string(),
        };
        let req = client().build_create_comment(9, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/posts/9/comment/");
        assert_eq!(body_json(&req)["content"], "Nice");
    }

    #[test]
    fn build_delete_comment_sends_password_only_in_body() {
        let req = client().build_delete_comment(3, "pw34").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://localhost:8000/api/comments/3/");
        assert_eq!(body_json(&req), serde_json::json!({ "password": "pw34" }));
        assert!(!req.url.contains("pw34"));
    }

    #[test]
    fn build_create_news_carries_admin_token() {
        let input = NewsPost {
            title: "Release".to_string(),
            content: "v2 is out".to_string(),
            author_name: "admin".to_string(),
        };
        let req = client().build_create_news(&input, "tok-123").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/admin/news/");
        assert_eq!(req.header("X-Admin-Token"), Some("tok-123"));
        assert_eq!(body_json(&req)["title"], "Release");
    }

    #[test]
    fn no_other_request_carries_admin_token() {
        let c = client();
        let requests = vec![
            c.build_list_boards(),
            c.build_list_posts(&PostQuery::default()).unwrap(),
            c.build_get_post(1),
            c.build_delete_post(1, "pw").unwrap(),
            c.build_vote_post(1, VoteType::Down).unwrap(),
            c.build_delete_comment(1, "pw").unwrap(),
        ];
        for req in requests {
            assert!(req.header(ADMIN_TOKEN_HEADER).is_none(), "{}", req.url);
        }
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = BoardClient::new("http://localhost:8000/");
        assert_eq!(client.api_root(), "http://localhost:8000/api");
        assert_eq!(client.build_list_boards().url, "http://localhost:8000/api/boards/");
    }

    #[test]
    fn from_config_uses_api_base() {
        let client = BoardClient::from_config(&ClientConfig::default());
        assert_eq!(client.api_root(), "http://localhost:8000/api");
    }

    const BOARD_JSON: &str =
        r#"{"id":1,"name":"Free","board_type":"free","description":"","post_count":3}"#;

    const SUMMARY_JSON: &str = r#"{"id":7,"board":1,"board_name":"Free","title":"Hello",
        "author_name":"Alice","author_fingerprint":"orbit","view_count":1,"comment_count":0,
        "upvote_count":0,"downvote_count":0,"created_at":"2024-11-11T12:00:00Z"}"#;

    #[test]
    fn parse_list_boards_bare_array() {
        let boards = client()
            .parse_list_boards(response(200, &format!("[{BOARD_JSON}]")))
            .unwrap();
        assert_eq!(boards.items().len(), 1);
        assert_eq!(boards.items()[0].board_type, "free");
        assert_eq!(boards.items()[0].post_count, 3);
    }

    #[test]
    fn parse_list_boards_page_envelope() {
        let body = format!(r#"{{"count":1,"next":null,"previous":null,"results":[{BOARD_JSON}]}}"#);
        let boards = client().parse_list_boards(response(200, &body)).unwrap();
        assert_eq!(boards.total(), 1);
        assert_eq!(boards.items()[0].name, "Free");

        let empty = client()
            .parse_list_boards(response(
                200,
                r#"{"count":0,"next":null,"previous":null,"results":[]}"#,
            ))
            .unwrap();
        assert!(empty.items().is_empty());
    }

    #[test]
    fn parse_list_posts_page_envelope() {
        let body = format!(
            r#"{{"count":21,"next":"/api/posts/?page=2&sort=recent","previous":null,
                "results":[{SUMMARY_JSON}]}}"#
        );
        let page = client().parse_list_posts(response(200, &body)).unwrap();
        assert_eq!(page.total(), 21);
        assert_eq!(page.items()[0].title, "Hello");
        assert_eq!(page.next(), Some("/api/posts/?page=2&sort=recent"));
    }

    #[test]
    fn parse_list_posts_bare_array() {
        let empty = client().parse_list_posts(response(200, "[]")).unwrap();
        assert_eq!(empty.total(), 0);
        assert!(empty.items().is_empty());

        let posts = client()
            .parse_list_posts(response(200, &format!("[{SUMMARY_JSON}]")))
            .unwrap();
        assert_eq!(posts.total(), 1);
        assert_eq!(posts.into_items()[0].id, 7);
    }

    #[test]
    fn parse_get_post_success() {
        let post = client().parse_get_post(response(200, POST_JSON)).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn parse_get_post_not_found() {
        let err = client().parse_get_post(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_create_post_accepts_any_2xx() {
        assert!(client().parse_create_post(response(201, POST_JSON)).is_ok());
        assert!(client().parse_create_post(response(200, POST_JSON)).is_ok());
    }

    #[test]
    fn parse_create_post_rate_limited() {
        let body = r#"{"error":"too many posts"}"#;
        let err = client().parse_create_post(response(429, body)).unwrap_err();
        match err {
            ApiError::Http { status, body: raw } => {
                assert_eq!(status, 429);
                assert_eq!(raw, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_update_post_forbidden() {
        let err = client().parse_update_post(response(403, "{}")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 403, .. }));
    }

    #[test]
    fn parse_delete_post_success() {
        assert!(client().parse_delete_post(response(204, "")).is_ok());
    }

    #[test]
    fn parse_delete_comment_wrong_password() {
        let err = client()
            .parse_delete_comment(response(403, r#"{"error":"mismatch"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 403, .. }));
    }

    #[test]
    fn parse_vote_post_success() {
        let outcome = client()
            .parse_vote_post(response(
                200,
                r#"{"action":"voted","upvote_count":1,"downvote_count":0}"#,
            ))
            .unwrap();
        assert_eq!(outcome.action, VoteAction::Voted);
        assert_eq!(outcome.upvote_count, 1);
    }

    #[test]
    fn parse_create_comment_success() {
        let comment = client()
            .parse_create_comment(response(
                201,
                r#"{"id":1,"content":"Nice","author_name":"Bob",
                    "author_fingerprint":"river","created_at":"2024-11-11T12:00:00Z"}"#,
            ))
            .unwrap();
        assert_eq!(comment.author_name, "Bob");
    }

    #[test]
    fn parse_create_news_forbidden_is_not_silent() {
        let err = client()
            .parse_create_news(response(403, r#"{"error":"admin only"}"#))
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn parse_bad_json_on_success_status() {
        let err = client().parse_list_boards(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
