//! Client core for the bulletin-board service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values for every
//! board endpoint without touching the network (host-does-IO pattern).
//! `BoardApi` glues the two halves to a `Transport` for callers that want
//! one call per endpoint. `PreferenceStore` keeps the reusable author name
//! in step with an injected `Storage`.
//!
//! # Design
//! - `BoardClient` is stateless; it holds only `<api_base>/api`.
//! - Every endpoint is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and every request shape is testable as data.
//! - Any 2xx is success; non-2xx and transport failures surface unchanged
//!   as `ApiError`. No retries, no validation.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod prefs;
pub mod transport;
pub mod types;

pub use api::BoardApi;
pub use client::{BoardClient, ADMIN_TOKEN_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, StorageError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(feature = "web")]
pub use prefs::LocalStorage;
pub use prefs::{
    FileStorage, MemoryStorage, PreferenceStore, Storage, UnavailableStorage, AUTHOR_NAME_KEY,
};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    Board, Comment, DeleteRequest, Listing, NewComment, NewPost, NewsPost, Page, PostDetail,
    PostPage, PostQuery, PostSort, PostSummary, PostUpdate, VoteAction, VoteOutcome, VoteRequest,
    VoteType,
};
