//! Executing `HttpRequest` values.
//!
//! # Design
//! `Transport` is the single I/O seam of the crate. It must hand back every
//! response the server produced, 4xx/5xx included, and fail only when no
//! response exists; `BoardClient::parse_*` owns status interpretation.
//! Nothing here retries or overrides timeouts.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use ureq::Agent;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    ///
    /// The agent is configured so 4xx/5xx responses come back as data rather
    /// than `Err`. Cookies and connection reuse are whatever `ureq` does by
    /// default.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = req.url.as_str();
            let mut response = match req.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(url);
                    for (name, value) in &req.headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Delete => {
                    let mut builder = self.agent.delete(url);
                    for (name, value) in &req.headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    match req.body {
                        Some(body) => builder.force_send_body().send(body.as_bytes()),
                        None => builder.call(),
                    }
                }
                HttpMethod::Post | HttpMethod::Put => {
                    let mut builder = if req.method == HttpMethod::Post {
                        self.agent.post(url)
                    } else {
                        self.agent.put(url)
                    };
                    for (name, value) in &req.headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    match req.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            }
            .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
