use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Credential placement for outgoing provider requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpAuth {
    None,
    Header { name: String, value: String },
    Query { name: String, value: String },
}

/// GET request envelope used by adapter transport calls.
///
/// `log_url` never carries credentials and is the only URL that reaches logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub log_url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            log_url: url.clone(),
            url,
            headers: BTreeMap::new(),
            timeout_ms: 8_000,
        }
    }

    /// Builds `base/path`, tolerating slashes on either side.
    pub fn endpoint(base: &str, path: &str) -> Self {
        let base = base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            Self::get(base)
        } else {
            Self::get(format!("{base}/{path}"))
        }
    }

    pub fn with_query(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let pair = format!("{name}={}", urlencoding::encode(value.as_ref()));
        self.url = append_query(&self.url, &pair);
        self.log_url = append_query(&self.log_url, &pair);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: &HttpAuth) -> Self {
        match auth {
            HttpAuth::None => {}
            HttpAuth::Header { name, value } => {
                self.headers.insert(name.to_ascii_lowercase(), value.clone());
            }
            HttpAuth::Query { name, value } => {
                let pair = format!("{name}={}", urlencoding::encode(value));
                self.url = append_query(&self.url, &pair);
                self.log_url = append_query(&self.log_url, &format!("{name}=<redacted>"));
            }
        }
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn append_query(url: &str, pair: &str) -> String {
    if url.contains('?') {
        format!("{url}&{pair}")
    } else {
        format!("{url}?{pair}")
    }
}

/// HTTP response envelope returned by an adapter transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(user_agent)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let timeout = std::time::Duration::from_millis(request.timeout_ms);
            builder = builder.timeout(timeout);

            let response = builder.send().await.map_err(|e| {
                // reqwest errors embed the full URL, which may carry an api key
                let e = e.without_url();
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                HttpError::new(format!("failed to read response body: {}", e.without_url()))
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Scripted transport for deterministic offline tests.
///
/// Routes match on a URL fragment; the longest matching fragment wins. A
/// route replays its queued outcomes in order and repeats the last one.
#[derive(Debug, Clone, Default)]
pub struct StubHttpClient {
    routes: Arc<Mutex<Vec<StubRoute>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

#[derive(Debug)]
struct StubRoute {
    fragment: String,
    outcomes: VecDeque<Result<HttpResponse, HttpError>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, fragment: impl Into<String>, response: HttpResponse) -> Self {
        self.script(fragment, vec![Ok(response)])
    }

    pub fn respond_json(self, fragment: impl Into<String>, body: impl Into<String>) -> Self {
        self.respond(fragment, HttpResponse::ok_json(body))
    }

    pub fn script(
        self,
        fragment: impl Into<String>,
        outcomes: Vec<Result<HttpResponse, HttpError>>,
    ) -> Self {
        self.routes
            .lock()
            .expect("stub routes lock is not poisoned")
            .push(StubRoute {
                fragment: fragment.into(),
                outcomes: outcomes.into(),
            });
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("stub requests lock is not poisoned")
            .clone()
    }

    pub fn request_count(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .expect("stub requests lock is not poisoned")
            .iter()
            .filter(|request| request.url.contains(fragment))
            .count()
    }

    fn next_outcome(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let mut routes = self.routes.lock().expect("stub routes lock is not poisoned");
        let route = routes
            .iter_mut()
            .filter(|route| url.contains(route.fragment.as_str()))
            .max_by_key(|route| route.fragment.len());

        let Some(route) = route else {
            return Err(HttpError::non_retryable(format!("no stub route for {url}")));
        };

        if route.outcomes.len() > 1 {
            route
                .outcomes
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::non_retryable("stub route exhausted")))
        } else {
            route
                .outcomes
                .front()
                .cloned()
                .unwrap_or_else(|| Err(HttpError::non_retryable("stub route exhausted")))
        }
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let outcome = self.next_outcome(&request.url);
            self.requests
                .lock()
                .expect("stub requests lock is not poisoned")
                .push(request);
            outcome
        })
    }
}
