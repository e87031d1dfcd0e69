use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client as ReqwestClient, Response};
use tracing::{debug, warn};
use url::Url;

use crate::challenge::ChallengeSolver;
use crate::chat::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{
    BOOTSTRAP_ATTEMPTS, BOOTSTRAP_FAILURES, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS,
    CLIENT_REQUESTS,
};

/// Root of the proxy site.
pub const DEFAULT_BASE_URL: &str = "https://asmodeus.free.nf/";
/// User-Agent sent on every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Android)";
/// Name of the cookie carrying the solved challenge.
pub const CHALLENGE_COOKIE: &str = "__test";
/// Per-request timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ACTIVATION_PATH: &str = "index.php";
const CHAT_PATH: &str = "deepseek.php";
// The proxy only ever uses session slot 1.
const SESSION_INDEX: &str = "1";
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// HTTP session against the proxy.
///
/// Owns the cookie jar.  The only cookie we set ourselves is the challenge
/// cookie during [`ProxyClient::bootstrap`]; everything after that comes from
/// the server's `Set-Cookie` headers.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: ReqwestClient,
    jar: Arc<Jar>,
    base_url: Url,
    timeout: Duration,
    settle_delay: Duration,
}

impl ProxyClient {
    /// Create a client for the default site.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::validation(
                "timeout must be greater than zero",
                Some("timeout".to_string()),
            ));
        }

        let jar = Arc::new(Jar::default());
        let client = ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            jar,
            base_url,
            timeout,
            settle_delay: SETTLE_DELAY,
        })
    }

    /// Sets the pause after the activation request.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// The site root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the challenge handshake.
    ///
    /// Fetches the landing page, solves its challenge, installs the cookie and
    /// calls the activation endpoint.  Every failure comes back wrapped as
    /// [`Error::Bootstrap`].
    pub async fn bootstrap(&self, solver: &dyn ChallengeSolver) -> Result<()> {
        BOOTSTRAP_ATTEMPTS.click();
        let result = self.bootstrap_inner(solver).await;
        if result.is_err() {
            BOOTSTRAP_FAILURES.click();
        }
        result.map_err(Error::bootstrap)
    }

    async fn bootstrap_inner(&self, solver: &dyn ChallengeSolver) -> Result<()> {
        let page = self.fetch_challenge_page().await?;
        let cookie = solver.solve(&page)?;
        debug!(cookie_len = cookie.len(), "solved challenge");
        self.install_cookie(&cookie);
        self.activate().await?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    /// GET the site root and return the page body.
    pub async fn fetch_challenge_page(&self) -> Result<String> {
        let response = self.execute(self.client.get(self.base_url.clone())).await?;
        if !response.status().is_success() {
            return Err(Error::status(
                response.status().as_u16(),
                "challenge page request was rejected",
            ));
        }
        self.read_body(response).await
    }

    /// Stores the challenge cookie for the site.
    pub fn install_cookie(&self, value: &str) {
        let cookie = format!("{CHALLENGE_COOKIE}={value}; Path=/");
        self.jar.add_cookie_str(&cookie, &self.base_url);
    }

    /// The `Cookie` header the jar would send to the site root.
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    /// Calls the activation endpoint so the server accepts the cookie.
    ///
    /// The response body is ignored.
    pub async fn activate(&self) -> Result<()> {
        let url = self.endpoint(ACTIVATION_PATH)?;
        let response = self
            .execute(self.client.get(url).query(&[("i", SESSION_INDEX)]))
            .await?;
        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "activation request not accepted");
        }
        Ok(())
    }

    /// POST a question and return the raw response page.
    pub async fn post_question(&self, model: &str, question: &str) -> Result<String> {
        let url = self.endpoint(CHAT_PATH)?;
        let request = self
            .client
            .post(url)
            .query(&[("i", SESSION_INDEX)])
            .form(&[("model", model), ("question", question)]);
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(Error::status(
                response.status().as_u16(),
                "chat request was rejected",
            ));
        }
        self.read_body(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match result {
            Ok(response) => {
                debug!(
                    url = %response.url(),
                    status = response.status().as_u16(),
                    "request finished"
                );
                Ok(response)
            }
            Err(e) => {
                CLIENT_REQUEST_ERRORS.click();
                Err(self.map_transport_error(e))
            }
        }
    }

    async fn read_body(&self, response: Response) -> Result<String> {
        response.text().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.map_transport_error(e)
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

#[async_trait::async_trait]
impl ChatBackend for ProxyClient {
    async fn ask(&self, model: &str, question: &str) -> Result<String> {
        self.post_question(model, question).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("unsupported scheme {:?}", url.scheme()),
            Some("base_url".to_string()),
        ));
    }
    Ok(url)
}
