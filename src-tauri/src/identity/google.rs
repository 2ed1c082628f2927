//! Google Sign-In
//!
//! OAuth 2.0 installed-app flow with a loopback redirect: the consent page
//! opens in the system browser and redirects back to a one-shot listener on
//! 127.0.0.1. The code is exchanged for an access token, and the OpenID
//! userinfo profile becomes the session identity.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use shopping_sync::{Identity, IdentityProvider, ProviderKind, SyncError, SyncResult};

use super::SessionFile;
use crate::config::{GoogleConfig, CLIENT_ID_VAR, CLIENT_SECRET_VAR};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";
const CALLBACK_PATH: &str = "/callback";
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// RFC 3986 unreserved characters pass through
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const DONE_PAGE: &str = "<html><body><h3>Signed in. You can close this window.</h3></body></html>";
const FAILED_PAGE: &str = "<html><body><h3>Sign-in failed. You can close this window.</h3></body></html>";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleProfile {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

impl From<GoogleProfile> for Identity {
    fn from(profile: GoogleProfile) -> Self {
        Identity {
            uid: profile.sub,
            display_name: profile.name,
            email: profile.email,
        }
    }
}

/// Identity provider backed by Google accounts
pub struct GoogleIdentity {
    config: Option<GoogleConfig>,
    session: SessionFile,
    http: reqwest::Client,
    state: watch::Sender<Option<Identity>>,
}

impl GoogleIdentity {
    /// Restores a persisted session, if any. Without `config` the provider
    /// still restores and signs out, but interactive sign-in fails.
    pub fn new(config: Option<GoogleConfig>, session: SessionFile) -> Self {
        let restored = session.load();
        if let Some(identity) = &restored {
            log::info!("Restored session for {}", identity.uid);
        }
        if config.is_none() {
            log::warn!(
                "Google sign-in disabled: {} / {} not set",
                CLIENT_ID_VAR,
                CLIENT_SECRET_VAR
            );
        }
        let (state, _) = watch::channel(restored);
        Self {
            config,
            session,
            http: reqwest::Client::new(),
            state,
        }
    }

    async fn exchange_code(&self, config: &GoogleConfig, code: &str, redirect_uri: &str) -> SyncResult<String> {
        let form = [
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError::Backend(format!("Token exchange failed: {}", e)))?
            .json()
            .await
            .map_err(|e| SyncError::Backend(format!("Token response parse failed: {}", e)))?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> SyncResult<Identity> {
        let profile: GoogleProfile = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError::Backend(format!("Userinfo fetch failed: {}", e)))?
            .json()
            .await
            .map_err(|e| SyncError::Backend(format!("Userinfo parse failed: {}", e)))?;
        Ok(profile.into())
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn observe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    async fn sign_in(&self, provider: ProviderKind) -> SyncResult<Identity> {
        let ProviderKind::Google = provider;
        let config = self.config.as_ref().ok_or_else(|| {
            SyncError::Backend(format!(
                "Google sign-in is not configured (set {} and {})",
                CLIENT_ID_VAR, CLIENT_SECRET_VAR
            ))
        })?;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(SyncError::backend)?;
        let port = listener.local_addr().map_err(SyncError::backend)?.port();
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let state = new_state_token()?;

        let url = build_authorize_url(&config.client_id, &redirect_uri, &state);
        log::info!("Opening Google consent page, redirect on port {}", port);
        open::that(&url).map_err(|e| SyncError::Backend(format!("Failed to open browser: {}", e)))?;

        let code = tokio::time::timeout(REDIRECT_TIMEOUT, wait_for_redirect(listener, &state))
            .await
            .map_err(|_| SyncError::Backend("Timed out waiting for Google sign-in".to_string()))??;

        let access_token = self.exchange_code(config, &code, &redirect_uri).await?;
        let identity = self.fetch_profile(&access_token).await?;

        if let Err(e) = self.session.save(&identity) {
            log::warn!("Session not persisted: {}", e);
        }
        log::info!("Signed in as {}", identity.uid);
        self.state.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> SyncResult<()> {
        self.session.clear().map_err(SyncError::Backend)?;
        if let Some(previous) = self.state.send_replace(None) {
            log::info!("Signed out {}", previous.uid);
        }
        Ok(())
    }
}

/// Random, URL-safe `state` parameter
fn new_state_token() -> SyncResult<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| SyncError::Backend(format!("RNG failure: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

pub(crate) fn build_authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
        AUTH_URL,
        encode(client_id),
        encode(redirect_uri),
        encode(SCOPES),
        encode(state),
    )
}

/// What arrived at the loopback listener
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Redirect {
    /// Authorization code with a matching `state`
    Code(String),
    /// A request for something other than the callback
    Unrelated,
}

/// Parse the request line of the browser's redirect
pub(crate) fn parse_redirect(request_line: &str, expected_state: &str) -> Result<Redirect, String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "Malformed redirect request".to_string())?;
    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| format!("Malformed redirect target: {}", e))?;
    if url.path() != CALLBACK_PATH {
        return Ok(Redirect::Unrelated);
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(format!("Google sign-in was not completed: {}", error));
    }
    if state.as_deref() != Some(expected_state) {
        return Err("Sign-in state mismatch".to_string());
    }
    code.filter(|code| !code.is_empty())
        .map(Redirect::Code)
        .ok_or_else(|| "Redirect carried no authorization code".to_string())
}

/// Serve the loopback listener until the callback arrives
async fn wait_for_redirect(listener: TcpListener, expected_state: &str) -> SyncResult<String> {
    loop {
        let (mut stream, _) = listener.accept().await.map_err(SyncError::backend)?;

        let mut buf = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < MAX_REQUEST_BYTES {
            let read = stream.read(&mut chunk).await.map_err(SyncError::backend)?;
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }
        let request = String::from_utf8_lossy(&buf);
        let request_line = request.lines().next().unwrap_or_default();

        let outcome = parse_redirect(request_line, expected_state);
        let (status, body) = match &outcome {
            Ok(Redirect::Code(_)) => ("200 OK", DONE_PAGE),
            Ok(Redirect::Unrelated) => ("404 Not Found", ""),
            Err(_) => ("400 Bad Request", FAILED_PAGE),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            log::debug!("Redirect response not delivered: {}", e);
        }

        match outcome {
            Ok(Redirect::Code(code)) => return Ok(code),
            Ok(Redirect::Unrelated) => continue,
            Err(e) => return Err(SyncError::Backend(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_in(dir: &tempfile::TempDir, config: Option<GoogleConfig>) -> GoogleIdentity {
        GoogleIdentity::new(config, SessionFile::new(dir.path().join("session.json")))
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let url = build_authorize_url("abc.apps", "http://127.0.0.1:4321/callback", "st-1_x");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=abc.apps"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A4321%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=st-1_x"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn state_tokens_are_url_safe_and_distinct() {
        let a = new_state_token().unwrap();
        let b = new_state_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn redirect_yields_code() {
        let line = "GET /callback?state=abc&code=4%2F0Adeu5&scope=email HTTP/1.1";
        assert_eq!(
            parse_redirect(line, "abc"),
            Ok(Redirect::Code("4/0Adeu5".to_string()))
        );
    }

    #[test]
    fn redirect_rejects_wrong_state() {
        let line = "GET /callback?state=evil&code=xyz HTTP/1.1";
        assert!(parse_redirect(line, "abc").is_err());
        let line = "GET /callback?code=xyz HTTP/1.1";
        assert!(parse_redirect(line, "abc").is_err());
    }

    #[test]
    fn redirect_reports_consent_error() {
        let line = "GET /callback?error=access_denied&state=abc HTTP/1.1";
        let err = parse_redirect(line, "abc").unwrap_err();
        assert!(err.contains("access_denied"));
    }

    #[test]
    fn redirect_query_is_decoded_like_a_form() {
        let line = "GET /callback?error=access+denied%21&state=abc HTTP/1.1";
        let err = parse_redirect(line, "abc").unwrap_err();
        assert!(err.contains("access denied!"));

        let line = "GET /callback?code=a%2Bb+c&state=a%62c HTTP/1.1";
        assert_eq!(parse_redirect(line, "abc"), Ok(Redirect::Code("a+b c".to_string())));
    }

    #[test]
    fn lookalike_paths_are_unrelated() {
        let line = "GET /callback/extra?state=abc&code=xyz HTTP/1.1";
        assert_eq!(parse_redirect(line, "abc"), Ok(Redirect::Unrelated));
        let line = "GET /callbackx?state=abc&code=xyz HTTP/1.1";
        assert_eq!(parse_redirect(line, "abc"), Ok(Redirect::Unrelated));
    }

    #[test]
    fn other_paths_are_unrelated() {
        assert_eq!(
            parse_redirect("GET /favicon.ico HTTP/1.1", "abc"),
            Ok(Redirect::Unrelated)
        );
        assert!(parse_redirect("", "abc").is_err());
    }

    #[test]
    fn profile_maps_to_identity() {
        let profile: GoogleProfile = serde_json::from_str(
            r#"{"sub":"1099","name":"Alice","email":"alice@example.com","picture":"x"}"#,
        )
        .unwrap();
        let identity = Identity::from(profile);
        assert_eq!(identity.uid, "1099");
        assert_eq!(identity.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn restores_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let saved = Identity::new("1099");
        SessionFile::new(dir.path().join("session.json")).save(&saved).unwrap();

        let provider = provider_in(&dir, None);
        assert_eq!(provider.current(), Some(saved.clone()));
        assert_eq!(*provider.observe().borrow(), Some(saved));
    }

    #[tokio::test]
    async fn sign_in_without_credentials_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_in(&dir, None);
        let err = provider.sign_in(ProviderKind::Google).await.unwrap_err();
        assert!(err.to_string().contains(CLIENT_ID_VAR));
        assert_eq!(provider.current(), None);
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionFile::new(&path).save(&Identity::new("1099")).unwrap();

        let provider = provider_in(&dir, None);
        let mut watcher = provider.observe();
        provider.sign_out().await.unwrap();

        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), None);
        assert_eq!(provider.current(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn loopback_listener_returns_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let waiter = tokio::spawn(async move { wait_for_redirect(listener, "abc").await });

        for path in ["/favicon.ico", "/callback?code=c0de&state=abc"] {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            stream
                .write_all(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).as_bytes())
                .await
                .unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            assert!(response.starts_with("HTTP/1.1 "));
        }

        assert_eq!(waiter.await.unwrap().unwrap(), "c0de");
    }
}
