//! OAuth 1.0a request signing for Twitter/X API integration.
//!
//! This module builds the `Authorization: OAuth ...` header required by the
//! User Context endpoints (media upload and tweet creation). Signing is pure:
//! no network I/O happens here, and the only side effect is the optional
//! masked diagnostic output sent to a [`DiagnosticSink`].
//!
//! Only the `oauth_*` parameters and explicit `extra_params` enter the
//! signature. Multipart fields and JSON bodies are never signed.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use log::info;
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::config::Credentials;

type HmacSha1 = Hmac<Sha1>;

/// Character that replaces the hidden part of a masked secret.
pub const MASK_CHAR: char = '*';

/// Number of leading characters left visible by [`mask_secret`].
const MASK_VISIBLE_PREFIX: usize = 4;

/// Receiver for signer diagnostics.
///
/// Implementations must only ever be handed masked secrets.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, line: &str) {
        info!(target: "xpost::oauth", "{}", line);
    }
}

/// The request being signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    pub method: String,
    pub url: String,
    /// Query or form parameters that are part of the signature.
    pub extra_params: Vec<(String, String)>,
}

impl SignatureRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            extra_params: Vec::new(),
        }
    }

    /// Adds a signed query/form parameter. Duplicate keys are allowed.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }
}

/// Intermediate and final values of one signature computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSignature {
    pub base_url: String,
    pub base_string: String,
    pub signature: String,
    /// Full `Authorization` header value, starting with `OAuth `.
    pub header: String,
}

/// Percent-encodes a string per RFC 3986.
///
/// Everything except `A-Z`, `a-z`, `0-9`, `-`, `.`, `_` and `~` is encoded as
/// uppercase `%XX` over the UTF-8 bytes.
///
/// # Example
///
/// ```rust
/// use xpost::oauth::percent_encode;
///
/// assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
/// assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
/// ```
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Masks a secret for diagnostics: the first four characters stay visible and
/// the rest become [`MASK_CHAR`]. Secrets of four characters or fewer are fully masked.
///
/// # Example
///
/// ```rust
/// use xpost::oauth::mask_secret;
///
/// assert_eq!(mask_secret("abcdefgh"), "abcd****");
/// assert_eq!(mask_secret("abc"), "***");
/// assert_eq!(mask_secret(""), "");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= MASK_VISIBLE_PREFIX {
        return MASK_CHAR.to_string().repeat(len);
    }
    let visible: String = secret.chars().take(MASK_VISIBLE_PREFIX).collect();
    let hidden = MASK_CHAR.to_string().repeat(len - MASK_VISIBLE_PREFIX);
    format!("{}{}", visible, hidden)
}

/// Generates a fresh nonce: 128 random bits, hex encoded.
pub fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Current Unix time in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Normalizes a URL to `scheme://host[:port]/path` for the signature base string.
///
/// Query string, fragment and default ports are removed; scheme and host are
/// lower-cased. Input that does not parse as a URL only has its query and
/// fragment stripped.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
            // `port()` is None when the port is the scheme's default
            if let Some(port) = url.port() {
                base.push_str(&format!(":{}", port));
            }
            base.push_str(url.path());
            base
        }
        Err(_) => raw
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Builds the normalized parameter string.
///
/// Keys and values are percent-encoded first, then sorted by key and value with
/// byte-wise comparison and joined as `key=value` pairs separated by `&`.
pub fn build_parameter_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds `METHOD&enc(base_url)&enc(parameter_string)`.
pub fn build_signature_base_string(method: &str, url: &str, parameter_string: &str) -> String {
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normalize_url(url)),
        percent_encode(parameter_string)
    )
}

/// Builds the HMAC key `enc(consumer_secret)&enc(token_secret)`.
pub fn build_signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

/// Base64 encoded HMAC-SHA1.
pub fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> String {
    // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
    let mut h = HmacSha1::new_from_slice(key).unwrap();
    h.update(content);

    STANDARD.encode(h.finalize().into_bytes())
}

/// The six `oauth_*` protocol parameters, sorted by name.
fn oauth_parameters(
    credentials: &Credentials,
    nonce: &str,
    timestamp: i64,
) -> Vec<(&'static str, String)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", credentials.access_token.clone()),
        ("oauth_version", "1.0".to_string()),
    ]
}

/// Signs requests with a fixed set of OAuth 1.0a credentials.
///
/// # Example
///
/// ```rust
/// use xpost::config::Credentials;
/// use xpost::oauth::{SignatureRequest, Signer};
///
/// let signer = Signer::new(Credentials::new("ck", "cs", "at", "ats"));
/// let header = signer.sign(&SignatureRequest::new("POST", "https://api.twitter.com/2/tweets"));
/// assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\""));
/// ```
#[derive(Clone)]
pub struct Signer {
    credentials: Credentials,
    debug: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("credentials", &self.credentials)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            debug: false,
            sink: Arc::new(LogSink),
        }
    }

    /// Turns masked diagnostics on or off.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sends diagnostics to `sink` instead of the log.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Builds the `Authorization` header value with a fresh nonce and timestamp.
    pub fn sign(&self, request: &SignatureRequest) -> String {
        self.sign_with(request, &generate_nonce(), current_timestamp())
    }

    /// Builds the `Authorization` header value with a caller-supplied nonce and timestamp.
    pub fn sign_with(&self, request: &SignatureRequest, nonce: &str, timestamp: i64) -> String {
        self.compute(request, nonce, timestamp).header
    }

    /// Runs the full signing algorithm and returns every intermediate value.
    pub fn compute(
        &self,
        request: &SignatureRequest,
        nonce: &str,
        timestamp: i64,
    ) -> OAuthSignature {
        let oauth_params = oauth_parameters(&self.credentials, nonce, timestamp);

        let mut all_params: Vec<(&str, &str)> = oauth_params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        all_params.extend(
            request
                .extra_params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let parameter_string = build_parameter_string(&all_params);
        let base_url = normalize_url(&request.url);
        let base_string =
            build_signature_base_string(&request.method, &request.url, &parameter_string);
        let signing_key = build_signing_key(
            &self.credentials.consumer_secret,
            &self.credentials.access_token_secret,
        );
        let signature = base64_hmac_sha1(signing_key.as_bytes(), base_string.as_bytes());

        if self.debug {
            self.emit_diagnostics(&request.method, &base_url, &base_string, &signature);
        }

        let mut header_params = oauth_params;
        header_params.push(("oauth_signature", signature.clone()));
        header_params.sort_by(|a, b| a.0.cmp(b.0));

        let header = format!(
            "OAuth {}",
            header_params
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
                .collect::<Vec<_>>()
                .join(", ")
        );

        OAuthSignature {
            base_url,
            base_string,
            signature,
            header,
        }
    }

    fn emit_diagnostics(&self, method: &str, base_url: &str, base_string: &str, signature: &str) {
        let sink = &self.sink;
        sink.emit("--- OAuth1 debug ---");
        sink.emit(&format!("HTTP Method: {}", method));
        sink.emit(&format!("Base URL: {}", base_url));
        sink.emit(&format!("Base string: {}", base_string));
        sink.emit(&format!(
            "Signing key (masked): {}&{}",
            mask_secret(&self.credentials.consumer_secret),
            mask_secret(&self.credentials.access_token_secret)
        ));
        sink.emit(&format!("Signature: {}", signature));
        sink.emit("--- end OAuth1 debug ---");
    }
}
