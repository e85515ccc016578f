//! HTTP access to the platform.
//!
//! [`BiliClient`] implements every remote collaborator: structured content
//! ([`ContentSource`]), image bytes ([`ImageFetcher`]) and the QR login
//! endpoints ([`LoginTransport`]). Each call is a single attempt bounded by
//! the configured timeout; there is no retry.

use std::time::Duration;

use reqwest::header::{COOKIE, REFERER, SET_COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response as HttpResponse};
use serde_json::Value;
use url::Url;

use crate::credential::Credential;
use crate::fallback::{degrade, first_i64, first_str};
use crate::login::{CODE_DONE, LoginTransport, PollSignal, QrTicket};
use crate::source::{ContentSource, Endpoint, ImageFetcher, absolutize};
use crate::{BiliError, Result};

const QR_GENERATE_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/generate";
const QR_POLL_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/poll";

/// HTTP client configuration.
///
/// This struct controls timeouts and the identifying headers sent with
/// every request.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds for structured content.
    pub timeout: u64,
    /// Request timeout in seconds for image bytes.
    pub image_timeout: u64,
    /// User-Agent header.
    pub user_agent: String,
    /// Referer header. Several endpoints reject requests without one.
    pub referer: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            image_timeout: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referer: "https://www.bilibili.com/".to_string(),
        }
    }
}

/// reqwest-backed platform client.
#[derive(Debug, Clone)]
pub struct BiliClient {
    client: Client,
    config: FetchConfig,
}

impl BiliClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(BiliError::HttpError)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn request(&self, url: &str, timeout: u64) -> RequestBuilder {
        self.client
            .get(url)
            .timeout(Duration::from_secs(timeout))
            .header(USER_AGENT, &self.config.user_agent)
            .header(REFERER, &self.config.referer)
    }

    async fn send(&self, builder: RequestBuilder, timeout: u64) -> Result<HttpResponse> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() { BiliError::Timeout { timeout } } else { BiliError::HttpError(e) }
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)], credential: Option<&Credential>) -> Result<Value> {
        let mut builder = self.request(url, self.config.timeout).query(query);
        if let Some(credential) = credential.filter(|c| !c.is_empty()) {
            builder = builder.header(COOKIE, credential.cookie_header());
        }
        let response = self.send(builder, self.config.timeout).await?;
        Ok(response.json::<Value>().await?)
    }

    /// Device id for a login that did not set one.
    async fn fetch_device_id(&self) -> Result<String> {
        let data = self.get(&Endpoint::FingerSpi, None).await?;
        first_str(&data, &["/b_3"])
            .map(str::to_string)
            .ok_or_else(|| BiliError::MissingField("/b_3".to_string()))
    }
}

impl ContentSource for BiliClient {
    async fn get(&self, endpoint: &Endpoint, credential: Option<&Credential>) -> Result<Value> {
        tracing::debug!(endpoint = endpoint.name(), query = ?endpoint.query(), "fetching");
        let body = self.get_json(&endpoint.url(), &endpoint.query(), credential).await?;
        unwrap_envelope(body)
    }

    async fn resolve_short_link(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| BiliError::InvalidUrl(e.to_string()))?;
        tracing::debug!(url = %parsed, "resolving short link");
        let response = self.send(self.request(parsed.as_str(), self.config.timeout), self.config.timeout).await?;
        Ok(response.url().to_string())
    }
}

impl ImageFetcher for BiliClient {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        if url.is_empty() {
            return Err(BiliError::InvalidUrl("empty image url".to_string()));
        }
        let url = absolutize(url);
        let timeout = self.config.image_timeout;
        let response = self.send(self.request(&url, timeout), timeout).await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl LoginTransport for BiliClient {
    async fn generate(&self) -> Result<QrTicket> {
        let data = unwrap_envelope(self.get_json(QR_GENERATE_URL, &[], None).await?)?;
        let url = first_str(&data, &["/url"]).ok_or_else(|| BiliError::MissingField("/url".to_string()))?;
        let key =
            first_str(&data, &["/qrcode_key"]).ok_or_else(|| BiliError::MissingField("/qrcode_key".to_string()))?;
        Ok(QrTicket { url: url.to_string(), key: key.to_string() })
    }

    async fn poll(&self, key: &str) -> Result<PollSignal> {
        let builder = self.request(QR_POLL_URL, self.config.timeout).query(&[("qrcode_key", key)]);
        let response = self.send(builder, self.config.timeout).await?;

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let data = unwrap_envelope(response.json::<Value>().await?)?;

        let code = first_i64(&data, &["/code"]).ok_or_else(|| BiliError::MissingField("/code".to_string()))?;
        if code != CODE_DONE {
            return Ok(PollSignal::from_code(code));
        }

        let mut credential = credential_from_set_cookie(set_cookies.iter().map(String::as_str));
        if credential.is_empty()
            && let Some(url) = first_str(&data, &["/url"])
        {
            credential = credential_from_url(url, credential);
        }
        if credential.device_id.is_empty()
            && let Some(device_id) = degrade("buvid3", self.fetch_device_id().await)
        {
            credential.device_id = device_id;
        }

        Ok(PollSignal::Confirmed(credential))
    }
}

/// Unwraps `{code, message, data|result}`. A non-zero code is an API error.
pub fn unwrap_envelope(body: Value) -> Result<Value> {
    let code = first_i64(&body, &["/code"]).unwrap_or(0);
    if code != 0 {
        let message = first_str(&body, &["/message", "/msg"]).unwrap_or("request rejected").to_string();
        return Err(BiliError::Api { code, message });
    }

    match body {
        Value::Object(mut map) => Ok(map
            .remove("data")
            .filter(|v| !v.is_null())
            .or_else(|| map.remove("result"))
            .unwrap_or(Value::Null)),
        _ => Err(BiliError::MissingField("/data".to_string())),
    }
}

/// Picks the session cookies out of `Set-Cookie` header values.
pub fn credential_from_set_cookie<'a>(headers: impl IntoIterator<Item = &'a str>) -> Credential {
    let mut credential = Credential::default();
    for header in headers {
        let pair = header.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        assign_cookie(&mut credential, name.trim(), value.trim());
    }
    credential
}

/// Fills missing credential parts from the query string of the cross-domain
/// URL returned by a confirmed poll.
pub fn credential_from_url(url: &str, mut credential: Credential) -> Credential {
    let Ok(parsed) = Url::parse(url) else {
        return credential;
    };
    for (name, value) in parsed.query_pairs() {
        let slot = match name.as_ref() {
            "SESSDATA" => &credential.session_token,
            "bili_jct" => &credential.cross_site_token,
            "buvid3" => &credential.device_id,
            _ => continue,
        };
        if slot.is_empty() {
            assign_cookie(&mut credential, &name, &value);
        }
    }
    credential
}

fn assign_cookie(credential: &mut Credential, name: &str, value: &str) {
    match name {
        "SESSDATA" => credential.session_token = value.to_string(),
        "bili_jct" => credential.cross_site_token = value.to_string(),
        "buvid3" => credential.device_id = value.to_string(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 10);
        assert_eq!(config.image_timeout, 5);
        assert!(config.referer.contains("bilibili.com"));
    }

    #[test]
    fn test_unwrap_envelope_data() {
        let data = unwrap_envelope(json!({"code": 0, "message": "0", "data": {"bvid": "BV1"}})).unwrap();
        assert_eq!(data, json!({"bvid": "BV1"}));
    }

    #[test]
    fn test_unwrap_envelope_result() {
        let data = unwrap_envelope(json!({"code": 0, "result": {"season_id": 1}})).unwrap();
        assert_eq!(data, json!({"season_id": 1}));
    }

    #[test]
    fn test_unwrap_envelope_error_code() {
        let err = unwrap_envelope(json!({"code": -404, "message": "啥都木有"})).unwrap_err();
        assert!(matches!(err, BiliError::Api { code: -404, ref message } if message == "啥都木有"));

        let err = unwrap_envelope(json!({"code": 1, "msg": "live says no"})).unwrap_err();
        assert!(err.to_string().contains("live says no"));
    }

    #[test]
    fn test_unwrap_envelope_null_data() {
        assert_eq!(unwrap_envelope(json!({"code": 0, "data": null})).unwrap(), Value::Null);
        assert!(unwrap_envelope(json!([1, 2])).is_err());
    }

    #[test]
    fn test_credential_from_set_cookie() {
        let headers = [
            "SESSDATA=abc%2C123; Path=/; Domain=bilibili.com; HttpOnly",
            "bili_jct=def; Path=/",
            "DedeUserID=42; Path=/",
            "malformed",
        ];
        let credential = credential_from_set_cookie(headers);
        assert_eq!(credential, Credential::new("abc%2C123", "def", ""));
    }

    #[test]
    fn test_credential_from_url_fills_gaps() {
        let url = "https://passport.biligame.com/crossDomain?DedeUserID=42&SESSDATA=s&bili_jct=j&gourl=x";
        let credential = credential_from_url(url, Credential::new("", "", "dev"));
        assert_eq!(credential, Credential::new("s", "j", "dev"));

        let kept = credential_from_url(url, Credential::new("mine", "", ""));
        assert_eq!(kept.session_token, "mine");
        assert_eq!(kept.cross_site_token, "j");
    }

    #[tokio::test]
    async fn test_empty_image_url_is_rejected() {
        let client = BiliClient::new(FetchConfig::default()).unwrap();
        assert!(matches!(client.fetch_image("").await, Err(BiliError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_resolve_invalid_short_link() {
        let client = BiliClient::new(FetchConfig::default()).unwrap();
        assert!(matches!(client.resolve_short_link("not a url").await, Err(BiliError::InvalidUrl(_))));
    }
}
