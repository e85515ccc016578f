//! Command dispatch.
//!
//! A [`Service`] owns the remote client and the credential store and maps one
//! [`Command`] to one [`Response`]. The credential is loaded once per
//! dispatch and handed to the aggregator; only a confirmed login writes it.

use serde_json::{Value, json};

use crate::aggregate::ContentAggregator;
use crate::credential::{Credential, CredentialStore};
use crate::fallback::{first_i64, first_str};
use crate::link::{Link, clean_url};
use crate::login::{LoginSession, LoginTransport};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{BiliError, Response, Result};

/// Upstream code for "not logged in" on the nav endpoint.
const CODE_NOT_LOGGED_IN: i64 = -101;

/// One top-level operation and its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Video(String),
    Bangumi(String),
    Episode(String),
    Media(String),
    Article(String),
    Opus(String),
    DynamicDetail(String),
    UserDynamic(String),
    UserLive(String),
    LiveRoom(String),
    UserInfo(String),
    UserCard(String),
    LoginUrl,
    LoginCheck(String),
    LoginStatus,
    /// Free text that may contain a platform link or a shared mini-app card.
    Link(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Video(_) => "video",
            Command::Bangumi(_) => "bangumi",
            Command::Episode(_) => "ep",
            Command::Media(_) => "media",
            Command::Article(_) => "article",
            Command::Opus(_) => "opus",
            Command::DynamicDetail(_) => "dynamic_detail",
            Command::UserDynamic(_) => "user_dynamic",
            Command::UserLive(_) => "user_live",
            Command::LiveRoom(_) => "live_room",
            Command::UserInfo(_) => "user_info",
            Command::UserCard(_) => "user_card",
            Command::LoginUrl => "login_url",
            Command::LoginCheck(_) => "login_check",
            Command::LoginStatus => "login_status",
            Command::Link(_) => "link",
        }
    }
}

/// Runs commands against a remote client and a credential store.
pub struct Service<C, S> {
    client: C,
    store: S,
}

impl<C, S> Service<C, S>
where
    C: ContentSource + ImageFetcher + LoginTransport,
    S: CredentialStore,
{
    pub fn new(client: C, store: S) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Executes one command. Never fails: every error becomes an error
    /// response.
    pub async fn dispatch(&self, command: Command) -> Response {
        tracing::debug!(command = command.name(), "dispatching");
        match command {
            Command::LoginUrl => match LoginSession::begin(&self.client).await {
                Ok(session) => session.ticket_response(),
                Err(e) => e.into(),
            },
            Command::LoginCheck(key) => {
                if key.trim().is_empty() {
                    return Response::error("missing login key");
                }
                LoginSession::resume(key.trim()).poll(&self.client, &self.store).await
            }
            Command::LoginStatus => self.login_status().await.into(),
            Command::Link(text) => self.follow_link(&text).await,
            content => {
                let credential = self.store.load();
                self.run_content(content, credential).await
            }
        }
    }

    fn aggregator(&self, credential: Option<Credential>) -> ContentAggregator<&C, &C> {
        ContentAggregator::new(&self.client, &self.client).with_credential(credential)
    }

    async fn run_content(&self, command: Command, credential: Option<Credential>) -> Response {
        let aggregator = self.aggregator(credential);
        match command {
            Command::Video(id) => aggregator.video(&id).await,
            Command::Bangumi(id) => aggregator.bangumi(&id).await,
            Command::Episode(id) => aggregator.episode(&id).await,
            Command::Media(id) => aggregator.media(&id).await,
            Command::Article(id) => aggregator.article(&id).await,
            Command::Opus(id) => aggregator.opus(&id).await,
            Command::DynamicDetail(id) => aggregator.dynamic_detail(&id).await,
            Command::UserDynamic(id) => aggregator.user_dynamic(&id).await,
            Command::UserLive(id) => aggregator.user_live(&id).await,
            Command::LiveRoom(id) => aggregator.live_room(&id).await,
            Command::UserInfo(id) => aggregator.user_info(&id).await,
            Command::UserCard(id) => aggregator.user_card(&id).await,
            Command::LoginUrl | Command::LoginCheck(_) | Command::LoginStatus | Command::Link(_) => {
                Response::error(format!("{} is not a content command", command.name()))
            }
        }
    }

    /// Detects a link in `text`, resolving short links first, and runs the
    /// content operation it names.
    async fn follow_link(&self, text: &str) -> Response {
        match self.resolve_link(text).await {
            Ok(link) => {
                let credential = self.store.load();
                self.run_content(link_command(link), credential).await
            }
            Err(e) => e.into(),
        }
    }

    async fn resolve_link(&self, text: &str) -> Result<Link> {
        let unsupported = || BiliError::UnsupportedLink(text.trim().to_string());
        let card = serde_json::from_str::<Value>(text).ok();
        let link = card
            .as_ref()
            .and_then(Link::detect_in_mini_app)
            .or_else(|| Link::detect(text))
            .ok_or_else(unsupported)?;

        match link {
            Link::Short(short) => {
                let target = clean_url(&self.client.resolve_short_link(&short).await?);
                tracing::debug!(short = %short, target = %target, "short link resolved");
                Link::detect(&target).filter(|link| !link.is_short()).ok_or_else(unsupported)
            }
            link => Ok(link),
        }
    }

    /// Whether the stored credential is still accepted upstream.
    async fn login_status(&self) -> Result<Response> {
        let Some(credential) = self.store.load() else {
            return Ok(Response::data(json!({ "is_login": false })));
        };

        match self.client.get(&Endpoint::Nav, Some(&credential)).await {
            Ok(nav) => Ok(Response::data(json!({
                "is_login": nav.get("isLogin").and_then(Value::as_bool).unwrap_or(false),
                "mid": first_i64(&nav, &["/mid"]),
                "uname": first_str(&nav, &["/uname"]),
                "face": first_str(&nav, &["/face"]),
                "level": first_i64(&nav, &["/level_info/current_level"]),
                "vip_label": first_str(&nav, &["/vip_label/text", "/vip/label/text"]),
            }))),
            Err(BiliError::Api { code: CODE_NOT_LOGGED_IN, .. }) => Ok(Response::data(json!({ "is_login": false }))),
            Err(e) => Err(e),
        }
    }
}

/// Content command a detected link maps to.
pub fn link_command(link: Link) -> Command {
    match link {
        Link::Video(id) => Command::Video(id.to_string()),
        Link::Dynamic(id) => Command::DynamicDetail(id.to_string()),
        Link::Opus(id) => Command::Opus(id.to_string()),
        Link::Article(id) => Command::Article(id.to_string()),
        Link::Season(id) => Command::Bangumi(id.to_string()),
        Link::Episode(id) => Command::Episode(id.to_string()),
        Link::Media(id) => Command::Media(id.to_string()),
        Link::Live(id) => Command::LiveRoom(id.to_string()),
        Link::User(id) => Command::UserInfo(id.to_string()),
        Link::Short(url) => Command::Link(url),
    }
}
