use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use bilicard_core::{
    BiliClient, Command, DEFAULT_FOCUS_COLOR, FetchConfig, FileCredentialStore, MarkdownConfig, Response, Service,
    convert_to_markdown, extract_focus_color, render_payload,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the offline renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderFormat {
    Html,
    Markdown,
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Invalid format: {}. Valid options: html, markdown", s)),
        }
    }
}

/// Fetch Bilibili content and print one normalized JSON response
#[derive(Parser, Debug)]
#[command(name = "bilicard")]
#[command(author = "bilicard contributors")]
#[command(version)]
#[command(about = "Fetch Bilibili content and print normalized preview JSON", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,

    /// Credential file (default: <config dir>/bilicard/cookies.json)
    #[arg(long, global = true, env = "BILICARD_COOKIES", value_name = "FILE")]
    cookies: Option<PathBuf>,

    /// HTTP timeout in seconds for content requests
    #[arg(long, global = true, default_value = "10", value_name = "SECS")]
    timeout: u64,

    /// HTTP timeout in seconds for image requests
    #[arg(long, global = true, default_value = "5", value_name = "SECS")]
    image_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "snake_case")]
enum Cmd {
    /// Video by BV or av id
    Video { id: String },
    /// Season by ss id
    Bangumi { id: String },
    /// Season containing an ep id
    Ep { id: String },
    /// Season behind a md id
    Media { id: String },
    /// Article by cv id
    Article { id: String },
    /// Long-form post by opus id
    Opus { id: String },
    /// Feed entry by id
    DynamicDetail { id: String },
    /// Newest feed entry of a user
    UserDynamic { uid: String },
    /// Live room of a user
    UserLive { uid: String },
    /// Live room by room id
    LiveRoom { room: String },
    /// Profile with avatar color and newest feed entry
    UserInfo { uid: String },
    /// Profile card
    UserCard { uid: String },
    /// Start a QR code login
    LoginUrl,
    /// Poll a QR code login
    LoginCheck { key: String },
    /// Check whether the stored credential is accepted
    LoginStatus,
    /// Detect a link in text and fetch what it points at
    Link {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Render a saved opus or article payload
    Render {
        file: PathBuf,
        /// Output format (html, markdown)
        #[arg(short, long, default_value = "html", value_name = "FORMAT")]
        format: RenderFormat,
        /// Leave images out of Markdown output
        #[arg(long = "no-images")]
        no_images: bool,
    },
    /// Focus color of a local image
    Focus { file: PathBuf },
}

impl Cmd {
    /// The network command this maps to; offline commands are handed back.
    fn into_command(self) -> Result<Command, Cmd> {
        Ok(match self {
            Cmd::Video { id } => Command::Video(id),
            Cmd::Bangumi { id } => Command::Bangumi(id),
            Cmd::Ep { id } => Command::Episode(id),
            Cmd::Media { id } => Command::Media(id),
            Cmd::Article { id } => Command::Article(id),
            Cmd::Opus { id } => Command::Opus(id),
            Cmd::DynamicDetail { id } => Command::DynamicDetail(id),
            Cmd::UserDynamic { uid } => Command::UserDynamic(uid),
            Cmd::UserLive { uid } => Command::UserLive(uid),
            Cmd::LiveRoom { room } => Command::LiveRoom(room),
            Cmd::UserInfo { uid } => Command::UserInfo(uid),
            Cmd::UserCard { uid } => Command::UserCard(uid),
            Cmd::LoginUrl => Command::LoginUrl,
            Cmd::LoginCheck { key } => Command::LoginCheck(key),
            Cmd::LoginStatus => Command::LoginStatus,
            Cmd::Link { text } => Command::Link(text.join(" ")),
            offline @ (Cmd::Render { .. } | Cmd::Focus { .. }) => return Err(offline),
        })
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn render_file(path: &Path, format: RenderFormat, no_images: bool, verbose: bool) -> anyhow::Result<Response> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(raw.len()).bright_white());
    }
    let payload: Value = serde_json::from_str(&raw).context("Failed to parse payload as JSON")?;

    let (kind, rendered) = match render_payload(&payload) {
        Ok(result) => result,
        Err(e) => return Ok(e.into()),
    };
    let data = match format {
        RenderFormat::Html => json!({ "html_content": rendered.html, "plain_text": rendered.plain_text }),
        RenderFormat::Markdown => {
            let config = MarkdownConfig { strip_images: no_images, ..Default::default() };
            let markdown = convert_to_markdown(&rendered.html, &config).context("Failed to convert to Markdown")?;
            json!({ "markdown": markdown, "plain_text": rendered.plain_text })
        }
    };
    Ok(Response::record(kind, data))
}

fn focus_file(path: &Path, verbose: bool) -> anyhow::Result<Response> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(bytes.len()).bright_white());
    }
    let color = extract_focus_color(&bytes);
    Ok(Response::data(json!({
        "focus": color.as_deref().unwrap_or(DEFAULT_FOCUS_COLOR),
        "detected": color.is_some(),
    })))
}

async fn run(args: Args, command: Cmd) -> anyhow::Result<Response> {
    let command = match command.into_command() {
        Ok(command) => command,
        Err(Cmd::Render { file, format, no_images }) => return render_file(&file, format, no_images, args.verbose),
        Err(Cmd::Focus { file }) => return focus_file(&file, args.verbose),
        Err(other) => anyhow::bail!("unexpected offline command: {:?}", other),
    };

    let mut config = FetchConfig { timeout: args.timeout, image_timeout: args.image_timeout, ..Default::default() };
    if let Some(user_agent) = args.user_agent {
        config.user_agent = user_agent;
    }
    tracing::debug!(timeout = config.timeout, image_timeout = config.image_timeout, "building client");
    let client = BiliClient::new(config).context("Failed to build HTTP client")?;
    let store = args.cookies.map(FileCredentialStore::new).unwrap_or_default();
    if args.verbose {
        echo::print_info(&format!("Credential file: {}", store.path().display()));
    }

    let service = Service::new(client, store);
    Ok(service.dispatch(command).await)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "bilicard", &mut io::stdout());
        return Ok(());
    }

    let Some(command) = args.command.take() else {
        Args::command().print_help().context("Failed to print help")?;
        return Ok(());
    };

    init_logging(args.verbose);
    let verbose = args.verbose;
    let pretty = args.pretty;

    if verbose {
        echo::print_banner();
        echo::print_step(1, 2, &format!("Running {:?}", command));
    }

    let started = Instant::now();
    let response = match run(args, command).await {
        Ok(response) => response,
        Err(e) => Response::error(format!("{:#}", e)),
    };

    if verbose {
        echo::print_timing("Elapsed", started.elapsed());
        echo::print_step(2, 2, "Writing response");
        if response.is_error() {
            echo::print_warning("Operation returned an error response");
        } else {
            echo::print_success("Operation succeeded");
        }
        eprintln!();
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response.to_json_string(pretty)).context("Failed to write response")?;
    Ok(())
}
