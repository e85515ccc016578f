use std::{env, fs, path::PathBuf};

fn id_command(name: &'static str, about: &'static str, value: &'static str) -> clap::Command {
    clap::Command::new(name).about(about).arg(clap::Arg::new(value).required(true))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("bilicard")
        .version("1.0.0")
        .author("bilicard contributors")
        .about("Fetch Bilibili content and print normalized preview JSON")
        .arg(
            clap::arg!(--cookies <FILE> "Credential file")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds for content requests").global(true).default_value("10"))
        .arg(
            clap::arg!(--image_timeout <SECS> "HTTP timeout in seconds for image requests")
                .global(true)
                .default_value("5"),
        )
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").global(true))
        .arg(clap::arg!(--pretty "Pretty-print the JSON response").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        )
        .subcommand(id_command("video", "Video by BV or av id", "ID"))
        .subcommand(id_command("bangumi", "Season by ss id", "ID"))
        .subcommand(id_command("ep", "Season containing an ep id", "ID"))
        .subcommand(id_command("media", "Season behind a md id", "ID"))
        .subcommand(id_command("article", "Article by cv id", "ID"))
        .subcommand(id_command("opus", "Long-form post by opus id", "ID"))
        .subcommand(id_command("dynamic_detail", "Feed entry by id", "ID"))
        .subcommand(id_command("user_dynamic", "Newest feed entry of a user", "UID"))
        .subcommand(id_command("user_live", "Live room of a user", "UID"))
        .subcommand(id_command("live_room", "Live room by room id", "ROOM"))
        .subcommand(id_command("user_info", "Profile with avatar color and newest feed entry", "UID"))
        .subcommand(id_command("user_card", "Profile card", "UID"))
        .subcommand(clap::Command::new("login_url").about("Start a QR code login"))
        .subcommand(id_command("login_check", "Poll a QR code login", "KEY"))
        .subcommand(clap::Command::new("login_status").about("Check whether the stored credential is accepted"))
        .subcommand(id_command("link", "Detect a link in text and fetch what it points at", "TEXT"))
        .subcommand(
            id_command("render", "Render a saved opus or article payload", "FILE").arg(
                clap::arg!(-f --format <FORMAT> "Output format (html, markdown)")
                    .default_value("html")
                    .value_parser(["html", "markdown"]),
            )
            .arg(clap::arg!(--"no-images" "Leave images out of Markdown output")),
        )
        .subcommand(id_command("focus", "Focus color of a local image", "FILE"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "bilicard", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "bilicard", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "bilicard", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "bilicard", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
