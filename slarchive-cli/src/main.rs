use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use slarchive_core::history::DEFAULT_HISTORY_LIMIT;
use slarchive_core::render::SPEAKER_GAP;
use slarchive_core::{
    ArchiveConfig, ArchiveRequest, CacheFile, Directory, HttpTransport, Permalink, RenderOptions,
    SlarchiveError, archive_channel, archive_permalink, parse_timezone,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "slarchive",
    version,
    about = "Archive a Slack thread or channel window as markdown"
)]
struct Cli {
    /// Message permalink like https://<team>.slack.com/archives/<channel>/p<timestamp>[?thread_ts=<ts>]
    #[arg(required_unless_present = "channel", conflicts_with = "channel")]
    link: Option<String>,

    /// Archive a channel by name instead of a permalink
    #[arg(long, requires_all = ["since", "team"])]
    channel: Option<String>,

    /// Timestamp (<seconds>.<fraction>) to start reading from, with --channel
    #[arg(long)]
    since: Option<String>,

    /// Workspace subdomain, with --channel
    #[arg(long)]
    team: Option<String>,

    /// Maximum number of messages to fetch
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: usize,

    /// Wrap the output in a collapsible <details> block
    #[arg(long)]
    details: bool,

    /// Print user IDs instead of resolving them to names
    #[arg(long)]
    no_resolve: bool,

    /// IANA timezone for message times (default UTC)
    #[arg(long, env = "SLARCHIVE_TZ", default_value = "")]
    tz: String,

    /// Identifier cache file (default $XDG_DATA_HOME/slarchive/cache.json)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Slack API token
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Value of the `d` session cookie, required for xoxc- tokens
    #[arg(long, env = "SLACK_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Override the API base URL (default https://<team>.slack.com/api)
    #[arg(long, env = "SLARCHIVE_API_BASE")]
    api_base: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> slarchive_core::Result<()> {
    let link = cli.link.as_deref().map(Permalink::parse).transpose()?;
    let team = match (&link, cli.team.as_deref()) {
        (Some(link), _) => link.team.clone(),
        (None, Some(team)) => team.to_string(),
        (None, None) => {
            return Err(SlarchiveError::InvalidMode(
                "--channel requires --team".to_string(),
            ));
        }
    };

    let request = ArchiveRequest {
        limit: cli.limit,
        details: cli.details,
        resolve_names: !cli.no_resolve,
        render: RenderOptions {
            timezone: parse_timezone(&cli.tz)?,
            speaker_gap: SPEAKER_GAP,
        },
    };

    let token = cli.token.ok_or(SlarchiveError::MissingToken)?;
    let mut transport = match cli.api_base {
        Some(base_url) => HttpTransport::new(base_url, token)?,
        None => HttpTransport::for_team(&team, token)?,
    };
    if let Some(cookie) = cli.cookie {
        transport = transport.with_cookie(cookie);
    }
    debug!(base_url = transport.base_url(), "using slack api");

    let cache_path = match cli.cache {
        Some(path) => path,
        None => ArchiveConfig::from_env_or_home()?.cache_path,
    };
    let mut directory = Directory::open(transport, CacheFile::new(cache_path))?;

    let markdown = match (link, cli.channel.as_deref(), cli.since.as_deref()) {
        (Some(link), _, _) => archive_permalink(&mut directory, &link, &request)?,
        (None, Some(channel), Some(since)) => {
            archive_channel(&mut directory, &team, channel, since, &request)?
        }
        _ => {
            return Err(SlarchiveError::InvalidMode(
                "either a permalink or --channel with --since is required".to_string(),
            ));
        }
    };

    print!("{markdown}");
    if !markdown.ends_with('\n') {
        println!();
    }
    Ok(())
}
