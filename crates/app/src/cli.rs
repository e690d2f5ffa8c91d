//! Command-line options.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::builder::{FalseyValueParser, Styles};
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::{ArgAction, Parser};
use hopcheck_domain::{ClientSettings, DomainResult};

/// Replays fixture requests and checks every hop of their redirect chains.
#[derive(Debug, Parser)]
#[command(name = "hopcheck", version, about, styles = cli_styles())]
pub struct Cli {
    /// Fixture files, run in the order given.
    #[arg(required = true, value_name = "FIXTURE")]
    pub fixtures: Vec<PathBuf>,

    /// Extra request header, `Name: value`. Repeatable.
    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        env = "HOPCHECK_HEADERS",
        value_delimiter = '\n'
    )]
    pub headers: Vec<String>,

    /// Cookie sent with every request, `name=value`. Repeatable.
    #[arg(
        short = 'b',
        long = "cookie",
        value_name = "COOKIE",
        env = "HOPCHECK_COOKIES",
        value_delimiter = ';'
    )]
    pub cookies: Vec<String>,

    /// User-Agent header value.
    #[arg(short = 'A', long, env = "HOPCHECK_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Do not send cache-suppressing request headers.
    #[arg(long, env = "HOPCHECK_ALLOW_CACHE", value_parser = FalseyValueParser::new())]
    pub allow_cache: bool,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        value_name = "SECONDS",
        env = "HOPCHECK_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub timeout: u64,

    /// More log output (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Parse the fixtures and print them as JSON without sending requests.
    #[arg(long)]
    pub parse_only: bool,

    /// Disable coloured output. `NO_COLOR` set to anything but an empty,
    /// `0`, `false`, `no` or `off` value does the same.
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,
}

impl Cli {
    /// Builds the transport settings from the options.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` for a malformed header or cookie option.
    pub fn client_settings(&self) -> DomainResult<ClientSettings> {
        let mut settings = ClientSettings {
            timeout_ms: self.timeout.saturating_mul(1000),
            no_cache: !self.allow_cache,
            ..ClientSettings::default()
        };
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent.clone_from(user_agent);
        }
        for header in self.headers.iter().filter(|h| !h.trim().is_empty()) {
            settings.add_header(header)?;
        }
        for cookie in self.cookies.iter().filter(|c| !c.trim().is_empty()) {
            settings.add_cookie(cookie)?;
        }
        Ok(settings)
    }

    /// Colour is used on a terminal unless disabled.
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stderr().is_terminal()
    }

    /// Default log filter for the requested verbosity.
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn cli_styles() -> Styles {
    Styles::styled()
        .usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
        .header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
}
