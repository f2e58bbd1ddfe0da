mod app;
mod calendar;
mod clock;
mod color;
mod help;
mod jumpto;
mod logging;
mod project;
mod projlist;
mod theme;
use crate::app::App;
use crate::calendar::parse_ymd;
use crate::clock::SystemClock;
use crate::project::JsonFile;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::ffi::OsString;
use std::path::PathBuf;
use time::Date;

const PROJECTS_VAR: &str = "SITECAL_PROJECTS";
const LOG_DIR_VAR: &str = "SITECAL_LOG_DIR";
const LOG_LEVEL_VAR: &str = "SITECAL_LOG_LEVEL";

const DEFAULT_PROJECTS: &str = "projects.json";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Eq, PartialEq)]
struct Config {
    date: Option<Date>,
    projects: PathBuf,
    log_dir: Option<PathBuf>,
    log_level: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Config),
    Help,
    Version,
}

impl Command {
    /// Parse the command line, falling back to `env` for any option not
    /// given on it
    fn from_parser<F>(mut parser: Parser, env: F) -> Result<Command, lexopt::Error>
    where
        F: Fn(&'static str) -> Option<OsString>,
    {
        let mut date = None;
        let mut projects = None;
        let mut log_dir = None;
        let mut log_level = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('p') | Arg::Long("projects") => {
                    projects = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("log-dir") => log_dir = Some(PathBuf::from(parser.value()?)),
                Arg::Long("log-level") => log_level = Some(parser.value()?.string()?),
                Arg::Value(value) if date.is_none() => {
                    let value = value.string()?;
                    match parse_ymd(&value) {
                        Ok(d) => date = Some(d),
                        Err(e) => {
                            return Err(lexopt::Error::ParsingFailed {
                                value,
                                error: Box::new(e),
                            })
                        }
                    }
                }
                _ => return Err(arg.unexpected()),
            }
        }
        let projects = projects
            .or_else(|| env(PROJECTS_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS));
        let log_dir = log_dir.or_else(|| env(LOG_DIR_VAR).map(PathBuf::from));
        let log_level = match log_level {
            Some(level) => level,
            None => match env(LOG_LEVEL_VAR) {
                Some(level) => level
                    .into_string()
                    .map_err(lexopt::Error::NonUnicodeValue)?,
                None => String::from(DEFAULT_LOG_LEVEL),
            },
        };
        Ok(Command::Run(Config {
            date,
            projects,
            log_dir,
            log_level,
        }))
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run(config) => {
                // Must come before anything starts a thread
                let clock =
                    SystemClock::new().context("failed to determine local time offset")?;
                let _logger = config
                    .log_dir
                    .as_deref()
                    .map(|dir| logging::init(&config.log_level, dir))
                    .transpose()
                    .context("failed to set up logging")?;
                let source = JsonFile::new(config.projects);
                log::info!("Reading projects from {}", source.path().display());
                let app = App::new(clock, source, config.date)
                    .context("failed to determine local date")?;
                with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    app.run(terminal)
                })
            }
            Command::Help => {
                println!("Usage: sitecal [OPTIONS] [YYYY-MM-DD]");
                println!();
                println!("Terminal calendar shading the days booked by construction projects");
                println!();
                println!("Options:");
                println!(
                    "  -p, --projects FILE   JSON file of projects to show [env: {PROJECTS_VAR}]"
                );
                println!("                        [default: {DEFAULT_PROJECTS}]");
                println!("      --log-dir DIR     Write log files to DIR [env: {LOG_DIR_VAR}]");
                println!(
                    "      --log-level LEVEL Log level or flexi_logger spec [env: {LOG_LEVEL_VAR}]"
                );
                println!("                        [default: {DEFAULT_LOG_LEVEL}]");
                println!("  -h, --help            Display this help message and exit");
                println!("  -V, --version         Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env(), std::env::var_os)?.run()
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
