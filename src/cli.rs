//! # Command-Line Interface Module / 命令行接口模块
//!
//! Builds the localized `clap` command, turns the matches into [`CliArgs`] and
//! dispatches to the matching command.
//!
//! 构建本地化的 `clap` 命令，将匹配结果转换为 [`CliArgs`] 并分派到对应的命令。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, ffi::OsString, path::PathBuf};

use crate::infra::{fs::expand_path, t};
use commands::run::RunOptions;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "test_suite_config.json";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Run the suite.
    Run(RunOptions),
    /// Regenerate the HTML report from a results CSV.
    ReportFromCsv { csv_path: PathBuf, output_dir: PathBuf },
    /// Write a sample configuration file.
    Init { path: PathBuf, assume_yes: bool },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// The locale actually applied.
    pub language: String,
    pub verbose: bool,
    pub command: CliCommand,
}

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` or `--lang=<VALUE>`.
fn pre_parse_language(args: &[OsString]) -> Option<String> {
    let mut iter = args.iter().filter_map(|arg| arg.to_str());
    while let Some(arg) = iter.next() {
        if arg == "--lang" {
            return iter.next().map(str::to_string);
        }
        if let Some(value) = arg.strip_prefix("--lang=") {
            return Some(value.to_string());
        }
    }
    None
}

fn build_cli() -> Command {
    Command::new("api-matrix-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .after_help(t!("cli.after_help").to_string())
        .arg(
            Arg::new("config")
                .help(t!("cli.arg_config").to_string())
                .value_name("CONFIG_FILE")
                .default_value(DEFAULT_CONFIG_FILE)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("pause")
                .short('p')
                .long("pause")
                .help(t!("cli.arg_pause").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help(t!("cli.arg_html").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("html-from-csv")
                .long("html-from-csv")
                .help(t!("cli.arg_html_from_csv").to_string())
                .value_name("CSV_FILE")
                .action(ArgAction::Set)
                .conflicts_with("init"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help(t!("cli.arg_host").to_string())
                .value_name("URL")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .help(t!("cli.arg_output_dir").to_string())
                .value_name("DIR")
                .default_value(".")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-health-check")
                .long("no-health-check")
                .help(t!("cli.arg_no_health_check").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help(t!("cli.arg_yes").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init")
                .long("init")
                .help(t!("cli.arg_init").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.arg_verbose").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang").to_string())
                .value_name("LANGUAGE")
                .action(ArgAction::Set),
        )
}

fn path_arg(matches: &ArgMatches, id: &str) -> PathBuf {
    matches
        .get_one::<String>(id)
        .map(|raw| expand_path(raw))
        .unwrap_or_default()
}

fn args_from_matches(matches: &ArgMatches, language: String) -> CliArgs {
    let config_path = path_arg(matches, "config");
    let output_dir = path_arg(matches, "output-dir");
    let assume_yes = matches.get_flag("yes");

    let command = if let Some(csv) = matches.get_one::<String>("html-from-csv") {
        CliCommand::ReportFromCsv {
            csv_path: expand_path(csv),
            output_dir,
        }
    } else if matches.get_flag("init") {
        CliCommand::Init {
            path: config_path,
            assume_yes,
        }
    } else {
        CliCommand::Run(RunOptions {
            config_path,
            pause: matches.get_flag("pause"),
            html: matches.get_flag("html"),
            host: matches.get_one::<String>("host").cloned(),
            output_dir,
            health_check: !matches.get_flag("no-health-check"),
            assume_yes,
        })
    };

    CliArgs {
        language,
        verbose: matches.get_flag("verbose"),
        command,
    }
}

/// Parses an explicit argument list, the first item being the program name.
///
/// # Errors
/// Returns the `clap` error for unknown flags, missing values, `--help` and
/// `--version`.
pub fn try_parse_args_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let language = match pre_parse_language(&args) {
        Some(requested) => crate::init_locale(&requested),
        None => crate::init(),
    };

    let matches = build_cli().try_get_matches_from(args)?;
    Ok(args_from_matches(&matches, language))
}

/// Parses the process arguments, exiting with clap's message and status on error.
pub fn parse_args() -> CliArgs {
    try_parse_args_from(env::args_os()).unwrap_or_else(|e| e.exit())
}

/// Runs the parsed command.
///
/// # Errors
/// Returns an error when the command fails before producing its output.
pub async fn process_command(args: CliArgs) -> Result<()> {
    tracing::debug!(language = %args.language, command = ?args.command, "dispatching command");

    match args.command {
        CliCommand::Run(options) => commands::run::execute(options).await,
        CliCommand::ReportFromCsv {
            csv_path,
            output_dir,
        } => commands::report::execute(&csv_path, &output_dir),
        CliCommand::Init { path, assume_yes } => commands::init::execute(&path, assume_yes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        let mut full = vec!["api-matrix-runner"];
        full.extend_from_slice(args);
        try_parse_args_from(full).unwrap()
    }

    #[test]
    fn defaults_run_the_default_config() {
        let args = parse(&[]);
        match args.command {
            CliCommand::Run(options) => {
                assert_eq!(options.config_path, PathBuf::from(DEFAULT_CONFIG_FILE));
                assert!(!options.pause);
                assert!(!options.html);
                assert!(options.health_check);
                assert_eq!(options.host, None);
                assert_eq!(options.output_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_flags_are_collected() {
        let args = parse(&["suite.json", "-p", "--html", "--host", "staging:9000", "--no-health-check", "-v"]);
        assert!(args.verbose);
        match args.command {
            CliCommand::Run(options) => {
                assert_eq!(options.config_path, PathBuf::from("suite.json"));
                assert!(options.pause);
                assert!(options.html);
                assert_eq!(options.host.as_deref(), Some("staging:9000"));
                assert!(!options.health_check);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn html_from_csv_selects_report_command() {
        let args = parse(&["--html-from-csv", "results.csv", "--output-dir", "out"]);
        assert_eq!(
            args.command,
            CliCommand::ReportFromCsv {
                csv_path: PathBuf::from("results.csv"),
                output_dir: PathBuf::from("out"),
            }
        );
    }

    #[test]
    fn missing_flag_value_is_an_error() {
        assert!(try_parse_args_from(["api-matrix-runner", "--host"]).is_err());
        assert!(try_parse_args_from(["api-matrix-runner", "--html-from-csv"]).is_err());
    }

    #[test]
    fn language_is_pre_parsed_in_both_forms() {
        let split: Vec<OsString> = ["x", "--lang", "zh-CN"].iter().map(OsString::from).collect();
        let joined: Vec<OsString> = ["x", "--lang=en"].iter().map(OsString::from).collect();
        assert_eq!(pre_parse_language(&split).as_deref(), Some("zh-CN"));
        assert_eq!(pre_parse_language(&joined).as_deref(), Some("en"));
        assert_eq!(pre_parse_language(&[]), None);
    }
}
