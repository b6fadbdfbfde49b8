//! # Run Command Module / 运行命令模块
//!
//! This module implements the default command of the runner: it loads the
//! suite configuration, probes the service, executes every combination in
//! order and writes the CSV (and optionally HTML) report. Partial results are
//! saved when the run is interrupted.
//!
//! 此模块实现了运行器的默认命令：加载测试套件配置，探测服务，按顺序执行每个组合，
//! 并写入 CSV（以及可选的 HTML）报告。运行中断时会保存部分结果。

use anyhow::{bail, Result};
use chrono::Local;
use colored::*;
use std::{path::PathBuf, time::Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{self, SuiteConfig},
        execution::ApiCaller,
        models::{ReportRow, TestRecord},
        planner::{self, ExecutionPlan},
    },
    infra::{
        fs::{ensure_dir, timestamped_report_path},
        http::{self, HealthStatus},
        t,
    },
    reporting::{
        console::{print_progress, print_summary, print_test_header, print_test_outcome, RunSummary},
        csv::write_results,
        html::generate_html_report,
    },
};

/// Options of a suite run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Wait for the user after each test.
    pub pause: bool,
    /// Also write an HTML report.
    pub html: bool,
    /// Replaces the configured `base_url`.
    pub host: Option<String>,
    pub output_dir: PathBuf,
    pub health_check: bool,
    /// Answer yes to the health-check prompt.
    pub assume_yes: bool,
}

/// Why the test loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Completed,
    Interrupted,
    UserQuit,
}

/// The user's answer to the pause prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseChoice {
    Continue,
    SkipPauses,
    Quit,
}

impl PauseChoice {
    fn from_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "q" => Self::Quit,
            "s" => Self::SkipPauses,
            _ => Self::Continue,
        }
    }
}

/// Executes the run command.
///
/// Completed and interrupted runs both return `Ok`: the outcome of individual
/// tests is reported in the files and the summary, not the exit status.
///
/// # Errors
/// Returns an error when the configuration is missing or invalid, when the
/// user declines to continue after a failed health check, or when no
/// combination can be formed.
pub async fn execute(options: RunOptions) -> Result<()> {
    println!("{}", t!("run.banner").bold());
    println!("{}", "=".repeat(50));

    let config = load_config(&options)?;

    if options.health_check {
        ensure_service_reachable(&config.base_url, options.assume_yes).await?;
    }

    let plan = planner::plan_execution(&config)?;
    let caller = ApiCaller::new(&config)?;
    ensure_dir(&options.output_dir)?;

    print_plan(&config, &plan, caller.url());

    let stop_token = setup_signal_handler();
    let started = Instant::now();
    let mut records = Vec::with_capacity(plan.len());

    let exit = run_tests(&plan, &caller, &mut records, options.pause, &stop_token).await;
    let interrupted = exit != LoopExit::Completed;

    if interrupted {
        println!("\n{}", t!("run.interrupted").yellow().bold());
        if records.is_empty() {
            println!("{}", t!("run.nothing_to_save"));
        } else {
            println!("{}", t!("run.saving_partial", count = records.len()));
        }
    }

    save_and_report(&options, &config, &records, plan.len(), started, interrupted);
    Ok(())
}

fn load_config(options: &RunOptions) -> Result<SuiteConfig> {
    let path = &options.config_path;
    if !path.exists() {
        println!("{}", t!("run.config_not_found", path = path.display()).red());
        println!("{}", t!("run.usage_hint"));
        bail!("{}", t!("run.config_missing", path = path.display()));
    }

    let mut config = config::load_suite_config(path)?;
    println!(
        "{}",
        t!("run.config_loaded", name = &config.test_suite_name, path = path.display()).green()
    );

    if let Some(host) = &options.host {
        config.apply_host_override(host);
        config.validate()?;
        println!("{}", t!("run.host_override", host = &config.base_url).cyan());
    }

    Ok(config)
}

/// Probes `{base_url}/health`. Only an unreachable service stops the run, and
/// only when the user does not confirm.
async fn ensure_service_reachable(base_url: &str, assume_yes: bool) -> Result<()> {
    println!("{}", t!("health.checking", url = http::health_url(base_url)));

    match http::check_health(base_url).await {
        HealthStatus::Healthy => println!("{}", t!("health.ok").green()),
        HealthStatus::Unhealthy(code) => {
            println!("{}", t!("health.unhealthy", status = code).yellow())
        }
        HealthStatus::Unknown(error) => {
            println!("{}", t!("health.unknown", error = &error).yellow())
        }
        HealthStatus::Unreachable(error) => {
            tracing::debug!(%error, "health probe could not connect");
            println!("{}", t!("health.unreachable", url = base_url).red());
            println!("{}", t!("health.start_server_hint"));

            if assume_yes {
                println!("{}", t!("health.continuing").yellow());
            } else if !confirm(t!("health.continue_prompt").to_string()).await {
                bail!("{}", t!("health.aborted"));
            }
        }
    }
    Ok(())
}

/// Asks a yes/no question on the blocking pool. Defaults to no; a missing
/// terminal or any prompt error also reads as no.
async fn confirm(prompt: String) -> bool {
    tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    })
    .await
    .unwrap_or(false)
}

fn print_plan(config: &SuiteConfig, plan: &ExecutionPlan, target: &str) {
    let [images, locations, persons, pipelines] = plan.axis_sizes;
    println!("\n{}", t!("run.starting").bold());
    println!("{}", t!("run.suite_name", name = &config.test_suite_name));
    println!("{}", t!("run.target", url = target));
    println!(
        "{}",
        t!(
            "run.combinations",
            total = plan.len(),
            images = images,
            locations = locations,
            persons = persons,
            pipelines = pipelines
        )
        .cyan()
    );
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("run.shutdown_signal").yellow());
                token_clone.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    token
}

/// Runs the combinations one at a time, appending a record per finished test.
/// An in-flight test is dropped when the token is cancelled.
async fn run_tests(
    plan: &ExecutionPlan,
    caller: &ApiCaller,
    records: &mut Vec<TestRecord>,
    mut pause: bool,
    stop_token: &CancellationToken,
) -> LoopExit {
    let total = plan.len();

    for (index, combination) in plan.combinations.iter().enumerate() {
        let test_number = index + 1;
        if stop_token.is_cancelled() {
            return LoopExit::Interrupted;
        }

        print_test_header(test_number, total, combination);
        let outcome = tokio::select! {
            _ = stop_token.cancelled() => return LoopExit::Interrupted,
            outcome = caller.call(combination) => outcome,
        };
        print_test_outcome(&outcome);
        records.push(TestRecord::from_outcome(combination, test_number, &outcome));
        print_progress(test_number, total);

        if pause && test_number < total {
            let choice = tokio::select! {
                _ = stop_token.cancelled() => return LoopExit::Interrupted,
                choice = prompt_pause() => choice,
            };
            match choice {
                PauseChoice::Continue => {}
                PauseChoice::SkipPauses => {
                    println!("   {}", t!("run.pauses_disabled"));
                    pause = false;
                }
                PauseChoice::Quit => {
                    println!("   {}", t!("run.user_quit", count = records.len()).yellow());
                    return LoopExit::UserQuit;
                }
            }
        }
    }

    LoopExit::Completed
}

/// Waits for Enter, `q` or `s`. A closed or missing terminal quits.
async fn prompt_pause() -> PauseChoice {
    let prompt = t!("run.pause_prompt").to_string();
    let answer = tokio::task::spawn_blocking(move || {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await;

    match answer {
        Ok(Ok(text)) => PauseChoice::from_answer(&text),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "pause prompt failed");
            PauseChoice::Quit
        }
        Err(e) => {
            tracing::debug!(error = %e, "pause prompt task failed");
            PauseChoice::Quit
        }
    }
}

/// Writes the CSV, prints the summary and, when requested, the HTML report.
/// Failures here are reported but never discard the console summary.
fn save_and_report(
    options: &RunOptions,
    config: &SuiteConfig,
    records: &[TestRecord],
    planned: usize,
    started: Instant,
    interrupted: bool,
) {
    println!("\n{}", t!("run.saving"));
    let saved_at = Local::now();
    let csv_path = timestamped_report_path(&options.output_dir, &saved_at, "csv");
    let csv_saved = match write_results(records, &csv_path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{} {:#}", t!("run.csv_failed").red(), e);
            false
        }
    };

    print_summary(&RunSummary::from_records(records, planned, started.elapsed()));

    if records.is_empty() {
        if csv_saved {
            println!("\n{}", t!("run.empty_results_file", path = csv_path.display()));
        }
        return;
    }

    if csv_saved {
        if interrupted {
            println!("\n{}", t!("run.partial_saved", path = csv_path.display()).yellow());
            println!("{}", t!("run.partial_preserved", count = records.len()).green());
        } else {
            println!("\n{}", t!("run.complete_saved", path = csv_path.display()).green());
        }
    }

    if options.html {
        let html_path = timestamped_report_path(&options.output_dir, &saved_at, "html");
        let rows: Vec<ReportRow> = records.iter().map(ReportRow::from).collect();
        match generate_html_report(&rows, &html_path, &config.test_suite_name) {
            Ok(()) => println!("{}", t!("run.html_saved", path = html_path.display()).green()),
            Err(e) => eprintln!("{} {:#}", t!("run.html_failed").red(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_answers_are_case_insensitive() {
        assert_eq!(PauseChoice::from_answer(""), PauseChoice::Continue);
        assert_eq!(PauseChoice::from_answer(" Q "), PauseChoice::Quit);
        assert_eq!(PauseChoice::from_answer("s"), PauseChoice::SkipPauses);
        assert_eq!(PauseChoice::from_answer("anything"), PauseChoice::Continue);
    }

    #[tokio::test]
    async fn missing_config_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let options = RunOptions {
            config_path: temp.path().join("absent.json"),
            pause: false,
            html: false,
            host: None,
            output_dir: temp.path().to_path_buf(),
            health_check: false,
            assume_yes: false,
        };

        assert!(execute(options).await.is_err());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
