use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thalli_common::observability::init_logging;
use thalli_config::{ThalliConfig, ThalliConfigLoader, default_config_path};
use thalli_web::{
    Answer, DuckDuckGo, HttpPageFetcher, IntelConfig, WebIntel, YouTubeTranscripts,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::Cli;
mod cli;

const QUIT: &str = ":q";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Config: defaults < file < env < flags
    let mut cfg = load_config(&cli)?;
    cli.apply_overrides(&mut cfg);
    cfg.validate()?;

    let log_path = init_logging(cfg.log.to_log_config("thalli"))?;
    tracing::info!(log = %log_path.display(), "app.start");

    if cli.check {
        return check_llm(&cfg).await;
    }

    // 2) Collaborators
    let intel = build_intel(&cfg)?;

    // 3) One shot, or a line-oriented prompt
    match cli.input() {
        Some(input) => Ok(run_once(&intel, &input, cli.json).await),
        None => {
            interactive(&intel, cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<ThalliConfig> {
    let mut loader = ThalliConfigLoader::new();
    match &cli.config {
        Some(path) => loader = loader.with_file(path),
        None => {
            if let Some(path) = default_config_path() {
                loader = loader.with_optional_file(path);
            }
            loader = loader.with_optional_file("thalli.yaml");
        }
    }
    loader.load().context("failed to load configuration")
}

async fn check_llm(cfg: &ThalliConfig) -> Result<ExitCode> {
    let llm = thalli_llm::ensure_llm_ready(&cfg.llm)?;
    let healthy = llm.health_check().await?;
    tracing::info!(model = llm.model_name(), healthy, "app.llm.check");
    if healthy {
        println!("{}: ok", llm.model_name());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}: not responding, see the log for details", llm.model_name());
        Ok(ExitCode::FAILURE)
    }
}

fn build_intel(cfg: &ThalliConfig) -> Result<WebIntel> {
    let llm = thalli_llm::ensure_llm_ready(&cfg.llm)?;
    let user_agent = cfg.http.user_agent.as_deref();
    let timeout = Duration::from_secs(cfg.http.timeout_secs);

    let fetcher = HttpPageFetcher::new(user_agent, timeout)?;
    let search = DuckDuckGo::new(user_agent)?;
    let transcripts = YouTubeTranscripts::new(cfg.video.language.clone(), user_agent)?;

    let config = IntelConfig {
        extract: cfg.extract.clone(),
        results: cfg.search.results,
        page_paragraphs: cfg.search.page_paragraphs,
        // One retry plus backoff on top of the per-request timeout.
        fetch_timeout: timeout * 2 + Duration::from_secs(1),
    };

    Ok(WebIntel::new(
        config,
        Arc::new(fetcher),
        Arc::new(search),
        Arc::new(transcripts),
        llm,
    ))
}

async fn run_once(intel: &WebIntel, input: &str, json: bool) -> ExitCode {
    match answer_and_print(intel, input, json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn interactive(intel: &WebIntel, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Enter a URL, video link, or question ({QUIT} to quit).");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == QUIT {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if let Err(e) = answer_and_print(intel, line, json).await {
            eprintln!("error: {e:#}");
        }
    }
    Ok(())
}

async fn answer_and_print(intel: &WebIntel, input: &str, json: bool) -> Result<()> {
    let answer = intel.answer(input).await.map_err(|e| {
        tracing::warn!(error = %e, input, "app.answer.failed");
        e
    })?;
    println!("{}", render_answer(&answer, json)?);
    Ok(())
}

fn render_answer(answer: &Answer, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(answer)?);
    }
    let mut out = answer.text.trim_end().to_string();
    if !answer.sources.is_empty() {
        out.push_str("\n\nSources:");
        for (i, source) in answer.sources.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, source));
        }
    }
    Ok(out)
}
