use clap::Parser;
use std::path::PathBuf;
use thalli_config::ThalliConfig;

#[derive(Parser, Debug)]
#[command(name = "thalli")]
#[command(about = "Clean and summarize web pages, search results, and video transcripts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML); replaces the default lookup
    #[arg(long, value_name = "FILE", env = "THALLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Character budget for an extracted page
    #[arg(long, value_name = "N")]
    pub max_chars: Option<usize>,

    /// Search results compared per query
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..=10))]
    pub results: Option<u64>,

    /// Print answers as JSON
    #[arg(long)]
    pub json: bool,

    /// Check that the configured LLM answers, then exit
    #[arg(long, conflicts_with = "input")]
    pub check: bool,

    /// URL, video link, or search query; omit for an interactive prompt
    #[arg(value_name = "INPUT")]
    pub input: Vec<String>,
}

impl Cli {
    /// Words of the positional input joined back into one string.
    pub fn input(&self) -> Option<String> {
        let joined = self.input.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Command-line flags win over file and environment values.
    pub fn apply_overrides(&self, cfg: &mut ThalliConfig) {
        if let Some(max_chars) = self.max_chars {
            cfg.extract.max_chars = max_chars;
        }
        if let Some(results) = self.results {
            cfg.search.results = results as usize;
        }
    }
}
