use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::{debug, error, warn};
use millionaire::db::ProgressDb;
use millionaire::lifeline::{GeminiClient, GeminiConfig};
use millionaire::session::play_game;
use millionaire::store::{self, OpenTdbClient, StoreConfig, TriviaConfig};
use millionaire::Error;
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use crate::cli::TerminalConsole;

#[derive(Parser, Debug)]
#[command(name = "Who Wants to be a Millionaire!?")]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "millionaire.db")]
    db: PathBuf,
    #[arg(short, long, value_name = "FILE", default_value = "questions.json")]
    cache: PathBuf,
    /// Fetch a fresh question set even if a cache exists.
    #[arg(short, long)]
    refresh: bool,
    #[arg(long, default_value = "https://opentdb.com/api.php")]
    trivia_url: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
    #[arg(long, default_value = "gemini-1.5-flash")]
    gemini_model: String,
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    gemini_endpoint: String,
    #[arg(short, long, default_value = "error")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::InputClosed) => {
            warn!("[Setup] Input closed, leaving the game.");
            println!("\n{}", "Leaving the studio early!".cyan());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("[Setup] {}", err);
            println!("{}", format!("{}", err).red());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    // INIT START
    let mut progress = ProgressDb::open_fresh(&args.db)?;
    debug!("[DB] Progress table ready at {:?}", args.db);

    let store_config = StoreConfig::default();
    let trivia = OpenTdbClient::new(TriviaConfig {
        url: args.trivia_url,
        ..TriviaConfig::default()
    })?;
    let questions = store::load(&trivia, &store_config, &args.cache, args.refresh)?;
    debug!("[Setup] Questions: {:?}", questions.len());
    cli::print_shortfalls(&questions, store_config.per_difficulty);
    if questions.is_empty() {
        println!(
            "{}",
            "No questions could be fetched. Check your connection and try again!".yellow()
        );
        progress.close()?;
        return Err(Error::NoQuestions);
    }

    let gemini = GeminiClient::new(GeminiConfig {
        endpoint: args.gemini_endpoint,
        model: args.gemini_model,
        api_key: args.gemini_api_key,
        ..GeminiConfig::default()
    })?;
    // INIT DONE

    cli::print_welcome();
    let summary = play_game(
        &questions,
        &mut TerminalConsole,
        &gemini,
        &mut progress,
        &mut rand::rng(),
    )?;

    cli::print_summary(&summary);
    cli::print_progress(&progress.fetch_progress()?);
    progress.close()?;
    Ok(())
}
