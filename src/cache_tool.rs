use colored::Colorize;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use millionaire::db::ProgressDb;
use millionaire::question::{Difficulty, QuestionSet};
use millionaire::store::{self, OpenTdbClient, StoreConfig, TriviaConfig};

#[derive(Parser, Debug)]
#[command(name = "Millionaire question cache")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "info")]
    log_level: String,
    #[arg(short, long, value_name = "FILE", default_value = "questions.json")]
    cache: PathBuf,
    #[arg(short, long, value_name = "FILE", default_value = "millionaire.db")]
    db: PathBuf,
    #[arg(long, default_value = "https://opentdb.com/api.php")]
    trivia_url: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a fresh question set and overwrite the cache.
    Fetch,
    /// List the cached questions.
    Show,
    /// Print the answers recorded during the last game.
    Progress,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    match args.command {
        Commands::Fetch => {
            let client = match OpenTdbClient::new(TriviaConfig {
                url: args.trivia_url.clone(),
                ..TriviaConfig::default()
            }) {
                Ok(c) => c,
                Err(e) => {
                    error!("{}{}", "Unable to build HTTP client: ".red(), e);
                    exit(1);
                }
            };
            let config = StoreConfig::default();
            info!("{}", format!("Fetching questions into {:?}", args.cache).cyan());
            match store::load(&client, &config, &args.cache, true) {
                Ok(set) if set.is_empty() => {
                    error!("{}", "No questions fetched, cache left untouched!".red());
                    exit(1);
                }
                Ok(set) => {
                    for (difficulty, found) in set.shortfalls(config.per_difficulty) {
                        error!(
                            "{}",
                            format!(
                                "Only {}/{} {} questions fetched!",
                                found, config.per_difficulty, difficulty
                            )
                            .yellow()
                        );
                    }
                    info!("{}", format!("Cached {} questions.", set.len()).green());
                }
                Err(e) => {
                    error!("{}", format!("Unable to write cache: {}!", e).red());
                    exit(1);
                }
            }
        }
        Commands::Show => match store::load_cache(&args.cache) {
            Ok(Some(set)) => print_set(&set),
            Ok(None) => {
                error!("{}", format!("No cache at {:?}!", args.cache).red());
                exit(1);
            }
            Err(e) => {
                error!("{}", format!("Malformed cache: {}!", e).red());
                exit(1);
            }
        },
        Commands::Progress => {
            let records = ProgressDb::open_existing(&args.db).and_then(|db| {
                let records = db.fetch_progress();
                db.close()?;
                records
            });
            match records {
                Ok(records) => {
                    info!(
                        "{}",
                        format!("Last game ({} answers)", records.len()).blue()
                    );
                    for record in records {
                        let line = format!(
                            "├ {}. {} -> {} (correct: {}, ${})",
                            record.question_num,
                            record.question,
                            record.user_answer,
                            record.correct_answer,
                            record.money
                        );
                        if record.is_correct() {
                            println!("{}", line.green());
                        } else {
                            println!("{}", line.red().strikethrough());
                        }
                    }
                }
                Err(e) => {
                    error!("{}{}", "Unable to read progress: ".red(), e);
                    exit(1);
                }
            }
        }
    }
}

fn print_set(set: &QuestionSet) {
    for difficulty in Difficulty::ALL {
        println!(
            "{}",
            format!("├ {} ({} questions)", difficulty, set.count(difficulty)).blue()
        );
        for question in set.iter().filter(|q| q.difficulty == difficulty) {
            println!("{} {}", "│ ├".blue(), question.text);
            println!("{}   {}", "│ │".blue(), question.correct_answer.green());
            for wrong in &question.incorrect_answers {
                println!("{}   {}", "│ │".blue(), wrong.red());
            }
        }
    }
}
