use colored::Colorize;
use log::debug;
use millionaire::db::ProgressRecord;
use millionaire::lifeline::{Hint, Lifeline};
use millionaire::question::{QuestionSet, ROUNDS};
use millionaire::round::{Console, Letter, Prompt, RoundState, Screen};
use millionaire::session::SessionSummary;
use std::io::{self, Write};
use text_io::try_read;

pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read(&mut self, prompt: Prompt) -> Option<String> {
        let text = match prompt {
            Prompt::Choice => "Choice (1-2):",
            Prompt::Answer => "Answer (A-D, or `back`):",
            Prompt::Lifeline => "Lifeline (number, or `back`):",
        };
        print!("{} ", text.cyan());
        let _ = io::stdout().flush();

        let line: Result<String, _> = try_read!("{}\n");
        match line {
            Ok(line) => Some(line.trim_end_matches('\r').to_string()),
            Err(err) => {
                debug!("[Input] Closed: {:?}", err);
                None
            }
        }
    }

    fn show(&mut self, screen: Screen<'_>) {
        match screen {
            Screen::Question(round) => print_question(round),
            Screen::ChoiceMenu => {
                println!("  {}. Answer the question", "1".bold());
                println!("  {}. Use a lifeline", "2".bold());
            }
            Screen::LifelineMenu(available) => {
                println!("{}", "Available lifelines:".cyan());
                for (i, lifeline) in available.iter().enumerate() {
                    println!("  {}. {}", format!("{}", i + 1).bold(), lifeline);
                }
            }
            Screen::Invalid { prompt, input } => {
                let hint = match prompt {
                    Prompt::Choice => "Please enter 1 or 2.",
                    Prompt::Answer => "Please enter A, B, C, D or `back`.",
                    Prompt::Lifeline => "Please pick one of the listed lifelines or `back`.",
                };
                println!(
                    "{}",
                    format!("{:?} is not a valid choice! {}", input.trim(), hint).bright_red()
                );
            }
            Screen::Hint(hint) => print_hint(hint),
            Screen::LifelineFailed(lifeline, err) => {
                debug!("[Lifeline] {} failed: {}", lifeline, err);
                let message = match lifeline {
                    Lifeline::CallFriend => "The line went dead... your friend couldn't be reached.",
                    _ => "The audience keypads are down... no votes came in.",
                };
                println!("{}", message.yellow());
            }
            Screen::Correct { money } => {
                println!(
                    "{}",
                    format!("Correct! You now have ${}.", money).bright_green()
                );
            }
            Screen::Incorrect {
                chosen,
                correct_answer,
            } => {
                println!("{}", format!("{} is incorrect!", chosen).bright_red());
                println!(
                    "{}",
                    format!("The correct answer was {}.", correct_answer).green()
                );
            }
        }
    }
}

fn print_question(round: &RoundState) {
    let leading = format!("{}/{}. ", round.round_index + 1, ROUNDS);
    println!(
        "{}{}",
        leading.cyan(),
        format!("{} (${})", round.question, round.money)
            .black()
            .bold()
            .on_white()
    );

    let indent = " ".repeat(leading.len());
    for letter in Letter::ALL {
        let option = round.option(letter);
        if round.is_eliminated(letter) {
            println!(
                "{}{}. {}",
                indent,
                letter.as_char(),
                option.dimmed().strikethrough()
            );
        } else {
            println!("{}{}. {}", indent, format!("{}", letter.as_char()).bold(), option);
        }
    }
}

fn print_hint(hint: &Hint) {
    match hint {
        Hint::Remaining([first, second]) => {
            println!(
                "{}",
                format!("50/50: it's either {} or {}.", first, second).magenta()
            );
        }
        Hint::Audience(votes) => {
            println!("{}", "The audience has voted:".magenta());
            println!("  {}", votes);
        }
        Hint::Friend(words) => {
            println!("{}", "Your friend says:".magenta());
            println!("  {}", words.italic());
        }
    }
}

pub fn print_welcome() {
    println!("{}", "-".repeat(50));
    println!("{}", "Welcome to Who Wants to be a Millionaire!?".bold());
    println!("Answer {} questions correctly to win $1,000,000!", ROUNDS);
    println!("You have three lifelines: 50/50, Ask the Audience, and Call a Friend.");
    println!("{}", "-".repeat(50));
}

pub fn print_shortfalls(set: &QuestionSet, per_difficulty: usize) {
    for (difficulty, found) in set.shortfalls(per_difficulty) {
        println!(
            "{}",
            format!(
                "Warning: only {} of {} {} questions could be fetched.",
                found, per_difficulty, difficulty
            )
            .yellow()
        );
    }
}

pub fn print_summary(summary: &SessionSummary) {
    println!("{}", "-".repeat(50));
    if summary.millionaire {
        println!(
            "{}",
            format!(
                "Congratulations! You answered all {} questions correctly and won ${}!",
                ROUNDS, summary.winnings
            )
            .bright_green()
            .bold()
        );
        println!("{}", "You are a Millionaire!".bright_green().bold());
    } else {
        println!("{}", "Game Over.".bright_red());
        println!("You leave with ${}!!!", summary.winnings);
    }
}

pub fn print_progress(records: &[ProgressRecord]) {
    println!("\n{}", "Game Summary:".cyan());
    if records.is_empty() {
        println!("  (no questions answered)");
    }
    for record in records {
        let mark = if record.is_correct() {
            "✔".bright_green()
        } else {
            "✘".bright_red()
        };
        println!(
            "  {} {}. {} ${} [{}]",
            mark,
            record.question_num,
            record.question,
            record.money,
            record.answered_at.dimmed()
        );
        println!(
            "      your answer: {}, correct answer: {}",
            record.user_answer, record.correct_answer
        );
    }
}
