//! The round-progression state machine.
//!
//! A round presents one question, lets the player detour through lifelines
//! or back out of a menu any number of times, and ends the moment a letter is
//! committed. Option order is fixed when the [`RoundState`] is built.

use crate::db::{LogEntry, ProgressLog};
use crate::error::{Error, Result};
use crate::lifeline::{Hint, Lifeline, LifelineError, LifelineInventory, LifelineProvider};
use crate::question::{prize_for, Question};
use log::{debug, info};
use rand::Rng;

pub const BACK: &str = "back";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    pub const ALL: [Letter; 4] = [Letter::A, Letter::B, Letter::C, Letter::D];

    pub fn index(&self) -> usize {
        match self {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
        }
    }

    pub fn as_char(&self) -> char {
        ['A', 'B', 'C', 'D'][self.index()]
    }
}

/// What the player commits to from the menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Answer(Letter),
    UseLifeline(Lifeline),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Answer,
    Lifeline,
}

impl Choice {
    fn from_str(input: &str) -> Option<Choice> {
        match input.trim() {
            "1" => Some(Choice::Answer),
            "2" => Some(Choice::Lifeline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnswerInput {
    Letter(Letter),
    Back,
}

impl AnswerInput {
    fn from_str(input: &str) -> Option<AnswerInput> {
        let input = input.trim();
        if input.eq_ignore_ascii_case(BACK) {
            return Some(AnswerInput::Back);
        }
        match input.to_ascii_uppercase().as_str() {
            "A" => Some(AnswerInput::Letter(Letter::A)),
            "B" => Some(AnswerInput::Letter(Letter::B)),
            "C" => Some(AnswerInput::Letter(Letter::C)),
            "D" => Some(AnswerInput::Letter(Letter::D)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifelineInput {
    Index(usize),
    Back,
}

impl LifelineInput {
    fn from_str(input: &str) -> std::result::Result<LifelineInput, String> {
        let input = input.trim();
        if input.eq_ignore_ascii_case(BACK) {
            return Ok(LifelineInput::Back);
        }
        input
            .parse::<usize>()
            .map(LifelineInput::Index)
            .map_err(|e| e.to_string())
    }
}

/// Where the player is inside a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Presenting,
    AwaitingChoice,
    AwaitingAnswer,
    AwaitingLifelineSelection,
    ResolvedCorrect,
    ResolvedIncorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Choice,
    Answer,
    Lifeline,
}

/// Everything the round asks the terminal to show.
#[derive(Debug, Clone, Copy)]
pub enum Screen<'a> {
    Question(&'a RoundState),
    ChoiceMenu,
    LifelineMenu(&'a [Lifeline]),
    Invalid { prompt: Prompt, input: &'a str },
    Hint(&'a Hint),
    LifelineFailed(Lifeline, &'a LifelineError),
    Correct { money: u32 },
    Incorrect { chosen: &'a str, correct_answer: &'a str },
}

/// Blocking input with re-prompt semantics plus output.
pub trait Console {
    /// `None` once the input stream is closed.
    fn read(&mut self, prompt: Prompt) -> Option<String>;
    fn show(&mut self, screen: Screen<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub current_round: usize,
    pub lifelines: LifelineInventory,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            current_round: 0,
            lifelines: LifelineInventory::default(),
        }
    }

    /// Advances the ladder on a correct answer; anything else leaves it.
    pub fn record(&mut self, outcome: RoundOutcome) {
        if outcome == RoundOutcome::Correct {
            self.current_round += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub question: String,
    pub correct_answer: String,
    pub options: [String; 4],
    pub money: u32,
    pub round_index: usize,
    eliminated: [bool; 4],
}

impl RoundState {
    pub fn new<R: Rng + ?Sized>(question: &Question, round_index: usize, rng: &mut R) -> Self {
        Self::with_options(
            question.text.clone(),
            question.options_randomize(rng),
            question.correct_answer.clone(),
            prize_for(round_index),
            round_index,
        )
    }

    pub fn with_options(
        question: String,
        options: [String; 4],
        correct_answer: String,
        money: u32,
        round_index: usize,
    ) -> Self {
        Self {
            question,
            correct_answer,
            options,
            money,
            round_index,
            eliminated: [false; 4],
        }
    }

    pub fn option(&self, letter: Letter) -> &str {
        &self.options[letter.index()]
    }

    pub fn is_eliminated(&self, letter: Letter) -> bool {
        self.eliminated[letter.index()]
    }

    /// Marks every option outside `kept` as struck out; order is untouched.
    fn eliminate_except(&mut self, kept: &[String; 2]) {
        for (idx, option) in self.options.iter().enumerate() {
            self.eliminated[idx] = !kept.contains(option);
        }
    }
}

pub struct RoundController<'a, C: Console, L: ProgressLog> {
    console: &'a mut C,
    lifelines: LifelineProvider<'a>,
    log: &'a mut L,
}

impl<'a, C: Console, L: ProgressLog> RoundController<'a, C, L> {
    pub fn new(console: &'a mut C, lifelines: LifelineProvider<'a>, log: &'a mut L) -> Self {
        Self {
            console,
            lifelines,
            log,
        }
    }

    /// Runs one round to resolution. The caller feeds the outcome back into
    /// [`GameState::record`].
    pub fn play_round(&mut self, game: &mut GameState, round: &mut RoundState) -> Result<RoundOutcome> {
        let mut stage = Stage::Presenting;
        loop {
            debug!("[Round {}] {:?}", round.round_index, stage);
            stage = match stage {
                Stage::Presenting => {
                    self.console.show(Screen::Question(&*round));
                    Stage::AwaitingChoice
                }
                Stage::AwaitingChoice => self.await_choice(game)?,
                Stage::AwaitingAnswer => match self.await_answer()? {
                    Some(action) => self.act(round, action)?,
                    None => Stage::Presenting,
                },
                Stage::AwaitingLifelineSelection => {
                    match self.await_lifeline(game, round.round_index)? {
                        Some(action) => self.act(round, action)?,
                        None => Stage::Presenting,
                    }
                }
                Stage::ResolvedCorrect => return Ok(RoundOutcome::Correct),
                Stage::ResolvedIncorrect => return Ok(RoundOutcome::Incorrect),
            }
        }
    }

    fn act(&mut self, round: &mut RoundState, action: PlayerAction) -> Result<Stage> {
        match action {
            PlayerAction::Answer(letter) => self.resolve(round, letter),
            PlayerAction::UseLifeline(lifeline) => {
                self.use_lifeline(lifeline, round);
                Ok(Stage::Presenting)
            }
        }
    }

    fn read(&mut self, prompt: Prompt) -> Result<String> {
        self.console.read(prompt).ok_or(Error::InputClosed)
    }

    fn await_choice(&mut self, game: &GameState) -> Result<Stage> {
        if game.lifelines.is_empty() {
            return Ok(Stage::AwaitingAnswer);
        }
        loop {
            self.console.show(Screen::ChoiceMenu);
            let input = self.read(Prompt::Choice)?;
            match Choice::from_str(&input) {
                Some(Choice::Answer) => return Ok(Stage::AwaitingAnswer),
                Some(Choice::Lifeline) => return Ok(Stage::AwaitingLifelineSelection),
                None => self.console.show(Screen::Invalid {
                    prompt: Prompt::Choice,
                    input: &input,
                }),
            }
        }
    }

    /// `None` means the player went back.
    fn await_answer(&mut self) -> Result<Option<PlayerAction>> {
        loop {
            let input = self.read(Prompt::Answer)?;
            match AnswerInput::from_str(&input) {
                Some(AnswerInput::Letter(letter)) => return Ok(Some(PlayerAction::Answer(letter))),
                Some(AnswerInput::Back) => return Ok(None),
                None => self.console.show(Screen::Invalid {
                    prompt: Prompt::Answer,
                    input: &input,
                }),
            }
        }
    }

    /// `None` means the player went back. A returned lifeline has already been
    /// taken out of the inventory.
    fn await_lifeline(
        &mut self,
        game: &mut GameState,
        round_index: usize,
    ) -> Result<Option<PlayerAction>> {
        loop {
            self.console
                .show(Screen::LifelineMenu(game.lifelines.available()));
            let input = self.read(Prompt::Lifeline)?;
            match LifelineInput::from_str(&input) {
                Ok(LifelineInput::Back) => return Ok(None),
                Ok(LifelineInput::Index(idx)) => match game.lifelines.consume(idx) {
                    Some(lifeline) => {
                        info!("[Round {}] Lifeline {} consumed", round_index, lifeline);
                        return Ok(Some(PlayerAction::UseLifeline(lifeline)));
                    }
                    None => self.console.show(Screen::Invalid {
                        prompt: Prompt::Lifeline,
                        input: &input,
                    }),
                },
                Err(err) => {
                    debug!("[Round] Not a lifeline number {:?}: {}", input, err);
                    self.console.show(Screen::Invalid {
                        prompt: Prompt::Lifeline,
                        input: &input,
                    })
                }
            }
        }
    }

    fn use_lifeline(&mut self, lifeline: Lifeline, round: &mut RoundState) {
        match self.lifelines.apply(
            lifeline,
            &round.question,
            &round.options,
            &round.eliminated,
            &round.correct_answer,
        ) {
            Ok(hint) => {
                if let Hint::Remaining(kept) = &hint {
                    round.eliminate_except(kept);
                }
                self.console.show(Screen::Hint(&hint));
            }
            Err(err) => self.console.show(Screen::LifelineFailed(lifeline, &err)),
        }
    }

    fn resolve(&mut self, round: &RoundState, letter: Letter) -> Result<Stage> {
        let chosen = round.option(letter);
        let correct = chosen == round.correct_answer;
        info!(
            "[Round {}] Answered {} ({:?}), correct: {}",
            round.round_index,
            letter.as_char(),
            chosen,
            correct
        );

        self.log.log_answer(&LogEntry {
            question: round.question.clone(),
            user_answer: chosen.to_string(),
            correct_answer: round.correct_answer.clone(),
            money: round.money,
        })?;

        if correct {
            self.console.show(Screen::Correct { money: round.money });
            Ok(Stage::ResolvedCorrect)
        } else {
            self.console.show(Screen::Incorrect {
                chosen,
                correct_answer: &round.correct_answer,
            });
            Ok(Stage::ResolvedIncorrect)
        }
    }
}
