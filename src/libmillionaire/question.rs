use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const ROUNDS: usize = 15;

pub const MONEY_LADDER: [u32; ROUNDS] = [
    100, 200, 300, 500, 1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 64_000, 125_000, 250_000,
    500_000, 1_000_000,
];

/// Prize for the question asked at `round_index` (0-based).
pub fn prize_for(round_index: usize) -> u32 {
    MONEY_LADDER[round_index.min(ROUNDS - 1)]
}

/// What the player walks away with after `completed_rounds` correct answers.
pub fn winnings(completed_rounds: usize) -> u32 {
    match completed_rounds {
        0 => 0,
        n => MONEY_LADDER[n.min(ROUNDS) - 1],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub correct_answer: String,
    pub incorrect_answers: [String; 3],
    pub difficulty: Difficulty,
}

impl Question {
    pub fn all_options(&self) -> [String; 4] {
        [
            self.correct_answer.clone(),
            self.incorrect_answers[0].clone(),
            self.incorrect_answers[1].clone(),
            self.incorrect_answers[2].clone(),
        ]
    }

    pub fn options_randomize<R: Rng + ?Sized>(&self, rng: &mut R) -> [String; 4] {
        let mut opts = self.all_options();
        opts.shuffle(rng);
        opts
    }
}

/// The flattened easy ++ medium ++ hard question list for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Builds a set, dropping repeated question texts and keeping the
    /// easy/medium/hard grouping.
    pub fn new(questions: Vec<Question>) -> Self {
        let mut seen = HashSet::new();
        let mut unique: Vec<Question> = questions
            .into_iter()
            .filter(|q| seen.insert(q.text.clone()))
            .collect();
        unique.sort_by_key(|q| q.difficulty as u8);
        unique.truncate(ROUNDS);
        Self { questions: unique }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, round_index: usize) -> Option<&Question> {
        self.questions.get(round_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn count(&self, difficulty: Difficulty) -> usize {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .count()
    }

    /// Difficulties that came up short, with how many questions they have.
    pub fn shortfalls(&self, per_difficulty: usize) -> Vec<(Difficulty, usize)> {
        Difficulty::ALL
            .iter()
            .map(|d| (*d, self.count(*d)))
            .filter(|(_, found)| *found < per_difficulty)
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_question(text: &str, difficulty: Difficulty) -> Question {
    Question {
        text: text.to_string(),
        correct_answer: format!("{text} right"),
        incorrect_answers: [
            format!("{text} wrong 1"),
            format!("{text} wrong 2"),
            format!("{text} wrong 3"),
        ],
        difficulty,
    }
}
