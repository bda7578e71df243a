use crate::db::ProgressLog;
use crate::error::Result;
use crate::lifeline::{LifelineProvider, TextBackend};
use crate::question::{winnings, QuestionSet, ROUNDS};
use crate::round::{Console, GameState, RoundController, RoundOutcome, RoundState};
use log::{debug, info};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub completed_rounds: usize,
    pub winnings: u32,
    pub millionaire: bool,
}

impl SessionSummary {
    fn from_game(game: &GameState) -> Self {
        Self {
            completed_rounds: game.current_round,
            winnings: winnings(game.current_round),
            millionaire: game.current_round == ROUNDS,
        }
    }
}

/// Plays rounds until a wrong answer or the questions run out.
pub fn play_game<C: Console, L: ProgressLog, R: Rng + ?Sized>(
    questions: &QuestionSet,
    console: &mut C,
    backend: &dyn TextBackend,
    log: &mut L,
    rng: &mut R,
) -> Result<SessionSummary> {
    let mut game = GameState::new();
    let mut controller = RoundController::new(console, LifelineProvider::new(backend), log);

    while let Some(question) = questions.get(game.current_round) {
        debug!("[Session] Round {} ({})", game.current_round + 1, question.difficulty);
        let mut round = RoundState::new(question, game.current_round, rng);
        let outcome = controller.play_round(&mut game, &mut round)?;
        game.record(outcome);
        if outcome == RoundOutcome::Incorrect {
            break;
        }
    }

    let summary = SessionSummary::from_game(&game);
    info!("[Session] Finished: {:?}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lifeline::{FakeTextBackend, Lifeline};
    use crate::question::{sample_question, Difficulty, Question, MONEY_LADDER};
    use crate::round::tests::{MemoryLog, ScriptedConsole};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn full_set() -> QuestionSet {
        let questions: Vec<Question> = (0..ROUNDS)
            .map(|i| {
                let difficulty = Difficulty::ALL[i / 5];
                sample_question(&format!("question {i}"), difficulty)
            })
            .collect();
        QuestionSet::new(questions)
    }

    /// Picks the letter of the correct answer for each round, given the
    /// seed used by the session.
    fn correct_letters(set: &QuestionSet, seed: u64) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        set.iter()
            .enumerate()
            .map(|(i, q)| {
                let round = RoundState::new(q, i, &mut rng);
                let idx = round
                    .options
                    .iter()
                    .position(|o| *o == q.correct_answer)
                    .unwrap();
                ["A", "B", "C", "D"][idx].to_string()
            })
            .collect()
    }

    fn wrong_letter(correct: &str) -> &'static str {
        if correct == "A" {
            "B"
        } else {
            "A"
        }
    }

    fn run(set: &QuestionSet, inputs: Vec<String>, seed: u64) -> (Result<SessionSummary>, MemoryLog) {
        let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        let mut console = ScriptedConsole::new(&refs);
        let mut log = MemoryLog::default();
        let backend = FakeTextBackend::failing();
        let summary = play_game(
            set,
            &mut console,
            &backend,
            &mut log,
            &mut StdRng::seed_from_u64(seed),
        );
        (summary, log)
    }

    #[test]
    fn answering_everything_makes_a_millionaire() {
        let set = full_set();
        let inputs = correct_letters(&set, 3)
            .into_iter()
            .flat_map(|letter| vec!["1".to_string(), letter])
            .collect();

        let (summary, log) = run(&set, inputs, 3);
        let summary = summary.unwrap();

        assert!(summary.millionaire);
        assert_eq!(summary.completed_rounds, 15);
        assert_eq!(summary.winnings, 1_000_000);
        assert_eq!(log.entries.len(), 15);
        let money: Vec<u32> = log.entries.iter().map(|e| e.money).collect();
        assert_eq!(money, MONEY_LADDER.to_vec());
    }

    #[test]
    fn wrong_answer_ends_game_with_last_completed_rung() {
        let set = full_set();
        let letters = correct_letters(&set, 11);
        let mut inputs = Vec::new();
        for letter in &letters[..4] {
            inputs.push("1".to_string());
            inputs.push(letter.clone());
        }
        inputs.push("1".to_string());
        inputs.push(wrong_letter(&letters[4]).to_string());
        inputs.push("1".to_string());
        inputs.push(letters[5].clone());

        let (summary, log) = run(&set, inputs, 11);
        let summary = summary.unwrap();

        assert!(!summary.millionaire);
        assert_eq!(summary.completed_rounds, 4);
        assert_eq!(summary.winnings, MONEY_LADDER[3]);
        assert_eq!(log.entries.len(), 5);
        assert_ne!(log.entries[4].user_answer, log.entries[4].correct_answer);
    }

    #[test]
    fn first_round_loss_wins_nothing() {
        let set = full_set();
        let letters = correct_letters(&set, 5);
        let inputs = vec!["1".to_string(), wrong_letter(&letters[0]).to_string()];

        let (summary, _) = run(&set, inputs, 5);

        assert_eq!(summary.unwrap().winnings, 0);
    }

    #[test]
    fn partial_set_ends_when_questions_run_out() {
        let set = QuestionSet::new(vec![
            sample_question("e1", Difficulty::Easy),
            sample_question("m1", Difficulty::Medium),
        ]);
        let inputs = correct_letters(&set, 9)
            .into_iter()
            .flat_map(|letter| vec!["1".to_string(), letter])
            .collect();

        let (summary, log) = run(&set, inputs, 9);
        let summary = summary.unwrap();

        assert_eq!(summary.completed_rounds, 2);
        assert_eq!(summary.winnings, MONEY_LADDER[1]);
        assert!(!summary.millionaire);
        assert_eq!(log.entries.len(), 2);
    }

    #[test]
    fn lifelines_carry_over_between_rounds() {
        let set = full_set();
        let letters = correct_letters(&set, 1);
        // 50/50 in round one, a failed audience call in round two, then
        // round three only offers Call a Friend before the wrong answer.
        let inputs: Vec<String> = [
            "2",
            "1",
            "1",
            letters[0].as_str(),
            "2",
            "1",
            "1",
            letters[1].as_str(),
            "2",
            "back",
            "1",
            wrong_letter(&letters[2]),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        let mut console = ScriptedConsole::new(&refs);
        let mut log = MemoryLog::default();
        let backend = FakeTextBackend::failing();
        let summary = play_game(
            &set,
            &mut console,
            &backend,
            &mut log,
            &mut StdRng::seed_from_u64(1),
        );

        assert_eq!(summary.unwrap().completed_rounds, 2);
        assert_eq!(log.entries.len(), 3);
        assert_eq!(
            console.lifeline_menus,
            vec![
                Lifeline::ALL.to_vec(),
                vec![Lifeline::AskAudience, Lifeline::CallFriend],
                vec![Lifeline::CallFriend],
            ]
        );
        assert_eq!(console.failures, vec![Lifeline::AskAudience]);
        assert!(console.invalid.is_empty());
        assert!(console.inputs.is_empty());
    }

    #[test]
    fn closed_input_aborts_the_session() {
        let set = full_set();
        let (summary, log) = run(&set, vec!["1".to_string()], 2);

        assert!(matches!(summary, Err(Error::InputClosed)));
        assert!(log.entries.is_empty());
    }
}
