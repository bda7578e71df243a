use log::{debug, warn};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::rng;
use serde_json::json;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifeline {
    FiftyFifty,
    AskAudience,
    CallFriend,
}

impl Lifeline {
    pub const ALL: [Lifeline; 3] = [
        Lifeline::FiftyFifty,
        Lifeline::AskAudience,
        Lifeline::CallFriend,
    ];
}

impl fmt::Display for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifeline::FiftyFifty => "50/50",
            Lifeline::AskAudience => "Ask the Audience",
            Lifeline::CallFriend => "Call a Friend",
        })
    }
}

/// Lifelines the player has not used yet. Only ever shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifelineInventory {
    available: Vec<Lifeline>,
}

impl Default for LifelineInventory {
    fn default() -> Self {
        Self {
            available: Lifeline::ALL.to_vec(),
        }
    }
}

impl LifelineInventory {
    pub fn with(lifelines: &[Lifeline]) -> Self {
        let mut available = Vec::with_capacity(lifelines.len());
        for lifeline in Lifeline::ALL {
            if lifelines.contains(&lifeline) {
                available.push(lifeline);
            }
        }
        Self { available }
    }

    pub fn available(&self) -> &[Lifeline] {
        &self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn contains(&self, lifeline: Lifeline) -> bool {
        self.available.contains(&lifeline)
    }

    /// Removes the lifeline at a 1-based menu position.
    pub fn consume(&mut self, menu_index: usize) -> Option<Lifeline> {
        if menu_index == 0 || menu_index > self.available.len() {
            return None;
        }
        Some(self.available.remove(menu_index - 1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifelineError {
    #[error("lifeline backend unavailable: {0}")]
    ProviderUnavailable(String),
}

/// A generative-text backend; replies are treated as opaque display text.
pub trait TextBackend {
    fn generate(&self, prompt: &str) -> Result<String, LifelineError>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> crate::error::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TextBackend for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, LifelineError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            LifelineError::ProviderUnavailable("no Gemini API key configured".to_string())
        })?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .map_err(|e| LifelineError::ProviderUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LifelineError::ProviderUnavailable(format!(
                "HTTP {} from Gemini",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().map_err(|e| {
            LifelineError::ProviderUnavailable(format!("malformed response: {}", e))
        })?;
        extract_text(&body)
    }
}

fn extract_text(body: &serde_json::Value) -> Result<String, LifelineError> {
    body.get("candidates")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get("parts"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| LifelineError::ProviderUnavailable("empty response".to_string()))
}

/// Backend with canned replies, for tests and offline play.
pub struct FakeTextBackend {
    reply: Result<String, LifelineError>,
    prompts: std::cell::RefCell<Vec<String>>,
}

impl FakeTextBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(LifelineError::ProviderUnavailable("offline".to_string())),
            prompts: Default::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl TextBackend for FakeTextBackend {
    fn generate(&self, prompt: &str) -> Result<String, LifelineError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.reply.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// The two options left standing after 50/50.
    Remaining([String; 2]),
    Audience(String),
    Friend(String),
}

pub struct LifelineProvider<'a> {
    backend: &'a dyn TextBackend,
}

impl<'a> LifelineProvider<'a> {
    pub fn new(backend: &'a dyn TextBackend) -> Self {
        Self { backend }
    }

    pub fn apply(
        &self,
        lifeline: Lifeline,
        question: &str,
        options: &[String; 4],
        eliminated: &[bool; 4],
        correct_answer: &str,
    ) -> Result<Hint, LifelineError> {
        debug!("[Lifeline] Using {}", lifeline);
        let hint = match lifeline {
            Lifeline::FiftyFifty => Hint::Remaining(fifty_fifty(options, correct_answer)),
            Lifeline::AskAudience => {
                Hint::Audience(self.ask_audience(question, options, eliminated)?)
            }
            Lifeline::CallFriend => Hint::Friend(self.call_friend(question, options, eliminated)?),
        };
        Ok(hint)
    }

    pub fn ask_audience(
        &self,
        question: &str,
        options: &[String; 4],
        eliminated: &[bool; 4],
    ) -> Result<String, LifelineError> {
        let prompt = format!(
            "You are the studio audience of \"Who Wants to be a Millionaire?\".\n\
             Question: {}\n{}\n\
             Vote as a crowd: give a percentage for each option listed. \
             Lean towards the option you believe is correct, but the crowd is never 100% sure. \
             Reply on one line like \"A: 40%, B: 25%, C: 20%, D: 15%\".",
            question,
            lettered(options, eliminated)
        );
        self.ask(&prompt)
    }

    pub fn call_friend(
        &self,
        question: &str,
        options: &[String; 4],
        eliminated: &[bool; 4],
    ) -> Result<String, LifelineError> {
        let prompt = format!(
            "You are a friend taking a phone call from a contestant on \"Who Wants to be a Millionaire?\".\n\
             Question: {}\n{}\n\
             In two or three casual spoken sentences, say which option you would go with and how sure you are.",
            question,
            lettered(options, eliminated)
        );
        self.ask(&prompt)
    }

    fn ask(&self, prompt: &str) -> Result<String, LifelineError> {
        self.backend.generate(prompt).inspect_err(|err| {
            warn!("[Lifeline] Backend failed: {}", err);
        })
    }
}

/// Keeps the correct answer and one random wrong one, in random order.
pub fn fifty_fifty(options: &[String; 4], correct_answer: &str) -> [String; 2] {
    let mut rng = rng();
    let wrong: Vec<&String> = options.iter().filter(|o| *o != correct_answer).collect();
    let kept_wrong = wrong
        .choose(&mut rng)
        .map(|o| o.to_string())
        .unwrap_or_default();
    let mut pair = [correct_answer.to_string(), kept_wrong];
    pair.shuffle(&mut rng);
    pair
}

/// Lists the options still in play; struck-out ones are left out.
fn lettered(options: &[String; 4], eliminated: &[bool; 4]) -> String {
    options
        .iter()
        .zip(['A', 'B', 'C', 'D'])
        .zip(eliminated)
        .filter(|(_, gone)| !**gone)
        .map(|((option, letter), _)| format!("{}) {}", letter, option))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; 4] {
        ["Paris", "Rome", "Berlin", "Madrid"].map(String::from)
    }

    #[test]
    fn inventory_starts_full_in_menu_order() {
        let inventory = LifelineInventory::default();
        assert_eq!(inventory.available(), &Lifeline::ALL);
    }

    #[test]
    fn consumed_lifeline_is_gone_for_good() {
        let mut inventory = LifelineInventory::default();

        assert_eq!(inventory.consume(2), Some(Lifeline::AskAudience));
        assert!(!inventory.contains(Lifeline::AskAudience));
        assert_eq!(
            inventory.available(),
            &[Lifeline::FiftyFifty, Lifeline::CallFriend]
        );

        assert_eq!(inventory.consume(2), Some(Lifeline::CallFriend));
        assert_eq!(inventory.consume(1), Some(Lifeline::FiftyFifty));
        assert!(inventory.is_empty());
        assert_eq!(inventory.consume(1), None);
    }

    #[test]
    fn out_of_range_index_leaves_inventory_alone() {
        let mut inventory = LifelineInventory::with(&[Lifeline::FiftyFifty]);

        assert_eq!(inventory.consume(0), None);
        assert_eq!(inventory.consume(2), None);
        assert_eq!(inventory.available(), &[Lifeline::FiftyFifty]);
    }

    #[test]
    fn fifty_fifty_always_keeps_the_correct_answer() {
        let options = options();
        for _ in 0..200 {
            let pair = fifty_fifty(&options, "Paris");
            assert!(pair.contains(&"Paris".to_string()));
            assert_ne!(pair[0], pair[1]);
            assert!(pair.iter().all(|o| options.contains(o)));
        }
    }

    #[test]
    fn fifty_fifty_keeps_every_wrong_answer_eventually() {
        let options = options();
        let mut kept = std::collections::HashSet::new();
        for _ in 0..500 {
            let pair = fifty_fifty(&options, "Paris");
            kept.extend(pair.into_iter().filter(|o| o != "Paris"));
        }
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn fifty_fifty_does_not_touch_the_backend() {
        let backend = FakeTextBackend::failing();
        let provider = LifelineProvider::new(&backend);

        let hint = provider
            .apply(Lifeline::FiftyFifty, "Capital of France?", &options(), &[false; 4], "Paris")
            .unwrap();

        assert!(matches!(hint, Hint::Remaining(_)));
        assert!(backend.prompts().is_empty());
    }

    #[test]
    fn audience_prompt_carries_question_and_options() {
        let backend = FakeTextBackend::replying("A: 70%, B: 10%, C: 10%, D: 10%");
        let provider = LifelineProvider::new(&backend);

        let hint = provider
            .apply(Lifeline::AskAudience, "Capital of France?", &options(), &[false; 4], "Paris")
            .unwrap();

        assert_eq!(
            hint,
            Hint::Audience("A: 70%, B: 10%, C: 10%, D: 10%".to_string())
        );
        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Capital of France?"));
        assert!(prompt.contains("C) Berlin"));
        assert!(!prompt.contains("correct answer is"));
    }

    #[test]
    fn prompts_leave_out_struck_options() {
        let backend = FakeTextBackend::replying("Rome, definitely.");
        let provider = LifelineProvider::new(&backend);

        provider
            .apply(
                Lifeline::CallFriend,
                "Capital of France?",
                &options(),
                &[false, false, true, true],
                "Paris",
            )
            .unwrap();

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("A) Paris"));
        assert!(prompt.contains("B) Rome"));
        assert!(!prompt.contains("Berlin"));
        assert!(!prompt.contains("Madrid"));
    }

    #[test]
    fn friend_reply_is_passed_through_untouched() {
        let backend = FakeTextBackend::replying("Hmm... I'd say Rome, but don't quote me!");
        let provider = LifelineProvider::new(&backend);

        let hint = provider
            .apply(Lifeline::CallFriend, "Capital of France?", &options(), &[false; 4], "Paris")
            .unwrap();

        assert_eq!(
            hint,
            Hint::Friend("Hmm... I'd say Rome, but don't quote me!".to_string())
        );
    }

    #[test]
    fn backend_failure_surfaces_as_provider_unavailable() {
        let backend = FakeTextBackend::failing();
        let provider = LifelineProvider::new(&backend);

        let err = provider
            .apply(Lifeline::CallFriend, "Capital of France?", &options(), &[false; 4], "Paris")
            .unwrap_err();

        assert!(matches!(err, LifelineError::ProviderUnavailable(_)));
    }

    #[test]
    fn missing_api_key_is_provider_unavailable() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(matches!(
            client.generate("hello"),
            Err(LifelineError::ProviderUnavailable(_))
        ));
    }

    #[test]
    fn gemini_text_is_extracted() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  B: 60%  \n" }] } }]
        });
        assert_eq!(extract_text(&body).unwrap(), "B: 60%");
        assert!(extract_text(&json!({ "candidates": [] })).is_err());
    }
}
