use crate::error::Result;
use crate::question::{Difficulty, Question, QuestionSet};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// OpenTDB `response_code` for "too many requests".
const RATE_LIMIT_CODE: u8 = 5;

#[derive(Debug, Clone)]
pub struct TriviaConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            url: "https://opentdb.com/api.php".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub per_difficulty: usize,
    pub batch_size: u32,
    pub max_attempts: u32,
    pub rate_limit_backoff: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            per_difficulty: 5,
            batch_size: 15,
            max_attempts: 5,
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("question provider is rate limiting requests")]
    RateLimited,
    #[error("question provider unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can hand out batches of multiple-choice questions.
pub trait TriviaSource {
    fn fetch(&self, difficulty: Difficulty, amount: u32) -> Result<Vec<Question>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<ApiQuestion>,
}

#[derive(Debug, Deserialize)]
struct ApiQuestion {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

impl ApiQuestion {
    fn into_question(self, difficulty: Difficulty) -> Option<Question> {
        let incorrect: [String; 3] = self
            .incorrect_answers
            .into_iter()
            .map(|a| unescape_html(&a))
            .collect::<Vec<_>>()
            .try_into()
            .ok()?;
        Some(Question {
            text: unescape_html(&self.question),
            correct_answer: unescape_html(&self.correct_answer),
            incorrect_answers: incorrect,
            difficulty,
        })
    }
}

pub struct OpenTdbClient {
    config: TriviaConfig,
    client: reqwest::blocking::Client,
}

impl OpenTdbClient {
    pub fn new(config: TriviaConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl TriviaSource for OpenTdbClient {
    fn fetch(&self, difficulty: Difficulty, amount: u32) -> Result<Vec<Question>, FetchError> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("amount", amount.to_string()),
                ("type", "multiple".to_string()),
                ("difficulty", difficulty.to_string()),
            ])
            .send()
            .map_err(|e| FetchError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = if status == StatusCode::OK {
            Some(
                response
                    .json::<ApiResponse>()
                    .map_err(|e| FetchError::Unavailable(format!("malformed response: {}", e)))?,
            )
        } else {
            None
        };
        classify(status, body, difficulty)
    }
}

/// Maps an OpenTDB reply onto a batch, a rate limit, or a hard failure.
fn classify(
    status: StatusCode,
    body: Option<ApiResponse>,
    difficulty: Difficulty,
) -> Result<Vec<Question>, FetchError> {
    match status {
        StatusCode::OK => {}
        StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
        status => return Err(FetchError::Unavailable(format!("HTTP {}", status))),
    }

    let body = body.ok_or_else(|| FetchError::Unavailable("empty response".to_string()))?;
    match body.response_code {
        0 => {}
        RATE_LIMIT_CODE => return Err(FetchError::RateLimited),
        code => {
            return Err(FetchError::Unavailable(format!(
                "response_code {}",
                code
            )))
        }
    }

    Ok(body
        .results
        .into_iter()
        .filter_map(|q| q.into_question(difficulty))
        .collect())
}

/// Collects up to `per_difficulty` questions with distinct text for one
/// difficulty.
pub fn collect_unique(
    source: &dyn TriviaSource,
    difficulty: Difficulty,
    config: &StoreConfig,
) -> Vec<Question> {
    let mut found: Vec<Question> = Vec::with_capacity(config.per_difficulty);
    let mut seen: HashSet<String> = HashSet::new();

    for attempt in 1..=config.max_attempts {
        if found.len() >= config.per_difficulty {
            break;
        }
        debug!(
            "[Store] Fetching {} {} questions (attempt {}/{})",
            config.batch_size, difficulty, attempt, config.max_attempts
        );
        match source.fetch(difficulty, config.batch_size) {
            Ok(batch) => {
                for question in batch {
                    if found.len() >= config.per_difficulty {
                        break;
                    }
                    if seen.insert(question.text.clone()) {
                        found.push(question);
                    } else {
                        debug!("[Store] Skipping duplicate {:?}", question.text);
                    }
                }
            }
            Err(FetchError::RateLimited) if attempt == config.max_attempts => {
                warn!("[Store] Rate limited on the last attempt for {} questions", difficulty);
            }
            Err(FetchError::RateLimited) => {
                warn!(
                    "[Store] Rate limited, waiting {:?} before retrying",
                    config.rate_limit_backoff
                );
                thread::sleep(config.rate_limit_backoff);
            }
            Err(err) => {
                warn!("[Store] Giving up on {} questions: {}", difficulty, err);
                break;
            }
        }
    }

    if found.len() < config.per_difficulty {
        warn!(
            "[Store] Only found {}/{} {} questions",
            found.len(),
            config.per_difficulty,
            difficulty
        );
    }
    found
}

/// Fetches a fresh easy ++ medium ++ hard set.
pub fn fetch_question_set(source: &dyn TriviaSource, config: &StoreConfig) -> QuestionSet {
    let now = Instant::now();
    let questions: Vec<Question> = Difficulty::ALL
        .iter()
        .flat_map(|d| collect_unique(source, *d, config))
        .collect();
    debug!(
        "[Store] Fetched {} questions in {} ms.",
        questions.len(),
        now.elapsed().as_millis()
    );
    QuestionSet::new(questions)
}

/// Uses the cache when it exists, otherwise fetches and writes it.
pub fn load(
    source: &dyn TriviaSource,
    config: &StoreConfig,
    cache: &Path,
    refresh: bool,
) -> Result<QuestionSet> {
    if !refresh {
        if let Some(set) = load_cache(cache)? {
            info!("[Store] Using cached questions from {:?}", cache);
            return Ok(set);
        }
    }

    let set = fetch_question_set(source, config);
    if set.is_empty() {
        warn!("[Store] Nothing fetched, leaving cache untouched");
    } else {
        save_cache(cache, &set)?;
    }
    Ok(set)
}

pub fn load_cache(cache: &Path) -> Result<Option<QuestionSet>> {
    if !cache.exists() {
        debug!("[Store] No cache at {:?}", cache);
        return Ok(None);
    }
    let json = fs::read_to_string(cache)?;
    let questions: Vec<Question> = serde_json::from_str(&json)?;
    Ok(Some(QuestionSet::new(questions)))
}

/// Writes to a sibling temp file first so a crash never leaves half a cache.
pub fn save_cache(cache: &Path, set: &QuestionSet) -> Result<()> {
    let json = serde_json::to_string_pretty(set)?;
    let tmp = cache.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, cache)?;
    info!("[Store] Cached {} questions at {:?}", set.len(), cache);
    Ok(())
}

/// Decodes the HTML entities OpenTDB puts in question text.
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
