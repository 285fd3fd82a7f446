//! Oracle backed by an OpenAI-compatible chat-completions endpoint.
//!
//! Owns a private current-thread tokio runtime and blocks on each request,
//! so it can be called from the engine's plain threads.

use crate::config::OracleConfig;
use crate::error::{IntervoxError, Result};
use crate::oracle::{InterviewContext, QuestionOracle, parse_question_lines};
use crate::session::types::{Scorecard, TranscriptEntry, Verdict};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You are a concise, professional job interviewer. Reply with plain text only.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            temperature: 0.3,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ScorecardReply {
    score: f64,
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

pub struct HttpOracle {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpOracle {
    /// Build from configuration, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IntervoxError::OracleUnavailable {
                message: format!("{} is not set", config.api_key_env),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IntervoxError::OracleUnavailable {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model, prompt);

        let response = self.runtime.block_on(async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| IntervoxError::OracleRequest {
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(IntervoxError::OracleRequest {
                    message: format!("HTTP {status}: {}", text.chars().take(200).collect::<String>()),
                });
            }
            response
                .json::<ChatResponse>()
                .await
                .map_err(|e| IntervoxError::OracleReply {
                    message: format!("malformed chat reply: {e}"),
                })
        })?;

        let content = first_choice(response)?;
        debug!(chars = content.len(), "oracle reply received");
        Ok(content)
    }
}

/// The first choice's message text.
fn first_choice(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .ok_or_else(|| IntervoxError::OracleReply {
            message: "reply contained no choices".to_string(),
        })
}

/// First usable question in a reply; "none" style replies mean no follow-up.
fn first_question(reply: &str) -> Option<String> {
    let line = parse_question_lines(reply).into_iter().next()?;
    let lowered = line.to_ascii_lowercase();
    if lowered == "none" || lowered == "n/a" {
        None
    } else {
        Some(line)
    }
}

/// Parse the first JSON object in a reply into a scorecard.
fn parse_scorecard(reply: &str, pass_threshold: u8) -> Result<Scorecard> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => {
            return Err(IntervoxError::OracleReply {
                message: "no JSON object in scoring reply".to_string(),
            });
        }
    };

    let parsed: ScorecardReply = serde_json::from_str(json)?;
    let score = parsed.score.clamp(0.0, 100.0).round() as u32;
    let mut card = Scorecard::from_score(score, pass_threshold);
    card.verdict = match parsed.verdict.as_deref().map(str::to_ascii_lowercase) {
        Some(v) if v.starts_with("pass") => Verdict::Pass,
        Some(v) if v.starts_with("reject") || v.starts_with("fail") => Verdict::Reject,
        _ => card.verdict,
    };
    card.reasons = parsed.reasons;
    card.suggestions = parsed.suggestions;
    Ok(card)
}

fn render_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .enumerate()
        .map(|(i, e)| format!("Q{n}: {}\nA{n}: {}\n", e.question, e.answer, n = i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

impl QuestionOracle for HttpOracle {
    fn seed_questions(&self, context: &InterviewContext, count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let prompt = format!(
            "Propose {count} interview questions tailored to this candidate and role. \
             One question per line, no numbering, no commentary.\n\n\
             Resume:\n{}\n\nJob description:\n{}",
            context.resume, context.job_description
        );
        let reply = self.complete(&prompt)?;
        Ok(parse_question_lines(&reply).into_iter().take(count).collect())
    }

    fn follow_up_question(&self, answer: &str) -> Result<Option<String>> {
        let prompt = format!(
            "Given the following candidate's answer in an interview, suggest the next logical \
             follow-up interview question. Be concise and job-relevant. Reply with the question \
             only, or NONE if no follow-up is needed.\n\nAnswer: {answer}\n\nFollow-up Question:"
        );
        let reply = self.complete(&prompt)?;
        Ok(first_question(&reply))
    }

    fn score_and_feedback(
        &self,
        context: &InterviewContext,
        transcript: &[TranscriptEntry],
        pass_threshold: u8,
    ) -> Result<Scorecard> {
        let prompt = format!(
            "Score this interview from 0 to 100. A score of {pass_threshold} or more is a pass. \
             Reply with a single JSON object: {{\"score\": <int>, \"verdict\": \"Pass\"|\"Reject\", \
             \"reasons\": [<string>], \"suggestions\": [<string>]}}.\n\n\
             Resume:\n{}\n\nJob description:\n{}\n\nTranscript:\n{}",
            context.resume,
            context.job_description,
            render_transcript(transcript)
        );
        let reply = self.complete(&prompt)?;
        parse_scorecard(&reply, pass_threshold)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
