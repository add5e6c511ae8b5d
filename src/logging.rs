use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Who a log line is about: one simulated run, or one server session.
#[derive(Clone, Debug, Default)]
pub struct LogContext {
    pub match_id: String,
    pub seed: Option<u32>,
    pub tick: Option<u64>,
}

impl LogContext {
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            seed: None,
            tick: None,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn at_tick(&self, tick: u64) -> Self {
        Self {
            tick: Some(tick),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub event: String,
    #[serde(rename = "matchId")]
    pub match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: LogLevel, event: &str, context: &LogContext, details: Value) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event: event.to_string(),
            match_id: context.match_id.clone(),
            seed: context.seed,
            tick: context.tick,
            details,
        }
    }
}

/// One JSON object per line on stderr, so stdout stays free for results.
pub fn emit_log(level: LogLevel, event: &str, context: &LogContext, details: Value) {
    let line = StructuredLogLine::new(level, event, context, details);
    match serde_json::to_string(&line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!(
            "{{\"level\":\"error\",\"event\":\"log_serialize_failed\",\"error\":\"{error}\"}}"
        ),
    }
}

pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
