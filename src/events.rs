//! Progress Events
//!
//! Human-readable progress strings emitted while a search runs. The orchestrator and every
//! concurrent agent invocation hold a clone of the same [`LogSink`]; the presentation layer
//! drains the other end. Events from concurrent agents may interleave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Progress,
    /// A reasoning fragment surfaced by the generation service
    Thought,
    /// An agent failed and its facet falls back to the model's internal knowledge
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub message: String,
}

impl LogEvent {
    pub fn progress(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: LogKind::Progress,
            agent: None,
            message: message.into(),
        }
    }

    pub fn for_agent(agent: &str, kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            agent: Some(agent.to_string()),
            message: message.into(),
        }
    }

    pub fn is_thought(&self) -> bool {
        self.kind == LogKind::Thought
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.agent, self.kind) {
            (Some(agent), LogKind::Thought) => write!(f, "[{} 💭] {}", agent, self.message),
            (Some(agent), _) => write!(f, "[{}] {}", agent, self.message),
            (None, _) => write!(f, "{}", self.message),
        }
    }
}

type LogCallback = Arc<dyn Fn(&LogEvent) + Send + Sync>;

#[derive(Clone)]
enum SinkInner {
    Channel(mpsc::UnboundedSender<LogEvent>),
    Callback(LogCallback),
    Discard,
}

/// Multi-producer handle for progress events.
#[derive(Clone)]
pub struct LogSink {
    inner: SinkInner,
}

impl LogSink {
    /// Sink backed by an unbounded channel; the receiver is the single consumer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                inner: SinkInner::Channel(tx),
            },
            rx,
        )
    }

    /// Sink that invokes `callback` synchronously for each event
    pub fn from_callback<F>(callback: F) -> Self
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        Self {
            inner: SinkInner::Callback(Arc::new(callback)),
        }
    }

    pub fn discard() -> Self {
        Self {
            inner: SinkInner::Discard,
        }
    }

    pub fn emit(&self, event: LogEvent) {
        tracing::trace!(kind = ?event.kind, agent = ?event.agent, "{}", event.message);
        match &self.inner {
            // A dropped receiver only means nobody is watching anymore
            SinkInner::Channel(tx) => {
                let _ = tx.send(event);
            }
            SinkInner::Callback(callback) => callback(&event),
            SinkInner::Discard => {}
        }
    }

    pub fn progress(&self, message: impl Into<String>) {
        self.emit(LogEvent::progress(message));
    }

    pub fn agent(&self, agent: &str, kind: LogKind, message: impl Into<String>) {
        self.emit(LogEvent::for_agent(agent, kind, message));
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            SinkInner::Channel(_) => "channel",
            SinkInner::Callback(_) => "callback",
            SinkInner::Discard => "discard",
        };
        f.debug_struct("LogSink").field("kind", &kind).finish()
    }
}
