use chrono::{Duration, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

/// Interactions older than this are not replayed
pub const HISTORY_WINDOW_HOURS: i64 = 18;
/// Upper bound on replayed query + command + explanation characters
pub const HISTORY_CHAR_BUDGET: usize = 5000;
/// Interactions kept in the history file
pub const MAX_STORED_INTERACTIONS: usize = 5;

/// One query/answer round-trip.
///
/// Timestamps are local wall-clock time without offset, serialized as
/// `2024-05-01T09:30:00.123456`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl Interaction {
    /// Creates an interaction stamped with the current local time.
    ///
    /// The stamp is truncated to microseconds so at most six fractional
    /// digits are written.
    pub fn new(
        query: impl Into<String>,
        command: Option<String>,
        explanation: Option<String>,
    ) -> Self {
        let now = Local::now().naive_local().trunc_subsecs(6);
        Self::at(query, command, explanation, now)
    }

    pub fn at(
        query: impl Into<String>,
        command: Option<String>,
        explanation: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            query: query.into(),
            command,
            explanation,
            timestamp,
        }
    }

    /// Characters this interaction contributes to the replay budget
    pub fn content_len(&self) -> usize {
        let field_len = |field: Option<&str>| field.map_or(0, |s| s.chars().count());

        self.query.chars().count()
            + field_len(self.command.as_deref())
            + field_len(self.explanation.as_deref())
    }
}

/// Bounds applied to the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Only interactions strictly newer than `now - max_age` are replayed
    pub max_age: Duration,
    /// Cumulative content budget of the working set
    pub char_budget: usize,
    /// Durable cap on stored interactions
    pub max_entries: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(HISTORY_WINDOW_HOURS),
            char_budget: HISTORY_CHAR_BUDGET,
            max_entries: MAX_STORED_INTERACTIONS,
        }
    }
}
