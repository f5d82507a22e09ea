//! One query, one answer
//!
//! Ties together history, request assembly, the remote call and response
//! parsing. Only the remote call and input validation can fail a query:
//! history and diagnostic log problems are logged as warnings and the query
//! proceeds without them.

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;

use crate::diagnostics::DiagnosticLog;
use crate::history::{Interaction, InteractionStore};
use crate::parser::ParsedAnswer;
use crate::prompt::{build_request, full_system_prompt};
use crate::providers::{DEFAULT_MAX_TOKENS, LlmProvider, LlmResponse, ProviderError};

/// Longest accepted query, in characters
pub const MAX_QUERY_CHARS: usize = 1000;

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Query is too long. Please limit your query to {max} characters.")]
    QueryTooLong { length: usize, max: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Rejects queries longer than [`MAX_QUERY_CHARS`] before anything is sent
pub fn validate_query(query: &str) -> Result<(), AskError> {
    let length = query.chars().count();
    if length > MAX_QUERY_CHARS {
        return Err(AskError::QueryTooLong {
            length,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(())
}

/// What the model answered
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub explanation: Option<String>,
    pub command: Option<String>,
    /// Model reasoning, logged but never printed
    pub thinking: Option<String>,
    pub response: LlmResponse,
}

pub struct Assistant {
    provider: Arc<dyn LlmProvider>,
    store: InteractionStore,
    log: Option<DiagnosticLog>,
    max_tokens: u32,
    model: Option<String>,
}

impl Assistant {
    pub fn new(provider: Arc<dyn LlmProvider>, store: InteractionStore) -> Self {
        Self {
            provider,
            store,
            log: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            model: None,
        }
    }

    pub fn with_log(mut self, log: DiagnosticLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Overrides the provider's default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Asks the model for a command answering `query`.
    ///
    /// `environment` is the rendered environment block. The interaction is
    /// recorded in the history only when the remote call succeeds.
    pub async fn ask(&self, query: &str, environment: &str) -> Result<Answer, AskError> {
        validate_query(query)?;

        let working_set = match self.store.load_working_set(Local::now().naive_local()).await {
            Ok(working_set) => working_set,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load previous interactions");
                Vec::new()
            }
        };

        let system = full_system_prompt(environment);
        self.note("User Query", query).await;
        self.note("System Prompt", &system).await;

        let request = build_request(
            system,
            &working_set,
            query,
            self.max_tokens,
            self.model.clone(),
        );

        tracing::info!(
            provider = self.provider.provider_name(),
            model = %self.model.clone().unwrap_or_else(|| self.provider.default_model()),
            history = working_set.len(),
            "Sending query"
        );

        let response = self.provider.complete(request).await?;

        self.note("Raw Response", &response.content).await;
        let parsed = ParsedAnswer::from_response(&response.content);

        let full = serde_json::to_string_pretty(&response)
            .unwrap_or_else(|_| format!("{:?}", response));
        self.note("Full Response", &full).await;

        let interaction = Interaction::new(
            query,
            parsed.command.clone(),
            parsed.explanation.clone(),
        );
        if let Err(e) = self.store.record(working_set, interaction).await {
            tracing::warn!(error = %e, "Could not save interactions");
        }

        Ok(Answer {
            explanation: parsed.explanation,
            command: parsed.command,
            thinking: parsed.thinking,
            response,
        })
    }

    async fn note(&self, label: &str, content: &str) {
        if let Some(log) = &self.log {
            if let Err(e) = log.append_labeled(label, content).await {
                tracing::warn!(error = %e, "Could not write diagnostic log");
            }
        }
    }
}
