//! Context aggregation: the concurrent read-composition that precedes
//! every upstream call.

use crate::{Backend, GatewayError, GenerationParams};
use llm::{Message, Request};
use store::{
    Credential, CredentialStore, HistoryStore, ModelConfig, ModelRegistry, ProjectSnapshot,
    ProjectStore, Turn,
};

/// How many recent turns are carried into the upstream request.
pub const HISTORY_WINDOW: usize = 10;

/// Everything a single `send_message` call needs, rebuilt per call and
/// discarded afterwards. Read-only input, never persisted as-is.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The upstream credential.
    pub credential: Credential,
    /// The most recent turns, chronological, at most [`HISTORY_WINDOW`].
    pub window: Vec<Turn>,
    /// The model to complete against.
    pub model: ModelConfig,
    /// The owning project's descriptive fields.
    pub project: ProjectSnapshot,
}

impl RequestContext {
    /// The system prompt, templated from the project snapshot. Built at
    /// request time, never stored in history.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are the assistant for the project \"{}\" (status: {}).",
            self.project.name, self.project.status
        );
        if !self.project.description.trim().is_empty() {
            prompt.push_str(" Project description: ");
            prompt.push_str(self.project.description.trim());
        }
        prompt.push_str(" Answer using the project context and the conversation so far.");
        prompt
    }

    /// Assemble the upstream request: system prompt, then the history
    /// window mapped role-for-role, then the new user message.
    pub fn request(&self, text: &str, params: &GenerationParams) -> Request {
        let mut messages = Vec::with_capacity(self.window.len() + 2);
        messages.push(Message::system(self.system_prompt()));
        messages.extend(self.window.iter().map(|turn| Message {
            role: turn.role,
            content: turn.content.clone(),
        }));
        messages.push(Message::user(text));

        Request::new(self.model.id.clone(), params.temperature, params.max_tokens)
            .messages(messages)
    }
}

/// Fetch credential, history, active model, and project snapshot
/// concurrently and join them into a [`RequestContext`].
///
/// Credential and project resolution are fatal; history degrades to an
/// empty window and the model registry degrades to the default model.
pub async fn aggregate<B: Backend>(
    backend: &B,
    conversation: &str,
) -> Result<RequestContext, GatewayError> {
    let (credential, history, model, project) = tokio::join!(
        backend.credentials().get(),
        backend.storage().list(conversation),
        backend.models().active(),
        backend.storage().get(conversation),
    );

    let credential = match credential {
        Ok(Some(credential)) => credential,
        Ok(None) => return Err(GatewayError::MissingCredential),
        Err(error) => {
            tracing::warn!("credential lookup failed: {error:#}");
            return Err(GatewayError::MissingCredential);
        }
    };

    let project = match project {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return Err(GatewayError::ProjectNotFound(conversation.into())),
        Err(error) => {
            tracing::warn!("project lookup for `{conversation}` failed: {error:#}");
            return Err(GatewayError::ProjectNotFound(conversation.into()));
        }
    };

    let mut window = history.unwrap_or_else(|error| {
        tracing::warn!("history read failed, proceeding with an empty window: {error:#}");
        Vec::new()
    });
    if window.len() > HISTORY_WINDOW {
        window.drain(..window.len() - HISTORY_WINDOW);
    }

    let model = model.unwrap_or_else(|error| {
        tracing::warn!("active model lookup failed, using the default model: {error:#}");
        ModelConfig::default()
    });

    Ok(RequestContext {
        credential,
        window,
        model,
        project,
    })
}
