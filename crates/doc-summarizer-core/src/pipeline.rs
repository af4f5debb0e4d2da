//! Rephrase → retrieve → generate answer pipeline.
//!
//! A question moves through typed stages, each consuming the previous one:
//!
//! ```text
//! Asked ──rephrase──▶ Rephrased ──retrieve──▶ Retrieved ──generate──▶ Answered
//! ```
//!
//! Every stage adds exactly one piece of state, so a later stage can never
//! run without the output of the one before it. [`AnswerGenerator`] drives
//! the whole chain for one request-scoped [`VectorStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{GenerationError, PipelineError};
use crate::models::ScoredChunk;
use crate::store::{VectorStore, DEFAULT_K};

/// System instruction for the rephrase call.
pub const REPHRASE_SYSTEM_PROMPT: &str = "meet the following objective to the best of your ability:";

const REPHRASE_PROMPT: &str = "Rephrase the following question as a standalone question:\n";

const ANSWER_PROMPT: &str = "Now, answer this question:\n";

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Run one completion with a system instruction and a user message.
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// User prompt asking for a standalone rephrasing of `question`.
pub fn rephrase_prompt(question: &str) -> String {
    format!("{}{}", REPHRASE_PROMPT, question)
}

/// System prompt for the answer call, embedding the retrieved context.
pub fn answer_system_prompt(context: &str, standalone_question: &str) -> String {
    format!(
        "You are an experienced researcher,\n\
         interpret and answer the user's question using only the provided sources.\n\
         <context>\n{}\n</context>\n\
         The user's question is: {}",
        context, standalone_question
    )
}

/// User prompt for the answer call.
pub fn answer_prompt(standalone_question: &str) -> String {
    format!("{}{}", ANSWER_PROMPT, standalone_question)
}

/// Wrap each chunk in `<doc>` tags, in rank order, one per line.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("<doc>\n{}\n</doc>", c.chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn complete_non_empty(
    chat: &dyn ChatModel,
    system: &str,
    user: &str,
) -> Result<String, GenerationError> {
    let text = chat.complete(system, user).await?;
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// A question as the user asked it.
#[derive(Debug, Clone)]
pub struct Asked {
    pub question: String,
}

/// The question plus its standalone rephrasing.
#[derive(Debug, Clone)]
pub struct Rephrased {
    pub question: String,
    pub standalone_question: String,
}

/// The rephrased question plus retrieved sources and their formatted context.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub question: String,
    pub standalone_question: String,
    pub sources: Vec<ScoredChunk>,
    pub context: String,
}

/// Terminal pipeline state.
#[derive(Debug, Clone)]
pub struct Answered {
    pub question: String,
    pub standalone_question: String,
    pub sources: Vec<ScoredChunk>,
    pub context: String,
    pub answer: String,
}

impl Asked {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    pub async fn rephrase(self, chat: &dyn ChatModel) -> Result<Rephrased, GenerationError> {
        let standalone_question =
            complete_non_empty(chat, REPHRASE_SYSTEM_PROMPT, &rephrase_prompt(&self.question))
                .await?;
        debug!(standalone = %standalone_question, "rephrased question");
        Ok(Rephrased {
            question: self.question,
            standalone_question,
        })
    }
}

impl Rephrased {
    pub async fn retrieve(self, store: &VectorStore, k: usize) -> Result<Retrieved, PipelineError> {
        let sources = store.retrieve(&self.standalone_question, k).await?;
        let context = format_context(&sources);
        debug!(sources = sources.len(), "retrieved context");
        Ok(Retrieved {
            question: self.question,
            standalone_question: self.standalone_question,
            sources,
            context,
        })
    }
}

impl Retrieved {
    pub async fn generate(self, chat: &dyn ChatModel) -> Result<Answered, GenerationError> {
        if self.sources.is_empty() {
            warn!("answering without retrieved context");
        }
        let system = answer_system_prompt(&self.context, &self.standalone_question);
        let answer =
            complete_non_empty(chat, &system, &answer_prompt(&self.standalone_question)).await?;
        Ok(Answered {
            question: self.question,
            standalone_question: self.standalone_question,
            sources: self.sources,
            context: self.context,
            answer,
        })
    }
}

/// Answers questions against one [`VectorStore`].
pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
    store: VectorStore,
    k: usize,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatModel>, store: VectorStore) -> Self {
        Self {
            chat,
            store,
            k: DEFAULT_K,
        }
    }

    /// Number of chunks retrieved per question.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Run rephrase, retrieve, and generate in order. The first failing stage
    /// aborts the run.
    pub async fn answer(&self, question: &str) -> Result<Answered, PipelineError> {
        let chat = self.chat.as_ref();
        let rephrased = Asked::new(question).rephrase(chat).await?;
        let retrieved = rephrased.retrieve(&self.store, self.k).await?;
        Ok(retrieved.generate(chat).await?)
    }
}
