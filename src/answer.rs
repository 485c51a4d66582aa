//! Answer generation and the end-to-end question flow.
//!
//! [`build_messages`] renders the fixed prompt: a system instruction that
//! sets the persona and answer style, and a user message carrying every
//! retrieved context as a `From <source>:` block followed by the question.
//! [`Answerer`] sends it to the chat model once and returns the reply
//! verbatim. [`Assistant`] chains retrieval and answering.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::completion::{ChatMessage, ChatModel};
use crate::config::{Config, Credentials};
use crate::models::{Answer, RetrievalMatch};
use crate::retrieve::{preview, Retriever};
use crate::services::Services;

/// Questions run by `prep demo`.
pub const DEMO_QUESTIONS: [&str; 3] = [
    "Tell me about the MicroStrategy internship",
    "What distributed systems experience do you have?",
    "Explain your deep learning projects",
];

fn system_prompt(persona: &str) -> String {
    format!(
        "You are an AI assistant helping {persona} prepare for technical interviews.\n\
         You have access to information about their resume, projects, and technical skills.\n\
         Answer questions clearly and concisely, drawing from the provided context.\n\
         If asked to explain a project, provide technical details and impact.\n\
         Keep answers focused and interview-appropriate (1-2 minutes when spoken)."
    )
}

/// Join contexts as `From <source>:\n<text>` blocks separated by a blank line.
pub fn format_contexts(contexts: &[RetrievalMatch]) -> String {
    contexts
        .iter()
        .map(|c| format!("From {}:\n{}", c.source, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the system + user messages for one question.
pub fn build_messages(persona: &str, query: &str, contexts: &[RetrievalMatch]) -> Vec<ChatMessage> {
    let user = format!(
        "Context from {persona}'s documents:\n{}\n\nQuestion: {query}\n\n\
         Answer the question based on the context above. \
         Be specific and mention relevant projects/experience.",
        format_contexts(contexts)
    );
    vec![ChatMessage::system(system_prompt(persona)), ChatMessage::user(user)]
}

pub struct Answerer {
    chat: Arc<dyn ChatModel>,
    persona: String,
}

impl Answerer {
    pub fn new(chat: Arc<dyn ChatModel>, persona: impl Into<String>) -> Self {
        Self {
            chat,
            persona: persona.into(),
        }
    }

    /// Generate an answer from `contexts`. An empty context list still
    /// produces a call with an empty context section.
    pub async fn answer(&self, query: &str, contexts: &[RetrievalMatch]) -> Result<String> {
        let messages = build_messages(&self.persona, query, contexts);
        self.chat
            .complete(&messages)
            .await
            .context("Failed to generate answer")
    }
}

/// Retrieval followed by answering, with a fixed `top_k`.
pub struct Assistant {
    retriever: Retriever,
    answerer: Answerer,
    top_k: usize,
}

impl Assistant {
    pub fn new(retriever: Retriever, answerer: Answerer, top_k: usize) -> Self {
        Self {
            retriever,
            answerer,
            top_k,
        }
    }

    /// Build from connected services and the loaded config.
    pub fn from_services(services: &Services, config: &Config) -> Self {
        Self::new(
            Retriever::new(services.embedder.clone(), services.index.clone()),
            Answerer::new(services.chat.clone(), config.completion.persona.clone()),
            config.retrieval.top_k,
        )
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` using the configured `top_k`.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.ask_with_top_k(question, self.top_k).await
    }

    pub async fn ask_with_top_k(&self, question: &str, top_k: usize) -> Result<Answer> {
        tracing::info!(question, "searching");
        let contexts = self.retriever.search(question, top_k).await?;
        tracing::info!(found = contexts.len(), "found {} relevant chunks", contexts.len());

        tracing::info!("generating answer");
        let text = self.answerer.answer(question, &contexts).await?;
        Ok(Answer { text, contexts })
    }
}

async fn connect_assistant(config: &Config) -> Result<Assistant> {
    let credentials = Credentials::from_env()?;
    let services = Services::connect(config, &credentials).await?;
    Ok(Assistant::from_services(&services, config))
}

/// `prep ask`: answer one question and print it.
pub async fn run_ask(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("Please enter a question!");
    }
    let assistant = connect_assistant(config).await?;
    let answer = assistant
        .ask_with_top_k(question, top_k.unwrap_or(assistant.top_k()))
        .await?;

    println!("{}", answer.text);

    if show_sources {
        println!();
        println!("Sources:");
        for (i, ctx) in answer.contexts.iter().enumerate() {
            println!("  Source {}: {} (Relevance: {:.3})", i + 1, ctx.source, ctx.score);
            println!("    {}", preview(&ctx.text).replace('\n', " "));
        }
    }

    Ok(())
}

/// Render one demo question and its answer the way `prep demo` prints it.
pub fn format_demo_entry(question: &str, answer: &str) -> String {
    let rule = "=".repeat(60);
    format!("\n{rule}\nQ: {question}\n{rule}\n\nA: {answer}\n")
}

/// `prep demo`: run the fixed question list sequentially.
pub async fn run_demo(config: &Config) -> Result<()> {
    let assistant = connect_assistant(config).await?;
    for question in DEMO_QUESTIONS {
        let answer = assistant.ask(question).await?;
        println!("{}", format_demo_entry(question, &answer.text));
    }
    Ok(())
}
