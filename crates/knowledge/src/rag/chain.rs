//! Retrieval chains: retrieve, render, generate.

use crate::rag::generator::Generator;
use crate::rag::memory::ConversationMemory;
use crate::rag::types::{ChainInput, ChainOutput};
use crate::store::Retriever;
use faqbot_core::{AppError, AppResult};
use faqbot_prompt::{render, render_template, PromptTemplate};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Name the default chain is registered under.
pub const CONVERSATIONAL: &str = "conversational";

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question.\n\n\
Chat History:\n{{history}}\n\
Follow Up Input: {{question}}\n\
Standalone question:";

/// How a chain reads its input and uses memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFlavor {
    /// Reads `question`, condenses follow-ups against memory, records turns
    Conversational,
    /// Reads `input`, stateless
    PlainRetrieval,
}

impl ChainFlavor {
    /// Parse a flavor name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conversational" => Some(Self::Conversational),
            "retrieval" | "plain" => Some(Self::PlainRetrieval),
            _ => None,
        }
    }

    /// Key of the question in the chain input.
    pub fn input_key(&self) -> &'static str {
        match self {
            Self::Conversational => "question",
            Self::PlainRetrieval => "input",
        }
    }
}

/// A retriever, a prompt and a generator composed into one callable.
pub struct RetrievalChain {
    flavor: ChainFlavor,
    retriever: Arc<dyn Retriever>,
    prompt: PromptTemplate,
    memory: Option<Arc<ConversationMemory>>,
    generator: Generator,
}

impl RetrievalChain {
    pub fn new(
        flavor: ChainFlavor,
        retriever: Arc<dyn Retriever>,
        prompt: PromptTemplate,
        memory: Option<Arc<ConversationMemory>>,
        generator: Generator,
    ) -> Self {
        Self {
            flavor,
            retriever,
            prompt,
            memory,
            generator,
        }
    }

    pub fn flavor(&self) -> ChainFlavor {
        self.flavor
    }

    pub fn prompt_name(&self) -> &str {
        &self.prompt.name
    }

    /// Build the input map this chain expects for `question`.
    pub fn input_for(&self, question: &str) -> ChainInput {
        let mut input = HashMap::new();
        input.insert(self.flavor.input_key().to_string(), question.to_string());
        input
    }

    /// Run the chain.
    ///
    /// # Errors
    /// Fails when the input lacks the flavor's key, or when retrieval,
    /// rendering or generation fails. Memory is only updated on success.
    pub async fn invoke(&self, input: &ChainInput) -> AppResult<ChainOutput> {
        let key = self.flavor.input_key();
        let question = input.get(key).ok_or_else(|| {
            AppError::Knowledge(format!("Chain input is missing the '{}' key", key))
        })?;

        let standalone = self.standalone_question(question).await?;

        let documents = self.retriever.retrieve(&standalone).await?;
        tracing::debug!("Retrieved {} chunks for chain query", documents.len());

        let context = documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let rendered = render(&self.prompt, &context, &standalone)?;
        let answer = self.generator.generate_rendered(&rendered).await?;

        if self.flavor == ChainFlavor::Conversational {
            if let Some(ref memory) = self.memory {
                memory.save_turn(question, &answer);
            }
        }

        Ok(ChainOutput {
            answer,
            source_documents: documents,
        })
    }

    async fn standalone_question(&self, question: &str) -> AppResult<String> {
        let memory = match (self.flavor, &self.memory) {
            (ChainFlavor::Conversational, Some(memory)) if !memory.is_empty() => memory,
            _ => return Ok(question.to_string()),
        };

        let mut variables = HashMap::new();
        variables.insert("history".to_string(), memory.format_history());
        variables.insert("question".to_string(), question.to_string());
        let prompt = render_template(CONDENSE_TEMPLATE, &variables)?;

        let condensed = self.generator.generate(None, &prompt).await?;
        let condensed = condensed.trim();
        if condensed.is_empty() {
            Ok(question.to_string())
        } else {
            tracing::debug!("Condensed follow-up into: {}", condensed);
            Ok(condensed.to_string())
        }
    }
}

/// Named chains available to `ask`.
#[derive(Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<String, Arc<RetrievalChain>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `chain` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, chain: Arc<RetrievalChain>) {
        if self.chains.insert(name.to_string(), chain).is_some() {
            tracing::debug!("Replaced chain '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<RetrievalChain>> {
        self.chains.get(name).map(Arc::clone)
    }

    /// Registered chains, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<RetrievalChain>)> {
        self.chains.iter().map(|(name, chain)| (name.as_str(), chain))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let sorted: BTreeMap<_, _> = self.chains.iter().collect();
        sorted.into_keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::memory::MemoryKind;
    use crate::types::{DocumentMetadata, RetrievedChunk};
    use faqbot_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmUsage};
    use std::sync::Mutex;

    struct FixedRetriever;

    #[async_trait::async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str) -> AppResult<Vec<RetrievedChunk>> {
            Ok(vec![
                RetrievedChunk {
                    text: "Fees are due in September.".to_string(),
                    metadata: DocumentMetadata {
                        source: "fees.txt".to_string(),
                        source_type: "file".to_string(),
                        length: 26,
                    },
                    position: 0,
                    score: 0.9,
                },
                RetrievedChunk {
                    text: "Late fees apply after October.".to_string(),
                    metadata: DocumentMetadata {
                        source: "fees.txt".to_string(),
                        source_type: "file".to_string(),
                        length: 30,
                    },
                    position: 1,
                    score: 0.7,
                },
            ])
        }
    }

    /// Echoes the system message and records every request.
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for Recorder {
        fn provider_name(&self) -> &str {
            "recorder"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let content = if request.prompt.contains("Standalone question:") {
                "When are tuition fees due?".to_string()
            } else {
                "September".to_string()
            };
            Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }

        async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
            Err(AppError::Llm("no streaming".to_string()))
        }
    }

    fn chain(
        flavor: ChainFlavor,
        llm: Arc<Recorder>,
        memory: Option<Arc<ConversationMemory>>,
    ) -> RetrievalChain {
        RetrievalChain::new(
            flavor,
            Arc::new(FixedRetriever),
            PromptTemplate::new("faq", "Context:\n{{context}}", "{{question}}"),
            memory,
            Generator::new(llm, "test-model"),
        )
    }

    #[tokio::test]
    async fn test_invoke_joins_context_and_records_turn() {
        let llm = Arc::new(Recorder::default());
        let memory = Arc::new(ConversationMemory::new(MemoryKind::Window(5)));
        let chain = chain(ChainFlavor::Conversational, llm.clone(), Some(memory.clone()));

        let output = chain.invoke(&chain.input_for("When are fees due?")).await.unwrap();

        assert_eq!(output.answer, "September");
        assert_eq!(output.source_documents.len(), 2);
        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].system.as_deref(),
            Some("Context:\nFees are due in September.\n\nLate fees apply after October.")
        );
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_is_condensed_against_history() {
        let llm = Arc::new(Recorder::default());
        let memory = Arc::new(ConversationMemory::new(MemoryKind::Buffer));
        memory.save_turn("What are the tuition fees?", "They are listed per semester.");
        let chain = chain(ChainFlavor::Conversational, llm.clone(), Some(memory.clone()));

        chain.invoke(&chain.input_for("When are they due?")).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].prompt.contains("Human: What are the tuition fees?"));
        assert!(requests[0].prompt.contains("Follow Up Input: When are they due?"));
        assert_eq!(requests[1].prompt, "When are tuition fees due?");
        assert_eq!(memory.turns()[1].question, "When are they due?");
    }

    #[tokio::test]
    async fn test_plain_chain_reads_input_key_and_keeps_no_memory() {
        let llm = Arc::new(Recorder::default());
        let chain = chain(ChainFlavor::PlainRetrieval, llm, None);

        let mut wrong = ChainInput::new();
        wrong.insert("question".to_string(), "When are fees due?".to_string());
        assert!(chain.invoke(&wrong).await.is_err());

        let output = chain.invoke(&chain.input_for("When are fees due?")).await.unwrap();
        assert_eq!(output.answer, "September");
    }

    #[test]
    fn test_registry_overwrites_and_sorts() {
        let llm = Arc::new(Recorder::default());
        let mut registry = ChainRegistry::new();
        registry.register("zeta", Arc::new(chain(ChainFlavor::PlainRetrieval, llm.clone(), None)));
        registry.register(CONVERSATIONAL, Arc::new(chain(ChainFlavor::PlainRetrieval, llm.clone(), None)));
        registry.register(CONVERSATIONAL, Arc::new(chain(ChainFlavor::Conversational, llm, None)));

        assert_eq!(registry.names(), vec!["conversational", "zeta"]);
        assert_eq!(
            registry.get(CONVERSATIONAL).unwrap().flavor(),
            ChainFlavor::Conversational
        );
        assert!(registry.get("missing").is_none());
    }
}
