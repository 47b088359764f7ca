//! The question-answering orchestrator.
//!
//! A [`Bot`] owns one session (conversation memory plus the current chain),
//! runs questions through a chain, and re-answers from web search context
//! when the grounded answer is judged unusable.

use crate::embeddings::create_provider;
use crate::index::MemoryIndex;
use crate::rag::chain::{ChainFlavor, ChainRegistry, RetrievalChain, CONVERSATIONAL};
use crate::rag::generator::Generator;
use crate::rag::judge::is_answer_unavailable;
use crate::rag::memory::{ConversationMemory, MemoryKind, DEFAULT_WINDOW};
use crate::rag::types::{Answer, AskOutcome, SourceDocument, SystemInfo};
use crate::store::{VectorStoreManager, DEFAULT_TOP_K};
use crate::web::WebFallbackSearch;
use faqbot_core::{AppConfig, AppError, AppResult};
use faqbot_llm::{create_client, LlmClient};
use faqbot_prompt::{load_custom_prompts, render_template, PromptCatalog};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Prompt used to answer from web search context.
pub const FALLBACK_PROMPT: &str =
    "Use the information below to answer the user's question.\n\nContext:\n{{context}}\n\nQuestion: {{question}}";

/// Settings of a [`Bot`].
#[derive(Debug, Clone)]
pub struct BotOptions {
    pub model: String,
    pub temperature: f32,
    pub streaming: bool,
    /// Prompt used by the chain built in `setup`
    pub prompt: String,
    pub top_k: usize,
    pub memory_window: usize,
    /// Deadline for a whole `ask`
    pub ask_timeout: Option<Duration>,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            temperature: crate::rag::generator::DEFAULT_TEMPERATURE,
            streaming: false,
            prompt: faqbot_prompt::STRICT.to_string(),
            top_k: DEFAULT_TOP_K,
            memory_window: DEFAULT_WINDOW,
            ask_timeout: None,
        }
    }
}

impl BotOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            streaming: false,
            prompt: config.bot.prompt.clone(),
            top_k: config.store.top_k,
            memory_window: config.bot.memory_window,
            ask_timeout: config.bot.ask_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Everything `setup` replaces, published with a single swap.
///
/// Every registered chain runs over `index`, and conversational ones share
/// `memory`.
struct SessionState {
    index: Arc<MemoryIndex>,
    memory: Arc<ConversationMemory>,
    chain: Arc<RetrievalChain>,
    chains: ChainRegistry,
}

/// Top-level driver of retrieval, judging and web fallback.
pub struct Bot {
    generator: Generator,
    prompts: RwLock<PromptCatalog>,
    store: Arc<VectorStoreManager>,
    web: Arc<WebFallbackSearch>,
    session: RwLock<Option<Arc<SessionState>>>,
    options: BotOptions,
}

impl Bot {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<VectorStoreManager>,
        web: Arc<WebFallbackSearch>,
        options: BotOptions,
    ) -> Self {
        let generator = Generator::new(llm, options.model.clone())
            .with_temperature(options.temperature)
            .with_streaming(options.streaming);

        Self {
            generator,
            prompts: RwLock::new(PromptCatalog::new()),
            store,
            web,
            session: RwLock::new(None),
            options,
        }
    }

    /// Build every collaborator from configuration and load custom prompts
    /// from the workspace.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            config.llm.api_key.as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        let embedder = create_provider(&config.embedding)?;
        let store = Arc::new(VectorStoreManager::with_chunking(
            embedder,
            config.store.chunk_size,
            config.store.chunk_overlap,
        ));
        let web = Arc::new(WebFallbackSearch::from_settings(&config.search)?);

        let bot = Self::new(llm, store, web, BotOptions::from_config(config));

        let prompts_dir = config.prompts_dir();
        if prompts_dir.is_dir() {
            let count = load_custom_prompts(&mut write(&bot.prompts), &prompts_dir)?;
            tracing::info!("Loaded {} custom prompts from {:?}", count, prompts_dir);
        }

        Ok(bot)
    }

    pub fn store(&self) -> Arc<VectorStoreManager> {
        Arc::clone(&self.store)
    }

    pub fn options(&self) -> &BotOptions {
        &self.options
    }

    /// Load the index at `store_path` and install a fresh memory and
    /// conversational chain over it.
    ///
    /// Chains registered earlier are rebuilt over the new index and memory.
    /// Returns `false` on any failure; the previous session, index and
    /// chains are then left as they were.
    pub fn setup(&self, store_path: &Path, memory_type: &str) -> bool {
        match self.try_setup(store_path, memory_type) {
            Ok(()) => {
                tracing::info!("Bot setup completed with store {:?}", store_path);
                true
            }
            Err(e) => {
                tracing::error!("Bot setup failed: {}", e);
                false
            }
        }
    }

    fn try_setup(&self, store_path: &Path, memory_type: &str) -> AppResult<()> {
        let kind = MemoryKind::parse(memory_type, self.options.memory_window)?;
        let index = self.store.open(store_path)?;
        let memory = Arc::new(ConversationMemory::new(kind));

        // Held until the new session is published.
        let mut session = write(&self.session);

        let chain = self.build_chain(
            ChainFlavor::Conversational,
            &self.options.prompt,
            &index,
            &memory,
        );

        let mut chains = ChainRegistry::new();
        if let Some(previous) = session.as_ref() {
            for (name, registered) in previous.chains.iter() {
                if name == CONVERSATIONAL {
                    continue;
                }
                let rebuilt =
                    self.build_chain(registered.flavor(), registered.prompt_name(), &index, &memory);
                chains.register(name, rebuilt);
            }
        }
        chains.register(CONVERSATIONAL, Arc::clone(&chain));

        self.store.install(Arc::clone(&index))?;
        *session = Some(Arc::new(SessionState {
            index,
            memory,
            chain,
            chains,
        }));

        Ok(())
    }

    fn build_chain(
        &self,
        flavor: ChainFlavor,
        prompt_name: &str,
        index: &Arc<MemoryIndex>,
        memory: &Arc<ConversationMemory>,
    ) -> Arc<RetrievalChain> {
        let prompt = read(&self.prompts).get(prompt_name).clone();
        let retriever = self
            .store
            .retriever_for(Arc::clone(index), self.options.top_k);
        let memory = match flavor {
            ChainFlavor::Conversational => Some(Arc::clone(memory)),
            ChainFlavor::PlainRetrieval => None,
        };

        Arc::new(RetrievalChain::new(
            flavor,
            Arc::new(retriever),
            prompt,
            memory,
            self.generator.clone(),
        ))
    }

    /// Answer `question` with the named chain, or the current chain when the
    /// name is absent or unregistered.
    ///
    /// Never fails: provider errors and an elapsed deadline become
    /// [`AskOutcome::InternalError`].
    pub async fn ask(&self, question: &str, chain_name: Option<&str>) -> AskOutcome {
        let Some(chain) = self.resolve_chain(chain_name) else {
            tracing::warn!("No QA chain configured");
            return AskOutcome::NoChainConfigured;
        };

        let result = match self.options.ask_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, self.answer(&chain, question)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Other(format!(
                    "Question timed out after {:.1}s",
                    deadline.as_secs_f64()
                ))),
            },
            None => self.answer(&chain, question).await,
        };

        match result {
            Ok(answer) => AskOutcome::Answered(answer),
            Err(e) => {
                tracing::error!("Error processing question: {}", e);
                AskOutcome::InternalError {
                    message: e.to_string(),
                }
            }
        }
    }

    fn resolve_chain(&self, chain_name: Option<&str>) -> Option<Arc<RetrievalChain>> {
        let session = read(&self.session);
        let session = session.as_ref()?;
        chain_name
            .and_then(|name| session.chains.get(name))
            .or_else(|| Some(Arc::clone(&session.chain)))
    }

    async fn answer(&self, chain: &RetrievalChain, question: &str) -> AppResult<Answer> {
        let output = chain.invoke(&chain.input_for(question)).await?;

        if !is_answer_unavailable(&output.answer) {
            return Ok(Answer {
                text: output.answer,
                sources: output
                    .source_documents
                    .into_iter()
                    .map(SourceDocument::from)
                    .collect(),
                fallback_used: false,
            });
        }

        tracing::info!("Grounded answer unavailable, falling back to web search");

        let context = self
            .web
            .search(question, self.web.default_num_results(), true)
            .await?;

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context);
        variables.insert("question".to_string(), question.to_string());
        let prompt = render_template(FALLBACK_PROMPT, &variables)?;

        let text = self.generator.generate(None, &prompt).await?;

        Ok(Answer {
            sources: vec![SourceDocument::web_search(text.clone())],
            text,
            fallback_used: true,
        })
    }

    /// Clear the session memory; a no-op without a session.
    pub fn clear_memory(&self) {
        match read(&self.session).as_ref() {
            Some(session) => {
                session.memory.clear();
                tracing::info!("Conversation memory cleared");
            }
            None => tracing::info!("No active memory to clear"),
        }
    }

    /// Status snapshot.
    pub fn system_info(&self) -> SystemInfo {
        let session = read(&self.session);
        SystemInfo {
            available_prompts: read(&self.prompts).list(),
            available_chains: session
                .as_ref()
                .map(|session| session.chains.names())
                .unwrap_or_default(),
            vectorstore_loaded: self.store.is_loaded(),
            memory_active: session.is_some(),
            current_chain_active: session.is_some(),
            index: self.store.stats(),
        }
    }

    /// Build a chain over the session index and register it as `name`.
    ///
    /// Conversational chains share the session memory. The chain is rebuilt
    /// by every later `setup`.
    ///
    /// # Errors
    /// Fails with `AppError::Config` when no session has been set up.
    pub fn register_chain(&self, name: &str, flavor: ChainFlavor, prompt_name: &str) -> AppResult<()> {
        let mut session = write(&self.session);
        let current = session.as_ref().ok_or_else(|| {
            AppError::Config("No session configured; run setup first".to_string())
        })?;

        let chain = self.build_chain(flavor, prompt_name, &current.index, &current.memory);
        let mut chains = current.chains.clone();
        chains.register(name, chain);

        let next = SessionState {
            index: Arc::clone(&current.index),
            memory: Arc::clone(&current.memory),
            chain: Arc::clone(&current.chain),
            chains,
        };
        *session = Some(Arc::new(next));

        tracing::info!("Registered chain '{}' ({:?}, prompt '{}')", name, flavor, prompt_name);
        Ok(())
    }

    /// Register or overwrite a prompt template.
    pub fn add_custom_prompt(&self, name: &str, system: &str, human: Option<&str>) {
        write(&self.prompts).add_custom(name, system, human);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
