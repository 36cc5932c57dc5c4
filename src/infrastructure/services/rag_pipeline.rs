//! Build and query entry points for the retrieval-augmented generation pipeline
//!
//! Build path: `DirectoryLoader -> RecursiveChunker -> Indexer -> IndexStore`.
//! Query path: `Retriever -> PromptComposer -> GenerationInvoker`, run by a
//! [`QueryEngine`] that holds one loaded index for its whole lifetime.

use std::path::Path;
use std::sync::Arc;

use crate::domain::{
    Answer, ChunkingConfig, ChunkingStrategy, DistanceMetric, EmbeddingProvider, Index,
    LlmProvider, PromptComposer, QueryProgress, QueryStage, RagError, TemplateVersion,
};
use crate::infrastructure::index_store::{BuildLock, IndexManifest, IndexStore};
use crate::infrastructure::ingestion::{DirectoryLoader, RecursiveChunker};

use super::generator::{GenerationInvoker, DEFAULT_GENERATION_MODEL, DEFAULT_TEMPERATURE};
use super::indexer::Indexer;
use super::retriever::Retriever;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Models and tuning the pipeline runs with
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub embedding_model: String,
    pub embedding_batch_size: usize,
    pub embedding_concurrency: usize,
    pub metric: DistanceMetric,
    pub generation_model: String,
    pub temperature: f32,
    pub template: TemplateVersion,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_batch_size: 64,
            embedding_concurrency: 4,
            metric: DistanceMetric::L2,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            template: TemplateVersion::V1,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.embedding_model.trim().is_empty() {
            return Err(RagError::configuration("embedding model must be set"));
        }

        if self.generation_model.trim().is_empty() {
            return Err(RagError::configuration("generation model must be set"));
        }

        if self.embedding_batch_size == 0 {
            return Err(RagError::configuration("embedding batch size must be at least 1"));
        }

        if self.embedding_concurrency == 0 {
            return Err(RagError::configuration("embedding concurrency must be at least 1"));
        }

        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(RagError::configuration(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Builder for [`RagPipeline`]
#[derive(Default)]
pub struct RagPipelineBuilder {
    options: PipelineOptions,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    llm_provider: Option<Arc<dyn LlmProvider>>,
    loader: Option<DirectoryLoader>,
    chunker: Option<Arc<dyn ChunkingStrategy>>,
}

impl RagPipelineBuilder {
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn llm_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.llm_provider = Some(provider);
        self
    }

    pub fn loader(mut self, loader: DirectoryLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn ChunkingStrategy>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn build(self) -> Result<RagPipeline, RagError> {
        self.options.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::configuration("an embedding provider is required"))?;
        let llm_provider = self
            .llm_provider
            .ok_or_else(|| RagError::configuration("a generation provider is required"))?;

        Ok(RagPipeline {
            options: self.options,
            embedding_provider,
            llm_provider,
            loader: self.loader.unwrap_or_default(),
            chunker: self
                .chunker
                .unwrap_or_else(|| Arc::new(RecursiveChunker::new())),
        })
    }
}

/// Explicitly constructed pipeline with its capabilities wired in
///
/// Building an index and answering questions are separate operations; the
/// index location is passed to both.
#[derive(Clone)]
pub struct RagPipeline {
    options: PipelineOptions,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    llm_provider: Arc<dyn LlmProvider>,
    loader: DirectoryLoader,
    chunker: Arc<dyn ChunkingStrategy>,
}

impl RagPipeline {
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    fn index_store(&self) -> IndexStore {
        IndexStore::new(
            &self.options.embedding_model,
            self.embedding_provider
                .dimensions(&self.options.embedding_model),
        )
    }

    /// Load, chunk, embed and persist every supported document in `source_dir`
    ///
    /// The index at `index_location` is replaced only if every step succeeds.
    pub async fn build_index(
        &self,
        source_dir: &Path,
        index_location: &Path,
        chunking: ChunkingConfig,
    ) -> Result<IndexManifest, RagError> {
        chunking.validate()?;

        let documents = self.loader.load(source_dir).await?;
        let chunks = self.chunker.chunk_all(&documents, &chunking)?;

        let lock = BuildLock::acquire(index_location)?;

        tracing::info!(
            documents = documents.len(),
            chunk_count = chunks.len(),
            chunker = self.chunker.name(),
            chunk_size = chunking.chunk_size,
            chunk_overlap = chunking.chunk_overlap,
            "Chunked corpus"
        );

        let index = Indexer::new(
            self.embedding_provider.clone(),
            &self.options.embedding_model,
        )
        .with_metric(self.options.metric)
        .with_batch_size(self.options.embedding_batch_size)
        .with_concurrency(self.options.embedding_concurrency)
        .build(chunks)
        .await?;

        self.index_store().save(&lock, &index).await
    }

    /// Load the index at `index_location` for querying
    pub async fn open(&self, index_location: &Path) -> Result<QueryEngine, RagError> {
        let index = self.index_store().load(index_location).await?;
        Ok(self.engine_for(index))
    }

    /// Query engine over an index that is already in memory
    pub fn engine_for(&self, index: Index) -> QueryEngine {
        QueryEngine {
            index: Arc::new(index),
            retriever: Retriever::new(
                self.embedding_provider.clone(),
                &self.options.embedding_model,
            ),
            composer: PromptComposer::new(self.options.template),
            generator: GenerationInvoker::new(
                self.llm_provider.clone(),
                &self.options.generation_model,
                self.options.temperature,
            ),
        }
    }

    /// Open the index at `index_location` and answer one question from it
    pub async fn answer_question(
        &self,
        index_location: &Path,
        question: &str,
        k: usize,
    ) -> Result<Answer, RagError> {
        self.open(index_location).await?.answer(question, k).await
    }
}

/// Answers questions against one read-only index
///
/// Cheap to clone; clones share the index and may run queries concurrently.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    index: Arc<Index>,
    retriever: Retriever,
    composer: PromptComposer,
    generator: GenerationInvoker,
}

impl QueryEngine {
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub async fn answer(&self, question: &str, k: usize) -> Result<Answer, RagError> {
        self.answer_with_progress(question, k).await.0
    }

    /// Answer a question, also returning the stages the query went through
    pub async fn answer_with_progress(
        &self,
        question: &str,
        k: usize,
    ) -> (Result<Answer, RagError>, QueryProgress) {
        let mut progress = QueryProgress::new();
        let result = self.run(&mut progress, question, k).await;

        match &result {
            Ok(_) => enter(&mut progress, QueryStage::Completed),
            Err(e) => {
                tracing::warn!(stage = progress.current().name(), error = %e, "Query failed");
                enter(&mut progress, QueryStage::Failed(e.kind().as_str().to_string()));
            }
        }

        (result, progress)
    }

    async fn run(
        &self,
        progress: &mut QueryProgress,
        question: &str,
        k: usize,
    ) -> Result<Answer, RagError> {
        if k == 0 {
            return Err(RagError::configuration("k must be at least 1"));
        }

        enter(progress, QueryStage::Embedding);
        let query_vector = self.retriever.embed_query(&self.index, question).await?;

        enter(progress, QueryStage::Retrieving);
        let retrieved = self.retriever.rank(&self.index, &query_vector, k)?;

        enter(progress, QueryStage::Composing);
        let prompt = self
            .composer
            .compose(&retrieved, question)
            .map_err(|e| RagError::configuration(format!("Prompt template error: {}", e)))?;

        enter(progress, QueryStage::Generating);
        let answer = self.generator.generate(&prompt).await?;

        Ok(Answer {
            answer,
            sources: retrieved.sources(),
            prompt_version: prompt.version(),
        })
    }
}

fn enter(progress: &mut QueryProgress, stage: QueryStage) {
    if let Err(e) = progress.advance(stage) {
        tracing::warn!(error = %e, "Ignored invalid query stage transition");
    }
}
