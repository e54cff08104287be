//! Answer generation contract and orchestration: a pluggable text generation
//! model, a prompt builder, and a thin `Generator` that validates responses
//! and exposes both single-shot and streaming answers.

use crate::config::GenerationConfig;
use crate::error::{GenerationError, KbError, Result};
use crate::fragment::RetrievalResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A prompt assembled from a query and its retrieved context fragments.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub query: String,
    pub context: Vec<RetrievalResult>,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Text generation model contract. No concrete provider ships with the
/// crate — embedding and generation models are external collaborators.
#[async_trait]
pub trait TextGenerationModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Streaming variant; default falls back to a single-chunk stream built
    /// from the non-streaming response.
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<BoxStream<'static, Result<String>>> {
        let text = self.generate(request).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }
}

/// Assembles a numbered-context prompt from retrieved fragments. Exposed so
/// `TextGenerationModel` implementors can build a prompt consistently rather
/// than reinventing context formatting per provider.
pub fn build_prompt(query: &str, context: &[RetrievalResult]) -> String {
    let mut prompt = String::new();
    for (i, result) in context.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n", i + 1, result.text()));
    }
    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt
}

pub struct Generator {
    model: std::sync::Arc<dyn TextGenerationModel>,
    config: GenerationConfig,
}

impl Generator {
    pub fn new(model: std::sync::Arc<dyn TextGenerationModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub async fn answer(&self, query: &str, context: Vec<RetrievalResult>) -> Result<String> {
        let request = GenerationRequest {
            query: query.to_string(),
            context,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let text = self.model.generate(&request).await?;
        if text.trim().is_empty() {
            return Err(KbError::Generation(GenerationError::EmptyResponse));
        }
        Ok(text)
    }

    pub async fn answer_stream(
        &self,
        query: &str,
        context: Vec<RetrievalResult>,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let request = GenerationRequest {
            query: query.to_string(),
            context,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        self.model.generate_stream(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use futures::StreamExt;

    struct EchoModel;

    #[async_trait]
    impl TextGenerationModel for EchoModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            Ok(format!("answer to: {}", request.query))
        }
    }

    struct EmptyModel;

    #[async_trait]
    impl TextGenerationModel for EmptyModel {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(String::new())
        }
    }

    fn context() -> Vec<RetrievalResult> {
        vec![RetrievalResult {
            fragment: Fragment::new("d1_chunk_0", "d1", "relevant text"),
            score: 0.9,
            rank: 0,
        }]
    }

    #[test]
    fn build_prompt_includes_numbered_context() {
        let prompt = build_prompt("what?", &context());
        assert!(prompt.contains("[1] relevant text"));
        assert!(prompt.ends_with("Question: what?"));
    }

    #[tokio::test]
    async fn answer_delegates_to_model() {
        let generator = Generator::new(std::sync::Arc::new(EchoModel), GenerationConfig::default());
        let answer = generator.answer("what?", context()).await.unwrap();
        assert_eq!(answer, "answer to: what?");
    }

    #[tokio::test]
    async fn empty_response_is_an_error() {
        let generator = Generator::new(std::sync::Arc::new(EmptyModel), GenerationConfig::default());
        let err = generator.answer("what?", context()).await.unwrap_err();
        assert!(matches!(err, KbError::Generation(GenerationError::EmptyResponse)));
    }

    #[tokio::test]
    async fn default_stream_impl_yields_one_chunk() {
        let generator = Generator::new(std::sync::Arc::new(EchoModel), GenerationConfig::default());
        let mut stream = generator.answer_stream("what?", context()).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, "answer to: what?");
        assert!(stream.next().await.is_none());
    }
}
