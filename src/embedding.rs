//! Embedding contract. The embedding model itself is an external
//! collaborator — this module only defines the trait the Processor and
//! Retriever depend on, the seam through which swappable providers plug in.

use crate::error::Result;
use crate::fragment::Vector;
use async_trait::async_trait;

/// Produces dense embeddings for text. Implementations own the concrete
/// model/provider; the crate ships no built-in implementation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Embed a batch of texts. Default implementation embeds sequentially;
    /// providers with native batch APIs should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vector> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn default_batch_impl_delegates_to_embed() {
        let embedder = StubEmbedder;
        let out = embedder
            .embed_batch(&["a".into(), "bb".into()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 1.0], vec![2.0, 1.0]]);
    }
}
