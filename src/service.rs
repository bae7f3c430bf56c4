//! The text-completion capability the chat core depends on.

use std::sync::Arc;

use crate::error::Result;

/// A backend that turns one prompt into one reply.
///
/// Model, sampling parameters and credentials belong to the implementation
/// and are fixed when it is constructed.  Implementations own their retry
/// and rate-limit behavior; callers of [`AiService::generate`] see whatever
/// error the backend settles on.
#[async_trait::async_trait]
pub trait AiService: Send + Sync {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl<T: AiService + ?Sized> AiService for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

#[async_trait::async_trait]
impl<T: AiService + ?Sized> AiService for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

#[async_trait::async_trait]
impl<T: AiService + ?Sized> AiService for &T {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    #[async_trait::async_trait]
    impl AiService for Shout {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_uppercase())
        }
    }

    async fn by_value<S: AiService>(service: S) -> String {
        service.generate("ok").await.unwrap()
    }

    #[tokio::test]
    async fn wrappers_delegate() {
        let boxed: Box<dyn AiService> = Box::new(Shout);
        assert_eq!(boxed.generate("hi").await.unwrap(), "HI");

        let shared: Arc<dyn AiService> = Arc::new(Shout);
        assert_eq!(shared.generate("yo").await.unwrap(), "YO");

        assert_eq!(by_value(&Shout).await, "OK");
    }
}
