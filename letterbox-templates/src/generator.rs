//! Content generators.

use crate::error::TemplateResult;
use futures::future::{self, BoxFuture, FutureExt};
use letterbox_mail::EmailContent;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// What a generator produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// Raw content, before the shared envelope is applied.
    Content(EmailContent),
    /// Nothing should be sent for this firing.
    Abort,
}

type SyncFn = dyn Fn(&Value) -> TemplateResult<Generated> + Send + Sync;
type AsyncFn = dyn Fn(Value) -> BoxFuture<'static, TemplateResult<Generated>> + Send + Sync;

/// A registered generator, synchronous or asynchronous.
#[derive(Clone)]
pub enum Generator {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Generator {
    /// Wrap a function that formats in memory.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value) -> TemplateResult<Generated> + Send + Sync + 'static,
    {
        Generator::Sync(Arc::new(f))
    }

    /// Wrap a function that awaits I/O.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TemplateResult<Generated>> + Send + 'static,
    {
        Generator::Async(Arc::new(move |data: Value| f(data).boxed()))
    }

    /// Run the generator. Both kinds are awaited the same way.
    pub fn invoke(&self, data: Value) -> BoxFuture<'static, TemplateResult<Generated>> {
        match self {
            Generator::Sync(f) => future::ready(f(&data)).boxed(),
            Generator::Async(f) => f(data),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Generator::Async(_))
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Generator::Sync(_) => "Generator::Sync",
            Generator::Async(_) => "Generator::Async",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_both_kinds_share_one_shape() {
        let sync = Generator::sync(|data| {
            Ok(Generated::Content(EmailContent::new(
                "S",
                format!("<p>{}</p>", data["name"].as_str().unwrap_or("")),
            )))
        });
        let async_gen = Generator::future(|data: Value| async move {
            tokio::task::yield_now().await;
            Ok(Generated::Content(EmailContent::new(
                "A",
                format!("<p>{}</p>", data["name"].as_str().unwrap_or("")),
            )))
        });

        for generator in [sync, async_gen] {
            let generated = generator.invoke(json!({"name": "Ada"})).await.unwrap();
            match generated {
                Generated::Content(content) => assert_eq!(content.html, "<p>Ada</p>"),
                Generated::Abort => panic!("unexpected abort"),
            }
        }
    }
}
