//! Email templates for Letterbox.
//!
//! A [`TemplateRegistry`] maps template keys to a [`Generator`] and the
//! [`TemplateMeta`] describing its inputs. The [`TemplateResolver`] invokes
//! generators through a single awaitable shape, whether they format in memory
//! or read files, and frames their output in a shared [`Envelope`].
//!
//! ```no_run
//! use letterbox_templates::{BuiltinConfig, Envelope, Resolution, TemplateRegistry, TemplateResolver};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> letterbox_templates::TemplateResult<()> {
//! let registry = TemplateRegistry::with_builtins(&BuiltinConfig::default())?;
//! let resolver = TemplateResolver::new(Arc::new(registry), Envelope::new("Letterbox")?);
//!
//! if let Resolution::Content(content) = resolver
//!     .resolve("motivational_quote", &json!({"recipient_name": "Ada"}))
//!     .await?
//! {
//!     println!("{}", content.subject);
//! }
//! # Ok(())
//! # }
//! ```

mod builtin;
mod data;
mod envelope;
mod error;
mod file_report;
mod generator;
mod metadata;
mod registry;
mod resolver;

pub use builtin::BuiltinConfig;
pub use data::TemplateData;
pub use envelope::Envelope;
pub use error::{TemplateError, TemplateResult};
pub use generator::{Generated, Generator};
pub use metadata::{FieldKind, FieldSpec, TemplateMeta};
pub use registry::{TemplateEntry, TemplateRegistry};
pub use resolver::{Resolution, TemplateResolver};
