//! # Herald
//!
//! An async command matching engine for chat bots.
//!
//! ## Overview
//!
//! Herald turns raw chat lines into structured command invocations. A host
//! application registers commands — triggers, signature overloads, filters —
//! in a [`CommandRegistry`], then feeds it incoming lines; the registry
//! answers with the first fully matching command and its typed argument
//! values, or with the closest failed attempt.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐    ┌─────────────────┐    ┌───────────┐    ┌────────────┐
//! │ raw input │───▶│ prefix + trigger│───▶│ tokenizer │───▶│   binder   │──▶ CommandMatch
//! │  "!ban …" │    │    matching     │    │ (quoting) │    │ (overloads,│
//! └───────────┘    └─────────────────┘    └───────────┘    │  options,  │
//!                                                          │ converters)│
//!                                                          └────────────┘
//! ```
//!
//! - **Triggers**: literal names (case-insensitive, boundary-checked) or
//!   regexes, optionally behind a registry-wide or per-command prefix
//! - **Signatures**: a compact grammar — `<user> [days:number=7] -silent|s` —
//!   parsed once into a [`SignatureMap`] at registration time
//! - **Filters**: async pre/post predicates delegating permissions and
//!   cooldowns to the host
//! - **Converters**: async [`TypeConverter`]s turning raw text into typed
//!   [`serde_json::Value`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use herald::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let types = TypeTable::with_defaults();
//! let mut registry = CommandRegistry::with_config(RegistryConfig {
//!     prefix: Some("!".into()),
//!     ..RegistryConfig::default()
//! })
//! .unwrap();
//!
//! registry
//!     .add(
//!         "ban",
//!         parse_signature("<user> [days:number=7] -silent|s", &types, "string").unwrap(),
//!         CommandConfig::default(),
//!     )
//!     .unwrap();
//!
//! let ctx = MatchContext::new();
//! let matched = registry
//!     .find_matching_command("!ban bob -silent", &ctx)
//!     .await
//!     .into_match()
//!     .unwrap();
//! assert_eq!(matched.value("user"), Some(&serde_json::json!("bob")));
//! assert_eq!(matched.value("silent"), Some(&serde_json::json!(true)));
//! # }
//! ```

pub mod context;
pub mod convert;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod registry;
pub mod signature;
pub mod token;

pub use context::MatchContext;
pub use convert::{TypeConverter, TypeTable, converter_fn};
pub use error::{ConfigError, ConfigResult, ConvertError, MatchError, MatchErrorKind};
pub use filter::{Filter, filter_fn};
pub use matcher::{BoundValue, CommandMatch, MatchOutcome};
pub use registry::{
    CommandConfig, CommandDefinition, CommandRegistry, PrefixOverride, RegistryConfig, Signatures,
    Trigger, Triggers,
};
pub use signature::{OptionSpec, ParameterSpec, SignatureEntry, SignatureMap, parse_signature};
pub use token::{Token, tokenize};

/// Prelude module for convenient imports.
///
/// ```rust
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::MatchContext;
    pub use crate::convert::{TypeConverter, TypeTable, converter_fn};
    pub use crate::error::{ConfigError, ConvertError, MatchError, MatchErrorKind};
    pub use crate::filter::{Filter, filter_fn};
    pub use crate::matcher::{CommandMatch, MatchOutcome};
    pub use crate::registry::{
        CommandConfig, CommandRegistry, PrefixOverride, RegistryConfig, Trigger,
    };
    pub use crate::signature::{SignatureMap, parse_signature};
    pub use crate::token::tokenize;
}
