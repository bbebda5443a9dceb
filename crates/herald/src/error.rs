//! Unified error types for the herald matching engine.
//!
//! Errors come in two disjoint tiers:
//!
//! - [`ConfigError`] — programmer mistakes detected synchronously while
//!   registering a command or parsing a signature grammar string. These are
//!   returned as `Err` and must never be silently absorbed.
//! - [`MatchError`] — soft, input-driven failures produced while matching a
//!   line against a registered command. These are *data*, carried inside
//!   [`MatchOutcome`](crate::matcher::MatchOutcome); a match error for one
//!   command never aborts the search across the rest of the registry.
//!
//! Panics inside host-supplied filters or converters are deliberately not
//! caught: those are host-application bugs, not input conditions.

use std::sync::Arc;

use thiserror::Error;

use crate::registry::CommandDefinition;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while building a [`SignatureMap`](crate::signature::SignatureMap)
/// or registering a command.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A signature grammar string referenced a type name that is not in the
    /// type table.
    #[error("unknown type '{name}' in signature")]
    UnknownType {
        /// The unresolved type name.
        name: String,
    },

    /// The fallback type name passed to `parse_signature` is not registered.
    #[error("default type '{name}' is not registered in the type table")]
    UnknownDefaultType {
        /// The missing default type name.
        name: String,
    },

    /// Two entries in one signature share a name.
    #[error("duplicate name '{name}' in signature")]
    DuplicateName {
        /// The repeated parameter/option name.
        name: String,
    },

    /// A `<` or `[` parameter was never closed before the grammar string ended.
    #[error("unterminated parameter '{name}' in signature")]
    UnterminatedParameter {
        /// The partial name collected before end of input.
        name: String,
    },

    /// A signature declared an empty parameter or option name.
    #[error("empty name in signature")]
    EmptyName,

    /// An option shortcut was not exactly one character.
    #[error("invalid shortcut '{shortcut}' for option '{name}': must be a single character")]
    InvalidShortcut {
        /// The owning option name.
        name: String,
        /// The offending shortcut text.
        shortcut: String,
    },

    /// An optional parameter was followed by further positional parameters.
    #[error("optional parameter '{name}' must be the last positional parameter")]
    OptionalNotLast {
        /// The misplaced optional parameter.
        name: String,
    },

    /// More than one parameter in a signature was marked rest or catch-all.
    #[error("signature declares more than one rest/catch-all parameter ('{name}')")]
    MultipleTails {
        /// The second rest/catch-all parameter encountered.
        name: String,
    },

    /// A rest or catch-all parameter was followed by further parameters.
    #[error("rest/catch-all parameter '{name}' must be the last parameter")]
    TailNotLast {
        /// The misplaced rest/catch-all parameter.
        name: String,
    },

    /// A command was registered without any trigger.
    #[error("command requires at least one trigger")]
    NoTrigger,

    /// A trigger or prefix regex failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for configuration-time operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Conversion Errors
// =============================================================================

/// The designated soft failure a [`TypeConverter`](crate::convert::TypeConverter)
/// reports when a raw value does not parse.
///
/// The binder turns this into [`MatchErrorKind::Conversion`] naming the
/// offending field. Any *panic* inside a converter is not recovered.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConvertError {
    /// Human-readable description of why the value was rejected.
    pub message: String,
}

impl ConvertError {
    /// Creates a conversion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Match Errors
// =============================================================================

/// The reason a signature overload rejected the token stream.
#[derive(Debug, Clone, Error)]
pub enum MatchErrorKind {
    /// A token used option syntax with a name the signature does not declare.
    #[error("unknown option '{name}'")]
    UnknownOption {
        /// The unresolved option name or shortcut.
        name: String,
    },

    /// A switch option was given an inline `=value`.
    #[error("option '{name}' is a switch and does not take a value")]
    SwitchWithValue {
        /// The switch option name.
        name: String,
    },

    /// A valued option appeared as the final token with no value following.
    #[error("missing value for option '{name}'")]
    MissingOptionValue {
        /// The valued option name.
        name: String,
    },

    /// More positional tokens arrived than the signature declares, with no
    /// rest/catch-all parameter left to absorb them.
    #[error("too many arguments")]
    TooManyArguments,

    /// A required parameter received no token and has no default.
    #[error("missing required argument '{name}'")]
    MissingArgument {
        /// The unbound parameter name.
        name: String,
    },

    /// A type converter rejected a bound raw value.
    #[error("invalid value for '{name}': {message}")]
    Conversion {
        /// The parameter/option whose value failed to convert.
        name: String,
        /// The converter's reported message.
        message: String,
    },
}

/// A soft match failure, returned as data from the matcher.
///
/// Carries the definition whose binding attempt produced it, when one is
/// known — the matcher retains the *last* erroring attempt across the whole
/// registry as the "closest failed attempt".
#[derive(Debug, Clone)]
pub struct MatchError {
    /// Why the binding attempt failed.
    pub kind: MatchErrorKind,
    /// The definition that produced the error, if the error is attributable.
    pub definition: Option<Arc<CommandDefinition>>,
}

impl MatchError {
    /// Creates a match error not yet attributed to a definition.
    pub fn new(kind: MatchErrorKind) -> Self {
        Self {
            kind,
            definition: None,
        }
    }

    /// Attributes this error to the given definition.
    pub fn with_definition(mut self, definition: Arc<CommandDefinition>) -> Self {
        self.definition = Some(definition);
        self
    }

    /// The human-readable failure message.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
