//! Command registry: triggers, prefixes and registered definitions.
//!
//! A [`CommandRegistry`] holds an ordered list of immutable
//! [`CommandDefinition`]s. Each definition owns its compiled trigger and
//! prefix matchers, its signature overloads and its pre/post filters;
//! after [`add`](CommandRegistry::add) returns, the definition never
//! changes. Definitions are shared as `Arc`s, so snapshots taken with
//! [`get_all`](CommandRegistry::get_all) are unaffected by later removals.
//!
//! The registry is plain data behind `&mut self` mutation: it performs no
//! internal locking. Mutating it while a match is in flight on another task
//! is a caller obligation to prevent (wrap it in your own lock).
//!
//! # Example
//!
//! ```rust
//! use herald::{CommandConfig, CommandRegistry, parse_signature, TypeTable};
//!
//! let types = TypeTable::with_defaults();
//! let mut registry = CommandRegistry::new();
//! let ban = registry
//!     .add(
//!         "ban",
//!         parse_signature("<user> [days:number=7] -silent|s", &types, "string").unwrap(),
//!         CommandConfig::default(),
//!     )
//!     .unwrap();
//! assert_eq!(registry.get(ban.id()).map(|d| d.id()), Some(ban.id()));
//! ```

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::filter::Filter;
use crate::signature::SignatureMap;

// =============================================================================
// Triggers
// =============================================================================

/// A command name (or prefix) pattern supplied at registration time.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A literal name, matched case-insensitively.
    Literal(String),
    /// A caller-supplied regex, anchored to the start of the scanned text.
    Pattern(Regex),
}

impl From<&str> for Trigger {
    fn from(value: &str) -> Self {
        Trigger::Literal(value.to_owned())
    }
}

impl From<String> for Trigger {
    fn from(value: String) -> Self {
        Trigger::Literal(value)
    }
}

impl From<Regex> for Trigger {
    fn from(value: Regex) -> Self {
        Trigger::Pattern(value)
    }
}

impl Trigger {
    /// Compiles the trigger into an anchored matcher.
    ///
    /// Literal triggers additionally require the match to be followed by
    /// whitespace or end of input when `boundary` is set, which keeps a
    /// trigger `s` from matching inside `suspend`.
    fn compile(&self, boundary: bool) -> ConfigResult<TriggerMatcher> {
        let (regex, boundary) = match self {
            Trigger::Literal(literal) => (
                Regex::new(&format!("(?i)^{}", regex::escape(literal)))?,
                boundary,
            ),
            Trigger::Pattern(pattern) => {
                (Regex::new(&format!("^(?:{})", pattern.as_str()))?, false)
            }
        };
        Ok(TriggerMatcher { regex, boundary })
    }
}

/// A compiled, anchored trigger or prefix matcher.
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    regex: Regex,
    boundary: bool,
}

impl TriggerMatcher {
    /// Matches at the start of `text`, returning the consumed byte length.
    pub(crate) fn match_at_start(&self, text: &str) -> Option<usize> {
        let found = self.regex.find(text)?;
        if found.start() != 0 {
            return None;
        }
        if self.boundary {
            let next = text[found.end()..].chars().next();
            if next.is_some_and(|c| !c.is_whitespace()) {
                return None;
            }
        }
        Some(found.end())
    }
}

/// One or more triggers, converted from strings, regexes or vectors thereof.
#[derive(Debug, Clone, Default)]
pub struct Triggers(pub Vec<Trigger>);

impl From<Trigger> for Triggers {
    fn from(value: Trigger) -> Self {
        Triggers(vec![value])
    }
}

impl From<&str> for Triggers {
    fn from(value: &str) -> Self {
        Triggers(vec![value.into()])
    }
}

impl From<String> for Triggers {
    fn from(value: String) -> Self {
        Triggers(vec![value.into()])
    }
}

impl From<Regex> for Triggers {
    fn from(value: Regex) -> Self {
        Triggers(vec![value.into()])
    }
}

impl From<Vec<Trigger>> for Triggers {
    fn from(value: Vec<Trigger>) -> Self {
        Triggers(value)
    }
}

impl From<Vec<&str>> for Triggers {
    fn from(value: Vec<&str>) -> Self {
        Triggers(value.into_iter().map(Into::into).collect())
    }
}

/// One or more signature overloads.
#[derive(Debug, Clone, Default)]
pub struct Signatures(pub Vec<SignatureMap>);

impl From<SignatureMap> for Signatures {
    fn from(value: SignatureMap) -> Self {
        Signatures(vec![value])
    }
}

impl From<Vec<SignatureMap>> for Signatures {
    fn from(value: Vec<SignatureMap>) -> Self {
        Signatures(value)
    }
}

impl From<()> for Signatures {
    fn from((): ()) -> Self {
        Signatures(Vec::new())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Per-command prefix behaviour relative to the registry default.
#[derive(Debug, Clone, Default)]
pub enum PrefixOverride {
    /// Use the registry-wide default prefix.
    #[default]
    Inherit,
    /// Match with no prefix at all.
    Disabled,
    /// Use this prefix instead of the registry default.
    Custom(Trigger),
}

/// Registry-wide settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Default prefix applied to every command that does not override it.
    pub prefix: Option<Trigger>,
    /// Option prefixes recognised by the binder, e.g. `-` and `--`.
    pub option_prefixes: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            option_prefixes: vec!["--".into(), "-".into()],
        }
    }
}

/// Per-command settings passed to [`CommandRegistry::add`].
#[derive(Clone, Default)]
pub struct CommandConfig {
    /// Prefix behaviour for this command.
    pub prefix: PrefixOverride,
    /// Predicates run before any matching work; the first `false` skips the
    /// definition silently.
    pub pre_filters: Vec<Arc<dyn Filter>>,
    /// Predicates run after a successful bind; the first `false` discards
    /// the match and the search continues.
    pub post_filters: Vec<Arc<dyn Filter>>,
}

impl CommandConfig {
    /// Creates a config with no filters that inherits the registry prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix behaviour.
    pub fn prefix(mut self, prefix: PrefixOverride) -> Self {
        self.prefix = prefix;
        self
    }

    /// Appends a pre filter.
    pub fn pre_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.pre_filters.push(filter);
        self
    }

    /// Appends a post filter.
    pub fn post_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.post_filters.push(filter);
        self
    }
}

impl std::fmt::Debug for CommandConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandConfig")
            .field("prefix", &self.prefix)
            .field("pre_filters", &self.pre_filters.len())
            .field("post_filters", &self.post_filters.len())
            .finish()
    }
}

// =============================================================================
// CommandDefinition
// =============================================================================

/// One registered command: compiled matchers, overloads and filters.
///
/// Owned by the registry, shared by `Arc`, never mutated after creation.
pub struct CommandDefinition {
    id: u64,
    triggers: Vec<TriggerMatcher>,
    prefix: Option<TriggerMatcher>,
    signatures: Vec<SignatureMap>,
    pre_filters: Vec<Arc<dyn Filter>>,
    post_filters: Vec<Arc<dyn Filter>>,
}

impl CommandDefinition {
    /// The registration-assigned, strictly increasing id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The signature overloads, in declaration order.
    pub fn signatures(&self) -> &[SignatureMap] {
        &self.signatures
    }

    pub(crate) fn triggers(&self) -> &[TriggerMatcher] {
        &self.triggers
    }

    pub(crate) fn prefix(&self) -> Option<&TriggerMatcher> {
        self.prefix.as_ref()
    }

    pub(crate) fn pre_filters(&self) -> &[Arc<dyn Filter>] {
        &self.pre_filters
    }

    pub(crate) fn post_filters(&self) -> &[Arc<dyn Filter>] {
        &self.post_filters
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("id", &self.id)
            .field("triggers", &self.triggers.len())
            .field("signatures", &self.signatures.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CommandRegistry
// =============================================================================

/// Ordered, append-friendly collection of command definitions.
pub struct CommandRegistry {
    definitions: Vec<Arc<CommandDefinition>>,
    default_prefix: Option<TriggerMatcher>,
    option_prefixes: Vec<String>,
    next_id: u64,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a registry with the default configuration (no command prefix,
    /// option prefixes `--` and `-`).
    pub fn new() -> Self {
        // The default config cannot produce an invalid pattern.
        match Self::with_config(RegistryConfig::default()) {
            Ok(registry) => registry,
            Err(_) => unreachable!("default registry config is always valid"),
        }
    }

    /// Creates a registry from the given configuration.
    ///
    /// Option prefixes are sorted longest-first so that `--` wins over `-`
    /// when both could match a token.
    pub fn with_config(config: RegistryConfig) -> ConfigResult<Self> {
        let default_prefix = match &config.prefix {
            Some(trigger) => Some(trigger.compile(false)?),
            None => None,
        };
        let mut option_prefixes = config.option_prefixes;
        option_prefixes.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        Ok(Self {
            definitions: Vec::new(),
            default_prefix,
            option_prefixes,
            next_id: 0,
        })
    }

    pub(crate) fn option_prefixes(&self) -> &[String] {
        &self.option_prefixes
    }

    pub(crate) fn definitions(&self) -> &[Arc<CommandDefinition>] {
        &self.definitions
    }

    /// Registers a command and returns its definition.
    ///
    /// Fails with a [`ConfigError`] when no trigger is given, a pattern does
    /// not compile, or a signature violates the positional ordering
    /// invariants — these are programming errors surfaced at registration
    /// time, never at match time.
    pub fn add(
        &mut self,
        triggers: impl Into<Triggers>,
        signatures: impl Into<Signatures>,
        config: CommandConfig,
    ) -> ConfigResult<Arc<CommandDefinition>> {
        let triggers = triggers.into().0;
        if triggers.is_empty() {
            return Err(ConfigError::NoTrigger);
        }
        let triggers = triggers
            .iter()
            .map(|trigger| trigger.compile(true))
            .collect::<ConfigResult<Vec<_>>>()?;

        // Normalize to one-or-more overloads: a command registered without
        // signatures accepts exactly zero arguments.
        let mut signatures = signatures.into().0;
        if signatures.is_empty() {
            signatures.push(SignatureMap::new());
        }
        for signature in &signatures {
            signature.validate()?;
        }

        let prefix = match config.prefix {
            PrefixOverride::Inherit => self.default_prefix.clone(),
            PrefixOverride::Disabled => None,
            PrefixOverride::Custom(trigger) => Some(trigger.compile(false)?),
        };

        let id = self.next_id;
        self.next_id += 1;

        let definition = Arc::new(CommandDefinition {
            id,
            triggers,
            prefix,
            signatures,
            pre_filters: config.pre_filters,
            post_filters: config.post_filters,
        });
        self.definitions.push(Arc::clone(&definition));

        debug!(
            command_id = id,
            signatures = definition.signatures.len(),
            "Registered command definition"
        );

        Ok(definition)
    }

    /// Removes a definition by identity. Returns `true` if it was present.
    pub fn remove(&mut self, definition: &Arc<CommandDefinition>) -> bool {
        let before = self.definitions.len();
        self.definitions
            .retain(|existing| !Arc::ptr_eq(existing, definition));
        let removed = self.definitions.len() != before;
        if removed {
            debug!(command_id = definition.id, "Removed command definition");
        }
        removed
    }

    /// Removes a definition by id. Returns `true` if it was present.
    pub fn remove_by_id(&mut self, id: u64) -> bool {
        let before = self.definitions.len();
        self.definitions.retain(|existing| existing.id != id);
        let removed = self.definitions.len() != before;
        if removed {
            debug!(command_id = id, "Removed command definition");
        }
        removed
    }

    /// Looks up a definition by id.
    pub fn get(&self, id: u64) -> Option<Arc<CommandDefinition>> {
        self.definitions
            .iter()
            .find(|definition| definition.id == id)
            .cloned()
    }

    /// Returns a snapshot of all definitions in registration order.
    ///
    /// The snapshot is decoupled from the registry: removals after this call
    /// do not affect it.
    pub fn get_all(&self) -> Vec<Arc<CommandDefinition>> {
        self.definitions.clone()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("definitions", &self.definitions.len())
            .field("option_prefixes", &self.option_prefixes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TypeTable;
    use crate::signature::parse_signature;

    fn sig(text: &str) -> SignatureMap {
        parse_signature(text, &TypeTable::with_defaults(), "string").unwrap()
    }

    #[test]
    fn test_literal_trigger_boundary() {
        let matcher = Trigger::from("s").compile(true).unwrap();
        assert_eq!(matcher.match_at_start("s foo"), Some(1));
        assert_eq!(matcher.match_at_start("s"), Some(1));
        assert_eq!(matcher.match_at_start("suspend"), None);
    }

    #[test]
    fn test_literal_trigger_case_insensitive() {
        let matcher = Trigger::from("Ban").compile(true).unwrap();
        assert_eq!(matcher.match_at_start("bAN user"), Some(3));
    }

    #[test]
    fn test_literal_trigger_is_escaped() {
        let matcher = Trigger::from("a.b").compile(true).unwrap();
        assert_eq!(matcher.match_at_start("a.b"), Some(3));
        assert_eq!(matcher.match_at_start("axb"), None);
    }

    #[test]
    fn test_regex_trigger_anchored() {
        let matcher = Trigger::from(Regex::new(r"ro+ll").unwrap())
            .compile(true)
            .unwrap();
        assert_eq!(matcher.match_at_start("rooolld6"), Some(6));
        assert_eq!(matcher.match_at_start("a roll"), None);
    }

    #[test]
    fn test_add_assigns_monotonic_ids() {
        let mut registry = CommandRegistry::new();
        let a = registry.add("a", (), CommandConfig::default()).unwrap();
        let b = registry.add("b", (), CommandConfig::default()).unwrap();
        registry.remove(&a);
        let c = registry.add("c", (), CommandConfig::default()).unwrap();
        assert!(b.id() > a.id());
        assert!(c.id() > b.id());
    }

    #[test]
    fn test_add_requires_trigger() {
        let mut registry = CommandRegistry::new();
        let result = registry.add(Vec::<Trigger>::new(), (), CommandConfig::default());
        assert!(matches!(result, Err(ConfigError::NoTrigger)));
    }

    #[test]
    fn test_add_validates_signatures() {
        let mut registry = CommandRegistry::new();
        assert!(matches!(
            registry.add("x", sig("<a...> <b...>"), CommandConfig::default()),
            Err(ConfigError::MultipleTails { .. })
        ));
        assert!(matches!(
            registry.add("x", sig("<a$> <b$>"), CommandConfig::default()),
            Err(ConfigError::MultipleTails { .. })
        ));
        assert!(matches!(
            registry.add("x", sig("[a] <b>"), CommandConfig::default()),
            Err(ConfigError::OptionalNotLast { .. })
        ));
    }

    #[test]
    fn test_remove_by_identity_and_id() {
        let mut registry = CommandRegistry::new();
        let a = registry.add("a", (), CommandConfig::default()).unwrap();
        let b = registry.add("b", (), CommandConfig::default()).unwrap();

        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert!(registry.remove_by_id(b.id()));
        assert!(!registry.remove_by_id(b.id()));
        assert!(registry.get_all().is_empty());
    }

    #[test]
    fn test_get_all_snapshot_survives_removal() {
        let mut registry = CommandRegistry::new();
        let a = registry.add("a", (), CommandConfig::default()).unwrap();
        let snapshot = registry.get_all();
        registry.remove(&a);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.get(a.id()).is_none());
    }

    #[test]
    fn test_option_prefixes_sorted_longest_first() {
        let registry = CommandRegistry::with_config(RegistryConfig {
            prefix: None,
            option_prefixes: vec!["-".into(), "----".into(), "--".into()],
        })
        .unwrap();
        assert_eq!(registry.option_prefixes(), ["----", "--", "-"]);
    }

    #[test]
    fn test_prefix_override_resolution() {
        let mut registry = CommandRegistry::with_config(RegistryConfig {
            prefix: Some("!".into()),
            option_prefixes: vec!["-".into()],
        })
        .unwrap();

        let inherited = registry.add("a", (), CommandConfig::default()).unwrap();
        let disabled = registry
            .add(
                "b",
                (),
                CommandConfig::default().prefix(PrefixOverride::Disabled),
            )
            .unwrap();
        let custom = registry
            .add(
                "c",
                (),
                CommandConfig::default().prefix(PrefixOverride::Custom("?".into())),
            )
            .unwrap();

        assert!(inherited.prefix().is_some());
        assert!(disabled.prefix().is_none());
        assert_eq!(
            custom.prefix().and_then(|p| p.match_at_start("?c")),
            Some(1)
        );
    }
}
