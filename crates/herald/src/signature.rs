//! Signature model and the compact signature grammar parser.
//!
//! A [`SignatureMap`] is one concrete argument shape a command accepts: an
//! ordered set of named positional parameters and flag-style options. A
//! command may declare several maps as overloads, tried in order.
//!
//! Maps can be built programmatically from [`ParameterSpec`]/[`OptionSpec`]
//! values, or parsed from the textual grammar via [`parse_signature`]:
//!
//! ```text
//! <user> [reason:string="no reason"] -silent|s -days:number=0
//! ```
//!
//! - `<name>` — required parameter, `[name]` — optional parameter
//! - `:type` — converter name from the [`TypeTable`] (default `string`)
//! - `=literal` — default value, kept as a raw pre-conversion string
//! - trailing `...` — rest parameter (collects remaining tokens)
//! - trailing `$` — catch-all parameter (captures the raw remaining text)
//! - `-name` — option; `|x` attaches a one-character shortcut; an option is
//!   a switch unless `:type` gives it a value
//! - quoted spans (`'…'`/`"…"`) are literal, so defaults may contain spaces

use std::sync::Arc;

use crate::convert::{TypeConverter, TypeTable};
use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Specs
// =============================================================================

/// A positional parameter declaration.
#[derive(Clone)]
pub struct ParameterSpec {
    /// Converter applied to the bound raw value.
    pub converter: Arc<dyn TypeConverter>,
    /// Whether a missing value (with no default) is a match error.
    pub required: bool,
    /// Raw default value, bound without conversion when no token arrives.
    pub default: Option<String>,
    /// Collects all remaining tokens into an array.
    pub rest: bool,
    /// Captures the raw remaining input text verbatim.
    pub catch_all: bool,
}

impl ParameterSpec {
    /// Creates a required parameter with the given converter.
    pub fn new(converter: Arc<dyn TypeConverter>) -> Self {
        Self {
            converter,
            required: true,
            default: None,
            rest: false,
            catch_all: false,
        }
    }

    /// Marks the parameter optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets a raw default value.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the parameter as a rest parameter.
    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }

    /// Marks the parameter as a catch-all parameter.
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }
}

impl std::fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("required", &self.required)
            .field("default", &self.default)
            .field("rest", &self.rest)
            .field("catch_all", &self.catch_all)
            .finish_non_exhaustive()
    }
}

/// A flag-style option declaration.
///
/// An option with no converter is a *switch*: its presence alone binds
/// `true`, and giving it an inline value is a match error.
#[derive(Clone)]
pub struct OptionSpec {
    /// Converter for the option's value; `None` makes it a switch.
    pub converter: Option<Arc<dyn TypeConverter>>,
    /// Optional one-character alias sharing the option's namespace.
    pub shortcut: Option<char>,
    /// Raw default value, bound without conversion when absent.
    pub default: Option<String>,
}

impl OptionSpec {
    /// Creates a switch option.
    pub fn switch() -> Self {
        Self {
            converter: None,
            shortcut: None,
            default: None,
        }
    }

    /// Creates a valued option with the given converter.
    pub fn valued(converter: Arc<dyn TypeConverter>) -> Self {
        Self {
            converter: Some(converter),
            shortcut: None,
            default: None,
        }
    }

    /// Attaches a one-character shortcut.
    pub fn shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Sets a raw default value.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns `true` if this option never carries a value.
    pub fn is_switch(&self) -> bool {
        self.converter.is_none()
    }
}

impl std::fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionSpec")
            .field("switch", &self.is_switch())
            .field("shortcut", &self.shortcut)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// One named entry in a signature: a positional parameter or an option.
#[derive(Debug, Clone)]
pub enum SignatureEntry {
    /// A positional parameter.
    Parameter(ParameterSpec),
    /// A flag-style option.
    Option(OptionSpec),
}

// =============================================================================
// SignatureMap
// =============================================================================

/// An ordered, name-unique collection of signature entries.
///
/// Built once at registration time and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct SignatureMap {
    entries: Vec<(String, SignatureEntry)>,
}

impl SignatureMap {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, rejecting duplicate names.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        entry: SignatureEntry,
    ) -> ConfigResult<&mut Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.get(&name).is_some() {
            return Err(ConfigError::DuplicateName { name });
        }
        self.entries.push((name, entry));
        Ok(self)
    }

    /// Appends a parameter entry.
    pub fn parameter(
        &mut self,
        name: impl Into<String>,
        spec: ParameterSpec,
    ) -> ConfigResult<&mut Self> {
        self.insert(name, SignatureEntry::Parameter(spec))
    }

    /// Appends an option entry.
    pub fn option(&mut self, name: impl Into<String>, spec: OptionSpec) -> ConfigResult<&mut Self> {
        self.insert(name, SignatureEntry::Option(spec))
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&SignatureEntry> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, entry)| entry)
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignatureEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the signature has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the positional ordering invariants:
    ///
    /// - at most one optional parameter, and nothing positional after it
    /// - at most one rest/catch-all parameter, and it is the last parameter
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen_optional: Option<&str> = None;
        let mut seen_tail: Option<&str> = None;

        for (name, entry) in self.iter() {
            let SignatureEntry::Parameter(param) = entry else {
                continue;
            };
            if let Some(tail) = seen_tail {
                if param.rest || param.catch_all {
                    return Err(ConfigError::MultipleTails { name: name.into() });
                }
                return Err(ConfigError::TailNotLast { name: tail.into() });
            }
            if let Some(optional) = seen_optional {
                return Err(ConfigError::OptionalNotLast {
                    name: optional.into(),
                });
            }
            if param.rest || param.catch_all {
                seen_tail = Some(name);
            }
            if !param.required {
                seen_optional = Some(name);
            }
        }

        Ok(())
    }
}

// =============================================================================
// Grammar Parser
// =============================================================================

/// Scanner state for the signature grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between entries, waiting for `<`, `[` or `-`.
    Idle,
    /// Collecting a parameter/option name.
    Name,
    /// Collecting a type name after `:`.
    Type,
    /// Collecting a default value after `=`.
    Value,
    /// Collecting an option shortcut after `|`.
    Shortcut,
}

/// What kind of entry the scanner is currently building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// `<name>` — closed by `>`.
    Required,
    /// `[name]` — closed by `]`.
    Optional,
    /// `-name` — closed by whitespace or end of input.
    Flag,
}

impl EntryKind {
    fn closer(self) -> Option<char> {
        match self {
            EntryKind::Required => Some('>'),
            EntryKind::Optional => Some(']'),
            EntryKind::Flag => None,
        }
    }
}

/// Accumulated fields for the entry being scanned.
struct PendingEntry {
    kind: EntryKind,
    name: String,
    type_name: String,
    default: String,
    has_default: bool,
    shortcut: String,
}

impl PendingEntry {
    fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            name: String::new(),
            type_name: String::new(),
            default: String::new(),
            has_default: false,
            shortcut: String::new(),
        }
    }

    /// Finalizes the pending entry and appends it to `map`.
    fn finish(
        mut self,
        map: &mut SignatureMap,
        types: &TypeTable,
        default_type: &str,
    ) -> ConfigResult<()> {
        let mut rest = false;
        let mut catch_all = false;
        if self.kind != EntryKind::Flag {
            if self.name.ends_with("...") {
                let stripped = self.name.len() - 3;
                self.name.truncate(stripped);
                rest = true;
            } else if self.name.ends_with('$') {
                let stripped = self.name.len() - 1;
                self.name.truncate(stripped);
                catch_all = true;
            }
        }
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let lookup = |name: &str| -> ConfigResult<Arc<dyn TypeConverter>> {
            types
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownType { name: name.into() })
        };

        let entry = match self.kind {
            EntryKind::Required | EntryKind::Optional => {
                let type_name = if self.type_name.is_empty() {
                    default_type
                } else {
                    &self.type_name
                };
                SignatureEntry::Parameter(ParameterSpec {
                    converter: lookup(type_name)?,
                    required: self.kind == EntryKind::Required,
                    default: self.has_default.then_some(self.default),
                    rest,
                    catch_all,
                })
            }
            EntryKind::Flag => {
                // No explicit type means the option is a switch.
                let converter = if self.type_name.is_empty() {
                    None
                } else {
                    Some(lookup(&self.type_name)?)
                };
                let shortcut = if self.shortcut.is_empty() {
                    None
                } else {
                    let mut chars = self.shortcut.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(c),
                        _ => {
                            return Err(ConfigError::InvalidShortcut {
                                name: self.name,
                                shortcut: self.shortcut,
                            });
                        }
                    }
                };
                SignatureEntry::Option(OptionSpec {
                    converter,
                    shortcut,
                    default: self.has_default.then_some(self.default),
                })
            }
        };

        map.insert(self.name, entry)?;
        Ok(())
    }
}

/// Parses the compact signature grammar into a [`SignatureMap`].
///
/// `default_type` names the converter used for parameters without an
/// explicit `:type`; it must exist in `types`.
///
/// ```rust
/// use herald::{parse_signature, TypeTable};
///
/// let types = TypeTable::with_defaults();
/// let sig = parse_signature("<user> [days:number=7] -silent|s", &types, "string").unwrap();
/// assert_eq!(sig.len(), 3);
/// ```
pub fn parse_signature(
    text: &str,
    types: &TypeTable,
    default_type: &str,
) -> ConfigResult<SignatureMap> {
    if !types.contains(default_type) {
        return Err(ConfigError::UnknownDefaultType {
            name: default_type.into(),
        });
    }

    let mut map = SignatureMap::new();
    let mut state = ScanState::Idle;
    let mut pending: Option<PendingEntry> = None;
    let mut in_quote: Option<char> = None;

    for ch in text.chars() {
        // Quoted spans are literal content for whichever buffer is active.
        if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            } else if let Some(entry) = pending.as_mut() {
                push_char(entry, state, ch);
            }
            continue;
        }
        if matches!(ch, '\'' | '"') && state != ScanState::Idle {
            in_quote = Some(ch);
            continue;
        }

        match state {
            ScanState::Idle => match ch {
                '<' => {
                    pending = Some(PendingEntry::new(EntryKind::Required));
                    state = ScanState::Name;
                }
                '[' => {
                    pending = Some(PendingEntry::new(EntryKind::Optional));
                    state = ScanState::Name;
                }
                '-' => {
                    pending = Some(PendingEntry::new(EntryKind::Flag));
                    state = ScanState::Name;
                }
                _ => {}
            },
            ScanState::Name | ScanState::Type | ScanState::Value | ScanState::Shortcut => {
                let entry = pending.as_mut().ok_or(ConfigError::EmptyName)?;
                let closes = match entry.kind.closer() {
                    Some(closer) => ch == closer,
                    None => ch.is_whitespace(),
                };
                if closes {
                    if let Some(entry) = pending.take() {
                        entry.finish(&mut map, types, default_type)?;
                    }
                    state = ScanState::Idle;
                } else if state != ScanState::Value && ch == ':' {
                    state = ScanState::Type;
                } else if state != ScanState::Value && ch == '=' {
                    entry.has_default = true;
                    state = ScanState::Value;
                } else if state == ScanState::Name
                    && entry.kind == EntryKind::Flag
                    && entry.name.is_empty()
                    && ch == '-'
                {
                    // Tolerate a doubled dash in option declarations.
                } else if state == ScanState::Name && entry.kind == EntryKind::Flag && ch == '|' {
                    state = ScanState::Shortcut;
                } else {
                    push_char(entry, state, ch);
                }
            }
        }
    }

    if let Some(entry) = pending.take() {
        if entry.kind.closer().is_some() {
            return Err(ConfigError::UnterminatedParameter { name: entry.name });
        }
        entry.finish(&mut map, types, default_type)?;
    }

    Ok(map)
}

fn push_char(entry: &mut PendingEntry, state: ScanState, ch: char) {
    match state {
        ScanState::Name => entry.name.push(ch),
        ScanState::Type => entry.type_name.push(ch),
        ScanState::Value => entry.default.push(ch),
        ScanState::Shortcut => entry.shortcut.push(ch),
        ScanState::Idle => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> TypeTable {
        TypeTable::with_defaults()
    }

    fn parse(text: &str) -> ConfigResult<SignatureMap> {
        parse_signature(text, &types(), "string")
    }

    fn param<'a>(map: &'a SignatureMap, name: &str) -> &'a ParameterSpec {
        match map.get(name) {
            Some(SignatureEntry::Parameter(p)) => p,
            other => panic!("expected parameter '{name}', got {other:?}"),
        }
    }

    fn option<'a>(map: &'a SignatureMap, name: &str) -> &'a OptionSpec {
        match map.get(name) {
            Some(SignatureEntry::Option(o)) => o,
            other => panic!("expected option '{name}', got {other:?}"),
        }
    }

    #[test]
    fn test_parse_required_and_typed() {
        let map = parse("<a> <b:number>").unwrap();
        assert_eq!(map.len(), 2);
        assert!(param(&map, "a").required);
        assert!(param(&map, "b").required);
    }

    #[test]
    fn test_parse_optional() {
        let map = parse("<a> [b]").unwrap();
        assert!(!param(&map, "b").required);
    }

    #[test]
    fn test_parse_default_value() {
        let map = parse("[count:number=5]").unwrap();
        let p = param(&map, "count");
        assert_eq!(p.default.as_deref(), Some("5"));
    }

    #[test]
    fn test_parse_quoted_default_with_spaces() {
        let map = parse(r#"[reason="no reason given"]"#).unwrap();
        assert_eq!(
            param(&map, "reason").default.as_deref(),
            Some("no reason given")
        );
    }

    #[test]
    fn test_parse_rest_marker() {
        let map = parse("<words...>").unwrap();
        let p = param(&map, "words");
        assert!(p.rest);
        assert!(!p.catch_all);
    }

    #[test]
    fn test_parse_catch_all_marker() {
        let map = parse("<text$>").unwrap();
        let p = param(&map, "text");
        assert!(p.catch_all);
        assert!(!p.rest);
    }

    #[test]
    fn test_parse_switch_option() {
        let map = parse("-silent").unwrap();
        assert!(option(&map, "silent").is_switch());
    }

    #[test]
    fn test_parse_valued_option_with_shortcut() {
        let map = parse("-days|d:number=0").unwrap();
        let o = option(&map, "days");
        assert!(!o.is_switch());
        assert_eq!(o.shortcut, Some('d'));
        assert_eq!(o.default.as_deref(), Some("0"));
    }

    #[test]
    fn test_parse_doubled_dash_option() {
        let map = parse("--verbose").unwrap();
        assert!(option(&map, "verbose").is_switch());
    }

    #[test]
    fn test_parse_unknown_type_fails() {
        assert!(matches!(
            parse("<a:duration>"),
            Err(ConfigError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_default_type_fails() {
        assert!(matches!(
            parse_signature("<a>", &types(), "missing"),
            Err(ConfigError::UnknownDefaultType { .. })
        ));
    }

    #[test]
    fn test_parse_unterminated_parameter_fails() {
        assert!(matches!(
            parse("<a> <b"),
            Err(ConfigError::UnterminatedParameter { .. })
        ));
        assert!(matches!(
            parse("[never"),
            Err(ConfigError::UnterminatedParameter { .. })
        ));
    }

    #[test]
    fn test_parse_duplicate_name_fails() {
        assert!(matches!(
            parse("<a> <a>"),
            Err(ConfigError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_parse_long_shortcut_fails() {
        assert!(matches!(
            parse("-opt|long"),
            Err(ConfigError::InvalidShortcut { .. })
        ));
    }

    #[test]
    fn test_validate_two_rest_parameters() {
        let map = parse("<a...> <b...>").unwrap();
        assert!(matches!(
            map.validate(),
            Err(ConfigError::MultipleTails { .. })
        ));
    }

    #[test]
    fn test_validate_two_catch_alls() {
        let map = parse("<a$> <b$>").unwrap();
        assert!(matches!(
            map.validate(),
            Err(ConfigError::MultipleTails { .. })
        ));
    }

    #[test]
    fn test_validate_tail_not_last() {
        let map = parse("<a...> <b>").unwrap();
        assert!(matches!(map.validate(), Err(ConfigError::TailNotLast { .. })));
    }

    #[test]
    fn test_validate_optional_before_required() {
        let map = parse("[a] <b>").unwrap();
        assert!(matches!(
            map.validate(),
            Err(ConfigError::OptionalNotLast { .. })
        ));
    }

    #[test]
    fn test_validate_optional_last_is_fine() {
        let map = parse("<a> [b]").unwrap();
        assert!(map.validate().is_ok());
    }

    #[test]
    fn test_validate_options_do_not_break_ordering() {
        // Options are not positional; declaring one after a rest parameter
        // is allowed.
        let map = parse("<a...> -silent").unwrap();
        assert!(map.validate().is_ok());
    }

    #[test]
    fn test_programmatic_builder() {
        let types = types();
        let string = types.get("string").unwrap().clone();
        let mut map = SignatureMap::new();
        map.parameter("user", ParameterSpec::new(string.clone()))
            .unwrap()
            .option("silent", OptionSpec::switch().shortcut('s'))
            .unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.validate().is_ok());
    }
}
