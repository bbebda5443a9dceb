//! The matcher: resolves an input line against the registry.
//!
//! [`find_matching_command`](crate::registry::CommandRegistry::find_matching_command)
//! walks registered definitions strictly in registration order:
//!
//! 1. pre filters (first `false` skips the definition, silently)
//! 2. effective prefix test
//! 3. trigger test, consuming the matched prefix + trigger text
//! 4. tokenization of the remainder
//! 5. signature overloads in declaration order, stopping at the first bind
//! 6. post filters (first `false` discards the bind, search continues)
//!
//! Soft failures are data, never `Err`: when nothing fully matches, the
//! outcome is either [`MatchOutcome::NoMatch`] (no definition got past its
//! trigger) or the *last* binding error together with its definition — the
//! closest failed attempt.
//!
//! All awaits (filters and type converters) are strictly sequenced; nothing
//! runs concurrently, so the first conversion failure deterministically
//! short-circuits the rest.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::context::MatchContext;
use crate::convert::TypeConverter;
use crate::error::{MatchError, MatchErrorKind};
use crate::registry::{CommandDefinition, CommandRegistry};
use crate::signature::{OptionSpec, ParameterSpec, SignatureEntry, SignatureMap};
use crate::token::{Token, tokenize};

// =============================================================================
// Result Model
// =============================================================================

/// One bound argument or option value.
#[derive(Debug, Clone)]
pub struct BoundValue {
    /// The signature entry this value was bound against.
    pub source: SignatureEntry,
    /// The converted value; raw string for defaults, `true` for switches,
    /// array for rest parameters.
    pub value: Value,
    /// Whether the value came from the entry's default rather than input.
    pub used_default: bool,
}

/// A successful match: the winning definition and its bound values.
#[derive(Debug, Clone)]
pub struct CommandMatch {
    /// The definition that matched.
    pub definition: Arc<CommandDefinition>,
    /// Bound values keyed by parameter/option name. Absent optionals and
    /// absent switches have no entry.
    pub values: HashMap<String, BoundValue>,
}

impl CommandMatch {
    /// Convenience accessor for a bound value.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|bound| &bound.value)
    }
}

/// The result of a match attempt.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// A definition matched and bound successfully.
    Matched(CommandMatch),
    /// At least one definition got to binding, but none succeeded; this is
    /// the last error seen.
    Failed(MatchError),
    /// No definition matched its prefix and trigger at all.
    NoMatch,
}

impl MatchOutcome {
    /// Returns the match, if any.
    pub fn into_match(self) -> Option<CommandMatch> {
        match self {
            MatchOutcome::Matched(matched) => Some(matched),
            _ => None,
        }
    }

    /// Returns the retained error, if any.
    pub fn into_error(self) -> Option<MatchError> {
        match self {
            MatchOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` for [`MatchOutcome::NoMatch`].
    pub fn is_no_match(&self) -> bool {
        matches!(self, MatchOutcome::NoMatch)
    }
}

/// Outcome of steps 2–5 for a single definition.
enum Attempt {
    /// Prefix or trigger did not match; not an error.
    Skip,
    /// Every overload rejected the tokens; the last overload's error.
    Failed(MatchErrorKind),
    /// An overload bound successfully.
    Bound(HashMap<String, BoundValue>),
}

// =============================================================================
// Matching
// =============================================================================

impl CommandRegistry {
    /// Finds the first registered command that fully matches `input`.
    ///
    /// Definitions are tried strictly in registration order; see the module
    /// docs for the per-definition pipeline. A binding error for one
    /// definition never aborts the search.
    pub async fn find_matching_command(&self, input: &str, ctx: &MatchContext) -> MatchOutcome {
        let mut last_error: Option<MatchError> = None;

        'definitions: for definition in self.definitions() {
            for filter in definition.pre_filters() {
                if !filter.check(input, ctx).await {
                    trace!(
                        command_id = definition.id(),
                        "Pre-filter rejected definition, skipping"
                    );
                    continue 'definitions;
                }
            }

            match self.attempt(definition, input, ctx).await {
                Attempt::Skip => {
                    trace!(command_id = definition.id(), "Prefix/trigger did not match");
                }
                Attempt::Failed(kind) => {
                    trace!(
                        command_id = definition.id(),
                        error = %kind,
                        "All overloads rejected the input"
                    );
                    last_error =
                        Some(MatchError::new(kind).with_definition(Arc::clone(definition)));
                }
                Attempt::Bound(values) => {
                    for filter in definition.post_filters() {
                        if !filter.check(input, ctx).await {
                            trace!(
                                command_id = definition.id(),
                                "Post-filter rejected bound match, continuing"
                            );
                            continue 'definitions;
                        }
                    }
                    debug!(
                        command_id = definition.id(),
                        values = values.len(),
                        "Command matched"
                    );
                    return MatchOutcome::Matched(CommandMatch {
                        definition: Arc::clone(definition),
                        values,
                    });
                }
            }
        }

        match last_error {
            Some(error) => MatchOutcome::Failed(error),
            None => MatchOutcome::NoMatch,
        }
    }

    /// Runs the prefix/trigger/bind pipeline for a single definition,
    /// without pre/post filters and without touching the rest of the
    /// registry. Exposed for hosts doing their own orchestration.
    pub async fn try_matching_command(
        &self,
        definition: &Arc<CommandDefinition>,
        input: &str,
        ctx: &MatchContext,
    ) -> MatchOutcome {
        match self.attempt(definition, input, ctx).await {
            Attempt::Skip => MatchOutcome::NoMatch,
            Attempt::Failed(kind) => {
                MatchOutcome::Failed(MatchError::new(kind).with_definition(Arc::clone(definition)))
            }
            Attempt::Bound(values) => MatchOutcome::Matched(CommandMatch {
                definition: Arc::clone(definition),
                values,
            }),
        }
    }

    /// Steps 2–5: prefix, trigger, tokenize, overloads.
    async fn attempt(
        &self,
        definition: &Arc<CommandDefinition>,
        input: &str,
        ctx: &MatchContext,
    ) -> Attempt {
        let mut working = input;

        if let Some(prefix) = definition.prefix() {
            match prefix.match_at_start(working) {
                Some(consumed) => working = &working[consumed..],
                None => return Attempt::Skip,
            }
        }

        let Some(consumed) = definition
            .triggers()
            .iter()
            .find_map(|trigger| trigger.match_at_start(working))
        else {
            return Attempt::Skip;
        };
        let remaining = &working[consumed..];

        let tokens = tokenize(remaining);

        let mut last_error: Option<MatchErrorKind> = None;
        for signature in definition.signatures() {
            match bind_signature(signature, remaining, &tokens, self.option_prefixes(), ctx).await
            {
                Ok(values) => return Attempt::Bound(values),
                Err(kind) => last_error = Some(kind),
            }
        }
        match last_error {
            Some(kind) => Attempt::Failed(kind),
            // Registration normalizes to at least one overload; an empty
            // list would mean a match with no values.
            None => Attempt::Bound(HashMap::new()),
        }
    }
}

// =============================================================================
// Binder
// =============================================================================

/// A raw value assigned to a name before the conversion pass.
enum RawValue {
    /// One token (or inline option value, or catch-all tail) to convert.
    Single(String),
    /// All remaining token texts, each converted independently.
    Rest(Vec<String>),
    /// A present switch; binds `true`, never converted.
    Switch,
    /// The entry's declared default; bound as a raw string, never converted.
    Default(String),
}

/// One name bound during the scan, in binding order.
struct RawBound<'sig> {
    name: &'sig str,
    entry: &'sig SignatureEntry,
    raw: RawValue,
}

/// Binds one signature overload against the token stream.
///
/// `remaining` is the post-trigger text the tokens were produced from; a
/// catch-all parameter slices its verbatim tail out of it.
async fn bind_signature(
    signature: &SignatureMap,
    remaining: &str,
    tokens: &[Token],
    option_prefixes: &[String],
    ctx: &MatchContext,
) -> Result<HashMap<String, BoundValue>, MatchErrorKind> {
    let positionals: Vec<(&str, &SignatureEntry, &ParameterSpec)> = signature
        .iter()
        .filter_map(|(name, entry)| match entry {
            SignatureEntry::Parameter(param) => Some((name, entry, param)),
            SignatureEntry::Option(_) => None,
        })
        .collect();

    let mut bound: Vec<RawBound<'_>> = Vec::new();
    let mut cursor = 0usize;
    let mut index = 0usize;

    while index < tokens.len() {
        let token = &tokens[index];

        // A rest/catch-all parameter absorbs the tail the moment it becomes
        // the next positional target — before any option recognition, so
        // option-like text inside the tail stays verbatim.
        if let Some(&(name, entry, param)) = positionals.get(cursor) {
            if param.catch_all {
                let tail = tail_from(remaining, token.offset);
                push_bound(&mut bound, name, entry, RawValue::Single(tail.to_owned()));
                break;
            }
            if param.rest {
                let items = tokens[index..].iter().map(|t| t.text.clone()).collect();
                push_bound(&mut bound, name, entry, RawValue::Rest(items));
                break;
            }
        }

        // Quoted tokens are never re-interpreted as option syntax.
        if !token.was_quoted
            && let Some((option_name, inline)) = split_option(&token.text, option_prefixes)
        {
            let Some((resolved_name, entry, option)) = resolve_option(signature, option_name)
            else {
                return Err(MatchErrorKind::UnknownOption {
                    name: option_name.to_owned(),
                });
            };
            if option.is_switch() {
                if inline.is_some() {
                    return Err(MatchErrorKind::SwitchWithValue {
                        name: resolved_name.to_owned(),
                    });
                }
                push_bound(&mut bound, resolved_name, entry, RawValue::Switch);
            } else {
                let value = match inline {
                    Some(value) => value.to_owned(),
                    None => {
                        // The following token is consumed verbatim, even if
                        // it looks like another option.
                        index += 1;
                        match tokens.get(index) {
                            Some(next) => next.text.clone(),
                            None => {
                                return Err(MatchErrorKind::MissingOptionValue {
                                    name: resolved_name.to_owned(),
                                });
                            }
                        }
                    }
                };
                push_bound(&mut bound, resolved_name, entry, RawValue::Single(value));
            }
            index += 1;
            continue;
        }

        // Positional binding.
        match positionals.get(cursor) {
            Some(&(name, entry, _)) => {
                push_bound(&mut bound, name, entry, RawValue::Single(token.text.clone()));
                cursor += 1;
            }
            None => return Err(MatchErrorKind::TooManyArguments),
        }
        index += 1;
    }

    // Fill defaults and flag missing required parameters, in declaration
    // order.
    for (name, entry) in signature.iter() {
        if bound.iter().any(|b| b.name == name) {
            continue;
        }
        match entry {
            SignatureEntry::Option(option) => {
                if let Some(default) = &option.default {
                    bound.push(RawBound {
                        name,
                        entry,
                        raw: RawValue::Default(default.clone()),
                    });
                }
                // Options are never required: absent without default is
                // simply omitted.
            }
            SignatureEntry::Parameter(param) => {
                if let Some(default) = &param.default {
                    bound.push(RawBound {
                        name,
                        entry,
                        raw: RawValue::Default(default.clone()),
                    });
                } else if param.required {
                    return Err(MatchErrorKind::MissingArgument {
                        name: name.to_owned(),
                    });
                }
            }
        }
    }

    // Conversion pass, strictly in binding order so the first failure
    // short-circuits everything after it.
    let mut values = HashMap::with_capacity(bound.len());
    for RawBound { name, entry, raw } in bound {
        let (value, used_default) = match raw {
            RawValue::Switch => (Value::Bool(true), false),
            RawValue::Default(raw) => (Value::String(raw), true),
            RawValue::Single(raw) => (convert_one(entry, name, &raw, ctx).await?, false),
            RawValue::Rest(items) => {
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(convert_one(entry, name, &item, ctx).await?);
                }
                (Value::Array(converted), false)
            }
        };
        values.insert(
            name.to_owned(),
            BoundValue {
                source: entry.clone(),
                value,
                used_default,
            },
        );
    }

    Ok(values)
}

/// Runs the entry's converter on one raw value.
async fn convert_one(
    entry: &SignatureEntry,
    name: &str,
    raw: &str,
    ctx: &MatchContext,
) -> Result<Value, MatchErrorKind> {
    let converter: Option<&Arc<dyn TypeConverter>> = match entry {
        SignatureEntry::Parameter(param) => Some(&param.converter),
        SignatureEntry::Option(option) => option.converter.as_ref(),
    };
    match converter {
        Some(converter) => {
            converter
                .convert(raw, ctx)
                .await
                .map_err(|error| MatchErrorKind::Conversion {
                    name: name.to_owned(),
                    message: error.message,
                })
        }
        // Switches never reach the conversion pass with a raw value.
        None => Ok(Value::String(raw.to_owned())),
    }
}

/// Records a binding, overwriting an earlier binding of the same name (a
/// repeated option: last occurrence wins).
fn push_bound<'sig>(
    bound: &mut Vec<RawBound<'sig>>,
    name: &'sig str,
    entry: &'sig SignatureEntry,
    raw: RawValue,
) {
    if let Some(existing) = bound.iter_mut().find(|b| b.name == name) {
        existing.raw = raw;
    } else {
        bound.push(RawBound { name, entry, raw });
    }
}

/// Splits `prefix + name[=value]` option syntax, trying prefixes
/// longest-first. A bare prefix or an empty name is not option syntax.
fn split_option<'tok>(
    text: &'tok str,
    option_prefixes: &[String],
) -> Option<(&'tok str, Option<&'tok str>)> {
    for prefix in option_prefixes {
        let Some(rest) = text.strip_prefix(prefix.as_str()) else {
            continue;
        };
        if rest.is_empty() {
            return None;
        }
        return match rest.split_once('=') {
            Some(("", _)) => None,
            Some((name, value)) => Some((name, Some(value))),
            None => Some((rest, None)),
        };
    }
    None
}

/// Resolves an option by name or one-character shortcut; names and
/// shortcuts share one namespace.
fn resolve_option<'sig>(
    signature: &'sig SignatureMap,
    name: &str,
) -> Option<(&'sig str, &'sig SignatureEntry, &'sig OptionSpec)> {
    signature.iter().find_map(|(entry_name, entry)| {
        let SignatureEntry::Option(option) = entry else {
            return None;
        };
        if entry_name == name || shortcut_matches(option, name) {
            Some((entry_name, entry, option))
        } else {
            None
        }
    })
}

fn shortcut_matches(option: &OptionSpec, name: &str) -> bool {
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), None) if option.shortcut == Some(c)
    )
}

/// Slices the verbatim tail of `text` starting at a codepoint offset.
fn tail_from(text: &str, offset: usize) -> &str {
    match text.char_indices().nth(offset) {
        Some((byte, _)) => &text[byte..],
        None => "",
    }
}
