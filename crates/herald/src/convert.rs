//! Type converters that turn raw argument text into typed values.
//!
//! Every parameter and valued option in a signature carries an
//! `Arc<dyn TypeConverter>`. After the binder has assigned raw tokens to
//! names, it runs each converter in binding order, awaiting asynchronous
//! converters one at a time so the first failure short-circuits the rest.
//!
//! A converter reports an input-driven failure with [`ConvertError`]; the
//! binder surfaces that as a soft match error naming the offending field.
//! Panics inside a converter are not caught.
//!
//! # Custom converters
//!
//! Implement [`TypeConverter`] directly for async work (member lookups,
//! database queries), or wrap a plain function with [`converter_fn`]:
//!
//! ```rust
//! use herald::{converter_fn, ConvertError, TypeTable};
//! use serde_json::Value;
//!
//! let mut types = TypeTable::with_defaults();
//! types.insert("emoji", converter_fn(|raw, _ctx| {
//!     raw.chars()
//!         .next()
//!         .filter(|c| !c.is_ascii())
//!         .map(|c| Value::String(c.to_string()))
//!         .ok_or_else(|| ConvertError::new("not an emoji"))
//! }));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::MatchContext;
use crate::error::ConvertError;

/// Converts the raw text of one bound argument into a typed [`Value`].
///
/// Converters may suspend (await) freely; the binder awaits them strictly in
/// binding order, never concurrently.
#[async_trait]
pub trait TypeConverter: Send + Sync {
    /// Converts `raw` into a value, or rejects it with a [`ConvertError`].
    async fn convert(&self, raw: &str, ctx: &MatchContext) -> Result<Value, ConvertError>;
}

/// A [`TypeConverter`] wrapping a synchronous function.
///
/// Produced by [`converter_fn`].
struct FnConverter<F> {
    func: F,
}

#[async_trait]
impl<F> TypeConverter for FnConverter<F>
where
    F: Fn(&str, &MatchContext) -> Result<Value, ConvertError> + Send + Sync,
{
    async fn convert(&self, raw: &str, ctx: &MatchContext) -> Result<Value, ConvertError> {
        (self.func)(raw, ctx)
    }
}

/// Wraps a synchronous function as an `Arc<dyn TypeConverter>`.
pub fn converter_fn<F>(func: F) -> Arc<dyn TypeConverter>
where
    F: Fn(&str, &MatchContext) -> Result<Value, ConvertError> + Send + Sync + 'static,
{
    Arc::new(FnConverter { func })
}

// =============================================================================
// Default Converters
// =============================================================================

/// The identity converter: every raw value becomes a [`Value::String`].
fn convert_string(raw: &str, _ctx: &MatchContext) -> Result<Value, ConvertError> {
    Ok(Value::String(raw.to_owned()))
}

/// Parses integers first so they survive without a float round-trip, then
/// falls back to finite floats.
fn convert_number(raw: &str, _ctx: &MatchContext) -> Result<Value, ConvertError> {
    if let Ok(int) = raw.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ConvertError::new(format!("'{raw}' is not a number")))
}

/// Accepts the usual chat spellings of a boolean.
fn convert_bool(raw: &str, _ctx: &MatchContext) -> Result<Value, ConvertError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
        _ => Err(ConvertError::new(format!("'{raw}' is not a boolean"))),
    }
}

// =============================================================================
// TypeTable
// =============================================================================

/// A lookup table of named type converters used while parsing signatures.
///
/// Cloning is cheap: converters are shared via `Arc`.
#[derive(Clone, Default)]
pub struct TypeTable {
    converters: HashMap<String, Arc<dyn TypeConverter>>,
}

impl TypeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the built-in `string`, `number` and `bool`
    /// converters registered.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.insert("string", converter_fn(convert_string));
        table.insert("number", converter_fn(convert_number));
        table.insert("bool", converter_fn(convert_bool));
        table
    }

    /// Registers a converter under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, converter: Arc<dyn TypeConverter>) {
        self.converters.insert(name.into(), converter);
    }

    /// Looks up a converter by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TypeConverter>> {
        self.converters.get(name)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }
}

impl std::fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TypeTable").field("types", &names).finish()
    }
}
