//! Typed field system
//!
//! Every item property is backed by a [`TypedField`]: a schema-bound
//! holder that validates and normalizes input per its [`FieldKind`] and
//! formats the resolved value for XML output. Field shapes are declared
//! once per item type as a static [`FieldSchema`] table; no runtime
//! introspection is involved.
//!
//! Validation failures are silent no-ops that leave the field unset or
//! unchanged. The single fatal case is a required field that is still
//! unresolved when it is read.

mod array;
mod scalar;
mod url_kind;

pub use scalar::{format_datetime, parse_datetime};

use crate::document::AttributeMap;
use crate::error::{Result, ValidationError};
use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

/// Kind descriptor for a field or an array element
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text with optional length/enumeration/pattern constraints
    Str,
    /// Decimal number rendered at a fixed precision
    Float,
    /// Whole number (a Float rounded to zero fractional digits)
    Integer,
    /// Location resolved against the item's base domain
    Url,
    /// Location that may point off-domain; kept as-is when absolute
    ExternalUrl,
    /// Date or timestamp
    DateTime,
    /// Boolean-like value rendered as `Yes`/`No`
    YesNo,
    /// Ordered list of elements of the inner kind
    Array(Box<FieldKind>),
}

/// Validating regex carrying a named capture group
#[derive(Debug, Clone)]
pub struct NamedPattern {
    /// Compiled pattern
    pub regex: Regex,
    /// Name of the capture group that must match
    pub group: &'static str,
}

/// Declaration of one field: name, kind and constraints.
///
/// Schemas are built once per item type inside a `Lazy` static table and
/// are immutable afterwards; a [`TypedField`] only borrows its schema.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// External field name (the XML element name)
    pub name: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// Whether an unresolved value at read time is an error
    pub required: bool,
    /// Minimum accepted character length (shorter input is rejected)
    pub min_length: Option<usize>,
    /// Maximum character length (longer input is truncated)
    pub max_length: Option<usize>,
    /// Minimum accepted numeric value (out-of-range input is rejected)
    pub min_value: Option<Decimal>,
    /// Maximum accepted numeric value (out-of-range input is rejected)
    pub max_value: Option<Decimal>,
    /// Fractional digits rendered for Float kinds
    pub precision: u32,
    /// Allowed-value set, matched case-insensitively as patterns
    pub allowed: Vec<&'static str>,
    /// Validating regex with a named group
    pub pattern: Option<NamedPattern>,
    /// Attribute sub-schemas, in output order
    pub attributes: Vec<FieldSchema>,
    /// Maximum element count for Array kinds (truncates to the first N)
    pub max_elements: Option<usize>,
}

impl FieldSchema {
    /// Create a schema for a field of the given kind
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            precision: 0,
            allowed: Vec::new(),
            pattern: None,
            attributes: Vec::new(),
            max_elements: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the minimum character length
    pub fn with_min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Set the maximum character length
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Set the minimum numeric value
    pub fn with_min_value(mut self, value: Decimal) -> Self {
        self.min_value = Some(value);
        self
    }

    /// Set the maximum numeric value
    pub fn with_max_value(mut self, value: Decimal) -> Self {
        self.max_value = Some(value);
        self
    }

    /// Set the rendered fractional digits
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Set the allowed-value set
    pub fn with_allowed(mut self, values: &[&'static str]) -> Self {
        self.allowed = values.to_vec();
        self
    }

    /// Set the validating regex and its named group.
    ///
    /// Schema tables are static declarations, so an invalid pattern is a
    /// programming error and panics at table construction.
    pub fn with_pattern(mut self, pattern: &str, group: &'static str) -> Self {
        let regex = Regex::new(pattern).expect("field pattern must be a valid regex");
        self.pattern = Some(NamedPattern { regex, group });
        self
    }

    /// Add an attribute sub-schema
    pub fn with_attribute(mut self, attribute: FieldSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Cap the element count for array kinds
    pub fn with_max_elements(mut self, count: usize) -> Self {
        self.max_elements = Some(count);
        self
    }
}

/// Input value accepted by `set`/`add`
#[derive(Debug, Clone)]
pub enum Value {
    /// Text input
    Str(String),
    /// Integer input
    Int(i64),
    /// Floating point input
    Float(f64),
    /// Boolean input
    Bool(bool),
    /// Structured date/time input
    DateTime(DateTime<FixedOffset>),
    /// Nested sequence (flattened by array fields)
    List(Vec<Value>),
}

impl Value {
    /// Coerce to text: strings pass through, numbers render themselves
    pub(crate) fn as_text(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    /// Coerce to a decimal number
    pub(crate) fn as_decimal(&self) -> Option<Decimal> {
        use rust_decimal::prelude::FromPrimitive;

        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Float(f) => Decimal::from_f64(*f),
            Value::Str(s) => s.trim().parse::<Decimal>().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Value::DateTime(midnight.and_utc().fixed_offset())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Context supplied when resolving field values.
///
/// URL-capable fields need the base domain; everything else ignores the
/// context. Passing it explicitly keeps fields immutable on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    /// Base domain for relative URL composition
    pub base_url: Option<&'a Url>,
}

impl<'a> ResolveContext<'a> {
    /// Empty context (no base domain)
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying a base domain
    pub fn with_base(base_url: &'a Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }
}

/// Resolved field value as it will appear in a document
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Plain text value
    Scalar(String),
    /// Text value plus non-empty attributes
    Attributed {
        /// The element text
        value: String,
        /// Resolved non-empty attributes, in schema order
        attrs: AttributeMap,
    },
    /// Ordered array elements
    List(Vec<Resolved>),
}

/// Internal storage of one field's validated state
#[derive(Debug, Clone, Default)]
pub(crate) enum FieldState {
    /// Nothing assigned yet, or every assignment was rejected
    #[default]
    Unset,
    /// Normalized text (Str, YesNo)
    Text(String),
    /// Validated number (Float, Integer)
    Number(Decimal),
    /// Validated date (DateTime)
    Date(DateTime<FixedOffset>),
    /// Raw location, resolved against the context on read (Url kinds)
    RawUrl(String),
    /// Array elements
    Elements(Vec<TypedField>),
}

/// A schema-bound value holder for one item property
#[derive(Debug, Clone)]
pub struct TypedField {
    pub(crate) schema: &'static FieldSchema,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
    pub(crate) state: FieldState,
    pub(crate) attrs: Vec<TypedField>,
}

impl TypedField {
    /// Instantiate a holder from its schema
    pub fn new(schema: &'static FieldSchema) -> Self {
        Self {
            schema,
            kind: schema.kind.clone(),
            required: schema.required,
            state: FieldState::Unset,
            attrs: schema.attributes.iter().map(TypedField::new).collect(),
        }
    }

    /// Overwrite the field's value
    pub fn set(&mut self, value: Value) -> Result<()> {
        match self.kind.clone() {
            FieldKind::Array(inner) => {
                self.state = FieldState::Elements(Vec::new());
                self.append_elements(&inner, value)
            }
            FieldKind::Str => self.set_text(value),
            FieldKind::Float => self.set_number(value, false),
            FieldKind::Integer => self.set_number(value, true),
            FieldKind::DateTime => self.set_datetime(value),
            FieldKind::YesNo => self.set_yes_no(value),
            FieldKind::Url | FieldKind::ExternalUrl => self.set_raw_url(value),
        }
    }

    /// Append for array kinds; identical to `set` otherwise
    pub fn add(&mut self, value: Value) -> Result<()> {
        match self.kind.clone() {
            FieldKind::Array(inner) => {
                if !matches!(self.state, FieldState::Elements(_)) {
                    self.state = FieldState::Elements(Vec::new());
                }
                self.append_elements(&inner, value)
            }
            _ => self.set(value),
        }
    }

    /// Overwrite the value and assign attributes in one call.
    ///
    /// For array kinds the attributes apply to every element appended by
    /// this call.
    pub fn set_with_attrs(&mut self, value: Value, attrs: &[(&str, Value)]) -> Result<()> {
        if matches!(self.kind, FieldKind::Array(_)) {
            self.state = FieldState::Elements(Vec::new());
            return self.add_with_attrs(value, attrs);
        }
        self.set(value)?;
        for (name, attr_value) in attrs {
            self.set_attr(name, attr_value.clone())?;
        }
        Ok(())
    }

    /// Append with attributes (array kinds); set-with-attrs otherwise
    pub fn add_with_attrs(&mut self, value: Value, attrs: &[(&str, Value)]) -> Result<()> {
        if let FieldKind::Array(inner) = self.kind.clone() {
            if !matches!(self.state, FieldState::Elements(_)) {
                self.state = FieldState::Elements(Vec::new());
            }
            let before = self.element_count();
            self.append_elements(&inner, value)?;
            let after = self.element_count();
            if let FieldState::Elements(elements) = &mut self.state {
                for element in &mut elements[before..after] {
                    for (name, attr_value) in attrs {
                        element.set_attr(name, attr_value.clone())?;
                    }
                }
            }
            Ok(())
        } else {
            self.set_with_attrs(value, attrs)
        }
    }

    /// Assign one attribute value; unknown attribute names are inert
    pub fn set_attr(&mut self, name: &str, value: Value) -> Result<bool> {
        match self.attrs.iter_mut().find(|a| a.schema.name == name) {
            Some(attr) => {
                attr.set(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether any value has survived validation
    pub fn is_set(&self) -> bool {
        match &self.state {
            FieldState::Unset => false,
            FieldState::Elements(elements) => !elements.is_empty(),
            _ => true,
        }
    }

    /// The stored date, for DateTime kinds
    pub fn datetime_value(&self) -> Option<DateTime<FixedOffset>> {
        match &self.state {
            FieldState::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Resolve the field against the context.
    ///
    /// Returns `Ok(None)` for an unset optional field and an error for an
    /// unresolved required one.
    pub fn resolve(&self, ctx: &ResolveContext) -> Result<Option<Resolved>> {
        let value = match (&self.kind, &self.state) {
            (FieldKind::Array(_), FieldState::Elements(elements)) => {
                self.resolve_elements(elements, ctx)?
            }
            (_, FieldState::Text(text)) => Some(self.attach_attrs(text.clone(), ctx)?),
            (_, FieldState::Number(number)) => {
                let rendered = self.format_number(*number);
                Some(self.attach_attrs(rendered, ctx)?)
            }
            (_, FieldState::Date(dt)) => Some(self.attach_attrs(format_datetime(dt), ctx)?),
            (_, FieldState::RawUrl(raw)) => self
                .resolve_url(raw, ctx)
                .map(|resolved| self.attach_attrs(resolved, ctx))
                .transpose()?,
            _ => None,
        };

        match value {
            Some(resolved) => Ok(Some(resolved)),
            None if self.required => Err(ValidationError::missing_required(self.schema.name).into()),
            None => Ok(None),
        }
    }

    /// Wrap a resolved text in its attribute form when any attribute is set
    fn attach_attrs(&self, value: String, ctx: &ResolveContext) -> Result<Resolved> {
        let attrs = self.resolve_attrs(ctx)?;
        if attrs.is_empty() {
            Ok(Resolved::Scalar(value))
        } else {
            Ok(Resolved::Attributed { value, attrs })
        }
    }

    /// Resolve attributes in schema order, keeping only non-empty values
    pub(crate) fn resolve_attrs(&self, ctx: &ResolveContext) -> Result<AttributeMap> {
        let mut resolved = AttributeMap::new();
        for attr in &self.attrs {
            if let Some(Resolved::Scalar(value)) = attr.resolve(ctx)? {
                if !value.is_empty() {
                    resolved.insert(attr.schema.name.to_string(), value);
                }
            }
        }
        Ok(resolved)
    }

    fn element_count(&self) -> usize {
        match &self.state {
            FieldState::Elements(elements) => elements.len(),
            _ => 0,
        }
    }
}
