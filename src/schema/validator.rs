//! Strict JSON Schema validator for inbound Konnect payloads.
//!
//! Validates a request body against a declarative schema before anything is
//! sent upstream. Violations are reported in the shape Konnect already
//! understands (`instancePath`, `keyword`, `params`, `message`), so a missing
//! property surfaces as `params.missingProperty`.
//!
//! # Validation steps (per object scope, in order)
//!
//! 1. **Required properties** – every name listed under `required:` must be
//!    present, reported in the order of the `required` list.
//! 2. **Unknown properties** – with `additionalProperties: false`, keys not
//!    listed under `properties:` are rejected.
//! 3. **Early exit** – if either step produced a violation, nested values are
//!    not inspected so the first failing scope is reported cleanly.
//! 4. **Per-property checks** – `type`, `const`, `enum`, `format`,
//!    `minLength`, `minItems` and `items`, recursively.
//!
//! Discriminated unions (one tag field selecting one of N variant shapes) are
//! handled by [`DiscriminatedSchema`], which maps the tag value directly to
//! the variant schema instead of trying every branch.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Constraint kind that a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Keyword {
    /// A required property is missing.
    Required,
    /// The value has the wrong JSON type.
    Type,
    /// The value is not one of the `enum` options.
    Enum,
    /// The value differs from the `const` value.
    Const,
    /// The string does not match its declared `format`.
    Format,
    /// The object carries a property the schema does not declare.
    AdditionalProperties,
    /// The array is shorter than `minItems`.
    MinItems,
    /// The string is shorter than `minLength`.
    MinLength,
    /// The discriminator value does not select any variant.
    Discriminator,
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON pointer to the failing value (empty for the document root).
    pub instance_path: String,
    /// Violated constraint.
    pub keyword: Keyword,
    /// Machine-readable details, e.g. `{"missingProperty": "client_name"}`.
    pub params: Map<String, Value>,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    fn new(instance_path: &str, keyword: Keyword, params: Value, message: impl Into<String>) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            instance_path: instance_path.to_string(),
            keyword,
            params,
            message: message.into(),
        }
    }

    /// Name of the missing property, for `required` violations.
    #[must_use]
    pub fn missing_property(&self) -> Option<&str> {
        self.params.get("missingProperty").and_then(Value::as_str)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.instance_path.is_empty() {
            "/"
        } else {
            &self.instance_path
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// The result of validating a payload against a schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidationResult {
    /// All violations found. Empty means the payload is valid.
    pub violations: Vec<Violation>,
}

impl SchemaValidationResult {
    /// Returns `true` if there are no violations.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a `Result`, handing back the violations on failure.
    pub fn into_result(self) -> Result<(), Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Validate `instance` against `schema`.
///
/// Pure function: the same inputs always produce the same ordered list of
/// violations.
#[must_use]
pub fn validate(instance: &Value, schema: &Value) -> SchemaValidationResult {
    let mut violations = Vec::new();
    validate_node(instance, schema, "", &mut violations);
    SchemaValidationResult { violations }
}

/// A tagged-union schema: shared base fields plus one variant per tag value.
///
/// Validation runs in three stages: the base schema, then the variant picked
/// by the discriminator value, then (when strict) a check that every key is
/// declared by either the base or the selected variant.
#[derive(Debug, Clone)]
pub struct DiscriminatedSchema {
    base: Value,
    discriminator: String,
    variants: BTreeMap<String, Value>,
    strict: bool,
}

impl DiscriminatedSchema {
    /// Create a union over `base`, keyed by the `discriminator` property.
    #[must_use]
    pub fn new(base: Value, discriminator: impl Into<String>) -> Self {
        Self {
            base,
            discriminator: discriminator.into(),
            variants: BTreeMap::new(),
            strict: false,
        }
    }

    /// Register the variant schema selected by `tag`.
    ///
    /// Tags are unique; registering the same tag twice replaces the earlier
    /// schema, so at most one variant can ever match.
    #[must_use]
    pub fn variant(mut self, tag: impl Into<String>, schema: Value) -> Self {
        self.variants.insert(tag.into(), schema);
        self
    }

    /// Reject properties declared by neither the base nor the selected variant.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Name of the discriminator property.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Registered tag values, in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Validate `instance` against the base schema and the selected variant.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> SchemaValidationResult {
        let base = validate(instance, &self.base);
        if !base.is_valid() {
            return base;
        }

        let mut violations = Vec::new();

        let Some(tag_value) = instance.get(&self.discriminator) else {
            violations.push(missing_property_violation("", &self.discriminator));
            return SchemaValidationResult { violations };
        };

        let tag_path = format!("/{}", escape_pointer(&self.discriminator));
        let Some(variant) = tag_value
            .as_str()
            .and_then(|t| self.variants.get(t))
        else {
            let allowed: Vec<&str> = self.tags().collect();
            violations.push(Violation::new(
                &tag_path,
                Keyword::Discriminator,
                json!({ "tag": self.discriminator, "allowedValues": allowed }),
                format!(
                    "value of tag \"{}\" must be one of: {}",
                    self.discriminator,
                    allowed.join(", ")
                ),
            ));
            return SchemaValidationResult { violations };
        };

        validate_node(instance, variant, "", &mut violations);

        if violations.is_empty() && self.strict {
            let declared: BTreeSet<&str> = declared_properties(&self.base)
                .chain(declared_properties(variant))
                .collect();
            if let Some(map) = instance.as_object() {
                for key in map.keys() {
                    if !declared.contains(key.as_str()) {
                        violations.push(additional_property_violation("", key));
                    }
                }
            }
        }

        SchemaValidationResult { violations }
    }
}

// ── Recursive validation ──────────────────────────────────────────────────────

fn validate_node(value: &Value, schema: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(declared) = schema.get("type").and_then(Value::as_str) {
        if !matches_type(value, declared) {
            out.push(Violation::new(
                path,
                Keyword::Type,
                json!({ "type": declared }),
                format!("must be {declared}"),
            ));
            return;
        }
    }

    if let Some(expected) = schema.get("const") {
        if value != expected {
            out.push(Violation::new(
                path,
                Keyword::Const,
                json!({ "allowedValue": expected }),
                "must be equal to constant",
            ));
            return;
        }
    }

    if let Some(options) = schema.get("enum").and_then(Value::as_array) {
        if !options.contains(value) {
            out.push(Violation::new(
                path,
                Keyword::Enum,
                json!({ "allowedValues": options }),
                "must be equal to one of the allowed values",
            ));
            return;
        }
    }

    match value {
        Value::String(s) => validate_string(s, schema, path, out),
        Value::Array(items) => validate_array(items, schema, path, out),
        Value::Object(map) => validate_object(map, schema, path, out),
        _ => {}
    }
}

fn validate_string(s: &str, schema: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if (s.chars().count() as u64) < min {
            out.push(Violation::new(
                path,
                Keyword::MinLength,
                json!({ "limit": min }),
                format!("must NOT have fewer than {min} characters"),
            ));
            return;
        }
    }

    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        if !matches_format(s, format) {
            out.push(Violation::new(
                path,
                Keyword::Format,
                json!({ "format": format }),
                format!("must match format \"{format}\""),
            ));
        }
    }
}

fn validate_array(items: &[Value], schema: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if (items.len() as u64) < min {
            out.push(Violation::new(
                path,
                Keyword::MinItems,
                json!({ "limit": min }),
                format!("must NOT have fewer than {min} items"),
            ));
            return;
        }
    }

    if let Some(item_schema) = schema.get("items") {
        for (i, item) in items.iter().enumerate() {
            validate_node(item, item_schema, &format!("{path}/{i}"), out);
        }
    }
}

fn validate_object(map: &Map<String, Value>, schema: &Value, path: &str, out: &mut Vec<Violation>) {
    let properties = schema.get("properties").and_then(Value::as_object);
    let scope_start = out.len();

    // Step 1 – required properties, in declaration order.
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !map.contains_key(name) {
                out.push(missing_property_violation(path, name));
            }
        }
    }

    // Step 2 – unknown properties.
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
    if closed {
        for key in map.keys() {
            if !properties.is_some_and(|p| p.contains_key(key)) {
                out.push(additional_property_violation(path, key));
            }
        }
    }

    // Step 3 – stop at the first failing scope.
    if out.len() > scope_start {
        return;
    }

    // Step 4 – nested values.
    let Some(properties) = properties else {
        return;
    };
    for (name, prop_schema) in properties {
        if let Some(child) = map.get(name) {
            let child_path = format!("{path}/{}", escape_pointer(name));
            validate_node(child, prop_schema, &child_path, out);
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn missing_property_violation(path: &str, name: &str) -> Violation {
    Violation::new(
        path,
        Keyword::Required,
        json!({ "missingProperty": name }),
        format!("must have required property '{name}'"),
    )
}

fn additional_property_violation(path: &str, name: &str) -> Violation {
    Violation::new(
        path,
        Keyword::AdditionalProperties,
        json!({ "additionalProperty": name }),
        "must NOT have additional properties",
    )
}

fn declared_properties(schema: &Value) -> impl Iterator<Item = &str> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|p| p.keys().map(String::as_str))
}

fn matches_type(value: &Value, declared: &str) -> bool {
    match declared {
        "string" => value.is_string(),
        "integer" => match value {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type names are not enforced.
        _ => true,
    }
}

fn matches_format(s: &str, format: &str) -> bool {
    match format {
        // Hyphenated form only; `Uuid::try_parse` also accepts braced/urn forms.
        "uuid" => s.len() == 36 && uuid::Uuid::try_parse(s).is_ok(),
        "uri" => url::Url::parse(s).is_ok(),
        "date-time" => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
        _ => true,
    }
}

/// Escape a property name for use in a JSON pointer (RFC 6901).
fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
