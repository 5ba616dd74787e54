use serde_json::{Map, Value};
use tracing::warn;

/// How a text value is turned into JSON, from the `data-transform` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transform {
    #[default]
    Raw,
    /// Comma separated list of trimmed strings.
    Csv,
    /// Parsed JSON, `null` when the value does not parse.
    Json,
}

impl Transform {
    pub fn from_attribute(attribute: Option<&str>) -> Self {
        match attribute.map(str::trim) {
            Some(name) if name.eq_ignore_ascii_case("csv") => Transform::Csv,
            Some(name) if name.eq_ignore_ascii_case("json") => Transform::Json,
            _ => Transform::Raw,
        }
    }

    pub fn apply(self, value: &str) -> Value {
        match self {
            Transform::Raw => Value::String(value.to_owned()),
            Transform::Csv => value
                .split(',')
                .map(|item| Value::String(item.trim().to_owned()))
                .collect(),
            Transform::Json => serde_json::from_str(value).unwrap_or_else(|error| {
                warn!("form value is not valid JSON: {error}");
                Value::Null
            }),
        }
    }
}

/// A form control reduced to what serialization needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Checkbox(bool),
    /// `number` and `range` inputs, with their raw value.
    Number(String),
    Radio { checked: bool, value: String },
    /// Names of the selected files.
    File(Vec<String>),
    Select { multiple: bool, selected: Vec<String> },
    /// Any other input, or a textarea.
    Text { value: String, transform: Transform },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub disabled: bool,
    pub control: Control,
}

impl Field {
    pub fn new(name: impl Into<String>, control: Control) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            control,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Collect `fields`, in document order, into a JSON object keyed by name.
///
/// Unnamed and disabled controls are skipped. Later fields overwrite earlier ones of the
/// same name, except that an unchecked radio never replaces a value already present.
pub fn serialize(fields: &[Field]) -> Map<String, Value> {
    let mut data = Map::new();

    for field in fields {
        if field.name.is_empty() || field.disabled {
            continue;
        }

        let value = match &field.control {
            Control::Checkbox(checked) => Value::Bool(*checked),
            Control::Number(raw) => number(raw),
            Control::Radio { checked: true, value } => Value::String(value.clone()),
            Control::Radio { checked: false, .. } => {
                if data.contains_key(&field.name) {
                    continue;
                }
                Value::Null
            }
            Control::File(names) => match names.as_slice() {
                [] => Value::Null,
                [name] => Value::String(name.clone()),
                names => names.iter().cloned().map(Value::String).collect(),
            },
            Control::Select {
                multiple: true,
                selected,
            } => selected.iter().cloned().map(Value::String).collect(),
            Control::Select {
                multiple: false,
                selected,
            } => Value::String(selected.first().cloned().unwrap_or_default()),
            Control::Text { value, transform } => transform.apply(value),
        };

        data.insert(field.name.clone(), value);
    }

    data
}

fn number(raw: &str) -> Value {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}
