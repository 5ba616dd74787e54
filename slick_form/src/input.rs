//! Normalization applied to inputs while the user edits them.

/// Constraints of a number input, read from its attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberRules {
    /// Set by `data-integer-only`.
    pub integer_only: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl NumberRules {
    /// Build rules from raw `min`, `max` and `step` attribute values.
    ///
    /// Empty or unparsable values are ignored, as is a `step` of `any` or one that is
    /// not positive.
    pub fn from_attributes(integer_only: bool, min: &str, max: &str, step: &str) -> Self {
        let parse = |value: &str| value.trim().parse::<f64>().ok().filter(|n| n.is_finite());

        Self {
            integer_only,
            min: parse(min),
            max: parse(max),
            step: parse(step).filter(|step| *step > 0.0),
        }
    }

    /// Strip everything but digits, a leading `-` and, for float inputs, the first `.`.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut cleaned = String::with_capacity(raw.len());
        let mut dotted = false;

        for ch in raw.chars() {
            match ch {
                '0'..='9' => cleaned.push(ch),
                '-' if cleaned.is_empty() => cleaned.push(ch),
                '.' if !self.integer_only && !dotted => {
                    dotted = true;
                    cleaned.push(ch);
                }
                _ => {}
            }
        }

        cleaned
    }

    /// Clamp `raw` to `min`/`max` and round it to `step`.
    ///
    /// `None` when `raw` is not a number, in which case the input is left alone.
    pub fn settle(&self, raw: &str) -> Option<String> {
        let mut value = raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())?;

        if let Some(min) = self.min.filter(|min| value < *min) {
            value = min;
        } else if let Some(max) = self.max.filter(|max| value > *max) {
            value = max;
        }

        match self.step {
            Some(step) => {
                let rounded = (value / step).round() * step;
                Some(format!("{rounded:.precision$}", precision = decimals(step)))
            }
            None => Some(value.to_string()),
        }
    }
}

/// Number of digits after the decimal point in `step`.
fn decimals(step: f64) -> usize {
    step.to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

/// Email addresses are compared case-insensitively, so store them lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
