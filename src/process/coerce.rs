// src/process/coerce.rs

/// How a numeric column reacts to text it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Unparsable text fails the read.
    Strict,
    /// Unparsable text becomes an absent value.
    Lenient,
}

/// Numeric columns of a measure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Year,
    Value,
}

/// Per-field coercion policy. YEAR and VALUE deliberately differ.
pub const FIELD_POLICIES: [(NumericField, Coercion); 2] = [
    (NumericField::Year, Coercion::Strict),
    (NumericField::Value, Coercion::Lenient),
];

pub fn policy_for(field: NumericField) -> Coercion {
    FIELD_POLICIES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, c)| *c)
        .unwrap_or(Coercion::Strict)
}

/// Text that could not be coerced under a strict policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uncoercible(pub String);

/// Parse an integer cell. Any finite number is accepted and truncated toward
/// zero (`"2009.5"` is 2009). Empty, NaN and infinite cells are never an
/// integer.
pub fn coerce_integer(raw: &str, policy: Coercion) -> Result<Option<i64>, Uncoercible> {
    let text = raw.trim();
    let parsed = text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    });
    match (parsed, policy) {
        (Some(v), _) => Ok(Some(v)),
        (None, Coercion::Lenient) => Ok(None),
        (None, Coercion::Strict) => Err(Uncoercible(raw.to_string())),
    }
}

/// Parse a float cell. NaN text counts as absent.
pub fn coerce_float(raw: &str, policy: Coercion) -> Result<Option<f64>, Uncoercible> {
    let parsed = raw.trim().parse::<f64>().ok().filter(|f| !f.is_nan());
    match (parsed, policy) {
        (Some(v), _) => Ok(Some(v)),
        (None, Coercion::Lenient) => Ok(None),
        (None, Coercion::Strict) => Err(Uncoercible(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_is_strict_and_value_is_lenient() {
        assert_eq!(policy_for(NumericField::Year), Coercion::Strict);
        assert_eq!(policy_for(NumericField::Value), Coercion::Lenient);
    }

    #[test]
    fn strict_integer() {
        assert_eq!(coerce_integer("2009", Coercion::Strict), Ok(Some(2009)));
        assert_eq!(coerce_integer(" 2009 ", Coercion::Strict), Ok(Some(2009)));
        assert_eq!(coerce_integer("2009.0", Coercion::Strict), Ok(Some(2009)));
        assert_eq!(coerce_integer("2009.5", Coercion::Strict), Ok(Some(2009)));
        assert_eq!(coerce_integer("-3.9", Coercion::Strict), Ok(Some(-3)));
        assert_eq!(
            coerce_integer("inf", Coercion::Strict),
            Err(Uncoercible("inf".into()))
        );
        assert_eq!(
            coerce_integer("NaN", Coercion::Strict),
            Err(Uncoercible("NaN".into()))
        );
        assert_eq!(
            coerce_integer("", Coercion::Strict),
            Err(Uncoercible(String::new()))
        );
        assert_eq!(
            coerce_integer("n/a", Coercion::Strict),
            Err(Uncoercible("n/a".into()))
        );
    }

    #[test]
    fn lenient_float() {
        assert_eq!(coerce_float("34.3", Coercion::Lenient), Ok(Some(34.3)));
        assert_eq!(coerce_float(" 29 ", Coercion::Lenient), Ok(Some(29.0)));
        assert_eq!(coerce_float("", Coercion::Lenient), Ok(None));
        assert_eq!(coerce_float("No data", Coercion::Lenient), Ok(None));
        assert_eq!(coerce_float("NaN", Coercion::Lenient), Ok(None));
        assert_eq!(coerce_integer("x", Coercion::Lenient), Ok(None));
        assert!(coerce_float("x", Coercion::Strict).is_err());
    }
}
