use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use std::fmt;

/// Money scalar represented as integer centavos (e.g., 3500 == R$35.00).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Money(pub i64);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reais = self.0 as f64 / 100.0;
        write!(f, "{:.2}", reais)
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

#[Scalar]
impl ScalarType for Money {
    fn parse(value: async_graphql::Value) -> InputValueResult<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Money(i))
                } else {
                    Err(InputValueError::custom("Money expects integer centavos (i64)"))
                }
            }
            _ => Err(InputValueError::custom(
                "Money must be a number (integer centavos)",
            )),
        }
    }

    fn to_value(&self) -> Value {
        Value::Number(self.0.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Money(3500).to_string(), "35.00");
        assert_eq!(Money(99).to_string(), "0.99");
    }

    #[test]
    fn parses_integer_centavos() {
        let parsed = <Money as ScalarType>::parse(Value::Number(1250.into())).unwrap();
        assert_eq!(parsed, Money(1250));
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(<Money as ScalarType>::parse(Value::String("12.50".into())).is_err());
    }
}
