/// A numeric metric value.
///
/// Snapshots carry values in whichever representation the daemon aggregated
/// them in.  Keeping the integer cases separate from the floating-point case
/// preserves full 64-bit integer precision, which matters to backends that
/// enforce integer range limits: an `f64` cannot tell `i64::MAX` apart from
/// `i64::MAX + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// An unsigned 64-bit integer.
    Unsigned(u64),
    /// A 64-bit floating-point number.
    Float(f64),
}

impl Value {
    /// Returns the value as an `f64`.
    ///
    /// Integers above 2^53 lose precision in the conversion.
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Integer(v) => v as f64,
            Value::Unsigned(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    /// Returns `true` if the value fits in the signed 64-bit integer range.
    ///
    /// Floating-point values are compared against the range endpoints; the
    /// integer cases are exact.
    pub fn in_i64_range(self) -> bool {
        match self {
            Value::Integer(_) => true,
            Value::Unsigned(v) => v <= i64::MAX as u64,
            Value::Float(v) => v >= i64::MIN as f64 && v <= i64::MAX as f64,
        }
    }

    /// Returns `true` if the value exceeds `i64::MAX`.
    pub fn above_i64_range(self) -> bool {
        match self {
            Value::Integer(_) => false,
            Value::Unsigned(v) => v > i64::MAX as u64,
            Value::Float(v) => v > i64::MAX as f64,
        }
    }

    /// Returns `true` if the value is below `i64::MIN`.
    pub fn below_i64_range(self) -> bool {
        match self {
            Value::Integer(_) | Value::Unsigned(_) => false,
            Value::Float(v) => v < i64::MIN as f64,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
