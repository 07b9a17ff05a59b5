//! Monotone scale transforms applied to draws before quantiles.

use serde::{Serialize, Serializer};
use ssm_config::BandTransform;
use std::fmt;

/// A monotone transform applied elementwise to every draw.
///
/// Quantiles are taken after the transform. For increasing transforms that
/// equals transforming the quantiles; for decreasing ones (precision to
/// standard deviation) it keeps `lower <= median <= upper`.
#[derive(Clone, Copy, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// `exp(x)`: back from the log scale the model was fit on.
    Exp,
    /// `1 / sqrt(x)`: precision to standard deviation.
    PrecisionToSd,
    /// Any other monotone function.
    Custom(&'static str, fn(f64) -> f64),
}

impl Transform {
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Transform::Identity => x,
            Transform::Exp => x.exp(),
            Transform::PrecisionToSd => 1.0 / x.sqrt(),
            Transform::Custom(_, f) => f(x),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Identity => "identity",
            Transform::Exp => "exp",
            Transform::PrecisionToSd => "precision_to_sd",
            Transform::Custom(name, _) => name,
        }
    }

    /// Whether the transform is the identity (draws can be used as-is).
    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.name())
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Serialize for Transform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl From<BandTransform> for Transform {
    fn from(t: BandTransform) -> Self {
        match t {
            BandTransform::Identity => Transform::Identity,
            BandTransform::Exp => Transform::Exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64) -> f64 {
        x * x
    }

    #[test]
    fn applies_each_variant() {
        assert_eq!(Transform::Identity.apply(2.5), 2.5);
        assert!((Transform::Exp.apply(1.0) - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(Transform::PrecisionToSd.apply(4.0), 0.5);
        assert_eq!(Transform::Custom("square", square).apply(3.0), 9.0);
    }

    #[test]
    fn names_and_config_mapping() {
        assert_eq!(Transform::from(BandTransform::Exp), Transform::Exp);
        assert_eq!(Transform::from(BandTransform::Identity).name(), "identity");
        assert_eq!(Transform::Custom("square", square).to_string(), "square");
        assert_eq!(serde_json::to_string(&Transform::Exp).unwrap(), "\"exp\"");
    }
}
