//! Hyperparameter values

use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    Layers(Vec<usize>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::Layers(v) => {
                let parts: Vec<String> = v.iter().map(usize::to_string).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<Vec<usize>> for ParamValue {
    fn from(v: Vec<usize>) -> Self {
        ParamValue::Layers(v)
    }
}

/// One hyperparameter combination, keyed by parameter name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Render a combination as `{a=1, b=gini}`
pub fn describe(params: &ParamSet) -> String {
    let parts: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", parts.join(", "))
}

/// Typed, validated access to a [`ParamSet`]
pub struct ParamReader<'a> {
    model: &'static str,
    params: &'a ParamSet,
}

impl<'a> ParamReader<'a> {
    /// Reject parameter names the model does not accept
    pub fn new(model: &'static str, params: &'a ParamSet, allowed: &[&str]) -> EvalResult<Self> {
        if let Some(unknown) = params.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(EvalError::Model(format!(
                "{}: unknown parameter '{}' (accepted: {})",
                model,
                unknown,
                allowed.join(", ")
            )));
        }
        Ok(Self { model, params })
    }

    fn invalid(&self, name: &str, expected: &str) -> EvalError {
        EvalError::Model(format!(
            "{}: parameter '{}' must be {}, got {}",
            self.model,
            name,
            expected,
            self.params
                .get(name)
                .map(ToString::to_string)
                .unwrap_or_default()
        ))
    }

    /// Positive integer
    pub fn usize_or(&self, name: &str, default: usize) -> EvalResult<usize> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Int(v)) if *v >= 1 => Ok(*v as usize),
            Some(_) => Err(self.invalid(name, "a positive integer")),
        }
    }

    /// Strictly positive finite number (integers accepted)
    pub fn positive_f64_or(&self, name: &str, default: f64) -> EvalResult<f64> {
        let value = match self.params.get(name) {
            None => return Ok(default),
            Some(ParamValue::Float(v)) => *v,
            Some(ParamValue::Int(v)) => *v as f64,
            Some(_) => return Err(self.invalid(name, "a positive number")),
        };
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(self.invalid(name, "a positive number"))
        }
    }

    /// One of a fixed set of strings
    pub fn choice_or(&self, name: &str, choices: &[&'static str], default: &'static str) -> EvalResult<&'static str> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Text(v)) => choices
                .iter()
                .find(|c| **c == v.as_str())
                .copied()
                .ok_or_else(|| self.invalid(name, &format!("one of {:?}", choices))),
            Some(_) => Err(self.invalid(name, &format!("one of {:?}", choices))),
        }
    }

    /// Non-empty list of positive layer widths
    pub fn layers_or(&self, name: &str, default: &[usize]) -> EvalResult<Vec<usize>> {
        match self.params.get(name) {
            None => Ok(default.to_vec()),
            Some(ParamValue::Layers(v)) if !v.is_empty() && v.iter().all(|&w| w > 0) => Ok(v.clone()),
            Some(ParamValue::Int(v)) if *v >= 1 => Ok(vec![*v as usize]),
            Some(_) => Err(self.invalid(name, "a non-empty list of positive widths")),
        }
    }

    /// `min_samples_leaf`: an absolute count (integer) or a fraction in (0, 1]
    pub fn leaf_size_or(&self, name: &str, default: LeafSize) -> EvalResult<LeafSize> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Int(v)) if *v >= 1 => Ok(LeafSize::Count(*v as usize)),
            Some(ParamValue::Float(v)) if *v > 0.0 && *v <= 1.0 => Ok(LeafSize::Fraction(*v)),
            Some(_) => Err(self.invalid(name, "an integer >= 1 or a fraction in (0, 1]")),
        }
    }
}

/// Minimum samples per tree leaf
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafSize {
    Count(usize),
    Fraction(f64),
}

impl LeafSize {
    /// Absolute leaf size for a training set of `n` samples
    pub fn resolve(&self, n: usize) -> usize {
        match *self {
            LeafSize::Count(c) => c.max(1),
            LeafSize::Fraction(f) => ((f * n as f64).ceil() as usize).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, ParamValue)]) -> ParamSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let set = params(&[("n_neigbors", ParamValue::Int(3))]);
        assert!(ParamReader::new("KNeighbors", &set, &["n_neighbors", "p"]).is_err());
    }

    #[test]
    fn test_typed_access() {
        let set = params(&[
            ("n_estimators", ParamValue::Int(50)),
            ("C", ParamValue::Int(10)),
            ("criterion", ParamValue::from("entropy")),
            ("hidden_layer_sizes", ParamValue::from(vec![40, 40])),
        ]);
        let reader = ParamReader::new(
            "test",
            &set,
            &["n_estimators", "C", "criterion", "hidden_layer_sizes"],
        )
        .unwrap();

        assert_eq!(reader.usize_or("n_estimators", 100).unwrap(), 50);
        assert_eq!(reader.positive_f64_or("C", 1.0).unwrap(), 10.0);
        assert_eq!(reader.choice_or("criterion", &["gini", "entropy"], "gini").unwrap(), "entropy");
        assert_eq!(reader.layers_or("hidden_layer_sizes", &[100]).unwrap(), vec![40, 40]);
        assert!(reader.choice_or("n_estimators", &["gini"], "gini").is_err());
    }

    #[test]
    fn test_leaf_size_resolution() {
        assert_eq!(LeafSize::Fraction(0.2).resolve(10), 2);
        assert_eq!(LeafSize::Fraction(0.2).resolve(11), 3);
        assert_eq!(LeafSize::Fraction(1.0).resolve(7), 7);
        assert_eq!(LeafSize::Count(4).resolve(2), 4);
    }

    #[test]
    fn test_describe() {
        let set = params(&[
            ("p", ParamValue::Int(2)),
            ("n_neighbors", ParamValue::Int(3)),
        ]);
        assert_eq!(describe(&set), "{n_neighbors=3, p=2}");
        assert_eq!(describe(&ParamSet::new()), "{}");
    }

    #[test]
    fn test_untagged_json_round_trip() {
        let set = params(&[
            ("learning_rate", ParamValue::Float(0.1)),
            ("n_estimators", ParamValue::Int(50)),
            ("hidden_layer_sizes", ParamValue::Layers(vec![10, 10])),
        ]);
        let json = serde_json::to_string(&set).unwrap();
        let back: ParamSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
