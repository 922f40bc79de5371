//! Model identifiers (`property:name`) and their normalized wire form.
//!
//! The API accepts `models_list` as a comma-separated string. Callers may
//! pass either that string or a sequence of identifiers; both normalize to
//! the same [`ModelList`], whose wire form joins tokens with `", "`.
//!
//! Normalization trims each token, drops whitespace around the `:`
//! separator and lower-cases the result. It is idempotent.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProtoPredError;

/// Separator used when joining identifiers into `models_list`.
const WIRE_SEPARATOR: &str = ", ";

#[allow(clippy::expect_used)]
static MODEL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_]+:[a-zA-Z0-9_-]+$").expect("model identifier pattern is valid")
});

/// A single `property:name` model identifier, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    family: String,
    name: String,
}

impl ModelId {
    /// Parses and normalizes one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] for empty or malformed tokens.
    pub fn parse(token: &str) -> Result<Self, ProtoPredError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ProtoPredError::validation("empty model identifier"));
        }
        let Some((family, name)) = token.split_once(':') else {
            return Err(ProtoPredError::validation(format!(
                "invalid model format '{token}'; expected 'model_type:model_name'"
            )));
        };
        let normalized = format!(
            "{}:{}",
            family.trim().to_lowercase(),
            name.trim().to_lowercase()
        );
        if !MODEL_ID_PATTERN.is_match(&normalized) {
            return Err(ProtoPredError::validation(format!(
                "invalid model identifier '{token}'; expected 'model_type:model_name' \
                 using letters, digits, '_' or '-'"
            )));
        }
        let (family, name) = normalized
            .split_once(':')
            .map(|(f, n)| (f.to_string(), n.to_string()))
            .unwrap_or_default();
        Ok(Self { family, name })
    }

    /// Property family, e.g. `model_phys`.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Model name within the family, e.g. `water_solubility`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.name)
    }
}

/// A non-empty, order-preserving list of model identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelList {
    models: Vec<ModelId>,
}

impl ModelList {
    /// Parses a comma-separated list such as `"model_phys:a, model_phys:b"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if the list is empty or any
    /// token is empty or malformed.
    pub fn parse(raw: &str) -> Result<Self, ProtoPredError> {
        Self::from_tokens([raw])
    }

    /// Builds a list from a sequence of identifiers.
    ///
    /// Each element may itself be comma-separated.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, ProtoPredError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut models = Vec::new();
        let mut saw_any = false;
        for token in tokens {
            saw_any = true;
            for part in token.as_ref().split(',') {
                models.push(ModelId::parse(part)?);
            }
        }
        if !saw_any || models.is_empty() {
            return Err(ProtoPredError::validation("model list must not be empty"));
        }
        Ok(Self { models })
    }

    /// The `models_list` wire string.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.models
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(WIRE_SEPARATOR)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelId> {
        self.models.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Display for ModelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Conversion into a validated [`ModelList`].
///
/// Implemented for comma-separated strings and for sequences of strings.
pub trait IntoModelList {
    /// Normalizes and validates `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] for empty or malformed input.
    fn into_model_list(self) -> Result<ModelList, ProtoPredError>;
}

impl IntoModelList for ModelList {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        Ok(self)
    }
}

impl IntoModelList for &ModelList {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        Ok(self.clone())
    }
}

impl IntoModelList for &str {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::parse(self)
    }
}

impl IntoModelList for String {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::parse(&self)
    }
}

impl IntoModelList for &String {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::parse(self)
    }
}

impl<S: AsRef<str>> IntoModelList for &[S] {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::from_tokens(self)
    }
}

impl<S: AsRef<str>> IntoModelList for Vec<S> {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::from_tokens(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoModelList for [S; N] {
    fn into_model_list(self) -> Result<ModelList, ProtoPredError> {
        ModelList::from_tokens(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_and_string_normalize_identically() {
        let from_seq = ["model_phys:a", "model_phys:b"].into_model_list().unwrap();
        let from_str = "model_phys:a, model_phys:b".into_model_list().unwrap();
        assert_eq!(from_seq.to_wire(), "model_phys:a, model_phys:b");
        assert_eq!(from_seq, from_str);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = ModelList::parse(" MODEL_PHYS: Water_Solubility ,model_phys:melting_point")
            .unwrap()
            .to_wire();
        let twice = ModelList::parse(&once).unwrap().to_wire();
        assert_eq!(once, "model_phys:water_solubility, model_phys:melting_point");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_is_preserved() {
        let list = vec!["model_phys:b".to_string(), "model_phys:a".to_string()]
            .into_model_list()
            .unwrap();
        assert_eq!(list.to_wire(), "model_phys:b, model_phys:a");
    }

    #[test]
    fn test_hyphenated_names_are_valid() {
        let list = ModelList::parse("model_abs:caco-2_permeability").unwrap();
        let model = list.iter().next().unwrap();
        assert_eq!(model.family(), "model_abs");
        assert_eq!(model.name(), "caco-2_permeability");
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(ModelList::parse("").is_err());
        assert!(ModelList::from_tokens(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = ModelList::parse("model_phys:a,,model_phys:b").unwrap_err();
        assert!(err.to_string().contains("empty model identifier"));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        for bad in [
            "model_phys-water_solubility",
            "model_phys:",
            ":water_solubility",
            "model phys:water",
            "model_phys:water solubility",
            "model1:water",
            "model_phys:a:b",
        ] {
            assert!(ModelList::parse(bad).is_err(), "expected rejection of {bad:?}");
        }
    }
}
