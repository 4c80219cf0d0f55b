use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Information the surrounding pipeline hands a model when it is built.
///
/// Stored in snapshots so a restored model is rebuilt with the same
/// architecture it was saved with.
///
/// # Example
/// ```
/// use detector_models::model::ModelContext;
///
/// let ctx = ModelContext::new(8).with_attr("hidden", "4");
/// assert_eq!(ctx.attr_parsed::<usize>("hidden").unwrap(), Some(4));
/// assert_eq!(ctx.attr("missing"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContext {
    /// Width of each input sample.
    pub n_features: usize,
    /// Optional instance label, shown in logs.
    pub name: Option<String>,
    /// Free-form architecture settings.
    pub attrs: BTreeMap<String, String>,
}

impl ModelContext {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.insert(key.into(), value.to_string());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Parses an attribute. `Ok(None)` when absent.
    ///
    /// # Errors
    /// [`ModelError::InvalidInput`] when present but unparseable.
    pub fn attr_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ModelError> {
        match self.attrs.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                ModelError::InvalidInput(format!("attribute {} has invalid value {:?}", key, raw))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ModelContext::new(3)
            .with_name("ae-0")
            .with_attr("latent", 2)
            .with_attr("act", "relu");
        assert_eq!(ctx.n_features, 3);
        assert_eq!(ctx.name.as_deref(), Some("ae-0"));
        assert_eq!(ctx.attr("act"), Some("relu"));
        assert_eq!(ctx.attr_parsed::<u32>("latent").unwrap(), Some(2));
    }

    #[test]
    fn test_attr_parsed_invalid() {
        let ctx = ModelContext::new(1).with_attr("latent", "two");
        assert!(matches!(
            ctx.attr_parsed::<usize>("latent"),
            Err(ModelError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_attr_parsed_missing() {
        assert_eq!(ModelContext::new(1).attr_parsed::<f64>("lr").unwrap(), None);
    }
}
