//! The advertised model catalog.
//!
//! ChatJimmy has no model listing endpoint, so the list comes entirely from
//! configuration.

use crate::config::{ShimConfig, MODEL_OWNER};
use crate::translate::openai_types::{ModelEntry, ModelList};

/// Configured model ids with the default model guaranteed present. The
/// default is prepended only when the list doesn't already contain it.
#[must_use]
pub fn advertised_models(config: &ShimConfig) -> Vec<String> {
    let mut models = config.models.clone();
    if !models.contains(&config.default_model) {
        models.insert(0, config.default_model.clone());
    }
    models
}

/// Build the `/v1/models` body. Every entry shares one `created` instant.
#[must_use]
pub fn list_models(config: &ShimConfig) -> ModelList {
    let created = chrono::Utc::now().timestamp();

    ModelList {
        object: "list".to_string(),
        data: advertised_models(config)
            .into_iter()
            .map(|id| ModelEntry {
                id,
                object: "model".to_string(),
                created,
                owned_by: MODEL_OWNER.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, ENV_MODEL, ENV_MODELS, DEFAULT_MODEL};

    fn config(model: Option<&str>, models: Option<&str>) -> ShimConfig {
        ShimConfig::resolve(&FileConfig::default(), |key| match key {
            ENV_MODEL => model.map(str::to_string),
            ENV_MODELS => models.map(str::to_string),
            _ => None,
        })
    }

    #[test]
    fn test_default_already_listed_keeps_position() {
        assert_eq!(advertised_models(&config(Some("b"), Some("a,b"))), vec!["a", "b"]);
    }

    #[test]
    fn test_default_missing_is_prepended() {
        assert_eq!(
            advertised_models(&config(Some("c"), Some("a, b"))),
            vec!["c", "a", "b"]
        );
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(advertised_models(&config(None, None)), vec![DEFAULT_MODEL]);
        assert_eq!(advertised_models(&config(None, Some(" , "))), vec![DEFAULT_MODEL]);
    }

    #[test]
    fn test_list_shape() {
        let list = list_models(&config(Some("b"), Some("a,b")));
        assert_eq!(list.object, "list");
        assert_eq!(list.data.len(), 2);
        assert!(list.data.iter().all(|m| m.object == "model"));
        assert!(list.data.iter().all(|m| m.owned_by == "chatjimmy"));
        assert!(list.data.iter().all(|m| m.created == list.data[0].created));
    }
}
