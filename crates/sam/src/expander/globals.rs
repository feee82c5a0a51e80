//! The `Globals` section: defaults merged into serverless resources.

use serde_json::Value as Json;

use super::JsonMap;
use crate::error::ExpansionError;

const SUPPORTED: &[&str] = &["Function", "Api", "HttpApi", "SimpleTable", "LayerVersion", "StateMachine"];

#[derive(Debug, Default)]
pub(crate) struct Globals {
    sections: JsonMap,
}

impl Globals {
    /// Remove `Globals` from the template root and validate it.
    pub fn take(root: &mut JsonMap) -> Result<Self, ExpansionError> {
        let sections = match root.remove("Globals") {
            None => JsonMap::new(),
            Some(Json::Object(sections)) => sections,
            Some(_) => return Err(ExpansionError::new("'Globals' section is invalid. It must be an object.")),
        };

        for (kind, value) in &sections {
            if !SUPPORTED.contains(&kind.as_str()) {
                return Err(ExpansionError::new(format!(
                    "'Globals' section is invalid. '{kind}' is not a supported resource type in the Globals section."
                )));
            }
            if !value.is_object() {
                return Err(ExpansionError::new(format!(
                    "'Globals' section is invalid. Globals for '{kind}' must be an object."
                )));
            }
        }
        Ok(Self { sections })
    }

    /// Merge the globals for `kind` under the resource's own properties.
    pub fn apply(&self, kind: &str, properties: &mut JsonMap) {
        let Some(Json::Object(defaults)) = self.sections.get(kind) else {
            return;
        };
        for (key, default) in defaults {
            let merged = match properties.remove(key) {
                Some(local) => merge(default, local),
                None => default.clone(),
            };
            properties.insert(key.clone(), merged);
        }
    }
}

fn is_intrinsic(map: &JsonMap) -> bool {
    map.len() == 1
        && map
            .keys()
            .all(|key| key == "Ref" || key == "Condition" || key.starts_with("Fn::"))
}

/// Local values win; maps merge recursively and lists concatenate.
fn merge(global: &Json, local: Json) -> Json {
    match (global, local) {
        (Json::Object(global_map), Json::Object(mut local_map))
            if !is_intrinsic(global_map) && !is_intrinsic(&local_map) =>
        {
            let mut merged = JsonMap::new();
            for (key, value) in global_map {
                let value = match local_map.remove(key) {
                    Some(local_value) => merge(value, local_value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            merged.extend(local_map);
            Json::Object(merged)
        }
        (Json::Array(global_items), Json::Array(local_items)) => {
            Json::Array(global_items.iter().cloned().chain(local_items).collect())
        }
        (_, local) => local,
    }
}
