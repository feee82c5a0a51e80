//! Maps logical IDs in an expanded template back to the declarations they
//! came from.

use indexmap::IndexMap;

use cfn_template::{Resource, Template, Value};
use cfn_types::Location;

use crate::expander::{IMPLICIT_HTTP_API, IMPLICIT_REST_API};

/// Where an entity in the expanded template was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Logical ID of the originating declaration
    pub name: String,
    /// Position of the originating declaration's key
    pub location: Location,
    /// `true` when the expanded entity did not exist before expansion
    pub synthesized: bool,
}

/// Lookup from `(section, logical ID)` in the expanded template to its origin.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: IndexMap<(String, String), Origin>,
    /// Top-level keys of the original template
    sections: IndexMap<String, Location>,
    /// The original `Transform` key, for positions with nothing closer
    fallback: Location,
}

impl SourceMap {
    /// Build the map for `expanded`, the result of expanding `original`.
    ///
    /// Every entity of the original template maps to itself. A resource that
    /// only exists after expansion maps to the serverless resource whose
    /// logical ID is the longest prefix of its own. The implicit APIs map to
    /// the first function with an event that created them.
    #[must_use]
    pub fn build(original: &Template, expanded: &Template) -> Self {
        let sections = original
            .top_level_keys()
            .map(|key| (key.to_string(), original.location_of(&[key])))
            .collect();
        let fallback = original.location_of(&["Transform"]);

        let mut entries = IndexMap::new();
        let mut seed = |section: &str, name: &str, location: Location| {
            entries.insert(
                (section.to_string(), name.to_string()),
                Origin {
                    name: name.to_string(),
                    location,
                    synthesized: false,
                },
            );
        };
        for (name, parameter) in original.parameters() {
            seed("Parameters", name, parameter.location());
        }
        for (name, mapping) in original.mappings() {
            seed("Mappings", name, mapping.location());
        }
        for (name, condition) in original.conditions() {
            seed("Conditions", name, condition.location());
        }
        for (name, resource) in original.resources() {
            seed("Resources", name, resource.location());
        }
        for (name, output) in original.outputs() {
            seed("Outputs", name, output.location());
        }

        for (name, _) in expanded.resources() {
            if original.has_resource(name) {
                continue;
            }
            let origin = implicit_api_origin(original, name).or_else(|| {
                original
                    .resources()
                    .filter(|(candidate, resource)| resource.is_serverless() && name.starts_with(candidate))
                    .max_by_key(|(candidate, _)| candidate.len())
            });
            if let Some((origin_name, resource)) = origin {
                entries.insert(
                    ("Resources".to_string(), name.to_string()),
                    Origin {
                        name: origin_name.to_string(),
                        location: resource.location(),
                        synthesized: true,
                    },
                );
            }
        }

        tracing::debug!(entries = entries.len(), "built source map");
        Self {
            entries,
            sections,
            fallback,
        }
    }

    /// Origin of `name` in `section`, if it has one.
    #[must_use]
    pub fn lookup(&self, section: &str, name: &str) -> Option<&Origin> {
        self.entries.get(&(section.to_string(), name.to_string()))
    }

    /// Origin of the entity a finding path points into: the first two
    /// segments name the section and the logical ID.
    #[must_use]
    pub fn origin_for_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Origin> {
        match path {
            [section, name, ..] => self.lookup(section.as_ref(), name.as_ref()),
            _ => None,
        }
    }

    /// Original position for a finding path that names no mapped entity:
    /// the section's key when the original has it, otherwise the
    /// `Transform` key.
    #[must_use]
    pub fn section_location<S: AsRef<str>>(&self, path: &[S]) -> Location {
        path.first()
            .and_then(|section| self.sections.get(section.as_ref()))
            .copied()
            .unwrap_or(self.fallback)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order: original entities first, then synthesized
    /// resources in expanded-template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Origin)> {
        self.entries
            .iter()
            .map(|((section, name), origin)| (section.as_str(), name.as_str(), origin))
    }
}

/// The function whose event created the implicit API `name` belongs to:
/// an `Api` (or `HttpApi`) event that names no API of its own.
fn implicit_api_origin<'a>(original: &'a Template, name: &str) -> Option<(&'a str, &'a Resource)> {
    let (event_type, api_key) = if name.starts_with(IMPLICIT_REST_API) {
        ("Api", "RestApiId")
    } else if name.starts_with(IMPLICIT_HTTP_API) {
        ("HttpApi", "ApiId")
    } else {
        return None;
    };
    original
        .resources()
        .filter(|(_, resource)| resource.resource_type == "AWS::Serverless::Function")
        .find(|(_, resource)| {
            let Some(Value::Mapping(events)) = resource.properties.get("Events") else {
                return false;
            };
            events.values().any(|event| {
                event.get("Type").and_then(Value::as_str) == Some(event_type)
                    && event.get("Properties").and_then(|p| p.get(api_key)).is_none()
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "\
Transform: AWS::Serverless-2016-10-31
Parameters:
  Stage: {Type: String}
Resources:
  Api:
    Type: AWS::Serverless::Api
  ApiHandler:
    Type: AWS::Serverless::Function
  Bucket:
    Type: AWS::S3::Bucket
";

    const EXPANDED: &str = "\
Parameters:
  Stage: {Type: String}
Resources:
  Api: {Type: AWS::ApiGateway::RestApi}
  ApiDeployment: {Type: AWS::ApiGateway::Deployment}
  ApiHandler: {Type: AWS::Lambda::Function}
  ApiHandlerRole: {Type: AWS::IAM::Role}
  Bucket: {Type: AWS::S3::Bucket}
  BucketPolicy: {Type: AWS::S3::BucketPolicy}
  Unrelated: {Type: AWS::SNS::Topic}
";

    fn source_map() -> SourceMap {
        let original = Template::from_source(ORIGINAL, "template.yaml").unwrap();
        let expanded = Template::from_source(EXPANDED, "template.yaml").unwrap();
        SourceMap::build(&original, &expanded)
    }

    #[test]
    fn test_original_entities_map_to_themselves() {
        let map = source_map();
        let stage = map.lookup("Parameters", "Stage").unwrap();
        assert_eq!(stage.location, Location::new(3, 3));
        assert!(!stage.synthesized);
        assert_eq!(map.lookup("Resources", "Bucket").unwrap().location, Location::new(9, 3));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let map = source_map();
        let role = map.lookup("Resources", "ApiHandlerRole").unwrap();
        assert_eq!(role.name, "ApiHandler");
        assert_eq!(role.location, Location::new(7, 3));
        assert!(role.synthesized);
        assert_eq!(map.lookup("Resources", "ApiDeployment").unwrap().name, "Api");
    }

    #[test]
    fn test_only_serverless_resources_are_origins() {
        let map = source_map();
        assert!(map.lookup("Resources", "BucketPolicy").is_none());
        assert!(map.lookup("Resources", "Unrelated").is_none());
    }

    #[test]
    fn test_implicit_api_maps_to_first_function_using_it() {
        let original = Template::from_source(
            "\
Resources:
  Own:
    Type: AWS::Serverless::Function
    Properties:
      Events:
        Get: {Type: Api, Properties: {Path: /, Method: get, RestApiId: !Ref MyApi}}
  Shared:
    Type: AWS::Serverless::Function
    Properties:
      Events:
        Get: {Type: Api, Properties: {Path: /, Method: get}}
",
            "t.yaml",
        )
        .unwrap();
        let expanded = Template::from_source(
            "Resources:\n  ServerlessRestApi: {Type: AWS::ApiGateway::RestApi}\n  ServerlessHttpApi: {Type: AWS::ApiGatewayV2::Api}\n",
            "t.yaml",
        )
        .unwrap();
        let map = SourceMap::build(&original, &expanded);
        let api = map.lookup("Resources", "ServerlessRestApi").unwrap();
        assert_eq!(api.name, "Shared");
        assert_eq!(api.location, Location::new(7, 3));
        assert!(map.lookup("Resources", "ServerlessHttpApi").is_none());
    }

    #[test]
    fn test_section_location() {
        let map = source_map();
        assert_eq!(map.section_location(&["Resources"]), Location::new(4, 1));
        assert_eq!(map.section_location(&["Resources", "Unrelated"]), Location::new(4, 1));
        assert_eq!(map.section_location(&["Rules"]), Location::new(1, 1));
    }

    #[test]
    fn test_origin_for_path() {
        let map = source_map();
        let path = ["Resources", "ApiHandlerRole", "Properties", "Policies"];
        assert_eq!(map.origin_for_path(&path).unwrap().name, "ApiHandler");
        assert!(map.origin_for_path(&["Resources"]).is_none());
        assert_eq!(map.len(), 6);
    }
}
