use cfn_sam::SourceMap;
use cfn_types::Finding;

/// Move findings on an expanded template back to the original source.
///
/// A finding whose path names an entity with an origin takes the origin's
/// position and records the originating resource. Any other finding with a
/// path takes the position of its section's key in the original. Without a
/// source map this is the identity.
#[must_use]
pub fn map_positions(findings: Vec<Finding>, source_map: Option<&SourceMap>) -> Vec<Finding> {
    let Some(source_map) = source_map else {
        return findings;
    };
    findings
        .into_iter()
        .map(|mut finding| match source_map.origin_for_path(&finding.path) {
            Some(origin) => {
                finding.set_location(origin.location);
                finding.with_original_resource(origin.name.clone())
            }
            None if finding.path.is_empty() => finding,
            None => {
                finding.set_location(source_map.section_location(&finding.path));
                finding
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_template::Template;
    use cfn_types::{path, Location};

    fn source_map() -> SourceMap {
        let original = Template::from_source(
            "Resources:\n  Fn:\n    Type: AWS::Serverless::Function\n",
            "t.yaml",
        )
        .unwrap();
        let expanded = Template::from_source(
            "Resources:\n  Fn: {Type: AWS::Lambda::Function}\n  FnRole: {Type: AWS::IAM::Role}\n",
            "t.yaml",
        )
        .unwrap();
        SourceMap::build(&original, &expanded)
    }

    #[test]
    fn test_without_source_map_is_identity() {
        let finding = Finding::new("E3001", "m", path(&["Resources", "X"]), Location::new(9, 9));
        assert_eq!(map_positions(vec![finding.clone()], None), vec![finding]);
    }

    #[test]
    fn test_synthesized_resource_is_remapped() {
        let map = source_map();
        let finding = Finding::new(
            "E3001",
            "m",
            path(&["Resources", "FnRole", "Properties"]),
            Location::new(40, 7),
        );
        let mapped = map_positions(vec![finding], Some(&map));
        assert_eq!(mapped[0].location(), Location::new(2, 3));
        assert_eq!(mapped[0].original_resource.as_deref(), Some("Fn"));
    }

    #[test]
    fn test_section_findings_take_the_original_section_position() {
        let map = source_map();
        let finding = Finding::new("E3010", "m", path(&["Resources"]), Location::new(12, 3));
        let mapped = map_positions(vec![finding], Some(&map));
        assert_eq!(mapped[0].location(), Location::new(1, 1));
        assert_eq!(mapped[0].original_resource, None);
    }

    #[test]
    fn test_unknown_entities_fall_back_to_their_section() {
        let original = Template::from_source(
            "Transform: AWS::Serverless-2016-10-31\nParameters: {}\nResources:\n  Fn:\n    Type: AWS::Serverless::Function\n",
            "t.yaml",
        )
        .unwrap();
        let expanded = Template::from_source(
            "Resources:\n  Fn: {Type: AWS::Lambda::Function}\n  Extra: {Type: AWS::SNS::Topic}\nRules: {}\n",
            "t.yaml",
        )
        .unwrap();
        let map = SourceMap::build(&original, &expanded);
        let findings = vec![
            Finding::new("E3001", "m", path(&["Resources", "Extra"]), Location::new(3, 3)),
            Finding::new("E1001", "m", path(&["Rules"]), Location::new(4, 1)),
        ];
        let mapped = map_positions(findings, Some(&map));
        assert_eq!(mapped[0].location(), Location::new(3, 1));
        assert_eq!(mapped[1].location(), Location::new(1, 1));
    }

    #[test]
    fn test_findings_without_a_path_are_kept() {
        let map = source_map();
        let finding = Finding::runner_error("E3001", "boom");
        let mapped = map_positions(vec![finding.clone()], Some(&map));
        assert_eq!(mapped, vec![finding]);
    }
}
