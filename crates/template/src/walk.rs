//! Recursive traversal over generic values.
//!
//! Every helper here is total: scalars and malformed intrinsic operands
//! simply yield nothing. Paths are relative to the value passed in; mapping
//! steps are keys and sequence steps are `[i]`.

use cfn_syntax::{index_to_segment, Value};

/// A path from the traversal root to a value.
pub type Path = Vec<String>;

/// One intrinsic invocation found by [`find_intrinsic`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicSite<'a> {
    pub name: &'a str,
    pub operand: &'a Value,
    /// Path to the single-key mapping
    pub path: Path,
}

/// A `{"Ref": name}` found by [`find_refs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSite<'a> {
    pub target: &'a str,
    pub path: Path,
}

/// A `{"Fn::GetAtt": ...}` found by [`find_getatt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAttSite<'a> {
    pub resource: &'a str,
    /// `None` when the attribute is missing or computed by another intrinsic
    pub attribute: Option<&'a str>,
    pub path: Path,
}

/// A condition name referenced by `Condition` or `Fn::If`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionRef<'a> {
    pub name: &'a str,
    pub path: Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Ref,
    GetAtt,
    Sub,
}

/// Any reference to a logical ID or pseudo-parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    pub kind: ReferenceKind,
    pub name: &'a str,
    pub path: Path,
}

/// Depth-first descent calling `visitor` for every mapping and sequence.
///
/// Mappings are visited in key order, then sequences in item order.
pub fn walk<'a, F>(value: &'a Value, visitor: &mut F)
where
    F: FnMut(&'a Value, &[String]),
{
    let mut path = Vec::new();
    walk_inner(value, &mut path, visitor);
}

fn walk_inner<'a, F>(value: &'a Value, path: &mut Path, visitor: &mut F)
where
    F: FnMut(&'a Value, &[String]),
{
    match value {
        Value::Mapping(map) => {
            visitor(value, path);
            for (key, child) in map {
                path.push(key.clone());
                walk_inner(child, path, visitor);
                path.pop();
            }
        }
        Value::Sequence(items) => {
            visitor(value, path);
            for (index, child) in items.iter().enumerate() {
                path.push(index_to_segment(index));
                walk_inner(child, path, visitor);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Every single-key mapping whose key is `name`.
#[must_use]
pub fn find_intrinsic<'a>(value: &'a Value, name: &str) -> Vec<IntrinsicSite<'a>> {
    let mut sites = Vec::new();
    walk(value, &mut |node, path| {
        if let Some((key, operand)) = node.as_intrinsic() {
            if key == name {
                sites.push(IntrinsicSite {
                    name: key,
                    operand,
                    path: path.to_vec(),
                });
            }
        }
    });
    sites
}

/// Every `{"Ref": "Name"}` with a string target.
#[must_use]
pub fn find_refs(value: &Value) -> Vec<RefSite<'_>> {
    find_intrinsic(value, "Ref")
        .into_iter()
        .filter_map(|site| {
            Some(RefSite {
                target: site.operand.as_str()?,
                path: site.path,
            })
        })
        .collect()
}

/// Every `Fn::GetAtt`, in either the list or the dotted-string form.
#[must_use]
pub fn find_getatt(value: &Value) -> Vec<GetAttSite<'_>> {
    find_intrinsic(value, "Fn::GetAtt")
        .into_iter()
        .filter_map(|site| {
            let (resource, attribute) = split_getatt(site.operand)?;
            Some(GetAttSite {
                resource,
                attribute,
                path: site.path,
            })
        })
        .collect()
}

/// Split a `Fn::GetAtt` operand into resource and attribute.
#[must_use]
pub fn split_getatt(operand: &Value) -> Option<(&str, Option<&str>)> {
    match operand {
        Value::String(dotted) => Some(match dotted.split_once('.') {
            Some((resource, attribute)) => (resource, Some(attribute)),
            None => (dotted.as_str(), None),
        }),
        Value::Sequence(items) => {
            let resource = items.first()?.as_str()?;
            Some((resource, items.get(1).and_then(Value::as_str)))
        }
        _ => None,
    }
}

/// Variable names used by an `Fn::Sub` operand.
///
/// `${!Literal}` escapes are skipped. For the `[string, map]` form the keys
/// of the variable map are yielded after the string's variables.
#[must_use]
pub fn find_sub_variables(operand: &Value) -> Vec<&str> {
    match operand {
        Value::String(text) => sub_tokens(text),
        Value::Sequence(items) => {
            let mut names = items.first().and_then(Value::as_str).map(sub_tokens).unwrap_or_default();
            if let Some(map) = items.get(1).and_then(Value::as_mapping) {
                names.extend(map.keys().map(String::as_str));
            }
            names
        }
        _ => Vec::new(),
    }
}

/// `${Name}` tokens of a Sub string, excluding `${!Literal}`.
#[must_use]
pub fn sub_tokens(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let token = after[..end].trim();
        if !token.is_empty() && !token.starts_with('!') {
            names.push(token);
        }
        rest = &after[end + 1..];
    }
    names
}

/// Every condition name referenced by `{"Condition": X}` or `Fn::If`.
#[must_use]
pub fn find_condition_refs(value: &Value) -> Vec<ConditionRef<'_>> {
    let mut refs = Vec::new();
    walk(value, &mut |node, path| {
        let Some((key, operand)) = node.as_intrinsic() else {
            return;
        };
        let name = match key {
            "Condition" => operand.as_str(),
            "Fn::If" => operand
                .as_sequence()
                .and_then(<[Value]>::first)
                .and_then(Value::as_str),
            _ => None,
        };
        if let Some(name) = name {
            refs.push(ConditionRef {
                name,
                path: path.to_vec(),
            });
        }
    });
    refs
}

/// Every logical name referenced through `Ref`, `Fn::GetAtt` or `Fn::Sub`.
///
/// Sub variables bound by the pair form's map are local and not reported;
/// `${Resource.Attr}` reports `Resource`.
#[must_use]
pub fn find_references(value: &Value) -> Vec<Reference<'_>> {
    let mut references = Vec::new();
    walk(value, &mut |node, path| {
        let Some((key, operand)) = node.as_intrinsic() else {
            return;
        };
        match key {
            "Ref" => {
                if let Some(name) = operand.as_str() {
                    references.push(Reference {
                        kind: ReferenceKind::Ref,
                        name,
                        path: path.to_vec(),
                    });
                }
            }
            "Fn::GetAtt" => {
                if let Some((name, _)) = split_getatt(operand) {
                    references.push(Reference {
                        kind: ReferenceKind::GetAtt,
                        name,
                        path: path.to_vec(),
                    });
                }
            }
            "Fn::Sub" => {
                let (text, bound) = match operand {
                    Value::String(text) => (Some(text.as_str()), None),
                    Value::Sequence(items) => (
                        items.first().and_then(Value::as_str),
                        items.get(1).and_then(Value::as_mapping),
                    ),
                    _ => (None, None),
                };
                for token in text.map(sub_tokens).unwrap_or_default() {
                    if bound.is_some_and(|map| map.contains_key(token)) {
                        continue;
                    }
                    let name = token.split_once('.').map_or(token, |(name, _)| name);
                    references.push(Reference {
                        kind: ReferenceKind::Sub,
                        name,
                        path: path.to_vec(),
                    });
                }
            }
            _ => {}
        }
    });
    references
}

/// Join a prefix and a traversal path into one finding path.
#[must_use]
pub fn join_path(prefix: &[&str], rest: &[String]) -> Path {
    prefix
        .iter()
        .map(|segment| (*segment).to_string())
        .chain(rest.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_value(source: &str) -> Value {
        cfn_syntax::parse(source).unwrap().root().to_value()
    }

    #[test]
    fn test_walk_visits_containers_in_order() {
        let value = parse_value("A: {B: [1, {C: 2}]}\nD: [x]\n");
        let mut paths = Vec::new();
        walk(&value, &mut |_, path| paths.push(path.join("/")));
        assert_eq!(paths, vec!["", "A", "A/B", "A/B/[1]", "D"]);
    }

    #[test]
    fn test_walk_ignores_scalars() {
        let mut count = 0;
        walk(&Value::String("x".into()), &mut |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_find_refs() {
        let value = parse_value("A: !Ref One\nB: [!Ref Two, {Ref: [not, a, string]}]\n");
        let refs = find_refs(&value);
        let targets: Vec<_> = refs.iter().map(|r| (r.target, r.path.join("/"))).collect();
        assert_eq!(targets, vec![("One", "A".to_string()), ("Two", "B/[0]".to_string())]);
    }

    #[test]
    fn test_find_getatt_both_forms() {
        let value = parse_value("A: !GetAtt Res.Arn\nB: {\"Fn::GetAtt\": [Other, Out.Name]}\nC: !GetAtt Lone\n");
        let sites = find_getatt(&value);
        assert_eq!(sites.len(), 3);
        assert_eq!((sites[0].resource, sites[0].attribute), ("Res", Some("Arn")));
        assert_eq!((sites[1].resource, sites[1].attribute), ("Other", Some("Out.Name")));
        assert_eq!((sites[2].resource, sites[2].attribute), ("Lone", None));
    }

    #[test]
    fn test_dotted_getatt_string_splits_on_first_dot() {
        let operand = Value::String("Stack.Outputs.Name".into());
        assert_eq!(split_getatt(&operand), Some(("Stack", Some("Outputs.Name"))));
    }

    #[test]
    fn test_sub_variables_skip_literals() {
        let operand = Value::String("arn:${AWS::Partition}:s3:::${Bucket}/${!Literal}/${ Res.Arn }".into());
        assert_eq!(find_sub_variables(&operand), vec!["AWS::Partition", "Bucket", "Res.Arn"]);
    }

    #[test]
    fn test_sub_variables_pair_form_includes_map_keys() {
        let value = parse_value("S: !Sub ['${Name}-${Env}', {Name: x, Extra: y}]\n");
        let (_, operand) = value.get("S").unwrap().as_intrinsic().unwrap();
        assert_eq!(find_sub_variables(operand), vec!["Name", "Env", "Name", "Extra"]);
    }

    #[test]
    fn test_sub_tokens_unterminated() {
        assert_eq!(sub_tokens("${A}-${B"), vec!["A"]);
        assert!(sub_tokens("no variables").is_empty());
    }

    #[test]
    fn test_find_condition_refs() {
        let value = parse_value("A: !If [IsProd, 1, 2]\nB: {Condition: IsDev}\nC: !Equals [a, b]\n");
        let names: Vec<_> = find_condition_refs(&value).iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["IsProd", "IsDev"]);
    }

    #[test]
    fn test_find_references_excludes_bound_sub_variables() {
        let value = parse_value(
            "A: !Sub ['${Local}-${Param}-${Res.Arn}', {Local: !Ref Other}]\nB: !GetAtt Thing.Arn\n",
        );
        let names: Vec<_> = find_references(&value).iter().map(|r| (r.kind, r.name)).collect();
        assert_eq!(
            names,
            vec![
                (ReferenceKind::Sub, "Param"),
                (ReferenceKind::Sub, "Res"),
                (ReferenceKind::Ref, "Other"),
                (ReferenceKind::GetAtt, "Thing"),
            ]
        );
    }

    #[test]
    fn test_join_path() {
        let path = join_path(&["Resources", "Bucket"], &["Properties".to_string()]);
        assert_eq!(path, vec!["Resources", "Bucket", "Properties"]);
    }
}
