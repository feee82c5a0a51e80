//! Snapshot formatting for findings
//!
//! Findings are rendered one per line so `insta` snapshots stay readable
//! and diffs point at the finding that changed.

use cfn_types::Finding;

/// Format a list of findings for snapshot testing.
///
/// # Example
///
/// ```ignore
/// use cfn_test_utils::format_findings;
///
/// let findings = linter.lint(&template);
/// insta::assert_snapshot!(format_findings(&findings), @"...");
/// ```
#[must_use]
pub fn format_findings(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return String::from("(no findings)");
    }

    findings
        .iter()
        .map(|finding| match &finding.original_resource {
            Some(origin) => format!("{finding} via {origin}"),
            None => finding.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format messages only, without ids or positions.
#[must_use]
pub fn format_messages(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return String::from("(no findings)");
    }

    findings
        .iter()
        .enumerate()
        .map(|(i, finding)| format!("[{}] {}", i + 1, finding.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_types::{path, Location};

    #[test]
    fn test_format_findings_empty() {
        assert_eq!(format_findings(&[]), "(no findings)");
    }

    #[test]
    fn test_format_findings_with_origin() {
        let findings = vec![
            Finding::new("W2001", "Parameter Unused not used.", path(&["Parameters", "Unused"]), Location::new(3, 3)),
            Finding::new("E3001", "bad", path(&["Resources", "FnRole"]), Location::new(4, 3))
                .with_original_resource("Fn"),
        ];
        assert_eq!(
            format_findings(&findings),
            "W2001 [warning] Parameter Unused not used. (Parameters/Unused) at 3:3\n\
             E3001 [error] bad (Resources/FnRole) at 4:3 via Fn"
        );
    }

    #[test]
    fn test_format_messages() {
        let findings = vec![Finding::new("E1001", "broken", Vec::new(), Location::new(1, 1))];
        assert_eq!(format_messages(&findings), "[1] broken");
    }
}
