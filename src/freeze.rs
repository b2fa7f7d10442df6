//! The freeze policy: what a requirement's specifier list becomes once a
//! concrete version is known.

use crate::requirement::{render_specifiers, Operator, Requirement, RequirementKind, Specifier};
use crate::resolver::QueryResult;

/// Compute the replacement specifier list for one requirement, or `None`
/// when the requirement should stay as written.
///
/// A requirement is left alone when its resolution is absent (excluded,
/// not installed, lookup failed) or when it is not a plain versioned
/// requirement. Editable paths, direct URLs and VCS references already
/// name an exact artifact. Otherwise the declared specifiers, whatever
/// they were, are replaced wholesale by a single `operator` + resolved
/// version specifier. A requirement already frozen to exactly that text
/// also yields `None`, which is what makes a second run a no-op.
pub fn apply(
    requirement: &Requirement,
    result: &QueryResult,
    operator: Operator,
) -> Option<Vec<Specifier>> {
    let Some(version) = &result.resolved else {
        return None;
    };
    if !matches!(requirement.kind, RequirementKind::Versioned) {
        return None;
    }

    let replacement = vec![Specifier {
        op: operator,
        version: version.to_string(),
    }];

    if render_specifiers(&replacement) == requirement.spec_text() {
        return None;
    }
    Some(replacement)
}
