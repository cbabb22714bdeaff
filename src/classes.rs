//! Class discovery and function-to-class membership.
//!
//! Classes are found by scanning source text for declarations; a class
//! counts as covered when any function attributed to it executed.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::FileCoverageRecord;

/// `class Name`, optionally preceded by export/visibility modifiers.
static CLASS_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:export|default|abstract|declare|public|private|protected|internal)\s+)*class\s+([\p{L}_$][\p{L}\p{N}_$]*)",
    )
    .unwrap()
});

/// Every class declared in `source`, in order of appearance.
///
/// Duplicates are kept: two declarations of the same name in different
/// scopes count twice.
#[must_use]
pub fn extract_classes(source: Option<&str>) -> Vec<&str> {
    let Some(source) = source else {
        return Vec::new();
    };
    CLASS_DECL_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Decides whether a function belongs to a class, given only their names.
pub trait ClassNameMatcher {
    fn is_member(&self, class_name: &str, function_name: &str) -> bool;
}

/// Raw substring containment: `Foo.bar` belongs to `Foo`, but so does
/// `MyFooHelper.bar`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl ClassNameMatcher for SubstringMatcher {
    fn is_member(&self, class_name: &str, function_name: &str) -> bool {
        // Also covers the `ClassName.method` form.
        function_name.contains(class_name)
    }
}

/// Requires the function name to start with `ClassName.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedMatcher;

impl ClassNameMatcher for QualifiedMatcher {
    fn is_member(&self, class_name: &str, function_name: &str) -> bool {
        function_name
            .strip_prefix(class_name)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// A class is covered if at least one of its functions has a nonzero hit
/// count. Classes with no attributed functions are not covered.
#[must_use]
pub fn is_class_covered(
    matcher: &dyn ClassNameMatcher,
    class_name: &str,
    record: &FileCoverageRecord,
) -> bool {
    record.function_names.iter().any(|(id, name)| {
        matcher.is_member(class_name, name)
            && record.functions.get(id).is_some_and(|&hits| hits > 0)
    })
}
