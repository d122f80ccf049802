//! Naming rules tying a meta module's file, module, meta type and group
//! names to one `section__group` pair.

use std::path::Path;

const MODULE_SUFFIX: &str = "__meta_mod";
const TYPE_SUFFIX: &str = "__meta_type";

fn is_name(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `section__group<suffix>` into its section and group.
///
/// The section ends at the first `__`; the group may itself contain `__`.
pub fn split_qualified<'a>(name: &'a str, suffix: &str) -> Option<(&'a str, &'a str)> {
    let stem = name.strip_suffix(suffix)?;
    let idx = stem.get(1..)?.find("__")? + 1;
    let (section, group) = (&stem[..idx], &stem[idx + 2..]);
    (is_name(section) && is_name(group)).then_some((section, group))
}

/// Section and group encoded in a meta module file name such as
/// `system__test__meta_mod.f90`. Any leading directories are ignored.
pub fn split_file_name(file_name: &str) -> Option<(&str, &str)> {
    let base = Path::new(file_name).file_name()?.to_str()?;
    let (stem, extension) = base.rsplit_once('.')?;
    if !extension.ends_with("90") {
        return None;
    }
    split_qualified(stem, MODULE_SUFFIX)
}

/// Check that the file, module, meta type and group names of one meta module
/// agree. Returns one message per problem.
pub fn validate_names(
    file_name: &str,
    module_name: &str,
    meta_type_name: &str,
    group_name: Option<&str>,
) -> Vec<String> {
    let Some(group_name) = group_name else {
        return vec![format!("There is no group name in {file_name}")];
    };
    let Some(expected) = split_file_name(file_name) else {
        return vec![format!("Filename in path is not correct: {file_name}")];
    };

    let mut problems = Vec::new();
    if split_qualified(module_name, MODULE_SUFFIX) != Some(expected) {
        problems.push(format!(
            "Naming Error! file name and module name do not match: {file_name} and {module_name}"
        ));
    }
    if split_qualified(meta_type_name, TYPE_SUFFIX) != Some(expected) {
        problems.push(format!(
            "Naming Error! file name and meta type name do not match: {file_name} and {meta_type_name}"
        ));
    }
    if split_qualified(group_name, "") != Some(expected) {
        problems.push(format!(
            "Naming Error! file name and group name do not match: {file_name} and \"{group_name}\""
        ));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "trunk/source/diagnostics_meta/test_section__test_group__meta_mod.f90";
    const MODULE: &str = "test_section__test_group__meta_mod";
    const TYPE: &str = "test_section__test_group__meta_type";
    const GROUP: &str = "test_section__test_group";

    #[test]
    fn test_good_names() {
        assert!(validate_names(FILE, MODULE, TYPE, Some(GROUP)).is_empty());
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            split_file_name("system__test__meta_mod.F90"),
            Some(("system", "test"))
        );
        assert_eq!(
            split_file_name("a/b/um__sw_rad__diags__meta_mod.f90"),
            Some(("um", "sw_rad__diags"))
        );
        assert_eq!(split_file_name("test_section__test_group__.f90"), None);
        assert_eq!(split_file_name("test_section__test_group__meta_mod.txt"), None);
    }

    #[test]
    fn test_bad_module_names() {
        for bad in [
            "test_section__test_group__metamod",
            "test_section__test_group",
            "test_sectiontest_group__meta_mod",
            "test_section__test_groupmeta_mod",
            "other__test_group__meta_mod",
        ] {
            let problems = validate_names(FILE, bad, TYPE, Some(GROUP));
            assert_eq!(problems.len(), 1, "{bad}");
            assert!(problems[0].contains(bad));
            assert!(problems[0].contains("module name"));
        }
    }

    #[test]
    fn test_bad_type_name() {
        let problems = validate_names(FILE, MODULE, "test_section__test_group__type", Some(GROUP));
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("meta type name"));
    }

    #[test]
    fn test_bad_group_names() {
        for bad in ["", "test_section__other_group", "test_sectiontest_group"] {
            let problems = validate_names(FILE, MODULE, TYPE, Some(bad));
            assert_eq!(problems.len(), 1, "{bad}");
            assert!(problems[0].contains(&format!("\"{bad}\"")));
        }
    }

    #[test]
    fn test_missing_group() {
        assert_eq!(
            validate_names(FILE, MODULE, TYPE, None),
            vec![format!("There is no group name in {FILE}")]
        );
    }

    #[test]
    fn test_bad_file_name() {
        let problems = validate_names("test_section__test_group__", MODULE, TYPE, Some(GROUP));
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("Filename in path is not correct"));
    }
}
