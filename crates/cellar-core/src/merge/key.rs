/// Normalized sibling key for named nodes.
///
/// Names are trimmed and lowercased (Unicode). Missing and blank names all
/// collapse to [`NameKey::Unnamed`], which compares unequal to every real name
/// including one spelled like a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKey {
    Unnamed,
    Named(String),
}

impl NameKey {
    #[must_use]
    pub fn of(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") => Self::Unnamed,
            Some(trimmed) => Self::Named(trimmed.to_lowercase()),
        }
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::of(Some(name))
    }
}

/// Whether an optional text field carries a usable value.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_and_folds_case() {
        assert_eq!(NameKey::named("  Bordeaux "), NameKey::named("bordeaux"));
        assert_eq!(NameKey::named("ÉPERNAY"), NameKey::named("épernay"));
    }

    #[test]
    fn blank_and_missing_share_the_sentinel() {
        assert_eq!(NameKey::of(None), NameKey::Unnamed);
        assert_eq!(NameKey::named("   "), NameKey::Unnamed);
        assert_ne!(NameKey::named("unnamed"), NameKey::Unnamed);
        assert_ne!(NameKey::named("-"), NameKey::Unnamed);
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some(" \t")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("Merlot")), Some("Merlot"));
    }

    proptest! {
        #[test]
        fn padding_never_changes_the_key(name in "\\PC{0,24}", pad in "[ \\t]{0,4}") {
            let padded = format!("{pad}{name}{pad}");
            prop_assert_eq!(NameKey::named(&padded), NameKey::named(&name));
        }

        #[test]
        fn ascii_case_never_changes_the_key(name in "[a-zA-Z' -]{1,24}") {
            prop_assert_eq!(
                NameKey::named(&name.to_ascii_uppercase()),
                NameKey::named(&name.to_ascii_lowercase())
            );
        }
    }
}
