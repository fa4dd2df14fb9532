//! Project kinds and the host type-identifier table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of project as reported by the host environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    /// C++ project.
    Native,
    /// C++ store application project.
    NativeStoreVariant,
    /// C# project.
    Managed,
    /// Project known to the host but not loaded.
    Unloaded,
    #[default]
    Unknown,
}

/// Host-reported type identifiers and the kind each maps to.
///
/// Identifiers are compared without braces and case-insensitively.
pub const PROJECT_TYPE_IDS: &[(&str, ProjectKind)] = &[
    ("8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942", ProjectKind::Native),
    (
        "BC8A1FFA-BEE3-4634-8014-F334798102B3",
        ProjectKind::NativeStoreVariant,
    ),
    ("FAE04EC0-301F-11D3-BF4B-00C04F79EFBC", ProjectKind::Managed),
    ("67294A52-A4F0-11D2-AA88-00C04F688DDE", ProjectKind::Unloaded),
];

impl ProjectKind {
    /// Map a host type identifier (with or without braces) to a kind.
    pub fn from_type_id(id: &str) -> Self {
        let needle = id.trim().trim_start_matches('{').trim_end_matches('}');
        PROJECT_TYPE_IDS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(ProjectKind::Unknown)
    }

    /// Braced identifier for this kind, if it has one.
    pub fn type_id(self) -> Option<String> {
        PROJECT_TYPE_IDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(id, _)| format!("{{{id}}}"))
    }

    pub fn is_native(self) -> bool {
        matches!(self, ProjectKind::Native | ProjectKind::NativeStoreVariant)
    }

    pub fn is_managed(self) -> bool {
        matches!(self, ProjectKind::Managed)
    }

    fn name(self) -> &'static str {
        match self {
            ProjectKind::Native => "native",
            ProjectKind::NativeStoreVariant => "native-store-variant",
            ProjectKind::Managed => "managed",
            ProjectKind::Unloaded => "unloaded",
            ProjectKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectKind {
    type Err = std::convert::Infallible;

    /// Accepts a kind name or a host type identifier. Anything else is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "native" => ProjectKind::Native,
            "native-store-variant" | "native-store" => ProjectKind::NativeStoreVariant,
            "managed" => ProjectKind::Managed,
            "unloaded" => ProjectKind::Unloaded,
            _ => ProjectKind::from_type_id(s),
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_braced_and_bare_identifiers() {
        assert_eq!(
            ProjectKind::from_type_id("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}"),
            ProjectKind::Native
        );
        assert_eq!(
            ProjectKind::from_type_id("fae04ec0-301f-11d3-bf4b-00c04f79efbc"),
            ProjectKind::Managed
        );
        assert_eq!(
            ProjectKind::from_type_id("00000000-0000-0000-0000-000000000000"),
            ProjectKind::Unknown
        );
    }

    #[test]
    fn type_id_round_trips_through_table() {
        for (_, kind) in PROJECT_TYPE_IDS {
            let id = kind.type_id().expect("known kind has id");
            assert_eq!(ProjectKind::from_type_id(&id), *kind);
        }
        assert_eq!(ProjectKind::Unknown.type_id(), None);
    }

    #[test]
    fn native_covers_store_variant() {
        assert!(ProjectKind::Native.is_native());
        assert!(ProjectKind::NativeStoreVariant.is_native());
        assert!(!ProjectKind::Managed.is_native());
        assert!(ProjectKind::Managed.is_managed());
    }

    #[test]
    fn parses_names_and_ids() {
        assert_eq!("managed".parse::<ProjectKind>(), Ok(ProjectKind::Managed));
        assert_eq!(
            "native-store".parse::<ProjectKind>(),
            Ok(ProjectKind::NativeStoreVariant)
        );
        assert_eq!(
            "{BC8A1FFA-BEE3-4634-8014-F334798102B3}".parse::<ProjectKind>(),
            Ok(ProjectKind::NativeStoreVariant)
        );
        assert_eq!("vb".parse::<ProjectKind>(), Ok(ProjectKind::Unknown));
    }
}
