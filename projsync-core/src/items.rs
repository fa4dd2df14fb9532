//! Item classification and item metadata access.

use crate::properties::Evaluator;
use crate::settings::SyncSettings;
use camino::{Utf8Component, Utf8Path};
use projsync_types::{Document, Item, ItemDefinition};

/// Evaluated includes of every tracked-source item, in document order.
pub fn tracked_items(document: &Document, settings: &SyncSettings) -> Vec<String> {
    let eval = Evaluator::new(document, &settings.global_properties);
    document
        .items_of_type(&settings.tracked_item_type)
        .map(|item| eval.expand(&item.include))
        .collect()
}

/// First item produced by code generation whose include is `relative`.
///
/// Matching needs a generated item type *and* the marker metadata; ordinary
/// sources share the same item types.
pub fn find_generated_item<'a>(
    document: &'a Document,
    settings: &SyncSettings,
    relative: &str,
) -> Option<&'a Item> {
    let eval = Evaluator::new(document, &settings.global_properties);
    let wanted = normalize_include(relative);
    document.items.iter().find(|item| {
        settings.is_generated_type(&item.item_type)
            && item.has_metadata(&settings.generated_marker)
            && normalize_include(&eval.expand(&item.include)) == wanted
    })
}

/// Metadata `name` of the first item whose evaluated include is `identity`.
pub fn item_metadata(
    document: &Document,
    settings: &SyncSettings,
    identity: &str,
    name: &str,
    default: &str,
) -> String {
    let eval = Evaluator::new(document, &settings.global_properties);
    let wanted = normalize_include(identity);
    document
        .items
        .iter()
        .find(|item| normalize_include(&eval.expand(&item.include)) == wanted)
        .and_then(|item| item.metadata(name))
        .map(|raw| eval.expand(raw))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Item-definition metadata `name` for `item_type`, raw or evaluated.
pub fn default_item_metadata(
    document: &Document,
    settings: &SyncSettings,
    item_type: &str,
    name: &str,
    evaluated: bool,
    default: &str,
) -> String {
    let value = document
        .item_definition(item_type)
        .and_then(|def| def.metadata.get(name))
        .map(|raw| {
            if evaluated {
                Evaluator::new(document, &settings.global_properties).expand(raw)
            } else {
                raw.clone()
            }
        });
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Set metadata `name` on every item matching the optional type and label.
///
/// Returns the number of items updated.
pub fn set_item_metadata(
    document: &mut Document,
    item_type: Option<&str>,
    label: Option<&str>,
    name: &str,
    value: &str,
) -> usize {
    let mut updated = 0;
    for item in document.items.iter_mut() {
        let type_ok = item_type.is_none_or(|t| item.item_type == t);
        let label_ok = label.is_none_or(|l| item.label.as_deref() == Some(l));
        if type_ok && label_ok {
            item.metadata.insert(name.to_string(), value.to_string());
            updated += 1;
        }
    }
    updated
}

/// Set item-definition metadata for `item_type`, creating the definition if needed.
pub fn set_default_item_metadata(document: &mut Document, item_type: &str, name: &str, value: &str) {
    let index = match document
        .item_definitions
        .iter()
        .position(|d| d.item_type == item_type)
    {
        Some(index) => index,
        None => {
            document.item_definitions.push(ItemDefinition::new(item_type));
            document.item_definitions.len() - 1
        }
    };
    document.item_definitions[index]
        .metadata
        .insert(name.to_string(), value.to_string());
}

/// `path` relative to `base`, using `/` separators.
///
/// Paths already relative are returned as given. Paths outside `base` climb
/// out with `..` segments.
pub fn relative_path(base: &Utf8Path, path: &Utf8Path) -> String {
    if !path.is_absolute() {
        return normalize_include(path.as_str());
    }
    let base = lexical_components(base);
    let target = lexical_components(path);
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat_n("..", base.len() - common));
    parts.extend(target[common..].iter().map(|c| c.as_str()));
    parts.join("/")
}

/// Components with `.` dropped and `..` folded into its parent. A `..` at
/// the root stays at the root.
fn lexical_components(path: &Utf8Path) -> Vec<Utf8Component<'_>> {
    let mut out: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match out.last() {
                Some(Utf8Component::Normal(_)) => {
                    out.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Normalize an include for comparison: `/` separators, no leading `./`.
pub fn normalize_include(include: &str) -> String {
    let mut s = include.replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> SyncSettings {
        SyncSettings::default()
    }

    fn doc() -> Document {
        let mut doc = Document::new("/proj/app.vcxproj");
        doc.set_property("GenDir", "generated");
        doc.items.push(Item::new("SliceCompile", "Hello.ice"));
        doc.items.push(Item::new("ClCompile", "main.cpp"));
        doc.items.push(
            Item::new("ClCompile", "$(GenDir)\\Hello.cpp").with_metadata("SliceCompileSource", "Hello.ice"),
        );
        doc.items.push(Item::new("SliceCompile", "sub/Other.ice").with_label("Slice"));
        doc
    }

    #[test]
    fn tracked_items_in_document_order() {
        assert_eq!(tracked_items(&doc(), &settings()), vec!["Hello.ice", "sub/Other.ice"]);
    }

    #[test]
    fn generated_requires_type_and_marker() {
        let settings = settings();
        let mut doc = doc();
        assert!(find_generated_item(&doc, &settings, "generated/Hello.cpp").is_some());
        // Type match without marker.
        assert!(find_generated_item(&doc, &settings, "main.cpp").is_none());
        // Marker without a generated type.
        doc.items.push(Item::new("None", "notes.txt").with_metadata("SliceCompileSource", "x.ice"));
        assert!(find_generated_item(&doc, &settings, "notes.txt").is_none());
    }

    #[test]
    fn first_matching_generated_item_wins() {
        let settings = settings();
        let mut doc = Document::new("/proj/app.csproj");
        doc.items.push(Item::new("Compile", "a.cs").with_metadata("SliceCompileSource", "first.ice"));
        doc.items.push(Item::new("Compile", "a.cs").with_metadata("SliceCompileSource", "second.ice"));
        let item = find_generated_item(&doc, &settings, "a.cs").expect("match");
        assert_eq!(item.metadata("SliceCompileSource"), Some("first.ice"));
    }

    #[test]
    fn item_metadata_falls_back_to_default() {
        let settings = settings();
        let doc = doc();
        assert_eq!(
            item_metadata(&doc, &settings, "generated/Hello.cpp", "SliceCompileSource", ""),
            "Hello.ice"
        );
        assert_eq!(item_metadata(&doc, &settings, "main.cpp", "Missing", "def"), "def");
        assert_eq!(item_metadata(&doc, &settings, "nope.cpp", "Missing", "def"), "def");
    }

    #[test]
    fn default_metadata_raw_and_evaluated() {
        let settings = settings();
        let mut doc = doc();
        set_default_item_metadata(&mut doc, "SliceCompile", "OutputDir", "$(GenDir)/out");
        assert_eq!(
            default_item_metadata(&doc, &settings, "SliceCompile", "OutputDir", false, ""),
            "$(GenDir)/out"
        );
        assert_eq!(
            default_item_metadata(&doc, &settings, "SliceCompile", "OutputDir", true, ""),
            "generated/out"
        );
        assert_eq!(
            default_item_metadata(&doc, &settings, "SliceCompile", "Missing", true, "def"),
            "def"
        );

        set_default_item_metadata(&mut doc, "SliceCompile", "OutputDir", "x");
        assert_eq!(doc.item_definitions.len(), 1);
    }

    #[test]
    fn set_item_metadata_filters_by_type_and_label() {
        let mut doc = doc();
        assert_eq!(set_item_metadata(&mut doc, Some("SliceCompile"), Some("Slice"), "Tie", "on"), 1);
        assert_eq!(doc.items[3].metadata("Tie"), Some("on"));
        assert_eq!(doc.items[0].metadata("Tie"), None);

        assert_eq!(set_item_metadata(&mut doc, Some("SliceCompile"), None, "Tie", "off"), 2);
        assert_eq!(doc.items[3].metadata("Tie"), Some("off"));

        let total = doc.items.len();
        assert_eq!(set_item_metadata(&mut doc, None, None, "All", "1"), total);
        assert_eq!(set_item_metadata(&mut doc, Some("Nope"), None, "All", "1"), 0);
    }

    #[test]
    fn relative_path_cases() {
        let base = Utf8Path::new("/proj");
        assert_eq!(relative_path(base, Utf8Path::new("/proj/foo.cpp")), "foo.cpp");
        assert_eq!(relative_path(base, Utf8Path::new("/proj/gen/foo.cpp")), "gen/foo.cpp");
        assert_eq!(relative_path(base, Utf8Path::new("/other/foo.cpp")), "../other/foo.cpp");
        assert_eq!(relative_path(base, Utf8Path::new("./foo.cpp")), "foo.cpp");
    }

    #[test]
    fn relative_path_folds_parent_dirs() {
        let base = Utf8Path::new("/proj");
        assert_eq!(relative_path(base, Utf8Path::new("/proj/sub/../foo.cpp")), "foo.cpp");
        assert_eq!(relative_path(base, Utf8Path::new("/proj/gen/./x/../a.cpp")), "gen/a.cpp");
        assert_eq!(relative_path(base, Utf8Path::new("/../proj/a.cpp")), "a.cpp");
        assert_eq!(relative_path(Utf8Path::new("/proj/sub/.."), Utf8Path::new("/proj/a.cpp")), "a.cpp");
    }

    #[test]
    fn generated_item_found_through_parent_dir() {
        let doc = doc();
        let relative = relative_path(doc.base_dir(), Utf8Path::new("/proj/sub/../generated/Hello.cpp"));
        assert!(find_generated_item(&doc, &settings(), &relative).is_some());
    }

    #[test]
    fn normalize_include_separators() {
        assert_eq!(normalize_include(".\\gen\\a.cpp"), "gen/a.cpp");
        assert_eq!(normalize_include("././a.cpp"), "a.cpp");
    }
}
