//! Detection and installation of build integrations (props/targets import pairs).

use crate::properties::Evaluator;
use crate::settings::{IntegrationSpec, SyncSettings};
use camino::{Utf8Path, Utf8PathBuf};
use projsync_types::{Document, Import, ProjectKind};
use tracing::debug;

/// Resolved path of an import: expanded, `/`-separated, and absolute when
/// the document has a path.
pub fn resolve_import(document: &Document, eval: &Evaluator<'_>, import: &Import) -> Utf8PathBuf {
    let expanded = Utf8PathBuf::from(eval.expand(&import.project).replace('\\', "/"));
    if expanded.is_absolute() {
        expanded
    } else {
        document.base_dir().join(expanded)
    }
}

/// First resolved import path ending with `suffix` (ASCII case-insensitive).
pub fn find_import(document: &Document, settings: &SyncSettings, suffix: &str) -> Option<Utf8PathBuf> {
    let eval = Evaluator::new(document, &settings.global_properties);
    document
        .imports
        .iter()
        .map(|import| resolve_import(document, &eval, import))
        .find(|path| ends_with_ignore_case(path, suffix))
}

fn ends_with_ignore_case(path: &Utf8Path, suffix: &str) -> bool {
    let path = path.as_str();
    path.len() >= suffix.len()
        && path.is_char_boundary(path.len() - suffix.len())
        && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// True when both halves of `spec` are imported and both files exist.
pub fn is_installed(
    document: &Document,
    settings: &SyncSettings,
    kind: ProjectKind,
    spec: &IntegrationSpec,
) -> bool {
    if !settings.supports_integration(kind) {
        return false;
    }
    let props = find_import(document, settings, &spec.props_suffix);
    let targets = find_import(document, settings, &spec.targets_suffix);
    match (props, targets) {
        (Some(props), Some(targets)) => {
            let ok = props.exists() && targets.exists();
            if !ok {
                debug!(props = %props, targets = %targets, "integration declared but files missing");
            }
            ok
        }
        _ => false,
    }
}

/// Add whichever import halves of `spec` are missing. Returns true if the
/// document changed.
///
/// The props import goes before existing imports, the targets import after.
pub fn add_if_missing(document: &mut Document, settings: &SyncSettings, spec: &IntegrationSpec) -> bool {
    let (has_props, has_targets) = declared(document, settings, spec);
    if !has_props {
        document.imports.insert(0, Import::new(spec.props_import.clone()));
    }
    if !has_targets {
        document.imports.push(Import::new(spec.targets_import.clone()));
    }
    !(has_props && has_targets)
}

/// Whether the props and targets halves of `spec` are declared, regardless
/// of whether the files exist.
pub fn declared(document: &Document, settings: &SyncSettings, spec: &IntegrationSpec) -> (bool, bool) {
    (
        find_import(document, settings, &spec.props_suffix).is_some(),
        find_import(document, settings, &spec.targets_suffix).is_some(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn project_in(temp: &TempDir) -> Document {
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        Document::new(root.join("app.vcxproj"))
    }

    fn touch(doc: &Document, rel: &str) {
        let path = doc.base_dir().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "").expect("touch");
    }

    #[test]
    fn resolves_relative_and_expanded_imports() {
        let settings = SyncSettings::default();
        let mut doc = Document::new("/proj/app.vcxproj");
        doc.set_property("Pkg", "packages");
        let eval = Evaluator::new(&doc, &settings.global_properties);
        assert_eq!(
            resolve_import(&doc, &eval, &Import::new("$(Pkg)\\x\\build\\x.props")),
            Utf8PathBuf::from("/proj/packages/x/build/x.props")
        );
        assert_eq!(
            resolve_import(&doc, &eval, &Import::new("$(ProjectDir)x.targets")),
            Utf8PathBuf::from("/proj/x.targets")
        );
    }

    #[test]
    fn needs_both_halves_present_and_on_disk() {
        let temp = TempDir::new().expect("temp");
        let settings = SyncSettings::default();
        let spec = IntegrationSpec::icebuilder();
        let mut doc = project_in(&temp);

        doc.imports.push(Import::new("build/zeroc.icebuilder.msbuild.props"));
        touch(&doc, "build/zeroc.icebuilder.msbuild.props");
        assert!(!is_installed(&doc, &settings, ProjectKind::Native, &spec));

        doc.imports.push(Import::new("build/zeroc.icebuilder.msbuild.targets"));
        assert!(!is_installed(&doc, &settings, ProjectKind::Native, &spec));

        touch(&doc, "build/zeroc.icebuilder.msbuild.targets");
        assert!(is_installed(&doc, &settings, ProjectKind::Native, &spec));
        assert!(is_installed(&doc, &settings, ProjectKind::Managed, &spec));
        assert!(!is_installed(&doc, &settings, ProjectKind::Unknown, &spec));
    }

    #[test]
    fn suffix_match_ignores_ascii_case() {
        assert!(ends_with_ignore_case(Utf8Path::new("/p/Zeroc.IceBuilder.MSBuild.props"), "zeroc.icebuilder.msbuild.props"));
        assert!(!ends_with_ignore_case(Utf8Path::new("a.props"), "zeroc.icebuilder.msbuild.props"));
    }

    #[test]
    fn add_is_idempotent_and_orders_halves() {
        let settings = SyncSettings::default();
        let spec = IntegrationSpec::icebuilder();
        let mut doc = Document::new("/proj/app.csproj");
        doc.imports.push(Import::new("$(MSBuildToolsPath)/Microsoft.CSharp.targets"));

        assert!(add_if_missing(&mut doc, &settings, &spec));
        assert_eq!(doc.imports.len(), 3);
        assert_eq!(doc.imports[0].project, spec.props_import);
        assert_eq!(doc.imports[2].project, spec.targets_import);

        assert!(!add_if_missing(&mut doc, &settings, &spec));
        assert_eq!(doc.imports.len(), 3);
        assert_eq!(declared(&doc, &settings, &spec), (true, true));
    }

    #[test]
    fn add_fills_only_missing_half() {
        let settings = SyncSettings::default();
        let spec = IntegrationSpec::icebuilder();
        let mut doc = Document::new("/proj/app.csproj");
        doc.imports.push(Import::new("custom/zeroc.icebuilder.msbuild.props"));

        assert!(add_if_missing(&mut doc, &settings, &spec));
        assert_eq!(doc.imports.len(), 2);
        assert_eq!(doc.imports[0].project, "custom/zeroc.icebuilder.msbuild.props");
        assert_eq!(doc.imports[1].project, spec.targets_import);
    }
}
