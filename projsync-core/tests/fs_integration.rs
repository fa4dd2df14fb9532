//! End-to-end flows against documents and integration files on disk.

use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use projsync_core::adapters::{FsDocumentStore, FsProject, NoVersionControl};
use projsync_core::{IntegrationSpec, ProjectKind, ProjectSync, SyncSettings};
use std::fs;
use tempfile::TempDir;

fn workspace() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    fs::write(
        root.join("app.vcxproj"),
        r#"
[properties]
GenDir = "generated"

[[items]]
type = "SliceCompile"
include = "Hello.ice"

[[items]]
type = "ClCompile"
include = "$(GenDir)\\Hello.cpp"

[items.metadata]
SliceCompileSource = "Hello.ice"
"#,
    )
    .expect("write project");
    (temp, root)
}

fn sync() -> ProjectSync {
    ProjectSync::with_ports(
        Box::new(FsDocumentStore),
        Box::new(NoVersionControl),
        SyncSettings::default(),
    )
}

#[test]
fn classifies_items_from_disk() {
    let (_temp, root) = workspace();
    let sync = sync();
    let project = FsProject::new(root.join("app.vcxproj"), ProjectKind::Native);

    assert_eq!(sync.tracked_items(&project), vec!["Hello.ice"]);
    assert!(sync.is_generated_item(&project, &root.join("generated").join("Hello.cpp")));
    assert!(!sync.is_generated_item(&project, &root.join("Hello.ice")));
}

#[test]
fn integration_install_flow() {
    let (_temp, root) = workspace();
    let sync = sync();
    let project = FsProject::new(root.join("app.vcxproj"), ProjectKind::Native);
    let spec = IntegrationSpec::icebuilder();

    assert!(!sync.is_integration_installed(&project));
    assert!(sync.add_integration_if_missing(&project, &spec.name).expect("add"));

    // Declared, but the package files are not on disk yet.
    assert!(!sync.is_integration_installed(&project));

    let build = root.join("packages/zeroc.icebuilder.msbuild/build");
    fs::create_dir_all(&build).expect("mkdir");
    fs::write(build.join(&spec.props_suffix), "").expect("props");
    fs::write(build.join(&spec.targets_suffix), "").expect("targets");
    assert!(sync.is_integration_installed(&project));

    // Managed and native kinds qualify; unknown kinds never do.
    let unknown = FsProject::new(root.join("app.vcxproj"), ProjectKind::Unknown);
    assert!(!sync.is_integration_installed(&unknown));

    // A fresh session sees the persisted imports.
    let reopened = self::sync();
    assert!(reopened.is_integration_installed(&project));
    assert!(!reopened.add_integration_if_missing(&project, &spec.name).expect("add"));
}

#[test]
fn metadata_update_survives_reload() {
    let (_temp, root) = workspace();
    let sync = sync();
    let project = FsProject::new(root.join("app.vcxproj"), ProjectKind::Native);

    sync.set_item_metadata(&project, Some("SliceCompile"), None, "OutputDir", "$(GenDir)")
        .expect("set metadata");

    let reopened = self::sync();
    assert_eq!(
        reopened.item_metadata(&project, "Hello.ice", "OutputDir", ""),
        "generated"
    );
    let text = fs::read_to_string(root.join("app.vcxproj")).expect("read");
    assert!(text.contains("OutputDir"));
}
