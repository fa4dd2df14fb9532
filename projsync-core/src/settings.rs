//! Clap-free settings for classification, integration detection and evaluation.

use projsync_types::ProjectKind;
use std::collections::BTreeMap;

/// Item type marking a source as input to the code-generation step.
pub const TRACKED_ITEM_TYPE: &str = "SliceCompile";

/// Metadata key carried by items the code-generation step produced.
pub const GENERATED_MARKER: &str = "SliceCompileSource";

/// Name of the integration used when callers do not name one.
pub const DEFAULT_INTEGRATION: &str = "icebuilder";

/// One external props/targets pair that wires code generation into a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSpec {
    pub name: String,

    /// Suffix a resolved import path must end with to count as the props half.
    pub props_suffix: String,

    /// Suffix a resolved import path must end with to count as the targets half.
    pub targets_suffix: String,

    /// Import text added by `add_integration_if_missing` for the props half.
    pub props_import: String,

    /// Import text added by `add_integration_if_missing` for the targets half.
    pub targets_import: String,
}

impl IntegrationSpec {
    /// The build integration shipped as a NuGet-style package next to the project.
    pub fn icebuilder() -> Self {
        Self {
            name: DEFAULT_INTEGRATION.to_string(),
            props_suffix: "zeroc.icebuilder.msbuild.props".to_string(),
            targets_suffix: "zeroc.icebuilder.msbuild.targets".to_string(),
            props_import: "$(ProjectDir)packages/zeroc.icebuilder.msbuild/build/zeroc.icebuilder.msbuild.props"
                .to_string(),
            targets_import:
                "$(ProjectDir)packages/zeroc.icebuilder.msbuild/build/zeroc.icebuilder.msbuild.targets"
                    .to_string(),
        }
    }
}

/// Settings shared by every query and mutation on a `ProjectSync`.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    // Classification
    pub tracked_item_type: String,
    pub generated_item_types: Vec<String>,
    pub generated_marker: String,

    // Integration detection
    pub integrations: Vec<IntegrationSpec>,
    pub default_integration: String,
    pub integration_kinds: Vec<ProjectKind>,

    // Evaluation
    /// Properties that override document values during evaluation.
    pub global_properties: BTreeMap<String, String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            tracked_item_type: TRACKED_ITEM_TYPE.to_string(),
            generated_item_types: vec![
                "Compile".to_string(),
                "ClCompile".to_string(),
                "ClInclude".to_string(),
            ],
            generated_marker: GENERATED_MARKER.to_string(),
            integrations: vec![IntegrationSpec::icebuilder()],
            default_integration: DEFAULT_INTEGRATION.to_string(),
            integration_kinds: vec![
                ProjectKind::Native,
                ProjectKind::NativeStoreVariant,
                ProjectKind::Managed,
            ],
            global_properties: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    pub fn integration(&self, name: &str) -> Option<&IntegrationSpec> {
        self.integrations.iter().find(|i| i.name == name)
    }

    pub fn is_generated_type(&self, item_type: &str) -> bool {
        self.generated_item_types.iter().any(|t| t == item_type)
    }

    pub fn supports_integration(&self, kind: ProjectKind) -> bool {
        self.integration_kinds.contains(&kind)
    }
}
