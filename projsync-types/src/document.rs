use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory model of one project's build definition.
///
/// Items, imports and item definitions keep their authored order. Property
/// values are raw authored text; evaluation happens in `projsync-core`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Full path of the document on disk. Set by the store on load.
    #[serde(skip)]
    pub path: Utf8PathBuf,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Import>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_definitions: Vec<ItemDefinition>,
}

impl Document {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Directory that item includes are relative to.
    pub fn base_dir(&self) -> &Utf8Path {
        self.path.parent().unwrap_or(Utf8Path::new(""))
    }

    /// Raw authored value of `name`, if the document declares it.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn items_of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |i| i.item_type == item_type)
    }

    pub fn item_definition(&self, item_type: &str) -> Option<&ItemDefinition> {
        self.item_definitions
            .iter()
            .find(|d| d.item_type == item_type)
    }
}

/// One declared build input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub item_type: String,

    /// Include path as authored, relative to the document's base directory.
    pub include: String,

    /// Label of the group the item was declared in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Item {
    pub fn new(item_type: impl Into<String>, include: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            include: include.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn has_metadata(&self, name: &str) -> bool {
        self.metadata.contains_key(name)
    }

    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }
}

/// Default metadata applied to every item of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ItemDefinition {
    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            ..Self::default()
        }
    }
}

/// Reference to an external partial build document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Path as authored; may contain `$(Property)` references and may be
    /// relative to the importing document.
    pub project: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Import {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            label: None,
        }
    }
}
