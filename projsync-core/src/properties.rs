//! Property evaluation and resolution with caller-supplied defaults.
//!
//! Raw values are the text authored in the document. Evaluated values expand
//! `$(Name)` references against, in precedence order: global properties,
//! reserved properties derived from the document path, then raw document
//! properties. Unknown references and reference cycles expand to empty.

use projsync_types::{Document, property};
use std::collections::BTreeMap;
use tracing::debug;

/// Expands property references against one document.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    document: &'a Document,
    globals: &'a BTreeMap<String, String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(document: &'a Document, globals: &'a BTreeMap<String, String>) -> Self {
        Self { document, globals }
    }

    /// Evaluated value of `name`, or `None` when nothing defines it.
    pub fn property(&self, name: &str) -> Option<String> {
        let mut stack = Vec::new();
        self.lookup(name, &mut stack)
    }

    /// Expand every `$(Name)` reference in `text`.
    pub fn expand(&self, text: &str) -> String {
        let mut stack = Vec::new();
        self.expand_with(text, &mut stack)
    }

    fn lookup(&self, name: &str, stack: &mut Vec<String>) -> Option<String> {
        if let Some(value) = self.globals.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.reserved(name) {
            return Some(value);
        }
        let raw = self.document.property(name)?;
        if stack.iter().any(|n| n == name) {
            debug!(property = name, "property reference cycle");
            return Some(String::new());
        }
        stack.push(name.to_string());
        let value = self.expand_with(raw, stack);
        stack.pop();
        Some(value)
    }

    fn expand_with(&self, text: &str, stack: &mut Vec<String>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("$(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find(')') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = after[..end].trim();
            if is_property_name(name) {
                out.push_str(&self.lookup(name, stack).unwrap_or_default());
            } else {
                // Property functions and item transforms are left as authored.
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }

    fn reserved(&self, name: &str) -> Option<String> {
        let path = &self.document.path;
        if path.as_str().is_empty() {
            return None;
        }
        match name {
            property::PROJECT_DIR => {
                let dir = self.document.base_dir().as_str();
                if dir.is_empty() || dir.ends_with('/') || dir.ends_with('\\') {
                    Some(dir.to_string())
                } else {
                    Some(format!("{dir}/"))
                }
            }
            property::PROJECT_PATH => Some(path.to_string()),
            property::PROJECT_NAME => path.file_stem().map(str::to_string),
            property::PROJECT_FILE_NAME => path.file_name().map(str::to_string),
            _ => None,
        }
    }
}

fn is_property_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Raw authored value of `name`, or `""` when absent.
pub fn raw_property(document: &Document, name: &str) -> String {
    document.property(name).unwrap_or_default().to_string()
}

/// Raw authored value of `name`, or `default` when absent or empty.
pub fn raw_property_or(document: &Document, name: &str, default: &str) -> String {
    non_empty_or(document.property(name).map(str::to_string), default)
}

/// Evaluated value of `name`, or `default` when absent or evaluating to empty.
pub fn evaluated_property_or(
    document: &Document,
    globals: &BTreeMap<String, String>,
    name: &str,
    default: &str,
) -> String {
    non_empty_or(Evaluator::new(document, globals).property(name), default)
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        let mut doc = Document::new("/proj/app.vcxproj");
        doc.set_property("Root", "out");
        doc.set_property("OutDir", "$(Root)/bin");
        doc.set_property("Empty", "");
        doc.set_property("Loop", "x$(Loop)");
        doc.set_property("PingA", "$(PingB)");
        doc.set_property("PingB", "$(PingA)b");
        doc
    }

    #[test]
    fn expands_nested_references() {
        let globals = BTreeMap::new();
        let doc = doc();
        let eval = Evaluator::new(&doc, &globals);
        assert_eq!(eval.property("OutDir").as_deref(), Some("out/bin"));
        assert_eq!(eval.expand("$(OutDir)/$(Missing)x"), "out/bin/x");
    }

    #[test]
    fn globals_override_document() {
        let mut globals = BTreeMap::new();
        globals.insert("Root".to_string(), "dist".to_string());
        let doc = doc();
        let eval = Evaluator::new(&doc, &globals);
        assert_eq!(eval.property("OutDir").as_deref(), Some("dist/bin"));
    }

    #[test]
    fn reserved_properties_follow_document_path() {
        let globals = BTreeMap::new();
        let doc = doc();
        let eval = Evaluator::new(&doc, &globals);
        assert_eq!(eval.property("ProjectDir").as_deref(), Some("/proj/"));
        assert_eq!(eval.property("ProjectName").as_deref(), Some("app"));
        assert_eq!(eval.property("ProjectFileName").as_deref(), Some("app.vcxproj"));
        assert_eq!(eval.expand("$(ProjectDir)gen"), "/proj/gen");
    }

    #[test]
    fn cycles_expand_to_empty() {
        let globals = BTreeMap::new();
        let doc = doc();
        let eval = Evaluator::new(&doc, &globals);
        assert_eq!(eval.property("Loop").as_deref(), Some("x"));
        assert_eq!(eval.property("PingA").as_deref(), Some("b"));
    }

    #[test]
    fn leaves_property_functions_and_unterminated_refs() {
        let globals = BTreeMap::new();
        let doc = doc();
        let eval = Evaluator::new(&doc, &globals);
        assert_eq!(eval.expand("$([System.IO.Path]::Combine)"), "$([System.IO.Path]::Combine)");
        assert_eq!(eval.expand("a$(Root"), "a$(Root");
    }

    #[test]
    fn evaluated_default_applies_when_absent_or_empty() {
        let globals = BTreeMap::new();
        let doc = doc();
        assert_eq!(evaluated_property_or(&doc, &globals, "X", "def"), "def");
        assert_eq!(evaluated_property_or(&doc, &globals, "Empty", "def"), "def");
        assert_eq!(evaluated_property_or(&doc, &globals, "OutDir", "def"), "out/bin");
    }

    #[test]
    fn raw_reads_authored_text() {
        let doc = doc();
        assert_eq!(raw_property(&doc, "OutDir"), "$(Root)/bin");
        assert_eq!(raw_property(&doc, "Missing"), "");
        assert_eq!(raw_property_or(&doc, "Missing", "def"), "def");
        assert_eq!(raw_property_or(&doc, "Empty", "def"), "def");
        assert_eq!(raw_property_or(&doc, "Root", "def"), "out");
    }
}
