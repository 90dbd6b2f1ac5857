//! Training catalogs.
//!
//! A catalog is an ordered list of submittable items (models or
//! datasets) loaded once at startup from a `name|url` text file, with a
//! small built-in fallback when the file is missing or yields nothing.
//! Catalogs are held read-only for the process lifetime; duplicates are
//! allowed and order is preserved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Item types
// ---------------------------------------------------------------------------

/// Which catalog an item belongs to. Serialized lowercase — this is the
/// `fileType` value the training endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Model,
    Dataset,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Model => write!(f, "model"),
            ItemKind::Dataset => write!(f, "dataset"),
        }
    }
}

/// One submittable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub kind: ItemKind,
    pub url: String,
}

impl CatalogItem {
    pub fn new(name: &str, kind: ItemKind, url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            url: url.to_string(),
        }
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.name)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse catalog file contents.
///
/// One entry per line, `name|url`. Blank lines and `#` comments are
/// ignored; lines without exactly one `|` separator are silently
/// skipped. Fields are trimmed.
pub fn parse_catalog(contents: &str, kind: ItemKind) -> Vec<CatalogItem> {
    let mut items = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() != 2 {
            continue;
        }
        items.push(CatalogItem::new(parts[0].trim(), kind, parts[1].trim()));
    }
    items
}

/// Load a catalog from `path`, falling back to `defaults` when the file
/// is absent, unreadable, or contains no valid entries.
pub fn load_catalog(path: &str, kind: ItemKind, defaults: Vec<CatalogItem>) -> Vec<CatalogItem> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let items = parse_catalog(&contents, kind);
            if items.is_empty() {
                warn!(path, %kind, "Catalog file has no valid entries, using defaults");
                defaults
            } else {
                info!(path, %kind, count = items.len(), "Catalog loaded");
                items
            }
        }
        Err(e) => {
            warn!(path, %kind, error = %e, "Catalog file not readable, using defaults");
            defaults
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in defaults
// ---------------------------------------------------------------------------

/// Fallback model catalog used when `models.txt` yields nothing.
pub fn default_models() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(
            "microsoft/VibeVoice-Realtime-0.5B",
            ItemKind::Model,
            "https://huggingface.co/microsoft/VibeVoice-Realtime-0.5B",
        ),
        CatalogItem::new(
            "Tongyi-MAI/Z-Image-Turbo",
            ItemKind::Model,
            "https://huggingface.co/Tongyi-MAI/Z-Image-Turbo",
        ),
        CatalogItem::new(
            "zai-org/GLM-4.6V-Flash",
            ItemKind::Model,
            "https://huggingface.co/zai-org/GLM-4.6V-Flash",
        ),
    ]
}

/// Fallback dataset catalog used when `datasets.txt` yields nothing.
pub fn default_datasets() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(
            "nvidia/PhysicalAI-Autonomous-Vehicles",
            ItemKind::Dataset,
            "https://huggingface.co/datasets/nvidia/PhysicalAI-Autonomous-Vehicles",
        ),
        CatalogItem::new(
            "HuggingFaceFW/fineweb-edu",
            ItemKind::Dataset,
            "https://huggingface.co/datasets/HuggingFaceFW/fineweb-edu",
        ),
        CatalogItem::new(
            "OpenGVLab/InternVid",
            ItemKind::Dataset,
            "https://huggingface.co/datasets/OpenGVLab/InternVid",
        ),
    ]
}

/// Write a commented template catalog file if none exists, so operators
/// have something to edit. Failure is non-fatal.
pub fn write_default_file(path: &str, kind: ItemKind) {
    if Path::new(path).exists() {
        return;
    }
    let defaults = match kind {
        ItemKind::Model => default_models(),
        ItemKind::Dataset => default_datasets(),
    };
    let mut contents = format!(
        "# Training {kind}s\n# Format: name|url\n# One entry per line\n\n"
    );
    for item in &defaults {
        contents.push_str(&format!("{}|{}\n", item.name, item.url));
    }
    match std::fs::write(path, contents) {
        Ok(()) => info!(path, %kind, "Created default catalog file"),
        Err(e) => warn!(path, %kind, error = %e, "Could not create default catalog file"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
