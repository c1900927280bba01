//! On-disk layout for raw artifacts, canonical records, and rule documents
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   raw/
//!     images/           <event_id>_<slug>.jpg
//!     ocr_text/         <event_id>.txt / <event_id>.json
//!     ingest_events/    <event_id>.json
//!   canonical/
//!     receipts/<year>/  <date>_<merchant-slug>_<receipt-id>.json
//!   rules/              normalization.yml, merchants.yml, categories.yml
//! ```
//!
//! Every artifact path is keyed by a per-call uuid, so concurrent ingest
//! calls never contend for the same file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub canonical_dir: PathBuf,
    pub rules_dir: PathBuf,
}

impl DataPaths {
    /// Lay out the standard directories under an explicit root.
    pub fn from_root(root: &Path) -> Self {
        let data_dir = match env::var("KASSENBON_DATA_DIR") {
            Ok(value) => resolve_from(root, &value),
            Err(_) => root.join("data"),
        };
        let rules_dir = match env::var("KASSENBON_RULES_DIR") {
            Ok(value) => resolve_from(root, &value),
            Err(_) => data_dir.join("rules"),
        };

        Self {
            root: root.to_path_buf(),
            raw_dir: data_dir.join("raw"),
            canonical_dir: data_dir.join("canonical"),
            data_dir,
            rules_dir,
        }
    }

    /// Default root: the platform data directory (~/.local/share/kassenbon
    /// on Linux), falling back to the current directory.
    pub fn detect() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join("kassenbon"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_root(&root)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.raw_dir.join("images"))?;
        fs::create_dir_all(self.raw_dir.join("ocr_text"))?;
        fs::create_dir_all(self.raw_dir.join("ingest_events"))?;
        fs::create_dir_all(self.canonical_dir.join("receipts"))?;
        Ok(())
    }

    pub fn raw_text_path(&self, ingest_event_id: &str) -> PathBuf {
        self.raw_dir.join("ocr_text").join(format!("{ingest_event_id}.txt"))
    }

    pub fn raw_json_path(&self, ingest_event_id: &str) -> PathBuf {
        self.raw_dir.join("ocr_text").join(format!("{ingest_event_id}.json"))
    }

    pub fn raw_image_path(&self, ingest_event_id: &str, stem: &str, suffix: &str) -> PathBuf {
        self.raw_dir
            .join("images")
            .join(format!("{ingest_event_id}_{stem}{suffix}"))
    }

    pub fn ingest_event_path(&self, ingest_event_id: &str) -> PathBuf {
        self.raw_dir
            .join("ingest_events")
            .join(format!("{ingest_event_id}.json"))
    }

    /// Express a path relative to the root for reporting; absolute paths
    /// outside the root are returned as-is.
    pub fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Resolve a (possibly relative) reported path back against the root.
    pub fn abs(&self, rel_or_abs: &str) -> PathBuf {
        let p = PathBuf::from(rel_or_abs);
        if p.is_absolute() {
            p
        } else {
            self.root.join(p)
        }
    }
}

fn resolve_from(root: &Path, value: &str) -> PathBuf {
    let candidate = PathBuf::from(value);
    if candidate.is_absolute() {
        candidate
    } else {
        root.join(candidate)
    }
}
