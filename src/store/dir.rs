//! Content directory backed store.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use jwalk::WalkDir;
use regex::Regex;

use super::{ContentDocument, ContentStore, StoreError};
use crate::{debug, log};
use crate::utils::html::inner_text;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title(?:\s[^>]*)?>(.*?)</title\s*>").unwrap());
static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1(?:\s[^>]*)?>(.*?)</h1\s*>").unwrap());
static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t#]*$").unwrap());

/// Documents are the files under `root` with one of `extensions`.
///
/// Anything whose relative path has a component starting with `_` or `.`
/// is a draft and never listed.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_document(&self, rel: &Path) -> bool {
        let published = rel.components().all(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                !name.starts_with('_') && !name.starts_with('.')
            }
            _ => false,
        });
        published
            && rel
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    /// File path for a document id, rejecting ids that leave the root.
    fn path_of(&self, id: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(id);
        let inside = !id.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !inside || !self.is_document(rel) {
            return Err(StoreError::UnknownDocument(id.to_string()));
        }
        let path = self.root.join(rel);
        if !path.is_file() {
            return Err(StoreError::UnknownDocument(id.to_string()));
        }
        Ok(path)
    }
}

impl ContentStore for DirStore {
    /// Unreadable files and walk errors are logged and skipped.
    fn list_published(&self) -> Result<Vec<ContentDocument>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::MissingRoot(self.root.clone()));
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).skip_hidden(false).sort(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log!("warning"; "skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            if !self.is_document(rel) {
                continue;
            }

            let body = match fs::read_to_string(&path) {
                Ok(body) => body,
                Err(e) => {
                    log!("warning"; "skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let id = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let stem = rel.file_stem().map(|s| s.to_string_lossy().into_owned());
            let title = extract_title(&body).or(stem).unwrap_or_else(|| id.clone());
            docs.push(ContentDocument { id, title, body });
        }

        debug!("store"; "{} documents under {}", docs.len(), self.root.display());
        Ok(docs)
    }

    fn update_body(&self, id: &str, body: &str) -> Result<(), StoreError> {
        let path = self.path_of(id)?;
        fs::write(&path, body).map_err(|e| StoreError::Io(path, e))
    }
}

/// `<title>`, then `<h1>`, then a markdown `# ` heading.
fn extract_title(body: &str) -> Option<String> {
    [&*TITLE, &*H1, &*MD_HEADING]
        .into_iter()
        .filter_map(|re| re.captures(body))
        .map(|caps| inner_text(&caps[1]))
        .find(|title| !title.is_empty())
}
