//! Document ingestion from files, directories, and raw text.
//!
//! The [`DocumentProcessor`] turns sources into normalized [`Document`]s
//! with content-derived identifiers and source metadata. Ingestion-time
//! failures (missing file, unsupported extension, unreadable content) are
//! soft: they are logged and produce empty or partial results, never errors.

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use glob::Pattern;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{Document, META_DOC_ID, META_SOURCE};
use crate::error::{RagError, Result};

/// Extensions always loaded as plain text.
const TEXT_EXTENSIONS: [&str; 14] = [
    "txt", "md", "markdown", "py", "js", "rs", "toml", "json", "yaml", "yml", "xml", "html",
    "css", "sql",
];

/// The source value stamped on documents created from raw text.
pub const TEXT_INPUT_SOURCE: &str = "text_input";

/// Compute the content-addressed identifier for a piece of text.
///
/// Identical content always yields the identical id (lowercase hex SHA-256),
/// which lets callers detect re-ingestion of the same content. The processor
/// itself does not deduplicate.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)
}

/// Format-specific loading strategy for a registered extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loader {
    Text,
    Markdown,
    #[cfg(feature = "pdf")]
    Pdf,
}

/// Loads files, directories, and raw text into [`Document`]s.
///
/// # Example
///
/// ```rust,ignore
/// use agent_rag::DocumentProcessor;
///
/// let processor = DocumentProcessor::new();
/// let docs = processor.process_file("notes.md", None);
/// let valid = processor.validate_documents(docs);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DocumentProcessor;

impl DocumentProcessor {
    /// Create a new document processor.
    pub fn new() -> Self {
        Self
    }

    /// Look up the loader registered for a path's extension.
    fn loader_for(&self, path: &Path) -> Option<Loader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Loader::Markdown),
            #[cfg(feature = "pdf")]
            "pdf" => Some(Loader::Pdf),
            _ if TEXT_EXTENSIONS.contains(&ext.as_str()) => Some(Loader::Text),
            _ => None,
        }
    }

    /// Whether the file's extension has a registered loader.
    pub fn is_supported(&self, path: impl AsRef<Path>) -> bool {
        self.loader_for(path.as_ref()).is_some()
    }

    /// The extensions with a registered loader, without leading dots.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = TEXT_EXTENSIONS.to_vec();
        #[cfg(feature = "pdf")]
        extensions.push("pdf");
        extensions
    }

    /// Process a single file into documents.
    ///
    /// Fails soft: a missing file, an unsupported extension, or a loader
    /// failure logs a warning and returns an empty list. On success every
    /// returned document carries filesystem metadata, a content-derived
    /// `doc_id`, and any caller-supplied metadata (caller wins on conflicts).
    pub fn process_file(
        &self,
        path: impl AsRef<Path>,
        extra_metadata: Option<&HashMap<String, String>>,
    ) -> Vec<Document> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "file not found, skipping");
            return Vec::new();
        }
        let Some(loader) = self.loader_for(path) else {
            warn!(path = %path.display(), "unsupported file type, skipping");
            return Vec::new();
        };

        let mut documents = match self.load(loader, path) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load file, skipping");
                return Vec::new();
            }
        };

        let base_metadata = self.file_metadata(path);
        for doc in &mut documents {
            let doc_id = content_hash(&doc.content);
            let mut metadata = base_metadata.clone();
            metadata.insert(META_DOC_ID.to_string(), doc_id);
            // Loader-provided fields survive unless the caller overrides them.
            metadata.extend(doc.metadata.drain());
            if let Some(extra) = extra_metadata {
                metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            doc.metadata = metadata;
        }

        info!(path = %path.display(), count = documents.len(), "processed file");
        documents
    }

    /// Process all supported files in a directory.
    ///
    /// Files are enumerated recursively unless `recursive` is false,
    /// intersected with `include_patterns` when given, and pruned by
    /// `exclude_patterns`. A missing directory fails soft with an empty list.
    pub fn process_directory(
        &self,
        dir: impl AsRef<Path>,
        recursive: bool,
        include_patterns: Option<&[String]>,
        exclude_patterns: Option<&[String]>,
    ) -> Vec<Document> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            warn!(path = %dir.display(), "directory not found, skipping");
            return Vec::new();
        }

        let include = compile_patterns(include_patterns);
        let exclude = compile_patterns(exclude_patterns);

        let walker = if recursive { WalkDir::new(dir) } else { WalkDir::new(dir).max_depth(1) };

        let mut documents = Vec::new();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(path);
            if let Some(include) = &include {
                if !include.iter().any(|p| matches(p, relative)) {
                    continue;
                }
            }
            if let Some(exclude) = &exclude {
                if exclude.iter().any(|p| matches(p, relative)) {
                    continue;
                }
            }
            if self.is_supported(path) {
                documents.extend(self.process_file(path, None));
            }
        }

        info!(path = %dir.display(), count = documents.len(), "processed directory");
        documents
    }

    /// Wrap raw text in a document with `source = "text_input"`.
    pub fn process_text(
        &self,
        text: impl Into<String>,
        metadata: Option<&HashMap<String, String>>,
    ) -> Document {
        let content = text.into();
        let mut doc_metadata = HashMap::from([
            (META_SOURCE.to_string(), TEXT_INPUT_SOURCE.to_string()),
            (META_DOC_ID.to_string(), content_hash(&content)),
            ("content_length".to_string(), content.chars().count().to_string()),
        ]);
        if let Some(extra) = metadata {
            doc_metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Document::new(content, doc_metadata)
    }

    /// Drop documents whose trimmed content is empty and ensure every
    /// survivor carries a `doc_id`.
    pub fn validate_documents(&self, documents: Vec<Document>) -> Vec<Document> {
        let total = documents.len();
        let valid: Vec<Document> = documents
            .into_iter()
            .filter_map(|mut doc| {
                if doc.content.trim().is_empty() {
                    warn!("skipping document with empty content");
                    return None;
                }
                doc.metadata
                    .entry(META_DOC_ID.to_string())
                    .or_insert_with(|| content_hash(&doc.content));
                Some(doc)
            })
            .collect();
        debug!(valid = valid.len(), total, "validated documents");
        valid
    }

    /// Derive descriptive metadata from document content.
    ///
    /// Always reports `content_length`, `word_count`, and `line_count`.
    /// For file-backed content a best-effort `extracted_title` is added:
    /// the first markdown heading, or the first short non-heading line
    /// within the first ten lines.
    pub fn extract_metadata_from_content(
        &self,
        content: &str,
        from_file: bool,
    ) -> HashMap<String, String> {
        let mut metadata = HashMap::from([
            ("content_length".to_string(), content.chars().count().to_string()),
            ("word_count".to_string(), content.split_whitespace().count().to_string()),
            ("line_count".to_string(), (content.lines().count().max(1)).to_string()),
        ]);

        if from_file {
            for line in content.lines().take(10) {
                let line = line.trim();
                if let Some(title) = line.strip_prefix("# ") {
                    metadata.insert("extracted_title".to_string(), title.trim().to_string());
                    break;
                }
                if !line.is_empty() && !line.starts_with('#') {
                    if line.chars().count() < 100 {
                        metadata.insert("extracted_title".to_string(), line.to_string());
                    }
                    break;
                }
            }
        }

        metadata
    }

    fn load(&self, loader: Loader, path: &Path) -> Result<Vec<Document>> {
        match loader {
            Loader::Text => self.load_text(path),
            Loader::Markdown => self.load_markdown(path),
            #[cfg(feature = "pdf")]
            Loader::Pdf => self.load_pdf(path),
        }
    }

    fn load_text(&self, path: &Path) -> Result<Vec<Document>> {
        let content = std::fs::read_to_string(path)?;
        Ok(vec![Document::new(content, HashMap::new())])
    }

    /// Load a markdown file, splitting off YAML front matter into metadata.
    ///
    /// Any front-matter parse failure falls back to the plain text loader
    /// rather than failing the whole operation.
    fn load_markdown(&self, path: &Path) -> Result<Vec<Document>> {
        match self.try_load_markdown(path) {
            Ok(docs) => Ok(docs),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "markdown loader failed, using text loader");
                self.load_text(path)
            }
        }
    }

    fn try_load_markdown(&self, path: &Path) -> Result<Vec<Document>> {
        let raw = std::fs::read_to_string(path)?;

        let Some(rest) = raw.strip_prefix("---\n") else {
            return Ok(vec![Document::new(raw, HashMap::new())]);
        };
        let Some(end) = rest.find("\n---") else {
            return Err(RagError::DocumentError("unterminated front matter".to_string()));
        };

        let mut metadata = HashMap::new();
        for line in rest[..end].lines() {
            if let Some((key, value)) = line.split_once(':') {
                metadata.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        let body_start = end + "\n---".len();
        let body = rest[body_start..].trim_start_matches('\n').to_string();
        Ok(vec![Document::new(body, metadata)])
    }

    #[cfg(feature = "pdf")]
    fn load_pdf(&self, path: &Path) -> Result<Vec<Document>> {
        let content = pdf_extract::extract_text(path)
            .map_err(|e| RagError::DocumentError(format!("pdf extraction failed: {e}")))?;
        Ok(vec![Document::new(content, HashMap::new())])
    }

    /// Filesystem metadata for a file: source path, name, extension, size,
    /// and RFC 3339 timestamps where the platform provides them.
    fn file_metadata(&self, path: &Path) -> HashMap<String, String> {
        let mut metadata = HashMap::from([
            (META_SOURCE.to_string(), path.display().to_string()),
            (
                "filename".to_string(),
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            ),
            (
                "file_extension".to_string(),
                path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default(),
            ),
        ]);

        if let Ok(stat) = std::fs::metadata(path) {
            metadata.insert("file_size".to_string(), stat.len().to_string());
            if let Ok(created) = stat.created() {
                metadata.insert("created_at".to_string(), to_rfc3339(created));
            }
            if let Ok(modified) = stat.modified() {
                metadata.insert("modified_at".to_string(), to_rfc3339(modified));
            }
        }

        metadata
    }
}

fn to_rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

fn compile_patterns(patterns: Option<&[String]>) -> Option<Vec<Pattern>> {
    let patterns = patterns?;
    let compiled: Vec<Pattern> = patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %p, error = %e, "ignoring invalid glob pattern");
                None
            }
        })
        .collect();
    Some(compiled)
}

/// Match a pattern against the relative path and the bare file name, so
/// `*.md` matches files in subdirectories too.
fn matches(pattern: &Pattern, relative: &Path) -> bool {
    if pattern.matches_path(relative) {
        return true;
    }
    relative
        .file_name()
        .map(|name| pattern.matches(&name.to_string_lossy()))
        .unwrap_or(false)
}
