use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::ast::AstNode;
use crate::error::{AstrefError, Result};
use crate::identifiers::{IdentifierRecord, IdentifierSet};
use crate::splitter::split_documents;
use crate::walker::collect_identifiers;

/// How a dump that is not a valid sequence of JSON documents is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip the file with a warning; none of its documents contribute.
    #[default]
    Tolerant,
    /// Fail the whole run.
    Strict,
}

/// Identifiers found in one blob.
#[derive(Debug, Default)]
pub struct BlobContribution {
    pub documents: usize,
    pub identifiers: IdentifierSet,
}

/// Decodes every document in `blob` and walks it.
///
/// Decode failures surface as [`AstrefError::Json`].
pub fn extract_blob(blob: &[u8]) -> Result<BlobContribution> {
    let mut contribution = BlobContribution::default();
    for document in split_documents::<AstNode>(blob) {
        let root = document?;
        collect_identifiers(&root, &mut contribution.identifiers)?;
        contribution.documents += 1;
    }
    Ok(contribution)
}

/// Like [`extract_blob`], with decode failures reported as
/// [`AstrefError::MalformedDump`] naming `path`. Bytes that are not UTF-8
/// are a decode failure, not an I/O error.
pub fn extract_file(path: &Path) -> Result<BlobContribution> {
    let blob = std::fs::read(path)?;
    extract_blob(&blob).map_err(|err| match err {
        AstrefError::Json(source) => AstrefError::MalformedDump {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub files: usize,
    pub documents: usize,
    pub identifiers: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Union of the identifiers of every processed document.
#[derive(Debug, Default)]
pub struct IdentifierAggregator {
    mode: ParseMode,
    identifiers: IdentifierSet,
    files: usize,
    documents: usize,
    skipped: Vec<SkippedFile>,
}

impl IdentifierAggregator {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, contribution: BlobContribution) {
        self.documents += contribution.documents;
        self.identifiers.extend(contribution.identifiers);
    }

    /// Processes `paths` in parallel and merges them in input order.
    ///
    /// A file only contributes if all of it decoded and walked. In tolerant
    /// mode a malformed file is skipped; I/O errors and unknown declaration
    /// kinds are fatal in either mode.
    pub fn add_files(&mut self, paths: &[PathBuf]) -> Result<()> {
        let results: Vec<(&PathBuf, Result<BlobContribution>)> = paths
            .par_iter()
            .map(|path| (path, extract_file(path)))
            .collect();

        for (path, result) in results {
            match result {
                Ok(contribution) => {
                    debug!(
                        "{}: {} document(s), {} identifier(s)",
                        path.display(),
                        contribution.documents,
                        contribution.identifiers.len()
                    );
                    self.files += 1;
                    self.merge(contribution);
                }
                Err(err) if err.is_malformed_dump() && self.mode == ParseMode::Tolerant => {
                    warn!("Skipping {}", err);
                    self.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(AstrefError::Io(err)) => {
                    return Err(AstrefError::Io(std::io::Error::new(
                        err.kind(),
                        format!("{}: {err}", path.display()),
                    )));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn into_records(self) -> Vec<IdentifierRecord> {
        self.identifiers.into_iter().collect()
    }

    pub fn summary(&self) -> AggregateSummary {
        AggregateSummary {
            files: self.files,
            documents: self.documents,
            identifiers: self.identifiers.len(),
            skipped: self.skipped.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::Category;

    const FOO_AND_X: &str = r#"{"kind":"FunctionDecl","inner":[{"kind":"DeclRefExpr","referencedDecl":{"name":"foo","kind":"FunctionDecl"}},{"kind":"DeclRefExpr","referencedDecl":{"name":"x","kind":"VarDecl"}}]}"#;

    #[test]
    fn blob_with_two_documents_unions_both() {
        let blob = format!(
            "{FOO_AND_X}{}",
            r#"{"kind":"DeclRefExpr","referencedDecl":{"name":"RED","kind":"EnumConstantDecl"}}"#
        );

        let contribution = extract_blob(blob.as_bytes()).unwrap();

        assert_eq!(contribution.documents, 2);
        assert_eq!(contribution.identifiers.len(), 3);
    }

    #[test]
    fn aggregation_deduplicates_across_blobs() {
        let mut aggregator = IdentifierAggregator::new(ParseMode::Strict);
        aggregator.merge(extract_blob(FOO_AND_X.as_bytes()).unwrap());
        aggregator.merge(extract_blob(FOO_AND_X.as_bytes()).unwrap());

        assert_eq!(aggregator.summary().documents, 2);
        assert_eq!(
            aggregator.into_records(),
            vec![
                IdentifierRecord::new("foo", Category::Function),
                IdentifierRecord::new("x", Category::Variable),
            ]
        );
    }

    #[test]
    fn decode_error_in_blob_is_json_error() {
        let err = extract_blob(br#"{"kind":"#).unwrap_err();
        assert!(matches!(err, AstrefError::Json(_)));
    }
}
