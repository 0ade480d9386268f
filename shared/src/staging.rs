//! Evidence staging buffer.
//!
//! Files chosen in the shell are held here as references (name, size, local
//! uri) until the report is submitted. The bytes never enter the core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::i18n::Translate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StagedFileId(Uuid);

impl StagedFileId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StagedFileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StagedFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A file the user picked, as reported by the shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    /// Shell-local handle to the content (path or `file://` url).
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub id: StagedFileId,
    pub name: String,
    pub size_bytes: u64,
    pub uri: String,
}

impl From<FileCandidate> for StagedFile {
    fn from(candidate: FileCandidate) -> Self {
        Self {
            id: StagedFileId::new(),
            name: candidate.name,
            size_bytes: candidate.size_bytes,
            uri: candidate.uri,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
    /// Lower-case extensions with the leading dot. Empty accepts anything.
    pub accepted_types: Vec<String>,
}

impl StagingLimits {
    /// Whether already staged files would have passed under these limits.
    #[must_use]
    pub fn admit(&self, files: &[StagedFile]) -> bool {
        files.len() <= self.max_files
            && files
                .iter()
                .all(|f| f.size_bytes <= self.max_file_bytes && self.accepts(&f.name))
    }

    #[must_use]
    pub fn accepts(&self, file_name: &str) -> bool {
        if self.accepted_types.is_empty() {
            return true;
        }
        let lower = file_name.to_lowercase();
        self.accepted_types
            .iter()
            .any(|ext| lower.len() > ext.len() && lower.ends_with(ext.as_str()))
    }
}

impl Default for StagingLimits {
    fn default() -> Self {
        crate::config::PortalConfig::default().staging_limits()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StagingError {
    #[error("cannot stage {attempted} more file(s) with {current} already staged (max {max})")]
    TooManyFiles {
        max: usize,
        current: usize,
        attempted: usize,
        files: Vec<String>,
    },
    #[error("files over the {max_bytes} byte limit: {files:?}")]
    OversizedFiles { max_bytes: u64, files: Vec<String> },
    #[error("unsupported file types: {files:?}")]
    UnsupportedType { files: Vec<String> },
}

impl StagingError {
    #[must_use]
    pub fn user_message(&self, t: &dyn Translate) -> String {
        match self {
            Self::TooManyFiles { max, .. } => {
                t.translate_with("fileUploader.tooManyFiles", &[("max", &max.to_string())])
            }
            Self::OversizedFiles { max_bytes, files } => t.translate_with(
                "fileUploader.oversized",
                &[("size", &format_bytes(*max_bytes)), ("files", &files.join(", "))],
            ),
            Self::UnsupportedType { files } => {
                t.translate_with("fileUploader.unsupported", &[("files", &files.join(", "))])
            }
        }
    }
}

/// Ordered set of staged evidence plus the last rejection, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvidenceStager {
    limits: StagingLimits,
    files: Vec<StagedFile>,
    error: Option<StagingError>,
}

impl EvidenceStager {
    #[must_use]
    pub fn new(limits: StagingLimits) -> Self {
        Self {
            limits,
            files: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &StagingLimits {
        &self.limits
    }

    /// Swaps in new limits unless the staged files would break them, in
    /// which case the current limits stay and false is returned.
    pub fn set_limits(&mut self, limits: StagingLimits) -> bool {
        if !limits.admit(&self.files) {
            return false;
        }
        self.limits = limits;
        true
    }

    #[must_use]
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    #[must_use]
    pub fn error(&self) -> Option<&StagingError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.files.len() >= self.limits.max_files
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Stages a batch. The batch is accepted whole or not at all; the
    /// returned error is also kept for display until dismissed.
    pub fn add_files(&mut self, candidates: Vec<FileCandidate>) -> Result<usize, StagingError> {
        match self.check_batch(&candidates) {
            Ok(()) => {
                let added = candidates.len();
                self.files.extend(candidates.into_iter().map(StagedFile::from));
                self.error = None;
                debug!(added, staged = self.files.len(), "evidence staged");
                Ok(added)
            }
            Err(e) => {
                warn!(error = %e, staged = self.files.len(), "evidence batch rejected");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn check_batch(&self, candidates: &[FileCandidate]) -> Result<(), StagingError> {
        let current = self.files.len();
        if current + candidates.len() > self.limits.max_files {
            return Err(StagingError::TooManyFiles {
                max: self.limits.max_files,
                current,
                attempted: candidates.len(),
                files: candidates.iter().map(|c| c.name.clone()).collect(),
            });
        }

        let oversized: Vec<String> = candidates
            .iter()
            .filter(|c| c.size_bytes > self.limits.max_file_bytes)
            .map(|c| c.name.clone())
            .collect();
        if !oversized.is_empty() {
            return Err(StagingError::OversizedFiles {
                max_bytes: self.limits.max_file_bytes,
                files: oversized,
            });
        }

        let unsupported: Vec<String> = candidates
            .iter()
            .filter(|c| !self.limits.accepts(&c.name))
            .map(|c| c.name.clone())
            .collect();
        if !unsupported.is_empty() {
            return Err(StagingError::UnsupportedType { files: unsupported });
        }

        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Option<StagedFile> {
        if index >= self.files.len() {
            debug!(index, staged = self.files.len(), "remove index out of range");
            return None;
        }
        self.error = None;
        Some(self.files.remove(index))
    }

    pub fn remove(&mut self, id: StagedFileId) -> Option<StagedFile> {
        match self.files.iter().position(|f| f.id == id) {
            Some(index) => self.remove_at(index),
            None => {
                debug!(file_id = %id, "remove of unknown staged file ignored");
                None
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// 1024-based size with two decimals: `1048576` is `"1.00 MB"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    const MB: u64 = 1024 * 1024;

    fn candidate(name: &str, size_bytes: u64) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            size_bytes,
            uri: format!("file:///tmp/{name}"),
        }
    }

    fn stager() -> EvidenceStager {
        EvidenceStager::new(StagingLimits::default())
    }

    mod format_tests {
        use super::*;

        #[test]
        fn formats_with_two_decimals() {
            assert_eq!(format_bytes(0), "0 Bytes");
            assert_eq!(format_bytes(512), "512.00 Bytes");
            assert_eq!(format_bytes(1024), "1.00 KB");
            assert_eq!(format_bytes(1536), "1.50 KB");
            assert_eq!(format_bytes(MB), "1.00 MB");
            assert_eq!(format_bytes(5 * MB), "5.00 MB");
            assert_eq!(format_bytes(3 * 1024 * MB), "3.00 GB");
        }

        #[test]
        fn caps_at_gigabytes() {
            assert_eq!(format_bytes(2048 * 1024 * MB), "2048.00 GB");
        }
    }

    mod batch_tests {
        use super::*;

        #[test]
        fn accepts_batch_in_order() {
            let mut s = stager();
            let added = s
                .add_files(vec![candidate("a.png", 10), candidate("b.pdf", 20)])
                .unwrap();
            assert_eq!(added, 2);
            let names: Vec<_> = s.files().iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, ["a.png", "b.pdf"]);
            assert_eq!(s.total_bytes(), 30);
            assert!(s.error().is_none());
        }

        #[test]
        fn count_limit_rejects_whole_batch() {
            let mut s = stager();
            s.add_files(vec![candidate("1.png", 1), candidate("2.png", 1), candidate("3.png", 1)])
                .unwrap();
            let err = s
                .add_files(vec![candidate("4.png", 1), candidate("5.png", 1), candidate("6.png", 1)])
                .unwrap_err();
            assert_matches!(err, StagingError::TooManyFiles { max: 5, current: 3, attempted: 3, .. });
            assert_eq!(s.files().len(), 3);
            assert_eq!(s.error(), Some(&err));
        }

        #[test]
        fn count_check_runs_before_size_check() {
            let mut s = EvidenceStager::new(StagingLimits {
                max_files: 1,
                ..StagingLimits::default()
            });
            let err = s
                .add_files(vec![candidate("a.png", 10 * MB), candidate("b.png", 1)])
                .unwrap_err();
            assert_matches!(err, StagingError::TooManyFiles { .. });
        }

        #[test]
        fn oversize_names_every_offender() {
            let mut s = stager();
            let err = s
                .add_files(vec![
                    candidate("small.png", MB),
                    candidate("big.pdf", 6 * MB),
                    candidate("huge.docx", 60 * MB),
                ])
                .unwrap_err();
            assert_eq!(
                err,
                StagingError::OversizedFiles {
                    max_bytes: 5 * MB,
                    files: vec!["big.pdf".into(), "huge.docx".into()],
                }
            );
            assert!(s.files().is_empty());
        }

        #[test]
        fn exactly_max_size_is_accepted() {
            let mut s = stager();
            assert!(s.add_files(vec![candidate("edge.jpg", 5 * MB)]).is_ok());
        }

        #[test]
        fn unsupported_types_are_rejected_case_insensitively() {
            let mut s = stager();
            assert!(s.add_files(vec![candidate("SHOT.PNG", 1)]).is_ok());
            let err = s
                .add_files(vec![candidate("notes.txt", 1), candidate("run.exe", 1)])
                .unwrap_err();
            assert_eq!(
                err,
                StagingError::UnsupportedType {
                    files: vec!["notes.txt".into(), "run.exe".into()],
                }
            );
            assert!(!s.limits().accepts(".png"));
        }

        #[test]
        fn success_clears_previous_error() {
            let mut s = stager();
            let _ = s.add_files(vec![candidate("big.png", 6 * MB)]);
            assert!(s.error().is_some());
            s.add_files(vec![candidate("ok.png", 1)]).unwrap();
            assert!(s.error().is_none());
        }
    }

    mod removal_tests {
        use super::*;

        #[test]
        fn remove_by_id_and_index() {
            let mut s = stager();
            s.add_files(vec![candidate("a.png", 1), candidate("b.png", 2), candidate("c.png", 3)])
                .unwrap();
            let b = s.files()[1].id;
            assert_eq!(s.remove(b).map(|f| f.name), Some("b.png".to_string()));
            assert_eq!(s.remove_at(0).map(|f| f.name), Some("a.png".to_string()));
            assert_eq!(s.files().len(), 1);
        }

        #[test]
        fn unknown_removals_are_no_ops() {
            let mut s = stager();
            s.add_files(vec![candidate("a.png", 1)]).unwrap();
            assert!(s.remove(StagedFileId::new()).is_none());
            assert!(s.remove_at(3).is_none());
            assert_eq!(s.files().len(), 1);
        }

        #[test]
        fn removal_clears_error() {
            let mut s = stager();
            s.add_files(vec![candidate("a.png", 1)]).unwrap();
            let _ = s.add_files(vec![candidate("b.exe", 1)]);
            s.remove_at(0);
            assert!(s.error().is_none());
        }

        #[test]
        fn tighter_limits_wait_for_an_emptier_buffer() {
            let mut s = stager();
            s.add_files(vec![candidate("a.png", 1), candidate("b.png", 1), candidate("c.pdf", 2 * MB)])
                .unwrap();

            let one_file = StagingLimits {
                max_files: 1,
                ..StagingLimits::default()
            };
            assert!(!s.set_limits(one_file.clone()));
            assert_eq!(s.limits().max_files, 5);
            assert_eq!(s.files().len(), 3);

            let small_files = StagingLimits {
                max_file_bytes: MB,
                ..StagingLimits::default()
            };
            assert!(!s.set_limits(small_files));

            s.remove_at(2).unwrap();
            s.remove_at(1).unwrap();
            assert!(s.set_limits(one_file));
            assert_eq!(s.limits().max_files, 1);
        }

        #[test]
        fn dismiss_keeps_files() {
            let mut s = stager();
            s.add_files(vec![candidate("a.png", 1)]).unwrap();
            let _ = s.add_files(vec![candidate("b.exe", 1)]);
            s.dismiss_error();
            assert!(s.error().is_none());
            assert_eq!(s.files().len(), 1);
        }

        #[test]
        fn re_adding_removed_file_formats_identically() {
            let mut s = stager();
            s.add_files(vec![candidate("report.pdf", MB)]).unwrap();
            let before = format_bytes(s.files()[0].size_bytes);
            let removed = s.remove_at(0).unwrap();
            s.add_files(vec![FileCandidate {
                name: removed.name,
                size_bytes: removed.size_bytes,
                uri: removed.uri,
            }])
            .unwrap();
            assert_eq!(format_bytes(s.files()[0].size_bytes), before);
            assert_eq!(before, "1.00 MB");
        }
    }

    mod message_tests {
        use super::*;
        use crate::i18n::Catalog;

        #[test]
        fn oversize_message_names_limit_and_files() {
            let err = StagingError::OversizedFiles {
                max_bytes: 5 * MB,
                files: vec!["big.pdf".into()],
            };
            let text = err.user_message(&Catalog::default());
            assert!(text.contains("5.00 MB"), "{text}");
            assert!(text.contains("big.pdf"), "{text}");
        }
    }

    proptest! {
        #[test]
        fn staged_files_never_exceed_limits(
            batches in prop::collection::vec(
                prop::collection::vec((0u64..8 * MB, prop::bool::ANY), 0..4),
                0..6,
            )
        ) {
            let mut s = stager();
            for (n, batch) in batches.into_iter().enumerate() {
                let before = s.files().to_vec();
                let candidates: Vec<_> = batch
                    .into_iter()
                    .enumerate()
                    .map(|(i, (size, pdf))| {
                        candidate(&format!("f{n}-{i}.{}", if pdf { "pdf" } else { "bin" }), size)
                    })
                    .collect();
                if s.add_files(candidates).is_err() {
                    prop_assert_eq!(s.files(), before.as_slice());
                }
                prop_assert!(s.files().len() <= 5);
                prop_assert!(s.files().iter().all(|f| f.size_bytes <= 5 * MB));
            }
        }

        #[test]
        fn format_bytes_has_two_decimals(bytes in 1u64..u64::MAX / 2) {
            let text = format_bytes(bytes);
            let number = text.split(' ').next().unwrap();
            let decimals = number.split('.').nth(1).unwrap();
            prop_assert_eq!(decimals.len(), 2);
        }
    }
}
