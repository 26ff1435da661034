//! On-disk draft storage.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DeliveryError;
use crate::render::Draft;

/// File name for an owner's draft: `@` becomes `_at_`, `.` becomes `_`.
///
/// ```
/// assert_eq!(
///     delivery::draft_filename("JSweid@info-sys.com"),
///     "JSweid_at_info-sys_com.html"
/// );
/// ```
pub fn draft_filename(owner_email: &str) -> String {
    format!("{}.html", owner_email.replace('@', "_at_").replace('.', "_"))
}

/// Writes drafts into a single directory, one file per owner.
///
/// Distinct emails can share a file name (`a.b@x.com`, `a_b@x.com`). The
/// store remembers what it wrote so such a clash is reported, not silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStore {
    dir: PathBuf,
    written: BTreeSet<PathBuf>,
    overwritten: Vec<PathBuf>,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: BTreeSet::new(),
            overwritten: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths this store wrote more than once.
    pub fn overwritten(&self) -> &[PathBuf] {
        &self.overwritten
    }

    /// Write `draft`, overwriting any previous draft for the same owner, and
    /// record the path on it. The directory is created on first use.
    pub fn save(&mut self, draft: &mut Draft) -> Result<PathBuf, DeliveryError> {
        fs::create_dir_all(&self.dir).map_err(|err| DeliveryError::io(&self.dir, err))?;

        let path = self.dir.join(draft_filename(&draft.owner_email));
        fs::write(&path, draft.html.as_bytes()).map_err(|err| DeliveryError::io(&path, err))?;

        if !self.written.insert(path.clone()) {
            warn!(owner_email = %draft.owner_email, path = %path.display(), "draft_overwritten");
            self.overwritten.push(path.clone());
        }

        info!(owner_email = %draft.owner_email, path = %path.display(), "draft_saved");
        draft.path = Some(path.clone());
        Ok(path)
    }
}
