use camino::{Utf8Path, Utf8PathBuf};

use crate::config::TemplateRecord;
use crate::error::{Result, TdgError};

/// Placeholder replaced by the target name inside `sub_dirs`/`files` fragments.
pub const NAME_TOKEN: &str = "!name!";

/// Where relative locations are anchored for one invocation.
#[derive(Clone, Debug)]
pub struct Anchors {
    pub cwd: Utf8PathBuf,
    pub home: Option<Utf8PathBuf>,
}

impl Anchors {
    pub fn new(cwd: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home: None,
        }
    }

    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }
}

/// Creation-ready paths for one template. Every entry of `sub_dirs` and
/// `files` lies under `base_dir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub base_dir: Utf8PathBuf,
    pub sub_dirs: Vec<Utf8PathBuf>,
    pub files: Vec<Utf8PathBuf>,
}

impl ResolvedTemplate {
    /// Base directory, then sub-directories, then files.
    pub fn entries(&self) -> impl Iterator<Item = (EntryKind, &Utf8Path)> {
        std::iter::once((EntryKind::Dir, self.base_dir.as_path()))
            .chain(self.sub_dirs.iter().map(|p| (EntryKind::Dir, p.as_path())))
            .chain(self.files.iter().map(|p| (EntryKind::File, p.as_path())))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    Dir,
    File,
}

/// Turn a template into absolute paths for `name`.
///
/// The name is joined onto the base directory as its last segment; the
/// `!name!` token is never substituted into `base_dir` itself. Fragments get
/// textual substitution and are then joined under that base. Without a
/// `base_dir` the base is `anchors.cwd`. `..` and symlinks are left alone.
pub fn resolve(template: &TemplateRecord, name: &str, anchors: &Anchors) -> ResolvedTemplate {
    let base_dir = match template.base_dir.as_deref() {
        Some(base) if !base.trim().is_empty() => {
            anchors.cwd.join(expand_home(base, anchors.home.as_deref()))
        }
        _ => anchors.cwd.clone(),
    }
    .join(name);

    let anchor = |fragment: &String| anchor_fragment(&base_dir, &substitute(fragment, name));
    let sub_dirs = template.sub_dirs.iter().map(anchor).collect();
    let files = template.files.iter().map(anchor).collect();

    ResolvedTemplate {
        base_dir,
        sub_dirs,
        files,
    }
}

/// Replace every occurrence of [`NAME_TOKEN`] in `fragment` with `name`.
pub fn substitute(fragment: &str, name: &str) -> String {
    fragment.replace(NAME_TOKEN, name)
}

/// Reject names that cannot be a single path segment.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name must not be empty"
    } else if name == "." || name == ".." {
        "name must not be `.` or `..`"
    } else if name.chars().any(std::path::is_separator) {
        "name must not contain a path separator"
    } else {
        return Ok(());
    };
    Err(TdgError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

// Leading separators are dropped so an absolute fragment cannot replace the base.
fn anchor_fragment(base: &Utf8Path, fragment: &str) -> Utf8PathBuf {
    base.join(fragment.trim_start_matches(std::path::is_separator))
}

fn expand_home(base: &str, home: Option<&Utf8Path>) -> Utf8PathBuf {
    match (home, base.strip_prefix('~')) {
        (Some(home), Some("")) => home.to_owned(),
        (Some(home), Some(rest)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => Utf8PathBuf::from(base),
    }
}
