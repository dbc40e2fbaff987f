//! Overlay definitions and dependency resolution
//!
//! An overlay is a directory holding a `kustomization.yaml` that layers
//! resources and patches over zero or more base overlays. The resolver walks
//! that hierarchy and collects every file whose change should trigger a
//! redeploy.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, DependencyError, Result};

/// Name of the overlay definition file inside an overlay directory
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// The parts of `kustomization.yaml` that contribute dependencies
///
/// All other fields of the file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayDescriptor {
    /// Nested overlay directories, relative to this overlay
    pub bases: Vec<String>,

    /// Plain resource files
    pub resources: Vec<String>,

    /// Patch files
    pub patches: Vec<String>,
}

impl OverlayDescriptor {
    /// Load a descriptor from a definition file
    ///
    /// An empty file is a valid, empty overlay.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| CoreError::YamlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a descriptor from YAML text
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty definition is accepted as an overlay with nothing in it
        // rather than reported as an end-of-input decode error. The
        // resulting dependency set is `[definition]` either way.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Ordered list of files an overlay depends on
///
/// The overlay's own definition file always comes first. Duplicates are kept:
/// a base reached through two parents contributes its files twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet(Vec<PathBuf>);

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        self.0.push(path);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.0.iter()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.0
    }
}

impl From<Vec<PathBuf>> for DependencySet {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self(paths)
    }
}

impl IntoIterator for DependencySet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Compute every file `overlay_dir` transitively depends on
///
/// Order: the definition file, then each base's full closure in listed order,
/// then this level's resources, then its patches. Resources and patches are
/// taken literally even when they point at another overlay.
///
/// On failure the files collected so far are returned inside the error, and
/// nothing after the failing step is visited. A base that appears again on
/// its own resolution path fails with [`CoreError::CyclicOverlay`].
pub fn resolve_dependencies(
    overlay_dir: impl AsRef<Path>,
) -> std::result::Result<DependencySet, DependencyError> {
    let mut deps = DependencySet::new();
    let mut path = Vec::new();

    match collect(overlay_dir.as_ref(), &mut path, &mut deps) {
        Ok(()) => Ok(deps),
        Err(e) => Err(DependencyError::new(deps, e)),
    }
}

fn collect(dir: &Path, visiting: &mut Vec<PathBuf>, deps: &mut DependencySet) -> Result<()> {
    let dir = clean_path(dir);
    let definition = clean_path(&dir.join(KUSTOMIZATION_FILE));
    deps.push(definition.clone());

    if visiting.contains(&dir) {
        return Err(CoreError::CyclicOverlay { path: dir });
    }

    let descriptor = OverlayDescriptor::load(&definition)?;
    tracing::trace!(
        overlay = %dir.display(),
        bases = descriptor.bases.len(),
        resources = descriptor.resources.len(),
        patches = descriptor.patches.len(),
        "resolving overlay"
    );

    visiting.push(dir.clone());
    for base in &descriptor.bases {
        collect(&dir.join(base), visiting, deps)?;
    }
    visiting.pop();

    for resource in &descriptor.resources {
        deps.push(clean_path(&dir.join(resource)));
    }
    for patch in &descriptor.patches {
        deps.push(clean_path(&dir.join(patch)));
    }

    Ok(())
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent
///
/// The filesystem is never consulted, so paths that do not exist are fine.
/// `..` at the start of a relative path is kept; above the root it is dropped.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}
