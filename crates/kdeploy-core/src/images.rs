//! Image references and their substitution in rendered manifests

use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::manifest::{Manifest, ManifestCollection};

/// Key whose string values are treated as container image references
const IMAGE_KEY: &str = "image";

/// A freshly built image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Image name as written in the manifests, without tag (e.g. `gcr.io/acme/web`)
    pub image_name: String,
    /// Fully resolved reference to deploy (e.g. `gcr.io/acme/web:3f2a1c`)
    pub tag: String,
}

impl BuildArtifact {
    pub fn new(image_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            tag: tag.into(),
        }
    }
}

impl FromStr for BuildArtifact {
    type Err = CoreError;

    /// Parse `NAME=TAG`
    fn from_str(spec: &str) -> Result<Self> {
        match spec.split_once('=') {
            Some((name, tag)) if !name.trim().is_empty() && !tag.trim().is_empty() => {
                Ok(Self::new(name.trim(), tag.trim()))
            }
            _ => Err(CoreError::InvalidArtifact {
                spec: spec.to_string(),
            }),
        }
    }
}

/// Parsed `name[:tag][@digest]` image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository name including registry, without tag or digest
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference, returning `None` when it is not one
    ///
    /// A `:` only starts a tag when it comes after the last `/`, so
    /// `localhost:5000/app` is a registry port, not a tag.
    pub fn parse(image: &str) -> Option<Self> {
        let image = image.trim();
        if image.is_empty() || image.contains(char::is_whitespace) {
            return None;
        }

        let (rest, digest) = match image.split_once('@') {
            Some((rest, digest)) if !digest.is_empty() => (rest, Some(digest.to_string())),
            Some(_) => return None,
            None => (image, None),
        };

        let slash = rest.rfind('/');
        let (name, tag) = match rest.rfind(':') {
            Some(colon) if slash.is_none_or(|s| colon > s) => {
                let tag = &rest[colon + 1..];
                if tag.is_empty() {
                    return None;
                }
                (&rest[..colon], Some(tag.to_string()))
            }
            _ => (rest, None),
        };

        if name.is_empty() || name.ends_with('/') {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// Pinned by digest; such references are never rewritten
    pub fn is_fully_qualified(&self) -> bool {
        self.digest.is_some()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl ManifestCollection {
    /// Point image references at freshly built artifacts
    ///
    /// Every `image:` value whose name matches an artifact's `image_name` is
    /// replaced by the artifact's `tag`, in every document. Documents without a
    /// replacement keep their original bytes; rewritten documents are
    /// re-serialized. A document that is not valid YAML fails the whole call.
    pub fn replace_images(&self, artifacts: &[BuildArtifact]) -> Result<ManifestCollection> {
        let mut replacer = ImageReplacer::new(artifacts);
        let mut replaced = ManifestCollection::new();

        for (index, manifest) in self.iter().enumerate() {
            let mut doc: Value = serde_yaml::from_slice(manifest.as_bytes())
                .map_err(|source| CoreError::ManifestParse { index, source })?;

            if replacer.visit(&mut doc) {
                let text = serde_yaml::to_string(&doc)
                    .map_err(|source| CoreError::ManifestSerialize { index, source })?;
                replaced.push(Manifest::from(text));
            } else {
                replaced.push(manifest.clone());
            }
        }

        replacer.warn_unused();
        Ok(replaced)
    }
}

struct ImageReplacer<'a> {
    artifacts: &'a [BuildArtifact],
    tags_by_name: HashMap<&'a str, &'a str>,
    found: HashSet<String>,
}

impl<'a> ImageReplacer<'a> {
    fn new(artifacts: &'a [BuildArtifact]) -> Self {
        let tags_by_name = artifacts
            .iter()
            .map(|a| (a.image_name.as_str(), a.tag.as_str()))
            .collect();

        Self {
            artifacts,
            tags_by_name,
            found: HashSet::new(),
        }
    }

    /// Rewrite images in place; returns whether anything changed
    fn visit(&mut self, value: &mut Value) -> bool {
        match value {
            Value::Mapping(map) => {
                let mut changed = false;
                for (key, child) in map.iter_mut() {
                    if key.as_str() == Some(IMAGE_KEY)
                        && let Value::String(image) = &mut *child
                    {
                        if let Some(tag) = self.rewrite(image) {
                            *image = tag;
                            changed = true;
                        }
                        continue;
                    }
                    changed |= self.visit(child);
                }
                changed
            }
            Value::Sequence(items) => {
                let mut changed = false;
                for item in items.iter_mut() {
                    changed |= self.visit(item);
                }
                changed
            }
            Value::Tagged(tagged) => self.visit(&mut tagged.value),
            _ => false,
        }
    }

    fn rewrite(&mut self, image: &str) -> Option<String> {
        let Some(reference) = ImageReference::parse(image) else {
            tracing::warn!(image, "couldn't parse image reference");
            return None;
        };

        if reference.is_fully_qualified() {
            if let Some(artifact) = self.artifacts.iter().find(|a| a.tag == image) {
                self.found.insert(artifact.image_name.clone());
            }
            return None;
        }

        let tag = *self.tags_by_name.get(reference.name.as_str())?;
        self.found.insert(reference.name);
        if tag == image {
            return None;
        }
        Some(tag.to_string())
    }

    fn warn_unused(&self) {
        for artifact in self.artifacts {
            if !self.found.contains(&artifact.image_name) {
                tracing::warn!(
                    image = %artifact.image_name,
                    "image is not used by the deployment"
                );
            }
        }
    }
}
