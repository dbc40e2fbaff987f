//! Rendered manifest documents
//!
//! Renderers and `kubectl` both speak multi-document YAML streams. A
//! [`ManifestCollection`] keeps each document as opaque bytes so that
//! untouched documents travel to the cluster exactly as they were rendered.

use std::fmt;

/// A single YAML document describing one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Manifest(Vec<u8>);

impl Manifest {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Document text, with invalid UTF-8 replaced
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<Vec<u8>> for Manifest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<String> for Manifest {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<&str> for Manifest {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// Ordered list of manifest documents
///
/// Order is preserved from rendering through apply/delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestCollection(Vec<Manifest>);

impl ManifestCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a multi-document YAML stream into a collection
    pub fn from_bytes(buf: &[u8]) -> Self {
        let mut collection = Self::new();
        collection.append(buf);
        collection
    }

    /// Append every document found in a YAML stream
    ///
    /// Documents are separated by `---` lines. Content written on the marker
    /// line itself (`--- {kind: Pod}`, `--- |`) starts the next document.
    /// Blank and comment-only documents carry no resource and are dropped.
    pub fn append(&mut self, buf: &[u8]) {
        let mut current: Vec<u8> = Vec::new();

        for line in buf.split_inclusive(|b| *b == b'\n') {
            match separator_content(line) {
                Some(rest) => {
                    self.flush(&mut current);
                    let text = rest.trim_ascii();
                    if !text.is_empty() && !text.starts_with(b"#") {
                        current.extend_from_slice(rest.trim_ascii_start());
                    }
                }
                None => current.extend_from_slice(line),
            }
        }
        self.flush(&mut current);
    }

    fn flush(&mut self, current: &mut Vec<u8>) {
        let doc = std::mem::take(current);
        if has_content(&doc) {
            self.0.push(Manifest(doc));
        }
    }

    pub fn push(&mut self, manifest: Manifest) {
        self.0.push(manifest);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Manifest> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Manifest> {
        self.0.get(index)
    }

    pub fn contains(&self, manifest: &Manifest) -> bool {
        self.0.contains(manifest)
    }

    /// Manifests of `self` that are not present in `previous`, in order
    pub fn diff(&self, previous: &ManifestCollection) -> ManifestCollection {
        self.iter()
            .filter(|m| !previous.contains(m))
            .cloned()
            .collect()
    }

    /// Serialize back into one YAML stream, suitable for `kubectl -f -`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, manifest) in self.0.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(b"---\n");
            }
            out.extend_from_slice(manifest.as_bytes());
            if !manifest.as_bytes().ends_with(b"\n") {
                out.push(b'\n');
            }
        }
        out
    }
}

impl fmt::Display for ManifestCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

impl FromIterator<Manifest> for ManifestCollection {
    fn from_iter<I: IntoIterator<Item = Manifest>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Manifest>> for ManifestCollection {
    fn from(manifests: Vec<Manifest>) -> Self {
        Self(manifests)
    }
}

impl IntoIterator for ManifestCollection {
    type Item = Manifest;
    type IntoIter = std::vec::IntoIter<Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ManifestCollection {
    type Item = &'a Manifest;
    type IntoIter = std::slice::Iter<'a, Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// For a document marker line, whatever follows `---` on it
fn separator_content(line: &[u8]) -> Option<&[u8]> {
    if line.trim_ascii_end() == b"---" {
        return Some(&line[..0]);
    }
    line.strip_prefix(b"--- ")
}

fn has_content(doc: &[u8]) -> bool {
    doc.split(|b| *b == b'\n').any(|line| {
        let line = line.trim_ascii();
        !line.is_empty() && !line.starts_with(b"#")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_DOCS: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n";

    #[test]
    fn test_split_documents() {
        let collection = ManifestCollection::from_bytes(TWO_DOCS.as_bytes());
        assert_eq!(collection.len(), 2);
        assert!(collection.get(0).unwrap().to_string_lossy().contains("kind: Service"));
        assert!(collection.get(1).unwrap().to_string_lossy().contains("kind: Deployment"));
    }

    #[test]
    fn test_empty_output_is_empty_collection() {
        assert!(ManifestCollection::from_bytes(b"").is_empty());
        assert!(ManifestCollection::from_bytes(b"\n\n").is_empty());
        assert!(ManifestCollection::from_bytes(b"---\n# only a comment\n---\n").is_empty());
    }

    #[test]
    fn test_leading_separator_and_comments() {
        let input = "---\n# Source: web\napiVersion: v1\nkind: ConfigMap\n--- \n\n";
        let collection = ManifestCollection::from_bytes(input.as_bytes());
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.get(0).unwrap().as_bytes(),
            b"# Source: web\napiVersion: v1\nkind: ConfigMap\n"
        );
    }

    #[test]
    fn test_content_on_separator_line() {
        let input = "--- {apiVersion: v1, kind: ConfigMap, metadata: {name: a}}\n--- |\n  plain text\n--- # trailing comment\nkind: B\n";
        let collection = ManifestCollection::from_bytes(input.as_bytes());
        assert_eq!(collection.len(), 3);
        assert_eq!(
            collection.get(0).unwrap().as_bytes(),
            b"{apiVersion: v1, kind: ConfigMap, metadata: {name: a}}\n"
        );
        assert_eq!(collection.get(1).unwrap().as_bytes(), b"|\n  plain text\n");
        assert_eq!(collection.get(2).unwrap().as_bytes(), b"kind: B\n");
    }

    #[test]
    fn test_inline_document_without_trailing_newline() {
        let collection = ManifestCollection::from_bytes(b"--- !!map {kind: Pod}");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().as_bytes(), b"!!map {kind: Pod}");
    }

    #[test]
    fn test_separator_inside_block_scalar_line_is_not_split() {
        let input = "kind: ConfigMap\ndata:\n  script: |\n    echo ---done\n";
        let collection = ManifestCollection::from_bytes(input.as_bytes());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_to_bytes_joins_with_separator() {
        let collection: ManifestCollection =
            vec![Manifest::from("kind: A"), Manifest::from("kind: B\n")].into();
        assert_eq!(collection.to_bytes(), b"kind: A\n---\nkind: B\n");
        assert_eq!(collection.to_string(), "kind: A\n---\nkind: B\n");
    }

    #[test]
    fn test_stream_round_trip_preserves_documents() {
        let collection = ManifestCollection::from_bytes(TWO_DOCS.as_bytes());
        let again = ManifestCollection::from_bytes(&collection.to_bytes());
        assert_eq!(collection, again);
    }

    #[test]
    fn test_diff_against_previous() {
        let previous: ManifestCollection =
            vec![Manifest::from("kind: A\n"), Manifest::from("kind: B\n")].into();
        let current: ManifestCollection = vec![
            Manifest::from("kind: A\n"),
            Manifest::from("kind: B\nchanged: true\n"),
            Manifest::from("kind: C\n"),
        ]
        .into();

        let updated = current.diff(&previous);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.get(0).unwrap().as_bytes(), b"kind: B\nchanged: true\n");
        assert_eq!(updated.get(1).unwrap().as_bytes(), b"kind: C\n");

        assert!(current.diff(&current).is_empty());
        assert_eq!(current.diff(&ManifestCollection::new()), current);
    }
}
