//! Upload storage for project images.
//!
//! Uploaded files are written under the uploads directory with a random prefix and a
//! sanitized copy of the client's file name, and are referenced from project rows as
//! `/static/uploads/<token>_<name>`. Only references of that shape are considered
//! managed; anything else (external URLs, hand-entered paths) is never existence-checked
//! or deleted.

use async_trait::async_trait;
use std::{
    collections::HashSet,
    io,
    path::PathBuf,
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// URL prefix under which managed uploads are served
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads/";

const FALLBACK_NAME: &str = "file";
const TOKEN_LEN: usize = 12;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`.
///
/// Runs of other characters become a single `_`, leading and trailing `.`/`_` are
/// stripped, and an empty result becomes `file`. The result never contains a path
/// separator and is never empty, `.` or `..`.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.trim().chars() {
        if is_safe_char(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<12 hex chars>_<sanitized name>`
fn unique_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}", &token[..TOKEN_LEN], safe_filename(original_name))
}

/// The stored file name behind a managed reference, if the reference is managed
pub fn stored_name(reference: &str) -> Option<&str> {
    let name = reference.trim().strip_prefix(UPLOADS_URL_PREFIX)?;
    let valid = !name.is_empty() && name != "." && name != ".." && name.chars().all(is_safe_char);
    valid.then_some(name)
}

/// Whether a stored reference points at a file this service owns
pub fn is_managed(reference: &str) -> bool {
    stored_name(reference).is_some()
}

/// Backing store for uploaded images
#[async_trait]
pub trait UploadStorage: Send + Sync {
    /// Store file content under a fresh unique name and return its public reference
    async fn store(&self, original_name: &str, content: &[u8]) -> io::Result<String>;

    /// Whether the backing file of a managed reference exists. Unmanaged references report `false`.
    async fn exists(&self, reference: &str) -> io::Result<bool>;

    /// Delete the backing file of a managed reference. Returns whether a file was removed.
    async fn delete(&self, reference: &str) -> io::Result<bool>;

    /// Delete a managed reference's file, logging and swallowing failures
    async fn delete_best_effort(&self, reference: &str) {
        if !is_managed(reference) {
            return;
        }
        match self.delete(reference).await {
            Ok(true) => debug!(reference, "Deleted upload"),
            Ok(false) => debug!(reference, "Upload already gone"),
            Err(e) => warn!(reference, error = %e, "Failed to delete upload"),
        }
    }
}

/// Local filesystem storage rooted at the uploads directory
pub struct LocalUploads {
    root: PathBuf,
}

impl LocalUploads {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        stored_name(reference).map(|name| self.root.join(name))
    }
}

#[async_trait]
impl UploadStorage for LocalUploads {
    #[instrument(skip(self, content), fields(size = content.len()), err)]
    async fn store(&self, original_name: &str, content: &[u8]) -> io::Result<String> {
        fs::create_dir_all(&self.root).await?;

        let name = unique_name(original_name);
        let mut file = fs::File::create(self.root.join(&name)).await?;
        file.write_all(content).await?;
        file.sync_all().await?;

        Ok(format!("{UPLOADS_URL_PREFIX}{name}"))
    }

    async fn exists(&self, reference: &str) -> io::Result<bool> {
        match self.resolve(reference) {
            Some(path) => fs::try_exists(path).await,
            None => Ok(false),
        }
    }

    async fn delete(&self, reference: &str) -> io::Result<bool> {
        let Some(path) = self.resolve(reference) else {
            return Ok(false);
        };
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Result of dropping dangling image references from one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedImages {
    pub image: String,
    pub images: Vec<String>,
    /// Distinct references dropped
    pub removed: usize,
}

impl PrunedImages {
    pub fn changed(&self) -> bool {
        self.removed > 0
    }
}

/// Drop managed references whose backing file is gone. Never deletes files.
///
/// Unmanaged references are kept untouched. When the cover is dropped the first
/// surviving gallery image becomes the cover. A reference whose existence cannot be
/// determined is kept.
pub async fn prune_missing_images(storage: &dyn UploadStorage, image: &str, images: &[String]) -> PrunedImages {
    let mut missing: HashSet<&str> = HashSet::new();
    for reference in std::iter::once(image).chain(images.iter().map(String::as_str)) {
        if !is_managed(reference) || missing.contains(reference) {
            continue;
        }
        match storage.exists(reference).await {
            Ok(true) => {}
            Ok(false) => {
                missing.insert(reference);
            }
            Err(e) => warn!(reference, error = %e, "Could not check upload, keeping reference"),
        }
    }

    let images: Vec<String> = images.iter().filter(|r| !missing.contains(r.as_str())).cloned().collect();
    let image = if missing.contains(image) {
        images.first().cloned().unwrap_or_default()
    } else {
        image.to_string()
    };

    PrunedImages {
        image,
        images,
        removed: missing.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_safe_filename_strips_traversal() {
        let name = safe_filename("../../etc/passwd");
        assert_eq!(name, "etc_passwd");
        assert!(!name.contains('/') && !name.contains('\\'));
    }

    #[test]
    fn test_safe_filename_falls_back_when_nothing_survives() {
        for input in ["", "   ", ".", "..", "...", "///", "__", "фото"] {
            assert_eq!(safe_filename(input), "file", "input {input:?}");
        }
    }

    #[test]
    fn test_safe_filename_collapses_runs() {
        assert_eq!(safe_filename("My Photo (1).PNG"), "My_Photo_1_.PNG");
        assert_eq!(safe_filename("  cover.jpg  "), "cover.jpg");
        assert_eq!(safe_filename("a\\b/c.png"), "a_b_c.png");
    }

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name("../x y.png");
        let (token, rest) = name.split_once('_').unwrap();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "x_y.png");
        assert_ne!(unique_name("a.png"), unique_name("a.png"));
    }

    #[test]
    fn test_managed_references() {
        assert!(is_managed("/static/uploads/0123456789ab_cover.png"));
        assert!(!is_managed("https://example.com/cover.png"));
        assert!(!is_managed("/static/uploads/"));
        assert!(!is_managed("/static/uploads/../config.yaml"));
        assert!(!is_managed("/static/uploads/.."));
        assert!(!is_managed("/static/other/a.png"));
    }

    #[tokio::test]
    async fn test_store_exists_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalUploads::new(dir.path().join("uploads"));

        let reference = storage.store("My Cover.png", b"png").await.unwrap();
        assert!(reference.starts_with(UPLOADS_URL_PREFIX));
        assert!(reference.ends_with("_My_Cover.png"));
        assert!(storage.exists(&reference).await.unwrap());

        assert!(storage.delete(&reference).await.unwrap());
        assert!(!storage.exists(&reference).await.unwrap());
        assert!(!storage.delete(&reference).await.unwrap());
    }

    #[tokio::test]
    async fn test_unmanaged_references_are_never_touched() {
        let dir = tempdir().unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();
        let storage = LocalUploads::new(dir.path().join("uploads"));

        assert!(!storage.exists("/static/uploads/../keep.txt").await.unwrap());
        assert!(!storage.delete("/static/uploads/../keep.txt").await.unwrap());
        storage.delete_best_effort("/static/uploads/../keep.txt").await;
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_prune_promotes_next_gallery_image() {
        let dir = tempdir().unwrap();
        let storage = LocalUploads::new(dir.path());
        let kept = storage.store("b.png", b"b").await.unwrap();
        let cover = "/static/uploads/000000000000_a.png".to_string();
        let external = "https://cdn.example.com/c.png".to_string();

        let pruned = prune_missing_images(&storage, &cover, &[cover.clone(), kept.clone(), external.clone()]).await;

        assert_eq!(pruned.removed, 1);
        assert_eq!(pruned.image, kept);
        assert_eq!(pruned.images, vec![kept.clone(), external]);
        // Pruning only rewrites references
        assert!(storage.exists(&kept).await.unwrap());
    }

    #[tokio::test]
    async fn test_prune_without_missing_files_changes_nothing() {
        let dir = tempdir().unwrap();
        let storage = LocalUploads::new(dir.path());
        let cover = storage.store("a.png", b"a").await.unwrap();

        let pruned = prune_missing_images(&storage, &cover, std::slice::from_ref(&cover)).await;
        assert!(!pruned.changed());
        assert_eq!(pruned.image, cover);
        assert_eq!(pruned.images, vec![cover]);

        let empty = prune_missing_images(&storage, "", &[]).await;
        assert_eq!(empty, PrunedImages { image: String::new(), images: vec![], removed: 0 });
    }
}
