//! Finding the images to scan
//!
//! A [`DirectoryListing`] yields the entries of one folder; [`discover`]
//! turns the `.png` files among them into [`Job`]s with their identity.

use crate::error::DiscoveryError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extension the scanner targets, including the dot
pub const IMAGE_SUFFIX: &str = ".png";

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub is_file: bool,
}

/// Source of directory entries (non-recursive)
///
/// Each call to `entries` starts a fresh, finite pass over the folder.
pub trait DirectoryListing {
    fn entries<'a>(
        &'a self,
        dir: &Path,
    ) -> Result<Box<dyn Iterator<Item = ListedFile> + 'a>, DiscoveryError>;
}

/// Filesystem listing backed by `walkdir` at depth 1
#[derive(Debug, Clone, Copy, Default)]
pub struct FsListing {
    pub follow_links: bool,
}

impl DirectoryListing for FsListing {
    fn entries<'a>(
        &'a self,
        dir: &Path,
    ) -> Result<Box<dyn Iterator<Item = ListedFile> + 'a>, DiscoveryError> {
        let meta = std::fs::metadata(dir).map_err(|e| DiscoveryError::ListFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(DiscoveryError::ListFailed {
                path: dir.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        let iter = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    // An unfollowed symlink counts when its target is a regular file
                    let is_file = entry.file_type().is_file()
                        || (entry.path_is_symlink() && entry.path().is_file());
                    Some(ListedFile {
                        file_name: entry.file_name().to_string_lossy().into_owned(),
                        is_file,
                        path: entry.into_path(),
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            });

        Ok(Box::new(iter))
    }
}

/// How an image's identity is derived from its file name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityMode {
    /// Strip the matched `.png` suffix; the real file name is moved
    #[default]
    Extension,

    /// Drop the last four characters; `<identity>.png` is moved
    Literal,
}

impl IdentityMode {
    /// Identity for `file_name`, or `None` if the name is not a target image
    pub fn identity(&self, file_name: &str) -> Option<String> {
        if !has_image_suffix(file_name) {
            return None;
        }

        let identity = match self {
            IdentityMode::Extension => file_name[..file_name.len() - IMAGE_SUFFIX.len()].to_string(),
            IdentityMode::Literal => {
                let keep = file_name.chars().count().saturating_sub(4);
                file_name.chars().take(keep).collect()
            }
        };

        if identity.is_empty() {
            None
        } else {
            Some(identity)
        }
    }

    /// Name of the file relocation moves for this job
    fn source_name(&self, file_name: &str, identity: &str) -> String {
        match self {
            IdentityMode::Extension => file_name.to_string(),
            IdentityMode::Literal => format!("{}{}", identity, IMAGE_SUFFIX),
        }
    }
}

/// True if `file_name` ends in `.png`, ignoring ASCII case
pub fn has_image_suffix(file_name: &str) -> bool {
    let suffix_len = IMAGE_SUFFIX.len();
    file_name.len() >= suffix_len
        && file_name.is_char_boundary(file_name.len() - suffix_len)
        && file_name[file_name.len() - suffix_len..].eq_ignore_ascii_case(IMAGE_SUFFIX)
}

/// A file to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Full path opened by the parser
    pub path: PathBuf,

    /// Name (inside the scanned folder) that relocation moves
    pub source_name: String,

    /// Index key
    pub identity: String,
}

/// List `dir` and build one job per target image, sorted by file name
pub fn discover<L: DirectoryListing + ?Sized>(
    listing: &L,
    dir: &Path,
    mode: IdentityMode,
) -> Result<Vec<Job>, DiscoveryError> {
    let mut jobs: Vec<(String, Job)> = listing
        .entries(dir)?
        .filter(|entry| entry.is_file)
        .filter_map(|entry| {
            let identity = mode.identity(&entry.file_name)?;
            let source_name = mode.source_name(&entry.file_name, &identity);
            Some((
                entry.file_name,
                Job {
                    path: entry.path,
                    source_name,
                    identity,
                },
            ))
        })
        .collect();

    jobs.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(dir = %dir.display(), images = jobs.len(), "Discovery complete");

    Ok(jobs.into_iter().map(|(_, job)| job).collect())
}

/// Number of target images in `dir`
pub fn count_images<L: DirectoryListing + ?Sized>(
    listing: &L,
    dir: &Path,
) -> Result<usize, DiscoveryError> {
    Ok(listing
        .entries(dir)?
        .filter(|entry| entry.is_file && IdentityMode::Extension.identity(&entry.file_name).is_some())
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// In-memory listing for tests
    struct FixedListing(Vec<ListedFile>);

    impl DirectoryListing for FixedListing {
        fn entries<'a>(
            &'a self,
            dir: &Path,
        ) -> Result<Box<dyn Iterator<Item = ListedFile> + 'a>, DiscoveryError> {
            let dir = dir.to_path_buf();
            Ok(Box::new(self.0.iter().cloned().map(move |mut f| {
                f.path = dir.join(&f.file_name);
                f
            })))
        }
    }

    fn file(name: &str) -> ListedFile {
        ListedFile {
            path: PathBuf::new(),
            file_name: name.into(),
            is_file: true,
        }
    }

    #[test]
    fn test_identity_extension_mode() {
        let mode = IdentityMode::Extension;
        assert_eq!(mode.identity("cat.png"), Some("cat".into()));
        assert_eq!(mode.identity("Dog.PNG"), Some("Dog".into()));
        assert_eq!(mode.identity("a.b.png"), Some("a.b".into()));
        assert_eq!(mode.identity("notes.txt"), None);
        assert_eq!(mode.identity("png"), None);
        assert_eq!(mode.identity(".png"), None);
    }

    #[test]
    fn test_identity_literal_mode() {
        let mode = IdentityMode::Literal;
        assert_eq!(mode.identity("cat.png"), Some("cat".into()));
        assert_eq!(mode.identity("чай.png"), Some("чай".into()));
        assert_eq!(mode.source_name("cat.PNG", "cat"), "cat.png");
    }

    #[test]
    fn test_suffix_on_multibyte_name() {
        assert!(!has_image_suffix("é"));
        assert!(has_image_suffix("日本.png"));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let listing = FixedListing(vec![
            file("zebra.png"),
            file("readme.md"),
            file("Apple.PNG"),
            ListedFile {
                is_file: false,
                ..file("folder.png")
            },
            file("mango.png"),
        ]);

        let jobs = discover(&listing, Path::new("/imgs"), IdentityMode::Extension).unwrap();
        let identities: Vec<_> = jobs.iter().map(|j| j.identity.as_str()).collect();
        assert_eq!(identities, ["Apple", "mango", "zebra"]);
        assert_eq!(jobs[0].path, Path::new("/imgs/Apple.PNG"));
        assert_eq!(jobs[0].source_name, "Apple.PNG");
    }

    #[test]
    fn test_fs_listing_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("top.png"), b"x").unwrap();
        fs::write(dir.path().join("other.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.png"), b"x").unwrap();

        let jobs = discover(&FsListing::default(), dir.path(), IdentityMode::Extension).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].identity, "top");
        assert_eq!(count_images(&FsListing::default(), dir.path()).unwrap(), 1);
    }

    #[test]
    fn test_fs_listing_missing_folder() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = discover(&FsListing::default(), &missing, IdentityMode::Extension).unwrap_err();
        assert!(matches!(err, DiscoveryError::ListFailed { .. }));
    }

    #[test]
    fn test_fs_listing_is_restartable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        let listing = FsListing::default();
        assert_eq!(listing.entries(dir.path()).unwrap().count(), 1);
        assert_eq!(listing.entries(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_listing_counts_symlinked_images() {
        let dir = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("real.png"), b"x").unwrap();
        fs::create_dir(store.path().join("folder.png")).unwrap();
        std::os::unix::fs::symlink(store.path().join("real.png"), dir.path().join("link.png")).unwrap();
        std::os::unix::fs::symlink(store.path().join("folder.png"), dir.path().join("dir.png")).unwrap();

        let jobs = discover(&FsListing::default(), dir.path(), IdentityMode::Extension).unwrap();
        let identities: Vec<_> = jobs.iter().map(|j| j.identity.as_str()).collect();
        assert_eq!(identities, ["link"]);
        assert_eq!(jobs[0].path, dir.path().join("link.png"));
    }
}
