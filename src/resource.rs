//! Static resources served by the reactor.
//!
//! The document root is walked once at startup. Every regular file becomes a
//! [`Resource`] keyed by its path relative to the root, with a leading `/`
//! (`./css/site.css` is served as `/css/site.css`).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;

/// A file that can be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: PathBuf,
    pub media_type: &'static str,
}

/// Lookup and loading of resources for GET and HEAD requests.
pub trait ResourceStore {
    /// Resolves a request target. A query string, if any, is ignored.
    fn lookup(&self, target: &[u8]) -> Option<&Resource>;

    /// Loads the full contents of a resource.
    fn read(&self, resource: &Resource) -> io::Result<Bytes>;
}

const MEDIA_TYPES: [(&str, &str); 9] = [
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("xml", "text/xml"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
];

/// Media type for a file name, `text/plain` when the extension is unknown.
pub fn media_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            MEDIA_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, media)| *media)
        })
        .unwrap_or("text/plain")
}

/// Strips the query string from a request target.
pub fn strip_query(target: &[u8]) -> &[u8] {
    match memchr::memchr(b'?', target) {
        Some(i) => &target[..i],
        None => target,
    }
}

/// Files found under a document root.
#[derive(Debug, Default)]
pub struct StaticFiles {
    root: PathBuf,
    entries: HashMap<String, Resource>,
}

impl StaticFiles {
    /// Walks `root` recursively and indexes every regular file.
    ///
    /// Fails only if `root` itself cannot be read. Unreadable entries below it
    /// are skipped with a warning.
    pub fn load(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut entries = HashMap::new();
        let mut pending = vec![root.clone()];

        fs::read_dir(&root)
            .with_context(|| format!("failed to read document root {}", root.display()))?;

        while let Some(dir) = pending.pop() {
            let listing = match fs::read_dir(&dir) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Skipping unreadable directory"
                    );
                    continue;
                }
            };

            for entry in listing.flatten() {
                let path = entry.path();
                let Ok(file_type) = entry.file_type() else {
                    tracing::warn!(path = %path.display(), "Skipping unreadable entry");
                    continue;
                };

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                // symlinked files are served, symlinked directories are not walked
                let is_file = file_type.is_file()
                    || (file_type.is_symlink() && fs::metadata(&path).is_ok_and(|m| m.is_file()));

                if is_file {
                    if let Some(key) = route_for(&root, &path) {
                        let resource = Resource {
                            media_type: media_type(&path),
                            path,
                        };
                        entries.insert(key, resource);
                    }
                }
            }
        }

        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Served paths in sorted order.
    pub fn routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        routes.sort_unstable();
        routes
    }
}

impl ResourceStore for StaticFiles {
    fn lookup(&self, target: &[u8]) -> Option<&Resource> {
        let path = std::str::from_utf8(strip_query(target)).ok()?;
        self.entries.get(path)
    }

    fn read(&self, resource: &Resource) -> io::Result<Bytes> {
        fs::read(&resource.path).map(Bytes::from)
    }
}

/// `/`-separated route for a file below `root`. `None` for non UTF-8 names.
fn route_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut route = String::new();
    for part in relative.components() {
        route.push('/');
        route.push_str(part.as_os_str().to_str()?);
    }
    Some(route)
}
