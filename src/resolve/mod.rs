//! Library Resolver (§4.1).
//!
//! Maps a member name to a readable source path under configured search
//! libraries, in one of two modes selected by configuration.

use std::path::{Path, PathBuf};

/// The outcome of a successful resolution: a readable path (filesystem
/// mode) or a dataset-qualified candidate string (native-PDS mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    pub path: String,
}

/// Selects which resolution mode a [`LibraryResolver`] should use.
pub trait LibraryResolver {
    fn resolve(&self, member: &str, libs: &[String]) -> Option<ResolvedMember>;
}

/// Filesystem mode: for each library root in order, form
/// `root/MEMBER[.EXT]` and return the first path that exists.
pub struct FilesystemResolver {
    pub ext: Option<String>,
}

impl LibraryResolver for FilesystemResolver {
    fn resolve(&self, member: &str, libs: &[String]) -> Option<ResolvedMember> {
        let member = member.to_ascii_uppercase();
        for root in libs {
            let mut candidate = PathBuf::from(root);
            match &self.ext {
                Some(ext) if !ext.is_empty() => candidate.push(format!("{member}.{ext}")),
                _ => candidate.push(&member),
            }
            if candidate.exists() {
                return Some(ResolvedMember {
                    path: candidate.to_string_lossy().into_owned(),
                });
            }
        }
        None
    }
}

/// Native-PDS mode: for each library root in order, form `root(MEMBER)` and
/// return the first candidate that exists.
pub struct NativePdsResolver;

impl LibraryResolver for NativePdsResolver {
    fn resolve(&self, member: &str, libs: &[String]) -> Option<ResolvedMember> {
        let member = member.to_ascii_uppercase();
        for root in libs {
            let path = format!("{root}({member})");
            if Path::new(&path).exists() {
                return Some(ResolvedMember { path });
            }
        }
        None
    }
}

/// `JCLLIB ORDER=(a,b,...)`: prepends the listed roots to the active
/// library list, preserving the old tail.
pub fn apply_jcllib(libs: &mut Vec<String>, order: &[String]) {
    let mut new_libs: Vec<String> = order
        .iter()
        .map(|s| s.trim().trim_matches('\'').to_string())
        .collect();
    new_libs.append(libs);
    *libs = new_libs;
}
