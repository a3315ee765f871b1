use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::root::ProjectRoot;

pub const HASH_LEN: usize = 8;

/// Short digest pdm embeds in venv directory names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnvironmentHash(String);

impl EnvironmentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// MD5 of the canonical path, urlsafe-base64 encoded and cut to eight chars.
///
/// This has to match pdm bit for bit; a mismatch silently turns every lookup
/// into "no environments".
pub fn environment_hash(canonical: &str) -> EnvironmentHash {
    let digest = md5::compute(canonical.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest.0);
    EnvironmentHash(encoded[..HASH_LEN].to_string())
}

/// `<project-name>-<hash>-`, prepended by pdm to every venv of a project.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashedPrefix(String);

impl HashedPrefix {
    pub fn for_root(root: &ProjectRoot) -> Self {
        let hash = environment_hash(&root.canonical_path());
        Self(format!("{}-{hash}-", root.name()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn strip<'a>(&self, dir_name: &'a str) -> Option<&'a str> {
        dir_name.strip_prefix(self.0.as_str())
    }

    pub fn dir_name(&self, short_name: &str) -> String {
        format!("{}{short_name}", self.0)
    }
}

impl fmt::Display for HashedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
