//! Go module cache lookup
//!
//! Resolves a `module[@version]` identifier to the directory the Go toolchain
//! downloaded it into.

use provider_codegen_common::{CodegenError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A module path with an optional version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub path: String,
    pub version: Option<String>,
}

impl ModuleSpec {
    /// Split `identifier` on its last `@`
    ///
    /// # Examples
    /// ```
    /// use provider_codegen_parser::ModuleSpec;
    ///
    /// let spec = ModuleSpec::parse("github.com/acme/widgets-go-client/v4@v4.0.1");
    /// assert_eq!(spec.path, "github.com/acme/widgets-go-client/v4");
    /// assert_eq!(spec.version.as_deref(), Some("v4.0.1"));
    /// ```
    pub fn parse(identifier: &str) -> Self {
        match identifier.rsplit_once('@') {
            Some((path, version)) => Self {
                path: path.to_string(),
                version: Some(version.to_string()).filter(|v| !v.is_empty()),
            },
            None => Self {
                path: identifier.to_string(),
                version: None,
            },
        }
    }
}

/// The module cache root (`$GOMODCACHE`, else `$GOPATH/pkg/mod`, else `~/go/pkg/mod`)
#[derive(Debug, Clone)]
pub struct ModuleCache {
    root: PathBuf,
}

impl ModuleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Self {
        if let Some(cache) = env::var_os("GOMODCACHE").filter(|v| !v.is_empty()) {
            return Self::new(cache);
        }

        let gopath = env::var_os("GOPATH")
            .filter(|v| !v.is_empty())
            .and_then(|v| env::split_paths(&v).next())
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join("go")))
            .unwrap_or_else(|| PathBuf::from("go"));
        Self::new(gopath.join("pkg").join("mod"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the module described by `spec`
    ///
    /// Without a version the newest downloaded version is used.
    pub fn locate(&self, spec: &ModuleSpec) -> Result<PathBuf> {
        let base = self.root.join(escape_module_path(&spec.path));

        let found = match &spec.version {
            Some(version) => {
                let dir = append_version(&base, version);
                dir.is_dir().then_some(dir)
            },
            None => self.newest_version(&base),
        };

        found.ok_or_else(|| {
            CodegenError::Configuration(format!(
                "Could not locate module {} under {}; download it with `go mod download {}`",
                spec.path,
                self.root.display(),
                match &spec.version {
                    Some(v) => format!("{}@{}", spec.path, v),
                    None => spec.path.clone(),
                }
            ))
        })
    }

    fn newest_version(&self, base: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<(Vec<u64>, PathBuf)> = Vec::new();

        // `<base>/vN...` directories
        candidates.extend(
            list_dirs(base)
                .into_iter()
                .filter(|(name, _)| name.starts_with('v'))
                .map(|(name, path)| (version_key(&name), path)),
        );

        // `<parent>/<last>@vN...` directories
        if let (Some(parent), Some(last)) = (base.parent(), base.file_name()) {
            let prefix = format!("{}@", last.to_string_lossy());
            candidates.extend(list_dirs(parent).into_iter().filter_map(|(name, path)| {
                name.strip_prefix(&prefix)
                    .filter(|v| v.starts_with('v'))
                    .map(|v| (version_key(v), path.clone()))
            }));
        }

        candidates.sort();
        let newest = candidates.pop().map(|(_, path)| path);
        debug!("Newest cached version under {}: {:?}", base.display(), newest);
        newest
    }
}

/// Escape uppercase letters the way the module cache stores them (`A` -> `!a`)
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(ch.to_ascii_lowercase());
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn append_version(base: &Path, version: &str) -> PathBuf {
    let mut dir = base.as_os_str().to_owned();
    dir.push("@");
    dir.push(escape_module_path(version));
    PathBuf::from(dir)
}

fn list_dirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect()
}

/// Numeric components of a version string (`v4.1.10` -> `[4, 1, 10]`)
fn version_key(version: &str) -> Vec<u64> {
    version
        .trim_start_matches('v')
        .split(['.', '-', '+'])
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}
