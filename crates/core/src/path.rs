//! Pure path helpers for compile commands.

use std::path::{Component, Path, PathBuf};

/// Resolves `file` against `directory`. Absolute inputs are returned as-is;
/// relative ones are joined and lexically normalized.
pub fn make_absolute(file: &str, directory: &Path) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    normalize(&directory.join(path))
}

/// Lexical normalization: drops `.`, folds `name/..`, never touches the
/// filesystem. `..` directly under the root is discarded.
pub fn normalize(path: &Path) -> PathBuf {
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

/// Drops the compiler (first argument) and replaces every argument that is
/// textually identical to `file` with `resolved`.
pub fn substitute_arguments(arguments: &[String], file: &str, resolved: &Path) -> Vec<String> {
    let resolved = resolved.to_string_lossy();
    arguments
        .iter()
        .skip(1)
        .map(|arg| {
            if arg == file {
                resolved.to_string()
            } else {
                arg.clone()
            }
        })
        .collect()
}
