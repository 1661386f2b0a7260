//! Vault path normalization.

use crate::primitives::{PrimitiveError, VaultKey};
use crate::tombstone::KeyType;
use std::path::{Component, Path, PathBuf};

/// Convert an absolute path inside the vault into its vault-relative key.
///
/// Components are joined with `/` regardless of the platform separator.
/// `..` is resolved lexically against the preceding segment. Paths that
/// escape the root, the root itself, and non-UTF-8 paths are rejected.
pub fn vault_relative_key(
    vault_root: &Path,
    absolute_path: &Path,
    key_type: KeyType,
) -> Result<VaultKey, PrimitiveError> {
    let segments = vault_segments(vault_root, absolute_path)?;
    VaultKey::from_segments(segments, key_type)
}

/// Rebuild `absolute_path` under `vault_root` with `.` and `..` resolved.
///
/// Symlinks are not consulted.
pub fn resolve_vault_path(
    vault_root: &Path,
    absolute_path: &Path,
) -> Result<PathBuf, PrimitiveError> {
    let segments = vault_segments(vault_root, absolute_path)?;
    Ok(segments
        .into_iter()
        .fold(vault_root.to_path_buf(), |path, segment| path.join(segment)))
}

fn vault_segments<'a>(
    vault_root: &Path,
    absolute_path: &'a Path,
) -> Result<Vec<&'a str>, PrimitiveError> {
    let outside = || PrimitiveError::PathOutsideVault {
        path: absolute_path.to_string_lossy().into_owned(),
        vault_root: vault_root.to_string_lossy().into_owned(),
    };

    let relative = absolute_path.strip_prefix(vault_root).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment.to_str().ok_or_else(|| PrimitiveError::NonUtf8Path {
                    path: absolute_path.to_string_lossy().into_owned(),
                })?;
                segments.push(segment);
            },
            Component::CurDir => {},
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(outside());
                }
            },
            Component::RootDir | Component::Prefix(_) => return Err(outside()),
        }
    }

    if segments.is_empty() {
        return Err(PrimitiveError::PathIsVaultRoot {
            path: absolute_path.to_string_lossy().into_owned(),
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_root_and_marks_folders() -> Result<(), PrimitiveError> {
        let root = Path::new("/vault");
        let file = vault_relative_key(root, Path::new("/vault/.obsidian/a.json"), KeyType::File)?;
        assert_eq!(file.as_str(), ".obsidian/a.json");

        let folder = vault_relative_key(root, Path::new("/vault/.obsidian/plugins/"), KeyType::Folder)?;
        assert_eq!(folder.as_str(), ".obsidian/plugins/");
        Ok(())
    }

    #[test]
    fn rejects_paths_outside_the_root() {
        let root = Path::new("/vault");
        for path in [
            "/other/a.md",
            "/vaultish/a.md",
            "/vault/../etc/passwd",
            "/vault/a/../../etc/passwd",
        ] {
            assert!(
                matches!(
                    vault_relative_key(root, Path::new(path), KeyType::File),
                    Err(PrimitiveError::PathOutsideVault { .. })
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn parent_segments_resolve_inside_the_vault() -> Result<(), PrimitiveError> {
        let root = Path::new("/vault");
        let key = vault_relative_key(root, Path::new("/vault/.obsidian/../notes.md"), KeyType::File)?;
        assert_eq!(key.as_str(), "notes.md");

        let nested = vault_relative_key(
            root,
            Path::new("/vault/a/./b/../c/"),
            KeyType::Folder,
        )?;
        assert_eq!(nested.as_str(), "a/c/");

        let resolved = resolve_vault_path(root, Path::new("/vault/.obsidian/../notes.md"))?;
        assert_eq!(resolved, PathBuf::from("/vault/notes.md"));
        Ok(())
    }

    #[test]
    fn parent_segments_back_to_the_root_are_rejected() {
        let result = resolve_vault_path(Path::new("/vault"), Path::new("/vault/a/.."));
        assert!(matches!(result, Err(PrimitiveError::PathIsVaultRoot { .. })));
    }

    #[test]
    fn rejects_the_root_itself() {
        let result = vault_relative_key(Path::new("/vault"), Path::new("/vault/"), KeyType::Folder);
        assert!(matches!(result, Err(PrimitiveError::PathIsVaultRoot { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_non_utf8_components() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/vault").join(OsStr::from_bytes(b"bad\xff"));
        let result = vault_relative_key(Path::new("/vault"), &path, KeyType::File);
        assert!(matches!(result, Err(PrimitiveError::NonUtf8Path { .. })));
    }

    proptest! {
        #[test]
        fn keys_round_trip_segments(
            segments in proptest::collection::vec("[a-zA-Z0-9_ -][a-zA-Z0-9._ -]{0,11}", 1..6),
            folder in any::<bool>(),
        ) {
            let root = PathBuf::from("/vault");
            let mut path = root.clone();
            for segment in &segments {
                path.push(segment);
            }
            let key_type = if folder { KeyType::Folder } else { KeyType::File };

            let key = vault_relative_key(&root, &path, key_type)
                .map_err(|error| TestCaseError::fail(error.to_string()))?;

            let mut expected = segments.join("/");
            if folder {
                expected.push('/');
            }
            prop_assert_eq!(key.as_str(), expected.as_str());
            prop_assert_eq!(key.key_type(), key_type);
        }
    }
}
