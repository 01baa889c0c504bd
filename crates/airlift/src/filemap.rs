use std::io;
use std::path::{Path, PathBuf, StripPrefixError};

use common::hash;
use common::release::FilesMap;
use derive_more::{Display, Error, From};
use walkdir::WalkDir;

/// Errors that may occur while fingerprinting the asset tree.
#[derive(Debug, Display, From, Error)]
pub(crate) enum FileMapError {
    /// [`walkdir`]-crate specific error.
    WalkDir(walkdir::Error),

    /// IO error.
    Io(io::Error),

    /// Unable to strip the asset root prefix from a path.
    StripPrefix(StripPrefixError),

    /// Asset path is not representable in the release manifest.
    #[display(fmt = "file {:?} contains non-unicode symbols in path", _0)]
    #[from(ignore)]
    NonUnicodePath(#[error(not(source))] PathBuf),
}

/// Fingerprints every regular file under `root`.
///
/// Keys are relative to `root` and use forward slashes regardless of the
/// host separator; values are lowercase hex MD5 digests of the file
/// contents. A failure on any single file aborts the whole build, there is
/// no partial-map result.
pub(crate) fn build_file_map(root: &Path) -> Result<FilesMap, FileMapError> {
    let mut files_map = FilesMap::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root)?;
        let Some(relative) = relative.to_str() else {
            return Err(FileMapError::NonUnicodePath(entry.path().to_owned()));
        };

        let digest = hash::md5_file(entry.path())?;

        files_map.insert(relative.replace('\\', "/"), hex::encode(digest));
    }

    Ok(files_map)
}
