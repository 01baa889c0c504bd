use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::PathBuf;

use derive_more::{Display, Error, From};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors that may occur during the archive creation process.
#[derive(Debug, Display, From, Error)]
pub(crate) enum ArchiverError {
    /// [`zip`]-crate specific error.
    Zip(zip::result::ZipError),

    /// IO error.
    Io(io::Error),
}

/// Instruction to store the file at `src` under the name `dst` inside the
/// update archive.
pub(crate) struct ArchiveEntry {
    /// Source path on the local filesystem.
    pub src: PathBuf,

    /// Destination name inside the archive, as requested by the server.
    pub dst: String,
}

/// Packages exactly the given entries into a zip archive written to `file`.
///
/// Files are deflated at maximum compression and streamed entry by entry;
/// nothing is buffered whole. Returns the size of the finished archive in
/// bytes, once the writer has been finalized and flushed. On any error the
/// output must be considered unusable and must not be uploaded.
pub(crate) fn build_update_archive<W: Write + Seek>(
    entries: &[ArchiveEntry],
    file: W,
) -> Result<u64, ArchiverError> {
    let mut writer = ZipWriter::new(file);

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in entries {
        writer.start_file(entry.dst.as_str(), options)?;
        io::copy(&mut File::open(&entry.src)?, &mut writer)?;
    }

    let mut file = writer.finish()?;
    file.flush()?;

    Ok(file.stream_position()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::{Read, SeekFrom};

    use tempfile::TempDir;
    use zip::ZipArchive;

    /// Two source files in a temp dir.
    fn create_sources() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("index.html"), b"<html>airlift</html>").unwrap();
        fs::write(dir.path().join("app.js"), vec![0x42; 4096]).unwrap();

        dir
    }

    #[test]
    fn archive_contains_exactly_the_requested_entries() {
        let dir = create_sources();
        let entries = [
            ArchiveEntry {
                src: dir.path().join("index.html"),
                dst: String::from("index.html"),
            },
            ArchiveEntry {
                src: dir.path().join("app.js"),
                dst: String::from("js/app.js"),
            },
        ];

        let mut file = tempfile::tempfile().unwrap();
        let size = build_update_archive(&entries, &mut file).unwrap();
        assert!(size > 0);

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();

        assert_eq!(archive.len(), 2);

        let mut contents = Vec::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, b"<html>airlift</html>");

        contents.clear();
        archive
            .by_name("js/app.js")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, vec![0x42; 4096]);
    }

    #[test]
    fn destination_names_replace_source_paths() {
        let dir = create_sources();
        let entries = [ArchiveEntry {
            src: dir.path().join("index.html"),
            dst: String::from("renamed.html"),
        }];

        let mut file = tempfile::tempfile().unwrap();
        build_update_archive(&entries, &mut file).unwrap();

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();

        assert_eq!(archive.len(), 1);
        assert!(archive.by_name("renamed.html").is_ok());
        assert!(archive.by_name("index.html").is_err());
    }

    #[test]
    fn repeated_content_is_compressed() {
        let dir = create_sources();
        let entries = [ArchiveEntry {
            src: dir.path().join("app.js"),
            dst: String::from("app.js"),
        }];

        let mut file = tempfile::tempfile().unwrap();
        let size = build_update_archive(&entries, &mut file).unwrap();

        // 4096 identical bytes deflate to far less than their raw size.
        assert!(size < 4096, "archive size {size}");
    }

    #[test]
    fn missing_source_aborts_the_build() {
        let dir = create_sources();
        let entries = [ArchiveEntry {
            src: dir.path().join("missing.js"),
            dst: String::from("missing.js"),
        }];

        let mut file = tempfile::tempfile().unwrap();
        assert!(build_update_archive(&entries, &mut file).is_err());
    }

    #[test]
    fn empty_entry_list_builds_an_empty_archive() {
        let mut file = tempfile::tempfile().unwrap();
        let size = build_update_archive(&[], &mut file).unwrap();
        assert!(size > 0);

        file.seek(SeekFrom::Start(0)).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
