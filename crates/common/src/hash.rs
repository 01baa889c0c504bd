use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size for streamed file hashing.
const CHUNK_SIZE: usize = 64 * 1024;

pub fn md5(data: &[u8]) -> [u8; 16] {
    md5::compute(data).0
}

/// Streamed MD5 over a file's contents, without buffering the whole file.
pub fn md5_file(path: &Path) -> io::Result<[u8; 16]> {
    let mut file = File::open(path)?;
    let mut context = md5::Context::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        context.consume(&buf[..read]);
    }

    Ok(context.compute().0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn known_vector() {
        // RFC 1321 test suite value.
        assert_eq!(
            hex::encode(md5(b"abc")),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn file_digest_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        fs::write(&path, b"over-the-air").unwrap();

        assert_eq!(md5_file(&path).unwrap(), md5(b"over-the-air"));
    }

    #[test]
    fn unchanged_file_hashes_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stable.js");
        fs::write(&path, b"console.log(1);").unwrap();

        assert_eq!(md5_file(&path).unwrap(), md5_file(&path).unwrap());
    }

    #[test]
    fn single_byte_change_alters_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");

        fs::write(&path, b"<html>a</html>").unwrap();
        let before = md5_file(&path).unwrap();

        fs::write(&path, b"<html>b</html>").unwrap();
        let after = md5_file(&path).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(md5_file(Path::new("/definitely/not/here.txt")).is_err());
    }
}
