use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of an upload (64 chars).
pub fn sha256_hex(data: &[u8]) -> String {
    to_hex(&sha256_bytes(data))
}

fn to_hex(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Content-addressed location of an upload.
/// Layout: `<uploads>/<first_byte_hex>/<full_hex>.<ext>`
pub fn upload_path(uploads_dir: &Path, digest: &[u8; 32], ext: &str) -> PathBuf {
    uploads_dir
        .join(format!("{:02x}", digest[0]))
        .join(format!("{}.{ext}", to_hex(digest)))
}

/// Keep a copy of the uploaded bytes. The same bytes always land at the same
/// path, so re-uploading a document overwrites rather than duplicates it.
pub fn store_upload(uploads_dir: &Path, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_lowercase();
    let dest = upload_path(uploads_dir, &sha256_bytes(data), &ext);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, data)?;
    debug!(path = %dest.display(), bytes = data.len(), "stored upload");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn upload_path_layout() {
        let base = PathBuf::from("/data/uploads");
        let hash = "ab".repeat(32);
        assert_eq!(
            upload_path(&base, &[0xab; 32], "png"),
            PathBuf::from(format!("/data/uploads/ab/{hash}.png"))
        );
    }

    #[test]
    fn upload_path_pads_leading_byte() {
        let mut digest = [0u8; 32];
        digest[0] = 0x0f;
        let path = upload_path(Path::new("u"), &digest, "pdf");
        assert_eq!(path.parent().unwrap(), Path::new("u/0f"));
        assert_eq!(path.file_name().unwrap().len(), 64 + 4);
    }

    #[test]
    fn stored_path_matches_digest() {
        let dir = tempfile::tempdir().unwrap();
        let p = store_upload(dir.path(), "card.png", b"").unwrap();
        assert_eq!(
            p,
            dir.path()
                .join("e3")
                .join("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855.png")
        );
    }

    #[test]
    fn store_upload_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = store_upload(dir.path(), "pan_card.PNG", b"same bytes").unwrap();
        let p2 = store_upload(dir.path(), "renamed.png", b"same bytes").unwrap();
        let p3 = store_upload(dir.path(), "other.png", b"different bytes").unwrap();

        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
        assert_eq!(p1.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&p1).unwrap(), b"same bytes");
    }

    #[test]
    fn store_upload_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = store_upload(dir.path(), "scan", b"x").unwrap();
        assert_eq!(p.extension().unwrap(), "bin");
    }
}
