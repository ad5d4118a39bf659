use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Folder holding files produced for `user_id`.
///
/// The user id is hashed so arbitrary ids (emails, paths) map to a single safe
/// directory name.
pub fn user_dir(files_root: &Path, user_id: &str) -> PathBuf {
    let digest = Sha256::digest(user_id.as_bytes());
    files_root.join("user").join(hex::encode(digest))
}

/// Create the folder for `user_id` if needed and return its path.
pub fn ensure_user_dir(files_root: &Path, user_id: &str) -> std::io::Result<PathBuf> {
    let dir = user_dir(files_root, user_id);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
