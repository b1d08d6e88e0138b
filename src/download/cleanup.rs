//! Temporary file housekeeping for the download directory.

use std::io;
use std::path::Path;

use crate::download::media::MediaFile;

pub async fn ensure_dir(dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

/// Removes the media file and every sidecar sharing its token.
pub async fn cleanup_media(file: &MediaFile) {
    match tokio::fs::remove_file(&file.path).await {
        Ok(()) => log::debug!("Cleaned up {}", file.path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", file.path.display(), e),
    }
    if let Some(dir) = file.path.parent() {
        remove_token_files(dir, &file.token).await;
    }
}

/// Deletes every file in `dir` whose name contains `token`. Returns how many were removed.
pub async fn remove_token_files(dir: &Path, token: &str) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cleanup: cannot read {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_name().to_string_lossy().contains(token) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("Failed to remove {}: {}", entry.path().display(), e),
        }
    }
    removed
}

/// Empties the download directory, keeping the directory itself.
pub async fn cleanup_all(dir: &Path) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let result = if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
    log::info!("Cleaned {} entries from {}", removed, dir.display());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::media::MediaKind;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_media_removes_sidecars_only_for_token() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "C1_abc123.mp4");
        touch(tmp.path(), "C1_abc123.info.json");
        touch(tmp.path(), "C2_zzz999.mp4");

        let file = MediaFile {
            path: tmp.path().join("C1_abc123.mp4"),
            file_name: "C1_abc123.mp4".into(),
            size_bytes: 1,
            title: "t".into(),
            uploader: None,
            description: None,
            token: "abc123".into(),
            kind: MediaKind::Video,
        };
        cleanup_media(&file).await;

        assert!(!tmp.path().join("C1_abc123.mp4").exists());
        assert!(!tmp.path().join("C1_abc123.info.json").exists());
        assert!(tmp.path().join("C2_zzz999.mp4").exists());
    }

    #[tokio::test]
    async fn test_cleanup_media_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let file = MediaFile {
            path: tmp.path().join("gone_tok.mp4"),
            file_name: "gone_tok.mp4".into(),
            size_bytes: 0,
            title: "t".into(),
            uploader: None,
            description: None,
            token: "tok".into(),
            kind: MediaKind::Video,
        };
        cleanup_media(&file).await;
    }

    #[tokio::test]
    async fn test_cleanup_all_empties_directory() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.mp4");
        touch(tmp.path(), "b.info.json");
        std::fs::create_dir(tmp.path().join("nested")).unwrap();

        let removed = cleanup_all(tmp.path()).await.unwrap();
        assert_eq!(removed, 3);
        assert!(tmp.path().exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_all_missing_dir_is_ok() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert_eq!(cleanup_all(&missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
