use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use photoalbum_core::catalog::Catalog;
use photoalbum_core::domain::{FileMetadata, FileStatus, UploadedFile};
use photoalbum_core::{Library, UploadProgress};
use tracing::warn;
use walkdir::WalkDir;

pub fn run<C: Catalog>(library: &Library<C>, paths: &[PathBuf]) -> Result<()> {
    let files: Vec<UploadedFile> = expand(paths)
        .iter()
        .filter_map(|path| match read_upload(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                None
            }
        })
        .collect();

    if files.is_empty() {
        println!("Nothing to upload.");
        return Ok(());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = library.upload(
        files,
        Some(&mut |progress| match progress {
            UploadProgress::Start { total } => {
                pb.set_length(total as u64);
                pb.set_position(0);
                pb.set_message("Uploading photos...");
            }
            UploadProgress::FileDone { file_name } => {
                pb.inc(1);
                pb.set_message(file_name);
            }
            UploadProgress::Complete {
                ingested,
                skipped,
                failed,
            } => {
                pb.finish_with_message(format!(
                    "{ingested} uploaded, {skipped} skipped, {failed} failed"
                ));
            }
        }),
    );

    for file in &report.files {
        match &file.status {
            FileStatus::Ingested { album_name, .. } => {
                println!("  {} -> {}", file.file_name, album_name)
            }
            FileStatus::Skipped(reason) => println!("  {} skipped: {}", file.file_name, reason),
            FileStatus::Failed(e) => println!("  {} failed: {}", file.file_name, e),
        }
    }

    println!("Upload complete.");
    Ok(())
}

/// Files named directly, plus every file below named directories, sorted.
fn expand(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files
}

fn read_upload(path: &Path) -> std::io::Result<UploadedFile> {
    let metadata = fs::metadata(path)?;
    let data = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(UploadedFile {
        meta: FileMetadata {
            name,
            media_type,
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        },
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_walks_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("trip/day1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.jpg"), b"b").unwrap();
        fs::write(tmp.path().join("trip/a.png"), b"a").unwrap();
        let single = tmp.path().join("single.gif");
        fs::write(&single, b"g").unwrap();

        let files = expand(&[tmp.path().join("trip"), single.clone()]);
        assert_eq!(files.len(), 3);
        assert!(files.contains(&single));
        assert!(files.contains(&nested.join("b.jpg")));
    }

    #[test]
    fn test_read_upload_guesses_media_type() {
        let tmp = tempfile::tempdir().unwrap();
        let jpg = tmp.path().join("photo.JPG");
        let txt = tmp.path().join("notes.txt");
        fs::write(&jpg, b"\xff\xd8").unwrap();
        fs::write(&txt, b"hi").unwrap();

        let photo = read_upload(&jpg).unwrap();
        assert_eq!(photo.meta.name, "photo.JPG");
        assert_eq!(photo.meta.media_type, "image/jpeg");
        assert_eq!(photo.meta.size, 2);
        assert!(photo.meta.last_modified.is_some());
        assert!(photo.meta.is_image());

        let notes = read_upload(&txt).unwrap();
        assert!(!notes.meta.is_image());
    }

    #[test]
    fn test_read_upload_missing_file() {
        assert!(read_upload(Path::new("/nonexistent/photo.jpg")).is_err());
    }
}
