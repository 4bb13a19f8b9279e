use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use walkdir::WalkDir;
use zip::{write::FileOptions, ZipWriter};

use crate::constants::{
    ARCHIVE_EXTENSION, COMPRESSED_EXTENSIONS, COMPRESSION_CHUNK_SIZE as CHUNK_SIZE,
    COMPRESSION_QUEUE_DEPTH, LARGE_FILE_COMPRESSION_THRESHOLD, MAX_COMPRESSION_WORKERS,
};

/// File entry with its compression options
struct FileEntry {
    rel_path: String,
    abs_path: PathBuf,
    options: FileOptions,
}

/// Determine compression level based on file type and size.
///
/// Already-compressed formats and very large files get the fastest level;
/// everything else gets the default level. Entries of 4 GiB or more are
/// written with ZIP64 headers.
pub fn get_compression_options(path: &Path) -> FileOptions {
    let low_compression = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => COMPRESSED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        _ => false,
    };

    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let level = if low_compression || size > LARGE_FILE_COMPRESSION_THRESHOLD {
        1
    } else {
        6
    };

    FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(level))
        .unix_permissions(0o644)
        .large_file(needs_zip64(size))
}

/// Whether an entry of `size` bytes overflows the classic 32-bit ZIP fields
pub fn needs_zip64(size: u64) -> bool {
    size >= u32::MAX as u64
}

/// Worker loop: pull entries off the queue and stream them into the shared archive.
fn compression_worker(
    receiver: Receiver<Option<FileEntry>>,
    zip: Arc<Mutex<ZipWriter<fs::File>>>,
) -> Result<()> {
    let mut buffer = vec![0u8; CHUNK_SIZE];

    while let Ok(Some(entry)) = receiver.recv() {
        let start = Instant::now();

        let file = fs::File::open(&entry.abs_path)
            .context(format!("Failed to open {}", entry.abs_path.display()))?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        {
            let mut zip = zip
                .lock()
                .map_err(|_| anyhow!("Archive writer lock poisoned"))?;

            zip.start_file(entry.rel_path.clone(), entry.options)
                .context(format!("Failed to start file entry for {}", entry.rel_path))?;

            loop {
                let bytes_read = reader
                    .read(&mut buffer)
                    .context(format!("Failed to read from {}", entry.abs_path.display()))?;

                if bytes_read == 0 {
                    break;
                }

                zip.write_all(&buffer[..bytes_read])
                    .context(format!("Failed to write to archive for {}", entry.rel_path))?;
            }
        }

        debug!("Compressed {} ({} bytes) in {:?}", entry.rel_path, file_size, start.elapsed());
    }

    Ok(())
}

/// Archive entry name for a path below `base`, always `/`-separated
fn archive_name_for(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Write every file and directory under `source_dir` into a new ZIP at `zip_path`.
///
/// Returns the number of file entries written. Any unreadable entry or
/// worker failure fails the whole archive.
pub fn create_zip_file(source_dir: &Path, zip_path: &Path) -> Result<usize> {
    let start = Instant::now();

    let zip_file = fs::File::create(zip_path)
        .context(format!("Failed to create archive {}", zip_path.display()))?;
    let zip = Arc::new(Mutex::new(ZipWriter::new(zip_file)));

    let (sender, receiver) = bounded::<Option<FileEntry>>(COMPRESSION_QUEUE_DEPTH);
    let thread_count = std::cmp::min(num_cpus::get(), MAX_COMPRESSION_WORKERS).max(1);

    let mut workers = Vec::with_capacity(thread_count);
    for i in 0..thread_count {
        let worker_receiver = receiver.clone();
        let worker_zip = Arc::clone(&zip);
        let handle = std::thread::Builder::new()
            .name(format!("compression-{}", i))
            .spawn(move || compression_worker(worker_receiver, worker_zip))
            .context("Failed to spawn compression worker")?;
        workers.push(handle);
    }
    drop(receiver);

    let mut dirs = Vec::new();
    let scan_result = scan_directory(source_dir, &mut dirs, &sender);

    // Workers stop on the first None they see
    for _ in 0..thread_count {
        if sender.send(None).is_err() {
            break;
        }
    }
    drop(sender);

    let (file_count, mut first_error) = match scan_result {
        Ok(count) => (count, None),
        Err(e) => (0, Some(e)),
    };
    for worker in workers {
        let outcome = worker
            .join()
            .map_err(|_| anyhow!("Compression worker panicked"))
            .and_then(|r| r);
        if let Err(e) = outcome {
            first_error.get_or_insert(e);
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let mut zip = Arc::try_unwrap(zip)
        .map_err(|_| anyhow!("Archive writer still shared after workers finished"))?
        .into_inner()
        .map_err(|_| anyhow!("Archive writer lock poisoned"))?;

    for dir in dirs {
        zip.add_directory(dir, FileOptions::default())?;
    }

    zip.finish().context("Failed to finalize archive")?;

    info!("Archived {} files to {} in {:?}", file_count, zip_path.display(), start.elapsed());
    Ok(file_count)
}

/// Walk `base_path`, queueing files for the workers and remembering directories
fn scan_directory(
    base_path: &Path,
    dirs: &mut Vec<String>,
    sender: &Sender<Option<FileEntry>>,
) -> Result<usize> {
    let mut files = 0;
    for entry in WalkDir::new(base_path).min_depth(1).sort_by_file_name() {
        let entry = entry.context(format!("Failed to scan {}", base_path.display()))?;
        let path = entry.path();
        let rel_path = archive_name_for(base_path, path);

        if entry.file_type().is_dir() {
            dirs.push(format!("{}/", rel_path));
        } else {
            let options = get_compression_options(path);
            sender
                .send(Some(FileEntry {
                    rel_path,
                    abs_path: path.to_path_buf(),
                    options,
                }))
                .map_err(|_| anyhow!("All compression workers exited early"))?;
            files += 1;
        }
    }

    Ok(files)
}

/// Path of the archive `seal` will produce for `directory`
pub fn archive_path_for(directory: &Path, archive_name: &str) -> PathBuf {
    let file_name = if archive_name.ends_with(&format!(".{}", ARCHIVE_EXTENSION)) {
        archive_name.to_string()
    } else {
        format!("{}.{}", archive_name, ARCHIVE_EXTENSION)
    };

    directory
        .parent()
        .map(|p| p.join(&file_name))
        .unwrap_or_else(|| PathBuf::from(&file_name))
}

/// Seal a finished collection directory.
///
/// Writes `<parent>/<archive_name>.zip` with the full tree under `directory`,
/// and only once the archive is finalized removes `directory`. If archiving
/// fails the partial archive is discarded and `directory` is left untouched.
pub fn seal(directory: &Path, archive_name: &str) -> Result<PathBuf> {
    if !directory.is_dir() {
        return Err(anyhow!("Cannot seal {}: not a directory", directory.display()));
    }

    let archive_path = archive_path_for(directory, archive_name);
    info!("Sealing {} into {}", directory.display(), archive_path.display());

    let files = match create_zip_file(directory, &archive_path) {
        Ok(files) => files,
        Err(e) => {
            if archive_path.is_file() {
                if let Err(remove_err) = fs::remove_file(&archive_path) {
                    warn!("Failed to remove partial archive {}: {}", archive_path.display(), remove_err);
                }
            }
            return Err(e.context(format!(
                "Failed to seal {}; working directory left in place",
                directory.display()
            )));
        }
    };

    fs::remove_dir_all(directory)
        .context(format!("Archive written but failed to remove {}", directory.display()))?;

    info!("Sealed {} files into {}", files, archive_path.display());
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::read::ZipArchive;

    fn build_tree(base: &Path) {
        fs::create_dir_all(base.join("dir1/subdir1")).unwrap();
        fs::create_dir_all(base.join("dir2")).unwrap();
        fs::write(base.join("file1.txt"), b"Test content 1").unwrap();
        fs::write(base.join("file2.log"), b"Test log content").unwrap();
        fs::write(base.join("dir1/file3.txt"), b"Test content 3").unwrap();
        fs::write(base.join("dir1/subdir1/file4.txt"), b"Test content 4").unwrap();
        fs::write(base.join("dir2/file5.log"), b"Another log file").unwrap();
    }

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(fs::File::open(zip_path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_archive_path_for() {
        let dir = Path::new("/cases/x/extraction_results/Prefetch_export");
        assert_eq!(
            archive_path_for(dir, "Prefetch_export"),
            PathBuf::from("/cases/x/extraction_results/Prefetch_export.zip")
        );
        assert_eq!(
            archive_path_for(dir, "Prefetch_export.zip"),
            PathBuf::from("/cases/x/extraction_results/Prefetch_export.zip")
        );
    }

    #[test]
    fn test_create_zip_file_contains_tree() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        build_tree(source.path());

        let zip_path = out.path().join("tree.zip");
        create_zip_file(source.path(), &zip_path).unwrap();

        let names = entry_names(&zip_path);
        for expected in [
            "file1.txt",
            "file2.log",
            "dir1/",
            "dir1/file3.txt",
            "dir1/subdir1/",
            "dir1/subdir1/file4.txt",
            "dir2/file5.log",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_create_zip_file_content_round_trip() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(source.path().join("running_processes.txt"), b"PID NAME\n1 init\n").unwrap();

        let zip_path = out.path().join("p.zip");
        create_zip_file(source.path(), &zip_path).unwrap();

        let mut archive = ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let mut file = archive.by_name("running_processes.txt").unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "PID NAME\n1 init\n");
    }

    #[test]
    fn test_seal_removes_directory_after_archiving() {
        let root = TempDir::new().unwrap();
        let working = root.path().join("BET_export");
        build_tree(&working);

        let archive = seal(&working, "BET_export").unwrap();

        assert_eq!(archive, root.path().join("BET_export.zip"));
        assert!(archive.is_file());
        assert!(!working.exists());
        let names = entry_names(&archive);
        assert_eq!(names.iter().filter(|n| !n.ends_with('/')).count(), 5);
    }

    #[test]
    fn test_seal_empty_directory() {
        let root = TempDir::new().unwrap();
        let working = root.path().join("TeamViewer_export");
        fs::create_dir(&working).unwrap();

        let archive = seal(&working, "TeamViewer_export").unwrap();
        assert!(archive.is_file());
        assert!(entry_names(&archive).is_empty());
        assert!(!working.exists());
    }

    #[test]
    fn test_seal_failure_keeps_directory() {
        let root = TempDir::new().unwrap();
        let working = root.path().join("Prefetch_export");
        build_tree(&working);

        // A directory squatting on the archive path makes creation fail
        fs::create_dir(root.path().join("Prefetch_export.zip")).unwrap();

        let result = seal(&working, "Prefetch_export");
        assert!(result.is_err());
        assert!(working.join("dir1/subdir1/file4.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_seal_unreadable_file_keeps_directory_and_drops_partial_archive() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let working = root.path().join("Logs_export");
        build_tree(&working);
        let locked = working.join("dir2/file5.log");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores file modes, nothing to test there
        if fs::File::open(&locked).is_ok() {
            return;
        }

        let result = seal(&working, "Logs_export");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(result.is_err());
        assert!(working.is_dir());
        assert!(!root.path().join("Logs_export.zip").exists());
    }

    #[test]
    fn test_seal_rejects_missing_directory() {
        let root = TempDir::new().unwrap();
        assert!(seal(&root.path().join("nope"), "nope").is_err());
    }

    #[test]
    fn test_needs_zip64_boundary() {
        assert!(!needs_zip64(0));
        assert!(!needs_zip64(u32::MAX as u64 - 1));
        assert!(needs_zip64(u32::MAX as u64));
        assert!(needs_zip64(5 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_compression_options_levels_do_not_panic() {
        for name in ["a.zip", "b.JPG", "c.txt", "d"] {
            let _ = get_compression_options(Path::new(name));
        }
    }
}
