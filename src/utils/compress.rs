use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use zip::{write::FileOptions, ZipWriter};

use crate::constants::COMPRESSION_CHUNK_SIZE as CHUNK_SIZE;

/// File entry with its archive name
struct FileEntry {
    rel_path: String,
    abs_path: PathBuf,
}

fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(6))
        .unix_permissions(0o644)
}

/// Path of the archive for an output directory: a `.zip` sibling
pub fn archive_path_for(source_dir: &Path) -> PathBuf {
    let mut name = source_dir.file_name().unwrap_or_default().to_os_string();
    name.push(".zip");
    source_dir.with_file_name(name)
}

/// Worker function for compression threads
fn compression_worker(
    receiver: Receiver<Option<FileEntry>>,
    zip: Arc<Mutex<ZipWriter<fs::File>>>,
) -> Result<()> {
    // Thread-local buffer to avoid repeated allocations
    let mut buffer = vec![0u8; CHUNK_SIZE];

    while let Ok(Some(entry)) = receiver.recv() {
        let start = Instant::now();

        let file = fs::File::open(&entry.abs_path)
            .context(format!("Failed to open {}", entry.abs_path.display()))?;
        let mut reader = BufReader::new(file);

        // Acquire lock only when ready to write to the zip
        let mut zip = zip.lock().map_err(|_| anyhow!("Archive writer lock poisoned"))?;
        zip.start_file(entry.rel_path.clone(), entry_options())
            .context(format!("Failed to start file entry for {}", entry.rel_path))?;

        let mut written = 0u64;
        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .context(format!("Failed to read from {}", entry.abs_path.display()))?;
            if bytes_read == 0 {
                break;
            }
            zip.write_all(&buffer[..bytes_read])
                .context(format!("Failed to write to zip for {}", entry.rel_path))?;
            written += bytes_read as u64;
        }

        debug!("Compressed {} ({} bytes) in {:?}", entry.rel_path, written, start.elapsed());
    }

    Ok(())
}

/// Compress the output directory into a `.zip` sibling using a pool of
/// worker threads.
///
/// The directory is resolved to its canonical form first, so roots such as
/// `.` or `snap/..` still get their archive next to them rather than inside.
///
/// # Arguments
///
/// * `source_dir` - The output root to archive
///
/// # Returns
///
/// * `Result<PathBuf>` - Path of the written archive. Entries are relative to
///   `source_dir`; leftover `.tmp` files are skipped.
///
/// # Example
///
/// ```no_run
/// use host_snapshot::utils::compress::compress_output_dir;
/// use std::path::Path;
///
/// # fn main() -> anyhow::Result<()> {
/// let zip_path = compress_output_dir(Path::new("/tmp/host-snapshot-ws-20240101-120000"))?;
/// assert_eq!(zip_path.extension().and_then(|e| e.to_str()), Some("zip"));
/// # Ok(())
/// # }
/// ```
pub fn compress_output_dir(source_dir: &Path) -> Result<PathBuf> {
    let start = Instant::now();
    let canonical = fs::canonicalize(source_dir)
        .context(format!("Failed to resolve {}", source_dir.display()))?;
    if canonical.file_name().is_none() {
        bail!("Cannot place an archive next to {}", canonical.display());
    }
    let source_dir = canonical.as_path();
    let zip_path = archive_path_for(source_dir);
    info!("Archiving {} to {}", source_dir.display(), zip_path.display());

    let zip_file = fs::File::create(&zip_path)
        .context(format!("Failed to create zip file {}", zip_path.display()))?;
    let zip = Arc::new(Mutex::new(ZipWriter::new(zip_file)));

    let (sender, receiver) = bounded::<Option<FileEntry>>(256);
    let thread_count = std::cmp::min(num_cpus::get(), 4).max(1);

    let mut workers = Vec::with_capacity(thread_count);
    for i in 0..thread_count {
        let worker_receiver = receiver.clone();
        let worker_zip = Arc::clone(&zip);
        let worker = std::thread::Builder::new()
            .name(format!("compression-{}", i))
            .spawn(move || compression_worker(worker_receiver, worker_zip))
            .context("Failed to spawn compression worker")?;
        workers.push(worker);
    }
    // Sends fail instead of blocking once every worker is gone
    drop(receiver);

    let mut dirs = Vec::new();
    let scanned = scan_directory(source_dir, source_dir, &mut dirs, &sender);

    // Signal end of work to all workers, even when the scan failed
    for _ in 0..thread_count {
        if sender.send(None).is_err() {
            break;
        }
    }

    let mut worker_error = None;
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Compression worker failed: {:#}", e);
                worker_error.get_or_insert(e);
            }
            Err(_) => {
                worker_error.get_or_insert(anyhow!("Compression worker panicked"));
            }
        }
    }
    scanned?;
    if let Some(e) = worker_error {
        return Err(e);
    }

    let mut zip = Arc::try_unwrap(zip)
        .map_err(|_| anyhow!("Archive writer still shared"))?
        .into_inner()
        .map_err(|_| anyhow!("Archive writer lock poisoned"))?;

    // Add all directory entries (after files to avoid conflicts)
    for dir in dirs {
        zip.add_directory(dir, FileOptions::default())?;
    }
    zip.finish().context("Failed to finalize zip file")?;

    info!("Archived output to {} in {:?}", zip_path.display(), start.elapsed());
    Ok(zip_path)
}

/// Scan directory and queue files for compression
fn scan_directory(
    base_path: &Path,
    dir_path: &Path,
    dirs: &mut Vec<String>,
    sender: &Sender<Option<FileEntry>>,
) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir_path)
        .context(format!("Failed to read {}", dir_path.display()))?
        .collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let rel_path = path
            .strip_prefix(base_path)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        if path.is_dir() {
            dirs.push(format!("{}/", rel_path));
            scan_directory(base_path, &path, dirs, sender)?;
        } else if !rel_path.ends_with(".tmp") {
            sender
                .send(Some(FileEntry { rel_path, abs_path: path }))
                .map_err(|_| anyhow!("Compression workers stopped early"))?;
        }
    }

    Ok(())
}
