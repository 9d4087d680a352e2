//! Per-target staging locks.
//!
//! Two invocations building the same target would race on its staged output,
//! so the build-and-stage step for a target runs under an exclusive advisory
//! lock on `<root>/.stagebin/locks/<name>.lock`. The lock covers only that one
//! target: builds of different targets never wait on each other.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LockError;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub target: String,
}

/// Held while a target's artifact is being built and staged. Released on drop.
#[derive(Debug)]
pub struct StagingLock {
  file: File,
  lock_path: PathBuf,
}

impl StagingLock {
  /// Block until the lock for `target` is held.
  pub fn acquire(lock_dir: &Path, target: &str) -> Result<Self, LockError> {
    std::fs::create_dir_all(lock_dir).map_err(|source| LockError::CreateDir {
      path: lock_dir.to_path_buf(),
      source,
    })?;

    let lock_path = lock_dir.join(format!("{target}.lock"));
    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(|source| LockError::OpenFile {
        path: lock_path.clone(),
        source,
      })?;

    let lock_failed = |source| LockError::LockFailed {
      path: lock_path.clone(),
      source,
    };

    match try_lock(&file) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
        match read_metadata_from(&lock_path) {
          Some(holder) => info!(target, pid = holder.pid, "waiting for another build of this target"),
          None => info!(target, "waiting for another build of this target"),
        }
        lock_blocking(&file).map_err(lock_failed)?;
      }
      Err(e) => return Err(lock_failed(e)),
    }

    write_metadata(&file, target).map_err(lock_failed)?;
    debug!(target, path = %lock_path.display(), "acquired staging lock");

    Ok(Self { file, lock_path })
  }

  /// Acquire from async code without blocking the runtime's worker threads.
  pub async fn acquire_async(lock_dir: PathBuf, target: String) -> Result<Self, LockError> {
    let path = lock_dir.join(format!("{target}.lock"));
    tokio::task::spawn_blocking(move || Self::acquire(&lock_dir, &target))
      .await
      .map_err(|_| LockError::Cancelled(path))?
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  /// Reads the lock metadata through the held handle.
  ///
  /// Opening a second handle would fail on Windows, where locks are mandatory.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }
}

fn write_metadata(file: &File, target: &str) -> io::Result<()> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    target: target.to_string(),
  };

  file.set_len(0)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(io::Error::other)?;
  writer.flush()
}

fn read_metadata_from(lock_path: &Path) -> Option<LockMetadata> {
  let mut contents = String::new();
  File::open(lock_path).ok()?.read_to_string(&mut contents).ok()?;
  serde_json::from_str(&contents).ok()
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  flock(file, rustix::fs::FlockOperation::NonBlockingLockExclusive)
}

#[cfg(unix)]
fn lock_blocking(file: &File) -> io::Result<()> {
  flock(file, rustix::fs::FlockOperation::LockExclusive)
}

#[cfg(unix)]
fn flock(file: &File, operation: rustix::fs::FlockOperation) -> io::Result<()> {
  use std::os::unix::io::AsFd;

  rustix::fs::flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File) -> io::Result<()> {
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY};

  lock_file_ex(file, LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK).map_err(|e| {
    // ERROR_LOCK_VIOLATION
    if e.raw_os_error() == Some(33) {
      io::Error::from(io::ErrorKind::WouldBlock)
    } else {
      e
    }
  })
}

#[cfg(windows)]
fn lock_blocking(file: &File) -> io::Result<()> {
  use windows_sys::Win32::Storage::FileSystem::LOCKFILE_EXCLUSIVE_LOCK;

  lock_file_ex(file, LOCKFILE_EXCLUSIVE_LOCK)
}

#[cfg(windows)]
fn lock_file_ex(file: &File, flags: u32) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::LockFileEx;

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
