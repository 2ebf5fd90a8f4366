// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use fs2::FileExt;

use crate::Error;

/// A writer for size-rotated files that is safe to share between processes.
///
/// Backups are named `<path>.1` (newest) to `<path>.N` (oldest).
#[derive(Debug)]
pub struct RollingFileWriter {
    path: PathBuf,
    max_size: u64,
    max_backups: usize,
    // flock-style locks belong to the open file description, so threads of this process take
    // turns on the handle before competing with other processes.
    lock: Mutex<File>,
}

impl RollingFileWriter {
    pub(crate) fn new(path: PathBuf, max_size: u64, max_backups: usize) -> Result<Self, Error> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::new("failed to create log directory")
                    .with_context("path", dir.display())
                    .with_source(err)
            })?;
        }

        let lock_path = lock_path(&path)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|err| {
                Error::new("failed to create lock file")
                    .with_context("path", lock_path.display())
                    .with_source(err)
            })?;

        // surface permission problems at construction rather than on the first record
        open_log_file(&path)?;

        Ok(Self {
            path,
            max_size,
            max_backups,
            lock: Mutex::new(lock),
        })
    }

    /// The path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path of the `index`-th backup.
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = OsString::from(self.path.as_os_str());
        path.push(format!(".{index}"));
        PathBuf::from(path)
    }

    /// Append one formatted record, rotating first if it would push the file past the size
    /// threshold.
    pub fn write_record(&self, buf: &[u8]) -> Result<(), Error> {
        let lock = self
            .lock
            .lock()
            .map_err(|_| Error::new("rolling file lock is poisoned"))?;

        FileExt::lock_exclusive(&*lock).map_err(|err| {
            Error::new("failed to lock log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })?;
        let result = self.write_locked(buf);
        let unlocked = FileExt::unlock(&*lock).map_err(|err| {
            Error::new("failed to unlock log file")
                .with_context("path", self.path.display())
                .with_source(err)
        });

        result.and(unlocked)
    }

    fn write_locked(&self, buf: &[u8]) -> Result<(), Error> {
        // another process may have rotated since our last write, so always look at the path
        let current_size = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(err) => return Err(self.io_error("failed to stat log file", err)),
        };

        if self.should_rollover(current_size, buf.len() as u64) {
            self.rollover()?;
        }

        let mut file = open_log_file(&self.path)?;
        file.write_all(buf)
            .and_then(|()| file.flush())
            .map_err(|err| self.io_error("failed to write log file", err))
    }

    fn should_rollover(&self, current_size: u64, incoming: u64) -> bool {
        self.max_size > 0 && current_size > 0 && current_size + incoming >= self.max_size
    }

    fn rollover(&self) -> Result<(), Error> {
        if self.max_backups == 0 {
            File::create(&self.path)
                .map_err(|err| self.io_error("failed to truncate log file", err))?;
            return Ok(());
        }

        for index in (1..self.max_backups).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                let dst = self.backup_path(index + 1);
                remove_if_exists(&dst).map_err(|err| self.io_error("failed to remove backup", err))?;
                fs::rename(&src, &dst)
                    .map_err(|err| self.io_error("failed to shift backup", err))?;
            }
        }

        let first = self.backup_path(1);
        remove_if_exists(&first).map_err(|err| self.io_error("failed to remove backup", err))?;
        if self.path.exists() {
            fs::rename(&self.path, &first)
                .map_err(|err| self.io_error("failed to rotate log file", err))?;
        }
        Ok(())
    }

    fn io_error(&self, message: &'static str, err: io::Error) -> Error {
        Error::new(message)
            .with_context("path", self.path.display())
            .with_source(err)
    }
}

fn lock_path(path: &Path) -> Result<PathBuf, Error> {
    let filename = path.file_name().ok_or_else(|| {
        Error::new("log path has no file name").with_context("path", path.display())
    })?;

    let mut lock_name = OsString::from(".");
    lock_name.push(filename);
    lock_name.push(".lock");
    Ok(path.with_file_name(lock_name))
}

fn open_log_file(path: &Path) -> Result<File, Error> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| {
            Error::new("failed to open log file")
                .with_context("path", path.display())
                .with_source(err)
        })
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
