//! File tailer for growing GC log files.
//!
//! Tracks a read offset and the file inode, detecting rotation (inode
//! change) and truncation (`-XX:+UseGCLogFileRotation` reuses the path).
//! A final line without a newline is carried over until the JVM finishes
//! writing it — GC lines are written in bursts and a half line must never
//! reach the parser.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Maximum lines returned by a single `read_new_lines()` call, bounding
/// memory when a large backlog is replayed.
const MAX_LINES_PER_READ: usize = 10_000;

/// Where a new tailer starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailFrom {
    /// Replay the whole file. GC analysis usually wants full history.
    Start,
    /// Only lines appended after the tailer was created.
    End,
}

/// Reads new complete lines appended to a file since the last position.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    offset: u64,
    inode: u64,
    /// Bytes of an unterminated final line, kept until its newline arrives.
    partial: String,
}

impl FileTailer {
    /// Creates a tailer. Returns `Err` if the file cannot be stat'd.
    pub fn new(path: PathBuf, from: TailFrom) -> io::Result<Self> {
        let metadata = fs::metadata(&path)?;
        let offset = match from {
            TailFrom::Start => 0,
            TailFrom::End => metadata.len(),
        };

        Ok(Self {
            path,
            offset,
            inode: get_inode(&metadata),
            partial: String::new(),
        })
    }

    /// Reads complete lines appended since the last call.
    ///
    /// A rotated (inode changed) or truncated file is re-read from the
    /// beginning. A missing file returns an empty batch — rotation may be
    /// in progress, the next poll will find the new file.
    pub fn read_new_lines(&mut self) -> io::Result<Vec<String>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let current_inode = get_inode(&metadata);
        let current_size = metadata.len();

        if current_inode != self.inode || current_size < self.offset {
            self.inode = current_inode;
            self.offset = 0;
            self.partial.clear();
        }

        if current_size <= self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut reader = BufReader::new(file);

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            self.offset += n as u64;

            if buf.ends_with(b"\n") {
                let mut line = std::mem::take(&mut self.partial);
                line.push_str(String::from_utf8_lossy(trim_line_ending(&buf)).as_ref());
                lines.push(line);
                if lines.len() >= MAX_LINES_PER_READ {
                    break;
                }
            } else {
                // EOF mid-line: keep the fragment for the next poll.
                self.partial.push_str(String::from_utf8_lossy(&buf).as_ref());
                break;
            }
        }

        Ok(lines)
    }

    /// The tailed file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Strips the trailing `\n` and an optional preceding `\r`.
fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(unix)]
fn get_inode(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

/// Non-Unix fallback: size-based truncation detection only.
#[cfg(not(unix))]
fn get_inode(_metadata: &fs::Metadata) -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_start_replays_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "line 1\nline 2\n").unwrap();

        let mut tailer = FileTailer::new(path, TailFrom::Start).unwrap();
        let lines = tailer.read_new_lines().unwrap();
        assert_eq!(lines, vec!["line 1", "line 2"]);
    }

    #[test]
    fn test_from_end_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "old line\n").unwrap();

        let mut tailer = FileTailer::new(path.clone(), TailFrom::End).unwrap();
        assert!(tailer.read_new_lines().unwrap().is_empty());

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "new line").unwrap();
        drop(file);

        assert_eq!(tailer.read_new_lines().unwrap(), vec!["new line"]);
        assert!(tailer.read_new_lines().unwrap().is_empty());
    }

    #[test]
    fn test_partial_line_is_carried_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "0.084: [GC (Alloc").unwrap();

        let mut tailer = FileTailer::new(path.clone(), TailFrom::Start).unwrap();
        assert!(tailer.read_new_lines().unwrap().is_empty());

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "ation Failure)]\nnext").unwrap();
        drop(file);

        let lines = tailer.read_new_lines().unwrap();
        assert_eq!(lines, vec!["0.084: [GC (Allocation Failure)]"]);
    }

    #[test]
    fn test_truncation_restarts_from_beginning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "a".repeat(1000)).unwrap();

        let mut tailer = FileTailer::new(path.clone(), TailFrom::End).unwrap();
        std::fs::write(&path, "after rotation\n").unwrap();

        assert_eq!(tailer.read_new_lines().unwrap(), vec!["after rotation"]);
    }

    #[test]
    fn test_missing_file_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "content\n").unwrap();

        let mut tailer = FileTailer::new(path.clone(), TailFrom::End).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(tailer.read_new_lines().unwrap().is_empty());
    }

    #[test]
    fn test_crlf_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.log");
        std::fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut tailer = FileTailer::new(path, TailFrom::Start).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["one", "two"]);
    }
}
