//! Bounded head/tail sampling of file content

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes read from the start of a file; also used for binary sniffing
pub const HEAD_WINDOW_BYTES: u64 = 8 * 1024;

/// First and last lines of a text file
///
/// For files shorter than `2 * lines` the two windows overlap, and an empty
/// file yields two empty windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSample {
    pub head: Vec<String>,
    pub tail: Vec<String>,
}

impl ContentSample {
    pub fn first_line(&self) -> Option<&str> {
        self.head.first().map(String::as_str)
    }

    pub fn head_lines(&self) -> impl Iterator<Item = &str> {
        self.head.iter().map(String::as_str)
    }

    /// Head followed by tail
    pub fn all_lines(&self) -> impl Iterator<Item = &str> {
        self.head.iter().chain(&self.tail).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    Text(ContentSample),
    /// A NUL byte was found in the head window
    Binary,
}

/// Reads at most `HEAD_WINDOW_BYTES` from the start and `tail_window` bytes
/// from the end, never the whole file
pub fn sample_file(path: &Path, lines: usize, tail_window: u64) -> io::Result<Sample> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut head_bytes = Vec::with_capacity(len.min(HEAD_WINDOW_BYTES) as usize);
    (&mut file).take(HEAD_WINDOW_BYTES).read_to_end(&mut head_bytes)?;
    if head_bytes.contains(&0) {
        return Ok(Sample::Binary);
    }

    let head_text = String::from_utf8_lossy(&head_bytes);
    let head = first_lines(&head_text, lines);

    let whole_file_read = (head_bytes.len() as u64) >= len;
    let tail = if whole_file_read {
        last_lines(&head_text, lines)
    } else {
        let start = len.saturating_sub(tail_window);
        // One byte before the window tells whether it starts on a line boundary
        let read_from = start.saturating_sub(1);
        file.seek(SeekFrom::Start(read_from))?;
        let mut tail_bytes = Vec::new();
        file.take(len - read_from).read_to_end(&mut tail_bytes)?;
        let complete: &[u8] = if start == 0 {
            &tail_bytes
        } else {
            match tail_bytes.iter().position(|&b| b == b'\n') {
                Some(pos) => &tail_bytes[pos + 1..],
                None => &[],
            }
        };
        last_lines(&String::from_utf8_lossy(complete), lines)
    };

    Ok(Sample::Text(ContentSample { head, tail }))
}

fn first_lines(text: &str, n: usize) -> Vec<String> {
    text.lines().take(n).map(str::to_string).collect()
}

fn last_lines(text: &str, n: usize) -> Vec<String> {
    let all: Vec<&str> = text.lines().collect();
    let skip = all.len().saturating_sub(n);
    all[skip..].iter().map(|s| s.to_string()).collect()
}
