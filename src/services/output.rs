//! In-memory output buffers
//!
//! Each session's output lands in a [`Scrollback`]: the last N lines of
//! plain text, with ANSI control sequences removed. PTY reader threads write
//! through an [`OutputSink`]; the store hands out sinks by [`BufferId`].

use crate::host::OutputStore;
use crate::types::BufferId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    /// Saw ESC
    Start,
    /// Inside `ESC [ ...` until a final byte
    Csi,
    /// Inside `ESC ] ...` until BEL or `ESC \`
    Osc,
    /// Saw ESC while inside an OSC string
    OscEsc,
}

/// Terminal output buffer - stores the last N lines of output
#[derive(Debug)]
pub struct Scrollback {
    lines: VecDeque<String>,
    /// Line being written (no newline yet)
    current: String,
    max_lines: usize,
    escape: Escape,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
}

impl Scrollback {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            current: String::new(),
            max_lines: max_lines.max(1),
            escape: Escape::None,
            pending: Vec::new(),
        }
    }

    /// Feed raw PTY bytes
    pub fn push_bytes(&mut self, data: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(data);

        let text = match std::str::from_utf8(&bytes) {
            Ok(s) => s.to_string(),
            Err(e) if e.error_len().is_none() => {
                // Incomplete sequence at the end; keep it for the next chunk
                let valid = e.valid_up_to();
                self.pending = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        for c in text.chars() {
            self.push_char(c);
        }
    }

    fn push_char(&mut self, c: char) {
        match self.escape {
            Escape::Start => {
                self.escape = match c {
                    '[' => Escape::Csi,
                    ']' => Escape::Osc,
                    _ => Escape::None,
                };
                return;
            }
            Escape::Csi => {
                if ('@'..='~').contains(&c) {
                    self.escape = Escape::None;
                }
                return;
            }
            Escape::Osc => {
                match c {
                    '\x07' => self.escape = Escape::None,
                    '\x1b' => self.escape = Escape::OscEsc,
                    _ => {}
                }
                return;
            }
            Escape::OscEsc => {
                self.escape = if c == '\\' { Escape::None } else { Escape::Osc };
                return;
            }
            Escape::None => {}
        }

        match c {
            '\x1b' => self.escape = Escape::Start,
            '\n' => self.finish_line(),
            '\r' => {}
            '\t' => self.current.push('\t'),
            c if c.is_control() => {}
            c => self.current.push(c),
        }
    }

    fn finish_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The last `n` lines, including the unfinished one if it has text
    pub fn tail(&self, n: usize) -> Vec<String> {
        let mut all: Vec<&str> = self.lines.iter().map(|s| s.as_str()).collect();
        if !self.current.is_empty() {
            all.push(&self.current);
        }
        let start = all.len().saturating_sub(n);
        all[start..].iter().map(|s| s.to_string()).collect()
    }

    /// Number of completed lines held
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Write handle to one buffer's scrollback, safe to move to another thread
#[derive(Debug, Clone)]
pub struct OutputSink {
    scrollback: Arc<Mutex<Scrollback>>,
}

impl OutputSink {
    pub fn write(&self, data: &[u8]) {
        if let Ok(mut scrollback) = self.scrollback.lock() {
            scrollback.push_bytes(data);
        }
    }
}

/// [`OutputStore`] keeping every buffer in memory
pub struct MemoryBuffers {
    buffers: HashMap<BufferId, Arc<Mutex<Scrollback>>>,
    next_id: u64,
    max_lines: usize,
}

impl MemoryBuffers {
    pub fn new(max_lines: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            next_id: 1,
            max_lines,
        }
    }

    pub fn count(&self) -> usize {
        self.buffers.len()
    }
}

impl OutputStore for MemoryBuffers {
    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers
            .insert(id, Arc::new(Mutex::new(Scrollback::new(self.max_lines))));
        tracing::debug!("Created output buffer {}", id);
        id
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            tracing::debug!("Destroyed output buffer {}", buffer);
        }
    }

    fn is_buffer_valid(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    fn sink(&self, buffer: BufferId) -> Option<OutputSink> {
        self.buffers.get(&buffer).map(|scrollback| OutputSink {
            scrollback: scrollback.clone(),
        })
    }

    fn tail(&self, buffer: BufferId, lines: usize) -> Vec<String> {
        self.buffers
            .get(&buffer)
            .and_then(|s| s.lock().ok().map(|s| s.tail(lines)))
            .unwrap_or_default()
    }

    fn buffer_count(&self) -> usize {
        self.count()
    }
}
