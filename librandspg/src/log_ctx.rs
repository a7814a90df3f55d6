// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::warn;

/// How chatty the audit trail is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent,
    /// assignments and per-attempt results
    Results,
    /// everything, including the full possibility dump
    Verbose,
}

/// Where the audit trail goes. The file sink opens and closes the handle per
/// append so no handle outlives a generation call; a missing or unwritable
/// file is not fatal.
#[derive(Debug, Clone)]
pub enum LogSink {
    Null,
    File(PathBuf),
    Memory(Arc<Mutex<String>>),
}

#[derive(Debug, Clone)]
pub struct LogCtx {
    pub verbosity: Verbosity,
    pub sink: LogSink,
}

impl LogCtx {
    pub fn new(verbosity: Verbosity, sink: LogSink) -> Self {
        LogCtx { verbosity, sink }
    }

    pub fn silent() -> Self {
        LogCtx::new(Verbosity::Silent, LogSink::Null)
    }

    pub fn in_memory(verbosity: Verbosity) -> (Self, Arc<Mutex<String>>) {
        let buf = Arc::new(Mutex::new(String::new()));
        (LogCtx::new(verbosity, LogSink::Memory(buf.clone())), buf)
    }

    pub fn results_enabled(&self) -> bool {
        self.verbosity >= Verbosity::Results
    }

    pub fn verbose_enabled(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    pub fn append(&self, text: &str) {
        match &self.sink {
            LogSink::Null => {}
            LogSink::Memory(buf) => {
                if let Ok(mut guard) = buf.lock() {
                    guard.push_str(text);
                }
            }
            LogSink::File(path) => {
                match OpenOptions::new().create(true).append(true).open(path) {
                    Ok(mut f) => {
                        if let Err(e) = f.write_all(text.as_bytes()) {
                            warn!("could not write to log file {:?}: {}", path, e);
                        }
                    }
                    Err(e) => {
                        // keep generating, just without the audit trail
                        warn!("could not open log file {:?}: {}", path, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_appends() {
        let (log, buf) = LogCtx::in_memory(Verbosity::Verbose);
        log.append("one\n");
        log.append("two\n");
        assert_eq!(*buf.lock().unwrap(), "one\ntwo\n");
    }

    #[test]
    fn verbosity_ordering() {
        assert!(!LogCtx::silent().results_enabled());
        let log = LogCtx::new(Verbosity::Results, LogSink::Null);
        assert!(log.results_enabled());
        assert!(!log.verbose_enabled());
    }

    #[test]
    fn file_sink_appends() {
        let dir = std::env::temp_dir().join("librandspg-log-test");
        let _ = std::fs::remove_file(&dir);
        let log = LogCtx::new(Verbosity::Results, LogSink::File(dir.clone()));
        log.append("hello\n");
        log.append("again\n");
        let contents = std::fs::read_to_string(&dir).unwrap();
        assert_eq!(contents, "hello\nagain\n");
        let _ = std::fs::remove_file(&dir);
    }
}
