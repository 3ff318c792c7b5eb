//! Progress reporting for batch extraction

use std::io::{self, Write};

/// Single-line stderr progress for batch runs
pub struct ProgressReporter {
    total: usize,
    processed: usize,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
        }
    }

    /// Overwrite the progress line with the image being processed
    pub fn step(&mut self, current: usize, name: &str) {
        self.processed = current;
        eprint!("\r[{}/{}] {:<40}", current, self.total, name);
        io::stderr().flush().ok();
    }

    pub fn finish(&self) {
        eprintln!(
            "\rDone ({}/{})                                          ",
            self.processed, self.total
        );
    }
}
