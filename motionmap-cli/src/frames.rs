//! Recorded frame input.
//!
//! A frame file holds one frame per line, each a JSON array of `[x, y, z]`
//! triples. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use motionmap_core::Point;

use crate::{CliError, Result};

/// Iterates the frames of a JSON-lines stream.
pub struct FrameReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl FrameReader<BufReader<File>> {
    /// Opens a frame file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps a buffered reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<Vec<Point>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            let line = self.line;
            return Some(
                serde_json::from_str::<Vec<[f32; 3]>>(text)
                    .map(|triples| triples.into_iter().map(Point::from).collect())
                    .map_err(|source| CliError::Frame { line, source }),
            );
        }
    }
}

/// Parses `x,y,z` into a point.
pub fn parse_point(s: &str) -> std::result::Result<Point, String> {
    let values = parse_floats(s)?;
    match values.as_slice() {
        &[x, y, z] => Ok(Point::new(x, y, z)),
        _ => Err(format!("expected x,y,z but got {} values", values.len())),
    }
}

/// Parses `min_x,min_y,min_z,max_x,max_y,max_z` into two corners.
pub fn parse_bounds(s: &str) -> std::result::Result<[f32; 6], String> {
    let values = parse_floats(s)?;
    <[f32; 6]>::try_from(values.as_slice())
        .map_err(|_| format!("expected six values but got {}", values.len()))
}

fn parse_floats(s: &str) -> std::result::Result<Vec<f32>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid number '{}': {e}", part.trim()))
        })
        .collect()
}
