//! Greedy section packer.
//!
//! Sections are appended to an accumulator until the next one would push it past
//! `max_chunk_size`; the accumulator is then flushed as a chunk and re-seeded with an overlap
//! tail of the lines just flushed. A section is never split unless it is larger than
//! `max_chunk_size` by itself, in which case it is cut line by line with the same overlap rule.
//!
//! Sizes are character counts of lines joined with `\n`. A chunk only exceeds
//! `max_chunk_size` when a single line does. `min_chunk_size` is not used to merge small
//! trailing chunks.

use uuid::Uuid;

use crate::config::ChunkingConfig;

use super::types::{ChunkingError, DraftChunk, Heading, Section, joined_char_len};

/// Pack parsed sections into size-bounded draft chunks.
///
/// Chunk indices start at `0` and increase by one for each emitted chunk.
pub fn pack_sections(
    sections: &[Section],
    config: &ChunkingConfig,
) -> Result<Vec<DraftChunk>, ChunkingError> {
    config.validate()?;

    let max = config.max_chunk_size;
    let mut sink = ChunkSink::default();
    let mut accumulator = Accumulator::default();

    for section in sections {
        let section_size = section.char_len();

        if section_size > max {
            sink.flush(&mut accumulator);
            tracing::trace!(section_size, max, "Splitting oversized section");
            split_large_section(section, config, &mut sink);
            continue;
        }

        if !accumulator.is_empty() && accumulator.projected_size(section_size) > max {
            let flushed = sink.flush(&mut accumulator);
            accumulator.seed(overlap_tail(&flushed, config.overlap_size), section_size, max);
        }

        accumulator.push_section(section);
    }

    sink.flush(&mut accumulator);
    Ok(sink.chunks)
}

/// Cut a section that is larger than `max_chunk_size` on line boundaries.
fn split_large_section(section: &Section, config: &ChunkingConfig, sink: &mut ChunkSink) {
    let max = config.max_chunk_size;
    let mut accumulator = Accumulator::default();
    accumulator.record_headers(&section.headers);

    for line in &section.content {
        let line_size = line.chars().count();
        if !accumulator.is_empty() && accumulator.projected_size(line_size) > max {
            let flushed = sink.flush(&mut accumulator);
            accumulator.record_headers(&section.headers);
            accumulator.seed(overlap_tail(&flushed, config.overlap_size), line_size, max);
        }
        accumulator.push_line(line.clone());
    }

    sink.flush(&mut accumulator);
}

/// Select the trailing lines of a flushed chunk that seed the next one.
///
/// When the flushed lines already fit in `overlap_size`, the back half is reused (nothing for
/// a single line). Otherwise lines are taken from the end while they fit. `overlap_size == 0`
/// disables overlap.
pub(crate) fn overlap_tail(lines: &[String], overlap_size: usize) -> Vec<String> {
    if overlap_size == 0 || lines.is_empty() {
        return Vec::new();
    }

    if joined_char_len(lines) <= overlap_size {
        if lines.len() <= 1 {
            return Vec::new();
        }
        return lines[lines.len() / 2..].to_vec();
    }

    let mut taken = 0;
    let mut size = 0;
    for line in lines.iter().rev() {
        let separator = usize::from(taken > 0);
        let candidate = size + separator + line.chars().count();
        if candidate > overlap_size {
            break;
        }
        size = candidate;
        taken += 1;
    }
    lines[lines.len() - taken..].to_vec()
}

/// Lines waiting to become a chunk, with their running size and heading context.
#[derive(Debug, Default)]
struct Accumulator {
    lines: Vec<String>,
    size: usize,
    headers: Vec<Heading>,
}

impl Accumulator {
    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Size after appending an item of `additional` characters on a new line.
    fn projected_size(&self, additional: usize) -> usize {
        if self.lines.is_empty() {
            additional
        } else {
            self.size + 1 + additional
        }
    }

    fn push_line(&mut self, line: String) {
        self.size = self.projected_size(line.chars().count());
        self.lines.push(line);
    }

    fn push_section(&mut self, section: &Section) {
        self.record_headers(&section.headers);
        for line in &section.content {
            self.push_line(line.clone());
        }
    }

    /// Append a header context as-is; headers inherited by several sections repeat.
    fn record_headers(&mut self, headers: &[Heading]) {
        self.headers.extend_from_slice(headers);
    }

    /// Seed an empty accumulator with an overlap tail, dropping leading tail lines until an
    /// incoming item of `incoming_size` characters still fits within `max`.
    fn seed(&mut self, mut tail: Vec<String>, incoming_size: usize, max: usize) {
        while !tail.is_empty() && joined_char_len(&tail) + 1 + incoming_size > max {
            tail.remove(0);
        }
        for line in tail {
            self.push_line(line);
        }
    }

    fn take(&mut self) -> (Vec<String>, Vec<Heading>) {
        self.size = 0;
        (
            std::mem::take(&mut self.lines),
            std::mem::take(&mut self.headers),
        )
    }
}

/// Collects emitted chunks and hands out consecutive indices.
#[derive(Debug, Default)]
struct ChunkSink {
    chunks: Vec<DraftChunk>,
}

impl ChunkSink {
    /// Emit the accumulator as a chunk and return the raw lines that were flushed.
    ///
    /// Accumulators that are empty after trimming emit nothing.
    fn flush(&mut self, accumulator: &mut Accumulator) -> Vec<String> {
        if accumulator.is_empty() {
            return Vec::new();
        }
        let (lines, headers) = accumulator.take();
        let text = lines.join("\n").trim().to_string();
        if !text.is_empty() {
            self.chunks.push(DraftChunk {
                chunk_id: Uuid::new_v4(),
                text,
                headers,
                chunk_index: self.chunks.len(),
            });
        }
        lines
    }
}
