//! JSONL segment recordings: a header line, then one segment per line in
//! playing order (oldest first).
//!
//! ```text
//! {"format":"piano-roll-segments","min_segment_ms":50,"title":"take 3"}
//! {"p":52,"d":240,"o":0}
//! {"p":55,"d":180,"o":30}
//! ```
//!
//! Works with any `BufRead`: files, in-memory buffers, stdin.

use crate::types::{AbsTime, DetectorEvent, NoteSegment, SessionClock};
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::BufRead;
use std::thread;
use std::time::Duration;

pub const FORMAT: &str = "piano-roll-segments";

/// Parsed JSONL header (first line of a recording).
#[derive(Debug)]
pub struct RecordingHeader {
    pub format: String,
    pub min_segment_ms: Option<u32>,
    pub title: String,
    pub raw: serde_json::Value,
}

/// Line-by-line JSONL segment reader.
pub struct SegmentReader<R: BufRead> {
    reader: R,
    pub header: RecordingHeader,
    line_buf: String,
}

impl<R: BufRead> SegmentReader<R> {
    /// Read and validate the header line. Returns an error if the header
    /// is missing, unparseable, or has the wrong `"format"`.
    pub fn open(mut reader: R) -> Result<Self, String> {
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| format!("read header: {}", e))?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err("empty file".into());
        }

        let raw: serde_json::Value =
            serde_json::from_str(first_line).map_err(|e| format!("parse header: {}", e))?;

        let format = raw["format"]
            .as_str()
            .ok_or("missing \"format\" field")?
            .to_string();
        if format != FORMAT {
            return Err(format!("unknown format: {}", format));
        }

        let min_segment_ms = raw["min_segment_ms"]
            .as_u64()
            .and_then(|v| u32::try_from(v).ok());
        let title = raw["title"].as_str().unwrap_or("").to_string();

        Ok(Self {
            reader,
            header: RecordingHeader {
                format,
                min_segment_ms,
                title,
                raw,
            },
            line_buf: String::new(),
        })
    }

    /// Read the next segment. Returns `None` at EOF, `Err` for unparseable lines.
    pub fn next_segment(&mut self) -> Option<Result<NoteSegment, String>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str::<NoteSegment>(trimmed)
                            .map_err(|e| format!("parse segment: {}", e)),
                    );
                }
                Err(e) => return Some(Err(format!("read line: {}", e))),
            }
        }
    }

    /// Read all remaining segments, skipping malformed lines.
    pub fn read_all(mut self) -> Vec<NoteSegment> {
        let mut segments = Vec::new();
        while let Some(result) = self.next_segment() {
            match result {
                Ok(seg) => segments.push(seg),
                Err(e) => warn!("Skipping segment line: {}", e),
            }
        }
        segments
    }
}

/// Absolute `(start, end)` of each segment when the recording starts at
/// `origin`, in playing order.
pub fn schedule(segments: &[NoteSegment], origin: AbsTime) -> Vec<(AbsTime, AbsTime)> {
    let mut t = origin;
    segments
        .iter()
        .map(|seg| {
            let start = t + seg.onset as AbsTime;
            let end = start + seg.duration as AbsTime;
            t = end;
            (start, end)
        })
        .collect()
}

/// Stream a recording as detector reports at real-time pace: each segment
/// is appended once it has ended. Blocks the calling thread; returns early
/// when the receiver goes away.
pub fn replay(segments: &[NoteSegment], clock: &SessionClock, tx: &Sender<DetectorEvent>) {
    let origin = clock.now_ms();
    let times = schedule(segments, origin);
    info!("Replaying {} segments", segments.len());

    for (seg, &(_, end)) in segments.iter().zip(&times) {
        let now = clock.now_ms();
        if end > now {
            thread::sleep(Duration::from_millis(end - now));
        }
        if tx.send(DetectorEvent::Append { segment: *seg, end }).is_err() {
            return;
        }
    }
    info!("Replay complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn recording(lines: &[&str]) -> Cursor<String> {
        let mut s = String::from(r#"{"format":"piano-roll-segments","min_segment_ms":50,"title":"t"}"#);
        for l in lines {
            s.push('\n');
            s.push_str(l);
        }
        Cursor::new(s)
    }

    #[test]
    fn test_open_reads_header() {
        let reader = SegmentReader::open(recording(&[])).unwrap();
        assert_eq!(reader.header.format, FORMAT);
        assert_eq!(reader.header.min_segment_ms, Some(50));
        assert_eq!(reader.header.title, "t");
    }

    #[test]
    fn test_oversized_min_segment_is_dropped() {
        let header = r#"{"format":"piano-roll-segments","min_segment_ms":4294967346}"#;
        let reader = SegmentReader::open(Cursor::new(header)).unwrap();
        assert_eq!(reader.header.min_segment_ms, None);
    }

    #[test]
    fn test_rejects_wrong_format() {
        let err = SegmentReader::open(Cursor::new(r#"{"format":"steel"}"#)).err().unwrap();
        assert!(err.contains("unknown format"));
        assert!(SegmentReader::open(Cursor::new("")).is_err());
        assert!(SegmentReader::open(Cursor::new("{}")).is_err());
    }

    #[test]
    fn test_read_all_skips_blank_and_bad_lines() {
        let reader = SegmentReader::open(recording(&[
            r#"{"p":52,"d":240,"o":0}"#,
            "",
            "not json",
            r#"{"p":55,"d":180}"#,
        ]))
        .unwrap();
        let segs = reader.read_all();
        assert_eq!(segs, vec![NoteSegment::new(52, 240, 0), NoteSegment::new(55, 180, 0)]);
    }

    #[test]
    fn test_next_segment_reports_errors() {
        let mut reader = SegmentReader::open(recording(&[r#"{"p":"x","d":1}"#])).unwrap();
        assert!(matches!(reader.next_segment(), Some(Err(_))));
        assert!(reader.next_segment().is_none());
    }

    #[test]
    fn test_schedule_applies_gaps() {
        let segs = [NoteSegment::new(52, 240, 0), NoteSegment::new(55, 180, 30)];
        assert_eq!(schedule(&segs, 1000), vec![(1000, 1240), (1270, 1450)]);
    }
}
