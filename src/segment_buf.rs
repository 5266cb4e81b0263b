use crate::types::{AbsTime, DetectorEvent, NoteSegment, SegmentSource};
use log::trace;
use std::collections::VecDeque;

/// Bounded, newest-first history of recognized segments.
///
/// Owned by the host loop: detector events are applied between ticks, so a
/// segment never changes while the renderer is walking it. When full, the
/// oldest segment is dropped.
pub struct SegmentBuffer {
    segments: VecDeque<NoteSegment>,
    capacity: usize,
    last_offset: AbsTime,
}

impl SegmentBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            segments: VecDeque::with_capacity(capacity),
            capacity,
            last_offset: 0,
        }
    }

    /// Add a newly recognized segment ending at `end`.
    pub fn push(&mut self, segment: NoteSegment, end: AbsTime) {
        if self.segments.len() == self.capacity {
            self.segments.pop_back();
        }
        self.segments.push_front(segment);
        self.last_offset = end;
    }

    /// Replace the newest segment, e.g. after the detector revised its
    /// classification. On an empty buffer this is a push.
    pub fn revise_head(&mut self, segment: NoteSegment, end: AbsTime) {
        match self.segments.front_mut() {
            Some(head) => {
                *head = segment;
                self.last_offset = end;
            }
            None => self.push(segment, end),
        }
    }

    pub fn apply(&mut self, event: DetectorEvent) {
        trace!("segment buffer <- {:?}", event);
        match event {
            DetectorEvent::Append { segment, end } => self.push(segment, end),
            DetectorEvent::Revise { segment, end } => self.revise_head(segment, end),
        }
    }

    /// Absolute end time of the newest segment.
    pub fn last_offset(&self) -> AbsTime {
        self.last_offset
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.last_offset = 0;
    }
}

impl SegmentSource for SegmentBuffer {
    fn segment_at(&self, index: usize) -> Option<NoteSegment> {
        self.segments.get(index).copied()
    }
}
