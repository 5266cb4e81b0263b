use crate::types::*;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

/// One step of a scripted phrase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Note { pitch: Pitch, ms: RelTime },
    Rest { ms: RelTime },
}

impl Step {
    fn ms(&self) -> RelTime {
        match self {
            Step::Note { ms, .. } | Step::Rest { ms } => *ms,
        }
    }

    fn pitch(&self) -> Option<Pitch> {
        match self {
            Step::Note { pitch, .. } => Some(*pitch),
            Step::Rest { .. } => None,
        }
    }
}

/// What is actually sounding: a pitch (or silence) since some time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sounding {
    pub pitch: Option<Pitch>,
    pub since: AbsTime,
}

#[derive(Debug, Clone, Copy)]
struct Head {
    pitch: Pitch,
    start: AbsTime,
    gap: RelTime,
}

/// Turns ground truth into the reports a real note detector would make.
///
/// A change is only recognized once it lasted `min_segment_ms`. Until then
/// the newest segment keeps growing as if nothing changed; on recognition
/// it is trimmed back to where the change really happened and the new note
/// (if any) is appended. This is the revision the renderer's correction
/// strip exists for.
pub struct LatentDetector {
    min_segment_ms: RelTime,
    head: Option<Head>,
    last_end: Option<AbsTime>,
}

impl LatentDetector {
    pub fn new(min_segment_ms: RelTime) -> Self {
        Self {
            min_segment_ms,
            head: None,
            last_end: None,
        }
    }

    /// Report what the detector knows at `now`, given the true state.
    pub fn observe(&mut self, now: AbsTime, truth: Sounding) -> Vec<DetectorEvent> {
        let mut events = Vec::with_capacity(2);
        let recognized = now.saturating_sub(truth.since) >= self.min_segment_ms as AbsTime;

        let head = self.head;
        match head {
            Some(h) if truth.pitch == Some(h.pitch) && truth.since == h.start => {
                events.push(revise(h, now));
            }
            Some(h) if !recognized => {
                // still looks like the old note
                events.push(revise(h, now));
            }
            Some(h) => {
                events.push(revise(h, truth.since));
                self.last_end = Some(truth.since);
                self.head = None;
                if let Some(pitch) = truth.pitch {
                    self.open(pitch, truth.since, now, &mut events);
                }
            }
            None => {
                if let (Some(pitch), true) = (truth.pitch, recognized) {
                    self.open(pitch, truth.since, now, &mut events);
                }
            }
        }
        events
    }

    fn open(&mut self, pitch: Pitch, start: AbsTime, now: AbsTime, events: &mut Vec<DetectorEvent>) {
        let gap = self
            .last_end
            .map(|end| start.saturating_sub(end) as RelTime)
            .unwrap_or(0);
        let head = Head { pitch, start, gap };
        self.head = Some(head);
        events.push(DetectorEvent::Append {
            segment: NoteSegment::new(pitch, now.saturating_sub(start) as RelTime, gap),
            end: now,
        });
    }
}

fn revise(head: Head, end: AbsTime) -> DetectorEvent {
    DetectorEvent::Revise {
        segment: NoteSegment::new(head.pitch, end.saturating_sub(head.start) as RelTime, head.gap),
        end,
    }
}

/// Which step of `phrase` sounds `elapsed` ms into it, and since when
/// (relative to the phrase start). `None` past the end.
pub fn step_at(phrase: &[Step], elapsed: AbsTime) -> Option<(Step, AbsTime)> {
    let mut start: AbsTime = 0;
    for step in phrase {
        let end = start + step.ms() as AbsTime;
        if elapsed < end {
            return Some((*step, start));
        }
        start = end;
    }
    None
}

pub fn phrase_len_ms(phrase: &[Step]) -> AbsTime {
    phrase.iter().map(|s| s.ms() as AbsTime).sum()
}

/// Synthetic note detector: plays a scripted phrase in real time and sends
/// what a detector with recognition latency would report.
pub struct Simulator {
    clock: SessionClock,
    tx: Sender<DetectorEvent>,
    detector: LatentDetector,
    report_ms: u64,
}

impl Simulator {
    pub fn new(
        clock: SessionClock,
        tx: Sender<DetectorEvent>,
        min_segment_ms: RelTime,
        report_ms: u64,
    ) -> Self {
        Self {
            clock,
            tx,
            detector: LatentDetector::new(min_segment_ms),
            report_ms: report_ms.max(1),
        }
    }

    /// Play the named demo `repeats` times (0 = forever). Blocks the
    /// calling thread; returns early when the receiver goes away.
    pub fn run(&mut self, demo: &str, repeats: u32) {
        let phrase = match demo {
            "scale" => scale_phrase(),
            "arpeggio" => arpeggio_phrase(),
            "improv" => improv_phrase(0x5eed, 64),
            other => {
                warn!("Unknown demo '{}', using 'scale'", other);
                scale_phrase()
            }
        };
        info!(
            "Simulator playing '{}': {} steps, {:.1}s per pass",
            demo,
            phrase.len(),
            phrase_len_ms(&phrase) as f64 / 1000.0
        );

        let mut pass = 0u32;
        while repeats == 0 || pass < repeats {
            if !self.play(&phrase) {
                info!("Simulator: receiver closed, stopping");
                return;
            }
            pass += 1;
            debug!("Simulator pass {} done", pass);
        }
        info!("Simulator finished after {} passes", pass);
    }

    fn play(&mut self, phrase: &[Step]) -> bool {
        let origin = self.clock.now_ms();
        loop {
            let now = self.clock.now_ms();
            let Some((step, since)) = step_at(phrase, now - origin) else {
                return true;
            };
            let truth = Sounding {
                pitch: step.pitch(),
                since: origin + since,
            };
            for event in self.detector.observe(now, truth) {
                if self.tx.send(event).is_err() {
                    return false;
                }
            }
            thread::sleep(Duration::from_millis(self.report_ms));
        }
    }
}

// ─── Demo phrases ───────────────────────────────────────────────────────────

/// C major scale from C3 up two octaves and back.
fn scale_phrase() -> Vec<Step> {
    const MAJOR: [Pitch; 7] = [0, 2, 4, 5, 7, 9, 11];
    let mut up: Vec<Pitch> = (0..2)
        .flat_map(|oct| MAJOR.iter().map(move |&n| 48 + 12 * oct + n))
        .collect();
    up.push(72);
    let down: Vec<Pitch> = up.iter().rev().skip(1).copied().collect();
    up.into_iter()
        .chain(down)
        .map(|pitch| Step::Note { pitch, ms: 220 })
        .chain(std::iter::once(Step::Rest { ms: 400 }))
        .collect()
}

/// Broken chords I–vi–IV–V with short rests between them.
fn arpeggio_phrase() -> Vec<Step> {
    let chords: [[Pitch; 4]; 4] = [
        [48, 52, 55, 60],
        [45, 48, 52, 57],
        [41, 45, 48, 53],
        [43, 47, 50, 55],
    ];
    let mut steps = Vec::new();
    for chord in chords {
        for &pitch in &chord {
            steps.push(Step::Note { pitch, ms: 150 });
        }
        steps.push(Step::Note { pitch: chord[0] + 12, ms: 450 });
        steps.push(Step::Rest { ms: 120 });
    }
    steps
}

/// Random walk over a pentatonic scale, with the occasional rest.
fn improv_phrase(seed: u64, len: usize) -> Vec<Step> {
    const PENTA: [Pitch; 5] = [0, 2, 4, 7, 9];
    let mut rng = seed;
    let mut next = move || {
        // 64-bit LCG (Knuth MMIX)
        rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (rng >> 33) as u32
    };
    let mut degree: i32 = 7;
    let mut steps = Vec::with_capacity(len);
    for _ in 0..len {
        if next() % 8 == 0 {
            steps.push(Step::Rest { ms: 100 + next() % 200 });
            continue;
        }
        degree = (degree + (next() % 5) as i32 - 2).clamp(0, 13);
        let pitch = 48 + 12 * (degree / 5) + PENTA[(degree % 5) as usize];
        let ms = [90, 120, 180, 240, 360][(next() % 5) as usize];
        steps.push(Step::Note { pitch, ms });
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment_buf::SegmentBuffer;
    use crate::segments::SegmentWalk;

    fn drive(phrase: &[Step], min_ms: RelTime, until: AbsTime) -> (SegmentBuffer, Vec<DetectorEvent>) {
        let mut det = LatentDetector::new(min_ms);
        let mut buf = SegmentBuffer::new(64);
        let mut all = Vec::new();
        for now in (0..until).step_by(10) {
            let (step, since) = step_at(phrase, now).unwrap_or((Step::Rest { ms: 0 }, phrase_len_ms(phrase)));
            let events = det.observe(
                now,
                Sounding {
                    pitch: step.pitch(),
                    since,
                },
            );
            for e in events {
                buf.apply(e);
                all.push(e);
            }
        }
        (buf, all)
    }

    #[test]
    fn test_step_lookup() {
        let phrase = [
            Step::Note { pitch: 60, ms: 100 },
            Step::Rest { ms: 50 },
            Step::Note { pitch: 62, ms: 100 },
        ];
        assert_eq!(step_at(&phrase, 0), Some((phrase[0], 0)));
        assert_eq!(step_at(&phrase, 120), Some((phrase[1], 100)));
        assert_eq!(step_at(&phrase, 249), Some((phrase[2], 150)));
        assert_eq!(step_at(&phrase, 250), None);
        assert_eq!(phrase_len_ms(&phrase), 250);
    }

    #[test]
    fn test_new_note_is_reported_late_then_corrected() {
        let phrase = [Step::Note { pitch: 60, ms: 200 }, Step::Note { pitch: 64, ms: 200 }];
        let (buf, events) = drive(&phrase, 50, 240);

        // at 230ms the change at 200ms is not recognized yet
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.segment_at(0), Some(NoteSegment::new(60, 230, 0)));
        assert!(events.iter().all(|e| !matches!(e, DetectorEvent::Append { segment, .. } if segment.pitch == 64)));

        let (buf, _) = drive(&phrase, 50, 300);
        // recognized at 250ms, head trimmed back to 200ms
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.segment_at(1), Some(NoteSegment::new(60, 200, 0)));
        assert_eq!(buf.segment_at(0), Some(NoteSegment::new(64, 90, 0)));
        assert_eq!(buf.last_offset(), 290);
    }

    #[test]
    fn test_rest_becomes_onset_gap() {
        let phrase = [
            Step::Note { pitch: 60, ms: 100 },
            Step::Rest { ms: 80 },
            Step::Note { pitch: 67, ms: 200 },
        ];
        let (buf, _) = drive(&phrase, 50, 300);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.segment_at(1), Some(NoteSegment::new(60, 100, 0)));
        let head = buf.segment_at(0).unwrap();
        assert_eq!(head.pitch, 67);
        assert_eq!(head.onset, 80);

        // walking back from the head lands on the true times
        let placed: Vec<_> = SegmentWalk::new(&buf, buf.last_offset()).collect();
        assert_eq!(placed[0].onset, 180);
        assert_eq!((placed[1].onset, placed[1].end), (0, 100));
    }

    #[test]
    fn test_demo_phrases_stay_in_default_range() {
        for phrase in [scale_phrase(), arpeggio_phrase(), improv_phrase(1, 200)] {
            for step in &phrase {
                if let Some(p) = step.pitch() {
                    assert!((40..=80).contains(&p), "pitch {} out of range", p);
                }
                assert!(step.ms() >= 50);
            }
        }
    }

    #[test]
    fn test_simulator_stops_when_receiver_dropped() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        drop(rx);
        let mut sim = Simulator::new(SessionClock::new(), tx, 50, 1);
        sim.run("arpeggio", 0);
    }
}
