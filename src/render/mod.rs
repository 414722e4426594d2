use crate::segment::TranscriptSequence;

/// How a transcript sequence is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One `[HH:MM:SS] text` line per segment
    Timestamped,
    /// A single merged, whitespace-normalized paragraph
    PlainMerged,
}

/// Render a sequence for the caller's chosen mode. Never mutates the
/// sequence and has no side effects.
pub fn render(sequence: &TranscriptSequence, mode: RenderMode) -> String {
    match mode {
        RenderMode::Timestamped => sequence
            .segments()
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.start), s.text))
            .collect::<Vec<_>>()
            .join("\n"),
        RenderMode::PlainMerged => sequence.merge_to_text(),
    }
}

/// Floor-based `HH:MM:SS` decomposition of an offset in seconds.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::TranscriptSegment;

    #[test]
    fn timestamps_use_floor_decomposition() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(59.9), "00:00:59");
        assert_eq!(format_timestamp(61.0), "00:01:01");
        assert_eq!(format_timestamp(3661.5), "01:01:01");
    }

    #[test]
    fn timestamped_mode_renders_one_line_per_segment() {
        let sequence = TranscriptSequence::new(vec![
            TranscriptSegment::new("intro", 0.0, 5.0),
            TranscriptSegment::new("main topic", 65.0, 10.0),
        ]);

        let rendered = render(&sequence, RenderMode::Timestamped);
        assert_eq!(rendered, "[00:00:00] intro\n[00:01:05] main topic");
    }

    #[test]
    fn plain_mode_merges_segments() {
        let sequence = TranscriptSequence::new(vec![
            TranscriptSegment::new("intro", 0.0, 5.0),
            TranscriptSegment::new("main  topic", 65.0, 10.0),
        ]);

        assert_eq!(render(&sequence, RenderMode::PlainMerged), "intro main topic");
    }

    #[test]
    fn empty_sequence_renders_empty_string() {
        assert_eq!(render(&TranscriptSequence::empty(), RenderMode::Timestamped), "");
        assert_eq!(render(&TranscriptSequence::empty(), RenderMode::PlainMerged), "");
    }
}
