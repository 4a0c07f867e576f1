//! Property tests for the frame codec and wire decoder
//!
//! The transport hands the worker arbitrarily-sized chunks, so the one
//! property the framer must hold is chunking invariance: the sequence of
//! decoded lines depends only on the byte stream, never on where the
//! reads split it.

mod common;

use pidlink_rs::protocol::{
    decode_line, encode_command, CommandId, DecodedEvent, FrameCodec, ReportId,
};
use proptest::prelude::*;

/// Collect every line a codec produces for one contiguous stream
fn lines_of(codec: &mut FrameCodec, stream: &[u8]) -> Vec<Vec<u8>> {
    codec
        .feed(stream)
        .filter_map(|line| line.ok())
        .collect()
}

proptest! {
    #[test]
    fn chunking_never_changes_the_line_sequence(
        stream in proptest::collection::vec(any::<u8>(), 0..2048),
        splits in proptest::collection::vec(0usize..2048, 0..8),
    ) {
        let mut whole = FrameCodec::new();
        let expected = lines_of(&mut whole, &stream);

        let mut cuts: Vec<usize> = splits
            .into_iter()
            .map(|s| s % (stream.len() + 1))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunked = FrameCodec::new();
        let mut produced = Vec::new();
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(stream.len())) {
            produced.extend(lines_of(&mut chunked, &stream[start..cut]));
            start = cut;
        }

        prop_assert_eq!(produced, expected);
    }

    #[test]
    fn valued_commands_survive_the_wire(
        raw in -255.0f64..255.0,
    ) {
        // Quantize to what the firmware's ASCII float printer round-trips
        let value = (raw * 1000.0).round() / 1000.0;
        let frame = encode_command(CommandId::Pid1Kp, Some(value));

        let mut codec = FrameCodec::new();
        let lines: Vec<_> = codec.feed(&frame).collect();
        prop_assert_eq!(lines.len(), 1);

        let line = lines[0].as_ref().unwrap();
        match decode_line(line) {
            DecodedEvent::NumericSample { channel, value: decoded } => {
                prop_assert_eq!(channel.as_u8(), CommandId::Pid1Kp.as_u8());
                prop_assert!((decoded - value).abs() < 1e-9);
            }
            other => prop_assert!(false, "expected sample, got {:?}", other),
        }
    }

    #[test]
    fn decode_never_panics(line in proptest::collection::vec(any::<u8>(), 0..64)) {
        // Any byte soup decodes to some event, malformed included
        let _ = decode_line(&line);
    }

    #[test]
    fn numeric_report_lines_decode_to_their_channel(
        id in 1u8..=21,
        value in -255.0f64..255.0,
    ) {
        prop_assume!(id != 10); // the frame delimiter
        let mut line = vec![id];
        line.extend(format!("{}", value).into_bytes());

        match decode_line(&line) {
            DecodedEvent::NumericSample { channel, .. } => {
                prop_assert_eq!(channel, ReportId::from_u8(id).unwrap());
            }
            other => prop_assert!(false, "expected sample, got {:?}", other),
        }
    }
}
