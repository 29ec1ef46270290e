//! Sender and receiver engines joined by a recording link.

use bletransfer::application::transfer::{ChunkSender, TransferBuffer};
use bletransfer::domain::{END_OF_FILE_MARKER, EndOfTransfer};
use bletransfer::test_support::RecordingTransport;
use proptest::prelude::*;

/// Send `payload` and feed every write to a fresh receiver. Returns each
/// completed file in order.
fn deliver(payload: &[u8], chunk_size: usize, policy: EndOfTransfer) -> Vec<Vec<u8>> {
    let mut link = RecordingTransport::new(chunk_size);
    ChunkSender::new(policy).send(&mut link, payload).unwrap();
    let mut rx = TransferBuffer::new();
    link.drain()
        .iter()
        .filter_map(|chunk| rx.push(chunk))
        .collect()
}

#[test]
fn remainder_payload_finishes_on_the_short_chunk() {
    let payload: Vec<u8> = (0..=9).collect();
    assert_eq!(
        deliver(&payload, 4, EndOfTransfer::SentinelWhenAmbiguous),
        vec![payload.clone()]
    );
    assert_eq!(deliver(&payload, 4, EndOfTransfer::Legacy), vec![payload]);
}

#[test]
fn exact_multiple_needs_the_marker() {
    let payload = vec![0x5a; 12];
    assert_eq!(
        deliver(&payload, 4, EndOfTransfer::SentinelWhenAmbiguous),
        vec![payload.clone()]
    );
    assert!(deliver(&payload, 4, EndOfTransfer::Legacy).is_empty());
}

#[test]
fn single_chunk_payload_is_closed_by_the_marker() {
    let mut link = RecordingTransport::new(20);
    let report = ChunkSender::default().send(&mut link, b"short").unwrap();
    assert!(report.sentinel_sent);
    assert_eq!(
        link.sent,
        vec![b"short".to_vec(), END_OF_FILE_MARKER.to_vec()]
    );
}

#[test]
fn two_files_back_to_back_stay_separate() {
    let mut link = RecordingTransport::new(4);
    let sender = ChunkSender::default();
    sender.send(&mut link, b"first file").unwrap();
    sender.send(&mut link, b"second!!").unwrap();
    let mut rx = TransferBuffer::new();
    let files: Vec<Vec<u8>> = link
        .drain()
        .iter()
        .filter_map(|chunk| rx.push(chunk))
        .collect();
    assert_eq!(files, vec![b"first file".to_vec(), b"second!!".to_vec()]);
    assert!(!rx.is_in_progress());
}

#[test]
fn chunk_equal_to_marker_truncates() {
    // Known limitation of in-band signalling.
    let payload = b"abcEOFxy".to_vec();
    let files = deliver(&payload, 3, EndOfTransfer::SentinelWhenAmbiguous);
    assert_eq!(files[0], b"abc".to_vec());
}

proptest! {
    #[test]
    fn payload_arrives_intact_with_marker_policy(
        payload in proptest::collection::vec(any::<u8>(), 0..300),
        chunk_size in 1usize..40,
    ) {
        prop_assume!(
            payload
                .chunks(chunk_size)
                .all(|c| c != END_OF_FILE_MARKER.as_slice())
        );
        prop_assert_eq!(
            deliver(&payload, chunk_size, EndOfTransfer::SentinelWhenAmbiguous),
            vec![payload]
        );
    }
}
