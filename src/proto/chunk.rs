use super::{ProtoError, packet::{encode, Report}, types::*};
use crate::hid::{HidError, ReportLayout};

/// Prefix written in front of every chunk's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFraming {
    /// One byte: `0xFF` while more chunks follow, else the final length.
    SizeMarker,
    /// Slot id, then the size marker. Used by sign and decrypt.
    SlotAndSize { slot: u8 },
    /// Slot id and key type repeated on every chunk, no size marker.
    /// Used to upload private keys.
    KeyHeader { slot: u8, key_type: u8 },
}

impl ChunkFraming {
    pub fn marker_len(self) -> usize {
        match self {
            ChunkFraming::SizeMarker => 1,
            ChunkFraming::SlotAndSize { .. } | ChunkFraming::KeyHeader { .. } => 2,
        }
    }

    fn prefix(self, marker: ChunkMarker) -> Vec<u8> {
        match self {
            ChunkFraming::SizeMarker => vec![marker.byte()],
            ChunkFraming::SlotAndSize { slot } => vec![slot, marker.byte()],
            ChunkFraming::KeyHeader { slot, key_type } => vec![slot, key_type],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMarker {
    More,
    Final(u8),
}

impl ChunkMarker {
    pub fn byte(self) -> u8 {
        match self {
            ChunkMarker::More => CONTINUATION_MARKER,
            ChunkMarker::Final(len) => len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub marker: ChunkMarker,
    pub data: &'a [u8],
}

/// Data bytes per chunk once header, message tag and framing are written.
pub fn chunk_capacity(layout: ReportLayout, framing: ChunkFraming) -> usize {
    layout.body_capacity() - 1 - framing.marker_len()
}

/// Split `payload` into chunks of at most `capacity` bytes.
///
/// An empty payload yields one empty final chunk so the device still sees
/// a terminated message. A final chunk whose length would equal the
/// continuation marker is rejected rather than sent as "more follows".
pub fn split_chunks(payload: &[u8], capacity: usize) -> Result<Vec<Chunk<'_>>, ProtoError> {
    if capacity == 0 {
        return Err(ProtoError::PayloadTooLarge {
            len: payload.len(),
            capacity,
        });
    }
    if payload.is_empty() {
        return Ok(vec![Chunk {
            marker: ChunkMarker::Final(0),
            data: payload,
        }]);
    }

    let count = payload.len().div_ceil(capacity);
    let mut chunks = Vec::with_capacity(count);
    for (i, data) in payload.chunks(capacity).enumerate() {
        let marker = if i + 1 < count {
            ChunkMarker::More
        } else if data.len() == CONTINUATION_MARKER as usize {
            return Err(ProtoError::AmbiguousChunkLength { len: data.len() });
        } else {
            let len = u8::try_from(data.len()).map_err(|_| ProtoError::PayloadTooLarge {
                len: data.len(),
                capacity: CONTINUATION_MARKER as usize - 1,
            })?;
            ChunkMarker::Final(len)
        };
        chunks.push(Chunk { marker, data });
    }
    Ok(chunks)
}

/// Encode every chunk of `payload` as a report tagged with `message`.
pub fn frame_chunks(
    layout: ReportLayout,
    message: Option<Message>,
    framing: ChunkFraming,
    payload: &[u8],
) -> Result<Vec<Report>, ProtoError> {
    let message = message.ok_or(ProtoError::MissingMessage)?;
    let chunks = split_chunks(payload, chunk_capacity(layout, framing))?;
    chunks
        .iter()
        .map(|chunk| {
            let mut body = framing.prefix(chunk.marker);
            body.extend_from_slice(chunk.data);
            encode(layout, Some(message), None, None, &body)
        })
        .collect()
}

/// Frame `payload` and hand each report to `transmit` in order. Nothing is
/// transmitted unless every chunk encodes. Returns the number of reports
/// sent.
pub fn send_chunks<F>(
    layout: ReportLayout,
    message: Option<Message>,
    framing: ChunkFraming,
    payload: &[u8],
    mut transmit: F,
) -> Result<usize, ProtoError>
where
    F: FnMut(&Report) -> Result<(), HidError>,
{
    let reports = frame_chunks(layout, message, framing, payload)?;
    for (i, report) in reports.iter().enumerate() {
        tracing::debug!(chunk = i, total = reports.len(), "sending chunk");
        transmit(report)?;
    }
    Ok(reports.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_per_framing() {
        assert_eq!(chunk_capacity(ReportLayout::Posix, ChunkFraming::SizeMarker), MAX_LARGE_PAYLOAD_SIZE);
        assert_eq!(chunk_capacity(ReportLayout::Windows, ChunkFraming::SizeMarker), 58);
        assert_eq!(chunk_capacity(ReportLayout::Posix, ChunkFraming::SlotAndSize { slot: 1 }), 57);
    }

    #[test]
    fn test_split_reassembles_and_marks_final_length() {
        let payload: Vec<u8> = (0..=199u8).collect();
        let chunks = split_chunks(&payload, 57).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[..3].iter().all(|c| c.marker == ChunkMarker::More));
        assert_eq!(chunks[3].marker, ChunkMarker::Final(200 - 3 * 57));

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, payload);
    }

    #[test]
    fn test_full_final_chunk_carries_its_length() {
        let payload = vec![1u8; 116];
        let chunks = split_chunks(&payload, 58).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].marker.byte(), 0xFF);
        assert_eq!(chunks[1].marker.byte(), 58);
    }

    #[test]
    fn test_final_chunk_at_sentinel_is_ambiguous() {
        let payload = vec![0u8; 255];
        assert!(matches!(
            split_chunks(&payload, 300),
            Err(ProtoError::AmbiguousChunkLength { len: 255 })
        ));

        let payload = vec![0u8; 300 + 255];
        assert!(matches!(
            split_chunks(&payload, 300),
            Err(ProtoError::AmbiguousChunkLength { len: 255 })
        ));

        let payload = vec![0u8; 254];
        let chunks = split_chunks(&payload, 300).unwrap();
        assert_eq!(chunks[0].marker, ChunkMarker::Final(254));
    }

    #[test]
    fn test_empty_payload_is_one_final_chunk() {
        let chunks = split_chunks(&[], 58).unwrap();
        assert_eq!(chunks, vec![Chunk { marker: ChunkMarker::Final(0), data: &[] }]);
    }

    #[test]
    fn test_frame_chunks_slot_and_size_layout() {
        let payload = vec![0x42u8; 60];
        let reports = frame_chunks(
            ReportLayout::Posix,
            Some(Message::SignChallenge),
            ChunkFraming::SlotAndSize { slot: 3 },
            &payload,
        )
        .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(&reports[0].as_bytes()[..7], &[255, 255, 255, 255, 0xED, 3, 0xFF]);
        assert!(reports[0].as_bytes()[7..].iter().all(|b| *b == 0x42));
        assert_eq!(&reports[1].as_bytes()[4..7], &[0xED, 3, 3]);
        assert_eq!(&reports[1].as_bytes()[7..10], &[0x42, 0x42, 0x42]);
        assert!(reports[1].as_bytes()[10..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_key_header_repeats_on_every_chunk() {
        let key = vec![9u8; 128];
        let reports = frame_chunks(
            ReportLayout::Posix,
            Some(Message::SetPriv),
            ChunkFraming::KeyHeader { slot: 1, key_type: 0x44 },
            &key,
        )
        .unwrap();
        assert_eq!(reports.len(), 3);
        for r in &reports {
            assert_eq!(&r.as_bytes()[4..7], &[0xEF, 1, 0x44]);
        }
    }

    #[test]
    fn test_missing_message_sends_nothing() {
        let mut sent = 0;
        let res = send_chunks(
            ReportLayout::Posix,
            None,
            ChunkFraming::SizeMarker,
            b"data",
            |_| {
                sent += 1;
                Ok(())
            },
        );
        assert!(matches!(res, Err(ProtoError::MissingMessage)));
        assert_eq!(sent, 0);
    }

    #[test]
    fn test_send_chunks_preserves_order() {
        let payload: Vec<u8> = (0..120u8).collect();
        let mut seen = Vec::new();
        let n = send_chunks(
            ReportLayout::Posix,
            Some(Message::Decrypt),
            ChunkFraming::SizeMarker,
            &payload,
            |r| {
                seen.push(r.as_bytes()[6]);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen, vec![0, 58, 116]);
    }
}
