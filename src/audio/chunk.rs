use tracing::debug;

use super::device::AudioChunk;

/// Ordered, append-only buffer of chunks collected during one capture window
///
/// Owns the chunks exclusively until they are drained for encoding.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<AudioChunk>,
    total_bytes: usize,
    last_sequence: Option<u64>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk in arrival order
    ///
    /// Zero-length chunks and chunks whose sequence index does not advance are
    /// dropped; returns whether the chunk was kept.
    pub fn append(&mut self, chunk: AudioChunk) -> bool {
        if chunk.is_empty() {
            return false;
        }

        if let Some(last) = self.last_sequence {
            if chunk.sequence_index <= last {
                debug!(
                    "Dropping out-of-order chunk {} (last accepted {})",
                    chunk.sequence_index, last
                );
                return false;
            }
        }

        self.last_sequence = Some(chunk.sequence_index);
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Sum of the byte lengths of every buffered chunk
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Take the buffered chunks in sequence order, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<AudioChunk> {
        self.total_bytes = 0;
        self.last_sequence = None;
        std::mem::take(&mut self.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(len: usize, seq: u64) -> AudioChunk {
        AudioChunk::new(vec![seq as u8; len], seq)
    }

    #[test]
    fn test_append_tracks_running_total() {
        let mut buffer = ChunkBuffer::new();

        assert!(buffer.append(chunk(20_000, 0)));
        assert!(buffer.append(chunk(3, 1)));
        assert!(buffer.append(chunk(1, 2)));

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.total_bytes(), 20_004);
    }

    #[test]
    fn test_zero_length_chunks_are_ignored() {
        let mut buffer = ChunkBuffer::new();

        assert!(!buffer.append(chunk(0, 0)));
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);

        // An empty chunk does not consume its sequence slot
        assert!(buffer.append(chunk(10, 0)));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_out_of_order_chunks_are_dropped() {
        let mut buffer = ChunkBuffer::new();

        assert!(buffer.append(chunk(10, 5)));
        assert!(!buffer.append(chunk(10, 5)));
        assert!(!buffer.append(chunk(10, 4)));
        assert!(buffer.append(chunk(10, 9)));

        let sequences: Vec<u64> = buffer.drain().iter().map(|c| c.sequence_index).collect();
        assert_eq!(sequences, vec![5, 9]);
    }

    #[test]
    fn test_drain_returns_arrival_order_and_clears() {
        let mut buffer = ChunkBuffer::new();
        for seq in 0..5 {
            buffer.append(chunk(100, seq));
        }

        let drained = buffer.drain();
        assert_eq!(drained.len(), 5);
        assert!(drained.windows(2).all(|w| w[0].sequence_index < w[1].sequence_index));

        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
        assert!(buffer.drain().is_empty());
    }
}
