//! Re-chunks WASAPI packets into fixed transfer units.
//!
//! WASAPI hands out packets of whatever frame count the engine period yields
//! (480 frames at 48 kHz is typical). The bridge expects one 512-sample block
//! per delivery, first channel only, so packets are staged here and released
//! unit by unit as raw native-endian bytes.

use capture_bridge_core::models::audio_models::{SAMPLE_WIDTH, TRANSFER_UNIT};

#[derive(Debug)]
pub struct TransferUnitAssembler {
    staged: Vec<f32>,
    bytes: Vec<u8>,
}

impl TransferUnitAssembler {
    pub fn new() -> Self {
        Self {
            staged: Vec::with_capacity(TRANSFER_UNIT * 4),
            bytes: Vec::with_capacity(TRANSFER_UNIT * SAMPLE_WIDTH),
        }
    }

    /// Stage the first channel of an interleaved packet.
    pub fn push_interleaved(&mut self, samples: &[f32], channels: usize) {
        self.staged.extend(samples.iter().step_by(channels.max(1)).copied());
    }

    /// Stage `frames` frames of silence (packets flagged silent by the engine).
    pub fn push_silence(&mut self, frames: usize) {
        self.staged.resize(self.staged.len() + frames, 0.0);
    }

    /// Hand every complete unit to `emit`, oldest first.
    pub fn drain_units(&mut self, mut emit: impl FnMut(&[u8])) {
        let mut consumed = 0;
        while self.staged.len() - consumed >= TRANSFER_UNIT {
            self.bytes.clear();
            for sample in &self.staged[consumed..consumed + TRANSFER_UNIT] {
                self.bytes.extend_from_slice(&sample.to_ne_bytes());
            }
            emit(&self.bytes);
            consumed += TRANSFER_UNIT;
        }
        self.staged.drain(..consumed);
    }

    /// Samples staged but not yet emitted.
    pub fn pending(&self) -> usize {
        self.staged.len()
    }
}

impl Default for TransferUnitAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(SAMPLE_WIDTH)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn keeps_first_channel_only() {
        let mut asm = TransferUnitAssembler::new();
        let stereo: Vec<f32> = (0..TRANSFER_UNIT).flat_map(|i| [i as f32, -1.0]).collect();

        asm.push_interleaved(&stereo, 2);

        let mut units = Vec::new();
        asm.drain_units(|b| units.push(decode(b)));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0][0], 0.0);
        assert_eq!(units[0][511], 511.0);
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn holds_partial_unit_until_complete() {
        let mut asm = TransferUnitAssembler::new();
        asm.push_interleaved(&[0.25; 480], 1);

        let mut emitted = 0;
        asm.drain_units(|_| emitted += 1);
        assert_eq!(emitted, 0);
        assert_eq!(asm.pending(), 480);

        asm.push_interleaved(&[0.5; 480], 1);
        let mut units = Vec::new();
        asm.drain_units(|b| units.push(decode(b)));

        assert_eq!(units.len(), 1);
        assert_eq!(units[0][479], 0.25);
        assert_eq!(units[0][480], 0.5);
        assert_eq!(asm.pending(), 448);
    }

    #[test]
    fn emits_multiple_units_in_order() {
        let mut asm = TransferUnitAssembler::new();
        let mono: Vec<f32> = (0..3 * TRANSFER_UNIT).map(|i| (i / TRANSFER_UNIT) as f32).collect();
        asm.push_interleaved(&mono, 1);

        let mut firsts = Vec::new();
        asm.drain_units(|b| firsts.push(decode(b)[0]));
        assert_eq!(firsts, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn silence_counts_as_frames() {
        let mut asm = TransferUnitAssembler::new();
        asm.push_silence(TRANSFER_UNIT);

        let mut units = Vec::new();
        asm.drain_units(|b| units.push(decode(b)));
        assert_eq!(units.len(), 1);
        assert!(units[0].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn zero_channels_treated_as_mono() {
        let mut asm = TransferUnitAssembler::new();
        asm.push_interleaved(&[1.0, 2.0, 3.0], 0);
        assert_eq!(asm.pending(), 3);
    }
}
