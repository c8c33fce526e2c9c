use crate::models::audio_models::StereoSample;

/// Pull interface offered to the consumer (e.g. a render loop).
pub trait PcmSource {
    /// Fill `buffer` with up to `frame_count` frames of converted audio.
    ///
    /// Returns `false` only when the request cannot be satisfied without writing
    /// out of bounds; "no data yet" is still `true`.
    fn read(&mut self, buffer: &mut [StereoSample], frame_count: u32) -> bool;
}
