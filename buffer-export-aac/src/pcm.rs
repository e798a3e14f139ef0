/// Convert float samples to 16-bit PCM for the AAC encoder.
///
/// Values are clamped to [-1.0, 1.0]; -1.0 maps to `-i16::MAX`.
pub fn convert_to_int16(samples: &[f32], out: &mut Vec<i16>) {
    out.reserve(samples.len());
    for &sample in samples {
        let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
        out.push((clamped * i16::MAX as f32) as i16);
    }
}
