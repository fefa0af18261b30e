//! Argument lists for the transcoder stages
//!
//! The pipeline only needs three conversions; each is expressed as the
//! output-side argument list handed to [`Transcoder::convert`].
//!
//! [`Transcoder::convert`]: crate::pipeline::collaborators::Transcoder::convert

/// Sample rate expected by speech recognition
pub const ASR_SAMPLE_RATE: u32 = 16_000;

/// Bitrate of outgoing voice notes
pub const VOICE_BITRATE: &str = "24k";

/// Resample to `sample_rate`, downmix to mono, store as 16-bit PCM
pub fn normalize_args(sample_rate: u32) -> Vec<String> {
    vec![
        "-ar".to_string(),
        sample_rate.to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
    ]
}

/// Pitch-preserving time stretch
pub fn tempo_args(tempo: f32) -> Vec<String> {
    vec![
        "-filter:a".to_string(),
        format!("atempo={}", tempo),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
    ]
}

/// Small mono Opus tuned for speech, the format voice notes expect
pub fn voice_encode_args() -> Vec<String> {
    [
        "-ac",
        "1",
        "-c:a",
        "libopus",
        "-b:a",
        VOICE_BITRATE,
        "-vbr",
        "on",
        "-application",
        "voip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Whether a tempo factor differs from normal speed
pub fn needs_tempo(tempo: f32) -> bool {
    (tempo - 1.0).abs() > 1e-6
}
