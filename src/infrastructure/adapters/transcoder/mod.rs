//! Audio Transcoder 适配器

mod ogg_transcoder;

pub use ogg_transcoder::OggTranscoder;
