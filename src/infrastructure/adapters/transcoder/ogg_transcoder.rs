//! Ogg Transcoder - 基于 symphonia 的音频转码器
//!
//! 上游模型返回的容器格式不固定（WAV/FLAC/MP3 等），用 symphonia
//! 的探测器按内容识别，解码为 PCM 后重编码为 Opus (OGG 容器)

use async_trait::async_trait;
use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult,
};

/// Ogg 转码器
pub struct OggTranscoder;

impl OggTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// 探测容器格式并解码为交织 f32 PCM
    ///
    /// 不给探测器任何文件名/扩展名提示，纯按内容识别
    fn probe_and_decode(&self, data: &[u8]) -> Result<DecodedAudio, TranscodeError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let hint = Hint::new();
        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| TranscodeError::UnrecognizedContainer(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| TranscodeError::DecodingError("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| TranscodeError::DecodingError("Unknown sample rate".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u8)
            .ok_or_else(|| TranscodeError::DecodingError("Unknown channel count".to_string()))?;

        // Opus 只支持单声道/立体声
        if channels == 0 || channels > 2 {
            return Err(TranscodeError::DecodingError(format!(
                "Unsupported channel count: {}",
                channels
            )));
        }

        let decoder_opts = DecoderOptions::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &decoder_opts)
            .map_err(|e| TranscodeError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let track_id = track.id;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(TranscodeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            // Only take the actual samples, not the entire buffer capacity
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        if samples.is_empty() {
            return Err(TranscodeError::DecodingError(
                "No audio frames decoded".to_string(),
            ));
        }

        let duration_ms = (samples.len() as u64 * 1000) / (sample_rate as u64 * channels as u64);

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
            duration_ms,
        })
    }

    /// 将 PCM f32 样本编码为 Opus (OGG 容器)
    fn encode_opus(&self, pcm: &DecodedAudio, bitrate: u32) -> Result<Vec<u8>, TranscodeError> {
        // Opus 支持的采样率: 8000, 12000, 16000, 24000, 48000
        let target_sample_rate = opus_compatible_sample_rate(pcm.sample_rate);

        // 重采样（如果需要）
        let (samples, sample_rate) = if target_sample_rate != pcm.sample_rate {
            let resampled = resample(
                &pcm.samples,
                pcm.sample_rate,
                target_sample_rate,
                pcm.channels,
            );
            (resampled, target_sample_rate)
        } else {
            (pcm.samples.clone(), pcm.sample_rate)
        };

        let channels = if pcm.channels == 1 {
            Channels::Mono
        } else {
            Channels::Stereo
        };
        let channel_count = pcm.channels as usize;

        // Application::Audio 面向通用音频（音乐生成场景），而非纯语音
        let mut encoder = Encoder::new(sample_rate, channels, Application::Audio).map_err(|e| {
            TranscodeError::EncodingError(format!("Failed to create Opus encoder: {}", e))
        })?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| TranscodeError::EncodingError(format!("Failed to set bitrate: {}", e)))?;

        // 编码器延迟 (lookahead) 作为 pre-skip
        let lookahead = encoder.get_lookahead().unwrap_or(312) as u64;

        // 转换 f32 到 i16
        let pcm_i16: Vec<i16> = samples
            .iter()
            .map(|&s| {
                let clamped = s.clamp(-1.0, 1.0);
                (clamped * 32767.0) as i16
            })
            .collect();

        // 使用 20ms frame
        let frame_size = (sample_rate as usize * 20) / 1000;
        let samples_per_frame = frame_size * channel_count;

        let mut ogg_data = Vec::new();
        {
            let mut packet_writer = PacketWriter::new(&mut ogg_data);

            // RFC 7845: granule position 和 pre-skip 都以 48kHz 采样数计
            let granule_scale = 48000.0 / sample_rate as f64;
            let frame_granule = (frame_size as f64 * granule_scale) as u64;
            let pre_skip_48k = (lookahead as f64 * granule_scale) as u64;

            // 写入 Opus Head 包 (RFC 7845)
            let opus_head =
                create_opus_head(pcm.channels, sample_rate, pre_skip_48k as u16);
            packet_writer
                .write_packet(opus_head, 0, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| {
                    TranscodeError::EncodingError(format!("Failed to write Opus head: {}", e))
                })?;

            // 写入 Opus Tags 包
            let opus_tags = create_opus_tags();
            packet_writer
                .write_packet(opus_tags, 0, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| {
                    TranscodeError::EncodingError(format!("Failed to write Opus tags: {}", e))
                })?;

            let mut output_buf = vec![0u8; 4000]; // Opus 最大包大小
            let mut granule_pos: u64 = pre_skip_48k;

            // 收集所有 chunks（包括不完整的最后一帧）
            let chunks: Vec<_> = pcm_i16.chunks(samples_per_frame).collect();

            // 编码器缓存了 lookahead 个样本，需要额外的静音帧刷新出来
            let flush_frames = (lookahead as usize + frame_size - 1) / frame_size;

            for chunk in chunks.into_iter() {
                // 最后一帧不足时用零填充
                let frame = if chunk.len() < samples_per_frame {
                    let mut padded = chunk.to_vec();
                    padded.resize(samples_per_frame, 0);
                    padded
                } else {
                    chunk.to_vec()
                };

                let encoded_len = encoder.encode(&frame, &mut output_buf).map_err(|e| {
                    TranscodeError::EncodingError(format!("Opus encode failed: {}", e))
                })?;

                granule_pos += frame_granule;

                packet_writer
                    .write_packet(
                        output_buf[..encoded_len].to_vec(),
                        0,
                        ogg::PacketWriteEndInfo::NormalPacket,
                        granule_pos,
                    )
                    .map_err(|e| {
                        TranscodeError::EncodingError(format!("Failed to write Opus packet: {}", e))
                    })?;
            }

            // 刷新编码器缓冲区
            let silence_frame = vec![0i16; samples_per_frame];
            for flush_idx in 0..flush_frames {
                let encoded_len = encoder.encode(&silence_frame, &mut output_buf).map_err(|e| {
                    TranscodeError::EncodingError(format!("Opus flush encode failed: {}", e))
                })?;

                granule_pos += frame_granule;

                let is_last = flush_idx == flush_frames - 1;
                let end_info = if is_last {
                    ogg::PacketWriteEndInfo::EndStream
                } else {
                    ogg::PacketWriteEndInfo::NormalPacket
                };

                packet_writer
                    .write_packet(
                        output_buf[..encoded_len].to_vec(),
                        0,
                        end_info,
                        granule_pos,
                    )
                    .map_err(|e| {
                        TranscodeError::EncodingError(format!(
                            "Failed to write Opus flush packet: {}",
                            e
                        ))
                    })?;
            }
        }

        Ok(ogg_data)
    }
}

impl Default for OggTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoderPort for OggTranscoder {
    async fn transcode_to_ogg(
        &self,
        audio_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError> {
        let decoded = self.probe_and_decode(audio_data)?;
        let ogg_data = self.encode_opus(&decoded, config.bitrate)?;

        tracing::debug!(
            original_size = audio_data.len(),
            ogg_size = ogg_data.len(),
            duration_ms = decoded.duration_ms,
            bitrate = config.bitrate,
            "Encoded to Ogg/Opus"
        );

        Ok(TranscodeResult {
            ogg_data,
            duration_ms: decoded.duration_ms,
            sample_rate: decoded.sample_rate,
            channels: decoded.channels,
        })
    }
}

#[derive(Debug)]
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u8,
    duration_ms: u64,
}

/// 获取 Opus 兼容的采样率
fn opus_compatible_sample_rate(sample_rate: u32) -> u32 {
    // Opus 支持: 8000, 12000, 16000, 24000, 48000
    match sample_rate {
        8000 | 12000 | 16000 | 24000 | 48000 => sample_rate,
        r if r <= 8000 => 8000,
        r if r <= 12000 => 12000,
        r if r <= 16000 => 16000,
        r if r <= 24000 => 24000,
        _ => 48000,
    }
}

/// 简单线性重采样
fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: u8) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let channel_count = channels as usize;
    let frame_count = samples.len() / channel_count;
    let new_frame_count = (frame_count as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_frame_count * channel_count);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        for ch in 0..channel_count {
            let idx0 = src_idx * channel_count + ch;
            let idx1 = ((src_idx + 1).min(frame_count.saturating_sub(1))) * channel_count + ch;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            // 线性插值
            resampled.push(s0 + (s1 - s0) * frac as f32);
        }
    }

    resampled
}

/// 创建 Opus Head 包 (RFC 7845)
fn create_opus_head(channels: u8, sample_rate: u32, pre_skip_48k: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead"); // Magic signature
    head.push(1); // Version
    head.push(channels); // Channel count
    head.extend_from_slice(&pre_skip_48k.to_le_bytes()); // Pre-skip (48kHz 样本数)
    head.extend_from_slice(&sample_rate.to_le_bytes()); // Input sample rate
    head.extend_from_slice(&0i16.to_le_bytes()); // Output gain
    head.push(0); // Channel mapping family
    head
}

/// 创建 Opus Tags 包
fn create_opus_tags() -> Vec<u8> {
    let vendor = "hubtone";
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes()); // No user comments
    tags
}
