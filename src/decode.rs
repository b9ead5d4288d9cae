// src/decode.rs

use std::fs::File;
use symphonia::core::audio::SampleBuffer as SymphoniaBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::SampleBuffer;
use crate::error::StudioError;
use crate::resample::resample_buffer;

/// Decodes a file to mono f32 samples at its native rate.
pub fn decode_to_mono(path: &str) -> Result<(Vec<f32>, u32), StudioError> {
    let file = File::open(path).map_err(|e| StudioError::decode(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = get_probe()
        .format(
            &Default::default(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| StudioError::decode(path, e))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| StudioError::decode(path, "no default audio track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| StudioError::decode(path, e))?;
    let mut sample_buf: Option<SymphoniaBuffer<f32>> = None;
    let mut mono = Vec::<f32>::new();

    let mut sample_rate = 44_100;
    let mut rate_locked = false;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("skipping malformed packet in {path}: {e}");
                continue;
            }
        };
        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        if !rate_locked {
            sample_rate = spec.rate;
            rate_locked = true;
        }

        let needs_new = sample_buf
            .as_ref()
            .map_or(true, |b| b.capacity() < decoded.capacity());
        if needs_new {
            sample_buf = Some(SymphoniaBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        // Each packet carries its own channel layout; fold it down right
        // here so later layout changes cannot corrupt the stream.
        let channels = spec.channels.count().max(1);
        mono.extend(downmix_to_mono(buf.samples(), channels));
    }

    if mono.is_empty() {
        return Err(StudioError::decode(path, "no audio frames decoded"));
    }

    log::info!(
        "decoded {path}: {} mono samples at {sample_rate} Hz",
        mono.len()
    );
    Ok((mono, sample_rate))
}

/// Load path used by the application: decode, then normalize to the working
/// sample rate so display and stretching always see the same grid.
pub fn load_audio(path: &str, target_rate: u32) -> Result<SampleBuffer, StudioError> {
    let (mono, native_rate) = decode_to_mono(path)?;
    let samples =
        resample_buffer(&mono, native_rate, target_rate).map_err(|e| StudioError::decode(path, e))?;
    Ok(SampleBuffer::new(samples, target_rate))
}

fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let frames = interleaved.len() / channels;
    let mut out = Vec::with_capacity(frames);
    for chunk in interleaved.chunks_exact(channels) {
        let mut s = 0.0f32;
        for &c in chunk {
            s += c;
        }
        out.push(s / channels as f32);
    }
    out
}
