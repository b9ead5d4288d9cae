// src/audio.rs

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::consumer::Consumer;
use ringbuf::traits::Producer as RbProducer;
use ringbuf::{HeapRb, traits::Split};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::resample::resample_buffer;

const RING_CAPACITY: usize = 131_072;

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> Result<OutputConfig, anyhow::Error> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    let supported_config = device.default_output_config()?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    log::debug!("output device: {output_channels} channels at {output_sample_rate} Hz");

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}

/// One fire-and-forget playback. Keeps the stream and its feeder thread
/// alive; dropping it cancels the feeder and stops the device.
pub struct RenderHandle {
    cancel: Arc<AtomicBool>,
    _feeder: JoinHandle<()>,
    _stream: Stream,
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Plays a mono buffer once on the default output device, asynchronously.
/// The buffer is resampled to the device rate if needed and duplicated
/// across the device's channels.
pub fn render(samples: Vec<f32>, sample_rate: u32) -> Result<RenderHandle, anyhow::Error> {
    let output = setup_output_device()?;

    let samples = if output.output_sample_rate != sample_rate {
        resample_buffer(&samples, sample_rate, output.output_sample_rate)?
    } else {
        samples
    };

    let rb = HeapRb::<f32>::new(RING_CAPACITY);
    let (producer, consumer) = rb.split();

    let cancel = Arc::new(AtomicBool::new(false));
    let feeder = spawn_feeder(producer, samples, cancel.clone());

    let err_fn = |err| log::error!("output stream error: {err}");
    let channels = output.output_channels;
    let OutputConfig {
        device,
        config,
        sample_format,
        ..
    } = output;

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32, _>(device, config, channels, consumer, err_fn)?,
        SampleFormat::I16 => build_stream::<i16, _>(device, config, channels, consumer, err_fn)?,
        SampleFormat::U16 => build_stream::<u16, _>(device, config, channels, consumer, err_fn)?,
        _ => anyhow::bail!("unsupported sample format: {sample_format:?}"),
    };

    stream.play()?;

    Ok(RenderHandle {
        cancel,
        _feeder: feeder,
        _stream: stream,
    })
}

/// Build CPAL output stream reading mono samples from the ring buffer.
/// The callback fills silence once the buffer runs dry.
pub fn build_stream<T, C>(
    device: Device,
    config: StreamConfig,
    channels: usize,
    mut consumer: C,
    err_fn: fn(cpal::StreamError),
) -> Result<Stream, anyhow::Error>
where
    T: cpal::Sample + cpal::FromSample<f32> + SizedSample,
    C: Consumer<Item = f32> + Send + 'static,
{
    let channels = channels.max(1);
    device
        .build_output_stream(
            &config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let s = consumer.try_pop().unwrap_or(0.0);
                    for out in frame.iter_mut() {
                        *out = T::from_sample(s);
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(Into::into)
}

fn spawn_feeder<P>(mut producer: P, samples: Vec<f32>, cancel: Arc<AtomicBool>) -> JoinHandle<()>
where
    P: RbProducer<Item = f32> + Send + 'static,
{
    thread::spawn(move || {
        for &s in &samples {
            loop {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                match producer.try_push(s) {
                    Ok(()) => break,
                    Err(_) => thread::park_timeout(Duration::from_micros(200)),
                }
            }
        }
    })
}
