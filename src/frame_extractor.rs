//! Thin wrapper around ffmpeg: opens a video, reports its duration and hands
//! out the decoded frame at (or right after) a requested position.

extern crate ffmpeg_next as ffmpeg;

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use color_eyre::eyre::{self, Context};
use ffmpeg::codec::Context as CodecContext;
use ffmpeg::decoder::Video as DecoderVideo;
use ffmpeg::format::context::Input as FormatContext;
use ffmpeg::format::{input, Pixel};
use ffmpeg::frame::Video as FrameVideo;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::context::Context as ScalingContext;
use ffmpeg::util::log as ffmpeglog;
use ffmpeg::{Packet as CodecPacket, Rational, Rescale};
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AV_TIME_BASE_Q};
use image::RgbImage;

pub type Result<T> = eyre::Result<T>;

static FFMPEG_INITIALIZED: OnceLock<std::result::Result<(), ffmpeg::Error>> =
    OnceLock::new();

/// One opened video. Positions handed to [`Self::frame_at`] must be
/// monotonically increasing, the sampling loop only ever moves forward.
pub struct VideoFile {
    ictx: FormatContext,
    decoder: DecoderVideo,
    converter: ScalingContext,

    video_stream_index: usize,
    timebase: Rational,
    first_timestamp: i64,
    end_timestamp: i64,
    has_audio: bool,
}

impl VideoFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        FFMPEG_INITIALIZED
            .get_or_init(|| {
                ffmpeg::init()?;
                ffmpeglog::set_level(ffmpeglog::Level::Error);
                Ok(())
            })
            .clone()
            .wrap_err("failed to initialize ffmpeg")?;

        let ictx = input(&path).wrap_err("failed to open the file")?;

        let video = ictx
            .streams()
            .best(Type::Video)
            .ok_or_else(|| eyre::eyre!("no video stream"))?;

        let video_stream_index = video.index();
        eyre::ensure!(
            video.start_time() != AV_NOPTS_VALUE,
            "does not have a start time"
        );
        let first_timestamp = video.start_time();
        let timebase = video.time_base();
        let end_timestamp = if video.duration() == AV_NOPTS_VALUE {
            eyre::ensure!(
                ictx.duration() != AV_NOPTS_VALUE,
                "does not have a duration"
            );
            ictx.duration().rescale(AV_TIME_BASE_Q, timebase)
        } else {
            video.duration()
        };
        eyre::ensure!(
            end_timestamp >= first_timestamp,
            "the end timestamp is less than the start"
        );

        let decoder = CodecContext::from_parameters(video.parameters())
            .wrap_err("no codec found")?
            .decoder()
            .video()
            .wrap_err("no codec found, of type video (?)")?;

        let converter = Self::pixel_converter(&decoder)?;
        let has_audio = ictx.streams().best(Type::Audio).is_some();

        Ok(Self {
            ictx,
            decoder,
            converter,
            video_stream_index,
            timebase,
            first_timestamp,
            end_timestamp,
            has_audio,
        })
    }

    fn pixel_converter(decoder: &DecoderVideo) -> Result<ScalingContext> {
        eyre::ensure!(decoder.format() != Pixel::None, "no pixel format");
        Ok(ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::Flags::FAST_BILINEAR,
        )?)
    }

    pub fn duration(&self) -> Duration {
        let micros = (self.end_timestamp - self.first_timestamp)
            .rescale(self.timebase, AV_TIME_BASE_Q);
        Duration::from_micros(micros.max(0) as u64)
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    /// The first decodable frame at or after `at`, or None when the stream
    /// ends before that.
    pub fn frame_at(&mut self, at: Duration) -> Result<Option<RgbImage>> {
        if at >= self.duration() {
            return Ok(None);
        }

        let micros: i64 = at.as_micros().try_into().wrap_err("position too large")?;
        let target = self.first_timestamp + micros.rescale(AV_TIME_BASE_Q, self.timebase);

        self.seek_to(target, micros)?;
        self.decode_until(target)
    }

    fn seek_to(&mut self, target: i64, micros: i64) -> Result<()> {
        // the container-level seek wants AV_TIME_BASE units, including the
        // stream's start offset
        let global = micros + self.first_timestamp.rescale(self.timebase, AV_TIME_BASE_Q);
        self.ictx
            .seek(global, ..global)
            .wrap_err_with(|| format!("failed to seek to stream timestamp {target}"))?;
        self.decoder.flush();
        Ok(())
    }

    fn decode_until(&mut self, target: i64) -> Result<Option<RgbImage>> {
        loop {
            loop {
                let mut frame = FrameVideo::empty();
                match self.decoder.receive_frame(&mut frame) {
                    Ok(()) => (),
                    Err(ffmpeg::Error::Other {
                        errno: libc::EAGAIN,
                    }) => break,
                    Err(ffmpeg::Error::Eof) => return Ok(None),
                    Err(e) => {
                        return Err(e)
                            .wrap_err("decoder error when receiving a frame from it")
                    }
                }

                let Some(ts) = frame.timestamp() else {
                    log::warn!("dropping a frame without a timestamp");
                    continue;
                };
                if ts < target {
                    continue;
                }

                let mut converted = FrameVideo::empty();
                self.converter
                    .run(&frame, &mut converted)
                    .wrap_err("failed to convert the decoded frame")?;
                return Ok(Some(tight_image(&converted)));
            }

            loop {
                let mut packet = CodecPacket::empty();
                match packet.read(&mut self.ictx) {
                    Ok(()) if packet.stream() == self.video_stream_index => {
                        match self.decoder.send_packet(&packet) {
                            Ok(()) => break,
                            Err(e) => {
                                log::warn!("failed to decode a packet: {e}");
                                continue;
                            }
                        }
                    }
                    Ok(()) => continue,
                    Err(ffmpeg::Error::Eof) => {
                        self.decoder
                            .send_eof()
                            .wrap_err("failed to send EOF to the decoder")?;
                        break;
                    }
                    Err(e) => {
                        eyre::bail!("failed to read a packet from the stream: {e}");
                    }
                }
            }
        }
    }
}

/// Repacks an RGB24 ffmpeg frame, whose rows may be stride-padded, into a
/// tight image buffer.
fn tight_image(converted: &FrameVideo) -> RgbImage {
    assert_eq!(Pixel::RGB24, converted.format());
    assert_eq!(1, converted.planes());

    let width: usize = converted.width().try_into().expect("will always fit");
    let height: usize = converted.height().try_into().expect("will always fit");
    let src_linesize = converted.stride(0);
    let trg_linesize = 3 * width;
    let data = converted.data(0);

    let data = if src_linesize == trg_linesize {
        data[..trg_linesize * height].to_vec()
    } else {
        assert!(src_linesize >= trg_linesize);
        let mut tight = Vec::with_capacity(trg_linesize * height);
        for row in data.chunks(src_linesize).take(height) {
            tight.extend_from_slice(&row[..trg_linesize]);
        }
        tight
    };

    RgbImage::from_vec(
        width.try_into().expect("was an u32 before"),
        height.try_into().expect("was an u32 before"),
        data,
    )
    .expect("the buffer is big enough!")
}
