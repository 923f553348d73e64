use std::fs;
use std::path::{Path, PathBuf};

use crate::sampling::domain::frame_namer::FrameNamer;
use crate::sampling::domain::sampling_interval::{IntervalError, SamplingInterval};
use crate::shared::config::DecodeErrorPolicy;
use crate::shared::error::{ensure_exists, PipelineError, ResourceKind};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Called after each frame is written with `(saved_index, path)`.
pub type FrameSavedFn = Box<dyn Fn(usize, &Path) + Send>;

/// Outcome of a completed extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSummary {
    pub native_fps: f64,
    pub interval: usize,
    /// Every frame the decoder produced, kept or skipped.
    pub decoded: usize,
    pub saved: usize,
    pub output_dir: PathBuf,
    /// The run ended on a decode error handled as end-of-stream.
    pub stopped_on_decode_error: bool,
}

/// Samples a video at a fixed rate and writes the kept frames as images.
///
/// Validation (path, target rate, frame rate) happens before anything is
/// created on disk. Once the source is open it is closed on every exit path.
pub struct ExtractFramesUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    namer: FrameNamer,
    decode_policy: DecodeErrorPolicy,
    on_frame_saved: Option<FrameSavedFn>,
}

impl ExtractFramesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        namer: FrameNamer,
        decode_policy: DecodeErrorPolicy,
        on_frame_saved: Option<FrameSavedFn>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            namer,
            decode_policy,
            on_frame_saved,
        }
    }

    /// Writes every `floor(native_fps / target_rate)`-th frame of `video_path`
    /// into `output_dir`, numbering the files contiguously from 0.
    pub fn execute(
        &mut self,
        video_path: &Path,
        output_dir: &Path,
        target_rate: f64,
    ) -> Result<ExtractionSummary, PipelineError> {
        ensure_exists(ResourceKind::Video, video_path)?;
        if !target_rate.is_finite() || target_rate <= 0.0 {
            return Err(PipelineError::InvalidTargetRate { rate: target_rate });
        }

        let metadata =
            self.reader
                .open(video_path)
                .map_err(|source| PipelineError::ResourceUnreadable {
                    kind: ResourceKind::Video,
                    path: video_path.to_path_buf(),
                    source,
                })?;

        let result = self.sample(&metadata, video_path, output_dir, target_rate);
        self.reader.close();
        result
    }

    fn sample(
        &mut self,
        metadata: &VideoMetadata,
        video_path: &Path,
        output_dir: &Path,
        target_rate: f64,
    ) -> Result<ExtractionSummary, PipelineError> {
        if !metadata.has_usable_fps() {
            return Err(PipelineError::UnreadableMetadata {
                path: video_path.to_path_buf(),
            });
        }
        let interval = SamplingInterval::new(metadata.fps, target_rate).map_err(|e| match e {
            IntervalError::UnusableNativeRate => PipelineError::UnreadableMetadata {
                path: video_path.to_path_buf(),
            },
            IntervalError::InvalidTargetRate => {
                PipelineError::InvalidTargetRate { rate: target_rate }
            }
            IntervalError::TooSmall => PipelineError::IntervalTooSmall {
                native_fps: metadata.fps,
                target_rate,
            },
        })?;

        log::debug!(
            "Decoding {} stream, {}x{}",
            metadata.codec,
            metadata.width,
            metadata.height
        );
        log::info!("Video frame rate: {} FPS", metadata.fps);
        log::info!("Saving 1 frame every {} frames", interval.get());
        if metadata.total_frames > 0 {
            log::debug!(
                "Container reports {} frames, expecting {} saved",
                metadata.total_frames,
                interval.kept_count(metadata.total_frames)
            );
        }

        fs::create_dir_all(output_dir).map_err(|e| PipelineError::Write {
            path: output_dir.to_path_buf(),
            source: Box::new(e),
        })?;

        let mut frame_count = 0usize;
        let mut saved = 0usize;
        let mut stopped_on_decode_error = false;

        for item in self.reader.frames() {
            let frame = match item {
                Ok(frame) => frame,
                Err(source) => match self.decode_policy {
                    DecodeErrorPolicy::EndOfStream => {
                        log::warn!("Decoding stopped at frame {frame_count}: {source}");
                        stopped_on_decode_error = true;
                        break;
                    }
                    DecodeErrorPolicy::Fail => {
                        return Err(PipelineError::DecodeFailed {
                            frame_index: frame_count,
                            saved,
                            source,
                        });
                    }
                },
            };

            if interval.keeps(frame_count) {
                let path = self.namer.path_in(output_dir, saved);
                self.image_writer
                    .write(&path, &frame)
                    .map_err(|source| PipelineError::Write {
                        path: path.clone(),
                        source,
                    })?;
                log::debug!("Saved frame: {}", path.display());
                if let Some(ref callback) = self.on_frame_saved {
                    callback(saved, &path);
                }
                saved += 1;
            }
            frame_count += 1;
        }

        log::info!("Finished extracting frames: {saved} saved out of {frame_count} decoded");

        Ok(ExtractionSummary {
            native_fps: metadata.fps,
            interval: interval.get(),
            decoded: frame_count,
            saved,
            output_dir: output_dir.to_path_buf(),
            stopped_on_decode_error,
        })
    }
}
