use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;

use framekit_core::pipeline::extract_frames_use_case::{ExtractFramesUseCase, FrameSavedFn};
use framekit_core::sampling::domain::frame_namer::FrameNamer;
use framekit_core::shared::config::{DecodeErrorPolicy, ExtractionConfig};
use framekit_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use framekit_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Save frames from a video at a fixed sampling rate.
#[derive(Parser)]
#[command(name = "framekit-extract")]
struct Cli {
    /// JSON file with extraction settings; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input video file [default: videoplayback.mp4].
    #[arg(long)]
    video: Option<PathBuf>,

    /// Directory the frames are written to [default: video_frames_dataset].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Frames to keep per second of video [default: 1].
    #[arg(long)]
    fps: Option<f64>,

    /// Filename prefix for saved frames [default: frame_].
    #[arg(long)]
    prefix: Option<String>,

    /// Image extension, which also picks the encoder [default: jpg].
    #[arg(long)]
    extension: Option<String>,

    /// JPEG quality, 1-100 [default: 95].
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Fail on a decode error instead of treating it as end of video.
    #[arg(long)]
    strict_decode: bool,
}

impl Cli {
    fn into_config(self) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::load(path)?,
            None => ExtractionConfig::default(),
        };
        if let Some(video) = self.video {
            config.video_path = video;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(fps) = self.fps {
            config.target_rate = fps;
        }
        if let Some(prefix) = self.prefix {
            config.filename_prefix = prefix;
        }
        if let Some(extension) = self.extension {
            config.image_extension = extension;
        }
        if let Some(quality) = self.quality {
            config.jpeg_quality = quality;
        }
        if self.strict_decode {
            config.on_decode_error = DecodeErrorPolicy::Fail;
        }
        Ok(config)
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    let on_saved: FrameSavedFn = Box::new(|_, path| {
        eprintln!("Saved frame: {}", path.display());
    });
    let mut use_case = ExtractFramesUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(ImageFileWriter::new().with_jpeg_quality(config.jpeg_quality)),
        FrameNamer::new(config.filename_prefix, config.image_extension),
        config.on_decode_error,
        Some(on_saved),
    );

    let summary = use_case.execute(&config.video_path, &config.output_dir, config.target_rate)?;
    eprintln!("Total frames saved: {}", summary.saved);
    if summary.stopped_on_decode_error {
        log::warn!(
            "Stopped early after {} decoded frames; later frames could not be decoded",
            summary.decoded
        );
    }
    Ok(())
}
