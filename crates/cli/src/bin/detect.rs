use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;

use framekit_core::annotation::infrastructure::box_annotator::BoxAnnotator;
use framekit_core::detection::infrastructure::onnx_yolo_detector::YoloThresholds;
use framekit_core::pipeline::detect_image_use_case::{
    load_detector, validate_inputs, DetectImageUseCase, OutputOptions,
};
use framekit_core::shared::config::DetectionConfig;
use framekit_core::video::infrastructure::image_file_reader::ImageFileReader;
use framekit_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Run a YOLO detection model on one image and save the annotated result.
#[derive(Parser)]
#[command(name = "framekit-detect")]
struct Cli {
    /// JSON file with detection settings; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// ONNX export of a YOLO detection model [default: best.onnx].
    #[arg(long)]
    model: Option<PathBuf>,

    /// Input image [default: image.png].
    #[arg(long)]
    image: Option<PathBuf>,

    /// Minimum class confidence (0.0-1.0) [default: 0.25].
    #[arg(long)]
    conf: Option<f64>,

    /// IoU threshold for non-maximum suppression [default: 0.7].
    #[arg(long)]
    iou: Option<f64>,

    /// Maximum detections kept per image [default: 300].
    #[arg(long)]
    max_det: Option<usize>,

    /// Parent directory of run directories [default: runs/detect].
    #[arg(long)]
    project: Option<PathBuf>,

    /// Run directory name, suffixed 2, 3, ... when taken [default: predict].
    #[arg(long)]
    name: Option<String>,

    /// Reuse an existing run directory.
    #[arg(long)]
    exist_ok: bool,

    /// Also write YOLO-format label files.
    #[arg(long)]
    save_txt: bool,

    /// Box outline width in pixels [default: scaled to the image].
    #[arg(long)]
    line_width: Option<u32>,

    /// Don't write the annotated image.
    #[arg(long)]
    no_save: bool,
}

impl Cli {
    fn into_config(self) -> Result<DetectionConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => DetectionConfig::load(path)?,
            None => DetectionConfig::default(),
        };
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(image) = self.image {
            config.image_path = image;
        }
        if let Some(conf) = self.conf {
            config.confidence = conf;
        }
        if let Some(iou) = self.iou {
            config.iou_threshold = iou;
        }
        if let Some(max_det) = self.max_det {
            config.max_detections = max_det;
        }
        if let Some(project) = self.project {
            config.project_dir = project;
        }
        if let Some(name) = self.name {
            config.run_name = name;
        }
        if let Some(line_width) = self.line_width {
            config.line_width = Some(line_width);
        }
        config.exist_ok |= self.exist_ok;
        config.save_txt |= self.save_txt;
        if self.no_save {
            config.save = false;
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
    validate_inputs(&config.model_path, &config.image_path)?;

    let detector = load_detector(
        &config.model_path,
        YoloThresholds {
            confidence: config.confidence,
            iou: config.iou_threshold,
            max_detections: config.max_detections,
        },
    )?;

    let annotator = match config.line_width {
        Some(width) => BoxAnnotator::with_line_width(width),
        None => BoxAnnotator::new(),
    };
    let mut use_case = DetectImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(detector),
        Box::new(annotator),
        Box::new(ImageFileWriter::new()),
        OutputOptions::from(&config),
    );
    let outcome = use_case.execute(&config.image_path)?;

    if let Some(path) = &outcome.annotated_image {
        log::info!("Annotated image written to {}", path.display());
    }
    if let Some(path) = &outcome.labels_file {
        log::info!("Labels written to {}", path.display());
    }
    Ok(())
}
