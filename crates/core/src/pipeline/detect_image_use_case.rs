use std::fs;
use std::path::{Path, PathBuf};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::class_names::ClassNames;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::infrastructure::onnx_yolo_detector::{OnnxYoloDetector, YoloThresholds};
use crate::pipeline::run_directory::resolve_run_dir;
use crate::pipeline::yolo_labels::write_labels;
use crate::shared::config::DetectionConfig;
use crate::shared::constants::LABELS_DIR_NAME;
use crate::shared::error::{ensure_exists, PipelineError, ResourceKind};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Where and what a detection run persists.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputOptions {
    pub project_dir: PathBuf,
    pub run_name: String,
    pub exist_ok: bool,
    pub save_image: bool,
    pub save_txt: bool,
}

impl From<&DetectionConfig> for OutputOptions {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            project_dir: config.project_dir.clone(),
            run_name: config.run_name.clone(),
            exist_ok: config.exist_ok,
            save_image: config.save,
            save_txt: config.save_txt,
        }
    }
}

/// Detections for one image plus the labels to read them with.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<Detection>,
    pub class_names: ClassNames,
}

impl DetectionResult {
    pub fn summary(&self) -> String {
        let name = self
            .source_path
            .file_name()
            .unwrap_or(self.source_path.as_os_str());
        format!(
            "{}: {}x{} {}",
            name.to_string_lossy(),
            self.width,
            self.height,
            self.class_names.summarize(&self.detections)
        )
    }
}

#[derive(Clone, Debug)]
pub struct DetectionOutcome {
    pub result: DetectionResult,
    /// Run directory, when anything was saved.
    pub run_dir: Option<PathBuf>,
    pub annotated_image: Option<PathBuf>,
    pub labels_file: Option<PathBuf>,
}

/// Checks that the model and image exist, in that order, before anything
/// is loaded.
pub fn validate_inputs(model_path: &Path, image_path: &Path) -> Result<(), PipelineError> {
    ensure_exists(ResourceKind::Model, model_path)?;
    ensure_exists(ResourceKind::Image, image_path)
}

/// Loads the YOLO model at `model_path`.
///
/// A missing file is [`PipelineError::ResourceNotFound`]; a file ONNX Runtime
/// can't load is [`PipelineError::ResourceUnreadable`]. Both are model errors.
pub fn load_detector(
    model_path: &Path,
    thresholds: YoloThresholds,
) -> Result<OnnxYoloDetector, PipelineError> {
    ensure_exists(ResourceKind::Model, model_path)?;
    OnnxYoloDetector::new(model_path, thresholds).map_err(|source| {
        PipelineError::ResourceUnreadable {
            kind: ResourceKind::Model,
            path: model_path.to_path_buf(),
            source,
        }
    })
}

/// Single-image detection pipeline: read → detect → annotate → write.
pub struct DetectImageUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn ObjectDetector>,
    annotator: Box<dyn FrameAnnotator>,
    image_writer: Box<dyn ImageWriter>,
    output: OutputOptions,
}

impl DetectImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn ObjectDetector>,
        annotator: Box<dyn FrameAnnotator>,
        image_writer: Box<dyn ImageWriter>,
        output: OutputOptions,
    ) -> Self {
        Self {
            reader,
            detector,
            annotator,
            image_writer,
            output,
        }
    }

    pub fn execute(&mut self, image_path: &Path) -> Result<DetectionOutcome, PipelineError> {
        ensure_exists(ResourceKind::Image, image_path)?;
        let unreadable = |source| PipelineError::ResourceUnreadable {
            kind: ResourceKind::Image,
            path: image_path.to_path_buf(),
            source,
        };

        let opened = self.reader.open(image_path);
        let frame = opened.and_then(|_| self.reader.frames().next().ok_or("No frames in image")?);
        self.reader.close();
        let mut frame = frame.map_err(unreadable)?;

        log::info!("Running inference on: {}", image_path.display());
        let detections = self
            .detector
            .detect(&frame)
            .map_err(|source| PipelineError::Inference { source })?;
        for d in &detections {
            log::debug!(
                "{} {:.2} at [{:.0}, {:.0}, {:.0}, {:.0}]",
                self.detector.class_names().name(d.class_id),
                d.confidence,
                d.x1,
                d.y1,
                d.x2,
                d.y2
            );
        }

        let result = DetectionResult {
            source_path: image_path.to_path_buf(),
            width: frame.width(),
            height: frame.height(),
            detections,
            class_names: self.detector.class_names().clone(),
        };
        log::info!("{}", result.summary());

        let mut outcome = DetectionOutcome {
            result,
            run_dir: None,
            annotated_image: None,
            labels_file: None,
        };
        if !self.output.save_image && !self.output.save_txt {
            return Ok(outcome);
        }

        let run_dir = resolve_run_dir(
            &self.output.project_dir,
            &self.output.run_name,
            self.output.exist_ok,
        );
        create_dir(&run_dir)?;

        let file_name = image_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("image.jpg"));

        if self.output.save_image {
            let path = run_dir.join(&file_name);
            self.annotator
                .annotate(&mut frame, &outcome.result.detections)
                .and_then(|()| self.image_writer.write(&path, &frame))
                .map_err(|source| PipelineError::Write {
                    path: path.clone(),
                    source,
                })?;
            outcome.annotated_image = Some(path);
        }

        if self.output.save_txt {
            let labels_dir = run_dir.join(LABELS_DIR_NAME);
            create_dir(&labels_dir)?;
            let path = labels_dir.join(file_name.with_extension("txt"));
            write_labels(
                &path,
                &outcome.result.detections,
                outcome.result.width,
                outcome.result.height,
            )
            .map_err(|e| PipelineError::Write {
                path: path.clone(),
                source: Box::new(e),
            })?;
            outcome.labels_file = Some(path);
        }

        log::info!("Results saved to {}", run_dir.display());
        outcome.run_dir = Some(run_dir);
        Ok(outcome)
    }
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|e| PipelineError::Write {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::infrastructure::box_annotator::BoxAnnotator;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::infrastructure::image_file_reader::ImageFileReader;
    use crate::video::infrastructure::image_file_writer::ImageFileWriter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImageReader {
        frame: Option<Frame>,
        closes: Arc<AtomicUsize>,
    }

    impl StubImageReader {
        fn new(w: u32, h: u32) -> Self {
            Self {
                frame: Some(Frame::new(vec![200; (w * h * 3) as usize], w, h, 3, 0)),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl VideoReader for StubImageReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            let frame = self.frame.as_ref().ok_or("unreadable")?;
            Ok(VideoMetadata {
                width: frame.width(),
                height: frame.height(),
                fps: 0.0,
                total_frames: 1,
                codec: String::new(),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StubDetector {
        detections: Vec<Detection>,
        names: ClassNames,
        calls: Arc<AtomicUsize>,
    }

    impl StubDetector {
        fn new(detections: Vec<Detection>) -> Self {
            Self {
                detections,
                names: ClassNames::parse_metadata("{0: 'pill', 1: 'capsule'}").unwrap(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ObjectDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.clone())
        }

        fn class_names(&self) -> &ClassNames {
            &self.names
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    // --- Helpers ---

    fn pill(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id: 0,
            confidence: 0.91,
        }
    }

    fn options(project: &Path) -> OutputOptions {
        OutputOptions {
            project_dir: project.to_path_buf(),
            run_name: "predict".to_string(),
            exist_ok: false,
            save_image: true,
            save_txt: false,
        }
    }

    fn image_file(dir: &Path) -> PathBuf {
        let path = dir.join("image.png");
        fs::write(&path, b"stub").unwrap();
        path
    }

    // --- Tests ---

    #[test]
    fn test_validate_reports_missing_model_first() {
        let err = validate_inputs(
            Path::new("/nonexistent/best.onnx"),
            Path::new("/nonexistent/image.png"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ResourceNotFound {
                kind: ResourceKind::Model,
                ..
            }
        ));
    }

    #[test]
    fn test_load_detector_missing_model_is_not_found() {
        let err = load_detector(
            Path::new("/nonexistent/best.onnx"),
            YoloThresholds::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            PipelineError::ResourceNotFound {
                kind: ResourceKind::Model,
                ..
            }
        ));
        assert_eq!(err.to_string(), "model file not found: /nonexistent/best.onnx");
    }

    #[test]
    fn test_load_detector_garbage_model_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("best.onnx");
        fs::write(&model, b"definitely not a protobuf graph").unwrap();

        let err = load_detector(&model, YoloThresholds::default()).err().unwrap();
        match err {
            PipelineError::ResourceUnreadable { kind, path, .. } => {
                assert_eq!(kind, ResourceKind::Model);
                assert_eq!(path, model);
            }
            other => panic!("expected an unreadable model, got {other}"),
        }
    }

    #[test]
    fn test_validate_reports_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("best.onnx");
        fs::write(&model, b"onnx").unwrap();
        let err = validate_inputs(&model, &dir.path().join("image.png")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ResourceNotFound {
                kind: ResourceKind::Image,
                ..
            }
        ));
        assert!(validate_inputs(&model, &model).is_ok());
    }

    #[test]
    fn test_missing_image_runs_no_inference_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let detector = StubDetector::new(vec![pill(1.0, 1.0, 5.0, 5.0)]);
        let calls = detector.calls.clone();
        let written = Arc::new(Mutex::new(Vec::new()));

        let err = DetectImageUseCase::new(
            Box::new(StubImageReader::new(10, 10)),
            Box::new(detector),
            Box::new(BoxAnnotator::new()),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            options(&project),
        )
        .execute(&dir.path().join("missing.png"))
        .unwrap_err();

        assert!(matches!(err, PipelineError::ResourceNotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(written.lock().unwrap().is_empty());
        assert!(!project.exists());
    }

    #[test]
    fn test_saves_annotated_image_under_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let image = image_file(dir.path());
        let reader = StubImageReader::new(64, 48);
        let closes = reader.closes.clone();
        let written = Arc::new(Mutex::new(Vec::new()));

        let outcome = DetectImageUseCase::new(
            Box::new(reader),
            Box::new(StubDetector::new(vec![
                pill(4.0, 4.0, 20.0, 20.0),
                pill(30.0, 10.0, 50.0, 40.0),
            ])),
            Box::new(BoxAnnotator::new()),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            options(&project),
        )
        .execute(&image)
        .unwrap();

        let expected = project.join("predict").join("image.png");
        assert_eq!(outcome.annotated_image, Some(expected.clone()));
        assert_eq!(*written.lock().unwrap(), vec![expected]);
        assert_eq!(outcome.result.detections.len(), 2);
        assert_eq!(outcome.result.summary(), "image.png: 64x48 2 pills");
        assert!(outcome.labels_file.is_none());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_run_gets_incremented_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let image = image_file(dir.path());

        let run = |project: &Path| {
            DetectImageUseCase::new(
                Box::new(StubImageReader::new(8, 8)),
                Box::new(StubDetector::new(Vec::new())),
                Box::new(BoxAnnotator::new()),
                Box::new(StubImageWriter {
                    written: Arc::new(Mutex::new(Vec::new())),
                }),
                options(project),
            )
            .execute(&image)
            .unwrap()
        };

        assert_eq!(run(&project).run_dir, Some(project.join("predict")));
        assert_eq!(run(&project).run_dir, Some(project.join("predict2")));
    }

    #[test]
    fn test_save_txt_writes_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let image = image_file(dir.path());
        let mut opts = options(&project);
        opts.save_image = false;
        opts.save_txt = true;

        let outcome = DetectImageUseCase::new(
            Box::new(StubImageReader::new(100, 50)),
            Box::new(StubDetector::new(vec![pill(0.0, 0.0, 50.0, 50.0)])),
            Box::new(BoxAnnotator::new()),
            Box::new(StubImageWriter {
                written: Arc::new(Mutex::new(Vec::new())),
            }),
            opts,
        )
        .execute(&image)
        .unwrap();

        let labels = project.join("predict/labels/image.txt");
        assert_eq!(outcome.labels_file, Some(labels.clone()));
        assert!(outcome.annotated_image.is_none());
        assert_eq!(
            fs::read_to_string(labels).unwrap(),
            "0 0.250000 0.500000 0.500000 1.000000 0.910000\n"
        );
    }

    #[test]
    fn test_nothing_saved_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let image = image_file(dir.path());
        let mut opts = options(&project);
        opts.save_image = false;

        let outcome = DetectImageUseCase::new(
            Box::new(StubImageReader::new(8, 8)),
            Box::new(StubDetector::new(vec![pill(0.0, 0.0, 4.0, 4.0)])),
            Box::new(BoxAnnotator::new()),
            Box::new(StubImageWriter {
                written: Arc::new(Mutex::new(Vec::new())),
            }),
            opts,
        )
        .execute(&image)
        .unwrap();

        assert!(outcome.run_dir.is_none());
        assert!(!project.exists());
    }

    #[test]
    fn test_annotation_failure_is_a_write_error() {
        struct FailingAnnotator;
        impl FrameAnnotator for FailingAnnotator {
            fn annotate(
                &self,
                _frame: &mut Frame,
                _detections: &[Detection],
            ) -> Result<(), Box<dyn std::error::Error>> {
                Err("palette exhausted".into())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("runs/detect");
        let image = image_file(dir.path());
        let written = Arc::new(Mutex::new(Vec::new()));

        let err = DetectImageUseCase::new(
            Box::new(StubImageReader::new(8, 8)),
            Box::new(StubDetector::new(vec![pill(0.0, 0.0, 4.0, 4.0)])),
            Box::new(FailingAnnotator),
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            options(&project),
        )
        .execute(&image)
        .unwrap_err();

        match err {
            PipelineError::Write { path, .. } => {
                assert_eq!(path, project.join("predict").join("image.png"))
            }
            other => panic!("expected a write error, got {other}"),
        }
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let image = image_file(dir.path());
        let detector = StubDetector::new(Vec::new());
        let calls = detector.calls.clone();

        let err = DetectImageUseCase::new(
            Box::new(ImageFileReader::new()),
            Box::new(detector),
            Box::new(BoxAnnotator::new()),
            Box::new(ImageFileWriter::new()),
            options(&dir.path().join("runs/detect")),
        )
        .execute(&image)
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ResourceUnreadable {
                kind: ResourceKind::Image,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_real_image_round_trip_draws_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image.png");
        image::RgbImage::from_pixel(80, 60, image::Rgb([255, 255, 255]))
            .save(&image)
            .unwrap();
        let project = dir.path().join("runs/detect");

        let outcome = DetectImageUseCase::new(
            Box::new(ImageFileReader::new()),
            Box::new(StubDetector::new(vec![pill(10.0, 10.0, 40.0, 40.0)])),
            Box::new(BoxAnnotator::with_line_width(2)),
            Box::new(ImageFileWriter::new()),
            options(&project),
        )
        .execute(&image)
        .unwrap();

        let saved = image::open(outcome.annotated_image.unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(saved.get_pixel(10, 25).0, BoxAnnotator::class_color(0));
        assert_eq!(saved.get_pixel(25, 25).0, [255, 255, 255]);
    }
}
