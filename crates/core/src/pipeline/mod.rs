pub mod detect_image_use_case;
pub mod extract_frames_use_case;
pub mod run_directory;
pub mod yolo_labels;
