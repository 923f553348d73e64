pub mod frame_namer;
pub mod sampling_interval;
