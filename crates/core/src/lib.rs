pub mod annotation;
pub mod detection;
pub mod pipeline;
pub mod sampling;
pub mod shared;
pub mod video;
