// Domain layer - Pure sample types and signal math
pub mod notch;
pub mod sample;
