pub mod duration;
pub mod indicator;
pub mod pitch;
