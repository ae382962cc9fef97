pub mod sensor_frame;
pub use sensor_frame::{FRAME_SAMPLES, SensorFrame, SensorId};
