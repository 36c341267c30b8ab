pub mod use_device_width;

pub use use_device_width::*;
