pub mod boolean;
pub mod shaping;
pub mod step_repeat;
pub mod transform;
