pub mod applications;
pub mod email;
pub mod generation;
pub mod prompts;
pub mod uploads;
