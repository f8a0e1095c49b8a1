pub mod application;
pub mod assessment;
pub mod job;
