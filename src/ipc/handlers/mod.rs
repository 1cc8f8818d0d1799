pub mod core;
pub mod electives;
pub mod fees;
pub mod grading;
pub mod rooms;
pub mod subject_types;
pub mod subjects;
