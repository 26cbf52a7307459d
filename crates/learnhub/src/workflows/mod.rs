pub mod assessments;
pub mod certifications;
pub mod notifications;
pub mod recommendations;
