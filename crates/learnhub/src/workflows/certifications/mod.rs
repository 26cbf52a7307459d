//! Certificate numbering, validity windows, and read access to issued certificates.

pub mod domain;
pub mod generator;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Certification, CertificationFilter, CertificationStatus, NewCertification};
pub use generator::{expiry_date, CertificateGenerator, CertificateGrant, DEFAULT_EXPIRY_YEARS};
pub use repository::CertificationStore;
pub use router::certification_router;
pub use service::{CertificationError, CertificationService};
