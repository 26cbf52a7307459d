use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::generator::CertificateGrant;
use crate::domain::{CertificationId, CourseId, EmployeeId, UnknownStatus};

/// Stored certificate status. `Expired` is never written; it is derived from
/// the expiry date when a certificate is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificationStatus {
    Active,
    Revoked,
    Expired,
}

impl CertificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CertificationStatus::Active => "Active",
            CertificationStatus::Revoked => "Revoked",
            CertificationStatus::Expired => "Expired",
        }
    }
}

impl FromStr for CertificationStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Active" => Ok(CertificationStatus::Active),
            "Revoked" => Ok(CertificationStatus::Revoked),
            "Expired" => Ok(CertificationStatus::Expired),
            other => Err(UnknownStatus::new("certification", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub id: CertificationId,
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub certificate_number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: CertificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Certification {
    /// Status as observed on `today`: an active certificate past its expiry
    /// date reads as `Expired`.
    pub fn effective_status(&self, today: NaiveDate) -> CertificationStatus {
        match self.status {
            CertificationStatus::Active if today > self.expiry_date => {
                CertificationStatus::Expired
            }
            status => status,
        }
    }

    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == CertificationStatus::Active
    }

    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.status = self.effective_status(today);
        self
    }
}

/// Certificate row to be written by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCertification {
    pub id: CertificationId,
    pub employee_id: EmployeeId,
    pub course_id: CourseId,
    pub grant: CertificateGrant,
    pub created_at: DateTime<Utc>,
}

impl NewCertification {
    pub fn into_certification(self) -> Certification {
        Certification {
            id: self.id,
            employee_id: self.employee_id,
            course_id: self.course_id,
            certificate_number: self.grant.number,
            issue_date: self.grant.issue_date,
            expiry_date: self.grant.expiry_date,
            status: CertificationStatus::Active,
            created_at: self.created_at,
        }
    }
}

/// Optional filters for certificate listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationFilter {
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

impl CertificationFilter {
    pub fn matches(&self, certification: &Certification) -> bool {
        self.employee_id
            .map_or(true, |employee| employee == certification.employee_id)
            && self
                .course_id
                .map_or(true, |course| course == certification.course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certification(expiry: NaiveDate, status: CertificationStatus) -> Certification {
        Certification {
            id: CertificationId::new(),
            employee_id: EmployeeId::new(),
            course_id: CourseId::new(),
            certificate_number: "CERT-1700000000000-ABC123XYZ".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid date"),
            expiry_date: expiry,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_certificate_expires_after_expiry_date() {
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        let cert = certification(expiry, CertificationStatus::Active);

        assert_eq!(cert.effective_status(expiry), CertificationStatus::Active);
        assert_eq!(
            cert.effective_status(expiry.succ_opt().expect("next day")),
            CertificationStatus::Expired
        );
    }

    #[test]
    fn revoked_certificate_stays_revoked() {
        let expiry = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
        let cert = certification(expiry, CertificationStatus::Revoked);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        assert_eq!(cert.effective_status(today), CertificationStatus::Revoked);
        assert!(!cert.is_valid_on(today));
    }

    #[test]
    fn filter_matches_on_each_provided_field() {
        let expiry = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date");
        let cert = certification(expiry, CertificationStatus::Active);

        assert!(CertificationFilter::default().matches(&cert));
        assert!(CertificationFilter {
            employee_id: Some(cert.employee_id),
            course_id: None,
        }
        .matches(&cert));
        assert!(!CertificationFilter {
            employee_id: Some(cert.employee_id),
            course_id: Some(CourseId::new()),
        }
        .matches(&cert));
    }
}
