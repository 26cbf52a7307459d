use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPIRY_YEARS: u32 = 2;

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Certificate number plus its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateGrant {
    pub number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

/// Produces `CERT-<unix millis>-<9 uppercase alphanumerics>` numbers.
///
/// Numbers are unique with high probability only; the store's unique index
/// is what actually rejects a repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateGenerator {
    expiry_years: u32,
}

impl Default for CertificateGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_YEARS)
    }
}

impl CertificateGenerator {
    pub fn new(expiry_years: u32) -> Self {
        Self { expiry_years }
    }

    pub fn generate(&self) -> CertificateGrant {
        self.generate_at(Utc::now(), &mut rand::thread_rng())
    }

    pub fn generate_at<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> CertificateGrant {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect();
        let issue_date = now.date_naive();

        CertificateGrant {
            number: format!("CERT-{}-{}", now.timestamp_millis(), suffix),
            issue_date,
            expiry_date: expiry_date(issue_date, self.expiry_years),
        }
    }
}

/// Same month and day, `years` later. Feb 29 rolls over to Mar 1 when the
/// target year is not a leap year.
pub fn expiry_date(issue_date: NaiveDate, years: u32) -> NaiveDate {
    let Some(year) = i32::try_from(years)
        .ok()
        .and_then(|years| issue_date.year().checked_add(years))
    else {
        return NaiveDate::MAX;
    };

    issue_date
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn number_embeds_timestamp_and_uppercase_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let grant = CertificateGenerator::default().generate_at(fixed_now(), &mut rng);

        let parts: Vec<&str> = grant.number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CERT");
        assert_eq!(parts[1], fixed_now().timestamp_millis().to_string());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn default_validity_is_two_calendar_years() {
        let mut rng = StdRng::seed_from_u64(1);
        let grant = CertificateGenerator::default().generate_at(fixed_now(), &mut rng);

        assert_eq!(
            grant.issue_date,
            NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
        );
        assert_eq!(
            grant.expiry_date,
            NaiveDate::from_ymd_opt(2027, 3, 14).expect("valid date")
        );
    }

    #[test]
    fn custom_expiry_years_are_respected() {
        let mut rng = StdRng::seed_from_u64(1);
        let grant = CertificateGenerator::new(5).generate_at(fixed_now(), &mut rng);
        assert_eq!(grant.expiry_date.year(), 2030);
        assert_eq!(grant.expiry_date.month(), 3);
        assert_eq!(grant.expiry_date.day(), 14);
    }

    #[test]
    fn leap_day_rolls_over_to_march_first() {
        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
        assert_eq!(
            expiry_date(leap_day, 2),
            NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
        );
        assert_eq!(
            expiry_date(leap_day, 4),
            NaiveDate::from_ymd_opt(2028, 2, 29).expect("valid date")
        );
        assert_eq!(expiry_date(leap_day, u32::MAX), NaiveDate::MAX);
    }

    #[test]
    fn successive_numbers_differ() {
        let generator = CertificateGenerator::default();
        let first = generator.generate();
        let second = generator.generate();
        assert_ne!(first.number, second.number);
    }
}
