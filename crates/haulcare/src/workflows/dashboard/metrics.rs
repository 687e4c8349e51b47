use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::Serialize;

use crate::records::{ProgramEnrollment, ScreeningRequest};
use crate::workflows::enrollment::domain::ScreeningKind;

/// Registered and qualified counts per screening kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScreeningMetrics {
    pub total_registrations: usize,
    pub colorectal_registered: usize,
    pub colorectal_qualified: usize,
    pub prostate_registered: usize,
    pub prostate_qualified: usize,
    pub cervical_registered: usize,
    pub cervical_qualified: usize,
}

impl ScreeningMetrics {
    fn record(&mut self, request: &ScreeningRequest) {
        self.total_registrations += 1;
        let qualified = usize::from(request.status.is_qualified());
        match request.name {
            ScreeningKind::ColonColorectal => {
                self.colorectal_registered += 1;
                self.colorectal_qualified += qualified;
            }
            ScreeningKind::Prostate => {
                self.prostate_registered += 1;
                self.prostate_qualified += qualified;
            }
            ScreeningKind::CervicalCancer => {
                self.cervical_registered += 1;
                self.cervical_qualified += qualified;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearlyScreeningMetrics {
    pub year: i32,
    #[serde(flatten)]
    pub metrics: ScreeningMetrics,
}

pub fn screening_metrics<'a>(
    requests: impl IntoIterator<Item = &'a ScreeningRequest>,
) -> ScreeningMetrics {
    let mut metrics = ScreeningMetrics::default();
    for request in requests {
        metrics.record(request);
    }
    metrics
}

fn start_of_month(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
}

/// Requests submitted after the start of the previous calendar month.
pub fn monthly_screening_metrics(
    requests: &[ScreeningRequest],
    now: DateTime<Utc>,
) -> ScreeningMetrics {
    let Some(cutoff) = start_of_month(now).and_then(|start| start.checked_sub_months(Months::new(1)))
    else {
        return ScreeningMetrics::default();
    };
    screening_metrics(
        requests
            .iter()
            .filter(|request| request.submitted_date > cutoff),
    )
}

/// One entry per year from the earliest request to `now`, newest first.
pub fn yearly_screening_metrics(
    requests: &[ScreeningRequest],
    now: DateTime<Utc>,
) -> Vec<YearlyScreeningMetrics> {
    let Some(earliest) = requests
        .iter()
        .map(|request| request.submitted_date.year())
        .min()
    else {
        return Vec::new();
    };

    (earliest..=now.year().max(earliest))
        .rev()
        .map(|year| YearlyScreeningMetrics {
            year,
            metrics: screening_metrics(
                requests
                    .iter()
                    .filter(|request| request.submitted_date.year() == year),
            ),
        })
        .collect()
}

/// Enrollments dated less than three months before `now`.
pub fn registrations_in_past_three_months(
    enrollments: &[ProgramEnrollment],
    now: DateTime<Utc>,
) -> usize {
    let Some(cutoff) = now.checked_sub_months(Months::new(3)) else {
        return 0;
    };
    enrollments
        .iter()
        .filter(|enrollment| enrollment.date_enrolled > cutoff)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiClassification {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiClassification {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiClassification::Underweight
        } else if bmi < 25.0 {
            BmiClassification::Normal
        } else if bmi < 30.0 {
            BmiClassification::Overweight
        } else {
            BmiClassification::Obese
        }
    }
}

/// Body mass index from imperial units; `None` for a zero height.
pub fn bmi(weight_lbs: f64, height_inches: u16) -> Option<f64> {
    if height_inches == 0 {
        return None;
    }
    let inches = f64::from(height_inches);
    Some(703.0 * weight_lbs / (inches * inches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ScreeningRequestId, ScreeningStatus, UserId};

    fn request(kind: ScreeningKind, status: ScreeningStatus, submitted: DateTime<Utc>) -> ScreeningRequest {
        ScreeningRequest {
            id: ScreeningRequestId::generate(),
            user: UserId::generate(),
            name: kind,
            status,
            submitted_date: submitted,
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn qualified_counts_follow_status() {
        let requests = vec![
            request(ScreeningKind::Prostate, ScreeningStatus::TruePositive, at(2024, 3, 1)),
            request(ScreeningKind::Prostate, ScreeningStatus::Requested, at(2024, 3, 2)),
            request(ScreeningKind::ColonColorectal, ScreeningStatus::Negative, at(2024, 3, 3)),
            request(ScreeningKind::CervicalCancer, ScreeningStatus::NotQualified, at(2024, 3, 4)),
        ];
        let metrics = screening_metrics(&requests);
        assert_eq!(metrics.total_registrations, 4);
        assert_eq!(metrics.prostate_registered, 2);
        assert_eq!(metrics.prostate_qualified, 1);
        assert_eq!(metrics.colorectal_qualified, 1);
        assert_eq!(metrics.cervical_registered, 1);
        assert_eq!(metrics.cervical_qualified, 0);
    }

    #[test]
    fn monthly_window_starts_at_previous_month() {
        let now = at(2024, 6, 15);
        let requests = vec![
            request(ScreeningKind::Prostate, ScreeningStatus::Qualified, at(2024, 5, 2)),
            request(ScreeningKind::Prostate, ScreeningStatus::Qualified, at(2024, 4, 30)),
        ];
        assert_eq!(monthly_screening_metrics(&requests, now).total_registrations, 1);
    }

    #[test]
    fn yearly_metrics_run_newest_first_through_gaps() {
        let now = at(2024, 6, 15);
        let requests = vec![
            request(ScreeningKind::Prostate, ScreeningStatus::Qualified, at(2021, 2, 1)),
            request(ScreeningKind::Prostate, ScreeningStatus::Requested, at(2024, 1, 9)),
        ];
        let yearly = yearly_screening_metrics(&requests, now);
        let years: Vec<i32> = yearly.iter().map(|entry| entry.year).collect();
        assert_eq!(years, vec![2024, 2023, 2022, 2021]);
        assert_eq!(yearly[1].metrics.total_registrations, 0);
        assert_eq!(yearly[3].metrics.prostate_qualified, 1);
        assert!(yearly_screening_metrics(&[], now).is_empty());
    }

    #[test]
    fn bmi_boundaries() {
        assert_eq!(BmiClassification::from_bmi(18.49), BmiClassification::Underweight);
        assert_eq!(BmiClassification::from_bmi(18.5), BmiClassification::Normal);
        assert_eq!(BmiClassification::from_bmi(25.0), BmiClassification::Overweight);
        assert_eq!(BmiClassification::from_bmi(30.0), BmiClassification::Obese);
        let value = bmi(180.0, 70).expect("non-zero height");
        assert!((value - 25.82).abs() < 0.01);
        assert_eq!(bmi(180.0, 0), None);
    }
}
