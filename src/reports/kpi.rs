//! Sales KPIs over customers and projects.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Customer, CustomerStatus, Project, Reminder};

/// Open customers untouched for this many days are at risk.
pub const CHURN_DAYS: i64 = 60;

pub const UNKNOWN_SOURCE: &str = "Tuntematon";
pub const NO_SEGMENT: &str = "Ei segmenttiä";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub status: CustomerStatus,
    pub count: usize,
}

/// One bucket of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecast {
    pub projects: Vec<Project>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnRisk {
    pub customer_id: String,
    pub name: String,
    pub status: CustomerStatus,
    pub days_since_update: i64,
}

/// Won / (won + lost) as a rounded percentage; `None` before any deal closed.
pub fn hit_rate(customers: &[Customer]) -> Option<u32> {
    let won = count_status(customers, CustomerStatus::Deal);
    let lost = count_status(customers, CustomerStatus::Lost);
    if won + lost == 0 {
        return None;
    }
    Some((won as f64 / (won + lost) as f64 * 100.0).round() as u32)
}

pub fn customers_by_stage(customers: &[Customer]) -> Vec<StageCount> {
    CustomerStatus::ALL
        .into_iter()
        .map(|status| StageCount {
            status,
            count: count_status(customers, status),
        })
        .collect()
}

/// Project value of customers still in `Uusi` or `Tarjous`.
pub fn pipeline_value(customers: &[Customer], projects: &[Project]) -> f64 {
    value_for(customers, projects, |status| status.is_open())
}

pub fn won_value(customers: &[Customer], projects: &[Project]) -> f64 {
    value_for(customers, projects, |status| status == CustomerStatus::Deal)
}

/// Rounded mean of the positive project prices, 0 when there are none.
pub fn average_deal(projects: &[Project]) -> f64 {
    let prices: Vec<f64> = projects
        .iter()
        .map(|p| p.price)
        .filter(|price| *price > 0.0)
        .collect();
    if prices.is_empty() {
        return 0.0;
    }
    (prices.iter().sum::<f64>() / prices.len() as f64).round()
}

pub fn project_total(projects: &[Project]) -> f64 {
    projects.iter().map(|p| p.price).sum()
}

/// Projects whose deadline falls in the calendar month of `now` (UTC).
pub fn monthly_forecast(projects: &[Project], now: DateTime<Utc>) -> MonthlyForecast {
    let projects: Vec<Project> = projects
        .iter()
        .filter(|p| {
            p.deadline
                .is_some_and(|d| d.year() == now.year() && d.month() == now.month())
        })
        .cloned()
        .collect();
    let total = project_total(&projects);
    MonthlyForecast { projects, total }
}

/// Next deadlines from `now` on, soonest first.
pub fn upcoming_deadlines(projects: &[Project], now: DateTime<Utc>, limit: usize) -> Vec<Project> {
    let mut upcoming: Vec<&Project> = projects
        .iter()
        .filter(|p| p.deadline.is_some_and(|d| d >= now))
        .collect();
    upcoming.sort_by_key(|p| p.deadline);
    upcoming.into_iter().take(limit).cloned().collect()
}

/// Open customers not updated for [`CHURN_DAYS`] days, oldest first.
///
/// Customers without an `updated` timestamp are left out.
pub fn churn_risk(customers: &[Customer], now: DateTime<Utc>) -> Vec<ChurnRisk> {
    let cutoff = now - Duration::days(CHURN_DAYS);
    let mut stale: Vec<&Customer> = customers
        .iter()
        .filter(|c| c.status.is_open() && c.updated != DateTime::<Utc>::default())
        .filter(|c| c.updated < cutoff)
        .collect();
    stale.sort_by_key(|c| c.updated);

    stale
        .into_iter()
        .map(|c| ChurnRisk {
            customer_id: c.id.clone(),
            name: c.name.clone(),
            status: c.status,
            days_since_update: (now - c.updated).num_days(),
        })
        .collect()
}

/// Customers per lead source, largest first.
pub fn lead_source_distribution(customers: &[Customer]) -> Vec<Share> {
    distribution(customers.iter().map(|c| {
        c.source
            .map(|s| s.as_str())
            .unwrap_or(UNKNOWN_SOURCE)
    }))
}

/// Customers per segment, largest first.
pub fn segment_distribution(customers: &[Customer]) -> Vec<Share> {
    distribution(
        customers
            .iter()
            .map(|c| c.segment.map(|s| s.as_str()).unwrap_or(NO_SEGMENT)),
    )
}

/// Whether any customer has a recorded lead source.
pub fn has_source_data(distribution: &[Share]) -> bool {
    distribution.iter().any(|s| s.label != UNKNOWN_SOURCE)
}

/// Undone reminders, earliest first; undated ones last.
pub fn open_reminders(reminders: &[Reminder]) -> Vec<&Reminder> {
    let mut open: Vec<&Reminder> = reminders.iter().filter(|r| !r.done).collect();
    open.sort_by_key(|r| (r.date.is_none(), r.date));
    open
}

pub fn overdue_count(reminders: &[Reminder], now: DateTime<Utc>) -> usize {
    reminders.iter().filter(|r| r.is_overdue(now)).count()
}

fn count_status(customers: &[Customer], status: CustomerStatus) -> usize {
    customers.iter().filter(|c| c.status == status).count()
}

fn value_for<F>(customers: &[Customer], projects: &[Project], include: F) -> f64
where
    F: Fn(CustomerStatus) -> bool,
{
    let ids: Vec<&str> = customers
        .iter()
        .filter(|c| include(c.status))
        .map(|c| c.id.as_str())
        .collect();
    projects
        .iter()
        .filter(|p| ids.contains(&p.customer.as_str()))
        .map(|p| p.price)
        .sum()
}

// Buckets keep first-seen order among equal counts.
fn distribution<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<Share> {
    let mut shares: Vec<Share> = Vec::new();
    for label in labels {
        match shares.iter_mut().find(|s| s.label == label) {
            Some(share) => share.count += 1,
            None => shares.push(Share {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::{LeadSource, Segment};

    #[test]
    fn test_hit_rate() {
        assert_eq!(hit_rate(&[]), None);
        assert_eq!(hit_rate(&[customer("a", CustomerStatus::New, 0)]), None);

        let customers = vec![
            customer("a", CustomerStatus::Deal, 0),
            customer("b", CustomerStatus::Deal, 0),
            customer("c", CustomerStatus::Lost, 0),
            customer("d", CustomerStatus::Quote, 0),
        ];
        assert_eq!(hit_rate(&customers), Some(67));
    }

    #[test]
    fn test_customers_by_stage_fixed_order() {
        let customers = vec![
            customer("a", CustomerStatus::Lost, 0),
            customer("b", CustomerStatus::New, 0),
            customer("c", CustomerStatus::New, 0),
        ];
        let counts: Vec<usize> = customers_by_stage(&customers).iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![2, 0, 0, 1]);
    }

    #[test]
    fn test_pipeline_and_won_value() {
        let customers = vec![
            customer("new", CustomerStatus::New, 0),
            customer("quote", CustomerStatus::Quote, 0),
            customer("deal", CustomerStatus::Deal, 0),
            customer("lost", CustomerStatus::Lost, 0),
        ];
        let projects = vec![
            project("1", "new", 1000.0, None),
            project("2", "quote", 500.0, None),
            project("3", "deal", 2500.0, None),
            project("4", "lost", 900.0, None),
            project("5", "gone", 100.0, None),
        ];
        assert_eq!(pipeline_value(&customers, &projects), 1500.0);
        assert_eq!(won_value(&customers, &projects), 2500.0);
        assert_eq!(project_total(&projects), 5000.0);
    }

    #[test]
    fn test_average_deal_ignores_zero_prices() {
        assert_eq!(average_deal(&[]), 0.0);
        let projects = vec![
            project("1", "c", 100.0, None),
            project("2", "c", 0.0, None),
            project("3", "c", 250.0, None),
        ];
        assert_eq!(average_deal(&projects), 175.0);
    }

    #[test]
    fn test_monthly_forecast() {
        let projects = vec![
            project("may", "c", 800.0, Some((2026, 5, 30))),
            project("may-early", "c", 200.0, Some((2026, 5, 1))),
            project("june", "c", 999.0, Some((2026, 6, 1))),
            project("last-year", "c", 999.0, Some((2025, 5, 20))),
            project("none", "c", 999.0, None),
        ];
        let forecast = monthly_forecast(&projects, now());
        assert_eq!(forecast.total, 1000.0);
        let ids: Vec<&str> = forecast.projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["may", "may-early"]);
    }

    #[test]
    fn test_upcoming_deadlines() {
        let projects = vec![
            project("past", "c", 0.0, Some((2026, 5, 1))),
            project("far", "c", 0.0, Some((2026, 9, 1))),
            project("soon", "c", 0.0, Some((2026, 5, 20))),
            project("mid", "c", 0.0, Some((2026, 7, 1))),
            project("none", "c", 0.0, None),
        ];
        let ids: Vec<String> = upcoming_deadlines(&projects, now(), 2)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["soon", "mid"]);
    }

    #[test]
    fn test_churn_risk() {
        let customers = vec![
            customer("fresh", CustomerStatus::New, 10),
            customer("old", CustomerStatus::Quote, 90),
            customer("older", CustomerStatus::New, 120),
            customer("closed", CustomerStatus::Deal, 200),
            customer("edge", CustomerStatus::New, 60),
        ];
        let risks = churn_risk(&customers, now());
        let summary: Vec<(&str, i64)> = risks
            .iter()
            .map(|r| (r.customer_id.as_str(), r.days_since_update))
            .collect();
        assert_eq!(summary, vec![("older", 120), ("old", 90)]);
    }

    #[test]
    fn test_churn_risk_skips_missing_updated() {
        let json = r#"{"id": "x", "name": "N", "status": "Uusi", "updated": ""}"#;
        let blank: Customer = serde_json::from_str(json).unwrap();
        let json = r#"{"id": "y", "name": "M", "status": "Tarjous"}"#;
        let absent: Customer = serde_json::from_str(json).unwrap();

        assert!(churn_risk(&[blank, absent], now()).is_empty());
    }

    #[test]
    fn test_source_distribution() {
        let customers = vec![
            customer("a", CustomerStatus::New, 0),
            with_source(customer("b", CustomerStatus::New, 0), LeadSource::TradeFair),
            with_source(customer("c", CustomerStatus::New, 0), LeadSource::TradeFair),
            with_source(customer("d", CustomerStatus::New, 0), LeadSource::Referral),
        ];
        let shares = lead_source_distribution(&customers);
        assert_eq!(
            shares,
            vec![
                Share { label: "Messut".to_string(), count: 2 },
                Share { label: UNKNOWN_SOURCE.to_string(), count: 1 },
                Share { label: "Suositus".to_string(), count: 1 },
            ]
        );
        assert!(has_source_data(&shares));
        assert!(!has_source_data(&lead_source_distribution(&customers[..1])));
    }

    #[test]
    fn test_segment_distribution() {
        let customers = vec![
            with_segment(customer("a", CustomerStatus::New, 0), Segment::A),
            customer("b", CustomerStatus::New, 0),
            customer("c", CustomerStatus::New, 0),
        ];
        let shares = segment_distribution(&customers);
        assert_eq!(shares[0], Share { label: NO_SEGMENT.to_string(), count: 2 });
        assert_eq!(shares[1].label, "A-ryhmä");
    }

    #[test]
    fn test_reminders() {
        let at = |d: i64| Some(now() + Duration::days(d));
        let reminder = |id: &str, date, done| Reminder {
            id: id.to_string(),
            customer: "c".to_string(),
            text: String::new(),
            date,
            done,
            created: now(),
            updated: now(),
        };
        let reminders = vec![
            reminder("later", at(3), false),
            reminder("undated", None, false),
            reminder("late", at(-2), false),
            reminder("done", at(-5), true),
        ];

        let ids: Vec<&str> = open_reminders(&reminders).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "later", "undated"]);
        assert_eq!(overdue_count(&reminders, now()), 1);
    }
}
