//! Dashboard reports.
//!
//! Everything here is computed from full collection lists fetched once; no
//! aggregation happens in the record store. Functions that depend on the
//! current date take `now` explicitly.
//!
//! ## Definitions
//!
//! ```text
//! hit rate        = round(100 × Kauppa / (Kauppa + Hävisi))
//! pipeline value  = Σ price of projects whose customer is Uusi or Tarjous
//! won value       = Σ price of projects whose customer is Kauppa
//! average deal    = round(mean of prices > 0)
//! forecast        = Σ price of projects with a deadline in the current month
//! churn risk      = Uusi/Tarjous customers with updated < now − 60 days
//! ```

mod boards;
mod kpi;

pub use boards::{kanban_board, pipeline_board, KanbanColumn, PipelineColumn};
pub use kpi::{
    average_deal, churn_risk, customers_by_stage, has_source_data, hit_rate,
    lead_source_distribution, monthly_forecast, open_reminders, overdue_count, pipeline_value,
    project_total, segment_distribution, upcoming_deadlines, won_value, ChurnRisk,
    MonthlyForecast, Share, StageCount, CHURN_DAYS, NO_SEGMENT, UNKNOWN_SOURCE,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Customer, Project, Reminder};
use crate::store::{collections, list_records, ListQuery, RecordStore};

/// Deadlines listed on the dashboard.
const UPCOMING_LIMIT: usize = 3;

/// Collections the dashboard is computed from.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub customers: Vec<Customer>,
    pub projects: Vec<Project>,
    pub reminders: Vec<Reminder>,
}

impl DashboardData {
    /// Fetch customers, projects (with their customer expanded) and open reminders.
    pub async fn fetch<S: RecordStore + ?Sized>(store: &S) -> Result<Self> {
        let customers = list_records(store, collections::CUSTOMERS, &ListQuery::new()).await?;
        let projects = list_records(
            store,
            collections::PROJECTS,
            &ListQuery::new().expand("asiakas").sort("-created"),
        )
        .await?;
        let reminders = list_records(
            store,
            collections::REMINDERS,
            &ListQuery::new().filter("tehty=false").sort("paivamaara"),
        )
        .await?;

        log::debug!(
            "Dashboard data: {} customers, {} projects, {} open reminders",
            customers.len(),
            projects.len(),
            reminders.len()
        );

        Ok(Self {
            customers,
            projects,
            reminders,
        })
    }

    pub fn report(&self, now: DateTime<Utc>) -> DashboardReport {
        let mut report = DashboardReport::build(&self.customers, &self.projects, now);
        report.overdue_reminders = overdue_count(&self.reminders, now);
        report
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub customer_count: usize,
    pub hit_rate: Option<u32>,
    pub by_stage: Vec<StageCount>,
    pub pipeline_value: f64,
    pub won_value: f64,
    pub average_deal: f64,
    pub project_total: f64,
    pub monthly_forecast: MonthlyForecast,
    pub upcoming_deadlines: Vec<Project>,
    pub churn_risk: Vec<ChurnRisk>,
    pub lead_sources: Vec<Share>,
    pub segments: Vec<Share>,
    pub overdue_reminders: usize,
}

impl DashboardReport {
    pub fn build(customers: &[Customer], projects: &[Project], now: DateTime<Utc>) -> Self {
        Self {
            generated_at: now,
            customer_count: customers.len(),
            hit_rate: hit_rate(customers),
            by_stage: customers_by_stage(customers),
            pipeline_value: pipeline_value(customers, projects),
            won_value: won_value(customers, projects),
            average_deal: average_deal(projects),
            project_total: project_total(projects),
            monthly_forecast: monthly_forecast(projects, now),
            upcoming_deadlines: upcoming_deadlines(projects, now, UPCOMING_LIMIT),
            churn_risk: churn_risk(customers, now),
            lead_sources: lead_source_distribution(customers),
            segments: segment_distribution(customers),
            overdue_reminders: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::kpi::fixtures::{customer, now, project};
    use super::*;
    use crate::models::CustomerStatus;
    use crate::store::InMemoryStore;
    use serde_json::json;

    #[test]
    fn test_build_report() {
        let customers = vec![
            customer("a", CustomerStatus::Quote, 70),
            customer("b", CustomerStatus::Deal, 1),
        ];
        let projects = vec![
            project("p1", "a", 400.0, Some((2026, 5, 28))),
            project("p2", "b", 600.0, Some((2026, 8, 1))),
        ];

        let report = DashboardReport::build(&customers, &projects, now());
        assert_eq!(report.customer_count, 2);
        assert_eq!(report.hit_rate, Some(100));
        assert_eq!(report.pipeline_value, 400.0);
        assert_eq!(report.won_value, 600.0);
        assert_eq!(report.average_deal, 500.0);
        assert_eq!(report.monthly_forecast.total, 400.0);
        assert_eq!(report.upcoming_deadlines.len(), 2);
        assert_eq!(report.churn_risk.len(), 1);
        assert_eq!(report.lead_sources[0].label, UNKNOWN_SOURCE);
    }

    #[tokio::test]
    async fn test_fetch_from_store() {
        let store = InMemoryStore::new();
        store.seed(
            collections::CUSTOMERS,
            json!({"id": "c1", "name": "Acme Oy", "status": "Tarjous", "updated": "2026-05-01 08:00:00.000Z"}),
        );
        store.seed(
            collections::PROJECTS,
            json!({"id": "p1", "name": "Sivut", "asiakas": "c1", "hinta": 3500, "status": "Tarjous", "deadline": ""}),
        );
        store.seed(
            collections::REMINDERS,
            json!({"id": "r1", "asiakas": "c1", "teksti": "Soita", "paivamaara": "2026-05-01 00:00:00.000Z", "tehty": false}),
        );
        store.seed(
            collections::REMINDERS,
            json!({"id": "r2", "asiakas": "c1", "teksti": "Vanha", "paivamaara": "2026-04-01 00:00:00.000Z", "tehty": true}),
        );

        let data = DashboardData::fetch(&store).await.unwrap();
        assert_eq!(data.reminders.len(), 1);
        assert_eq!(data.projects[0].customer_name(), Some("Acme Oy"));

        let report = data.report(now());
        assert_eq!(report.pipeline_value, 3500.0);
        assert_eq!(report.overdue_reminders, 1);
        assert_eq!(report.hit_rate, None);
    }
}
