//! Column groupings for the customer kanban and the project pipeline.

use serde::{Deserialize, Serialize};

use crate::models::{Customer, CustomerStatus, Project, ProjectStatus, Segment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColumn {
    pub status: ProjectStatus,
    pub projects: Vec<Project>,
    /// Sum of project prices in the column.
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn {
    pub status: CustomerStatus,
    pub customers: Vec<Customer>,
}

/// One column per project stage, in stage order. Input order is kept inside a column.
pub fn pipeline_board(projects: &[Project]) -> Vec<PipelineColumn> {
    ProjectStatus::ALL
        .into_iter()
        .map(|status| {
            let projects: Vec<Project> = projects
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect();
            let total = projects.iter().map(|p| p.price).sum();
            PipelineColumn {
                status,
                projects,
                total,
            }
        })
        .collect()
}

/// One column per customer status, optionally restricted to a segment.
pub fn kanban_board(customers: &[Customer], segment_filter: Option<Segment>) -> Vec<KanbanColumn> {
    CustomerStatus::ALL
        .into_iter()
        .map(|status| KanbanColumn {
            status,
            customers: customers
                .iter()
                .filter(|c| c.status == status)
                .filter(|c| segment_filter.map_or(true, |s| c.segment == Some(s)))
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::kpi::fixtures::{customer, project, with_segment};

    #[test]
    fn test_pipeline_board_columns_and_totals() {
        let mut won = project("w", "c", 1200.0, None);
        won.status = ProjectStatus::Won;
        let mut talks = project("n", "c", 300.0, None);
        talks.status = ProjectStatus::Negotiation;
        let projects = vec![project("a", "c", 100.0, None), won, talks, project("b", "c", 50.0, None)];

        let board = pipeline_board(&projects);
        assert_eq!(board.len(), 6);
        assert_eq!(board[0].status, ProjectStatus::New);
        assert_eq!(board[0].projects.len(), 2);
        assert_eq!(board[0].total, 150.0);
        assert_eq!(board[3].total, 300.0);
        assert_eq!(board[4].projects[0].id, "w");
        assert!(board[5].projects.is_empty());
    }

    #[test]
    fn test_kanban_board_segment_filter() {
        let customers = vec![
            with_segment(customer("a", CustomerStatus::New, 0), Segment::A),
            customer("b", CustomerStatus::New, 0),
            with_segment(customer("c", CustomerStatus::Deal, 0), Segment::A),
            with_segment(customer("d", CustomerStatus::Deal, 0), Segment::B),
        ];

        let all = kanban_board(&customers, None);
        let sizes: Vec<usize> = all.iter().map(|c| c.customers.len()).collect();
        assert_eq!(sizes, vec![2, 0, 2, 0]);

        let only_a = kanban_board(&customers, Some(Segment::A));
        let ids: Vec<Vec<&str>> = only_a
            .iter()
            .map(|col| col.customers.iter().map(|c| c.id.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["a"], vec![], vec!["c"], vec![]]);
    }
}
