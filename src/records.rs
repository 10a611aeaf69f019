//! Per-customer record operations: detail lookup, projects, activity log,
//! reminders and email templates.

use serde_json::json;

use crate::error::Result;
use crate::models::{
    Activity, Customer, EmailTemplate, NewActivity, NewEmailTemplate, NewProject, NewReminder,
    Project, Reminder,
};
use crate::store::{
    collections, create_record, get_record, list_records, update_record, ListQuery, RecordStore,
};

pub async fn get_customer<S>(store: &S, id: &str) -> Result<Customer>
where
    S: RecordStore + ?Sized,
{
    get_record(store, collections::CUSTOMERS, id).await
}

pub async fn create_project<S>(store: &S, project: &NewProject) -> Result<Project>
where
    S: RecordStore + ?Sized,
{
    let created: Project = create_record(store, collections::PROJECTS, project).await?;
    log::info!("Created project '{}' for {}", created.name, created.customer);
    Ok(created)
}

pub async fn projects_for<S>(store: &S, customer_id: &str) -> Result<Vec<Project>>
where
    S: RecordStore + ?Sized,
{
    let query = ListQuery::field_equals("asiakas", customer_id);
    list_records(store, collections::PROJECTS, &query).await
}

pub async fn log_activity<S>(store: &S, activity: &NewActivity) -> Result<Activity>
where
    S: RecordStore + ?Sized,
{
    create_record(store, collections::ACTIVITIES, activity).await
}

/// Activity log of one customer, newest first.
pub async fn activities_for<S>(store: &S, customer_id: &str) -> Result<Vec<Activity>>
where
    S: RecordStore + ?Sized,
{
    let query = ListQuery::field_equals("asiakas", customer_id).sort("-paivamaara,-created");
    list_records(store, collections::ACTIVITIES, &query).await
}

pub async fn add_reminder<S>(store: &S, reminder: &NewReminder) -> Result<Reminder>
where
    S: RecordStore + ?Sized,
{
    create_record(store, collections::REMINDERS, reminder).await
}

/// Reminders of one customer: open ones first, then by date.
pub async fn reminders_for<S>(store: &S, customer_id: &str) -> Result<Vec<Reminder>>
where
    S: RecordStore + ?Sized,
{
    let query = ListQuery::field_equals("asiakas", customer_id).sort("tehty,paivamaara");
    list_records(store, collections::REMINDERS, &query).await
}

pub async fn complete_reminder<S>(store: &S, id: &str) -> Result<Reminder>
where
    S: RecordStore + ?Sized,
{
    let body = json!({ "tehty": true });
    let reminder: Reminder = update_record(store, collections::REMINDERS, id, &body).await?;
    log::debug!("Reminder {} marked done", reminder.id);
    Ok(reminder)
}

pub async fn create_template<S>(store: &S, template: &NewEmailTemplate) -> Result<EmailTemplate>
where
    S: RecordStore + ?Sized,
{
    create_record(store, collections::EMAIL_TEMPLATES, template).await
}

pub async fn list_templates<S>(store: &S) -> Result<Vec<EmailTemplate>>
where
    S: RecordStore + ?Sized,
{
    list_records(store, collections::EMAIL_TEMPLATES, &ListQuery::new().sort("nimi")).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrmError;
    use crate::models::{ActivityType, CustomerStatus, ProjectStatus};
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.seed(
            collections::CUSTOMERS,
            json!({"id": "c1", "name": "Acme Oy", "status": "Tarjous"}),
        );
        store
    }

    fn activity(customer: &str, kind: ActivityType, text: &str, day: u32) -> NewActivity {
        NewActivity {
            customer: customer.to_string(),
            kind,
            description: text.to_string(),
            date: Some(Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_get_customer() {
        let store = seeded();
        let customer = get_customer(&store, "c1").await.unwrap();
        assert_eq!(customer.name, "Acme Oy");
        assert_eq!(customer.status, CustomerStatus::Quote);

        let missing = get_customer(&store, "nope").await;
        assert!(matches!(missing, Err(CrmError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_log_activity_uses_store_field_names() {
        let store = seeded();
        let created = log_activity(&store, &activity("c1", ActivityType::Call, "Soitto", 2))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.kind, ActivityType::Call);

        let raw = store.list(collections::ACTIVITIES, &ListQuery::new()).await.unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0]["asiakas"], "c1");
        assert_eq!(raw[0]["tyyppi"], "Puhelu");
        assert_eq!(raw[0]["kuvaus"], "Soitto");
        assert!(raw[0]["paivamaara"].as_str().unwrap().starts_with("2026-03-02"));
    }

    #[tokio::test]
    async fn test_activities_newest_first() {
        let store = seeded();
        log_activity(&store, &activity("c1", ActivityType::Note, "vanha", 1)).await.unwrap();
        log_activity(&store, &activity("c1", ActivityType::Meeting, "uusi", 9)).await.unwrap();
        log_activity(&store, &activity("c2", ActivityType::Email, "muu", 5)).await.unwrap();

        let log = activities_for(&store, "c1").await.unwrap();
        let texts: Vec<&str> = log.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(texts, vec!["uusi", "vanha"]);
    }

    #[tokio::test]
    async fn test_complete_reminder() {
        let store = seeded();
        let reminder = add_reminder(
            &store,
            &NewReminder {
                customer: "c1".to_string(),
                text: "Soita takaisin".to_string(),
                date: Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()),
                done: false,
            },
        )
        .await
        .unwrap();
        assert!(!reminder.done);

        let done = complete_reminder(&store, &reminder.id).await.unwrap();
        assert!(done.done);
        assert_eq!(done.text, "Soita takaisin");

        let open = store
            .list(collections::REMINDERS, &ListQuery::new().filter("tehty=false"))
            .await
            .unwrap();
        assert!(open.is_empty());
        assert_eq!(reminders_for(&store, "c1").await.unwrap().len(), 1);

        assert!(matches!(
            complete_reminder(&store, "nope").await,
            Err(CrmError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_template_renders_after_store_round_trip() {
        let store = InMemoryStore::new();
        let created = create_template(
            &store,
            &NewEmailTemplate {
                name: "Tarjous".to_string(),
                subject: "Tarjous: [CUSTOMER]".to_string(),
                body: "Hei [ASIAKAS], kiitos!".to_string(),
            },
        )
        .await
        .unwrap();

        let fetched: EmailTemplate = get_record(&store, collections::EMAIL_TEMPLATES, &created.id)
            .await
            .unwrap();
        assert_eq!(fetched.render("Acme Oy"), "Hei Acme Oy, kiitos!");
        assert_eq!(fetched.render_subject("Acme Oy"), "Tarjous: Acme Oy");
        assert_eq!(list_templates(&store).await.unwrap(), vec![fetched]);
    }

    #[tokio::test]
    async fn test_create_project_with_deadline_and_status() {
        let store = seeded();
        let deadline = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap();
        let project = NewProject::new("Kotisivut", -10.0, "c1")
            .with_deadline(deadline)
            .with_status(ProjectStatus::Negotiation);

        let created = create_project(&store, &project).await.unwrap();
        assert_eq!(created.price, 0.0);
        assert_eq!(created.deadline, Some(deadline));
        assert_eq!(created.status, ProjectStatus::Negotiation);

        let projects = projects_for(&store, "c1").await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Kotisivut");
        assert!(projects_for(&store, "c2").await.unwrap().is_empty());
    }
}
