//! Tests for queue module
//!
//! These tests run queued jobs against a real database:
//! - Product creation fans out into the mail and admin notification jobs
//! - Transient failures are retried, then dead-lettered
//! - Missing products fail without retries
//! - Publishing through the queue is idempotent

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::testing::{
        create_user, json_request, FailingMailer, RecordingMailer, TestApp, ADMIN_EMAIL,
    };
    use crate::products::models::ProductInput;
    use crate::products::ProductsService;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    async fn seed_product(app: &TestApp, name: &str) -> i64 {
        ProductsService::new(app.db.clone())
            .create(
                &ProductInput {
                    name: name.to_string(),
                    price: 2500,
                },
                None,
            )
            .await
            .unwrap()
            .id
    }

    async fn failed_jobs(app: &TestApp) -> Vec<(String, i64)> {
        sqlx::query_as("SELECT payload, attempts FROM failed_jobs ORDER BY id")
            .fetch_all(&app.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_created_product_sends_mail_and_notifies_admins() {
        let mut app = TestApp::new().await;
        let token = app.admin_token().await;
        create_user(&app.db, "Regular", "regular@example.com", false).await;

        let response = app
            .send(json_request(
                Method::POST,
                "/api/products",
                Some(&token),
                json!({ "name": "Espresso Cup", "price": 12 }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // notify job, then the mail and admin jobs it queues
        assert_eq!(app.run_jobs().await, 3);

        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec![ADMIN_EMAIL.to_string()]);
        assert_eq!(sent[0].subject, "New product: Espresso Cup");
        assert!(sent[0].html_body.contains("12.00"));

        let notified: Vec<(String, String)> = sqlx::query_as(
            "SELECT u.email, n.kind FROM notifications n JOIN users u ON u.id = n.user_id",
        )
        .fetch_all(&app.db)
        .await
        .unwrap();
        assert_eq!(
            notified,
            vec![(ADMIN_EMAIL.to_string(), "new_product_created".to_string())]
        );
        assert!(failed_jobs(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_transient_mail_failure_is_retried_then_recorded() {
        let failing = Arc::new(FailingMailer::default());
        let mut app = TestApp::with_mailer(Arc::new(RecordingMailer::default()), failing.clone()).await;
        let product_id = seed_product(&app, "Teapot").await;

        app.jobs
            .queue
            .dispatch(Job::SendNewProductMail { product_id })
            .unwrap();
        assert_eq!(app.run_jobs().await, 1);

        assert_eq!(failing.attempts(), 3);

        let failed = failed_jobs(&app).await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, 3);
        let payload: serde_json::Value = serde_json::from_str(&failed[0].0).unwrap();
        assert_eq!(
            payload,
            json!({ "type": "send_new_product_mail", "product_id": product_id })
        );
    }

    #[tokio::test]
    async fn test_missing_product_fails_without_retry() {
        let mut app = TestApp::new().await;

        app.jobs
            .queue
            .dispatch(Job::NotifyAdmins { product_id: 404 })
            .unwrap();
        app.run_jobs().await;

        let failed = failed_jobs(&app).await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, 1);
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_publish_job_is_idempotent() {
        let mut app = TestApp::new().await;
        let product_id = seed_product(&app, "Kettle").await;

        app.jobs
            .queue
            .dispatch(Job::ProductPublish { product_id })
            .unwrap();
        app.run_jobs().await;

        let first = ProductsService::new(app.db.clone())
            .find(product_id)
            .await
            .unwrap()
            .published_at;
        assert!(first.is_some());

        let queued = QueuedJob {
            id: "J_REPEAT".to_string(),
            job: Job::ProductPublish { product_id },
        };
        assert!(process_job(queued, &app.jobs).await);

        let second = ProductsService::new(app.db.clone())
            .find(product_id)
            .await
            .unwrap()
            .published_at;
        assert_eq!(first, second);
        assert!(failed_jobs(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_dispatch() {
        let (queue, receiver) = channel();
        drop(receiver);

        let result = queue.dispatch(Job::NewProductNotify { product_id: 1 });
        assert!(matches!(result, Err(QueueError::Closed)));
    }
}
