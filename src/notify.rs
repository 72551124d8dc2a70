//! Outbound notifications fired after a job is published.
//!
//! Dispatch is fire-and-forget: the write path spawns a detached task and
//! returns immediately. A failed email or Telegram call is logged and never
//! fails the job creation.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Config;
use jobless_core::models::JobRecord;
use jobless_core::store::JobStore;

/// Announce a freshly published job. No-op when notifications are disabled.
pub fn spawn_job_posted(config: Arc<Config>, store: Arc<dyn JobStore>, job: JobRecord) {
    if !config.notify.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        if config.notify.mail_enabled() {
            if let Err(e) = email_subscribers(&config, store.as_ref(), &job).await {
                tracing::warn!(job = %job.id, error = %e, "subscriber email dispatch failed");
            }
        }
        if config.notify.telegram_enabled() {
            if let Err(e) = post_to_telegram(&config, &job).await {
                tracing::warn!(job = %job.id, error = %e, "telegram post failed");
            }
        }
    });
}

/// One batched call to the transactional-mail API, active subscribers as
/// bcc recipients.
async fn email_subscribers(config: &Config, store: &dyn JobStore, job: &JobRecord) -> Result<()> {
    let emails = store
        .list_subscriber_emails()
        .await
        .map_err(|e| anyhow::anyhow!("loading subscribers: {e}"))?;
    if emails.is_empty() {
        return Ok(());
    }

    let notify = &config.notify;
    let url = notify.mail_api_url.as_deref().context("mail_api_url unset")?;
    let key = notify.mail_api_key.as_deref().context("mail_api_key unset")?;
    let from = notify.from_email.as_deref().context("from_email unset")?;

    let body = json!({
        "sender": { "name": notify.from_name, "email": from },
        "to": [{ "email": from }],
        "bcc": emails.iter().map(|e| json!({ "email": e })).collect::<Vec<_>>(),
        "subject": format!("New opening: {} at {}", job.title, job.company),
        "htmlContent": email_html(job),
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .header("api-key", key)
        .json(&body)
        .send()
        .await
        .context("mail API request failed")?;
    resp.error_for_status().context("mail API rejected the request")?;

    tracing::info!(job = %job.id, recipients = emails.len(), "subscriber email dispatched");
    Ok(())
}

async fn post_to_telegram(config: &Config, job: &JobRecord) -> Result<()> {
    let notify = &config.notify;
    let token = notify
        .telegram_bot_token
        .as_deref()
        .context("telegram_bot_token unset")?;
    let chat_id = notify
        .telegram_chat_id
        .as_deref()
        .context("telegram_chat_id unset")?;

    let url = format!("https://api.telegram.org/bot{token}/sendMessage");
    let body = json!({
        "chat_id": chat_id,
        "text": telegram_text(job),
        "parse_mode": "HTML",
        "disable_web_page_preview": true,
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .context("telegram request failed")?;
    resp.error_for_status()
        .context("telegram rejected the message")?;

    tracing::info!(job = %job.id, "telegram announcement posted");
    Ok(())
}

fn email_html(job: &JobRecord) -> String {
    let mut html = format!(
        "<h2>{}</h2><p><b>{}</b> — {}</p><p>{}</p>",
        job.title, job.company, job.location, job.description
    );
    if let Some(salary) = &job.salary {
        html.push_str(&format!("<p>Salary: {salary}</p>"));
    }
    if let Some(link) = &job.application_link {
        html.push_str(&format!("<p><a href=\"{link}\">Apply here</a></p>"));
    }
    html
}

fn telegram_text(job: &JobRecord) -> String {
    let mut text = format!(
        "<b>{}</b>\n{} — {}\nType: {} | Category: {}",
        job.title, job.company, job.location, job.job_type, job.category
    );
    if !job.skills.is_empty() {
        text.push_str(&format!("\nSkills: {}", job.skills.join(", ")));
    }
    if let Some(link) = &job.application_link {
        text.push_str(&format!("\n\nApply: {link}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobless_core::models::NewJobInput;

    #[test]
    fn test_telegram_text_carries_core_fields() {
        let job = NewJobInput {
            title: "Platform Engineer".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            job_type: "full-time".into(),
            category: "wfh".into(),
            skills: Some("Rust, Kubernetes".into()),
            application_link: Some("https://acme.example/apply".into()),
            ..Default::default()
        }
        .into_record(Utc::now());

        let text = telegram_text(&job);
        assert!(text.contains("<b>Platform Engineer</b>"));
        assert!(text.contains("Acme"));
        assert!(text.contains("Rust, Kubernetes"));
        assert!(text.contains("https://acme.example/apply"));
    }

    #[test]
    fn test_email_html_omits_absent_optionals() {
        let job = NewJobInput {
            title: "Analyst".into(),
            company: "Initech".into(),
            ..Default::default()
        }
        .into_record(Utc::now());
        let html = email_html(&job);
        assert!(html.contains("Analyst"));
        assert!(!html.contains("Salary"));
        assert!(!html.contains("Apply here"));
    }
}
