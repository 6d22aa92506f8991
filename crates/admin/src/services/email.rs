//! Newsletter campaign delivery.
//!
//! Uses SMTP via lettre with Askama HTML and text templates. Campaign bodies
//! are markdown; every copy carries the recipient's own unsubscribe link.

use askama::Template;
use comrak::{Options, markdown_to_html};
use futures::future::join_all;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use moonstone_db::models::Campaign;

use crate::config::SmtpConfig;

/// Recipients sent concurrently before moving to the next batch.
pub const CAMPAIGN_BATCH_SIZE: usize = 50;

#[derive(Template)]
#[template(path = "email/campaign.html")]
struct CampaignHtml<'a> {
    subject: &'a str,
    body_html: &'a str,
    unsubscribe_url: &'a str,
    storefront_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/campaign.txt")]
struct CampaignText<'a> {
    body_markdown: &'a str,
    unsubscribe_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Outcome of sending a campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignDelivery {
    pub sent: usize,
    pub failed: usize,
}

/// Email service for newsletter campaigns.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    storefront_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig, storefront_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            storefront_url: storefront_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send `campaign` to every address in `recipients`.
    ///
    /// Recipients are processed in batches of [`CAMPAIGN_BATCH_SIZE`]. A
    /// failed address is logged and counted; it does not stop the send.
    ///
    /// # Errors
    ///
    /// Returns error only if the sender address is invalid.
    #[instrument(skip_all, fields(campaign_id = %campaign.id, recipients = recipients.len()))]
    pub async fn send_campaign(
        &self,
        campaign: &Campaign,
        recipients: &[String],
    ) -> Result<CampaignDelivery, EmailError> {
        let from = self.parse_from()?;
        let body_html = render_markdown(&campaign.body_markdown);
        let mut delivery = CampaignDelivery::default();

        for (batch_number, batch) in recipients.chunks(CAMPAIGN_BATCH_SIZE).enumerate() {
            let results = join_all(
                batch
                    .iter()
                    .map(|to| self.send_one(&from, campaign, &body_html, to)),
            )
            .await;

            for (to, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => delivery.sent += 1,
                    Err(e) => {
                        delivery.failed += 1;
                        tracing::warn!(to = %to, error = %e, "Campaign email failed");
                    }
                }
            }
            tracing::debug!(batch = batch_number + 1, sent = delivery.sent, "Campaign batch done");
        }

        tracing::info!(
            sent = delivery.sent,
            failed = delivery.failed,
            "Campaign delivered"
        );
        Ok(delivery)
    }

    async fn send_one(
        &self,
        from: &lettre::message::Mailbox,
        campaign: &Campaign,
        body_html: &str,
        to: &str,
    ) -> Result<(), EmailError> {
        let unsubscribe_url = unsubscribe_url(&self.storefront_url, to);
        let html = CampaignHtml {
            subject: &campaign.subject,
            body_html,
            unsubscribe_url: &unsubscribe_url,
            storefront_url: &self.storefront_url,
        }
        .render()?;
        let text = CampaignText {
            body_markdown: &campaign.body_markdown,
            unsubscribe_url: &unsubscribe_url,
        }
        .render()?;

        let email = Message::builder()
            .from(from.clone())
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(&campaign.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.mailer.send(email).await?;
        Ok(())
    }

    fn parse_from(&self) -> Result<lettre::message::Mailbox, EmailError> {
        self.from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))
    }
}

/// Storefront link that unsubscribes `email` in one click.
#[must_use]
pub fn unsubscribe_url(storefront_url: &str, email: &str) -> String {
    format!(
        "{}/newsletter/unsubscribe?email={}",
        storefront_url.trim_end_matches('/'),
        urlencoding::encode(email)
    )
}

/// Render a campaign body. Raw HTML in the markdown is escaped.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    markdown_to_html(content, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_url_encodes_email() {
        assert_eq!(
            unsubscribe_url("https://moonstone.shop/", "luna+news@example.com"),
            "https://moonstone.shop/newsletter/unsubscribe?email=luna%2Bnews%40example.com"
        );
    }

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# New Moon\n\nSet an **intention**.");
        assert!(html.contains("<h1>New Moon</h1>"));
        assert!(html.contains("<strong>intention</strong>"));
    }

    #[test]
    fn test_render_markdown_escapes_raw_html() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }
}
