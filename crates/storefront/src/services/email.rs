//! Transactional email: order confirmations, newsletter welcome, and the
//! admin new-order notice.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use moonstone_db::models::{Address, Order, OrderItem};

use crate::config::SmtpConfig;

/// One line of an order as shown in email.
pub struct EmailLine {
    pub name: String,
    pub quantity: i32,
    pub line_total: String,
}

impl From<&OrderItem> for EmailLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.crystal_name.clone(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order: &'a Order,
    lines: &'a [EmailLine],
    address: Option<String>,
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order: &'a Order,
    lines: &'a [EmailLine],
    address: Option<String>,
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_welcome.html")]
struct NewsletterWelcomeHtml<'a> {
    unsubscribe_url: &'a str,
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_welcome.txt")]
struct NewsletterWelcomeText<'a> {
    unsubscribe_url: &'a str,
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/admin_new_order.txt")]
struct AdminNewOrderText<'a> {
    order: &'a Order,
    lines: &'a [EmailLine],
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

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig, base_url: &str) -> Result<Self, SmtpError> {
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
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send the customer's order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    #[instrument(skip_all, fields(order = %order.order_number))]
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        address: Option<&Address>,
    ) -> Result<(), EmailError> {
        let lines: Vec<EmailLine> = items.iter().map(EmailLine::from).collect();
        let name = order
            .customer_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("friend");
        let address = address.map(Address::one_line);

        let html = OrderConfirmationHtml {
            name,
            order,
            lines: &lines,
            address: address.clone(),
            base_url: &self.base_url,
        }
        .render()?;
        let text = OrderConfirmationText {
            name,
            order,
            lines: &lines,
            address,
            base_url: &self.base_url,
        }
        .render()?;

        let subject = format!("Your Moonstone order {}", order.order_number);
        self.send_multipart_email(&order.customer_email, &subject, &text, &html)
            .await
    }

    /// Welcome a new newsletter subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_newsletter_welcome(&self, to: &str) -> Result<(), EmailError> {
        let unsubscribe_url = format!(
            "{}/newsletter/unsubscribe?email={}",
            self.base_url,
            urlencoding::encode(to)
        );
        let html = NewsletterWelcomeHtml {
            unsubscribe_url: &unsubscribe_url,
            base_url: &self.base_url,
        }
        .render()?;
        let text = NewsletterWelcomeText {
            unsubscribe_url: &unsubscribe_url,
            base_url: &self.base_url,
        }
        .render()?;

        self.send_multipart_email(to, "Welcome to the Moonstone circle", &text, &html)
            .await
    }

    /// Plain-text notice to the shop owner about a new order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_admin_new_order(
        &self,
        to: &str,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), EmailError> {
        let lines: Vec<EmailLine> = items.iter().map(EmailLine::from).collect();
        let text = AdminNewOrderText {
            order,
            lines: &lines,
        }
        .render()?;

        let email = Message::builder()
            .from(self.parse_from()?)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(format!(
                "New order {} ({})",
                order.order_number,
                order.total.display()
            ))
            .header(ContentType::TEXT_PLAIN)
            .body(text)?;

        self.mailer.send(email).await?;
        tracing::info!(to = %to, "Admin order notice sent");
        Ok(())
    }

    fn parse_from(&self) -> Result<lettre::message::Mailbox, EmailError> {
        self.from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.parse_from()?)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
