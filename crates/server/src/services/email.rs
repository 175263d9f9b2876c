//! Email service for order lifecycle and account mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Every
//! send is awaited by the caller but dispatched best-effort from the
//! order workflow: a failed send is logged, never surfaced to the client.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use copperleaf_core::OrderId;

use crate::config::EmailConfig;

/// HTML template for the account verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeHtml<'a> {
    code: &'a str,
}

/// Plain text template for the account verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeText<'a> {
    code: &'a str,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_id: i32,
    total: &'a str,
    item_count: usize,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_id: i32,
    total: &'a str,
    item_count: usize,
}

/// HTML template for status-change emails (also used for request
/// rejection, with the explanation in `detail`).
#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    order_id: i32,
    detail: &'a str,
}

/// Plain text template for status-change emails.
#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusText<'a> {
    order_id: i32,
    detail: &'a str,
}

/// HTML template for cancellation emails (all sources).
#[derive(Template)]
#[template(path = "email/order_cancelled.html")]
struct OrderCancelledHtml<'a> {
    order_id: i32,
    detail: &'a str,
}

/// Plain text template for cancellation emails.
#[derive(Template)]
#[template(path = "email/order_cancelled.txt")]
struct OrderCancelledText<'a> {
    order_id: i32,
    detail: &'a str,
}

/// HTML template for the cancellation-request notice.
#[derive(Template)]
#[template(path = "email/cancellation_request.html")]
struct CancellationRequestHtml<'a> {
    order_id: i32,
    reason: &'a str,
}

/// Plain text template for the cancellation-request notice.
#[derive(Template)]
#[template(path = "email/cancellation_request.txt")]
struct CancellationRequestText<'a> {
    order_id: i32,
    reason: &'a str,
}

/// HTML template for the low-stock alert sent to the admin address.
#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockHtml<'a> {
    product_name: &'a str,
    remaining: i32,
}

/// Plain text template for the low-stock alert.
#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockText<'a> {
    product_name: &'a str,
    remaining: i32,
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
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
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
        })
    }

    /// Send the account verification code.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let html = VerificationCodeHtml { code }.render()?;
        let text = VerificationCodeText { code }.render()?;
        self.send_multipart_email(to, "Your Copperleaf Verification Code", &text, &html)
            .await
    }

    /// Send the order confirmation (buyer and admin copies use the same body).
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order_id: OrderId,
        total: &str,
        item_count: usize,
    ) -> Result<(), EmailError> {
        let order_id = order_id.as_i32();
        let html = OrderConfirmationHtml {
            order_id,
            total,
            item_count,
        }
        .render()?;
        let text = OrderConfirmationText {
            order_id,
            total,
            item_count,
        }
        .render()?;
        self.send_multipart_email(
            to,
            &format!("Order #{order_id} confirmed"),
            &text,
            &html,
        )
        .await
    }

    /// Send a status-changed email; `detail` is the human-readable line
    /// ("Your order has been shipped", "Your cancellation request was
    /// declined: ...").
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_status_update(
        &self,
        to: &str,
        order_id: OrderId,
        detail: &str,
    ) -> Result<(), EmailError> {
        let order_id = order_id.as_i32();
        let html = OrderStatusHtml { order_id, detail }.render()?;
        let text = OrderStatusText { order_id, detail }.render()?;
        self.send_multipart_email(to, &format!("Update on order #{order_id}"), &text, &html)
            .await
    }

    /// Send a cancellation email for any cancellation source.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_cancelled(
        &self,
        to: &str,
        order_id: OrderId,
        detail: &str,
    ) -> Result<(), EmailError> {
        let order_id = order_id.as_i32();
        let html = OrderCancelledHtml { order_id, detail }.render()?;
        let text = OrderCancelledText { order_id, detail }.render()?;
        self.send_multipart_email(
            to,
            &format!("Order #{order_id} cancelled"),
            &text,
            &html,
        )
        .await
    }

    /// Notify about a new cancellation request (user ack and admin alert).
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_cancellation_request(
        &self,
        to: &str,
        order_id: OrderId,
        reason: &str,
    ) -> Result<(), EmailError> {
        let order_id = order_id.as_i32();
        let html = CancellationRequestHtml { order_id, reason }.render()?;
        let text = CancellationRequestText { order_id, reason }.render()?;
        self.send_multipart_email(
            to,
            &format!("Cancellation requested for order #{order_id}"),
            &text,
            &html,
        )
        .await
    }

    /// Alert the admin address that a product is nearly sold out.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_low_stock_alert(
        &self,
        to: &str,
        product_name: &str,
        remaining: i32,
    ) -> Result<(), EmailError> {
        let html = LowStockHtml {
            product_name,
            remaining,
        }
        .render()?;
        let text = LowStockText {
            product_name,
            remaining,
        }
        .render()?;
        self.send_multipart_email(
            to,
            &format!("Low stock: {product_name}"),
            &text,
            &html,
        )
        .await
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
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
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

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
