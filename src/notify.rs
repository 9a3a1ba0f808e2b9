//! Notification dispatch.
//!
//! Request handlers hand a [`NotificationEvent`] to the [`Notifier`] and move
//! on; rendering and delivery happen on a small pool of background workers
//! fed by a bounded queue. The triggering HTTP request never waits for (or
//! learns about) the delivery outcome.
//!
//! Delivery failures are logged and dropped: there is no retry, no backoff,
//! and no dead-letter queue. A failed send is lost. When the queue is full
//! the event is likewise dropped with a warning, which bounds background
//! work under load.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::email::Mailer;
use crate::whatsapp::WhatsAppClient;

/// A domain event worth notifying someone about.
///
/// Carries copies of the triggering record's display fields so workers never
/// touch shared state. Constructed and consumed within one request's
/// lifetime; never persisted.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    DonationCompleted {
        donor: String,
        email: String,
        phone: Option<String>,
        amount: f64,
        receipt_id: String,
    },
    VolunteerSignup {
        name: String,
        email: String,
        phone: Option<String>,
        area: String,
    },
    ContactReceived {
        name: String,
        email: String,
    },
    NewsletterSubscribed {
        email: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::DonationCompleted { .. } => "donation",
            NotificationEvent::VolunteerSignup { .. } => "volunteer",
            NotificationEvent::ContactReceived { .. } => "contact",
            NotificationEvent::NewsletterSubscribed { .. } => "newsletter",
        }
    }

    pub fn recipient_email(&self) -> &str {
        match self {
            NotificationEvent::DonationCompleted { email, .. } => email,
            NotificationEvent::VolunteerSignup { email, .. } => email,
            NotificationEvent::ContactReceived { email, .. } => email,
            NotificationEvent::NewsletterSubscribed { email } => email,
        }
    }

    /// Phone number for the chat channel. Donation and volunteer
    /// confirmations go over WhatsApp when a number was provided; everything
    /// else is email-only.
    pub fn chat_recipient(&self) -> Option<&str> {
        let phone = match self {
            NotificationEvent::DonationCompleted { phone, .. } => phone.as_deref(),
            NotificationEvent::VolunteerSignup { phone, .. } => phone.as_deref(),
            _ => None,
        };
        phone.filter(|p| !p.is_empty())
    }

    /// Render the email subject and HTML body for this event.
    pub fn render_email(&self) -> (String, String) {
        match self {
            NotificationEvent::DonationCompleted {
                donor,
                amount,
                receipt_id,
                ..
            } => (
                "Thank you for your donation".to_string(),
                format!(
                    "<p>Dear {},</p>\
                     <p>Thank you for your donation of ₹{:.2}. Your support helps us make a difference.</p>\
                     <p>Receipt ID: {}</p>",
                    donor, amount, receipt_id
                ),
            ),
            NotificationEvent::VolunteerSignup { name, area, .. } => (
                "Thank you for volunteering".to_string(),
                format!(
                    "<p>Dear {},</p>\
                     <p>Thank you for registering as a volunteer for {}. \
                     We'll contact you soon about opportunities.</p>",
                    name, area
                ),
            ),
            NotificationEvent::ContactReceived { name, .. } => (
                "We received your message".to_string(),
                format!(
                    "<p>Dear {},</p>\
                     <p>Thanks for reaching out. Our team will get back to you shortly.</p>",
                    name
                ),
            ),
            NotificationEvent::NewsletterSubscribed { .. } => (
                "Welcome to our newsletter".to_string(),
                "<p>You're subscribed! Expect updates on our projects and events.</p>"
                    .to_string(),
            ),
        }
    }

    /// Render the plain-text body for the chat channel.
    pub fn render_chat(&self) -> String {
        match self {
            NotificationEvent::DonationCompleted {
                amount, receipt_id, ..
            } => format!(
                "Thank you for your donation of ₹{:.2}!\n\
                 Your support helps us make a difference.\n\
                 Receipt ID: {}",
                amount, receipt_id
            ),
            NotificationEvent::VolunteerSignup { name, .. } => format!(
                "Thank you for registering as a volunteer, {}!\n\
                 We'll contact you soon about opportunities.",
                name
            ),
            _ => {
                let (_, body) = self.render_email();
                body
            }
        }
    }
}

/// Handle for dispatching notifications.
///
/// Cheap to clone; all clones feed the same bounded queue.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl Notifier {
    /// Spawn the worker pool and return the dispatch handle.
    ///
    /// Must be called from within a tokio runtime. Workers run until every
    /// `Notifier` clone is dropped.
    pub fn start(
        mailer: Mailer,
        whatsapp: WhatsAppClient,
        queue_size: usize,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let mailer = mailer.clone();
            let whatsapp = whatsapp.clone();

            tokio::spawn(async move {
                loop {
                    let event = { rx.lock().await.recv().await };
                    let Some(event) = event else { break };
                    deliver(&mailer, &whatsapp, event).await;
                }
                info!("Notification worker {} stopped", worker_id);
            });
        }

        Self { tx }
    }

    /// Fire-and-forget dispatch. Returns immediately; the caller never
    /// observes the delivery outcome. When the queue is full the event is
    /// dropped, not queued.
    pub fn dispatch(&self, event: NotificationEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Notification queue full, dropping {} event", event.kind());
            }
            Err(TrySendError::Closed(event)) => {
                warn!("Notification workers gone, dropping {} event", event.kind());
            }
        }
    }
}

/// Deliver one event over exactly one channel. Failures are logged here and
/// go no further; a worker survives any provider outcome.
async fn deliver(mailer: &Mailer, whatsapp: &WhatsAppClient, event: NotificationEvent) {
    match event.chat_recipient() {
        Some(phone) => {
            let body = event.render_chat();
            match whatsapp.send(phone, &body).await {
                Ok(sid) => info!("Sent {} confirmation via WhatsApp ({})", event.kind(), sid),
                Err(e) => warn!("WhatsApp delivery failed for {} event: {:#}", event.kind(), e),
            }
        }
        None => {
            let (subject, body_html) = event.render_email();
            let recipients = vec![event.recipient_email().to_string()];
            match mailer.send(&subject, &body_html, &recipients).await {
                Ok(()) => info!("Sent {} confirmation via email", event.kind()),
                Err(e) => warn!("Email delivery failed for {} event: {:#}", event.kind(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_mailer(server: &MockServer) -> Mailer {
        Mailer::new(server.uri(), "test-key", "noreply@example.org")
    }

    fn test_whatsapp(server: &MockServer) -> WhatsAppClient {
        WhatsAppClient::new(server.uri(), "ACtest", "token", "+14155238886")
    }

    fn donation_event(phone: Option<&str>) -> NotificationEvent {
        NotificationEvent::DonationCompleted {
            donor: "Asha".to_string(),
            email: "asha@example.org".to_string(),
            phone: phone.map(str::to_string),
            amount: 2500.0,
            receipt_id: "order_ABC123".to_string(),
        }
    }

    async fn wait_for_requests(server: &MockServer, count: usize) {
        for _ in 0..100 {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("Timed out waiting for {} requests", count);
    }

    // ==================== Rendering Tests ====================

    #[test]
    fn test_donation_email_binds_fields() {
        let (subject, body) = donation_event(None).render_email();
        assert_eq!(subject, "Thank you for your donation");
        assert!(body.contains("Asha"));
        assert!(body.contains("₹2500.00"));
        assert!(body.contains("order_ABC123"));
    }

    #[test]
    fn test_volunteer_chat_binds_name() {
        let event = NotificationEvent::VolunteerSignup {
            name: "Ravi".to_string(),
            email: "ravi@example.org".to_string(),
            phone: Some("+919900112233".to_string()),
            area: "education".to_string(),
        };
        let text = event.render_chat();
        assert!(text.contains("Ravi"));
        assert!(text.contains("volunteer"));
    }

    #[test]
    fn test_every_kind_renders_subject_and_body() {
        let events = [
            donation_event(None),
            NotificationEvent::VolunteerSignup {
                name: "Ravi".to_string(),
                email: "ravi@example.org".to_string(),
                phone: None,
                area: "education".to_string(),
            },
            NotificationEvent::ContactReceived {
                name: "Meera".to_string(),
                email: "meera@example.org".to_string(),
            },
            NotificationEvent::NewsletterSubscribed {
                email: "reader@example.org".to_string(),
            },
        ];

        for event in events {
            let (subject, body) = event.render_email();
            assert!(!subject.is_empty(), "{} subject empty", event.kind());
            assert!(!body.is_empty(), "{} body empty", event.kind());
        }
    }

    // ==================== Channel Selection Tests ====================

    #[test]
    fn test_chat_recipient_rules() {
        assert_eq!(donation_event(Some("+911234567890")).chat_recipient(), Some("+911234567890"));
        assert_eq!(donation_event(None).chat_recipient(), None);
        assert_eq!(donation_event(Some("")).chat_recipient(), None);

        let contact = NotificationEvent::ContactReceived {
            name: "Meera".to_string(),
            email: "meera@example.org".to_string(),
        };
        assert_eq!(contact.chat_recipient(), None);
    }

    // ==================== Dispatch Behavior Tests ====================

    #[tokio::test]
    async fn test_dispatch_returns_before_delivery_completes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(
                ResponseTemplate::new(202).set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 1);

        let start = Instant::now();
        notifier.dispatch(donation_event(None));
        let elapsed = start.elapsed();

        // The provider is still sleeping; the caller already has control back.
        assert!(
            elapsed < Duration::from_millis(500),
            "dispatch blocked for {:?}",
            elapsed
        );

        wait_for_requests(&server, 1).await;
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_kill_worker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream timeout"))
            .mount(&server)
            .await;

        let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 1);

        notifier.dispatch(donation_event(None));
        notifier.dispatch(NotificationEvent::NewsletterSubscribed {
            email: "reader@example.org".to_string(),
        });

        // Both events reach the provider: the worker survived the first
        // failure and kept draining the queue.
        wait_for_requests(&server, 2).await;
    }

    #[tokio::test]
    async fn test_donation_with_phone_uses_chat_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/2010-04-01/Accounts/.*/Messages\.json$"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"sid": "SM123"})),
            )
            .mount(&server)
            .await;
        // No email mock mounted: an email attempt would show up as an
        // unmatched request below.

        let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 1);
        notifier.dispatch(donation_event(Some("+911234567890")));

        wait_for_requests(&server, 1).await;
        let received = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
        assert!(received[0].url.path().ends_with("/Messages.json"));

        let form = String::from_utf8(received[0].body.clone()).expect("utf8 body");
        assert!(form.contains("whatsapp"));
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(
                ResponseTemplate::new(202).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 1, 1);

        let start = Instant::now();
        for _ in 0..10 {
            notifier.dispatch(donation_event(None));
        }
        let elapsed = start.elapsed();

        // Excess events are dropped, never queued against the caller.
        assert!(
            elapsed < Duration::from_millis(200),
            "dispatch blocked for {:?}",
            elapsed
        );
    }
}
