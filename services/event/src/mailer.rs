use std::path::Path;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::EventConfig;
use crate::domain::repository::{MailDelivery, MailPort};
use crate::domain::types::{MemberRecord, TeamRecord};

/// Fast-path wait for the OTP send; slower deliveries continue detached.
const OTP_SEND_BUDGET: Duration = Duration::from_secs(2);
/// Wait budget for the confirmation send and hard per-attempt timeout.
const SEND_TIMEOUT: Duration = Duration::from_secs(20);
/// Redelivery attempts after a transient failure.
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// SMTP mailer over STARTTLS on the submission port. Configuration is
/// validated eagerly: with host, user or password missing every send
/// returns `Unconfigured` without touching the network.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    base_url: String,
}

impl SmtpMailer {
    pub fn from_config(cfg: &EventConfig) -> anyhow::Result<Self> {
        if cfg.smtp_host.is_empty() || cfg.smtp_user.is_empty() || cfg.smtp_pass.is_empty() {
            warn!("smtp configuration incomplete; mail delivery disabled");
            return Ok(Self {
                transport: None,
                from: None,
                base_url: cfg.base_url.clone(),
            });
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                cfg.smtp_user.clone(),
                cfg.smtp_pass.clone(),
            ))
            .timeout(Some(SEND_TIMEOUT))
            .build();
        let from: Mailbox = cfg
            .smtp_user
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid SMTP_USER mailbox: {e}"))?;

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
            base_url: cfg.base_url.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Hand `message` to the transport, waiting at most `wait`. A send that
    /// outlives the wait keeps running (with retries) in the background and
    /// the caller gets a provisional `Queued`.
    async fn dispatch(&self, message: Message, wait: Duration) -> MailDelivery {
        let Some(transport) = self.transport.clone() else {
            return MailDelivery::Unconfigured;
        };
        let mut task = tokio::spawn(send_with_retry(transport, message));
        match timeout(wait, &mut task).await {
            Ok(Ok(delivery)) => delivery,
            Ok(Err(join_error)) => {
                error!(error = %join_error, "mail task aborted");
                MailDelivery::Rejected
            }
            Err(_elapsed) => MailDelivery::Queued,
        }
    }
}

async fn send_with_retry(
    transport: AsyncSmtpTransport<Tokio1Executor>,
    message: Message,
) -> MailDelivery {
    for attempt in 1..=RETRY_ATTEMPTS {
        if attempt > 1 {
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
        match transport.send(message.clone()).await {
            Ok(_) => {
                info!(attempt, "mail accepted by relay");
                return MailDelivery::Sent;
            }
            Err(e) if e.is_permanent() => {
                error!(error = %e, "mail permanently rejected");
                return MailDelivery::Rejected;
            }
            Err(e) => {
                warn!(attempt, error = %e, "transient mail failure");
            }
        }
    }
    error!(attempts = RETRY_ATTEMPTS, "mail delivery retries exhausted");
    MailDelivery::Rejected
}

impl MailPort for SmtpMailer {
    async fn send_otp(&self, to: &str, code: &str, expires_in_secs: u64) -> MailDelivery {
        let Some(from) = self.from.clone() else {
            return MailDelivery::Unconfigured;
        };
        let to_mailbox: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(error = %e, "invalid recipient address");
                return MailDelivery::Rejected;
            }
        };
        let (plain, html) = otp_bodies(code, expires_in_secs / 60);
        let message = match Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject("Your registration verification code")
            .multipart(MultiPart::alternative_plain_html(plain, html))
        {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "failed to build OTP message");
                return MailDelivery::Rejected;
            }
        };
        self.dispatch(message, OTP_SEND_BUDGET).await
    }

    async fn send_confirmation(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
        document: &Path,
    ) -> MailDelivery {
        let Some(from) = self.from.clone() else {
            return MailDelivery::Unconfigured;
        };
        let to_mailbox: Mailbox = match team.leader_email.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(error = %e, "invalid recipient address");
                return MailDelivery::Rejected;
            }
        };
        // The attachment is read into the message up front so the caller may
        // delete the file as soon as this returns, even on `Queued`.
        let pdf = match tokio::fs::read(document).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, path = %document.display(), "failed to read card document");
                return MailDelivery::Rejected;
            }
        };
        let filename = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_id_cards.pdf", team.team_id));
        let download_link = download_link(&self.base_url, team);
        let (plain, html) = confirmation_bodies(team, members, &download_link);
        let attachment = Attachment::new(filename).body(
            pdf,
            ContentType::parse("application/pdf").expect("static content type"),
        );
        let message = match Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(format!("Registration confirmed — {}", team.team_id))
            .multipart(
                MultiPart::mixed()
                    .multipart(MultiPart::alternative_plain_html(plain, html))
                    .singlepart(attachment),
            ) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "failed to build confirmation message");
                return MailDelivery::Rejected;
            }
        };
        self.dispatch(message, SEND_TIMEOUT).await
    }
}

fn download_link(base_url: &str, team: &TeamRecord) -> String {
    format!(
        "{}/download/id-cards?team_id={}&key={}",
        base_url.trim_end_matches('/'),
        team.team_id,
        team.access_key
    )
}

fn otp_bodies(code: &str, expires_in_mins: u64) -> (String, String) {
    let plain = format!(
        "Your verification code is {code}.\n\n\
         Enter it on the registration page to finish signing up your team.\n\
         The code expires in {expires_in_mins} minutes and can be used once.\n\n\
         If you did not start a registration, ignore this email."
    );
    let html = format!(
        "<p>Your verification code is</p>\
         <p style=\"font-size:28px;font-family:monospace;letter-spacing:4px\"><strong>{code}</strong></p>\
         <p>Enter it on the registration page to finish signing up your team. \
         The code expires in <strong>{expires_in_mins} minutes</strong> and can be used once.</p>\
         <p>If you did not start a registration, ignore this email.</p>"
    );
    (plain, html)
}

fn confirmation_bodies(
    team: &TeamRecord,
    members: &[MemberRecord],
    download_link: &str,
) -> (String, String) {
    let roster_plain: String = members
        .iter()
        .map(|m| format!("  {}. {} ({})\n", m.member_index + 1, m.name, m.participant_id))
        .collect();
    let roster_html: String = members
        .iter()
        .map(|m| format!("<li>{} — <code>{}</code></li>", m.name, m.participant_id))
        .collect();

    let plain = format!(
        "Hello {leader},\n\n\
         Your team '{name}' is registered.\n\n\
         Team ID:   {id}\n\
         Team code: {code}\n\n\
         Members:\n{roster_plain}\n\
         Next steps:\n\
         - Your ID cards are attached as a PDF; print one card per member.\n\
         - Each card carries a QR code used for check-in at the venue.\n\
         - Keep the team code handy as the manual check-in fallback.\n\
         - Re-download the cards any time: {download_link}\n",
        leader = team.leader_name,
        name = team.team_name,
        id = team.team_id,
        code = team.team_code,
    );
    let html = format!(
        "<p>Hello <strong>{leader}</strong>,</p>\
         <p>Your team '<strong>{name}</strong>' is registered.</p>\
         <p>Team ID: <code>{id}</code><br>Team code: <code>{code}</code></p>\
         <ul>{roster_html}</ul>\
         <p>Your ID cards are attached as a PDF; print one card per member. \
         Each card carries a QR code used for check-in at the venue, with the \
         team code as the manual fallback.</p>\
         <p><a href=\"{download_link}\">Re-download your ID cards</a></p>",
        leader = team.leader_name,
        name = team.team_name,
        id = team.team_id,
        code = team.team_code,
    );
    (plain, html)
}
