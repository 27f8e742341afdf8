use anyhow::{bail, Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use std::str::FromStr;

use crate::config::CredentialSource;

pub const RELAY_HOST: &str = "email-smtp.eu-west-2.amazonaws.com";
pub const RELAY_PORT: u16 = 587;
pub const DIRECT_TLS_HOST: &str = "smtp.gmail.com";
pub const DIRECT_TLS_PORT: u16 = 465;

/// How the digest leaves the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportProfile {
    /// STARTTLS to the SES relay, authenticated with SES SMTP credentials.
    #[default]
    Relay,
    /// Implicit TLS straight to the sender's mail provider.
    DirectTls,
}

impl FromStr for TransportProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relay" => Ok(Self::Relay),
            "direct-tls" => Ok(Self::DirectTls),
            other => bail!("unknown transport {other:?} (expected relay or direct-tls)"),
        }
    }
}

/// `UPDATE - Sun 18 Oct 26`
pub fn subject_for(now: &DateTime<Tz>) -> String {
    now.format("UPDATE - %a %d %b %y").to_string()
}

/// HTML-only message, wrapped in `multipart/alternative`.
pub fn build_message(from: &Mailbox, to: &Mailbox, subject: &str, html: &str) -> Result<Message> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .multipart(MultiPart::alternative().singlepart(SinglePart::html(html.to_string())))
        .context("build email")
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Mailer {
    pub fn new(creds: &dyn CredentialSource, profile: TransportProfile) -> Result<Self> {
        let from: Mailbox = creds
            .secret("gmail", "sender_email")?
            .parse()
            .context("invalid sender address")?;
        let to: Mailbox = creds
            .secret("gmail", "receiver_email")?
            .parse()
            .context("invalid receiver address")?;

        let transport = match profile {
            TransportProfile::Relay => {
                let login = Credentials::new(
                    creds.secret("aws-ses", "smtp-username")?,
                    creds.secret("aws-ses", "smtp-password")?,
                );
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(RELAY_HOST)
                    .context("relay transport")?
                    .port(RELAY_PORT)
                    .credentials(login)
                    .build()
            }
            TransportProfile::DirectTls => {
                let login = Credentials::new(
                    from.email.to_string(),
                    creds.secret("gmail", "password")?,
                );
                AsyncSmtpTransport::<Tokio1Executor>::relay(DIRECT_TLS_HOST)
                    .context("direct TLS transport")?
                    .port(DIRECT_TLS_PORT)
                    .credentials(login)
                    .build()
            }
        };

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    pub fn message(&self, html: &str, now: &DateTime<Tz>) -> Result<Message> {
        build_message(&self.from, &self.to, &subject_for(now), html)
    }

    pub async fn send(&self, html: &str, now: &DateTime<Tz>) -> Result<()> {
        let msg = self.message(html, now)?;
        self.transport.send(msg).await.context("send email")?;
        tracing::info!(to = %self.to, "digest sent");
        Ok(())
    }
}
