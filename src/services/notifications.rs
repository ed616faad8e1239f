// src/services/notifications.rs
//
// Canais de saída (e-mail e WhatsApp). Ambos são opcionais: sem
// configuração o envio é pulado com um aviso no log. Falha de entrega nunca
// derruba a operação que pediu o envio.

use std::time::Duration;

use futures::future::join_all;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Teto de cada chamada externa.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "no-reply@reservas.local";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMTP: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Dirección inválida: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Mensaje inválido: {0}")]
    Build(String),

    #[error("HTTP: {0}")]
    Request(#[from] reqwest::Error),

    #[error("La pasarela respondió HTTP {0}")]
    HttpStatus(u16),

    #[error("URL inválida: {0}")]
    Url(String),

    #[error("Tiempo de espera agotado")]
    Timeout,
}

// ---
// 1. Configuração (variáveis de ambiente)
// ---

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// `false` = SMTP puro (servidor interno sem TLS).
    pub starttls: bool,
}

impl SmtpConfig {
    /// `None` quando `SMTP_HOST` não está definido.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty())?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            user: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            starttls: std::env::var("SMTP_STARTTLS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub base_url: String,
    pub token: String,
}

impl WhatsAppConfig {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("WHATSAPP_API_URL").ok().filter(|u| !u.trim().is_empty())?;
        let token = std::env::var("WHATSAPP_API_TOKEN").unwrap_or_default();
        Some(Self { base_url, token })
    }
}

// ---
// 2. E-mail
// ---

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port)
        .timeout(Some(SEND_TIMEOUT));

        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
        })
    }

    /// Texto puro UTF-8.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        tokio::time::timeout(SEND_TIMEOUT, self.transport.send(email))
            .await
            .map_err(|_| DeliveryError::Timeout)??;

        tracing::info!(to, subject, "E-mail enviado");
        Ok(())
    }
}

// ---
// 3. WhatsApp (gateway HTTP)
// ---

#[derive(Debug, Serialize)]
struct WhatsAppMessage<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self { client, endpoint: Self::endpoint(config)? })
    }

    /// `base_url?token=...`
    pub fn endpoint(config: &WhatsAppConfig) -> Result<reqwest::Url, DeliveryError> {
        reqwest::Url::parse_with_params(config.base_url.trim(), &[("token", config.token.as_str())])
            .map_err(|e| DeliveryError::Url(e.to_string()))
    }

    /// 200 e 201 contam como entregue.
    pub async fn send(&self, number: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&WhatsAppMessage { number, text })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 && status != 201 {
            return Err(DeliveryError::HttpStatus(status));
        }
        Ok(())
    }
}

// ---
// 4. Relatório por destinatário
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryOutcome {
    pub booking_id: i32,
    #[schema(example = "34600111222")]
    pub recipient: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn push(&mut self, outcome: DeliveryOutcome) {
        if outcome.success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(outcome);
    }
}

/// Uma mensagem do lote: reserva, número E.164 e texto.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub booking_id: i32,
    pub recipient: String,
    pub text: String,
}

// ---
// 5. Fachada usada pelos serviços
// ---

#[derive(Clone, Default)]
pub struct Notifier {
    mailer: Option<Mailer>,
    whatsapp: Option<WhatsAppClient>,
}

impl Notifier {
    pub fn new(mailer: Option<Mailer>, whatsapp: Option<WhatsAppClient>) -> Self {
        Self { mailer, whatsapp }
    }

    /// Monta os canais configurados; um canal com configuração inválida
    /// fica desligado.
    pub fn from_config(smtp: Option<&SmtpConfig>, whatsapp: Option<&WhatsAppConfig>) -> Self {
        let mailer = smtp.and_then(|c| {
            Mailer::new(c)
                .map_err(|e| tracing::warn!(error = %e, "SMTP desativado"))
                .ok()
        });
        let whatsapp = whatsapp.and_then(|c| {
            WhatsAppClient::new(c)
                .map_err(|e| tracing::warn!(error = %e, "WhatsApp desativado"))
                .ok()
        });
        Self { mailer, whatsapp }
    }

    /// Melhor esforço: devolve se o e-mail saiu.
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        let Some(mailer) = &self.mailer else {
            tracing::warn!(to, subject, "SMTP não configurado; e-mail não enviado");
            return false;
        };
        match mailer.send(to, subject, body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(to, subject, error = %e, "Falha ao enviar e-mail");
                false
            }
        }
    }

    /// Envia o lote em paralelo; cada falha fica registrada no relatório e
    /// não interrompe as demais.
    pub async fn send_whatsapp_batch(&self, messages: Vec<OutboundMessage>) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let Some(client) = &self.whatsapp else {
            tracing::warn!(count = messages.len(), "WhatsApp não configurado; lote não enviado");
            for m in messages {
                report.push(DeliveryOutcome {
                    booking_id: m.booking_id,
                    recipient: m.recipient,
                    success: false,
                    error: Some("WhatsApp no configurado".to_string()),
                });
            }
            return report;
        };

        let sends = messages.iter().map(|m| client.send(&m.recipient, &m.text));
        let results = join_all(sends).await;

        for (m, result) in messages.into_iter().zip(results) {
            if let Err(e) = &result {
                tracing::warn!(booking_id = m.booking_id, recipient = %m.recipient, error = %e, "Falha no WhatsApp");
            }
            report.push(DeliveryOutcome {
                booking_id: m.booking_id,
                recipient: m.recipient,
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_endpoint_carries_token_as_query() {
        let config = WhatsAppConfig {
            base_url: "https://gateway.example.com/send".into(),
            token: "abc 123".into(),
        };
        let url = WhatsAppClient::endpoint(&config).unwrap();
        assert_eq!(url.as_str(), "https://gateway.example.com/send?token=abc+123");
    }

    #[test]
    fn invalid_gateway_url_is_rejected() {
        let config = WhatsAppConfig { base_url: "no es una url".into(), token: "t".into() };
        assert!(WhatsAppClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn unconfigured_channels_report_every_recipient() {
        let notifier = Notifier::default();
        assert!(!notifier.send_email("a@example.com", "Hola", "texto").await);

        let report = notifier
            .send_whatsapp_batch(vec![
                OutboundMessage { booking_id: 1, recipient: "34600111222".into(), text: "a".into() },
                OutboundMessage { booking_id: 2, recipient: "34600333444".into(), text: "b".into() },
            ])
            .await;
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(report.results[1].booking_id, 2);
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = DeliveryReport::default();
        report.push(DeliveryOutcome { booking_id: 1, recipient: "1".into(), success: true, error: None });
        report.push(DeliveryOutcome {
            booking_id: 2,
            recipient: "2".into(),
            success: false,
            error: Some("HTTP 500".into()),
        });
        assert_eq!((report.sent, report.failed), (1, 1));
    }
}
