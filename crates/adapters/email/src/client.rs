//! 邮件客户端实现

use crate::{EmailConfig, EmailSender, EmailTemplate};
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use souq_errors::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 邮件消息
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: Option<String>,
    pub text_body: String,
}

/// 邮件客户端
pub struct EmailClient {
    config: EmailConfig,
    template: Arc<EmailTemplate>,
}

impl EmailClient {
    /// 创建新的邮件客户端
    pub fn new(config: EmailConfig, template: EmailTemplate) -> Self {
        Self {
            config,
            template: Arc::new(template),
        }
    }

    /// 构建 SMTP 传输
    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().clone(),
        );

        let transport = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        } else {
            SmtpTransport::relay(&self.config.smtp_host)
        }
        .map_err(|e| AppError::internal(format!("Failed to create SMTP transport: {}", e)))?
        .port(self.config.smtp_port)
        .credentials(credentials)
        .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
        .build();

        Ok(transport)
    }

    /// 构建邮件消息
    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let message_builder = Message::builder().from(from).to(to).subject(&msg.subject);

        // 构建邮件体
        let body = if let Some(html) = &msg.html_body {
            // HTML + 纯文本备用
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(msg.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(html.clone()),
                )
        } else {
            // 仅纯文本
            MultiPart::alternative().singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_PLAIN)
                    .body(msg.text_body.clone()),
            )
        };

        let message = message_builder
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))?;

        Ok(message)
    }

    /// 发送邮件
    async fn send_message(&self, message: Message) -> AppResult<()> {
        let transport = self.build_transport()?;

        // 在 tokio 的 blocking 线程池中执行同步操作
        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Task join error: {}", e)))??;

        Ok(())
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send_template_email(
        &self,
        to: &str,
        subject: &str,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<()> {
        debug!(to = %to, subject = %subject, template = %template_name, "Sending template email");

        let body = self.template.render(template_name, context)?;

        let msg = EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: Some(body.clone()),
            text_body: body, // 使用相同内容作为备用
        };

        let message = self.build_message(&msg)?;
        self.send_message(message).await?;

        info!(to = %to, subject = %subject, template = %template_name, "Template email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_client() -> EmailClient {
        let mut templates = HashMap::new();
        templates.insert(
            "test.html".to_string(),
            "<h1>Hello {{ user_name }}</h1>".to_string(),
        );

        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user@example.com".to_string(),
            password: secrecy::Secret::new("password".to_string()),
            from_email: "noreply@souq.dev".to_string(),
            from_name: "Souq".to_string(),
            use_tls: true,
            timeout_secs: 30,
        };

        EmailClient::new(config, EmailTemplate::from_strings(templates).unwrap())
    }

    #[test]
    fn test_build_message() {
        let client = test_client();

        let msg = EmailMessage {
            to: "test@example.com".to_string(),
            subject: "Test Subject".to_string(),
            html_body: Some("<h1>Test</h1>".to_string()),
            text_body: "Test".to_string(),
        };

        let result = client.build_message(&msg);
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_message_invalid_recipient() {
        let client = test_client();

        let msg = EmailMessage {
            to: "not-an-address".to_string(),
            subject: "Test".to_string(),
            html_body: None,
            text_body: "Test".to_string(),
        };

        assert!(client.build_message(&msg).is_err());
    }
}
