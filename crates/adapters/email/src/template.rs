//! 邮件模板系统

use souq_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 从模板目录创建
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*.html", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load email templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Email templates loaded");

        Ok(Self { tera })
    }

    /// 从内存中的模板字符串创建（用于测试）
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })
    }
}
