// src/services/email.rs
//! Handlebars templates for outbound mail

use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::products::models::{format_price, Product};
use crate::services::mailer::{MailError, MailMessage};

const NEW_PRODUCT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background-color: #4F46E5; color: white; padding: 20px; text-align: center; }
        .content { padding: 20px; background-color: #f9f9f9; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>New product created</h1>
        </div>
        <div class="content">
            <p>A new product was added to the catalog.</p>
            <p><strong>{{name}}</strong> for {{price}}</p>
            <p>Product #{{id}}</p>
        </div>
    </div>
</body>
</html>"#;

#[derive(Serialize)]
struct NewProductEmailData<'a> {
    id: i64,
    name: &'a str,
    price: String,
}

/// Registry of mail templates
#[derive(Clone)]
pub struct MailTemplates {
    handlebars: Arc<Handlebars<'static>>,
}

impl MailTemplates {
    pub fn new() -> Result<Self, MailError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string("new_product_html", NEW_PRODUCT_HTML_TEMPLATE)
            .map_err(|e| MailError::Template(format!("Failed to register new_product_html: {}", e)))?;

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    pub fn new_product(&self, product: &Product, to: &str) -> Result<MailMessage, MailError> {
        debug!(product_id = product.id, "Rendering new product email");

        let data = NewProductEmailData {
            id: product.id,
            name: &product.name,
            price: format_price(product.price),
        };
        let html_body = self
            .handlebars
            .render("new_product_html", &data)
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(MailMessage {
            to: vec![to.to_string()],
            subject: format!("New product: {}", product.name),
            html_body,
        })
    }
}
