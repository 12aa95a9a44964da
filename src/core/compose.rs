use crate::domain::model::{ContactSubmission, OutgoingMail};

const NOT_PROVIDED: &str = "Not provided";

const HTML_STYLE: &str = r#"    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: linear-gradient(135deg, #6366f1, #8b5cf6); padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }
    .header h1 { color: white; margin: 0; font-size: 24px; }
    .content { background: #f9fafb; padding: 30px; border-radius: 0 0 10px 10px; }
    .field { margin-bottom: 20px; }
    .field-label { font-weight: bold; color: #6366f1; margin-bottom: 5px; }
    .field-value { color: #374151; }
    .message-box { background: white; padding: 15px; border-radius: 8px; border-left: 4px solid #6366f1; }"#;

/// Builds the notification email for one contact submission.
#[derive(Debug, Clone)]
pub struct MailComposer {
    from: String,
    recipient: String,
    message_id_domain: String,
}

impl MailComposer {
    pub fn new(from: impl Into<String>, recipient: impl Into<String>) -> Self {
        let from = from.into();
        let message_id_domain = sender_domain(&from).unwrap_or("localhost").to_string();
        Self {
            from,
            recipient: recipient.into(),
            message_id_domain,
        }
    }

    pub fn compose(&self, submission: &ContactSubmission) -> OutgoingMail {
        OutgoingMail {
            from: self.from.clone(),
            to: self.recipient.clone(),
            reply_to: submission.email.clone(),
            subject: format!("New Contact Form Submission from {}", submission.name),
            message_id: format!("<{}@{}>", uuid::Uuid::new_v4(), self.message_id_domain),
            text_body: text_body(submission),
            html_body: html_body(submission),
        }
    }
}

fn sender_domain(from: &str) -> Option<&str> {
    let address = from.rsplit_once('<').map_or(from, |(_, rest)| rest);
    let (_, domain) = address.rsplit_once('@')?;
    let domain = domain.trim_end_matches('>').trim();
    (!domain.is_empty()).then_some(domain)
}

fn text_body(submission: &ContactSubmission) -> String {
    format!(
        "Name: {}\nEmail: {}\nCompany: {}\n\nMessage:\n{}\n",
        submission.name,
        submission.email,
        submission.company.as_deref().unwrap_or(NOT_PROVIDED),
        submission.message,
    )
}

fn html_body(submission: &ContactSubmission) -> String {
    let company = submission.company.as_deref().unwrap_or(NOT_PROVIDED);
    let message = escape_html(&submission.message)
        .replace("\r\n", "\n")
        .replace('\n', "<br>");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <style>
{style}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>New Contact Form Submission</h1>
    </div>
    <div class="content">
      <div class="field">
        <div class="field-label">Name</div>
        <div class="field-value">{name}</div>
      </div>
      <div class="field">
        <div class="field-label">Email</div>
        <div class="field-value">{email}</div>
      </div>
      <div class="field">
        <div class="field-label">Company</div>
        <div class="field-value">{company}</div>
      </div>
      <div class="field">
        <div class="field-label">Message</div>
        <div class="message-box">{message}</div>
      </div>
    </div>
  </div>
</body>
</html>
"#,
        style = HTML_STYLE,
        name = escape_html(&submission.name),
        email = escape_html(&submission.email),
        company = escape_html(company),
        message = message,
    )
}

/// 提交內容直接嵌入 HTML，必須先跳脫
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
