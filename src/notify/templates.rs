//! Message templates for status-change notifications

use super::{Message, MessageBody};

pub fn loan_approved(applicant_name: &str, support_phone: &str) -> Message {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; color: #333;">
  <h2 style="color: #28a745;">Congratulations, {name}!</h2>
  <p>Your loan application has been <strong style="color: green;">approved</strong>.</p>
  <p>We're excited to work with you. Our team will contact you soon for the next steps.</p>
  <br/>
  <p style="font-size: 14px; color: #555;">If you have any questions, please contact us at <a href="tel:{phone}">{phone}</a>.</p>
  <p style="font-size: 12px; color: #777;">Thank you for choosing us!</p>
</div>"#,
        name = escape_html(applicant_name),
        phone = escape_html(support_phone),
    );

    Message {
        subject: "Loan Approval".to_string(),
        body: MessageBody::Html(html),
    }
}

pub fn loan_rejected(applicant_name: &str, support_phone: &str) -> Message {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; color: #333;">
  <h2 style="color: #dc3545;">Hello {name},</h2>
  <p>We regret to inform you that your loan application has been <strong style="color: red;">rejected</strong>.</p>
  <p>For more information, please contact us at:</p>
  <p style="font-size: 16px; font-weight: bold;"><a href="tel:{phone}">{phone}</a></p>
  <br/>
  <p style="font-size: 12px; color: #777;">Thank you for your interest in our services.</p>
</div>"#,
        name = escape_html(applicant_name),
        phone = escape_html(support_phone),
    );

    Message {
        subject: "Loan Rejection Notice".to_string(),
        body: MessageBody::Html(html),
    }
}

pub fn account_approved(user_name: &str) -> Message {
    Message {
        subject: "Your Account is Approved".to_string(),
        body: MessageBody::Text(format!(
            "Hi {},\n\nYour account has been approved.\n\nRegards,\nAdmin",
            user_name
        )),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
