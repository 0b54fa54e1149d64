//! Shared visual frame around every message body.

use crate::error::TemplateResult;
use handlebars::Handlebars;
use serde_json::json;

const ENVELOPE: &str = "envelope";

const ENVELOPE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<style>
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f4f4f4; margin: 0; padding: 0; }
.wrapper { width: 100%; background-color: #f4f4f4; padding: 40px 0; }
.container { max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 12px; overflow: hidden; }
.header { background-color: #3f7d58; color: #ffffff; padding: 28px 24px; text-align: center; }
.header h1 { margin: 0; font-size: 26px; font-weight: 600; }
.content { padding: 28px 24px; color: #555; }
.content h4 { color: #333; margin: 24px 0 10px; border-left: 4px solid #3f7d58; padding-left: 10px; }
.footer { font-size: 12px; color: #888; text-align: center; padding: 18px 24px; background-color: #f9f9f9; }
.progress-bar { width: 100%; background-color: #e0e0e0; border-radius: 5px; height: 20px; overflow: hidden; }
.progress { background-color: #3f7d58; height: 100%; color: #fff; text-align: center; line-height: 20px; font-weight: bold; }
pre { white-space: pre-wrap; word-wrap: break-word; background-color: #f5f5f5; padding: 14px; border-radius: 8px; }
</style>
</head>
<body>
<div class="wrapper">
<div class="container">
<div class="header"><h1>{{title}}</h1></div>
<div class="content">
{{{content}}}
</div>
<div class="footer"><p>This message was sent automatically by <strong>{{brand}}</strong>. Replies are not monitored.</p></div>
</div>
</div>
</body>
</html>
"#;

/// Wraps generator output in the common header and footer.
pub struct Envelope {
    handlebars: Handlebars<'static>,
    brand: String,
}

impl Envelope {
    pub fn new(brand: impl Into<String>) -> TemplateResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(ENVELOPE, ENVELOPE_HTML)?;
        Ok(Self {
            handlebars,
            brand: brand.into(),
        })
    }

    /// Frame `content` (trusted HTML) under a heading of `title` (escaped).
    pub fn wrap(&self, title: &str, content: &str) -> TemplateResult<String> {
        let html = self.handlebars.render(
            ENVELOPE,
            &json!({ "title": title, "content": content, "brand": self.brand }),
        )?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        let envelope = Envelope::new("Letterbox").unwrap();
        let html = envelope.wrap("Q3 <numbers>", "<p>hi</p>").unwrap();

        assert!(html.contains("<h1>Q3 &lt;numbers&gt;</h1>"));
        assert!(html.contains("<p>hi</p>"));
        assert!(html.contains("<strong>Letterbox</strong>"));
    }
}
