//! Built-in templates.

use crate::data::TemplateData;
use crate::error::TemplateResult;
use crate::file_report;
use crate::generator::{Generated, Generator};
use crate::metadata::{FieldSpec, TemplateMeta};
use crate::registry::TemplateRegistry;
use chrono::Utc;
use chrono_tz::Tz;
use handlebars::Handlebars;
use letterbox_mail::EmailContent;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings the built-in templates depend on.
#[derive(Debug, Clone)]
pub struct BuiltinConfig {
    /// Default folder for `file_report`.
    pub report_dir: PathBuf,
    /// Zone used for dates shown in messages and dated filenames.
    pub timezone: Tz,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("reports"),
            timezone: Tz::UTC,
        }
    }
}

const DAILY_SUMMARY: &str = r#"<p>Hello, <strong>{{player_name}}</strong>!</p>
<p>Here is how today went:</p>
<ul>
<li><strong>Tasks completed:</strong> <span style="font-size: 18px; color: #3f7d58; font-weight: bold;">{{tasks_completed}}</span></li>
<li><strong>Current level:</strong> {{level}}</li>
</ul>
<h4>Progress today</h4>
<div class="progress-bar"><div class="progress" style="width: {{progress}}%;">{{progress}}%</div></div>
<h4>Tomorrow</h4>
{{#if todo}}<ul>{{#each todo}}<li>{{this}}</li>{{/each}}</ul>{{else}}<p>Nothing planned yet.</p>{{/if}}
<p>Keep it up!</p>"#;

const PROJECT_UPDATE: &str = r#"<p>Hello!</p>
<p>This is the weekly update for <strong>{{project_name}}</strong>.</p>
<h4>Done this week</h4>
{{#if completed}}<ul>{{#each completed}}<li>{{this}}</li>{{/each}}</ul>{{else}}<p>No completed work recorded.</p>{{/if}}
<h4>Next week</h4>
{{#if planned}}<ul>{{#each planned}}<li>{{this}}</li>{{/each}}</ul>{{else}}<p>Plan to be decided.</p>{{/if}}
<p>Reported by {{reporter_name}}</p>"#;

const MOTIVATIONAL_QUOTE: &str = r#"<p>Hello, {{recipient_name}}!</p>
<p>A few words to carry with you today:</p>
<div style="padding: 20px; margin: 20px 0; border-left: 5px solid #3f7d58; background-color: #f9f9f9; font-style: italic;">
<p style="margin: 0;">&ldquo;{{quote_content}}&rdquo;</p>
<p style="margin: 10px 0 0; text-align: right; font-weight: bold;">&mdash; {{quote_author}}</p>
</div>
<p>Have a good day.</p>"#;

const WEEKLY_REPORT: &str = r#"<p>Hello, {{player_name}}!</p>
<p>Here is your week in review.</p>
<p>{{report_content}}</p>"#;

const LOCAL_FILE_REPORT: &str = r#"<p>{{{message}}}</p>"#;

const TEMPLATES: [(&str, &str); 5] = [
    ("daily_summary", DAILY_SUMMARY),
    ("project_update", PROJECT_UPDATE),
    ("motivational_quote", MOTIVATIONAL_QUOTE),
    ("weekly_report", WEEKLY_REPORT),
    ("local_file_report", LOCAL_FILE_REPORT),
];

/// Register every built-in template on `registry`.
pub fn register(registry: &mut TemplateRegistry, config: &BuiltinConfig) -> TemplateResult<()> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    for (name, source) in TEMPLATES {
        handlebars.register_template_string(name, source)?;
    }
    let handlebars = Arc::new(handlebars);
    let tz = config.timezone;

    let hb = handlebars.clone();
    registry.register(
        "daily_summary",
        TemplateMeta::new("Daily summary", "A gamified recap of the day with a progress bar.")
            .field(FieldSpec::text("player_name", "Player name", "Champion"))
            .field(FieldSpec::number("tasks_completed", "Tasks completed today", 5))
            .field(FieldSpec::text("level", "Current level", "15"))
            .field(FieldSpec::number("progress", "Progress today (0-100)", 75))
            .field(FieldSpec::textarea(
                "todo_list",
                "Tomorrow's tasks (comma separated)",
                "Finish the report,Review pull requests,Go for a run",
            )),
        Generator::sync(move |data| daily_summary(&hb, tz, data)),
    );

    let hb = handlebars.clone();
    registry.register(
        "project_update",
        TemplateMeta::new("Project update", "Weekly progress report for a project.")
            .field(FieldSpec::text("project_name", "Project name", "Letterbox"))
            .field(FieldSpec::text("reporter_name", "Reported by", "Project lead"))
            .field(FieldSpec::textarea(
                "completed_tasks",
                "Done this week (comma separated)",
                "Template registry,Delivery engine",
            ))
            .field(FieldSpec::textarea(
                "next_week_plan",
                "Next week (comma separated)",
                "Durable job store,Integration tests",
            )),
        Generator::sync(move |data| project_update(&hb, data)),
    );

    let hb = handlebars.clone();
    registry.register(
        "motivational_quote",
        TemplateMeta::new("Daily motivation", "A quote to start the day.")
            .field(FieldSpec::text("recipient_name", "Recipient nickname", "friend"))
            .field(FieldSpec::textarea(
                "quote_content",
                "Quote",
                "The only way to do great work is to love what you do.",
            ))
            .field(FieldSpec::text("quote_author", "Author", "Steve Jobs")),
        Generator::sync(move |data| motivational_quote(&hb, data)),
    );

    let hb = handlebars.clone();
    registry.register(
        "weekly_report",
        TemplateMeta::new("Weekly report (legacy)", "Free-form weekly summary.")
            .field(FieldSpec::text("player_name", "Player name", "Champion"))
            .field(FieldSpec::textarea(
                "report_content",
                "Report",
                "Wrapped up the sprint and planned next week's study.",
            )),
        Generator::sync(move |data| weekly_report(&hb, data)),
    );

    let hb = handlebars;
    registry.register(
        "local_file_report",
        TemplateMeta::new(
            "Send uploaded files",
            "Sends the files uploaded with the job as attachments, with a short note.",
        )
        .field(FieldSpec::textarea(
            "email_body_message",
            "Message (optional)",
            "Hello,\n\nPlease find the attached files.\n\nBest regards",
        )),
        Generator::sync(move |data| local_file_report(&hb, data)),
    );

    file_report::register(registry, config);
    Ok(())
}

fn render(hb: &Handlebars<'_>, name: &str, context: &Value) -> TemplateResult<String> {
    Ok(hb.render(name, context)?)
}

fn content(subject: String, html: String) -> TemplateResult<Generated> {
    Ok(Generated::Content(EmailContent::new(subject, html)))
}

fn daily_summary(hb: &Handlebars<'_>, tz: Tz, data: &Value) -> TemplateResult<Generated> {
    let data = TemplateData::new(data);
    let today = Utc::now().with_timezone(&tz).format("%Y-%m-%d");
    let progress = data.number("progress").unwrap_or(0.0).clamp(0.0, 100.0) as u8;

    let html = render(
        hb,
        "daily_summary",
        &json!({
            "player_name": data.text("player_name", "player"),
            "tasks_completed": data.text("tasks_completed", "0"),
            "level": data.text("level", "N/A"),
            "progress": progress,
            "todo": data.list("todo_list"),
        }),
    )?;
    content(format!("Daily summary - {}", today), html)
}

fn project_update(hb: &Handlebars<'_>, data: &Value) -> TemplateResult<Generated> {
    let data = TemplateData::new(data);
    let project = data.text("project_name", "Untitled project");

    let html = render(
        hb,
        "project_update",
        &json!({
            "project_name": project,
            "reporter_name": data.text("reporter_name", "N/A"),
            "completed": data.list("completed_tasks"),
            "planned": data.list("next_week_plan"),
        }),
    )?;
    content(format!("Project update - {}", project), html)
}

fn motivational_quote(hb: &Handlebars<'_>, data: &Value) -> TemplateResult<Generated> {
    let data = TemplateData::new(data);
    let html = render(
        hb,
        "motivational_quote",
        &json!({
            "recipient_name": data.text("recipient_name", "friend"),
            "quote_content": data.text("quote_content", ""),
            "quote_author": data.text("quote_author", "Anonymous"),
        }),
    )?;
    content("A new day, a fresh start".to_string(), html)
}

fn weekly_report(hb: &Handlebars<'_>, data: &Value) -> TemplateResult<Generated> {
    let data = TemplateData::new(data);
    let html = render(
        hb,
        "weekly_report",
        &json!({
            "player_name": data.text("player_name", "player"),
            "report_content": data.text("report_content", ""),
        }),
    )?;
    content("Weekly report".to_string(), html)
}

// Attachments come from the job's uploaded files, not from here.
fn local_file_report(hb: &Handlebars<'_>, data: &Value) -> TemplateResult<Generated> {
    let data = TemplateData::new(data);
    let message = handlebars::html_escape(&data.text("email_body_message", "Please find the attached files."))
        .replace("\r\n", "<br>")
        .replace('\n', "<br>");
    let html = render(hb, "local_file_report", &json!({ "message": message }))?;
    content("Files shared with you".to_string(), html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        register(&mut registry, &BuiltinConfig::default()).unwrap();
        registry
    }

    async fn generate(key: &str, data: Value) -> EmailContent {
        let registry = registry();
        let entry = registry.get(key).unwrap();
        match entry.generator.invoke(entry.meta.with_defaults(&data)).await.unwrap() {
            Generated::Content(content) => content,
            Generated::Abort => panic!("{key} aborted"),
        }
    }

    #[test]
    fn test_catalogue() {
        let registry = registry();
        assert_eq!(
            registry.keys(),
            vec![
                "daily_summary",
                "file_report",
                "local_file_report",
                "motivational_quote",
                "project_update",
                "weekly_report",
            ]
        );
        assert!(registry.get("file_report").unwrap().generator.is_async());
        assert!(!registry.get("daily_summary").unwrap().generator.is_async());
    }

    #[tokio::test]
    async fn test_daily_summary_defaults() {
        let content = generate("daily_summary", json!({"progress": "140"})).await;
        assert!(content.subject.starts_with("Daily summary - "));
        assert!(content.html.contains("<strong>Champion</strong>"));
        assert!(content.html.contains("width: 100%;"));
        assert!(content.html.contains("<li>Review pull requests</li>"));
    }

    #[tokio::test]
    async fn test_daily_summary_empty_todo() {
        let content = generate("daily_summary", json!({"todo_list": " , "})).await;
        assert!(content.html.contains("Nothing planned yet."));
    }

    #[tokio::test]
    async fn test_project_update_escapes_input() {
        let content = generate(
            "project_update",
            json!({"project_name": "<Apollo>", "completed_tasks": "a,b"}),
        )
        .await;
        assert_eq!(content.subject, "Project update - <Apollo>");
        assert!(content.html.contains("&lt;Apollo&gt;"));
        assert!(content.html.contains("<li>a</li><li>b</li>"));
    }

    #[tokio::test]
    async fn test_local_file_report_line_breaks() {
        let content = generate(
            "local_file_report",
            json!({"email_body_message": "Hi <team>\nsee attached"}),
        )
        .await;
        assert_eq!(content.html, "<p>Hi &lt;team&gt;<br>see attached</p>");
        assert!(content.attachments.is_empty());
    }
}
