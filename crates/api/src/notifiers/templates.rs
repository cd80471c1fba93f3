use campus_scheduler_domain::{Attachment, RenderedTemplate, Template, TemplateFields};

const LOGO: &[u8] = include_bytes!("../../assets/logo.svg");

/// Content id the templates use to reference the inline logo
pub const LOGO_CONTENT_ID: &str = "logo";

pub const EVENT_REMINDER: Template = Template {
    name: "event_reminder",
    subject: "Reminder: {{title}} starts soon",
    html: r#"<html>
  <body style="font-family: Helvetica, Arial, sans-serif; color: #222222;">
    <img src="cid:logo" alt="Campus" height="32"/>
    <p>Hi {{name}},</p>
    <p>
      <strong>{{title}}</strong> in {{group}} starts {{start}}.
    </p>
    <p>Location: {{location}}</p>
    <p>{{description}}</p>
    <p>See you there!</p>
  </body>
</html>"#,
};

pub const EXAM_REMINDER: Template = Template {
    name: "exam_reminder",
    subject: "Reminder: your {{course}} exam starts {{start}}",
    html: r#"<html>
  <body style="font-family: Helvetica, Arial, sans-serif; color: #222222;">
    <img src="cid:logo" alt="Campus" height="32"/>
    <p>Hi {{name}},</p>
    <p>
      Your exam in <strong>{{course}}</strong> starts {{start}}.
    </p>
    <p>Location: {{location}}</p>
    <p>Good luck!</p>
  </body>
</html>"#,
};

/// The branding logo, attached inline to every reminder
pub fn logo() -> Attachment {
    Attachment::inline(LOGO_CONTENT_ID, "logo.svg", "image/svg+xml", LOGO)
}

/// Renders a reminder mail. Field values are user provided text, so they are
/// escaped before going into the html body. The subject is plain text.
pub fn render(template: &Template, fields: &TemplateFields) -> RenderedTemplate {
    let escaped = fields
        .iter()
        .map(|(key, value)| (*key, escape_html(value)))
        .collect::<TemplateFields>();
    RenderedTemplate {
        subject: template.render(fields).subject,
        html: template.render(&escaped).html,
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
