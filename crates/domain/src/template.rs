use std::collections::HashMap;

/// Values substituted into a `Template`, keyed by placeholder name
pub type TemplateFields = HashMap<&'static str, String>;

/// A named mail template with `{{field}}` placeholders in both the
/// subject and the html body.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub name: &'static str,
    pub subject: &'static str,
    pub html: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub html: String,
}

impl Template {
    /// Renders a fresh copy of the template. The template itself is never
    /// modified, so rendering for one recipient cannot leak into the next.
    pub fn render(&self, fields: &TemplateFields) -> RenderedTemplate {
        RenderedTemplate {
            subject: substitute(self.subject, fields),
            html: substitute(self.html, fields),
        }
    }
}

fn substitute(source: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let key = after_open[..end].trim();
                match fields.get(key) {
                    Some(value) => out.push_str(value),
                    // Unknown placeholders are kept as is
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after_open[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: Template = Template {
        name: "greeting",
        subject: "Hi {{name}}",
        html: "<p>Hello {{ name }}, see you at {{place}}.</p>",
    };

    fn fields(name: &str) -> TemplateFields {
        let mut fields = TemplateFields::new();
        fields.insert("name", name.to_string());
        fields.insert("place", "the library".to_string());
        fields
    }

    #[test]
    fn substitutes_fields() {
        let rendered = GREETING.render(&fields("Ada"));
        assert_eq!(rendered.subject, "Hi Ada");
        assert_eq!(rendered.html, "<p>Hello Ada, see you at the library.</p>");
    }

    #[test]
    fn renders_are_independent() {
        let first = GREETING.render(&fields("Ada"));
        let second = GREETING.render(&fields("Grace"));
        assert_eq!(first.subject, "Hi Ada");
        assert_eq!(second.subject, "Hi Grace");
        assert!(!second.html.contains("Ada"));
    }

    #[test]
    fn keeps_unknown_and_unterminated_placeholders() {
        let template = Template {
            name: "broken",
            subject: "{{missing}} and {{name",
            html: "",
        };
        let rendered = template.render(&fields("Ada"));
        assert_eq!(rendered.subject, "{{missing}} and {{name");
    }
}
