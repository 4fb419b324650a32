//! Tree walker and field renderer (read path)
//!
//! Renders a form document against a member record serialized as JSON.
//! A node that fails to decode or render is replaced by an inline
//! `Invalid Input` marker and the walk continues with the next sibling.

use maud::{html, Markup, PreEscaped};
use serde_json::Value;
use tracing::warn;

use super::schema::{
    discriminator, email_pattern, ChoiceField, DropdownField, FieldAttrs, Navigation,
    SchemaNode, Section, SliderField, NID_PATTERN, SLIDER_MAX, SLIDER_MIN,
};

/// Marker text used when a node has no usable discriminator.
const MALFORMED: &str = "Malformed object";

/// Why a single node could not be rendered
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("malformed node: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record has neither a name nor an id to sign with")]
    Anonymous,
}

/// Render a form document as an HTML fragment. Never fails.
pub fn render(schema: &[Value], record: &Value) -> String {
    let mut output = String::new();

    for raw in schema {
        let markup = render_node(raw, record).unwrap_or_else(|e| {
            let kind = discriminator(raw).unwrap_or(MALFORMED);
            warn!(input = kind, error = %e, "Schema node failed to render");
            invalid(kind)
        });
        output.push_str(&markup.into_string());
    }

    output
}

fn render_node(raw: &Value, record: &Value) -> Result<Markup, RenderError> {
    let markup = match SchemaNode::parse(raw)? {
        SchemaNode::H1(section) => {
            html! { h1 { (section.label) } (children(&section, record)) }
        }
        SchemaNode::H2(section) => {
            html! { h2 { (section.label) } (children(&section, record)) }
        }
        SchemaNode::H3(section) => {
            html! { h3 { (section.label) } (children(&section, record)) }
        }
        SchemaNode::P(section) => {
            html! { p { (section.label) } (children(&section, record)) }
        }
        SchemaNode::Text(attrs) => text_input(&attrs, record, "text", None),
        SchemaNode::Email(field) => text_input(
            &field.attrs,
            record,
            "email",
            Some(email_pattern(field.domain.as_deref())),
        ),
        SchemaNode::Nid(attrs) => text_input(&attrs, record, "text", Some(NID_PATTERN.to_string())),
        SchemaNode::Radio(field) => radio(&field, record),
        SchemaNode::Checkbox(field) => checkbox(&field),
        SchemaNode::Dropdown(field) => dropdown(&field, record),
        SchemaNode::Slider(field) => slider(&field, record),
        SchemaNode::Signature(attrs) => signature(&attrs, record)?,
        SchemaNode::Navigation(nav) => navigation(&nav),
    };

    Ok(markup)
}

fn children(section: &Section, record: &Value) -> PreEscaped<String> {
    PreEscaped(render(&section.elements, record))
}

/// Look up a field, following at most one `.` into a nested sub-entity.
/// Null counts as absent.
pub fn lookup<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    let found = match key.split_once('.') {
        Some((parent, child)) => record.get(parent)?.get(child)?,
        None => record.get(key)?,
    };

    (!found.is_null()).then_some(found)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

/// Current record value for a field, honouring `prefill`.
fn prefill<'a>(attrs: &FieldAttrs, record: &'a Value) -> Option<&'a Value> {
    if !attrs.prefill {
        return None;
    }

    let key = attrs.key.as_deref()?;
    if key == "email" {
        // fall back to the address the identity provider reported
        return lookup(record, "email")
            .filter(|value| !is_blank(value))
            .or_else(|| lookup(record, "discord.email"));
    }

    lookup(record, key)
}

fn control_id(kind: &str, key: &str, option: &str) -> String {
    format!("{}_{}_{}", kind, dom_safe(key), dom_safe(option))
}

fn dom_safe(s: &str) -> String {
    s.replace(['.', ' '], "_")
}

fn other_placeholder(attrs: &FieldAttrs) -> String {
    let label = if attrs.label.is_empty() { "Other" } else { attrs.label.as_str() };
    format!("{}...", label)
}

/// Label and caption column next to the control column.
fn entry(attrs: &FieldAttrs, inner: Markup) -> Markup {
    html! {
        div.entry {
            div {
                h3 { (attrs.label) }
                h4 { (attrs.caption) }
            }
            div { (inner) }
        }
    }
}

fn text_input(
    attrs: &FieldAttrs,
    record: &Value,
    input_type: &str,
    pattern: Option<String>,
) -> Markup {
    let value = prefill(attrs, record).map(display).unwrap_or_default();

    let inner = html! {
        input.kennelish_input
            type=(input_type)
            name=(attrs.key_or_empty())
            value=(value)
            placeholder=(attrs.label)
            required[attrs.required]
            pattern=[pattern];
    };

    entry(attrs, inner)
}

fn radio(field: &ChoiceField, record: &Value) -> Markup {
    let attrs = &field.attrs;
    let key = attrs.key_or_empty();
    let yes_no = field.is_yes_no();

    let selected = prefill(attrs, record).map(|value| match value {
        Value::Bool(flag) if yes_no => (if *flag { "Yes" } else { "No" }).to_string(),
        other => display(other),
    });

    let inner = html! {
        fieldset.kennelish_input.radio name=(key) required[attrs.required] {
            @for choice in &field.options {
                @let id = control_id("radio", key, choice);
                div {
                    input type="radio"
                        name=(key)
                        id=(id)
                        value=(choice)
                        checked[selected.as_deref() == Some(choice.as_str())];
                    label for=(id) { (choice) }
                }
            }
        }
    };

    entry(attrs, inner)
}

/// Checkbox groups never prefill.
fn checkbox(field: &ChoiceField) -> Markup {
    let attrs = &field.attrs;
    let key = attrs.key_or_empty();
    let other_id = control_id("checkbox", key, "OTHER");

    let inner = html! {
        fieldset.kennelish_input.checkbox name=(key) required[attrs.required] {
            @for choice in &field.options {
                @let id = control_id("checkbox", key, choice);
                div {
                    input type="checkbox" name=(key) id=(id) value=(choice);
                    label for=(id) { (choice) }
                }
            }
            div {
                input type="checkbox" name=(key) id=(other_id) value="_other";
                label for=(other_id) { "Other" }
            }
            input.other_checkbox
                id=(dom_safe(key))
                type="text"
                placeholder=(other_placeholder(attrs));
        }
    };

    entry(attrs, inner)
}

fn dropdown(field: &DropdownField, record: &Value) -> Markup {
    let attrs = &field.attrs;
    let key = attrs.key_or_empty();

    let current = prefill(attrs, record)
        .map(display)
        .filter(|value| !value.is_empty() && value != "_default");
    let listed = current
        .as_deref()
        .map(|value| field.options.iter().any(|o| o == value))
        .unwrap_or(false);
    // a free-text answer from an earlier visit goes back into the Other box
    let other_text = match &current {
        Some(value) if field.other && !listed => Some(value.clone()),
        _ => None,
    };

    let inner = html! {
        select.kennelish_input name=(key) required[attrs.required] {
            option disabled selected[current.is_none() || (!listed && other_text.is_none())] value="_default" {
                "Select..."
            }
            @for choice in &field.options {
                option selected[current.as_deref() == Some(choice.as_str())] value=(choice) { (choice) }
            }
            @if field.other {
                option selected[other_text.is_some()] value="_other" { "Other" }
            }
        }
        @if field.other {
            input.other_dropdown
                id=(dom_safe(key))
                type="text"
                placeholder=(other_placeholder(attrs))
                value=[other_text];
        }
    };

    entry(attrs, inner)
}

fn slider(field: &SliderField, record: &Value) -> Markup {
    let attrs = &field.attrs;
    let key = attrs.key_or_empty();

    let selected = prefill(attrs, record).and_then(|value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let inner = html! {
        span.caption { (field.novice_label) }
        span.right.caption { (field.expert_label) }
        br;
        fieldset.kennelish_input.radio.gridded name=(key) required[attrs.required] {
            @for level in SLIDER_MIN..=SLIDER_MAX {
                @let id = control_id("radio", key, &level.to_string());
                div {
                    input type="radio" name=(key) id=(id) value=(level) checked[selected == Some(level)];
                    label for=(id) { (level) }
                }
            }
        }
    };

    entry(attrs, inner)
}

/// Attestation sentence naming the member. Not an input.
fn signature(attrs: &FieldAttrs, record: &Value) -> Result<Markup, RenderError> {
    let first_name = lookup(record, "first_name")
        .map(display)
        .filter(|name| !name.is_empty());

    let mut name = match first_name {
        Some(first_name) => first_name,
        None => {
            let id = lookup(record, "id").ok_or(RenderError::Anonymous)?;
            format!("Member #{}", display(id))
        }
    };

    if let Some(surname) = lookup(record, "surname").map(display).filter(|s| !s.is_empty()) {
        name.push(' ');
        name.push_str(&surname);
    }

    Ok(html! {
        div.signature name=(attrs.key_or_empty()) {
            "By submitting this form, you, " (name)
            ", agree to the above terms. This form will be time-stamped."
        }
    })
}

fn navigation(nav: &Navigation) -> Markup {
    let prev = nav.prev.as_deref().filter(|prev| !prev.is_empty());

    html! {
        div.entry {
            div {
                @if let Some(prev) = prev {
                    button.btn.wide.grey.nav type="button" data-target=(prev) { (nav.prev_label) }
                }
            }
            div {
                button.btn.wide.nav type="button" data-target=(nav.next) { (nav.next_label) }
            }
        }
    }
}

fn invalid(kind: &str) -> Markup {
    html! { h3.invalid { "Invalid Input: " (kind) } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "5d0c3c1e-0000-4000-8000-000000000001",
            "first_name": "Ada",
            "surname": "Lovelace",
            "email": "",
            "major": "Computer Science",
            "is_returning": true,
            "experience": 3,
            "discord": {"email": "ada@discord.example", "username": "ada"},
        })
    }

    #[test]
    fn test_lookup_follows_one_level() {
        let record = record();
        assert_eq!(lookup(&record, "discord.username"), Some(&json!("ada")));
        assert_eq!(lookup(&record, "discord.missing"), None);
        assert_eq!(lookup(&record, "ethics_form.pirate"), None);
        assert_eq!(lookup(&json!({"nid": null}), "nid"), None);
    }

    #[test]
    fn test_email_falls_back_to_identity_provider() {
        let html = render(&[json!({"input": "email", "key": "email"})], &record());
        assert!(html.contains(r#"value="ada@discord.example""#));
        assert!(html.contains(r#"type="email""#));
    }

    #[test]
    fn test_prefill_disabled_leaves_value_empty() {
        let html = render(
            &[json!({"input": "text", "key": "first_name", "prefill": false})],
            &record(),
        );
        assert!(html.contains(r#"value="""#));
        assert!(!html.contains("Ada"));
    }

    #[test]
    fn test_boolean_shown_as_yes_no() {
        let html = render(
            &[json!({"input": "radio", "key": "is_returning", "options": ["Yes", "No"]})],
            &record(),
        );
        assert!(html.contains(r#"value="Yes" checked"#));
        assert!(!html.contains(r#"value="No" checked"#));
    }

    #[test]
    fn test_checkbox_never_prefills_and_offers_other() {
        let html = render(
            &[json!({"input": "checkbox", "key": "major", "label": "Major", "options": ["Computer Science"]})],
            &record(),
        );
        assert!(!html.contains("checked"));
        assert!(html.contains(r#"value="_other""#));
        assert!(html.contains(r#"class="other_checkbox""#));
        assert!(html.contains(r#"placeholder="Major...""#));
    }

    #[test]
    fn test_dropdown_selects_current_value() {
        let html = render(
            &[json!({"input": "dropdown", "key": "major", "options": ["Computer Science", "IT"]})],
            &record(),
        );
        assert!(html.contains(r#"<option selected value="Computer Science">"#));
        assert!(!html.contains("other_dropdown"));
    }

    #[test]
    fn test_dropdown_other_restores_free_text() {
        let html = render(
            &[json!({"input": "dropdown", "key": "major", "options": ["IT"], "other": true})],
            &record(),
        );
        assert!(html.contains(r#"<option selected value="_other">"#));
        assert!(html.contains(r#"value="Computer Science""#));
        assert!(html.contains("other_dropdown"));
    }

    #[test]
    fn test_slider_renders_scale() {
        let html = render(&[json!({"input": "slider", "key": "experience"})], &record());
        assert!(html.contains("Novice"));
        assert!(html.contains("Expert"));
        assert!(html.contains(r#"value="3" checked"#));
        assert_eq!(html.matches(r#"type="radio""#).count(), 5);
    }

    #[test]
    fn test_signature_uses_name_or_member_number() {
        let schema = [json!({"input": "signature", "key": "ethics_form.signtime"})];

        let html = render(&schema, &record());
        assert!(html.contains("you, Ada Lovelace, agree"));

        let html = render(&schema, &json!({"id": "42", "first_name": ""}));
        assert!(html.contains("you, Member #42, agree"));

        let html = render(&schema, &json!({}));
        assert!(html.contains("Invalid Input: signature"));
    }

    #[test]
    fn test_navigation_without_prev() {
        let html = render(&[json!({"input": "navigation", "next": "/join/3"})], &record());
        assert!(html.contains("/join/3"));
        assert!(!html.contains("Back"));

        let html = render(
            &[json!({"input": "navigation", "prev": "/join/2", "next": "/join/4"})],
            &record(),
        );
        assert!(html.contains("Back"));
        assert!(html.contains(r#"data-target="/join/2""#));
    }

    #[test]
    fn test_navigation_target_is_attribute_escaped() {
        let html = render(
            &[json!({"input": "navigation", "next": r#"/join/3");alert("x"#})],
            &record(),
        );
        assert!(html.contains(r#"data-target="/join/3&quot;);alert(&quot;x""#));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn test_nested_failures_stay_local() {
        let html = render(
            &[json!({
                "input": "h1",
                "label": "About you",
                "elements": [
                    {"input": "radio", "key": "attending"},
                    {"input": "text", "key": "first_name", "label": "First name"}
                ]
            })],
            &record(),
        );
        assert!(html.starts_with("<h1>About you</h1>"));
        assert!(html.contains("Invalid Input: radio"));
        assert!(html.contains(r#"value="Ada""#));
    }

    #[test]
    fn test_node_without_discriminator() {
        let html = render(&[json!(42), json!({"label": "x"})], &record());
        assert_eq!(html.matches("Invalid Input: Malformed object").count(), 2);
    }

    #[test]
    fn test_values_are_escaped() {
        let html = render(
            &[json!({"input": "text", "key": "first_name"})],
            &json!({"first_name": "<script>'x'</script>"}),
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
