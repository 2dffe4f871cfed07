use std::fmt::Write as _;

use serde::Serialize;

use super::domain::{FormField, FormSelection, PredictionResult};
use super::form::RequestState;

pub const PAGE_TITLE: &str = "Salary Predictor";
pub const PAGE_DESCRIPTION: &str = "Enter your details to predict your salary in USD";

const SUBMIT_LABEL: &str = "Predict Salary";
const SUBMIT_LABEL_LOADING: &str = "Calculating...";

/// Everything the page shows, derived from form state alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    pub submit: SubmitControl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_panel: Option<ResultPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub field: FormField,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub selected: &'static str,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitControl {
    pub label: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPanel {
    pub salary: String,
    pub confidence: String,
}

pub fn render(
    selection: &FormSelection,
    state: &RequestState,
    result: Option<&PredictionResult>,
) -> FormView {
    let fields = FormField::ALL
        .into_iter()
        .map(|field| FieldView {
            field,
            label: field.label(),
            placeholder: field.placeholder(),
            selected: selection.value(field),
            options: field
                .options()
                .into_iter()
                .map(|(value, label)| OptionView { value, label })
                .collect(),
        })
        .collect();

    let loading = state.is_loading();
    let submit = SubmitControl {
        label: if loading {
            SUBMIT_LABEL_LOADING
        } else {
            SUBMIT_LABEL
        },
        disabled: loading || !selection.is_complete(),
    };

    FormView {
        fields,
        submit,
        error_banner: state.error_message().map(str::to_string),
        result_panel: result.map(|result| ResultPanel {
            salary: format_salary(result.salary_usd),
            confidence: format_confidence(result.confidence),
        }),
    }
}

/// `125000.4` -> `$125,000`.
pub fn format_salary(salary_usd: f64) -> String {
    let rounded = format!("{:.0}", salary_usd.round());
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) if digits.chars().any(|c| c != '0') => ("-", digits),
        Some(digits) => ("", digits),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${sign}{grouped}")
}

/// `0.87` -> `87.0%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

impl FormView {
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        writeln!(html, "<title>{PAGE_TITLE}</title>").expect("write title");
        html.push_str("</head>\n<body>\n<main class=\"card\">\n");
        writeln!(html, "<h1>{PAGE_TITLE}</h1>\n<p>{PAGE_DESCRIPTION}</p>").expect("write header");

        html.push_str("<form method=\"post\" action=\"/form/selection\">\n");
        for field in &self.fields {
            let key = field.field.key();
            writeln!(
                html,
                "<label for=\"{key}\">{}</label>\n<select id=\"{key}\" name=\"{key}\">",
                field.label
            )
            .expect("write select");
            writeln!(
                html,
                "<option value=\"\"{}>{}</option>",
                selected_attr(field.selected.is_empty()),
                field.placeholder
            )
            .expect("write placeholder");
            for option in &field.options {
                writeln!(
                    html,
                    "<option value=\"{}\"{}>{}</option>",
                    escape_html(option.value),
                    selected_attr(field.selected == option.value),
                    escape_html(option.label)
                )
                .expect("write option");
            }
            html.push_str("</select>\n");
        }
        html.push_str("<button type=\"submit\">Apply</button>\n</form>\n");

        writeln!(
            html,
            "<form method=\"post\" action=\"/form/submit\">\n<button type=\"submit\"{}>{}</button>\n</form>",
            if self.submit.disabled { " disabled" } else { "" },
            self.submit.label
        )
        .expect("write submit");

        if let Some(message) = &self.error_banner {
            writeln!(
                html,
                "<div class=\"alert\" role=\"alert\">{}</div>",
                escape_html(message)
            )
            .expect("write error banner");
        }

        if let Some(panel) = &self.result_panel {
            writeln!(
                html,
                "<section class=\"result\">\n<h3>Predicted Salary</h3>\n<p class=\"salary\">{}</p>\n<p class=\"confidence\">Confidence: {}</p>\n</section>",
                panel.salary, panel.confidence
            )
            .expect("write result panel");
        }

        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        writeln!(text, "{PAGE_TITLE}").expect("write title");
        for field in &self.fields {
            let shown = field
                .options
                .iter()
                .find(|option| option.value == field.selected)
                .map_or("(not selected)", |option| option.label);
            writeln!(text, "- {}: {}", field.label, shown).expect("write field");
        }
        if let Some(message) = &self.error_banner {
            writeln!(text, "\nError: {message}").expect("write error");
        }
        if let Some(panel) = &self.result_panel {
            writeln!(
                text,
                "\nPredicted Salary: {}\nConfidence: {}",
                panel.salary, panel.confidence
            )
            .expect("write result");
        }
        text
    }
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_selection() -> FormSelection {
        let mut selection = FormSelection::default();
        selection.set(FormField::ExperienceLevel, "SE").expect("valid");
        selection.set(FormField::CompanySize, "L").expect("valid");
        selection.set(FormField::EmploymentType, "FT").expect("valid");
        selection.set(FormField::JobTitle, "Data Scientist").expect("valid");
        selection
    }

    #[test]
    fn salary_and_confidence_formatting() {
        assert_eq!(format_salary(125_000.0), "$125,000");
        assert_eq!(format_salary(999.5), "$1,000");
        assert_eq!(format_salary(1_234_567.49), "$1,234,567");
        assert_eq!(format_salary(0.2), "$0");
        assert_eq!(format_salary(-1500.0), "$-1,500");
        assert_eq!(format_confidence(0.87), "87.0%");
        assert_eq!(format_confidence(1.0), "100.0%");
        assert_eq!(format_confidence(0.1234), "12.3%");
    }

    #[test]
    fn submit_disabled_iff_incomplete_or_loading() {
        let mut selection = FormSelection::default();
        assert!(render(&selection, &RequestState::Idle, None).submit.disabled);

        for field in FormField::ALL {
            selection = complete_selection();
            selection.set(field, "").expect("reset allowed");
            let view = render(&selection, &RequestState::Idle, None);
            assert!(view.submit.disabled, "{field} missing should disable submit");
        }

        let selection = complete_selection();
        let idle = render(&selection, &RequestState::Idle, None);
        assert!(!idle.submit.disabled);
        assert_eq!(idle.submit.label, "Predict Salary");

        let loading = render(&selection, &RequestState::Loading, None);
        assert!(loading.submit.disabled);
        assert_eq!(loading.submit.label, "Calculating...");
    }

    #[test]
    fn result_panel_and_error_banner_are_independent() {
        let selection = complete_selection();
        let result = PredictionResult {
            salary_usd: 125_000.0,
            confidence: 0.87,
        };
        let state = RequestState::Error("model unavailable".to_string());
        let view = render(&selection, &state, Some(&result));

        assert_eq!(view.error_banner.as_deref(), Some("model unavailable"));
        let panel = view.result_panel.expect("stale result still shown");
        assert_eq!(panel.salary, "$125,000");
        assert_eq!(panel.confidence, "87.0%");
    }

    #[test]
    fn html_escapes_error_and_marks_selection() {
        let selection = complete_selection();
        let state = RequestState::Error("<script>alert(1)</script>".to_string());
        let html = render(&selection, &state, None).to_html();

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<option value=\"Data Scientist\" selected>Data Scientist</option>"));
        assert!(html.contains("<button type=\"submit\">Predict Salary</button>"));
        assert!(!html.contains("Predicted Salary"));
    }

    #[test]
    fn text_rendering_lists_choices_and_result() {
        let selection = complete_selection();
        let result = PredictionResult {
            salary_usd: 150_250.0,
            confidence: 0.912,
        };
        let text = render(&selection, &RequestState::Idle, Some(&result)).to_text();
        assert!(text.contains("- Experience Level: Senior"));
        assert!(text.contains("- Company Size: Large"));
        assert!(text.contains("Predicted Salary: $150,250"));
        assert!(text.contains("Confidence: 91.2%"));
    }
}
