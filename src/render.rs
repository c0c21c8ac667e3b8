//! HTML page and plain-text report.

use crate::assessment::{Assessment, RiskCategory, Severity};
use crate::features::{inputs, Input, RawFeatures, Widget};

pub const TITLE: &str = "Heart Disease Risk Predictor";

/// What to show under the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Assessed(Assessment),
    Rejected(String),
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; background: #fafafa; }
aside { width: 18rem; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 1.5rem 3rem; }
.columns { display: flex; gap: 3rem; }
.columns section { flex: 1; }
label { display: block; margin-top: 1rem; font-weight: 600; }
label small { font-weight: normal; color: #888; }
input[type=range], select { width: 100%; }
button { width: 100%; margin-top: 2rem; padding: 0.8rem; font-size: 1.1rem; color: #fff;
         background: #FF4B4B; border: none; border-radius: 0.5rem; cursor: pointer; }
.result { width: 60%; margin: 2rem auto; }
progress { width: 100%; height: 1.2rem; }
.alert { padding: 1rem; border-radius: 0.5rem; margin-top: 1rem; }
.alert.error { background: #ffe0e0; color: #7d1414; }
.alert.warning { background: #fff3cd; color: #7a5a00; }
.alert.success { background: #ddf5e3; color: #17612d; }
"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_value(value: f64, step: f64) -> String {
    if step < 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

fn render_input(input: &Input, values: &RawFeatures) -> String {
    let current = values.get(input.name).unwrap_or_default();
    let mut html = format!("<label for=\"{0}\">{1}", input.name, input.label);
    if let Some(help) = input.help {
        html.push_str(&format!(" <small title=\"{help}\">(?)</small>"));
    }
    html.push_str("</label>\n");

    match &input.widget {
        Widget::Slider(bounds) => {
            let value = format_value(current.clamp(bounds.min, bounds.max), bounds.step);
            html.push_str(&format!(
                "<input type=\"range\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" \
                 step=\"{step}\" value=\"{value}\" \
                 oninput=\"this.nextElementSibling.value=this.value\">\
                 <output>{value}</output>\n",
                name = input.name,
                min = format_value(bounds.min, bounds.step),
                max = format_value(bounds.max, bounds.step),
                step = bounds.step,
            ));
        }
        Widget::Select(options) => {
            html.push_str(&format!("<select id=\"{0}\" name=\"{0}\">\n", input.name));
            for (code, label) in options {
                let selected = if *code as f64 == current { " selected" } else { "" };
                html.push_str(&format!(
                    "  <option value=\"{code}\"{selected}>{label}</option>\n"
                ));
            }
            html.push_str("</select>\n");
        }
    }
    html
}

fn render_sidebar() -> String {
    r#"<aside>
<img src="https://img.icons8.com/emoji/100/000000/red-heart.png" alt="">
<h2>📋 Feature Ranges (from dataset)</h2>
<ul>
  <li><strong>Age</strong>: 29–77 years</li>
  <li><strong>Cholesterol</strong>: 126–564 mg/dl</li>
  <li><strong>Max Heart Rate</strong>: 71–202 bpm</li>
  <li><strong>Resting BP</strong>: 94–200 mm Hg</li>
  <li><strong>ST Depression</strong>: 0.0–6.2</li>
</ul>
<p><small>Model: RandomForestClassifier | Accuracy ~83-85%</small></p>
</aside>
"#
    .to_string()
}

fn render_form(values: &RawFeatures) -> String {
    let inputs = inputs();
    // first five inputs are personal details and symptoms
    let (personal, clinical) = inputs.split_at(5);

    let mut html = String::from("<form method=\"post\" action=\"/predict\">\n<div class=\"columns\">\n");
    for (heading, group) in [
        ("👤 Personal &amp; Symptoms", personal),
        ("🩺 Clinical Measurements", clinical),
    ] {
        html.push_str(&format!("<section>\n<h3>{heading}</h3>\n"));
        for input in group {
            html.push_str(&render_input(input, values));
        }
        html.push_str("</section>\n");
    }
    html.push_str("</div>\n<button type=\"submit\">🔬 Predict Risk</button>\n</form>\n");
    html
}

pub fn render_assessment(assessment: &Assessment) -> String {
    let (icon, color) = match assessment.category {
        RiskCategory::High => ("⚠️", "#FF4444"),
        RiskCategory::Low => ("✅", "#44FF44"),
    };
    let (kind, badge) = match assessment.severity {
        Severity::VeryHigh => ("error", "🚨"),
        Severity::Moderate => ("warning", "🟠"),
        Severity::Low => ("success", "🟢"),
    };
    format!(
        "<div class=\"result\">\n\
         <h2 style=\"text-align: center; color: {color};\">{icon} {headline}</h2>\n\
         <p style=\"text-align: center; font-size: 1.4rem;\">{explanation}</p>\n\
         <h3 style=\"text-align: center;\">Risk Probability: {percent}</h3>\n\
         <progress value=\"{probability:.4}\" max=\"1\"></progress>\n\
         <div class=\"alert {kind}\">{badge} {message}</div>\n\
         </div>\n",
        headline = assessment.category.headline(),
        explanation = assessment.category.explanation(),
        percent = assessment.percent(),
        probability = assessment.probability,
        message = assessment.severity.message(),
    )
}

/// Full page: header, sidebar, form pre-filled with `values`, optional outcome, footer.
pub fn render_page(values: &RawFeatures, outcome: Option<&Outcome>) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );
    html.push_str(&render_sidebar());
    html.push_str(&format!(
        "<main>\n<h1 style=\"text-align: center; color: #FF4B4B;\">🫀 {TITLE}</h1>\n\
         <p style=\"text-align: center; font-size: 1.2rem; color: #666;\">\n\
         AI-powered prediction using Random Forest on UCI Heart Disease Dataset<br>\n\
         <strong style=\"color: #FF6B6B;\">⚠️ For educational purposes only — not a substitute for medical advice!</strong>\n\
         </p>\n<hr style=\"border-color: #444;\">\n"
    ));
    html.push_str(&render_form(values));

    match outcome {
        Some(Outcome::Assessed(assessment)) => html.push_str(&render_assessment(assessment)),
        Some(Outcome::Rejected(reason)) => html.push_str(&format!(
            "<div class=\"result\"><div class=\"alert error\">{}</div></div>\n",
            escape(reason)
        )),
        None => {}
    }

    html.push_str(
        "<hr>\n<p style=\"text-align: center; color: #888; font-size: 0.9rem;\">\n\
         Built with ❤️ in Rust • Model: Random Forest • Dataset: UCI Heart Disease\n\
         </p>\n</main>\n</body>\n</html>\n",
    );
    html
}

/// Terminal rendition of one assessment.
pub fn render_text(assessment: &Assessment) -> String {
    let bar_width = 30;
    let filled = (assessment.probability * bar_width as f64).round() as usize;
    format!(
        "{headline}\n{explanation}\nRisk Probability: {percent}\n[{bar}{rest}]\n{message}\n",
        headline = assessment.category.headline(),
        explanation = assessment.category.explanation(),
        percent = assessment.percent(),
        bar = "#".repeat(filled.min(bar_width)),
        rest = "-".repeat(bar_width - filled.min(bar_width)),
        message = assessment.severity.message(),
    )
}
