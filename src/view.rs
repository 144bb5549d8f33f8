//! Vista HTML de la sesión, servida como recurso de interfaz.
//!
//! El SVG viene del motor y se inserta tal cual; todo texto de usuario
//! (notaciones, avisos) se escapa.
use std::fmt::Write;

use chem_core::{Advisory, ComparisonSession, Role, EXAMPLES, EXAMPLE_PAIRS};
use chem_domain::StructureRecord;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Similitud con tres decimales, como se muestra en la interfaz.
pub fn format_score(score: f64) -> String {
    format!("{score:.3}")
}

pub fn render_html(session: &ComparisonSession, engine_ready: bool) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"es\">\n<head><meta charset=\"utf-8\"><title>chemview</title></head>\n<body>\n");
    let _ = writeln!(html, "<main data-state=\"{}\">", session.state());

    if !engine_ready {
        html.push_str("<p class=\"status\">Cargando motor químico…</p>\n");
    }
    // Cada aviso va al panel de su rol; sin rol o con el panel oculto, arriba.
    let advisory = session.advisory();
    let panel_role = advisory.and_then(Advisory::role)
                             .filter(|role| *role == Role::Reference || session.state().comparison_mode());
    if let (Some(advisory), None) = (advisory, panel_role) {
        render_advisory(&mut html, advisory);
    }
    let advisory_for = |role: Role| advisory.filter(|_| panel_role == Some(role));

    render_panel(&mut html, Role::Reference, session.reference(), advisory_for(Role::Reference));
    if session.state().comparison_mode() {
        render_panel(&mut html, Role::Comparison, session.comparison(), advisory_for(Role::Comparison));
        match session.similarity() {
            Some(sim) => {
                let _ = writeln!(html,
                                 "<section class=\"similarity\"><h2>Similitud de Tanimoto</h2><p><strong>{}</strong> ({})</p></section>",
                                 format_score(sim.score),
                                 escape_html(&sim.kind.to_string()));
            }
            None => {
                let _ = writeln!(html,
                                 "<section class=\"similarity\"><p>Fingerprint: {}</p></section>",
                                 escape_html(&session.fingerprint_kind().to_string()));
            }
        }
    }

    render_examples(&mut html);
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_advisory(html: &mut String, advisory: &Advisory) {
    let _ = writeln!(html, "<p class=\"advisory\" role=\"alert\">{}</p>", escape_html(&advisory.to_string()));
}

fn render_panel(html: &mut String, role: Role, record: Option<&StructureRecord>, advisory: Option<&Advisory>) {
    let _ = writeln!(html, "<section class=\"structure\" data-role=\"{role}\">");
    if let Some(advisory) = advisory {
        render_advisory(html, advisory);
    }
    let Some(record) = record else {
        html.push_str("<p class=\"empty\">Sin estructura</p>\n</section>\n");
        return;
    };
    let _ = writeln!(html, "<div class=\"depiction\">{}</div>", record.svg());
    let _ = writeln!(html, "<p class=\"smiles\"><code>{}</code></p>", escape_html(record.canonical_smiles()));
    if !record.descriptors().is_empty() {
        html.push_str("<table class=\"descriptors\">\n");
        for (descriptor, value) in record.descriptors().iter() {
            let _ = writeln!(html, "<tr><th>{}</th><td>{}</td></tr>", descriptor.label(), escape_html(value));
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");
}

fn render_examples(html: &mut String) {
    html.push_str("<nav class=\"examples\">\n<ul>\n");
    for example in EXAMPLES {
        let _ = writeln!(html, "<li data-smiles=\"{}\">{}</li>", escape_html(example.smiles), escape_html(example.name));
    }
    html.push_str("</ul>\n<ul class=\"pairs\">\n");
    for pair in EXAMPLE_PAIRS {
        let _ = writeln!(html,
                         "<li data-reference=\"{}\" data-comparison=\"{}\">{} <small>{}</small></li>",
                         escape_html(pair.reference),
                         escape_html(pair.comparison),
                         escape_html(pair.name),
                         escape_html(pair.expected));
    }
    html.push_str("</ul>\n</nav>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_core::{ComparisonController, ControllerOptions};
    use chemengine::MockEngine;
    use std::sync::Arc;

    fn controller() -> ComparisonController {
        ComparisonController::with_engine(Arc::new(MockEngine::new()), ControllerOptions::default())
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn idle_session_while_loading() {
        let c = ComparisonController::new(ControllerOptions::default());
        let html = render_html(c.session(), false);
        assert!(html.contains("Cargando motor"));
        assert!(html.contains("Sin estructura"));
        assert!(html.contains("data-state=\"idle\""));
    }

    #[test]
    fn invalid_notation_is_escaped() {
        let mut c = controller();
        c.submit_reference("<script>").unwrap_err();
        let html = render_html(c.session(), true);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn both_rendered_shows_score() {
        let mut c = controller();
        c.load_example_pair(0).unwrap();
        let html = render_html(c.session(), true);
        let score = format_score(c.session().similarity().unwrap().score);
        assert!(html.contains(&format!("<strong>{score}</strong>")));
        assert_eq!(html.matches("class=\"depiction\"").count(), 2);
    }

    /// Sección del panel de `role`, hasta su cierre.
    fn panel<'h>(html: &'h str, role: Role) -> &'h str {
        let start = html.find(&format!("data-role=\"{role}\"")).expect("panel presente");
        let end = html[start..].find("</section>").expect("panel cerrado");
        &html[start..start + end]
    }

    #[test]
    fn advisory_goes_to_its_panel() {
        let mut c = controller();
        c.submit_reference("CCO").unwrap();
        c.open_comparison().unwrap();
        c.submit_comparison("C1CC").unwrap_err();
        let html = render_html(c.session(), true);
        assert_eq!(html.matches("class=\"advisory\"").count(), 1);
        assert!(panel(&html, Role::Comparison).contains("class=\"advisory\""));
        assert!(!panel(&html, Role::Reference).contains("class=\"advisory\""));

        c.submit_reference("((").unwrap_err();
        let html = render_html(c.session(), true);
        assert!(panel(&html, Role::Reference).contains("class=\"advisory\""));
    }

    #[test]
    fn hidden_panel_advisory_is_global() {
        let mut c = controller();
        c.submit_reference("CCO").unwrap();
        assert_eq!(c.submit_comparison("CCN"), Err(Advisory::ComparisonClosed));
        let html = render_html(c.session(), true);
        assert!(!html.contains(&format!("data-role=\"{}\"", Role::Comparison)));
        let global = html.find("class=\"advisory\"").expect("aviso visible");
        assert!(global < html.find("data-role").unwrap());
        assert_eq!(html.matches("class=\"advisory\"").count(), 1);
    }

    #[test]
    fn score_has_three_decimals() {
        assert_eq!(format_score(0.5), "0.500");
        assert_eq!(format_score(1.0), "1.000");
    }
}
