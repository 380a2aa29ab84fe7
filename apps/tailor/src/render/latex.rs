//! Awesome-CV section rendering.
//!
//! Produces the Summary, Skills, Experience and Projects sections that the main
//! document `\input`s. Sections are emitted only when they have content.

use crate::models::resume::{Entry, ResumeRecord, SkillGroup};

/// Escapes LaTeX special characters in plain text.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str(r"\textbackslash "),
            '&' => escaped.push_str(r"\&"),
            '%' => escaped.push_str(r"\%"),
            '#' => escaped.push_str(r"\#"),
            '_' => escaped.push_str(r"\_"),
            '{' => escaped.push_str(r"\{"),
            '}' => escaped.push_str(r"\}"),
            '$' => escaped.push_str(r"\$"),
            '~' => escaped.push_str(r"\textasciitilde "),
            '^' => escaped.push_str(r"\textasciicircum "),
            other => escaped.push(other),
        }
    }
    escaped
}

fn banner(title: &str) -> String {
    format!(
        "%--------------------------------------------------\n\
         % {title}\n\
         %--------------------------------------------------\n"
    )
}

pub fn render_summary(summary: &str) -> String {
    format!(
        "{}\\cvsection{{Summary}}\n\n\\begin{{cvparagraph}}\n{}\n\\end{{cvparagraph}}\n",
        banner("Summary"),
        escape_latex(summary.trim())
    )
}

pub fn render_skills(skills: &[SkillGroup]) -> String {
    let mut out = banner("Skills (condensed, Awesome-CV style)");
    out.push_str("\\cvsection{Skills}\n\n\\begin{cvskills}\n");
    for skill in skills {
        out.push_str(&format!(
            "\\cvskill{{{}}}{{{}}}\n",
            escape_latex(&skill.category),
            escape_latex(&skill.items.joined())
        ));
    }
    out.push_str("\\end{cvskills}\n");
    out
}

/// One `\cventry`: position, organization, date, location, then the bullet list.
pub fn render_entry(entry: &Entry) -> String {
    let position = if entry.raw_position {
        entry.position.clone()
    } else {
        escape_latex(&entry.position)
    };
    let items = entry
        .bullets
        .iter()
        .map(|b| format!("\\item {}", escape_latex(b)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\\cventry\n{{{position}}}\n{{{}}}\n{{{}}}\n{{{}}}\n{{\n\\begin{{cvitems}}\n{items}\n\\end{{cvitems}}\n}}\n",
        escape_latex(&entry.organization),
        escape_latex(&entry.date),
        escape_latex(&entry.location),
    )
}

fn render_entries(title: &str, entries: &[Entry]) -> String {
    let mut parts = vec![format!("{}\\cvsection{{{title}}}\n", banner(title))];
    parts.extend(entries.iter().map(render_entry));
    parts.join("\n")
}

pub fn render_experience(experience: &[Entry]) -> String {
    render_entries("Experience", experience)
}

pub fn render_projects(projects: &[Entry]) -> String {
    render_entries("Projects", projects)
}

/// Renders every non-empty section in document order.
pub fn render_sections(record: &ResumeRecord) -> String {
    let mut sections = Vec::new();
    if !record.summary.trim().is_empty() {
        sections.push(render_summary(&record.summary));
    }
    if !record.skills.is_empty() {
        sections.push(render_skills(&record.skills));
    }
    if !record.experience.is_empty() {
        sections.push(render_experience(&record.experience));
    }
    if !record.projects.is_empty() {
        sections.push(render_projects(&record.projects));
    }
    sections.join("\n")
}
