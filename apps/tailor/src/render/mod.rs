// Document rendering: resume content → Awesome-CV LaTeX sections.
// Plain template fill; the only logic is character escaping.

pub mod latex;

pub use latex::render_sections;
