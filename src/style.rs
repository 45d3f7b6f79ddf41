//! Colors and markdown rendering for CLI output.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

/// Print a warning message to stderr
pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

/// Print a success message to stdout
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a hint message to stderr (dimmed)
pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".dimmed(), msg.dimmed());
}

/// Format a path for display (bright white)
pub fn path(p: &std::path::Path) -> String {
    p.display().to_string().bright_white().to_string()
}

/// Format a label-value pair for metrics display
pub fn metric(label: &str, value: impl std::fmt::Display) -> String {
    format!("  {}: {}", label.dimmed(), value.to_string().cyan())
}

/// Format a section header (for summaries, etc.)
pub fn section(title: &str) {
    println!("\n{}", title.bold());
}

/// Render markdown to the terminal with colors and formatting.
/// If not a TTY, writes plain markdown.
pub fn render_markdown(markdown: &str, output: &mut dyn Write) -> io::Result<()> {
    if io::stdout().is_terminal() {
        let skin = create_skin();
        let rendered = skin.term_text(markdown);
        write!(output, "{}", rendered)
    } else {
        write!(output, "{}", markdown)
    }
}

/// Skin for coverage and diff reports. Table borders stay dim so the
/// symbol columns read first.
fn create_skin() -> termimad::MadSkin {
    use termimad::*;

    let mut skin = MadSkin::default();

    skin.set_headers_fg(crossterm::style::Color::Cyan);

    // Bullet points
    skin.bullet = StyledChar::from_fg_char(crossterm::style::Color::Blue, '•');

    skin.code_block.set_fg(crossterm::style::Color::Yellow);

    // Inline code
    skin.inline_code.set_fg(crossterm::style::Color::Yellow);

    // Bold text
    skin.bold.set_fg(crossterm::style::Color::White);

    skin.table.set_fg(crossterm::style::Color::DarkGrey);

    skin.horizontal_rule = StyledChar::from_fg_char(crossterm::style::Color::DarkGrey, '─');

    skin
}
