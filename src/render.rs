use termimad::MadSkin;
use termimad::crossterm::style::Color;

/// Render an answer to the terminal as markdown
pub fn render_markdown(text: &str) {
    if text.trim().is_empty() {
        println!("(the model returned an empty answer)");
        return;
    }

    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Cyan);
    skin.print_text(text);
}
