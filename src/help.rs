use crate::terminal::Terminal;
use crossterm::style::Color;

/// Draw a centered help box into the back buffer. Rendered on top of the
/// current frame every frame while open, so the animation keeps running
/// behind it.
pub fn render_help_overlay(term: &mut Terminal, width: u16, height: u16, help_text: &str) {
    if help_text.is_empty() {
        return;
    }

    let lines: Vec<&str> = help_text.lines().collect();
    let inner_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = inner_width + 4;
    let box_height = lines.len() + 2;

    let x0 = (width as usize).saturating_sub(box_width) as i32 / 2;
    let y0 = (height as usize).saturating_sub(box_height) as i32 / 2;

    let border = Some(Color::White);
    let text = Some(Color::Grey);

    draw_box(term, x0, y0, box_width, box_height, border);

    for (i, line) in lines.iter().enumerate() {
        let y = y0 + 1 + i as i32;
        // Blank the interior so the animation doesn't show through the text.
        for j in 0..inner_width + 2 {
            term.set(x0 + 1 + j as i32, y, ' ', None, false);
        }
        term.set_str(x0 + 2, y, line, text, false);
    }
}

fn draw_box(term: &mut Terminal, x0: i32, y0: i32, width: usize, height: usize, color: Option<Color>) {
    let x1 = x0 + width as i32 - 1;
    let y1 = y0 + height as i32 - 1;

    term.set(x0, y0, '┌', color, false);
    term.set(x1, y0, '┐', color, false);
    term.set(x0, y1, '└', color, false);
    term.set(x1, y1, '┘', color, false);
    for x in x0 + 1..x1 {
        term.set(x, y0, '─', color, false);
        term.set(x, y1, '─', color, false);
    }
    for y in y0 + 1..y1 {
        term.set(x0, y, '│', color, false);
        term.set(x1, y, '│', color, false);
    }
}
