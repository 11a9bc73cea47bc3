use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyCode, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// A single cell in the terminal buffer
#[derive(Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

impl Cell {
    /// Never matches a drawable cell, forcing a repaint on the next present.
    fn invalid() -> Self {
        Self {
            ch: '\0',
            fg: None,
            bold: false,
        }
    }
}

/// Double-buffered terminal renderer. `set` writes into the back buffer;
/// `present` flushes only the cells that changed since the last present.
pub struct Terminal {
    width: u16,
    height: u16,
    back: Vec<Cell>,
    front: Vec<Cell>,
    alternate_screen: bool,
}

impl Terminal {
    /// Initialize on the real terminal, entering raw mode and the alternate
    /// screen when requested.
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        Ok(Self::with_size(width, height, alternate_screen))
    }

    /// Off-screen buffer with no terminal side effects, for print mode and
    /// tests.
    pub fn headless(width: u16, height: u16) -> Self {
        Self::with_size(width, height, false)
    }

    fn with_size(width: u16, height: u16, alternate_screen: bool) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            back: vec![Cell::default(); len],
            front: vec![Cell::invalid(); len],
            alternate_screen,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Adopt new terminal dimensions. Both buffers restart empty and the
    /// next present repaints everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        let len = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.back = vec![Cell::default(); len];
        self.front = vec![Cell::invalid(); len];
    }

    /// Clear the back buffer
    pub fn clear(&mut self) {
        for cell in &mut self.back {
            *cell = Cell::default();
        }
    }

    /// Clear the actual terminal
    pub fn clear_screen(&mut self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        for cell in &mut self.front {
            *cell = Cell::invalid();
        }
        Ok(())
    }

    /// Set a character at position with optional color
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.back[y as usize * self.width as usize + x as usize] = Cell { ch, fg, bold };
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    /// Flush changed cells to the terminal.
    pub fn present(&mut self) -> io::Result<()> {
        let mut out = stdout();

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y as usize * self.width as usize + x as usize;
                if self.back[idx] == self.front[idx] {
                    continue;
                }
                let cell = self.back[idx].clone();

                queue!(out, MoveTo(x, y))?;
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Bold))?;
                }
                match cell.fg {
                    Some(color) => queue!(out, SetForegroundColor(color), Print(cell.ch))?,
                    None => queue!(out, ResetColor, Print(cell.ch))?,
                }
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                }

                self.front[idx] = cell;
            }
        }

        queue!(out, ResetColor)?;
        out.flush()
    }

    /// Check for keypress (non-blocking), returns (code, modifiers)
    pub fn check_key(&self) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        if poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = read()? {
                return Ok(Some((key_event.code, key_event.modifiers)));
            }
        }
        Ok(None)
    }

    /// Sleep for specified duration
    pub fn sleep(&self, seconds: f32) {
        std::thread::sleep(Duration::from_secs_f32(seconds));
    }

    /// Print the back buffer to stdout with ANSI colors (for print mode)
    pub fn print_to_stdout(&self) {
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let cell = &self.back[y * self.width as usize + x];
                if cell.ch == ' ' || cell.ch == '\0' {
                    print!(" ");
                    continue;
                }

                if cell.bold {
                    print!("\x1b[1m");
                }
                match cell.fg {
                    Some(Color::Rgb { r, g, b }) => print!("\x1b[38;2;{};{};{}m", r, g, b),
                    Some(Color::AnsiValue(v)) => print!("\x1b[38;5;{}m", v),
                    _ => {}
                }
                print!("{}\x1b[0m", cell.ch);
            }
            println!();
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_bounds_checked() {
        let mut term = Terminal::headless(10, 5);
        term.set(-1, 0, 'x', None, false);
        term.set(0, -1, 'x', None, false);
        term.set(10, 0, 'x', None, false);
        term.set(0, 5, 'x', None, false);
        assert!(term.back.iter().all(|c| c.ch == ' '));

        term.set(9, 4, 'x', None, false);
        assert_eq!(term.back[4 * 10 + 9].ch, 'x');
    }

    #[test]
    fn set_str_writes_consecutive_cells() {
        let mut term = Terminal::headless(10, 2);
        term.set_str(7, 1, "abcde", None, false);
        assert_eq!(term.back[1 * 10 + 7].ch, 'a');
        assert_eq!(term.back[1 * 10 + 9].ch, 'c');
        // 'd' and 'e' fall off the edge.
    }

    #[test]
    fn resize_reallocates_and_invalidates() {
        let mut term = Terminal::headless(10, 5);
        term.set(0, 0, 'x', None, false);
        term.resize(20, 3);
        assert_eq!(term.size(), (20, 3));
        assert_eq!(term.back.len(), 60);
        assert!(term.back.iter().all(|c| c.ch == ' '));
        assert!(term.front.iter().all(|c| c.ch == '\0'));
    }

    #[test]
    fn clear_resets_back_buffer_only() {
        let mut term = Terminal::headless(4, 4);
        term.set(1, 1, 'x', None, true);
        term.clear();
        assert!(term.back.iter().all(|c| *c == Cell::default()));
    }
}
