use std::rc::Rc;

use super::print_items::StringContainer;

/// An intermediate command emitted by the printer and rendered to text
/// by a `WriteItemsPrinter`.
#[derive(Clone)]
pub enum WriteItem {
  String(Rc<StringContainer>),
  Indent(u8),
  NewLine,
  Tab,
  Space,
}

#[derive(Clone)]
pub struct WriterOptions {
  pub indent_width: u8,
}

/// Accumulates write items while tracking the current line position.
pub struct Writer {
  items: Vec<WriteItem>,
  indent_width: u8,
  current_line_column: u32,
  indent_level: u8,
  expect_newline_next: bool,
}

impl Writer {
  pub fn new(options: WriterOptions) -> Writer {
    Writer {
      items: Vec::new(),
      indent_width: options.indent_width,
      current_line_column: 0,
      indent_level: 0,
      expect_newline_next: false,
    }
  }

  pub fn start_indent(&mut self) {
    self.indent_level += 1;
  }

  pub fn finish_indent(&mut self) {
    debug_assert!(self.indent_level > 0, "indent level should not go negative");
    self.indent_level -= 1;
  }

  pub fn space(&mut self) {
    if self.expect_newline_next {
      self.new_line();
    }
    self.handle_first_column();
    self.items.push(WriteItem::Space);
    self.current_line_column += 1;
  }

  pub fn tab(&mut self) {
    if self.expect_newline_next {
      self.new_line();
    }
    self.handle_first_column();
    self.items.push(WriteItem::Tab);
    self.current_line_column += self.indent_width as u32;
  }

  pub fn new_line(&mut self) {
    self.expect_newline_next = false;
    self.pop_trailing_space();
    self.items.push(WriteItem::NewLine);
    self.current_line_column = 0;
  }

  pub fn expect_new_line(&mut self) {
    self.expect_newline_next = true;
  }

  pub fn write(&mut self, text: Rc<StringContainer>) {
    if self.expect_newline_next {
      self.new_line();
    }
    self.handle_first_column();
    self.current_line_column += text.width;
    self.items.push(WriteItem::String(text));
  }

  /// The column the next character would be written at, counting
  /// pending indentation.
  pub fn column(&self) -> u32 {
    if self.current_line_column == 0 {
      self.indent_level as u32 * self.indent_width as u32
    } else {
      self.current_line_column
    }
  }

  pub fn is_start_of_line(&self) -> bool {
    self.current_line_column == 0
  }

  pub fn items(self) -> Vec<WriteItem> {
    self.items
  }

  fn handle_first_column(&mut self) {
    if self.current_line_column == 0 && self.indent_level > 0 {
      self.items.push(WriteItem::Indent(self.indent_level));
      self.current_line_column = self.indent_level as u32 * self.indent_width as u32;
    }
  }

  fn pop_trailing_space(&mut self) {
    while let Some(WriteItem::Space) = self.items.last() {
      self.items.pop();
      if self.current_line_column > 0 {
        self.current_line_column -= 1;
      }
    }
  }
}

#[cfg(test)]
mod test {
  use std::rc::Rc;

  use super::super::print_items::StringContainer;
  use super::super::print_write_items::print_write_items;
  use super::super::print_write_items::Indentation;
  use super::super::print_write_items::WriteItemsPrinter;
  use super::*;

  #[test]
  fn writes_text_with_indentation() {
    let mut writer = Writer::new(WriterOptions { indent_width: 2 });
    writer.write(text("text"));
    writer.start_indent();
    writer.new_line();
    writer.write(text("indented"));
    writer.finish_indent();
    assert_written(writer, "text\n  indented");
  }

  #[test]
  fn pops_trailing_space_on_new_line() {
    let mut writer = Writer::new(WriterOptions { indent_width: 2 });
    writer.write(text("text"));
    writer.space();
    writer.new_line();
    writer.write(text("after"));
    assert_written(writer, "text\nafter");
  }

  #[test]
  fn expect_new_line_defers_until_next_write() {
    let mut writer = Writer::new(WriterOptions { indent_width: 2 });
    writer.write(text("text"));
    writer.expect_new_line();
    writer.write(text("after"));
    assert_written(writer, "text\nafter");
  }

  #[test]
  fn column_counts_pending_indentation() {
    let mut writer = Writer::new(WriterOptions { indent_width: 4 });
    writer.start_indent();
    writer.start_indent();
    assert_eq!(writer.column(), 8);
    writer.write(text("ab"));
    assert_eq!(writer.column(), 10);
  }

  fn text(value: &str) -> Rc<StringContainer> {
    Rc::new(StringContainer::new(value.to_string()))
  }

  fn assert_written(writer: Writer, expected: &str) {
    let printer = WriteItemsPrinter {
      indent: Indentation::Spaces(2),
      newline: "\n",
    };
    assert_eq!(print_write_items(writer.items(), printer), expected);
  }
}
