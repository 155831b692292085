use super::writer::WriteItem;

#[derive(Clone, Copy)]
pub enum Indentation {
  Tabs,
  Spaces(u8),
}

#[derive(Clone, Copy)]
pub struct WriteItemsPrinter {
  pub indent: Indentation,
  pub newline: &'static str,
}

/// Renders write items to the final file text.
pub fn print_write_items(write_items: Vec<WriteItem>, printer: WriteItemsPrinter) -> String {
  let mut text = String::new();
  for item in write_items {
    match item {
      WriteItem::Indent(level) => match printer.indent {
        Indentation::Tabs => {
          for _ in 0..level {
            text.push('\t');
          }
        }
        Indentation::Spaces(width) => {
          for _ in 0..(level as usize * width as usize) {
            text.push(' ');
          }
        }
      },
      WriteItem::NewLine => text.push_str(printer.newline),
      WriteItem::Tab => text.push('\t'),
      WriteItem::Space => text.push(' '),
      WriteItem::String(container) => text.push_str(&container.text),
    }
  }
  text
}
