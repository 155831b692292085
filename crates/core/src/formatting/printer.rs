use thiserror::Error;

use super::print_items::Condition;
use super::print_items::FitPredicate;
use super::print_items::PrintItem;
use super::print_items::PrintItems;
use super::print_items::Signal;
use super::writer::WriteItem;
use super::writer::Writer;
use super::writer::WriterOptions;

#[derive(Clone)]
pub struct PrinterOptions {
  /// The width the printer will attempt to keep lines under.
  pub max_width: u32,
  /// The number of columns an indentation level occupies.
  pub indent_width: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
  #[error("maxWidth must be greater than zero")]
  ZeroMaxWidth,
  #[error("indentWidth must be greater than zero")]
  ZeroIndentWidth,
  #[error("condition '{name}' has neither a true path nor a false path")]
  ConditionWithoutBranches { name: &'static str },
}

/// Whether a measured region fit on the line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
  /// Soft break points render inline.
  Flat,
  /// Soft break points render as newlines.
  Broken,
}

/// Turns a layout tree into a series of write items.
///
/// Every group is measured once against the remaining line width and then
/// printed in either flat or broken mode. Measurement looks ahead through
/// the pending tail of enclosing items up to the next line break
/// opportunity, so trailing text like a close paren counts against the
/// group's width.
pub fn print_items(items: &PrintItems, options: &PrinterOptions) -> Result<Vec<WriteItem>, LayoutError> {
  if options.max_width == 0 {
    return Err(LayoutError::ZeroMaxWidth);
  }
  if options.indent_width == 0 {
    return Err(LayoutError::ZeroIndentWidth);
  }
  let mut printer = Printer {
    writer: Writer::new(WriterOptions {
      indent_width: options.indent_width,
    }),
    max_width: options.max_width,
    indent_width: options.indent_width,
    tail_stack: Vec::new(),
  };
  printer.print_slice(&items.items, Mode::Broken)?;
  Ok(printer.writer.items())
}

enum TailMeasure {
  /// The item's width when the line continues past it.
  Width(u32),
  /// The width written before the line ends within the item.
  EndOfLine(u32),
}

struct Printer<'a> {
  writer: Writer,
  max_width: u32,
  indent_width: u8,
  /// Slices of not-yet-printed sibling items for each enclosing level,
  /// innermost last. Used for lookahead when measuring.
  tail_stack: Vec<&'a [PrintItem]>,
}

impl<'a> Printer<'a> {
  fn print_slice(&mut self, items: &'a [PrintItem], mode: Mode) -> Result<(), LayoutError> {
    for (index, item) in items.iter().enumerate() {
      let rest = &items[index + 1..];
      match item {
        PrintItem::Text(text) => self.writer.write(text.clone()),
        PrintItem::Signal(signal) => match signal {
          Signal::NewLine => self.writer.new_line(),
          Signal::ExpectNewLine => self.writer.expect_new_line(),
          Signal::Tab => self.writer.tab(),
          Signal::SpaceOrNewLine => match mode {
            Mode::Flat => self.writer.space(),
            Mode::Broken => self.writer.new_line(),
          },
          Signal::PossibleNewLine => match mode {
            Mode::Flat => {}
            Mode::Broken => self.writer.new_line(),
          },
        },
        PrintItem::Indent(inner) => {
          self.tail_stack.push(rest);
          self.writer.start_indent();
          let result = self.print_slice(&inner.items, mode);
          self.writer.finish_indent();
          self.tail_stack.pop();
          result?;
        }
        PrintItem::Group(group) => {
          self.tail_stack.push(rest);
          let group_mode = if self.fits(&group.items) { Mode::Flat } else { Mode::Broken };
          let result = self.print_slice(&group.items.items, group_mode);
          self.tail_stack.pop();
          result?;
        }
        PrintItem::Condition(condition) => {
          self.tail_stack.push(rest);
          let result = self.print_condition(condition, mode);
          self.tail_stack.pop();
          result?;
        }
      }
    }
    Ok(())
  }

  fn print_condition(&mut self, condition: &'a Condition, mode: Mode) -> Result<(), LayoutError> {
    if condition.true_path.is_none() && condition.false_path.is_none() {
      return Err(LayoutError::ConditionWithoutBranches { name: condition.name });
    }
    let is_true = match condition.predicate {
      FitPredicate::StartOfLine => self.writer.is_start_of_line(),
      FitPredicate::TruePathFits => match &condition.true_path {
        Some(true_path) => self.fits(true_path),
        None => true,
      },
    };
    let path = if is_true { &condition.true_path } else { &condition.false_path };
    if let Some(path) = path {
      // the chosen path keeps the enclosing mode; nested groups still
      // measure themselves
      self.print_slice(&path.items, mode)?;
    }
    Ok(())
  }

  /// Measures whether the items print flat within the remaining line
  /// width, counting the enclosing tail up to the next break opportunity.
  fn fits(&self, items: &PrintItems) -> bool {
    let Some(flat_width) = self.measure_flat(items) else {
      return false;
    };
    let tail_width = self.measure_tail();
    self.writer.column() + flat_width + tail_width <= self.max_width
  }

  /// The width of the items when printed on a single line, or `None`
  /// when they contain a hard newline and cannot print flat.
  fn measure_flat(&self, items: &PrintItems) -> Option<u32> {
    let mut width = 0;
    for item in items.iter() {
      match item {
        PrintItem::Text(text) => width += text.width,
        PrintItem::Signal(signal) => match signal {
          Signal::NewLine | Signal::ExpectNewLine => return None,
          Signal::SpaceOrNewLine => width += 1,
          Signal::PossibleNewLine => {}
          Signal::Tab => width += self.indent_width as u32,
        },
        PrintItem::Indent(inner) => width += self.measure_flat(inner)?,
        PrintItem::Group(group) => width += self.measure_flat(&group.items)?,
        PrintItem::Condition(condition) => {
          let path = condition.true_path.as_ref().or(condition.false_path.as_ref());
          if let Some(path) = path {
            width += self.measure_flat(path)?;
          }
        }
      }
    }
    Some(width)
  }

  fn measure_tail(&self) -> u32 {
    let mut width = 0;
    for slice in self.tail_stack.iter().rev() {
      for item in *slice {
        match self.measure_to_line_end(item) {
          TailMeasure::Width(item_width) => width += item_width,
          TailMeasure::EndOfLine(item_width) => return width + item_width,
        }
      }
    }
    width
  }

  fn measure_to_line_end(&self, item: &PrintItem) -> TailMeasure {
    match item {
      PrintItem::Text(text) => TailMeasure::Width(text.width),
      PrintItem::Signal(signal) => match signal {
        // any break opportunity ends the lookahead
        Signal::NewLine | Signal::ExpectNewLine | Signal::SpaceOrNewLine | Signal::PossibleNewLine => TailMeasure::EndOfLine(0),
        Signal::Tab => TailMeasure::Width(self.indent_width as u32),
      },
      PrintItem::Indent(inner) => self.measure_slice_to_line_end(&inner.items),
      PrintItem::Group(group) => self.measure_slice_to_line_end(&group.items.items),
      PrintItem::Condition(condition) => {
        let path = condition.true_path.as_ref().or(condition.false_path.as_ref());
        match path {
          Some(path) => self.measure_slice_to_line_end(&path.items),
          None => TailMeasure::Width(0),
        }
      }
    }
  }

  fn measure_slice_to_line_end(&self, items: &[PrintItem]) -> TailMeasure {
    let mut width = 0;
    for item in items {
      match self.measure_to_line_end(item) {
        TailMeasure::Width(item_width) => width += item_width,
        TailMeasure::EndOfLine(item_width) => return TailMeasure::EndOfLine(width + item_width),
      }
    }
    TailMeasure::Width(width)
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::super::print_items::Group;
  use super::super::print_write_items::print_write_items;
  use super::super::print_write_items::Indentation;
  use super::super::print_write_items::WriteItemsPrinter;
  use super::*;

  #[test]
  fn errors_on_zero_max_width() {
    let items = PrintItems::from("text");
    let result = print_items(
      &items,
      &PrinterOptions {
        max_width: 0,
        indent_width: 2,
      },
    );
    assert_eq!(result.err(), Some(LayoutError::ZeroMaxWidth));
  }

  #[test]
  fn errors_on_condition_without_branches() {
    let items = PrintItems::from(Condition::new("empty", FitPredicate::TruePathFits, None, None));
    let result = print_items(
      &items,
      &PrinterOptions {
        max_width: 40,
        indent_width: 2,
      },
    );
    assert_eq!(result.err(), Some(LayoutError::ConditionWithoutBranches { name: "empty" }));
  }

  #[test]
  fn group_that_fits_prints_flat() {
    let mut group_items = PrintItems::new();
    group_items.push_str("call(a,");
    group_items.push_signal(Signal::SpaceOrNewLine);
    group_items.push_str("b)");
    let items = PrintItems::from(Group::new("call", group_items));
    assert_eq!(print(items, 40), "call(a, b)");
  }

  #[test]
  fn group_that_exceeds_width_breaks() {
    let mut arg_items = PrintItems::new();
    arg_items.push_str("aaaaaaaaaa,");
    arg_items.push_signal(Signal::SpaceOrNewLine);
    arg_items.push_str("bbbbbbbbbb");
    let mut group_items = PrintItems::new();
    group_items.push_str("call(");
    group_items.push_indent({
      let mut inner = PrintItems::new();
      inner.push_signal(Signal::PossibleNewLine);
      inner.extend(arg_items);
      inner
    });
    group_items.push_signal(Signal::PossibleNewLine);
    group_items.push_str(")");
    let items = PrintItems::from(Group::new("call", group_items));
    assert_eq!(print(items, 15), "call(\n  aaaaaaaaaa,\n  bbbbbbbbbb\n)");
  }

  #[test]
  fn tail_text_counts_against_group_width() {
    // the group alone is 9 wide, but the trailing semicolon pushes it to 10
    let mut group_items = PrintItems::new();
    group_items.push_str("aaaa");
    group_items.push_signal(Signal::SpaceOrNewLine);
    group_items.push_str("bbbb");
    let mut items = PrintItems::new();
    items.push_group(Group::new("pair", group_items.clone()));
    items.push_str(";");
    assert_eq!(print(items, 9), "aaaa\nbbbb;");

    let mut items = PrintItems::new();
    items.push_group(Group::new("pair", group_items));
    items.push_str(";");
    assert_eq!(print(items, 10), "aaaa bbbb;");
  }

  #[test]
  fn token_wider_than_max_width_overflows_intact() {
    // an unbreakable token past the width goes out whole on its own line
    let wide = "a".repeat(50);
    let mut group_items = PrintItems::new();
    group_items.push_str("first,");
    group_items.push_signal(Signal::SpaceOrNewLine);
    group_items.push_string(wide.clone());
    let items = PrintItems::from(Group::new("pair", group_items));
    assert_eq!(print(items, 40), format!("first,\n{}", wide));
  }

  #[test]
  fn nested_group_breaks_while_outer_stays_together() {
    let mut inner_items = PrintItems::new();
    inner_items.push_str("inner(aaaa,");
    inner_items.push_signal(Signal::SpaceOrNewLine);
    inner_items.push_str("bbbb)");
    let mut outer_items = PrintItems::new();
    outer_items.push_str("outer(");
    outer_items.push_group(Group::new("inner", inner_items));
    outer_items.push_str(")");
    let items = PrintItems::from(Group::new("outer", outer_items));
    assert_eq!(print(items, 12), "outer(inner(aaaa,\nbbbb))");
  }

  #[test]
  fn true_path_fits_condition() {
    let mut items = PrintItems::new();
    items.push_str("start");
    items.push_condition(Condition::new(
      "spaceIfFits",
      FitPredicate::TruePathFits,
      Some({
        let mut true_path = PrintItems::new();
        true_path.push_signal(Signal::SpaceOrNewLine);
        true_path.push_str("word");
        PrintItems::from(Group::new("word", true_path))
      }),
      Some({
        let mut false_path = PrintItems::new();
        false_path.push_signal(Signal::NewLine);
        false_path.push_str("word");
        false_path
      }),
    ));
    assert_eq!(print(items.clone(), 10), "start word");
    assert_eq!(print(items, 8), "start\nword");
  }

  #[test]
  fn condition_branch_in_a_flat_group_prints_flat() {
    // the branch items are not wrapped in their own group, so they must
    // inherit the enclosing group's mode
    let mut group_items = PrintItems::new();
    group_items.push_str("aa");
    group_items.push_condition(Condition::new(
      "spaceIfFits",
      FitPredicate::TruePathFits,
      Some({
        let mut true_path = PrintItems::new();
        true_path.push_signal(Signal::SpaceOrNewLine);
        true_path.push_str("bb");
        true_path
      }),
      Some({
        let mut false_path = PrintItems::new();
        false_path.push_signal(Signal::NewLine);
        false_path.push_str("bb");
        false_path
      }),
    ));
    let items = PrintItems::from(Group::new("pair", group_items));
    assert_eq!(print(items.clone(), 40), "aa bb");
    assert_eq!(print(items, 4), "aa\nbb");
  }

  #[test]
  fn start_of_line_condition() {
    let mut items = PrintItems::new();
    items.push_condition(Condition::new(
      "marker",
      FitPredicate::StartOfLine,
      Some(PrintItems::from("start")),
      Some(PrintItems::from("middle")),
    ));
    items.push_str(" ");
    items.push_condition(Condition::new(
      "marker",
      FitPredicate::StartOfLine,
      Some(PrintItems::from("start")),
      Some(PrintItems::from("middle")),
    ));
    assert_eq!(print(items, 40), "start middle");
  }

  #[test]
  fn expect_new_line_collapses_with_following_new_line() {
    let mut items = PrintItems::new();
    items.push_str("text");
    items.push_signal(Signal::ExpectNewLine);
    items.push_signal(Signal::NewLine);
    items.push_str("after");
    assert_eq!(print(items, 40), "text\nafter");
  }

  fn print(items: PrintItems, max_width: u32) -> String {
    let write_items = print_items(
      &items,
      &PrinterOptions {
        max_width,
        indent_width: 2,
      },
    )
    .unwrap();
    print_write_items(
      write_items,
      WriteItemsPrinter {
        indent: Indentation::Spaces(2),
        newline: "\n",
      },
    )
  }
}
