use super::print_items::Condition;
use super::print_items::FitPredicate;
use super::print_items::Group;
use super::print_items::PrintItems;
use super::print_items::Signal;

pub fn with_indent(items: PrintItems) -> PrintItems {
  let mut new_items = PrintItems::new();
  new_items.push_indent(items);
  new_items
}

/// Wraps the items in a group so they either print on one line or break
/// at their soft break points together.
pub fn new_line_group(name: &'static str, items: PrintItems) -> PrintItems {
  PrintItems::from(Group::new(name, items))
}

/// Prints the true path when it fits on the remaining line width and the
/// false path otherwise.
pub fn if_fits(name: &'static str, true_path: PrintItems, false_path: PrintItems) -> PrintItems {
  PrintItems::from(Condition::new(name, FitPredicate::TruePathFits, Some(true_path), Some(false_path)))
}

/// Joins words with spaces, moving a word to the next line only when it
/// would not fit. This gives fill behaviour rather than a group's
/// all-or-nothing breaking.
pub fn fill_words(words: impl IntoIterator<Item = String>) -> PrintItems {
  let mut items = PrintItems::new();
  for (index, word) in words.into_iter().enumerate() {
    if index == 0 {
      items.push_string(word);
      continue;
    }
    let mut separated_word = PrintItems::new();
    separated_word.push_signal(Signal::SpaceOrNewLine);
    separated_word.push_string(word.clone());
    let mut next_line_word = PrintItems::new();
    next_line_word.push_signal(Signal::NewLine);
    next_line_word.push_string(word);
    items.push_condition(Condition::new(
      "fillWord",
      FitPredicate::TruePathFits,
      Some(PrintItems::from(Group::new("fillWord", separated_word))),
      Some(next_line_word),
    ));
  }
  items
}

/// Converts raw text that may contain newlines and tabs into print
/// items, preserving its line structure verbatim.
pub fn gen_from_raw_string(text: &str) -> PrintItems {
  let mut items = PrintItems::new();
  for (line_index, line) in text.split('\n').enumerate() {
    if line_index > 0 {
      items.push_signal(Signal::NewLine);
    }
    let line = line.strip_suffix('\r').unwrap_or(line);
    for (part_index, part) in line.split('\t').enumerate() {
      if part_index > 0 {
        items.push_signal(Signal::Tab);
      }
      if !part.is_empty() {
        items.push_str(part);
      }
    }
  }
  items
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::super::print::format;
  use super::super::print::PrintOptions;
  use super::*;

  #[test]
  fn fill_words_wraps_at_width() {
    let words = ["alpha", "beta", "gamma", "delta"].iter().map(|word| word.to_string());
    let items = fill_words(words);
    assert_eq!(print(items.clone(), 40), "alpha beta gamma delta");
    assert_eq!(print(items, 12), "alpha beta\ngamma delta");
  }

  #[test]
  fn raw_string_preserves_lines_and_tabs() {
    let items = gen_from_raw_string("first\n\tsecond\r\n\nlast");
    assert_eq!(print(items, 80), "first\n\tsecond\n\nlast");
  }

  #[test]
  fn if_fits_picks_path_by_width() {
    let mut items = PrintItems::new();
    items.push_str("aaaa");
    items.extend(if_fits("test", PrintItems::from(" bbbb"), PrintItems::from("!")));
    assert_eq!(print(items.clone(), 10), "aaaa bbbb");
    assert_eq!(print(items, 6), "aaaa!");
  }

  fn print(items: PrintItems, max_width: u32) -> String {
    format(
      &items,
      &PrintOptions {
        max_width,
        indent_width: 2,
        use_tabs: false,
        new_line_text: "\n",
      },
    )
    .unwrap()
  }
}
