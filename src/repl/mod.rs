/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Categories,
    List(String),
    Show(i64),
    Select(i64),
    Remove(i64),
    Selected,
    Clear,
    Generate,
    Transcript,
    Ask(String),
    Help,
    Quit,
    Nothing,
}

pub const HELP: &str = "\
commands:
  categories          list catalog categories
  list <category>     show products in a category
  show <id>           product details
  select <id>         add a product to your selection
  remove <id>         drop a product from your selection
  selected            show your selection
  clear               remove all selected products
  generate            build a routine from your selection
  history             show the conversation so far
  ask <text>          ask a follow-up question (bare text works too)
  help | quit";

fn id_arg(cmd: &str, rest: &str) -> Result<i64, String> {
    rest.trim()
        .parse::<i64>()
        .map_err(|_| format!("usage: {cmd} <id>"))
}

pub fn parse(line: &str) -> Result<Action, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Action::Nothing);
    }
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };
    let action = match cmd.to_lowercase().as_str() {
        "categories" => Action::Categories,
        "list" if rest.is_empty() => return Err("usage: list <category>".into()),
        "list" => Action::List(rest.to_string()),
        "show" => Action::Show(id_arg("show", rest)?),
        "select" => Action::Select(id_arg("select", rest)?),
        "remove" => Action::Remove(id_arg("remove", rest)?),
        "selected" => Action::Selected,
        "clear" => Action::Clear,
        "generate" => Action::Generate,
        "history" => Action::Transcript,
        "ask" => Action::Ask(rest.to_string()),
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        _ => Action::Ask(line.to_string()),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_ids() {
        assert_eq!(parse("select 12"), Ok(Action::Select(12)));
        assert_eq!(parse("  REMOVE   3 "), Ok(Action::Remove(3)));
        assert_eq!(parse("show x"), Err("usage: show <id>".to_string()));
    }

    #[test]
    fn category_keeps_inner_spaces() {
        assert_eq!(parse("list hair care"), Ok(Action::List("hair care".into())));
        assert!(parse("list").is_err());
    }

    #[test]
    fn free_text_becomes_a_question() {
        assert_eq!(
            parse("what goes first, toner or serum?"),
            Ok(Action::Ask("what goes first, toner or serum?".into()))
        );
        assert_eq!(parse("ask is SPF needed"), Ok(Action::Ask("is SPF needed".into())));
        assert_eq!(parse("   "), Ok(Action::Nothing));
    }
}
