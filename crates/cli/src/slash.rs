//! Slash-command parsing for the interactive chat.

/// A parsed command line. Anything that is not a command is a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Load(String),
    Focus(String),
    Unfocus,
    Files,
    Search(String),
    /// `None` shows the current model.
    Model(Option<String>),
    Mode(String),
    Save,
    Clear,
    Help,
    Exit,
    /// Known command used without its required argument.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /load <path>                   Load a file or directory into context
  /focus <name>                  Pin files whose name contains <name>
  /unfocus                       Remove all pins
  /files                         List loaded files
  /search <text>                 Search loaded files
  /model [name]                  Show or switch the model (partial match)
  /mode <smart|full|summary>     Context strategy
  /save                          Export the chat as Markdown
  /clear                         Reset files, pins and history
  /help                          Show this help
  exit | quit                    Leave
Ctrl+C stops a running answer; Ctrl+C at the prompt exits.";

/// Parse one input line. Returns `None` for ordinary questions.
pub fn parse(line: &str) -> Option<SlashCommand> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Some(SlashCommand::Exit);
    }
    if !line.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    let arg = (!arg.is_empty()).then(|| arg.to_string());

    let command = match (cmd.to_lowercase().as_str(), arg) {
        ("/load", Some(a)) => SlashCommand::Load(a),
        ("/load", None) => SlashCommand::Usage("/load <path>"),
        ("/focus", Some(a)) => SlashCommand::Focus(a),
        ("/focus", None) => SlashCommand::Usage("/focus <name>"),
        ("/unfocus", _) => SlashCommand::Unfocus,
        ("/files", _) => SlashCommand::Files,
        ("/search", Some(a)) => SlashCommand::Search(a),
        ("/search", None) => SlashCommand::Usage("/search <text>"),
        ("/model", a) => SlashCommand::Model(a),
        ("/mode", Some(a)) => SlashCommand::Mode(a),
        ("/mode", None) => SlashCommand::Usage("/mode <smart|full|summary>"),
        ("/save", _) => SlashCommand::Save,
        ("/clear", _) => SlashCommand::Clear,
        ("/help", _) => SlashCommand::Help,
        (other, _) => SlashCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// First available model containing `wanted`; an exact name wins.
pub fn match_model<'a>(available: &'a [String], wanted: &str) -> Option<&'a str> {
    available
        .iter()
        .find(|m| m.as_str() == wanted)
        .or_else(|| available.iter().find(|m| m.contains(wanted)))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(parse("explain the database schema"), None);
        assert_eq!(parse("  what does /load do?"), None);
    }

    #[test]
    fn exit_words() {
        assert_eq!(parse("exit"), Some(SlashCommand::Exit));
        assert_eq!(parse(" QUIT "), Some(SlashCommand::Exit));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(parse("/load ~/src/app"), Some(SlashCommand::Load("~/src/app".into())));
        assert_eq!(parse("/focus  main.rs "), Some(SlashCommand::Focus("main.rs".into())));
        assert_eq!(parse("/search fn main"), Some(SlashCommand::Search("fn main".into())));
        assert_eq!(parse("/MODE full"), Some(SlashCommand::Mode("full".into())));
    }

    #[test]
    fn missing_arguments_give_usage() {
        assert_eq!(parse("/load"), Some(SlashCommand::Usage("/load <path>")));
        assert_eq!(parse("/search   "), Some(SlashCommand::Usage("/search <text>")));
    }

    #[test]
    fn model_argument_is_optional() {
        assert_eq!(parse("/model"), Some(SlashCommand::Model(None)));
        assert_eq!(parse("/model qwen"), Some(SlashCommand::Model(Some("qwen".into()))));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse("/frobnicate x"), Some(SlashCommand::Unknown("/frobnicate".into())));
    }

    #[test]
    fn model_matching() {
        let models = vec![
            "llama3:latest".to_string(),
            "llama3:70b".to_string(),
            "qwen2.5-coder:7b".to_string(),
        ];
        assert_eq!(match_model(&models, "llama3:70b"), Some("llama3:70b"));
        assert_eq!(match_model(&models, "llama3"), Some("llama3:latest"));
        assert_eq!(match_model(&models, "coder"), Some("qwen2.5-coder:7b"));
        assert_eq!(match_model(&models, "mistral"), None);
    }
}
