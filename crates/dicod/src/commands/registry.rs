//! Keyword table and command resolution.

use super::Handler;

/// A protocol command: its keyword words, arity and help text.
///
/// Arity counts every word of the command line, keyword words included, so
/// `SHOW INFO db` has three.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    /// Space-separated keyword, e.g. `SHOW LANG DB`.
    pub keyword: &'static str,
    /// Minimum number of words.
    pub min_args: usize,
    /// Maximum number of words; `None` for unbounded.
    pub max_args: Option<usize>,
    /// Parameter synopsis shown by `HELP`.
    pub param_help: &'static str,
    /// One-line description shown by `HELP`.
    pub help: &'static str,
    /// Implementation; `None` for commands that are recognised but not
    /// implemented.
    pub handler: Option<Handler>,
}

impl CommandDescriptor {
    /// Describes a command taking exactly `args` words.
    #[must_use]
    pub const fn exact(
        keyword: &'static str,
        args: usize,
        param_help: &'static str,
        help: &'static str,
        handler: Handler,
    ) -> Self {
        Self {
            keyword,
            min_args: args,
            max_args: Some(args),
            param_help,
            help,
            handler: Some(handler),
        }
    }

    fn words(&self) -> impl Iterator<Item = &'static str> {
        self.keyword.split_ascii_whitespace()
    }

    fn word_count(&self) -> usize {
        self.words().count()
    }

    fn matches(&self, args: &[String]) -> bool {
        let mut words = self.words();
        let mut given = args.iter();
        loop {
            match (words.next(), given.next()) {
                (None, _) => return true,
                (Some(_), None) => return false,
                (Some(word), Some(arg)) if word.eq_ignore_ascii_case(arg) => {}
                (Some(_), Some(_)) => return false,
            }
        }
    }

    fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    /// `HELP` line for the command.
    #[must_use]
    pub fn help_line(&self) -> String {
        let synopsis = format!("{} {}", self.keyword, self.param_help);
        format!("{:<31} -- {}", synopsis.trim_end(), self.help)
    }
}

/// Outcome of looking up a command line.
#[derive(Debug, Clone, Copy)]
pub enum Resolution {
    /// No keyword matches.
    Unknown,
    /// The keyword matches but the word count is out of range.
    WrongArity,
    /// The keyword is known but has no implementation.
    NotImplemented,
    /// Run this handler.
    Dispatch(Handler),
}

/// Installed commands in installation order.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Installs `command`, replacing one with the same keyword in place.
    pub fn install(&mut self, command: CommandDescriptor) {
        match self
            .commands
            .iter_mut()
            .find(|existing| existing.keyword.eq_ignore_ascii_case(command.keyword))
        {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
    }

    /// Resolves a tokenised command line. The longest keyword matching the
    /// leading words wins.
    #[must_use]
    pub fn resolve(&self, args: &[String]) -> Resolution {
        let Some(command) = self
            .commands
            .iter()
            .filter(|command| command.matches(args))
            .max_by_key(|command| command.word_count())
        else {
            return Resolution::Unknown;
        };
        if !command.accepts(args.len()) {
            return Resolution::WrongArity;
        }
        command
            .handler
            .map_or(Resolution::NotImplemented, Resolution::Dispatch)
    }

    /// Installed commands in installation order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    /// Number of installed commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
