//! Parsing of `key` and `key=value` database arguments.

use dico::ModuleError;

/// One database argument split at its first `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DbOption<'a> {
    pub(crate) key: &'a str,
    pub(crate) value: Option<&'a str>,
}

impl<'a> DbOption<'a> {
    fn parse(arg: &'a str) -> Self {
        match arg.split_once('=') {
            Some((key, value)) => Self {
                key,
                value: Some(value),
            },
            None => Self { key: arg, value: None },
        }
    }

    /// Value of a `key=value` option.
    pub(crate) fn value(&self) -> Result<&'a str, ModuleError> {
        self.value
            .ok_or_else(|| ModuleError::invalid_arguments(format!("option '{}' needs a value", self.key)))
    }

    /// Ensures a flag was given without a value.
    pub(crate) fn flag(&self) -> Result<(), ModuleError> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(ModuleError::invalid_arguments(format!(
                "option '{}' takes no value",
                self.key
            ))),
        }
    }

    pub(crate) fn unknown(&self) -> ModuleError {
        ModuleError::invalid_arguments(format!("unknown option '{}'", self.key))
    }
}

/// Splits every argument of `args`.
pub(crate) fn parse(args: &[String]) -> impl Iterator<Item = DbOption<'_>> {
    args.iter().map(|arg| DbOption::parse(arg))
}
