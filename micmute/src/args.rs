//! Command-line arguments.

/// Parsed launch arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    /// `--show`: signal a running instance, or start visible.
    pub show: bool,

    /// Arguments that mean nothing to us; logged and otherwise ignored.
    pub unknown: Vec<String>,
}

impl LaunchArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        for arg in args.into_iter().map(Into::into) {
            if arg.eq_ignore_ascii_case("--show") {
                parsed.show = true;
            } else {
                parsed.unknown.push(arg);
            }
        }
        parsed
    }
}
