use std::fmt;
use std::fmt::Display;

/// Indentation-aware writer used to render query documents.
pub(crate) struct State<'out> {
    indent_level: usize,
    output: &'out mut dyn fmt::Write,
}

impl<'out> State<'out> {
    pub(crate) fn new(output: &'out mut dyn fmt::Write) -> State<'out> {
        Self {
            indent_level: 0,
            output,
        }
    }

    pub(crate) fn write<T: fmt::Display>(&mut self, value: T) -> fmt::Result {
        write!(self.output, "{}", value)
    }

    pub(crate) fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.output.write_fmt(args)
    }

    pub(crate) fn new_line(&mut self) -> fmt::Result {
        self.write("\n")?;
        for _ in 0..self.indent_level {
            self.write("  ")?
        }
        Ok(())
    }

    pub(crate) fn indent_no_new_line(&mut self) {
        self.indent_level += 1;
    }

    pub(crate) fn dedent(&mut self) -> fmt::Result {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.new_line()
    }
}

/// Writes `values` one per line, one level deeper than the current line, and leaves the
/// writer on a fresh line at the original level.
pub(crate) fn write_indented_lines<T>(
    state: &mut State<'_>,
    values: &[T],
    mut write_line: impl FnMut(&mut State<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    if !values.is_empty() {
        state.indent_no_new_line();
        for value in values {
            state.new_line()?;
            write_line(state, value)?;
        }
        state.dedent()?;
    }
    Ok(())
}

/// Displays items separated by `", "`, without brackets.
pub(crate) struct DisplaySeparated<'a, T>(pub(crate) &'a [T]);

impl<T: Display> Display for DisplaySeparated<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(item) = iter.next() {
            write!(f, "{item}")?;
        }
        iter.try_for_each(|item| write!(f, ", {item}"))
    }
}
