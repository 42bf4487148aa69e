//! Command argument quoting for the MPD wire format.

/// Quote one argument for use in a command line.
///
/// Arguments are wrapped in double quotes with `\` and `"` backslash-escaped,
/// which is the only escaping the protocol defines.
pub fn escape_argument(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Build a full command line from a name and arguments.
pub fn format_command<I, S>(name: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(name);
    for arg in args {
        out.push(' ');
        out.push_str(&escape_argument(arg.as_ref()));
    }
    out
}
