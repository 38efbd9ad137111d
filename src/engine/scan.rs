//! Raw LaTeX text scanning.
//!
//! Balanced-brace argument extraction and `\begin`/`\end` environment
//! matching for the fixed command set the engine recognizes. Argument
//! capture uses an explicit escape-aware depth scan rather than regex, so
//! nested braces are handled correctly.

use lazy_static::lazy_static;
use regex::Regex;

/// Extract content within balanced braces starting at `start`.
///
/// `text[start]` must be `{`. Returns the inner content and the byte
/// offset just past the closing brace.
pub fn extract_braced(text: &str, start: usize) -> Option<(String, usize)> {
    extract_delimited(text, start, b'{', b'}')
}

/// Extract content within balanced brackets starting at `start`.
pub fn extract_bracketed(text: &str, start: usize) -> Option<(String, usize)> {
    extract_delimited(text, start, b'[', b']')
}

fn extract_delimited(text: &str, start: usize, open: u8, close: u8) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if start >= bytes.len() || bytes[start] != open {
        return None;
    }
    let mut depth = 0i32;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some((text[start + 1..i].to_string(), i + 1));
            }
        } else if b == b'\\' && i + 1 < bytes.len() {
            // Skip escaped characters
            i += 1;
        }
        i += 1;
    }
    None
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    from + text[from..].len() - text[from..].trim_start().len()
}

/// Strip the first `\name{...}` occurrence from `raw` and return
/// `(cleaned_text, argument)`. The argument is trimmed; an empty argument
/// is reported as `None` even though the command itself is removed.
pub fn strip_command(raw: &str, name: &str) -> (String, Option<String>) {
    let pattern = format!("\\{}", name);
    let mut search_from = 0usize;
    while let Some(rel) = raw[search_from..].find(&pattern) {
        let cmd_start = search_from + rel;
        let after = cmd_start + pattern.len();
        // Reject longer command names sharing this prefix (\captionof etc.)
        if raw[after..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic())
        {
            search_from = after;
            continue;
        }
        let brace = skip_whitespace(raw, after);
        if let Some((content, end)) = extract_braced(raw, brace) {
            let mut cleaned = String::with_capacity(raw.len());
            cleaned.push_str(&raw[..cmd_start]);
            cleaned.push_str(&raw[end..]);
            let content = content.trim().to_string();
            let arg = if content.is_empty() {
                None
            } else {
                Some(content)
            };
            return (cleaned, arg);
        }
        search_from = after;
    }
    (raw.to_string(), None)
}

/// Replace every `\name{...}` occurrence with its argument content,
/// leaving the inner text intact.
pub fn unwrap_command(raw: &str, name: &str) -> String {
    let pattern = format!("\\{}", name);
    let mut out = raw.to_string();
    let mut search_from = 0usize;
    while let Some(rel) = out[search_from..].find(&pattern) {
        let cmd_start = search_from + rel;
        let after = cmd_start + pattern.len();
        if out[after..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic())
        {
            search_from = after;
            continue;
        }
        let brace = skip_whitespace(&out, after);
        if let Some((content, end)) = extract_braced(&out, brace) {
            out.replace_range(cmd_start..end, &content);
            // Re-scan from the same offset so nested wrappers unwrap too
            search_from = cmd_start;
        } else {
            search_from = after;
        }
    }
    out
}

/// A matched `\begin{name} … \end{name}` environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvMatch {
    /// Byte offset of `\begin{name}`.
    pub start: usize,
    /// Byte offset just past `\end{name}`.
    pub end: usize,
    /// Bracketed options following the begin marker, if any.
    pub options: Option<String>,
    /// Required braced arguments following the options.
    pub args: Vec<String>,
    /// Body text between the header and the matching end marker.
    pub body: String,
}

/// Find the first `\begin{name} … \end{name}` pair in `text`, honoring
/// nesting of the same environment name. `n_args` required braced
/// arguments are consumed after the optional `[...]` group; if the end
/// marker or a required argument is missing, the match fails.
pub fn find_environment(text: &str, name: &str, n_args: usize) -> Option<EnvMatch> {
    let begin_marker = format!("\\begin{{{}}}", name);
    let end_marker = format!("\\end{{{}}}", name);

    let start = text.find(&begin_marker)?;
    let mut cursor = start + begin_marker.len();

    let mut options = None;
    let opt_start = skip_whitespace(text, cursor);
    if let Some((opts, end)) = extract_bracketed(text, opt_start) {
        options = Some(opts);
        cursor = end;
    }

    let mut args = Vec::with_capacity(n_args);
    for _ in 0..n_args {
        let arg_start = skip_whitespace(text, cursor);
        let (arg, end) = extract_braced(text, arg_start)?;
        args.push(arg.trim().to_string());
        cursor = end;
    }

    // Locate the matching end marker, counting nested same-name begins.
    let body_start = cursor;
    let mut depth = 1usize;
    let mut scan = cursor;
    loop {
        let next_end = scan + text[scan..].find(&end_marker)?;
        let next_begin = text[scan..].find(&begin_marker).map(|rel| scan + rel);
        match next_begin {
            Some(nb) if nb < next_end => {
                depth += 1;
                scan = nb + begin_marker.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(EnvMatch {
                        start,
                        end: next_end + end_marker.len(),
                        options,
                        args,
                        body: text[body_start..next_end].to_string(),
                    });
                }
                scan = next_end + end_marker.len();
            }
        }
    }
}

/// Escape HTML-special characters in code bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text destined for an HTML attribute value.
pub fn escape_html_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Trim surrounding blank lines from a code body, preserving indentation.
pub fn trim_code(text: &str) -> &str {
    text.trim_start_matches(|c| c == '\r' || c == '\n').trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_braced_simple() {
        assert_eq!(
            extract_braced("{hello}", 0),
            Some(("hello".to_string(), 7))
        );
    }

    #[test]
    fn test_extract_braced_nested() {
        let (content, end) = extract_braced("{a {b {c}} d} tail", 0).unwrap();
        assert_eq!(content, "a {b {c}} d");
        assert_eq!(&"{a {b {c}} d} tail"[end..], " tail");
    }

    #[test]
    fn test_extract_braced_escaped_brace() {
        let (content, _) = extract_braced(r"{a \} b}", 0).unwrap();
        assert_eq!(content, r"a \} b");
    }

    #[test]
    fn test_extract_braced_unbalanced() {
        assert_eq!(extract_braced("{never closed", 0), None);
        assert_eq!(extract_braced("no brace here", 0), None);
    }

    #[test]
    fn test_extract_bracketed() {
        let (content, _) = extract_bracketed("[linenos, fontsize=\\small]", 0).unwrap();
        assert_eq!(content, "linenos, fontsize=\\small");
    }

    #[test]
    fn test_strip_command_with_nested_braces() {
        let (cleaned, arg) = strip_command(r"before \caption{uses \textbf{bold}} after", "caption");
        assert_eq!(arg.as_deref(), Some(r"uses \textbf{bold}"));
        assert_eq!(cleaned, "before  after");
    }

    #[test]
    fn test_strip_command_ignores_longer_names() {
        let (cleaned, arg) = strip_command(r"\labelled{x} \label{lst:ex}", "label");
        assert_eq!(arg.as_deref(), Some("lst:ex"));
        assert_eq!(cleaned, r"\labelled{x} ");
    }

    #[test]
    fn test_strip_command_absent() {
        let (cleaned, arg) = strip_command("no commands", "caption");
        assert_eq!(cleaned, "no commands");
        assert_eq!(arg, None);
    }

    #[test]
    fn test_unwrap_command() {
        assert_eq!(unwrap_command(r"a \textzh{中文} b", "textzh"), "a 中文 b");
        assert_eq!(
            unwrap_command(r"\textzh{outer \textzh{inner}}", "textzh"),
            "outer inner"
        );
        assert_eq!(unwrap_command("untouched", "textzh"), "untouched");
    }

    #[test]
    fn test_find_environment_basic() {
        let text = "\\begin{listing}\ncode here\n\\end{listing}";
        let env = find_environment(text, "listing", 0).unwrap();
        assert_eq!(env.body.trim(), "code here");
        assert_eq!(env.start, 0);
        assert_eq!(env.end, text.len());
        assert_eq!(env.options, None);
    }

    #[test]
    fn test_find_environment_with_options_and_arg() {
        let text = "\\begin{minted}[linenos]{python}\nprint(1)\n\\end{minted}";
        let env = find_environment(text, "minted", 1).unwrap();
        assert_eq!(env.options.as_deref(), Some("linenos"));
        assert_eq!(env.args, vec!["python".to_string()]);
        assert_eq!(env.body.trim(), "print(1)");
    }

    #[test]
    fn test_find_environment_without_options() {
        let text = "\\begin{minted}{rust}\nfn main() {}\n\\end{minted}";
        let env = find_environment(text, "minted", 1).unwrap();
        assert_eq!(env.options, None);
        assert_eq!(env.args, vec!["rust".to_string()]);
    }

    #[test]
    fn test_find_environment_nested_same_name() {
        let text = "\\begin{listing}outer \\begin{listing}inner\\end{listing} tail\\end{listing}";
        let env = find_environment(text, "listing", 0).unwrap();
        assert_eq!(env.body, "outer \\begin{listing}inner\\end{listing} tail");
    }

    #[test]
    fn test_find_environment_missing_end() {
        assert_eq!(find_environment("\\begin{listing}code", "listing", 0), None);
    }

    #[test]
    fn test_find_environment_missing_required_arg() {
        assert_eq!(
            find_environment("\\begin{minted}\ncode\\end{minted}", "minted", 1),
            None
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n  b\tc  "), "a b c");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("if a < b && b > c"),
            "if a &lt; b &amp;&amp; b &gt; c"
        );
        assert_eq!(escape_html_attr("say \"hi\""), "say &quot;hi&quot;");
    }
}
