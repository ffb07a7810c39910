//! Indentation-to-brace preprocessing for the indented (Sass) syntax.
//!
//! Rather than give the indented syntax its own parallel grammar, this
//! rewrites indentation-delimited blocks into the equivalent brace'd text
//! and hands the result to the same SCSS-shaped parser in `mod.rs`. Line
//! numbers are preserved (each source line maps to exactly one output
//! line); only trailing `{`/`;`/`}` markers are appended, so spans recorded
//! against the rewritten text still point at sensible locations.
pub fn to_scss_like(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = String::new();
    let mut stack: Vec<usize> = Vec::new();

    for (i, raw_line) in lines.iter().enumerate() {
        let trimmed = raw_line.trim_end();
        if trimmed.trim().is_empty() {
            out.push('\n');
            continue;
        }
        let indent = raw_line.len() - raw_line.trim_start().len();
        while let Some(&top) = stack.last() {
            if indent < top {
                stack.pop();
                out.push_str("}\n");
            } else {
                break;
            }
        }
        let content = trimmed.trim_start();
        let is_comment_only = content.starts_with("//");
        let opens_block = !is_comment_only
            && lines[i + 1..]
                .iter()
                .find(|l| !l.trim().is_empty())
                .map(|next| (next.len() - next.trim_start().len()) > indent)
                .unwrap_or(false);

        out.push_str(&" ".repeat(indent));
        out.push_str(content);
        if opens_block {
            if !content.ends_with('{') {
                out.push_str(" {");
            }
            stack.push(indent);
        } else if !is_comment_only
            && !content.ends_with(';')
            && !content.ends_with('{')
            && !content.ends_with('}')
        {
            out.push(';');
        }
        out.push('\n');
    }
    while stack.pop().is_some() {
        out.push_str("}\n");
    }
    out
}
