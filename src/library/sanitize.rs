//! File-name hygiene for space directories and document files.

/// Characters that are illegal in file names on common filesystems
const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Name used when sanitizing leaves nothing
const FALLBACK_NAME: &str = "untitled";

/// Make `name` safe to use as a single path segment.
///
/// Each illegal character becomes `_` and each run of whitespace becomes a
/// single `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }

        in_whitespace = false;
        if ILLEGAL.contains(&c) || c.is_control() {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    if out.is_empty() || out == "." || out == ".." {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_characters() {
        assert_eq!(sanitize_file_name("a/b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_file_name(r#"q?"<x>|y\z"#), "q___x__y_z");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(sanitize_file_name("Meeting  notes \t 2024"), "Meeting_notes_2024");
    }

    #[test]
    fn test_unicode_is_kept() {
        assert_eq!(sanitize_file_name("产品 文档"), "产品_文档");
    }

    #[test]
    fn test_empty_falls_back() {
        assert_eq!(sanitize_file_name(""), "untitled");
        assert_eq!(sanitize_file_name(".."), "untitled");
    }
}
