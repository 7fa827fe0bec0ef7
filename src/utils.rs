/// Escape HTML following [OWASP](https://www.owasp.org/index.php/XSS_(Cross_Site_Scripting)_Prevention_Cheat_Sheet)
///
/// Escape the following characters with HTML entity encoding to prevent switching
/// into any execution context, such as script, style, or event handlers. Using
/// hex entities is recommended in the spec. In addition to the 5 characters
/// significant in XML (&, <, >, ", '), the forward slash is included as it helps
/// to end an HTML entity.
///
/// ```text
/// & --> &amp;
/// < --> &lt;
/// > --> &gt;
/// " --> &quot;
/// ' --> &#x27;     &apos; is not recommended
/// / --> &#x2F;     forward slash is included as it helps end an HTML entity
/// ```
#[inline]
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            '/' => output.push_str("&#x2F;"),
            _ => output.push(c),
        }
    }

    // Not using shrink_to_fit() on purpose
    output
}

/// Turns a logical template path into its canonical form: `/` separators,
/// no leading or trailing slash, no `.` segments and `..` applied.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(|c| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// The directory part of a normalized path, the root being `""`
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Joins a directory and a file name, the root directory being `""`
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Every directory containing `path`, from its own directory up to the root.
/// `views/admin/index` gives `["views/admin", "views", ""]`.
pub fn directory_ancestry(path: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut current = parent_dir(path);
    loop {
        dirs.push(current.to_string());
        if current.is_empty() {
            break;
        }
        current = parent_dir(current);
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::{directory_ancestry, escape_html, join_path, normalize_path, parent_dir};

    #[test]
    fn test_escape_html() {
        let tests = vec![
            (r"", ""),
            (r"a&b", "a&amp;b"),
            (r"<a", "&lt;a"),
            (r">a", "&gt;a"),
            (r#"""#, "&quot;"),
            (r#"'"#, "&#x27;"),
            (r#"大阪"#, "大阪"),
        ];
        for (input, expected) in tests {
            assert_eq!(escape_html(input), expected);
        }
        let empty = String::new();
        assert_eq!(escape_html(&empty), empty);
    }

    #[test]
    fn test_normalize_path() {
        let tests = vec![
            ("/views/Folder/X", "views/Folder/X"),
            ("views//Folder/./X/", "views/Folder/X"),
            ("views\\Folder\\X", "views/Folder/X"),
            ("views/Folder/../_Layout", "views/_Layout"),
            ("/", ""),
        ];
        for (input, expected) in tests {
            assert_eq!(normalize_path(input), expected);
        }
    }

    #[test]
    fn test_parent_dir_and_join() {
        assert_eq!(parent_dir("views/Folder/X"), "views/Folder");
        assert_eq!(parent_dir("index"), "");
        assert_eq!(join_path("", "_Layout"), "_Layout");
        assert_eq!(join_path("views", "_Layout"), "views/_Layout");
    }

    #[test]
    fn test_directory_ancestry() {
        assert_eq!(directory_ancestry("views/Folder/X"), vec!["views/Folder", "views", ""]);
        assert_eq!(directory_ancestry("index"), vec![""]);
    }
}
