//! Decoding of `git status --porcelain` output

/// Non-empty lines of porcelain output, one per changed path
pub fn changed_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| !line.trim().is_empty())
}

/// Number of changed paths reported
#[must_use]
pub fn changed_count(output: &str) -> usize {
    changed_lines(output).count()
}

/// Human label for a two-character porcelain status code
///
/// Codes may arrive with their leading space stripped (tool output is
/// trimmed), so only the letters present are inspected.
#[must_use]
pub fn describe_status_code(code: &str) -> &'static str {
    if code.starts_with("??") {
        return "untracked";
    }
    if code.contains('A') {
        return "new file";
    }
    if code.contains('D') {
        return "deleted";
    }
    if code.contains('M') {
        return "modified";
    }
    "changed"
}

/// Label for a single tracked file given its porcelain output
#[must_use]
pub fn describe_file_change(output: &str) -> &'static str {
    changed_lines(output)
        .next()
        .map_or("changed", |line| describe_status_code(line.get(..2).unwrap_or(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(describe_status_code("M "), "modified");
        assert_eq!(describe_status_code(" M"), "modified");
        assert_eq!(describe_status_code("MM"), "modified");
        assert_eq!(describe_status_code("??"), "untracked");
        assert_eq!(describe_status_code("A "), "new file");
        assert_eq!(describe_status_code("AM"), "new file");
        assert_eq!(describe_status_code(" D"), "deleted");
        assert_eq!(describe_status_code("R "), "changed");
        assert_eq!(describe_status_code("UU"), "changed");
    }

    #[test]
    fn test_file_change_from_trimmed_output() {
        // " M a.txt" arrives as "M a.txt" once the output is trimmed
        assert_eq!(describe_file_change("M a.txt"), "modified");
        assert_eq!(describe_file_change("M  a.txt"), "modified");
        assert_eq!(describe_file_change("?? a.txt"), "untracked");
        assert_eq!(describe_file_change("D a.txt"), "deleted");
        assert_eq!(describe_file_change(""), "changed");
    }

    #[test]
    fn test_changed_count_ignores_blank_lines() {
        assert_eq!(changed_count("M a.jpg\n?? b.jpg\n\n D c.jpg\n"), 3);
        assert_eq!(changed_count(""), 0);
    }
}
