//! Turn a service reply into candidate source

/// Extract the candidate source from a reply
///
/// Models often wrap code in a markdown fence, sometimes with prose around
/// it. When a fence is present its body is returned, otherwise the trimmed
/// reply. The source is not checked in any other way.
pub fn extract_source(response: &str) -> String {
    let trimmed = response.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed.to_string();
    };

    // Skip the rest of the opening fence line (```python, ```sh, ...)
    let after_open = &trimmed[open + 3..];
    let body_start = match after_open.find('\n') {
        Some(newline) => newline + 1,
        None => return String::new(),
    };
    let body = &after_open[body_start..];

    let body = match body.find("\n```") {
        Some(close) => &body[..close],
        None => body.strip_suffix("```").unwrap_or(body),
    };
    body.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_source() {
        assert_eq!(extract_source("  import sys\nprint(1)\n\n"), "import sys\nprint(1)");
    }

    #[test]
    fn test_python_fence() {
        let reply = "```python\nimport json\nprint(json.dumps({}))\n```";
        assert_eq!(extract_source(reply), "import json\nprint(json.dumps({}))");
    }

    #[test]
    fn test_fence_with_prose() {
        let reply = "Here is the parser:\n\n```\nimport sys\n```\n\nIt reads the PDF.";
        assert_eq!(extract_source(reply), "import sys");
    }

    #[test]
    fn test_unclosed_fence() {
        assert_eq!(extract_source("```python\nimport sys\n"), "import sys");
    }

    #[test]
    fn test_fence_only() {
        assert_eq!(extract_source("```"), "");
    }

    #[test]
    fn test_indentation_preserved() {
        let reply = "```python\ndef parse(path):\n    return []\n```";
        assert_eq!(extract_source(reply), "def parse(path):\n    return []");
    }
}
