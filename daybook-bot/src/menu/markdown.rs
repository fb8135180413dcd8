//! Telegram MarkdownV2 escaping.

const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escape dynamic text for use outside code entities
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape text placed inside a ``` block, where only backtick and backslash are special
pub fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown_v2(text))
}

pub fn code_block(text: &str) -> String {
    format!("```\n{}\n```", escape_code(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_every_special_char() {
        let input = "_*[]()~`>#+-=|{}.!";
        let escaped = escape_markdown_v2(input);
        assert_eq!(escaped, "\\_\\*\\[\\]\\(\\)\\~\\`\\>\\#\\+\\-\\=\\|\\{\\}\\.\\!");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_markdown_v2("Buy milk today"), "Buy milk today");
        assert_eq!(escape_markdown_v2("Привет"), "Привет");
    }

    #[test]
    fn test_date_id_escaping() {
        assert_eq!(escape_markdown_v2("05-Feb-2025"), "05\\-Feb\\-2025");
        assert_eq!(bold("05-Feb-2025"), "*05\\-Feb\\-2025*");
    }

    #[test]
    fn test_backslash_escaped() {
        assert_eq!(escape_markdown_v2("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_code_block() {
        assert_eq!(code_block("- [x] done."), "```\n- [x] done.\n```");
        assert_eq!(escape_code("use `x`"), "use \\`x\\`");
    }
}
