use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (<b>, <p>, ...) survive, script
/// and iframe tags and event-handler attributes are stripped. Applied to
/// free text that is stored and later redisplayed (exam descriptions,
/// question prompts and explanations) as a fail-safe against stored XSS.
/// Never applied to answer values, which are compared byte-for-byte.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_keeps_markup() {
        let cleaned = clean_html("<p>What is <b>2+2</b>?</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>What is <b>2+2</b>?</p>");
    }
}
