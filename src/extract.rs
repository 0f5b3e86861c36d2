//! Code-fence extraction from assistant output.
//!
//! The assistant marks runnable scene code with fenced code blocks
//! (triple-backtick, optionally language-tagged). During streaming the fence
//! may be unterminated, so extraction is deliberately conservative: it only
//! returns once a syntactically complete block exists. Callers re-invoke
//! [`extract_code`] on every delta, which is safe because extraction is a
//! pure function of the accumulated text.

/// Fence-opening candidates, language-tagged fences before the bare fence.
///
/// Order matters: the first candidate with a valid occurrence wins, so a
/// tagged fence is always preferred over the bare triple-backtick.
const FENCE_CANDIDATES: &[&str] = &[
    "```javascript",
    "```typescript",
    "```jsx",
    "```tsx",
    "```html",
    "```js",
    "```ts",
    "```",
];

/// Control tokens the provider embeds in its output. Stripped from the tail
/// of extracted code, repeatedly, with whitespace trimming between passes.
const ARTIFACT_TOKENS: &[&str] = &["[INSERT_CODE_END]", "[RUN_SCENE]"];

/// Minimum length of extracted code after trimming. Shorter results are
/// treated as noise (a stray fence around a word, not a scene).
const MIN_CODE_LEN: usize = 10;

/// Extract the first complete fenced code block from `content`.
///
/// Returns `None` when:
/// - no recognized fence opening exists,
/// - the opening fence has no closing fence yet (stream still in progress),
/// - the extracted code is shorter than [`MIN_CODE_LEN`] after trimming.
///
/// Trailing artifact tokens ([`ARTIFACT_TOKENS`]) are stripped from the
/// result. The function is pure and idempotent: repeated calls with the same
/// input produce the same output.
pub fn extract_code(content: &str) -> Option<String> {
    let (open_pos, candidate) = find_opening_fence(content)?;

    // Code starts on the line after the opening fence.
    let after_token = open_pos + candidate.len();
    let line_end = content[after_token..].find('\n')?;
    let code_start = after_token + line_end + 1;

    // Prefer a closing fence at the start of a line; fall back to a bare
    // triple-backtick anywhere (some providers omit the final newline).
    let code_end = match content[code_start..].find("\n```") {
        Some(pos) => code_start + pos,
        None => code_start + content[code_start..].find("```")?,
    };

    let code = strip_artifacts(&content[code_start..code_end]);
    if code.chars().count() < MIN_CODE_LEN {
        return None;
    }
    Some(code)
}

/// Find the first valid fence opening, trying candidates in priority order.
///
/// An occurrence is valid when the triple-backtick is not part of a longer
/// backtick run, and a tagged candidate is followed by a line break or
/// whitespace (so `` ```js `` does not match inside `` ```json ``).
fn find_opening_fence(content: &str) -> Option<(usize, &'static str)> {
    for candidate in FENCE_CANDIDATES {
        let mut search_from = 0;
        while let Some(rel) = content[search_from..].find(candidate) {
            let pos = search_from + rel;
            if is_valid_occurrence(content, pos, candidate) {
                return Some((pos, candidate));
            }
            search_from = pos + 1;
        }
    }
    None
}

fn is_valid_occurrence(content: &str, pos: usize, candidate: &str) -> bool {
    let bytes = content.as_bytes();

    // Not preceded by another backtick (would be part of a longer run).
    if pos > 0 && bytes[pos - 1] == b'`' {
        return false;
    }

    let after = pos + candidate.len();
    if *candidate == *"```" {
        // Bare fence must not be followed by more backticks.
        after >= bytes.len() || bytes[after] != b'`'
    } else {
        // Tagged fence: the tag must end at a line break or whitespace,
        // otherwise we matched a prefix of a longer language tag.
        match content[after..].chars().next() {
            None => true,
            Some(c) => c.is_whitespace(),
        }
    }
}

/// Strip trailing artifact tokens, trimming whitespace after each removal,
/// until no artifact remains at the tail.
fn strip_artifacts(code: &str) -> String {
    let mut result = code.trim();
    loop {
        let mut stripped = false;
        for token in ARTIFACT_TOKENS {
            if let Some(rest) = result.strip_suffix(token) {
                result = rest.trim_end();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }
    result.to_string()
}
