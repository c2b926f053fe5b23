use unicode_segmentation::UnicodeSegmentation;

/// Raw text → ordered token slices.
///
/// Tokens borrow from the input. Punctuation may come back as tokens of its
/// own; deciding what counts as a word is left to the caller.
pub trait Tokenizer {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str>;

    fn name(&self) -> &str;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        (**self).tokenize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        (**self).tokenize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// UAX #29 word-boundary tokenizer.
///
/// Whitespace is dropped, punctuation is kept as separate tokens. Apostrophes
/// inside a word do not split it. With `join_hyphens`, `word-word` written
/// without spaces stays one token.
#[derive(Clone, Debug)]
pub struct UnicodeTokenizer {
    pub join_hyphens: bool,
}

impl Default for UnicodeTokenizer {
    fn default() -> Self {
        Self { join_hyphens: true }
    }
}

impl Tokenizer for UnicodeTokenizer {
    fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut segments = text.split_word_bound_indices().peekable();

        while let Some((start, segment)) = segments.next() {
            if segment.chars().all(char::is_whitespace) {
                continue;
            }

            if self.join_hyphens
                && is_hyphen(segment)
                && let Some(last) = spans.last_mut()
                && last.1 == start
                && ends_alphabetic(&text[last.0..last.1])
                && let Some(&(next_start, next)) = segments.peek()
                && starts_alphabetic(next)
            {
                last.1 = next_start + next.len();
                segments.next();
                continue;
            }

            spans.push((start, start + segment.len()));
        }

        spans.into_iter().map(|(s, e)| &text[s..e]).collect()
    }

    fn name(&self) -> &str {
        "unicode"
    }
}

fn is_hyphen(segment: &str) -> bool {
    matches!(segment, "-" | "\u{2010}" | "\u{2011}")
}

fn starts_alphabetic(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_alphabetic)
}

fn ends_alphabetic(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_alphabetic)
}
