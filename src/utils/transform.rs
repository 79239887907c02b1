use crate::error::TransformError;
use crate::promise::{Deferred, Promise};
use crate::utils::thread_pool;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

/// Ordered token replacements applied to text.
///
/// Tokens are applied in insertion order and each one replaces only its
/// first match. In pattern mode a token is a regular expression and its
/// replacement may refer to capture groups (`$1`, `${name}`); in literal mode
/// both sides are plain text.
///
/// ```
/// use arbor::utils::Transformer;
///
/// let pattern = Transformer::new([(r"(\w+)-module", "${1}Module")]).unwrap();
/// assert_eq!(pattern.apply("app-module app-module"), "appModule app-module");
///
/// let literal = Transformer::literal([("${NAME}", "main")]);
/// assert_eq!(literal.apply("${NAME}.rs"), "main.rs");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
enum Rule {
    Pattern { regex: Regex, replacement: String },
    Literal { token: String, replacement: String },
}

impl Transformer {
    /// Builds a transformer whose tokens are regular expressions.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidToken`] for the first token that does
    /// not compile.
    pub fn new<I, K, V>(tokens: I) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rules = tokens
            .into_iter()
            .map(|(token, replacement)| {
                let token = token.into();
                Regex::new(&token)
                    .map(|regex| Rule::Pattern {
                        regex,
                        replacement: replacement.into(),
                    })
                    .map_err(|source| TransformError::InvalidToken { token, source })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    /// Builds a transformer whose tokens are matched literally.
    pub fn literal<I, K, V>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rules = tokens
            .into_iter()
            .map(|(token, replacement)| Rule::Literal {
                token: token.into(),
                replacement: replacement.into(),
            })
            .collect();
        Self { rules }
    }

    /// Builds a transformer in either mode.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::InvalidToken`] in pattern mode if a token
    /// does not compile.
    pub fn from_pairs(tokens: Vec<(String, String)>, literal: bool) -> Result<Self, TransformError> {
        if literal {
            Ok(Self::literal(tokens))
        } else {
            Self::new(tokens)
        }
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no tokens, making [`apply`](Self::apply) the identity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every token to `input` in order.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |text, rule| match rule {
                Rule::Pattern { regex, replacement } => {
                    regex.replace(&text, replacement.as_str()).into_owned()
                }
                Rule::Literal { token, replacement } => text.replacen(token.as_str(), replacement, 1),
            })
    }
}

/// Reads `src`, applies `transformer` (if any) and writes the result to
/// `dest`, on the worker pool.
///
/// The returned promise fulfils once `dest` is written, or rejects with the
/// read or write failure.
///
/// # Errors
///
/// Returns [`TransformError::EmptyPath`] synchronously if either path is
/// empty.
pub fn transform_file(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    transformer: Option<Transformer>,
) -> Result<Promise<(), TransformError>, TransformError> {
    let src = src.as_ref().to_path_buf();
    let dest = dest.as_ref().to_path_buf();
    if src.as_os_str().is_empty() {
        return Err(TransformError::EmptyPath("source"));
    }
    if dest.as_os_str().is_empty() {
        return Err(TransformError::EmptyPath("destination"));
    }

    let rendered: Deferred<(), TransformError> = Deferred::new();
    let settle = rendered.clone();
    thread_pool::get_thread_pool().spawn(move || {
        let result = render(&src, &dest, transformer.as_ref());
        match result {
            Ok(()) => {
                tracing::debug!(src = %src.display(), dest = %dest.display(), "rendered file");
                settle.fulfill(());
            }
            Err(error) => {
                tracing::warn!(%error, "failed to render file");
                settle.reject(error);
            }
        }
    });

    Ok(rendered.promise())
}

fn render(src: &Path, dest: &Path, transformer: Option<&Transformer>) -> Result<(), TransformError> {
    let content = std::fs::read_to_string(src).map_err(|e| TransformError::Read {
        path: src.to_path_buf(),
        source: Arc::new(e),
    })?;
    let output = match transformer {
        Some(transformer) => transformer.apply(&content),
        None => content,
    };
    std::fs::write(dest, output).map_err(|e| TransformError::Write {
        path: dest.to_path_buf(),
        source: Arc::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::{Outcome, State};
    use std::io;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn wait(promise: &Promise<(), TransformError>) -> Arc<Outcome<(), TransformError>> {
        let (tx, rx) = mpsc::channel();
        promise.on_settled(move |_| {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        promise.outcome().unwrap()
    }

    #[test]
    fn test_pattern_replaces_first_match_only() {
        let transformer = Transformer::new([("a+", "b")]).unwrap();
        assert_eq!(transformer.apply("aa-aa"), "b-aa");
    }

    #[test]
    fn test_tokens_apply_in_order() {
        let transformer = Transformer::new([("one", "two"), ("two", "three")]).unwrap();
        assert_eq!(transformer.apply("one"), "three");
        assert_eq!(transformer.len(), 2);
    }

    #[test]
    fn test_literal_ignores_regex_syntax() {
        let transformer = Transformer::literal([("a.c", "x")]);
        assert_eq!(transformer.apply("abc a.c"), "abc x");
    }

    #[test]
    fn test_invalid_token_is_reported() {
        let error = Transformer::new([("(", "x")]).unwrap_err();
        assert!(matches!(error, TransformError::InvalidToken { token, .. } if token == "("));
        assert!(Transformer::from_pairs(vec![("(".into(), "x".into())], true).is_ok());
    }

    #[test]
    fn test_transform_file_rejects_empty_paths() {
        assert!(matches!(
            transform_file("", "out", None),
            Err(TransformError::EmptyPath("source"))
        ));
        assert!(matches!(
            transform_file("in", "", None),
            Err(TransformError::EmptyPath("destination"))
        ));
    }

    #[test]
    fn test_transform_file_writes_rendered_output() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("template.txt");
        let dest = temp.path().join("out.txt");
        std::fs::write(&src, "module ${NAME};").unwrap();

        let transformer = Transformer::literal([("${NAME}", "walker")]);
        let done = transform_file(&src, &dest, Some(transformer)).unwrap();

        assert!(matches!(*wait(&done), Outcome::Fulfilled(())));
        assert_eq!(done.state(), State::Fulfilled);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "module walker;");
    }

    #[test]
    fn test_transform_file_rejects_missing_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("missing.txt");

        let done = transform_file(&src, temp.path().join("out.txt"), None).unwrap();

        match &*wait(&done) {
            Outcome::Rejected(TransformError::Read { path, source }) => {
                assert_eq!(path, &src);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected read failure, got {other:?}"),
        }
    }
}
