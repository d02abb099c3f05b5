//! Parses a text file of filenames into the ordered list of paths the
//! planner consumes: tokenizing with quoting, expanding `$(NAME)`
//! environment references, and normalizing path separators.

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_till1};
use nom::character::complete::multispace0;
use nom::combinator::{map, opt};
use nom::error::{convert_error, VerboseError};
use nom::multi::many0;
use nom::sequence::{delimited, preceded};
use nom::{Err as NomErr, IResult};

use crate::constants::{FILENAME_LENGTH, HUGE_STRING, NUM_ISIN_TILES};
use crate::error::MosaicError;

type VResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// A function returning the value of an environment variable by name.
/// Exists so tests can supply a fake environment instead of `std::env`.
pub trait EnvLookup {
  fn lookup(&self, name: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> EnvLookup for F {
  fn lookup(&self, name: &str) -> Option<String> {
    self(name)
  }
}

/// Reads `env::var` directly; the default lookup used by the CLI.
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
  fn lookup(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

fn quoted_token(input: &str) -> VResult<&str> {
  delimited(tag("\""), opt(is_not("\"")), tag("\""))(input).map(|(rest, body)| (rest, body.unwrap_or("").trim()))
}

fn bare_token(input: &str) -> VResult<&str> {
  take_till1(|c: char| c.is_whitespace())(input)
}

fn one_token(input: &str) -> VResult<&str> {
  alt((quoted_token, bare_token))(input)
}

fn tokens(input: &str) -> VResult<Vec<&str>> {
  many0(preceded(multispace0, one_token))(input)
}

/// Tokenizes the raw contents of a file list, enforcing quoting rules and
/// the per-token length cap. Does not yet perform environment expansion or
/// separator normalization.
pub fn tokenize(content: &str) -> Result<Vec<String>, MosaicError> {
  if let Some(long_line) = content.lines().find(|line| line.len() > HUGE_STRING) {
    return Err(MosaicError::syntax(format!(
      "file list line exceeds {HUGE_STRING} characters: {:.32}...",
      long_line
    )));
  }
  // An opening quote with no matching close is a syntax error; nom's
  // `is_not`/`tag` combination above simply fails to match, so detect it
  // explicitly by looking for an odd number of quotes before parsing.
  if content.matches('"').count() % 2 != 0 {
    return Err(MosaicError::syntax("unterminated quoted filename"));
  }

  let (rest, toks) = tokens(content).map_err(|e| match e {
    NomErr::Error(e) | NomErr::Failure(e) => MosaicError::syntax(convert_error(content, e)),
    NomErr::Incomplete(_) => MosaicError::syntax("incomplete file list"),
  })?;
  if !rest.trim().is_empty() {
    return Err(MosaicError::syntax(format!("unexpected trailing content: {rest:?}")));
  }

  let mut out = Vec::with_capacity(toks.len());
  for t in toks {
    if t.is_empty() {
      // All-spaces or empty quoted body: no token emitted, matching the
      // original file-list reader's handling of `ptr == tptr`.
      continue;
    }
    if t.len() > FILENAME_LENGTH {
      return Err(MosaicError::syntax(format!(
        "filename token exceeds {FILENAME_LENGTH} characters: {t:?}"
      )));
    }
    out.push(t.to_string());
  }
  Ok(out)
}

/// Expands every `$(NAME)` occurrence in `token` using `env`, repeating
/// until no reference remains. Bounded by `HUGE_STRING` passes so a
/// self-referential expansion cannot loop forever.
pub fn expand_env(token: &str, env: &impl EnvLookup) -> Result<String, MosaicError> {
  let mut current = token.to_string();
  for _ in 0..HUGE_STRING {
    match find_reference(&current)? {
      None => return Ok(current),
      Some((start, end, name)) => {
        let value = env
          .lookup(name)
          .ok_or_else(|| MosaicError::syntax(format!("undefined environment variable: {name}")))?;
        current.replace_range(start..end, &value);
      }
    }
  }
  Err(MosaicError::syntax("environment expansion did not terminate"))
}

/// Finds the first `$(NAME)` in `s`, returning its byte range (including the
/// `$(` and `)`) and the enclosed name. An unterminated `$(` is an error.
fn find_reference(s: &str) -> Result<Option<(usize, usize, &str)>, MosaicError> {
  match s.find("$(") {
    None => Ok(None),
    Some(start) => match s[start..].find(')') {
      None => Err(MosaicError::syntax("unterminated environment reference: $(")),
      Some(rel_end) => {
        let end = start + rel_end + 1;
        let name = &s[start + 2..start + rel_end];
        Ok(Some((start, end, name)))
      }
    },
  }
}

/// Applies the historical separator-normalization rule: a token containing
/// `:` gets every `/` rewritten to `\`; otherwise the first separator seen
/// wins and the rest of the token is rewritten to match it.
pub fn normalize_separators(token: &str) -> String {
  if token.contains(':') {
    return token.replace('/', "\\");
  }
  let first_sep = token.chars().find(|&c| c == '/' || c == '\\');
  match first_sep {
    None => token.to_string(),
    Some(sep) => {
      let other = if sep == '/' { '\\' } else { '/' };
      token.chars().map(|c| if c == other { sep } else { c }).collect()
    }
  }
}

/// Parses a complete file list: tokenizes, expands environment references,
/// normalizes separators, then caps the result at [`NUM_ISIN_TILES`],
/// logging (not failing) on overflow.
pub fn parse_file_list(content: &str, env: &impl EnvLookup) -> Result<Vec<String>, MosaicError> {
  let tokens = tokenize(content)?;
  let mut out = Vec::with_capacity(tokens.len());
  for t in tokens {
    let expanded = expand_env(&t, env)?;
    out.push(normalize_separators(&expanded));
  }
  if out.len() > NUM_ISIN_TILES {
    log::warn!(
      "file list contains {} entries, more than the {} tile cap; dropping the rest",
      out.len(),
      NUM_ISIN_TILES
    );
    out.truncate(NUM_ISIN_TILES);
  }
  Ok(out)
}
