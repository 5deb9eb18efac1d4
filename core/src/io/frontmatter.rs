// kiln/src/io/frontmatter.rs

//! YAML front matter: a `---` delimited header at the very top of a file.

use crate::core::metadata::Metadata;

const DELIMITER: &str = "---";

/// Splits `input` into `(header, body)` if it starts with a front matter block.
///
/// The opening delimiter must be the first line. The block ends at the next
/// line consisting solely of `---`. Returns `None` when there is no header
/// or it is never closed.
pub fn split(input: &str) -> Option<(&str, &str)> {
  let rest = input.strip_prefix(DELIMITER)?;
  let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

  let mut offset = 0;
  for line in rest.split_inclusive('\n') {
    if line.trim_end_matches(['\r', '\n']) == DELIMITER {
      let header = &rest[..offset];
      let body = &rest[offset + line.len()..];
      return Some((header, body));
    }
    offset += line.len();
  }
  None
}

/// Parses a YAML header into metadata. A blank header yields empty metadata.
pub fn parse(header: &str) -> Result<Metadata, serde_yaml::Error> {
  if header.trim().is_empty() {
    return Ok(Metadata::new());
  }
  let parsed: Option<Metadata> = serde_yaml::from_str(header)?;
  Ok(parsed.unwrap_or_default())
}

/// Splits and parses `input`. Returns the metadata and the body with the
/// header removed; input without a header comes back unchanged with empty
/// metadata.
pub fn extract(input: &str) -> Result<(Metadata, &str), serde_yaml::Error> {
  match split(input) {
    Some((header, body)) => Ok((parse(header)?, body)),
    None => Ok((Metadata::new(), input)),
  }
}
