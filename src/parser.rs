/*!

This module parses Intcode program source.

The language is given by the following EBNF:
    ```
    <program>  ::=  <word> (',' <word>)*
    <word>     ::=  ('-' | '+')? <digit>+
    ```

Whitespace, including newlines, is allowed around every word and comma, so a program file with
a trailing newline parses as is. Every word must fit in a signed 64 bit integer.

*/

use nom::{
  branch::alt,
  character::complete::{
    char as one_char,
    digit1,
    multispace0
  },
  combinator::{
    all_consuming,
    map_res,
    opt,
    recognize
  },
  multi::separated_nonempty_list,
  sequence::{
    delimited,
    pair
  },
  Err as NomErr,
  IResult
};

use crate::bytecode::Word;
use crate::error::ParseError;

/// A single signed decimal word.
pub fn word(input: &str) -> IResult<&str, Word> {
  map_res(
    recognize(pair(opt(alt((one_char('-'), one_char('+')))), digit1)),
    |text: &str| text.parse::<Word>()
  )(input)
}

/// Parses comma-separated program source into a program image.
pub fn parse_program(source: &str) -> Result<Vec<Word>, ParseError> {
  if source.trim().is_empty() {
    return Err(ParseError::Empty);
  }

  let separator = delimited(multispace0, one_char(','), multispace0);
  let program   = all_consuming(
    delimited(multispace0, separated_nonempty_list(separator, word), multispace0)
  );

  match program(source) {
    Ok((_rest, words))               => Ok(words),
    | Err(NomErr::Error((rest, _)))
    | Err(NomErr::Failure((rest, _))) => Err(malformed(source, rest)),
    Err(NomErr::Incomplete(_))       => Err(malformed(source, "")),
  }
}

/// Renders a program image back into source form.
pub fn format_program(words: &[Word]) -> String {
  words
    .iter()
    .map(Word::to_string)
    .collect::<Vec<String>>()
    .join(",")
}

/// Builds an error pointing at the token that begins `rest`, a suffix of `source`.
fn malformed(source: &str, rest: &str) -> ParseError {
  // The list parser gives back a trailing separator it could not complete, so step over it to
  // reach the offending token.
  let rest        = rest.trim_start();
  let token_start = rest.strip_prefix(',').unwrap_or(rest).trim_start();
  let offset      = source.len() - token_start.len();
  let found: String =
    token_start
      .chars()
      .take_while(|c| *c != ',' && !c.is_whitespace())
      .collect();

  let before = &source[..offset];
  let line   = before.matches('\n').count() + 1;
  let column = match before.rfind('\n') {
    Some(newline) => offset - newline,
    None          => offset + 1
  };

  ParseError::Malformed{ line, column, found }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_signed_words_with_whitespace() {
    assert_eq!(parse_program("1,2,3").unwrap(), vec![1, 2, 3]);
    assert_eq!(parse_program(" -1 , +2,\n3\n").unwrap(), vec![-1, 2, 3]);
    assert_eq!(
      parse_program("104,1125899906842624,99\n").unwrap(),
      vec![104, 1125899906842624, 99]
    );
  }

  #[test]
  fn empty_source() {
    assert_eq!(parse_program(""), Err(ParseError::Empty));
    assert_eq!(parse_program(" \n "), Err(ParseError::Empty));
  }

  #[test]
  fn reports_the_offending_token() {
    assert_eq!(
      parse_program("1,2,x"),
      Err(ParseError::Malformed{ line: 1, column: 5, found: "x".to_string() })
    );
    assert_eq!(
      parse_program("1,\n2,\n3,oops"),
      Err(ParseError::Malformed{ line: 3, column: 3, found: "oops".to_string() })
    );
    assert_eq!(
      parse_program("1,,2"),
      Err(ParseError::Malformed{ line: 1, column: 3, found: "".to_string() })
    );
    assert!(matches!(parse_program("1 2"), Err(ParseError::Malformed{ .. })));
  }

  #[test]
  fn rejects_words_too_large_for_the_machine() {
    assert_eq!(
      parse_program("1,99999999999999999999"),
      Err(ParseError::Malformed{ line: 1, column: 3, found: "99999999999999999999".to_string() })
    );
  }

  #[test]
  fn format_inverts_parse() {
    let program = vec![109, 1, 204, -1, 99];
    assert_eq!(parse_program(&format_program(&program)).unwrap(), program);
  }
}
