//! Run-length coding of pixel words.
//!
//! The stream is a sequence of tokens, each starting with a 16-bit header:
//!
//! - A header with the high bit clear is a *match token*. The header is a
//!   repeat count and exactly one value word follows: `[count, value]`.
//! - A header with the high bit set is a *literal token*. The low 15 bits give
//!   a count and that many words follow verbatim: `[0x8000 | count, ...]`.
//!
//! Counts never exceed [`MAX_RUN`]; longer runs are split over several
//! consecutive tokens so the flag bit is never clobbered.

use std::iter;

use thiserror::Error;

/// Flag marking a literal token header.
pub const LITERAL_FLAG: u16 = 0x8000;

/// Mask extracting the count from a token header.
pub const COUNT_MASK: u16 = !LITERAL_FLAG;

/// The longest run a single token can describe.
pub const MAX_RUN: usize = COUNT_MASK as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RleError {
    #[error("run-length coding needs at least 2 words, got {0}")]
    InvalidInput(usize),

    #[error("token at word {offset} declares {count} words but only {available} remain")]
    MalformedStream {
        offset: usize,
        count: usize,
        available: usize,
    },
}

/// A single decoded token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `value` repeated `count` times
    Run { count: usize, value: u16 },

    /// Words copied verbatim
    Literal(&'a [u16]),
}

impl Token<'_> {
    /// Number of pixel words this token expands to.
    pub fn expanded_len(&self) -> usize {
        match self {
            Token::Run { count, .. } => *count,
            Token::Literal(values) => values.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    Mismatch,
}

/// Pick the state for a run starting at `start`, returning it together with
/// the first index not yet known to belong to the run.
fn classify(data: &[u16], start: usize) -> (State, usize) {
    if start + 1 < data.len() && data[start] == data[start + 1] {
        (State::Match, start + 2)
    } else {
        (State::Mismatch, start + 1)
    }
}

fn push_match(output: &mut Vec<u16>, count: usize, value: u16) {
    debug_assert!(count > 0 && count <= MAX_RUN);
    output.push(count as u16);
    output.push(value);
}

fn push_literal(output: &mut Vec<u16>, values: &[u16]) {
    debug_assert!(!values.is_empty() && values.len() <= MAX_RUN);
    output.push(LITERAL_FLAG | values.len() as u16);
    output.extend_from_slice(values);
}

/// Encode a buffer of pixel words into a run-length token stream.
///
/// Repeats of two or more words become match tokens; everything between them
/// is gathered into literal tokens.
pub fn encode(data: &[u16]) -> Result<Vec<u16>, RleError> {
    if data.len() < 2 {
        return Err(RleError::InvalidInput(data.len()));
    }

    let mut output = Vec::with_capacity(data.len() / 2 + 2);

    let mut start = 0;
    let (mut state, mut index) = classify(data, start);

    while index < data.len() {
        match state {
            State::Match => {
                if data[index] == data[start] && index - start < MAX_RUN {
                    index += 1;
                    continue;
                }

                push_match(&mut output, index - start, data[start]);
                start = index;
            }
            State::Mismatch => {
                let repeat_begins = index + 1 < data.len() && data[index] == data[index + 1];
                if !repeat_begins && index - start < MAX_RUN {
                    index += 1;
                    continue;
                }

                push_literal(&mut output, &data[start..index]);
                start = index;
            }
        }

        (state, index) = classify(data, start);
    }

    // Flush whatever run is still open
    match state {
        State::Match => push_match(&mut output, data.len() - start, data[start]),
        State::Mismatch => push_literal(&mut output, &data[start..]),
    }

    Ok(output)
}

/// Iterator over the tokens of an encoded stream.
///
/// Yields an error and then stops if a token runs past the end of the input.
pub struct Tokens<'a> {
    data: &'a [u16],
    cursor: usize,
}

/// Walk the tokens of an encoded stream without expanding them.
pub fn tokens(data: &[u16]) -> Tokens<'_> {
    Tokens { data, cursor: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, RleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.cursor;
        let header = *self.data.get(offset)?;
        let available = self.data.len() - offset - 1;

        let (token, width) = if header & LITERAL_FLAG != 0 {
            let count = (header & COUNT_MASK) as usize;
            match self.data.get(offset + 1..offset + 1 + count) {
                Some(values) => (Token::Literal(values), count + 1),
                None => {
                    self.cursor = self.data.len();
                    return Some(Err(RleError::MalformedStream { offset, count, available }));
                }
            }
        } else {
            match self.data.get(offset + 1) {
                Some(&value) => (Token::Run { count: header as usize, value }, 2),
                None => {
                    self.cursor = self.data.len();
                    return Some(Err(RleError::MalformedStream { offset, count: 1, available }));
                }
            }
        };

        self.cursor += width;
        Some(Ok(token))
    }
}

/// Expand a run-length token stream back into pixel words.
pub fn decode(data: &[u16]) -> Result<Vec<u16>, RleError> {
    if data.len() < 2 {
        return Err(RleError::InvalidInput(data.len()));
    }

    let mut output = Vec::with_capacity(data.len() * 2);
    for token in tokens(data) {
        match token? {
            Token::Run { count, value } => output.extend(iter::repeat(value).take(count)),
            Token::Literal(values) => output.extend_from_slice(values),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_become_match_tokens() {
        let data = [5, 5, 5, 5, 2, 2, 9, 9, 9];
        let encoded = encode(&data).unwrap();

        assert_eq!(encoded, vec![4, 5, 2, 2, 3, 9]);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn distinct_words_become_one_literal() {
        let encoded = encode(&[1, 2, 3, 4]).unwrap();

        assert_eq!(encoded, vec![0x8004, 1, 2, 3, 4]);
        assert_eq!(decode(&encoded).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn mixed_literal_and_match() {
        assert_eq!(decode(&[0x8002, 11, 22, 3, 99]).unwrap(), vec![11, 22, 99, 99, 99]);

        let data = [11, 22, 99, 99, 99, 7];
        let encoded = encode(&data).unwrap();
        assert_eq!(encoded, vec![0x8002, 11, 22, 3, 99, 0x8001, 7]);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn short_inputs() {
        assert_eq!(encode(&[]), Err(RleError::InvalidInput(0)));
        assert_eq!(encode(&[7]), Err(RleError::InvalidInput(1)));
        assert_eq!(decode(&[]), Err(RleError::InvalidInput(0)));
        assert_eq!(decode(&[0x8001]), Err(RleError::InvalidInput(1)));

        assert_eq!(encode(&[7, 7]).unwrap(), vec![2, 7]);
        assert_eq!(encode(&[7, 8]).unwrap(), vec![0x8002, 7, 8]);
        assert_eq!(encode(&[7, 7, 8]).unwrap(), vec![2, 7, 0x8001, 8]);
        assert_eq!(encode(&[7, 8, 8]).unwrap(), vec![0x8001, 7, 2, 8]);
        assert_eq!(encode(&[7, 8, 9]).unwrap(), vec![0x8003, 7, 8, 9]);
        assert_eq!(encode(&[7, 7, 7]).unwrap(), vec![3, 7]);
    }

    #[test]
    fn long_runs_are_split() {
        let data = vec![0xABCD; MAX_RUN * 2 + 5];
        let encoded = encode(&data).unwrap();

        assert_eq!(encoded, vec![0x7FFF, 0xABCD, 0x7FFF, 0xABCD, 5, 0xABCD]);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn long_runs_leave_a_single_word_tail() {
        let mut data = vec![3; MAX_RUN + 1];
        data.push(4);
        let encoded = encode(&data).unwrap();

        assert_eq!(encoded, vec![0x7FFF, 3, 0x8002, 3, 4]);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn long_literals_are_split() {
        let data: Vec<u16> = (0..(MAX_RUN + 10) as u32).map(|v| v as u16).collect();
        let encoded = encode(&data).unwrap();

        assert_eq!(encoded[0], 0xFFFF);
        assert_eq!(encoded[MAX_RUN + 1], 0x8000 | 10);
        assert_eq!(encoded.len(), data.len() + 2);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn truncated_streams_are_rejected() {
        assert_eq!(
            decode(&[0x8003, 1, 2]),
            Err(RleError::MalformedStream { offset: 0, count: 3, available: 2 })
        );
        assert_eq!(
            decode(&[2, 9, 4]),
            Err(RleError::MalformedStream { offset: 2, count: 1, available: 0 })
        );
    }

    #[test]
    fn token_walk() {
        let stream = [3, 99, 0x8002, 11, 22];
        let walked: Vec<_> = tokens(&stream).collect::<Result<_, _>>().unwrap();

        assert_eq!(
            walked,
            vec![Token::Run { count: 3, value: 99 }, Token::Literal(&[11, 22])]
        );
        assert_eq!(walked.iter().map(Token::expanded_len).sum::<usize>(), 5);
    }
}
