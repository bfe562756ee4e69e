use crate::error::{BenchError, BenchResult};
use biodivine_lib_param_bn::biodivine_std::bitvector::{ArrayBitVector, BitVector};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

pub const SOURCE_KEY: &str = "source";
pub const TARGET_KEY: &str = "target";

/// Identifier of a single network state, written as `0`/`1` characters in
/// variable order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(String);

impl StateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bit_vector(&self) -> ArrayBitVector {
        ArrayBitVector::from(self.0.chars().map(|c| c == '1').collect::<Vec<_>>())
    }
}

impl From<&ArrayBitVector> for StateId {
    fn from(state: &ArrayBitVector) -> Self {
        let id = state
            .values()
            .into_iter()
            .map(|bit| if bit { '1' } else { '0' })
            .collect();
        StateId(id)
    }
}

impl TryFrom<&str> for StateId {
    type Error = BenchError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() || !value.chars().all(|c| c == '0' || c == '1') {
            return Err(BenchError::InvalidBenchmark(format!(
                "'{}' is not a state identifier",
                value
            )));
        }
        Ok(StateId(value.to_string()))
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single generated benchmark: `#key:value` header lines followed by the
/// model text, which is kept as an opaque blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkFile {
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl BenchmarkFile {
    pub fn new(source: &StateId, target: &StateId, body: String) -> Self {
        BenchmarkFile {
            headers: vec![
                (SOURCE_KEY.to_string(), source.to_string()),
                (TARGET_KEY.to_string(), target.to_string()),
            ],
            body,
        }
    }

    /// Splits leading `#key:value` lines from the body. Comment lines without
    /// a colon end the header block.
    pub fn parse(content: &str) -> Self {
        let mut headers = Vec::new();
        let mut rest = content;
        while let Some(line) = rest.strip_prefix('#') {
            let (line, tail) = match line.find('\n') {
                Some(i) => (&line[..i], &line[i + 1..]),
                None => (line, ""),
            };
            match line.split_once(':') {
                Some((key, value)) => {
                    headers.push((key.trim().to_string(), value.trim_end().to_string()))
                }
                None => break,
            }
            rest = tail;
        }
        BenchmarkFile {
            headers,
            body: rest.to_string(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> BenchResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source(&self) -> BenchResult<StateId> {
        self.state_header(SOURCE_KEY)
    }

    pub fn target(&self) -> BenchResult<StateId> {
        self.state_header(TARGET_KEY)
    }

    fn state_header(&self, key: &str) -> BenchResult<StateId> {
        let value = self
            .header(key)
            .ok_or_else(|| BenchError::InvalidBenchmark(format!("missing #{} header", key)))?;
        StateId::try_from(value)
    }
}

impl Display for BenchmarkFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.headers {
            writeln!(f, "#{}:{}", key, value)?;
        }
        write!(f, "{}", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_precede_the_model_body() {
        let source = StateId::try_from("0101").unwrap();
        let target = StateId::try_from("1100").unwrap();
        let file = BenchmarkFile::new(&source, &target, "a -> b\n$b: a\n".to_string());
        assert_eq!(
            file.to_string(),
            "#source:0101\n#target:1100\na -> b\n$b: a\n"
        );
    }

    #[test]
    fn parse_recovers_headers_and_body() {
        let file = BenchmarkFile::parse("#source:01\n#target:10\n#position:a:1,2\na -> b\n");
        assert_eq!(file.source().unwrap().as_str(), "01");
        assert_eq!(file.target().unwrap().as_str(), "10");
        assert_eq!(file.header("position"), Some("a:1,2"));
        assert_eq!(file.body, "a -> b\n");
    }

    #[test]
    fn comment_without_colon_ends_headers() {
        let file = BenchmarkFile::parse("#source:1\n# plain comment\na -> b\n");
        assert_eq!(file.headers.len(), 1);
        assert_eq!(file.body, "# plain comment\na -> b\n");
    }

    #[test]
    fn missing_target_is_reported() {
        let file = BenchmarkFile::parse("#source:1\na -> b\n");
        assert!(file.target().is_err());
    }

    #[test]
    fn state_id_matches_bit_vector() {
        let state = ArrayBitVector::from(vec![true, false, false, true]);
        let id = StateId::from(&state);
        assert_eq!(id.as_str(), "1001");
        assert_eq!(id.to_bit_vector().values(), state.values());
        assert!(StateId::try_from("10x1").is_err());
    }
}
