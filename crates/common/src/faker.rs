//! Deferred expression interpreter
//!
//! Values such as `faker.person.fullName()` are not stored literally: they
//! are evaluated into a concrete preview value while the expression text is
//! kept for export. Evaluation never reaches a general-purpose evaluator.
//! The expression is parsed as `faker.<path>(<literal args>)` and the path
//! is looked up in an allow-listed table of generators.

use chrono::{SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

pub const NAMESPACE: &str = "faker";
pub const NAMESPACE_PREFIX: &str = "faker.";

/// How a typed value should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    /// A plain value stored as typed
    Literal,
    /// An expression still being typed; offer completions
    Partial,
    /// A finished call ready for evaluation
    Complete,
}

pub fn classify(text: &str) -> ExpressionKind {
    let text = text.trim();
    if !text.starts_with(NAMESPACE_PREFIX) {
        ExpressionKind::Literal
    } else if text.ends_with(')') {
        ExpressionKind::Complete
    } else {
        ExpressionKind::Partial
    }
}

/// A generator receives the shared RNG and the parsed call arguments.
pub type Generator = fn(&mut StdRng, &Args<'_>) -> std::result::Result<Value, String>;

/// Allow-listed table of generators keyed by dotted path below `faker.`
pub struct FakerRegistry {
    generators: BTreeMap<String, Generator>,
    rng: StdRng,
}

impl std::fmt::Debug for FakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakerRegistry")
            .field("generators", &self.generators.len())
            .finish()
    }
}

impl Default for FakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FakerRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Registry with reproducible output
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut registry = Self {
            generators: BTreeMap::new(),
            rng,
        };
        for (path, generator) in BUILTINS {
            registry.register(*path, *generator);
        }
        registry
    }

    pub fn register(&mut self, path: impl Into<String>, generator: Generator) {
        self.generators.insert(path.into(), generator);
    }

    /// Evaluate a complete expression into its display string.
    pub fn evaluate(&mut self, expression: &str) -> Result<String> {
        let expression = expression.trim();
        let value = self.evaluate_value(expression)?;
        coerce(expression, value)
    }

    /// Evaluate a complete expression into its raw JSON value.
    pub fn evaluate_value(&mut self, expression: &str) -> Result<Value> {
        let call = parse_call(expression).map_err(|reason| Error::evaluation(expression, reason))?;

        let generator = self.generators.get(&call.path).copied().ok_or_else(|| {
            Error::evaluation(expression, format!("unknown generator '{}{}'", NAMESPACE_PREFIX, call.path))
        })?;

        generator(&mut self.rng, &Args(&call.args))
            .map_err(|reason| Error::evaluation(expression, reason))
    }

    /// Member names directly below the dotted path typed so far.
    pub fn suggest(&self, partial: &str, limit: usize) -> Vec<String> {
        let partial = partial.trim();
        if partial.contains('(') {
            return Vec::new();
        }

        let Some(rest) = partial.strip_prefix(NAMESPACE_PREFIX) else {
            if !partial.is_empty() && NAMESPACE.starts_with(partial) {
                return vec![NAMESPACE.to_string()];
            }
            return Vec::new();
        };

        let (parent, prefix) = match rest.rfind('.') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => ("", rest),
        };

        let names: BTreeSet<&str> = self
            .generators
            .keys()
            .filter_map(|path| {
                let remainder = if parent.is_empty() {
                    Some(path.as_str())
                } else {
                    path.strip_prefix(parent).and_then(|r| r.strip_prefix('.'))
                };
                remainder
                    .and_then(|r| r.split('.').next())
                    .filter(|next| next.starts_with(prefix))
            })
            .collect();

        names.into_iter().take(limit).map(String::from).collect()
    }
}

/// Coerce an evaluated value into the string stored as the field value.
pub fn coerce(expression: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::evaluation(expression, "expression produced no value")),
        other => Ok(serde_json::to_string(&other)?),
    }
}

// ============================================================================
// Call parsing
// ============================================================================

#[derive(Debug, PartialEq)]
struct Call {
    path: String,
    args: Vec<Value>,
}

fn parse_call(expression: &str) -> std::result::Result<Call, String> {
    CallParser::new(expression).call()
}

struct CallParser {
    chars: Vec<char>,
    pos: usize,
}

impl CallParser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}' but found '{}'", expected, c)),
            None => Err(format!("expected '{}' but the expression ended", expected)),
        }
    }

    fn ident(&mut self) -> std::result::Result<String, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let valid = if self.pos == start {
                c.is_ascii_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_ascii_alphanumeric() || c == '_' || c == '$'
            };
            if !valid {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => format!("expected a name but found '{}'", c),
                None => "expected a name but the expression ended".to_string(),
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn call(&mut self) -> std::result::Result<Call, String> {
        self.skip_ws();
        let mut segments = vec![self.ident()?];
        while self.peek() == Some('.') {
            self.pos += 1;
            segments.push(self.ident()?);
        }

        if segments[0] != NAMESPACE {
            return Err(format!("unknown namespace '{}'", segments[0]));
        }
        if segments.len() < 2 {
            return Err("missing generator path".to_string());
        }

        self.expect('(')?;
        let args = self.args()?;

        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(format!("unexpected '{}' after call", c));
        }

        Ok(Call {
            path: segments[1..].join("."),
            args,
        })
    }

    fn args(&mut self) -> std::result::Result<Vec<Value>, String> {
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(args);
            }
            args.push(self.literal()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(')') => return Ok(args),
                Some(c) => return Err(format!("expected ',' or ')' but found '{}'", c)),
                None => return Err("unterminated argument list".to_string()),
            }
        }
    }

    fn literal(&mut self) -> std::result::Result<Value, String> {
        self.skip_ws();
        match self.peek() {
            Some('"') | Some('\'') => self.string().map(Value::String),
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(c) if c == '-' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => Err(format!("unexpected '{}' in arguments", c)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        let quote = self.bump().ok_or("expected a string")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err("unterminated string".to_string()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn array(&mut self) -> std::result::Result<Value, String> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.literal()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(Value::Array(items)),
                Some(c) => return Err(format!("expected ',' or ']' but found '{}'", c)),
                None => return Err("unterminated array".to_string()),
            }
        }
    }

    fn object(&mut self) -> std::result::Result<Value, String> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some('"') | Some('\'') => {
                    let key = self.string()?;
                    self.expect(':')?;
                    map.insert(key, self.literal()?);
                }
                Some(_) => {
                    let key = self.ident()?;
                    self.expect(':')?;
                    map.insert(key, self.literal()?);
                }
                None => return Err("unterminated object".to_string()),
            }
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(c) => return Err(format!("expected ',' or '}}' but found '{}'", c)),
                None => return Err("unterminated object".to_string()),
            }
        }
    }

    fn number(&mut self) -> std::result::Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let sign_ok = (c == '-' || c == '+')
                && (self.pos == start || matches!(self.chars[self.pos - 1], 'e' | 'E'));
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || sign_ok {
                self.pos += 1;
            } else {
                break;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::from(n));
        }
        text.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid number '{}'", text))
    }

    fn keyword(&mut self) -> std::result::Result<Value, String> {
        let word = self.ident()?;
        match word.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            other => Err(format!("unsupported identifier '{}'", other)),
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Largest length or repetition count a generator accepts
pub const MAX_COUNT: usize = 10_000;

/// Parsed call arguments
pub struct Args<'a>(pub &'a [Value]);

impl Args<'_> {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// First argument when it is an options object
    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.get(0).and_then(Value::as_object)
    }

    pub fn option_i64(&self, key: &str) -> Option<i64> {
        self.options().and_then(|o| o.get(key)).and_then(Value::as_i64)
    }

    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.options().and_then(|o| o.get(key)).and_then(Value::as_f64)
    }

    /// A count given positionally or as `{ length }` / `{ count }`,
    /// at most [`MAX_COUNT`]
    pub fn count(&self, default: usize) -> std::result::Result<usize, String> {
        let requested = match self.get(0) {
            None => return Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| format!("count must be a non-negative integer, got {}", n))?,
            Some(Value::Object(_)) => {
                let Some(n) = self.option_i64("length").or_else(|| self.option_i64("count")) else {
                    return Ok(default);
                };
                u64::try_from(n).map_err(|_| format!("count must not be negative, got {}", n))?
            }
            Some(_) => return Err("expected a count or an options object".to_string()),
        };

        if requested > MAX_COUNT as u64 {
            return Err(format!("count {} exceeds the limit of {}", requested, MAX_COUNT));
        }
        Ok(requested as usize)
    }

    /// Inclusive range given as `(max)` or `({ min, max })`
    pub fn int_range(&self, min: i64, max: i64) -> std::result::Result<(i64, i64), String> {
        let (lo, hi) = match self.get(0) {
            Some(Value::Number(n)) => (min, n.as_i64().ok_or("max must be an integer")?),
            Some(Value::Object(_)) => (
                self.option_i64("min").unwrap_or(min),
                self.option_i64("max").unwrap_or(max),
            ),
            Some(_) => return Err("expected a number or an options object".to_string()),
            None => (min, max),
        };
        if lo > hi {
            return Err(format!("min {} is greater than max {}", lo, hi));
        }
        Ok((lo, hi))
    }
}

// ============================================================================
// Built-in generators
// ============================================================================

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Alice", "Amara", "Bob", "Carmen", "Chen", "Dana", "Diego", "Elena", "Farah",
    "Grace", "Hana", "Ivan", "Jamal", "Kenji", "Lena", "Liam", "Maya", "Noah", "Olga", "Priya",
    "Quinn", "Rosa", "Sam", "Tariq", "Uma", "Victor", "Wen", "Yara", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Baker", "Castillo", "Dubois", "Evans", "Fischer", "Garcia", "Hopper", "Ito",
    "Jensen", "Kowalski", "Lovelace", "Mendes", "Nakamura", "Okafor", "Patel", "Rossi", "Silva",
    "Turing", "Ueda", "Vasquez", "Weber", "Yilmaz", "Zhang",
];

const JOB_TITLES: &[&str] = &[
    "Software Engineer", "QA Analyst", "Product Manager", "Data Scientist", "Designer",
    "Support Specialist", "Account Executive", "Operations Lead",
];

const PREFIXES: &[&str] = &["Mr.", "Ms.", "Mrs.", "Dr.", "Mx."];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "test.io", "mail.test"];

const CITIES: &[&str] = &[
    "Lisbon", "Osaka", "Nairobi", "Toronto", "Berlin", "Austin", "Lima", "Hanoi", "Oslo",
    "Melbourne", "Cairo", "Seoul",
];

const COUNTRIES: &[&str] = &[
    "Portugal", "Japan", "Kenya", "Canada", "Germany", "United States", "Peru", "Vietnam",
    "Norway", "Australia", "Egypt", "South Korea",
];

const STATES: &[&str] = &[
    "California", "Texas", "Oregon", "New York", "Ohio", "Florida", "Colorado", "Maine",
];

const STREETS: &[&str] = &["Oak", "Maple", "Cedar", "Elm", "Pine", "Willow", "Harbor", "Hill"];

const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Drive", "Court"];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "and Sons", "Ltd", "Labs"];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const YEAR_MS: i64 = 365 * DAY_MS;

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn digits(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn text(s: impl Into<String>) -> std::result::Result<Value, String> {
    Ok(Value::String(s.into()))
}

fn first_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, FIRST_NAMES))
}

fn last_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, LAST_NAMES))
}

fn full_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)))
}

fn sex(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, &["female", "male"]))
}

fn job_title(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, JOB_TITLES))
}

fn prefix(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, PREFIXES))
}

fn user_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    text(format!("{}_{}{}", first, last, rng.gen_range(1..100)).to_lowercase())
}

fn email(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let domain = pick(rng, DOMAINS);
    text(format!("{}.{}{}@{}", first, last, rng.gen_range(1..100), domain).to_lowercase())
}

fn domain_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, DOMAINS))
}

fn url(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(format!("https://www.{}/", pick(rng, DOMAINS)))
}

fn ipv4(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    let octets: Vec<String> = (0..4).map(|_| rng.gen_range(0..=255u8).to_string()).collect();
    text(octets.join("."))
}

fn password(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let len = args.count(15)?;
    text((0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect::<String>())
}

fn phone_number(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(format!("{}-{}-{}", digits(rng, 3), digits(rng, 3), digits(rng, 4)))
}

fn city(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, CITIES))
}

fn country(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, COUNTRIES))
}

fn state(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, STATES))
}

fn street_address(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(format!(
        "{} {} {}",
        rng.gen_range(1..10_000),
        pick(rng, STREETS),
        pick(rng, STREET_SUFFIXES)
    ))
}

fn zip_code(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(digits(rng, 5))
}

fn company_name(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(format!("{} {}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES)))
}

fn word(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(pick(rng, WORDS))
}

fn word_list(rng: &mut StdRng, count: usize) -> Vec<&'static str> {
    (0..count).map(|_| pick(rng, WORDS)).collect()
}

fn words(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let count = args.count(3)?;
    text(word_list(rng, count).join(" "))
}

fn sentence_of(rng: &mut StdRng, count: usize) -> String {
    let mut sentence = word_list(rng, count.max(1)).join(" ");
    if let Some(first) = sentence.get(..1).map(str::to_uppercase) {
        sentence.replace_range(..1, &first);
    }
    sentence.push('.');
    sentence
}

fn sentence(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let count = match args.get(0) {
        Some(_) => args.count(6)?,
        None => rng.gen_range(4..=8),
    };
    text(sentence_of(rng, count))
}

fn paragraph(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let count = args.count(3)?;
    let sentences: Vec<String> = (0..count)
        .map(|_| {
            let n = rng.gen_range(4..=8);
            sentence_of(rng, n)
        })
        .collect();
    text(sentences.join(" "))
}

fn int(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let (lo, hi) = args.int_range(0, 99_999)?;
    Ok(Value::from(rng.gen_range(lo..=hi)))
}

fn check_float_range(lo: f64, hi: f64) -> std::result::Result<(), String> {
    if lo > hi {
        return Err(format!("min {} is greater than max {}", lo, hi));
    }
    let span = hi - lo;
    if !span.is_finite() || span > f64::MAX / 2.0 {
        return Err(format!("range {}..{} is too wide", lo, hi));
    }
    Ok(())
}

fn float(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let (lo, hi) = match args.get(0) {
        Some(Value::Number(n)) => (0.0, n.as_f64().unwrap_or(1.0)),
        _ => (
            args.option_f64("min").unwrap_or(0.0),
            args.option_f64("max").unwrap_or(1.0),
        ),
    };
    check_float_range(lo, hi)?;
    let digits = args.option_i64("fractionDigits").unwrap_or(2).clamp(0, 10) as i32;
    let scale = 10f64.powi(digits);
    let value = (rng.gen_range(lo..=hi) * scale).round() / scale;
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| "generated value is not finite".to_string())
}

fn amount(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let lo = args.option_f64("min").unwrap_or(0.0);
    let hi = args.option_f64("max").unwrap_or(1000.0);
    check_float_range(lo, hi)?;
    let dec = args.option_i64("dec").unwrap_or(2).clamp(0, 10) as usize;
    text(format!("{:.*}", dec, rng.gen_range(lo..=hi)))
}

fn boolean(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    Ok(Value::Bool(rng.gen_bool(0.5)))
}

fn uuid_v4(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    text(uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string())
}

fn alpha(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let len = args.count(1)?;
    text(
        (0..len)
            .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
            .collect::<String>(),
    )
}

fn alphanumeric(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let len = args.count(1)?;
    text((0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect::<String>())
}

fn numeric(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let len = args.count(1)?;
    text(digits(rng, len))
}

const DATE_OUT_OF_RANGE: &str = "date out of range";

/// Random instant up to `amount` units away from now
fn offset_date(
    rng: &mut StdRng,
    amount: i64,
    unit_ms: i64,
    forward: bool,
) -> std::result::Result<Value, String> {
    let span_ms = amount.checked_mul(unit_ms).ok_or(DATE_OUT_OF_RANGE)?;
    let offset = chrono::Duration::try_milliseconds(rng.gen_range(1..=span_ms.max(1)))
        .ok_or(DATE_OUT_OF_RANGE)?;
    let now = Utc::now();
    let date = if forward {
        now.checked_add_signed(offset)
    } else {
        now.checked_sub_signed(offset)
    }
    .ok_or(DATE_OUT_OF_RANGE)?;
    text(date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn past(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let years = args.option_i64("years").unwrap_or(1);
    offset_date(rng, years, YEAR_MS, false)
}

fn future(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let years = args.option_i64("years").unwrap_or(1);
    offset_date(rng, years, YEAR_MS, true)
}

fn recent(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let days = args.option_i64("days").unwrap_or(1);
    offset_date(rng, days, DAY_MS, false)
}

fn soon(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let days = args.option_i64("days").unwrap_or(1);
    offset_date(rng, days, DAY_MS, true)
}

fn birthdate(rng: &mut StdRng, _: &Args<'_>) -> std::result::Result<Value, String> {
    let age_days = rng.gen_range(18 * 365..=80 * 365);
    let date = Utc::now().date_naive() - chrono::Duration::days(age_days);
    text(date.format("%Y-%m-%d").to_string())
}

fn array_element(rng: &mut StdRng, args: &Args<'_>) -> std::result::Result<Value, String> {
    let items = args
        .get(0)
        .and_then(Value::as_array)
        .ok_or("arrayElement expects an array")?;
    items
        .choose(rng)
        .cloned()
        .ok_or_else(|| "arrayElement received an empty array".to_string())
}

const BUILTINS: &[(&str, Generator)] = &[
    ("person.firstName", first_name),
    ("person.lastName", last_name),
    ("person.middleName", first_name),
    ("person.fullName", full_name),
    ("person.sex", sex),
    ("person.jobTitle", job_title),
    ("person.prefix", prefix),
    ("internet.email", email),
    ("internet.userName", user_name),
    ("internet.username", user_name),
    ("internet.domainName", domain_name),
    ("internet.url", url),
    ("internet.ipv4", ipv4),
    ("internet.password", password),
    ("phone.number", phone_number),
    ("location.city", city),
    ("location.country", country),
    ("location.state", state),
    ("location.streetAddress", street_address),
    ("location.zipCode", zip_code),
    ("company.name", company_name),
    ("lorem.word", word),
    ("lorem.words", words),
    ("lorem.sentence", sentence),
    ("lorem.paragraph", paragraph),
    ("number.int", int),
    ("number.float", float),
    ("finance.amount", amount),
    ("datatype.boolean", boolean),
    ("string.uuid", uuid_v4),
    ("string.alpha", alpha),
    ("string.alphanumeric", alphanumeric),
    ("string.numeric", numeric),
    ("date.past", past),
    ("date.future", future),
    ("date.recent", recent),
    ("date.soon", soon),
    ("date.birthdate", birthdate),
    ("helpers.arrayElement", array_element),
];
