#![forbid(unsafe_code)]

//! Boolean search queries over row columns.
//!
//! A query string is compiled once per pass into a postfix program of
//! [`Command`]s and evaluated against each row's column texts.
//!
//! # Grammar
//!
//! | Input              | Meaning                                        |
//! |--------------------|------------------------------------------------|
//! | `a b`              | both terms match (implicit AND)                |
//! | `a \| b`           | either term matches                            |
//! | `!a`               | term does not match                            |
//! | `( ... )`          | grouping                                       |
//! | `+word`            | case-insensitive whole-text equality           |
//! | `r:pat`            | regular expression (`reg:`, `regex:` too)      |
//! | `=n >n <n >=n <=n` | numeric comparison on the leading number       |
//! | `column:term`      | test a column other than `name`                |
//! | `"two words"`      | quoted term                                    |
//!
//! Unknown characters are skipped. The parser never fails: malformed input
//! degrades to whatever terms could be read.
//!
//! # Invariants
//!
//! 1. Within a group, a term preceded by `|` is not ANDed with its
//!    predecessor; every other term after the first is.
//! 2. Pending `!`/`|` operators are emitted in reverse order after their
//!    term.
//! 3. Tests without a column test `name`.
//! 4. A test whose column text is unavailable is skipped, not failed.
//! 5. Binary operators with fewer than two operands are no-ops, as is `!`
//!    on an empty stack.
//! 6. The result is the bottom of the evaluation stack; an empty stack is
//!    `false`.
//!
//! # Failure Modes
//!
//! | Failure                | Cause                         | Behavior               |
//! |------------------------|-------------------------------|------------------------|
//! | Invalid regex          | bad `r:` pattern              | that test is `false`   |
//! | Unbalanced `)`         | more closes than opens        | parsing stops there    |
//! | Unterminated quote     | missing closing `"`           | quote skipped          |

use core::fmt;
use std::collections::HashMap;

use bitflags::bitflags;
use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;

bitflags! {
    /// Set of columns, used to skip computing texts nobody asked for.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ColumnMask: u16 {
        const NAME = 1 << 0;
        const VALUE = 1 << 1;
        const METADATA = 1 << 2;
        const TYPE = 1 << 3;
        const CPP_TYPE = 1 << 4;
        const CLASS = 1 << 5;
        const CATEGORY = 1 << 6;
        const ADDRESS = 1 << 7;
        const SIZE = 1 << 8;
    }
}

/// A searchable column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnId {
    Name,
    Value,
    Metadata,
    Type,
    CppType,
    Class,
    Category,
    Address,
    Size,
}

impl ColumnId {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Name,
        Self::Value,
        Self::Metadata,
        Self::Type,
        Self::CppType,
        Self::Class,
        Self::Category,
        Self::Address,
        Self::Size,
    ];

    /// Keyword used in `keyword:term`.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Value => "value",
            Self::Metadata => "metadata",
            Self::Type => "type",
            Self::CppType => "cpptype",
            Self::Class => "class",
            Self::Category => "category",
            Self::Address => "address",
            Self::Size => "size",
        }
    }

    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == word)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn mask(self) -> ColumnMask {
        ColumnMask::from_bits_truncate(1 << (self as u16))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How a test compares its term with the column text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Modifier {
    #[default]
    Contains,
    Exact,
    /// Case-insensitive regex match. Unquoted patterns are tokenized like
    /// any other term, so metacharacters such as `(`, `|` or `.` are lost
    /// unless the pattern is quoted: `r:"^x("`.
    Regex,
    Equal,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

/// One term test.
#[derive(Clone, Debug)]
pub struct Test {
    pub ident: String,
    pub column: ColumnId,
    pub modifier: Modifier,
    folded: String,
    regex: Option<Regex>,
}

impl PartialEq for Test {
    fn eq(&self, other: &Self) -> bool {
        self.ident == other.ident && self.column == other.column && self.modifier == other.modifier
    }
}

impl Test {
    fn new(ident: String, column: ColumnId, modifier: Modifier) -> Self {
        let regex = match modifier {
            Modifier::Regex => match RegexBuilder::new(&ident).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(err) => {
                    crate::debug!(target: "propwatch::search", pattern = %ident, error = %err, "invalid regex term");
                    None
                }
            },
            _ => None,
        };
        Self {
            folded: ident.to_lowercase(),
            ident,
            column,
            modifier,
            regex,
        }
    }

    /// Evaluate against one column text.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self.modifier {
            Modifier::Contains => text.to_lowercase().contains(&self.folded),
            Modifier::Exact => text.to_lowercase() == self.folded,
            Modifier::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(text)),
            Modifier::Equal => leading_f64(text) == leading_f64(&self.ident),
            Modifier::Greater => leading_f64(text) > leading_f64(&self.ident),
            Modifier::Less => leading_f64(text) < leading_f64(&self.ident),
            Modifier::GreaterEqual => leading_f64(text) >= leading_f64(&self.ident),
            Modifier::LessEqual => leading_f64(text) <= leading_f64(&self.ident),
        }
    }
}

/// One instruction of a compiled query.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Test(Test),
    Op(Operator),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(Operator::And) => f.write_str("AND"),
            Self::Op(Operator::Or) => f.write_str("OR"),
            Self::Op(Operator::Not) => f.write_str("NOT"),
            Self::Test(t) => {
                let prefix = match t.modifier {
                    Modifier::Contains => "",
                    Modifier::Exact => "+",
                    Modifier::Regex => "r:",
                    Modifier::Equal => "=",
                    Modifier::Greater => ">",
                    Modifier::Less => "<",
                    Modifier::GreaterEqual => ">=",
                    Modifier::LessEqual => "<=",
                };
                write!(f, "{}:{prefix}{}", t.column, t.ident)
            }
        }
    }
}

/// Source of column texts for one row.
pub trait ColumnLookup {
    /// Text of `column`, or `None` when the row does not provide it.
    fn column_text(&self, column: ColumnId) -> Option<&str>;
}

impl ColumnLookup for HashMap<ColumnId, String> {
    fn column_text(&self, column: ColumnId) -> Option<&str> {
        self.get(&column).map(String::as_str)
    }
}

impl ColumnLookup for [Option<String>; ColumnId::COUNT] {
    fn column_text(&self, column: ColumnId) -> Option<&str> {
        self[column.index()].as_deref()
    }
}

/// A compiled query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    commands: Vec<Command>,
    columns: ColumnMask,
}

impl SearchQuery {
    /// Compile a query string.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let span = crate::debug_span!(target: "propwatch::search", "parse", len = input.len());
        let _guard = span.enter();
        let query = Parser::new(input).run();
        crate::trace!(target: "propwatch::search", commands = query.commands.len(), "query compiled");
        query
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// No commands: every row passes the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Columns referenced by at least one test.
    #[must_use]
    pub fn referenced_columns(&self) -> ColumnMask {
        self.columns
    }

    /// Run the program against one row.
    #[must_use]
    pub fn evaluate(&self, row: &dyn ColumnLookup) -> bool {
        let mut stack: SmallVec<[bool; 16]> = SmallVec::new();
        for command in &self.commands {
            match command {
                Command::Test(test) => {
                    let Some(text) = row.column_text(test.column) else {
                        continue;
                    };
                    stack.push(test.matches(text));
                }
                Command::Op(Operator::And) => {
                    if stack.len() > 1 {
                        let rhs = stack.pop().unwrap_or(true);
                        if let Some(lhs) = stack.last_mut() {
                            *lhs &= rhs;
                        }
                    }
                }
                Command::Op(Operator::Or) => {
                    if stack.len() > 1 {
                        let rhs = stack.pop().unwrap_or(false);
                        if let Some(lhs) = stack.last_mut() {
                            *lhs |= rhs;
                        }
                    }
                }
                Command::Op(Operator::Not) => {
                    if let Some(top) = stack.last_mut() {
                        *top = !*top;
                    }
                }
            }
        }
        stack.first().copied().unwrap_or(false)
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PendingTest {
    column: Option<ColumnId>,
    modifier: Modifier,
}

#[derive(Default)]
struct Group {
    terms: usize,
    pending: PendingTest,
    ops: SmallVec<[Operator; 4]>,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    groups: SmallVec<[Group; 8]>,
    commands: Vec<Command>,
    columns: ColumnMask,
}

const MODIFIER_TOKENS: [(&str, Modifier); 9] = [
    ("+", Modifier::Exact),
    ("regex:", Modifier::Regex),
    ("reg:", Modifier::Regex),
    ("r:", Modifier::Regex),
    ("<=", Modifier::LessEqual),
    (">=", Modifier::GreaterEqual),
    ("<", Modifier::Less),
    (">", Modifier::Greater),
    ("=", Modifier::Equal),
];

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut groups = SmallVec::new();
        groups.push(Group::default());
        Self {
            input,
            pos: 0,
            groups,
            commands: Vec::new(),
            columns: ColumnMask::empty(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn group(&mut self) -> &mut Group {
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn run(mut self) -> SearchQuery {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.input.len() - trimmed.len();
            if trimmed.is_empty() {
                break;
            }

            if self.eat("|") {
                self.group().ops.push(Operator::Or);
            } else if self.eat("!") {
                self.group().ops.push(Operator::Not);
            } else if let Some(modifier) = self.eat_modifier() {
                self.group().pending.modifier = modifier;
            } else if self.eat("(") {
                self.groups.push(Group::default());
            } else if self.eat(")") {
                self.groups.pop();
                if self.groups.is_empty() {
                    break;
                }
                self.finish_term();
            } else if let Some(column) = self.column_prefix() {
                // Only the keyword is consumed; the ':' is skipped as an
                // unknown character on the next turn.
                self.group().pending.column = Some(column);
                self.pos += column.keyword().len();
            } else if self.eat("\"") {
                if let Some(end) = self.rest().find('"') {
                    let ident = self.rest()[..end].to_owned();
                    self.pos += end + 1;
                    self.push_test(ident);
                }
            } else {
                let len = self
                    .rest()
                    .bytes()
                    .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                    .count();
                if len == 0 {
                    let skip = self.rest().chars().next().map_or(1, char::len_utf8);
                    self.pos += skip;
                    continue;
                }
                let ident = self.rest()[..len].to_owned();
                self.pos += len;
                self.push_test(ident);
            }
        }

        SearchQuery {
            commands: self.commands,
            columns: self.columns,
        }
    }

    fn eat_modifier(&mut self) -> Option<Modifier> {
        let (token, modifier) = MODIFIER_TOKENS
            .iter()
            .find(|(token, _)| self.rest().starts_with(token))?;
        self.pos += token.len();
        Some(*modifier)
    }

    fn column_prefix(&self) -> Option<ColumnId> {
        let rest = self.rest();
        ColumnId::ALL.into_iter().find(|c| {
            rest.strip_prefix(c.keyword())
                .is_some_and(|after| after.starts_with(':'))
        })
    }

    fn push_test(&mut self, ident: String) {
        let pending = core::mem::take(&mut self.group().pending);
        let column = pending.column.unwrap_or(ColumnId::Name);
        self.columns |= column.mask();
        self.commands
            .push(Command::Test(Test::new(ident, column, pending.modifier)));
        self.finish_term();
    }

    fn finish_term(&mut self) {
        let group = self.group();
        group.terms += 1;
        let ops = core::mem::take(&mut group.ops);
        let and = group.terms > 1 && !ops.contains(&Operator::Or);
        group.pending = PendingTest::default();
        self.commands
            .extend(ops.into_iter().rev().map(Command::Op));
        if and {
            self.commands.push(Command::Op(Operator::And));
        }
    }
}

/// Parse the leading decimal number of `text`, ignoring whatever follows.
/// Text without a leading number reads as `0`.
#[must_use]
pub fn leading_f64(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Help text for the search box.
pub const SEARCH_HELP: &str = "\
Multiple search terms can be entered.

Operators:
\tAND -> & or whitespace
\tOR  -> |
\tNOT -> !

\tExample:
\t\t(a !b) | !(c & d)

Term modifiers:
\tExact -> +word
\tRegex -> regex: or reg: or r:
\tNumeric -> =value, >value, <value, >=value, <=value

Pick a column with a prefix:
\tname:, value:, metadata:, type:, cpptype:, class:, category:, address:, size:

\tTerms without a prefix search the name column.

\tExample:
\t\thealth (value:>=3 | metadata:actor) size:>=10 size:<=100 cpptype:+int8
";

#[cfg(test)]
mod tests {
    use super::*;

    fn program(input: &str) -> String {
        SearchQuery::parse(input).to_string()
    }

    fn row(pairs: &[(ColumnId, &str)]) -> HashMap<ColumnId, String> {
        pairs
            .iter()
            .map(|(c, t)| (*c, (*t).to_owned()))
            .collect()
    }

    #[test]
    fn implicit_and() {
        assert_eq!(program("a b"), "name:a name:b AND");
    }

    #[test]
    fn or_suppresses_and() {
        assert_eq!(program("a | b"), "name:a name:b OR");
    }

    #[test]
    fn not_binds_to_next_term() {
        assert_eq!(program("!a b"), "name:a NOT name:b AND");
    }

    #[test]
    fn pending_ops_emit_in_reverse() {
        assert_eq!(program("a | !b"), "name:a name:b NOT OR");
    }

    #[test]
    fn groups_are_one_term() {
        assert_eq!(
            program("(a !b) | !(c & d)"),
            "name:a name:b NOT AND name:c name:d AND NOT OR"
        );
    }

    #[test]
    fn columns_and_modifiers() {
        let q = SearchQuery::parse("value:>=3 cpptype:+int8");
        assert_eq!(q.to_string(), "value:>=3 cpptype:+int8 AND");
        assert_eq!(
            q.referenced_columns(),
            ColumnMask::VALUE | ColumnMask::CPP_TYPE
        );
    }

    #[test]
    fn quoted_terms_keep_spaces() {
        assert_eq!(program("\"max speed\""), "name:max speed");
    }

    #[test]
    fn unterminated_quote_is_skipped() {
        assert_eq!(program("\"abc"), "name:abc");
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(program("a.b"), "name:a name:b AND");
        assert_eq!(program("héllo"), "name:h name:llo AND");
    }

    #[test]
    fn unbalanced_close_stops_parsing() {
        assert_eq!(program("a ) b"), "name:a");
    }

    #[test]
    fn empty_input() {
        let q = SearchQuery::parse("   ");
        assert!(q.is_empty());
        assert!(!q.evaluate(&row(&[(ColumnId::Name, "x")])));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let q = SearchQuery::parse("HEALTH");
        assert!(q.evaluate(&row(&[(ColumnId::Name, "MaxHealth")])));
        assert!(!q.evaluate(&row(&[(ColumnId::Name, "Speed")])));
    }

    #[test]
    fn exact_requires_whole_text() {
        let q = SearchQuery::parse("cpptype:+int8");
        assert!(q.evaluate(&row(&[(ColumnId::CppType, "INT8")])));
        assert!(!q.evaluate(&row(&[(ColumnId::CppType, "uint8")])));
    }

    #[test]
    fn numeric_comparisons_use_leading_number() {
        let q = SearchQuery::parse("size:>=10 size:<=100");
        assert!(q.evaluate(&row(&[(ColumnId::Size, "16 B")])));
        assert!(!q.evaluate(&row(&[(ColumnId::Size, "8 B")])));
        assert!(!q.evaluate(&row(&[(ColumnId::Size, "")])));
    }

    #[test]
    fn missing_column_skips_test() {
        let q = SearchQuery::parse("health value:5");
        assert!(q.evaluate(&row(&[(ColumnId::Name, "Health")])));
    }

    #[test]
    fn regex_terms() {
        let q = SearchQuery::parse("r:\"^max\"");
        assert!(q.evaluate(&row(&[(ColumnId::Name, "MaxSpeed")])));
        assert!(!q.evaluate(&row(&[(ColumnId::Name, "SpeedMax")])));
    }

    #[test]
    fn invalid_regex_is_false() {
        let q = SearchQuery::parse("r:\"(unclosed\"");
        assert!(!q.evaluate(&row(&[(ColumnId::Name, "(unclosed")])));
    }

    #[test]
    fn leading_number_prefix() {
        assert_eq!(leading_f64("16 B"), 16.0);
        assert_eq!(leading_f64("  -2.5e2x"), -250.0);
        assert_eq!(leading_f64("3e"), 3.0);
        assert_eq!(leading_f64(".5"), 0.5);
        assert_eq!(leading_f64("abc"), 0.0);
        assert_eq!(leading_f64(""), 0.0);
    }

    #[test]
    fn documented_example_evaluates() {
        let q = SearchQuery::parse("health (value:>=3 | metadata:actor) size:>=4");
        let r = row(&[
            (ColumnId::Name, "Health"),
            (ColumnId::Value, "100"),
            (ColumnId::Metadata, ""),
            (ColumnId::Size, "4 B"),
        ]);
        assert!(q.evaluate(&r));
    }

    #[test]
    fn evaluation_table() {
        let cases: &[(&str, ColumnId, &str, bool)] = &[
            ("foo", ColumnId::Name, "fooBar", true),
            ("+foo", ColumnId::Name, "fooBar", false),
            ("+foo", ColumnId::Name, "foo", true),
            ("size:>=10", ColumnId::Size, "16 B", true),
            ("size:>=10", ColumnId::Size, "", false),
            ("a !b", ColumnId::Name, "a", true),
            ("(a|b) c", ColumnId::Name, "bc", true),
            ("a !b", ColumnId::Name, "ab", false),
        ];
        for &(query, column, text, expected) in cases {
            let got = SearchQuery::parse(query).evaluate(&row(&[(column, text)]));
            assert_eq!(got, expected, "{query:?} against {text:?}");
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        for input in ["(a|b) c", "health (value:>=3 | metadata:actor)", "!x r:\"^m\""] {
            let first = SearchQuery::parse(input);
            let second = SearchQuery::parse(input);
            assert_eq!(first.commands(), second.commands());
        }
    }

    #[test]
    fn unquoted_regex_loses_metacharacters() {
        assert_eq!(program("r:^x("), "name:r:x");
        assert_eq!(program("r:\"^x(\""), "name:r:^x(");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(input in ".{0,64}") {
                let q = SearchQuery::parse(&input);
                let r: HashMap<ColumnId, String> = ColumnId::ALL
                    .into_iter()
                    .map(|c| (c, input.clone()))
                    .collect();
                let _ = q.evaluate(&r);
            }

            #[test]
            fn single_word_matches_itself(word in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
                let q = SearchQuery::parse(&word);
                let r: HashMap<ColumnId, String> = [(ColumnId::Name, word.clone())].into_iter().collect();
                prop_assert!(q.evaluate(&r));
            }

            #[test]
            fn negation_flips_single_term(word in "[a-z]{1,8}", text in "[a-z]{0,12}") {
                let r: HashMap<ColumnId, String> = [(ColumnId::Name, text)].into_iter().collect();
                let plain = SearchQuery::parse(&word).evaluate(&r);
                let negated = SearchQuery::parse(&format!("!{word}")).evaluate(&r);
                prop_assert_eq!(plain, !negated);
            }

            #[test]
            fn integer_prefix_parses(n in -100_000i64..100_000, suffix in "[ a-zA-Z]{0,4}") {
                let text = format!("{n}{suffix}");
                prop_assert_eq!(leading_f64(&text), n as f64);
            }
        }
    }
}
