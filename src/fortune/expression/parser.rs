//! Expression parsing with chumsky
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or         = and (("||" | "or") and)*
//! and        = comparison (("&&" | "and") comparison)*
//! comparison = sum (("==" | "!=" | "<=" | ">=" | "<" | ">") sum)*
//! sum        = product (("+" | "-") product)*
//! product    = unary (("*" | "/" | "%") unary)*
//! unary      = ("!" | "not" | "-")* postfix
//! postfix    = atom ("." ident | "[" or "]")*
//! atom       = number | string | "[" (or ("," or)*)? "]" | "(" or ")" | ident
//! ```

use crate::fortune::expression::ast::{BinaryOp, Expr, Literal, UnaryOp};
use chumsky::prelude::*;
use chumsky::error::SimpleReason;
use std::fmt;

type ParserError = Simple<char>;

/// Words that cannot be used as variable names
pub const RESERVED_WORDS: &[&str] = &["and", "or", "not"];

/// A malformed expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    pub message: String,
    /// Character offset into the expression source
    pub offset: usize,
}

impl ExpressionError {
    fn from_simple(error: &ParserError) -> Self {
        let message = match error.reason() {
            SimpleReason::Custom(message) => message.clone(),
            SimpleReason::Unclosed { delimiter, .. } => format!("unclosed '{}'", delimiter),
            SimpleReason::Unexpected => match error.found() {
                Some(found) => format!("unexpected character '{}'", found),
                None => "unexpected end of expression".to_string(),
            },
        };
        Self {
            message,
            offset: error.span().start,
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ExpressionError {}

/// Parse a complete expression; surrounding whitespace is ignored
pub fn parse_expression(source: &str) -> Result<Expr, ExpressionError> {
    expression()
        .padded()
        .then_ignore(end())
        .parse(source)
        .map_err(|errors| {
            errors
                .first()
                .map(ExpressionError::from_simple)
                .unwrap_or_else(|| ExpressionError {
                    message: "invalid expression".to_string(),
                    offset: 0,
                })
        })
}

fn keyword(word: &'static str) -> impl Parser<char, (), Error = ParserError> + Clone {
    text::keyword(word)
}

fn operator(symbol: &'static str, op: BinaryOp) -> impl Parser<char, BinaryOp, Error = ParserError> + Clone {
    just(symbol).padded().to(op)
}

fn word_operator(word: &'static str, op: BinaryOp) -> impl Parser<char, BinaryOp, Error = ParserError> + Clone {
    keyword(word).padded().to(op)
}

/// One left-associative precedence level
fn binary_level<P, O>(operand: P, operators: O) -> BoxedParser<'static, char, Expr, ParserError>
where
    P: Parser<char, Expr, Error = ParserError> + Clone + 'static,
    O: Parser<char, BinaryOp, Error = ParserError> + Clone + 'static,
{
    operand
        .clone()
        .then(operators.then(operand).repeated())
        .foldl(|left, (op, right)| left.binary(op, right))
        .boxed()
}

fn string_literal(quote: char) -> impl Parser<char, String, Error = ParserError> + Clone {
    let escape = just::<char, _, ParserError>('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('\''),
        just('n').to('\n'),
        just('t').to('\t'),
        just('r').to('\r'),
        just('u').ignore_then(
            filter(|c: &char| c.is_ascii_hexdigit())
                .repeated()
                .exactly(4)
                .collect::<String>()
                .try_map(|digits, span| {
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| Simple::custom(span, "invalid unicode escape"))
                }),
        ),
    )));

    just(quote)
        .ignore_then(
            filter(move |c: &char| *c != '\\' && *c != quote)
                .or(escape)
                .repeated(),
        )
        .then_ignore(just(quote))
        .collect::<String>()
}

fn number() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    text::int::<char, ParserError>(10)
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .try_map(|(whole, fraction): (String, Option<String>), span| match fraction {
            Some(fraction) => {
                let value = format!("{}.{}", whole, fraction)
                    .parse::<f64>()
                    .map_err(|e| Simple::custom(span.clone(), e.to_string()))?;
                if value.is_finite() {
                    Ok(Expr::Literal(Literal::Float(value)))
                } else {
                    Err(Simple::custom(span, "number out of range"))
                }
            }
            None => whole
                .parse::<i64>()
                .map(Expr::int)
                .map_err(|_| Simple::custom(span, "integer out of range")),
        })
}

fn identifier() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    text::ident::<char, ParserError>().try_map(|name: String, span| match name.as_str() {
        "true" => Ok(Expr::Literal(Literal::Bool(true))),
        "false" => Ok(Expr::Literal(Literal::Bool(false))),
        "null" => Ok(Expr::Literal(Literal::Null)),
        word if RESERVED_WORDS.contains(&word) => Err(Simple::custom(
            span,
            format!("'{}' is a reserved word", word),
        )),
        _ => Ok(Expr::Ident(name)),
    })
}

enum Postfix {
    Member(String),
    Index(Expr),
}

/// The full expression grammar, without the end-of-input check
pub fn expression() -> impl Parser<char, Expr, Error = ParserError> + Clone {
    recursive(|expr| {
        let string = string_literal('"')
            .or(string_literal('\''))
            .map(|value| Expr::Literal(Literal::Str(value)));

        let array = expr
            .clone()
            .separated_by(just(',').padded())
            .allow_trailing()
            .delimited_by(just('[').padded(), just(']'))
            .map(Expr::Array);

        let parenthesized = expr.clone().delimited_by(just('(').padded(), just(')'));

        let atom = choice((number(), string, array, parenthesized, identifier())).padded();

        let postfix = atom
            .then(
                choice((
                    just('.')
                        .padded()
                        .ignore_then(text::ident())
                        .map(Postfix::Member),
                    expr.clone()
                        .delimited_by(just('[').padded(), just(']'))
                        .map(Postfix::Index),
                ))
                .padded()
                .repeated(),
            )
            .foldl(|target, step| match step {
                Postfix::Member(name) => target.member(name),
                Postfix::Index(index) => Expr::Index(Box::new(target), Box::new(index)),
            });

        let unary = choice((
            just('!').to(UnaryOp::Not),
            keyword("not").to(UnaryOp::Not),
            just('-').to(UnaryOp::Neg),
        ))
        .padded()
        .repeated()
        .then(postfix)
        .foldr(|op, operand| Expr::Unary(op, Box::new(operand)))
        .boxed();

        let product = binary_level(
            unary,
            choice((
                operator("*", BinaryOp::Mul),
                operator("/", BinaryOp::Div),
                operator("%", BinaryOp::Rem),
            )),
        );
        let sum = binary_level(
            product,
            choice((operator("+", BinaryOp::Add), operator("-", BinaryOp::Sub))),
        );
        let comparison = binary_level(
            sum,
            choice((
                operator("==", BinaryOp::Eq),
                operator("!=", BinaryOp::NotEq),
                operator("<=", BinaryOp::LtEq),
                operator(">=", BinaryOp::GtEq),
                operator("<", BinaryOp::Lt),
                operator(">", BinaryOp::Gt),
            )),
        );
        let and = binary_level(
            comparison,
            operator("&&", BinaryOp::And).or(word_operator("and", BinaryOp::And)),
        );
        binary_level(
            and,
            operator("||", BinaryOp::Or).or(word_operator("or", BinaryOp::Or)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(source: &str) -> String {
        parse_expression(source)
            .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", source, e))
            .to_string()
    }

    #[test]
    fn test_identifiers_and_access() {
        assert_eq!(parse_expression("name").unwrap(), Expr::ident("name"));
        assert_eq!(canonical(" user . name "), "user.name");
        assert_eq!(canonical("items[ i + 1 ]"), "items[i + 1]");
        assert_eq!(canonical("a.b[0].c"), "a.b[0].c");
    }

    #[test]
    fn test_literals() {
        assert_eq!(canonical("42"), "42");
        assert_eq!(canonical("3.50"), "3.5");
        assert_eq!(canonical("'it\\'s'"), "\"it's\"");
        assert_eq!(canonical("[1,2 , 'x',]"), "[1, 2, \"x\"]");
        assert_eq!(canonical("[]"), "[]");
        assert_eq!(canonical("true"), "true");
        assert_eq!(canonical("null"), "null");
        assert_eq!(canonical("'\\u0041\\u00e9'"), "\"Aé\"");
        assert!(parse_expression("'\\u12'").is_err());
    }

    #[test]
    fn test_block_terminator_in_strings() {
        let printed = canonical("'50%> off'");
        assert_eq!(printed, "\"50%\\u003E off\"");
        assert!(!printed.contains("%>"));
        assert_eq!(
            parse_expression(&printed).unwrap(),
            Expr::string("50%> off")
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(canonical("a+b*c"), "a + b * c");
        assert_eq!(canonical("(a+b)*c"), "(a + b) * c");
        assert_eq!(canonical("a or b and c"), "a || b && c");
        assert_eq!(canonical("(a or b) and c"), "(a || b) && c");
        assert_eq!(canonical("a - b - c"), "a - b - c");
        assert_eq!(canonical("a - (b - c)"), "a - (b - c)");
        assert_eq!(canonical("count >= 10 && !done"), "count >= 10 && !done");
        assert_eq!(canonical("not ready"), "!ready");
        assert_eq!(canonical("-x * 2"), "-x * 2");
    }

    #[test]
    fn test_word_operators_need_boundaries() {
        // `order` and `notable` are identifiers, not operators
        assert_eq!(canonical("order"), "order");
        assert_eq!(canonical("notable"), "notable");
        assert_eq!(canonical("a or order"), "a || order");
    }

    #[test]
    fn test_canonical_form_is_stable() {
        for source in ["a+b*c", "!(x && y) || z", "list[0].name == 'bob'", "-(-1)", "x == '%>'"] {
            let once = canonical(source);
            assert_eq!(canonical(&once), once);
        }
    }

    #[test]
    fn test_errors() {
        let err = parse_expression("").unwrap_err();
        assert_eq!(err.offset, 0);

        let err = parse_expression("a +").unwrap_err();
        assert!(err.offset >= 2, "{:?}", err);

        assert!(parse_expression("a = b").is_err());
        assert!(parse_expression("(a").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("99999999999999999999").is_err());

        assert!(parse_expression("and").is_err());
        assert!(parse_expression("a or").is_err());
    }
}
