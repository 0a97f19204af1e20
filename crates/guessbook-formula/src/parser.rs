//! Formula parser
//!
//! A recursive descent parser over the token list produced by
//! [`tokenize`](crate::lexer::tokenize), with variable references checked
//! against the names defined so far in the document.

use crate::ast::{BinaryOperator, ComparisonOperator, Expr, LogicalOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::lexer::{tokenize, Token};
use ahash::AHashSet;

/// Names a formula is allowed to reference.
///
/// Grows as a document is scanned in order, so a formula can only see the
/// cells declared before it.
#[derive(Debug, Clone, Default)]
pub struct DefinedVariables {
    names: AHashSet<String>,
}

impl DefinedVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already defined
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DefinedVariables {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for DefinedVariables {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

/// Tokenize and parse a formula string into an AST
///
/// # Example
/// ```rust
/// use guessbook_formula::{parse_formula, DefinedVariables};
///
/// let defined: DefinedVariables = ["price", "units"].into_iter().collect();
/// let ast = parse_formula("price * units", &defined).unwrap();
/// assert_eq!(ast.repr(), "price * units");
///
/// let ast = parse_formula("normal(100, 15) > 110 AND units > 3", &defined).unwrap();
/// assert_eq!(ast.repr(), "normal(100, 15) > 110 AND units > 3");
/// ```
pub fn parse_formula(formula: &str, defined: &DefinedVariables) -> FormulaResult<Expr> {
    let tokens = tokenize(formula)?;
    parse(&tokens, defined)
}

/// Parse a token list into an AST
///
/// Fails with a syntax error instead of building a tree deeper than
/// [`MAX_DEPTH`], so evaluating or dropping any parsed tree stays within
/// a bounded recursion depth.
pub fn parse(tokens: &[Token], defined: &DefinedVariables) -> FormulaResult<Expr> {
    let mut parser = FormulaParser::new(tokens, defined);
    let node = parser.parse_expression()?;

    // Make sure we consumed all input
    if let Some(token) = parser.peek() {
        return Err(FormulaError::syntax(format!(
            "Unexpected token at end: {token}"
        )));
    }

    Ok(node.expr)
}

/// Deepest expression tree, and deepest parenthesis or call nesting, the
/// parser accepts
pub const MAX_DEPTH: usize = 256;

/// Expression under construction along with the height of its tree
struct Node {
    expr: Expr,
    depth: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, depth: 1 }
    }

    fn not(operand: Node) -> FormulaResult<Self> {
        Self::checked(Expr::Not(Box::new(operand.expr)), operand.depth + 1)
    }

    fn join(
        left: Node,
        right: Node,
        build: impl FnOnce(Expr, Expr) -> Expr,
    ) -> FormulaResult<Self> {
        let depth = left.depth.max(right.depth) + 1;
        Self::checked(build(left.expr, right.expr), depth)
    }

    fn checked(expr: Expr, depth: usize) -> FormulaResult<Self> {
        if depth > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Self { expr, depth })
    }
}

fn too_deep() -> FormulaError {
    FormulaError::syntax("Formula nested too deeply")
}

/// Formula parser
struct FormulaParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    defined: &'a DefinedVariables,
    /// Current parenthesis / argument-list nesting
    nesting: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(tokens: &'a [Token], defined: &'a DefinedVariables) -> Self {
        Self {
            tokens,
            pos: 0,
            defined,
            nesting: 0,
        }
    }

    // === Helper methods ===

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_str(&self) -> Option<&'a str> {
        self.peek().map(Token::as_str)
    }

    fn peek_next_str(&self) -> Option<&'a str> {
        self.tokens.get(self.pos + 1).map(Token::as_str)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn describe_current(&self) -> String {
        self.peek_str()
            .map_or_else(|| "end of input".to_string(), str::to_string)
    }

    fn expect_close_paren(&mut self) -> FormulaResult<()> {
        if self.peek_str() == Some(")") {
            self.advance();
            Ok(())
        } else {
            Err(FormulaError::syntax(format!(
                "Expected closing parenthesis, found {}",
                self.describe_current()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. NOT (prefix, applies to the rest of the expression)
    // 2. OR
    // 3. AND
    // 4. Comparison: >, <, >=, <=, ==, !=
    // 5. Addition/Subtraction: +, -
    // 6. Multiplication/Division/Remainder: *, /, %
    // 7. Exponentiation: ^ (left associative)
    // 8. Factor: parentheses, function calls, variables, numbers

    fn parse_expression(&mut self) -> FormulaResult<Node> {
        if self.nesting >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.nesting += 1;
        let result = self.parse_not();
        self.nesting -= 1;
        result
    }

    fn parse_not(&mut self) -> FormulaResult<Node> {
        if self.peek_str() == Some("NOT") {
            self.advance();
            let operand = self.parse_logical_or()?;
            return Node::not(operand);
        }

        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_logical_and()?;

        while self.peek_str() == Some("OR") {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Node::join(left, right, |l, r| Expr::logical(LogicalOperator::Or, l, r))?;
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_comparison()?;

        while self.peek_str() == Some("AND") {
            self.advance();
            let right = self.parse_comparison()?;
            left = Node::join(left, right, |l, r| Expr::logical(LogicalOperator::And, l, r))?;
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek_str() {
                Some(">") => ComparisonOperator::GreaterThan,
                Some("<") => ComparisonOperator::LessThan,
                Some(">=") => ComparisonOperator::GreaterEqual,
                Some("<=") => ComparisonOperator::LessEqual,
                Some("==") => ComparisonOperator::Equal,
                Some("!=") => ComparisonOperator::NotEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;
            left = Node::join(left, right, |l, r| Expr::comparison(op, l, r))?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek_str() {
                Some("+") => BinaryOperator::Add,
                Some("-") => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Node::join(left, right, |l, r| Expr::binary(op, l, r))?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.peek_str() {
                Some("*") => BinaryOperator::Multiply,
                Some("/") => BinaryOperator::Divide,
                Some("%") => BinaryOperator::Remainder,
                _ => break,
            };

            self.advance();
            let right = self.parse_exponent()?;
            left = Node::join(left, right, |l, r| Expr::binary(op, l, r))?;
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_factor()?;

        // Left associative: 2 ^ 3 ^ 2 == (2 ^ 3) ^ 2
        while self.peek_str() == Some("^") {
            self.advance();
            let right = self.parse_factor()?;
            left = Node::join(left, right, |l, r| {
                Expr::binary(BinaryOperator::Power, l, r)
            })?;
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FormulaResult<Node> {
        let token = self
            .peek()
            .ok_or_else(|| FormulaError::syntax("Unexpected end of input"))?;

        if token.as_str() == "(" {
            self.advance();
            let node = self.parse_expression()?;
            self.expect_close_paren()?;
            return Ok(node);
        }

        if token.is_name() {
            let is_call = self.peek_next_str() == Some("(");
            self.advance();
            let name = token.as_str().to_string();
            if is_call {
                return self.parse_function_call(name);
            }
            return self.parse_variable(name).map(Node::leaf);
        }

        if token.is_number() {
            self.advance();
            let value = token.as_str().parse::<f64>().map_err(|e| {
                FormulaError::syntax(format!("Invalid number '{token}': {e}"))
            })?;
            return Ok(Node::leaf(Expr::Number(value)));
        }

        Err(FormulaError::syntax(format!("Unexpected token: {token}")))
    }

    fn parse_variable(&mut self, name: String) -> FormulaResult<Expr> {
        if self.defined.contains(&name) {
            return Ok(Expr::Variable(name));
        }

        if FunctionRegistry::global().contains(&name) {
            return Err(FormulaError::syntax(format!(
                "Expected opening parenthesis after function name {name}, found {}",
                self.describe_current()
            )));
        }

        Err(FormulaError::UndefinedVariable(name))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Node> {
        if self.peek_str() != Some("(") {
            return Err(FormulaError::syntax(format!(
                "Expected opening parenthesis after function name {name}, found {}",
                self.describe_current()
            )));
        }
        self.advance();

        let mut args = Vec::new();
        let mut depth = 0;

        // Parse arguments
        if self.peek_str() != Some(")") {
            loop {
                let arg = self.parse_expression()?;
                depth = depth.max(arg.depth);
                args.push(arg.expr);

                if self.peek_str() != Some(",") {
                    break;
                }
                self.advance();
            }
        }

        self.expect_close_paren()?;

        let func = FunctionRegistry::global()
            .get(&name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
        func.check_arity(args.len())?;

        Node::checked(Expr::Function { name, args }, depth + 1)
    }
}
