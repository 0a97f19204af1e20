//! Document scanning
//!
//! A document is free-form text with cell declarations of the form
//! `[name = formula]` embedded anywhere in it. Declarations are read in
//! order, and each formula may only reference cells declared (and
//! successfully parsed) before it.

use crate::error::Error;
use ahash::AHashMap;
use guessbook_formula::{
    parse_formula, DefinedVariables, EvaluationContext, Expr, FormulaResult, Token, Value,
};
use lazy_regex::regex;
use std::fmt;

/// A named formula declared in a document
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: String,
    formula: String,
    expr: Expr,
    order: usize,
}

impl Cell {
    /// Cell name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formula source text as written in the document
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Parsed formula
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Position among the document's accepted cells, starting at 0
    pub fn order(&self) -> usize {
        self.order
    }

    /// Cells this formula references, in first-use order
    pub fn dependencies(&self) -> Vec<&str> {
        self.expr.variables()
    }

    /// Display text of the parsed formula
    pub fn repr(&self) -> String {
        self.expr.repr()
    }

    /// Evaluate the formula against `ctx`
    pub fn calculate(&self, ctx: &mut EvaluationContext<'_>) -> FormulaResult<Value> {
        self.expr.calculate(ctx)
    }
}

/// A declaration that was left out of the document
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Declared cell name
    pub name: String,
    /// Formula source text
    pub formula: String,
    /// Why the cell was excluded
    pub error: Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error parsing formula for {}: {}", self.name, self.error)
    }
}

/// Ordered set of cells parsed from a document
#[derive(Debug, Clone, Default)]
pub struct Document {
    cells: Vec<Cell>,
    index: AHashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Scan `text` for cell declarations
    ///
    /// Scanning never fails as a whole. A declaration whose name is invalid
    /// (including the keywords `AND`, `OR` and `NOT`) or already taken, or
    /// whose formula does not parse, is excluded and
    /// recorded in [`diagnostics`](Self::diagnostics); the remaining cells
    /// are unaffected.
    ///
    /// # Example
    /// ```rust
    /// use guessbook::Document;
    ///
    /// let doc = Document::parse("Rent is [rent = 1200] and [total = rent * 12].");
    /// assert_eq!(doc.names().collect::<Vec<_>>(), ["rent", "total"]);
    /// assert_eq!(doc.get("total").unwrap().repr(), "rent * 12");
    /// ```
    pub fn parse(text: &str) -> Self {
        let declaration = regex!(r"\[(\w+)\s*=\s*([^\]]+)\]");

        let mut doc = Document::default();
        let mut defined = DefinedVariables::new();

        for caps in declaration.captures_iter(text) {
            let (name, formula) = split_declaration(&caps);
            match doc.accept(name, formula, &defined) {
                Ok(expr) => {
                    defined.insert(name);
                    let cell = doc.push(name, formula, expr);
                    tracing::debug!("Accepted cell {name} depending on {:?}", cell.dependencies());
                }
                Err(error) => {
                    tracing::warn!("Error parsing formula for {name}: {error}");
                    doc.diagnostics.push(Diagnostic {
                        name: name.to_string(),
                        formula: formula.to_string(),
                        error,
                    });
                }
            }
        }

        doc
    }

    fn accept(&self, name: &str, formula: &str, defined: &DefinedVariables) -> Result<Expr, Error> {
        if !Token::new(name).is_name() {
            return Err(Error::InvalidCellName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(Error::DuplicateCell(name.to_string()));
        }
        Ok(parse_formula(formula, defined)?)
    }

    fn push(&mut self, name: &str, formula: &str, expr: Expr) -> &Cell {
        let order = self.cells.len();
        self.index.insert(name.to_string(), order);
        self.cells.push(Cell {
            name: name.to_string(),
            formula: formula.to_string(),
            expr,
            order,
        });
        &self.cells[order]
    }

    /// Cells in declaration order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look up a cell by name
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.index.get(name).map(|&i| &self.cells[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.iter().map(Cell::name)
    }

    /// Number of accepted cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Excluded declarations, in document order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Scan a document's text into its ordered cells
pub fn parse_input(text: &str) -> Document {
    Document::parse(text)
}

fn split_declaration<'t>(caps: &regex::Captures<'t>) -> (&'t str, &'t str) {
    let name = caps.get(1).map_or("", |m| m.as_str());
    let formula = caps.get(2).map_or("", |m| m.as_str().trim_end());
    (name, formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessbook_formula::FormulaError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scans_declarations_in_order() {
        let doc = parse_input("# Budget\n\n[a = 5]\nsome prose\n[b = a * 2] and [c=b+a]");
        assert_eq!(doc.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(doc.get("c").unwrap().order(), 2);
        assert_eq!(doc.get("c").unwrap().formula(), "b+a");
        assert_eq!(doc.get("c").unwrap().repr(), "b + a");
        assert!(doc.diagnostics().is_empty());
    }

    #[test]
    fn test_forward_reference_is_excluded() {
        let doc = parse_input("[b = a + 1]\n[a = 2]");
        assert_eq!(doc.names().collect::<Vec<_>>(), ["a"]);
        assert_eq!(doc.diagnostics().len(), 1);
        assert_eq!(doc.diagnostics()[0].name, "b");
        assert_eq!(
            doc.diagnostics()[0].error,
            Error::Formula(FormulaError::UndefinedVariable("a".into()))
        );
    }

    #[test]
    fn test_failed_cell_stays_undefined_downstream() {
        let doc = parse_input("[a = (1 + 2]\n[b = a]\n[c = 3]");
        assert_eq!(doc.names().collect::<Vec<_>>(), ["c"]);
        assert_eq!(
            doc.diagnostics()
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>(),
            ["a", "b"]
        );
        assert_eq!(doc.get("c").unwrap().order(), 0);
    }

    #[test]
    fn test_duplicate_keeps_first_declaration() {
        let doc = parse_input("[a = 1]\n[a = 2]");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("a").unwrap().formula(), "1");
        assert_eq!(
            doc.diagnostics()[0].error,
            Error::DuplicateCell("a".into())
        );
    }

    #[test]
    fn test_invalid_cell_name() {
        let doc = parse_input("[1st = 2]");
        assert!(doc.is_empty());
        assert_eq!(
            doc.diagnostics()[0].error,
            Error::InvalidCellName("1st".into())
        );
    }

    #[test]
    fn test_keyword_cell_names_are_invalid() {
        let doc = parse_input("[AND = 1] [OR = 2] [NOT = 3] [and = 4]");
        assert_eq!(doc.names().collect::<Vec<_>>(), ["and"]);
        assert_eq!(
            doc.diagnostics()
                .iter()
                .map(|d| d.error.clone())
                .collect::<Vec<_>>(),
            [
                Error::InvalidCellName("AND".into()),
                Error::InvalidCellName("OR".into()),
                Error::InvalidCellName("NOT".into()),
            ]
        );
    }

    #[test]
    fn test_deeply_nested_formula_is_excluded() {
        let deep = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
        let chain = vec!["1"; 100_000].join("+");
        let doc = parse_input(&format!("[a = {deep}] [b = {chain}] [c = 2]"));
        assert_eq!(doc.names().collect::<Vec<_>>(), ["c"]);
        for diagnostic in doc.diagnostics() {
            assert_eq!(
                diagnostic.error,
                Error::Formula(FormulaError::Syntax("Formula nested too deeply".into()))
            );
        }
        assert_eq!(doc.diagnostics().len(), 2);
    }

    #[test]
    fn test_cell_dependencies() {
        let doc = parse_input("[a = 1] [b = 2] [c = b * a + b]");
        assert_eq!(doc.get("c").unwrap().dependencies(), ["b", "a"]);
        assert!(doc.get("a").unwrap().dependencies().is_empty());
    }

    #[test]
    fn test_text_without_declarations() {
        let doc = parse_input("Nothing [here] to see");
        assert!(doc.is_empty());
        assert!(doc.diagnostics().is_empty());
    }

    #[test]
    fn test_diagnostic_display() {
        let doc = parse_input("[x = foo(1)]");
        assert_eq!(
            doc.diagnostics()[0].to_string(),
            "Error parsing formula for x: Unknown function: foo"
        );
    }
}
