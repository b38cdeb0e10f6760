// src/extractors/path.rs

//! Path queries: a small XPath subset evaluated directly over the `scraper` DOM.
//!
//! The same AST is produced from CSS selectors that use `:has(...)`, so those
//! are evaluated structurally instead of being rewritten as strings.

use crate::extractors::selector::Matched;
use crate::utils::error::PathSyntaxError;
use scraper::{node::Node, ElementRef};

#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    /// `//x`: children of every descendant-or-self node.
    Descendant,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sep {
    Child,
    Descendant,
}

impl Sep {
    fn axis(self) -> Axis {
        match self {
            Sep::Child => Axis::Child,
            Sep::Descendant => Axis::Descendant,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name(String),
    AnyElement,
    Text,
    Attribute(String),
    AnyAttribute,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Eq(Operand, String),
    Ne(Operand, String),
    Contains(Operand, String),
    StartsWith(Operand, String),
    EndsWith(Operand, String),
    /// Whitespace-separated word match (`.class`, `[attr~=v]`).
    HasWord(Operand, String),
    Exists(PathQuery),
    NonEmpty(Operand),
    Position(usize),
    Last,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Path(PathQuery),
    NormalizeSpace(Box<Operand>),
}

/// Child-index path from the document node. Lexicographic order is document order.
type Order = Vec<usize>;

/// Evaluation context. `Document` stands for the document node and holds the top element.
#[derive(Debug, Clone)]
enum Ctx<'a> {
    Document(ElementRef<'a>),
    Element(ElementRef<'a>, Order),
    Value(String, Order),
}

impl Ctx<'_> {
    fn order(&self) -> &[usize] {
        match self {
            Ctx::Document(_) => &[],
            Ctx::Element(_, order) | Ctx::Value(_, order) => order,
        }
    }
}

impl PathQuery {
    /// Parses an XPath-style query.
    pub fn parse(query: &str) -> Result<Self, PathSyntaxError> {
        let mut cur = Cursor::new(query);
        cur.skip_ws();
        if cur.at_end() {
            return Err(cur.error("empty query"));
        }
        let path = parse_location_path(&mut cur)?;
        cur.skip_ws();
        if !cur.at_end() {
            return Err(cur.error("unexpected trailing input"));
        }
        Ok(path)
    }

    /// Parses a CSS selector (including nested `:has(...)`) into a query relative to the root.
    pub fn from_css(selector: &str) -> Result<Self, PathSyntaxError> {
        let mut cur = Cursor::new(selector);
        cur.skip_ws();
        if cur.at_end() {
            return Err(cur.error("empty selector"));
        }
        let path = parse_css_complex(&mut cur, Sep::Descendant)?;
        cur.skip_ws();
        if !cur.at_end() {
            return Err(cur.error("unexpected trailing input"));
        }
        Ok(path)
    }

    fn context() -> Self {
        Self {
            absolute: false,
            steps: vec![Step {
                axis: Axis::SelfNode,
                test: NodeTest::Node,
                predicates: Vec::new(),
            }],
        }
    }

    fn attribute(name: &str) -> Self {
        Self {
            absolute: false,
            steps: vec![Step {
                axis: Axis::Child,
                test: NodeTest::Attribute(name.to_ascii_lowercase()),
                predicates: Vec::new(),
            }],
        }
    }

    /// Runs the query with `root` as the context node. Absolute queries start at the document.
    ///
    /// Results are unique and in document order.
    pub fn evaluate<'a>(&self, root: ElementRef<'a>) -> Vec<Matched<'a>> {
        self.evaluate_from(Ctx::Element(root, element_order(root)))
            .into_iter()
            .map(|ctx| match ctx {
                Ctx::Document(top) | Ctx::Element(top, _) => Matched::Element(top),
                Ctx::Value(s, _) => Matched::Value(s),
            })
            .collect()
    }

    fn evaluate_from<'a>(&self, ctx: Ctx<'a>) -> Vec<Ctx<'a>> {
        let start = if self.absolute {
            match &ctx {
                Ctx::Document(top) => Ctx::Document(*top),
                Ctx::Element(el, _) => Ctx::Document(top_element(*el)),
                Ctx::Value(..) => return Vec::new(),
            }
        } else {
            ctx
        };

        let mut current = vec![start];
        for step in &self.steps {
            current = step.apply(current);
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

fn top_element(el: ElementRef<'_>) -> ElementRef<'_> {
    el.ancestors().filter_map(ElementRef::wrap).last().unwrap_or(el)
}

fn element_order(el: ElementRef<'_>) -> Order {
    let mut order = Vec::new();
    let mut current = Some(*el);
    while let Some(node) = current {
        let Some(parent) = node.parent() else { break };
        order.push(node.prev_siblings().count() + 1);
        current = Some(parent);
    }
    order.reverse();
    order
}

fn child_order(parent: &[usize], index: usize) -> Order {
    let mut order = Vec::with_capacity(parent.len() + 1);
    order.extend_from_slice(parent);
    order.push(index + 1);
    order
}

// Attributes sort after their element and before its children.
fn attribute_order(owner: &[usize], index: usize) -> Order {
    let mut order = Vec::with_capacity(owner.len() + 2);
    order.extend_from_slice(owner);
    order.extend([0, index]);
    order
}

fn string_value(ctx: &Ctx<'_>) -> String {
    match ctx {
        Ctx::Document(el) | Ctx::Element(el, _) => el.text().collect(),
        Ctx::Value(s, _) => s.clone(),
    }
}

fn in_document_order(mut nodes: Vec<Ctx<'_>>) -> Vec<Ctx<'_>> {
    nodes.sort_by(|a, b| a.order().cmp(b.order()));
    nodes.dedup_by(|a, b| a.order() == b.order());
    nodes
}

impl Step {
    /// `contexts` must be unique and in document order; so is the result.
    fn apply<'a>(&self, contexts: Vec<Ctx<'a>>) -> Vec<Ctx<'a>> {
        let origins = match self.axis {
            Axis::Descendant => descendant_or_self(contexts),
            _ => contexts,
        };

        let mut out = Vec::new();
        for origin in &origins {
            let candidates = match self.axis {
                Axis::SelfNode => vec![origin.clone()],
                Axis::Parent => parent_of(origin).into_iter().collect(),
                Axis::Child | Axis::Descendant => children_of(origin, &self.test),
            };
            // Predicates see each origin's candidates on their own, so `li[1]` is per parent.
            out.extend(self.filter(candidates));
        }
        in_document_order(out)
    }

    fn filter<'a>(&self, mut candidates: Vec<Ctx<'a>>) -> Vec<Ctx<'a>> {
        for predicate in &self.predicates {
            let size = candidates.len();
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(i, ctx)| predicate.eval(ctx, i + 1, size))
                .map(|(_, ctx)| ctx)
                .collect();
        }
        candidates
    }
}

fn descendant_or_self(contexts: Vec<Ctx<'_>>) -> Vec<Ctx<'_>> {
    let mut out = Vec::new();
    let mut cover: Option<Order> = None;
    for ctx in contexts {
        match ctx {
            Ctx::Document(top) => {
                out.push(Ctx::Document(top));
                push_subtree(top, element_order(top), &mut out);
                // Everything else is already inside the document.
                return out;
            }
            Ctx::Element(el, order) => {
                // In document order a node inside any earlier subtree is inside the latest one.
                if cover.as_ref().is_some_and(|c| order.starts_with(c)) {
                    continue;
                }
                cover = Some(order.clone());
                push_subtree(el, order, &mut out);
            }
            Ctx::Value(..) => {}
        }
    }
    out
}

fn push_subtree<'a>(el: ElementRef<'a>, order: Order, out: &mut Vec<Ctx<'a>>) {
    out.push(Ctx::Element(el, order.clone()));
    for (i, node) in el.children().enumerate() {
        if let Some(child) = ElementRef::wrap(node) {
            push_subtree(child, child_order(&order, i), out);
        }
    }
}

fn parent_of<'a>(ctx: &Ctx<'a>) -> Option<Ctx<'a>> {
    match ctx {
        Ctx::Element(el, order) => match el.parent().and_then(ElementRef::wrap) {
            Some(parent) => Some(Ctx::Element(parent, order[..order.len().saturating_sub(1)].to_vec())),
            None => Some(Ctx::Document(top_element(*el))),
        },
        Ctx::Document(_) | Ctx::Value(..) => None,
    }
}

fn name_matches(el: &ElementRef<'_>, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name) => el.value().name().eq_ignore_ascii_case(name),
        NodeTest::AnyElement | NodeTest::Node => true,
        _ => false,
    }
}

fn children_of<'a>(origin: &Ctx<'a>, test: &NodeTest) -> Vec<Ctx<'a>> {
    match origin {
        Ctx::Document(top) => {
            if name_matches(top, test) {
                vec![Ctx::Element(*top, element_order(*top))]
            } else {
                Vec::new()
            }
        }
        Ctx::Element(el, order) => match test {
            NodeTest::Text => el
                .children()
                .enumerate()
                .filter_map(|(i, node)| match node.value() {
                    Node::Text(text) => Some(Ctx::Value((&**text).to_string(), child_order(order, i))),
                    _ => None,
                })
                .collect(),
            NodeTest::Attribute(name) => el
                .value()
                .attrs()
                .enumerate()
                .filter(|(_, (attr, _))| *attr == name.as_str())
                .map(|(i, (_, v))| Ctx::Value(v.to_string(), attribute_order(order, i)))
                .collect(),
            NodeTest::AnyAttribute => el
                .value()
                .attrs()
                .enumerate()
                .map(|(i, (_, v))| Ctx::Value(v.to_string(), attribute_order(order, i)))
                .collect(),
            _ => el
                .children()
                .enumerate()
                .filter_map(|(i, node)| ElementRef::wrap(node).map(|child| (i, child)))
                .filter(|(_, child)| name_matches(child, test))
                .map(|(i, child)| Ctx::Element(child, child_order(order, i)))
                .collect(),
        },
        Ctx::Value(..) => Vec::new(),
    }
}

impl Operand {
    fn values(&self, ctx: &Ctx<'_>) -> Vec<String> {
        match self {
            Operand::Path(path) => path
                .evaluate_from(ctx.clone())
                .iter()
                .map(string_value)
                .collect(),
            Operand::NormalizeSpace(inner) => {
                let mut values = inner.values(ctx);
                if values.is_empty() {
                    values.push(String::new());
                }
                values
                    .iter()
                    .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
                    .collect()
            }
        }
    }
}

impl Expr {
    fn eval(&self, ctx: &Ctx<'_>, position: usize, size: usize) -> bool {
        match self {
            Expr::Or(a, b) => a.eval(ctx, position, size) || b.eval(ctx, position, size),
            Expr::And(a, b) => a.eval(ctx, position, size) && b.eval(ctx, position, size),
            Expr::Not(e) => !e.eval(ctx, position, size),
            Expr::Eq(op, lit) => op.values(ctx).iter().any(|v| v == lit),
            Expr::Ne(op, lit) => op.values(ctx).iter().any(|v| v != lit),
            Expr::Contains(op, lit) => op.values(ctx).iter().any(|v| v.contains(lit.as_str())),
            Expr::StartsWith(op, lit) => op.values(ctx).iter().any(|v| v.starts_with(lit.as_str())),
            Expr::EndsWith(op, lit) => op.values(ctx).iter().any(|v| v.ends_with(lit.as_str())),
            Expr::HasWord(op, word) => op
                .values(ctx)
                .iter()
                .any(|v| v.split_whitespace().any(|w| w == word)),
            Expr::Exists(path) => !path.evaluate_from(ctx.clone()).is_empty(),
            Expr::NonEmpty(op) => op.values(ctx).iter().any(|v| !v.is_empty()),
            Expr::Position(n) => position == *n,
            Expr::Last => position == size,
        }
    }
}

// --- Parsing ---

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let wanted: Vec<char> = s.chars().collect();
        if self.chars[self.pos..].starts_with(&wanted) {
            self.pos += wanted.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, c: char) -> Result<(), PathSyntaxError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn error(&self, message: &str) -> PathSyntaxError {
        PathSyntaxError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn take_while_from<F: Fn(char) -> bool>(&mut self, start: usize, pred: F) -> String {
        self.pos = start;
        while self.peek().map_or(false, &pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// XPath name: letter or `_`, then letters, digits, `_` or `-`.
    fn name(&mut self) -> Option<String> {
        let c = self.peek()?;
        if !(c.is_alphabetic() || c == '_') {
            return None;
        }
        Some(self.take_while_from(self.pos, |c| c.is_alphanumeric() || c == '_' || c == '-'))
    }

    /// CSS identifier; unlike XPath names these may start with `-`.
    fn css_ident(&mut self) -> Option<String> {
        let c = self.peek()?;
        if !(c.is_alphabetic() || c == '_' || c == '-') {
            return None;
        }
        Some(self.take_while_from(self.pos, |c| c.is_alphanumeric() || c == '_' || c == '-'))
    }

    fn number(&mut self) -> Option<usize> {
        if !self.peek()?.is_ascii_digit() {
            return None;
        }
        self.take_while_from(self.pos, |c| c.is_ascii_digit()).parse().ok()
    }

    fn literal(&mut self) -> Result<String, PathSyntaxError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.bump() {
            if c == quote {
                return Ok(self.chars[start..self.pos - 1].iter().collect());
            }
        }
        Err(self.error("unterminated string"))
    }

    /// Matches a keyword only when it is not the prefix of a longer name.
    fn keyword(&mut self, kw: &str) -> bool {
        let save = self.pos;
        if self.eat_str(kw)
            && !self
                .peek()
                .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return true;
        }
        self.pos = save;
        false
    }
}

fn parse_location_path(cur: &mut Cursor) -> Result<PathQuery, PathSyntaxError> {
    let absolute = cur.peek() == Some('/');
    let mut sep = if cur.eat_str("//") {
        Sep::Descendant
    } else {
        cur.eat('/');
        Sep::Child
    };

    let mut steps = Vec::new();
    loop {
        steps.push(parse_step(cur, sep)?);
        if cur.eat_str("//") {
            sep = Sep::Descendant;
        } else if cur.eat('/') {
            sep = Sep::Child;
        } else {
            break;
        }
    }
    Ok(PathQuery { absolute, steps })
}

fn parse_step(cur: &mut Cursor, sep: Sep) -> Result<Step, PathSyntaxError> {
    let (axis, test) = if cur.eat_str("..") {
        if sep == Sep::Descendant {
            return Err(cur.error("'..' cannot follow '//'"));
        }
        (Axis::Parent, NodeTest::Node)
    } else if cur.eat('.') {
        if sep == Sep::Descendant {
            return Err(cur.error("'.' cannot follow '//'"));
        }
        (Axis::SelfNode, NodeTest::Node)
    } else if cur.eat('@') {
        if cur.eat('*') {
            (sep.axis(), NodeTest::AnyAttribute)
        } else {
            let name = cur.name().ok_or_else(|| cur.error("expected attribute name"))?;
            (sep.axis(), NodeTest::Attribute(name.to_ascii_lowercase()))
        }
    } else if cur.eat('*') {
        (sep.axis(), NodeTest::AnyElement)
    } else {
        let name = cur.name().ok_or_else(|| cur.error("expected a location step"))?;
        if cur.eat_str("()") {
            match name.as_str() {
                "text" => (sep.axis(), NodeTest::Text),
                "node" => (sep.axis(), NodeTest::AnyElement),
                other => return Err(cur.error(&format!("unsupported node test {}()", other))),
            }
        } else {
            (sep.axis(), NodeTest::Name(name.to_ascii_lowercase()))
        }
    };

    let mut predicates = Vec::new();
    loop {
        let save = cur.pos;
        cur.skip_ws();
        if !cur.eat('[') {
            cur.pos = save;
            break;
        }
        let expr = parse_or(cur)?;
        cur.skip_ws();
        cur.expect(']')?;
        predicates.push(expr);
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_or(cur: &mut Cursor) -> Result<Expr, PathSyntaxError> {
    let mut left = parse_and(cur)?;
    loop {
        let save = cur.pos;
        cur.skip_ws();
        if cur.keyword("or") {
            let right = parse_and(cur)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        } else {
            cur.pos = save;
            return Ok(left);
        }
    }
}

fn parse_and(cur: &mut Cursor) -> Result<Expr, PathSyntaxError> {
    let mut left = parse_unary(cur)?;
    loop {
        let save = cur.pos;
        cur.skip_ws();
        if cur.keyword("and") {
            let right = parse_unary(cur)?;
            left = Expr::And(Box::new(left), Box::new(right));
        } else {
            cur.pos = save;
            return Ok(left);
        }
    }
}

#[derive(Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
}

fn parse_cmp_op(cur: &mut Cursor) -> Option<CmpOp> {
    if cur.eat_str("!=") {
        Some(CmpOp::Ne)
    } else if cur.eat('=') {
        Some(CmpOp::Eq)
    } else {
        None
    }
}

fn parse_cmp_value(cur: &mut Cursor) -> Result<String, PathSyntaxError> {
    cur.skip_ws();
    if let Some(n) = cur.number() {
        return Ok(n.to_string());
    }
    cur.literal()
}

fn comparison(op: CmpOp, operand: Operand, value: String) -> Expr {
    match op {
        CmpOp::Eq => Expr::Eq(operand, value),
        CmpOp::Ne => Expr::Ne(operand, value),
    }
}

fn parse_unary(cur: &mut Cursor) -> Result<Expr, PathSyntaxError> {
    cur.skip_ws();
    if cur.eat('(') {
        let expr = parse_or(cur)?;
        cur.skip_ws();
        cur.expect(')')?;
        return Ok(expr);
    }
    if let Some(n) = cur.number() {
        if n == 0 {
            return Err(cur.error("positions start at 1"));
        }
        return Ok(Expr::Position(n));
    }
    if matches!(cur.peek(), Some('\'' | '"')) {
        let value = cur.literal()?;
        cur.skip_ws();
        let op = parse_cmp_op(cur).ok_or_else(|| cur.error("expected '=' or '!='"))?;
        let operand = parse_operand(cur)?;
        return Ok(comparison(op, operand, value));
    }

    let save = cur.pos;
    if let Some(name) = cur.name() {
        cur.skip_ws();
        if cur.eat('(') {
            match name.as_str() {
                "not" => {
                    let inner = parse_or(cur)?;
                    cur.skip_ws();
                    cur.expect(')')?;
                    return Ok(Expr::Not(Box::new(inner)));
                }
                "contains" | "starts-with" | "ends-with" => {
                    let operand = parse_operand(cur)?;
                    cur.skip_ws();
                    cur.expect(',')?;
                    cur.skip_ws();
                    let value = cur.literal()?;
                    cur.skip_ws();
                    cur.expect(')')?;
                    return Ok(match name.as_str() {
                        "contains" => Expr::Contains(operand, value),
                        "starts-with" => Expr::StartsWith(operand, value),
                        _ => Expr::EndsWith(operand, value),
                    });
                }
                "last" => {
                    cur.skip_ws();
                    cur.expect(')')?;
                    return Ok(Expr::Last);
                }
                "position" => {
                    cur.skip_ws();
                    cur.expect(')')?;
                    cur.skip_ws();
                    cur.expect('=')?;
                    cur.skip_ws();
                    if cur.keyword("last") {
                        cur.skip_ws();
                        cur.expect('(')?;
                        cur.skip_ws();
                        cur.expect(')')?;
                        return Ok(Expr::Last);
                    }
                    let n = cur.number().ok_or_else(|| cur.error("expected a position"))?;
                    return Ok(Expr::Position(n));
                }
                _ => {}
            }
        }
    }
    cur.pos = save;

    let operand = parse_operand(cur)?;
    let save = cur.pos;
    cur.skip_ws();
    match parse_cmp_op(cur) {
        Some(op) => {
            let value = parse_cmp_value(cur)?;
            Ok(comparison(op, operand, value))
        }
        None => {
            cur.pos = save;
            Ok(match operand {
                Operand::Path(path) => Expr::Exists(path),
                other => Expr::NonEmpty(other),
            })
        }
    }
}

fn parse_operand(cur: &mut Cursor) -> Result<Operand, PathSyntaxError> {
    cur.skip_ws();
    let save = cur.pos;
    if let Some(name) = cur.name() {
        if name == "normalize-space" || name == "string" {
            cur.skip_ws();
            if cur.eat('(') {
                cur.skip_ws();
                let inner = if cur.peek() == Some(')') {
                    Operand::Path(PathQuery::context())
                } else {
                    parse_operand(cur)?
                };
                cur.skip_ws();
                cur.expect(')')?;
                return Ok(if name == "string" {
                    inner
                } else {
                    Operand::NormalizeSpace(Box::new(inner))
                });
            }
        }
    }
    cur.pos = save;
    Ok(Operand::Path(parse_location_path(cur)?))
}

// --- CSS front-end ---

fn parse_css_complex(cur: &mut Cursor, first: Sep) -> Result<PathQuery, PathSyntaxError> {
    let mut steps = Vec::new();
    let mut sep = first;
    loop {
        steps.push(parse_css_compound(cur, sep)?);
        let had_ws = cur.skip_ws();
        match cur.peek() {
            None | Some(')') => break,
            Some('>') => {
                cur.bump();
                cur.skip_ws();
                sep = Sep::Child;
            }
            Some(',') => return Err(cur.error("selector lists are not supported")),
            Some('+') | Some('~') => return Err(cur.error("sibling combinators are not supported")),
            Some(_) if had_ws => sep = Sep::Descendant,
            Some(c) => return Err(cur.error(&format!("unexpected '{}'", c))),
        }
    }
    Ok(PathQuery {
        absolute: false,
        steps,
    })
}

fn parse_css_compound(cur: &mut Cursor, sep: Sep) -> Result<Step, PathSyntaxError> {
    let start = cur.pos;
    let test = if cur.eat('*') {
        NodeTest::AnyElement
    } else if let Some(name) = cur.css_ident() {
        NodeTest::Name(name.to_ascii_lowercase())
    } else {
        NodeTest::AnyElement
    };

    let mut predicates = Vec::new();
    loop {
        match cur.peek() {
            Some('.') => {
                cur.bump();
                let class = cur.css_ident().ok_or_else(|| cur.error("expected class name"))?;
                predicates.push(Expr::HasWord(Operand::Path(PathQuery::attribute("class")), class));
            }
            Some('#') => {
                cur.bump();
                let id = cur.css_ident().ok_or_else(|| cur.error("expected id"))?;
                predicates.push(Expr::Eq(Operand::Path(PathQuery::attribute("id")), id));
            }
            Some('[') => {
                cur.bump();
                predicates.push(parse_css_attribute(cur)?);
            }
            Some(':') => {
                cur.bump();
                let pseudo = cur.css_ident().ok_or_else(|| cur.error("expected pseudo-class"))?;
                if pseudo != "has" {
                    return Err(cur.error(&format!("unsupported pseudo-class :{}", pseudo)));
                }
                cur.expect('(')?;
                cur.skip_ws();
                let first = if cur.eat('>') {
                    cur.skip_ws();
                    Sep::Child
                } else {
                    Sep::Descendant
                };
                let inner = parse_css_complex(cur, first)?;
                cur.skip_ws();
                cur.expect(')')?;
                predicates.push(Expr::Exists(inner));
            }
            _ => break,
        }
    }

    if cur.pos == start {
        return Err(cur.error("expected a selector"));
    }
    Ok(Step {
        axis: sep.axis(),
        test,
        predicates,
    })
}

fn parse_css_attribute(cur: &mut Cursor) -> Result<Expr, PathSyntaxError> {
    cur.skip_ws();
    let name = cur.css_ident().ok_or_else(|| cur.error("expected attribute name"))?;
    let operand = Operand::Path(PathQuery::attribute(&name));
    cur.skip_ws();
    if cur.eat(']') {
        return Ok(Expr::Exists(PathQuery::attribute(&name)));
    }

    #[derive(Clone, Copy)]
    enum Op {
        Eq,
        Contains,
        Prefix,
        Suffix,
        Word,
    }
    let op = if cur.eat_str("*=") {
        Op::Contains
    } else if cur.eat_str("^=") {
        Op::Prefix
    } else if cur.eat_str("$=") {
        Op::Suffix
    } else if cur.eat_str("~=") {
        Op::Word
    } else if cur.eat('=') {
        Op::Eq
    } else {
        return Err(cur.error("unsupported attribute operator"));
    };

    cur.skip_ws();
    let value = if matches!(cur.peek(), Some('\'' | '"')) {
        cur.literal()?
    } else {
        cur.css_ident().ok_or_else(|| cur.error("expected attribute value"))?
    };
    cur.skip_ws();
    cur.expect(']')?;

    Ok(match op {
        Op::Eq => Expr::Eq(operand, value),
        Op::Contains => Expr::Contains(operand, value),
        Op::Prefix => Expr::StartsWith(operand, value),
        Op::Suffix => Expr::EndsWith(operand, value),
        Op::Word => Expr::HasWord(operand, value),
    })
}
