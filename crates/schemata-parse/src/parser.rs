//! Decode/encode interpreter
//!
//! One recursive walk serves both directions and both execution modes. The
//! walk is an async function over boxed futures; synchronous callers poll it
//! exactly once. In synchronous mode no node ever suspends: an asynchronous
//! transformation fails with `Forbidden` instead of being polled.

use schemata_ast::ast::{Declaration, Refinement, Transform, Tuple, TypeLiteral, Union};
use schemata_ast::schema::{never, unknown_record};
use schemata_ast::{
    Ast, AstKind, BoxFuture, DeclarationContext, Direction, ErrorsMode, Keyword,
    OnExcessProperty, ParseError, ParseFailure, ParseOptions, ParseResult, TransformFn,
};
use schemata_value::{Object, PropertyKey, Value};
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll, Waker};

/// Whether transformations may suspend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Asynchronous transformations fail with `Forbidden`
    Sync,
    /// Asynchronous transformations are awaited
    Async,
}

/// Interpreter for one decode/encode call
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    execution: Execution,
    options: ParseOptions,
}

/// Sibling error accumulator honoring the errors mode
struct Errors {
    all: bool,
    errors: Vec<ParseError>,
}

impl Errors {
    fn new(options: &ParseOptions) -> Self {
        Self {
            all: options.collect_all(),
            errors: Vec::new(),
        }
    }

    /// Record an error; fails immediately in fail-fast mode
    fn push(&mut self, error: ParseError) -> ParseResult<()> {
        if self.all {
            self.errors.push(error);
            Ok(())
        } else {
            Err(ParseFailure::single(error))
        }
    }

    fn finish<T>(self, output: T) -> ParseResult<T> {
        match ParseFailure::new(self.errors) {
            Some(failure) => Err(failure),
            None => Ok(output),
        }
    }
}

impl Parser {
    pub fn new(execution: Execution, options: ParseOptions) -> Self {
        Self { execution, options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Parse `input` against `ast` in `direction`
    pub fn run<'a>(
        &'a self,
        ast: &'a Ast,
        input: &'a Value,
        direction: Direction,
    ) -> BoxFuture<'a, ParseResult<Value>> {
        Box::pin(self.parse(ast, input, direction))
    }

    /// Parse without suspending
    pub fn run_sync(&self, ast: &Ast, input: &Value, direction: Direction) -> ParseResult<Value> {
        let sync = Parser::new(Execution::Sync, self.options);
        let mut future = pin!(sync.parse(ast, input, direction));
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => Err(ParseError::forbidden().into()),
        }
    }

    async fn parse(&self, ast: &Ast, input: &Value, direction: Direction) -> ParseResult<Value> {
        match ast.kind() {
            AstKind::Keyword(keyword) => check(keyword.accepts(input), ast, input),
            AstKind::Literal(literal) => check(literal.matches(input), ast, input),
            AstKind::UniqueSymbol(symbol) => {
                check(matches!(input, Value::Symbol(s) if s == symbol), ast, input)
            }
            AstKind::Enums(members) => check(
                members.iter().any(|member| member.value.matches(input)),
                ast,
                input,
            ),
            AstKind::TemplateLiteral(template) => check(
                input.as_str().is_some_and(|s| template.is_match(s)),
                ast,
                input,
            ),
            AstKind::Tuple(tuple) => self.tuple(ast, tuple, input, direction).await,
            AstKind::TypeLiteral(literal) => {
                self.type_literal(ast, literal, input, direction).await
            }
            AstKind::Union(union) => self.union(union, input, direction).await,
            AstKind::Lazy(lazy) => self.run(lazy.resolve(), input, direction).await,
            AstKind::Refinement(refinement) => {
                self.refinement(ast, refinement, input, direction).await
            }
            AstKind::Transform(transform) => {
                self.transform(ast, transform, input, direction).await
            }
            AstKind::Declaration(declaration) => {
                self.declaration(ast, declaration, input, direction)
            }
        }
    }

    async fn tuple(
        &self,
        ast: &Ast,
        tuple: &Tuple,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        let Some(items) = input.as_array() else {
            return Err(ParseError::type_error(ast, input).into());
        };
        let mut errors = Errors::new(&self.options);
        let len = items.len();

        for i in len..tuple.required_len() {
            errors.push(ParseError::index(i, ParseError::missing().into()))?;
        }
        if !tuple.has_rest() {
            for (i, item) in items.iter().enumerate().skip(tuple.elements.len()) {
                errors.push(ParseError::index(i, ParseError::unexpected(item).into()))?;
            }
        }

        let mut output = Vec::with_capacity(len);
        let mut i = 0;
        for element in &tuple.elements {
            if let Some(item) = items.get(i) {
                match self.run(&element.ty, item, direction).await {
                    Ok(value) => output.push(value),
                    Err(failure) => errors.push(ParseError::index(i, failure))?,
                }
            }
            i += 1;
        }

        if let Some((head, tail)) = tuple.rest.split_first() {
            while i < len.saturating_sub(tail.len()) {
                match self.run(head, &items[i], direction).await {
                    Ok(value) => output.push(value),
                    Err(failure) => errors.push(ParseError::index(i, failure))?,
                }
                i += 1;
            }
            for ty in tail {
                if let Some(item) = items.get(i) {
                    match self.run(ty, item, direction).await {
                        Ok(value) => output.push(value),
                        Err(failure) => errors.push(ParseError::index(i, failure))?,
                    }
                }
                i += 1;
            }
        }

        errors.finish(Value::Array(output))
    }

    async fn type_literal(
        &self,
        ast: &Ast,
        literal: &TypeLiteral,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        if literal.is_empty() {
            return check(!input.is_nullish(), ast, input);
        }
        let Some(members) = input.as_object() else {
            return Err(ParseError::type_error(ast, input).into());
        };
        let mut errors = Errors::new(&self.options);
        let on_excess = self.options.on_excess_property;

        if on_excess == OnExcessProperty::Error {
            for (key, value) in members {
                if literal.property(key).is_none() && !self.accepts_key(literal, key).await {
                    errors.push(ParseError::key(key.clone(), ParseError::unexpected(value).into()))?;
                }
            }
        }

        let mut output = Object::new();
        for ps in literal.property_signatures() {
            let present = members.get(&ps.name);
            if present.is_none() {
                if ps.optional {
                    continue;
                }
                if self.options.exact {
                    errors.push(ParseError::key(ps.name.clone(), ParseError::missing().into()))?;
                    continue;
                }
            }
            let value = present.unwrap_or(&Value::Undefined);
            match self.run(&ps.ty, value, direction).await {
                Ok(parsed) => {
                    output.insert(ps.name.clone(), parsed);
                }
                Err(failure) => {
                    let failure = if present.is_some() {
                        failure
                    } else {
                        ParseError::missing().into()
                    };
                    errors.push(ParseError::key(ps.name.clone(), failure))?;
                }
            }
        }

        for signature in literal.index_signatures() {
            for (key, value) in members {
                if !key_matches_parameter(key, &signature.parameter)
                    || literal.property(key).is_some()
                {
                    continue;
                }
                if let Err(failure) = self.run(&signature.parameter, &key.to_value(), direction).await
                {
                    errors.push(ParseError::key(key.clone(), failure))?;
                    continue;
                }
                match self.run(&signature.ty, value, direction).await {
                    Ok(parsed) => {
                        output.insert(key.clone(), parsed);
                    }
                    Err(failure) => errors.push(ParseError::key(key.clone(), failure))?,
                }
            }
        }

        if on_excess == OnExcessProperty::Preserve {
            for (key, value) in members {
                if !output.contains_key(key) {
                    output.insert(key.clone(), value.clone());
                }
            }
        }

        errors.finish(Value::Object(output))
    }

    /// Check if an undeclared key is covered by an index signature
    async fn accepts_key(&self, literal: &TypeLiteral, key: &PropertyKey) -> bool {
        let key_value = key.to_value();
        for signature in literal.index_signatures() {
            if key_matches_parameter(key, &signature.parameter)
                && self
                    .run(&signature.parameter, &key_value, Direction::Decode)
                    .await
                    .is_ok()
            {
                return true;
            }
        }
        false
    }

    async fn union(
        &self,
        union: &Union,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        let index = union.discriminants(direction);
        let members = union.members();
        let mut errors = Vec::new();
        let mut candidates: Vec<usize> = Vec::new();

        if !index.is_empty() {
            match input.as_object() {
                Some(object) => {
                    for (key, discriminant) in &index.keys {
                        match object.get(key) {
                            Some(value) => {
                                match discriminant.buckets.get(&value.to_display_string()) {
                                    Some(bucket) => candidates.extend(bucket),
                                    None => errors.push(ParseError::key(
                                        key.clone(),
                                        ParseError::type_error(&discriminant.literals, value)
                                            .into(),
                                    )),
                                }
                            }
                            None => errors.push(ParseError::key(
                                key.clone(),
                                ParseError::missing().into(),
                            )),
                        }
                    }
                }
                None => errors.push(ParseError::type_error(&unknown_record(), input)),
            }
        }
        candidates.extend(&index.otherwise);

        // Each member attempt stops at its first error
        let member = Parser::new(self.execution, self.options.with_errors(ErrorsMode::First));
        for i in candidates {
            match member.run(&members[i], input, direction).await {
                Ok(value) => return Ok(value),
                Err(failure) => errors.push(ParseError::union_member(failure)),
            }
        }

        Err(ParseFailure::new(errors)
            .unwrap_or_else(|| ParseError::type_error(&never(), input).into()))
    }

    async fn refinement(
        &self,
        ast: &Ast,
        refinement: &Refinement,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        match direction {
            Direction::Decode => {
                let value = self.run(&refinement.from, input, direction).await?;
                match (refinement.filter)(&value, &self.options, ast) {
                    Some(error) => Err(error.into()),
                    None => Ok(value),
                }
            }
            Direction::Encode => {
                let validated = self.run(&ast.to_side(), input, Direction::Decode).await?;
                self.run(&refinement.from.drop_right_refinement(), &validated, direction)
                    .await
            }
        }
    }

    async fn transform(
        &self,
        ast: &Ast,
        transform: &Transform,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        let (source, target, f) = match direction {
            Direction::Decode => (&transform.from, &transform.to, &transform.decode),
            Direction::Encode => (&transform.to, &transform.from, &transform.encode),
        };
        let value = self.run(source, input, direction).await?;
        let output = match f {
            TransformFn::Sync(f) => f(&value, &self.options, ast)?,
            TransformFn::Async(f) => match self.execution {
                Execution::Sync => return Err(ParseError::forbidden().into()),
                Execution::Async => f(value, self.options, ast.clone()).await?,
            },
        };
        if transform.strict {
            self.run(target, &output, direction).await
        } else {
            Ok(output)
        }
    }

    fn declaration(
        &self,
        ast: &Ast,
        declaration: &Declaration,
        input: &Value,
        direction: Direction,
    ) -> ParseResult<Value> {
        let hook = match direction {
            Direction::Decode => &declaration.decode,
            Direction::Encode => &declaration.encode,
        };
        let context = HookContext {
            parser: self,
            ast,
            direction,
        };
        hook(input, &declaration.type_parameters, &context)
    }
}

fn check(accepted: bool, ast: &Ast, input: &Value) -> ParseResult<Value> {
    if accepted {
        Ok(input.clone())
    } else {
        Err(ParseError::type_error(ast, input).into())
    }
}

/// String keys feed string and template parameters, symbol keys feed
/// symbol parameters
fn key_matches_parameter(key: &PropertyKey, parameter: &Ast) -> bool {
    match parameter.kind() {
        AstKind::Keyword(Keyword::Symbol) => key.is_symbol(),
        AstKind::Refinement(refinement) => key_matches_parameter(key, &refinement.from),
        _ => !key.is_symbol(),
    }
}

struct HookContext<'a> {
    parser: &'a Parser,
    ast: &'a Ast,
    direction: Direction,
}

impl DeclarationContext for HookContext<'_> {
    fn options(&self) -> &ParseOptions {
        &self.parser.options
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn ast(&self) -> &Ast {
        self.ast
    }

    fn parse(&self, ast: &Ast, input: &Value) -> ParseResult<Value> {
        self.parser.run_sync(ast, input, self.direction)
    }
}
