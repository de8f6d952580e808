//! Statement parsing and instruction emission.
//!
//! One pass over the document. Constructor arguments become PUSH
//! instructions immediately before the DEFINE that consumes them; every
//! closed block emits exactly one END; lists emit LIST_START / ELEMENT* /
//! LIST_END with nested-object elements compiled first and referenced by
//! synthetic numeric ids.

use tracing::{debug, trace};

use graft_bytecode::arg::{STACK_MARKER, ref_marker};
use graft_bytecode::{Instruction, Opcode};
use graft_core::escape::{quote, unquote};

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind, lex};
use crate::source::{SourceStack, Statement};

/// Compile a notation document into its instruction stream.
///
/// The first structural violation aborts with a [`ParseError`]; there is no
/// partial output.
pub fn compile(source: &str) -> Result<Vec<Instruction>, ParseError> {
    Compiler::new().run(source)
}

/// How a compiled value is delivered to its consumer.
enum CompiledValue {
    /// An argument token usable in-place: a literal, `null`, `default`, or
    /// `_ref(id)` (after any nested definition has been emitted).
    Arg(String),
    /// The value was staged on the value stack (collections); consume with
    /// `_stack()`.
    Stacked,
}

struct Compiler {
    out: Vec<Instruction>,
    sources: SourceStack,
    /// Counter for synthetic ids of inline list-element objects. Numeric,
    /// so they can never collide with identifier-shaped user ids.
    next_anon: u32,
    /// Type and id of every top-level definition, for auto-return.
    top_level: Vec<(String, String)>,
    saw_return: bool,
}

impl Compiler {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            sources: SourceStack::new(),
            next_anon: 1,
            top_level: Vec::new(),
            saw_return: false,
        }
    }

    fn run(mut self, source: &str) -> Result<Vec<Instruction>, ParseError> {
        self.sources.push_text(source, 1);
        self.compile_frame()?;

        if !self.saw_return {
            self.synthesize_return()?;
        }
        debug!(instructions = self.out.len(), "compiled document");
        Ok(self.out)
    }

    /// Compile every statement of the top source frame, then pop it.
    fn compile_frame(&mut self) -> Result<(), ParseError> {
        while let Some(stmt) = self.sources.next_statement()? {
            self.compile_statement(&stmt)?;
        }
        self.sources.pop_frame();
        Ok(())
    }

    fn compile_statement(&mut self, stmt: &Statement) -> Result<(), ParseError> {
        trace!(line = stmt.line, "statement");
        let tokens = lex(&stmt.text).map_err(|offset| {
            ParseError::new(line_at(stmt, offset), ParseErrorKind::Lex)
        })?;
        let mut cur = Cursor::new(&stmt.text, tokens, stmt.line);

        match cur.peek() {
            // Stray separators (e.g. the `;` after a block) are skipped.
            Some(TokenKind::Semi) => {
                while cur.eat(TokenKind::Semi) {}
            }
            Some(TokenKind::KwReturn) => {
                cur.bump();
                let id = cur.expect(TokenKind::Ident, "instance id")?;
                let id = cur.text(id).to_string();
                cur.expect(TokenKind::Semi, "`;`")?;
                self.emit(Opcode::Ret, vec![id]);
                self.saw_return = true;
            }
            Some(TokenKind::LAngle) => {
                self.compile_list(&mut cur)?;
                cur.eat(TokenKind::Semi);
            }
            Some(TokenKind::Ident) if cur.peek2() == Some(TokenKind::Eq) => {
                self.compile_assignment(&mut cur)?;
            }
            Some(TokenKind::Ident) => {
                let at_root = self.sources.depth() == 1;
                let (type_text, id) = self.compile_definition(&mut cur)?;
                if at_root {
                    self.top_level.push((type_text, id));
                }
                cur.eat(TokenKind::Semi);
            }
            _ => return Err(cur.err_unexpected("a statement")),
        }
        cur.expect_done()
    }

    /// `TYPE ('(' args ')')? ':' ID ('{' member* '}' | ';')`
    ///
    /// Returns the type text and instance id.
    fn compile_definition(&mut self, cur: &mut Cursor<'_>) -> Result<(String, String), ParseError> {
        let type_text = self.parse_type(cur)?;

        let mut args = Vec::new();
        if cur.eat(TokenKind::LParen) {
            if !cur.at(TokenKind::RParen) {
                loop {
                    args.push(self.parse_ctor_arg(cur)?);
                    if !cur.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            cur.expect(TokenKind::RParen, "`)`")?;
        }

        cur.expect(TokenKind::Colon, "`:`")?;
        let id = cur.expect(TokenKind::Ident, "instance id")?;
        let id = cur.text(id).to_string();

        let argc = args.len();
        for arg in args {
            self.emit(Opcode::Push, vec![arg]);
        }
        self.emit(Opcode::Define, vec![
            type_text.clone(),
            id.clone(),
            argc.to_string(),
        ]);

        if cur.eat(TokenKind::Semi) {
            // Bodyless definition: the scope closes immediately.
            self.emit(Opcode::End, vec![id.clone()]);
        } else {
            let (body, first_line) = self.block_body(cur)?;
            self.sources.push_text(&body, first_line);
            self.compile_frame()?;
            self.emit(Opcode::End, vec![id.clone()]);
        }
        Ok((type_text, id))
    }

    /// `NAME '=' value ';'`
    fn compile_assignment(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let name = cur.expect(TokenKind::Ident, "member name")?;
        let name = cur.text(name).to_string();
        cur.expect(TokenKind::Eq, "`=`")?;
        let value = self.compile_value(cur)?;
        cur.expect(TokenKind::Semi, "`;`")?;

        let arg = match value {
            CompiledValue::Arg(arg) => arg,
            CompiledValue::Stacked => STACK_MARKER.to_string(),
        };
        self.emit(Opcode::Set, vec![name, arg]);
        Ok(())
    }

    /// A member or element value. Nested definitions and collections are
    /// fully compiled here; the returned form tells the caller how to
    /// consume the result.
    fn compile_value(&mut self, cur: &mut Cursor<'_>) -> Result<CompiledValue, ParseError> {
        match cur.peek() {
            Some(TokenKind::Number | TokenKind::KwTrue | TokenKind::KwFalse) => {
                let tok = cur.bump().expect("peeked");
                Ok(CompiledValue::Arg(cur.text(tok).to_string()))
            }
            Some(TokenKind::Str) => {
                let tok = cur.bump().expect("peeked");
                Ok(CompiledValue::Arg(normalize_string(cur.text(tok))))
            }
            Some(TokenKind::KwNull) => {
                cur.bump();
                Ok(CompiledValue::Arg("null".to_string()))
            }
            Some(TokenKind::KwDefault) => {
                cur.bump();
                Ok(CompiledValue::Arg("default".to_string()))
            }
            Some(TokenKind::LAngle) => {
                self.compile_list(cur)?;
                Ok(CompiledValue::Stacked)
            }
            Some(TokenKind::Ident) if cur.current_text() == "_ref" => {
                cur.bump();
                cur.expect(TokenKind::LParen, "`(`")?;
                let id = match cur.peek() {
                    Some(TokenKind::Ident | TokenKind::Number) => {
                        let tok = cur.bump().expect("peeked");
                        cur.text(tok).to_string()
                    }
                    _ => return Err(cur.err_unexpected("instance id")),
                };
                cur.expect(TokenKind::RParen, "`)`")?;
                Ok(CompiledValue::Arg(ref_marker(&id)))
            }
            Some(TokenKind::Ident) => match cur.peek2() {
                // A nested definition used as a value: compile it, then
                // reference it by id.
                Some(TokenKind::LParen | TokenKind::Colon | TokenKind::LAngle) => {
                    let (_, id) = self.compile_definition(cur)?;
                    Ok(CompiledValue::Arg(ref_marker(&id)))
                }
                // Bare word literal (e.g. an enum constant name).
                _ => {
                    let tok = cur.bump().expect("peeked");
                    Ok(CompiledValue::Arg(cur.text(tok).to_string()))
                }
            },
            _ => Err(cur.err_unexpected("a value")),
        }
    }

    /// `'<' TYPE (',' TYPE)* '>' '[' element (',' element)* ']'`
    fn compile_list(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        cur.expect(TokenKind::LAngle, "`<`")?;
        let mut types = vec![self.parse_type(cur)?];
        while cur.eat(TokenKind::Comma) {
            types.push(self.parse_type(cur)?);
        }
        cur.expect(TokenKind::RAngle, "`>`")?;
        cur.expect(TokenKind::LBracket, "`[`")?;

        self.emit(Opcode::ListStart, types.clone());

        if !cur.eat(TokenKind::RBracket) {
            let mut index = 0usize;
            loop {
                self.compile_element(cur, &types, index)?;
                index += 1;
                if cur.eat(TokenKind::Comma) {
                    continue;
                }
                cur.expect(TokenKind::RBracket, "`]` or `,`")?;
                break;
            }
        }
        self.emit(Opcode::ListEnd, vec![]);
        Ok(())
    }

    /// One list element. An inline `{ member* }` literal is an anonymous
    /// object of the declared item type: it is compiled first under a
    /// synthetic id, then appended by reference.
    fn compile_element(
        &mut self,
        cur: &mut Cursor<'_>,
        types: &[String],
        index: usize,
    ) -> Result<(), ParseError> {
        if cur.at(TokenKind::LBrace) {
            let item_type = types[index % types.len()].clone();
            let id = self.next_anon_id();
            let (body, first_line) = self.block_body(cur)?;
            self.emit(Opcode::Define, vec![item_type, id.clone(), "0".to_string()]);
            self.sources.push_text(&body, first_line);
            self.compile_frame()?;
            self.emit(Opcode::End, vec![id.clone()]);
            self.emit(Opcode::Element, vec![ref_marker(&id)]);
            return Ok(());
        }

        let arg = match self.compile_value(cur)? {
            CompiledValue::Arg(arg) => arg,
            CompiledValue::Stacked => STACK_MARKER.to_string(),
        };
        self.emit(Opcode::Element, vec![arg]);
        Ok(())
    }

    /// A type name with optional nested generic parameters, compacted to a
    /// whitespace-free textual key (`Map<string,List<int>>`). The executor's
    /// construction layer does the actual resolution.
    fn parse_type(&mut self, cur: &mut Cursor<'_>) -> Result<String, ParseError> {
        let first = cur.expect(TokenKind::Ident, "type name")?;
        let start = first.start;
        let mut end = first.end;

        if cur.at(TokenKind::LAngle) {
            let mut depth = 0i32;
            loop {
                let Some(tok) = cur.bump() else {
                    return Err(cur.err_unexpected("`>`"));
                };
                match tok.kind {
                    TokenKind::LAngle => depth += 1,
                    TokenKind::RAngle => depth -= 1,
                    TokenKind::Ident | TokenKind::Comma => {}
                    _ => return Err(cur.err_unexpected("a generic parameter")),
                }
                end = tok.end;
                if depth == 0 {
                    break;
                }
            }
        }

        Ok(cur.src[start..end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect())
    }

    /// Constructor arguments are literals; anything structured is rejected.
    fn parse_ctor_arg(&mut self, cur: &mut Cursor<'_>) -> Result<String, ParseError> {
        match cur.peek() {
            Some(TokenKind::Number | TokenKind::KwTrue | TokenKind::KwFalse) => {
                let tok = cur.bump().expect("peeked");
                Ok(cur.text(tok).to_string())
            }
            Some(TokenKind::Str) => {
                let tok = cur.bump().expect("peeked");
                Ok(normalize_string(cur.text(tok)))
            }
            Some(TokenKind::KwNull) => {
                cur.bump();
                Ok("null".to_string())
            }
            _ => Err(ParseError::new(cur.current_line(), ParseErrorKind::NonLiteralArgument)),
        }
    }

    /// Consume a `{ ... }` block, returning its raw body text and the line
    /// the body starts on. Token-level brace matching, so braces inside
    /// string literals are safe here.
    fn block_body(&mut self, cur: &mut Cursor<'_>) -> Result<(String, usize), ParseError> {
        let open = cur.expect(TokenKind::LBrace, "`{`")?;
        let mut depth = 1i32;
        let close = loop {
            let Some(tok) = cur.bump() else {
                return Err(cur.err_unexpected("`}`"));
            };
            match tok.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break tok;
                    }
                }
                _ => {}
            }
        };

        let body = cur.src[open.end..close.start].to_string();
        let first_line = cur.line + cur.src[..open.end].matches('\n').count();
        Ok((body, first_line))
    }

    /// A document without an explicit `return` still produces a result: the
    /// single top-level definition, or a homogeneous list of all of them.
    fn synthesize_return(&mut self) -> Result<(), ParseError> {
        match self.top_level.len() {
            0 => Err(ParseError::new(1, ParseErrorKind::EmptyDocument)),
            1 => {
                let id = self.top_level[0].1.clone();
                self.emit(Opcode::Ret, vec![id]);
                Ok(())
            }
            _ => {
                let item_type = self.top_level[0].0.clone();
                self.emit(Opcode::ListStart, vec![item_type]);
                for (_, id) in std::mem::take(&mut self.top_level) {
                    self.emit(Opcode::Element, vec![ref_marker(&id)]);
                }
                self.emit(Opcode::ListEnd, vec![]);
                self.emit(Opcode::Ret, vec![STACK_MARKER.to_string()]);
                Ok(())
            }
        }
    }

    fn next_anon_id(&mut self) -> String {
        let id = self.next_anon.to_string();
        self.next_anon += 1;
        id
    }

    fn emit(&mut self, opcode: Opcode, args: Vec<String>) {
        self.out.push(Instruction::new(opcode, args));
    }
}

fn line_at(stmt: &Statement, offset: usize) -> usize {
    stmt.line + stmt.text[..offset].matches('\n').count()
}

/// Re-quote a string literal for the wire form. The bytecode is
/// line-oriented, so a raw newline inside a source literal must leave as an
/// escape. Literals that fail to decode pass through untouched; the executor
/// reports them.
fn normalize_string(raw: &str) -> String {
    match unquote(raw) {
        Some(decoded) => quote(&decoded),
        None => raw.to_string(),
    }
}

/// Token cursor over one statement.
struct Cursor<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    /// Line number of the statement's first character.
    line: usize,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str, tokens: Vec<Token>, line: usize) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek2(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump().expect("peeked"))
        } else {
            Err(self.err_unexpected(expected))
        }
    }

    /// The statement must be fully consumed.
    fn expect_done(&self) -> Result<(), ParseError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.err_unexpected("end of statement"))
        }
    }

    fn text(&self, tok: Token) -> &'s str {
        &self.src[tok.start..tok.end]
    }

    fn current_text(&self) -> &'s str {
        self.tokens
            .get(self.pos)
            .map(|t| self.text(*t))
            .unwrap_or("")
    }

    fn current_line(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some(tok) => self.line + self.src[..tok.start].matches('\n').count(),
            None => self.line + self.src.matches('\n').count(),
        }
    }

    fn err_unexpected(&self, expected: &'static str) -> ParseError {
        let found = match self.tokens.get(self.pos) {
            Some(tok) => self.text(*tok).to_string(),
            None => "end of statement".to_string(),
        };
        ParseError::new(self.current_line(), ParseErrorKind::Unexpected { expected, found })
    }
}
