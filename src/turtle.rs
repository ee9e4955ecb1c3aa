//! Turtle text I/O: the thin ambient layer that reads reference ontology
//! and input files into a [`TripleStore`] and writes one back out as RFC
//! Turtle text (`6. EXTERNAL INTERFACES`, reference ontologies folder and
//! output Turtle file). This is plumbing around the core, not one of its
//! subsystems: the grammar handled here covers what the reference corpus
//! and this bridge's own output actually use, not the full Turtle grammar.

use crate::error::{BridgeError, BridgeResult};
use crate::iri::IRI;
use crate::prefix::PrefixRegistry;
use crate::term::{Literal, Term};
use crate::triple::{Triple, TripleStore};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Parse a Turtle document, returning its triples and the `@prefix`
/// bindings it declared. Bindings are applied to `registry` as they are
/// read so that later statements in the same document can use them.
pub fn parse(content: &str, registry: &mut PrefixRegistry) -> BridgeResult<TripleStore> {
    let tokens = tokenize(content)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        registry,
        store: TripleStore::new(),
        blank_counter: 0,
    };
    parser.parse_document()?;
    Ok(parser.store)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    IriRef(String),
    PrefixedName(String, String),
    BlankNode(String),
    Literal(String, Option<LiteralSuffix>),
    PrefixKeyword,
    BaseKeyword,
    Dot,
    Semicolon,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    A,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LiteralSuffix {
    Lang(String),
    Datatype(Box<Token>),
}

fn tokenize(content: &str) -> BridgeResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = content.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        match c {
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::OpenBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::CloseBracket);
                i += 1;
            }
            '<' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != '>' {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(BridgeError::ParseError("unterminated IRI reference".into()));
                }
                let iri: String = chars[start..end].iter().collect();
                tokens.push(Token::IriRef(iri));
                i = end + 1;
            }
            '"' | '\'' => {
                let (value, next) = read_quoted(&chars, i)?;
                i = next;
                if i + 1 < chars.len() && chars[i] == '@' {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-') {
                        end += 1;
                    }
                    let lang: String = chars[start..end].iter().collect();
                    i = end;
                    tokens.push(Token::Literal(value, Some(LiteralSuffix::Lang(lang))));
                } else if i + 1 < chars.len() && chars[i] == '^' && chars[i + 1] == '^' {
                    i += 2;
                    let (datatype_tok, next) = read_term_ref(&chars, i)?;
                    i = next;
                    tokens.push(Token::Literal(value, Some(LiteralSuffix::Datatype(Box::new(datatype_tok)))));
                } else {
                    tokens.push(Token::Literal(value, None));
                }
            }
            '_' if chars.get(i + 1) == Some(&':') => {
                let start = i + 2;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                let id: String = chars[start..end].iter().collect();
                tokens.push(Token::BlankNode(id));
                i = end;
            }
            _ if c.is_ascii_digit() || c == '-' || c == '+' => {
                let start = i;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.' || chars[end] == '-' || chars[end] == '+' || chars[end] == 'e' || chars[end] == 'E') {
                    end += 1;
                }
                let raw: String = chars[start..end].iter().collect();
                let datatype_iri = format!("{}{}", crate::constants::xsd::NS, numeric_datatype(&raw));
                tokens.push(Token::Literal(raw, Some(LiteralSuffix::Datatype(Box::new(Token::IriRef(datatype_iri))))));
                i = end;
            }
            '@' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-') {
                    end += 1;
                }
                let word: String = chars[start..end].iter().collect();
                i = end;
                match word.as_str() {
                    "prefix" => tokens.push(Token::PrefixKeyword),
                    "base" => tokens.push(Token::BaseKeyword),
                    other => return Err(BridgeError::ParseError(format!("unknown directive @{other}"))),
                }
            }
            _ => {
                let start = i;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                if end == start {
                    return Err(BridgeError::ParseError(format!("unexpected character '{c}'")));
                }
                let word: String = chars[start..end].iter().collect();
                i = end;
                if word == "a" {
                    tokens.push(Token::A);
                } else if let Some(colon) = word.find(':') {
                    let (prefix, local) = word.split_at(colon);
                    tokens.push(Token::PrefixedName(prefix.to_string(), local[1..].to_string()));
                } else {
                    return Err(BridgeError::ParseError(format!("unexpected token '{word}'")));
                }
            }
        }
    }
    Ok(tokens)
}

fn numeric_datatype(raw: &str) -> &'static str {
    if raw.contains('.') || raw.contains('e') || raw.contains('E') {
        "decimal"
    } else {
        "integer"
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn read_quoted(chars: &[char], start: usize) -> BridgeResult<(String, usize)> {
    let quote = chars[start];
    let long = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut i = if long { start + 3 } else { start + 1 };
    let mut value = String::new();
    loop {
        if i >= chars.len() {
            return Err(BridgeError::ParseError("unterminated string literal".into()));
        }
        if long {
            if chars[i] == quote && chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return Ok((value, i + 3));
            }
        } else if chars[i] == quote {
            return Ok((value, i + 1));
        }
        if chars[i] == '\\' && i + 1 < chars.len() {
            value.push(unescape(chars[i + 1]));
            i += 2;
        } else {
            value.push(chars[i]);
            i += 1;
        }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

fn read_term_ref(chars: &[char], i: usize) -> BridgeResult<(Token, usize)> {
    if chars.get(i) == Some(&'<') {
        let start = i + 1;
        let mut end = start;
        while end < chars.len() && chars[end] != '>' {
            end += 1;
        }
        Ok((Token::IriRef(chars[start..end].iter().collect()), end + 1))
    } else {
        let start = i;
        let mut end = start;
        while end < chars.len() && is_name_char(chars[end]) {
            end += 1;
        }
        let word: String = chars[start..end].iter().collect();
        let colon = word.find(':').ok_or_else(|| BridgeError::ParseError("expected prefixed name after ^^".into()))?;
        let (prefix, local) = word.split_at(colon);
        Ok((Token::PrefixedName(prefix.to_string(), local[1..].to_string()), end))
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    registry: &'a mut PrefixRegistry,
    store: TripleStore,
    blank_counter: u64,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> BridgeResult<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(BridgeError::ParseError(format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn parse_document(&mut self) -> BridgeResult<()> {
        while self.peek().is_some() {
            match self.peek().unwrap() {
                Token::PrefixKeyword => self.parse_prefix_directive()?,
                Token::BaseKeyword => self.parse_base_directive()?,
                _ => self.parse_triples_statement()?,
            }
        }
        Ok(())
    }

    fn parse_prefix_directive(&mut self) -> BridgeResult<()> {
        self.next();
        let prefix = match self.next() {
            Some(Token::PrefixedName(p, local)) if local.is_empty() => p.clone(),
            other => return Err(BridgeError::ParseError(format!("expected prefix label, found {other:?}"))),
        };
        let namespace = match self.next() {
            Some(Token::IriRef(ns)) => ns.clone(),
            other => return Err(BridgeError::ParseError(format!("expected namespace IRI, found {other:?}"))),
        };
        self.expect(&Token::Dot)?;
        self.registry.bind(prefix, namespace);
        Ok(())
    }

    fn parse_base_directive(&mut self) -> BridgeResult<()> {
        self.next();
        self.next();
        self.expect(&Token::Dot)?;
        Ok(())
    }

    fn parse_triples_statement(&mut self) -> BridgeResult<()> {
        let subject = self.parse_subject()?;
        self.parse_predicate_object_list(&subject)?;
        self.expect(&Token::Dot)?;
        Ok(())
    }

    fn fresh_blank(&mut self) -> Term {
        let id = format!("turtle-{:x}", self.blank_counter);
        self.blank_counter += 1;
        Term::BlankNode(id)
    }

    fn parse_subject(&mut self) -> BridgeResult<Term> {
        match self.peek() {
            Some(Token::OpenBracket) => {
                self.next();
                let subject = self.fresh_blank();
                if self.peek() != Some(&Token::CloseBracket) {
                    self.parse_predicate_object_list(&subject)?;
                }
                self.expect(&Token::CloseBracket)?;
                Ok(subject)
            }
            Some(Token::OpenParen) => self.parse_collection(),
            _ => self.parse_term(),
        }
    }

    fn parse_term(&mut self) -> BridgeResult<Term> {
        match self.next().cloned() {
            Some(Token::IriRef(iri)) => Ok(Term::Iri(IRI::new(iri)?)),
            Some(Token::PrefixedName(prefix, local)) => self.resolve_prefixed(&prefix, &local),
            Some(Token::BlankNode(id)) => Ok(Term::BlankNode(id)),
            Some(Token::A) => Ok(Term::Iri(IRI::new(crate::constants::rdf::TYPE)?)),
            Some(Token::Literal(value, suffix)) => self.build_literal(value, suffix),
            other => Err(BridgeError::ParseError(format!("expected a term, found {other:?}"))),
        }
    }

    fn build_literal(&mut self, value: String, suffix: Option<LiteralSuffix>) -> BridgeResult<Term> {
        let literal = match suffix {
            None => Literal::simple(value),
            Some(LiteralSuffix::Lang(lang)) => Literal::lang_tagged(value, lang),
            Some(LiteralSuffix::Datatype(boxed)) => {
                let datatype = match *boxed {
                    Token::IriRef(iri) => IRI::new(iri)?,
                    Token::PrefixedName(prefix, local) => match self.resolve_prefixed(&prefix, &local)? {
                        Term::Iri(iri) => iri,
                        _ => return Err(BridgeError::ParseError("datatype must be an IRI".into())),
                    },
                    other => return Err(BridgeError::ParseError(format!("invalid datatype token {other:?}"))),
                };
                Literal::typed(value, datatype)
            }
        };
        Ok(Term::Literal(literal))
    }

    fn resolve_prefixed(&self, prefix: &str, local: &str) -> BridgeResult<Term> {
        let namespace = self
            .registry
            .lookup(prefix)
            .ok_or_else(|| BridgeError::UnknownPrefix(prefix.to_string()))?;
        Ok(Term::Iri(IRI::new(format!("{namespace}{local}"))?))
    }

    fn parse_collection(&mut self) -> BridgeResult<Term> {
        self.expect(&Token::OpenParen)?;
        let mut members: SmallVec<[Term; 4]> = SmallVec::new();
        while self.peek() != Some(&Token::CloseParen) {
            members.push(self.parse_subject()?);
        }
        self.expect(&Token::CloseParen)?;

        let nil = Term::Iri(IRI::new(crate::constants::rdf::NIL)?);
        let first_pred = Term::Iri(IRI::new(crate::constants::rdf::FIRST)?);
        let rest_pred = Term::Iri(IRI::new(crate::constants::rdf::REST)?);

        let mut rest = nil;
        for member in members.into_iter().rev() {
            let node = self.fresh_blank();
            self.store.insert(Triple::new(node.clone(), first_pred.clone(), member));
            self.store.insert(Triple::new(node.clone(), rest_pred.clone(), rest));
            rest = node;
        }
        Ok(rest)
    }

    fn parse_predicate_object_list(&mut self, subject: &Term) -> BridgeResult<()> {
        loop {
            let predicate = self.parse_term()?;
            self.parse_object_list(subject, &predicate)?;
            if self.peek() == Some(&Token::Semicolon) {
                self.next();
                // Trailing ';' before '.', ']' or end of predicate-object list.
                if matches!(self.peek(), Some(Token::Dot) | Some(Token::CloseBracket) | None) {
                    break;
                }
                continue;
            }
            break;
        }
        Ok(())
    }

    fn parse_object_list(&mut self, subject: &Term, predicate: &Term) -> BridgeResult<()> {
        loop {
            let object = self.parse_subject()?;
            self.store.insert(Triple::new(subject.clone(), predicate.clone(), object));
            if self.peek() == Some(&Token::Comma) {
                self.next();
                continue;
            }
            break;
        }
        Ok(())
    }
}

/// Serialize `store` to RFC Turtle text, binding every prefix `registry`
/// knows about (`4.J`, output Turtle file).
pub fn write(store: &TripleStore, registry: &PrefixRegistry) -> BridgeResult<String> {
    let mut out = String::new();
    for (prefix, namespace) in registry.bindings() {
        out.push_str(&format!("@prefix {prefix}: <{namespace}> .\n"));
    }
    out.push('\n');

    let mut seen_subjects: HashMap<Term, ()> = HashMap::new();
    for subject in store.subjects() {
        if seen_subjects.contains_key(subject) {
            continue;
        }
        seen_subjects.insert(subject.clone(), ());

        out.push_str(&render_term(subject, registry)?);
        out.push(' ');

        let mut by_predicate: Vec<(Term, Vec<&Term>)> = Vec::new();
        for triple in store.subject(subject) {
            match by_predicate.iter_mut().find(|(p, _)| p == &triple.predicate) {
                Some((_, objects)) => objects.push(&triple.object),
                None => by_predicate.push((triple.predicate.clone(), vec![&triple.object])),
            }
        }

        let mut predicate_clauses = Vec::new();
        for (predicate, objects) in &by_predicate {
            let predicate_text = if predicate.as_iri().map(IRI::as_str) == Some(crate::constants::rdf::TYPE) {
                "a".to_string()
            } else {
                render_term(predicate, registry)?
            };
            let mut object_texts = Vec::new();
            for object in objects {
                object_texts.push(render_term(object, registry)?);
            }
            predicate_clauses.push(format!("{predicate_text} {}", object_texts.join(", ")));
        }
        out.push_str(&predicate_clauses.join(" ;\n    "));
        out.push_str(" .\n\n");
    }
    Ok(out)
}

fn render_term(term: &Term, registry: &PrefixRegistry) -> BridgeResult<String> {
    match term {
        Term::Iri(iri) => match registry.shorten(iri.as_str()) {
            Ok(short) => Ok(short),
            Err(_) => Ok(format!("<{}>", iri.as_str())),
        },
        Term::BlankNode(id) => Ok(format!("_:{id}")),
        Term::Literal(literal) => {
            let escaped = literal
                .lexical_form
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            let mut text = format!("\"{escaped}\"");
            if let Some(lang) = &literal.language {
                text.push('@');
                text.push_str(lang);
            } else if let Some(datatype) = &literal.datatype {
                text.push_str("^^");
                text.push_str(&render_term(&Term::Iri(datatype.clone()), registry)?);
            }
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_subclass_triple() {
        let mut registry = PrefixRegistry::new();
        let doc = "@prefix ex: <http://example.org/> .\nex:Dog rdfs:subClassOf ex:Animal .\n";
        let store = parse(doc, &mut registry).unwrap();
        assert_eq!(store.len(), 1);
        let triple = store.iter().next().unwrap();
        assert_eq!(triple.subject, Term::Iri(IRI::new("http://example.org/Dog").unwrap()));
        assert_eq!(triple.predicate, Term::Iri(IRI::new(crate::constants::rdfs::SUB_CLASS_OF).unwrap()));
    }

    #[test]
    fn parses_semicolon_and_comma_lists() {
        let mut registry = PrefixRegistry::new();
        let doc = "@prefix ex: <http://example.org/> .\nex:Dog a ex:Class ; ex:sees ex:Cat, ex:Bird .\n";
        let store = parse(doc, &mut registry).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn parses_string_literal_with_language_tag() {
        let mut registry = PrefixRegistry::new();
        let doc = "@prefix ex: <http://example.org/> .\nex:Dog rdfs:label \"Dog\"@en .\n";
        let store = parse(doc, &mut registry).unwrap();
        let triple = store.iter().next().unwrap();
        match &triple.object {
            Term::Literal(lit) => assert_eq!(lit.language.as_deref(), Some("en")),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_collection_into_first_rest_nil_chain() {
        let mut registry = PrefixRegistry::new();
        let doc = "@prefix ex: <http://example.org/> .\nex:U owl:unionOf ( ex:A ex:B ) .\n";
        let store = parse(doc, &mut registry).unwrap();
        // One unionOf triple plus two (first, rest) pairs for the two members.
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn round_trips_through_write_and_parse() {
        let mut registry = PrefixRegistry::new();
        registry.bind("ex", "http://example.org/");
        let mut store = TripleStore::new();
        let dog = Term::Iri(IRI::new("http://example.org/Dog").unwrap());
        let animal = Term::Iri(IRI::new("http://example.org/Animal").unwrap());
        let sub_class = Term::Iri(IRI::new(crate::constants::rdfs::SUB_CLASS_OF).unwrap());
        store.insert(Triple::new(dog.clone(), sub_class.clone(), animal.clone()));
        let text = write(&store, &registry).unwrap();

        let mut reread_registry = PrefixRegistry::new();
        let reread = parse(&text, &mut reread_registry).unwrap();
        assert_eq!(reread.len(), 1);
        let triple = reread.iter().next().unwrap();
        assert_eq!(triple.subject, dog);
        assert_eq!(triple.object, animal);
    }
}
