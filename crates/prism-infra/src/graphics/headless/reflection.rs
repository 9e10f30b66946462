// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A small GLSL front end that recovers the declarations a driver would report
//! through `getActiveUniform` / `getActiveAttrib`.
//!
//! It understands ES 1.00 and ES 3.00 style sources: `attribute`/`in`/`uniform`
//! globals, `layout(location = N)`, arrays sized by literals or `#define`s, and
//! (possibly nested) structs. Function bodies and uniform blocks are skipped.

use std::collections::HashMap;

use prism_core::renderer::{ActiveAttribute, ActiveUniform, GlslType, ShaderStage, UniformLocation};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Punct(char),
}

impl Token {
    fn is_ident(&self, s: &str) -> bool {
        matches!(self, Token::Ident(i) if i == s)
    }

    fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }
}

/// The type of a reflected declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclType {
    /// A built-in GLSL type.
    Glsl(GlslType),
    /// A user-declared struct, by name.
    Struct(String),
}

/// A global or struct-member declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The declared name.
    pub name: String,
    /// The declared type.
    pub ty: DeclType,
    /// The array length, if the declaration is an array.
    pub array_len: Option<u32>,
    /// An explicit `layout(location = N)`.
    pub location: Option<u32>,
}

/// Everything recovered from one shader stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReflection {
    /// Uniform globals, in declaration order.
    pub uniforms: Vec<Declaration>,
    /// Vertex inputs, in declaration order. Always empty for fragment shaders.
    pub attributes: Vec<Declaration>,
    /// Struct definitions by name.
    pub structs: HashMap<String, Vec<Declaration>>,
    /// `true` if a `main` function is defined.
    pub has_main: bool,
}

/// Parses `source` as a shader of the given stage.
///
/// # Errors
/// Returns a driver-style info log when the source has unbalanced braces or
/// defines no `main` function.
pub fn reflect_stage(stage: ShaderStage, source: &str) -> Result<StageReflection, String> {
    let mut defines = HashMap::new();
    let tokens = tokenize(&preprocess(source, &mut defines));
    let mut reflection = StageReflection::default();
    let mut cursor = 0;

    while cursor < tokens.len() {
        let start = cursor;
        while cursor < tokens.len() && !tokens[cursor].is_punct(';') && !tokens[cursor].is_punct('{') {
            if tokens[cursor].is_punct('}') {
                return Err("ERROR: 0:0: '}' : syntax error".to_string());
            }
            cursor += 1;
        }
        if cursor >= tokens.len() {
            if start < tokens.len() {
                return Err("ERROR: 0:0: '' : unexpected end of source".to_string());
            }
            break;
        }
        let statement = &tokens[start..cursor];

        if tokens[cursor].is_punct('{') {
            let body_start = cursor + 1;
            let body_end = matching_brace(&tokens, cursor)
                .ok_or_else(|| "ERROR: 0:0: '{' : unbalanced braces".to_string())?;
            cursor = body_end + 1;

            if statement.first().is_some_and(|t| t.is_ident("struct")) {
                if let Some(Token::Ident(name)) = statement.get(1) {
                    let fields = parse_declarations(&tokens[body_start..body_end], &defines);
                    reflection.structs.insert(name.clone(), fields);
                }
                cursor = skip_past_semicolon(&tokens, cursor);
            } else if statement.iter().any(|t| t.is_ident("uniform")) {
                // Uniform block: members live in a buffer, not in locations.
                cursor = skip_past_semicolon(&tokens, cursor);
            } else if statement
                .windows(2)
                .any(|w| w[0].is_ident("main") && w[1].is_punct('('))
            {
                reflection.has_main = true;
            }
            continue;
        }

        cursor += 1;
        parse_global(stage, statement, &defines, &mut reflection);
    }

    if !reflection.has_main {
        return Err("ERROR: 0:0: 'main' : function not defined".to_string());
    }
    Ok(reflection)
}

fn parse_global(
    stage: ShaderStage,
    statement: &[Token],
    defines: &HashMap<String, u32>,
    reflection: &mut StageReflection,
) {
    let mut location = None;
    let mut rest = statement;

    if rest.first().is_some_and(|t| t.is_ident("layout")) {
        let close = rest.iter().position(|t| t.is_punct(')')).unwrap_or(rest.len() - 1);
        let qualifiers = &rest[..close];
        if let Some(pos) = qualifiers.iter().position(|t| t.is_ident("location")) {
            if let Some(Token::Number(n)) = qualifiers.get(pos + 2) {
                location = n.parse().ok();
            }
        }
        rest = &rest[close + 1..];
    }

    let Some(storage) = rest.first() else {
        return;
    };
    let is_uniform = storage.is_ident("uniform");
    let is_input = match stage {
        ShaderStage::Vertex => storage.is_ident("attribute") || storage.is_ident("in"),
        ShaderStage::Fragment => false,
    };
    if !is_uniform && !is_input {
        return;
    }

    let mut declarations = parse_declarations(&rest[1..], defines);
    for declaration in &mut declarations {
        declaration.location = location;
    }
    if is_uniform {
        reflection.uniforms.extend(declarations);
    } else {
        reflection.attributes.extend(declarations);
    }
}

/// Parses `type name[N], name2;` sequences, ignoring qualifiers and initialisers.
fn parse_declarations(tokens: &[Token], defines: &HashMap<String, u32>) -> Vec<Declaration> {
    let mut out = Vec::new();
    for statement in tokens.split(|t| t.is_punct(';')) {
        let mut idents = statement.iter().skip_while(|t| match t {
            Token::Ident(i) => is_qualifier(i),
            _ => false,
        });
        let Some(Token::Ident(type_name)) = idents.next() else {
            continue;
        };
        let ty = match GlslType::from_keyword(type_name) {
            Some(glsl) => DeclType::Glsl(glsl),
            None => DeclType::Struct(type_name.clone()),
        };

        let declarators: Vec<&Token> = idents.collect();
        if declarators.iter().any(|t| t.is_punct('(')) {
            continue;
        }
        let mut i = 0;
        while i < declarators.len() {
            let Token::Ident(name) = declarators[i] else {
                i += 1;
                continue;
            };
            let mut array_len = None;
            i += 1;
            if declarators.get(i).is_some_and(|t| t.is_punct('[')) {
                array_len = match declarators.get(i + 1) {
                    Some(Token::Number(n)) => n.parse().ok(),
                    Some(Token::Ident(d)) => defines.get(d).copied(),
                    _ => None,
                };
                while i < declarators.len() && !declarators[i].is_punct(']') {
                    i += 1;
                }
                i += 1;
            }
            out.push(Declaration {
                name: name.clone(),
                ty: ty.clone(),
                array_len,
                location: None,
            });
            // Skip an initialiser up to the next declarator.
            while i < declarators.len() && !declarators[i].is_punct(',') {
                i += 1;
            }
            i += 1;
        }
    }
    out
}

fn is_qualifier(word: &str) -> bool {
    matches!(
        word,
        "const" | "highp" | "mediump" | "lowp" | "flat" | "smooth" | "centroid" | "invariant"
    )
}

fn matching_brace(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_punct('{') {
            depth += 1;
        } else if token.is_punct('}') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn skip_past_semicolon(tokens: &[Token], from: usize) -> usize {
    tokens[from..]
        .iter()
        .position(|t| t.is_punct(';'))
        .map_or(tokens.len(), |p| from + p + 1)
}

/// Removes comments and preprocessor lines, collecting integer `#define`s.
fn preprocess(source: &str, defines: &mut HashMap<String, u32>) -> String {
    let mut stripped = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        stripped.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        stripped.push('\n');
                    }
                    prev = next;
                }
            }
            _ => stripped.push(c),
        }
    }

    let mut out = String::with_capacity(stripped.len());
    for line in stripped.lines() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let mut parts = directive.split_whitespace();
            if parts.next() == Some("define") {
                if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
                    if let Ok(value) = value.parse() {
                        defines.insert(name.to_string(), value);
                    }
                }
            }
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    ident.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else if c.is_ascii_digit() {
            let mut number = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '.' {
                    number.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Number(number));
        } else {
            tokens.push(Token::Punct(c));
            chars.next();
        }
    }
    tokens
}

/// The interface of a linked program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramInterface {
    /// Active uniforms, struct members expanded one by one.
    pub uniforms: Vec<ActiveUniform>,
    /// Active attributes with resolved locations.
    pub attributes: Vec<ActiveAttribute>,
}

/// Merges the two stages of a program, assigning uniform and attribute locations.
///
/// Uniform locations start at `first_location` so they stay unique across all
/// programs of a backend.
pub fn link_interface(
    vertex: &StageReflection,
    fragment: &StageReflection,
    first_location: u32,
) -> ProgramInterface {
    let mut interface = ProgramInterface::default();
    let mut next_location = first_location;

    let mut structs = vertex.structs.clone();
    structs.extend(fragment.structs.clone());

    let mut seen = std::collections::HashSet::new();
    for declaration in vertex.uniforms.iter().chain(&fragment.uniforms) {
        if seen.insert(declaration.name.clone()) {
            expand_uniform(
                &declaration.name,
                declaration,
                &structs,
                &mut next_location,
                &mut interface.uniforms,
            );
        }
    }

    let mut next_slot = 0;
    for declaration in &vertex.attributes {
        let DeclType::Glsl(ty) = declaration.ty else {
            continue;
        };
        let location = declaration.location.unwrap_or(next_slot);
        let size = declaration.array_len.unwrap_or(1);
        next_slot = next_slot.max(location + ty.attribute_locations() * size);
        interface.attributes.push(ActiveAttribute {
            name: declaration.name.clone(),
            location,
            ty,
            size,
        });
    }
    interface
}

fn expand_uniform(
    path: &str,
    declaration: &Declaration,
    structs: &HashMap<String, Vec<Declaration>>,
    next_location: &mut u32,
    out: &mut Vec<ActiveUniform>,
) {
    match &declaration.ty {
        DeclType::Glsl(ty) => {
            let (name, size) = match declaration.array_len {
                Some(len) => (format!("{path}[0]"), len),
                None => (path.to_string(), 1),
            };
            out.push(ActiveUniform {
                name,
                location: UniformLocation(*next_location),
                ty: *ty,
                size,
            });
            *next_location += size;
        }
        DeclType::Struct(struct_name) => {
            let Some(fields) = structs.get(struct_name) else {
                log::debug!("HeadlessBackend: unknown uniform type '{struct_name}' for '{path}'");
                return;
            };
            let elements: Vec<String> = match declaration.array_len {
                Some(len) => (0..len).map(|i| format!("{path}[{i}]")).collect(),
                None => vec![path.to_string()],
            };
            for element in elements {
                for field in fields {
                    let field_path = format!("{element}.{}", field.name);
                    expand_uniform(&field_path, field, structs, next_location, out);
                }
            }
        }
    }
}
