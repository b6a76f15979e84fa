//! Symbol extraction
//!
//! Walks a parsed tree and collects declarations. The visitor owns its
//! output buffer; traversal state (parent node, export flag, container) is
//! passed down by value so each subtree sees only its own context.

use std::collections::HashSet;

use tree_sitter::Node;

use super::parser::ParsedSource;
use super::syntax::{end_line, node_text, normalize_whitespace, start_line, SyntaxKind};
use crate::types::{Symbol, SymbolKind};

/// Documentation must end within this many lines of the declaration
const DOC_WINDOW: u32 = 5;

/// Maximum signature length kept
const MAX_SIGNATURE: usize = 200;

/// What kind of body the visitor is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Module,
    Class,
    Interface,
    Enum,
}

#[derive(Clone, Copy)]
struct Scope<'t> {
    parent: Option<Node<'t>>,
    exported: bool,
    container: Container,
}

impl<'t> Scope<'t> {
    fn enter(self, parent: Node<'t>, container: Container) -> Self {
        Self {
            parent: Some(parent),
            container,
            ..self
        }
    }
}

/// Extract all symbols from a parsed file
pub fn extract_symbols(source: &ParsedSource) -> Vec<Symbol> {
    let mut visitor = SymbolVisitor {
        source,
        symbols: Vec::new(),
        seen: HashSet::new(),
        local_exports: HashSet::new(),
    };
    let root = source.root();
    visitor.visit_children(
        root,
        Scope {
            parent: None,
            exported: false,
            container: Container::Module,
        },
    );
    visitor.finish()
}

struct SymbolVisitor<'s, 'a> {
    source: &'s ParsedSource<'a>,
    symbols: Vec<Symbol>,
    seen: HashSet<(String, u32)>,
    /// Names listed in `export { ... }` clauses without a source
    local_exports: HashSet<String>,
}

impl<'s, 'a> SymbolVisitor<'s, 'a> {
    fn finish(mut self) -> Vec<Symbol> {
        if !self.local_exports.is_empty() {
            for symbol in &mut self.symbols {
                if !symbol.is_exported
                    && !matches!(
                        symbol.kind,
                        SymbolKind::Method | SymbolKind::Property | SymbolKind::EnumMember
                    )
                    && self.local_exports.contains(&symbol.name)
                {
                    symbol.is_exported = true;
                }
            }
        }
        self.symbols
    }

    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source.content)
    }

    fn visit_children<'t>(&mut self, node: Node<'t>, scope: Scope<'t>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, scope);
        }
    }

    fn visit<'t>(&mut self, node: Node<'t>, scope: Scope<'t>) {
        let kind = SyntaxKind::of(&node);
        match (kind, scope.container) {
            (SyntaxKind::ExportStatement, _) => self.visit_export(node, scope),
            (SyntaxKind::AmbientDeclaration, _) | (SyntaxKind::StatementBlock, Container::Module) => {
                self.visit_children(node, scope)
            }

            (
                SyntaxKind::FunctionDeclaration
                | SyntaxKind::GeneratorFunctionDeclaration
                | SyntaxKind::FunctionSignature,
                Container::Module,
            ) => {
                self.declare(node, node, SymbolKind::Function, scope);
            }
            (SyntaxKind::ClassDeclaration | SyntaxKind::AbstractClassDeclaration, Container::Module) => {
                if self.declare(node, node, SymbolKind::Class, scope) {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.visit_children(body, scope.enter(node, Container::Class));
                    }
                }
            }
            (SyntaxKind::InterfaceDeclaration, Container::Module) => {
                if self.declare(node, node, SymbolKind::Interface, scope) {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.visit_children(body, scope.enter(node, Container::Interface));
                    }
                }
            }
            (SyntaxKind::TypeAliasDeclaration, Container::Module) => {
                self.declare(node, node, SymbolKind::Type, scope);
            }
            (SyntaxKind::EnumDeclaration, Container::Module) => {
                if self.declare(node, node, SymbolKind::Enum, scope) {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.visit_children(body, scope.enter(node, Container::Enum));
                    }
                }
            }
            (SyntaxKind::InternalModule | SyntaxKind::Module, Container::Module) => {
                let symbol_kind = if kind == SyntaxKind::InternalModule {
                    SymbolKind::Namespace
                } else {
                    SymbolKind::Module
                };
                if self.declare(node, node, symbol_kind, scope) {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.visit_children(body, scope.enter(node, Container::Module));
                    }
                }
            }
            (SyntaxKind::LexicalDeclaration | SyntaxKind::VariableDeclaration, Container::Module) => {
                self.visit_variables(node, scope);
            }

            // Class and interface members
            (
                SyntaxKind::MethodDefinition | SyntaxKind::AbstractMethodSignature,
                Container::Class,
            )
            | (SyntaxKind::MethodSignature, Container::Interface | Container::Class) => {
                self.declare(node, node, SymbolKind::Method, scope);
            }
            (SyntaxKind::PropertySignature, Container::Interface) => {
                self.declare(node, node, SymbolKind::Property, scope);
            }
            (SyntaxKind::FieldDefinition, Container::Class) => {
                let holds_function = node
                    .child_by_field_name("value")
                    .is_some_and(|v| SyntaxKind::of(&v).is_function_value());
                let symbol_kind = if holds_function {
                    SymbolKind::Method
                } else {
                    SymbolKind::Property
                };
                self.declare(node, node, symbol_kind, scope);
            }

            // Enum members are bare property names or `name = value`
            (SyntaxKind::EnumAssignment, Container::Enum) => {
                self.declare(node, node, SymbolKind::EnumMember, scope);
            }
            (SyntaxKind::Other, Container::Enum) if node.kind() == "property_identifier" => {
                self.declare(node, node, SymbolKind::EnumMember, scope);
            }

            // `namespace X {}` can parse as an expression statement
            (SyntaxKind::ExpressionStatement, Container::Module) => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if SyntaxKind::of(&child) == SyntaxKind::InternalModule {
                        self.visit(child, scope);
                    }
                }
            }
            (SyntaxKind::Program, _) => self.visit_children(node, scope),
            _ => {}
        }
    }

    fn visit_export<'t>(&mut self, node: Node<'t>, scope: Scope<'t>) {
        // Re-exports declare nothing locally
        if node.child_by_field_name("source").is_some() {
            return;
        }

        let exported = Scope {
            parent: Some(node),
            exported: true,
            ..scope
        };
        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.visit(declaration, exported);
            return;
        }

        // export default <expression>
        if let Some(value) = node.child_by_field_name("value") {
            match SyntaxKind::of(&value) {
                kind if kind.is_function_value() => {
                    self.declare(value, node, SymbolKind::Function, exported);
                }
                SyntaxKind::ClassExpression => {
                    if self.declare(value, node, SymbolKind::Class, exported) {
                        if let Some(body) = value.child_by_field_name("body") {
                            self.visit_children(body, exported.enter(value, Container::Class));
                        }
                    }
                }
                _ if value.kind() == "identifier" => {
                    let name = self.text(&value).to_string();
                    self.local_exports.insert(name);
                }
                _ => {}
            }
            return;
        }

        let mut cursor = node.walk();
        for clause in node.named_children(&mut cursor) {
            if clause.kind() != "export_clause" {
                continue;
            }
            let mut inner = clause.walk();
            for spec in clause.named_children(&mut inner) {
                if let Some(name) = spec.child_by_field_name("name") {
                    let name = self.text(&name).to_string();
                    self.local_exports.insert(name);
                }
            }
        }
    }

    fn visit_variables<'t>(&mut self, node: Node<'t>, scope: Scope<'t>) {
        let is_const = node
            .child_by_field_name("kind")
            .map(|k| self.text(&k) == "const")
            .unwrap_or(false);

        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if SyntaxKind::of(&declarator) != SyntaxKind::VariableDeclarator {
                continue;
            }
            // Destructuring patterns are not named declarations
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "identifier" {
                continue;
            }

            let value = declarator.child_by_field_name("value");
            let symbol_kind = match value {
                Some(v) if SyntaxKind::of(&v).is_function_value() => SymbolKind::Function,
                _ if is_const => SymbolKind::Constant,
                _ => SymbolKind::Variable,
            };
            self.declare(declarator, node, symbol_kind, Scope {
                parent: Some(node),
                ..scope
            });
        }
    }

    /// Record a symbol for `node`; `anchor` is the statement that documentation
    /// attaches to. Returns false when the node has no usable name.
    fn declare<'t>(&mut self, node: Node<'t>, anchor: Node<'t>, kind: SymbolKind, scope: Scope<'t>) -> bool {
        let Some(name) = self.extract_name(&node, kind) else {
            return false;
        };

        let line_start = start_line(&node);
        if !self.seen.insert((name.clone(), line_start)) {
            return true;
        }

        // Documentation sits above the outermost statement (`export ...`)
        let doc_anchor = match scope.parent {
            Some(parent) if SyntaxKind::of(&parent) == SyntaxKind::ExportStatement => parent,
            _ => anchor,
        };
        let doc_anchor = match doc_anchor.parent() {
            Some(p) if SyntaxKind::of(&p) == SyntaxKind::ExportStatement => p,
            _ => doc_anchor,
        };

        self.symbols.push(Symbol {
            file_path: self.source.path.to_string(),
            name,
            kind,
            line_start,
            line_end: end_line(&node),
            signature: self.extract_signature(&node, kind),
            documentation: self.extract_documentation(&doc_anchor),
            is_exported: scope.exported,
        });
        true
    }

    fn extract_name(&self, node: &Node, kind: SymbolKind) -> Option<String> {
        if kind == SymbolKind::EnumMember && node.kind() == "property_identifier" {
            return Some(self.text(node).to_string());
        }

        for field in ["name", "property"] {
            if let Some(name_node) = node.child_by_field_name(field) {
                let text = match name_node.kind() {
                    "string" => super::syntax::string_value(&name_node, self.source.content),
                    _ => self.text(&name_node).to_string(),
                };
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        // `export default function () {}` has no name field
        match node.parent() {
            Some(p) if SyntaxKind::of(&p) == SyntaxKind::ExportStatement => {
                Some("default".to_string())
            }
            _ => None,
        }
    }

    fn extract_signature(&self, node: &Node, kind: SymbolKind) -> Option<String> {
        if !matches!(kind, SymbolKind::Function | SymbolKind::Method) {
            return None;
        }

        // Variables and fields carry their callable in `value`
        let callable = match SyntaxKind::of(node) {
            SyntaxKind::VariableDeclarator | SyntaxKind::FieldDefinition => {
                node.child_by_field_name("value")?
            }
            _ => *node,
        };

        let params = callable
            .child_by_field_name("parameters")
            .or_else(|| callable.child_by_field_name("parameter"))?;
        let mut signature = String::new();
        if let Some(type_params) = callable.child_by_field_name("type_parameters") {
            signature.push_str(self.text(&type_params));
        }
        let params_text = self.text(&params);
        if params.kind() == "identifier" {
            signature.push('(');
            signature.push_str(params_text);
            signature.push(')');
        } else {
            signature.push_str(params_text);
        }
        if let Some(ret) = callable.child_by_field_name("return_type") {
            signature.push_str(self.text(&ret));
        }

        let signature = normalize_whitespace(&signature);
        if signature.len() > MAX_SIGNATURE {
            let cut = (0..=MAX_SIGNATURE)
                .rev()
                .find(|&i| signature.is_char_boundary(i))
                .unwrap_or(0);
            Some(format!("{}...", &signature[..cut]))
        } else {
            Some(signature)
        }
    }

    fn extract_documentation(&self, anchor: &Node) -> Option<String> {
        let decl_line = start_line(anchor);
        let decl_byte = anchor.start_byte();

        let comment = self
            .source
            .comments
            .iter()
            .rev()
            .find(|c| c.end_byte <= decl_byte)?;
        if !comment.is_block() || decl_line.saturating_sub(comment.end_line) > DOC_WINDOW {
            return None;
        }

        // Reject a comment that belongs to an earlier statement
        let mut prev = anchor.prev_named_sibling();
        while let Some(sibling) = prev {
            if SyntaxKind::of(&sibling) != SyntaxKind::Comment {
                if sibling.end_byte() > comment.start_byte {
                    return None;
                }
                break;
            }
            prev = sibling.prev_named_sibling();
        }

        let cleaned = clean_docstring(&comment.text);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

fn clean_docstring(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("/**")
                .trim_start_matches("/*")
                .trim_end_matches("*/")
                .trim_start_matches('*')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
