//! Reference extraction
//!
//! Mirrors the symbol visitor but records use-sites: imports (one per
//! binding), calls, property access, type references, heritage clauses and
//! identifiers passed as call arguments.

use tree_sitter::Node;

use super::parser::ParsedSource;
use super::syntax::{node_text, start_line, string_value, SyntaxKind};
use crate::types::{ImportStyle, Reference, ReferenceKind, ReferenceMetadata};

/// Extract all references from a parsed file
pub fn extract_references(source: &ParsedSource) -> Vec<Reference> {
    let mut visitor = ReferenceVisitor {
        source,
        references: Vec::new(),
    };
    visitor.visit(source.root());
    visitor.references
}

struct ReferenceVisitor<'s, 'a> {
    source: &'s ParsedSource<'a>,
    references: Vec<Reference>,
}

impl<'s, 'a> ReferenceVisitor<'s, 'a> {
    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source.content)
    }

    fn push(&mut self, node: &Node, name: impl Into<String>, kind: ReferenceKind, metadata: ReferenceMetadata) {
        let mut reference = Reference::new(
            self.source.path,
            name,
            kind,
            start_line(node),
            node.start_position().column as u32,
        );
        reference.metadata = metadata;
        self.references.push(reference);
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: Node) {
        match SyntaxKind::of(&node) {
            SyntaxKind::ImportStatement => self.visit_import(node),
            SyntaxKind::ExportStatement => {
                if let Some(source) = node.child_by_field_name("source") {
                    self.visit_reexport(node, source);
                } else {
                    self.visit_children(node);
                }
            }
            SyntaxKind::CallExpression => self.visit_call(node),
            SyntaxKind::NewExpression => self.visit_new(node),
            SyntaxKind::MemberExpression => {
                if let Some(property) = node.child_by_field_name("property") {
                    let metadata = ReferenceMetadata {
                        receiver: node
                            .child_by_field_name("object")
                            .map(|o| self.text(&o).to_string()),
                        optional_chain: node.child_by_field_name("optional_chain").is_some(),
                        ..Default::default()
                    };
                    let name = self.text(&property).to_string();
                    self.push(&property, name, ReferenceKind::PropertyAccess, metadata);
                }
                if let Some(object) = node.child_by_field_name("object") {
                    self.visit(object);
                }
            }
            SyntaxKind::TypeIdentifier => {
                if !self.is_declaration_name(&node) {
                    let name = self.text(&node).to_string();
                    self.push(&node, name, ReferenceKind::TypeReference, ReferenceMetadata::default());
                }
            }
            SyntaxKind::ClassHeritage => {
                // TypeScript wraps clauses; JavaScript holds the expression directly
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    match SyntaxKind::of(&child) {
                        SyntaxKind::ExtendsClause | SyntaxKind::ImplementsClause => self.visit(child),
                        _ => self.visit_heritage_value(child, ReferenceKind::Extends),
                    }
                }
            }
            SyntaxKind::ExtendsClause => {
                let mut cursor = node.walk();
                let values: Vec<Node> = node.children_by_field_name("value", &mut cursor).collect();
                for value in values {
                    self.visit_heritage_value(value, ReferenceKind::Extends);
                }
                let mut cursor = node.walk();
                let type_args: Vec<Node> = node
                    .children_by_field_name("type_arguments", &mut cursor)
                    .collect();
                for args in type_args {
                    self.visit(args);
                }
            }
            SyntaxKind::ImplementsClause => self.visit_heritage_types(node, ReferenceKind::Implements),
            SyntaxKind::ExtendsTypeClause => self.visit_heritage_types(node, ReferenceKind::Extends),
            SyntaxKind::Comment => {}
            _ => self.visit_children(node),
        }
    }

    /// Names of declarations and type parameters are not references
    fn is_declaration_name(&self, node: &Node) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        let is_name = parent
            .child_by_field_name("name")
            .is_some_and(|name| name.id() == node.id());
        if !is_name {
            return false;
        }
        matches!(
            SyntaxKind::of(&parent),
            SyntaxKind::ClassDeclaration
                | SyntaxKind::AbstractClassDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::TypeAliasDeclaration
                | SyntaxKind::ClassExpression
        ) || parent.kind() == "type_parameter"
    }

    fn visit_heritage_value(&mut self, value: Node, kind: ReferenceKind) {
        match value.kind() {
            "identifier" | "type_identifier" => {
                let name = self.text(&value).to_string();
                self.push(&value, name, kind, ReferenceMetadata::default());
            }
            "member_expression" | "nested_type_identifier" => {
                let field = if value.kind() == "member_expression" {
                    "property"
                } else {
                    "name"
                };
                if let Some(name_node) = value.child_by_field_name(field) {
                    let metadata = ReferenceMetadata {
                        receiver: value
                            .child_by_field_name(if field == "property" { "object" } else { "module" })
                            .map(|o| self.text(&o).to_string()),
                        ..Default::default()
                    };
                    let name = self.text(&name_node).to_string();
                    self.push(&name_node, name, kind, metadata);
                }
            }
            "generic_type" => {
                if let Some(name_node) = value.child_by_field_name("name") {
                    self.visit_heritage_value(name_node, kind);
                }
                if let Some(args) = value.child_by_field_name("type_arguments") {
                    self.visit(args);
                }
            }
            // Mixins and other computed bases
            _ => self.visit(value),
        }
    }

    fn visit_heritage_types(&mut self, node: Node, kind: ReferenceKind) {
        let mut cursor = node.walk();
        let types: Vec<Node> = node.named_children(&mut cursor).collect();
        for ty in types {
            self.visit_heritage_value(ty, kind);
        }
    }

    fn visit_call(&mut self, node: Node) {
        let Some(callee) = node.child_by_field_name("function") else {
            self.visit_children(node);
            return;
        };
        let arguments = node.child_by_field_name("arguments");

        // import("./x")
        if callee.kind() == "import" {
            self.visit_dynamic_import(node, arguments);
            return;
        }

        let optional_call = node.child_by_field_name("optional_chain").is_some();
        match callee.kind() {
            "identifier" => {
                let metadata = ReferenceMetadata {
                    optional_chain: optional_call,
                    ..Default::default()
                };
                let name = self.text(&callee).to_string();
                self.push(&callee, name, ReferenceKind::Call, metadata);
            }
            "member_expression" => {
                if let Some(property) = callee.child_by_field_name("property") {
                    let object = callee.child_by_field_name("object");
                    let metadata = ReferenceMetadata {
                        is_method_call: true,
                        receiver: object.map(|o| self.text(&o).to_string()),
                        optional_chain: optional_call
                            || callee.child_by_field_name("optional_chain").is_some(),
                        ..Default::default()
                    };
                    let name = self.text(&property).to_string();
                    self.push(&property, name, ReferenceKind::Call, metadata);
                }
                if let Some(object) = callee.child_by_field_name("object") {
                    self.visit(object);
                }
            }
            _ => self.visit(callee),
        }

        if let Some(arguments) = arguments {
            self.visit_arguments(arguments);
        }
    }

    fn visit_new(&mut self, node: Node) {
        if let Some(constructor) = node.child_by_field_name("constructor") {
            match constructor.kind() {
                "identifier" => {
                    let metadata = ReferenceMetadata {
                        constructor: true,
                        ..Default::default()
                    };
                    let name = self.text(&constructor).to_string();
                    self.push(&constructor, name, ReferenceKind::Call, metadata);
                }
                "member_expression" => {
                    if let Some(property) = constructor.child_by_field_name("property") {
                        let object = constructor.child_by_field_name("object");
                        let metadata = ReferenceMetadata {
                            constructor: true,
                            receiver: object.map(|o| self.text(&o).to_string()),
                            ..Default::default()
                        };
                        let name = self.text(&property).to_string();
                        self.push(&property, name, ReferenceKind::Call, metadata);
                    }
                    if let Some(object) = constructor.child_by_field_name("object") {
                        self.visit(object);
                    }
                }
                _ => self.visit(constructor),
            }
        }
        if let Some(type_args) = node.child_by_field_name("type_arguments") {
            self.visit(type_args);
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.visit_arguments(arguments);
        }
    }

    fn visit_arguments(&mut self, arguments: Node) {
        let mut cursor = arguments.walk();
        let args: Vec<Node> = arguments.named_children(&mut cursor).collect();
        for arg in args {
            if arg.kind() == "identifier" {
                let name = self.text(&arg).to_string();
                self.push(&arg, name, ReferenceKind::VariableReference, ReferenceMetadata::default());
            } else {
                self.visit(arg);
            }
        }
    }

    fn visit_dynamic_import(&mut self, node: Node, arguments: Option<Node>) {
        let first = arguments.and_then(|args| {
            let mut cursor = args.walk();
            let first = args.named_children(&mut cursor).next();
            first
        });
        match first {
            Some(arg) if arg.kind() == "string" => {
                let specifier = string_value(&arg, self.source.content);
                let metadata = ReferenceMetadata {
                    import_source: Some(specifier.clone()),
                    import_style: Some(ImportStyle::Dynamic),
                    dynamic: true,
                    ..Default::default()
                };
                self.push(&node, specifier, ReferenceKind::Import, metadata);
            }
            // Computed specifiers cannot be named; still walk for nested uses
            Some(arg) => self.visit(arg),
            None => {}
        }
    }

    fn visit_import(&mut self, node: Node) {
        let Some(source) = node.child_by_field_name("source") else {
            // import x = require("y")
            let mut cursor = node.walk();
            let clauses: Vec<Node> = node.named_children(&mut cursor).collect();
            for clause in clauses {
                if clause.kind() == "import_require_clause" {
                    self.visit_require_clause(clause);
                }
            }
            return;
        };
        let specifier = string_value(&source, self.source.content);
        let base = ReferenceMetadata {
            import_source: Some(specifier.clone()),
            ..Default::default()
        };

        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "import_clause");
        let Some(clause) = clause else {
            let metadata = ReferenceMetadata {
                import_style: Some(ImportStyle::SideEffect),
                ..base
            };
            self.push(&node, specifier, ReferenceKind::Import, metadata);
            return;
        };

        let mut cursor = clause.walk();
        let parts: Vec<Node> = clause.named_children(&mut cursor).collect();
        for part in parts {
            match part.kind() {
                "identifier" => {
                    let metadata = ReferenceMetadata {
                        import_style: Some(ImportStyle::Default),
                        ..base.clone()
                    };
                    let name = self.text(&part).to_string();
                    self.push(&part, name, ReferenceKind::Import, metadata);
                }
                "namespace_import" => {
                    let local = {
                        let mut inner = part.walk();
                        let found = part
                            .named_children(&mut inner)
                            .find(|c| c.kind() == "identifier");
                        found
                    };
                    let metadata = ReferenceMetadata {
                        import_style: Some(ImportStyle::Namespace),
                        alias: local.map(|l| self.text(&l).to_string()),
                        ..base.clone()
                    };
                    self.push(&part, "*", ReferenceKind::Import, metadata);
                }
                "named_imports" => self.visit_specifiers(part, &base),
                _ => {}
            }
        }
    }

    fn visit_require_clause(&mut self, clause: Node) {
        let Some(source) = clause.child_by_field_name("source") else {
            return;
        };
        let mut cursor = clause.walk();
        let local = clause
            .named_children(&mut cursor)
            .find(|c| c.kind() == "identifier");
        if let Some(local) = local {
            let metadata = ReferenceMetadata {
                import_source: Some(string_value(&source, self.source.content)),
                import_style: Some(ImportStyle::Default),
                ..Default::default()
            };
            let name = self.text(&local).to_string();
            self.push(&local, name, ReferenceKind::Import, metadata);
        }
    }

    /// `{ a, b as c }` in imports and re-exports
    fn visit_specifiers(&mut self, list: Node, base: &ReferenceMetadata) {
        let mut cursor = list.walk();
        let specs: Vec<Node> = list.named_children(&mut cursor).collect();
        for spec in specs {
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = match name_node.kind() {
                "string" => string_value(&name_node, self.source.content),
                _ => self.text(&name_node).to_string(),
            };
            let alias = spec
                .child_by_field_name("alias")
                .map(|a| self.text(&a).to_string());
            let metadata = ReferenceMetadata {
                import_style: Some(if alias.is_some() {
                    ImportStyle::Aliased
                } else {
                    ImportStyle::Named
                }),
                alias,
                ..base.clone()
            };
            self.push(&spec, name, ReferenceKind::Import, metadata);
        }
    }

    fn visit_reexport(&mut self, node: Node, source: Node) {
        let specifier = string_value(&source, self.source.content);
        let base = ReferenceMetadata {
            import_source: Some(specifier),
            ..Default::default()
        };

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        let mut emitted = false;
        for child in children {
            match child.kind() {
                "export_clause" => {
                    self.visit_specifiers(child, &base);
                    emitted = true;
                }
                // export * as ns from "./x"
                "namespace_export" => {
                    let mut inner = child.walk();
                    let local = child.named_children(&mut inner).next();
                    let metadata = ReferenceMetadata {
                        import_style: Some(ImportStyle::Namespace),
                        alias: local.map(|l| self.text(&l).to_string()),
                        ..base.clone()
                    };
                    self.push(&child, "*", ReferenceKind::Import, metadata);
                    emitted = true;
                }
                _ => {}
            }
        }

        // export * from "./x"
        if !emitted {
            let metadata = ReferenceMetadata {
                import_style: Some(ImportStyle::Namespace),
                ..base
            };
            self.push(&node, "*", ReferenceKind::Import, metadata);
        }
    }
}
