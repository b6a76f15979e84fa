//! Closed set of grammar node kinds the extractors dispatch on
//!
//! Both the TypeScript and JavaScript grammars share these node names; any
//! kind not listed maps to `Other` and is only walked through.

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    Program,
    Comment,

    // Declarations
    FunctionDeclaration,
    GeneratorFunctionDeclaration,
    FunctionSignature,
    ClassDeclaration,
    AbstractClassDeclaration,
    InterfaceDeclaration,
    TypeAliasDeclaration,
    EnumDeclaration,
    EnumAssignment,
    MethodDefinition,
    MethodSignature,
    AbstractMethodSignature,
    PropertySignature,
    FieldDefinition,
    InternalModule,
    Module,
    AmbientDeclaration,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    StatementBlock,
    ExpressionStatement,

    // Module syntax
    ImportStatement,
    ExportStatement,

    // Expressions
    CallExpression,
    NewExpression,
    MemberExpression,
    ArrowFunction,
    FunctionExpression,
    ClassExpression,

    // Types and heritage
    TypeIdentifier,
    ClassHeritage,
    ExtendsClause,
    ImplementsClause,
    ExtendsTypeClause,

    Other,
}

impl SyntaxKind {
    pub fn of(node: &Node) -> Self {
        Self::from_kind(node.kind())
    }

    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "program" => SyntaxKind::Program,
            "comment" => SyntaxKind::Comment,
            "function_declaration" => SyntaxKind::FunctionDeclaration,
            "generator_function_declaration" => SyntaxKind::GeneratorFunctionDeclaration,
            "function_signature" => SyntaxKind::FunctionSignature,
            "class_declaration" => SyntaxKind::ClassDeclaration,
            "abstract_class_declaration" => SyntaxKind::AbstractClassDeclaration,
            "interface_declaration" => SyntaxKind::InterfaceDeclaration,
            "type_alias_declaration" => SyntaxKind::TypeAliasDeclaration,
            "enum_declaration" => SyntaxKind::EnumDeclaration,
            "enum_assignment" => SyntaxKind::EnumAssignment,
            "method_definition" => SyntaxKind::MethodDefinition,
            "method_signature" => SyntaxKind::MethodSignature,
            "abstract_method_signature" => SyntaxKind::AbstractMethodSignature,
            "property_signature" => SyntaxKind::PropertySignature,
            "public_field_definition" | "field_definition" => SyntaxKind::FieldDefinition,
            "internal_module" => SyntaxKind::InternalModule,
            "module" => SyntaxKind::Module,
            "ambient_declaration" => SyntaxKind::AmbientDeclaration,
            "lexical_declaration" => SyntaxKind::LexicalDeclaration,
            "variable_declaration" => SyntaxKind::VariableDeclaration,
            "variable_declarator" => SyntaxKind::VariableDeclarator,
            "statement_block" => SyntaxKind::StatementBlock,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            "import_statement" => SyntaxKind::ImportStatement,
            "export_statement" => SyntaxKind::ExportStatement,
            "call_expression" => SyntaxKind::CallExpression,
            "new_expression" => SyntaxKind::NewExpression,
            "member_expression" => SyntaxKind::MemberExpression,
            "arrow_function" => SyntaxKind::ArrowFunction,
            "function_expression" | "function" | "generator_function" => {
                SyntaxKind::FunctionExpression
            }
            "class" => SyntaxKind::ClassExpression,
            "type_identifier" => SyntaxKind::TypeIdentifier,
            "class_heritage" => SyntaxKind::ClassHeritage,
            "extends_clause" => SyntaxKind::ExtendsClause,
            "implements_clause" => SyntaxKind::ImplementsClause,
            "extends_type_clause" => SyntaxKind::ExtendsTypeClause,
            _ => SyntaxKind::Other,
        }
    }

    /// Expressions that evaluate to a function
    pub fn is_function_value(&self) -> bool {
        matches!(self, SyntaxKind::ArrowFunction | SyntaxKind::FunctionExpression)
    }
}

/// Text of a node, empty when the range falls outside `content`
pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
    content.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// 1-based line of a node's start
pub fn start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based line of a node's end
pub fn end_line(node: &Node) -> u32 {
    node.end_position().row as u32 + 1
}

/// Value of a string literal node without its quotes
pub fn string_value(node: &Node, content: &str) -> String {
    let text = node_text(node, content);
    let trimmed = text
        .strip_prefix(['"', '\'', '`'])
        .and_then(|t| t.strip_suffix(['"', '\'', '`']))
        .unwrap_or(text);
    trimmed.to_string()
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind() {
        assert_eq!(SyntaxKind::from_kind("function_declaration"), SyntaxKind::FunctionDeclaration);
        assert_eq!(SyntaxKind::from_kind("public_field_definition"), SyntaxKind::FieldDefinition);
        assert_eq!(SyntaxKind::from_kind("field_definition"), SyntaxKind::FieldDefinition);
        assert_eq!(SyntaxKind::from_kind("function_expression"), SyntaxKind::FunctionExpression);
        assert_eq!(SyntaxKind::from_kind("binary_expression"), SyntaxKind::Other);
    }

    #[test]
    fn test_function_value() {
        assert!(SyntaxKind::ArrowFunction.is_function_value());
        assert!(SyntaxKind::FunctionExpression.is_function_value());
        assert!(!SyntaxKind::CallExpression.is_function_value());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("(a: number,\n    b: string)"), "(a: number, b: string)");
        assert_eq!(normalize_whitespace("  x  "), "x");
    }
}
