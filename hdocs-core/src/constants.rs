//! Fixed name sets used during extraction

/// Standard library type names that are never worth documenting
pub const STD_TYPES: &[&str] = &[
    "size_t", "ptrdiff_t", "intptr_t", "uintptr_t", "va_list",
    "int8_t", "int16_t", "int32_t", "int64_t",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "int_least8_t", "int_least16_t", "int_least32_t", "int_least64_t",
    "uint_least8_t", "uint_least16_t", "uint_least32_t", "uint_least64_t",
    "int_fast8_t", "int_fast16_t", "int_fast32_t", "int_fast64_t",
    "uint_fast8_t", "uint_fast16_t", "uint_fast32_t", "uint_fast64_t",
    "intmax_t", "uintmax_t", "wchar_t", "__vcrt_bool",
];

/// Node kinds whose direct children are documentable declarations
pub const SCOPE_KINDS: &[&str] = &[
    "translation_unit",
    "declaration_list",
    "preproc_if",
    "preproc_ifdef",
    "preproc_else",
    "preproc_elif",
];

/// Class and struct bodies; scopes only for C++ members
pub const MEMBER_SCOPE_KIND: &str = "field_declaration_list";

/// Wrappers a documentation comment is placed above instead of the inner node
pub const ANCHOR_WRAPPER_KINDS: &[&str] = &["template_declaration", "linkage_specification"];

/// Preprocessor conditionals; syntax errors inside them are tolerated in strict mode
pub const PREPROC_CONDITIONAL_KINDS: &[&str] = &[
    "preproc_if",
    "preproc_ifdef",
    "preproc_else",
    "preproc_elif",
];

/// Nodes next to which a lone word is taken for an annotation macro (`API int f(void);`)
pub const ANNOTATED_KINDS: &[&str] = &[
    "declaration",
    "function_definition",
    "field_declaration",
    "parameter_declaration",
    "type_definition",
    "function_declarator",
    "array_declarator",
    "pointer_declarator",
    "init_declarator",
];

/// Returns true if `name` is a standard type alias
pub fn is_std_type(name: &str) -> bool {
    STD_TYPES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_types() {
        assert!(is_std_type("size_t"));
        assert!(is_std_type("uint_fast16_t"));
        assert!(!is_std_type("my_size_t"));
    }
}
