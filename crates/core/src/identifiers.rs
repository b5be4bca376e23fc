use std::collections::BTreeSet;
use std::fmt;

/// Report-facing classification of a referenced declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Enum,
    Function,
    Parameter,
    Variable,
}

impl Category {
    /// The closed declaration-kind table. Any kind not listed here has no
    /// category.
    pub fn from_decl_kind(kind: &str) -> Option<Self> {
        match kind {
            "EnumConstantDecl" => Some(Category::Enum),
            "FunctionDecl" => Some(Category::Function),
            "ParmVarDecl" => Some(Category::Parameter),
            "VarDecl" => Some(Category::Variable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Enum => "enum",
            Category::Function => "function",
            Category::Parameter => "parameter",
            Category::Variable => "variable",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentifierRecord {
    pub identifier: String,
    pub category: Category,
}

impl IdentifierRecord {
    pub fn new(identifier: impl Into<String>, category: Category) -> Self {
        Self {
            identifier: identifier.into(),
            category,
        }
    }
}

/// Ordered by identifier, then category.
pub type IdentifierSet = BTreeSet<IdentifierRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_exactly_the_four_declaration_kinds() {
        assert_eq!(Category::from_decl_kind("EnumConstantDecl"), Some(Category::Enum));
        assert_eq!(Category::from_decl_kind("FunctionDecl"), Some(Category::Function));
        assert_eq!(Category::from_decl_kind("ParmVarDecl"), Some(Category::Parameter));
        assert_eq!(Category::from_decl_kind("VarDecl"), Some(Category::Variable));
        assert_eq!(Category::from_decl_kind("CXXMethodDecl"), None);
        assert_eq!(Category::from_decl_kind("vardecl"), None);
    }

    #[test]
    fn records_sort_by_name_then_category() {
        let set: IdentifierSet = [
            IdentifierRecord::new("b", Category::Enum),
            IdentifierRecord::new("a", Category::Variable),
            IdentifierRecord::new("a", Category::Function),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = set
            .iter()
            .map(|r| format!("{}:{}", r.identifier, r.category))
            .collect();
        assert_eq!(names, vec!["a:function", "a:variable", "b:enum"]);
    }
}
