//! コードヘルパー
//!
//! クエリを文脈付きの正規表現に埋め込むテンプレート集。`{0}` がエスケープ済みの
//! クエリに置き換えられる。`{0}` を含まないテンプレートはクエリ不要。

/// Placeholder replaced by the escaped query
pub const QUERY_PLACEHOLDER: &str = "{0}";

/// A named pattern template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTemplate {
    pub name: &'static str,
    pub template: &'static str,
    pub description: &'static str,
}

pub const BUILTIN_HELPERS: &[PatternTemplate] = &[
    PatternTemplate {
        name: "#",
        template: r"\s*(#).*(\b\w*{0}\b)",
        description: "line starts with # (macros, markdown headers)",
    },
    PatternTemplate {
        name: "instr",
        template: r#"(".*)(\b\w*{0}\b).*(")"#,
        description: "contained within double quotes",
    },
    PatternTemplate {
        name: "infunc",
        template: r"(\(.*)(\b\w*{0}\b).*(\))",
        description: "contained within parentheses",
    },
    PatternTemplate {
        name: "temp",
        template: r"(<.*)(\b\w*{0}\b).*(>)",
        description: "contained within < > (template parameters)",
    },
    PatternTemplate {
        name: "var",
        template: r"((->)|(\.))(\b\w*{0}\b)",
        description: "word to the right of . or ->",
    },
    PatternTemplate {
        name: "ptr",
        template: r"(->)(\b\w*{0}\b)",
        description: "word to the right of ->",
    },
    PatternTemplate {
        name: "set",
        template: r"(\b\w*{0}\b)\s(=)",
        description: "left of an =",
    },
    PatternTemplate {
        name: "unset",
        template: r"([^=]\s*)(\b\w*{0}\b)\s*(;)",
        description: "left of ; without an = before it",
    },
    PatternTemplate {
        name: "new",
        template: r"(new)\s*(\b{0}\b)",
        description: "right of `new`",
    },
    PatternTemplate {
        name: "delete",
        template: r"(delete)\s*(\b{0}\b)",
        description: "right of `delete`",
    },
];

/// 名前（先頭の `/` や `-` は無視）で組み込みヘルパーを検索
pub fn find_builtin(name: &str) -> Option<&'static PatternTemplate> {
    let name = normalize_name(name);
    BUILTIN_HELPERS.iter().find(|helper| helper.name == name)
}

/// Switch names are case-insensitive and may be written with a `/` or `-` prefix
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let stripped = trimmed.trim_start_matches(['/', '-']);
    // "#" 自体は記号だけの名前なので残す
    if stripped.is_empty() {
        trimmed.to_lowercase()
    } else {
        stripped.to_lowercase()
    }
}

pub fn needs_query(template: &str) -> bool {
    template.contains(QUERY_PLACEHOLDER)
}

/// テンプレートにクエリを埋め込んだパターンを生成
pub fn expand_template(template: &str, query: &str) -> String {
    template.replace(QUERY_PLACEHOLDER, &regex::escape(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn helper_regex(name: &str, query: &str) -> Regex {
        let helper = find_builtin(name).unwrap();
        Regex::new(&expand_template(helper.template, query)).unwrap()
    }

    #[test]
    fn test_every_builtin_compiles() {
        for helper in BUILTIN_HELPERS {
            assert!(needs_query(helper.template), "{}", helper.name);
            let pattern = expand_template(helper.template, "value");
            assert!(Regex::new(&pattern).is_ok(), "{} -> {}", helper.name, pattern);
        }
    }

    #[test]
    fn test_instr_helper() {
        let regex = helper_regex("instr", "Search");
        assert!(regex.is_match(r#"print("my Search stuff")"#));
        assert!(!regex.is_match("Search outside"));
    }

    #[test]
    fn test_var_and_ptr_helpers() {
        let var = helper_regex("var", "mySearch");
        assert!(var.is_match("a->mySearch = 5"));
        assert!(var.is_match("a.mySearch = 5;"));
        assert!(!var.is_match("mySearch = 10;"));

        let ptr = helper_regex("/ptr", "mySearch");
        assert!(ptr.is_match("a->mySearch = 5"));
        assert!(!ptr.is_match("a.mySearch = 5;"));
    }

    #[test]
    fn test_set_and_unset_helpers() {
        let set = helper_regex("set", "mySearch");
        assert!(set.is_match("mySearch = 5"));
        assert!(!set.is_match("mySearch;"));

        let unset = helper_regex("unset", "mySearch");
        assert!(unset.is_match("int mySearch;"));
    }

    #[test]
    fn test_query_is_escaped() {
        let pattern = expand_template(r"(new)\s*(\b{0}\b)", "a.b");
        assert_eq!(pattern, r"(new)\s*(\ba\.b\b)");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("/InStr"), "instr");
        assert_eq!(normalize_name("--set"), "set");
        assert_eq!(normalize_name("#"), "#");
        assert!(find_builtin("/#").is_some());
    }
}
