//! Type compatibility resolver
//!
//! Decides whether a producer's declared output type can feed a consumer's
//! declared input type. Heuristic, symmetric, string based:
//! - identical names are compatible
//! - `Stream<T>`/`List<T>` recurse on `T`, only when both sides use the same wrapper
//! - `Map<K, V>` recurses on keys and values independently
//! - `int`/`long`/`short`/`byte` are mutually compatible, as are `float`/`double`
//! - `File` and `String` are interchangeable (file paths vs file handles)
//!
//! The same rules serve JSON-schema primitive type names, with `integer` and
//! `number` added as a compatible pair and union (`["string", "null"]`) types.

use serde_json::Value;

const SINGLE_PARAM_WRAPPERS: &[&str] = &["Stream", "List"];
const MAP_WRAPPER: &str = "Map";
const INTEGER_FAMILY: &[&str] = &["int", "long", "short", "byte"];
const FLOAT_FAMILY: &[&str] = &["float", "double"];
const PATH_ALIASES: (&str, &str) = ("File", "String");

/// Split `Wrapper<A, B<C>>` into `("Wrapper", ["A", "B<C>"])`
///
/// Arguments are split on top-level commas only. Returns `None` for
/// non-generic or unbalanced names.
pub fn split_generic(type_name: &str) -> Option<(&str, Vec<&str>)> {
    let type_name = type_name.trim();
    let open = type_name.find('<')?;
    if !type_name.ends_with('>') {
        return None;
    }
    let wrapper = type_name[..open].trim();
    let inner = &type_name[open + 1..type_name.len() - 1];

    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                args.push(inner[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(inner[start..].trim());

    if wrapper.is_empty() || args.iter().any(|a| a.is_empty()) {
        return None;
    }
    Some((wrapper, args))
}

/// Whether two declared contract type names are compatible
pub fn are_compatible(type_a: &str, type_b: &str) -> bool {
    let (a, b) = (type_a.trim(), type_b.trim());
    if a == b {
        return true;
    }

    if let (Some((wrapper_a, args_a)), Some((wrapper_b, args_b))) = (split_generic(a), split_generic(b)) {
        if wrapper_a != wrapper_b || args_a.len() != args_b.len() {
            return false;
        }
        if SINGLE_PARAM_WRAPPERS.contains(&wrapper_a) && args_a.len() == 1 {
            return are_compatible(args_a[0], args_b[0]);
        }
        if wrapper_a == MAP_WRAPPER && args_a.len() == 2 {
            return are_compatible(args_a[0], args_b[0]) && are_compatible(args_a[1], args_b[1]);
        }
        return false;
    }

    if INTEGER_FAMILY.contains(&a) && INTEGER_FAMILY.contains(&b) {
        return true;
    }
    if FLOAT_FAMILY.contains(&a) && FLOAT_FAMILY.contains(&b) {
        return true;
    }

    let (file, string) = PATH_ALIASES;
    (a == file && b == string) || (a == string && b == file)
}

/// A JSON-schema `type` keyword: one name or a union of names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

impl SchemaType {
    /// Read a `type` keyword value; `None` when it is neither a string nor
    /// an array of strings
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(SchemaType::Single(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(SchemaType::Union),
            _ => None,
        }
    }

    /// Member names, in declaration order
    pub fn names(&self) -> Vec<&str> {
        match self {
            SchemaType::Single(name) => vec![name.as_str()],
            SchemaType::Union(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaType::Single(name) => f.write_str(name),
            SchemaType::Union(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

/// Compatibility of two JSON-schema primitive type names
pub fn schema_primitives_compatible(type_a: &str, type_b: &str) -> bool {
    if are_compatible(type_a, type_b) {
        return true;
    }
    matches!((type_a, type_b), ("integer", "number") | ("number", "integer"))
}

/// Compatibility of two JSON-schema `type` keywords
///
/// A plain type against a union must be a member of it; two unions are
/// compatible when any cross pair (including `null`) is.
pub fn schema_types_compatible(type_a: &SchemaType, type_b: &SchemaType) -> bool {
    if type_a == type_b {
        return true;
    }
    match (type_a, type_b) {
        (SchemaType::Single(a), SchemaType::Single(b)) => schema_primitives_compatible(a, b),
        (SchemaType::Single(plain), SchemaType::Union(union))
        | (SchemaType::Union(union), SchemaType::Single(plain)) => union.contains(plain),
        (SchemaType::Union(union_a), SchemaType::Union(union_b)) => union_a
            .iter()
            .any(|a| union_b.iter().any(|b| schema_primitives_compatible(a, b))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const VOCABULARY: &[&str] = &[
        "int", "long", "short", "byte", "float", "double", "File", "String", "Integer", "Number",
        "JSONObject", "List<String>", "List<File>", "Stream<String>", "Stream<JSONObject>",
        "List<int>", "List<long>", "Map<String,Integer>", "Map<String, Integer>",
        "Map<String,Number>", "Map<File,long>", "Map<String,int>", "Set<String>",
        "List<List<int>>", "List<List<long>>", "Map<String, List<int>>", "Map<String, List<byte>>",
    ];

    #[test]
    fn test_identical_generics() {
        assert!(are_compatible("List<String>", "List<String>"));
        assert!(are_compatible("Stream<JSONObject>", "Stream<JSONObject>"));
    }

    #[test]
    fn test_wrapper_identity_enforced() {
        assert!(!are_compatible("List<String>", "Stream<String>"));
        assert!(!are_compatible("Stream<int>", "List<long>"));
    }

    #[test]
    fn test_element_widening_through_wrappers() {
        assert!(are_compatible("List<int>", "List<long>"));
        assert!(are_compatible("Stream<File>", "Stream<String>"));
        assert!(are_compatible("List<List<short>>", "List<List<byte>>"));
        assert!(!are_compatible("List<int>", "List<double>"));
    }

    #[test]
    fn test_map_keys_and_values_independent() {
        assert!(are_compatible("Map<String,int>", "Map<File, long>"));
        assert!(!are_compatible("Map<String,int>", "Map<String,double>"));
        // Boxed names are not in the primitive families
        assert!(!are_compatible("Map<String,Integer>", "Map<String,Number>"));
        assert!(are_compatible("Map<String, List<int>>", "Map<String,List<long>>"));
    }

    #[test]
    fn test_primitive_families() {
        assert!(are_compatible("int", "byte"));
        assert!(are_compatible("short", "long"));
        assert!(are_compatible("float", "double"));
        assert!(!are_compatible("int", "float"));
        assert!(!are_compatible("Integer", "int"));
    }

    #[test]
    fn test_file_string_alias() {
        assert!(are_compatible("File", "String"));
        assert!(are_compatible("String", "File"));
        assert!(!are_compatible("File", "Path"));
    }

    #[test]
    fn test_split_generic() {
        assert_eq!(split_generic("Map<String, List<int>>"), Some(("Map", vec!["String", "List<int>"])));
        assert_eq!(split_generic("String"), None);
        assert_eq!(split_generic("List<>"), None);
        assert_eq!(split_generic("List<a>>"), None);
    }

    #[test]
    fn test_schema_type_from_value() {
        assert_eq!(SchemaType::from_value(&json!("string")), Some(SchemaType::Single("string".into())));
        assert_eq!(
            SchemaType::from_value(&json!(["string", "null"])),
            Some(SchemaType::Union(vec!["string".into(), "null".into()]))
        );
        assert_eq!(SchemaType::from_value(&json!(42)), None);
        assert_eq!(SchemaType::from_value(&json!(["string", 1])), None);
    }

    #[test]
    fn test_schema_types() {
        let single = |s: &str| SchemaType::Single(s.to_string());
        let union = |v: &[&str]| SchemaType::Union(v.iter().map(|s| s.to_string()).collect());

        assert!(schema_types_compatible(&single("integer"), &single("number")));
        assert!(schema_types_compatible(&single("number"), &single("integer")));
        assert!(!schema_types_compatible(&single("string"), &single("number")));

        assert!(schema_types_compatible(&single("string"), &union(&["string", "null"])));
        assert!(!schema_types_compatible(&single("integer"), &union(&["string", "null"])));
        assert!(!schema_types_compatible(&union(&["number", "null"]), &single("integer")));

        assert!(schema_types_compatible(&union(&["string", "null"]), &union(&["integer", "null"])));
        assert!(schema_types_compatible(&union(&["integer"]), &union(&["number", "boolean"])));
        assert!(!schema_types_compatible(&union(&["string"]), &union(&["boolean", "object"])));
    }

    proptest! {
        #[test]
        fn prop_compatibility_is_symmetric(
            a in prop::sample::select(VOCABULARY),
            b in prop::sample::select(VOCABULARY),
        ) {
            prop_assert_eq!(are_compatible(a, b), are_compatible(b, a));
        }

        #[test]
        fn prop_compatibility_is_reflexive(a in prop::sample::select(VOCABULARY)) {
            prop_assert!(are_compatible(a, a));
        }
    }
}
