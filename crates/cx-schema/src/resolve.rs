//! Resolving the schemas that govern a path

use cx_path::split_path;

use crate::node::Schema;

/// Every schema node that can govern the value at `path`
///
/// Wrappers are peeled while descending but kept on the resolved nodes.
/// Arrays resolve numeric segments to their element, records any segment
/// to their value schema and tuples an index to its item. Unions contribute
/// a candidate per matching option; discriminated unions one per branch
/// declaring the next key. The empty path resolves to `schema` itself.
/// Segments are matched verbatim. Results are in declaration order.
#[must_use]
pub fn schemas_at_path<'a>(schema: &'a Schema, path: &str) -> Vec<&'a Schema> {
    let segments: Vec<&str> = split_path(path).collect();
    let mut found = Vec::new();
    collect(schema, &segments, &mut found);
    found
}

fn collect<'a>(schema: &'a Schema, segments: &[&str], found: &mut Vec<&'a Schema>) {
    let Some((segment, rest)) = segments.split_first() else {
        found.push(schema);
        return;
    };

    match schema.peel() {
        Schema::Object(object) => {
            if let Some(field) = object.field(segment) {
                collect(field, rest, found);
            }
        }
        Schema::Array(array) => {
            if segment.parse::<usize>().is_ok() {
                collect(&array.element, rest, found);
            }
        }
        Schema::Record(value) => collect(value, rest, found),
        Schema::Tuple(items) => {
            if let Some(item) = segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                collect(item, rest, found);
            }
        }
        Schema::Union(options) => {
            for option in options {
                collect(option, segments, found);
            }
        }
        Schema::DiscriminatedUnion(union) => {
            for branch in &union.options {
                if let Some(field) = branch.field(segment) {
                    collect(field, rest, found);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ObjectSchema;

    fn kinds(found: &[&Schema]) -> Vec<&'static str> {
        found.iter().map(|s| s.kind_name()).collect()
    }

    fn account() -> Schema {
        Schema::object([
            (
                "account",
                Schema::discriminated_union(
                    "role",
                    [
                        ObjectSchema::new([
                            ("role", Schema::literal("admin")),
                            ("limit", Schema::number()),
                        ]),
                        ObjectSchema::new([
                            ("role", Schema::literal("guest")),
                            ("limit", Schema::string()),
                        ]),
                    ],
                )
                .optional(),
            ),
            ("tags", Schema::array(Schema::string().nullable())),
            ("pair", Schema::tuple(vec![Schema::string(), Schema::boolean()])),
            ("extra", Schema::record(Schema::number())),
        ])
    }

    #[test]
    fn empty_path_is_root() {
        let schema = account();
        assert_eq!(kinds(&schemas_at_path(&schema, "")), vec!["object"]);
    }

    #[test]
    fn discriminated_union_yields_every_branch() {
        let schema = account();
        assert_eq!(
            kinds(&schemas_at_path(&schema, "account.limit")),
            vec!["number", "string"]
        );
        assert_eq!(
            kinds(&schemas_at_path(&schema, "account.role")),
            vec!["literal", "literal"]
        );
    }

    #[test]
    fn leaf_keeps_its_wrappers() {
        let schema = account();
        assert_eq!(kinds(&schemas_at_path(&schema, "tags.3")), vec!["nullable"]);
        assert_eq!(kinds(&schemas_at_path(&schema, "account")), vec!["optional"]);
    }

    #[test]
    fn containers_resolve_segments() {
        let schema = account();
        assert_eq!(kinds(&schemas_at_path(&schema, "pair.1")), vec!["boolean"]);
        assert!(schemas_at_path(&schema, "pair.2").is_empty());
        assert_eq!(kinds(&schemas_at_path(&schema, "extra.anything")), vec!["number"]);
        assert!(schemas_at_path(&schema, "tags.first").is_empty());
    }

    #[test]
    fn unions_collect_from_each_option() {
        let schema = Schema::object([(
            "value",
            Schema::union(vec![
                Schema::object([("a", Schema::string())]),
                Schema::object([("a", Schema::number())]),
                Schema::string(),
            ]),
        )]);
        assert_eq!(kinds(&schemas_at_path(&schema, "value.a")), vec!["string", "number"]);
    }

    #[test]
    fn unknown_paths_resolve_to_nothing() {
        let schema = account();
        assert!(schemas_at_path(&schema, "missing").is_empty());
        assert!(schemas_at_path(&schema, "tags.0.deeper").is_empty());
    }

    #[test]
    fn padded_segments_do_not_match() {
        let schema = account();
        assert!(schemas_at_path(&schema, "account. limit").is_empty());
        assert!(schemas_at_path(&schema, " tags.0").is_empty());
    }
}
