//! Curriculum attribute extraction.
//!
//! Searches the whole `*Curriculum` class (not only its direct statements)
//! for attribute-definition calls such as
//! `ScalarAttributeDefinition(name="size", levels=[1, 2, 4, 8])` and
//! evaluates each `levels` argument with the restricted evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tree_sitter::Node;

use super::expr::lower;
use super::level_eval::evaluate;
use super::literal::Literal;
use crate::config::ExtractOptions;
use crate::error::CurriscanResult;
use crate::locate::locate_class;
use crate::parse::{significant_children, ParsedSource, Preorder};

/// One curriculum attribute and its value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAttribute {
    pub name: String,
    /// `None` when the `levels` expression is outside the evaluable subset.
    pub levels: Option<Vec<Literal>>,
}

/// Attributes keyed by name. Repeated names keep the last definition.
pub type LevelSection = BTreeMap<String, LevelAttribute>;

/// Extract curriculum attributes using the default class suffix and calls.
pub fn extract_levels(source: &str) -> CurriscanResult<Option<LevelSection>> {
    extract_levels_with(source, &ExtractOptions::default())
}

/// Extract curriculum attributes with explicit options.
pub fn extract_levels_with(
    source: &str,
    options: &ExtractOptions,
) -> CurriscanResult<Option<LevelSection>> {
    let parsed = ParsedSource::parse(source)?;
    levels_from_parsed(&parsed, options)
}

/// Extract curriculum attributes from an already parsed file.
///
/// `Ok(None)` means the file has no curriculum class.
pub fn levels_from_parsed(
    parsed: &ParsedSource<'_>,
    options: &ExtractOptions,
) -> CurriscanResult<Option<LevelSection>> {
    let Some(span) = locate_class(parsed, &options.curriculum_suffix)? else {
        return Ok(None);
    };

    let mut section = LevelSection::new();
    for call in Preorder::new(span.node).filter(|node| node.kind() == "call") {
        let Some(callee) = callee_name(call, parsed) else {
            continue;
        };
        if !options.is_attribute_call(callee) {
            continue;
        }
        if let Some(attribute) = attribute_from_call(call, parsed) {
            section.insert(attribute.name.clone(), attribute);
        }
    }
    Ok(Some(section))
}

/// `Foo(...)` gives `Foo`; `module.Foo(...)` gives `Foo`.
fn callee_name<'s>(call: Node<'_>, parsed: &ParsedSource<'s>) -> Option<&'s str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(parsed.text(function)),
        "attribute" => function
            .child_by_field_name("attribute")
            .map(|attr| parsed.text(attr)),
        _ => None,
    }
}

fn attribute_from_call(call: Node<'_>, parsed: &ParsedSource<'_>) -> Option<LevelAttribute> {
    let arguments = call.child_by_field_name("arguments")?;

    let mut name = None;
    let mut levels_node = None;
    for argument in significant_children(arguments) {
        if argument.kind() != "keyword_argument" {
            continue;
        }
        let (Some(key), Some(value)) = (
            argument.child_by_field_name("name"),
            argument.child_by_field_name("value"),
        ) else {
            continue;
        };
        match parsed.text(key) {
            "name" => name = Some(value),
            "levels" => levels_node = Some(value),
            _ => {}
        }
    }

    let name = lower(name?, parsed).as_str_constant()?.to_string();
    let levels_node = levels_node?;
    let levels = evaluate(&lower(levels_node, parsed));
    if levels.is_none() {
        tracing::debug!(
            attribute = %name,
            line = levels_node.start_position().row + 1,
            expr = %parsed.text(levels_node),
            "levels expression is not statically evaluable"
        );
    }
    Some(LevelAttribute { name, levels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CurriscanError;

    fn levels_of(source: &str, attribute: &str) -> Option<Vec<Literal>> {
        let section = extract_levels(source).unwrap().unwrap();
        let found = section
            .get(attribute)
            .unwrap_or_else(|| panic!("missing {attribute}"));
        assert_eq!(found.name, attribute);
        found.levels.clone()
    }

    fn ints(values: &[i64]) -> Option<Vec<Literal>> {
        Some(values.iter().map(|v| Literal::Int(*v)).collect())
    }

    fn curriculum(attribute: &str) -> String {
        format!(
            "class SizeCurriculum(BaseCurriculum):\n    def __init__(self):\n        super().__init__()\n        self._define_attributes(\n            {attribute},\n        )\n"
        )
    }

    #[test]
    fn test_literal_list() {
        let source = curriculum(r#"ScalarAttributeDefinition(name="size", levels=[1, 2, 4, 8])"#);
        assert_eq!(levels_of(&source, "size"), ints(&[1, 2, 4, 8]));
    }

    #[test]
    fn test_materialized_range() {
        let source =
            curriculum(r#"ScalarAttributeDefinition(name="size", levels=list(range(2, 10, 2)))"#);
        assert_eq!(levels_of(&source, "size"), ints(&[2, 4, 6, 8]));
    }

    #[test]
    fn test_negative_literals() {
        let source = curriculum(r#"ScalarAttributeDefinition(name="size", levels=[-1, -2])"#);
        assert_eq!(levels_of(&source, "size"), ints(&[-1, -2]));
    }

    #[test]
    fn test_nested_tuples_with_signed_and_computed_elements() {
        let source = curriculum(r#"ScalarAttributeDefinition(name="bounds", levels=[(-1, 1), (2, 3)])"#);
        assert_eq!(
            levels_of(&source, "bounds"),
            Some(vec![
                Literal::Seq(vec![Literal::Int(-1), Literal::Int(1)]),
                Literal::Seq(vec![Literal::Int(2), Literal::Int(3)]),
            ])
        );

        let source = curriculum(r#"ScalarAttributeDefinition(name="grid", levels=[[1, 2*3]])"#);
        assert_eq!(
            levels_of(&source, "grid"),
            Some(vec![Literal::Seq(vec![Literal::Int(1), Literal::Int(6)])])
        );
    }

    #[test]
    fn test_dynamic_levels_are_null() {
        let source =
            curriculum(r#"ScalarAttributeDefinition(name="size", levels=compute_levels())"#);
        assert_eq!(levels_of(&source, "size"), None);
    }

    #[test]
    fn test_range_attribute_and_strings() {
        let source = curriculum(
            r#"RangeAttributeDefinition(
                name="difficulty",
                levels=["easy", "medium", "hard"],
                description="task difficulty",
                lower_field_name="min_difficulty",
                upper_field_name="max_difficulty",
            )"#,
        );
        assert_eq!(
            levels_of(&source, "difficulty"),
            Some(vec![
                Literal::Str("easy".into()),
                Literal::Str("medium".into()),
                Literal::Str("hard".into()),
            ])
        );
    }

    #[test]
    fn test_arithmetic_elements() {
        let source =
            curriculum(r#"ScalarAttributeDefinition(name="scale", levels=[2**3, 10 // 3, 1 / 2])"#);
        assert_eq!(
            levels_of(&source, "scale"),
            Some(vec![Literal::Int(8), Literal::Int(3), Literal::Float(0.5)])
        );
    }

    #[test]
    fn test_definitions_nested_in_containers_and_helpers() {
        let source = r#"
class GraphCurriculum(BaseCurriculum):
    def __init__(self):
        attrs = [
            ScalarAttributeDefinition(name="nodes", levels=range(3)),
            {"edges": attributes.RangeAttributeDefinition(name="edges", levels=(1, 2))},
        ]
        self._define_attributes(*attrs)
"#;
        assert_eq!(levels_of(source, "nodes"), ints(&[0, 1, 2]));
        assert_eq!(levels_of(source, "edges"), ints(&[1, 2]));
    }

    #[test]
    fn test_calls_without_literal_name_or_levels_are_skipped() {
        let source = r#"
class SkipCurriculum:
    def __init__(self):
        ScalarAttributeDefinition(name=NAME, levels=[1])
        ScalarAttributeDefinition(name="no_levels")
        ScalarAttributeDefinition("positional", [1, 2])
        ScalarAttributeDefinition(name="kept", levels=[3])
"#;
        let section = extract_levels(source).unwrap().unwrap();
        assert_eq!(section.len(), 1);
        assert_eq!(section["kept"].levels, ints(&[3]));
    }

    #[test]
    fn test_unrecognized_calls_are_ignored() {
        let source = r#"
class OtherCurriculum:
    def __init__(self):
        AttributeDefinition(name="x", levels=[1])
        self.define(name="y", levels=[2])
"#;
        assert!(extract_levels(source).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_later_definition_wins() {
        let source = curriculum(
            r#"ScalarAttributeDefinition(name="size", levels=[1]),
            ScalarAttributeDefinition(name="size", levels=[2, 3])"#,
        );
        assert_eq!(levels_of(&source, "size"), ints(&[2, 3]));
    }

    #[test]
    fn test_no_curriculum_class() {
        let source = "class SizeConfig:\n    size: int = 3\n";
        assert!(extract_levels(source).unwrap().is_none());
    }

    #[test]
    fn test_calls_outside_the_class_are_ignored() {
        let source = r#"
EXTRA = ScalarAttributeDefinition(name="outside", levels=[9])

class TinyCurriculum:
    def __init__(self):
        ScalarAttributeDefinition(name="inside", levels=[1])
"#;
        let section = extract_levels(source).unwrap().unwrap();
        assert!(section.contains_key("inside"));
        assert!(!section.contains_key("outside"));
    }

    #[test]
    fn test_custom_attribute_calls() {
        let options = ExtractOptions {
            attribute_calls: vec!["LevelDef".to_string()],
            ..ExtractOptions::default()
        };
        let source = "class GameCurriculum:\n    x = LevelDef(name='lives', levels=[1, 2])\n";
        let section = extract_levels_with(source, &options).unwrap().unwrap();
        assert_eq!(section["lives"].levels, ints(&[1, 2]));
    }

    #[test]
    fn test_malformed_curriculum_is_error() {
        let source = "class BrokenCurriculum:\n    def __init__(self):\n        ScalarAttributeDefinition(name='x', levels=[1,\n";
        assert!(matches!(
            extract_levels(source),
            Err(CurriscanError::Malformed { .. })
        ));
    }

    #[test]
    fn test_null_levels_serialize_as_null() {
        let source =
            curriculum(r#"ScalarAttributeDefinition(name="size", levels=compute_levels())"#);
        let section = extract_levels(&source).unwrap().unwrap();
        let json = serde_json::to_string(&section).unwrap();
        assert_eq!(json, r#"{"size":{"name":"size","levels":null}}"#);
    }
}
