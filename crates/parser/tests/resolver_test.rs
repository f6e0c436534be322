//! Struct resolution properties over hand-built catalogs

use provider_codegen_common::{FieldRecord, ResolvedField, TypeRecord};
use provider_codegen_parser::{StructResolver, TypeCatalog};

fn catalog(records: Vec<TypeRecord>) -> TypeCatalog {
    records.into_iter().map(|r| (r.name.clone(), r)).collect()
}

#[test]
fn test_alpha_beta_end_to_end() {
    let types = catalog(vec![
        TypeRecord::new(
            "Alpha",
            vec![
                FieldRecord::new("Id", "string"),
                FieldRecord::new("Child", "*Beta"),
            ],
        ),
        TypeRecord::new("Beta", vec![FieldRecord::new("Value", "int")]),
    ]);

    let alpha = StructResolver::new(&types).resolve("Alpha").unwrap();

    assert_eq!(
        alpha.fields,
        vec![
            ResolvedField::leaf("Id", "string"),
            ResolvedField::composite("Child", "*Beta", vec![ResolvedField::leaf("Value", "int")]),
        ]
    );
}

#[test]
fn test_alpha_beta_cycle() {
    let types = catalog(vec![
        TypeRecord::new("Alpha", vec![FieldRecord::new("Next", "*Beta")]),
        TypeRecord::new("Beta", vec![FieldRecord::new("Next", "*Alpha")]),
    ]);

    let alpha = StructResolver::new(&types).resolve("Alpha").unwrap();

    let beta = &alpha.fields[0];
    assert_eq!(beta.raw_type, "*Beta");
    assert_eq!(beta.children.len(), 1);

    let back_to_alpha = &beta.children[0];
    assert_eq!(back_to_alpha.name, "Next");
    assert_eq!(back_to_alpha.raw_type, "*Alpha");
    assert!(back_to_alpha.children.is_empty());
}

#[test]
fn test_long_cycle_terminates() {
    let length = 200;
    let records = (0..length)
        .map(|i| {
            TypeRecord::new(
                format!("T{}", i),
                vec![
                    FieldRecord::new("Label", "*string"),
                    FieldRecord::new("Next", format!("*T{}", (i + 1) % length)),
                ],
            )
        })
        .collect();
    let types = catalog(records);

    let root = StructResolver::new(&types).resolve("T0").unwrap();

    // Walk down the chain: every level is composite until the repeat of T0
    let mut depth = 0;
    let mut fields = &root.fields;
    loop {
        let next = &fields[1];
        assert!(next.is_composite);
        if next.children.is_empty() {
            assert_eq!(next.raw_type, "*T0");
            break;
        }
        depth += 1;
        fields = &next.children;
    }
    assert_eq!(depth, length - 1);
}

#[test]
fn test_sibling_paths_expand_independently() {
    let types = catalog(vec![
        TypeRecord::new(
            "Pair",
            vec![
                FieldRecord::new("Left", "*Leaf"),
                FieldRecord::new("Right", "*Leaf"),
            ],
        ),
        TypeRecord::new("Leaf", vec![FieldRecord::new("Value", "*int64")]),
    ]);

    let pair = StructResolver::new(&types).resolve("Pair").unwrap();
    assert_eq!(pair.fields[0].children.len(), 1);
    assert_eq!(pair.fields[1].children.len(), 1);
}

#[test]
fn test_non_composite_fields_preserved_exactly() {
    let fields = vec![
        FieldRecord::new("Name", "*string").with_tag("`json:\"name,omitempty\"`"),
        FieldRecord::new("Count", "*int").with_tag("`json:\"count,omitempty\"`"),
        FieldRecord::new("Labels", "[]string"),
        FieldRecord::new("Extra", "map[string]interface{}"),
    ];
    let types = catalog(vec![TypeRecord::new("Flat", fields.clone())]);

    let flat = StructResolver::new(&types).resolve("Flat").unwrap();

    assert_eq!(flat.fields.len(), fields.len());
    for (resolved, record) in flat.fields.iter().zip(&fields) {
        assert_eq!(resolved.name, record.name);
        assert_eq!(resolved.raw_type, record.raw_type);
        assert_eq!(resolved.tag, record.tag);
        assert!(!resolved.is_composite);
    }
}

#[test]
fn test_ignored_fields_absent_at_every_level() {
    let types = catalog(vec![
        TypeRecord::new(
            "Outer",
            vec![
                FieldRecord::new("ObjectType_", "*string"),
                FieldRecord::new("Inner", "*Inner"),
                FieldRecord::new("Discriminator", "*string"),
            ],
        ),
        TypeRecord::new(
            "Inner",
            vec![
                FieldRecord::new("Reserved_", "map[string]interface{}"),
                FieldRecord::new("UnknownFields_", "map[string]interface{}"),
                FieldRecord::new("DataItemDiscriminator_", "*string"),
                FieldRecord::new("Value", "*string"),
            ],
        ),
    ]);

    let outer = StructResolver::new(&types).resolve("Outer").unwrap();

    fn names(fields: &[ResolvedField], out: &mut Vec<String>) {
        for field in fields {
            out.push(field.name.clone());
            names(&field.children, out);
        }
    }
    let mut all = Vec::new();
    names(&outer.fields, &mut all);
    assert_eq!(all, vec!["Inner", "Value"]);
}

#[test]
fn test_embedded_field_kept() {
    let types = catalog(vec![
        TypeRecord::new(
            "Derived",
            vec![
                FieldRecord::new("", "*Base"),
                FieldRecord::new("Own", "*string"),
            ],
        ),
        TypeRecord::new("Base", vec![FieldRecord::new("Id", "*string")]),
    ]);

    let derived = StructResolver::new(&types).resolve("Derived").unwrap();
    assert_eq!(derived.fields[0].name, "");
    assert!(derived.fields[0].is_composite);
    assert_eq!(derived.fields[0].children[0].name, "Id");
}
