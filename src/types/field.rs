//! A named, typed slot in a schema tree, and its construction from an
//! `ArrowSchema`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::type_tag::{parse_format, TypeTag};
use crate::error::CodecError;
use crate::ffi::ArrowSchema;
use crate::metadata::{self, Metadata};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tag: TypeTag,
    pub nullable: bool,
    pub metadata: Option<Metadata>,
}

impl Field {
    pub fn new(name: impl Into<String>, tag: TypeTag, nullable: bool) -> Self {
        Self {
            name: name.into(),
            tag,
            nullable,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds the fully populated field tree of a schema.
    ///
    /// Validates the child layout every nested format requires, resolves
    /// dictionary-encoded schemas into [`TypeTag::Dictionary`] and decodes the
    /// metadata block.
    pub fn from_schema(schema: &ArrowSchema) -> Result<Self, CodecError> {
        let name = schema.name().into_owned();
        Self::build(schema).map_err(|e| e.in_field(name))
    }

    fn build(schema: &ArrowSchema) -> Result<Self, CodecError> {
        let format = schema.format()?;
        let n_children = schema.child_count()?;
        let mut children = Vec::with_capacity(n_children);
        for i in 0..n_children {
            children.push(Field::from_schema(schema.child(i)?)?);
        }

        let expect_children = |expected: usize| -> Result<(), CodecError> {
            if n_children != expected {
                return Err(CodecError::MalformedSchema(format!(
                    "format `{}` requires {} children, got {}",
                    format, expected, n_children
                )));
            }
            Ok(())
        };

        let mut tag = parse_format(format)?;
        match &mut tag {
            TypeTag::List(slot)
            | TypeTag::LargeList(slot)
            | TypeTag::FixedSizeList(_, slot)
            | TypeTag::ListView(slot)
            | TypeTag::LargeListView(slot) => {
                expect_children(1)?;
                let mut item = children.remove(0);
                if !is_list_item_name(&item.name) {
                    return Err(CodecError::MalformedSchema(format!(
                        "list child must be named `item`, got `{}`",
                        item.name
                    )));
                }
                if item.name == "l" {
                    item.name = "item".into();
                }
                *slot = Some(Box::new(item));
            }
            TypeTag::Struct(fields) => {
                *fields = std::mem::take(&mut children);
            }
            TypeTag::Map { key, value } => {
                expect_children(1)?;
                let entries = children.remove(0);
                if !entries.name.starts_with("entries") {
                    return Err(CodecError::MalformedSchema(format!(
                        "map child must be named `entries`, got `{}`",
                        entries.name
                    )));
                }
                match entries.tag {
                    TypeTag::Struct(mut kv) if kv.len() == 2 => {
                        let v = kv.remove(1);
                        let k = kv.remove(0);
                        *key = Some(Box::new(k));
                        *value = Some(Box::new(v));
                    }
                    _ => {
                        return Err(CodecError::MalformedSchema(
                            "map entries must be a struct of exactly two children (key, value)".into(),
                        ));
                    }
                }
            }
            TypeTag::DenseUnion { type_ids, variants } | TypeTag::SparseUnion { type_ids, variants } => {
                expect_children(type_ids.len())?;
                *variants = std::mem::take(&mut children);
            }
            TypeTag::RunEndEncoded { run_ends, values } => {
                expect_children(2)?;
                let v = children.remove(1);
                let r = children.remove(0);
                if r.name != "run_ends" || v.name != "values" {
                    return Err(CodecError::MalformedSchema(format!(
                        "run-end encoded children must be named `run_ends` and `values`, got `{}` and `{}`",
                        r.name, v.name
                    )));
                }
                if !matches!(r.tag, TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64) {
                    return Err(CodecError::MalformedSchema(format!(
                        "run ends must be int16, int32 or int64, got {}",
                        r.tag
                    )));
                }
                *run_ends = Some(Box::new(r));
                *values = Some(Box::new(v));
            }
            _ => expect_children(0)?,
        }

        if let Some(dictionary) = schema.dictionary() {
            if !tag.is_integer() {
                return Err(CodecError::MalformedSchema(format!(
                    "dictionary index must be an integer type, got {}",
                    tag
                )));
            }
            let value = Field::from_schema(dictionary)?;
            tag = TypeTag::Dictionary {
                index: Box::new(tag),
                value: Some(Box::new(value)),
            };
        }

        Ok(Field {
            name: schema.name().into_owned(),
            tag,
            nullable: schema.is_nullable(),
            metadata: unsafe { metadata::metadata_from_ptr(schema.metadata)? },
        })
    }

    /// Converts this field into an Arrow field. Metadata bytes are read as UTF-8.
    pub fn to_arrow_field(&self) -> Result<arrow_schema::Field, CodecError> {
        let mut field = arrow_schema::Field::new(&self.name, self.tag.to_arrow_type()?, self.nullable);
        if let Some(entries) = &self.metadata {
            let map: HashMap<String, String> = entries
                .iter()
                .map(|(k, v)| {
                    (
                        String::from_utf8_lossy(k).into_owned(),
                        String::from_utf8_lossy(v).into_owned(),
                    )
                })
                .collect();
            field = field.with_metadata(map);
        }
        Ok(field)
    }

    /// Converts an Arrow field. Metadata entries are sorted by key, since Arrow
    /// keeps them in a hash map.
    pub fn from_arrow_field(field: &arrow_schema::Field) -> Result<Self, CodecError> {
        let metadata = if field.metadata().is_empty() {
            None
        } else {
            let mut entries: Metadata = field
                .metadata()
                .iter()
                .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
                .collect();
            entries.sort();
            Some(entries)
        };
        Ok(Field {
            name: field.name().clone(),
            tag: TypeTag::from_arrow_type(field.data_type())?,
            nullable: field.is_nullable(),
            metadata,
        })
    }
}

/// Resolves a schema tree into its [`Field`] tree. List children named `l`
/// come back as `item`.
pub fn field_of_schema(schema: &ArrowSchema) -> Result<Field, CodecError> {
    Field::from_schema(schema)
}

/// Accepts the conventional `item` as well as the short `l` some producers emit.
fn is_list_item_name(name: &str) -> bool {
    name.starts_with("item") || name == "l"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::SchemaBuilder;

    #[test]
    fn test_from_schema_populates_nested_slots() {
        let item = SchemaBuilder::new("u", "item").nullable(true).build().unwrap();
        let list = SchemaBuilder::new("+l", "tags").child(item).build().unwrap();
        let id = SchemaBuilder::new("l", "id").build().unwrap();
        let root = SchemaBuilder::new("+s", "").child(id).child(list).build().unwrap();

        let field = Field::from_schema(&root).unwrap();
        assert!(field.tag.is_well_formed());
        let TypeTag::Struct(children) = &field.tag else {
            panic!("expected struct, got {}", field.tag);
        };
        assert_eq!(children[0].name, "id");
        assert_eq!(children[1].tag.to_string(), "list<string>");
    }

    #[test]
    fn test_list_child_name_is_checked() {
        let child = SchemaBuilder::new("i", "element").build().unwrap();
        let list = SchemaBuilder::new("+l", "xs").child(child).build().unwrap();
        let err = Field::from_schema(&list).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::MalformedSchema(_)));
        assert!(err.to_string().starts_with("In field 'xs'"));
    }

    #[test]
    fn test_short_list_child_name_is_normalised() {
        let child = SchemaBuilder::new("i", "l").build().unwrap();
        let list = SchemaBuilder::new("+l", "xs").child(child).build().unwrap();
        let field = field_of_schema(&list).unwrap();
        let TypeTag::List(Some(item)) = &field.tag else {
            panic!("expected list, got {}", field.tag);
        };
        assert_eq!(item.name, "item");
    }

    #[test]
    fn test_map_requires_two_entry_children() {
        let key = SchemaBuilder::new("u", "key").build().unwrap();
        let entries = SchemaBuilder::new("+s", "entries").child(key).build().unwrap();
        let map = SchemaBuilder::new("+m", "m").child(entries).build().unwrap();
        let err = Field::from_schema(&map).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::MalformedSchema(_)));
    }

    #[test]
    fn test_dictionary_schema_becomes_dictionary_tag() {
        let values = SchemaBuilder::new("u", "").build().unwrap();
        let schema = SchemaBuilder::new("i", "color").dictionary(values).build().unwrap();
        let field = Field::from_schema(&schema).unwrap();
        assert!(matches!(
            &field.tag,
            TypeTag::Dictionary { index, value: Some(v) } if **index == TypeTag::Int32 && v.tag == TypeTag::Utf8
        ));
    }

    #[test]
    fn test_primitive_with_children_is_malformed() {
        let child = SchemaBuilder::new("i", "x").build().unwrap();
        let schema = SchemaBuilder::new("l", "bad").child(child).build().unwrap();
        assert!(Field::from_schema(&schema).is_err());
    }

    #[test]
    fn test_metadata_is_decoded() {
        let md = vec![(b"unit".to_vec(), b"m/s".to_vec())];
        let schema = SchemaBuilder::new("g", "speed")
            .metadata(Some(&md))
            .unwrap()
            .build()
            .unwrap();
        let field = Field::from_schema(&schema).unwrap();
        assert_eq!(field.metadata, Some(md));
    }
}
