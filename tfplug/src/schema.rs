//! Schema types and builders for tfplug
//!
//! This module provides the schema system for defining resource and data source
//! schemas, including attribute types, nested attributes and plan modifiers.

use crate::plan_modifier::{PlanModifier, PlanModifyRequest};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
/// This must match Terraform's type system exactly
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    /// Finds a top-level attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Runs every attribute's plan modifiers against the prior state and the
    /// proposed new state, descending into single nested attributes.
    ///
    /// On create (null prior state) nothing can require replacement, so the
    /// proposed state is returned untouched.
    pub fn modify_plan(
        &self,
        config: &DynamicValue,
        prior_state: &DynamicValue,
        proposed_new_state: &DynamicValue,
    ) -> PlanResult {
        let mut result = PlanResult {
            planned_state: proposed_new_state.clone(),
            requires_replace: Vec::new(),
            diagnostics: Vec::new(),
        };

        if prior_state.is_null() || proposed_new_state.is_null() {
            return result;
        }

        let values = PlanValues {
            config,
            prior_state,
            proposed: proposed_new_state,
        };
        modify_attributes(
            &self.block.attributes,
            &AttributePath::root(),
            &values,
            &mut result,
        );
        result
    }
}

/// Outcome of running plan modifiers over a whole schema
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

struct PlanValues<'a> {
    config: &'a DynamicValue,
    prior_state: &'a DynamicValue,
    proposed: &'a DynamicValue,
}

fn modify_attributes(
    attributes: &[Attribute],
    parent: &AttributePath,
    values: &PlanValues<'_>,
    result: &mut PlanResult,
) {
    for attribute in attributes {
        let path = parent.clone().attribute(&attribute.name);

        for modifier in &attribute.plan_modifiers {
            let value_at = |dv: &DynamicValue| dv.get(&path).cloned().unwrap_or(Dynamic::Null);
            let response = modifier.modify_plan(PlanModifyRequest {
                state: value_at(values.prior_state),
                plan: value_at(&result.planned_state),
                config: value_at(values.config),
                attribute_path: path.to_string(),
            });

            if response.requires_replace {
                tracing::debug!("Attribute {} requires replacement", path);
                result.requires_replace.push(path.clone());
            }
            result.diagnostics.extend(response.diagnostics);

            // Writing into a null parent would invent an object, so only
            // write back when the parent exists in the plan
            let parent_is_set = parent.steps.is_empty()
                || values
                    .proposed
                    .get(parent)
                    .map(Dynamic::is_set)
                    .unwrap_or(false);
            if parent_is_set {
                if let Err(e) = result.planned_state.set(&path, response.plan_value) {
                    result.diagnostics.push(
                        Diagnostic::error("Failed to apply plan modifier", e.to_string())
                            .with_attribute(path.clone()),
                    );
                }
            }
        }

        if let Some(nested) = &attribute.nested_type {
            if nested.nesting == ObjectNestingMode::Single {
                modify_attributes(&nested.attributes, &path, values, result);
            }
        }
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub description_kind: StringKind,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub nested_type: Option<NestedType>,
}

// Manual Debug implementation since plan modifiers don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("description", &self.description)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

impl Attribute {
    /// Finds a nested attribute by name
    pub fn nested_attribute(&self, name: &str) -> Option<&Attribute> {
        self.nested_type
            .as_ref()
            .and_then(|n| n.attributes.iter().find(|a| a.name == name))
    }
}

/// NestedType for attributes with nested structures
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
    pub nesting: ObjectNestingMode,
}

impl NestedType {
    pub fn single(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::Single,
        }
    }

    pub fn list(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            nesting: ObjectNestingMode::List,
        }
    }
}

/// ObjectNestingMode for nested attribute objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectNestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
}

/// StringKind represents the format of string values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                plan_modifiers: Vec::new(),
                nested_type: None,
            },
        }
    }

    /// Nested object attribute; the attribute type is derived from the children
    pub fn nested(name: &str, nested: NestedType) -> Self {
        let object = AttributeType::Object(
            nested
                .attributes
                .iter()
                .map(|a| (a.name.clone(), a.r#type.clone()))
                .collect(),
        );
        let type_ = match nested.nesting {
            ObjectNestingMode::List => AttributeType::List(Box::new(object)),
            ObjectNestingMode::Set => AttributeType::Set(Box::new(object)),
            ObjectNestingMode::Map => AttributeType::Map(Box::new(object)),
            ObjectNestingMode::Single | ObjectNestingMode::Invalid => object,
        };
        let mut builder = Self::new(name, type_);
        builder.attribute.nested_type = Some(nested);
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    description: String::new(),
                    description_kind: StringKind::Plain,
                },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
