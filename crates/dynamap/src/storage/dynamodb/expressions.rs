//! Expression strings for conditions, updates and key conditions.
//!
//! Attribute names and values always go through `#nN` / `:vN` placeholders,
//! so reserved words and special characters in names need no escaping.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as AwsValue;

use dynamap_core::store::{AttributeValue, Condition, KeyCondition, RangeCondition, UpdateAction};

use super::conversions::to_aws;

/// Placeholder bindings collected while rendering expressions.
#[derive(Debug, Default)]
pub struct Expression {
    names: HashMap<String, String>,
    values: HashMap<String, AwsValue>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, name: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, bound)| *bound == name) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), name.to_string());
        placeholder
    }

    fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), to_aws(value.clone()));
        placeholder
    }

    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::AttributeExists(name) => format!("attribute_exists({})", self.name(name)),
            Condition::AttributeNotExists(name) => {
                format!("attribute_not_exists({})", self.name(name))
            }
            Condition::Equals(name, value) => {
                format!("{} = {}", self.name(name), self.value(value))
            }
        }
    }

    /// Renders update actions grouped into `SET`, `REMOVE` and `ADD`
    /// clauses. Returns `None` when there is nothing to update.
    pub fn update(&mut self, actions: &[UpdateAction]) -> Option<String> {
        let mut set = Vec::new();
        let mut remove = Vec::new();
        let mut add = Vec::new();

        for action in actions {
            match action {
                UpdateAction::Set { name, value } => {
                    set.push(format!("{} = {}", self.name(name), self.value(value)));
                }
                UpdateAction::Remove { name } => remove.push(self.name(name)),
                UpdateAction::Add { name, value } => {
                    add.push(format!("{} {}", self.name(name), self.value(value)));
                }
            }
        }

        let clauses: Vec<String> = [("SET", set), ("REMOVE", remove), ("ADD", add)]
            .into_iter()
            .filter(|(_, parts)| !parts.is_empty())
            .map(|(keyword, parts)| format!("{keyword} {}", parts.join(", ")))
            .collect();

        (!clauses.is_empty()).then(|| clauses.join(" "))
    }

    pub fn key_condition(&mut self, condition: &KeyCondition) -> String {
        let hash = format!(
            "{} = {}",
            self.name(&condition.hash_name),
            self.value(&condition.hash_value)
        );

        let Some((name, range)) = &condition.range else {
            return hash;
        };

        let name = self.name(name);
        let range = match range {
            RangeCondition::Eq(v) => format!("{name} = {}", self.value(v)),
            RangeCondition::Lt(v) => format!("{name} < {}", self.value(v)),
            RangeCondition::Le(v) => format!("{name} <= {}", self.value(v)),
            RangeCondition::Gt(v) => format!("{name} > {}", self.value(v)),
            RangeCondition::Ge(v) => format!("{name} >= {}", self.value(v)),
            RangeCondition::Between(low, high) => {
                let low = self.value(low);
                format!("{name} BETWEEN {low} AND {}", self.value(high))
            }
            RangeCondition::BeginsWith(v) => format!("begins_with({name}, {})", self.value(v)),
        };

        format!("{hash} AND {range}")
    }

    /// Name and value bindings, `None` when empty as the SDK expects.
    pub fn into_bindings(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, AwsValue>>,
    ) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);
        (names, values)
    }
}
