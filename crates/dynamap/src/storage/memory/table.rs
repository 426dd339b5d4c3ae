//! Table state of the in-memory store.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use dynamap_core::store::{
    AttributeValue, Condition, Item, KeyAttribute, RangeCondition, ScalarType, StoreError,
    StoreResult, TableStatus, UpdateAction,
};

/// Comparable form of a key attribute.
#[derive(Debug, Clone)]
pub(super) enum SortKey {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            Self::S(_) => 0,
            Self::N(_) => 1,
            Self::B(_) => 2,
        }
    }

    /// Reads a key attribute of a declared scalar type.
    pub(super) fn of(attribute: &KeyAttribute, value: &AttributeValue) -> StoreResult<Self> {
        let key = match (attribute.scalar, value) {
            (ScalarType::S, AttributeValue::S(s)) => Self::S(s.clone()),
            (ScalarType::N, AttributeValue::N(n)) => Self::N(valid_number(n)?),
            (ScalarType::B, AttributeValue::B(b)) => Self::B(b.clone()),
            (scalar, other) => {
                return Err(StoreError::validation(format!(
                    "One or more parameter values were invalid: Type mismatch for key {} expected: {:?} actual: {}",
                    attribute.name,
                    scalar,
                    other.type_descriptor()
                )))
            }
        };
        Ok(key)
    }

    /// Reads any scalar attribute; other types yield `None`.
    pub(super) fn infer(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => Some(Self::S(s.clone())),
            AttributeValue::N(n) => Some(Self::N(n.clone())),
            AttributeValue::B(b) => Some(Self::B(b.clone())),
            _ => None,
        }
    }

    fn begins_with(&self, prefix: &Self) -> StoreResult<bool> {
        match (self, prefix) {
            (Self::S(s), Self::S(p)) => Ok(s.starts_with(p.as_str())),
            (Self::B(b), Self::B(p)) => Ok(b.starts_with(p)),
            _ => Err(StoreError::validation(
                "Invalid KeyConditionExpression: begins_with requires a string or binary operand",
            )),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::S(a), Self::S(b)) => a.cmp(b),
            (Self::N(a), Self::N(b)) => compare_numbers(a, b),
            (Self::B(a), Self::B(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Primary key of an item: hash and optional range component.
pub(super) type PrimaryKey = (SortKey, Option<SortKey>);

fn valid_number(raw: &str) -> StoreResult<String> {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(raw.trim().to_string()),
        _ => Err(StoreError::validation(format!(
            "The parameter cannot be converted to a numeric value: {raw}"
        ))),
    }
}

/// Compares two store numbers, exactly when both are integers.
pub(super) fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<i128>(), b.parse::<i128>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => {
            let a = a.parse::<f64>().unwrap_or(f64::NAN);
            let b = b.parse::<f64>().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
    }
}

fn attribute_eq(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        (AttributeValue::N(a), AttributeValue::N(b)) => compare_numbers(a, b) == Ordering::Equal,
        (a, b) => a == b,
    }
}

fn add_numbers(a: &str, b: &str) -> StoreResult<String> {
    if let (Ok(a), Ok(b)) = (a.parse::<i128>(), b.parse::<i128>()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(sum.to_string());
        }
    }
    let sum = valid_number(a)?.parse::<f64>().unwrap_or_default()
        + valid_number(b)?.parse::<f64>().unwrap_or_default();
    Ok(sum.to_string())
}

fn union<T: PartialEq + Clone>(existing: &[T], added: &[T]) -> Vec<T> {
    let mut merged = existing.to_vec();
    for value in added {
        if !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}

/// Applies `ADD` semantics: numeric addition or set union.
fn add_attribute(existing: Option<&AttributeValue>, added: &AttributeValue) -> StoreResult<AttributeValue> {
    use AttributeValue::*;

    let value = match (existing, added) {
        (None, N(_) | Ss(_) | Ns(_) | Bs(_)) => added.clone(),
        (Some(N(a)), N(b)) => N(add_numbers(a, b)?),
        (Some(Ss(a)), Ss(b)) => Ss(union(a, b)),
        (Some(Ns(a)), Ns(b)) => Ns(union(a, b)),
        (Some(Bs(a)), Bs(b)) => Bs(union(a, b)),
        (existing, added) => {
            return Err(StoreError::validation(format!(
                "An operand in the update expression has an incorrect data type: {} ADD {}",
                existing.map(AttributeValue::type_descriptor).unwrap_or("NONE"),
                added.type_descriptor()
            )))
        }
    };
    Ok(value)
}

/// Result of applying update actions.
pub(super) struct Updated {
    pub item: Item,
    pub changed: Item,
}

/// One table: key declaration, items ordered by primary key and the
/// knobs tests use to simulate table creation.
#[derive(Debug)]
pub(super) struct Table {
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
    pub items: BTreeMap<PrimaryKey, Item>,
    pub status: TableStatus,
    /// Describe calls still answering `Creating`.
    pub pending_describes: u32,
    /// Describe calls still answering `ResourceNotFoundException`.
    pub hidden_describes: u32,
}

impl Table {
    pub fn new(hash_key: KeyAttribute, range_key: Option<KeyAttribute>, pending_describes: u32) -> Self {
        Self {
            hash_key,
            range_key,
            items: BTreeMap::new(),
            status: if pending_describes == 0 {
                TableStatus::Active
            } else {
                TableStatus::Creating
            },
            pending_describes,
            hidden_describes: 0,
        }
    }

    /// Primary key of an item or key map.
    pub fn key_of(&self, item: &Item) -> StoreResult<PrimaryKey> {
        let component = |attribute: &KeyAttribute| {
            item.get(&attribute.name)
                .ok_or_else(|| {
                    StoreError::validation(format!(
                        "One or more parameter values were invalid: Missing the key {} in the item",
                        attribute.name
                    ))
                })
                .and_then(|value| SortKey::of(attribute, value))
        };

        let hash = component(&self.hash_key)?;
        let range = self.range_key.as_ref().map(component).transpose()?;
        Ok((hash, range))
    }

    /// Primary key of a request key, which must hold exactly the key
    /// attributes.
    pub fn exact_key(&self, key: &Item) -> StoreResult<PrimaryKey> {
        let expected = 1 + usize::from(self.range_key.is_some());
        if key.len() != expected {
            return Err(StoreError::validation(
                "The provided key element does not match the schema",
            ));
        }
        self.key_of(key)
    }

    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.hash_key.name == name
            || self
                .range_key
                .as_ref()
                .is_some_and(|range| range.name == name)
    }

    /// Key attributes of an item, as returned in `LastEvaluatedKey`.
    pub fn key_item(&self, item: &Item) -> Item {
        item.iter()
            .filter(|(name, _)| self.is_key_attribute(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Applies update actions to the current version of an item.
    pub fn apply(&self, key: &Item, current: Option<&Item>, actions: &[UpdateAction]) -> StoreResult<Updated> {
        let mut item = current.cloned().unwrap_or_else(|| key.clone());
        let mut changed = Item::new();

        for action in actions {
            if self.is_key_attribute(action.name()) {
                return Err(StoreError::validation(format!(
                    "One or more parameter values were invalid: Cannot update attribute {}. This attribute is part of the key",
                    action.name()
                )));
            }
            match action {
                UpdateAction::Set { name, value } => {
                    item.insert(name.clone(), value.clone());
                    changed.insert(name.clone(), value.clone());
                }
                UpdateAction::Remove { name } => {
                    item.remove(name);
                }
                UpdateAction::Add { name, value } => {
                    let value = add_attribute(item.get(name), value)?;
                    item.insert(name.clone(), value.clone());
                    changed.insert(name.clone(), value);
                }
            }
        }

        Ok(Updated { item, changed })
    }
}

/// Evaluates a write condition against the current version of an item.
pub(super) fn check_condition(condition: Option<&Condition>, current: Option<&Item>) -> StoreResult<()> {
    let holds = match condition {
        None => true,
        Some(Condition::AttributeExists(name)) => current.is_some_and(|item| item.contains_key(name)),
        Some(Condition::AttributeNotExists(name)) => {
            !current.is_some_and(|item| item.contains_key(name))
        }
        Some(Condition::Equals(name, expected)) => current
            .and_then(|item| item.get(name))
            .is_some_and(|value| attribute_eq(value, expected)),
    };

    if holds {
        Ok(())
    } else {
        Err(StoreError::client(
            dynamap_core::store::codes::CONDITIONAL_CHECK_FAILED,
            "The conditional request failed",
        ))
    }
}

/// Whether a range value satisfies a query's range condition.
pub(super) fn matches_range(value: &SortKey, condition: &RangeCondition) -> StoreResult<bool> {
    let operand = |attribute: &AttributeValue| {
        SortKey::infer(attribute).ok_or_else(|| {
            StoreError::validation(format!(
                "Invalid KeyConditionExpression: unsupported operand type {}",
                attribute.type_descriptor()
            ))
        })
    };

    let matched = match condition {
        RangeCondition::Eq(v) => *value == operand(v)?,
        RangeCondition::Lt(v) => *value < operand(v)?,
        RangeCondition::Le(v) => *value <= operand(v)?,
        RangeCondition::Gt(v) => *value > operand(v)?,
        RangeCondition::Ge(v) => *value >= operand(v)?,
        RangeCondition::Between(low, high) => {
            let (low, high) = (operand(low)?, operand(high)?);
            if low > high {
                return Err(StoreError::validation(
                    "Invalid KeyConditionExpression: The BETWEEN operator requires upper bound to be greater than or equal to lower bound",
                ));
            }
            low <= *value && *value <= high
        }
        RangeCondition::BeginsWith(prefix) => value.begins_with(&operand(prefix)?)?,
    };
    Ok(matched)
}
