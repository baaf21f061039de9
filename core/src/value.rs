//! Runtime values and host reflection
//!
//! Member tables, instance fields and plain objects all hold [`Value`]s. The
//! engine only ever reflects on the *category* of a value (behavior, number,
//! string, boolean or generic object); it never looks deeper.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::identity::{self, BehaviorId, DescriptorId};

/// Ordered mapping from member name to value
pub type MemberTable = IndexMap<Arc<str>, Value>;

/// Per-object state (instance fields, sandbox receivers, plain objects)
pub type Fields = IndexMap<Arc<str>, Value>;

/// Signature of a native behavior body
///
/// The first argument is the receiver's state: the real instance for plain
/// behaviors, the private mixin receiver for sandboxed ones.
pub type NativeFn = dyn Fn(&mut Fields, &[Value]) -> Value + Send + Sync;

/// Runtime category of a value, as seen by structural checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Callable member
    Behavior,
    /// Any number
    Number,
    /// Any string
    String,
    /// Any boolean
    Boolean,
    /// Objects, lists and null
    AnyObject,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Behavior => "function",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::AnyObject => "object",
        };
        f.write_str(name)
    }
}

/// A value held by a member table, an instance field or a plain object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent-but-declared value
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Ordered list
    List(Vec<Value>),
    /// Nested object
    Object(Fields),
    /// Callable member
    Behavior(Behavior),
    /// Shape requirement used by protocols: matches any value of the category
    Sentinel(Category),
}

impl Value {
    /// Runtime category of this value
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Behavior(_) => Category::Behavior,
            Self::Number(_) => Category::Number,
            Self::String(_) => Category::String,
            Self::Bool(_) => Category::Boolean,
            Self::Null | Self::List(_) | Self::Object(_) => Category::AnyObject,
            Self::Sentinel(category) => *category,
        }
    }

    /// Whether this value is callable
    #[must_use]
    pub fn is_behavior(&self) -> bool {
        matches!(self, Self::Behavior(_))
    }

    /// Borrow the behavior, if this value is one
    #[must_use]
    pub fn as_behavior(&self) -> Option<&Behavior> {
        match self {
            Self::Behavior(behavior) => Some(behavior),
            _ => None,
        }
    }

    /// Numeric value, if any
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String value, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value, if any
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Same-identity comparison used by composition
    ///
    /// Behaviors compare by the id of the behavior they ultimately wrap, so a
    /// sandboxed wrapper is the same as the mixin's own behavior. Numbers
    /// compare bitwise (`NaN` is the same as itself); containers compare
    /// element-wise with the same rules.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Behavior(a), Self::Behavior(b)) => a.root().id() == b.root().id(),
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.same_as(y)))
            }
            (a, b) => a == b,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Behavior> for Value {
    fn from(behavior: Behavior) -> Self {
        Self::Behavior(behavior)
    }
}

impl From<Category> for Value {
    fn from(category: Category) -> Self {
        Self::Sentinel(category)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(fields_from_json_map(map)),
        }
    }
}

/// Build a field table from a JSON object, interning the keys
#[must_use]
pub fn fields_from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Fields {
    map.into_iter()
        .map(|(key, value)| (identity::intern(&key), Value::from(value)))
        .collect()
}

/// Build a member table from name/value pairs
pub fn member_table<I, K, V>(entries: I) -> MemberTable
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(name, value)| (identity::intern(name.as_ref()), value.into()))
        .collect()
}

/// A callable member with a stable identity
///
/// Cloning a behavior keeps its identity; composition relies on this to tell
/// a copied member from an unrelated one with the same name.
#[derive(Clone)]
pub struct Behavior {
    id: BehaviorId,
    kind: BehaviorKind,
}

/// How a behavior executes
#[derive(Clone)]
pub enum BehaviorKind {
    /// Runs directly against the receiver it is invoked on
    Native(Arc<NativeFn>),
    /// Installed by a mixin; runs against the instance's private mixin receiver
    Sandboxed(SandboxBinding),
}

/// Binding of a sandboxed wrapper to its mixin
#[derive(Debug, Clone)]
pub struct SandboxBinding {
    /// Slot of the private receiver in the instance's sandbox bucket
    pub slot: usize,
    /// The mixin source the wrapped behavior came from
    pub source: DescriptorId,
    /// The behavior as defined on the mixin
    pub original: Box<Behavior>,
}

impl Behavior {
    /// Create a native behavior with a fresh identity
    pub fn native<F>(body: F) -> Self
    where
        F: Fn(&mut Fields, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            id: identity::next_behavior_id(),
            kind: BehaviorKind::Native(Arc::new(body)),
        }
    }

    /// Wrap `original` so it runs against the private receiver at `slot`
    #[must_use]
    pub fn sandboxed(slot: usize, source: DescriptorId, original: Behavior) -> Self {
        Self {
            id: identity::next_behavior_id(),
            kind: BehaviorKind::Sandboxed(SandboxBinding {
                slot,
                source,
                original: Box::new(original),
            }),
        }
    }

    /// Identity of this behavior
    #[must_use]
    pub fn id(&self) -> BehaviorId {
        self.id
    }

    /// Execution kind
    #[must_use]
    pub fn kind(&self) -> &BehaviorKind {
        &self.kind
    }

    /// The mixin's own behavior, when this is a sandboxed wrapper
    #[must_use]
    pub fn original(&self) -> Option<&Behavior> {
        match &self.kind {
            BehaviorKind::Sandboxed(binding) => Some(&binding.original),
            BehaviorKind::Native(_) => None,
        }
    }

    /// The innermost wrapped behavior; `self` for native behaviors
    #[must_use]
    pub fn root(&self) -> &Behavior {
        let mut current = self;
        while let Some(original) = current.original() {
            current = original;
        }
        current
    }

    /// The sandbox binding, when this is a sandboxed wrapper
    #[must_use]
    pub fn sandbox(&self) -> Option<&SandboxBinding> {
        match &self.kind {
            BehaviorKind::Sandboxed(binding) => Some(binding),
            BehaviorKind::Native(_) => None,
        }
    }
}

impl PartialEq for Behavior {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Behavior {}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BehaviorKind::Native(_) => f.debug_tuple("Behavior").field(&self.id).finish(),
            BehaviorKind::Sandboxed(binding) => f
                .debug_struct("Behavior")
                .field("id", &self.id)
                .field("slot", &binding.slot)
                .field("source", &binding.source)
                .field("original", &binding.original.id)
                .finish(),
        }
    }
}
