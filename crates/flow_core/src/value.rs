//! The values carried by data pins.

use crate::pin::PinType;
use crate::world::{ActorId, ComponentId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value carried by one of the data pin types.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Name(Name),
    String(String),
    Text(Text),
    Enum(EnumValue),
    Vector(Vector),
    Rotator(Rotator),
    Transform(Transform),
    GameplayTag(GameplayTag),
    GameplayTagContainer(GameplayTagContainer),
    InstancedStruct(InstancedStruct),
    Object(ObjectRef),
    Class(ClassRef),
}

/// An identifier-like string compared by value.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct Name(pub String);

/// Display text.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct Text(pub String);

/// A selected entry of a named enumeration.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct EnumValue {
    pub enum_name: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rotation in degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Rotator {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Transform {
    pub translation: Vector,
    pub rotation: Rotator,
    pub scale: Vector,
}

/// A hierarchical, dot-separated tag, e.g. `Quest.Main.Started`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct GameplayTag(String);

/// An ordered set of tags without duplicates.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct GameplayTagContainer(Vec<GameplayTag>);

/// A struct value of a user type, carried as its type name and JSON data.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct InstancedStruct {
    pub type_name: String,
    pub data: serde_json::Value,
}

/// A reference to an object living in the world.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum ObjectRef {
    #[default]
    None,
    Actor(ActorId),
    Component(ComponentId),
    Asset(String),
}

/// A reference to a class by path.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct ClassRef(pub String);

/// Types that may be carried by a data pin.
pub trait DataPinValue: Sized {
    /// The pin type that carries values of this type.
    const PIN_TYPE: PinType;
    /// Extract `Self` from a value of the matching variant.
    fn from_value(value: Value) -> Option<Self>;
    /// Wrap `self` in the matching variant.
    fn into_value(self) -> Value;
}

impl Value {
    /// The pin type able to carry this value.
    pub fn pin_type(&self) -> PinType {
        match self {
            Value::Bool(_) => PinType::Bool,
            Value::Int(_) => PinType::Int,
            Value::Float(_) => PinType::Float,
            Value::Name(_) => PinType::Name,
            Value::String(_) => PinType::String,
            Value::Text(_) => PinType::Text,
            Value::Enum(_) => PinType::Enum,
            Value::Vector(_) => PinType::Vector,
            Value::Rotator(_) => PinType::Rotator,
            Value::Transform(_) => PinType::Transform,
            Value::GameplayTag(_) => PinType::GameplayTag,
            Value::GameplayTagContainer(_) => PinType::GameplayTagContainer,
            Value::InstancedStruct(_) => PinType::InstancedStruct,
            Value::Object(_) => PinType::Object,
            Value::Class(_) => PinType::Class,
        }
    }

    /// Convert the value to a value of type `T`.
    pub fn into_data<T: DataPinValue>(self) -> Option<T> {
        T::from_value(self)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            translation: Vector::default(),
            rotation: Rotator::default(),
            scale: Vector {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
        }
    }
}

impl GameplayTag {
    pub fn new(name: impl Into<String>) -> Self {
        GameplayTag(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Whether this tag equals `other` or is nested beneath it.
    ///
    /// `A.B.C` matches `A.B` and `A.B.C`, but not `A.BC`.
    pub fn matches(&self, other: &GameplayTag) -> bool {
        match self.0.strip_prefix(&other.0) {
            Some("") => other.is_valid(),
            Some(rest) => other.is_valid() && rest.starts_with('.'),
            None => false,
        }
    }
}

impl GameplayTagContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the tag unless an equal tag is already present.
    pub fn insert(&mut self, tag: GameplayTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any tag in the container matches `tag`.
    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.0.iter().any(|t| t.matches(tag))
    }

    /// Whether any tag of `other` is matched by this container.
    pub fn has_any(&self, other: &GameplayTagContainer) -> bool {
        other.iter().any(|tag| self.has_tag(tag))
    }
}

impl FromIterator<GameplayTag> for GameplayTagContainer {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        let mut container = GameplayTagContainer::new();
        for tag in iter {
            container.insert(tag);
        }
        container
    }
}

macro_rules! impl_data_pin_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl DataPinValue for $ty {
                const PIN_TYPE: PinType = PinType::$variant;
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_data_pin_value! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    Name => Name,
    String => String,
    Text => Text,
    EnumValue => Enum,
    Vector => Vector,
    Rotator => Rotator,
    Transform => Transform,
    GameplayTag => GameplayTag,
    GameplayTagContainer => GameplayTagContainer,
    InstancedStruct => InstancedStruct,
    ObjectRef => Object,
    ClassRef => Class,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Bool(v) => fmt::Display::fmt(v, f),
            Value::Int(v) => fmt::Display::fmt(v, f),
            Value::Float(v) => fmt::Display::fmt(v, f),
            Value::Name(v) => fmt::Display::fmt(v, f),
            Value::String(v) => fmt::Display::fmt(v, f),
            Value::Text(v) => fmt::Display::fmt(v, f),
            Value::Enum(v) => fmt::Display::fmt(v, f),
            Value::Vector(v) => fmt::Display::fmt(v, f),
            Value::Rotator(v) => fmt::Display::fmt(v, f),
            Value::Transform(v) => fmt::Display::fmt(v, f),
            Value::GameplayTag(v) => fmt::Display::fmt(v, f),
            Value::GameplayTagContainer(v) => fmt::Display::fmt(v, f),
            Value::InstancedStruct(v) => write!(f, "{}{}", v.type_name, v.data),
            Value::Object(v) => fmt::Display::fmt(v, f),
            Value::Class(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X={:.3} Y={:.3} Z={:.3}", self.x, self.y, self.z)
    }
}

impl fmt::Display for Rotator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "P={:.3} Y={:.3} R={:.3}", self.pitch, self.yaw, self.roll)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Transform {
            translation: t,
            rotation: r,
            scale: s,
        } = self;
        write!(
            f,
            "{:.3},{:.3},{:.3}|{:.3},{:.3},{:.3}|{:.3},{:.3},{:.3}",
            t.x, t.y, t.z, r.pitch, r.yaw, r.roll, s.x, s.y, s.z
        )
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GameplayTagContainer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(tag, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObjectRef::None => f.write_str("None"),
            ObjectRef::Actor(id) => write!(f, "Actor_{}", id.0),
            ObjectRef::Component(id) => write!(f, "Component_{}", id.0),
            ObjectRef::Asset(path) => f.write_str(path),
        }
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matching_is_hierarchical() {
        let tag = GameplayTag::new("Quest.Main.Started");
        assert!(tag.matches(&GameplayTag::new("Quest.Main")));
        assert!(tag.matches(&GameplayTag::new("Quest.Main.Started")));
        assert!(!tag.matches(&GameplayTag::new("Quest.Ma")));
        assert!(!tag.matches(&GameplayTag::default()));
    }

    #[test]
    fn value_conversion_checks_variant() {
        assert_eq!(Value::Int(3).into_data::<i64>(), Some(3));
        assert_eq!(Value::Int(3).into_data::<f64>(), None);
        assert_eq!(Value::from(2.5).pin_type(), PinType::Float);
    }
}
