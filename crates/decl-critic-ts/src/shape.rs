//! The concrete type handle this oracle hands back.
//!
//! A shape is everything the analyzer is allowed to ask about a type,
//! precomputed at resolution time: property set, signature counts, flags,
//! array-likeness, and a rendering for diagnostics.

use decl_critic_core::{PropertySymbol, TypeFlag, TypeHandle};

/// A syntactically inferred type shape.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeType {
    pub properties: Vec<PropertySymbol>,
    pub call_signatures: usize,
    pub construct_signatures: usize,
    pub array_like: bool,
    pub flags: Vec<TypeFlag>,
    pub rendered: String,
}

impl ShapeType {
    /// An object shape with no members yet.
    pub fn object(rendered: impl Into<String>) -> Self {
        Self {
            flags: vec![TypeFlag::Object],
            rendered: rendered.into(),
            ..Self::default()
        }
    }

    /// A function shape with one call signature.
    pub fn function(rendered: impl Into<String>) -> Self {
        Self {
            call_signatures: 1,
            flags: vec![TypeFlag::Object],
            rendered: rendered.into(),
            ..Self::default()
        }
    }

    /// A class shape with one construct signature.
    pub fn class(rendered: impl Into<String>) -> Self {
        Self {
            construct_signatures: 1,
            flags: vec![TypeFlag::Object],
            rendered: rendered.into(),
            ..Self::default()
        }
    }

    /// An array-like shape.
    pub fn array(rendered: impl Into<String>) -> Self {
        Self {
            array_like: true,
            flags: vec![TypeFlag::Object],
            rendered: rendered.into(),
            ..Self::default()
        }
    }

    /// A primitive shape with the given flag.
    pub fn primitive(flag: TypeFlag, rendered: impl Into<String>) -> Self {
        Self {
            flags: vec![flag],
            rendered: rendered.into(),
            ..Self::default()
        }
    }

    /// Adds a property unless one of that name is already present.
    pub fn add_property(&mut self, property: PropertySymbol) {
        if !self.properties.iter().any(|p| p.name == property.name) {
            self.properties.push(property);
        }
    }

    /// Folds another shape's capabilities into this one. Used for merged
    /// declarations, e.g. a function with a namespace of the same name.
    pub fn merge(&mut self, other: ShapeType) {
        for property in other.properties {
            self.add_property(property);
        }
        self.call_signatures += other.call_signatures;
        self.construct_signatures += other.construct_signatures;
        self.array_like = self.array_like || other.array_like;
        for flag in other.flags {
            if !self.flags.contains(&flag) {
                self.flags.push(flag);
            }
        }
    }
}

impl TypeHandle for ShapeType {
    fn properties(&self) -> Vec<PropertySymbol> {
        self.properties.clone()
    }

    fn call_signature_count(&self) -> usize {
        self.call_signatures
    }

    fn construct_signature_count(&self) -> usize {
        self.construct_signatures
    }

    fn is_array_like(&self) -> bool {
        self.array_like
    }

    fn flags(&self) -> Vec<TypeFlag> {
        self.flags.clone()
    }

    fn render(&self) -> String {
        self.rendered.clone()
    }
}
