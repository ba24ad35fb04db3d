use indexmap::IndexMap;

use crate::{
    error::Error,
    grammer::ast::{EnumDef, Field, StructDef, Type},
};

/// Every field, element and scalar occupies one slot of this size.
pub const SLOT: usize = 8;

/// Struct and enum definitions seen so far, in definition order.
#[derive(Debug, Default)]
pub struct Registry {
    structs: IndexMap<String, Vec<Field>>,
    enums: IndexMap<String, IndexMap<String, i64>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(&self, name: &str) -> Result<(), Error> {
        if self.structs.contains_key(name) || self.enums.contains_key(name) {
            return Err(Error::Duplicate(name.to_string()));
        }
        Ok(())
    }

    pub fn define_struct(&mut self, def: &StructDef) -> Result<(), Error> {
        self.check_unique(&def.name)?;
        self.structs.insert(def.name.clone(), def.fields.clone());
        Ok(())
    }

    pub fn define_enum(&mut self, def: &EnumDef) -> Result<(), Error> {
        self.check_unique(&def.name)?;
        let mut variants = IndexMap::new();
        for (ordinal, variant) in def.variants.iter().enumerate() {
            if variants.insert(variant.clone(), ordinal as i64).is_some() {
                return Err(Error::Duplicate(format!("{}::{}", def.name, variant)));
            }
        }
        self.enums.insert(def.name.clone(), variants);
        Ok(())
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn fields(&self, name: &str) -> Result<&[Field], Error> {
        self.structs
            .get(name)
            .map(|fields| fields.as_slice())
            .ok_or_else(|| Error::UnknownStruct(name.to_string()))
    }

    pub fn variant(&self, name: &str, variant: &str) -> Result<i64, Error> {
        let variants = self
            .enums
            .get(name)
            .ok_or_else(|| Error::UnknownEnum(name.to_string()))?;
        variants
            .get(variant)
            .copied()
            .ok_or_else(|| Error::UnknownVariant(name.to_string(), variant.to_string()))
    }

    /// Structs and arrays are passed and copied by address.
    pub fn is_aggregate(&self, ty: &Type) -> bool {
        match ty {
            Type::Array(..) => true,
            Type::Named(name) => self.is_struct(name),
            _ => false,
        }
    }

    /// Stack bytes a variable of `ty` occupies. Never less than one slot.
    pub fn sizeof(&self, ty: &Type) -> Result<usize, Error> {
        let slots = match ty {
            Type::Int | Type::Bytes | Type::Void | Type::Ptr(_) => 1,
            Type::Array(_, len) => *len,
            Type::Named(name) if self.is_enum(name) => 1,
            Type::Named(name) => match self.structs.get(name) {
                Some(fields) => fields.len(),
                None => return Err(Error::UnknownType(name.clone())),
            },
        };
        let size = slots
            .checked_mul(SLOT)
            .ok_or_else(|| Error::FrameOverflow(ty.to_string()))?;
        Ok(size.max(SLOT))
    }

    /// Byte offset of `field` below the base of a struct of type `owner`, and
    /// the field's declared type.
    pub fn field(&self, owner: &Type, field: &str) -> Result<(usize, Type), Error> {
        let name = match owner {
            Type::Named(name) if self.is_struct(name) => name,
            other => return Err(Error::NotAStruct(other.to_string())),
        };
        self.fields(name)?
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == field)
            .map(|(idx, f)| (idx * SLOT, f.ty.clone()))
            .ok_or_else(|| Error::UnknownField(name.clone(), field.to_string()))
    }
}
